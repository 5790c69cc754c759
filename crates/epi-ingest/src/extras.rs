//! Side-channel extras read from auxiliary workbook ranges.

use std::collections::BTreeMap;
use std::path::Path;

use epi_model::{ExtraSpec, ExtraValue, Extras};

use crate::error::Result;
use crate::reader::cell_text;
use crate::sheet::{CellRange, Sheet, Workbook};

/// Read every configured extra from `workbook` into `extras`.
///
/// Lists are appended to across files; maps keep the last value for a key.
/// Missing sheets and bad ranges are logged and skipped.
pub fn read_extras(workbook: &Workbook, specs: &[ExtraSpec], extras: &mut Extras, path: &Path) {
    for spec in specs {
        let Some(sheet) = workbook.sheet(&spec.sheet) else {
            tracing::warn!(
                path = %path.display(),
                extra = %spec.name,
                sheet = %spec.sheet,
                "extras sheet not found"
            );
            continue;
        };
        if let Err(error) = read_extra(sheet, spec, extras) {
            tracing::warn!(path = %path.display(), extra = %spec.name, %error, "skipping extra");
        }
    }
}

fn read_extra(sheet: &Sheet, spec: &ExtraSpec, extras: &mut Extras) -> Result<()> {
    if let (Some(key_range), Some(value_range)) = (&spec.key_range, &spec.value_range) {
        let keys = sheet.cells_in(&CellRange::parse(key_range)?);
        let values = sheet.cells_in(&CellRange::parse(value_range)?);
        let entry = extras
            .entry(spec.name.clone())
            .or_insert_with(|| ExtraValue::Map(BTreeMap::new()));
        match entry {
            ExtraValue::Map(map) => {
                for (key, value) in keys.into_iter().zip(values) {
                    if key.is_populated() && value.is_populated() {
                        map.insert(cell_text(key), cell_text(value));
                    }
                }
            }
            ExtraValue::List(_) => {
                tracing::warn!(extra = %spec.name, "extra already holds a list, map range ignored");
            }
        }
    }

    if let Some(item_range) = &spec.item_range {
        let items = sheet.cells_in(&CellRange::parse(item_range)?);
        let entry = extras
            .entry(spec.name.clone())
            .or_insert_with(|| ExtraValue::List(Vec::new()));
        match entry {
            ExtraValue::List(list) => list.extend(
                items
                    .into_iter()
                    .filter(|item| item.is_populated())
                    .map(cell_text),
            ),
            ExtraValue::Map(_) => {
                tracing::warn!(extra = %spec.name, "extra already holds a map, item range ignored");
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use epi_model::Value;

    fn lists_sheet() -> Workbook {
        let rows = vec![
            vec![Value::from("code"), Value::from("shown")],
            vec![Value::from("A00: Cholera"), Value::from("yes")],
            vec![Value::from("B05: Measles"), Value::Empty],
            vec![Value::from("A90: Dengue fever"), Value::Number(1.0)],
        ];
        Workbook {
            sheets: vec![Sheet::new("lists", rows)],
        }
    }

    fn spec(name: &str) -> ExtraSpec {
        ExtraSpec {
            name: name.to_string(),
            sheet: "lists".to_string(),
            item_range: None,
            key_range: None,
            value_range: None,
        }
    }

    #[test]
    fn test_item_range_appends_across_files() {
        let book = lists_sheet();
        let spec = ExtraSpec {
            item_range: Some("A2:A10".to_string()),
            ..spec("all")
        };
        let mut extras = Extras::new();
        read_extras(&book, std::slice::from_ref(&spec), &mut extras, Path::new("a.xlsx"));
        read_extras(&book, std::slice::from_ref(&spec), &mut extras, Path::new("b.xlsx"));
        let list = extras["all"].as_list().unwrap();
        assert_eq!(list.len(), 6);
        assert_eq!(list[0], "A00: Cholera");
        assert_eq!(list[3], "A00: Cholera");
    }

    #[test]
    fn test_key_value_ranges_skip_blank_pairs() {
        let spec = ExtraSpec {
            key_range: Some("A2:A4".to_string()),
            value_range: Some("B2:B4".to_string()),
            ..spec("shown")
        };
        let mut extras = Extras::new();
        read_extras(&lists_sheet(), &[spec], &mut extras, Path::new("a.xlsx"));
        let map = extras["shown"].as_map().unwrap();
        assert_eq!(map.len(), 2);
        assert_eq!(map["A00: Cholera"], "yes");
        assert_eq!(map["A90: Dengue fever"], "1");
    }

    #[test]
    fn test_missing_sheet_is_skipped() {
        let spec = ExtraSpec {
            sheet: "nope".to_string(),
            item_range: Some("A1".to_string()),
            ..spec("x")
        };
        let mut extras = Extras::new();
        read_extras(&lists_sheet(), &[spec], &mut extras, Path::new("a.xlsx"));
        assert!(extras.is_empty());
    }
}
