//! In-memory grid of cells and `A1` range addressing.

use epi_model::Value;

use crate::error::{IngestError, Result};

static EMPTY: Value = Value::Empty;

/// One sheet of cells in absolute row/column positions.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Sheet {
    pub name: String,
    pub rows: Vec<Vec<Value>>,
}

impl Sheet {
    pub fn new(name: impl Into<String>, rows: Vec<Vec<Value>>) -> Self {
        Self {
            name: name.into(),
            rows,
        }
    }

    /// Cell at zero-based `(row, column)`; absent cells read as empty.
    pub fn cell(&self, row: usize, column: usize) -> &Value {
        self.rows
            .get(row)
            .and_then(|cells| cells.get(column))
            .unwrap_or(&EMPTY)
    }

    /// Cells of a range in row-major order.
    pub fn cells_in(&self, range: &CellRange) -> Vec<&Value> {
        range
            .positions()
            .map(|(row, column)| self.cell(row, column))
            .collect()
    }

    pub fn header(&self) -> &[Value] {
        self.rows.first().map(Vec::as_slice).unwrap_or_default()
    }

    pub fn data_rows(&self) -> &[Vec<Value>] {
        self.rows.get(1..).unwrap_or_default()
    }
}

/// All sheets of one workbook, in workbook order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Workbook {
    pub sheets: Vec<Sheet>,
}

impl Workbook {
    pub fn sheet(&self, name: &str) -> Option<&Sheet> {
        self.sheets.iter().find(|sheet| sheet.name == name)
    }

    /// The data sheet: the named one, else one called `input`, else the first.
    pub fn data_sheet(&self, name: Option<&str>) -> Option<&Sheet> {
        match name {
            Some(name) => self.sheet(name),
            None => self.sheet("input").or_else(|| self.sheets.first()),
        }
    }
}

/// Zero-based cell address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct CellRef {
    pub row: usize,
    pub column: usize,
}

impl CellRef {
    /// Parse an `A1` address.
    pub fn parse(address: &str) -> Result<Self> {
        let invalid = || IngestError::InvalidRange {
            range: address.to_string(),
        };
        let address = address.trim().replace('$', "");
        let split = address
            .find(|c: char| c.is_ascii_digit())
            .ok_or_else(invalid)?;
        let (letters, digits) = address.split_at(split);
        if letters.is_empty() || !letters.chars().all(|c| c.is_ascii_alphabetic()) {
            return Err(invalid());
        }
        let column = letters
            .chars()
            .map(|c| c.to_ascii_uppercase() as usize - 'A' as usize + 1)
            .fold(0usize, |acc, digit| acc * 26 + digit);
        let row: usize = digits.parse().map_err(|_| invalid())?;
        if row == 0 {
            return Err(invalid());
        }
        Ok(Self {
            row: row - 1,
            column: column - 1,
        })
    }
}

/// Rectangular range such as `A2:A1000`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CellRange {
    pub start: CellRef,
    pub end: CellRef,
}

impl CellRange {
    /// Parse `A1` or `A1:B2`. Corners may be given in any order.
    pub fn parse(range: &str) -> Result<Self> {
        let wrap = |_| IngestError::InvalidRange {
            range: range.to_string(),
        };
        let (first, second) = match range.split_once(':') {
            Some((first, second)) => (first, second),
            None => (range, range),
        };
        let first = CellRef::parse(first).map_err(wrap)?;
        let second = CellRef::parse(second).map_err(wrap)?;
        Ok(Self {
            start: CellRef {
                row: first.row.min(second.row),
                column: first.column.min(second.column),
            },
            end: CellRef {
                row: first.row.max(second.row),
                column: first.column.max(second.column),
            },
        })
    }

    pub fn positions(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        (self.start.row..=self.end.row).flat_map(move |row| {
            (self.start.column..=self.end.column).map(move |column| (row, column))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_cell_ref() {
        assert_eq!(CellRef::parse("A1").unwrap(), CellRef { row: 0, column: 0 });
        assert_eq!(CellRef::parse("$AB$12").unwrap(), CellRef { row: 11, column: 27 });
        assert!(CellRef::parse("12").is_err());
        assert!(CellRef::parse("A0").is_err());
        assert!(CellRef::parse("A1B").is_err());
    }

    #[test]
    fn test_range_is_row_major() {
        let range = CellRange::parse("B2:A1").unwrap();
        let positions: Vec<_> = range.positions().collect();
        assert_eq!(positions, vec![(0, 0), (0, 1), (1, 0), (1, 1)]);
    }

    #[test]
    fn test_cells_outside_grid_are_empty() {
        let sheet = Sheet::new("s", vec![vec![Value::from("a")]]);
        let range = CellRange::parse("A1:A3").unwrap();
        assert_eq!(
            sheet.cells_in(&range),
            vec![&Value::from("a"), &Value::Empty, &Value::Empty]
        );
    }

    #[test]
    fn test_data_sheet_prefers_input() {
        let book = Workbook {
            sheets: vec![Sheet::new("lists", vec![]), Sheet::new("input", vec![])],
        };
        assert_eq!(book.data_sheet(None).map(|s| s.name.as_str()), Some("input"));
        assert_eq!(book.data_sheet(Some("lists")).map(|s| s.name.as_str()), Some("lists"));
        assert!(book.data_sheet(Some("other")).is_none());
    }
}
