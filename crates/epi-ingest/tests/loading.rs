//! End-to-end loading of delimited medical folders.

use std::path::{Path, PathBuf};

use epi_ingest::{
    FieldMapper, MedicalFormat, MedicalSelection, MedicalSource, RecordLoader, fingerprint,
};
use epi_model::{DelimitedFormat, FieldSpec, FixerKind, RecordFilterSpec, Value};
use tempfile::TempDir;

fn fields() -> Vec<FieldSpec> {
    let field = |key: &str, header: &str, fixer: Option<FixerKind>| FieldSpec {
        key: key.to_string(),
        header: header.to_string(),
        fixer,
    };
    vec![
        field("id", "Patient ID", None),
        field("date", "Date", Some(FixerKind::Date)),
        field("admN1", "District", None),
        field("age", "Age (years)", Some(FixerKind::Age)),
        field("diagnosis", "Diagnosis", Some(FixerKind::Diagnosis)),
    ]
}

fn folder() -> TempDir {
    let dir = TempDir::new().unwrap();
    std::fs::write(
        dir.path().join("week_01.csv"),
        "patient id,DATE,district,AGE,diagnosis,comment\n\
         P1,15/03/21,Bo,34,\"A00.1,B02\",fine\n\
         ,,,,,\n\
         P2,2021-03-16,Kenema,130,A09,\n",
    )
    .unwrap();
    std::fs::write(
        dir.path().join("week_02.csv"),
        "Diagnosis,Patient ID,Date,District\n\
         B05,P3,22/03/21,Bo\n\
         X1,P4,23/03/21,Bo\n",
    )
    .unwrap();
    std::fs::write(dir.path().join("readme.txt"), "not data").unwrap();
    dir
}

fn loader(dir: &Path, filter: Option<&RecordFilterSpec>) -> RecordLoader {
    RecordLoader::new(
        FieldMapper::new(&fields(), filter).unwrap(),
        MedicalSource {
            folder: dir.to_path_buf(),
            format: MedicalFormat::Delimited(DelimitedFormat::Csv),
            sheet: None,
            extras: Vec::new(),
        },
    )
}

#[test]
fn test_default_selection_loads_first_file_only() {
    let dir = folder();
    let loader = loader(dir.path(), None);
    let selection = loader.source().discover().unwrap();
    let loaded = loader.load_selection(&selection);

    assert!(loaded.failures.is_empty());
    assert_eq!(loaded.records.len(), 2);
    assert_eq!(loaded.records.sources[0].skipped_empty, 1);
    assert_eq!(
        loaded.records.value(0, "diagnosis"),
        Some(&Value::from("A00: Cholera"))
    );
    assert_eq!(loaded.records.value(0, "date"), Some(&Value::from("2021-03-15")));
    assert_eq!(loaded.records.value(1, "age"), Some(&Value::Number(-1.0)));
}

#[test]
fn test_selected_files_merge_in_folder_order() {
    let dir = folder();
    let loader = loader(dir.path(), None);
    let mut selection =
        MedicalSelection::discover(dir.path(), MedicalFormat::Delimited(DelimitedFormat::Csv))
            .unwrap();
    selection.select(&["week_02.csv", "week_01.csv"]).unwrap();
    let loaded = loader.load_selection(&selection);

    let ids: Vec<String> = (0..loaded.records.len())
        .map(|i| loaded.records.value(i, "id").unwrap().to_string())
        .collect();
    assert_eq!(ids, vec!["P1", "P2", "P3", "P4"]);
    assert_eq!(
        loaded.records.sources[1].unmatched_fields,
        vec!["age".to_string()]
    );
    assert!(loaded.records.unmatched_fields().is_empty());
}

#[test]
fn test_reload_is_byte_identical() {
    let dir = folder();
    let loader = loader(dir.path(), None);
    let files = [
        dir.path().join("week_01.csv"),
        dir.path().join("week_02.csv"),
    ];
    let paths: Vec<&Path> = files.iter().map(PathBuf::as_path).collect();
    let first = loader.load(&paths);
    let second = loader.load(&paths);
    assert_eq!(first.records, second.records);
    assert_eq!(fingerprint(&first.records), fingerprint(&second.records));
}

#[test]
fn test_record_filter_and_unreadable_file() {
    let dir = folder();
    let filter = RecordFilterSpec {
        field: "diagnosis".to_string(),
        pattern: "^[A-W]".to_string(),
    };
    let loader = loader(dir.path(), Some(&filter));
    let missing = dir.path().join("week_09.csv");
    let present = dir.path().join("week_02.csv");
    let loaded = loader.load(&[missing.as_path(), present.as_path()]);

    assert_eq!(loaded.failures.len(), 1);
    assert_eq!(loaded.records.len(), 1);
    assert_eq!(loaded.records.sources[0].filtered_out, 1);
}
