//! Embedded ICD-10 three-character headings.

use std::collections::BTreeMap;
use std::sync::LazyLock;

/// ICD-10 headings as `code<TAB>heading`, one per line after a header row.
const ICD10_HEADINGS_TSV: &str = include_str!("../data/icd10/headings.tsv");

static ICD10_HEADINGS: LazyLock<BTreeMap<String, String>> = LazyLock::new(|| {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(b'\t')
        .quoting(false)
        .has_headers(true)
        .from_reader(ICD10_HEADINGS_TSV.as_bytes());
    let mut map = BTreeMap::new();
    for record in reader.records().flatten() {
        if let (Some(code), Some(heading)) = (record.get(0), record.get(1)) {
            map.insert(code.to_string(), heading.to_string());
        }
    }
    map
});

/// Heading for a three-character code such as `A00`.
pub fn icd10_heading(code: &str) -> Option<&'static str> {
    ICD10_HEADINGS.get(code).map(String::as_str)
}

/// Number of embedded headings.
pub fn icd10_heading_count() -> usize {
    ICD10_HEADINGS.len()
}
