//! Medical record loading across one or more selected files.

use std::path::{Path, PathBuf};

use epi_model::{ExtraSpec, RecordSet, SourceMethod};

use crate::discovery::{MedicalFormat, MedicalSelection};
use crate::error::{IngestError, Result};
use crate::extras::read_extras;
use crate::mapper::FieldMapper;
use crate::reader::{read_delimited, read_workbook};

/// Where and how medical files are read.
#[derive(Debug, Clone, PartialEq)]
pub struct MedicalSource {
    pub folder: PathBuf,
    pub format: MedicalFormat,
    /// Data sheet of workbooks; defaults to `input`, then the first sheet.
    pub sheet: Option<String>,
    pub extras: Vec<ExtraSpec>,
}

impl MedicalSource {
    /// Medical source described by a load-sequence method, if it is one.
    pub fn from_method(method: &SourceMethod) -> Option<Self> {
        match method {
            SourceMethod::MedicalXlsx {
                folder,
                sheet,
                extras,
            } => Some(Self {
                folder: folder.clone(),
                format: MedicalFormat::Xlsx,
                sheet: sheet.clone(),
                extras: extras.clone(),
            }),
            SourceMethod::MedicalDelimited { folder, format } => Some(Self {
                folder: folder.clone(),
                format: MedicalFormat::Delimited(*format),
                sheet: None,
                extras: Vec::new(),
            }),
            _ => None,
        }
    }

    /// Discover the folder, with its first file selected.
    pub fn discover(&self) -> Result<MedicalSelection> {
        MedicalSelection::discover(&self.folder, self.format)
    }
}

/// Records from a load plus the files that could not be read.
#[derive(Debug, Default)]
pub struct LoadedRecords {
    pub records: RecordSet,
    pub failures: Vec<IngestError>,
}

/// Reads selected medical files into one canonical record set.
#[derive(Debug, Clone)]
pub struct RecordLoader {
    mapper: FieldMapper,
    source: MedicalSource,
}

impl RecordLoader {
    pub fn new(mapper: FieldMapper, source: MedicalSource) -> Self {
        Self { mapper, source }
    }

    pub fn source(&self) -> &MedicalSource {
        &self.source
    }

    /// Load files in the given order, rows in file order.
    ///
    /// A file that cannot be read is logged, recorded in `failures` and skipped.
    pub fn load(&self, files: &[&Path]) -> LoadedRecords {
        let mut loaded = LoadedRecords {
            records: RecordSet::new(self.mapper.schema().clone()),
            failures: Vec::new(),
        };
        for path in files {
            if let Err(error) = self.load_file(path, &mut loaded.records) {
                tracing::error!(path = %path.display(), %error, "skipping unreadable medical file");
                loaded.failures.push(error);
            }
        }
        tracing::info!(
            files = files.len(),
            failed = loaded.failures.len(),
            records = loaded.records.len(),
            "loaded medical records"
        );
        loaded
    }

    /// Load the selected files of a selection.
    pub fn load_selection(&self, selection: &MedicalSelection) -> LoadedRecords {
        self.load(&selection.selected())
    }

    fn load_file(&self, path: &Path, set: &mut RecordSet) -> Result<()> {
        let (records, summary) = match self.source.format {
            MedicalFormat::Xlsx => {
                let workbook = read_workbook(path)?;
                let sheet = workbook
                    .data_sheet(self.source.sheet.as_deref())
                    .ok_or_else(|| IngestError::SheetNotFound {
                        path: path.to_path_buf(),
                        sheet: self.source.sheet.clone().unwrap_or_else(|| "input".to_string()),
                    })?;
                let mapped = self.mapper.map_sheet(sheet, path);
                read_extras(&workbook, &self.source.extras, &mut set.extras, path);
                mapped
            }
            MedicalFormat::Delimited(format) => {
                let sheet = read_delimited(path, format.delimiter())?;
                self.mapper.map_sheet(&sheet, path)
            }
        };
        set.records.extend(records);
        set.sources.push(summary);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use epi_model::{DelimitedFormat, FieldSpec};

    #[test]
    fn test_from_method() {
        let method = SourceMethod::MedicalDelimited {
            folder: "data".into(),
            format: DelimitedFormat::Tsv,
        };
        let source = MedicalSource::from_method(&method).unwrap();
        assert_eq!(source.format, MedicalFormat::Delimited(DelimitedFormat::Tsv));
        assert!(MedicalSource::from_method(&SourceMethod::Unknown).is_none());
    }

    #[test]
    fn test_missing_file_is_a_failure_not_a_halt() {
        let fields = vec![FieldSpec {
            key: "id".into(),
            header: "id".into(),
            fixer: None,
        }];
        let loader = RecordLoader::new(
            FieldMapper::new(&fields, None).unwrap(),
            MedicalSource {
                folder: "missing".into(),
                format: MedicalFormat::Xlsx,
                sheet: None,
                extras: Vec::new(),
            },
        );
        let loaded = loader.load(&[Path::new("missing/a.xlsx")]);
        assert!(loaded.records.is_empty());
        assert_eq!(loaded.failures.len(), 1);
    }
}
