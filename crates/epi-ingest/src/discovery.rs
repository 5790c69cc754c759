//! Medical data folder discovery and file selection.

use std::path::{Path, PathBuf};

use epi_model::DelimitedFormat;

use crate::error::{IngestError, Result};

/// Kind of files making up a medical folder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MedicalFormat {
    Xlsx,
    Delimited(DelimitedFormat),
}

impl MedicalFormat {
    fn accepts(self, extension: &str) -> bool {
        let extensions: &[&str] = match self {
            MedicalFormat::Xlsx => &["xlsx", "xlsm", "xls"],
            MedicalFormat::Delimited(DelimitedFormat::Csv) => &["csv"],
            MedicalFormat::Delimited(DelimitedFormat::Tsv) => &["tsv", "txt"],
        };
        extensions.iter().any(|e| extension.eq_ignore_ascii_case(e))
    }
}

/// Lists medical files of the given format in a directory.
///
/// Returns files sorted by filename. Office lock files (`~$name.xlsx`) are skipped.
pub fn list_medical_files(dir: &Path, format: MedicalFormat) -> Result<Vec<PathBuf>> {
    if !dir.is_dir() {
        return Err(IngestError::DirectoryNotFound {
            path: dir.to_path_buf(),
        });
    }

    let entries = std::fs::read_dir(dir).map_err(|e| IngestError::DirectoryRead {
        path: dir.to_path_buf(),
        source: e,
    })?;

    let mut files = Vec::new();
    for entry_result in entries {
        let entry = entry_result.map_err(|e| IngestError::DirectoryRead {
            path: dir.to_path_buf(),
            source: e,
        })?;
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        let is_lock_file = path
            .file_name()
            .and_then(|name| name.to_str())
            .is_some_and(|name| name.starts_with('~'));
        let matches = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| format.accepts(ext));
        if matches && !is_lock_file {
            files.push(path);
        }
    }

    files.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    Ok(files)
}

/// Files of a medical folder and the subset currently loaded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MedicalSelection {
    files: Vec<PathBuf>,
    selected: Vec<bool>,
}

impl MedicalSelection {
    /// Discover the folder and select its first file.
    pub fn discover(dir: &Path, format: MedicalFormat) -> Result<Self> {
        Ok(Self::from_files(list_medical_files(dir, format)?))
    }

    pub fn from_files(files: Vec<PathBuf>) -> Self {
        let selected = (0..files.len()).map(|i| i == 0).collect();
        Self { files, selected }
    }

    pub fn files(&self) -> &[PathBuf] {
        &self.files
    }

    /// Selected files, in folder order.
    pub fn selected(&self) -> Vec<&Path> {
        self.files
            .iter()
            .zip(&self.selected)
            .filter(|(_, selected)| **selected)
            .map(|(file, _)| file.as_path())
            .collect()
    }

    /// Replace the selection. Paths may be given by full path or file name.
    pub fn select<P: AsRef<Path>>(&mut self, subset: &[P]) -> Result<()> {
        let mut selected = vec![false; self.files.len()];
        for wanted in subset {
            let wanted = wanted.as_ref();
            let position = self
                .files
                .iter()
                .position(|file| file == wanted || file.file_name() == Some(wanted.as_os_str()))
                .ok_or_else(|| IngestError::NotInFolder {
                    path: wanted.to_path_buf(),
                })?;
            selected[position] = true;
        }
        self.selected = selected;
        Ok(())
    }
}
