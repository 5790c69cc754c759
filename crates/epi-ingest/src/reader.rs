//! Raw readers for delimited text, spreadsheet workbooks and side layers.

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use calamine::{Data, Reader, open_workbook_auto};
use epi_model::{FileFormat, Value, format_number};

use crate::error::{IngestError, Result};
use crate::sheet::{Sheet, Workbook};

fn open(path: &Path) -> Result<File> {
    File::open(path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            IngestError::FileNotFound {
                path: path.to_path_buf(),
            }
        } else {
            IngestError::FileRead {
                path: path.to_path_buf(),
                source: e,
            }
        }
    })
}

/// Reject UTF-16 text; a UTF-8 byte order mark is stripped per cell.
pub fn validate_encoding(path: &Path) -> Result<()> {
    let mut file = open(path)?;
    let mut buffer = [0u8; 2];
    let bytes_read = file.read(&mut buffer).map_err(|e| IngestError::FileRead {
        path: path.to_path_buf(),
        source: e,
    })?;
    if bytes_read == 2 {
        let encoding = match buffer {
            [0xFF, 0xFE] => Some("UTF-16 LE"),
            [0xFE, 0xFF] => Some("UTF-16 BE"),
            _ => None,
        };
        if let Some(encoding) = encoding {
            return Err(IngestError::UnsupportedEncoding {
                path: path.to_path_buf(),
                encoding,
            });
        }
    }
    Ok(())
}

/// Read a delimited text file into a single sheet, header row included.
pub fn read_delimited(path: &Path, delimiter: u8) -> Result<Sheet> {
    validate_encoding(path)?;
    let file = open(path)?;
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(false)
        .flexible(true)
        .from_reader(BufReader::new(file));

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|e| IngestError::Delimited {
            path: path.to_path_buf(),
            source: e,
        })?;
        rows.push(record.iter().map(Value::from_cell).collect());
    }

    let name = path
        .file_stem()
        .and_then(|stem| stem.to_str())
        .unwrap_or_default();
    tracing::debug!(path = %path.display(), rows = rows.len(), "read delimited file");
    Ok(Sheet::new(name, rows))
}

fn cell_value(cell: &Data) -> Value {
    match cell {
        Data::Int(number) => Value::Number(*number as f64),
        Data::Float(number) => Value::Number(*number),
        Data::DateTime(date) => Value::Number(date.as_f64()),
        Data::String(text) | Data::DateTimeIso(text) | Data::DurationIso(text) => {
            Value::from_cell(text)
        }
        Data::Bool(flag) => Value::Text(flag.to_string()),
        Data::Error(_) | Data::Empty => Value::Empty,
    }
}

/// Read every sheet of a workbook, keeping absolute cell positions.
pub fn read_workbook(path: &Path) -> Result<Workbook> {
    let workbook_error = |e: calamine::Error| IngestError::Workbook {
        path: path.to_path_buf(),
        message: e.to_string(),
    };
    if !path.is_file() {
        return Err(IngestError::FileNotFound {
            path: path.to_path_buf(),
        });
    }
    let mut workbook = open_workbook_auto(path).map_err(workbook_error)?;
    let names = workbook.sheet_names();
    if names.is_empty() {
        return Err(IngestError::NoSheets {
            path: path.to_path_buf(),
        });
    }

    let mut sheets = Vec::with_capacity(names.len());
    for name in names {
        let range = workbook.worksheet_range(&name).map_err(workbook_error)?;
        let (row_offset, column_offset) = range
            .start()
            .map(|(row, column)| (row as usize, column as usize))
            .unwrap_or((0, 0));
        let mut rows: Vec<Vec<Value>> = vec![Vec::new(); row_offset];
        for cells in range.rows() {
            let mut row = vec![Value::Empty; column_offset];
            row.extend(cells.iter().map(cell_value));
            rows.push(row);
        }
        sheets.push(Sheet::new(name, rows));
    }
    tracing::debug!(path = %path.display(), sheets = sheets.len(), "read workbook");
    Ok(Workbook { sheets })
}

/// A generic layer loaded by name alongside the medical data.
#[derive(Debug, Clone, PartialEq)]
pub enum SideLayer {
    Json(serde_json::Value),
    Table(Sheet),
}

impl SideLayer {
    /// Number of top-level entries: features, array items or data rows.
    pub fn entry_count(&self) -> usize {
        match self {
            SideLayer::Json(serde_json::Value::Array(items)) => items.len(),
            SideLayer::Json(value) => value
                .get("features")
                .and_then(serde_json::Value::as_array)
                .map_or(1, Vec::len),
            SideLayer::Table(sheet) => sheet.data_rows().len(),
        }
    }
}

/// Format implied by a file extension; `.txt` is tab separated.
pub fn format_from_extension(path: &Path) -> Option<FileFormat> {
    let extension = path.extension()?.to_str()?.to_ascii_lowercase();
    match extension.as_str() {
        "json" | "geojson" | "topojson" => Some(FileFormat::Json),
        "csv" => Some(FileFormat::Csv),
        "tsv" | "txt" => Some(FileFormat::Tsv),
        _ => None,
    }
}

pub fn read_json(path: &Path) -> Result<serde_json::Value> {
    let file = open(path)?;
    serde_json::from_reader(BufReader::new(file)).map_err(|e| IngestError::Json {
        path: path.to_path_buf(),
        source: e,
    })
}

/// Read a side layer, inferring the format from the extension when not given.
pub fn read_side_layer(path: &Path, format: Option<FileFormat>) -> Result<SideLayer> {
    let format = format
        .or_else(|| format_from_extension(path))
        .unwrap_or(FileFormat::Json);
    match format {
        FileFormat::Json => read_json(path).map(SideLayer::Json),
        FileFormat::Csv => read_delimited(path, b',').map(SideLayer::Table),
        FileFormat::Tsv => read_delimited(path, b'\t').map(SideLayer::Table),
    }
}

/// Text of a cell as stored in extras.
pub(crate) fn cell_text(value: &Value) -> String {
    match value {
        Value::Number(number) => format_number(*number),
        other => other.to_string(),
    }
}
