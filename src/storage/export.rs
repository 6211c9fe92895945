//! Table export to CSV and JSON

use serde::Serialize;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;

use super::{ResultTable, COLUMNS};
use crate::error::{Error, Result};

/// Supported output formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Csv,
    Json,
}

impl ExportFormat {
    /// `.json` selects JSON, everything else CSV
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => Self::Json,
            _ => Self::Csv,
        }
    }
}

/// JSON record keyed by the output column names
#[derive(Serialize)]
struct JsonRow<'a> {
    #[serde(rename = "Query")]
    query: &'a str,
    #[serde(rename = "Query Timestamp")]
    query_timestamp: &'a str,
    #[serde(rename = "Response")]
    response: &'a str,
    #[serde(rename = "Response Timestamp")]
    response_timestamp: &'a str,
    #[serde(rename = "Timestamp Difference")]
    timestamp_diff: &'a str,
}

impl<'a> From<[&'a str; 5]> for JsonRow<'a> {
    fn from(cells: [&'a str; 5]) -> Self {
        let [query, query_timestamp, response, response_timestamp, timestamp_diff] = cells;
        Self {
            query,
            query_timestamp,
            response,
            response_timestamp,
            timestamp_diff,
        }
    }
}

/// Writes result tables to disk
pub struct TableExporter {
    format: ExportFormat,
}

impl TableExporter {
    pub fn new(format: ExportFormat) -> Self {
        Self { format }
    }

    /// Exporter matching the extension of `path`
    pub fn for_path(path: &Path) -> Self {
        Self::new(ExportFormat::from_path(path))
    }

    pub fn format(&self) -> ExportFormat {
        self.format
    }

    /// Write the table to `path`, creating parent directories
    pub fn export(&self, table: &ResultTable, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        let file = File::create(path)?;
        let mut writer = BufWriter::new(file);
        self.write(table, &mut writer)?;
        writer.flush()?;

        tracing::info!(
            path = %path.display(),
            format = ?self.format,
            rows = table.len(),
            "Exported result table"
        );
        Ok(())
    }

    /// Serialize the table into any writer
    pub fn write<W: Write>(&self, table: &ResultTable, writer: W) -> Result<()> {
        match self.format {
            ExportFormat::Csv => write_csv(table, writer),
            ExportFormat::Json => write_json(table, writer),
        }
    }

    /// Serialize the table into a string
    pub fn render(&self, table: &ResultTable) -> Result<String> {
        let mut buffer = Vec::new();
        self.write(table, &mut buffer)?;
        String::from_utf8(buffer)
            .map_err(|e| Error::with_source("Exported table is not valid UTF-8", e))
    }
}

fn write_csv<W: Write>(table: &ResultTable, writer: W) -> Result<()> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    csv_writer.write_record(COLUMNS)?;
    for row in table.rows() {
        csv_writer.write_record(row)?;
    }
    csv_writer.flush()?;
    Ok(())
}

fn write_json<W: Write>(table: &ResultTable, mut writer: W) -> Result<()> {
    let rows: Vec<JsonRow<'_>> = table.rows().map(JsonRow::from).collect();
    serde_json::to_writer_pretty(&mut writer, &rows)?;
    writer.write_all(b"\n")?;
    Ok(())
}
