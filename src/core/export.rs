use crate::core::spreadsheet::{write_table_xlsx, CellValue};
use crate::domain::model::{ImportRow, RedirectRule, RedirectStats, SheetTable};
use crate::utils::error::{RedirectError, Result};
use csv::{Terminator, Writer, WriterBuilder};
use std::collections::BTreeSet;
use std::io::Write;
use zip::write::{FileOptions, ZipWriter};

/// A file produced by a load step, named relative to the output directory.
#[derive(Debug, Clone)]
pub struct OutputFile {
    pub name: String,
    pub data: Vec<u8>,
}

impl OutputFile {
    pub fn new(name: impl Into<String>, data: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            data,
        }
    }
}

/// Unix line endings regardless of platform.
fn writer() -> Writer<Vec<u8>> {
    WriterBuilder::new()
        .terminator(Terminator::Any(b'\n'))
        .from_writer(Vec::new())
}

fn finish(writer: Writer<Vec<u8>>) -> Result<Vec<u8>> {
    writer
        .into_inner()
        .map_err(|e| RedirectError::IoError(e.into_error()))
}

pub fn redirects_csv(rules: &BTreeSet<RedirectRule>) -> Result<Vec<u8>> {
    let mut writer = writer();
    writer.write_record(["Redirect from", "Redirect to", "Source"])?;
    for rule in rules {
        writer.write_record([&rule.source_path, &rule.target, &rule.origin_label])?;
    }
    finish(writer)
}

/// Upload file keeps one line per rule, so provenance-only duplicates repeat.
pub fn upload_csv(rules: &BTreeSet<RedirectRule>) -> Result<Vec<u8>> {
    let mut writer = writer();
    writer.write_record(["Redirect from", "Redirect to"])?;
    for rule in rules {
        writer.write_record([&rule.source_path, &rule.target])?;
    }
    finish(writer)
}

pub fn missing_csv(missing_paths: &BTreeSet<String>) -> Result<Vec<u8>> {
    let mut writer = writer();
    writer.write_record(["Missing Sitemap URLs"])?;
    for path in missing_paths {
        writer.write_record([path])?;
    }
    finish(writer)
}

pub fn stats_csv(stats: &RedirectStats) -> Result<Vec<u8>> {
    let mut writer = writer();
    writer.write_record(["Metric", "Value"])?;
    for (metric, value) in stats.rows() {
        writer.write_record([metric, value.to_string()])?;
    }
    finish(writer)
}

pub fn import_csv(rows: &[ImportRow]) -> Result<Vec<u8>> {
    let mut writer = writer();
    if rows.is_empty() {
        writer.write_record(["Redirect from", "Redirect to", "Redirect Type", "Command"])?;
    }
    for row in rows {
        writer.serialize(row)?;
    }
    finish(writer)
}

pub fn type_breakdown_xlsx(type_counts: &[(String, usize)]) -> Result<Vec<u8>> {
    let headers = vec!["Type".to_string(), "Redirects".to_string()];
    let rows: Vec<Vec<CellValue>> = type_counts
        .iter()
        .map(|(value, count)| vec![CellValue::from(value.clone()), CellValue::from(*count)])
        .collect();
    write_table_xlsx("Sheet1", &headers, &rows)
}

pub fn sheet_xlsx(table: &SheetTable) -> Result<Vec<u8>> {
    let rows: Vec<Vec<CellValue>> = table
        .rows
        .iter()
        .map(|row| row.iter().cloned().map(CellValue::from).collect())
        .collect();
    write_table_xlsx("Sheet1", &table.headers, &rows)
}

pub fn bundle_zip(files: &[OutputFile]) -> Result<Vec<u8>> {
    let mut zip = ZipWriter::new(std::io::Cursor::new(Vec::new()));

    for file in files {
        zip.start_file::<_, ()>(file.name.as_str(), FileOptions::default())?;
        zip.write_all(&file.data)?;
    }

    let cursor = zip.finish()?;
    Ok(cursor.into_inner())
}
