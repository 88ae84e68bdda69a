//! Incremental CSV/JSON output for a scrape run.
//!
//! Both files are rewritten from the cumulative record list on every flush,
//! so a run interrupted mid-way still leaves complete files behind and the
//! CSV header always covers every key seen so far.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use anyhow::Context;
use lodgedb_core::HotelRecord;
use serde_json::{Map, Value};

const FILE_STEM_PREFIX: &str = "lodgedb_hotels";

pub(crate) struct OutputWriter {
    csv_path: PathBuf,
    json_path: PathBuf,
    records: Vec<HotelRecord>,
    flushed: usize,
}

impl OutputWriter {
    /// Output files named `lodgedb_hotels_<stamp>.{csv,json}` under `dir`.
    pub(crate) fn new(dir: &Path, stamp: &str) -> Self {
        let stem = format!("{FILE_STEM_PREFIX}_{stamp}");
        Self {
            csv_path: dir.join(format!("{stem}.csv")),
            json_path: dir.join(format!("{stem}.json")),
            records: Vec::new(),
            flushed: 0,
        }
    }

    /// Stamped with the local time as `YYYYMMDD_HHMMSS`.
    pub(crate) fn timestamped(dir: &Path) -> Self {
        let stamp = chrono::Local::now().format("%Y%m%d_%H%M%S").to_string();
        Self::new(dir, &stamp)
    }

    pub(crate) fn push(&mut self, record: HotelRecord) {
        self.records.push(record);
    }

    pub(crate) fn pending(&self) -> usize {
        self.records.len() - self.flushed
    }

    pub(crate) fn records(&self) -> &[HotelRecord] {
        &self.records
    }

    pub(crate) fn csv_path(&self) -> &Path {
        &self.csv_path
    }

    pub(crate) fn json_path(&self) -> &Path {
        &self.json_path
    }

    /// Writes both files from every record pushed so far.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or any file write fails.
    pub(crate) fn flush(&mut self) -> anyhow::Result<()> {
        if let Some(parent) = self.csv_path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }

        let json = serde_json::to_string_pretty(&self.records)?;
        std::fs::write(&self.json_path, json)
            .with_context(|| format!("failed to write {}", self.json_path.display()))?;

        let rows = self
            .records
            .iter()
            .map(|record| match serde_json::to_value(record)? {
                Value::Object(map) => Ok(map),
                other => anyhow::bail!("hotel record serialized to non-object {other}"),
            })
            .collect::<anyhow::Result<Vec<_>>>()?;
        let file = std::fs::File::create(&self.csv_path)
            .with_context(|| format!("failed to create {}", self.csv_path.display()))?;
        write_csv(&rows, file)?;

        tracing::info!(
            batch = self.records.len() - self.flushed,
            total = self.records.len(),
            csv = %self.csv_path.display(),
            "saved hotel batch"
        );
        self.flushed = self.records.len();
        Ok(())
    }
}

/// Writes `rows` as CSV with the sorted union of their keys as the header.
pub(crate) fn write_csv<W: std::io::Write>(
    rows: &[Map<String, Value>],
    writer: W,
) -> anyhow::Result<()> {
    let columns: BTreeSet<&str> = rows
        .iter()
        .flat_map(|row| row.keys().map(String::as_str))
        .collect();

    let mut csv = csv::Writer::from_writer(writer);
    csv.write_record(&columns)?;
    for row in rows {
        csv.write_record(columns.iter().map(|column| csv_cell(row.get(*column))))?;
    }
    csv.flush()?;
    Ok(())
}

/// Scalars as plain text with newlines flattened; arrays and objects as
/// JSON.
pub(crate) fn csv_cell(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::Bool(b)) => b.to_string(),
        Some(Value::Number(n)) => n.to_string(),
        Some(Value::String(s)) => s.replace("\r\n", " ").replace(['\r', '\n'], " "),
        Some(nested) => nested.to_string(),
    }
}
