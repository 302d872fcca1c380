//! Persist finalized tables.
//!
//! The CSV layout is meant to be easy to consume in spreadsheets or downstream
//! scripts: a `time` column followed by one column per series, absent cells
//! left empty.

use std::fs::{File, create_dir_all};
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::domain::WideTable;
use crate::error::SinkError;

/// Name of the leading period column in written tables.
pub const TIME_COLUMN: &str = "time";

/// Consumer of finalized tables.
pub trait Sink {
    fn write_table(&mut self, name: &str, table: &WideTable) -> Result<(), SinkError>;
}

/// Writes each table to `<dir>/<name>.csv`.
#[derive(Debug, Clone)]
pub struct CsvSink {
    dir: PathBuf,
}

impl CsvSink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path_for(&self, name: &str) -> PathBuf {
        self.dir.join(format!("{name}.csv"))
    }
}

impl Sink for CsvSink {
    fn write_table(&mut self, name: &str, table: &WideTable) -> Result<(), SinkError> {
        create_dir_all(&self.dir)?;
        let path = self.path_for(name);
        let file = File::create(&path)?;
        write_csv(file, table)?;
        debug!(path = %path.display(), rows = table.rows.len(), "table written");
        Ok(())
    }
}

/// Write a table as CSV to any writer.
pub fn write_csv<W: std::io::Write>(writer: W, table: &WideTable) -> Result<(), SinkError> {
    let mut wtr = csv::Writer::from_writer(writer);

    let mut header = Vec::with_capacity(table.columns.len() + 1);
    header.push(TIME_COLUMN);
    header.extend(table.columns.iter().map(String::as_str));
    wtr.write_record(&header)?;

    for row in &table.rows {
        let mut record = Vec::with_capacity(row.values.len() + 1);
        record.push(row.period.clone());
        record.extend(
            row.values
                .iter()
                .map(|v| v.map(|x| x.to_string()).unwrap_or_default()),
        );
        wtr.write_record(&record)?;
    }

    wtr.flush()?;
    Ok(())
}

/// Keeps written tables in memory, in write order.
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    pub tables: Vec<(String, WideTable)>,
}

impl MemorySink {
    pub fn get(&self, name: &str) -> Option<&WideTable> {
        self.tables.iter().find(|(n, _)| n == name).map(|(_, t)| t)
    }
}

impl Sink for MemorySink {
    fn write_table(&mut self, name: &str, table: &WideTable) -> Result<(), SinkError> {
        self.tables.push((name.to_string(), table.clone()));
        Ok(())
    }
}
