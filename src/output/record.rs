//! Output records and the per-page record buffer

use serde::{Deserialize, Serialize};
use std::fs::{self, File, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::Path;

/// One chunk as written to the records file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputRecord {
    /// Ordinal of the chunk within its page
    #[serde(rename = "chunk-id")]
    pub chunk_id: String,
    pub source: String,
    pub title: String,
    pub chunk: String,
    pub updated: String,
}

impl OutputRecord {
    pub fn new(
        ordinal: usize,
        source: impl Into<String>,
        title: impl Into<String>,
        chunk: impl Into<String>,
        updated: impl Into<String>,
    ) -> Self {
        Self {
            chunk_id: ordinal.to_string(),
            source: source.into(),
            title: title.into(),
            chunk: chunk.into(),
            updated: updated.into(),
        }
    }
}

/// Records of the page currently being processed
#[derive(Debug, Default)]
pub struct RecordBuffer {
    records: Vec<OutputRecord>,
}

impl RecordBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&mut self, record: OutputRecord) {
        self.records.push(record);
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Appends the buffered records to `path` as JSON lines and clears the buffer
    ///
    /// Parent directories are created as needed. The buffer is cleared only when the write
    /// succeeds.
    ///
    /// # Returns
    ///
    /// The number of records written.
    pub fn flush(&mut self, path: &Path) -> io::Result<usize> {
        if self.records.is_empty() {
            return Ok(0);
        }

        ensure_parent_dir(path)?;
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        let mut writer = BufWriter::new(file);

        for record in &self.records {
            serde_json::to_writer(&mut writer, record)?;
            writer.write_all(b"\n")?;
        }
        writer.flush()?;

        let written = self.records.len();
        self.records.clear();
        Ok(written)
    }

    /// Drops buffered records without writing them
    pub fn discard(&mut self) {
        self.records.clear();
    }
}

/// Empties the records file, creating it if missing
pub fn truncate_output(path: &Path) -> io::Result<()> {
    ensure_parent_dir(path)?;
    File::create(path)?;
    Ok(())
}

pub(crate) fn ensure_parent_dir(path: &Path) -> io::Result<()> {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => fs::create_dir_all(parent),
        _ => Ok(()),
    }
}
