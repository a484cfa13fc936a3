//! Tab-delimited record reader.
//!
//! Fields are split on TAB with no quote handling, and rows may have any number of fields. Use
//! [`field`] to read a column that a short row does not have.
//!
//! Records are read as raw bytes. Bytes that are not valid UTF-8 decode to U+FFFD instead of
//! failing the read.

use std::borrow::Cow;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use csv::{ByteRecord, ReaderBuilder};

use crate::error::{ImportError, ImportResult};

const BOM: char = '\u{feff}';

/// Forward-only reader over the records of one TSV stream.
///
/// A reader is consumed by a single pass; reading a file again means opening a new reader.
pub struct TsvReader<R> {
    inner: csv::Reader<R>,
}

impl TsvReader<File> {
    /// Open `path` for a single read pass.
    pub fn from_path(path: &Path) -> ImportResult<Self> {
        let file = File::open(path).map_err(|source| ImportError::Io {
            path: path.to_path_buf(),
            operation: "open",
            source,
        })?;
        Ok(Self::from_reader(file))
    }
}

impl<R: Read> TsvReader<R> {
    /// Wrap an arbitrary byte stream.
    pub fn from_reader(rdr: R) -> Self {
        let inner = ReaderBuilder::new()
            .delimiter(b'\t')
            .has_headers(false)
            .flexible(true)
            .quoting(false)
            .from_reader(rdr);
        Self { inner }
    }

    /// Read the next record into `record`.
    ///
    /// Returns `Ok(false)` at end of stream. Blank lines are skipped by the underlying reader.
    pub fn read_record(&mut self, record: &mut ByteRecord) -> csv::Result<bool> {
        self.inner.read_byte_record(record)
    }

    /// Read the header row, with a leading byte-order mark removed from the first field.
    ///
    /// An empty stream yields an empty header.
    pub fn read_header(&mut self) -> csv::Result<Vec<String>> {
        let mut record = ByteRecord::new();
        if !self.read_record(&mut record)? {
            return Ok(Vec::new());
        }
        let mut header: Vec<String> = record
            .iter()
            .map(|raw| String::from_utf8_lossy(raw).into_owned())
            .collect();
        if let Some(first) = header.first_mut() {
            if let Some(stripped) = first.strip_prefix(BOM) {
                *first = stripped.to_string();
            }
        }
        Ok(header)
    }
}

/// Trimmed value of column `idx`, or `""` when the record is too short.
pub fn field(record: &ByteRecord, idx: usize) -> Cow<'_, str> {
    match record.get(idx).map(String::from_utf8_lossy) {
        None => Cow::Borrowed(""),
        Some(Cow::Borrowed(s)) => Cow::Borrowed(s.trim()),
        Some(Cow::Owned(s)) => Cow::Owned(s.trim().to_string()),
    }
}

/// True when every field of the record is empty after trimming.
pub fn is_blank_record(record: &ByteRecord) -> bool {
    (0..record.len()).all(|idx| field(record, idx).is_empty())
}
