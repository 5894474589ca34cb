//! Append-only segment writer

use std::fs::{self, File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use spindle_protocol::Superstep;

use crate::error::{RecoveryError, Result};

const WRITE_BUFFER_SIZE: usize = 32 * 1024;

/// Buffered writer for one recovery segment
///
/// Frames are written as given; the caller passes complete
/// `[length][payload]` frames.
pub struct SegmentWriter {
    path: PathBuf,
    superstep: Superstep,
    writer: BufWriter<File>,
    records: u64,
    bytes: u64,
}

impl SegmentWriter {
    /// Create (or truncate) the segment at `path`, creating parent directories
    pub fn create(path: impl Into<PathBuf>, superstep: Superstep) -> Result<Self> {
        Self::open_with(path.into(), superstep, false)
    }

    /// Open the segment at `path` for appending, creating it if missing
    pub fn append(path: impl Into<PathBuf>, superstep: Superstep) -> Result<Self> {
        Self::open_with(path.into(), superstep, true)
    }

    fn open_with(path: PathBuf, superstep: Superstep, append: bool) -> Result<Self> {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent).map_err(|e| RecoveryError::io(parent, e))?;
        }

        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .append(append)
            .truncate(!append)
            .open(&path)
            .map_err(|e| RecoveryError::io(&path, e))?;
        Ok(Self {
            path,
            superstep,
            writer: BufWriter::with_capacity(WRITE_BUFFER_SIZE, file),
            records: 0,
            bytes: 0,
        })
    }

    /// Append one framed record
    pub fn write_frame(&mut self, frame: &[u8]) -> Result<()> {
        self.writer
            .write_all(frame)
            .map_err(|e| RecoveryError::io(&self.path, e))?;
        self.records += 1;
        self.bytes += frame.len() as u64;
        Ok(())
    }

    /// Flush buffered frames to the file
    pub fn flush(&mut self) -> Result<()> {
        self.writer
            .flush()
            .map_err(|e| RecoveryError::io(&self.path, e))
    }

    /// Flush and close the segment
    ///
    /// Returns the number of records written.
    pub fn finish(mut self) -> Result<u64> {
        self.flush()?;
        Ok(self.records)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Superstep this segment belongs to
    pub fn superstep(&self) -> Superstep {
        self.superstep
    }

    pub fn records(&self) -> u64 {
        self.records
    }

    pub fn bytes(&self) -> u64 {
        self.bytes
    }
}

impl std::fmt::Debug for SegmentWriter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SegmentWriter")
            .field("path", &self.path)
            .field("superstep", &self.superstep)
            .field("records", &self.records)
            .field("bytes", &self.bytes)
            .finish()
    }
}
