//! Segment reader
//!
//! Reads back the frames a `SegmentWriter` produced. A clean end of file
//! between frames ends the stream; a file that ends inside a frame is
//! reported as corrupt.

use std::fs::File;
use std::io::{self, BufReader, Read};
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use spindle_protocol::{LENGTH_FIELD_SIZE, decode_record, frame_length};

use crate::error::{RecoveryError, Result};

/// Sequential reader over the frames of one segment
#[derive(Debug)]
pub struct RecoveryLogReader {
    path: PathBuf,
    reader: BufReader<File>,
}

impl RecoveryLogReader {
    /// Open a segment for reading
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = File::open(&path).map_err(|e| RecoveryError::io(&path, e))?;
        Ok(Self {
            reader: BufReader::with_capacity(32 * 1024, file),
            path,
        })
    }

    /// Read the next record payload (length field stripped)
    ///
    /// Returns `None` at end of file.
    pub fn read_frame(&mut self) -> Result<Option<Vec<u8>>> {
        let mut header = [0u8; LENGTH_FIELD_SIZE];
        let filled = self.fill(&mut header)?;
        if filled == 0 {
            return Ok(None);
        }
        if filled < LENGTH_FIELD_SIZE {
            return Err(RecoveryError::corrupt(
                &self.path,
                format!("length field truncated after {filled} bytes"),
            ));
        }

        let len = frame_length(header);
        let mut payload = vec![0u8; len];
        let filled = self.fill(&mut payload)?;
        if filled < len {
            return Err(RecoveryError::corrupt(
                &self.path,
                format!("payload truncated: expected {len} bytes, found {filled}"),
            ));
        }
        Ok(Some(payload))
    }

    /// Read and decode the next record
    pub fn read_record<T: DeserializeOwned>(&mut self) -> Result<Option<T>> {
        match self.read_frame()? {
            Some(payload) => Ok(Some(decode_record(&payload)?)),
            None => Ok(None),
        }
    }

    /// Read every remaining record payload
    pub fn read_all(&mut self) -> Result<Vec<Vec<u8>>> {
        let mut frames = Vec::new();
        while let Some(frame) = self.read_frame()? {
            frames.push(frame);
        }
        Ok(frames)
    }

    /// Consume the reader into an iterator of record payloads
    pub fn frames(self) -> FrameIterator {
        FrameIterator { reader: self }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Fill `buf` as far as the file allows, returning the bytes read
    fn fill(&mut self, buf: &mut [u8]) -> Result<usize> {
        let mut filled = 0;
        while filled < buf.len() {
            match self.reader.read(&mut buf[filled..]) {
                Ok(0) => break,
                Ok(n) => filled += n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
                Err(e) => return Err(RecoveryError::io(&self.path, e)),
            }
        }
        Ok(filled)
    }
}

/// Iterator over the record payloads of a segment
pub struct FrameIterator {
    reader: RecoveryLogReader,
}

impl Iterator for FrameIterator {
    type Item = Result<Vec<u8>>;

    fn next(&mut self) -> Option<Self::Item> {
        self.reader.read_frame().transpose()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::writer::SegmentWriter;
    use spindle_protocol::{Superstep, encode_record_to_vec};
    use std::fs;

    fn write_segment(path: &Path, records: &[&str]) {
        let mut writer = SegmentWriter::create(path, Superstep::FIRST).unwrap();
        for record in records {
            writer.write_frame(&encode_record_to_vec(record).unwrap()).unwrap();
        }
        writer.finish().unwrap();
    }

    #[test]
    fn test_read_records_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("seg.log");
        write_segment(&path, &["alpha", "beta", "gamma"]);

        let mut reader = RecoveryLogReader::open(&path).unwrap();
        assert_eq!(reader.read_record::<String>().unwrap().as_deref(), Some("alpha"));
        assert_eq!(reader.read_record::<String>().unwrap().as_deref(), Some("beta"));
        assert_eq!(reader.read_record::<String>().unwrap().as_deref(), Some("gamma"));
        assert!(reader.read_record::<String>().unwrap().is_none());
    }

    #[test]
    fn test_empty_segment() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("seg.log");
        write_segment(&path, &[]);

        let mut reader = RecoveryLogReader::open(&path).unwrap();
        assert!(reader.read_all().unwrap().is_empty());
    }

    #[test]
    fn test_frame_iterator() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("seg.log");
        write_segment(&path, &["a", "b"]);

        let frames: Vec<_> = RecoveryLogReader::open(&path)
            .unwrap()
            .frames()
            .collect::<Result<_>>()
            .unwrap();
        assert_eq!(frames.len(), 2);
    }

    #[test]
    fn test_truncated_payload_is_corrupt() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("seg.log");
        fs::write(&path, [0, 0, 0, 8, 1, 2, 3]).unwrap();

        let mut reader = RecoveryLogReader::open(&path).unwrap();
        let err = reader.read_frame().unwrap_err();
        assert!(matches!(err, RecoveryError::CorruptFrame { .. }));
    }

    #[test]
    fn test_truncated_length_field_is_corrupt() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("seg.log");
        fs::write(&path, [0, 0]).unwrap();

        let mut reader = RecoveryLogReader::open(&path).unwrap();
        assert!(matches!(
            reader.read_frame().unwrap_err(),
            RecoveryError::CorruptFrame { .. }
        ));
    }

    #[test]
    fn test_open_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = RecoveryLogReader::open(dir.path().join("absent.log")).unwrap_err();
        assert!(matches!(err, RecoveryError::Io { .. }));
    }
}
