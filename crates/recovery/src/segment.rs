//! Segment file naming and discovery
//!
//! One segment holds the records one producer sent to one channel during
//! one superstep:
//!
//! ```text
//! <dir>/spindlelog_<dataset>_<channel>_<superstep>.log
//! ```
//!
//! The dataset id may itself contain underscores, so names are parsed from
//! the right.

use std::fs;
use std::path::{Path, PathBuf};

use spindle_protocol::{ChannelId, DatasetId, Superstep};

use crate::error::{RecoveryError, Result};

/// File name prefix shared by all segments
pub const SEGMENT_PREFIX: &str = "spindlelog_";

/// File name extension of a segment
pub const SEGMENT_EXTENSION: &str = ".log";

/// Path of the segment for `(dataset, channel, superstep)` under `dir`
pub fn segment_path(
    dir: impl AsRef<Path>,
    dataset: &DatasetId,
    channel: ChannelId,
    superstep: Superstep,
) -> PathBuf {
    dir.as_ref().join(format!(
        "{SEGMENT_PREFIX}{dataset}_{}_{superstep}{SEGMENT_EXTENSION}",
        channel.index()
    ))
}

/// A segment found on disk
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SegmentInfo {
    pub path: PathBuf,
    pub dataset: DatasetId,
    pub channel: ChannelId,
    pub superstep: Superstep,
    /// File size in bytes
    pub size: u64,
}

impl SegmentInfo {
    /// Parse `(dataset, channel, superstep)` out of a segment file name
    ///
    /// Returns `None` for anything that is not a segment name.
    pub fn parse_file_name(name: &str) -> Option<(DatasetId, ChannelId, Superstep)> {
        let stem = name
            .strip_prefix(SEGMENT_PREFIX)?
            .strip_suffix(SEGMENT_EXTENSION)?;

        let mut parts = stem.rsplitn(3, '_');
        let superstep: u32 = parts.next()?.parse().ok()?;
        let channel: u16 = parts.next()?.parse().ok()?;
        let dataset = parts.next().filter(|d| !d.is_empty())?;

        Some((
            DatasetId::new(dataset),
            ChannelId::new(channel),
            Superstep::new(superstep),
        ))
    }
}

/// List the segments of `dataset` under `dir`, ordered by superstep then channel
///
/// A missing directory yields an empty list. Files that do not parse as
/// segment names are skipped.
pub fn list_segments(dir: impl AsRef<Path>, dataset: &DatasetId) -> Result<Vec<SegmentInfo>> {
    let dir = dir.as_ref();
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(RecoveryError::io(dir, e)),
    };

    let mut segments = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| RecoveryError::io(dir, e))?;
        let path = entry.path();

        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        let Some((found, channel, superstep)) = SegmentInfo::parse_file_name(name) else {
            continue;
        };
        if &found != dataset {
            continue;
        }

        let metadata = entry.metadata().map_err(|e| RecoveryError::io(&path, e))?;
        if !metadata.is_file() {
            continue;
        }

        segments.push(SegmentInfo {
            path,
            dataset: found,
            channel,
            superstep,
            size: metadata.len(),
        });
    }

    segments.sort_by_key(|s| (s.superstep, s.channel));
    Ok(segments)
}
