//! Recovery log inspection

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use spindle_config::Config;
use spindle_protocol::DatasetId;
use spindle_recovery::{RecoveryLogReader, SegmentInfo, list_segments};

#[derive(Args, Debug, Clone)]
pub struct InspectArgs {
    /// Segment directory; overrides [recovery] path
    #[arg(short, long)]
    pub dir: Option<PathBuf>,

    /// Dataset to list; overrides [recovery] dataset
    #[arg(long)]
    pub dataset: Option<String>,
}

/// A segment and the number of records it holds
#[derive(Debug, Clone)]
pub struct SegmentSummary {
    pub segment: SegmentInfo,
    pub records: u64,
}

pub fn run(config: &Config, args: InspectArgs) -> Result<()> {
    let summaries = collect(config, &args)?;
    if summaries.is_empty() {
        println!("no segments found");
        return Ok(());
    }

    println!("{:>10} {:<12} {:>10} {:>12}  PATH", "SUPERSTEP", "CHANNEL", "RECORDS", "BYTES");
    for summary in &summaries {
        let segment = &summary.segment;
        println!(
            "{:>10} {:<12} {:>10} {:>12}  {}",
            segment.superstep.get(),
            segment.channel.to_string(),
            summary.records,
            segment.size,
            segment.path.display()
        );
    }

    let total: u64 = summaries.iter().map(|s| s.records).sum();
    println!();
    println!("{} segments, {} records", summaries.len(), total);
    Ok(())
}

/// Segments of the dataset in (superstep, channel) order with their record counts
pub fn collect(config: &Config, args: &InspectArgs) -> Result<Vec<SegmentSummary>> {
    let dir = args.dir.as_ref().unwrap_or(&config.recovery.path);
    let dataset = DatasetId::new(
        args.dataset
            .clone()
            .unwrap_or_else(|| config.recovery.dataset.clone()),
    );

    list_segments(dir, &dataset)
        .with_context(|| format!("listing segments in {}", dir.display()))?
        .into_iter()
        .map(|segment| {
            let records = count_records(&segment)?;
            Ok(SegmentSummary { segment, records })
        })
        .collect()
}

fn count_records(segment: &SegmentInfo) -> Result<u64> {
    let reader = RecoveryLogReader::open(&segment.path)?;
    let mut records = 0;
    for frame in reader.frames() {
        frame.with_context(|| format!("reading {}", segment.path.display()))?;
        records += 1;
    }
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cmd::run::{RunArgs, shuffle};
    use std::str::FromStr;

    #[test]
    fn test_missing_directory_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let args = InspectArgs {
            dir: Some(dir.path().join("missing")),
            dataset: None,
        };
        assert!(collect(&Config::default(), &args).unwrap().is_empty());
    }

    #[test]
    fn test_counts_records_written_by_a_run() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = Config::from_str("[writer]\nchannels = 3\nlocal_channel = 0").unwrap();
        config.recovery.enabled = true;
        config.recovery.path = dir.path().to_path_buf();

        let run = RunArgs {
            supersteps: 2,
            vertices: 30,
            channels: None,
            checkpoint_interval: None,
        };
        let report = shuffle(&config, &run).unwrap();

        let summaries = collect(&config, &InspectArgs { dir: None, dataset: None }).unwrap();
        // Two remote channels for two supersteps.
        assert_eq!(summaries.len(), 4);
        assert!(summaries.windows(2).all(|w| {
            (w[0].segment.superstep, w[0].segment.channel)
                < (w[1].segment.superstep, w[1].segment.channel)
        }));

        let logged: u64 = summaries.iter().map(|s| s.records).sum();
        assert_eq!(logged, report.metrics.recovery_records);
    }

    #[test]
    fn test_other_dataset_is_ignored() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = Config::from_str("[writer]\nchannels = 2\nlocal_channel = 1").unwrap();
        config.recovery.enabled = true;
        config.recovery.path = dir.path().to_path_buf();

        let run = RunArgs {
            supersteps: 1,
            vertices: 4,
            channels: None,
            checkpoint_interval: None,
        };
        shuffle(&config, &run).unwrap();

        let args = InspectArgs {
            dir: None,
            dataset: Some("other".into()),
        };
        assert!(collect(&config, &args).unwrap().is_empty());
    }
}
