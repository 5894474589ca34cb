//! Configuration validation
//!
//! Rejects settings the writer cannot run with:
//! - Zero channels, buffers or buffer bytes
//! - Buffers too small to hold a record length prefix
//! - Channel indices outside their partition
//! - Replay against a zero-width or unaddressable original partition
//! - Round-robin replay across a change of parallelism

use crate::error::{ConfigError, Result};
use crate::{Config, SelectorKind};

/// Bytes of the length prefix every record starts with
const MIN_BUFFER_SIZE: usize = 4;

/// Largest channel count a channel index can address
const MAX_CHANNELS: usize = u16::MAX as usize + 1;

/// Validate the entire configuration
pub fn validate_config(config: &Config) -> Result<()> {
    validate_writer(config)?;
    validate_buffer(config)?;
    validate_recovery(config)?;
    Ok(())
}

fn validate_writer(config: &Config) -> Result<()> {
    let writer = &config.writer;
    if writer.channels == 0 {
        return Err(ConfigError::invalid_value("writer", "channels", "must be greater than 0"));
    }
    if writer.channels > MAX_CHANNELS {
        return Err(ConfigError::invalid_value(
            "writer",
            "channels",
            format!("{} exceeds the maximum of {MAX_CHANNELS}", writer.channels),
        ));
    }
    if let Some(local) = writer.local_channel
        && usize::from(local) >= writer.channels
    {
        return Err(ConfigError::channel_out_of_range(
            "writer",
            "local_channel",
            local,
            writer.channels,
        ));
    }
    Ok(())
}

fn validate_buffer(config: &Config) -> Result<()> {
    let buffer = &config.buffer;
    if buffer.pool_size == 0 {
        return Err(ConfigError::invalid_value("buffer", "pool_size", "must be greater than 0"));
    }
    if buffer.buffer_size < MIN_BUFFER_SIZE {
        return Err(ConfigError::invalid_value(
            "buffer",
            "buffer_size",
            format!("must be at least {MIN_BUFFER_SIZE} bytes, got {}", buffer.buffer_size),
        ));
    }
    if buffer.request_timeout.is_some_and(|t| t.is_zero()) {
        return Err(ConfigError::invalid_value(
            "buffer",
            "request_timeout",
            "must be greater than 0; omit it to block",
        ));
    }
    Ok(())
}

fn validate_recovery(config: &Config) -> Result<()> {
    let recovery = &config.recovery;
    if recovery.enabled && recovery.dataset.is_empty() {
        return Err(ConfigError::invalid_value("recovery", "dataset", "must not be empty"));
    }

    if let Some(replay) = &recovery.replay {
        if replay.original_parallelism == 0 {
            return Err(ConfigError::invalid_value(
                "recovery.replay",
                "original_parallelism",
                "must be greater than 0",
            ));
        }
        if replay.original_parallelism > MAX_CHANNELS {
            return Err(ConfigError::invalid_value(
                "recovery.replay",
                "original_parallelism",
                format!(
                    "{} exceeds the maximum of {MAX_CHANNELS}",
                    replay.original_parallelism
                ),
            ));
        }
        if usize::from(replay.lost_channel) >= replay.original_parallelism {
            return Err(ConfigError::channel_out_of_range(
                "recovery.replay",
                "lost_channel",
                replay.lost_channel,
                replay.original_parallelism,
            ));
        }
        // Round-robin placement depends on call order, so it only matches the
        // original run when the channel count is unchanged.
        if config.writer.selector == SelectorKind::RoundRobin
            && replay.original_parallelism != config.writer.channels
        {
            return Err(ConfigError::invalid_value(
                "recovery.replay",
                "original_parallelism",
                format!(
                    "round_robin replay needs the original {} channels, writer has {}",
                    replay.original_parallelism, config.writer.channels
                ),
            ));
        }
    }
    Ok(())
}
