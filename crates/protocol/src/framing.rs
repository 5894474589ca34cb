//! Length-prefixed record framing
//!
//! A frame is a 4-byte big-endian payload length followed by the bincode
//! encoding of the record. Readers reconstruct record boundaries from the
//! length field alone, regardless of how frames were split across buffers.

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::{ProtocolError, Result};

/// Size of the length field preceding every record
pub const LENGTH_FIELD_SIZE: usize = 4;

/// Largest payload the length field can describe
pub const MAX_RECORD_SIZE: usize = u32::MAX as usize;

/// Append one framed record to `out`
///
/// Returns the total frame size (length field included). On error `out` is
/// left exactly as it was.
pub fn encode_record<T: Serialize + ?Sized>(record: &T, out: &mut Vec<u8>) -> Result<usize> {
    let start = out.len();
    out.extend_from_slice(&[0u8; LENGTH_FIELD_SIZE]);

    let payload_len =
        match bincode::serde::encode_into_std_write(record, out, bincode::config::standard()) {
            Ok(n) => n,
            Err(e) => {
                out.truncate(start);
                return Err(e.into());
            }
        };

    let Ok(len) = u32::try_from(payload_len) else {
        out.truncate(start);
        return Err(ProtocolError::too_large(payload_len));
    };

    out[start..start + LENGTH_FIELD_SIZE].copy_from_slice(&len.to_be_bytes());
    Ok(LENGTH_FIELD_SIZE + payload_len)
}

/// Encode one framed record into a fresh vector
pub fn encode_record_to_vec<T: Serialize + ?Sized>(record: &T) -> Result<Vec<u8>> {
    let mut out = Vec::new();
    encode_record(record, &mut out)?;
    Ok(out)
}

/// Decode a record payload (the bytes after the length field)
pub fn decode_record<T: DeserializeOwned>(payload: &[u8]) -> Result<T> {
    let (record, consumed) =
        bincode::serde::decode_from_slice::<T, _>(payload, bincode::config::standard())?;
    if consumed != payload.len() {
        return Err(ProtocolError::TrailingBytes {
            consumed,
            len: payload.len(),
        });
    }
    Ok(record)
}

/// Read the payload length from a length field
#[inline]
pub fn frame_length(header: [u8; LENGTH_FIELD_SIZE]) -> usize {
    u32::from_be_bytes(header) as usize
}
