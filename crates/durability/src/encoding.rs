//! WAL frame encoding
//!
//! ```text
//! +-----------+-----------+---------------------------+
//! | len: u32  | crc: u32  | payload: bincode(WalEntry) |
//! +-----------+-----------+---------------------------+
//! ```
//!
//! Both header fields are little-endian; `crc` is CRC32 of the payload only.
//! No frame is ever written with `len` above [`MAX_PAYLOAD_LEN`], so a larger
//! value can only come from a damaged header.

use crate::wal::WalEntry;
use byteorder::{ByteOrder, LittleEndian};
use thiserror::Error;

/// Size of the frame header in bytes
pub const HEADER_LEN: usize = 8;

/// Largest payload a frame may carry
pub const MAX_PAYLOAD_LEN: usize = 1 << 20;

/// Frame encoding/decoding failures
#[derive(Debug, Error, PartialEq, Eq)]
pub enum EncodingError {
    /// The buffer ends before the frame does (torn write)
    #[error("incomplete frame: need {needed} bytes, have {have}")]
    Incomplete {
        /// Bytes available
        have: usize,
        /// Bytes the frame needs
        needed: usize,
    },

    /// The length field is larger than any frame ever written
    #[error("implausible frame length {len}")]
    Oversized {
        /// Length read from the header
        len: usize,
    },

    /// Payload does not match its checksum
    #[error("checksum mismatch: stored {stored:#010x}, computed {computed:#010x}")]
    ChecksumMismatch {
        /// Checksum in the header
        stored: u32,
        /// Checksum of the payload read
        computed: u32,
        /// Total frame length, so the reader can skip it
        frame_len: usize,
    },

    /// Payload passed the checksum but is not a valid entry
    #[error("undecodable payload: {message}")]
    Payload {
        /// Decoder message
        message: String,
        /// Total frame length, so the reader can skip it
        frame_len: usize,
    },

    /// Entry could not be serialized
    #[error("serialization failed: {0}")]
    Serialize(String),
}

/// Encode an entry into a complete frame
pub fn encode_entry(entry: &WalEntry) -> Result<Vec<u8>, EncodingError> {
    let payload = bincode::serialize(entry).map_err(|e| EncodingError::Serialize(e.to_string()))?;
    if payload.len() > MAX_PAYLOAD_LEN {
        return Err(EncodingError::Serialize(format!(
            "entry too large: {} bytes",
            payload.len()
        )));
    }
    let len = payload.len() as u32;

    let mut frame = vec![0u8; HEADER_LEN + payload.len()];
    LittleEndian::write_u32(&mut frame[0..4], len);
    LittleEndian::write_u32(&mut frame[4..8], crc32fast::hash(&payload));
    frame[HEADER_LEN..].copy_from_slice(&payload);
    Ok(frame)
}

/// Decode the frame at the start of `buf`
///
/// Returns the entry and the number of bytes the frame occupies.
pub fn decode_entry(buf: &[u8]) -> Result<(WalEntry, usize), EncodingError> {
    if buf.len() < HEADER_LEN {
        return Err(EncodingError::Incomplete {
            have: buf.len(),
            needed: HEADER_LEN,
        });
    }

    let len = LittleEndian::read_u32(&buf[0..4]) as usize;
    if len > MAX_PAYLOAD_LEN {
        return Err(EncodingError::Oversized { len });
    }
    let stored = LittleEndian::read_u32(&buf[4..8]);
    let frame_len = HEADER_LEN + len;
    if buf.len() < frame_len {
        return Err(EncodingError::Incomplete {
            have: buf.len(),
            needed: frame_len,
        });
    }

    let payload = &buf[HEADER_LEN..frame_len];
    let computed = crc32fast::hash(payload);
    if computed != stored {
        return Err(EncodingError::ChecksumMismatch {
            stored,
            computed,
            frame_len,
        });
    }

    let entry = bincode::deserialize(payload).map_err(|e| EncodingError::Payload {
        message: e.to_string(),
        frame_len,
    })?;
    Ok((entry, frame_len))
}
