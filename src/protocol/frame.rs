//! Frame struct with typed accessors.
//!
//! Represents a complete protocol message: header plus payload.
//! Uses `bytes::Bytes` for zero-copy payload sharing.
//!
//! # Example
//!
//! ```
//! use pwnative::protocol::{Frame, Header};
//! use bytes::Bytes;
//!
//! let header = Header::new(1, 4, 5, 42, 0);
//! let frame = Frame::new(header, Bytes::from_static(b"hello"));
//!
//! assert_eq!(frame.id(), 1);
//! assert_eq!(frame.payload(), b"hello");
//! ```

use bytes::Bytes;

use super::header::{Header, HEADER_SIZE};
use crate::error::{PwError, Result};

/// A complete protocol frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    /// Decoded header.
    pub header: Header,
    /// Payload bytes (zero-copy via `bytes::Bytes`).
    pub payload: Bytes,
}

impl Frame {
    /// Create a new frame from header and payload.
    pub fn new(header: Header, payload: Bytes) -> Self {
        Self { header, payload }
    }

    /// Get a reference to the payload bytes.
    #[inline]
    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    /// Get the payload length.
    #[inline]
    pub fn payload_len(&self) -> usize {
        self.payload.len()
    }

    /// Get the target proxy / resource ID.
    #[inline]
    pub fn id(&self) -> u32 {
        self.header.id
    }

    /// Get the opcode.
    #[inline]
    pub fn opcode(&self) -> u8 {
        self.header.opcode
    }

    /// Get the sequence number.
    #[inline]
    pub fn seq(&self) -> u32 {
        self.header.seq
    }

    /// Get the number of file descriptors announced by the header.
    #[inline]
    pub fn num_fds(&self) -> u32 {
        self.header.num_fds
    }
}

/// Build a complete frame as a single byte vector, in host byte order.
///
/// # Errors
///
/// - [`PwError::PayloadLengthMismatch`] if `header.size` is not `payload.len()`
/// - [`PwError::SizeOutOfRange`] if the size does not fit in 24 bits
///
/// # Example
///
/// ```
/// use pwnative::protocol::{build_frame, Header};
///
/// let header = Header::new(0, 1, 5, 7, 0);
/// let bytes = build_frame(&header, b"hello").unwrap();
/// assert_eq!(bytes.len(), 16 + 5);
/// ```
pub fn build_frame(header: &Header, payload: &[u8]) -> Result<Vec<u8>> {
    if header.size as usize != payload.len() {
        return Err(PwError::PayloadLengthMismatch {
            declared: header.size,
            actual: payload.len(),
        });
    }
    let mut buf = Vec::with_capacity(HEADER_SIZE + payload.len());
    buf.extend_from_slice(&header.encode()?);
    buf.extend_from_slice(payload);
    Ok(buf)
}
