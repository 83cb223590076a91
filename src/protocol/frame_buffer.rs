//! Frame buffer for reassembling frames from raw socket chunks.
//!
//! The connection worker hands out chunks of at most 1024 bytes with no
//! alignment to message boundaries. `FrameBuffer` accumulates them in a
//! single `bytes::BytesMut` and runs a small state machine:
//! - `WaitingForHeader`: need at least 16 bytes
//! - `WaitingForPayload`: header parsed, need `size` more payload bytes
//!
//! # Example
//!
//! ```
//! use pwnative::protocol::{build_frame, FrameBuffer, Header};
//!
//! let bytes = build_frame(&Header::new(0, 1, 2, 3, 0), b"hi").unwrap();
//! let mut buffer = FrameBuffer::new();
//!
//! assert!(buffer.push(&bytes[..10]).unwrap().is_empty());
//! let frames = buffer.push(&bytes[10..]).unwrap();
//! assert_eq!(frames[0].payload(), b"hi");
//! ```

use bytes::{Bytes, BytesMut};

use super::header::{Header, HEADER_SIZE, MAX_PAYLOAD_SIZE};
use super::Frame;
use crate::error::{PwError, Result};

/// Initial buffer capacity: a handful of read chunks.
const DEFAULT_CAPACITY: usize = 8 * 1024;

#[derive(Debug, Clone)]
enum State {
    WaitingForHeader,
    WaitingForPayload { header: Header },
}

/// Buffer for accumulating incoming bytes and extracting complete frames.
pub struct FrameBuffer {
    /// Accumulated bytes from socket reads.
    buffer: BytesMut,
    /// Current parsing state.
    state: State,
    /// Maximum allowed payload size.
    max_payload_size: u32,
}

impl FrameBuffer {
    /// Create a new frame buffer accepting any representable payload size.
    pub fn new() -> Self {
        Self::with_max_payload(MAX_PAYLOAD_SIZE)
    }

    /// Create a new frame buffer with custom max payload size.
    pub fn with_max_payload(max_payload_size: u32) -> Self {
        Self {
            buffer: BytesMut::with_capacity(DEFAULT_CAPACITY),
            state: State::WaitingForHeader,
            max_payload_size,
        }
    }

    /// Push data into the buffer and extract all complete frames.
    ///
    /// Partial data is kept for the next push.
    ///
    /// # Errors
    ///
    /// Returns [`PwError::FrameTooLarge`] if a header announces a payload
    /// above the configured maximum. The buffer should be cleared afterwards,
    /// since the stream position can no longer be trusted.
    pub fn push(&mut self, data: &[u8]) -> Result<Vec<Frame>> {
        self.buffer.extend_from_slice(data);

        let mut frames = Vec::new();
        while let Some(frame) = self.try_extract_one()? {
            frames.push(frame);
        }
        Ok(frames)
    }

    fn try_extract_one(&mut self) -> Result<Option<Frame>> {
        if let State::WaitingForHeader = self.state {
            let header = match Header::decode(&self.buffer) {
                Some(header) => header,
                None => return Ok(None),
            };

            if header.size > self.max_payload_size {
                return Err(PwError::FrameTooLarge {
                    size: header.size,
                    max: self.max_payload_size,
                });
            }

            let _ = self.buffer.split_to(HEADER_SIZE);
            self.state = State::WaitingForPayload { header };
        }

        let State::WaitingForPayload { header } = self.state else {
            return Ok(None);
        };

        let remaining = header.size as usize;
        if self.buffer.len() < remaining {
            return Ok(None);
        }

        let payload = if remaining == 0 {
            Bytes::new()
        } else {
            self.buffer.split_to(remaining).freeze()
        };
        self.state = State::WaitingForHeader;

        Ok(Some(Frame::new(header, payload)))
    }

    /// Get the number of buffered bytes not yet returned as frames.
    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    /// Check if the buffer is empty.
    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// Clear the buffer and reset state.
    ///
    /// Call this whenever the underlying connection is re-established.
    pub fn clear(&mut self) {
        self.buffer.clear();
        self.state = State::WaitingForHeader;
    }

    #[cfg(test)]
    fn state_name(&self) -> &'static str {
        match &self.state {
            State::WaitingForHeader => "WaitingForHeader",
            State::WaitingForPayload { .. } => "WaitingForPayload",
        }
    }
}

impl Default for FrameBuffer {
    fn default() -> Self {
        Self::new()
    }
}
