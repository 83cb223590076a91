//! Frame header encoding and decoding.
//!
//! Every message on the native protocol socket starts with a 16-byte header:
//! ```text
//! ┌──────────┬────────┬──────────┬──────────┬──────────┐
//! │ ID       │ Opcode │ Size     │ Seq      │ Num FDs  │
//! │ 4 bytes  │ 1 byte │ 3 bytes  │ 4 bytes  │ 4 bytes  │
//! │ u32 NE   │        │ u24 NE   │ u32 NE   │ u32 NE   │
//! └──────────┴────────┴──────────┴──────────┴──────────┘
//! ```
//!
//! Multi-byte fields use the host's native byte order. Opcode and size share
//! one 32-bit word laid out like a C bitfield (`opcode:8, size:24`), so the
//! position of the size bytes inside that word differs between little- and
//! big-endian hosts.

use crate::error::{PwError, Result};

/// Header size in bytes (fixed, exactly 16).
pub const HEADER_SIZE: usize = 16;

/// Largest payload size representable in the 24-bit size field.
pub const MAX_PAYLOAD_SIZE: u32 = (1 << 24) - 1;

/// Byte order used for the multi-byte header fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endian {
    Little,
    Big,
}

impl Endian {
    /// Byte order of the host this process runs on.
    pub const NATIVE: Endian = if cfg!(target_endian = "little") {
        Endian::Little
    } else {
        Endian::Big
    };

    #[inline]
    fn put_u32(self, buf: &mut [u8], value: u32) {
        let bytes = match self {
            Endian::Little => value.to_le_bytes(),
            Endian::Big => value.to_be_bytes(),
        };
        buf.copy_from_slice(&bytes);
    }

    #[inline]
    fn get_u32(self, buf: &[u8]) -> u32 {
        let bytes = [buf[0], buf[1], buf[2], buf[3]];
        match self {
            Endian::Little => u32::from_le_bytes(bytes),
            Endian::Big => u32::from_be_bytes(bytes),
        }
    }

    /// Store the low 24 bits of `size` into a 3-byte slot.
    #[inline]
    fn put_u24(self, buf: &mut [u8], size: u32) {
        match self {
            Endian::Little => buf.copy_from_slice(&size.to_le_bytes()[..3]),
            Endian::Big => buf.copy_from_slice(&size.to_be_bytes()[1..]),
        }
    }

    #[inline]
    fn get_u24(self, buf: &[u8]) -> u32 {
        match self {
            Endian::Little => u32::from_le_bytes([buf[0], buf[1], buf[2], 0]),
            Endian::Big => u32::from_be_bytes([0, buf[0], buf[1], buf[2]]),
        }
    }
}

/// Decoded message header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Header {
    /// Proxy / resource ID the message targets.
    pub id: u32,
    /// Operation code.
    pub opcode: u8,
    /// Payload length in bytes (24 bits on the wire).
    pub size: u32,
    /// Sender-assigned sequence number.
    pub seq: u32,
    /// Number of file descriptors sent alongside the message.
    pub num_fds: u32,
}

impl Header {
    /// Create a new header.
    pub fn new(id: u32, opcode: u8, size: u32, seq: u32, num_fds: u32) -> Self {
        Self {
            id,
            opcode,
            size,
            seq,
            num_fds,
        }
    }

    /// Encode header to bytes in host byte order.
    ///
    /// # Errors
    ///
    /// Returns [`PwError::SizeOutOfRange`] if `size` exceeds [`MAX_PAYLOAD_SIZE`].
    ///
    /// # Example
    ///
    /// ```
    /// use pwnative::protocol::Header;
    ///
    /// let bytes = Header::new(1, 2, 3, 4, 5).encode().unwrap();
    /// assert_eq!(bytes.len(), 16);
    /// assert_eq!(bytes[4], 2);
    /// ```
    pub fn encode(&self) -> Result<[u8; HEADER_SIZE]> {
        self.encode_with(Endian::NATIVE)
    }

    /// Encode header to bytes using an explicit byte order.
    pub fn encode_with(&self, endian: Endian) -> Result<[u8; HEADER_SIZE]> {
        let mut buf = [0u8; HEADER_SIZE];
        self.encode_into(&mut buf, endian)?;
        Ok(buf)
    }

    /// Encode header into an existing buffer.
    ///
    /// # Panics
    ///
    /// Panics if buffer is smaller than `HEADER_SIZE` (16 bytes).
    pub fn encode_into(&self, buf: &mut [u8], endian: Endian) -> Result<()> {
        if self.size > MAX_PAYLOAD_SIZE {
            return Err(PwError::SizeOutOfRange { size: self.size });
        }
        endian.put_u32(&mut buf[0..4], self.id);
        buf[4] = self.opcode;
        endian.put_u24(&mut buf[5..8], self.size);
        endian.put_u32(&mut buf[8..12], self.seq);
        endian.put_u32(&mut buf[12..16], self.num_fds);
        Ok(())
    }

    /// Decode header from bytes in host byte order.
    ///
    /// Returns `None` if buffer is too short.
    ///
    /// # Example
    ///
    /// ```
    /// use pwnative::protocol::Header;
    ///
    /// let header = Header::new(7, 1, 300, 42, 0);
    /// let bytes = header.encode().unwrap();
    /// assert_eq!(Header::decode(&bytes), Some(header));
    /// ```
    pub fn decode(buf: &[u8]) -> Option<Self> {
        Self::decode_with(buf, Endian::NATIVE)
    }

    /// Decode header from bytes using an explicit byte order.
    pub fn decode_with(buf: &[u8], endian: Endian) -> Option<Self> {
        if buf.len() < HEADER_SIZE {
            return None;
        }
        Some(Self {
            id: endian.get_u32(&buf[0..4]),
            opcode: buf[4],
            size: endian.get_u24(&buf[5..8]),
            seq: endian.get_u32(&buf[8..12]),
            num_fds: endian.get_u32(&buf[12..16]),
        })
    }
}
