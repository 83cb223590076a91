//! Protocol module - header codec and framing.
//!
//! - 16-byte header encoding/decoding in host byte order
//! - Frame buffer for reassembling frames from raw socket chunks
//! - Frame struct with typed accessors

mod frame;
mod frame_buffer;
mod header;

pub use frame::{build_frame, Frame};
pub use frame_buffer::FrameBuffer;
pub use header::{Endian, Header, HEADER_SIZE, MAX_PAYLOAD_SIZE};
