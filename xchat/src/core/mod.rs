//! Wire-level building blocks:
//! - Frame: header, typed payload and serialization
//! - Checksum: CRC32 guarding each frame

mod checksum;
mod frame;

pub use checksum::Crc32;
pub use frame::{CallHeader, Frame, FrameHeader, FrameType, FRAME_HEADER_SIZE};
