//! Frame definition and serialization for one logical stream.
//!
//! Every exchange runs on its own multiplexed stream; a frame is the unit
//! written to it.
//!
//! # Frame Format
//!
//! ```text
//! 0                   1                   2                   3
//! 0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! |    Version    |     Type      |           Flags               |
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! |                        Payload Length                         |
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! |                            CRC32                              |
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! |                          Payload...                           |
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! ```
//!
//! The checksum covers header bytes 0..8 and the payload.

use std::time::Duration;

use super::checksum::Crc32;
use crate::error::{Error, ErrorKind, Result};
use crate::message::{ExchangeKind, Message};
use crate::VERSION;

/// Frame header size in bytes.
pub const FRAME_HEADER_SIZE: usize = 12;

/// Size of the `Call` payload: kind plus timeout in milliseconds.
const CALL_PAYLOAD_SIZE: usize = 5;

/// Status code meaning the handler finished cleanly.
const STATUS_OK: u8 = 0;

/// Frame type indicating the purpose of the frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum FrameType {
    /// Opens a call; first frame written by the caller.
    Call = 0x01,

    /// Carries one message body.
    Message = 0x02,

    /// End of a direction, written before the half-close. Toward the caller
    /// it also carries the handler's outcome.
    Status = 0x03,
}

impl FrameType {
    /// Converts a byte to a FrameType.
    pub const fn from_u8(value: u8) -> Option<Self> {
        match value {
            0x01 => Some(Self::Call),
            0x02 => Some(Self::Message),
            0x03 => Some(Self::Status),
            _ => None,
        }
    }
}

/// Parsed fixed-size frame header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameHeader {
    pub frame_type: FrameType,
    pub flags: u16,
    pub length: u32,
    pub checksum: u32,
}

impl FrameHeader {
    /// Parses and validates a header read off the wire.
    pub fn parse(buf: &[u8; FRAME_HEADER_SIZE]) -> Result<Self> {
        if buf[0] != VERSION {
            return Err(Error::protocol(format!("unsupported frame version {}", buf[0])));
        }

        let frame_type = FrameType::from_u8(buf[1])
            .ok_or_else(|| Error::protocol(format!("unknown frame type {:#04x}", buf[1])))?;

        Ok(Self {
            frame_type,
            flags: u16::from_be_bytes([buf[2], buf[3]]),
            length: u32::from_be_bytes([buf[4], buf[5], buf[6], buf[7]]),
            checksum: u32::from_be_bytes([buf[8], buf[9], buf[10], buf[11]]),
        })
    }
}

/// Header of a call: which pattern it follows and how long the caller waits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CallHeader {
    pub kind: ExchangeKind,
    pub timeout: Option<Duration>,
}

/// A decoded frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
    Call(CallHeader),
    Message(Message),
    /// `Ok(())` ends the stream cleanly, `Err` carries the handler's failure.
    Status(std::result::Result<(), Error>),
}

impl Frame {
    pub fn frame_type(&self) -> FrameType {
        match self {
            Frame::Call(_) => FrameType::Call,
            Frame::Message(_) => FrameType::Message,
            Frame::Status(_) => FrameType::Status,
        }
    }

    fn payload(&self) -> Vec<u8> {
        match self {
            Frame::Call(call) => {
                // Sub-millisecond and oversized deadlines are clamped; 0 means none.
                let millis = match call.timeout {
                    None => 0,
                    Some(timeout) => timeout.as_millis().clamp(1, u32::MAX as u128) as u32,
                };
                let mut payload = Vec::with_capacity(CALL_PAYLOAD_SIZE);
                payload.push(call.kind as u8);
                payload.extend_from_slice(&millis.to_be_bytes());
                payload
            }
            Frame::Message(message) => message.body().as_bytes().to_vec(),
            Frame::Status(Ok(())) => vec![STATUS_OK],
            Frame::Status(Err(err)) => {
                let mut payload = Vec::with_capacity(1 + err.detail().len());
                payload.push(err.kind().code());
                payload.extend_from_slice(err.detail().as_bytes());
                payload
            }
        }
    }

    /// Serializes the frame, header included.
    pub fn encode(&self) -> Vec<u8> {
        let payload = self.payload();
        let mut buf = Vec::with_capacity(FRAME_HEADER_SIZE + payload.len());

        buf.push(VERSION);
        buf.push(self.frame_type() as u8);
        buf.extend_from_slice(&0u16.to_be_bytes()); // Flags, reserved
        buf.extend_from_slice(&(payload.len() as u32).to_be_bytes());

        let checksum = Crc32::compute_slices(&[&buf[0..8], &payload]);
        buf.extend_from_slice(&checksum.to_be_bytes());
        buf.extend_from_slice(&payload);
        buf
    }

    /// Decodes a frame from a parsed header and its payload.
    pub fn decode(header: &FrameHeader, payload: Vec<u8>) -> Result<Self> {
        if payload.len() != header.length as usize {
            return Err(Error::protocol("payload length does not match header"));
        }

        let mut covered = [0u8; 8];
        covered[0] = VERSION;
        covered[1] = header.frame_type as u8;
        covered[2..4].copy_from_slice(&header.flags.to_be_bytes());
        covered[4..8].copy_from_slice(&header.length.to_be_bytes());
        if !Crc32::verify_slices(&[&covered, &payload], header.checksum) {
            return Err(Error::protocol("frame checksum mismatch"));
        }

        match header.frame_type {
            FrameType::Call => {
                if payload.len() != CALL_PAYLOAD_SIZE {
                    return Err(Error::protocol("malformed call header"));
                }
                let kind = ExchangeKind::from_u8(payload[0]).ok_or_else(|| {
                    Error::protocol(format!("unknown exchange kind {}", payload[0]))
                })?;
                let millis = u32::from_be_bytes([payload[1], payload[2], payload[3], payload[4]]);
                let timeout = (millis > 0).then(|| Duration::from_millis(millis as u64));
                Ok(Frame::Call(CallHeader { kind, timeout }))
            }
            FrameType::Message => {
                let body = String::from_utf8(payload)
                    .map_err(|_| Error::protocol("message body is not valid UTF-8"))?;
                Ok(Frame::Message(Message::new(body)))
            }
            FrameType::Status => {
                let (&code, detail) = payload
                    .split_first()
                    .ok_or_else(|| Error::protocol("empty status frame"))?;
                if code == STATUS_OK {
                    return Ok(Frame::Status(Ok(())));
                }
                let kind = ErrorKind::from_code(code)
                    .ok_or_else(|| Error::protocol(format!("unknown status code {}", code)))?;
                let detail = String::from_utf8_lossy(detail).into_owned();
                Ok(Frame::Status(Err(Error::new(kind, detail))))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decode_bytes(buf: &[u8]) -> Result<Frame> {
        let mut header = [0u8; FRAME_HEADER_SIZE];
        header.copy_from_slice(&buf[..FRAME_HEADER_SIZE]);
        let header = FrameHeader::parse(&header)?;
        Frame::decode(&header, buf[FRAME_HEADER_SIZE..].to_vec())
    }

    #[test]
    fn test_message_roundtrip() {
        let frame = Frame::Message(Message::new("こんにちは, server"));
        let buf = frame.encode();

        assert_eq!(buf.len(), FRAME_HEADER_SIZE + "こんにちは, server".len());
        assert_eq!(decode_bytes(&buf).unwrap(), frame);
    }

    #[test]
    fn test_call_header() {
        let frame = Frame::Call(CallHeader {
            kind: ExchangeKind::Bidirectional,
            timeout: Some(Duration::from_secs(10)),
        });
        assert_eq!(decode_bytes(&frame.encode()).unwrap(), frame);

        let frame = Frame::Call(CallHeader {
            kind: ExchangeKind::Unary,
            timeout: None,
        });
        assert_eq!(decode_bytes(&frame.encode()).unwrap(), frame);
    }

    #[test]
    fn test_status_frames() {
        let ok = Frame::Status(Ok(()));
        assert_eq!(decode_bytes(&ok.encode()).unwrap(), ok);

        let failed = Frame::Status(Err(Error::internal("disk on fire")));
        match decode_bytes(&failed.encode()).unwrap() {
            Frame::Status(Err(err)) => {
                assert_eq!(err.kind(), ErrorKind::Internal);
                assert_eq!(err.detail(), "disk on fire");
            }
            other => panic!("unexpected frame {:?}", other),
        }
    }

    #[test]
    fn test_checksum_verification() {
        let mut buf = Frame::Message(Message::new("test")).encode();

        // Corrupt one byte
        buf[FRAME_HEADER_SIZE] ^= 0xFF;

        let err = decode_bytes(&buf).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ProtocolViolation);
    }

    #[test]
    fn test_rejects_bad_version_and_type() {
        let mut buf = Frame::Message(Message::new("x")).encode();
        buf[0] = VERSION + 1;
        assert!(decode_bytes(&buf).is_err());

        let mut buf = Frame::Message(Message::new("x")).encode();
        buf[1] = 0x7F;
        assert!(decode_bytes(&buf).is_err());
    }

    #[test]
    fn test_rejects_invalid_utf8() {
        let mut buf = Vec::new();
        let payload = [0xFFu8, 0xFE];
        buf.push(VERSION);
        buf.push(FrameType::Message as u8);
        buf.extend_from_slice(&0u16.to_be_bytes());
        buf.extend_from_slice(&(payload.len() as u32).to_be_bytes());
        let checksum = Crc32::compute_slices(&[&buf[0..8], &payload]);
        buf.extend_from_slice(&checksum.to_be_bytes());
        buf.extend_from_slice(&payload);

        let err = decode_bytes(&buf).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ProtocolViolation);
    }
}
