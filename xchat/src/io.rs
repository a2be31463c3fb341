//! Async frame reading and writing on one half of a logical stream.

use futures::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::core::{Frame, FrameHeader, FRAME_HEADER_SIZE};
use crate::error::{Error, Result};

pub struct FrameReader<R> {
    inner: R,
    max_payload_size: usize,
}

impl<R: AsyncRead + Unpin> FrameReader<R> {
    pub fn new(inner: R, max_payload_size: usize) -> Self {
        Self {
            inner,
            max_payload_size,
        }
    }

    /// Reads the next frame.
    ///
    /// Returns `Ok(None)` when the peer half-closed on a frame boundary.
    /// A close anywhere inside a frame is an error.
    pub async fn read_frame(&mut self) -> Result<Option<Frame>> {
        let mut header_buf = [0u8; FRAME_HEADER_SIZE];
        let n = self.inner.read(&mut header_buf).await?;
        if n == 0 {
            return Ok(None);
        }
        self.inner.read_exact(&mut header_buf[n..]).await?;

        let header = FrameHeader::parse(&header_buf)?;
        if header.length as usize > self.max_payload_size {
            return Err(Error::protocol(format!(
                "frame payload of {} bytes exceeds limit of {}",
                header.length, self.max_payload_size
            )));
        }

        let mut payload = vec![0u8; header.length as usize];
        self.inner.read_exact(&mut payload).await?;

        let frame = Frame::decode(&header, payload)?;
        log::trace!("Received frame type={:?}, len={}", header.frame_type, header.length);
        Ok(Some(frame))
    }
}

pub struct FrameWriter<W> {
    inner: W,
    max_payload_size: usize,
}

impl<W: AsyncWrite + Unpin> FrameWriter<W> {
    pub fn new(inner: W, max_payload_size: usize) -> Self {
        Self {
            inner,
            max_payload_size,
        }
    }

    /// Writes and flushes one frame.
    pub async fn write_frame(&mut self, frame: &Frame) -> Result<()> {
        let buf = frame.encode();
        let length = buf.len() - FRAME_HEADER_SIZE;
        if length > self.max_payload_size {
            return Err(Error::protocol(format!(
                "frame payload of {} bytes exceeds limit of {}",
                length, self.max_payload_size
            )));
        }

        self.inner.write_all(&buf).await?;
        self.inner.flush().await?;

        log::trace!("Sent frame type={:?}, len={}", frame.frame_type(), length);
        Ok(())
    }

    /// Half-closes the underlying stream; reads on the other half continue.
    pub async fn close(&mut self) -> Result<()> {
        self.inner.close().await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::message::Message;
    use futures::io::Cursor;

    #[tokio::test]
    async fn test_frames_in_sequence() {
        let mut buf: Vec<u8> = Vec::new();
        {
            let mut writer = FrameWriter::new(Cursor::new(&mut buf), 1024);
            writer.write_frame(&Frame::Message(Message::new("a"))).await.unwrap();
            writer.write_frame(&Frame::Message(Message::new("b"))).await.unwrap();
            writer.write_frame(&Frame::Status(Ok(()))).await.unwrap();
        }

        let mut reader = FrameReader::new(Cursor::new(buf), 1024);
        assert_eq!(
            reader.read_frame().await.unwrap(),
            Some(Frame::Message(Message::new("a")))
        );
        assert_eq!(
            reader.read_frame().await.unwrap(),
            Some(Frame::Message(Message::new("b")))
        );
        assert_eq!(reader.read_frame().await.unwrap(), Some(Frame::Status(Ok(()))));
        assert_eq!(reader.read_frame().await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_truncated_frame() {
        let mut buf = Frame::Message(Message::new("truncated")).encode();
        buf.truncate(buf.len() - 3);

        let mut reader = FrameReader::new(Cursor::new(buf), 1024);
        let err = reader.read_frame().await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ProtocolViolation);
    }

    #[tokio::test]
    async fn test_payload_limit() {
        let big = Message::new("x".repeat(64));

        let mut sink: Vec<u8> = Vec::new();
        let mut writer = FrameWriter::new(Cursor::new(&mut sink), 16);
        let err = writer.write_frame(&Frame::Message(big.clone())).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ProtocolViolation);

        let mut reader = FrameReader::new(Cursor::new(Frame::Message(big).encode()), 16);
        let err = reader.read_frame().await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ProtocolViolation);
    }
}
