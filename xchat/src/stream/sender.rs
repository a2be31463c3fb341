//! Sending half of an exchange.

use futures::io::WriteHalf;

use super::{DirectionState, Role};
use crate::channel::DriverHandle;
use crate::core::Frame;
use crate::error::{Error, Result};
use crate::io::FrameWriter;
use crate::message::Message;

/// Sending half of an exchange.
///
/// `send` may suspend while the multiplexer's window toward the peer is full.
pub struct Sender {
    id: yamux::StreamId,
    writer: FrameWriter<WriteHalf<yamux::Stream>>,
    role: Role,
    state: DirectionState,
    sent: u64,
    _driver: Option<DriverHandle>,
}

impl Sender {
    pub(crate) fn new(
        id: yamux::StreamId,
        writer: WriteHalf<yamux::Stream>,
        role: Role,
        max_payload_size: usize,
        driver: Option<DriverHandle>,
    ) -> Self {
        Self {
            id,
            writer: FrameWriter::new(writer, max_payload_size),
            role,
            state: DirectionState::Open,
            sent: 0,
            _driver: driver,
        }
    }

    /// Returns the current direction state.
    pub fn state(&self) -> DirectionState {
        self.state
    }

    pub fn is_closed(&self) -> bool {
        self.state == DirectionState::Closed
    }

    /// Number of messages sent so far.
    pub fn sent(&self) -> u64 {
        self.sent
    }

    pub async fn send(&mut self, message: Message) -> Result<()> {
        if self.state == DirectionState::Closed {
            return Err(Error::protocol("send after close"));
        }
        self.writer.write_frame(&Frame::Message(message)).await?;
        self.sent += 1;
        Ok(())
    }

    /// Half-closes the send direction. Closing twice is a no-op.
    ///
    /// The caller marks its end of input with an OK status before closing, so
    /// the handler can tell it from an abandoned call. On the handler side
    /// this only stops further sends; the stream is closed after the terminal
    /// status once the handler returns.
    pub async fn close_send(&mut self) -> Result<()> {
        if self.state == DirectionState::Closed {
            return Ok(());
        }
        self.state = DirectionState::Closed;
        if self.role == Role::Handler {
            return Ok(());
        }
        log::trace!("Stream {} outbound closed after {} messages", self.id, self.sent);
        self.writer.write_frame(&Frame::Status(Ok(()))).await?;
        self.writer.close().await
    }

    pub(crate) async fn write_frame(&mut self, frame: &Frame) -> Result<()> {
        self.writer.write_frame(frame).await
    }

    /// Writes the terminal status and closes; used by the handler side only.
    pub(crate) async fn finish(&mut self, outcome: Result<()>) -> Result<()> {
        self.state = DirectionState::Closed;
        self.writer.write_frame(&Frame::Status(outcome)).await?;
        log::trace!("Stream {} finished after {} messages", self.id, self.sent);
        self.writer.close().await
    }
}
