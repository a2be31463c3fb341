//! Receiving half of an exchange.

use futures::io::ReadHalf;

use super::{DirectionState, Role};
use crate::channel::DriverHandle;
use crate::core::{CallHeader, Frame};
use crate::error::{Error, Result};
use crate::io::FrameReader;
use crate::message::Received;

/// Receiving half of an exchange.
///
/// `receive` takes `&mut self`, so one direction never has two readers.
pub struct Receiver {
    id: yamux::StreamId,
    reader: FrameReader<ReadHalf<yamux::Stream>>,
    role: Role,
    state: DirectionState,
    received: u64,
    _driver: Option<DriverHandle>,
}

impl Receiver {
    pub(crate) fn new(
        id: yamux::StreamId,
        reader: ReadHalf<yamux::Stream>,
        role: Role,
        max_payload_size: usize,
        driver: Option<DriverHandle>,
    ) -> Self {
        Self {
            id,
            reader: FrameReader::new(reader, max_payload_size),
            role,
            state: DirectionState::Open,
            received: 0,
            _driver: driver,
        }
    }

    /// Returns the current direction state.
    pub fn state(&self) -> DirectionState {
        self.state
    }

    /// Returns true once end of stream was observed or the direction failed.
    pub fn is_closed(&self) -> bool {
        self.state == DirectionState::Closed
    }

    /// Number of messages received so far.
    pub fn received(&self) -> u64 {
        self.received
    }

    /// Waits for the next message, a clean end of stream, or an error.
    ///
    /// Receiving again after end of stream or after an error is a protocol
    /// violation.
    pub async fn receive(&mut self) -> Result<Received> {
        if self.state == DirectionState::Closed {
            return Err(Error::protocol("receive on a closed direction"));
        }

        let frame = match self.reader.read_frame().await {
            Ok(frame) => frame,
            Err(err) => {
                self.state = DirectionState::Closed;
                return Err(err);
            }
        };

        let outcome = match (self.role, frame) {
            (_, Some(Frame::Message(message))) => {
                self.received += 1;
                return Ok(Received::Message(message));
            }
            (_, Some(Frame::Status(Ok(())))) => Ok(Received::EndOfStream),
            (_, Some(Frame::Status(Err(err)))) => Err(err),
            (Role::Caller, None) => Err(Error::unavailable("stream closed without a status")),
            // Reset or closed without an end marker.
            (Role::Handler, None) => Err(Error::cancelled("caller abandoned the call")),
            (_, Some(other)) => Err(Error::protocol(format!(
                "unexpected {:?} frame",
                other.frame_type()
            ))),
        };

        log::trace!(
            "Stream {} inbound closed after {} messages",
            self.id,
            self.received
        );
        self.state = DirectionState::Closed;
        outcome
    }

    /// Reads the call header that opens every exchange on the handler side.
    pub(crate) async fn read_call(&mut self) -> Result<CallHeader> {
        match self.reader.read_frame().await? {
            Some(Frame::Call(call)) => Ok(call),
            Some(other) => Err(Error::protocol(format!(
                "expected call header, got {:?} frame",
                other.frame_type()
            ))),
            None => Err(Error::protocol("stream closed before call header")),
        }
    }
}
