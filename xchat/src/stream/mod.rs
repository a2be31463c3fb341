//! Per-exchange stream handle.
//!
//! A [`Stream`] owns one multiplexed logical stream. It splits into a
//! [`Receiver`] and a [`Sender`], each with its own direction state, so the
//! inbound and outbound directions can be driven by separate tasks while each
//! direction keeps a single owner.

mod receiver;
mod sender;

pub use receiver::Receiver;
pub use sender::Sender;

use futures::io::AsyncReadExt;

use crate::channel::DriverHandle;
use crate::error::{Error, Result};
use crate::message::{ExchangeKind, Message, Received};

/// State of one direction of an exchange.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DirectionState {
    /// Direction is carrying messages.
    Open,

    /// End of stream was sent or observed, or the direction failed.
    Closed,
}

/// Combined state of both directions, as seen from one side.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExchangeState {
    /// Both directions active.
    Open,

    /// Local side closed its send direction; receiving continues.
    SendClosed,

    /// Peer ended its direction; sending continues.
    RecvClosed,

    /// Both directions closed.
    Done,
}

impl ExchangeState {
    pub fn from_directions(send: DirectionState, recv: DirectionState) -> Self {
        match (send, recv) {
            (DirectionState::Open, DirectionState::Open) => Self::Open,
            (DirectionState::Closed, DirectionState::Open) => Self::SendClosed,
            (DirectionState::Open, DirectionState::Closed) => Self::RecvClosed,
            (DirectionState::Closed, DirectionState::Closed) => Self::Done,
        }
    }
}

/// Which end of the exchange a stream belongs to.
///
/// Both directions end with a `Status` frame before the half-close. A bare
/// close is `Unavailable` for the caller and `Cancelled` for the handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Role {
    Caller,
    Handler,
}

/// Handle for one exchange.
pub struct Stream {
    kind: ExchangeKind,
    receiver: Receiver,
    sender: Sender,
}

impl Stream {
    pub(crate) fn new(
        raw: yamux::Stream,
        role: Role,
        kind: ExchangeKind,
        max_payload_size: usize,
        driver: Option<DriverHandle>,
    ) -> Self {
        let id = raw.id();
        let (reader, writer) = raw.split();
        Self {
            kind,
            receiver: Receiver::new(id, reader, role, max_payload_size, driver.clone()),
            sender: Sender::new(id, writer, role, max_payload_size, driver),
        }
    }

    pub fn kind(&self) -> ExchangeKind {
        self.kind
    }

    pub fn state(&self) -> ExchangeState {
        ExchangeState::from_directions(self.sender.state(), self.receiver.state())
    }

    pub async fn send(&mut self, message: Message) -> Result<()> {
        self.sender.send(message).await
    }

    pub async fn receive(&mut self) -> Result<Received> {
        self.receiver.receive().await
    }

    pub async fn close_send(&mut self) -> Result<()> {
        self.sender.close_send().await
    }

    /// Ends the send direction and waits for the single response.
    ///
    /// The peer must answer with exactly one message followed by a clean end
    /// of stream.
    pub async fn close_and_receive(&mut self) -> Result<Message> {
        // A peer that already answered and left makes the close fail; its
        // status is the better error, so read it first.
        let closed = self.close_send().await;

        let response = match self.receive().await? {
            Received::Message(message) => message,
            Received::EndOfStream => {
                return Err(Error::protocol("stream ended without a response"));
            }
        };

        match self.receive().await? {
            Received::EndOfStream => closed.map(|()| response),
            Received::Message(_) => Err(Error::protocol("peer sent more than one response")),
        }
    }

    /// Splits into independently owned halves for full-duplex use.
    pub fn split(self) -> (Receiver, Sender) {
        (self.receiver, self.sender)
    }

    pub(crate) fn sender_mut(&mut self) -> &mut Sender {
        &mut self.sender
    }
}
