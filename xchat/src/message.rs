//! The payload exchanged in every direction.

use core::fmt;

/// A chat message.
///
/// Immutable once built; ordering comes only from stream arrival order.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Message {
    body: String,
}

impl Message {
    pub fn new(body: impl Into<String>) -> Self {
        Self { body: body.into() }
    }

    pub fn body(&self) -> &str {
        &self.body
    }

    pub fn into_body(self) -> String {
        self.body
    }
}

impl From<&str> for Message {
    fn from(body: &str) -> Self {
        Self::new(body)
    }
}

impl From<String> for Message {
    fn from(body: String) -> Self {
        Self::new(body)
    }
}

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.body)
    }
}

/// Outcome of a successful `receive`.
///
/// Errors travel separately in the `Err` side of the result, so a caller
/// always matches all three of message, end of stream and failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Received {
    Message(Message),
    /// The peer closed its send direction cleanly.
    EndOfStream,
}

impl Received {
    pub fn into_message(self) -> Option<Message> {
        match self {
            Received::Message(message) => Some(message),
            Received::EndOfStream => None,
        }
    }
}

/// The interaction pattern a call follows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum ExchangeKind {
    /// One request, one response.
    Unary = 1,
    /// One request, any number of responses.
    ServerStreaming = 2,
    /// Any number of requests, one response.
    ClientStreaming = 3,
    /// Requests and responses flowing independently.
    Bidirectional = 4,
}

impl ExchangeKind {
    pub const fn from_u8(value: u8) -> Option<Self> {
        match value {
            1 => Some(Self::Unary),
            2 => Some(Self::ServerStreaming),
            3 => Some(Self::ClientStreaming),
            4 => Some(Self::Bidirectional),
            _ => None,
        }
    }

    /// Whether the caller may send more than one request.
    pub const fn streams_requests(self) -> bool {
        matches!(self, Self::ClientStreaming | Self::Bidirectional)
    }

    /// Whether the handler may send more than one response.
    pub const fn streams_responses(self) -> bool {
        matches!(self, Self::ServerStreaming | Self::Bidirectional)
    }
}

impl fmt::Display for ExchangeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExchangeKind::Unary => write!(f, "unary"),
            ExchangeKind::ServerStreaming => write!(f, "server-stream"),
            ExchangeKind::ClientStreaming => write!(f, "client-stream"),
            ExchangeKind::Bidirectional => write!(f, "bidi-stream"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_from_u8() {
        for kind in [
            ExchangeKind::Unary,
            ExchangeKind::ServerStreaming,
            ExchangeKind::ClientStreaming,
            ExchangeKind::Bidirectional,
        ] {
            assert_eq!(ExchangeKind::from_u8(kind as u8), Some(kind));
        }
        assert_eq!(ExchangeKind::from_u8(0), None);
        assert_eq!(ExchangeKind::from_u8(5), None);
    }

    #[test]
    fn test_streaming_directions() {
        assert!(!ExchangeKind::Unary.streams_requests());
        assert!(!ExchangeKind::Unary.streams_responses());
        assert!(ExchangeKind::ServerStreaming.streams_responses());
        assert!(ExchangeKind::ClientStreaming.streams_requests());
        assert!(ExchangeKind::Bidirectional.streams_requests());
        assert!(ExchangeKind::Bidirectional.streams_responses());
    }

    #[test]
    fn test_received_into_message() {
        let received = Received::Message(Message::new("hi"));
        assert_eq!(received.into_message(), Some(Message::from("hi")));
        assert_eq!(Received::EndOfStream.into_message(), None);
    }
}
