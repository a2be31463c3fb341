//! Handler side of the four exchange kinds.

use std::future::Future;

use crate::error::Result;
use crate::message::{Message, Received};
use crate::stream::{Receiver, Sender};

/// Server-side logic, one method per exchange kind.
///
/// Each call gets fresh stream halves; any per-call state (counters,
/// accumulators) lives in the method body. Returning `Ok` ends the response
/// direction cleanly; returning `Err` delivers that error to the caller's next
/// receive instead of a message. A caller that walks away without ending its
/// input shows up as a `Cancelled` error from `Receiver::receive`.
pub trait ChatHandler: Send + Sync + 'static {
    /// One request in, one response out.
    fn unary(&self, request: Message) -> impl Future<Output = Result<Message>> + Send;

    /// One request in, any number of responses sent on `responses`.
    fn server_stream(
        &self,
        request: Message,
        responses: &mut Sender,
    ) -> impl Future<Output = Result<()>> + Send;

    /// Requests are received until end of stream; the returned message is the
    /// single response.
    ///
    /// Returning before `requests` observed end of stream is rejected as a
    /// protocol violation.
    fn client_stream(&self, requests: &mut Receiver) -> impl Future<Output = Result<Message>> + Send;

    /// Both directions progress independently.
    fn bidi(
        &self,
        requests: &mut Receiver,
        responses: &mut Sender,
    ) -> impl Future<Output = Result<()>> + Send;
}

/// Number of messages `ChatService` pushes per server-stream call.
pub const DEFAULT_STREAM_COUNT: usize = 3;

/// The stock chat handler: greets, counts and echoes.
#[derive(Debug, Clone)]
pub struct ChatService {
    stream_count: usize,
}

impl ChatService {
    pub fn new() -> Self {
        Self {
            stream_count: DEFAULT_STREAM_COUNT,
        }
    }

    pub fn with_stream_count(mut self, count: usize) -> Self {
        self.stream_count = count;
        self
    }

    pub fn stream_count(&self) -> usize {
        self.stream_count
    }
}

impl Default for ChatService {
    fn default() -> Self {
        Self::new()
    }
}

impl ChatHandler for ChatService {
    async fn unary(&self, request: Message) -> Result<Message> {
        log::debug!("Unary recv: {}", request.body());
        Ok(Message::new("Hello From the Server!"))
    }

    async fn server_stream(&self, request: Message, responses: &mut Sender) -> Result<()> {
        log::debug!("ServerStream recv: {}", request.body());
        for i in 0..self.stream_count {
            responses.send(Message::new(format!("message {}", i))).await?;
        }
        Ok(())
    }

    async fn client_stream(&self, requests: &mut Receiver) -> Result<Message> {
        let mut count = 0usize;
        loop {
            match requests.receive().await? {
                Received::Message(message) => {
                    log::debug!("ClientStream recv: {}", message.body());
                    count += 1;
                }
                Received::EndOfStream => {
                    return Ok(Message::new(format!("received {} messages", count)));
                }
            }
        }
    }

    async fn bidi(&self, requests: &mut Receiver, responses: &mut Sender) -> Result<()> {
        loop {
            match requests.receive().await? {
                Received::Message(message) => {
                    log::debug!("BiDi recv: {}", message.body());
                    responses
                        .send(Message::new(format!("echo: {}", message.body())))
                        .await?;
                }
                Received::EndOfStream => return Ok(()),
            }
        }
    }
}
