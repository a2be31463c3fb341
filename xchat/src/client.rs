//! Caller side of the four exchange kinds.
//!
//! Every call is bounded by the deadline configured for its kind in
//! [`CallConfig`]. The same deadline travels in the call header so the
//! handler side stops too.

use futures::stream::{self, Stream as FuturesStream};
use tokio::sync::oneshot;
use tokio::time::{timeout_at, Instant};

use crate::channel::Channel;
use crate::config::CallConfig;
use crate::error::{Error, Result};
use crate::message::{ExchangeKind, Message, Received};
use crate::stream::Stream;

#[derive(Clone)]
pub struct Client {
    channel: Channel,
    config: CallConfig,
}

impl Client {
    pub fn new(channel: Channel) -> Self {
        Self {
            channel,
            config: CallConfig::default(),
        }
    }

    pub fn with_call_config(mut self, config: CallConfig) -> Self {
        self.config = config;
        self
    }

    pub fn channel(&self) -> &Channel {
        &self.channel
    }

    pub fn call_config(&self) -> &CallConfig {
        &self.config
    }

    /// Opens a call of `kind` and returns it with its absolute deadline.
    async fn open(&self, kind: ExchangeKind) -> Result<(Stream, Instant)> {
        let budget = self.config.timeout_for(kind);
        let deadline = Instant::now() + budget;
        let stream = timeout_at(deadline, self.channel.open_call(kind, Some(budget))).await??;
        Ok((stream, deadline))
    }

    /// Single request, single response.
    pub async fn unary(&self, request: Message) -> Result<Message> {
        let (mut stream, deadline) = self.open(ExchangeKind::Unary).await?;
        timeout_at(deadline, async move {
            stream.send(request).await?;
            stream.close_and_receive().await
        })
        .await?
    }

    /// Sends one request and returns the lazily received responses.
    pub async fn server_stream(&self, request: Message) -> Result<ResponseStream> {
        let (mut stream, deadline) = self.open(ExchangeKind::ServerStreaming).await?;
        timeout_at(deadline, async {
            stream.send(request).await?;
            stream.close_send().await
        })
        .await??;
        Ok(ResponseStream {
            stream,
            deadline,
            finished: false,
        })
    }

    /// Opens a client-streaming call to feed requests one at a time.
    pub async fn open_client_stream(&self) -> Result<ClientStreamCall> {
        let (stream, deadline) = self.open(ExchangeKind::ClientStreaming).await?;
        Ok(ClientStreamCall { stream, deadline })
    }

    /// Sends every request, then waits for the single aggregated response.
    pub async fn client_stream<I>(&self, requests: I) -> Result<Message>
    where
        I: IntoIterator<Item = Message>,
    {
        let mut call = self.open_client_stream().await?;
        for request in requests {
            call.send(request).await?;
        }
        call.close_and_receive().await
    }

    /// Opens a bidirectional call and hands back the raw stream.
    ///
    /// Callers that drive it themselves must keep sending and receiving in
    /// separate tasks (see [`Stream::split`]); the deadline is theirs to apply.
    pub async fn open_bidi(&self) -> Result<Stream> {
        let (stream, _) = self.open(ExchangeKind::Bidirectional).await?;
        Ok(stream)
    }

    /// Full-duplex exchange: sends every request while a separate task drains
    /// the responses.
    ///
    /// Returns once the handler ends its direction, with every response in
    /// arrival order. On deadline the drain task is aborted and joined before
    /// the error is returned.
    pub async fn bidi<I>(&self, requests: I) -> Result<Vec<Message>>
    where
        I: IntoIterator<Item = Message>,
    {
        let requests: Vec<Message> = requests.into_iter().collect();
        let (stream, deadline) = self.open(ExchangeKind::Bidirectional).await?;
        let (mut receiver, mut sender) = stream.split();

        let (done_tx, done_rx) = oneshot::channel();
        let drain = tokio::spawn(async move {
            let mut responses = Vec::new();
            let outcome = loop {
                match receiver.receive().await {
                    Ok(Received::Message(message)) => responses.push(message),
                    Ok(Received::EndOfStream) => break Ok(responses),
                    Err(e) => break Err(e),
                }
            };
            let _ = done_tx.send(outcome);
        });

        let exchange = async move {
            let mut sent = Ok(());
            for request in requests {
                if let Err(e) = sender.send(request).await {
                    sent = Err(e);
                    break;
                }
            }
            // Close even after a failed send so the handler can finish.
            let closed = sender.close_send().await;
            let sent = sent.and(closed);

            let drained = match done_rx.await {
                Ok(drained) => drained,
                Err(_) => Err(Error::cancelled("response drain stopped without a result")),
            };

            // The handler's own error explains a failed send better.
            match (drained, sent) {
                (Err(e), _) => Err(e),
                (Ok(_), Err(e)) => Err(e),
                (Ok(responses), Ok(())) => Ok(responses),
            }
        };

        let outcome = timeout_at(deadline, exchange).await;
        if outcome.is_err() {
            drain.abort();
        }
        let _ = drain.await;
        outcome?
    }
}

/// Responses of a server-streaming call, received on demand.
pub struct ResponseStream {
    stream: Stream,
    deadline: Instant,
    finished: bool,
}

impl ResponseStream {
    /// Next response, or `None` after the handler ended the stream.
    ///
    /// After an error the stream is finished and yields `None`.
    pub async fn next(&mut self) -> Result<Option<Message>> {
        if self.finished {
            return Ok(None);
        }

        let received = match timeout_at(self.deadline, self.stream.receive()).await {
            Ok(received) => received,
            Err(elapsed) => Err(Error::from(elapsed)),
        };

        match received {
            Ok(Received::Message(message)) => Ok(Some(message)),
            Ok(Received::EndOfStream) => {
                self.finished = true;
                Ok(None)
            }
            Err(e) => {
                self.finished = true;
                Err(e)
            }
        }
    }

    /// Drains every remaining response.
    pub async fn collect(mut self) -> Result<Vec<Message>> {
        let mut responses = Vec::new();
        while let Some(message) = self.next().await? {
            responses.push(message);
        }
        Ok(responses)
    }

    /// Adapts into a `futures::Stream`; an error is the last item.
    pub fn into_stream(self) -> impl FuturesStream<Item = Result<Message>> + Send {
        stream::unfold(self, |mut responses| async move {
            match responses.next().await {
                Ok(Some(message)) => Some((Ok(message), responses)),
                Ok(None) => None,
                Err(e) => Some((Err(e), responses)),
            }
        })
    }
}

/// An open client-streaming call.
pub struct ClientStreamCall {
    stream: Stream,
    deadline: Instant,
}

impl ClientStreamCall {
    pub async fn send(&mut self, request: Message) -> Result<()> {
        timeout_at(self.deadline, self.stream.send(request)).await?
    }

    /// Ends the request direction and waits for the response.
    pub async fn close_and_receive(mut self) -> Result<Message> {
        timeout_at(self.deadline, self.stream.close_and_receive()).await?
    }
}
