//! Serving a connection: one task per logical stream, routed by call header.

use std::sync::Arc;

use futures::future::poll_fn;
use futures::io::{AsyncRead, AsyncReadExt, AsyncWrite};
use yamux::{Connection, Mode};

use crate::config::Config;
use crate::error::{Error, Result};
use crate::handler::ChatHandler;
use crate::message::{ExchangeKind, Message, Received};
use crate::stream::{Receiver, Role, Sender};

/// Serves every call the peer opens on `socket` until the connection closes.
///
/// Each logical stream runs in its own task, so a failing call never affects
/// the others on the same connection.
pub async fn serve_connection<T, H>(socket: T, handler: Arc<H>, config: Config) -> Result<()>
where
    T: AsyncRead + AsyncWrite + Unpin + Send + 'static,
    H: ChatHandler,
{
    let mut conn = Connection::new(socket, config.yamux_config(), Mode::Server);

    loop {
        match poll_fn(|cx| conn.poll_next_inbound(cx)).await {
            Some(Ok(stream)) => {
                let handler = handler.clone();
                let max_payload_size = config.max_payload_size;
                tokio::spawn(async move {
                    let id = stream.id();
                    if let Err(e) = handle_stream(stream, handler, max_payload_size).await {
                        log::warn!("Stream {} error: {}", id, e);
                    }
                });
            }
            Some(Err(e)) => return Err(e.into()),
            None => {
                log::debug!("Connection closed by remote");
                return Ok(());
            }
        }
    }
}

/// Runs one call and writes its terminal status.
async fn handle_stream<H: ChatHandler>(
    stream: yamux::Stream,
    handler: Arc<H>,
    max_payload_size: usize,
) -> Result<()> {
    let id = stream.id();
    let (reader, writer) = stream.split();
    let mut receiver = Receiver::new(id, reader, Role::Handler, max_payload_size, None);
    let mut sender = Sender::new(id, writer, Role::Handler, max_payload_size, None);

    let call = match receiver.read_call().await {
        Ok(call) => call,
        Err(e) => {
            // Tell the caller why, if the stream still lets us.
            let _ = sender.finish(Err(e.clone())).await;
            return Err(e);
        }
    };
    log::debug!("Stream {} carries a {} call", id, call.kind);

    let work = run_handler(&*handler, call.kind, &mut receiver, &mut sender);
    // Each frame goes out as one encoded buffer and one `write_all`, but a
    // deadline can still cancel that write halfway. The caller then reads a
    // torn frame as `ProtocolViolation`. Its own deadline, which is the same
    // one, normally fires first.
    let outcome = match call.timeout {
        Some(timeout) => tokio::time::timeout(timeout, work)
            .await
            .unwrap_or_else(|_| Err(Error::deadline_exceeded())),
        None => work.await,
    };

    if let Err(e) = &outcome {
        log::debug!("Stream {} {} call failed: {}", id, call.kind, e);
    }
    sender.finish(outcome).await
}

async fn run_handler<H: ChatHandler>(
    handler: &H,
    kind: ExchangeKind,
    requests: &mut Receiver,
    responses: &mut Sender,
) -> Result<()> {
    match kind {
        ExchangeKind::Unary => {
            let request = single_request(requests).await?;
            let response = handler.unary(request).await?;
            responses.send(response).await
        }
        ExchangeKind::ServerStreaming => {
            let request = single_request(requests).await?;
            handler.server_stream(request, responses).await
        }
        ExchangeKind::ClientStreaming => {
            let response = handler.client_stream(requests).await?;
            if !requests.is_closed() {
                return Err(Error::protocol("handler responded before end of input"));
            }
            responses.send(response).await
        }
        ExchangeKind::Bidirectional => handler.bidi(requests, responses).await,
    }
}

/// Reads the one request of a unary or server-stream call.
async fn single_request(requests: &mut Receiver) -> Result<Message> {
    let request = match requests.receive().await? {
        Received::Message(message) => message,
        Received::EndOfStream => return Err(Error::protocol("call carried no request")),
    };
    match requests.receive().await? {
        Received::EndOfStream => Ok(request),
        Received::Message(_) => Err(Error::protocol("call carried more than one request")),
    }
}
