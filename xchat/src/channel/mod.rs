//! Client side of a multiplexed connection.
//!
//! yamux only makes progress while its `Connection` is polled, so a single
//! driver task owns it. `Channel` handles ask that task for new outbound
//! streams over an mpsc queue and get each stream back through a oneshot.

use std::collections::VecDeque;
use std::task::Poll;
use std::time::Duration;

use futures::future::poll_fn;
use futures::io::{AsyncRead, AsyncWrite};
use tokio::sync::{mpsc, oneshot};
use yamux::{Connection, Mode};

use crate::config::Config;
use crate::core::{CallHeader, Frame};
use crate::error::{Error, Result};
use crate::message::ExchangeKind;
use crate::stream::{Role, Stream};

/// Open requests queued before the driver picks them up.
const OPEN_QUEUE_DEPTH: usize = 32;

type OpenReply = oneshot::Sender<Result<yamux::Stream>>;

/// Keeps the connection driver alive while a stream is in use.
#[derive(Clone)]
pub(crate) struct DriverHandle(mpsc::Sender<OpenReply>);

/// Opens calls on one connection. Cheap to clone.
///
/// The connection is closed once every clone, and every stream opened from
/// it, has been dropped.
#[derive(Clone)]
pub struct Channel {
    driver: DriverHandle,
    config: Config,
}

impl Channel {
    /// Starts the connection driver on the current tokio runtime.
    pub fn new<T>(socket: T, config: Config) -> Self
    where
        T: AsyncRead + AsyncWrite + Unpin + Send + 'static,
    {
        let conn = Connection::new(socket, config.yamux_config(), Mode::Client);
        let (requests, pending) = mpsc::channel(OPEN_QUEUE_DEPTH);

        tokio::spawn(async move {
            match drive_connection(conn, pending).await {
                Ok(()) => log::debug!("Connection closed"),
                Err(e) => log::error!("Connection error: {}", e),
            }
        });

        Self {
            driver: DriverHandle(requests),
            config,
        }
    }

    /// Returns true once the connection driver has stopped.
    pub fn is_closed(&self) -> bool {
        self.driver.0.is_closed()
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Opens a logical stream and writes the call header.
    ///
    /// `timeout` is forwarded to the handler side so it can stop working on
    /// the call when the caller stops waiting.
    pub async fn open_call(&self, kind: ExchangeKind, timeout: Option<Duration>) -> Result<Stream> {
        let (reply, opened) = oneshot::channel();
        self.driver
            .0
            .send(reply)
            .await
            .map_err(|_| Error::unavailable("connection driver stopped"))?;
        let raw = opened
            .await
            .map_err(|_| Error::unavailable("connection driver stopped"))??;

        log::debug!("Opened {} call on stream {}", kind, raw.id());

        let mut stream = Stream::new(
            raw,
            Role::Caller,
            kind,
            self.config.max_payload_size,
            Some(self.driver.clone()),
        );
        stream
            .sender_mut()
            .write_frame(&Frame::Call(CallHeader { kind, timeout }))
            .await?;
        Ok(stream)
    }
}

/// Polls the connection until it ends, serving open requests along the way.
async fn drive_connection<T>(
    mut conn: Connection<T>,
    mut requests: mpsc::Receiver<OpenReply>,
) -> Result<()>
where
    T: AsyncRead + AsyncWrite + Unpin + Send + 'static,
{
    let mut waiting: VecDeque<OpenReply> = VecDeque::new();
    let mut accepting = true;

    poll_fn(|cx| {
        while accepting {
            match requests.poll_recv(cx) {
                Poll::Ready(Some(reply)) => waiting.push_back(reply),
                // Every handle is gone.
                Poll::Ready(None) => accepting = false,
                Poll::Pending => break,
            }
        }

        while !waiting.is_empty() {
            match conn.poll_new_outbound(cx) {
                Poll::Ready(opened) => {
                    if let Some(reply) = waiting.pop_front() {
                        let _ = reply.send(opened.map_err(Error::from));
                    }
                }
                Poll::Pending => break,
            }
        }

        if !accepting && waiting.is_empty() {
            return conn.poll_close(cx).map_err(Error::from);
        }

        loop {
            match conn.poll_next_inbound(cx) {
                Poll::Ready(Some(Ok(stream))) => {
                    log::debug!("Ignoring inbound stream {} opened by server", stream.id());
                }
                Poll::Ready(Some(Err(e))) => return Poll::Ready(Err(Error::from(e))),
                Poll::Ready(None) => return Poll::Ready(Ok(())),
                Poll::Pending => return Poll::Pending,
            }
        }
    })
    .await
}
