//! # xchat - four-pattern message exchange over one connection
//!
//! xchat runs four call patterns over a single ordered, reliable byte stream:
//!
//! - **Unary**: one request, one response
//! - **Server streaming**: one request, a sequence of responses
//! - **Client streaming**: a sequence of requests, one response
//! - **Bidirectional**: requests and responses progressing independently
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │        Client (drivers)      │     ChatHandler (server)  │
//! ├─────────────────────────────────────────────────────────┤
//! │            Stream  =  Receiver  +  Sender                │
//! ├─────────────────────────────────────────────────────────┤
//! │      Frame layer: Call / Message / Status + CRC32        │
//! ├─────────────────────────────────────────────────────────┤
//! │     yamux: one logical stream per call, half-close       │
//! ├─────────────────────────────────────────────────────────┤
//! │          Unix / TCP / vsock socket (or in-memory)        │
//! └─────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Example
//!
//! ```rust,ignore
//! use xchat::{Channel, Client, Config, Message};
//!
//! let channel = Channel::new(socket, Config::default());
//! let client = Client::new(channel);
//!
//! let reply = client.unary(Message::new("hi")).await?;
//! let echoes = client.bidi(vec![Message::new("a"), Message::new("b")]).await?;
//! ```

#![deny(unsafe_code)]

pub mod channel;
pub mod client;
pub mod config;
pub mod core;
pub mod error;
pub mod handler;
pub mod io;
pub mod message;
pub mod server;
pub mod stream;

pub use channel::Channel;
pub use client::{Client, ClientStreamCall, ResponseStream};
pub use config::{CallConfig, Config};
pub use error::{Error, ErrorKind, Result};
pub use handler::{ChatHandler, ChatService};
pub use message::{ExchangeKind, Message, Received};
pub use server::serve_connection;
pub use stream::{DirectionState, ExchangeState, Stream};

/// Frame format version.
pub const VERSION: u8 = 1;
