use std::time::Duration;

use crate::message::ExchangeKind;

/// Largest message frame accepted or written, in bytes.
pub const DEFAULT_MAX_PAYLOAD_SIZE: usize = 4 * 1024 * 1024;

/// Logical streams allowed at once on one connection.
pub const DEFAULT_MAX_STREAMS: usize = 512;

/// Connection-level settings shared by both ends.
#[derive(Debug, Clone)]
pub struct Config {
    pub max_payload_size: usize,
    pub max_streams: usize,
}

impl Config {
    pub fn new() -> Self {
        Self {
            max_payload_size: DEFAULT_MAX_PAYLOAD_SIZE,
            max_streams: DEFAULT_MAX_STREAMS,
        }
    }

    pub fn with_max_payload_size(mut self, size: usize) -> Self {
        self.max_payload_size = size;
        self
    }

    pub fn with_max_streams(mut self, streams: usize) -> Self {
        self.max_streams = streams;
        self
    }

    pub(crate) fn yamux_config(&self) -> yamux::Config {
        let mut config = yamux::Config::default();
        config.set_max_num_streams(self.max_streams);
        config
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}

/// Deadlines applied by the client to each kind of call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CallConfig {
    pub unary_timeout: Duration,
    pub server_stream_timeout: Duration,
    pub client_stream_timeout: Duration,
    pub bidi_timeout: Duration,
}

impl CallConfig {
    pub fn new() -> Self {
        Self {
            unary_timeout: Duration::from_secs(5),
            server_stream_timeout: Duration::from_secs(5),
            client_stream_timeout: Duration::from_secs(5),
            bidi_timeout: Duration::from_secs(10),
        }
    }

    /// Uses the same deadline for every kind of call.
    pub fn with_timeout(self, timeout: Duration) -> Self {
        Self {
            unary_timeout: timeout,
            server_stream_timeout: timeout,
            client_stream_timeout: timeout,
            bidi_timeout: timeout,
        }
    }

    pub fn with_unary_timeout(mut self, timeout: Duration) -> Self {
        self.unary_timeout = timeout;
        self
    }

    pub fn with_server_stream_timeout(mut self, timeout: Duration) -> Self {
        self.server_stream_timeout = timeout;
        self
    }

    pub fn with_client_stream_timeout(mut self, timeout: Duration) -> Self {
        self.client_stream_timeout = timeout;
        self
    }

    pub fn with_bidi_timeout(mut self, timeout: Duration) -> Self {
        self.bidi_timeout = timeout;
        self
    }

    pub fn timeout_for(&self, kind: ExchangeKind) -> Duration {
        match kind {
            ExchangeKind::Unary => self.unary_timeout,
            ExchangeKind::ServerStreaming => self.server_stream_timeout,
            ExchangeKind::ClientStreaming => self.client_stream_timeout,
            ExchangeKind::Bidirectional => self.bidi_timeout,
        }
    }
}

impl Default for CallConfig {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_deadlines() {
        let config = CallConfig::default();
        assert_eq!(config.timeout_for(ExchangeKind::Unary), Duration::from_secs(5));
        assert_eq!(
            config.timeout_for(ExchangeKind::Bidirectional),
            Duration::from_secs(10)
        );
    }

    #[test]
    fn test_builders() {
        let config = CallConfig::new()
            .with_timeout(Duration::from_millis(200))
            .with_bidi_timeout(Duration::from_secs(1));
        assert_eq!(
            config.timeout_for(ExchangeKind::ClientStreaming),
            Duration::from_millis(200)
        );
        assert_eq!(
            config.timeout_for(ExchangeKind::Bidirectional),
            Duration::from_secs(1)
        );

        let config = Config::new().with_max_payload_size(1024).with_max_streams(8);
        assert_eq!(config.max_payload_size, 1024);
        assert_eq!(config.max_streams, 8);
    }
}
