use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;

use log::*;
use tokio::net::{TcpStream, UnixStream};
use tokio_util::compat::TokioAsyncReadCompatExt;
use tokio_vsock::{VsockAddr, VsockStream};
use xchat::{Channel, Config};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientTarget {
    Unix(PathBuf),
    Tcp(SocketAddr),
    Vsock { cid: u32, port: u32 },
}

impl FromStr for ClientTarget {
    type Err = String;

    /// Parses `unix:<path>`, `tcp:<host:port>` or `vsock:<cid>:<port>`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (scheme, rest) = s
            .split_once(':')
            .ok_or_else(|| format!("missing scheme in {:?}", s))?;
        match scheme {
            "unix" if !rest.is_empty() => Ok(ClientTarget::Unix(PathBuf::from(rest))),
            "tcp" => rest
                .parse()
                .map(ClientTarget::Tcp)
                .map_err(|e| format!("bad tcp address {:?}: {}", rest, e)),
            "vsock" => {
                let (cid, port) = rest
                    .split_once(':')
                    .ok_or_else(|| format!("expected vsock:<cid>:<port>, got {:?}", s))?;
                let cid = cid.parse().map_err(|e| format!("bad vsock cid {:?}: {}", cid, e))?;
                let port = port.parse().map_err(|e| format!("bad vsock port {:?}: {}", port, e))?;
                Ok(ClientTarget::Vsock { cid, port })
            }
            _ => Err(format!("unsupported target {:?}", s)),
        }
    }
}

pub struct TransClient {
    target: ClientTarget,
    config: Config,
}

impl TransClient {
    pub fn new(target: ClientTarget) -> Self {
        Self {
            target,
            config: Config::default(),
        }
    }

    /// Connects the socket and starts the multiplexed connection on it.
    pub async fn connect(&self) -> xchat::Result<Channel> {
        info!("Connecting to target: {:?}", self.target);
        let channel = match &self.target {
            ClientTarget::Unix(path) => {
                let stream = UnixStream::connect(path).await?;
                info!("Unix socket connected.");
                Channel::new(stream.compat(), self.config.clone())
            }
            ClientTarget::Tcp(addr) => {
                let stream = TcpStream::connect(addr).await?;
                info!("TCP socket connected.");
                Channel::new(stream.compat(), self.config.clone())
            }
            ClientTarget::Vsock { cid, port } => {
                let stream = VsockStream::connect(VsockAddr::new(*cid, *port)).await?;
                info!("Vsock socket connected.");
                Channel::new(stream.compat(), self.config.clone())
            }
        };
        Ok(channel)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_targets() {
        assert_eq!(
            "tcp:127.0.0.1:9000".parse::<ClientTarget>().unwrap(),
            ClientTarget::Tcp("127.0.0.1:9000".parse().unwrap())
        );
        assert_eq!(
            "unix:/tmp/xchat.sock".parse::<ClientTarget>().unwrap(),
            ClientTarget::Unix(PathBuf::from("/tmp/xchat.sock"))
        );
        assert_eq!(
            "vsock:3:1234".parse::<ClientTarget>().unwrap(),
            ClientTarget::Vsock { cid: 3, port: 1234 }
        );
    }

    #[test]
    fn test_reject_bad_targets() {
        assert!("localhost".parse::<ClientTarget>().is_err());
        assert!("tcp:nowhere".parse::<ClientTarget>().is_err());
        assert!("vsock:3".parse::<ClientTarget>().is_err());
        assert!("unix:".parse::<ClientTarget>().is_err());
        assert!("http:1.2.3.4:80".parse::<ClientTarget>().is_err());
    }
}
