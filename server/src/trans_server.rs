use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;

use log::*;
use tokio::net::{TcpListener, UnixListener};
use tokio_util::compat::TokioAsyncReadCompatExt;
use tokio_vsock::{VsockAddr, VsockListener};
use xchat::{ChatHandler, Config, serve_connection};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServerTarget {
    Unix(PathBuf),
    Tcp(SocketAddr),
    Vsock { cid: u32, port: u32 },
}

impl FromStr for ServerTarget {
    type Err = String;

    /// Parses `unix:<path>`, `tcp:<host:port>` or `vsock:<cid>:<port>`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (scheme, rest) = s
            .split_once(':')
            .ok_or_else(|| format!("missing scheme in {:?}", s))?;
        match scheme {
            "unix" if !rest.is_empty() => Ok(ServerTarget::Unix(PathBuf::from(rest))),
            "tcp" => rest
                .parse()
                .map(ServerTarget::Tcp)
                .map_err(|e| format!("bad tcp address {:?}: {}", rest, e)),
            "vsock" => {
                let (cid, port) = rest
                    .split_once(':')
                    .ok_or_else(|| format!("expected vsock:<cid>:<port>, got {:?}", s))?;
                let cid = cid.parse().map_err(|e| format!("bad vsock cid {:?}: {}", cid, e))?;
                let port = port.parse().map_err(|e| format!("bad vsock port {:?}: {}", port, e))?;
                Ok(ServerTarget::Vsock { cid, port })
            }
            _ => Err(format!("unsupported target {:?}", s)),
        }
    }
}

pub struct TransServer<H> {
    target: ServerTarget,
    handler: Arc<H>,
    config: Config,
}

impl<H: ChatHandler> TransServer<H> {
    pub fn new(target: ServerTarget, handler: H) -> Self {
        Self {
            target,
            handler: Arc::new(handler),
            config: Config::default(),
        }
    }

    /// Accepts connections forever; only a listener failure returns.
    pub async fn run(&self) -> std::io::Result<()> {
        match &self.target {
            ServerTarget::Unix(path) => {
                if path.exists() {
                    let _ = std::fs::remove_file(path);
                }
                let listener = UnixListener::bind(path)?;
                info!("Server listening on Unix Socket {:?}", path);
                loop {
                    let (stream, _) = listener.accept().await?;
                    info!("Accepted Unix connection");
                    self.spawn_connection(stream.compat());
                }
            }
            ServerTarget::Tcp(addr) => {
                let listener = TcpListener::bind(addr).await?;
                info!("Server listening on TCP {:?}", addr);
                loop {
                    let (stream, peer) = listener.accept().await?;
                    info!("Accepted TCP connection from {:?}", peer);
                    self.spawn_connection(stream.compat());
                }
            }
            ServerTarget::Vsock { cid, port } => {
                let listener = VsockListener::bind(VsockAddr::new(*cid, *port))?;
                info!("Server listening on Vsock CID:{} Port:{}", cid, port);
                loop {
                    let (stream, addr) = listener.accept().await?;
                    info!("Accepted Vsock connection from {:?}", addr);
                    self.spawn_connection(stream.compat());
                }
            }
        }
    }

    /// Serves one connection in its own task; each call on it gets a task too.
    fn spawn_connection<T>(&self, stream: T)
    where
        T: futures::io::AsyncRead + futures::io::AsyncWrite + Unpin + Send + 'static,
    {
        let handler = self.handler.clone();
        let config = self.config.clone();
        tokio::spawn(async move {
            match serve_connection(stream, handler, config).await {
                Ok(()) => info!("Connection closed by remote"),
                Err(e) => error!("Connection error: {}", e),
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_targets() {
        assert_eq!(
            "tcp:0.0.0.0:9000".parse::<ServerTarget>().unwrap(),
            ServerTarget::Tcp("0.0.0.0:9000".parse().unwrap())
        );
        assert_eq!(
            "unix:/tmp/xchat.sock".parse::<ServerTarget>().unwrap(),
            ServerTarget::Unix(PathBuf::from("/tmp/xchat.sock"))
        );
        assert_eq!(
            "vsock:4294967295:1234".parse::<ServerTarget>().unwrap(),
            ServerTarget::Vsock {
                cid: u32::MAX,
                port: 1234
            }
        );
        assert!("vsock:any:1234".parse::<ServerTarget>().is_err());
    }
}
