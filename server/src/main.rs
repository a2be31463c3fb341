mod trans_server;

use log::*;
use trans_server::{ServerTarget, TransServer};
use xchat::ChatService;

const DEFAULT_ADDR: &str = "tcp:127.0.0.1:9000";
const ADDR_ENV: &str = "XCHAT_ADDR";
const STREAM_COUNT_ENV: &str = "XCHAT_STREAM_COUNT";

#[tokio::main]
async fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let addr = std::env::var(ADDR_ENV).unwrap_or_else(|_| DEFAULT_ADDR.to_string());
    let target: ServerTarget = match addr.parse() {
        Ok(target) => target,
        Err(e) => {
            error!("Invalid {}: {}", ADDR_ENV, e);
            std::process::exit(2);
        }
    };

    let mut service = ChatService::new();
    if let Ok(count) = std::env::var(STREAM_COUNT_ENV) {
        match count.parse() {
            Ok(count) => service = service.with_stream_count(count),
            Err(e) => warn!("Ignoring {}={:?}: {}", STREAM_COUNT_ENV, count, e),
        }
    }
    info!("Server stream count: {}", service.stream_count());

    if let Err(e) = TransServer::new(target, service).run().await {
        error!("Server stopped: {}", e);
        std::process::exit(1);
    }
}
