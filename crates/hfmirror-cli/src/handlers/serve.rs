//! `hfmirror serve` - boot the HTTP/WebSocket server (§6).

use std::path::PathBuf;

use hfmirror_server::{start_server, ServerConfig};

pub async fn execute(output: PathBuf, port: u16, cors_origins: Vec<String>) -> anyhow::Result<()> {
    let mut config = ServerConfig::with_defaults(output);
    config.port = port;
    if !cors_origins.is_empty() {
        config = config.with_allowed_origins(cors_origins);
    }

    start_server(config).await
}
