//! Persistence server entry point.

use orrery::server::{serve, ServerConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::init();

    let config = ServerConfig::from_env();
    serve(config).await
}
