/*!
# Sidechain Client Probe

Connects to a worker, fetches the sidechain runtime metadata and reports its
size. Useful as a liveness check against a running worker.

## Configuration

Reads an optional `config` file (any format the `config` crate understands):

```yaml
worker:
  url: "ws://127.0.0.1:2000"
  timeout_ms: 6000
```

## Example Usage

```bash
cargo run
```
*/

use std::time::Duration;

use tracing::{debug, info};

use sidechain_client::rpc::connection::WorkerConnection;
use sidechain_client::worker_api::WorkerApi;

const DEFAULT_WORKER_URL: &str = "ws://127.0.0.1:2000";
const DEFAULT_TIMEOUT_MS: u64 = 6000;

#[tokio::main]
pub async fn main() -> sidechain_client::Result<()> {
    tracing_subscriber::fmt::init();
    run().await
}

async fn run() -> sidechain_client::Result<()> {
    let mut settings = config::Config::default();
    if let Err(config_error) = settings.merge(config::File::with_name("config")) {
        debug!("no config file loaded, using defaults: {}", config_error);
    }
    let worker_url = settings
        .get::<String>("worker.url")
        .unwrap_or_else(|_| String::from(DEFAULT_WORKER_URL));
    let timeout_ms = settings
        .get::<u64>("worker.timeout_ms")
        .unwrap_or(DEFAULT_TIMEOUT_MS);

    let connection = WorkerConnection::connect(&worker_url).await?;
    let worker_api = WorkerApi::new(connection.dispatcher(), Duration::from_millis(timeout_ms));

    let metadata = worker_api.get_metadata().await?;
    info!(
        "fetched sidechain metadata from {}: {} bytes",
        connection.url(),
        metadata.as_bytes().len()
    );
    Ok(())
}
