use std::fs;
use std::io;
use std::sync::{Arc, Mutex};

use tracing::{info, warn};

use crate::infrastructure::config::AppConfig;
use crate::interfaces::http::start_server;

pub async fn run() -> io::Result<()> {
    let config = AppConfig::load()
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e.to_string()))?;

    let _ = tracing_subscriber::fmt()
        .with_env_filter(config.log_filter.as_str())
        .try_init();

    if !config.data_dir.exists() {
        if let Err(e) = fs::create_dir_all(&config.data_dir) {
            warn!(path = %config.data_dir.display(), error = %e, "Could not create data directory");
        }
    }
    if config.read_only {
        info!("Writes are disabled; update routes will answer 501");
    }

    let logs = Arc::new(Mutex::new(Vec::new()));
    start_server(&config, logs)?.await
}
