use std::path::PathBuf;
use std::sync::Arc;

use qbctl_core::{targets, HttpApiClient, PanelConfig, DEFAULT_CONFIG_PATH};
use qbctl_ui::logging::{apply_log_level, init_logging, LogLevel, LogStore, DEFAULT_LOG_CAPACITY};
use qbctl_ui::{run, Flags};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config_path = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH));

    let log_store = LogStore::new(DEFAULT_LOG_CAPACITY);
    let reload_handle = init_logging(log_store.clone(), LogLevel::default());

    let config = PanelConfig::load_or_default(&config_path);
    let log_level = match config.log_level.parse::<LogLevel>() {
        Ok(level) => level,
        Err(error) => {
            tracing::warn!(target: targets::CONFIG, "{error}; keeping {}", LogLevel::default());
            LogLevel::default()
        }
    };
    apply_log_level(&reload_handle, log_level);

    let client = HttpApiClient::new(config.api_base.clone(), config.request_timeout())?;

    tracing::info!(
        target: targets::CONFIG,
        path = %config_path.display(),
        api_base = %client.base_url(),
        "qbctl starting"
    );

    run(Flags {
        config,
        client: Arc::new(client),
        log_store,
        reload_handle,
        log_level,
    })?;
    Ok(())
}
