pub mod config;
pub mod race;
pub mod reference;

use anyhow::Context as _;
use podrace_client::HttpRaceService;
use podrace_core::config::ClientConfig;
use std::path::PathBuf;

/// Global flags shared by every command.
pub struct Context {
    pub config_path: PathBuf,
    pub server: Option<String>,
    pub json: bool,
}

impl Context {
    /// Load the config file and apply the `--server` override.
    pub fn load_config(&self) -> anyhow::Result<ClientConfig> {
        let mut config = ClientConfig::load(&self.config_path)
            .with_context(|| format!("failed to load {}", self.config_path.display()))?;
        if let Some(url) = &self.server {
            config.server.base_url = url.clone();
        }
        Ok(config)
    }

    pub fn service(&self, config: &ClientConfig) -> anyhow::Result<HttpRaceService> {
        HttpRaceService::new(&config.server).context("failed to build race service client")
    }
}

/// Single-threaded runtime for one command; every await happens on it.
pub fn runtime() -> anyhow::Result<tokio::runtime::Runtime> {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("failed to start async runtime")
}
