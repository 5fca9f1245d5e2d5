use crate::error::{RaceError, Result};
use crate::io::Overwrite;
use crate::paths;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

// ---------------------------------------------------------------------------
// ConfigWarning / WarnLevel
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigWarning {
    pub level: WarnLevel,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WarnLevel {
    Warning,
    Error,
}

// ---------------------------------------------------------------------------
// ServerConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Added to the race id in the path of status/start/accelerate calls.
    /// `create` is never offset.
    #[serde(default)]
    pub race_path_offset: i64,
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
}

fn default_base_url() -> String {
    "http://localhost:8000".to_string()
}

fn default_request_timeout_ms() -> u64 {
    5000
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            race_path_offset: 0,
            request_timeout_ms: default_request_timeout_ms(),
        }
    }
}

impl ServerConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}

// ---------------------------------------------------------------------------
// TimingConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimingConfig {
    #[serde(default = "default_countdown_from")]
    pub countdown_from: u32,
    #[serde(default = "default_countdown_floor")]
    pub countdown_floor: u32,
    #[serde(default = "default_initial_delay_ms")]
    pub initial_delay_ms: u64,
    #[serde(default = "default_tick_ms")]
    pub tick_ms: u64,
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
}

fn default_countdown_from() -> u32 {
    3
}

fn default_countdown_floor() -> u32 {
    1
}

fn default_initial_delay_ms() -> u64 {
    1000
}

fn default_tick_ms() -> u64 {
    1000
}

fn default_poll_interval_ms() -> u64 {
    500
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            countdown_from: default_countdown_from(),
            countdown_floor: default_countdown_floor(),
            initial_delay_ms: default_initial_delay_ms(),
            tick_ms: default_tick_ms(),
            poll_interval_ms: default_poll_interval_ms(),
        }
    }
}

impl TimingConfig {
    pub fn initial_delay(&self) -> Duration {
        Duration::from_millis(self.initial_delay_ms)
    }

    pub fn tick(&self) -> Duration {
        Duration::from_millis(self.tick_ms)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    /// Periods the countdown and poller cannot run with.
    pub fn period_errors(&self) -> Vec<String> {
        let mut errors = Vec::new();
        if self.poll_interval_ms == 0 {
            errors.push("timing.poll_interval_ms must be greater than 0".to_string());
        }
        if self.tick_ms == 0 {
            errors.push("timing.tick_ms must be greater than 0".to_string());
        }
        errors
    }

    /// Reject timing a race cannot be driven with.
    pub fn check(&self) -> Result<()> {
        let errors = self.period_errors();
        if errors.is_empty() {
            return Ok(());
        }
        Err(RaceError::InvalidConfig(errors.join("; ")))
    }
}

// ---------------------------------------------------------------------------
// ReferenceConfig
// ---------------------------------------------------------------------------

/// Where tracks and racers come from. Unset paths are fetched from the service.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReferenceConfig {
    #[serde(default)]
    pub tracks_path: Option<PathBuf>,
    #[serde(default)]
    pub racers_path: Option<PathBuf>,
}

// ---------------------------------------------------------------------------
// ClientConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ClientConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub timing: TimingConfig,
    #[serde(default)]
    pub reference: ReferenceConfig,
}

impl ClientConfig {
    /// Load from `path`, falling back to defaults when the file is absent.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::debug!(path = %path.display(), "no config file, using defaults");
            return Ok(Self::default());
        }
        let data = std::fs::read_to_string(path)?;
        let cfg: ClientConfig = serde_yaml::from_str(&data)?;
        Ok(cfg)
    }

    /// Load `<root>/.podrace/config.yaml`.
    pub fn load_from_root(root: &Path) -> Result<Self> {
        Self::load(&paths::config_path(root))
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        self.write(path, Overwrite::Replace).map(|_| ())
    }

    /// Serialize to `path` under `policy`. Returns whether the file was written.
    pub fn write(&self, path: &Path, policy: Overwrite) -> Result<bool> {
        let data = serde_yaml::to_string(self)?;
        crate::io::write_file(path, &data, policy)
    }

    // -----------------------------------------------------------------------
    // Validation
    // -----------------------------------------------------------------------

    pub fn validate(&self) -> Vec<ConfigWarning> {
        let mut warnings = Vec::new();

        let url = self.server.base_url.as_str();
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            warnings.push(ConfigWarning {
                level: WarnLevel::Error,
                message: format!("server.base_url '{url}' must start with http:// or https://"),
            });
        }

        if self.server.request_timeout_ms == 0 {
            warnings.push(ConfigWarning {
                level: WarnLevel::Error,
                message: "server.request_timeout_ms must be greater than 0".to_string(),
            });
        }

        if self.server.race_path_offset != 0 {
            warnings.push(ConfigWarning {
                level: WarnLevel::Warning,
                message: format!(
                    "server.race_path_offset is {}; race ids in status/start/accelerate paths will be shifted",
                    self.server.race_path_offset
                ),
            });
        }

        let timing = &self.timing;
        warnings.extend(timing.period_errors().into_iter().map(|message| ConfigWarning {
            level: WarnLevel::Error,
            message,
        }));
        if timing.countdown_from <= timing.countdown_floor {
            warnings.push(ConfigWarning {
                level: WarnLevel::Warning,
                message: format!(
                    "timing.countdown_from ({}) is not above countdown_floor ({}); the countdown will show no ticks",
                    timing.countdown_from, timing.countdown_floor
                ),
            });
        }

        for (name, path) in [
            ("tracks_path", &self.reference.tracks_path),
            ("racers_path", &self.reference.racers_path),
        ] {
            if let Some(p) = path {
                if !p.exists() {
                    warnings.push(ConfigWarning {
                        level: WarnLevel::Warning,
                        message: format!(
                            "reference.{name} '{}' does not exist; the list will be empty",
                            p.display()
                        ),
                    });
                }
            }
        }

        warnings
    }
}
