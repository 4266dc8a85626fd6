use std::fs;
use std::io;
use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use pipeline_core::{COMPLETION_DELAY, TICK_INTERVAL};
use pipeline_engine::{ClientSettings, EngineSettings, SimulationSettings, DEFAULT_BASE_URL};
use serde::{Deserialize, Serialize};

use super::logging::LogDestination;

pub const DEFAULT_CONFIG_PATH: &str = "./pipeline.ron";

/// Largest page the queue endpoint serves.
const MAX_QUEUE_LIMIT: u32 = 100;

/// Floor for the background poll interval.
const MIN_POLL_INTERVAL_MS: u64 = 500;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub base_url: String,
    pub queue_limit: u32,
    pub poll_interval_ms: u64,
    pub progress_tick_ms: u64,
    pub request_timeout_ms: u64,
    pub health_timeout_ms: u64,
    pub connect_timeout_ms: u64,
    pub log_level: String,
    pub log_destination: LogDestination,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            queue_limit: MAX_QUEUE_LIMIT,
            poll_interval_ms: 5_000,
            progress_tick_ms: TICK_INTERVAL.as_millis() as u64,
            request_timeout_ms: 10_000,
            health_timeout_ms: 5_000,
            connect_timeout_ms: 5_000,
            log_level: "info".to_string(),
            log_destination: LogDestination::Terminal,
        }
    }
}

impl AppConfig {
    /// Reads the config file. `Ok(None)` means there is no file.
    pub fn load(path: &Path) -> Result<Option<Self>> {
        let content = match fs::read_to_string(path) {
            Ok(text) => text,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(err) => {
                return Err(err).with_context(|| format!("failed to read config {:?}", path))
            }
        };
        let config = ron::from_str(&content)
            .with_context(|| format!("failed to parse config {:?}", path))?;
        Ok(Some(config))
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let pretty = ron::ser::PrettyConfig::new();
        let content =
            ron::ser::to_string_pretty(self, pretty).context("failed to serialize config")?;
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .with_context(|| format!("failed to create {:?}", parent))?;
        }
        fs::write(path, content).with_context(|| format!("failed to write config {:?}", path))
    }

    pub fn queue_limit(&self) -> u32 {
        self.queue_limit.clamp(1, MAX_QUEUE_LIMIT)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms.max(MIN_POLL_INTERVAL_MS))
    }

    pub fn client_settings(&self) -> ClientSettings {
        ClientSettings {
            base_url: self.base_url.clone(),
            connect_timeout: Duration::from_millis(self.connect_timeout_ms),
            request_timeout: Duration::from_millis(self.request_timeout_ms),
            health_timeout: Duration::from_millis(self.health_timeout_ms),
        }
    }

    pub fn engine_settings(&self) -> EngineSettings {
        EngineSettings {
            simulation: SimulationSettings {
                tick: Duration::from_millis(self.progress_tick_ms),
                completion_delay: COMPLETION_DELAY,
            },
        }
    }

    /// Upper bound for waiting on a single backend round trip.
    pub fn response_wait(&self) -> Duration {
        Duration::from_millis(
            self.connect_timeout_ms
                .saturating_add(self.request_timeout_ms.max(self.health_timeout_ms))
                .saturating_add(1_000),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn missing_file_is_not_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let loaded = AppConfig::load(&dir.path().join("pipeline.ron")).unwrap();
        assert_eq!(loaded, None);
    }

    #[test]
    fn partial_file_fills_in_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pipeline.ron");
        fs::write(
            &path,
            r#"(base_url: "http://backend:9000", queue_limit: 250, log_destination: Both)"#,
        )
        .unwrap();

        let config = AppConfig::load(&path).unwrap().unwrap();
        assert_eq!(config.base_url, "http://backend:9000");
        assert_eq!(config.queue_limit(), 100);
        assert_eq!(config.log_destination, LogDestination::Both);
        assert_eq!(config.poll_interval(), Duration::from_secs(5));
        assert_eq!(config.log_level, "info");
    }

    #[test]
    fn invalid_file_reports_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pipeline.ron");
        fs::write(&path, "(queue_limit: \"lots\")").unwrap();

        let err = AppConfig::load(&path).unwrap_err();
        assert!(format!("{err:#}").contains("failed to parse config"));
    }

    #[test]
    fn saved_defaults_load_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("pipeline.ron");
        AppConfig::default().save(&path).unwrap();

        assert_eq!(AppConfig::load(&path).unwrap(), Some(AppConfig::default()));
    }

    #[test]
    fn poll_interval_has_a_floor() {
        let zero = AppConfig {
            poll_interval_ms: 0,
            ..AppConfig::default()
        };
        assert_eq!(zero.poll_interval(), Duration::from_millis(500));

        let slow = AppConfig {
            poll_interval_ms: 12_000,
            ..AppConfig::default()
        };
        assert_eq!(slow.poll_interval(), Duration::from_secs(12));
    }

    #[test]
    fn settings_follow_config_values() {
        let config = AppConfig {
            queue_limit: 0,
            progress_tick_ms: 250,
            health_timeout_ms: 1_500,
            ..AppConfig::default()
        };
        assert_eq!(config.queue_limit(), 1);
        assert_eq!(
            config.engine_settings().simulation.tick,
            Duration::from_millis(250)
        );
        assert_eq!(
            config.client_settings().health_timeout,
            Duration::from_millis(1_500)
        );
    }
}
