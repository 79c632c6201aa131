use anyhow::{Context, Result};
use directories::UserDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::ConfigError;
use crate::protocol::SUPPORTED_VERSION;
use crate::widgets::DEFAULT_CONTAINER_ID;

const CONFIG_DIR: &str = ".bdbridge";
const CONFIG_FILE: &str = "config.toml";
const SETTINGS_FILE: &str = "settings.json";

// ── Top-level config ──────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Path to config.toml - computed from home, not serialized
    #[serde(skip)]
    pub config_path: PathBuf,
    /// Path to the settings store file - next to config.toml, not serialized
    #[serde(skip)]
    pub settings_path: PathBuf,

    #[serde(default)]
    pub protocol: ProtocolConfig,

    #[serde(default)]
    pub observer: ObserverConfig,

    #[serde(default)]
    pub layout: LayoutConfig,

    #[serde(default)]
    pub widgets: WidgetsConfig,

    #[serde(default)]
    pub events: EventsConfig,
}

// ── Protocol ─────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProtocolConfig {
    /// Bodies larger than this are skipped (still stripped).
    pub max_message_bytes: usize,
    /// "major.minor"; a different major only logs a warning.
    pub supported_version: String,
    pub dedup_window_ms: u64,
    pub dedup_sweep_interval_ms: u64,
}

impl Default for ProtocolConfig {
    fn default() -> Self {
        Self {
            max_message_bytes: 16 * 1024,
            supported_version: SUPPORTED_VERSION.into(),
            dedup_window_ms: 500,
            dedup_sweep_interval_ms: 500,
        }
    }
}

impl ProtocolConfig {
    pub fn dedup_window(&self) -> Duration {
        Duration::from_millis(self.dedup_window_ms)
    }

    pub fn dedup_sweep_interval(&self) -> Duration {
        Duration::from_millis(self.dedup_sweep_interval_ms)
    }
}

// ── Observer ─────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ObserverConfig {
    /// Element id of the host page's story output container.
    pub output_container_id: String,
    /// Debounce for page mutations that may mean the adventure changed.
    pub context_debounce_ms: u64,
}

impl Default for ObserverConfig {
    fn default() -> Self {
        Self {
            output_container_id: "gameplay-output".into(),
            context_debounce_ms: 150,
        }
    }
}

impl ObserverConfig {
    pub fn context_debounce(&self) -> Duration {
        Duration::from_millis(self.context_debounce_ms)
    }
}

// ── Layout ───────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    pub primary_anchor_class: String,
    pub fallback_anchor_class: String,
    pub debounce_ms: u64,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            primary_anchor_class: "game-text-container".into(),
            fallback_anchor_class: "main-content".into(),
            debounce_ms: 100,
        }
    }
}

impl LayoutConfig {
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }
}

// ── Widgets ──────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WidgetsConfig {
    pub bar_container_id: String,
}

impl Default for WidgetsConfig {
    fn default() -> Self {
        Self {
            bar_container_id: DEFAULT_CONTAINER_ID.into(),
        }
    }
}

// ── Events ───────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EventsConfig {
    /// Broadcast buffer; slow receivers past this many events lag.
    pub capacity: usize,
}

impl Default for EventsConfig {
    fn default() -> Self {
        Self { capacity: 256 }
    }
}

impl Default for Config {
    fn default() -> Self {
        let home =
            UserDirs::new().map_or_else(|| PathBuf::from("."), |u| u.home_dir().to_path_buf());
        let bdbridge_dir = home.join(CONFIG_DIR);

        Self {
            config_path: bdbridge_dir.join(CONFIG_FILE),
            settings_path: bdbridge_dir.join(SETTINGS_FILE),
            protocol: ProtocolConfig::default(),
            observer: ObserverConfig::default(),
            layout: LayoutConfig::default(),
            widgets: WidgetsConfig::default(),
            events: EventsConfig::default(),
        }
    }
}

impl Config {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.protocol.max_message_bytes == 0 {
            return Err(ConfigError::Validation(
                "protocol.max_message_bytes must be > 0".into(),
            ));
        }
        if self.protocol.dedup_window_ms == 0 {
            return Err(ConfigError::Validation(
                "protocol.dedup_window_ms must be > 0".into(),
            ));
        }
        if self.protocol.dedup_sweep_interval_ms == 0 {
            return Err(ConfigError::Validation(
                "protocol.dedup_sweep_interval_ms must be > 0".into(),
            ));
        }
        let version_ok = self
            .protocol
            .supported_version
            .split_once('.')
            .is_some_and(|(major, minor)| major.parse::<u32>().is_ok() && minor.parse::<u32>().is_ok());
        if !version_ok {
            return Err(ConfigError::Validation(format!(
                "protocol.supported_version must look like \"major.minor\", got {:?}",
                self.protocol.supported_version
            )));
        }
        if self.observer.output_container_id.trim().is_empty() {
            return Err(ConfigError::Validation(
                "observer.output_container_id must not be empty".into(),
            ));
        }
        if self.widgets.bar_container_id.trim().is_empty() {
            return Err(ConfigError::Validation(
                "widgets.bar_container_id must not be empty".into(),
            ));
        }
        if self.events.capacity == 0 {
            return Err(ConfigError::Validation("events.capacity must be > 0".into()));
        }
        Ok(())
    }

    pub fn load_or_init() -> Result<Self> {
        let home = UserDirs::new()
            .map(|u| u.home_dir().to_path_buf())
            .context("Could not find home directory")?;
        let bdbridge_dir = home.join(CONFIG_DIR);
        let config_path = bdbridge_dir.join(CONFIG_FILE);

        if !bdbridge_dir.exists() {
            fs::create_dir_all(&bdbridge_dir).context("Failed to create .bdbridge directory")?;
        }

        if config_path.exists() {
            Self::load_from_path(&config_path)
        } else {
            let config = Self {
                config_path: config_path.clone(),
                settings_path: bdbridge_dir.join(SETTINGS_FILE),
                ..Self::default()
            };
            config.validate()?;
            config.save()?;
            tracing::info!(path = %config_path.display(), "wrote default config");
            Ok(config)
        }
    }

    /// Load and validate a config file. The settings store lives next to it.
    pub fn load_from_path(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let mut config: Config = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;
        // Set computed paths that are skipped during serialization
        config.config_path = path.to_path_buf();
        config.settings_path = path
            .parent()
            .unwrap_or_else(|| Path::new("."))
            .join(SETTINGS_FILE);
        config.validate()?;
        Ok(config)
    }

    pub fn save(&self) -> Result<()> {
        let toml_str = toml::to_string_pretty(self).context("Failed to serialize config")?;
        fs::write(&self.config_path, toml_str).context("Failed to write config file")?;
        Ok(())
    }
}
