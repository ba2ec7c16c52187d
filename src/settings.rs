//! Layered configuration.
//!
//! Values are resolved in this order, later layers winning:
//!
//! 1. Built-in defaults
//! 2. An optional TOML file (`--config`)
//! 3. Environment variables, e.g. `STATUSDECK_SOURCE__BASE_URL`
//! 4. Command-line flags
//!
//! ```toml
//! [source]
//! base_url = "http://127.0.0.1:8001"
//! poll_interval_ms = 2000
//! fetch_timeout_ms = 1500
//!
//! [events]
//! visibility = "recent-start"
//! buffer_minutes = 2
//!
//! [gauges]
//! stagger_ms = 120
//! animation_ms = 500
//!
//! [clocks]
//! second_zone = "Europe/Berlin"
//! second_label = "Munich"
//!
//! [log]
//! file = "statusdeck.log"
//! filter = "info"
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono_tz::Tz;
use config::{Config, ConfigBuilder, Environment, File};
use serde::Deserialize;
use thiserror::Error;

use crate::data::VisibilityPolicy;
use crate::source::PollConfig;

const ENV_PREFIX: &str = "STATUSDECK";

/// Longest grace period the event list accepts: one day.
pub const MAX_BUFFER_MINUTES: i64 = 24 * 60;

/// Errors raised while loading or validating settings.
#[derive(Debug, Error)]
pub enum SettingsError {
    /// A layer could not be read or did not match the expected shape.
    #[error("Failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),

    #[error("Poll interval must be greater than zero")]
    ZeroPeriod,

    #[error("Fetch timeout must be greater than zero")]
    ZeroTimeout,

    /// Fetches must finish before the next one is due.
    #[error("Fetch timeout ({timeout_ms}ms) must be below the poll interval ({period_ms}ms)")]
    TimeoutNotBelowPeriod { timeout_ms: u64, period_ms: u64 },

    #[error("Invalid base URL {0:?}: expected http:// or https://")]
    InvalidBaseUrl(String),

    #[error("Event buffer must not be negative")]
    NegativeBuffer,

    #[error("Event buffer ({0} minutes) must not exceed {max} minutes", max = MAX_BUFFER_MINUTES)]
    BufferTooLarge(i64),
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Settings {
    pub source: SourceSettings,
    pub events: EventSettings,
    pub gauges: GaugeSettings,
    pub clocks: ClockSettings,
    pub log: LogSettings,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SourceSettings {
    pub base_url: String,
    pub poll_interval_ms: u64,
    pub fetch_timeout_ms: u64,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct EventSettings {
    /// Rule used by the dashboard event list.
    pub visibility: VisibilityPolicy,
    pub buffer_minutes: i64,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct GaugeSettings {
    /// Gap between consecutive gauge updates of one snapshot.
    pub stagger_ms: u64,
    pub animation_ms: u64,
}

/// The header shows local time next to one extra zone.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ClockSettings {
    /// IANA zone name, e.g. `Europe/Berlin`.
    pub second_zone: Tz,
    pub second_label: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct LogSettings {
    pub file: PathBuf,
    /// `EnvFilter` directive, overridden by `RUST_LOG` when set.
    pub filter: String,
}

/// Values supplied on the command line. `None` leaves the lower layers alone.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub base_url: Option<String>,
    pub poll_interval_ms: Option<u64>,
    pub fetch_timeout_ms: Option<u64>,
    pub visibility: Option<VisibilityPolicy>,
    pub log_file: Option<PathBuf>,
}

impl Settings {
    /// Load settings from every layer, reading the process environment.
    pub fn load(path: Option<&Path>, overrides: &Overrides) -> Result<Self, SettingsError> {
        Self::load_with_env(path, overrides, None)
    }

    /// Like [`Settings::load`], but with an explicit environment map in
    /// place of the process environment when `env` is `Some`.
    pub fn load_with_env(
        path: Option<&Path>,
        overrides: &Overrides,
        env: Option<config::Map<String, String>>,
    ) -> Result<Self, SettingsError> {
        let mut builder = defaults()?;

        if let Some(path) = path {
            builder = builder.add_source(File::from(path));
        }

        builder = builder.add_source(
            Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true)
                .source(env),
        );

        builder = apply_overrides(builder, overrides)?;

        let settings: Settings = builder.build()?.try_deserialize()?;
        settings.validate()?;
        Ok(settings)
    }

    /// Check cross-field constraints the deserializer cannot express.
    pub fn validate(&self) -> Result<(), SettingsError> {
        let source = &self.source;
        if source.poll_interval_ms == 0 {
            return Err(SettingsError::ZeroPeriod);
        }
        if source.fetch_timeout_ms == 0 {
            return Err(SettingsError::ZeroTimeout);
        }
        if source.fetch_timeout_ms >= source.poll_interval_ms {
            return Err(SettingsError::TimeoutNotBelowPeriod {
                timeout_ms: source.fetch_timeout_ms,
                period_ms: source.poll_interval_ms,
            });
        }
        match reqwest::Url::parse(&source.base_url) {
            Ok(url) if matches!(url.scheme(), "http" | "https") && url.has_host() => {}
            _ => return Err(SettingsError::InvalidBaseUrl(source.base_url.clone())),
        }
        if self.events.buffer_minutes < 0 {
            return Err(SettingsError::NegativeBuffer);
        }
        if self.events.buffer_minutes > MAX_BUFFER_MINUTES {
            return Err(SettingsError::BufferTooLarge(self.events.buffer_minutes));
        }
        Ok(())
    }

    pub fn poll_config(&self) -> PollConfig {
        PollConfig {
            period: Duration::from_millis(self.source.poll_interval_ms),
            timeout: self.fetch_timeout(),
        }
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_millis(self.source.fetch_timeout_ms)
    }

    pub fn stagger_unit(&self) -> Duration {
        Duration::from_millis(self.gauges.stagger_ms)
    }

    pub fn animation(&self) -> Duration {
        Duration::from_millis(self.gauges.animation_ms)
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            source: SourceSettings {
                base_url: "http://127.0.0.1:8001".to_string(),
                poll_interval_ms: 2000,
                fetch_timeout_ms: 1500,
            },
            events: EventSettings {
                visibility: VisibilityPolicy::RecentStart,
                buffer_minutes: crate::data::visible::DEFAULT_BUFFER_MINUTES,
            },
            gauges: GaugeSettings {
                stagger_ms: 120,
                animation_ms: 500,
            },
            clocks: ClockSettings {
                second_zone: Tz::UTC,
                second_label: "UTC".to_string(),
            },
            log: LogSettings {
                file: PathBuf::from("statusdeck.log"),
                filter: "info".to_string(),
            },
        }
    }
}

fn defaults() -> Result<ConfigBuilder<config::builder::DefaultState>, config::ConfigError> {
    let d = Settings::default();
    Config::builder()
        .set_default("source.base_url", d.source.base_url)?
        .set_default("source.poll_interval_ms", d.source.poll_interval_ms)?
        .set_default("source.fetch_timeout_ms", d.source.fetch_timeout_ms)?
        .set_default("events.visibility", d.events.visibility.label())?
        .set_default("events.buffer_minutes", d.events.buffer_minutes)?
        .set_default("gauges.stagger_ms", d.gauges.stagger_ms)?
        .set_default("gauges.animation_ms", d.gauges.animation_ms)?
        .set_default("log.file", d.log.file.to_string_lossy().into_owned())?
        .set_default("clocks.second_zone", d.clocks.second_zone.name())?
        .set_default("clocks.second_label", d.clocks.second_label)?
        .set_default("log.filter", d.log.filter)
}

fn apply_overrides(
    mut builder: ConfigBuilder<config::builder::DefaultState>,
    overrides: &Overrides,
) -> Result<ConfigBuilder<config::builder::DefaultState>, config::ConfigError> {
    if let Some(url) = &overrides.base_url {
        builder = builder.set_override("source.base_url", url.as_str())?;
    }
    if let Some(ms) = overrides.poll_interval_ms {
        builder = builder.set_override("source.poll_interval_ms", ms)?;
    }
    if let Some(ms) = overrides.fetch_timeout_ms {
        builder = builder.set_override("source.fetch_timeout_ms", ms)?;
    }
    if let Some(policy) = overrides.visibility {
        builder = builder.set_override("events.visibility", policy.label())?;
    }
    if let Some(file) = &overrides.log_file {
        builder = builder.set_override("log.file", file.to_string_lossy().into_owned())?;
    }
    Ok(builder)
}
