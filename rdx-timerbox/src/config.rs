//! Defines all configuration structures for the Timerbox widget.
//!
//! These structs are deserialized with `serde` and loaded through the
//! `config` crate, so presets, tick rates, clock formatting and host detection
//! can be tuned from a TOML file or the environment without touching code.

use crate::components::clock::DEFAULT_DATE_FORMAT;
use anyhow::{bail, Context};
use chrono::format::{Item, StrftimeItems};
use chrono_tz::Tz;
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

/// Environment prefix for overrides, e.g. `TIMERBOX__MAX_LAPS=5`.
pub const ENV_PREFIX: &str = "TIMERBOX";

/// The top-level configuration for the widget.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TimerboxConfig {
    /// Countdown presets offered as one-tap starts, in minutes.
    pub presets: Vec<u32>,

    /// How often the wall clock is re-sampled.
    pub clock_interval_ms: u64,

    /// How often a running stopwatch re-renders.
    pub stopwatch_interval_ms: u64,

    /// How often a running countdown re-samples its remaining time.
    pub countdown_interval_ms: u64,

    /// Number of most recent laps kept on screen.
    pub max_laps: usize,

    /// IANA timezone for the wall clock (e.g. "Europe/Paris").
    /// Local time is used when unset.
    pub timezone: Option<Tz>,

    /// `chrono` format string for the clock's date line.
    pub date_format: String,

    /// Footer tips; one is picked at random on start.
    pub hints: Vec<String>,

    pub host: HostConfig,
}

/// Configuration for detecting and signalling an embedding host.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct HostConfig {
    /// Environment variable a host sets to mark the widget as embedded.
    pub flag_var: String,

    /// Line written to stdout to tell the host rendering is complete.
    pub ready_line: String,
}

// --- Default value functions ---

fn default_hints() -> Vec<String> {
    [
        "Tip: 25 min + 5 min break = a simple focus loop.",
        "Tip: Use laps to mark milestones in a task.",
        "Tip: Try a 10 min \"just start\" timer when stuck.",
        "Tip: Keep timers short so they feel easy to begin.",
        "Tip: Pair a countdown with airplane mode for deep work.",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

impl Default for TimerboxConfig {
    fn default() -> Self {
        Self {
            presets: vec![1, 5, 10, 25],
            clock_interval_ms: 1000,
            stopwatch_interval_ms: 100,
            countdown_interval_ms: 250,
            max_laps: 3,
            timezone: None,
            date_format: DEFAULT_DATE_FORMAT.to_string(),
            hints: default_hints(),
            host: HostConfig::default(),
        }
    }
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            flag_var: "TIMERBOX_MINI_APP".to_string(),
            ready_line: "timerbox:ready".to_string(),
        }
    }
}

/// The `TIMERBOX__*` layer. `presets` takes a comma-separated list.
fn environment() -> config::Environment {
    config::Environment::with_prefix(ENV_PREFIX)
        .separator("__")
        .try_parsing(true)
        .list_separator(",")
        .with_list_parse_key("presets")
}

impl TimerboxConfig {
    /// Loads configuration from an optional TOML file layered under
    /// `TIMERBOX__*` environment variables, then validates it.
    ///
    /// A missing file is not an error; defaults fill any gaps.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        Self::load_layered(path, environment())
    }

    fn load_layered(path: &Path, env: config::Environment) -> anyhow::Result<Self> {
        let settings = config::Config::builder()
            .add_source(config::File::from(path).required(false))
            .add_source(env)
            .build()
            .with_context(|| format!("failed to read configuration from {}", path.display()))?;
        let config: Self = settings
            .try_deserialize()
            .context("invalid timerbox configuration")?;
        config.validate()?;
        Ok(config)
    }

    /// Parses configuration from a TOML string. Environment overrides are not applied.
    pub fn from_toml(source: &str) -> anyhow::Result<Self> {
        let config: Self = config::Config::builder()
            .add_source(config::File::from_str(source, config::FileFormat::Toml))
            .build()?
            .try_deserialize()
            .context("invalid timerbox configuration")?;
        config.validate()?;
        Ok(config)
    }

    /// Rejects settings the controllers cannot run with.
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.clock_interval_ms == 0
            || self.stopwatch_interval_ms == 0
            || self.countdown_interval_ms == 0
        {
            bail!("tick intervals must be at least 1 ms");
        }
        if self.max_laps == 0 {
            bail!("max_laps must be at least 1");
        }
        if let Some(bad) = self.presets.iter().find(|&&minutes| minutes == 0) {
            bail!("countdown preset of {bad} minutes is not allowed");
        }
        if StrftimeItems::new(&self.date_format).any(|item| matches!(item, Item::Error)) {
            bail!("date_format {:?} is not a valid chrono pattern", self.date_format);
        }
        Ok(())
    }

    pub fn clock_interval(&self) -> Duration {
        Duration::from_millis(self.clock_interval_ms)
    }

    pub fn stopwatch_interval(&self) -> Duration {
        Duration::from_millis(self.stopwatch_interval_ms)
    }

    pub fn countdown_interval(&self) -> Duration {
        Duration::from_millis(self.countdown_interval_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_widget_rates() {
        let config = TimerboxConfig::default();
        assert_eq!(config.clock_interval(), Duration::from_secs(1));
        assert_eq!(config.stopwatch_interval(), Duration::from_millis(100));
        assert_eq!(config.countdown_interval(), Duration::from_millis(250));
        assert_eq!(config.max_laps, 3);
        assert_eq!(config.hints.len(), 5);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn toml_overrides_selected_fields() {
        let config = TimerboxConfig::from_toml(
            r#"
            presets = [2, 15]
            timezone = "Europe/Paris"

            [host]
            flag_var = "EMBEDDED"
            "#,
        )
        .unwrap();
        assert_eq!(config.presets, vec![2, 15]);
        assert_eq!(config.timezone, Some(chrono_tz::Europe::Paris));
        assert_eq!(config.host.flag_var, "EMBEDDED");
        assert_eq!(config.host.ready_line, "timerbox:ready");
        assert_eq!(config.max_laps, 3);
    }

    #[test]
    fn zero_minute_preset_is_rejected() {
        let err = TimerboxConfig::from_toml("presets = [5, 0]").unwrap_err();
        assert!(err.to_string().contains("0 minutes"));
    }

    #[test]
    fn zero_interval_is_rejected() {
        assert!(TimerboxConfig::from_toml("stopwatch_interval_ms = 0").is_err());
    }

    #[test]
    fn unusable_date_format_is_rejected() {
        let err = TimerboxConfig::from_toml(r#"date_format = "%Q""#).unwrap_err();
        assert!(err.to_string().contains("date_format"));
        assert!(TimerboxConfig::from_toml(r#"date_format = "%d/%m/%Y""#).is_ok());
    }

    #[test]
    fn environment_overrides_defaults() {
        let mut vars = config::Map::new();
        vars.insert("TIMERBOX__MAX_LAPS".to_string(), "5".to_string());
        vars.insert("TIMERBOX__PRESETS".to_string(), "2,15,45".to_string());
        vars.insert("TIMERBOX__HOST__FLAG_VAR".to_string(), "EMBEDDED".to_string());
        vars.insert("TIMERBOX_MINI_APP".to_string(), "1".to_string());

        let config = TimerboxConfig::load_layered(
            Path::new("does-not-exist.toml"),
            environment().source(Some(vars)),
        )
        .unwrap();
        assert_eq!(config.max_laps, 5);
        assert_eq!(config.presets, vec![2, 15, 45]);
        assert_eq!(config.host.flag_var, "EMBEDDED");
        assert_eq!(config.stopwatch_interval_ms, 100);
    }

    #[test]
    fn invalid_environment_value_is_rejected() {
        let mut vars = config::Map::new();
        vars.insert("TIMERBOX__PRESETS".to_string(), "5,0".to_string());
        let result = TimerboxConfig::load_layered(
            Path::new("does-not-exist.toml"),
            environment().source(Some(vars)),
        );
        assert!(result.is_err());
    }

    #[test]
    fn missing_file_falls_back_to_defaults() {
        let config = TimerboxConfig::load_layered(
            Path::new("does-not-exist.toml"),
            environment().source(Some(config::Map::new())),
        )
        .unwrap();
        assert_eq!(config.presets, vec![1, 5, 10, 25]);
        assert_eq!(config.date_format, DEFAULT_DATE_FORMAT);
    }
}
