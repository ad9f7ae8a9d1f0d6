//! Runtime settings: built-in defaults, then an optional TOML file, then
//! `MUSTANG_*` environment variables.

use crate::error::AmpError;
use config::builder::DefaultState;
use config::{Config, ConfigBuilder, ConfigError, Environment, File};
use core::str::FromStr;
use core::time::Duration;
use log::LevelFilter;
use serde::Deserialize;
use std::path::Path;

pub const MAX_SETTLE_MS: u64 = 5000;

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Settings {
    /// MIDI client name announced to the system
    pub client_name: String,
    /// Wait after every send
    pub settle_ms: u64,
    /// Extra wait after model select and preset sends
    pub select_settle_ms: u64,
    pub usb_timeout_ms: u64,
    pub log_level: String,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            client_name: "mustang_ctl".to_string(),
            settle_ms: 250,
            select_settle_ms: 250,
            usb_timeout_ms: 1000,
            log_level: "info".to_string(),
        }
    }
}

impl Settings {
    pub fn load(file: Option<&Path>) -> Result<Self, AmpError> {
        let mut builder = Config::builder();
        if let Some(file) = file {
            builder = builder.add_source(File::from(file));
        }
        Self::build(builder.add_source(Environment::with_prefix("MUSTANG").try_parsing(true)))
    }

    fn build(builder: ConfigBuilder<DefaultState>) -> Result<Self, AmpError> {
        let settings: Settings = builder.build()?.try_deserialize()?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<(), AmpError> {
        if self.settle_ms > MAX_SETTLE_MS {
            return Err(invalid(format!(
                "settle_ms={} exceeds {}",
                self.settle_ms, MAX_SETTLE_MS
            )));
        }
        if self.select_settle_ms > MAX_SETTLE_MS {
            return Err(invalid(format!(
                "select_settle_ms={} exceeds {}",
                self.select_settle_ms, MAX_SETTLE_MS
            )));
        }
        if self.usb_timeout_ms == 0 {
            return Err(invalid("usb_timeout_ms must be positive".to_string()));
        }
        self.level_filter()?;
        Ok(())
    }

    pub fn settle(&self) -> Duration {
        Duration::from_millis(self.settle_ms)
    }

    pub fn select_settle(&self) -> Duration {
        Duration::from_millis(self.select_settle_ms)
    }

    pub fn usb_timeout(&self) -> Duration {
        Duration::from_millis(self.usb_timeout_ms)
    }

    pub fn level_filter(&self) -> Result<LevelFilter, AmpError> {
        LevelFilter::from_str(&self.log_level)
            .map_err(|_| invalid(format!("log_level={:?} is not a log level", self.log_level)))
    }
}

fn invalid(message: String) -> AmpError {
    AmpError::Config(ConfigError::Message(message))
}

#[cfg(test)]
mod tests {
    use super::*;
    use config::FileFormat;

    fn from_toml(toml: &str) -> Result<Settings, AmpError> {
        Settings::build(Config::builder().add_source(File::from_str(toml, FileFormat::Toml)))
    }

    #[test]
    fn should_default_to_half_second_select_pacing() {
        let settings = from_toml("").unwrap();
        assert_eq!(settings, Settings::default());
        assert_eq!(settings.settle() + settings.select_settle(), Duration::from_millis(500));
        assert_eq!(settings.usb_timeout(), Duration::from_millis(1000));
        assert_eq!(settings.level_filter().unwrap(), LevelFilter::Info);
    }

    #[test]
    fn should_override_from_file() {
        let settings = from_toml("settle_ms = 400\nclient_name = \"bench\"\nlog_level = \"debug\"").unwrap();
        assert_eq!(settings.settle_ms, 400);
        assert_eq!(settings.client_name, "bench");
        assert_eq!(settings.select_settle_ms, 250);
        assert_eq!(settings.level_filter().unwrap(), LevelFilter::Debug);
    }

    #[test]
    fn should_reject_long_settle() {
        assert!(matches!(from_toml("settle_ms = 5001"), Err(AmpError::Config(_))));
        assert!(from_toml("settle_ms = 5000").is_ok());
    }

    #[test]
    fn should_reject_zero_usb_timeout() {
        assert!(matches!(from_toml("usb_timeout_ms = 0"), Err(AmpError::Config(_))));
    }

    #[test]
    fn should_reject_unknown_log_level() {
        assert!(matches!(from_toml("log_level = \"loud\""), Err(AmpError::Config(_))));
    }
}
