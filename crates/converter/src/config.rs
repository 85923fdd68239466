//! Registry configuration.

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// What happens when a converter is registered for a pair that already has one.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DuplicatePolicy {
	/// Replace the existing converter and log it.
	#[default]
	Override,
	/// Keep the existing converter and log it.
	Ignore,
	/// Reject with [`crate::RegistryError::ConverterAlreadyExists`].
	Fail,
}

/// Level used for duplicate-policy log events.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LogLevel {
	Trace,
	Debug,
	Info,
	#[default]
	Warn,
	Error,
	Off,
}

/// Emits a `tracing` event at a runtime-selected [`LogLevel`].
macro_rules! log_at {
	($level:expr, $($arg:tt)+) => {
		match $level {
			$crate::config::LogLevel::Trace => ::tracing::trace!($($arg)+),
			$crate::config::LogLevel::Debug => ::tracing::debug!($($arg)+),
			$crate::config::LogLevel::Info => ::tracing::info!($($arg)+),
			$crate::config::LogLevel::Warn => ::tracing::warn!($($arg)+),
			$crate::config::LogLevel::Error => ::tracing::error!($($arg)+),
			$crate::config::LogLevel::Off => {}
		}
	};
}
pub(crate) use log_at;

/// Settings for a [`crate::TypeConverterRegistry`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct RegistryConfig {
	pub duplicate_policy: DuplicatePolicy,
	pub duplicate_log_level: LogLevel,
	/// Start with utilization statistics enabled.
	pub statistics: bool,
	/// Defer loaders until the first conversion or lookup.
	pub lazy_loading: bool,
}

impl RegistryConfig {
	/// Parses a TOML document; missing keys keep their defaults.
	pub fn from_toml(src: &str) -> Result<Self, ConfigError> {
		Ok(toml::from_str(src)?)
	}
}
