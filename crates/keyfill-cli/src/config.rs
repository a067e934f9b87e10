// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! CLI configuration: built-in defaults < config file < environment < flags.

use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use serde::Deserialize;
use tracing::{debug, trace};

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
	#[error("IO error: {0}")]
	Io(#[from] std::io::Error),

	#[error("failed to parse {path}: {source}")]
	TomlParse {
		path: PathBuf,
		#[source]
		source: toml::de::Error,
	},

	#[error("invalid value for {key}: {value}")]
	InvalidValue { key: &'static str, value: String },

	#[error("no configuration directory could be determined")]
	NoConfigDir,
}

/// Partial configuration; every field optional so layers can be merged.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ConfigLayer {
	#[serde(default)]
	pub logging: Option<LoggingLayer>,
	#[serde(default)]
	pub http: Option<HttpLayer>,
	#[serde(default)]
	pub options: Option<OptionsLayer>,
	#[serde(default)]
	pub menu: Option<MenuLayer>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LoggingLayer {
	#[serde(default)]
	pub level: Option<String>,
	#[serde(default)]
	pub format: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct HttpLayer {
	#[serde(default)]
	pub timeout_secs: Option<u64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct OptionsLayer {
	#[serde(default)]
	pub path: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct MenuLayer {
	#[serde(default)]
	pub standard_config: Option<PathBuf>,
	#[serde(default)]
	pub paste_supported: Option<bool>,
}

impl ConfigLayer {
	/// Merge another layer into this one. Other layer takes precedence.
	pub fn merge(&mut self, other: ConfigLayer) {
		merge_option(&mut self.logging, other.logging, |t, s| {
			if s.level.is_some() {
				t.level = s.level;
			}
			if s.format.is_some() {
				t.format = s.format;
			}
		});
		merge_option(&mut self.http, other.http, |t, s| {
			if s.timeout_secs.is_some() {
				t.timeout_secs = s.timeout_secs;
			}
		});
		merge_option(&mut self.options, other.options, |t, s| {
			if s.path.is_some() {
				t.path = s.path;
			}
		});
		merge_option(&mut self.menu, other.menu, |t, s| {
			if s.standard_config.is_some() {
				t.standard_config = s.standard_config;
			}
			if s.paste_supported.is_some() {
				t.paste_supported = s.paste_supported;
			}
		});
	}

	/// Reads a TOML layer; a missing file is an empty layer.
	pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
		if !path.exists() {
			debug!(path = %path.display(), "config file not found, skipping");
			return Ok(Self::default());
		}
		debug!(path = %path.display(), "loading config file");
		let content = std::fs::read_to_string(path)?;
		toml::from_str(&content).map_err(|source| ConfigError::TomlParse {
			path: path.to_path_buf(),
			source,
		})
	}

	/// Reads the `KEYFILL_*` variables from `vars`.
	pub fn from_env<I>(vars: I) -> Self
	where
		I: IntoIterator<Item = (String, String)>,
	{
		let mut layer = Self::default();
		for (key, value) in vars {
			if !key.starts_with("KEYFILL_") {
				continue;
			}
			let value = value.trim().to_string();
			if value.is_empty() {
				continue;
			}
			trace!(key = %key, "processing env var");

			match key.as_str() {
				"KEYFILL_LOG_LEVEL" => {
					layer.logging.get_or_insert_with(LoggingLayer::default).level = Some(value);
				}
				"KEYFILL_LOG_FORMAT" => {
					layer.logging.get_or_insert_with(LoggingLayer::default).format = Some(value);
				}
				"KEYFILL_HTTP_TIMEOUT_SECS" => {
					if let Ok(secs) = value.parse() {
						layer.http.get_or_insert_with(HttpLayer::default).timeout_secs = Some(secs);
					}
				}
				"KEYFILL_OPTIONS" => {
					layer.options.get_or_insert_with(OptionsLayer::default).path =
						Some(PathBuf::from(value));
				}
				"KEYFILL_STANDARD_MENU" => {
					layer.menu.get_or_insert_with(MenuLayer::default).standard_config =
						Some(PathBuf::from(value));
				}
				_ => {}
			}
		}
		layer
	}
}

fn merge_option<T, F>(target: &mut Option<T>, source: Option<T>, merge_fn: F)
where
	F: FnOnce(&mut T, T),
{
	match (target.as_mut(), source) {
		(Some(t), Some(s)) => merge_fn(t, s),
		(None, Some(s)) => *target = Some(s),
		_ => {}
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
	Trace,
	Debug,
	Info,
	Warn,
	Error,
}

impl FromStr for LogLevel {
	type Err = ConfigError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s.to_ascii_lowercase().as_str() {
			"trace" => Ok(LogLevel::Trace),
			"debug" => Ok(LogLevel::Debug),
			"info" => Ok(LogLevel::Info),
			"warn" | "warning" => Ok(LogLevel::Warn),
			"error" => Ok(LogLevel::Error),
			_ => Err(ConfigError::InvalidValue {
				key: "logging.level",
				value: s.to_string(),
			}),
		}
	}
}

impl LogLevel {
	pub fn as_str(self) -> &'static str {
		match self {
			LogLevel::Trace => "trace",
			LogLevel::Debug => "debug",
			LogLevel::Info => "info",
			LogLevel::Warn => "warn",
			LogLevel::Error => "error",
		}
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
	Pretty,
	Compact,
	Json,
}

impl FromStr for LogFormat {
	type Err = ConfigError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s.to_ascii_lowercase().as_str() {
			"pretty" => Ok(LogFormat::Pretty),
			"compact" => Ok(LogFormat::Compact),
			"json" => Ok(LogFormat::Json),
			_ => Err(ConfigError::InvalidValue {
				key: "logging.format",
				value: s.to_string(),
			}),
		}
	}
}

#[derive(Debug, Clone)]
pub struct LoggingConfig {
	pub level: LogLevel,
	pub format: LogFormat,
}

/// Fully resolved CLI configuration.
#[derive(Debug, Clone)]
pub struct CliConfig {
	pub logging: LoggingConfig,
	pub http_timeout: Duration,
	pub options_path: PathBuf,
	/// Standard menu tree file; the built-in tree is used when unset.
	pub standard_config: Option<PathBuf>,
	pub paste_supported: bool,
}

pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 30;

impl CliConfig {
	/// Applies defaults to a merged layer.
	pub fn finalize(layer: ConfigLayer, default_dir: &Path) -> Result<Self, ConfigError> {
		let logging = layer.logging.unwrap_or_default();
		let level = match logging.level {
			Some(level) => level.parse()?,
			None => LogLevel::Warn,
		};
		let format = match logging.format {
			Some(format) => format.parse()?,
			None => LogFormat::Compact,
		};

		let timeout_secs = layer
			.http
			.and_then(|h| h.timeout_secs)
			.unwrap_or(DEFAULT_HTTP_TIMEOUT_SECS);
		if timeout_secs == 0 {
			return Err(ConfigError::InvalidValue {
				key: "http.timeout_secs",
				value: "0".to_string(),
			});
		}

		let menu = layer.menu.unwrap_or_default();
		Ok(Self {
			logging: LoggingConfig { level, format },
			http_timeout: Duration::from_secs(timeout_secs),
			options_path: layer
				.options
				.and_then(|o| o.path)
				.unwrap_or_else(|| default_dir.join("options.json")),
			standard_config: menu.standard_config,
			paste_supported: menu.paste_supported.unwrap_or(true),
		})
	}
}

/// `~/.config/keyfill`.
pub fn config_dir() -> Result<PathBuf, ConfigError> {
	dirs::config_dir()
		.map(|dir| dir.join("keyfill"))
		.ok_or(ConfigError::NoConfigDir)
}

/// Values given on the command line.
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
	pub config_file: Option<PathBuf>,
	pub options_path: Option<PathBuf>,
	pub log_level: Option<String>,
}

impl CliOverrides {
	fn into_layer(self) -> ConfigLayer {
		ConfigLayer {
			logging: self.log_level.map(|level| LoggingLayer {
				level: Some(level),
				format: None,
			}),
			options: self.options_path.map(|path| OptionsLayer { path: Some(path) }),
			..Default::default()
		}
	}
}

/// Loads defaults, the config file, the environment and `overrides`, in that order.
pub fn load_config(overrides: CliOverrides) -> Result<CliConfig, ConfigError> {
	let dir = config_dir()?;
	let file = overrides
		.config_file
		.clone()
		.unwrap_or_else(|| dir.join("config.toml"));

	let mut layer = ConfigLayer::from_file(&file)?;
	layer.merge(ConfigLayer::from_env(std::env::vars()));
	layer.merge(overrides.into_layer());
	CliConfig::finalize(layer, &dir)
}
