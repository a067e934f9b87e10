// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Secrets supplied through the environment.
//!
//! `KEYFILL_CLIENT_SECRET` and `KEYFILL_PRESHARED_TOKEN` (or their `*_FILE`
//! variants) override the stored options for the lifetime of the process
//! without ever being written to the options file.

use std::path::PathBuf;
use std::sync::Arc;
use std::{env, fs};

use async_trait::async_trait;
use keyfill_common_secret::SecretString;
use keyfill_credentials::{Options, OptionsError, OptionsStore};
use thiserror::Error;
use tokio::sync::watch;
use tracing::debug;

pub const CLIENT_SECRET_VAR: &str = "KEYFILL_CLIENT_SECRET";
pub const PRESHARED_TOKEN_VAR: &str = "KEYFILL_PRESHARED_TOKEN";

#[derive(Debug, Error)]
pub enum SecretEnvError {
	#[error("failed to read secret file at {path}: {source}")]
	Io {
		path: PathBuf,
		#[source]
		source: std::io::Error,
	},

	#[error("secret file path in {var} is empty")]
	EmptyPath { var: String },
}

/// Loads `var` from the environment, preferring the file named by `{var}_FILE`.
///
/// A single trailing newline is stripped from file contents.
pub fn load_secret_env(var: &str) -> Result<Option<SecretString>, SecretEnvError> {
	let file_var = format!("{var}_FILE");

	if let Ok(path_str) = env::var(&file_var) {
		if path_str.is_empty() {
			return Err(SecretEnvError::EmptyPath { var: file_var });
		}
		let path = PathBuf::from(path_str);
		let mut content = fs::read_to_string(&path).map_err(|source| SecretEnvError::Io {
			path: path.clone(),
			source,
		})?;
		if content.ends_with('\n') {
			content.pop();
			if content.ends_with('\r') {
				content.pop();
			}
		}
		debug!(var = %file_var, "loaded secret from file");
		return Ok(Some(SecretString::new(content)));
	}

	match env::var(var) {
		Ok(value) if !value.is_empty() => Ok(Some(SecretString::new(value))),
		_ => Ok(None),
	}
}

/// Options store that layers environment secrets over another store.
#[derive(Debug)]
pub struct EnvOverlayStore {
	inner: Arc<dyn OptionsStore>,
	client_secret: Option<SecretString>,
	preshared_token: Option<SecretString>,
}

impl EnvOverlayStore {
	pub fn new(
		inner: Arc<dyn OptionsStore>,
		client_secret: Option<SecretString>,
		preshared_token: Option<SecretString>,
	) -> Self {
		Self {
			inner,
			client_secret,
			preshared_token,
		}
	}

	/// Reads both overrides from the process environment.
	pub fn from_env(inner: Arc<dyn OptionsStore>) -> Result<Self, SecretEnvError> {
		Ok(Self::new(
			inner,
			load_secret_env(CLIENT_SECRET_VAR)?,
			load_secret_env(PRESHARED_TOKEN_VAR)?,
		))
	}

	pub fn has_overrides(&self) -> bool {
		self.client_secret.is_some() || self.preshared_token.is_some()
	}
}

#[async_trait]
impl OptionsStore for EnvOverlayStore {
	async fn load(&self) -> Result<Options, OptionsError> {
		let mut options = self.inner.load().await?;
		if let Some(secret) = &self.client_secret {
			options.client_secret = Some(secret.clone());
		}
		if let Some(token) = &self.preshared_token {
			options.preshared_token = Some(token.clone());
		}
		Ok(options)
	}

	async fn save(&self, options: &Options) -> Result<(), OptionsError> {
		if !self.has_overrides() {
			return self.inner.save(options).await;
		}

		let persisted = self.inner.load().await?;
		let mut options = options.clone();
		if self.client_secret.is_some() {
			options.client_secret = persisted.client_secret;
		}
		if self.preshared_token.is_some() {
			options.preshared_token = persisted.preshared_token;
		}
		self.inner.save(&options).await
	}

	fn subscribe(&self) -> watch::Receiver<u64> {
		self.inner.subscribe()
	}
}
