// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Credential and options error types.

use keyfill_vault::VaultError;

/// Errors raised while reading or writing persisted options.
#[derive(Debug, thiserror::Error)]
pub enum OptionsError {
	#[error("IO error: {0}")]
	Io(String),

	#[error("Serialization error: {0}")]
	Serde(String),
}

impl From<std::io::Error> for OptionsError {
	fn from(err: std::io::Error) -> Self {
		OptionsError::Io(err.to_string())
	}
}

impl From<serde_json::Error> for OptionsError {
	fn from(err: serde_json::Error) -> Self {
		OptionsError::Serde(err.to_string())
	}
}

/// Errors raised by the credential manager.
#[derive(Debug, thiserror::Error)]
pub enum CredentialError {
	/// Configuration, authentication or vault API failure.
	#[error(transparent)]
	Vault(#[from] VaultError),

	#[error("options error: {0}")]
	Options(#[from] OptionsError),

	/// A grouping rule whose pattern is not a valid regular expression.
	#[error("invalid pattern for grouping rule {rule:?}: {source}")]
	InvalidPattern {
		rule: String,
		#[source]
		source: regex::Error,
	},

	/// At least one account could not be fetched during synchronization.
	///
	/// `account` is the first failing account in listing order.
	#[error("synchronization aborted: {failed} account(s) failed, first was {account:?}: {source}")]
	Sync {
		account: String,
		failed: usize,
		#[source]
		source: VaultError,
	},
}

impl CredentialError {
	/// The vault error underneath this one, if any.
	pub fn vault_error(&self) -> Option<&VaultError> {
		match self {
			CredentialError::Vault(err) | CredentialError::Sync { source: err, .. } => Some(err),
			_ => None,
		}
	}
}

pub type CredentialResult<T> = Result<T, CredentialError>;
