// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Error types for the vault client.

use thiserror::Error;

/// Errors raised by token acquisition and vault requests.
#[derive(Debug, Error)]
pub enum VaultError {
	/// Required connection settings are missing or malformed.
	#[error("configuration error: {0}")]
	Configuration(String),

	/// The token endpoint rejected the exchange or returned no access token.
	#[error("authentication failed: {0}")]
	Auth(String),

	/// The vault answered with a non-success status.
	///
	/// `message` is the remote `error.message`, reproduced verbatim.
	#[error("vault API error (HTTP {status}): {message}")]
	Api { status: u16, message: String },

	/// The request did not complete within the client timeout.
	#[error("request timed out")]
	Timeout,

	/// Transport-level failure.
	#[error("HTTP error: {0}")]
	Http(reqwest::Error),

	/// A success response whose body could not be understood.
	#[error("invalid response: {0}")]
	InvalidResponse(String),
}

impl From<reqwest::Error> for VaultError {
	fn from(err: reqwest::Error) -> Self {
		if err.is_timeout() {
			VaultError::Timeout
		} else {
			VaultError::Http(err)
		}
	}
}

impl VaultError {
	/// The remote message for [`VaultError::Api`], if this is one.
	pub fn api_message(&self) -> Option<&str> {
		match self {
			VaultError::Api { message, .. } => Some(message),
			_ => None,
		}
	}
}

/// Result type for vault operations.
pub type VaultResult<T> = Result<T, VaultError>;
