// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Shared HTTP client for the token endpoint and the vault API.

use std::time::Duration;

use reqwest::{redirect, Client, ClientBuilder};

use crate::error::{VaultError, VaultResult};

/// Upper bound on any single token or vault request.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Returns the keyfill User-Agent string.
///
/// Format: `keyfill/{version} ({os}-{arch})`
pub fn user_agent() -> String {
	format!(
		"keyfill/{} ({}-{})",
		env!("CARGO_PKG_VERSION"),
		std::env::consts::OS,
		std::env::consts::ARCH
	)
}

/// Client builder with the keyfill User-Agent and redirects disabled.
///
/// Bearer tokens must not follow a redirect to another host.
pub fn builder() -> ClientBuilder {
	Client::builder()
		.user_agent(user_agent())
		.redirect(redirect::Policy::none())
}

/// Builds a client whose requests give up after `timeout`.
pub fn new_client_with_timeout(timeout: Duration) -> VaultResult<Client> {
	builder()
		.timeout(timeout)
		.build()
		.map_err(|e| VaultError::Configuration(format!("failed to create HTTP client: {e}")))
}

/// Builds a client with [`DEFAULT_TIMEOUT`].
pub fn new_client() -> VaultResult<Client> {
	new_client_with_timeout(DEFAULT_TIMEOUT)
}

/// Trims a response body for inclusion in an error message.
pub(crate) fn sanitize_body_for_error(body: &str, max_len: usize) -> String {
	let sanitized: String = body
		.chars()
		.filter(|c| !c.is_control() || *c == ' ')
		.take(max_len)
		.collect();
	if body.chars().count() > max_len {
		format!("{sanitized}...")
	} else {
		sanitized
	}
}
