// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Bearer token acquisition for the vault API.
//!
//! Two strategies, picked from [`VaultConfig`]:
//!
//! - **Pre-shared token**: the configured token is returned as-is. No
//!   network call, no expiry tracking.
//! - **Client credentials**: the first call posts `client_id`,
//!   `client_secret`, `scope` and `grant_type=client_credentials` to
//!   `{authority}/{tenant}/oauth2/v2.0/token` and caches the access token
//!   for the lifetime of the provider.
//!
//! The cached token is never refreshed on expiry. A caller that needs a new
//! token builds a new provider (the credential manager does this whenever
//! the configuration changes) or calls [`TokenProvider::clear`].

use keyfill_common_secret::SecretString;
use reqwest::header::ACCEPT;
use reqwest::Client;
use serde::Deserialize;
use tokio::sync::Mutex;
use tracing::{debug, instrument, warn};

use crate::config::VaultConfig;
use crate::error::{VaultError, VaultResult};
use crate::http::sanitize_body_for_error;

/// Identity provider host used for the client-credentials grant.
pub const DEFAULT_AUTHORITY: &str = "https://login.microsoftonline.com";

const GRANT_TYPE: &str = "client_credentials";

enum Strategy {
	Preshared(SecretString),
	ClientCredentials {
		client_id: String,
		client_secret: Option<SecretString>,
		tenant_id: Option<String>,
		scope: String,
	},
}

/// Token endpoint response; on failure only the error fields are present.
#[derive(Deserialize)]
struct TokenResponse {
	access_token: Option<SecretString>,
	error: Option<String>,
	error_description: Option<String>,
}

/// Acquires and caches the bearer token for one vault configuration.
pub struct TokenProvider {
	http_client: Client,
	strategy: Strategy,
	authority: String,
	cached: Mutex<Option<SecretString>>,
}

impl TokenProvider {
	pub fn new(config: &VaultConfig, http_client: Client) -> Self {
		let strategy = match &config.preshared_token {
			Some(token) if !token.is_empty() => Strategy::Preshared(token.clone()),
			_ => Strategy::ClientCredentials {
				client_id: config.client_id.clone(),
				client_secret: config.client_secret.clone(),
				tenant_id: config.tenant_id.clone(),
				scope: config.token_scope(),
			},
		};

		Self {
			http_client,
			strategy,
			authority: DEFAULT_AUTHORITY.to_string(),
			cached: Mutex::new(None),
		}
	}

	/// Points the client-credentials exchange at another identity provider host.
	pub fn with_authority(mut self, authority: impl Into<String>) -> Self {
		self.authority = authority.into().trim_end_matches('/').to_string();
		self
	}

	pub fn is_preshared(&self) -> bool {
		matches!(self.strategy, Strategy::Preshared(_))
	}

	/// The token endpoint for `tenant_id`.
	pub fn token_url(&self, tenant_id: &str) -> String {
		format!("{}/{}/oauth2/v2.0/token", self.authority, tenant_id)
	}

	/// Returns a bearer token, exchanging client credentials on first use.
	///
	/// Concurrent callers wait for a single exchange rather than each
	/// posting to the token endpoint.
	pub async fn token(&self) -> VaultResult<SecretString> {
		let (client_id, client_secret, tenant_id, scope) = match &self.strategy {
			Strategy::Preshared(token) => return Ok(token.clone()),
			Strategy::ClientCredentials {
				client_id,
				client_secret,
				tenant_id,
				scope,
			} => (client_id, client_secret, tenant_id, scope),
		};

		let mut cached = self.cached.lock().await;
		if let Some(token) = cached.as_ref() {
			return Ok(token.clone());
		}

		let (client_secret, tenant_id) = match (client_secret, tenant_id) {
			(Some(secret), Some(tenant))
				if !client_id.is_empty() && !secret.is_empty() && !tenant.is_empty() =>
			{
				(secret, tenant)
			}
			_ => {
				return Err(VaultError::Configuration(
					"client credentials are not fully configured; set client id, client secret and tenant id"
						.to_string(),
				))
			}
		};

		let token = self
			.exchange(client_id, client_secret, tenant_id, scope)
			.await?;
		*cached = Some(token.clone());
		Ok(token)
	}

	/// Forgets the cached token so the next call exchanges again.
	pub async fn clear(&self) {
		*self.cached.lock().await = None;
	}

	#[instrument(skip(self, client_secret))]
	async fn exchange(
		&self,
		client_id: &str,
		client_secret: &SecretString,
		tenant_id: &str,
		scope: &str,
	) -> VaultResult<SecretString> {
		let url = self.token_url(tenant_id);
		debug!(url = %url, scope = %scope, "requesting access token");

		let response = self
			.http_client
			.post(&url)
			.header(ACCEPT, "application/json")
			.form(&[
				("client_id", client_id),
				("client_secret", client_secret.expose().as_str()),
				("scope", scope),
				("grant_type", GRANT_TYPE),
			])
			.send()
			.await?;

		let status = response.status();
		let body = response.text().await?;

		let parsed: TokenResponse = match serde_json::from_str(&body) {
			Ok(parsed) => parsed,
			Err(_) => {
				warn!(status = %status, "token endpoint returned a non-JSON body");
				return Err(VaultError::Auth(format!(
					"token endpoint returned HTTP {}: {}",
					status.as_u16(),
					sanitize_body_for_error(&body, 200)
				)));
			}
		};

		match parsed.access_token {
			Some(token) if !token.is_empty() => {
				debug!("obtained access token");
				Ok(token)
			}
			_ => {
				let reason = parsed
					.error_description
					.or(parsed.error)
					.unwrap_or_else(|| format!("no access token in response (HTTP {})", status.as_u16()));
				warn!(status = %status, "token exchange failed");
				Err(VaultError::Auth(reason))
			}
		}
	}
}

impl std::fmt::Debug for TokenProvider {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		let strategy = match self.strategy {
			Strategy::Preshared(_) => "preshared",
			Strategy::ClientCredentials { .. } => "client_credentials",
		};
		f.debug_struct("TokenProvider")
			.field("strategy", &strategy)
			.field("authority", &self.authority)
			.field(
				"has_cached_token",
				&self.cached.try_lock().map(|t| t.is_some()).unwrap_or(false),
			)
			.finish()
	}
}
