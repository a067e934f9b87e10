// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Connection settings shared by the token provider and the vault client.

use keyfill_common_secret::SecretString;

/// Application id registered for keyfill, used when none is configured.
pub const DEFAULT_CLIENT_ID: &str = "d81f3ba2-ebf7-4d4c-8550-e642c3736d99";

/// Resource scope of the vault API.
pub const DEFAULT_SCOPE: &str = "https://vault.azure.net/.default";

/// Vault REST API version sent with every request.
pub const API_VERSION: &str = "7.1";

/// Everything needed to talk to one vault.
///
/// Built fresh from the persisted options before every credential-bearing
/// operation; equality is used to decide whether an existing client (and
/// its cached token) may be reused.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VaultConfig {
	pub vault_url: String,
	pub client_id: String,
	pub client_secret: Option<SecretString>,
	pub tenant_id: Option<String>,
	pub scope: String,
	/// When set, used as the bearer token as-is and no token exchange happens.
	pub preshared_token: Option<SecretString>,
}

impl VaultConfig {
	/// A config for `vault_url` with the default client id and scope and no credentials.
	pub fn new(vault_url: impl Into<String>) -> Self {
		Self {
			vault_url: vault_url.into(),
			client_id: DEFAULT_CLIENT_ID.to_string(),
			client_secret: None,
			tenant_id: None,
			scope: DEFAULT_SCOPE.to_string(),
			preshared_token: None,
		}
	}

	pub fn with_client_credentials(
		mut self,
		client_id: impl Into<String>,
		client_secret: SecretString,
		tenant_id: impl Into<String>,
	) -> Self {
		self.client_id = client_id.into();
		self.client_secret = Some(client_secret);
		self.tenant_id = Some(tenant_id.into());
		self
	}

	pub fn with_preshared_token(mut self, token: SecretString) -> Self {
		self.preshared_token = Some(token);
		self
	}

	pub fn with_scope(mut self, scope: impl Into<String>) -> Self {
		self.scope = scope.into();
		self
	}

	/// The scope sent to the token endpoint, always ending in `/.default`.
	pub fn token_scope(&self) -> String {
		if self.scope.ends_with("/.default") {
			self.scope.clone()
		} else {
			format!("{}/.default", self.scope.trim_end_matches('/'))
		}
	}
}
