// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Wire-level secret operations against the vault.

use std::time::Duration;

use keyfill_common_secret::SecretString;
use reqwest::header::AUTHORIZATION;
use reqwest::{Client, Response};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, warn};
use url::Url;

use crate::codec;
use crate::config::{VaultConfig, API_VERSION};
use crate::error::{VaultError, VaultResult};
use crate::http::{self, sanitize_body_for_error};
use crate::token::TokenProvider;

/// Metadata of one secret as returned by the list endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SecretItem {
	/// Full secret URL, e.g. `https://myvault.vault.azure.net/secrets/user--corp-com`.
	#[serde(default)]
	pub id: Option<String>,
	#[serde(default)]
	pub name: Option<String>,
	#[serde(default)]
	pub attributes: Option<SecretAttributes>,
	#[serde(default, rename = "contentType")]
	pub content_type: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SecretAttributes {
	#[serde(default)]
	pub enabled: Option<bool>,
	#[serde(default)]
	pub created: Option<i64>,
	#[serde(default)]
	pub updated: Option<i64>,
}

impl SecretItem {
	/// The secret name: `name` when present, otherwise the last path segment of `id`.
	pub fn name(&self) -> Option<String> {
		if let Some(name) = self.name.as_deref().filter(|n| !n.is_empty()) {
			return Some(name.to_string());
		}
		let id = Url::parse(self.id.as_deref()?).ok()?;
		let last = id.path_segments()?.filter(|s| !s.is_empty()).last()?;
		Some(last.to_string())
	}
}

#[derive(Deserialize)]
struct SecretBundle {
	value: SecretString,
}

#[derive(Serialize)]
struct SetSecretRequest<'a> {
	value: &'a str,
}

#[derive(Deserialize)]
struct SecretListPage {
	#[serde(default)]
	value: Vec<SecretItem>,
	#[serde(default, rename = "nextLink")]
	next_link: Option<String>,
}

#[derive(Deserialize)]
struct ErrorEnvelope {
	error: ErrorBody,
}

#[derive(Deserialize)]
struct ErrorBody {
	message: String,
}

/// Client for one vault, authenticated through a [`TokenProvider`].
pub struct VaultClient {
	http_client: Client,
	vault_url: Url,
	tokens: TokenProvider,
}

impl VaultClient {
	/// Creates a client with the default HTTP timeout.
	pub fn new(config: &VaultConfig) -> VaultResult<Self> {
		Self::with_http_client(config, http::new_client()?)
	}

	/// Creates a client whose requests give up after `timeout`.
	pub fn with_timeout(config: &VaultConfig, timeout: Duration) -> VaultResult<Self> {
		Self::with_http_client(config, http::new_client_with_timeout(timeout)?)
	}

	/// Creates a client on an existing HTTP client.
	pub fn with_http_client(config: &VaultConfig, http_client: Client) -> VaultResult<Self> {
		let raw = config.vault_url.trim();
		if raw.is_empty() {
			return Err(VaultError::Configuration("vault URL is not configured".to_string()));
		}
		let vault_url = Url::parse(raw.trim_end_matches('/'))
			.map_err(|e| VaultError::Configuration(format!("invalid vault URL {raw:?}: {e}")))?;
		if vault_url.cannot_be_a_base() {
			return Err(VaultError::Configuration(format!("invalid vault URL {raw:?}")));
		}

		let tokens = TokenProvider::new(config, http_client.clone());
		Ok(Self {
			http_client,
			vault_url,
			tokens,
		})
	}

	/// Points token acquisition at another identity provider host.
	pub fn with_authority(mut self, authority: impl Into<String>) -> Self {
		self.tokens = self.tokens.with_authority(authority);
		self
	}

	pub fn vault_url(&self) -> &Url {
		&self.vault_url
	}

	pub fn tokens(&self) -> &TokenProvider {
		&self.tokens
	}

	/// Fetches the value stored for `identifier`.
	#[instrument(skip(self))]
	pub async fn get_secret(&self, identifier: &str) -> VaultResult<SecretString> {
		let url = self.secret_url(identifier);
		let token = self.tokens.token().await?;

		debug!(url = %url, "fetching secret");
		let response = self
			.http_client
			.get(url)
			.header(AUTHORIZATION, bearer(&token))
			.send()
			.await?;

		let response = ensure_success(response).await?;
		let bundle: SecretBundle = response
			.json()
			.await
			.map_err(|e| VaultError::InvalidResponse(e.to_string()))?;
		Ok(bundle.value)
	}

	/// Stores `value` for `identifier`, creating a new version of the secret.
	#[instrument(skip(self, value))]
	pub async fn set_secret(&self, identifier: &str, value: &SecretString) -> VaultResult<()> {
		let url = self.secret_url(identifier);
		let token = self.tokens.token().await?;

		debug!(url = %url, "storing secret");
		let response = self
			.http_client
			.put(url)
			.header(AUTHORIZATION, bearer(&token))
			.json(&SetSecretRequest {
				value: value.expose(),
			})
			.send()
			.await?;

		ensure_success(response).await?;
		Ok(())
	}

	/// Lists every secret in the vault, following `nextLink` until it is absent.
	#[instrument(skip(self))]
	pub async fn list_secrets(&self) -> VaultResult<Vec<SecretItem>> {
		let mut next = Some(self.collection_url());
		let token = self.tokens.token().await?;
		let mut results = Vec::new();
		let mut pages = 0usize;

		while let Some(url) = next.take() {
			debug!(url = %url, page = pages, "listing secrets");
			let response = self
				.http_client
				.get(url.clone())
				.header(AUTHORIZATION, bearer(&token))
				.send()
				.await?;

			let response = ensure_success(response).await?;
			let page: SecretListPage = response
				.json()
				.await
				.map_err(|e| VaultError::InvalidResponse(e.to_string()))?;

			pages += 1;
			results.extend(page.value);
			next = match page.next_link.filter(|link| !link.is_empty()) {
				Some(link) => Some(self.next_page_url(&link)?),
				None => None,
			};
		}

		debug!(pages, count = results.len(), "listed secrets");
		Ok(results)
	}

	/// Parses a `nextLink`, refusing one on another origin so the bearer
	/// token stays with the vault.
	fn next_page_url(&self, link: &str) -> VaultResult<Url> {
		let url = Url::parse(link)
			.map_err(|e| VaultError::InvalidResponse(format!("invalid nextLink {link:?}: {e}")))?;
		if url.origin() != self.vault_url.origin() {
			warn!(next_link = %url, vault_url = %self.vault_url, "refusing nextLink on another origin");
			return Err(VaultError::InvalidResponse(format!(
				"nextLink {link:?} is not on the vault origin"
			)));
		}
		Ok(url)
	}

	fn collection_url(&self) -> Url {
		self.build_url(&["secrets"])
	}

	fn secret_url(&self, identifier: &str) -> Url {
		let (name, ambiguity) = codec::encode_checked(identifier);
		if let Some(warning) = ambiguity {
			warn!(%warning, "identifier does not survive secret name encoding");
		}
		self.build_url(&["secrets", name.as_str()])
	}

	fn build_url(&self, segments: &[&str]) -> Url {
		let mut url = self.vault_url.clone();
		if let Ok(mut path) = url.path_segments_mut() {
			path.pop_if_empty().extend(segments);
		}
		url.query_pairs_mut().append_pair("api-version", API_VERSION);
		url
	}
}

impl std::fmt::Debug for VaultClient {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("VaultClient")
			.field("vault_url", &self.vault_url.as_str())
			.field("tokens", &self.tokens)
			.finish()
	}
}

fn bearer(token: &SecretString) -> String {
	format!("Bearer {}", token.expose())
}

/// Passes a success response through and turns anything else into [`VaultError::Api`].
async fn ensure_success(response: Response) -> VaultResult<Response> {
	let status = response.status();
	if status.is_success() {
		return Ok(response);
	}

	let body = response.text().await.unwrap_or_default();
	let message = match serde_json::from_str::<ErrorEnvelope>(&body) {
		Ok(envelope) => envelope.error.message,
		Err(_) if body.trim().is_empty() => status
			.canonical_reason()
			.unwrap_or("request failed")
			.to_string(),
		Err(_) => sanitize_body_for_error(&body, 200),
	};

	warn!(status = %status, message = %message, "vault request failed");
	Err(VaultError::Api {
		status: status.as_u16(),
		message,
	})
}
