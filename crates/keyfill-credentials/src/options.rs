// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! The persisted options document.

use keyfill_common_secret::{exposed, SecretString};
use keyfill_vault::{VaultConfig, VaultError, VaultResult, DEFAULT_CLIENT_ID, DEFAULT_SCOPE};
use serde::{Deserialize, Serialize};

use crate::grouping::{GroupedAccounts, GroupingRule};

/// A named menu tree shown next to the standard one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdditionalMenu {
	pub name: String,
	pub config: serde_json::Value,
}

/// Everything the user configures, stored as one camelCase JSON document.
///
/// `clientSecret` and `presharedToken` are written in clear: the store is the
/// one place they are persisted.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Options {
	#[serde(skip_serializing_if = "Option::is_none")]
	pub vault_url: Option<String>,
	/// Vault URLs the user has used before.
	#[serde(skip_serializing_if = "Vec::is_empty")]
	pub vault_urls: Vec<String>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub client_id: Option<String>,
	#[serde(
		serialize_with = "exposed::option",
		skip_serializing_if = "Option::is_none"
	)]
	pub client_secret: Option<SecretString>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub tenant_id: Option<String>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub scope: Option<String>,
	#[serde(
		serialize_with = "exposed::option",
		skip_serializing_if = "Option::is_none"
	)]
	pub preshared_token: Option<SecretString>,
	pub grouping_rules: Vec<GroupingRule>,
	/// Result of the last synchronization.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub accounts: Option<GroupedAccounts>,
	pub additional_menus: Vec<AdditionalMenu>,
	pub skip_standard: bool,
	pub debug_logging: bool,
}

impl Options {
	/// Builds the vault connection settings, applying the default client id and scope.
	///
	/// Empty strings count as unset.
	pub fn vault_config(&self) -> VaultResult<VaultConfig> {
		let vault_url = non_empty(&self.vault_url).ok_or_else(|| {
			VaultError::Configuration("vaultUrl is not configured".to_string())
		})?;

		Ok(VaultConfig {
			vault_url: vault_url.to_string(),
			client_id: non_empty(&self.client_id)
				.unwrap_or(DEFAULT_CLIENT_ID)
				.to_string(),
			client_secret: self.client_secret.clone().filter(|s| !s.is_empty()),
			tenant_id: non_empty(&self.tenant_id).map(str::to_string),
			scope: non_empty(&self.scope).unwrap_or(DEFAULT_SCOPE).to_string(),
			preshared_token: self.preshared_token.clone().filter(|s| !s.is_empty()),
		})
	}

	/// Records `url` as the active vault and remembers it.
	pub fn use_vault(&mut self, url: impl Into<String>) {
		let url = url.into();
		if !self.vault_urls.contains(&url) {
			self.vault_urls.push(url.clone());
		}
		self.vault_url = Some(url);
	}
}

fn non_empty(value: &Option<String>) -> Option<&str> {
	value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}
