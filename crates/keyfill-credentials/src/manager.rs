// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Credential manager: cached secret reads, invalidating writes and bulk sync.
//!
//! Options are reloaded from the [`OptionsStore`] before every operation so
//! that configuration edits take effect on the next call. The
//! [`VaultClient`] (and with it the cached bearer token) is kept only while
//! the reloaded [`VaultConfig`] equals the one it was built from. Pointing
//! the options at a different vault also empties the cache.
//!
//! Concurrent reads of the same uncached account each miss the cache and
//! each fetch from the vault. The last fetch to finish wins the cache slot.

use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use keyfill_common_secret::SecretString;
use keyfill_vault::{codec, http, SecretItem, VaultClient, VaultConfig, VaultError};
use tokio::sync::Mutex;
use tracing::{debug, info, instrument, warn};

use crate::cache::{TtlCache, DEFAULT_TTL};
use crate::clock::{Clock, SystemClock};
use crate::error::{CredentialError, CredentialResult};
use crate::grouping::{CompiledRules, GroupedAccounts};
use crate::options::Options;
use crate::store::OptionsStore;

pub struct CredentialManager {
	options: Arc<dyn OptionsStore>,
	cache: TtlCache<SecretString>,
	http_client: Option<reqwest::Client>,
	authority: Option<String>,
	client: Mutex<Option<(VaultConfig, Arc<VaultClient>)>>,
}

impl CredentialManager {
	pub fn new(options: Arc<dyn OptionsStore>) -> Self {
		Self {
			options,
			cache: TtlCache::with_clock(DEFAULT_TTL, Arc::new(SystemClock)),
			http_client: None,
			authority: None,
			client: Mutex::new(None),
		}
	}

	/// Replaces the cache's time source. Drops anything already cached.
	pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
		self.cache = TtlCache::with_clock(self.cache.ttl(), clock);
		self
	}

	/// Replaces the cache TTL. Drops anything already cached.
	pub fn with_ttl(mut self, ttl: Duration) -> Self {
		self.cache = TtlCache::with_clock(ttl, self.cache.clock().clone());
		self
	}

	/// Uses `http_client` for every vault and token request.
	pub fn with_http_client(mut self, http_client: reqwest::Client) -> Self {
		self.http_client = Some(http_client);
		self
	}

	/// Points the client-credentials exchange at another identity provider host.
	pub fn with_authority(mut self, authority: impl Into<String>) -> Self {
		self.authority = Some(authority.into());
		self
	}

	pub fn options_store(&self) -> &Arc<dyn OptionsStore> {
		&self.options
	}

	/// Returns the secret for `identifier`, from cache when fresh.
	#[instrument(skip(self))]
	pub async fn get_secret(&self, identifier: &str) -> CredentialResult<SecretString> {
		let (_, client) = self.connect().await?;

		if let Some(value) = self.cache.get(identifier).await {
			debug!("cache hit");
			return Ok(value);
		}

		debug!("cache miss, fetching from vault");
		let value = client.get_secret(identifier).await?;
		self.cache.put(identifier, value.clone()).await;
		Ok(value)
	}

	/// Writes a new secret value and drops the cached one.
	#[instrument(skip(self, new_value))]
	pub async fn update_password(
		&self,
		identifier: &str,
		new_value: &SecretString,
	) -> CredentialResult<()> {
		let (_, client) = self.connect().await?;
		client.set_secret(identifier, new_value).await?;
		self.cache.invalidate(identifier).await;
		info!("password updated");
		Ok(())
	}

	/// Lists every secret, fetches all of them into the cache and groups the
	/// decoded account identifiers by the configured rules.
	///
	/// Fetches run concurrently. If any fails, no groups are returned and the
	/// error names the first failing account in listing order.
	#[instrument(skip(self))]
	pub async fn list_and_group_secrets(&self) -> CredentialResult<GroupedAccounts> {
		let (options, client) = self.connect().await?;
		let rules = CompiledRules::compile(&options.grouping_rules)?;

		let accounts: Vec<String> = client
			.list_secrets()
			.await?
			.iter()
			.filter_map(SecretItem::name)
			.map(|name| codec::decode(&name))
			.collect();
		debug!(count = accounts.len(), "listed accounts");

		let started = self.cache.clock().now();
		let results = join_all(accounts.iter().map(|account| {
			let client = Arc::clone(&client);
			async move {
				let value = client.get_secret(account).await?;
				self.cache.put_at(account.as_str(), value, started).await;
				Ok::<(), VaultError>(())
			}
		}))
		.await;

		let mut failures = accounts
			.iter()
			.zip(results)
			.filter_map(|(account, result)| result.err().map(|err| (account, err)));
		if let Some((account, source)) = failures.next() {
			let failed = 1 + failures.count();
			warn!(account = %account, failed, error = %source, "synchronization aborted");
			return Err(CredentialError::Sync {
				account: account.clone(),
				failed,
				source,
			});
		}

		let grouped = rules.group(&accounts);
		info!(
			accounts = accounts.len(),
			groups = grouped.group_names().count(),
			"accounts synchronized"
		);
		Ok(grouped)
	}

	/// Synchronizes and stores the grouped accounts in the options document.
	#[instrument(skip(self))]
	pub async fn sync_accounts(&self) -> CredentialResult<GroupedAccounts> {
		let grouped = self.list_and_group_secrets().await?;

		let mut options = self.options.load().await?;
		options.accounts = Some(grouped.clone());
		self.options.save(&options).await?;
		Ok(grouped)
	}

	/// Number of cached entries, fresh or stale.
	pub async fn cache_len(&self) -> usize {
		self.cache.len().await
	}

	pub async fn clear_cache(&self) {
		self.cache.clear().await;
	}

	/// Reloads options and returns a client for the current vault configuration.
	async fn connect(&self) -> CredentialResult<(Options, Arc<VaultClient>)> {
		let options = self.options.load().await?;
		let config = options.vault_config()?;

		let mut slot = self.client.lock().await;
		if let Some((current, client)) = slot.as_ref() {
			if *current == config {
				return Ok((options, Arc::clone(client)));
			}
			if current.vault_url != config.vault_url {
				debug!(from = %current.vault_url, to = %config.vault_url, "vault changed, clearing cache");
				self.cache.clear().await;
			}
		}

		debug!(vault_url = %config.vault_url, "vault configuration changed, building client");
		let http_client = match &self.http_client {
			Some(client) => client.clone(),
			None => http::new_client()?,
		};
		let mut client = VaultClient::with_http_client(&config, http_client)?;
		if let Some(authority) = &self.authority {
			client = client.with_authority(authority.clone());
		}

		let client = Arc::new(client);
		*slot = Some((config, Arc::clone(&client)));
		Ok((options, client))
	}
}

impl std::fmt::Debug for CredentialManager {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("CredentialManager")
			.field("options", &self.options)
			.field("ttl", &self.cache.ttl())
			.field("authority", &self.authority)
			.finish_non_exhaustive()
	}
}
