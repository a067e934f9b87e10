// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Time-bounded in-memory cache for fetched secrets.
//!
//! An entry is served while `now - fetched_at` is below the TTL and is
//! treated as absent from the moment the TTL is reached. Stale entries stay
//! in the map until overwritten, invalidated or cleared.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use crate::clock::{Clock, SystemClock};

/// How long a fetched secret is served without going back to the vault.
pub const DEFAULT_TTL: Duration = Duration::from_millis(300_000);

#[derive(Debug, Clone)]
struct CacheEntry<V> {
	value: V,
	fetched_at: DateTime<Utc>,
}

/// Keyed cache with a fixed time-to-live and a pluggable clock.
#[derive(Debug)]
pub struct TtlCache<V> {
	inner: Arc<RwLock<HashMap<String, CacheEntry<V>>>>,
	ttl: Duration,
	clock: Arc<dyn Clock>,
}

impl<V: Clone> TtlCache<V> {
	pub fn new() -> Self {
		Self::with_clock(DEFAULT_TTL, Arc::new(SystemClock))
	}

	pub fn with_clock(ttl: Duration, clock: Arc<dyn Clock>) -> Self {
		Self {
			inner: Arc::new(RwLock::new(HashMap::new())),
			ttl,
			clock,
		}
	}

	pub fn ttl(&self) -> Duration {
		self.ttl
	}

	pub fn clock(&self) -> &Arc<dyn Clock> {
		&self.clock
	}

	/// Returns the value for `key` if it was stored less than one TTL ago.
	pub async fn get(&self, key: &str) -> Option<V> {
		let now = self.clock.now();
		let inner = self.inner.read().await;
		let entry = inner.get(key)?;
		if self.is_fresh(entry, now) {
			Some(entry.value.clone())
		} else {
			None
		}
	}

	/// Stores `value` for `key`, stamped with the current time.
	pub async fn put(&self, key: impl Into<String>, value: V) {
		let now = self.clock.now();
		self.put_at(key, value, now).await;
	}

	/// Stores `value` for `key` as if it had been fetched at `fetched_at`.
	pub async fn put_at(&self, key: impl Into<String>, value: V, fetched_at: DateTime<Utc>) {
		self.inner
			.write()
			.await
			.insert(key.into(), CacheEntry { value, fetched_at });
	}

	/// Drops the entry for `key`. Returns whether one was present.
	pub async fn invalidate(&self, key: &str) -> bool {
		self.inner.write().await.remove(key).is_some()
	}

	pub async fn clear(&self) {
		self.inner.write().await.clear();
	}

	/// Number of stored entries, fresh or stale.
	pub async fn len(&self) -> usize {
		self.inner.read().await.len()
	}

	pub async fn is_empty(&self) -> bool {
		self.inner.read().await.is_empty()
	}

	fn is_fresh(&self, entry: &CacheEntry<V>, now: DateTime<Utc>) -> bool {
		let age = (now - entry.fetched_at).num_milliseconds();
		// A clock that moved backwards leaves the entry fresh.
		age < 0 || (age as u128) < self.ttl.as_millis()
	}
}

impl<V: Clone> Default for TtlCache<V> {
	fn default() -> Self {
		Self::new()
	}
}
