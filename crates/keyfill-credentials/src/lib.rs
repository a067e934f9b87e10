// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Vault-backed credentials for keyfill.
//!
//! This crate provides:
//! - [`CredentialManager`]: TTL-cached secret reads, invalidating writes and
//!   bulk synchronization that pre-warms the cache and groups accounts
//! - [`GroupingRule`] / [`GroupedAccounts`]: pattern-based account groups
//! - [`Options`] and the [`OptionsStore`] backends that persist them
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use keyfill_credentials::{CredentialManager, FileOptionsStore};
//!
//! let store = Arc::new(FileOptionsStore::new("options.json"));
//! let manager = CredentialManager::new(store);
//!
//! let groups = manager.sync_accounts().await?;
//! let password = manager.get_secret("admin@corp.com").await?;
//! ```

mod cache;
mod clock;
mod error;
mod grouping;
mod manager;
mod options;
mod store;

pub use cache::{TtlCache, DEFAULT_TTL};
pub use clock::{Clock, ManualClock, SystemClock};
pub use error::{CredentialError, CredentialResult, OptionsError};
pub use grouping::{CompiledRules, GroupedAccounts, GroupingRule, UNGROUPED};
pub use manager::CredentialManager;
pub use options::{AdditionalMenu, Options};
pub use store::{FileOptionsStore, MemoryOptionsStore, OptionsStore};
