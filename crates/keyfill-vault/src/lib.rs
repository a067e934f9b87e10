// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Key vault client for keyfill.
//!
//! This crate provides:
//! 1. The reversible mapping between account identifiers and vault secret names
//! 2. Bearer token acquisition (pre-shared token or OAuth2 client credentials)
//! 3. `get`, `set` and paginated `list` of secrets over the vault REST API
//!
//! # Example
//!
//! ```ignore
//! use keyfill_vault::{VaultClient, VaultConfig};
//!
//! let config = VaultConfig::new("https://myvault.vault.azure.net")
//!     .with_client_credentials("client-id", "client-secret".into(), "tenant-id");
//! let client = VaultClient::new(&config)?;
//!
//! let password = client.get_secret("admin@corp.com").await?;
//! println!("{password}"); // [REDACTED]
//! ```

mod client;
pub mod codec;
mod config;
mod error;
pub mod http;
mod token;

pub use client::{SecretAttributes, SecretItem, VaultClient};
pub use codec::DecodeAmbiguity;
pub use config::{VaultConfig, API_VERSION, DEFAULT_CLIENT_ID, DEFAULT_SCOPE};
pub use error::{VaultError, VaultResult};
pub use keyfill_common_secret::SecretString;
pub use token::{TokenProvider, DEFAULT_AUTHORITY};
