// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Options storage backends.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tokio::sync::{watch, RwLock};
use tracing::{debug, warn};

use crate::error::OptionsError;
use crate::options::Options;

/// Where the options document lives.
///
/// Every successful `save` bumps the generation published on `subscribe`,
/// which is how menus learn that they must rebuild.
#[async_trait]
pub trait OptionsStore: Send + Sync + std::fmt::Debug {
	/// Loads the current options. A store with nothing saved yields defaults.
	async fn load(&self) -> Result<Options, OptionsError>;

	/// Replaces the stored options.
	async fn save(&self, options: &Options) -> Result<(), OptionsError>;

	/// Receiver of the change generation.
	fn subscribe(&self) -> watch::Receiver<u64>;
}

/// JSON file store, written atomically with 0600 permissions on Unix.
#[derive(Debug)]
pub struct FileOptionsStore {
	path: PathBuf,
	changes: watch::Sender<u64>,
}

impl FileOptionsStore {
	pub fn new(path: impl Into<PathBuf>) -> Self {
		let (changes, _) = watch::channel(0);
		Self {
			path: path.into(),
			changes,
		}
	}

	pub fn path(&self) -> &Path {
		&self.path
	}

	async fn write_file(&self, options: &Options) -> Result<(), OptionsError> {
		if let Some(parent) = self.path.parent() {
			fs::create_dir_all(parent).await?;
		}

		let contents = serde_json::to_string_pretty(options)?;

		let temp_path = self.path.with_extension("tmp");
		let mut file = fs::File::create(&temp_path).await?;
		file.write_all(contents.as_bytes()).await?;
		file.sync_all().await?;
		drop(file);

		#[cfg(unix)]
		{
			use std::os::unix::fs::PermissionsExt;
			let perms = std::fs::Permissions::from_mode(0o600);
			if let Err(e) = std::fs::set_permissions(&temp_path, perms) {
				warn!(path = ?temp_path, error = %e, "failed to set file permissions to 0600");
			}
		}

		fs::rename(&temp_path, &self.path).await?;

		debug!(path = ?self.path, "options written");
		Ok(())
	}
}

#[async_trait]
impl OptionsStore for FileOptionsStore {
	async fn load(&self) -> Result<Options, OptionsError> {
		let contents = match fs::read_to_string(&self.path).await {
			Ok(contents) => contents,
			Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Options::default()),
			Err(e) => return Err(e.into()),
		};
		if contents.trim().is_empty() {
			return Ok(Options::default());
		}
		Ok(serde_json::from_str(&contents)?)
	}

	async fn save(&self, options: &Options) -> Result<(), OptionsError> {
		self.write_file(options).await?;
		self.changes.send_modify(|generation| *generation += 1);
		Ok(())
	}

	fn subscribe(&self) -> watch::Receiver<u64> {
		self.changes.subscribe()
	}
}

/// In-memory store for tests and embedding.
#[derive(Debug)]
pub struct MemoryOptionsStore {
	options: RwLock<Options>,
	changes: watch::Sender<u64>,
}

impl MemoryOptionsStore {
	pub fn new() -> Self {
		Self::with_options(Options::default())
	}

	pub fn with_options(options: Options) -> Self {
		let (changes, _) = watch::channel(0);
		Self {
			options: RwLock::new(options),
			changes,
		}
	}
}

impl Default for MemoryOptionsStore {
	fn default() -> Self {
		Self::new()
	}
}

#[async_trait]
impl OptionsStore for MemoryOptionsStore {
	async fn load(&self) -> Result<Options, OptionsError> {
		Ok(self.options.read().await.clone())
	}

	async fn save(&self, options: &Options) -> Result<(), OptionsError> {
		*self.options.write().await = options.clone();
		self.changes.send_modify(|generation| *generation += 1);
		Ok(())
	}

	fn subscribe(&self) -> watch::Receiver<u64> {
		self.changes.subscribe()
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::grouping::GroupingRule;

	fn sample() -> Options {
		Options {
			vault_url: Some("https://myvault.vault.azure.net".to_string()),
			client_secret: Some("s3cret".into()),
			tenant_id: Some("contoso".to_string()),
			grouping_rules: vec![GroupingRule::new("Admins", "^admin@")],
			..Default::default()
		}
	}

	#[tokio::test]
	async fn memory_store_roundtrip_bumps_generation() {
		let store = MemoryOptionsStore::new();
		let mut changes = store.subscribe();
		assert_eq!(store.load().await.unwrap(), Options::default());

		store.save(&sample()).await.unwrap();

		assert!(changes.has_changed().unwrap());
		assert_eq!(*changes.borrow_and_update(), 1);
		assert_eq!(store.load().await.unwrap(), sample());
	}

	#[tokio::test]
	async fn file_store_missing_file_is_default() {
		let temp_dir = tempfile::tempdir().unwrap();
		let store = FileOptionsStore::new(temp_dir.path().join("options.json"));
		assert_eq!(store.load().await.unwrap(), Options::default());
	}

	#[tokio::test]
	async fn file_store_roundtrip_keeps_secrets() {
		let temp_dir = tempfile::tempdir().unwrap();
		let path = temp_dir.path().join("nested").join("options.json");
		let store = FileOptionsStore::new(&path);
		let mut changes = store.subscribe();

		store.save(&sample()).await.unwrap();
		assert!(path.exists());
		assert!(!path.with_extension("tmp").exists());
		assert!(changes.has_changed().unwrap());

		let raw = std::fs::read_to_string(&path).unwrap();
		assert!(raw.contains("\"clientSecret\": \"s3cret\""));

		let loaded = store.load().await.unwrap();
		assert_eq!(loaded, sample());
	}

	#[cfg(unix)]
	#[tokio::test]
	async fn file_store_restricts_permissions() {
		use std::os::unix::fs::PermissionsExt;

		let temp_dir = tempfile::tempdir().unwrap();
		let path = temp_dir.path().join("options.json");
		let store = FileOptionsStore::new(&path);
		store.save(&sample()).await.unwrap();

		let mode = std::fs::metadata(&path).unwrap().permissions().mode();
		assert_eq!(mode & 0o777, 0o600);
	}

	#[tokio::test]
	async fn file_store_rejects_malformed_json() {
		let temp_dir = tempfile::tempdir().unwrap();
		let path = temp_dir.path().join("options.json");
		std::fs::write(&path, "{not json").unwrap();

		let err = FileOptionsStore::new(&path).load().await.unwrap_err();
		assert!(matches!(err, OptionsError::Serde(_)));
	}
}
