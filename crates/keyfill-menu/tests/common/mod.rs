// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use keyfill_common_secret::SecretString;
use keyfill_credentials::CredentialError;
use keyfill_menu::{Capability, CredentialResolver, HostInterface, MenuResult, RequestValue, TabId};
use keyfill_vault::VaultError;
use tokio::sync::Notify;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostEvent {
	RequestPermissions,
	RemovePermissions,
	Message(String),
	Inject(TabId, String),
	Paste(TabId, String),
	Copy(String),
	Fill(TabId, String, String),
	OpenSettings,
	OpenUrl(String),
}

/// Host that records every call and grants permissions on demand.
#[derive(Debug)]
pub struct RecordingHost {
	grant: AtomicBool,
	events: Mutex<Vec<HostEvent>>,
}

impl RecordingHost {
	pub fn granting(grant: bool) -> Self {
		Self {
			grant: AtomicBool::new(grant),
			events: Mutex::new(Vec::new()),
		}
	}

	pub fn set_grant(&self, grant: bool) {
		self.grant.store(grant, Ordering::SeqCst);
	}

	pub fn events(&self) -> Vec<HostEvent> {
		self.events.lock().unwrap().clone()
	}

	pub fn take_events(&self) -> Vec<HostEvent> {
		std::mem::take(&mut *self.events.lock().unwrap())
	}

	fn record(&self, event: HostEvent) {
		self.events.lock().unwrap().push(event);
	}
}

fn text(value: &RequestValue) -> String {
	value
		.as_text()
		.map(str::to_string)
		.unwrap_or_else(|| format!("<{}>", value.type_name()))
}

#[async_trait]
impl HostInterface for RecordingHost {
	async fn request_permissions(&self, _capabilities: &[Capability]) -> bool {
		self.record(HostEvent::RequestPermissions);
		self.grant.load(Ordering::SeqCst)
	}

	async fn remove_permissions(&self, _capabilities: &[Capability]) {
		self.record(HostEvent::RemovePermissions);
	}

	async fn show_message(&self, text: &str) {
		self.record(HostEvent::Message(text.to_string()));
	}

	async fn inject_value(&self, tab: TabId, value: &RequestValue) -> MenuResult<()> {
		self.record(HostEvent::Inject(tab, text(value)));
		Ok(())
	}

	async fn simulate_paste(&self, tab: TabId, value: &RequestValue) -> MenuResult<()> {
		self.record(HostEvent::Paste(tab, text(value)));
		Ok(())
	}

	async fn copy_to_clipboard(&self, text: &str) -> MenuResult<()> {
		self.record(HostEvent::Copy(text.to_string()));
		Ok(())
	}

	async fn fill_credentials(
		&self,
		tab: TabId,
		username: &str,
		password: &SecretString,
	) -> MenuResult<()> {
		self.record(HostEvent::Fill(
			tab,
			username.to_string(),
			password.expose().to_string(),
		));
		Ok(())
	}

	async fn open_settings(&self) {
		self.record(HostEvent::OpenSettings);
	}

	async fn open_url(&self, url: &str) {
		self.record(HostEvent::OpenUrl(url.to_string()));
	}
}

/// Resolver backed by a fixed map; unknown accounts fail like a vault 404.
#[derive(Debug, Default)]
pub struct MapResolver {
	secrets: HashMap<String, String>,
}

impl MapResolver {
	pub fn with(pairs: &[(&str, &str)]) -> Self {
		Self {
			secrets: pairs
				.iter()
				.map(|(k, v)| (k.to_string(), v.to_string()))
				.collect(),
		}
	}
}

#[async_trait]
impl CredentialResolver for MapResolver {
	async fn resolve(&self, identifier: &str) -> Result<SecretString, CredentialError> {
		self.secrets
			.get(identifier)
			.map(|v| SecretString::from(v.as_str()))
			.ok_or_else(|| {
				CredentialError::Vault(VaultError::Api {
					status: 404,
					message: format!("A secret with (name/id) {identifier} was not found"),
				})
			})
	}
}

/// Resolver that holds every lookup until released.
#[derive(Debug, Default)]
pub struct GatedResolver {
	pub entered: Notify,
	pub gate: Notify,
}

#[async_trait]
impl CredentialResolver for GatedResolver {
	async fn resolve(&self, _identifier: &str) -> Result<SecretString, CredentialError> {
		self.entered.notify_one();
		self.gate.notified().await;
		Ok(SecretString::from("late"))
	}
}
