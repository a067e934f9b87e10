// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Compiles a menu configuration tree into menu nodes and mounts them.
//!
//! A configuration node is a JSON object (key = title, declaration order)
//! or array (index order; a string element is its own title, any other
//! element is titled by its index). Each value becomes, in priority order:
//!
//! 1. a string: [`MenuNode::Literal`]
//! 2. an object with `_type`: [`MenuNode::TypedValue`], payload passed through
//! 3. an object with `keyVaultSecret`: [`MenuNode::SecretRef`]
//! 4. any other object or array: [`MenuNode::Submenu`]
//!
//! Numbers, booleans and nulls produce nothing.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use keyfill_common_secret::SecretString;
use keyfill_credentials::{CredentialError, CredentialManager};
use serde_json::Value;
use tracing::{debug, error};

use crate::builder::{ClickContext, ClickHandler, MenuBuilder, MenuId};
use crate::error::MenuResult;
use crate::host::HostInterface;
use crate::node::{MenuEntry, MenuNode, RequestValue};

/// Key marking a typed value object.
pub const TYPE_KEY: &str = "_type";

/// Key naming the account whose vault secret is the value.
pub const SECRET_KEY: &str = "keyVaultSecret";

/// Looks up secret values for secret-backed menu items.
#[async_trait]
pub trait CredentialResolver: Send + Sync {
	async fn resolve(&self, identifier: &str) -> Result<SecretString, CredentialError>;
}

#[async_trait]
impl CredentialResolver for CredentialManager {
	async fn resolve(&self, identifier: &str) -> Result<SecretString, CredentialError> {
		self.get_secret(identifier).await
	}
}

/// The outer click callback: receives the resolved value of a clicked leaf.
#[async_trait]
pub trait ValueHandler: Send + Sync {
	async fn handle(&self, ctx: &ClickContext, value: RequestValue) -> MenuResult<()>;
}

/// Compiles `config` into an ordered list of entries.
pub fn compile(config: &Value) -> Vec<MenuEntry> {
	match config {
		Value::Object(map) => map
			.iter()
			.filter_map(|(key, value)| entry(key.clone(), value))
			.collect(),
		Value::Array(items) => items
			.iter()
			.enumerate()
			.filter_map(|(idx, value)| {
				let title = match value {
					Value::String(s) => s.clone(),
					_ => idx.to_string(),
				};
				entry(title, value)
			})
			.collect(),
		_ => Vec::new(),
	}
}

fn entry(title: String, value: &Value) -> Option<MenuEntry> {
	let node = match value {
		Value::String(s) => MenuNode::Literal(s.clone()),
		Value::Object(map) if map.contains_key(TYPE_KEY) => MenuNode::TypedValue {
			tag: text_of(&map[TYPE_KEY]),
			payload: value.clone(),
		},
		Value::Object(map) if map.contains_key(SECRET_KEY) => {
			MenuNode::SecretRef(text_of(&map[SECRET_KEY]))
		}
		Value::Object(_) | Value::Array(_) => MenuNode::Submenu(compile(value)),
		Value::Number(_) | Value::Bool(_) | Value::Null => {
			debug!(title = %title, "skipping scalar menu value");
			return None;
		}
	};
	Some(MenuEntry { title, node })
}

fn text_of(value: &Value) -> String {
	match value {
		Value::String(s) => s.clone(),
		other => other.to_string(),
	}
}

/// Mounts compiled entries on a [`MenuBuilder`], wiring leaf clicks to a [`ValueHandler`].
pub struct MenuCompiler {
	resolver: Arc<dyn CredentialResolver>,
	host: Arc<dyn HostInterface>,
	generation: Arc<AtomicU64>,
}

impl MenuCompiler {
	pub fn new(resolver: Arc<dyn CredentialResolver>, host: Arc<dyn HostInterface>) -> Self {
		Self {
			resolver,
			host,
			generation: Arc::new(AtomicU64::new(0)),
		}
	}

	/// Starts a new build. Secret lookups started by items of earlier builds
	/// are dropped when they finish.
	pub fn begin_generation(&self) -> u64 {
		self.generation.fetch_add(1, Ordering::SeqCst) + 1
	}

	pub fn generation(&self) -> u64 {
		self.generation.load(Ordering::SeqCst)
	}

	/// Creates menu items for `entries` under `parent`, returning how many were created.
	pub async fn mount(
		&self,
		entries: &[MenuEntry],
		builder: &dyn MenuBuilder,
		parent: &MenuId,
		on_click: Arc<dyn ValueHandler>,
	) -> usize {
		let generation = self.generation();
		let mut created = 0;
		let mut pending: VecDeque<(MenuId, &[MenuEntry])> = VecDeque::new();
		pending.push_back((parent.clone(), entries));

		while let Some((parent, entries)) = pending.pop_front() {
			for entry in entries {
				let handler: Arc<dyn ClickHandler> = match &entry.node {
					MenuNode::Submenu(children) => {
						let id = builder.sub_menu(&entry.title, &parent).await;
						pending.push_back((id, children.as_slice()));
						created += 1;
						continue;
					}
					MenuNode::Literal(value) => Arc::new(StaticLeaf {
						value: RequestValue::Literal(value.clone()),
						on_click: Arc::clone(&on_click),
					}),
					MenuNode::TypedValue { tag, payload } => Arc::new(StaticLeaf {
						value: RequestValue::Typed {
							tag: tag.clone(),
							payload: payload.clone(),
						},
						on_click: Arc::clone(&on_click),
					}),
					MenuNode::SecretRef(account) => Arc::new(SecretLeaf {
						account: account.clone(),
						resolver: Arc::clone(&self.resolver),
						host: Arc::clone(&self.host),
						on_click: Arc::clone(&on_click),
						generation,
						current: Arc::clone(&self.generation),
					}),
				};
				builder.menu_item(&entry.title, &parent, handler).await;
				created += 1;
			}
		}
		created
	}
}

struct StaticLeaf {
	value: RequestValue,
	on_click: Arc<dyn ValueHandler>,
}

#[async_trait]
impl ClickHandler for StaticLeaf {
	async fn on_click(&self, ctx: &ClickContext) -> MenuResult<()> {
		self.on_click.handle(ctx, self.value.clone()).await
	}
}

struct SecretLeaf {
	account: String,
	resolver: Arc<dyn CredentialResolver>,
	host: Arc<dyn HostInterface>,
	on_click: Arc<dyn ValueHandler>,
	generation: u64,
	current: Arc<AtomicU64>,
}

#[async_trait]
impl ClickHandler for SecretLeaf {
	async fn on_click(&self, ctx: &ClickContext) -> MenuResult<()> {
		let secret = match self.resolver.resolve(&self.account).await {
			Ok(secret) => secret,
			Err(err) => {
				error!(account = %self.account, error = %err, "failed to fetch secret");
				self.host
					.show_message(&format!("Failed to fetch secret {}: {err}", self.account))
					.await;
				return Ok(());
			}
		};

		if self.current.load(Ordering::SeqCst) != self.generation {
			debug!(account = %self.account, "menu rebuilt while fetching, dropping value");
			return Ok(());
		}
		self.on_click.handle(ctx, RequestValue::Secret(secret)).await
	}
}
