// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! The main context menu: value trees, mode choices and utility items.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use keyfill_credentials::OptionsStore;
use serde_json::{Map, Value};
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::builder::{ClickContext, ClickHandler, MenuBuilder, MenuId};
use crate::compiler::{compile, CredentialResolver, MenuCompiler, ValueHandler};
use crate::dispatcher::{Mode, ModeDispatcher};
use crate::error::MenuResult;
use crate::host::HostInterface;

pub const ROOT_TITLE: &str = "Keyfill";
pub const MODE_MENU_TITLE: &str = "Operational mode";
pub const SETTINGS_TITLE: &str = "Customise menus";
pub const HELP_TITLE: &str = "Help/Support";
pub const HELP_URL: &str = "https://bugmagnet.org/contributing.html";

pub struct ContextMenu {
	standard: Value,
	options: Arc<dyn OptionsStore>,
	builder: Arc<dyn MenuBuilder>,
	host: Arc<dyn HostInterface>,
	compiler: MenuCompiler,
	dispatcher: Arc<ModeDispatcher>,
	paste_supported: bool,
	root: Mutex<Option<MenuId>>,
}

impl ContextMenu {
	pub fn new(
		standard: Value,
		options: Arc<dyn OptionsStore>,
		builder: Arc<dyn MenuBuilder>,
		host: Arc<dyn HostInterface>,
		resolver: Arc<dyn CredentialResolver>,
		paste_supported: bool,
	) -> Self {
		Self {
			standard,
			compiler: MenuCompiler::new(resolver, Arc::clone(&host)),
			dispatcher: Arc::new(ModeDispatcher::new(Arc::clone(&host))),
			options,
			builder,
			host,
			paste_supported,
			root: Mutex::new(None),
		}
	}

	pub fn dispatcher(&self) -> &Arc<ModeDispatcher> {
		&self.dispatcher
	}

	pub fn compiler(&self) -> &MenuCompiler {
		&self.compiler
	}

	/// Builds the menu once.
	pub async fn init(&self) -> MenuResult<MenuId> {
		self.rebuild().await
	}

	/// Rebuilds after every options change until the store goes away.
	pub fn watch(self: Arc<Self>) -> JoinHandle<()> {
		let mut changes = self.options.subscribe();
		tokio::spawn(async move {
			while changes.changed().await.is_ok() {
				if let Err(e) = self.rebuild().await {
					warn!(error = %e, "failed to rebuild context menu");
				}
			}
			debug!("options store closed, context menu watch ended");
		})
	}

	/// Replaces the whole menu with one built from the current options.
	pub async fn rebuild(&self) -> MenuResult<MenuId> {
		let options = self.options.load().await?;
		let generation = self.compiler.begin_generation();
		let on_click: Arc<dyn ValueHandler> = self.dispatcher.clone();

		let mut root_slot = self.root.lock().await;
		if let Some(old) = root_slot.take() {
			self.builder.remove(&old).await;
		}

		let root = self.builder.root_menu(ROOT_TITLE).await;
		*root_slot = Some(root.clone());
		let mut items = 0;

		if !options.skip_standard {
			let entries = compile(&self.standard);
			items += self
				.compiler
				.mount(&entries, self.builder.as_ref(), &root, Arc::clone(&on_click))
				.await;
		}

		for menu in &options.additional_menus {
			let mut named = Map::new();
			named.insert(menu.name.clone(), menu.config.clone());
			let entries = compile(&Value::Object(named));
			items += self
				.compiler
				.mount(&entries, self.builder.as_ref(), &root, Arc::clone(&on_click))
				.await;
		}

		self.add_generic_menus(&root).await;

		if options.debug_logging {
			info!(generation, items, additional = options.additional_menus.len(), "context menu built");
		} else {
			debug!(generation, items, additional = options.additional_menus.len(), "context menu built");
		}
		Ok(root)
	}

	async fn add_generic_menus(&self, root: &MenuId) {
		self.builder.separator(root).await;

		if self.paste_supported {
			let mode_menu = self.builder.sub_menu(MODE_MENU_TITLE, root).await;
			let current = self.dispatcher.mode().await;
			let mut ids = HashMap::new();
			for mode in Mode::ALL {
				let handler = Arc::new(ModeChoice {
					mode,
					dispatcher: Arc::clone(&self.dispatcher),
				});
				let id = self
					.builder
					.choice(mode.choice_title(), &mode_menu, handler, mode == current)
					.await;
				ids.insert(mode, id);
			}
			self.dispatcher
				.attach_choices(Arc::clone(&self.builder), ids)
				.await;
		}

		self.builder
			.menu_item(
				SETTINGS_TITLE,
				root,
				Arc::new(OpenSettings {
					host: Arc::clone(&self.host),
				}),
			)
			.await;
		self.builder
			.menu_item(
				HELP_TITLE,
				root,
				Arc::new(OpenUrl {
					host: Arc::clone(&self.host),
					url: HELP_URL.to_string(),
				}),
			)
			.await;
	}
}

struct ModeChoice {
	mode: Mode,
	dispatcher: Arc<ModeDispatcher>,
}

#[async_trait]
impl ClickHandler for ModeChoice {
	async fn on_click(&self, _ctx: &ClickContext) -> MenuResult<()> {
		self.dispatcher.select(self.mode).await?;
		Ok(())
	}
}

struct OpenSettings {
	host: Arc<dyn HostInterface>,
}

#[async_trait]
impl ClickHandler for OpenSettings {
	async fn on_click(&self, _ctx: &ClickContext) -> MenuResult<()> {
		self.host.open_settings().await;
		Ok(())
	}
}

struct OpenUrl {
	host: Arc<dyn HostInterface>,
	url: String,
}

#[async_trait]
impl ClickHandler for OpenUrl {
	async fn on_click(&self, _ctx: &ClickContext) -> MenuResult<()> {
		self.host.open_url(&self.url).await;
		Ok(())
	}
}
