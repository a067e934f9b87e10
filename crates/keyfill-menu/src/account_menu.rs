// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! The "Test Accounts" menu built from synchronized account groups.

use std::sync::Arc;

use async_trait::async_trait;
use keyfill_credentials::{OptionsStore, UNGROUPED};
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::builder::{ClickContext, ClickHandler, MenuBuilder, MenuId, TabId};
use crate::compiler::CredentialResolver;
use crate::error::MenuResult;
use crate::host::HostInterface;

pub const ACCOUNTS_TITLE: &str = "Test Accounts";

/// Resolves the password for `account` and asks the host to log in with it.
pub async fn fill_credentials(
	resolver: &dyn CredentialResolver,
	host: &dyn HostInterface,
	tab: TabId,
	account: &str,
) -> MenuResult<()> {
	let password = resolver.resolve(account).await?;
	host.fill_credentials(tab, account, &password).await
}

pub struct AccountMenu {
	options: Arc<dyn OptionsStore>,
	builder: Arc<dyn MenuBuilder>,
	host: Arc<dyn HostInterface>,
	resolver: Arc<dyn CredentialResolver>,
	root: Mutex<Option<MenuId>>,
}

impl AccountMenu {
	pub fn new(
		options: Arc<dyn OptionsStore>,
		builder: Arc<dyn MenuBuilder>,
		host: Arc<dyn HostInterface>,
		resolver: Arc<dyn CredentialResolver>,
	) -> Self {
		Self {
			options,
			builder,
			host,
			resolver,
			root: Mutex::new(None),
		}
	}

	pub async fn init(&self) -> MenuResult<Option<MenuId>> {
		self.rebuild().await
	}

	pub fn watch(self: Arc<Self>) -> JoinHandle<()> {
		let mut changes = self.options.subscribe();
		tokio::spawn(async move {
			while changes.changed().await.is_ok() {
				if let Err(e) = self.rebuild().await {
					warn!(error = %e, "failed to rebuild account menu");
				}
			}
		})
	}

	/// Replaces the account menu. Returns `None` when there are no accounts.
	pub async fn rebuild(&self) -> MenuResult<Option<MenuId>> {
		let options = self.options.load().await?;

		let mut root_slot = self.root.lock().await;
		if let Some(old) = root_slot.take() {
			self.builder.remove(&old).await;
		}

		let accounts = match options.accounts {
			Some(accounts) if !accounts.is_empty() => accounts,
			_ => {
				debug!("no test accounts configured");
				return Ok(None);
			}
		};

		let root = self.builder.root_menu(ACCOUNTS_TITLE).await;
		*root_slot = Some(root.clone());

		let mut count = 0;
		for (group, members) in accounts.iter() {
			if members.is_empty() {
				continue;
			}
			let parent = if group == UNGROUPED {
				root.clone()
			} else {
				self.builder.sub_menu(group, &root).await
			};

			for account in members {
				let handler = Arc::new(AccountLeaf {
					account: account.clone(),
					resolver: Arc::clone(&self.resolver),
					host: Arc::clone(&self.host),
				});
				self.builder.menu_item(account, &parent, handler).await;
				count += 1;
			}
		}

		if options.debug_logging {
			info!(accounts = count, "account menu built");
		} else {
			debug!(accounts = count, "account menu built");
		}
		Ok(Some(root))
	}
}

struct AccountLeaf {
	account: String,
	resolver: Arc<dyn CredentialResolver>,
	host: Arc<dyn HostInterface>,
}

#[async_trait]
impl ClickHandler for AccountLeaf {
	async fn on_click(&self, ctx: &ClickContext) -> MenuResult<()> {
		match fill_credentials(self.resolver.as_ref(), self.host.as_ref(), ctx.tab, &self.account).await {
			Ok(()) => Ok(()),
			Err(err) => {
				error!(account = %self.account, error = %err, "failed to fill credentials");
				self.host
					.show_message(&format!("Failed to fill credentials for {}: {err}", self.account))
					.await;
				Ok(())
			}
		}
	}
}
