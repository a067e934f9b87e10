// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Menus for keyfill.
//!
//! A menu configuration tree (JSON) is compiled into [`MenuEntry`] nodes,
//! mounted on a [`MenuBuilder`], and every leaf click is routed through the
//! [`ModeDispatcher`] to the [`HostInterface`]. Secret-backed leaves are
//! resolved through a [`CredentialResolver`] at click time, so callbacks only
//! ever see resolved values.

mod account_menu;
mod builder;
mod compiler;
mod context_menu;
mod dispatcher;
mod error;
mod host;
mod node;

pub use account_menu::{fill_credentials, AccountMenu, ACCOUNTS_TITLE};
pub use builder::{
	ClickContext, ClickHandler, ItemKind, MemoryMenuBuilder, MenuBuilder, MenuId, TabId,
};
pub use compiler::{
	compile, CredentialResolver, MenuCompiler, ValueHandler, SECRET_KEY, TYPE_KEY,
};
pub use context_menu::{
	ContextMenu, HELP_TITLE, HELP_URL, MODE_MENU_TITLE, ROOT_TITLE, SETTINGS_TITLE,
};
pub use dispatcher::{Mode, ModeDispatcher, CLIPBOARD_DENIED_MESSAGE};
pub use error::{MenuError, MenuResult};
pub use host::{Capability, HostInterface, CLIPBOARD};
pub use node::{MenuEntry, MenuNode, RequestValue};
