// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Side effects performed by the embedding host.

use std::fmt;

use async_trait::async_trait;
use keyfill_common_secret::SecretString;

use crate::builder::TabId;
use crate::error::MenuResult;
use crate::node::RequestValue;

/// A permission the host may grant or refuse.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Capability {
	ClipboardRead,
	ClipboardWrite,
}

impl fmt::Display for Capability {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Capability::ClipboardRead => f.write_str("clipboardRead"),
			Capability::ClipboardWrite => f.write_str("clipboardWrite"),
		}
	}
}

/// Capabilities simulated pasting needs.
pub const CLIPBOARD: [Capability; 2] = [Capability::ClipboardRead, Capability::ClipboardWrite];

#[async_trait]
pub trait HostInterface: Send + Sync {
	/// Asks for `capabilities`; returns whether all were granted.
	async fn request_permissions(&self, capabilities: &[Capability]) -> bool;

	async fn remove_permissions(&self, capabilities: &[Capability]);

	/// Shows a user-facing message.
	async fn show_message(&self, text: &str);

	/// Puts `value` into the focused field of `tab`.
	async fn inject_value(&self, tab: TabId, value: &RequestValue) -> MenuResult<()>;

	/// Types `value` into `tab` through the clipboard and a paste event.
	async fn simulate_paste(&self, tab: TabId, value: &RequestValue) -> MenuResult<()>;

	async fn copy_to_clipboard(&self, text: &str) -> MenuResult<()>;

	/// Fills the login form of `tab` and submits it.
	async fn fill_credentials(&self, tab: TabId, username: &str, password: &SecretString)
		-> MenuResult<()>;

	async fn open_settings(&self);

	async fn open_url(&self, url: &str);
}
