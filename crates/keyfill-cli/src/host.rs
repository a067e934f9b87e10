// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! A [`HostInterface`] that reports each action on a terminal.

use std::io::Write;
use std::path::PathBuf;
use std::sync::Mutex;

use async_trait::async_trait;
use keyfill_common_secret::SecretString;
use keyfill_menu::{Capability, HostInterface, MenuError, MenuResult, RequestValue, TabId};
use tracing::debug;

/// Prints what a browser host would do instead of doing it.
///
/// Values are printed in the clear on inject, paste and copy since that is
/// the output the user asked for. Fill never prints the password.
pub struct TerminalHost {
	out: Mutex<Box<dyn Write + Send>>,
	grant_clipboard: bool,
	options_path: PathBuf,
}

impl TerminalHost {
	pub fn new(grant_clipboard: bool, options_path: PathBuf) -> Self {
		Self::with_writer(Box::new(std::io::stdout()), grant_clipboard, options_path)
	}

	pub fn with_writer(
		out: Box<dyn Write + Send>,
		grant_clipboard: bool,
		options_path: PathBuf,
	) -> Self {
		Self {
			out: Mutex::new(out),
			grant_clipboard,
			options_path,
		}
	}

	fn line(&self, text: &str) -> MenuResult<()> {
		let mut out = self
			.out
			.lock()
			.map_err(|_| MenuError::Host("terminal writer poisoned".to_string()))?;
		writeln!(out, "{text}").map_err(|e| MenuError::Host(e.to_string()))
	}
}

fn describe(value: &RequestValue) -> String {
	match value.as_text() {
		Some(text) => text.to_string(),
		None => format!("<{}>", value.type_name()),
	}
}

#[async_trait]
impl HostInterface for TerminalHost {
	async fn request_permissions(&self, capabilities: &[Capability]) -> bool {
		debug!(?capabilities, granted = self.grant_clipboard, "permission request");
		self.grant_clipboard
	}

	async fn remove_permissions(&self, capabilities: &[Capability]) {
		debug!(?capabilities, "permissions released");
	}

	async fn show_message(&self, text: &str) {
		if self.line(&format!("message: {text}")).is_err() {
			eprintln!("message: {text}");
		}
	}

	async fn inject_value(&self, tab: TabId, value: &RequestValue) -> MenuResult<()> {
		self.line(&format!("inject [tab {}]: {}", tab.0, describe(value)))
	}

	async fn simulate_paste(&self, tab: TabId, value: &RequestValue) -> MenuResult<()> {
		self.line(&format!("paste [tab {}]: {}", tab.0, describe(value)))
	}

	async fn copy_to_clipboard(&self, text: &str) -> MenuResult<()> {
		self.line(&format!("copy: {text}"))
	}

	async fn fill_credentials(
		&self,
		tab: TabId,
		username: &str,
		password: &SecretString,
	) -> MenuResult<()> {
		self.line(&format!("fill [tab {}]: {username} / {password}", tab.0))
	}

	async fn open_settings(&self) {
		let text = format!("settings: {}", self.options_path.display());
		if self.line(&text).is_err() {
			eprintln!("{text}");
		}
	}

	async fn open_url(&self, url: &str) {
		let text = format!("open: {url}");
		if self.line(&text).is_err() {
			eprintln!("{text}");
		}
	}
}
