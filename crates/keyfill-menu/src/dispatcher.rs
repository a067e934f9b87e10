// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Operational mode and click routing.
//!
//! `Inject` is the initial mode. Entering `Paste` asks the host for the
//! clipboard capabilities; a refusal puts the dispatcher back in `Inject`,
//! re-checks the `Inject value` choice and tells the user. Returning to
//! `Inject` releases the capabilities. `Copy` needs nothing.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::builder::{ClickContext, MenuBuilder, MenuId};
use crate::compiler::ValueHandler;
use crate::error::{MenuError, MenuResult};
use crate::host::{HostInterface, CLIPBOARD};
use crate::node::RequestValue;

/// Shown when the host refuses clipboard access.
pub const CLIPBOARD_DENIED_MESSAGE: &str = "Could not access clipboard";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Mode {
	#[default]
	Inject,
	Paste,
	Copy,
}

impl Mode {
	pub const ALL: [Mode; 3] = [Mode::Inject, Mode::Paste, Mode::Copy];

	/// Title of the radio choice selecting this mode.
	pub fn choice_title(self) -> &'static str {
		match self {
			Mode::Inject => "Inject value",
			Mode::Paste => "Simulate pasting",
			Mode::Copy => "Copy to clipboard",
		}
	}
}

impl fmt::Display for Mode {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Mode::Inject => f.write_str("inject"),
			Mode::Paste => f.write_str("paste"),
			Mode::Copy => f.write_str("copy"),
		}
	}
}

impl FromStr for Mode {
	type Err = MenuError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s.trim().to_ascii_lowercase().as_str() {
			"inject" | "injectvalue" => Ok(Mode::Inject),
			"paste" => Ok(Mode::Paste),
			"copy" => Ok(Mode::Copy),
			other => Err(MenuError::UnknownMode(other.to_string())),
		}
	}
}

struct ModeChoices {
	builder: Arc<dyn MenuBuilder>,
	ids: HashMap<Mode, MenuId>,
}

struct DispatchState {
	mode: Mode,
	clipboard_held: bool,
	choices: Option<ModeChoices>,
}

/// Tracks the current mode and routes resolved values to the host.
pub struct ModeDispatcher {
	host: Arc<dyn HostInterface>,
	state: Mutex<DispatchState>,
}

impl ModeDispatcher {
	pub fn new(host: Arc<dyn HostInterface>) -> Self {
		Self {
			host,
			state: Mutex::new(DispatchState {
				mode: Mode::default(),
				clipboard_held: false,
				choices: None,
			}),
		}
	}

	pub async fn mode(&self) -> Mode {
		self.state.lock().await.mode
	}

	/// Registers the radio choices that show the mode, replacing earlier ones.
	pub async fn attach_choices(&self, builder: Arc<dyn MenuBuilder>, ids: HashMap<Mode, MenuId>) {
		self.state.lock().await.choices = Some(ModeChoices { builder, ids });
	}

	/// Switches mode, failing with [`MenuError::CapabilityDenied`] when the
	/// host refuses the clipboard. A refusal leaves the mode unchanged.
	pub async fn switch_to(&self, mode: Mode) -> MenuResult<()> {
		let mut state = self.state.lock().await;
		let previous = state.mode;

		match mode {
			Mode::Inject => {
				if state.clipboard_held {
					self.host.remove_permissions(&CLIPBOARD).await;
					state.clipboard_held = false;
					debug!("released clipboard capabilities");
				}
			}
			Mode::Paste => {
				if previous == Mode::Paste {
					return Ok(());
				}
				if !self.host.request_permissions(&CLIPBOARD).await {
					return Err(MenuError::CapabilityDenied(
						"clipboardRead, clipboardWrite".to_string(),
					));
				}
				state.clipboard_held = true;
			}
			Mode::Copy => {}
		}

		state.mode = mode;
		if previous != mode {
			info!(from = %previous, to = %mode, "operational mode changed");
		}
		Ok(())
	}

	/// Switches mode on behalf of the user, handling a refused capability
	/// by reverting to `Inject` and telling the user. Returns the mode in effect.
	pub async fn select(&self, mode: Mode) -> MenuResult<Mode> {
		match self.switch_to(mode).await {
			Ok(()) => {
				self.show_checked(mode).await;
				Ok(mode)
			}
			Err(MenuError::CapabilityDenied(what)) => {
				warn!(requested = %mode, capabilities = %what, "capability denied, reverting to inject");
				self.host.show_message(CLIPBOARD_DENIED_MESSAGE).await;
				self.switch_to(Mode::Inject).await?;
				self.show_checked(Mode::Inject).await;
				Ok(Mode::Inject)
			}
			Err(err) => Err(err),
		}
	}

	async fn show_checked(&self, mode: Mode) {
		let target = {
			let state = self.state.lock().await;
			state.choices.as_ref().and_then(|choices| {
				choices
					.ids
					.get(&mode)
					.map(|id| (Arc::clone(&choices.builder), id.clone()))
			})
		};
		if let Some((builder, id)) = target {
			builder.select_choice(&id).await;
		}
	}

	/// Sends `value` to the handler for the current mode.
	pub async fn dispatch(&self, ctx: &ClickContext, value: &RequestValue) -> MenuResult<()> {
		let mode = self.mode().await;
		debug!(mode = %mode, tab = %ctx.tab, value_type = value.type_name(), "dispatching click");

		match mode {
			Mode::Inject => self.host.inject_value(ctx.tab, value).await,
			Mode::Paste => self.host.simulate_paste(ctx.tab, value).await,
			Mode::Copy => {
				let text = value
					.as_text()
					.ok_or_else(|| MenuError::NotText(value.type_name().to_string()))?;
				self.host.copy_to_clipboard(text).await
			}
		}
	}
}

#[async_trait]
impl ValueHandler for ModeDispatcher {
	async fn handle(&self, ctx: &ClickContext, value: RequestValue) -> MenuResult<()> {
		self.dispatch(ctx, &value).await
	}
}

impl fmt::Debug for ModeDispatcher {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("ModeDispatcher").finish_non_exhaustive()
	}
}
