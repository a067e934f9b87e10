// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Menu error types.

use keyfill_credentials::{CredentialError, OptionsError};

#[derive(Debug, thiserror::Error)]
pub enum MenuError {
	/// The host refused a capability the requested mode needs.
	#[error("capability denied: {0}")]
	CapabilityDenied(String),

	#[error(transparent)]
	Credential(#[from] CredentialError),

	#[error("options error: {0}")]
	Options(#[from] OptionsError),

	/// The host failed to perform a side effect.
	#[error("host error: {0}")]
	Host(String),

	/// Copy mode was asked to copy a value with no text form.
	#[error("value of type {0:?} has no text to copy")]
	NotText(String),

	#[error("unknown mode: {0}")]
	UnknownMode(String),

	#[error("no menu item with id {0}")]
	UnknownItem(String),
}

pub type MenuResult<T> = Result<T, MenuError>;
