// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Compiled menu nodes and the values handed to click handlers.

use keyfill_common_secret::SecretString;
use serde_json::Value;

/// One titled element of a compiled menu tree.
#[derive(Debug, Clone, PartialEq)]
pub struct MenuEntry {
	pub title: String,
	pub node: MenuNode,
}

#[derive(Debug, Clone, PartialEq)]
pub enum MenuNode {
	/// A plain string value.
	Literal(String),
	/// An object carrying a `_type` discriminator; `payload` is the whole object.
	TypedValue { tag: String, payload: Value },
	/// A value stored in the vault under this account identifier.
	SecretRef(String),
	Submenu(Vec<MenuEntry>),
}

impl MenuNode {
	pub fn is_leaf(&self) -> bool {
		!matches!(self, MenuNode::Submenu(_))
	}

	/// Short name of the variant, for logs and rendering.
	pub fn kind(&self) -> &'static str {
		match self {
			MenuNode::Literal(_) => "literal",
			MenuNode::TypedValue { .. } => "typed",
			MenuNode::SecretRef(_) => "secret",
			MenuNode::Submenu(_) => "submenu",
		}
	}
}

/// A fully resolved value delivered to a click callback.
///
/// Secret references never reach a callback: they arrive as [`RequestValue::Secret`].
#[derive(Debug, Clone, PartialEq)]
pub enum RequestValue {
	Literal(String),
	Typed { tag: String, payload: Value },
	Secret(SecretString),
}

impl RequestValue {
	/// The text this value stands for, when it has one.
	///
	/// Typed values have text only when the payload carries a string `value`.
	pub fn as_text(&self) -> Option<&str> {
		match self {
			RequestValue::Literal(value) => Some(value),
			RequestValue::Secret(secret) => Some(secret.expose()),
			RequestValue::Typed { payload, .. } => payload.get("value").and_then(Value::as_str),
		}
	}

	pub fn type_name(&self) -> &str {
		match self {
			RequestValue::Literal(_) => "literal",
			RequestValue::Typed { tag, .. } => tag,
			RequestValue::Secret(_) => "secret",
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use serde_json::json;

	#[test]
	fn text_of_each_value_kind() {
		assert_eq!(RequestValue::Literal("abc".into()).as_text(), Some("abc"));
		assert_eq!(RequestValue::Secret("pw".into()).as_text(), Some("pw"));

		let typed = RequestValue::Typed {
			tag: "literal".into(),
			payload: json!({"_type": "literal", "value": "x"}),
		};
		assert_eq!(typed.as_text(), Some("x"));

		let opaque = RequestValue::Typed {
			tag: "lorem".into(),
			payload: json!({"_type": "lorem", "words": 10}),
		};
		assert_eq!(opaque.as_text(), None);
		assert_eq!(opaque.type_name(), "lorem");
	}

	#[test]
	fn secret_value_debug_is_redacted() {
		let value = RequestValue::Secret("hunter2".into());
		assert!(!format!("{value:?}").contains("hunter2"));
	}
}
