// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! The standard menu tree shipped with the CLI.

use std::path::Path;

use anyhow::{Context, Result};
use serde_json::Value;

/// Used when no `[menu] standard_config` file is configured.
pub const STANDARD_MENU: &str = r#"{
	"Names": {
		"Short": ["Al", "Bo", "Cy"],
		"Unicode": ["Émilie Ångström", "Søren Kierkegaard", "王秀英"],
		"With apostrophe": ["O'Brien", "D'Angelo"]
	},
	"Numbers": {
		"Zero": "0",
		"Negative": "-1",
		"Max 32-bit signed": "2147483647",
		"Max 32-bit signed + 1": "2147483648",
		"Scientific": "1e308"
	},
	"Whitespace": {
		"Leading and trailing": "  padded  ",
		"Non-breaking space": "\u00a0",
		"Tab": "\t"
	},
	"Strings": {
		"Empty": "",
		"Script tag": "<script>alert(1)</script>",
		"SQL quote": "' OR '1'='1",
		"Long word": {
			"_type": "repeat",
			"value": "aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa",
			"times": 1
		}
	},
	"Lorem ipsum": {
		"Sentence": {
			"_type": "lorem",
			"value": "Lorem ipsum dolor sit amet, consectetur adipiscing elit."
		},
		"Random paragraph": { "_type": "lorem", "paragraphs": 1 }
	}
}"#;

/// Loads the standard tree from `path`, or the built-in tree.
pub fn load(path: Option<&Path>) -> Result<Value> {
	match path {
		Some(path) => {
			let content = std::fs::read_to_string(path)
				.with_context(|| format!("failed to read standard menu {}", path.display()))?;
			serde_json::from_str(&content)
				.with_context(|| format!("failed to parse standard menu {}", path.display()))
		}
		None => serde_json::from_str(STANDARD_MENU).context("built-in standard menu is invalid"),
	}
}
