// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Mapping between account identifiers and vault-legal secret names.
//!
//! Vault secret names only allow alphanumerics and `-`, so the three
//! characters that show up in logins are spelled with dashes:
//!
//! | identifier | secret name |
//! |---|---|
//! | `_` | `---` |
//! | `@` | `--` |
//! | `.` | `-` |
//!
//! Decoding reads each run of dashes greedily: a run of `n` dashes becomes
//! `n / 3` underscores followed by `@` when two dashes remain or `.` when
//! one remains.
//!
//! The mapping is not injective. An identifier that already contains `-`,
//! or that places reserved characters next to each other so their dash runs
//! merge (`a@.b` encodes to `a---b`, which decodes to `a_b`), does not
//! survive the round trip. Such identifiers are still encoded as-is;
//! [`encode_checked`] reports them as a [`DecodeAmbiguity`] so the caller can
//! warn instead of silently listing the account under a different name.

use thiserror::Error;

/// Non-fatal warning: the encoded name will not decode back to the identifier.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("identifier {identifier:?} encodes to {secret_name:?}, which decodes as {decoded:?}")]
pub struct DecodeAmbiguity {
	pub identifier: String,
	pub secret_name: String,
	pub decoded: String,
}

/// Encodes an account identifier into a secret name.
pub fn encode(identifier: &str) -> String {
	let mut name = String::with_capacity(identifier.len() * 2);
	for c in identifier.chars() {
		match c {
			'_' => name.push_str("---"),
			'@' => name.push_str("--"),
			'.' => name.push('-'),
			other => name.push(other),
		}
	}
	name
}

/// Decodes a secret name back into an account identifier.
pub fn decode(secret_name: &str) -> String {
	let mut identifier = String::with_capacity(secret_name.len());
	let mut run = 0usize;
	for c in secret_name.chars() {
		if c == '-' {
			run += 1;
			continue;
		}
		flush_dashes(&mut identifier, run);
		run = 0;
		identifier.push(c);
	}
	flush_dashes(&mut identifier, run);
	identifier
}

fn flush_dashes(out: &mut String, run: usize) {
	for _ in 0..run / 3 {
		out.push('_');
	}
	match run % 3 {
		2 => out.push('@'),
		1 => out.push('.'),
		_ => {}
	}
}

/// Encodes `identifier` and reports whether the result round-trips.
pub fn encode_checked(identifier: &str) -> (String, Option<DecodeAmbiguity>) {
	let secret_name = encode(identifier);
	let decoded = decode(&secret_name);
	if decoded == identifier {
		(secret_name, None)
	} else {
		let warning = DecodeAmbiguity {
			identifier: identifier.to_string(),
			secret_name: secret_name.clone(),
			decoded,
		};
		(secret_name, Some(warning))
	}
}
