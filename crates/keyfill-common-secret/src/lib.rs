// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Redacting wrapper for credential material handled by keyfill.
//!
//! Three kinds of values flow through keyfill that must never reach a log
//! line, a config dump or a panic message: account passwords fetched from
//! the vault, the OAuth client secret used for the client-credentials grant,
//! and the bearer tokens that grant returns. All of them are carried as
//! [`SecretString`].
//!
//! - `Debug` and `Display` print `[REDACTED]`
//! - `Serialize` writes `"[REDACTED]"`; persisting the clear value requires
//!   opting in through [`exposed`]
//! - memory is zeroized on drop
//! - reading the value requires an explicit [`Secret::expose`]
//!
//! ```
//! use keyfill_common_secret::SecretString;
//!
//! let password = SecretString::new("hunter2".to_string());
//! assert_eq!(format!("{password}"), "[REDACTED]");
//! assert_eq!(password.expose(), "hunter2");
//! ```

use std::fmt;
use zeroize::Zeroize;

/// Placeholder written wherever a secret would otherwise be rendered.
pub const REDACTED: &str = "[REDACTED]";

/// A value that must not leak through formatting or serialization.
#[derive(Zeroize)]
#[zeroize(drop)]
pub struct Secret<T>
where
	T: Zeroize,
{
	inner: T,
}

/// The form every password, client secret and token takes in keyfill.
pub type SecretString = Secret<String>;

impl<T> Secret<T>
where
	T: Zeroize,
{
	pub fn new(inner: T) -> Self {
		Self { inner }
	}

	/// Explicitly access the inner value.
	///
	/// Every call site is a place where the clear value leaves the wrapper,
	/// so keep them few and obvious.
	pub fn expose(&self) -> &T {
		&self.inner
	}

	/// Returns a copy of the inner value; the wrapper itself is still zeroized.
	pub fn into_inner(self) -> T
	where
		T: Clone,
	{
		self.inner.clone()
	}
}

impl SecretString {
	pub fn is_empty(&self) -> bool {
		self.inner.is_empty()
	}
}

impl From<String> for SecretString {
	fn from(value: String) -> Self {
		Self::new(value)
	}
}

impl From<&str> for SecretString {
	fn from(value: &str) -> Self {
		Self::new(value.to_string())
	}
}

impl<T> Clone for Secret<T>
where
	T: Zeroize + Clone,
{
	fn clone(&self) -> Self {
		Self {
			inner: self.inner.clone(),
		}
	}
}

impl<T> fmt::Debug for Secret<T>
where
	T: Zeroize,
{
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_tuple("Secret").field(&REDACTED).finish()
	}
}

impl<T> fmt::Display for Secret<T>
where
	T: Zeroize,
{
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(REDACTED)
	}
}

impl<T> PartialEq for Secret<T>
where
	T: Zeroize + PartialEq,
{
	fn eq(&self, other: &Self) -> bool {
		self.inner == other.inner
	}
}

impl<T> Eq for Secret<T> where T: Zeroize + Eq {}

#[cfg(feature = "serde")]
mod serde_impl {
	use super::{Secret, REDACTED};
	use serde::{Deserialize, Deserializer, Serialize, Serializer};
	use zeroize::Zeroize;

	impl<T> Serialize for Secret<T>
	where
		T: Serialize + Zeroize,
	{
		fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
		where
			S: Serializer,
		{
			serializer.serialize_str(REDACTED)
		}
	}

	impl<'de, T> Deserialize<'de> for Secret<T>
	where
		T: Deserialize<'de> + Zeroize,
	{
		fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
		where
			D: Deserializer<'de>,
		{
			T::deserialize(deserializer).map(Secret::new)
		}
	}
}

/// Opt-in serializers that write the clear value.
///
/// Only the options store uses these, for the fields it must persist
/// (`clientSecret`, `presharedToken`):
///
/// ```
/// use keyfill_common_secret::SecretString;
///
/// #[derive(serde::Serialize)]
/// struct Stored {
/// 	#[serde(serialize_with = "keyfill_common_secret::exposed::option")]
/// 	client_secret: Option<SecretString>,
/// }
///
/// let stored = Stored { client_secret: Some("s3cret".into()) };
/// assert_eq!(serde_json::to_string(&stored).unwrap(), r#"{"client_secret":"s3cret"}"#);
/// ```
#[cfg(feature = "serde")]
pub mod exposed {
	use super::SecretString;
	use serde::Serializer;

	pub fn option<S>(value: &Option<SecretString>, serializer: S) -> Result<S::Ok, S::Error>
	where
		S: Serializer,
	{
		match value {
			Some(secret) => serializer.serialize_some(secret.expose()),
			None => serializer.serialize_none(),
		}
	}
}
