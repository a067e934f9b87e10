// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Time source for cache expiry.

use std::sync::atomic::{AtomicI64, Ordering};

use chrono::{DateTime, Duration, Utc};

pub trait Clock: Send + Sync + std::fmt::Debug {
	fn now(&self) -> DateTime<Utc>;
}

/// Wall clock.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
	fn now(&self) -> DateTime<Utc> {
		Utc::now()
	}
}

/// A clock that only moves when told to, with millisecond resolution.
#[derive(Debug)]
pub struct ManualClock {
	millis: AtomicI64,
}

impl ManualClock {
	pub fn new(start: DateTime<Utc>) -> Self {
		Self {
			millis: AtomicI64::new(start.timestamp_millis()),
		}
	}

	pub fn advance(&self, by: Duration) {
		self.millis.fetch_add(by.num_milliseconds(), Ordering::SeqCst);
	}

	pub fn set(&self, to: DateTime<Utc>) {
		self.millis.store(to.timestamp_millis(), Ordering::SeqCst);
	}
}

impl Default for ManualClock {
	fn default() -> Self {
		Self::new(DateTime::<Utc>::UNIX_EPOCH)
	}
}

impl Clock for ManualClock {
	fn now(&self) -> DateTime<Utc> {
		DateTime::from_timestamp_millis(self.millis.load(Ordering::SeqCst)).unwrap_or_default()
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn manual_clock_advances_in_millis() {
		let start = DateTime::from_timestamp_millis(1_700_000_000_000).unwrap();
		let clock = ManualClock::new(start);
		assert_eq!(clock.now(), start);

		clock.advance(Duration::milliseconds(299_999));
		assert_eq!((clock.now() - start).num_milliseconds(), 299_999);

		clock.set(start);
		assert_eq!(clock.now(), start);
	}
}
