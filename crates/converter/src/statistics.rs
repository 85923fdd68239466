//! Utilization counters.
//!
//! Counting is gated on a single relaxed flag load, so a disabled collector costs one
//! branch per event.

use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Event {
	/// No conversion was needed (null input or value already of the target type).
	Noop,
	/// The dispatcher had to look for a converter.
	Attempt,
	Hit,
	Miss,
	Failure,
}

/// Counters for conversion outcomes.
#[derive(Debug, Default)]
pub struct Statistics {
	enabled: AtomicBool,
	noop: AtomicU64,
	attempt: AtomicU64,
	hit: AtomicU64,
	miss: AtomicU64,
	failure: AtomicU64,
}

impl Statistics {
	pub(crate) fn new(enabled: bool) -> Self {
		Self {
			enabled: AtomicBool::new(enabled),
			..Self::default()
		}
	}

	#[inline]
	pub fn is_enabled(&self) -> bool {
		self.enabled.load(Ordering::Relaxed)
	}

	pub fn set_enabled(&self, enabled: bool) {
		self.enabled.store(enabled, Ordering::Relaxed);
	}

	#[inline]
	pub(crate) fn record(&self, event: Event) {
		if self.is_enabled() {
			self.counter(event).fetch_add(1, Ordering::Relaxed);
		}
	}

	fn counter(&self, event: Event) -> &AtomicU64 {
		match event {
			Event::Noop => &self.noop,
			Event::Attempt => &self.attempt,
			Event::Hit => &self.hit,
			Event::Miss => &self.miss,
			Event::Failure => &self.failure,
		}
	}

	pub fn snapshot(&self) -> StatisticsSnapshot {
		StatisticsSnapshot {
			noop: self.noop.load(Ordering::Relaxed),
			attempt: self.attempt.load(Ordering::Relaxed),
			hit: self.hit.load(Ordering::Relaxed),
			miss: self.miss.load(Ordering::Relaxed),
			failure: self.failure.load(Ordering::Relaxed),
		}
	}

	/// Zeroes every counter. The enabled flag is left untouched.
	pub fn reset(&self) {
		for counter in [&self.noop, &self.attempt, &self.hit, &self.miss, &self.failure] {
			counter.store(0, Ordering::Relaxed);
		}
	}
}

impl fmt::Display for Statistics {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		fmt::Display::fmt(&self.snapshot(), f)
	}
}

/// Point-in-time copy of the counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StatisticsSnapshot {
	pub noop: u64,
	pub attempt: u64,
	pub hit: u64,
	pub miss: u64,
	pub failure: u64,
}

impl fmt::Display for StatisticsSnapshot {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(
			f,
			"utilization[noop={}, attempts={}, hits={}, misses={}, failures={}]",
			self.noop, self.attempt, self.hit, self.miss, self.failure
		)
	}
}
