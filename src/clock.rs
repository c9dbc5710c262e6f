use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// A single instant, expressed as milliseconds since the Unix epoch.
///
/// Using a plain integer (rather than `Instant`/`SystemTime`) keeps the engine
/// free of any particular clock's type and lets tests advance time without a
/// real sleep.
pub type Instant = i64;

pub trait Clock: Send + Sync + 'static {
	fn now(&self) -> Instant;
}

#[derive(Clone, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
	fn now(&self) -> Instant {
		SystemTime::now().duration_since(UNIX_EPOCH).expect("system clock before epoch").as_millis() as Instant
	}
}

/// Deterministic, manually-advanced clock for tests.
#[derive(Clone)]
pub struct FakeClock {
	millis: Arc<AtomicI64>,
}

impl FakeClock {
	pub fn new() -> Self {
		Self { millis: Arc::new(AtomicI64::new(0)) }
	}

	pub fn advance(&self, by: Duration) {
		self.millis.fetch_add(by.as_millis() as i64, Ordering::SeqCst);
	}

	pub fn set(&self, millis: Instant) {
		self.millis.store(millis, Ordering::SeqCst);
	}
}

impl Default for FakeClock {
	fn default() -> Self {
		Self::new()
	}
}

impl Clock for FakeClock {
	fn now(&self) -> Instant {
		self.millis.load(Ordering::SeqCst)
	}
}

/// Converts an engine [`Instant`] to an ISO-8601 UTC timestamp for HTTP responses.
pub fn to_rfc3339(instant: Instant) -> String {
	let secs = instant.div_euclid(1000);
	let nanos = (instant.rem_euclid(1000) * 1_000_000) as u32;
	chrono::DateTime::from_timestamp(secs, nanos).unwrap_or_default().to_rfc3339()
}
