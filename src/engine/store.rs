use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument};

use crate::clock::{Clock, Instant, SystemClock};
use crate::engine::queue::FileQueue;

/// Result of an admission attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Admission {
	pub position: usize,
	pub queue_length: usize,
	pub acquired: bool,
}

#[derive(Debug, Clone)]
pub struct LockInfo {
	pub session: String,
	pub file: String,
	pub acquired_at: Instant,
}

#[derive(Debug, Clone)]
pub struct QueueInfo {
	pub file: String,
	pub holder: Option<String>,
	pub acquired_at: Option<Instant>,
	pub queue_length: usize,
	pub waiters: Vec<String>,
}

type SharedQueue = Arc<Mutex<FileQueue>>;

/// The process-wide registry mapping key -> FileQueue.
///
/// The outer `DashMap` gives atomic get-or-create/remove across keys; each
/// entry's `tokio::sync::Mutex` is the per-queue "exclusion token" guarding
/// that key's FIFO state.
pub struct LockStore {
	queues: DashMap<String, SharedQueue>,
	ttl: Duration,
	clock: Arc<dyn Clock>,
	shutdown: CancellationToken,
}

impl LockStore {
	pub fn new(ttl: Duration) -> Arc<Self> {
		Self::with_clock(ttl, Arc::new(SystemClock))
	}

	pub fn with_clock(ttl: Duration, clock: Arc<dyn Clock>) -> Arc<Self> {
		Arc::new(Self { queues: DashMap::new(), ttl, clock, shutdown: CancellationToken::new() })
	}

	pub fn shutdown_token(&self) -> CancellationToken {
		self.shutdown.clone()
	}

	fn get_or_create(&self, key: &str) -> SharedQueue {
		self.queues.entry(key.to_string()).or_insert_with(|| Arc::new(Mutex::new(FileQueue::new()))).value().clone()
	}

	/// Whether `queue` is still the Arc registered for `key` in the map.
	///
	/// A queue can be emptied and removed from the map by a holder of its
	/// token while a second caller has already cloned the same Arc out of
	/// `get_or_create` and is waiting on that token. Once the second caller
	/// acquires the token, the entry may be gone (or replaced by a fresh
	/// queue created by a third caller); checked under the token, this tells
	/// an acquirer it must retry rather than adopt an orphaned queue.
	fn is_current(&self, key: &str, queue: &SharedQueue) -> bool {
		self.queues.get(key).is_some_and(|e| Arc::ptr_eq(e.value(), queue))
	}

	fn now(&self) -> Instant {
		self.clock.now()
	}

	fn ttl_millis(&self) -> i64 {
		self.ttl.as_millis() as i64
	}

	/// Admits `session` into `key`'s queue, acquiring immediately if the
	/// queue is empty or the session is already the holder.
	#[instrument(name = "enqueue_or_acquire", skip(self), fields(file = %key, session = %session))]
	pub async fn enqueue_or_acquire(&self, key: &str, session: &str) -> Admission {
		loop {
			let queue = self.get_or_create(key);
			let mut guard = queue.lock().await;

			// The queue may have been emptied and removed from the map by
			// another caller between `get_or_create` and acquiring the token
			// above; adopting it here would let two distinct `FileQueue`s
			// exist for the same key. Retry against whatever is current.
			if !self.is_current(key, &queue) {
				continue;
			}

			let existing = guard.position(session);
			if existing > 0 {
				return Admission { position: existing, queue_length: guard.count(), acquired: existing == 1 };
			}

			if guard.count() > 0 {
				let now = self.now();
				if let Some(acquired_at) = guard.acquired_at() {
					if now - acquired_at > self.ttl_millis() {
						debug!("evicting expired holder before admission");
						guard.dequeue(now);
						guard.notify_all();
					}
				}
			}

			let now = self.now();
			guard.enqueue(session, now);
			let position = guard.count();
			let acquired = position == 1;
			if acquired {
				info!("session acquired lock immediately");
			} else {
				debug!(position, "session queued");
			}
			return Admission { position, queue_length: guard.count(), acquired };
		}
	}

	/// Releases `key` if `session` currently holds it. Returns whether a
	/// release happened.
	#[instrument(name = "try_release", skip(self), fields(file = %key, session = %session))]
	pub async fn try_release(&self, key: &str, session: &str) -> bool {
		let Some(queue) = self.queues.get(key).map(|e| e.value().clone()) else {
			return false;
		};

		let mut guard = queue.lock().await;
		if guard.holder() != Some(session) {
			return false;
		}

		guard.dequeue(self.now());
		guard.notify_all();
		// Removal happens while the token is still held, so no other caller
		// can clone this Arc out of the map and adopt it as an orphan.
		if guard.is_empty() {
			self.queues.remove(key);
		}
		info!("session released lock");
		true
	}

	/// Releases every lock held by `session` and drops it from every queue
	/// it is waiting in. Returns the number of locks actually released.
	#[instrument(name = "release_all", skip(self), fields(session = %session))]
	pub async fn release_all(&self, session: &str) -> usize {
		let keys: Vec<String> = self.queues.iter().map(|e| e.key().clone()).collect();
		let mut released = 0usize;

		for key in keys {
			let Some(queue) = self.queues.get(&key).map(|e| e.value().clone()) else {
				continue;
			};
			let mut guard = queue.lock().await;
			if guard.holder() == Some(session) {
				guard.dequeue(self.now());
				guard.notify_all();
				released += 1;
			} else {
				// Removing a non-head waiter does not notify: other waiters'
				// positions are unaffected from their own point of view, and
				// they will simply re-check on their next wakeup.
				guard.remove_waiter(session);
			}
			// Removal happens while the token is still held, so no other
			// caller can clone this Arc out of the map and adopt it as an
			// orphan.
			if guard.is_empty() {
				self.queues.remove(&key);
			}
		}

		info!(released, "released all locks for session");
		released
	}

	#[instrument(name = "get_holder", skip(self), fields(file = %key))]
	pub async fn get_holder(&self, key: &str) -> Option<String> {
		let queue = self.queues.get(key)?.value().clone();
		let guard = queue.lock().await;
		guard.holder().map(str::to_string)
	}

	/// 1-indexed position of `session` in `key`'s queue; 0 if absent or the
	/// queue doesn't exist.
	pub async fn position(&self, key: &str, session: &str) -> usize {
		let Some(queue) = self.queues.get(key).map(|e| e.value().clone()) else {
			return 0;
		};
		let guard = queue.lock().await;
		guard.position(session)
	}

	pub async fn get_queue_info(&self, key: &str) -> Option<QueueInfo> {
		let queue = self.queues.get(key)?.value().clone();
		let guard = queue.lock().await;
		if guard.is_empty() {
			return None;
		}
		Some(QueueInfo {
			file: key.to_string(),
			holder: guard.holder().map(str::to_string),
			acquired_at: guard.acquired_at(),
			queue_length: guard.count(),
			waiters: guard.waiters(),
		})
	}

	pub async fn get_all_locks(&self) -> Vec<LockInfo> {
		let keys: Vec<String> = self.queues.iter().map(|e| e.key().clone()).collect();
		let mut locks = Vec::with_capacity(keys.len());
		for key in keys {
			let Some(queue) = self.queues.get(&key).map(|e| e.value().clone()) else {
				continue;
			};
			let guard = queue.lock().await;
			if let (Some(session), Some(acquired_at)) = (guard.holder(), guard.acquired_at()) {
				locks.push(LockInfo { session: session.to_string(), file: key, acquired_at });
			}
		}
		locks
	}

	pub async fn get_all_queues(&self) -> Vec<QueueInfo> {
		let keys: Vec<String> = self.queues.iter().map(|e| e.key().clone()).collect();
		let mut queues = Vec::with_capacity(keys.len());
		for key in keys {
			if let Some(info) = self.get_queue_info(&key).await {
				queues.push(info);
			}
		}
		queues
	}

	/// Blocks until `session` is promoted to holder, is no longer in the
	/// queue, or `deadline` elapses.
	#[instrument(name = "wait_for_turn", skip(self, deadline), fields(file = %key, session = %session))]
	pub async fn wait_for_turn(&self, key: &str, session: &str, deadline: tokio::time::Instant) -> bool {
		loop {
			let Some(queue) = self.queues.get(key).map(|e| e.value().clone()) else {
				return false;
			};

			let guard = queue.lock().await;
			match guard.position(session) {
				0 => return false,
				1 => return true,
				_ => {}
			}

			let notified = guard.notify_handle().notified();
			tokio::pin!(notified);
			notified.as_mut().enable();
			drop(guard);

			let tick = tokio::time::sleep(Duration::from_secs(5));
			tokio::select! {
				() = notified => {}
				() = tick => {}
				() = tokio::time::sleep_until(deadline) => return false,
				() = self.shutdown.cancelled() => return false,
			}
		}
	}

	/// Runs the periodic TTL sweep until the store's shutdown token fires.
	pub async fn run_sweeper(self: Arc<Self>, period: Duration) {
		let mut ticker = tokio::time::interval(period);
		ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
		loop {
			tokio::select! {
				_ = ticker.tick() => self.sweep_once().await,
				() = self.shutdown.cancelled() => {
					debug!("sweeper stopping");
					return;
				}
			}
		}
	}

	async fn sweep_once(&self) {
		let keys: Vec<String> = self.queues.iter().map(|e| e.key().clone()).collect();
		let mut evicted = 0usize;
		for key in &keys {
			let Some(queue) = self.queues.get(key).map(|e| e.value().clone()) else {
				continue;
			};
			let mut guard = queue.lock().await;
			let now = self.now();
			let should_evict = match guard.acquired_at() {
				Some(acquired_at) if guard.count() > 0 => now - acquired_at > self.ttl_millis(),
				_ => false,
			};
			if should_evict {
				guard.dequeue(now);
				guard.notify_all();
				evicted += 1;
			}
			// Removal happens while the token is still held, so no other
			// caller can clone this Arc out of the map and adopt it as an
			// orphan.
			if guard.is_empty() {
				self.queues.remove(key);
			}
		}
		debug!(keys = keys.len(), evicted, "sweep tick complete");
	}

	/// Drains all in-memory state at shutdown. Nothing is persisted, so this
	/// is simply releasing every queue.
	pub fn drain(&self) {
		self.queues.clear();
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::clock::FakeClock;
	use std::time::Duration as StdDuration;

	fn store_with_clock() -> (Arc<LockStore>, FakeClock) {
		let clock = FakeClock::new();
		let store = LockStore::with_clock(StdDuration::from_secs(300), Arc::new(clock.clone()));
		(store, clock)
	}

	#[tokio::test]
	async fn immediate_acquisition() {
		let (store, _clock) = store_with_clock();
		let admission = store.enqueue_or_acquire("/f", "A").await;
		assert_eq!(admission, Admission { position: 1, queue_length: 1, acquired: true });
		assert_eq!(store.get_holder("/f").await, Some("A".to_string()));
	}

	#[tokio::test]
	async fn second_session_queues() {
		let (store, _clock) = store_with_clock();
		store.enqueue_or_acquire("/f", "A").await;
		let admission = store.enqueue_or_acquire("/f", "B").await;
		assert_eq!(admission, Admission { position: 2, queue_length: 2, acquired: false });

		let info = store.get_queue_info("/f").await.unwrap();
		assert_eq!(info.holder, Some("A".to_string()));
		assert_eq!(info.waiters, vec!["B".to_string()]);
	}

	#[tokio::test]
	async fn admission_is_idempotent_for_same_session() {
		let (store, _clock) = store_with_clock();
		let first = store.enqueue_or_acquire("/f", "A").await;
		let second = store.enqueue_or_acquire("/f", "A").await;
		assert_eq!(first, second);
	}

	#[tokio::test]
	async fn release_promotes_next_waiter() {
		let (store, _clock) = store_with_clock();
		store.enqueue_or_acquire("/f", "A").await;
		store.enqueue_or_acquire("/f", "B").await;

		assert!(store.try_release("/f", "A").await);
		assert_eq!(store.get_holder("/f").await, Some("B".to_string()));
		assert_eq!(store.position("/f", "B").await, 1);
	}

	#[tokio::test]
	async fn non_holder_release_is_rejected() {
		let (store, _clock) = store_with_clock();
		store.enqueue_or_acquire("/f", "A").await;
		store.enqueue_or_acquire("/f", "B").await;

		assert!(!store.try_release("/f", "B").await);
		assert_eq!(store.get_holder("/f").await, Some("A".to_string()));
	}

	#[tokio::test]
	async fn release_all_covers_holder_and_waiter_roles() {
		let (store, _clock) = store_with_clock();
		store.enqueue_or_acquire("/a", "A").await;
		store.enqueue_or_acquire("/b", "A").await;
		store.enqueue_or_acquire("/b", "B").await;

		let released = store.release_all("A").await;
		assert_eq!(released, 2);
		assert_eq!(store.get_holder("/a").await, None);
		assert_eq!(store.get_holder("/b").await, Some("B".to_string()));
		assert_eq!(store.position("/b", "B").await, 1);
	}

	#[tokio::test]
	async fn expired_holder_is_evicted_on_next_admission() {
		let (store, clock) = store_with_clock();
		store.enqueue_or_acquire("/f", "A").await;
		clock.advance(StdDuration::from_secs(301));

		let admission = store.enqueue_or_acquire("/f", "B").await;
		assert!(admission.acquired);
		assert_eq!(store.get_holder("/f").await, Some("B".to_string()));
	}

	#[tokio::test]
	async fn sweep_evicts_expired_holder_without_new_admission() {
		let (store, clock) = store_with_clock();
		store.enqueue_or_acquire("/f", "A").await;
		store.enqueue_or_acquire("/f", "B").await;
		clock.advance(StdDuration::from_secs(301));

		store.sweep_once().await;
		assert_eq!(store.get_holder("/f").await, Some("B".to_string()));
	}

	#[tokio::test]
	async fn wait_for_turn_resolves_on_release() {
		let (store, _clock) = store_with_clock();
		store.enqueue_or_acquire("/f", "A").await;
		store.enqueue_or_acquire("/f", "B").await;

		let waiter_store = store.clone();
		let waiter = tokio::spawn(async move {
			let deadline = tokio::time::Instant::now() + StdDuration::from_secs(5);
			waiter_store.wait_for_turn("/f", "B", deadline).await
		});

		tokio::task::yield_now().await;
		assert!(store.try_release("/f", "A").await);

		assert!(waiter.await.unwrap());
	}

	#[tokio::test(start_paused = true)]
	async fn wait_for_turn_times_out() {
		let (store, _clock) = store_with_clock();
		store.enqueue_or_acquire("/f", "A").await;
		store.enqueue_or_acquire("/f", "B").await;

		let deadline = tokio::time::Instant::now() + StdDuration::from_millis(50);
		let acquired = store.wait_for_turn("/f", "B", deadline).await;
		assert!(!acquired);
		assert_eq!(store.position("/f", "B").await, 2);
	}

	#[tokio::test]
	async fn unknown_key_introspection_is_empty() {
		let (store, _clock) = store_with_clock();
		assert_eq!(store.get_holder("/missing").await, None);
		assert_eq!(store.get_queue_info("/missing").await.is_none(), true);
		assert_eq!(store.position("/missing", "A").await, 0);
	}
}
