use std::collections::VecDeque;

use tokio::sync::Notify;

use crate::clock::Instant;

/// One waiting (or holding) session.
#[derive(Debug, Clone)]
pub struct QueueEntry {
	pub session: String,
	pub enqueued_at: Instant,
}

/// FIFO state for a single key. The head of `entries` is the current holder.
///
/// `notify` is the broadcast wakeup edge: any mutation that can change a
/// waiter's position pairs with `notify_all()` under the store's per-queue
/// mutex, and a waiter always registers for the edge
/// (`notify_handle().notified()` + `enable()`) before releasing that mutex.
/// This gives a "no lost wakeup" guarantee without a hand-rolled one-shot
/// primitive.
pub struct FileQueue {
	entries: VecDeque<QueueEntry>,
	notify: Notify,
}

impl FileQueue {
	pub fn new() -> Self {
		Self { entries: VecDeque::new(), notify: Notify::new() }
	}

	pub fn enqueue(&mut self, session: &str, now: Instant) {
		debug_assert_eq!(self.position(session), 0, "session already queued");
		self.entries.push_back(QueueEntry { session: session.to_string(), enqueued_at: now });
	}

	/// Removes the head. If a new head is exposed, its `enqueued_at` is
	/// rewritten to `now`: acquisition time reflects promotion, not original
	/// arrival.
	pub fn dequeue(&mut self, now: Instant) -> Option<QueueEntry> {
		let removed = self.entries.pop_front();
		if let Some(new_head) = self.entries.front_mut() {
			new_head.enqueued_at = now;
		}
		removed
	}

	/// Removes a non-head entry matching `session`. The head is never removed
	/// by this path; callers that want to release the head use `dequeue`.
	pub fn remove_waiter(&mut self, session: &str) -> bool {
		if let Some(pos) = self.entries.iter().skip(1).position(|e| e.session == session) {
			self.entries.remove(pos + 1);
			true
		} else {
			false
		}
	}

	/// 1-indexed position of `session`; 0 if absent.
	pub fn position(&self, session: &str) -> usize {
		self.entries.iter().position(|e| e.session == session).map_or(0, |i| i + 1)
	}

	pub fn waiters(&self) -> Vec<String> {
		self.entries.iter().skip(1).map(|e| e.session.clone()).collect()
	}

	pub fn count(&self) -> usize {
		self.entries.len()
	}

	pub fn is_empty(&self) -> bool {
		self.entries.is_empty()
	}

	pub fn holder(&self) -> Option<&str> {
		self.entries.front().map(|e| e.session.as_str())
	}

	pub fn acquired_at(&self) -> Option<Instant> {
		self.entries.front().map(|e| e.enqueued_at)
	}

	/// Wakes every task currently registered on the notification edge.
	pub fn notify_all(&self) {
		self.notify.notify_waiters();
	}

	/// The notification edge. Callers register interest with
	/// `notify_handle().notified()` while still holding the queue's
	/// exclusion token, `enable()` the resulting future, then release the
	/// token before awaiting it.
	pub fn notify_handle(&self) -> &Notify {
		&self.notify
	}
}

impl Default for FileQueue {
	fn default() -> Self {
		Self::new()
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn enqueue_then_positions() {
		let mut q = FileQueue::new();
		q.enqueue("a", 0);
		q.enqueue("b", 1);
		assert_eq!(q.position("a"), 1);
		assert_eq!(q.position("b"), 2);
		assert_eq!(q.position("c"), 0);
		assert_eq!(q.holder(), Some("a"));
		assert_eq!(q.waiters(), vec!["b".to_string()]);
	}

	#[test]
	fn dequeue_rewrites_new_head_timestamp() {
		let mut q = FileQueue::new();
		q.enqueue("a", 0);
		q.enqueue("b", 1);
		let removed = q.dequeue(50);
		assert_eq!(removed.unwrap().session, "a");
		assert_eq!(q.holder(), Some("b"));
		assert_eq!(q.acquired_at(), Some(50));
	}

	#[test]
	fn remove_waiter_never_removes_head() {
		let mut q = FileQueue::new();
		q.enqueue("a", 0);
		assert!(!q.remove_waiter("a"));
		assert_eq!(q.holder(), Some("a"));

		q.enqueue("b", 1);
		assert!(q.remove_waiter("b"));
		assert_eq!(q.count(), 1);
	}

	#[tokio::test]
	async fn notify_wakes_registered_waiter() {
		let q = std::sync::Arc::new(tokio::sync::Mutex::new(FileQueue::new()));
		{
			let mut g = q.lock().await;
			g.enqueue("a", 0);
		}

		let q2 = q.clone();
		let woken = std::sync::Arc::new(std::sync::atomic::AtomicBool::new(false));
		let woken2 = woken.clone();
		let handle = tokio::spawn(async move {
			let g = q2.lock().await;
			let notified = g.notify_handle().notified();
			tokio::pin!(notified);
			notified.as_mut().enable();
			drop(g);
			notified.await;
			woken2.store(true, std::sync::atomic::Ordering::SeqCst);
		});

		tokio::task::yield_now().await;
		assert!(!woken.load(std::sync::atomic::Ordering::SeqCst));

		{
			let mut g = q.lock().await;
			g.dequeue(1);
			g.notify_all();
		}

		handle.await.unwrap();
		assert!(woken.load(std::sync::atomic::Ordering::SeqCst));
	}
}
