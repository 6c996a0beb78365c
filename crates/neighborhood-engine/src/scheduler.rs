use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use tokio::sync::oneshot;
use tokio::task::AbortHandle;
use tokio::time::Instant;
use tracing::debug;

use neighborhood_types::models::{CandidateReply, Message};

use crate::message_log::reply_message;

/// Marker for one conversation session. Deliveries stamped with an older
/// generation are dropped.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Generation(u64);

impl Generation {
    pub fn next(self) -> Self {
        Self(self.0.wrapping_add(1))
    }

    pub fn value(self) -> u64 {
        self.0
    }
}

/// Receiver of scheduled replies.
pub trait DeliverySink: Send + Sync + 'static {
    /// Append `message` if `generation` is still current.
    /// Returns `false` when the delivery was stale and nothing was appended.
    fn deliver(&self, generation: Generation, message: Message) -> bool;
}

/// Releases replies into the log at staggered delays.
///
/// Reply `i` of a batch fires `base_delay * (i + 1)` after enqueue, each on its
/// own timer. Within a batch a reply also waits for its predecessor, so equal
/// or zero delays still deliver in input order.
pub struct DeliveryScheduler {
    base_delay: Duration,
    pending: Mutex<Vec<AbortHandle>>,
}

impl DeliveryScheduler {
    pub fn new(base_delay: Duration) -> Self {
        Self {
            base_delay,
            pending: Mutex::new(Vec::new()),
        }
    }

    pub fn base_delay(&self) -> Duration {
        self.base_delay
    }

    /// Schedule `replies` for delivery into `sink`. Returns how many were scheduled.
    ///
    /// Must be called from within a tokio runtime.
    pub fn enqueue<S: DeliverySink>(
        &self,
        generation: Generation,
        replies: Vec<CandidateReply>,
        sink: Arc<S>,
    ) -> usize {
        let enqueued_at = Instant::now();
        let count = replies.len();

        let mut pending = self.pending.lock().unwrap_or_else(PoisonError::into_inner);
        pending.retain(|handle| !handle.is_finished());

        let mut previous: Option<oneshot::Receiver<()>> = None;
        for (index, reply) in replies.into_iter().enumerate() {
            let deadline = enqueued_at + self.base_delay * (index as u32 + 1);
            let (done_tx, done_rx) = oneshot::channel();
            let wait_for = previous.replace(done_rx);
            let sink = sink.clone();

            let handle = tokio::spawn(async move {
                tokio::time::sleep_until(deadline).await;
                if let Some(predecessor) = wait_for {
                    let _ = predecessor.await;
                }
                let message = reply_message(reply);
                let id = message.id;
                if sink.deliver(generation, message) {
                    debug!("Delivered reply {} ({}/{})", id, index + 1, count);
                } else {
                    debug!("Dropped stale reply {} from generation {}", id, generation.value());
                }
                let _ = done_tx.send(());
            });
            pending.push(handle.abort_handle());
        }

        count
    }

    /// Abort every outstanding delivery. Returns how many were still pending.
    pub fn cancel_all(&self) -> usize {
        let mut pending = self.pending.lock().unwrap_or_else(PoisonError::into_inner);
        let live = pending.iter().filter(|handle| !handle.is_finished()).count();
        for handle in pending.drain(..) {
            handle.abort();
        }
        live
    }

    /// Deliveries scheduled but not yet finished.
    pub fn pending(&self) -> usize {
        let pending = self.pending.lock().unwrap_or_else(PoisonError::into_inner);
        pending.iter().filter(|handle| !handle.is_finished()).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU64, Ordering};

    /// Sink that records deliveries with their elapsed time.
    struct Recorder {
        started: Instant,
        current: AtomicU64,
        seen: Mutex<Vec<(String, Duration)>>,
    }

    impl Recorder {
        fn new() -> Arc<Self> {
            Arc::new(Self {
                started: Instant::now(),
                current: AtomicU64::new(0),
                seen: Mutex::new(Vec::new()),
            })
        }

        fn seen(&self) -> Vec<(String, Duration)> {
            self.seen.lock().unwrap().clone()
        }
    }

    impl DeliverySink for Recorder {
        fn deliver(&self, generation: Generation, message: Message) -> bool {
            if generation.value() != self.current.load(Ordering::SeqCst) {
                return false;
            }
            self.seen
                .lock()
                .unwrap()
                .push((message.sender_name, self.started.elapsed()));
            true
        }
    }

    fn replies(names: &[&str]) -> Vec<CandidateReply> {
        names
            .iter()
            .map(|name| CandidateReply {
                sender_name: name.to_string(),
                content: format!("hi from {}", name),
                mood_emoji: "🙂".into(),
            })
            .collect()
    }

    #[tokio::test(start_paused = true)]
    async fn replies_are_staggered_by_index() {
        let scheduler = DeliveryScheduler::new(Duration::from_millis(500));
        let sink = Recorder::new();

        assert_eq!(scheduler.enqueue(Generation::default(), replies(&["Dave", "Rosa"]), sink.clone()), 2);
        assert_eq!(scheduler.pending(), 2);

        tokio::time::sleep(Duration::from_millis(499)).await;
        assert!(sink.seen().is_empty());

        tokio::time::sleep(Duration::from_millis(2)).await;
        assert_eq!(sink.seen().len(), 1);

        tokio::time::sleep(Duration::from_millis(600)).await;
        let seen = sink.seen();
        assert_eq!(seen.len(), 2);
        assert_eq!(seen[0].0, "Dave");
        assert_eq!(seen[1].0, "Rosa");
        assert!(seen[0].1 >= Duration::from_millis(500));
        assert!(seen[1].1 >= Duration::from_millis(1000));
        assert_eq!(scheduler.pending(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn zero_delay_still_preserves_order() {
        let scheduler = DeliveryScheduler::new(Duration::ZERO);
        let sink = Recorder::new();
        let names = ["a", "b", "c", "d", "e"];

        scheduler.enqueue(Generation::default(), replies(&names), sink.clone());
        tokio::time::sleep(Duration::from_millis(10)).await;

        let order: Vec<String> = sink.seen().into_iter().map(|(name, _)| name).collect();
        assert_eq!(order, names);
    }

    #[tokio::test(start_paused = true)]
    async fn stale_generation_is_not_appended() {
        let scheduler = DeliveryScheduler::new(Duration::from_millis(500));
        let sink = Recorder::new();

        scheduler.enqueue(Generation::default(), replies(&["Dave"]), sink.clone());
        sink.current.store(1, Ordering::SeqCst);

        tokio::time::sleep(Duration::from_secs(2)).await;
        assert!(sink.seen().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_all_aborts_pending_timers() {
        let scheduler = DeliveryScheduler::new(Duration::from_millis(500));
        let sink = Recorder::new();

        scheduler.enqueue(Generation::default(), replies(&["Dave", "Rosa", "Tom"]), sink.clone());
        tokio::time::sleep(Duration::from_millis(700)).await;
        assert_eq!(sink.seen().len(), 1);

        assert_eq!(scheduler.cancel_all(), 2);
        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(sink.seen().len(), 1);
        assert_eq!(scheduler.pending(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn empty_batch_schedules_nothing() {
        let scheduler = DeliveryScheduler::new(Duration::from_millis(500));
        assert_eq!(scheduler.enqueue(Generation::default(), Vec::new(), Recorder::new()), 0);
        assert_eq!(scheduler.pending(), 0);
    }

    #[test]
    fn generations_advance() {
        let first = Generation::default();
        assert!(first.next() > first);
        assert_eq!(first.next().value(), 1);
    }
}
