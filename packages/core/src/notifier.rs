//! Periodic snapshot broadcaster. Each subscriber gets its own timer-driven,
//! infinite stream of state snapshots: one event immediately on subscribe,
//! then one per tick. Dropping the stream releases the timer; the tracker
//! exists so that release is observable.

use futures::Stream;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::MissedTickBehavior;
use tracing::debug;

use crate::state::StateStore;
use crate::types::StateSnapshot;

/// Default interval between snapshot pushes
pub const DEFAULT_UPDATE_INTERVAL: Duration = Duration::from_secs(2);

/// One pushed update; ids are per-subscription, monotonic from 0
#[derive(Debug, Clone)]
pub struct SnapshotEvent {
    pub id: u64,
    pub snapshot: StateSnapshot,
}

/// Counts live subscriptions so leaked timers show up in tests and logs
#[derive(Clone, Default)]
pub struct SubscriberTracker {
    count: Arc<AtomicUsize>,
}

impl SubscriberTracker {
    fn acquire(&self) -> SubscriberGuard {
        let active = self.count.fetch_add(1, Ordering::SeqCst) + 1;
        debug!(active, "update subscriber connected");
        SubscriberGuard {
            count: Arc::clone(&self.count),
        }
    }

    pub fn active(&self) -> usize {
        self.count.load(Ordering::SeqCst)
    }
}

/// RAII guard that releases a subscription slot when the stream is dropped
struct SubscriberGuard {
    count: Arc<AtomicUsize>,
}

impl Drop for SubscriberGuard {
    fn drop(&mut self) {
        let remaining = self.count.fetch_sub(1, Ordering::SeqCst) - 1;
        debug!(remaining, "update subscriber disconnected");
    }
}

/// Broadcasts periodic state snapshots to any number of independent
/// subscribers. One instance per process, shared by all of them; it only
/// ever reads the store.
#[derive(Clone)]
pub struct UpdateNotifier {
    store: StateStore,
    interval: Duration,
    tracker: SubscriberTracker,
}

impl UpdateNotifier {
    pub fn new(store: StateStore, interval: Duration) -> Self {
        Self {
            store,
            interval,
            tracker: SubscriberTracker::default(),
        }
    }

    /// Open a new subscription.
    ///
    /// The returned stream never terminates on its own; it ends when the
    /// caller drops it, which also releases the underlying timer.
    pub fn subscribe(&self) -> impl Stream<Item = SnapshotEvent> + Send + 'static {
        let store = self.store.clone();
        let period = self.interval;
        let guard = self.tracker.acquire();

        async_stream::stream! {
            let _guard = guard;
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            let mut id: u64 = 0;

            loop {
                ticker.tick().await;
                let snapshot = store.snapshot().await;
                yield SnapshotEvent { id, snapshot };
                id += 1;
            }
        }
    }

    /// Number of currently open subscriptions
    pub fn active_subscribers(&self) -> usize {
        self.tracker.active()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Scenario;
    use futures::StreamExt;
    use tokio::time::timeout;

    fn notifier() -> UpdateNotifier {
        UpdateNotifier::new(StateStore::new(), DEFAULT_UPDATE_INTERVAL)
    }

    #[tokio::test(start_paused = true)]
    async fn first_event_is_emitted_immediately() {
        let notifier = notifier();
        let mut stream = Box::pin(notifier.subscribe());

        let event = stream.next().await.unwrap();
        assert_eq!(event.id, 0);
        assert_eq!(event.snapshot.status.len(), 7);
    }

    #[tokio::test(start_paused = true)]
    async fn subsequent_events_wait_for_the_tick_interval() {
        let notifier = notifier();
        let mut stream = Box::pin(notifier.subscribe());
        stream.next().await.unwrap();

        // Nothing arrives before the interval elapses.
        let early = timeout(Duration::from_millis(1999), stream.next()).await;
        assert!(early.is_err());

        let event = stream.next().await.unwrap();
        assert_eq!(event.id, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn event_ids_are_monotonic_per_subscription() {
        let notifier = notifier();
        let mut stream = Box::pin(notifier.subscribe());

        for expected in 0..5u64 {
            let event = stream.next().await.unwrap();
            assert_eq!(event.id, expected);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn subscriptions_are_independent() {
        let notifier = notifier();
        let mut first = Box::pin(notifier.subscribe());
        first.next().await.unwrap();
        first.next().await.unwrap();

        // A late subscriber still starts at id 0.
        let mut second = Box::pin(notifier.subscribe());
        let event = second.next().await.unwrap();
        assert_eq!(event.id, 0);
        assert_eq!(notifier.active_subscribers(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn mutations_are_visible_on_the_next_tick() {
        let store = StateStore::new();
        let notifier = UpdateNotifier::new(store.clone(), DEFAULT_UPDATE_INTERVAL);
        let mut stream = Box::pin(notifier.subscribe());

        let before = stream.next().await.unwrap();
        assert!(before.snapshot.incidents.is_empty());

        store.start_scenario(Scenario::from_id(1)).await;

        let after = stream.next().await.unwrap();
        assert_eq!(after.snapshot.incidents.len(), 1);
        assert_eq!(
            after.snapshot.status["dwh"].status,
            crate::types::HealthStatus::Critical
        );
    }

    #[tokio::test(start_paused = true)]
    async fn dropping_a_subscription_releases_its_slot() {
        let notifier = notifier();
        assert_eq!(notifier.active_subscribers(), 0);

        for _ in 0..10 {
            let mut stream = Box::pin(notifier.subscribe());
            assert_eq!(notifier.active_subscribers(), 1);
            stream.next().await.unwrap();
            drop(stream);
            assert_eq!(notifier.active_subscribers(), 0);
        }
    }
}
