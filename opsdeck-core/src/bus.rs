//! Typed in-process event bridge.
//!
//! Producers and consumers that are not mounted at the same time talk through
//! an [`EventBus`] instead of holding references to each other. One bus lives
//! for one session and is closed when the session ends.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};
use tokio::sync::broadcast;
use tokio::sync::broadcast::error::TryRecvError;
use tracing::warn;

use crate::state::MapStatePatch;

pub const DEFAULT_BUS_CAPACITY: usize = 256;

#[derive(Clone, Debug, PartialEq)]
pub enum BridgeEvent {
    /// The map surface changed on its own (pan, zoom, in-map tool change).
    MapStateChanged(MapStatePatch),
    /// Analysis produced by the detection panel for the estimate calculator.
    /// `redelivery` marks the copy re-published once the estimate module is up.
    DetectionEstimate {
        analysis: serde_json::Value,
        redelivery: bool,
    },
    /// Manual radar pulse, for consumers outside the orchestrator.
    ManualPulse,
    /// A persisted preference was written by someone else.
    StorageChanged { key: String },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Topic {
    MapState,
    DetectionEstimate,
    ManualPulse,
    Storage,
}

impl BridgeEvent {
    pub fn topic(&self) -> Topic {
        match self {
            Self::MapStateChanged(_) => Topic::MapState,
            Self::DetectionEstimate { .. } => Topic::DetectionEstimate,
            Self::ManualPulse => Topic::ManualPulse,
            Self::StorageChanged { .. } => Topic::Storage,
        }
    }

    pub fn detection(analysis: serde_json::Value) -> Self {
        Self::DetectionEstimate {
            analysis,
            redelivery: false,
        }
    }
}

#[derive(Clone, Debug)]
pub struct BridgeEnvelope {
    pub seq: u64,
    pub event: BridgeEvent,
}

#[derive(Debug)]
struct BusInner {
    sender: RwLock<Option<broadcast::Sender<BridgeEnvelope>>>,
    next_seq: AtomicU64,
}

/// Cheap to clone; all clones share one channel.
#[derive(Clone, Debug)]
pub struct EventBus {
    inner: Arc<BusInner>,
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self {
            inner: Arc::new(BusInner {
                sender: RwLock::new(Some(sender)),
                next_seq: AtomicU64::new(1),
            }),
        }
    }

    /// Publish to every current subscriber. Returns the sequence number, or
    /// `None` once the bus is closed. Publishing with no subscribers is fine.
    pub fn publish(&self, event: BridgeEvent) -> Option<u64> {
        let guard = self
            .inner
            .sender
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        let sender = guard.as_ref()?;
        let seq = self.inner.next_seq.fetch_add(1, Ordering::Relaxed);
        let _ = sender.send(BridgeEnvelope { seq, event });
        Some(seq)
    }

    /// Subscribe to a subset of topics; other events are skipped silently.
    pub fn subscribe_to(&self, topics: &[Topic]) -> Subscription {
        let guard = self
            .inner
            .sender
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        Subscription {
            rx: guard.as_ref().map(broadcast::Sender::subscribe),
            topics: topics.to_vec(),
        }
    }

    /// Tear the bus down. Pending events stay readable; afterwards every
    /// subscription reports the end of the stream.
    pub fn close(&self) {
        let mut guard = self
            .inner
            .sender
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        guard.take();
    }

    pub fn is_closed(&self) -> bool {
        self.inner
            .sender
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .is_none()
    }
}

#[derive(Debug)]
pub struct Subscription {
    rx: Option<broadcast::Receiver<BridgeEnvelope>>,
    topics: Vec<Topic>,
}

impl Subscription {
    fn wants(&self, env: &BridgeEnvelope) -> bool {
        self.topics.contains(&env.event.topic())
    }

    /// Next queued event without waiting.
    pub fn try_next(&mut self) -> Option<BridgeEnvelope> {
        loop {
            let rx = self.rx.as_mut()?;
            match rx.try_recv() {
                Ok(env) if self.wants(&env) => return Some(env),
                Ok(_) => continue,
                Err(TryRecvError::Lagged(skipped)) => {
                    warn!(skipped, "bridge subscriber lagged");
                    continue;
                }
                Err(TryRecvError::Empty) => return None,
                Err(TryRecvError::Closed) => {
                    self.rx = None;
                    return None;
                }
            }
        }
    }

    /// Everything currently queued, in emission order.
    pub fn drain(&mut self) -> Vec<BridgeEnvelope> {
        std::iter::from_fn(|| self.try_next()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const ALL_TOPICS: [Topic; 4] = [
        Topic::MapState,
        Topic::DetectionEstimate,
        Topic::ManualPulse,
        Topic::Storage,
    ];

    #[test]
    fn test_events_arrive_in_emission_order() {
        let bus = EventBus::new(16);
        let mut sub = bus.subscribe_to(&ALL_TOPICS);
        bus.publish(BridgeEvent::MapStateChanged(MapStatePatch::zoom(3.0)));
        bus.publish(BridgeEvent::MapStateChanged(MapStatePatch::zoom(4.0)));
        bus.publish(BridgeEvent::ManualPulse);

        let seqs: Vec<u64> = sub.drain().iter().map(|e| e.seq).collect();
        assert_eq!(seqs.len(), 3);
        assert!(seqs.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_topic_filter_skips_other_events() {
        let bus = EventBus::new(16);
        let mut pulses = bus.subscribe_to(&[Topic::ManualPulse]);
        bus.publish(BridgeEvent::detection(json!({ "score": 1 })));
        bus.publish(BridgeEvent::ManualPulse);

        let got = pulses.drain();
        assert_eq!(got.len(), 1);
        assert_eq!(got[0].event, BridgeEvent::ManualPulse);
    }

    #[test]
    fn test_subscriber_only_sees_events_after_subscribing() {
        let bus = EventBus::new(16);
        bus.publish(BridgeEvent::ManualPulse);
        let mut sub = bus.subscribe_to(&ALL_TOPICS);
        assert!(sub.try_next().is_none());
    }

    #[test]
    fn test_close_drops_later_publishes() {
        let bus = EventBus::new(16);
        let mut sub = bus.subscribe_to(&ALL_TOPICS);
        bus.publish(BridgeEvent::ManualPulse);
        bus.close();

        assert!(bus.is_closed());
        assert_eq!(bus.publish(BridgeEvent::ManualPulse), None);
        assert_eq!(sub.drain().len(), 1);
        assert!(sub.try_next().is_none());
        assert!(bus.subscribe_to(&ALL_TOPICS).try_next().is_none());
    }
}
