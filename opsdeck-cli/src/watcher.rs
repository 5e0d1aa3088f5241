//! Polls persisted preference files and reports writes made by other
//! processes on the bridge.

use std::collections::HashMap;
use std::time::{Duration, Instant, SystemTime};

use tracing::debug;

use opsdeck_core::bus::{BridgeEvent, EventBus};
use opsdeck_core::preferences::FileStore;

pub struct PreferenceWatcher {
    store: FileStore,
    keys: Vec<String>,
    seen: HashMap<String, Option<SystemTime>>,
    interval: Duration,
    last_poll: Option<Instant>,
}

impl PreferenceWatcher {
    pub fn new(store: FileStore, keys: &[&str], interval: Duration) -> Self {
        let mut watcher = Self {
            store,
            keys: keys.iter().map(|k| k.to_string()).collect(),
            seen: HashMap::new(),
            interval,
            last_poll: None,
        };
        // Baseline, so files present at startup are not reported.
        for key in watcher.keys.clone() {
            let stamp = watcher.modified(&key);
            watcher.seen.insert(key, stamp);
        }
        watcher
    }

    fn modified(&self, key: &str) -> Option<SystemTime> {
        std::fs::metadata(self.store.path_for(key))
            .and_then(|m| m.modified())
            .ok()
    }

    /// Check every key if the poll interval elapsed. Returns the keys that
    /// changed, after publishing a `StorageChanged` for each.
    pub fn poll(&mut self, bus: &EventBus) -> Vec<String> {
        if bus.is_closed() {
            return Vec::new();
        }
        let now = Instant::now();
        if let Some(last) = self.last_poll {
            if now.duration_since(last) < self.interval {
                return Vec::new();
            }
        }
        self.last_poll = Some(now);
        self.check(bus)
    }

    fn check(&mut self, bus: &EventBus) -> Vec<String> {
        let mut changed = Vec::new();
        for key in &self.keys {
            let stamp = self.modified(key);
            if self.seen.get(key) != Some(&stamp) {
                self.seen.insert(key.clone(), stamp);
                debug!(key = %key, "preference changed on disk");
                bus.publish(BridgeEvent::StorageChanged { key: key.clone() });
                changed.push(key.clone());
            }
        }
        changed
    }

    /// Record our own write so it is not reported back as foreign.
    pub fn acknowledge(&mut self, key: &str) {
        let stamp = self.modified(key);
        self.seen.insert(key.to_string(), stamp);
    }
}
