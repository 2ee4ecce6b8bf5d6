use crate::clock::Clock;
use crate::model::{OrderId, TableId};
use chrono::{DateTime, Utc};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use std::time::Duration;

/// The sub-resource a suppression applies to: one table row, or one order with all of
/// its items.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SyncKey {
    Table(TableId),
    Order(OrderId),
}

/// Tracks, per key, until when poll results must be ignored.
pub struct SuppressionWindow {
    cooldown: chrono::Duration,
    clock: Arc<dyn Clock>,
    until: BTreeMap<SyncKey, DateTime<Utc>>,
}

impl SuppressionWindow {
    pub fn new(cooldown: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            cooldown: chrono::Duration::milliseconds(cooldown.as_millis() as i64),
            clock,
            until: BTreeMap::new(),
        }
    }

    /// Starts (or restarts) the cool-down for `key`.
    pub fn suppress(&mut self, key: SyncKey) {
        let until = self.clock.now() + self.cooldown;
        self.until.insert(key, until);
    }

    /// Ends the cool-down for `key` early.
    pub fn release(&mut self, key: SyncKey) {
        self.until.remove(&key);
    }

    pub fn is_suppressed(&self, key: SyncKey) -> bool {
        self.until
            .get(&key)
            .is_some_and(|until| *until > self.clock.now())
    }

    /// Keys still inside their cool-down. Expired entries are dropped.
    pub fn active(&mut self) -> BTreeSet<SyncKey> {
        let now = self.clock.now();
        self.until.retain(|_, until| *until > now);
        self.until.keys().copied().collect()
    }
}
