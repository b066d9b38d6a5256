//! Boss progress tracking.
//!
//! Permanent, per-playthrough record of which bosses have been defeated.

use std::collections::BTreeSet;
use tracing::info;

use crate::error::BossError;
use crate::events::{EventBus, SubscriptionId};

/// Notifications emitted by [`BossProgressTracker`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BossEvent {
    /// A boss was recorded as defeated for the first time
    MarkedDefeated { boss_id: String },
    /// The defeat set was replaced from a snapshot or cleared
    Restored,
}

/// Set of defeated boss ids
#[derive(Debug, Default)]
pub struct BossProgressTracker {
    defeated: BTreeSet<String>,
    events: EventBus<BossEvent>,
}

impl BossProgressTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe<F>(&mut self, handler: F) -> SubscriptionId
    where
        F: FnMut(&BossEvent) + Send + 'static,
    {
        self.events.subscribe(handler)
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.events.unsubscribe(id)
    }

    /// Record a defeat. Returns true if the boss was not already defeated.
    pub fn mark_defeated(&mut self, boss_id: &str) -> Result<bool, BossError> {
        let boss_id = boss_id.trim();
        if boss_id.is_empty() {
            return Err(BossError::EmptyId);
        }
        if !self.defeated.insert(boss_id.to_string()) {
            return Ok(false);
        }

        info!("Boss defeated: {}", boss_id);
        self.events.emit(&BossEvent::MarkedDefeated {
            boss_id: boss_id.to_string(),
        });
        Ok(true)
    }

    pub fn is_defeated(&self, boss_id: &str) -> bool {
        self.defeated.contains(boss_id)
    }

    /// Defeated ids in sorted order
    pub fn snapshot(&self) -> Vec<String> {
        self.defeated.iter().cloned().collect()
    }

    /// Replace the defeat set wholesale. Blank ids are dropped.
    pub fn load_from_snapshot<I, S>(&mut self, ids: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.defeated = ids
            .into_iter()
            .map(|id| id.as_ref().trim().to_string())
            .filter(|id| !id.is_empty())
            .collect();
        info!("Restored {} defeated boss(es)", self.defeated.len());
        self.events.emit(&BossEvent::Restored);
    }

    /// Forget every defeat (new game)
    pub fn clear(&mut self) {
        self.defeated.clear();
        self.events.emit(&BossEvent::Restored);
    }

    pub fn len(&self) -> usize {
        self.defeated.len()
    }

    pub fn is_empty(&self) -> bool {
        self.defeated.is_empty()
    }
}
