//! Persistence Bridges
//!
//! Stateless adapters that copy progress between a [`SaveProfile`] and the
//! live registries.

use crate::boss::BossProgressTracker;
use crate::quest::QuestManager;

use super::profile::SaveProfile;

/// The live progress registries a bridge reads and writes
#[derive(Debug)]
pub struct ProgressState {
    pub quests: QuestManager,
    pub bosses: BossProgressTracker,
}

/// Moves one slice of progress in and out of a save profile
pub trait PersistenceBridge: Send {
    /// Name used in logs
    fn name(&self) -> &'static str;

    /// Apply the profile's stored data to the registries
    fn restore(&self, profile: &SaveProfile, state: &mut ProgressState);

    /// Write the registries' current data into the profile
    fn capture(&self, state: &ProgressState, profile: &mut SaveProfile);
}

/// Quest progress ↔ profile flag list
#[derive(Debug, Default, Clone, Copy)]
pub struct QuestPersistenceBridge;

impl PersistenceBridge for QuestPersistenceBridge {
    fn name(&self) -> &'static str {
        "quests"
    }

    fn restore(&self, profile: &SaveProfile, state: &mut ProgressState) {
        state.quests.restore_from_flags(&profile.flags);
    }

    fn capture(&self, state: &ProgressState, profile: &mut SaveProfile) {
        let mut exported = Vec::new();
        state.quests.export_flags(&mut exported);
        profile.replace_quest_flags(exported);
    }
}

/// Boss defeats ↔ profile boss id list
#[derive(Debug, Default, Clone, Copy)]
pub struct BossProgressPersistenceBridge;

impl PersistenceBridge for BossProgressPersistenceBridge {
    fn name(&self) -> &'static str {
        "bosses"
    }

    fn restore(&self, profile: &SaveProfile, state: &mut ProgressState) {
        state.bosses.load_from_snapshot(&profile.defeated_bosses);
    }

    fn capture(&self, state: &ProgressState, profile: &mut SaveProfile) {
        profile.defeated_bosses = state.bosses.snapshot();
    }
}
