//! Progress Session
//!
//! Owns the live progress registries for one play session and gates gameplay
//! access on a save profile having been applied. Restored state is in place
//! before anything can query it; changes are written back into the profile
//! on [`ProgressSession::sync_profile`].

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, info, warn};

use super::bridge::{
    BossProgressPersistenceBridge, PersistenceBridge, ProgressState, QuestPersistenceBridge,
};
use super::profile::SaveProfile;
use super::store::SaveStore;
use crate::boss::BossProgressTracker;
use crate::error::SessionError;
use crate::quest::{CatalogReloadEvent, QuestCatalog, QuestManager};

pub struct ProgressSession {
    state: ProgressState,
    bridges: Vec<Box<dyn PersistenceBridge>>,
    profile: Option<SaveProfile>,
    /// Set by registry events, cleared after restore or capture
    dirty: Arc<AtomicBool>,
}

impl ProgressSession {
    /// Session with the quest and boss bridges installed
    pub fn new(catalog: Arc<QuestCatalog>) -> Self {
        Self::with_bridges(
            catalog,
            vec![
                Box::new(QuestPersistenceBridge),
                Box::new(BossProgressPersistenceBridge),
            ],
        )
    }

    /// Bridges run in the given order on restore and capture
    pub fn with_bridges(catalog: Arc<QuestCatalog>, bridges: Vec<Box<dyn PersistenceBridge>>) -> Self {
        let mut state = ProgressState {
            quests: QuestManager::new(catalog),
            bosses: BossProgressTracker::new(),
        };

        let dirty = Arc::new(AtomicBool::new(false));
        let quest_dirty = Arc::clone(&dirty);
        state
            .quests
            .subscribe(move |event| {
                debug!("Quest event: {}", event.event_type());
                quest_dirty.store(true, Ordering::Relaxed);
            });
        let boss_dirty = Arc::clone(&dirty);
        state
            .bosses
            .subscribe(move |_| boss_dirty.store(true, Ordering::Relaxed));

        Self {
            state,
            bridges,
            profile: None,
            dirty,
        }
    }

    /// Apply a loaded profile to the registries and open the session for
    /// gameplay. Replaces any previously applied profile.
    pub fn profile_ready(&mut self, profile: SaveProfile) {
        for bridge in &self.bridges {
            debug!("Restoring {} from profile '{}'", bridge.name(), profile.slot);
            bridge.restore(&profile, &mut self.state);
        }
        info!(
            "Profile '{}' ready: {} quest(s), {} defeated boss(es)",
            profile.slot,
            self.state.quests.len(),
            self.state.bosses.len()
        );
        self.profile = Some(profile);
        self.dirty.store(false, Ordering::Relaxed);
    }

    /// Wipe all progress and start a fresh profile in `slot`
    pub fn new_game(&mut self, slot: impl Into<String>) {
        self.state.quests.reset_all_quests();
        self.state.bosses.clear();
        let profile = SaveProfile::new(slot);
        info!("New game in slot '{}' ({})", profile.slot, profile.profile_id);
        self.profile = Some(profile);
        self.dirty.store(false, Ordering::Relaxed);
    }

    pub fn is_ready(&self) -> bool {
        self.profile.is_some()
    }

    /// True if progress changed since the last restore or capture
    pub fn is_dirty(&self) -> bool {
        self.dirty.load(Ordering::Relaxed)
    }

    pub fn profile(&self) -> Option<&SaveProfile> {
        self.profile.as_ref()
    }

    pub fn quests(&self) -> Result<&QuestManager, SessionError> {
        self.ensure_ready()?;
        Ok(&self.state.quests)
    }

    pub fn quests_mut(&mut self) -> Result<&mut QuestManager, SessionError> {
        self.ensure_ready()?;
        Ok(&mut self.state.quests)
    }

    pub fn bosses(&self) -> Result<&BossProgressTracker, SessionError> {
        self.ensure_ready()?;
        Ok(&self.state.bosses)
    }

    pub fn bosses_mut(&mut self) -> Result<&mut BossProgressTracker, SessionError> {
        self.ensure_ready()?;
        Ok(&mut self.state.bosses)
    }

    /// Swap in a reloaded quest catalog. Quests already registered keep
    /// their definitions; later starts and restores resolve from `catalog`.
    pub fn set_catalog(&mut self, catalog: Arc<QuestCatalog>) {
        self.state.quests.set_catalog(catalog);
    }

    /// Route a watcher event into the session. Returns true if a new catalog
    /// was swapped in; a failed reload keeps the current one.
    pub fn apply_reload(&mut self, event: &CatalogReloadEvent) -> bool {
        match event {
            CatalogReloadEvent::Reloaded { path, catalog } => {
                info!(
                    "Swapping in quest catalog reloaded from {:?} ({} quests)",
                    path,
                    catalog.len()
                );
                self.set_catalog(Arc::clone(catalog));
                true
            }
            CatalogReloadEvent::Error(e) => {
                warn!("Keeping current quest catalog: {}", e);
                false
            }
        }
    }

    /// Write changed progress into the profile and return it
    pub fn sync_profile(&mut self) -> Result<&SaveProfile, SessionError> {
        let profile = self.profile.as_mut().ok_or(SessionError::ProfileNotReady)?;
        if self.dirty.swap(false, Ordering::Relaxed) {
            for bridge in &self.bridges {
                debug!("Capturing {} into profile '{}'", bridge.name(), profile.slot);
                bridge.capture(&self.state, profile);
            }
        }
        Ok(profile)
    }

    /// Sync and persist the profile
    pub async fn save(&mut self, store: &SaveStore) -> Result<(), SessionError> {
        self.sync_profile()?;
        let profile = self.profile.as_mut().ok_or(SessionError::ProfileNotReady)?;
        store.save_profile(profile).await?;
        Ok(())
    }

    fn ensure_ready(&self) -> Result<(), SessionError> {
        if self.profile.is_some() {
            Ok(())
        } else {
            Err(SessionError::ProfileNotReady)
        }
    }
}
