//! Quest Manager
//!
//! Single source of truth for quest progression within a play session.
//!
//! Quests are registered lazily: either explicitly through [`QuestManager::add_quest`]
//! or from the catalog the first time [`QuestManager::start_quest`] names them.
//! Every registered step that carries a condition id is indexed, so a single
//! gameplay event can finish steps across many quests at once.
//!
//! Mutators return `Ok(true)` when state changed, `Ok(false)` for idempotent or
//! state-gated no-ops and `Err` for unknown ids or out-of-range steps. Events
//! fire only when state changed.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tracing::{debug, info, warn};

use super::catalog::QuestCatalog;
use super::definition::QuestDefinition;
use super::events::QuestEvent;
use super::flags::QuestFlag;
use super::state::{QuestState, RuntimeQuest};
use crate::error::QuestError;
use crate::events::{EventBus, SubscriptionId};

/// A step that listens for a condition
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepRef {
    pub quest_id: String,
    pub step_index: usize,
}

/// Runtime quest registry
#[derive(Debug)]
pub struct QuestManager {
    catalog: Arc<QuestCatalog>,
    /// Ordered by id so exports are deterministic
    quests: BTreeMap<String, RuntimeQuest>,
    /// condition id -> steps listening for it
    condition_index: HashMap<String, Vec<StepRef>>,
    events: EventBus<QuestEvent>,
}

impl QuestManager {
    pub fn new(catalog: Arc<QuestCatalog>) -> Self {
        Self {
            catalog,
            quests: BTreeMap::new(),
            condition_index: HashMap::new(),
            events: EventBus::new(),
        }
    }

    pub fn catalog(&self) -> &Arc<QuestCatalog> {
        &self.catalog
    }

    /// Swap in a rebuilt catalog. Registered quests keep the definitions
    /// they were created with.
    pub fn set_catalog(&mut self, catalog: Arc<QuestCatalog>) {
        self.catalog = catalog;
    }

    pub fn subscribe<F>(&mut self, handler: F) -> SubscriptionId
    where
        F: FnMut(&QuestEvent) + Send + 'static,
    {
        self.events.subscribe(handler)
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.events.unsubscribe(id)
    }

    // ========================================================================
    // Mutations
    // ========================================================================

    /// Register a quest as inactive. Duplicate ids are a no-op.
    pub fn add_quest(&mut self, definition: Arc<QuestDefinition>) -> Result<bool, QuestError> {
        let id = definition.id.as_str();
        if id.trim().is_empty() {
            return Err(QuestError::InvalidDefinition(
                "quest id cannot be empty".to_string(),
            ));
        }
        if id.trim() != id {
            return Err(QuestError::InvalidDefinition(format!(
                "quest id '{}' has surrounding whitespace",
                id
            )));
        }
        if self.quests.contains_key(&definition.id) {
            return Ok(false);
        }

        self.register(definition);
        self.events.emit(&QuestEvent::Changed);
        Ok(true)
    }

    /// Activate a quest, registering it from the catalog if needed.
    pub fn start_quest(&mut self, quest_id: &str) -> Result<bool, QuestError> {
        self.ensure_registered(quest_id)?;

        let Some(quest) = self.quests.get_mut(quest_id) else {
            return Err(QuestError::UnknownQuest(quest_id.to_string()));
        };
        if quest.state() != QuestState::Inactive {
            return Ok(false);
        }

        quest.set_state(QuestState::Active);
        info!("Quest started: {}", quest_id);

        self.events.emit(&QuestEvent::Started {
            quest_id: quest_id.to_string(),
        });
        self.events.emit(&QuestEvent::Changed);
        Ok(true)
    }

    /// Force a registered quest to completed, marking every step done.
    pub fn complete_quest(&mut self, quest_id: &str) -> Result<bool, QuestError> {
        let quest = self.get_mut(quest_id)?;
        if quest.state() == QuestState::Completed {
            return Ok(false);
        }

        quest.complete_all_steps();
        quest.set_state(QuestState::Completed);
        info!("Quest completed: {}", quest_id);

        self.events.emit(&QuestEvent::Completed {
            quest_id: quest_id.to_string(),
        });
        self.events.emit(&QuestEvent::Changed);
        Ok(true)
    }

    /// Fail an active quest. Other states are left untouched.
    pub fn fail_quest(&mut self, quest_id: &str) -> Result<bool, QuestError> {
        let quest = self.get_mut(quest_id)?;
        if quest.state() != QuestState::Active {
            return Ok(false);
        }

        quest.set_state(QuestState::Failed);
        info!("Quest failed: {}", quest_id);

        self.events.emit(&QuestEvent::Failed {
            quest_id: quest_id.to_string(),
        });
        self.events.emit(&QuestEvent::Changed);
        Ok(true)
    }

    /// Finish one step of an active quest; finishing the last open step
    /// completes the quest.
    pub fn mark_step_done(&mut self, quest_id: &str, step_index: usize) -> Result<bool, QuestError> {
        let changed = self.mark_step_done_silent(quest_id, step_index)?;
        if changed {
            self.events.emit(&QuestEvent::Changed);
        }
        Ok(changed)
    }

    /// Finish every step listening for `condition` in active quests.
    /// Returns how many steps were newly finished.
    pub fn complete_by_condition(&mut self, condition: &str) -> usize {
        let Some(listeners) = self.condition_index.get(condition) else {
            debug!("No quest steps listen for condition '{}'", condition);
            return 0;
        };

        let listeners = listeners.clone();
        let mut finished = 0;
        for StepRef {
            quest_id,
            step_index,
        } in &listeners
        {
            if self.state(quest_id) != Some(QuestState::Active) {
                continue;
            }
            // Indexed refs always point at registered, in-range steps
            if let Ok(true) = self.mark_step_done_silent(quest_id, *step_index) {
                finished += 1;
            }
        }

        if finished > 0 {
            debug!("Condition '{}' finished {} step(s)", condition, finished);
            self.events.emit(&QuestEvent::Changed);
        }
        finished
    }

    /// Drop every registered quest and the condition index (new game)
    pub fn reset_all_quests(&mut self) {
        self.quests.clear();
        self.condition_index.clear();
        info!("All quests reset");
        self.events.emit(&QuestEvent::Changed);
    }

    // ========================================================================
    // Queries
    // ========================================================================

    pub fn has_quest(&self, quest_id: &str) -> bool {
        self.quests.contains_key(quest_id)
    }

    /// None if the quest is not registered
    pub fn state(&self, quest_id: &str) -> Option<QuestState> {
        self.quests.get(quest_id).map(RuntimeQuest::state)
    }

    pub fn get(&self, quest_id: &str) -> Option<&RuntimeQuest> {
        self.quests.get(quest_id)
    }

    pub fn is_step_completed(&self, quest_id: &str, step_index: usize) -> bool {
        self.quests
            .get(quest_id)
            .and_then(|q| q.is_step_completed(step_index))
            .unwrap_or(false)
    }

    /// False for unregistered quests
    pub fn are_all_steps_completed(&self, quest_id: &str) -> bool {
        self.quests
            .get(quest_id)
            .is_some_and(RuntimeQuest::all_steps_completed)
    }

    /// All registered quests, ordered by id
    pub fn all(&self) -> impl Iterator<Item = &RuntimeQuest> {
        self.quests.values()
    }

    /// Steps registered under a condition
    pub fn listeners(&self, condition: &str) -> &[StepRef] {
        self.condition_index
            .get(condition)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn len(&self) -> usize {
        self.quests.len()
    }

    pub fn is_empty(&self) -> bool {
        self.quests.is_empty()
    }

    // ========================================================================
    // Save flags
    // ========================================================================

    /// Append the save flags describing current progress.
    ///
    /// Completed quests emit only their completion flag; active and failed
    /// quests emit their state flag followed by one flag per finished step;
    /// inactive quests emit nothing.
    pub fn export_flags(&self, out: &mut Vec<String>) {
        for quest in self.quests.values() {
            let id = quest.id();
            match quest.state() {
                QuestState::Inactive => {}
                QuestState::Completed => out.push(QuestFlag::Completed(id).to_string()),
                QuestState::Active | QuestState::Failed => {
                    let flag = if quest.state() == QuestState::Active {
                        QuestFlag::Active(id)
                    } else {
                        QuestFlag::Failed(id)
                    };
                    out.push(flag.to_string());
                    out.extend(quest.completed_step_indices().map(|step_index| {
                        QuestFlag::StepDone {
                            quest_id: id,
                            step_index,
                        }
                        .to_string()
                    }));
                }
            }
        }
    }

    /// Replace all progress with the state described by `flags`.
    ///
    /// Quest state flags are applied before step flags so their relative order
    /// in the list does not matter. Flags naming quests missing from the
    /// catalog, malformed flags and out-of-range steps are skipped. Emits a
    /// single `Changed` and no per-quest events.
    pub fn restore_from_flags<'a, I>(&mut self, flags: I)
    where
        I: IntoIterator<Item = &'a String>,
    {
        self.quests.clear();
        self.condition_index.clear();

        let parsed: Vec<(&str, QuestFlag<'_>)> = flags
            .into_iter()
            .filter_map(|flag| match QuestFlag::parse(flag)? {
                Ok(parsed) => Some((flag.as_str(), parsed)),
                Err(e) => {
                    warn!("Skipping malformed quest flag '{}': {}", flag, e);
                    None
                }
            })
            .collect();

        for (raw, flag) in parsed.iter() {
            let state = match flag {
                QuestFlag::Completed(_) => QuestState::Completed,
                QuestFlag::Active(_) => QuestState::Active,
                QuestFlag::Failed(_) => QuestState::Failed,
                QuestFlag::StepDone { .. } => continue,
            };
            if let Err(e) = self.ensure_registered(flag.quest_id()) {
                warn!("Skipping quest flag '{}': {}", raw, e);
                continue;
            }
            if let Some(quest) = self.quests.get_mut(flag.quest_id()) {
                // Conflicting state flags resolve Completed > Failed > Active
                if restore_rank(state) <= restore_rank(quest.state()) {
                    continue;
                }
                if state == QuestState::Completed {
                    quest.complete_all_steps();
                }
                quest.set_state(state);
            }
        }

        for (raw, flag) in parsed.iter() {
            let QuestFlag::StepDone {
                quest_id,
                step_index,
            } = *flag
            else {
                continue;
            };
            match self.quests.get_mut(quest_id) {
                Some(quest) if quest.state() == QuestState::Completed => {}
                Some(quest) if step_index < quest.step_count() => {
                    quest.complete_step(step_index);
                }
                Some(_) => warn!("Skipping out-of-range step flag '{}'", raw),
                None => warn!("Skipping step flag '{}' for a quest with no state flag", raw),
            }
        }

        info!(
            "Restored {} quest(s) from {} quest flag(s)",
            self.quests.len(),
            parsed.len()
        );
        self.events.emit(&QuestEvent::Changed);
    }

    // ========================================================================
    // Internals
    // ========================================================================

    fn get_mut(&mut self, quest_id: &str) -> Result<&mut RuntimeQuest, QuestError> {
        self.quests
            .get_mut(quest_id)
            .ok_or_else(|| QuestError::UnknownQuest(quest_id.to_string()))
    }

    /// Register from the catalog if unknown. Returns true if newly registered.
    fn ensure_registered(&mut self, quest_id: &str) -> Result<bool, QuestError> {
        if self.quests.contains_key(quest_id) {
            return Ok(false);
        }
        let definition = self
            .catalog
            .get(quest_id)
            .ok_or_else(|| QuestError::UnknownQuest(quest_id.to_string()))?;
        self.register(definition);
        Ok(true)
    }

    fn register(&mut self, definition: Arc<QuestDefinition>) {
        for (step_index, condition) in definition.conditions() {
            self.condition_index
                .entry(condition.to_string())
                .or_default()
                .push(StepRef {
                    quest_id: definition.id.clone(),
                    step_index,
                });
        }
        debug!("Registered quest: {}", definition.id);
        self.quests
            .insert(definition.id.clone(), RuntimeQuest::new(definition));
    }

    /// Step completion without the trailing `Changed`, so fan-out callers
    /// can emit it once.
    fn mark_step_done_silent(&mut self, quest_id: &str, step_index: usize) -> Result<bool, QuestError> {
        let quest = self.get_mut(quest_id)?;
        if step_index >= quest.step_count() {
            return Err(QuestError::StepOutOfRange {
                quest_id: quest_id.to_string(),
                step_index,
                step_count: quest.step_count(),
            });
        }
        if quest.state() != QuestState::Active || !quest.complete_step(step_index) {
            return Ok(false);
        }

        let finished = quest.all_steps_completed();
        if finished {
            quest.set_state(QuestState::Completed);
        }

        self.events.emit(&QuestEvent::StepCompleted {
            quest_id: quest_id.to_string(),
            step_index,
        });
        if finished {
            info!("Quest completed: {} (all steps done)", quest_id);
            self.events.emit(&QuestEvent::Completed {
                quest_id: quest_id.to_string(),
            });
        }
        Ok(true)
    }
}

fn restore_rank(state: QuestState) -> u8 {
    match state {
        QuestState::Inactive => 0,
        QuestState::Active => 1,
        QuestState::Failed => 2,
        QuestState::Completed => 3,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::quest::definition::StepDefinition;
    use std::sync::Mutex;

    fn catalog() -> Arc<QuestCatalog> {
        let mut catalog = QuestCatalog::new();
        catalog
            .insert(
                QuestDefinition::new("Q1", "Quest One")
                    .with_step(StepDefinition::new("first").with_condition("talk:elder"))
                    .with_step(StepDefinition::new("second").with_condition("item:herb")),
            )
            .unwrap();
        catalog
            .insert(
                QuestDefinition::new("Q2", "Quest Two")
                    .with_step(StepDefinition::new("gather").with_condition("item:herb"))
                    .with_step(StepDefinition::new("deliver")),
            )
            .unwrap();
        catalog
            .insert(QuestDefinition::new("Q3", "No Steps"))
            .unwrap();
        Arc::new(catalog)
    }

    fn recording_manager() -> (QuestManager, Arc<Mutex<Vec<QuestEvent>>>) {
        let mut manager = QuestManager::new(catalog());
        let log = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&log);
        manager.subscribe(move |e| sink.lock().unwrap().push(e.clone()));
        (manager, log)
    }

    fn completed_count(log: &Mutex<Vec<QuestEvent>>, id: &str) -> usize {
        log.lock()
            .unwrap()
            .iter()
            .filter(|e| matches!(e, QuestEvent::Completed { quest_id } if quest_id == id))
            .count()
    }

    #[test]
    fn test_two_step_quest_completes_once() {
        let (mut manager, log) = recording_manager();
        assert!(manager.start_quest("Q1").unwrap());

        assert!(manager.mark_step_done("Q1", 0).unwrap());
        assert_eq!(manager.state("Q1"), Some(QuestState::Active));
        assert!(manager.mark_step_done("Q1", 1).unwrap());
        assert_eq!(manager.state("Q1"), Some(QuestState::Completed));

        assert!(!manager.mark_step_done("Q1", 1).unwrap());
        assert!(!manager.complete_quest("Q1").unwrap());
        assert_eq!(completed_count(&log, "Q1"), 1);
    }

    #[test]
    fn test_event_order() {
        let (mut manager, log) = recording_manager();
        manager.start_quest("Q1").unwrap();
        manager.mark_step_done("Q1", 0).unwrap();
        log.lock().unwrap().clear();

        manager.mark_step_done("Q1", 1).unwrap();
        assert_eq!(
            *log.lock().unwrap(),
            vec![
                QuestEvent::StepCompleted {
                    quest_id: "Q1".to_string(),
                    step_index: 1
                },
                QuestEvent::Completed {
                    quest_id: "Q1".to_string()
                },
                QuestEvent::Changed,
            ]
        );
    }

    #[test]
    fn test_unknown_quest_fires_nothing() {
        let (mut manager, log) = recording_manager();
        assert_eq!(
            manager.mark_step_done("UNKNOWN", 0),
            Err(QuestError::UnknownQuest("UNKNOWN".to_string()))
        );
        assert!(manager.start_quest("UNKNOWN").is_err());
        assert!(manager.complete_quest("UNKNOWN").is_err());
        assert!(log.lock().unwrap().is_empty());
        assert!(!manager.has_quest("UNKNOWN"));
    }

    #[test]
    fn test_step_requires_active_quest() {
        let (mut manager, log) = recording_manager();
        let def = manager.catalog().get("Q1").unwrap();
        assert!(manager.add_quest(def).unwrap());
        log.lock().unwrap().clear();

        assert!(!manager.mark_step_done("Q1", 0).unwrap());
        assert!(!manager.is_step_completed("Q1", 0));
        assert!(log.lock().unwrap().is_empty());

        assert!(matches!(
            manager.mark_step_done("Q1", 9),
            Err(QuestError::StepOutOfRange { step_count: 2, .. })
        ));
    }

    #[test]
    fn test_add_quest_is_idempotent() {
        let (mut manager, log) = recording_manager();
        let def = manager.catalog().get("Q2").unwrap();
        assert!(manager.add_quest(Arc::clone(&def)).unwrap());
        assert!(!manager.add_quest(def).unwrap());
        assert_eq!(manager.listeners("item:herb").len(), 1);
        assert_eq!(*log.lock().unwrap(), vec![QuestEvent::Changed]);

        let nameless = Arc::new(QuestDefinition::new("", "Nameless"));
        assert!(matches!(
            manager.add_quest(nameless),
            Err(QuestError::InvalidDefinition(_))
        ));
    }

    #[test]
    fn test_start_is_idempotent() {
        let (mut manager, log) = recording_manager();
        assert!(manager.start_quest("Q1").unwrap());
        assert!(!manager.start_quest("Q1").unwrap());
        let started = log
            .lock()
            .unwrap()
            .iter()
            .filter(|e| matches!(e, QuestEvent::Started { .. }))
            .count();
        assert_eq!(started, 1);
    }

    #[test]
    fn test_condition_fan_out() {
        let (mut manager, log) = recording_manager();
        manager.start_quest("Q1").unwrap();
        manager.add_quest(manager.catalog().get("Q2").unwrap()).unwrap();
        log.lock().unwrap().clear();

        // Q2 is inactive and must stay untouched
        assert_eq!(manager.complete_by_condition("item:herb"), 1);
        assert!(manager.is_step_completed("Q1", 1));
        assert!(!manager.is_step_completed("Q1", 0));
        assert_eq!(manager.state("Q2"), Some(QuestState::Inactive));
        assert!(!manager.is_step_completed("Q2", 0));

        manager.start_quest("Q2").unwrap();
        assert_eq!(manager.complete_by_condition("item:herb"), 1);
        assert!(manager.is_step_completed("Q2", 0));

        assert_eq!(manager.complete_by_condition("item:herb"), 0);
        assert_eq!(manager.complete_by_condition("never:raised"), 0);

        let changed = log
            .lock()
            .unwrap()
            .iter()
            .filter(|e| **e == QuestEvent::Changed)
            .count();
        assert_eq!(changed, 3);
    }

    #[test]
    fn test_condition_completes_quest() {
        let (mut manager, log) = recording_manager();
        manager.start_quest("Q1").unwrap();
        manager.complete_by_condition("talk:elder");
        manager.complete_by_condition("item:herb");
        assert_eq!(manager.state("Q1"), Some(QuestState::Completed));
        assert_eq!(completed_count(&log, "Q1"), 1);
    }

    #[test]
    fn test_complete_quest_marks_steps() {
        let (mut manager, _) = recording_manager();
        manager.start_quest("Q2").unwrap();
        assert!(manager.complete_quest("Q2").unwrap());
        assert!(manager.are_all_steps_completed("Q2"));
    }

    #[test]
    fn test_fail_quest() {
        let (mut manager, log) = recording_manager();
        manager.add_quest(manager.catalog().get("Q1").unwrap()).unwrap();
        assert!(!manager.fail_quest("Q1").unwrap());

        manager.start_quest("Q1").unwrap();
        assert!(manager.fail_quest("Q1").unwrap());
        assert_eq!(manager.state("Q1"), Some(QuestState::Failed));
        assert!(!manager.mark_step_done("Q1", 0).unwrap());
        assert!(log
            .lock()
            .unwrap()
            .contains(&QuestEvent::Failed { quest_id: "Q1".to_string() }));
    }

    #[test]
    fn test_export_active_quest() {
        let (mut manager, _) = recording_manager();
        manager.start_quest("Q1").unwrap();
        manager.mark_step_done("Q1", 0).unwrap();

        let mut flags = Vec::new();
        manager.export_flags(&mut flags);
        assert_eq!(flags, vec!["QUEST_ACTIVE:Q1", "QUEST_STEP_DONE:Q1:0"]);
    }

    #[test]
    fn test_export_completed_and_inactive() {
        let (mut manager, _) = recording_manager();
        manager.start_quest("Q1").unwrap();
        manager.complete_quest("Q1").unwrap();
        manager.add_quest(manager.catalog().get("Q2").unwrap()).unwrap();

        let mut flags = vec!["MET_THE_KING".to_string()];
        manager.export_flags(&mut flags);
        assert_eq!(flags, vec!["MET_THE_KING", "QUEST_COMPLETED:Q1"]);
    }

    #[test]
    fn test_round_trip() {
        let (mut manager, _) = recording_manager();
        manager.start_quest("Q1").unwrap();
        manager.mark_step_done("Q1", 1).unwrap();
        manager.start_quest("Q2").unwrap();
        manager.complete_quest("Q2").unwrap();
        manager.start_quest("Q3").unwrap();

        let before: Vec<_> = manager
            .all()
            .map(|q| (q.id().to_string(), q.state(), q.all_steps_completed()))
            .collect();

        let mut flags = Vec::new();
        manager.export_flags(&mut flags);
        manager.reset_all_quests();
        assert!(manager.is_empty());
        manager.restore_from_flags(&flags);

        let after: Vec<_> = manager
            .all()
            .map(|q| (q.id().to_string(), q.state(), q.all_steps_completed()))
            .collect();
        assert_eq!(before, after);
        assert!(manager.is_step_completed("Q1", 1));
        assert!(!manager.is_step_completed("Q1", 0));

        // Restored quests are indexed again
        assert_eq!(manager.complete_by_condition("talk:elder"), 1);
        assert_eq!(manager.state("Q1"), Some(QuestState::Completed));
    }

    #[test]
    fn test_restore_is_order_independent_and_lenient() {
        let (mut manager, log) = recording_manager();
        manager.start_quest("Q2").unwrap();
        log.lock().unwrap().clear();

        let flags: Vec<String> = [
            "QUEST_STEP_DONE:Q1:0",
            "SOME_OTHER_FLAG",
            "QUEST_ACTIVE:Q1",
            "QUEST_STEP_DONE:Q1:7",
            "QUEST_STEP_DONE:Q1:x",
            "QUEST_ACTIVE:MISSING",
            "QUEST_STEP_DONE:Q3:0",
        ]
        .iter()
        .map(|s| s.to_string())
        .collect();
        manager.restore_from_flags(&flags);

        assert_eq!(manager.len(), 1);
        assert!(!manager.has_quest("Q2"));
        assert_eq!(manager.state("Q1"), Some(QuestState::Active));
        assert!(manager.is_step_completed("Q1", 0));
        assert!(!manager.is_step_completed("Q1", 1));
        assert_eq!(*log.lock().unwrap(), vec![QuestEvent::Changed]);
    }

    #[test]
    fn test_restore_completed_wins() {
        let (mut manager, _) = recording_manager();
        let flags: Vec<String> = ["QUEST_COMPLETED:Q1", "QUEST_ACTIVE:Q1"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        manager.restore_from_flags(&flags);
        assert_eq!(manager.state("Q1"), Some(QuestState::Completed));
        assert!(manager.are_all_steps_completed("Q1"));
    }

    #[test]
    fn test_restore_failed_beats_active_in_any_order() {
        for order in [
            ["QUEST_ACTIVE:Q1", "QUEST_FAILED:Q1"],
            ["QUEST_FAILED:Q1", "QUEST_ACTIVE:Q1"],
        ] {
            let (mut manager, _) = recording_manager();
            let flags: Vec<String> = order.iter().map(|s| s.to_string()).collect();
            manager.restore_from_flags(&flags);
            assert_eq!(manager.state("Q1"), Some(QuestState::Failed), "order {:?}", order);
        }
    }

    #[test]
    fn test_restore_keeps_active_with_every_step_done() {
        let (mut manager, log) = recording_manager();
        let flags: Vec<String> = [
            "QUEST_ACTIVE:Q1",
            "QUEST_STEP_DONE:Q1:0",
            "QUEST_STEP_DONE:Q1:1",
        ]
        .iter()
        .map(|s| s.to_string())
        .collect();
        manager.restore_from_flags(&flags);

        assert_eq!(manager.state("Q1"), Some(QuestState::Active));
        assert!(manager.are_all_steps_completed("Q1"));
        assert_eq!(*log.lock().unwrap(), vec![QuestEvent::Changed]);
    }

    #[test]
    fn test_add_quest_rejects_padded_id() {
        let (mut manager, log) = recording_manager();
        let padded = Arc::new(QuestDefinition::new(" Q1 ", "Padded"));
        assert!(matches!(
            manager.add_quest(padded),
            Err(QuestError::InvalidDefinition(_))
        ));
        assert!(!manager.has_quest(" Q1 "));
        assert!(log.lock().unwrap().is_empty());
    }

    #[test]
    fn test_reset_clears_index() {
        let (mut manager, _) = recording_manager();
        manager.start_quest("Q1").unwrap();
        manager.reset_all_quests();
        assert!(manager.listeners("talk:elder").is_empty());
        assert_eq!(manager.complete_by_condition("talk:elder"), 0);
        assert_eq!(manager.state("Q1"), None);
    }
}
