//! Quest State Tracking
//!
//! Mutable per-playthrough wrapper around a shared quest definition.

use std::sync::Arc;

use super::definition::QuestDefinition;

/// Progression state of a quest
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QuestState {
    /// Registered but not started
    Inactive,
    /// Started and in progress
    Active,
    /// Finished, all steps implied done
    Completed,
    /// Explicitly failed by gameplay
    Failed,
}

impl QuestState {
    pub fn as_str(&self) -> &'static str {
        match self {
            QuestState::Inactive => "inactive",
            QuestState::Active => "active",
            QuestState::Completed => "completed",
            QuestState::Failed => "failed",
        }
    }
}

impl std::fmt::Display for QuestState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Runtime progress on a single step
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StepRuntime {
    pub completed: bool,
}

/// A registered quest and its progress
#[derive(Debug, Clone)]
pub struct RuntimeQuest {
    definition: Arc<QuestDefinition>,
    state: QuestState,
    /// Indexed identically to `definition.steps`
    steps: Vec<StepRuntime>,
}

impl RuntimeQuest {
    pub fn new(definition: Arc<QuestDefinition>) -> Self {
        let steps = vec![StepRuntime::default(); definition.steps.len()];
        Self {
            definition,
            state: QuestState::Inactive,
            steps,
        }
    }

    pub fn id(&self) -> &str {
        &self.definition.id
    }

    pub fn definition(&self) -> &Arc<QuestDefinition> {
        &self.definition
    }

    pub fn state(&self) -> QuestState {
        self.state
    }

    pub(crate) fn set_state(&mut self, state: QuestState) {
        self.state = state;
    }

    pub fn steps(&self) -> &[StepRuntime] {
        &self.steps
    }

    pub fn step_count(&self) -> usize {
        self.steps.len()
    }

    /// None if the index is out of range
    pub fn is_step_completed(&self, step_index: usize) -> Option<bool> {
        self.steps.get(step_index).map(|s| s.completed)
    }

    /// Mark a step done. Returns true if it was newly completed.
    pub(crate) fn complete_step(&mut self, step_index: usize) -> bool {
        match self.steps.get_mut(step_index) {
            Some(step) if !step.completed => {
                step.completed = true;
                true
            }
            _ => false,
        }
    }

    pub(crate) fn complete_all_steps(&mut self) {
        for step in self.steps.iter_mut() {
            step.completed = true;
        }
    }

    /// True when every step is done (vacuously true for quests without steps)
    pub fn all_steps_completed(&self) -> bool {
        self.steps.iter().all(|s| s.completed)
    }

    pub fn completed_step_indices(&self) -> impl Iterator<Item = usize> + '_ {
        self.steps
            .iter()
            .enumerate()
            .filter(|(_, s)| s.completed)
            .map(|(i, _)| i)
    }

    /// Fraction of steps done, 1.0 for quests without steps
    pub fn progress(&self) -> f32 {
        if self.steps.is_empty() {
            return 1.0;
        }
        self.completed_step_indices().count() as f32 / self.steps.len() as f32
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::quest::definition::StepDefinition;

    fn two_step_quest() -> RuntimeQuest {
        let def = QuestDefinition::new("q1", "Quest One")
            .with_step(StepDefinition::new("first"))
            .with_step(StepDefinition::new("second"));
        RuntimeQuest::new(Arc::new(def))
    }

    #[test]
    fn test_steps_match_definition() {
        let quest = two_step_quest();
        assert_eq!(quest.state(), QuestState::Inactive);
        assert_eq!(quest.step_count(), quest.definition().steps.len());
        assert_eq!(quest.is_step_completed(0), Some(false));
        assert_eq!(quest.is_step_completed(2), None);
    }

    #[test]
    fn test_complete_step() {
        let mut quest = two_step_quest();
        assert!(quest.complete_step(1));
        assert!(!quest.complete_step(1));
        assert!(!quest.complete_step(5));
        assert!(!quest.all_steps_completed());
        assert_eq!(quest.completed_step_indices().collect::<Vec<_>>(), vec![1]);
        assert_eq!(quest.progress(), 0.5);

        quest.complete_all_steps();
        assert!(quest.all_steps_completed());
    }

    #[test]
    fn test_state_display() {
        assert_eq!(QuestState::Failed.to_string(), "failed");
        assert_eq!(QuestState::Inactive.as_str(), "inactive");
    }

    #[test]
    fn test_progress_without_steps() {
        let quest = RuntimeQuest::new(Arc::new(QuestDefinition::new("q0", "Empty")));
        assert!(quest.all_steps_completed());
        assert_eq!(quest.progress(), 1.0);
    }
}
