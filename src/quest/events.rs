//! Quest Event Types
//!
//! Events raised by the quest manager after a state change.

/// Notifications emitted by [`super::QuestManager`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QuestEvent {
    /// Quest moved from inactive to active
    Started { quest_id: String },

    /// Quest reached the completed state
    Completed { quest_id: String },

    /// Quest was failed
    Failed { quest_id: String },

    /// A step of an active quest was finished
    StepCompleted { quest_id: String, step_index: usize },

    /// Something in the registry changed. Always follows the specific events
    /// of a mutation, once per effective call.
    Changed,
}

impl QuestEvent {
    /// Quest this event refers to, if any
    pub fn quest_id(&self) -> Option<&str> {
        match self {
            QuestEvent::Started { quest_id }
            | QuestEvent::Completed { quest_id }
            | QuestEvent::Failed { quest_id }
            | QuestEvent::StepCompleted { quest_id, .. } => Some(quest_id),
            QuestEvent::Changed => None,
        }
    }

    /// Get event type as string (for logging/debugging)
    pub fn event_type(&self) -> &'static str {
        match self {
            QuestEvent::Started { .. } => "quest_started",
            QuestEvent::Completed { .. } => "quest_completed",
            QuestEvent::Failed { .. } => "quest_failed",
            QuestEvent::StepCompleted { .. } => "step_completed",
            QuestEvent::Changed => "quests_changed",
        }
    }
}
