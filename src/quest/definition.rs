//! Quest Definition Structures
//!
//! These structures are deserialized from TOML quest files and never change
//! once loaded.

use serde::Deserialize;

/// A quest definition file as it appears on disk
#[derive(Debug, Clone, Deserialize)]
pub struct RawQuestFile {
    pub quest: RawQuest,
}

/// Raw quest data as it appears in TOML
#[derive(Debug, Clone, Deserialize)]
pub struct RawQuest {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// Ordered quest steps
    #[serde(default)]
    pub steps: Vec<RawStep>,
}

/// Raw step as it appears in TOML
#[derive(Debug, Clone, Deserialize)]
pub struct RawStep {
    pub description: String,
    /// Gameplay condition that completes this step when raised
    #[serde(default)]
    pub condition: Option<String>,
}

// ============================================================================
// Resolved Quest Structures (after parsing)
// ============================================================================

/// A single authored step of a quest
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepDefinition {
    pub description: String,
    /// Condition id raised by gameplay systems (triggers, pickups, dialogue)
    pub condition: Option<String>,
}

impl StepDefinition {
    pub fn new(description: impl Into<String>) -> Self {
        Self {
            description: description.into(),
            condition: None,
        }
    }

    pub fn with_condition(mut self, condition: impl Into<String>) -> Self {
        self.condition = Some(condition.into());
        self
    }
}

/// A fully resolved quest definition
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuestDefinition {
    pub id: String,
    pub name: String,
    pub description: String,
    pub steps: Vec<StepDefinition>,
}

impl QuestDefinition {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: String::new(),
            steps: Vec::new(),
        }
    }

    pub fn with_step(mut self, step: StepDefinition) -> Self {
        self.steps.push(step);
        self
    }

    /// Create a QuestDefinition from raw TOML data
    pub fn from_raw(raw: &RawQuest) -> Result<Self, String> {
        let id = raw.id.trim();
        if id.is_empty() {
            return Err("Quest id cannot be empty".to_string());
        }

        let steps = raw
            .steps
            .iter()
            .enumerate()
            .map(|(i, s)| {
                let condition = match s.condition.as_deref().map(str::trim) {
                    Some("") => {
                        return Err(format!("Step {} of '{}' has an empty condition", i, id));
                    }
                    other => other.map(str::to_string),
                };
                Ok(StepDefinition {
                    description: s.description.clone(),
                    condition,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        let name = if raw.name.is_empty() {
            id.to_string()
        } else {
            raw.name.clone()
        };

        Ok(Self {
            id: id.to_string(),
            name,
            description: raw.description.clone(),
            steps,
        })
    }

    pub fn step_count(&self) -> usize {
        self.steps.len()
    }

    /// Iterate `(step_index, condition)` for every step that has a condition
    pub fn conditions(&self) -> impl Iterator<Item = (usize, &str)> {
        self.steps
            .iter()
            .enumerate()
            .filter_map(|(i, s)| s.condition.as_deref().map(|c| (i, c)))
    }
}
