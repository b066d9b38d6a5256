//! Save Flag Format
//!
//! Quest progress is stored in a save profile as plain strings mixed with
//! unrelated gameplay flags:
//!
//! ```text
//! QUEST_COMPLETED:<quest_id>
//! QUEST_ACTIVE:<quest_id>
//! QUEST_FAILED:<quest_id>
//! QUEST_STEP_DONE:<quest_id>:<step_index>
//! ```

use std::fmt;

use super::catalog::QuestCatalog;

pub const COMPLETED_PREFIX: &str = "QUEST_COMPLETED:";
pub const ACTIVE_PREFIX: &str = "QUEST_ACTIVE:";
pub const FAILED_PREFIX: &str = "QUEST_FAILED:";
pub const STEP_DONE_PREFIX: &str = "QUEST_STEP_DONE:";

/// A parsed quest flag
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QuestFlag<'a> {
    Completed(&'a str),
    Active(&'a str),
    Failed(&'a str),
    StepDone { quest_id: &'a str, step_index: usize },
}

/// Why a quest-prefixed flag could not be parsed
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FlagParseError {
    /// Prefix present but no quest id after it
    MissingQuestId,
    /// `QUEST_STEP_DONE:` without a `:<index>` suffix
    MissingStepIndex,
    /// Step index is not a non-negative integer
    BadStepIndex(String),
}

impl fmt::Display for FlagParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FlagParseError::MissingQuestId => write!(f, "missing quest id"),
            FlagParseError::MissingStepIndex => write!(f, "missing step index"),
            FlagParseError::BadStepIndex(raw) => write!(f, "bad step index '{}'", raw),
        }
    }
}

/// True if the flag uses one of the quest prefixes, parseable or not
pub fn is_quest_flag(flag: &str) -> bool {
    [COMPLETED_PREFIX, ACTIVE_PREFIX, FAILED_PREFIX, STEP_DONE_PREFIX]
        .iter()
        .any(|p| flag.starts_with(p))
}

impl<'a> QuestFlag<'a> {
    /// Parse a flag. `None` means the flag is not a quest flag at all.
    pub fn parse(flag: &'a str) -> Option<Result<Self, FlagParseError>> {
        if let Some(id) = flag.strip_prefix(COMPLETED_PREFIX) {
            return Some(non_empty(id).map(QuestFlag::Completed));
        }
        if let Some(id) = flag.strip_prefix(ACTIVE_PREFIX) {
            return Some(non_empty(id).map(QuestFlag::Active));
        }
        if let Some(id) = flag.strip_prefix(FAILED_PREFIX) {
            return Some(non_empty(id).map(QuestFlag::Failed));
        }
        if let Some(rest) = flag.strip_prefix(STEP_DONE_PREFIX) {
            return Some(parse_step_done(rest));
        }
        None
    }

    pub fn quest_id(&self) -> &'a str {
        match self {
            QuestFlag::Completed(id) | QuestFlag::Active(id) | QuestFlag::Failed(id) => id,
            QuestFlag::StepDone { quest_id, .. } => quest_id,
        }
    }
}

impl fmt::Display for QuestFlag<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QuestFlag::Completed(id) => write!(f, "{}{}", COMPLETED_PREFIX, id),
            QuestFlag::Active(id) => write!(f, "{}{}", ACTIVE_PREFIX, id),
            QuestFlag::Failed(id) => write!(f, "{}{}", FAILED_PREFIX, id),
            QuestFlag::StepDone {
                quest_id,
                step_index,
            } => write!(f, "{}{}:{}", STEP_DONE_PREFIX, quest_id, step_index),
        }
    }
}

fn non_empty(id: &str) -> Result<&str, FlagParseError> {
    if id.is_empty() {
        Err(FlagParseError::MissingQuestId)
    } else {
        Ok(id)
    }
}

fn parse_step_done(rest: &str) -> Result<QuestFlag<'_>, FlagParseError> {
    // Split on the last ':' so quest ids may themselves contain colons
    let (quest_id, index) = rest
        .rsplit_once(':')
        .ok_or(FlagParseError::MissingStepIndex)?;
    let quest_id = non_empty(quest_id)?;
    let step_index = index
        .parse::<usize>()
        .map_err(|_| FlagParseError::BadStepIndex(index.to_string()))?;
    Ok(QuestFlag::StepDone {
        quest_id,
        step_index,
    })
}

// ============================================================================
// Audit
// ============================================================================

/// A problem found in a stored flag list
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FlagIssue {
    Malformed { flag: String, error: FlagParseError },
    UnknownQuest { flag: String, quest_id: String },
    StepOutOfRange { flag: String, step_count: usize },
}

impl fmt::Display for FlagIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FlagIssue::Malformed { flag, error } => write!(f, "{}: {}", flag, error),
            FlagIssue::UnknownQuest { flag, quest_id } => {
                write!(f, "{}: quest '{}' is not in the catalog", flag, quest_id)
            }
            FlagIssue::StepOutOfRange { flag, step_count } => {
                write!(f, "{}: quest only has {} steps", flag, step_count)
            }
        }
    }
}

/// Report quest flags that a restore would skip. Non-quest flags are ignored.
pub fn audit<'a, I>(flags: I, catalog: &QuestCatalog) -> Vec<FlagIssue>
where
    I: IntoIterator<Item = &'a String>,
{
    let mut issues = Vec::new();
    for flag in flags {
        let parsed = match QuestFlag::parse(flag) {
            None => continue,
            Some(Err(error)) => {
                issues.push(FlagIssue::Malformed {
                    flag: flag.clone(),
                    error,
                });
                continue;
            }
            Some(Ok(parsed)) => parsed,
        };

        let Some(def) = catalog.get(parsed.quest_id()) else {
            issues.push(FlagIssue::UnknownQuest {
                flag: flag.clone(),
                quest_id: parsed.quest_id().to_string(),
            });
            continue;
        };

        if let QuestFlag::StepDone { step_index, .. } = parsed {
            if step_index >= def.step_count() {
                issues.push(FlagIssue::StepOutOfRange {
                    flag: flag.clone(),
                    step_count: def.step_count(),
                });
            }
        }
    }
    issues
}
