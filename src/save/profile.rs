//! Save Profile
//!
//! The payload written to disk for one save slot. Quest progress lives in the
//! flag list next to unrelated gameplay flags; boss defeats are a plain id list.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::quest::flags;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaveProfile {
    /// Save slot name, unique per store
    pub slot: String,
    /// Identifies one playthrough; regenerated on new game
    pub profile_id: Uuid,
    /// Ordered gameplay flags, quest flags included
    #[serde(default)]
    pub flags: Vec<String>,
    #[serde(default)]
    pub defeated_bosses: Vec<String>,
    /// When the profile was last written to the store
    #[serde(default)]
    pub saved_at: Option<DateTime<Utc>>,
}

impl SaveProfile {
    /// Fresh profile for a new playthrough
    pub fn new(slot: impl Into<String>) -> Self {
        Self {
            slot: slot.into(),
            profile_id: Uuid::new_v4(),
            flags: Vec::new(),
            defeated_bosses: Vec::new(),
            saved_at: None,
        }
    }

    pub fn has_flag(&self, flag: &str) -> bool {
        self.flags.iter().any(|f| f == flag)
    }

    /// Add a gameplay flag if not already present
    pub fn set_flag(&mut self, flag: impl Into<String>) -> bool {
        let flag = flag.into();
        if self.has_flag(&flag) {
            return false;
        }
        self.flags.push(flag);
        true
    }

    pub fn clear_flag(&mut self, flag: &str) -> bool {
        let before = self.flags.len();
        self.flags.retain(|f| f != flag);
        self.flags.len() != before
    }

    /// Flags that are not quest progress, in stored order
    pub fn non_quest_flags(&self) -> impl Iterator<Item = &String> {
        self.flags.iter().filter(|f| !flags::is_quest_flag(f))
    }

    /// Replace all quest flags, keeping other flags in their original order
    pub fn replace_quest_flags(&mut self, quest_flags: Vec<String>) {
        self.flags.retain(|f| !flags::is_quest_flag(f));
        self.flags.extend(quest_flags);
    }
}
