//! Quest System Module
//!
//! TOML-authored quest definitions, a runtime registry with condition-driven
//! step completion, and the flag format used to persist progress.

pub mod catalog;
pub mod definition;
pub mod events;
pub mod flags;
pub mod manager;
pub mod state;

pub use catalog::{CatalogReloadEvent, CatalogWatcher, QuestCatalog};
pub use definition::{QuestDefinition, StepDefinition};
pub use events::QuestEvent;
pub use flags::{FlagIssue, QuestFlag};
pub use manager::{QuestManager, StepRef};
pub use state::{QuestState, RuntimeQuest, StepRuntime};
