//! Quest and boss progress tracking.
//!
//! Quest definitions are authored as TOML files and loaded into a
//! [`QuestCatalog`]. A [`QuestManager`] tracks per-playthrough progress,
//! completing steps when gameplay raises condition ids, and a
//! [`BossProgressTracker`] records defeated bosses. Both persist into a
//! [`SaveProfile`] as flat string lists through a [`ProgressSession`].

pub mod boss;
pub mod config;
pub mod error;
pub mod events;
pub mod quest;
pub mod save;

pub use boss::{BossEvent, BossProgressTracker};
pub use config::AppConfig;
pub use error::{BossError, CatalogError, ConfigError, QuestError, SessionError, StoreError};
pub use events::{EventBus, SubscriptionId};
pub use quest::{QuestCatalog, QuestDefinition, QuestEvent, QuestManager, QuestState, StepDefinition};
pub use save::{ProgressSession, SaveProfile, SaveStore};
