//! Save Profiles
//!
//! Profile payload, persistence bridges between profiles and the live
//! registries, the session that ties them together and the SQLite store.

pub mod bridge;
pub mod profile;
pub mod session;
pub mod store;

pub use bridge::{
    BossProgressPersistenceBridge, PersistenceBridge, ProgressState, QuestPersistenceBridge,
};
pub use profile::SaveProfile;
pub use session::ProgressSession;
pub use store::{SaveStore, SlotSummary};
