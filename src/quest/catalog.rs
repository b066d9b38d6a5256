//! Quest Catalog
//!
//! Loads and caches quest definitions from TOML files. Definitions are shared
//! with runtime quests through `Arc` and never mutated after load; a reload
//! builds a fresh catalog.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use super::definition::{QuestDefinition, RawQuestFile};
use crate::error::{CatalogError, QuestError};

/// Catalog of authored quest definitions
#[derive(Debug, Clone, Default)]
pub struct QuestCatalog {
    quests: HashMap<String, Arc<QuestDefinition>>,
}

impl QuestCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load every `*.toml` under `<data_dir>/quests`, recursively.
    ///
    /// A file that fails to read or parse is logged and skipped; a missing
    /// quest directory yields an empty catalog.
    pub fn load_from_directory(data_dir: &Path) -> Result<Self, CatalogError> {
        let quests_dir = data_dir.join("quests");
        let mut catalog = Self::new();

        info!("Loading quests from {:?}", quests_dir);

        if !quests_dir.exists() {
            warn!("Quest directory does not exist: {:?}", quests_dir);
            return Ok(catalog);
        }

        let mut paths = Vec::new();
        collect_toml_files(&quests_dir, &mut paths)?;
        paths.sort();

        for path in paths {
            match load_quest_file(&path) {
                Ok(quest) => {
                    if catalog.quests.contains_key(&quest.id) {
                        warn!("Duplicate quest ID '{}' in {:?}, overwriting", quest.id, path);
                    }
                    debug!("Loaded quest: {} ({})", quest.name, quest.id);
                    catalog.quests.insert(quest.id.clone(), Arc::new(quest));
                }
                Err(e) => warn!("Failed to load quest {:?}: {}", path, e),
            }
        }

        info!("Loaded {} quest definitions", catalog.len());
        Ok(catalog)
    }

    /// Add a definition built in code. Replaces any quest with the same id.
    pub fn insert(&mut self, definition: QuestDefinition) -> Result<Arc<QuestDefinition>, QuestError> {
        if definition.id.trim().is_empty() {
            return Err(QuestError::InvalidDefinition(
                "quest id cannot be empty".to_string(),
            ));
        }
        if definition.id.trim() != definition.id {
            return Err(QuestError::InvalidDefinition(format!(
                "quest id '{}' has surrounding whitespace",
                definition.id
            )));
        }
        let definition = Arc::new(definition);
        self.quests
            .insert(definition.id.clone(), Arc::clone(&definition));
        Ok(definition)
    }

    /// Get a quest definition by ID
    pub fn get(&self, quest_id: &str) -> Option<Arc<QuestDefinition>> {
        self.quests.get(quest_id).cloned()
    }

    pub fn contains(&self, quest_id: &str) -> bool {
        self.quests.contains_key(quest_id)
    }

    /// All quest IDs, sorted
    pub fn ids(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = self.quests.keys().map(String::as_str).collect();
        ids.sort_unstable();
        ids
    }

    pub fn all(&self) -> impl Iterator<Item = &Arc<QuestDefinition>> {
        self.quests.values()
    }

    /// Conditions that more than one step listens for, with their listeners.
    /// Useful when checking authored data for accidental collisions.
    pub fn shared_conditions(&self) -> Vec<(&str, Vec<(&str, usize)>)> {
        let mut by_condition: HashMap<&str, Vec<(&str, usize)>> = HashMap::new();
        for quest in self.quests.values() {
            for (step, condition) in quest.conditions() {
                by_condition
                    .entry(condition)
                    .or_default()
                    .push((quest.id.as_str(), step));
            }
        }
        let mut shared: Vec<_> = by_condition
            .into_iter()
            .filter(|(_, listeners)| listeners.len() > 1)
            .map(|(condition, mut listeners)| {
                listeners.sort_unstable();
                (condition, listeners)
            })
            .collect();
        shared.sort_unstable_by(|a, b| a.0.cmp(b.0));
        shared
    }

    pub fn len(&self) -> usize {
        self.quests.len()
    }

    pub fn is_empty(&self) -> bool {
        self.quests.is_empty()
    }
}

/// Recursively collect quest files (non-async to avoid boxing)
fn collect_toml_files(dir: &Path, paths: &mut Vec<PathBuf>) -> Result<(), CatalogError> {
    let entries = std::fs::read_dir(dir).map_err(|source| CatalogError::Io {
        path: dir.to_path_buf(),
        source,
    })?;

    for entry in entries {
        let entry = entry.map_err(|source| CatalogError::Io {
            path: dir.to_path_buf(),
            source,
        })?;
        let path = entry.path();

        if path.is_dir() {
            collect_toml_files(&path, paths)?;
        } else if path.extension().is_some_and(|ext| ext == "toml") {
            paths.push(path);
        }
    }

    Ok(())
}

fn load_quest_file(path: &Path) -> Result<QuestDefinition, CatalogError> {
    let content = std::fs::read_to_string(path).map_err(|source| CatalogError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let raw: RawQuestFile = toml::from_str(&content).map_err(|source| CatalogError::Parse {
        path: path.to_path_buf(),
        source,
    })?;

    QuestDefinition::from_raw(&raw.quest).map_err(|reason| CatalogError::Invalid {
        path: path.to_path_buf(),
        reason,
    })
}

// ============================================================================
// Hot Reload
// ============================================================================

/// Events from the hot-reload watcher
#[derive(Debug, Clone)]
pub enum CatalogReloadEvent {
    /// The catalog was rebuilt after a change to the given file
    Reloaded {
        path: PathBuf,
        catalog: Arc<QuestCatalog>,
    },
    /// Rebuilding failed; the previous catalog stays in use
    Error(String),
}

/// Watches the quest directory and rebuilds the catalog on change.
///
/// Dropping the watcher stops it.
pub struct CatalogWatcher {
    _watcher: notify::RecommendedWatcher,
}

impl CatalogWatcher {
    /// Start watching `<data_dir>/quests`. Reload events arrive on the
    /// returned channel; the caller swaps the new catalog in.
    pub fn start(
        data_dir: &Path,
    ) -> Result<(Self, mpsc::Receiver<CatalogReloadEvent>), CatalogError> {
        use notify::{Config, EventKind, RecommendedWatcher, RecursiveMode, Watcher};

        let (tx, rx) = mpsc::channel(32);
        let quests_dir = data_dir.join("quests");
        let reload_root = data_dir.to_path_buf();

        let mut watcher = RecommendedWatcher::new(
            move |res: Result<notify::Event, notify::Error>| {
                let event = match res {
                    Ok(event) => event,
                    Err(e) => {
                        error!("Quest watcher error: {}", e);
                        return;
                    }
                };
                if !matches!(event.kind, EventKind::Modify(_) | EventKind::Create(_) | EventKind::Remove(_)) {
                    return;
                }
                let Some(path) = event
                    .paths
                    .iter()
                    .find(|p| p.extension().is_some_and(|ext| ext == "toml"))
                else {
                    return;
                };

                info!("Detected change in {:?}, reloading quest catalog", path);
                let message = match QuestCatalog::load_from_directory(&reload_root) {
                    Ok(catalog) => CatalogReloadEvent::Reloaded {
                        path: path.clone(),
                        catalog: Arc::new(catalog),
                    },
                    Err(e) => {
                        error!("Hot-reload failed: {}", e);
                        CatalogReloadEvent::Error(e.to_string())
                    }
                };
                // Receiver gone means nobody cares about reloads any more
                let _ = tx.blocking_send(message);
            },
            Config::default().with_poll_interval(Duration::from_secs(1)),
        )?;

        if quests_dir.exists() {
            watcher.watch(&quests_dir, RecursiveMode::Recursive)?;
            info!("Quest hot-reload watcher started for {:?}", quests_dir);
        } else {
            warn!("Quest directory {:?} does not exist, hot-reload idle", quests_dir);
        }

        Ok((Self { _watcher: watcher }, rx))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn create_test_quest_toml(id: &str) -> String {
        format!(
            r#"
[quest]
id = "{id}"
name = "Test Quest"
description = "A test quest"

[[quest.steps]]
description = "Talk to the smith"
condition = "talk:smith"

[[quest.steps]]
description = "Bring ore"
condition = "item:ore"
"#
        )
    }

    #[test]
    fn test_load_quests_recursively() {
        let temp_dir = TempDir::new().unwrap();
        let quest_dir = temp_dir.path().join("quests");
        std::fs::create_dir_all(quest_dir.join("act1")).unwrap();

        std::fs::write(quest_dir.join("a.toml"), create_test_quest_toml("a")).unwrap();
        std::fs::write(quest_dir.join("act1").join("b.toml"), create_test_quest_toml("b")).unwrap();
        std::fs::write(quest_dir.join("broken.toml"), "[quest\nid=").unwrap();
        std::fs::write(quest_dir.join("notes.txt"), "ignored").unwrap();

        let catalog = QuestCatalog::load_from_directory(temp_dir.path()).unwrap();

        assert_eq!(catalog.ids(), vec!["a", "b"]);
        let quest = catalog.get("b").unwrap();
        assert_eq!(quest.name, "Test Quest");
        assert_eq!(quest.step_count(), 2);
    }

    #[test]
    fn test_missing_directory_is_empty() {
        let temp_dir = TempDir::new().unwrap();
        let catalog = QuestCatalog::load_from_directory(temp_dir.path()).unwrap();
        assert!(catalog.is_empty());
    }

    #[test]
    fn test_shared_conditions() {
        let temp_dir = TempDir::new().unwrap();
        let quest_dir = temp_dir.path().join("quests");
        std::fs::create_dir_all(&quest_dir).unwrap();
        std::fs::write(quest_dir.join("a.toml"), create_test_quest_toml("a")).unwrap();
        std::fs::write(quest_dir.join("b.toml"), create_test_quest_toml("b")).unwrap();

        let catalog = QuestCatalog::load_from_directory(temp_dir.path()).unwrap();
        let shared = catalog.shared_conditions();

        assert_eq!(shared.len(), 2);
        assert_eq!(shared[0].0, "item:ore");
        assert_eq!(shared[0].1, vec![("a", 1), ("b", 1)]);
    }

    #[test]
    fn test_bundled_data_loads() {
        let data_dir = Path::new(env!("CARGO_MANIFEST_DIR")).join("data");
        let catalog = QuestCatalog::load_from_directory(&data_dir).unwrap();

        assert_eq!(catalog.ids(), vec!["herbalist", "lost_pendant", "tomb_guardian"]);
        assert!(catalog.shared_conditions().is_empty());
    }

    async fn next_reload(rx: &mut mpsc::Receiver<CatalogReloadEvent>) -> Arc<QuestCatalog> {
        loop {
            let event = tokio::time::timeout(Duration::from_secs(10), rx.recv())
                .await
                .expect("no reload within timeout")
                .expect("watcher channel closed");
            if let CatalogReloadEvent::Reloaded { catalog, .. } = event {
                return catalog;
            }
        }
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_watcher_reloads_on_create_and_remove() {
        let temp_dir = TempDir::new().unwrap();
        let quest_dir = temp_dir.path().join("quests");
        std::fs::create_dir_all(&quest_dir).unwrap();
        std::fs::write(quest_dir.join("a.toml"), create_test_quest_toml("a")).unwrap();

        let (_watcher, mut rx) = CatalogWatcher::start(temp_dir.path()).unwrap();

        let new_file = quest_dir.join("b.toml");
        std::fs::write(&new_file, create_test_quest_toml("b")).unwrap();
        let mut catalog = next_reload(&mut rx).await;
        // A write can arrive as several events; wait for the settled catalog
        while !catalog.contains("b") {
            catalog = next_reload(&mut rx).await;
        }
        assert_eq!(catalog.ids(), vec!["a", "b"]);

        std::fs::remove_file(&new_file).unwrap();
        while catalog.contains("b") {
            catalog = next_reload(&mut rx).await;
        }
        assert_eq!(catalog.ids(), vec!["a"]);
    }

    #[test]
    fn test_insert_rejects_empty_id() {
        let mut catalog = QuestCatalog::new();
        assert!(catalog.insert(QuestDefinition::new("", "Nameless")).is_err());
        assert!(catalog.insert(QuestDefinition::new("q ", "Padded")).is_err());
        assert!(catalog.insert(QuestDefinition::new("q", "Named")).is_ok());
        assert!(catalog.contains("q"));
    }
}
