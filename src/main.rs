use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use thiserror::Error;
use tracing::{error, info, warn};

use questline::quest::{flags, CatalogReloadEvent, CatalogWatcher, QuestState};
use questline::{
    AppConfig, BossError, CatalogError, ConfigError, ProgressSession, QuestCatalog, QuestError,
    SaveStore, SessionError, StoreError,
};

const USAGE: &str = "\
usage: questline [--config <path>] <command> [args]

commands:
  validate                         load the quest catalog and report problems
  watch [slot]                     reload the catalog whenever quest files change
                                   (needs hot_reload; with a slot, swaps it into that save)
  slots                            list stored save slots
  show <slot>                      print quest and boss progress for a slot
  audit <slot>                     report stored quest flags a restore would skip
  new <slot>                       start a new game in a slot (overwrites it)
  start <slot> <quest>             start a quest
  step <slot> <quest> <index>      mark a quest step done
  complete <slot> <quest>          force-complete a quest
  fail <slot> <quest>              fail an active quest
  condition <slot> <condition>     raise a gameplay condition
  defeat <slot> <boss>             record a boss defeat";

#[derive(Debug, Error)]
enum CliError {
    #[error("{0}")]
    Usage(String),

    #[error("No save in slot '{0}'")]
    UnknownSlot(String),

    #[error("{0} problem(s) found")]
    Problems(usize),

    #[error("hot_reload is disabled; set hot_reload = true or QUESTLINE_HOT_RELOAD=1")]
    HotReloadDisabled,

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Catalog(#[from] CatalogError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Session(#[from] SessionError),

    #[error(transparent)]
    Quest(#[from] QuestError),

    #[error(transparent)]
    Boss(#[from] BossError),
}

#[tokio::main]
async fn main() -> ExitCode {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("questline=info")),
        )
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(CliError::Usage(msg)) => {
            eprintln!("{}\n\n{}", msg, USAGE);
            ExitCode::from(2)
        }
        Err(e) => {
            error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(mut args: Vec<String>) -> Result<(), CliError> {
    let config_path = take_config_flag(&mut args)?;
    let config = AppConfig::load(config_path.as_deref())?;

    let Some((command, rest)) = args.split_first() else {
        return Err(CliError::Usage("missing command".to_string()));
    };

    let catalog = Arc::new(QuestCatalog::load_from_directory(&config.data_dir)?);

    let store = match (command.as_str(), rest) {
        ("validate", []) => return validate(&catalog),
        ("watch", []) => return watch(&config, catalog, None).await,
        _ => SaveStore::new(&config.database_url).await?,
    };

    match (command.as_str(), rest) {
        ("watch", [slot]) => {
            let session = open_session(&store, Arc::clone(&catalog), slot).await?;
            watch(&config, catalog, Some(session)).await
        }
        ("slots", []) => {
            for slot in store.list_slots().await? {
                let saved = slot
                    .saved_at
                    .map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string())
                    .unwrap_or_else(|| "never".to_string());
                println!("{}\t{}\t{}", slot.slot, slot.profile_id, saved);
            }
            Ok(())
        }
        ("show", [slot]) => {
            let session = open_session(&store, catalog, slot).await?;
            show(&session)
        }
        ("audit", [slot]) => {
            let profile = store
                .load_profile(slot)
                .await?
                .ok_or_else(|| CliError::UnknownSlot(slot.clone()))?;
            let issues = flags::audit(&profile.flags, &catalog);
            for issue in &issues {
                println!("{}", issue);
            }
            if issues.is_empty() {
                println!("{}: no problems", slot);
                Ok(())
            } else {
                Err(CliError::Problems(issues.len()))
            }
        }
        ("new", [slot]) => {
            let mut session = ProgressSession::new(catalog);
            session.new_game(slot.as_str());
            session.save(&store).await?;
            Ok(())
        }
        (op @ ("start" | "complete" | "fail"), [slot, quest_id]) => {
            let mut session = open_session(&store, catalog, slot).await?;
            let quests = session.quests_mut()?;
            let changed = match op {
                "start" => quests.start_quest(quest_id)?,
                "complete" => quests.complete_quest(quest_id)?,
                _ => quests.fail_quest(quest_id)?,
            };
            report_change(changed, &format!("{} {}", op, quest_id));
            session.save(&store).await?;
            Ok(())
        }
        ("step", [slot, quest_id, index]) => {
            let step_index: usize = index
                .parse()
                .map_err(|_| CliError::Usage(format!("bad step index '{}'", index)))?;
            let mut session = open_session(&store, catalog, slot).await?;
            let changed = session.quests_mut()?.mark_step_done(quest_id, step_index)?;
            report_change(changed, &format!("step {} of {}", step_index, quest_id));
            session.save(&store).await?;
            Ok(())
        }
        ("condition", [slot, condition]) => {
            let mut session = open_session(&store, catalog, slot).await?;
            let finished = session.quests_mut()?.complete_by_condition(condition);
            info!("Condition '{}' finished {} step(s)", condition, finished);
            session.save(&store).await?;
            Ok(())
        }
        ("defeat", [slot, boss_id]) => {
            let mut session = open_session(&store, catalog, slot).await?;
            let changed = session.bosses_mut()?.mark_defeated(boss_id)?;
            report_change(changed, &format!("defeat {}", boss_id));
            session.save(&store).await?;
            Ok(())
        }
        _ => Err(CliError::Usage(format!(
            "unknown command or wrong arguments: {}",
            args.join(" ")
        ))),
    }
}

/// Remove `--config <path>` from the argument list
fn take_config_flag(args: &mut Vec<String>) -> Result<Option<PathBuf>, CliError> {
    let Some(pos) = args.iter().position(|a| a == "--config") else {
        return Ok(None);
    };
    if pos + 1 >= args.len() {
        return Err(CliError::Usage("--config needs a path".to_string()));
    }
    let path = args.remove(pos + 1);
    args.remove(pos);
    Ok(Some(PathBuf::from(path)))
}

async fn open_session(
    store: &SaveStore,
    catalog: Arc<QuestCatalog>,
    slot: &str,
) -> Result<ProgressSession, CliError> {
    let profile = store
        .load_profile(slot)
        .await?
        .ok_or_else(|| CliError::UnknownSlot(slot.to_string()))?;
    let mut session = ProgressSession::new(catalog);
    session.profile_ready(profile);
    Ok(session)
}

fn report_change(changed: bool, what: &str) {
    if changed {
        info!("Applied: {}", what);
    } else {
        info!("No change: {}", what);
    }
}

fn validate(catalog: &QuestCatalog) -> Result<(), CliError> {
    for id in catalog.ids() {
        if let Some(quest) = catalog.get(id) {
            println!("{}\t{} step(s)\t{}", quest.id, quest.step_count(), quest.name);
        }
    }
    for (condition, listeners) in catalog.shared_conditions() {
        let steps: Vec<String> = listeners
            .iter()
            .map(|(quest, step)| format!("{}#{}", quest, step))
            .collect();
        warn!("Condition '{}' is shared by {}", condition, steps.join(", "));
    }
    println!("{} quest(s)", catalog.len());
    Ok(())
}

fn show(session: &ProgressSession) -> Result<(), CliError> {
    let quests = session.quests()?;
    for quest in quests.all() {
        let def = quest.definition();
        println!(
            "{} [{}] {} ({:.0}%)",
            def.id,
            quest.state(),
            def.name,
            quest.progress() * 100.0
        );
        if quest.state() == QuestState::Completed {
            continue;
        }
        for (i, (step, progress)) in def.steps.iter().zip(quest.steps()).enumerate() {
            let mark = if progress.completed { "x" } else { " " };
            println!("  [{}] {}. {}", mark, i, step.description);
        }
    }
    let bosses = session.bosses()?;
    if !bosses.is_empty() {
        println!("defeated bosses: {}", bosses.snapshot().join(", "));
    }
    Ok(())
}

async fn watch(
    config: &AppConfig,
    catalog: Arc<QuestCatalog>,
    mut session: Option<ProgressSession>,
) -> Result<(), CliError> {
    if !config.hot_reload {
        return Err(CliError::HotReloadDisabled);
    }
    let (_watcher, mut rx) = CatalogWatcher::start(&config.data_dir)?;
    info!("Watching {} quest(s); press Ctrl-C to stop", catalog.len());

    loop {
        tokio::select! {
            event = rx.recv() => {
                let Some(event) = event else { break };
                if let CatalogReloadEvent::Reloaded { path, catalog } = &event {
                    info!("Quest hot-reload: {:?} ({} quests)", path, catalog.len());
                    validate(catalog)?;
                }
                match session.as_mut() {
                    Some(session) => {
                        if session.apply_reload(&event) {
                            show(session)?;
                        }
                    }
                    None => {
                        if let CatalogReloadEvent::Error(e) = &event {
                            error!("Quest hot-reload error: {}", e);
                        }
                    }
                }
            }
            _ = tokio::signal::ctrl_c() => {
                info!("Stopping watcher");
                break;
            }
        }
    }
    Ok(())
}
