use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use chrono::Local;
use clap::{Parser, Subcommand};
use tokio::sync::mpsc::{UnboundedReceiver, unbounded_channel};
use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use thread_tracker::app::Tracker;
use thread_tracker::app::refresh::BatchStatus;
use thread_tracker::config::{self, DEFAULT_SITE_URL, Settings};
use thread_tracker::game::collection::CollectionEvent;
use thread_tracker::game::record::GameRecord;
use thread_tracker::game::sort::SortOrder;
use thread_tracker::game::sources::HttpTitleSource;
use thread_tracker::game::store::CollectionStore;

#[derive(Parser)]
#[command(name = "thread-tracker")]
#[command(version, about = "Tracks forum game threads and checks them for new versions")]
struct Cli {
    /// Directory holding the collection, settings and log files
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Forum the tracked threads live on
    #[arg(long, global = true, default_value = DEFAULT_SITE_URL)]
    site_url: String,

    /// Write the log file as JSON lines
    #[arg(long, global = true)]
    json_log: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List tracked games in display order
    List {
        /// Only show games whose name contains this text
        #[arg(long, default_value = "")]
        filter: String,
        /// Change and remember the display order
        #[arg(long)]
        sort: Option<SortOrder>,
        /// Change and remember whether favorites are listed first
        #[arg(long)]
        favorites_first: Option<bool>,
    },
    /// List the groups in use
    Groups,
    /// Start tracking a thread
    Add { url: String },
    /// Stop tracking a game
    Remove { id: String },
    /// Mark the latest version of a game as the one you have
    Sync { id: String },
    /// Check one game, or all of them, for a new version
    Refresh { id: Option<String> },
    /// Mark the version you have as finished
    Finish {
        id: String,
        #[arg(long)]
        undo: bool,
    },
    /// Mark a game as favorite
    Favorite {
        id: String,
        #[arg(long)]
        undo: bool,
    },
    /// Move a game to a group; an empty name clears the group
    Group { id: String, name: String },
    /// Set the version you have
    SetVersion { id: String, version: String },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?
        .block_on(run(cli))
}

fn init_logging(data_dir: &Path, json: bool) -> anyhow::Result<WorkerGuard> {
    fs::create_dir_all(data_dir)
        .with_context(|| format!("Failed to create data directory {:?}", data_dir))?;

    let log_path = config::log_path(data_dir);
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)
        .with_context(|| format!("Failed to open log file {:?}", log_path))?;
    let (writer, guard) = tracing_appender::non_blocking(file);

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let registry = tracing_subscriber::registry().with(env_filter);

    if json {
        registry
            .with(fmt::layer().json().with_writer(writer))
            .init();
    } else {
        registry
            .with(fmt::layer().with_ansi(false).with_writer(writer))
            .init();
    }

    Ok(guard)
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let data_dir = cli.data_dir.unwrap_or_else(config::data_dir);
    let _guard = init_logging(&data_dir, cli.json_log)?;

    let settings_path = config::settings_path(&data_dir);
    let mut settings = Settings::load(&settings_path);

    let (events, progress) = unbounded_channel();
    let tracker = Tracker::new(
        Arc::new(HttpTitleSource::new(&cli.site_url)),
        CollectionStore::new(config::collection_path(&data_dir)),
        cli.site_url.clone(),
        settings.sort_policy(),
    )
    .with_events(events);
    tokio::spawn(print_progress(progress));

    match cli.command {
        Command::List {
            filter,
            sort,
            favorites_first,
        } => {
            if sort.is_some() || favorites_first.is_some() {
                settings.sort_order = sort.unwrap_or(settings.sort_order);
                settings.prioritize_favorites =
                    favorites_first.unwrap_or(settings.prioritize_favorites);
                tracker.set_sort_policy(settings.sort_policy()).await;
                settings.save(&settings_path);
            }

            print_games(&tracker.list(&filter).await);
            match settings.last_checked {
                Some(at) => println!("\nLast checked: {}", at.format("%Y-%m-%d %H:%M")),
                None => println!("\nNever checked for updates"),
            }
        }
        Command::Groups => {
            for group in tracker.groups().await {
                println!("{}", group);
            }
        }
        Command::Add { url } => {
            let id = tracker.add_by_url(&url).await?;
            if let Some(record) = tracker.get(&id).await {
                println!(
                    "Added {} ({}) at {}",
                    record.name(),
                    id,
                    record.latest_version()
                );
            }
        }
        Command::Remove { id } => {
            let removed = tracker.remove(&id).await?;
            println!("Removed {}", removed.name());
        }
        Command::Sync { id } => {
            if tracker.sync_version(&id).await? {
                println!("{} is now on the latest version", id);
            } else {
                println!("{} already has the latest version", id);
            }
        }
        Command::Refresh { id: Some(id) } => {
            let outcome = tracker.refresh_one(&id).await?;
            println!("{}: {}", id, outcome);
        }
        Command::Refresh { id: None } => {
            let cancel = tracker.cancel_handle();
            let ctrl_c = tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    warn!("Interrupted, stopping after the current game");
                    cancel.cancel();
                }
            });

            let result = tracker.refresh_all().await;
            ctrl_c.abort();

            let report = match result {
                Ok(report) => report,
                Err(e) => {
                    // Games checked before the failure keep their new versions
                    save_changes(&tracker).await?;
                    return Err(e.into());
                }
            };

            if report.status == BatchStatus::Completed {
                settings.last_checked = Some(Local::now());
                settings.save(&settings_path);
            }

            println!(
                "Checked {} games: {} updated, {} without a readable version{}",
                report.processed,
                report.updated.len(),
                report.parse_failures.len(),
                if report.status == BatchStatus::Cancelled {
                    " (cancelled)"
                } else {
                    ""
                }
            );
            for id in &report.updated {
                if let Some(record) = tracker.get(id).await {
                    println!("  {} -> {}", record.name(), record.latest_version());
                }
            }
        }
        Command::Finish { id, undo } => {
            tracker.set_version_finished(&id, !undo).await?;
        }
        Command::Favorite { id, undo } => {
            tracker.set_favorite(&id, !undo).await?;
        }
        Command::Group { id, name } => {
            tracker.set_group(&id, &name).await?;
        }
        Command::SetVersion { id, version } => {
            tracker.set_current_version(&id, &version).await?;
        }
    }

    save_changes(&tracker).await
}

async fn print_progress(mut events: UnboundedReceiver<CollectionEvent>) {
    while let Some(event) = events.recv().await {
        if let CollectionEvent::Checking {
            id,
            position,
            total,
        } = event
        {
            eprintln!("[{}/{}] Checking {}", position, total, id);
        }
    }
}

async fn save_changes(tracker: &Tracker) -> anyhow::Result<()> {
    if !tracker.has_changes().await {
        return Ok(());
    }

    tracker.save().await?;
    info!("Collection saved");
    Ok(())
}

fn print_games(games: &[GameRecord]) {
    if games.is_empty() {
        println!("No games tracked");
        return;
    }

    println!(
        "{:<8} {:<40} {:<16} {:<14} {:<14} FLAGS",
        "ID", "NAME", "GROUP", "CURRENT", "LATEST"
    );
    for game in games {
        let mut flags = String::new();
        if game.is_favorite() {
            flags.push('*');
        }
        if game.is_version_finished() {
            flags.push('F');
        }
        if game.has_current_version() && !game.versions_match() {
            flags.push('U');
        }

        println!(
            "{:<8} {:<40} {:<16} {:<14} {:<14} {}",
            game.id(),
            game.name(),
            game.group(),
            game.current_version(),
            game.latest_version(),
            flags
        );
    }
}
