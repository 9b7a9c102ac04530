//! # tally
//!
//! Command-line front end for the shared task list. Loads the collection,
//! runs one command, then waits for the debounced save to land before
//! exiting.

#![deny(unsafe_code)]

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use tally_core::logging::init_subscriber;
use tally_core::{AssigneeFilter, IdGenerator, Priority, Task};
use tally_settings::{TallySettings, resolve_data_dir};
use tally_store::{
    FileStorage, PersistenceScheduler, SaveStatus, SchedulerConfig, StorageBackend, TaskStore,
};
use tracing::debug;

/// Shared household task tracker.
#[derive(Parser, Debug)]
#[command(name = "tally", about = "Shared household task tracker", version)]
struct Cli {
    /// Directory holding the task data (overrides settings).
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List tasks, newest first.
    List {
        /// Participant name, or "All".
        #[arg(long, default_value = "All")]
        assignee: AssigneeFilter,
    },
    /// Add a task.
    Add {
        /// Task title.
        title: String,
        /// Participant the task is for.
        #[arg(long)]
        assignee: String,
        /// Low, Medium, or High.
        #[arg(long, default_value = "Medium")]
        priority: Priority,
        /// Optional details.
        #[arg(long)]
        description: Option<String>,
    },
    /// Mark a task done, or not done.
    Toggle {
        /// Task ID.
        id: String,
    },
    /// Delete a task.
    Delete {
        /// Task ID.
        id: String,
    },
    /// Print a sync code for the whole list.
    Export,
    /// Replace the whole list with the contents of a sync code.
    Import {
        /// Sync code from another device.
        code: String,
    },
    /// Show pending and completed totals.
    Stats,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let settings = tally_settings::get_settings();
    init_subscriber(&settings.logging.level);

    let data_dir = cli
        .data_dir
        .clone()
        .unwrap_or_else(|| resolve_data_dir(settings));
    let (mut store, worker) = open_store(settings, &data_dir);
    let status = store.persistence().map(PersistenceScheduler::watch);

    let outcome = run(cli.command, &mut store);

    drop(store);
    worker.await.context("persistence worker panicked")?;
    if status.is_some_and(|s| *s.borrow() == SaveStatus::Error) {
        bail!("failed to save tasks to {}", data_dir.display());
    }
    outcome
}

/// Load the persisted list and attach a scheduler writing back to it.
fn open_store(
    settings: &TallySettings,
    data_dir: &Path,
) -> (TaskStore, tokio::task::JoinHandle<()>) {
    debug!(dir = %data_dir.display(), "opening task store");
    let storage: Arc<dyn StorageBackend> = Arc::new(FileStorage::new(data_dir));
    let key = settings.storage.key.clone();

    let (scheduler, worker) = PersistenceScheduler::spawn(
        Arc::clone(&storage),
        key.clone(),
        SchedulerConfig::from(&settings.persistence),
    );
    let mut store = TaskStore::new(settings.participant_set(), IdGenerator::new())
        .with_persistence(scheduler);
    store.load(storage.as_ref(), &key);
    (store, worker)
}

fn run(command: Command, store: &mut TaskStore) -> Result<()> {
    match command {
        Command::List { assignee } => {
            let tasks = store.filter_by_assignee(&assignee);
            if tasks.is_empty() {
                println!("No tasks.");
            }
            for task in tasks {
                println!("{}", render(task));
            }
        }
        Command::Add {
            title,
            assignee,
            priority,
            description,
        } => match store.add_manual(&title, &assignee, priority, description.as_deref())? {
            Some(task) => println!("Added {}", render(task)),
            None => println!("Nothing added: title is blank."),
        },
        Command::Toggle { id } => {
            if !store.toggle(&id) {
                bail!("no task with id {id}");
            }
            if let Some(task) = store.get(&id) {
                println!("{}", render(task));
            }
        }
        Command::Delete { id } => {
            if !store.delete(&id) {
                bail!("no task with id {id}");
            }
            println!("Deleted {id}");
        }
        Command::Export => println!("{}", store.export_code()),
        Command::Import { code } => {
            let count = store.import_code(&code).context("could not import sync code")?;
            println!("Imported {count} tasks.");
        }
        Command::Stats => {
            let counts = store.counts();
            println!("{} pending, {} completed", counts.pending, counts.completed);
        }
    }
    Ok(())
}

fn render(task: &Task) -> String {
    let mark = if task.is_completed { "x" } else { " " };
    let mut line = format!(
        "[{mark}] {} {} ({}, {})",
        task.id, task.title, task.assignee, task.priority
    );
    if let Some(ref description) = task.description {
        line.push_str(" - ");
        line.push_str(description);
    }
    line
}
