use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "tasksync")]
#[command(about = "Manage a local task list and sync it with a server")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Optional path to local database file
    #[arg(long, global = true, value_name = "PATH")]
    pub db_path: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Create a new task
    #[command(alias = "new")]
    Add {
        /// Task title
        title: Vec<String>,
        /// Optional longer description
        #[arg(short, long)]
        description: Option<String>,
    },
    /// List tasks
    List {
        /// Include completed tasks
        #[arg(short, long)]
        all: bool,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Mark a task as completed
    Done {
        /// Task ID or unique ID prefix
        id: String,
    },
    /// Reopen a completed task
    Reopen {
        /// Task ID or unique ID prefix
        id: String,
    },
    /// Delete a task
    Delete {
        /// Task ID or unique ID prefix
        id: String,
    },
    /// Sync pending local changes with the server
    Sync {
        #[command(subcommand)]
        command: Option<SyncCommands>,
        /// Server base URL (or set TASKSYNC_SERVER_URL)
        #[arg(long, global = true, value_name = "URL")]
        server: Option<String>,
    },
}

#[derive(Subcommand)]
pub enum SyncCommands {
    /// Show pending queue depth and last sync time
    Status,
}
