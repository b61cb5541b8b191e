//! tasksync CLI - manage a local task list and sync it with a server

mod cli;
mod commands;
mod error;

use clap::Parser;

use cli::{Cli, Commands, SyncCommands};
use commands::common::resolve_db_path;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let db_path = resolve_db_path(cli.db_path.clone());

    let result = match cli.command {
        Commands::Add { title, description } => {
            commands::add::run_add(&title, description, &db_path)
        }
        Commands::List { all, json } => commands::list::run_list(all, json, &db_path),
        Commands::Done { id } => commands::done::run_set_completed(&id, true, &db_path),
        Commands::Reopen { id } => commands::done::run_set_completed(&id, false, &db_path),
        Commands::Delete { id } => commands::delete::run_delete(&id, &db_path),
        Commands::Sync { command, server } => match command {
            Some(SyncCommands::Status) => commands::sync::run_sync_status(&db_path),
            None => commands::sync::run_sync(server, &db_path).await,
        },
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
