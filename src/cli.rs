//! CLI argument parsing and command dispatch

use anyhow::Result;
use clap::{Parser, Subcommand};

use crate::commands;

/// Odoo Toolbox - maintenance chores for multi-repository Odoo projects
#[derive(Parser, Debug)]
#[command(name = "odoo-toolbox")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    command: Commands,

    /// Colorize output (always, never, auto)
    #[arg(long, global = true, value_name = "WHEN", default_value = "auto")]
    pub color: String,

    /// Set log level (error, warn, info, debug, trace)
    #[arg(long, global = true, value_name = "LEVEL", default_value = "warn")]
    pub log_level: String,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Manage addon requirements
    #[command(subcommand)]
    Addon(commands::addon::AddonCommand),

    /// Manage pending-merge descriptors
    #[command(subcommand)]
    Pending(commands::pending::PendingCommand),

    /// Database chores (create, drop, dump, restore)
    #[command(subcommand)]
    Db(commands::db::DbCommand),

    /// Production migration pipeline
    #[command(subcommand)]
    Migrate(commands::migrate::MigrateCommand),

    /// Project scaffolding
    #[command(subcommand)]
    Project(commands::project::ProjectCommand),

    /// Release management
    #[command(subcommand)]
    Release(commands::release::ReleaseCommand),

    /// Git submodule helpers
    #[command(subcommand)]
    Submodule(commands::submodule::SubmoduleCommand),

    /// Generate shell completions
    Completions(commands::completions::CompletionsArgs),
}

impl Cli {
    /// Execute the CLI command
    pub fn execute(self) -> Result<()> {
        env_logger::Builder::new()
            .parse_filters(&self.log_level)
            .init();

        match self.command {
            Commands::Addon(cmd) => commands::addon::execute(cmd),
            Commands::Pending(cmd) => commands::pending::execute(cmd, &self.color),
            Commands::Db(cmd) => commands::db::execute(cmd),
            Commands::Migrate(cmd) => commands::migrate::execute(cmd, &self.color),
            Commands::Project(cmd) => commands::project::execute(cmd),
            Commands::Release(cmd) => commands::release::execute(cmd),
            Commands::Submodule(cmd) => commands::submodule::execute(cmd),
            Commands::Completions(args) => commands::completions::execute(args),
        }
    }
}
