//! # Odoo Toolbox Library
//!
//! Core functionality behind the `odoo-toolbox` command-line tool: the
//! recurring chores of maintaining a large, multi-repository Odoo project.
//!
//! ## Core Concepts
//!
//! - **Project (`project`)**: marker-file root discovery and the typed,
//!   read-only `.proj.cfg` configuration.
//! - **Pending merges (`pending`)**: per-repository YAML descriptors of
//!   remotes, target branch and ordered merge refs, reconciled through the
//!   external `gitaggregate` tool.
//! - **Requirements (`requirements`, `pypi`)**: pip-style requirement
//!   editing and package-index version lookups for addon pinning.
//! - **Database workflows (`database`, `migration`)**: docker-compose
//!   driven create/drop/dump/restore and the resumable
//!   production-migration pipeline.
//! - **Scaffolding (`scaffold`, `version`)**: project template files and
//!   the release version source of truth.
//!
//! Everything heavy is delegated to external processes through the typed
//! command builder in `process`; the library owns no long-lived state.
//! Every command is a fresh read-modify-write cycle over plain files in
//! the project tree.

pub mod confirm;
pub mod database;
pub mod error;
pub mod git;
pub mod github;
pub mod migration;
pub mod output;
pub mod pending;
pub mod process;
pub mod project;
pub mod pypi;
pub mod requirements;
pub mod scaffold;
pub mod version;
