//! # CLI Command Implementations
//!
//! One module per subcommand group. Each module defines its clap `Args`
//! or `Subcommand` types and an `execute` function that orchestrates the
//! corresponding `odoo_toolbox` library calls. The command layer owns
//! argument parsing and user messaging only; the library owns the logic.

pub mod addon;
pub mod completions;
pub mod db;
pub mod migrate;
pub mod pending;
pub mod project;
pub mod release;
pub mod submodule;
