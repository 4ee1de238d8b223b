//! # Odoo Toolbox CLI
//!
//! Binary entry point: parse command-line arguments, dispatch to the
//! command implementations, and translate errors into exit codes. A
//! user-declined confirmation is a clean exit 0; every other failure
//! prints its message and exits 1.

mod cli;
mod commands;

use std::process::ExitCode;

use clap::Parser;

use odoo_toolbox::error::Error;

fn main() -> ExitCode {
    let cli = cli::Cli::parse();
    match cli.execute() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            if matches!(err.downcast_ref::<Error>(), Some(Error::Aborted)) {
                println!("Aborted.");
                return ExitCode::SUCCESS;
            }
            eprintln!("Error: {:#}", err);
            ExitCode::FAILURE
        }
    }
}
