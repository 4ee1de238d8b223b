//! # Error Handling
//!
//! Centralized error type for the `odoo-toolbox` library, built with
//! `thiserror`. The taxonomy follows the tool's failure surface:
//!
//! - *Configuration errors*: missing/malformed project files, reported with
//!   field-level detail and an optional hint.
//! - *Precondition errors*: expected git or descriptor state absent,
//!   reported with a remediation hint where one exists.
//! - *External-process errors*: a wrapped command exited non-zero; the
//!   rendered command line and captured stderr are attached.
//! - *User abort*: an explicit "no" to a confirmation prompt. This is a
//!   clean, zero-impact exit, not a failure; the binary maps it to exit
//!   code 0.
//!
//! Nothing is retried anywhere; every error surfaces to the terminal for a
//! human to act on.

use std::path::PathBuf;

use thiserror::Error;

/// Main error type for odoo-toolbox operations
#[derive(Error, Debug)]
pub enum Error {
    /// The project marker file was not found walking up from the start
    /// directory.
    #[error("project root not found (no marker file above {start})")]
    ProjectRootNotFound { start: PathBuf },

    /// An error occurred while loading project configuration files
    /// (`.proj.cfg` or the marker file).
    #[error("project configuration error: {message}{}", hint.as_ref().map(|h| format!("\n  hint: {}", h)).unwrap_or_default())]
    Config {
        message: String,
        /// Optional hint for how to fix the configuration issue
        hint: Option<String>,
    },

    /// Expected repository or descriptor state is absent.
    #[error("precondition failed: {message}{}", hint.as_ref().map(|h| format!("\n  hint: {}", h)).unwrap_or_default())]
    Precondition {
        message: String,
        hint: Option<String>,
    },

    /// A wrapped external command exited non-zero (or could not be
    /// spawned).
    #[error("command failed: {command}\n{stderr}")]
    ExternalCommand { command: String, stderr: String },

    /// A requirements-file line could not be parsed.
    #[error("invalid requirement line {line:?}: {message}")]
    Requirement { line: String, message: String },

    /// An error in a pending-merge descriptor operation.
    #[error("pending merge error for {repo}: {message}")]
    PendingMerge { repo: String, message: String },

    /// An error occurred during template rendering.
    #[error("template error: {message}{}", variable.as_ref().map(|v| format!(" (variable: {})", v)).unwrap_or_default())]
    Template {
        message: String,
        /// The template variable that caused the error, if applicable
        variable: Option<String>,
    },

    /// An error occurred during a network operation.
    #[error("network error for {url}: {message}")]
    Network { url: String, message: String },

    /// The user declined an interactive confirmation. Treated as a clean
    /// exit by the binary.
    #[error("aborted by user")]
    Aborted,

    /// An I/O error, wrapped from `std::io::Error`.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A YAML parsing error, wrapped from `serde_yaml::Error`.
    #[error("YAML parsing error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// An INI parsing error, wrapped from `ini::Error`.
    #[error("INI parsing error: {0}")]
    Ini(#[from] ini::Error),

    /// A URL parsing error, wrapped from `url::ParseError`.
    #[error("URL parsing error: {0}")]
    UrlParse(#[from] url::ParseError),
}

impl Error {
    /// Shorthand for a precondition failure without a hint.
    pub fn precondition(message: impl Into<String>) -> Self {
        Error::Precondition {
            message: message.into(),
            hint: None,
        }
    }

    /// Shorthand for a configuration failure without a hint.
    pub fn config(message: impl Into<String>) -> Self {
        Error::Config {
            message: message.into(),
            hint: None,
        }
    }
}

/// A convenient type alias for `Result<T, Error>`.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_config_with_hint() {
        let error = Error::Config {
            message: "missing key 'odoo_src'".to_string(),
            hint: Some("add 'odoo_src = odoo/src' to [paths]".to_string()),
        };
        let display = format!("{}", error);
        assert!(display.contains("project configuration error"));
        assert!(display.contains("missing key 'odoo_src'"));
        assert!(display.contains("hint:"));
    }

    #[test]
    fn test_error_display_external_command() {
        let error = Error::ExternalCommand {
            command: "git fetch origin".to_string(),
            stderr: "fatal: not a git repository".to_string(),
        };
        let display = format!("{}", error);
        assert!(display.contains("command failed: git fetch origin"));
        assert!(display.contains("fatal: not a git repository"));
    }

    #[test]
    fn test_error_display_pending_merge() {
        let error = Error::PendingMerge {
            repo: "edi".to_string(),
            message: "no such reference found".to_string(),
        };
        let display = format!("{}", error);
        assert!(display.contains("pending merge error for edi"));
        assert!(display.contains("no such reference found"));
    }

    #[test]
    fn test_error_display_project_root_not_found() {
        let error = Error::ProjectRootNotFound {
            start: PathBuf::from("/tmp/nowhere"),
        };
        let display = format!("{}", error);
        assert!(display.contains("project root not found"));
        assert!(display.contains("/tmp/nowhere"));
    }

    #[test]
    fn test_error_from_io_error() {
        let io_error = std::io::Error::new(std::io::ErrorKind::NotFound, "File not found");
        let error: Error = io_error.into();
        let display = format!("{}", error);
        assert!(display.contains("I/O error"));
        assert!(display.contains("File not found"));
    }

    #[test]
    fn test_error_display_template_with_variable() {
        let error = Error::Template {
            message: "undefined variable".to_string(),
            variable: Some("project_id".to_string()),
        };
        let display = format!("{}", error);
        assert!(display.contains("template error"));
        assert!(display.contains("(variable: project_id)"));
    }
}
