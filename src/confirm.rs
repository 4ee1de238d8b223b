//! # Confirmation Port
//!
//! Interactive yes/no questions are asked through the [`Confirm`] trait
//! instead of calling the prompt library directly from business logic, so
//! headless or scripted runs can supply a policy (always-yes, always-no,
//! a scripted answer sequence) without touching the prompt text.
//!
//! A declined confirmation is not an error; callers translate it to
//! [`crate::error::Error::Aborted`], which the binary maps to a clean
//! exit.

use std::cell::RefCell;
use std::collections::VecDeque;

use crate::error::{Error, Result};

/// Strategy interface for user confirmations.
pub trait Confirm {
    /// Ask a yes/no question, with `default` preselected.
    fn confirm(&self, prompt: &str, default: bool) -> Result<bool>;
}

/// Interactive implementation backed by `dialoguer`.
#[derive(Debug, Default)]
pub struct Interactive;

impl Confirm for Interactive {
    fn confirm(&self, prompt: &str, default: bool) -> Result<bool> {
        dialoguer::Confirm::with_theme(&dialoguer::theme::ColorfulTheme::default())
            .with_prompt(prompt)
            .default(default)
            .interact()
            .map_err(|e| Error::Precondition {
                message: format!("cannot prompt for confirmation: {}", e),
                hint: Some("re-run with --yes in non-interactive environments".to_string()),
            })
    }
}

/// Fixed-answer policy (`--yes` flows, headless runs).
#[derive(Debug, Clone, Copy)]
pub struct Always(pub bool);

impl Confirm for Always {
    fn confirm(&self, _prompt: &str, _default: bool) -> Result<bool> {
        Ok(self.0)
    }
}

/// Scripted answers for tests; falls back to the prompt default when the
/// script runs out.
#[derive(Debug, Default)]
pub struct Scripted {
    answers: RefCell<VecDeque<bool>>,
}

impl Scripted {
    pub fn new(answers: impl IntoIterator<Item = bool>) -> Self {
        Scripted {
            answers: RefCell::new(answers.into_iter().collect()),
        }
    }
}

impl Confirm for Scripted {
    fn confirm(&self, _prompt: &str, default: bool) -> Result<bool> {
        Ok(self.answers.borrow_mut().pop_front().unwrap_or(default))
    }
}
