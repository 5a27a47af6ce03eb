//! The confirm-or-abort gate in front of every mutating operation.
//!
//! Each operation is `Proposed` until the operator types its token. Any
//! other answer aborts with nothing touched.

use serde::{Deserialize, Serialize};
use std::io::{self, BufRead, Write};

/// Which operation is asking for confirmation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptKind {
    Organize,
    OrganizeByDate,
    Clean,
    Prune,
}

/// Literal words the operator must type for each operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConfirmTokens {
    pub organize: String,
    pub organize_by_date: String,
    pub clean: String,
    pub prune: String,
}

impl Default for ConfirmTokens {
    fn default() -> Self {
        Self {
            organize: "confirm".to_string(),
            organize_by_date: "confirm".to_string(),
            clean: "clean".to_string(),
            prune: "remove".to_string(),
        }
    }
}

impl ConfirmTokens {
    pub fn token_for(&self, kind: PromptKind) -> &str {
        match kind {
            PromptKind::Organize => &self.organize,
            PromptKind::OrganizeByDate => &self.organize_by_date,
            PromptKind::Clean => &self.clean,
            PromptKind::Prune => &self.prune,
        }
    }

    /// Returns true if `answer` matches the token, ignoring case and
    /// surrounding whitespace.
    pub fn accepts(&self, kind: PromptKind, answer: &str) -> bool {
        answer.trim().to_lowercase() == self.token_for(kind).to_lowercase()
    }
}

/// Capability the operation flows call before mutating anything.
pub trait Confirm {
    fn confirm(&mut self, kind: PromptKind) -> bool;
}

/// Asks on stdout and reads one line from stdin.
pub struct ConsoleConfirmer {
    tokens: ConfirmTokens,
}

impl ConsoleConfirmer {
    pub fn new(tokens: ConfirmTokens) -> Self {
        Self { tokens }
    }
}

impl Confirm for ConsoleConfirmer {
    fn confirm(&mut self, kind: PromptKind) -> bool {
        let token = self.tokens.token_for(kind);
        let action = match kind {
            PromptKind::Organize => "start organizing by category",
            PromptKind::OrganizeByDate => "start organizing by date",
            PromptKind::Clean => "delete these files",
            PromptKind::Prune => "delete these folders",
        };
        print!("\nType '{}' to {}: ", token, action);
        let _ = io::stdout().flush();

        let mut answer = String::new();
        match io::stdin().lock().read_line(&mut answer) {
            Ok(_) => self.tokens.accepts(kind, &answer),
            Err(e) => {
                tracing::warn!(error = %e, "could not read confirmation");
                false
            }
        }
    }
}

/// Accepts every prompt (`--yes`).
pub struct AutoConfirm;

impl Confirm for AutoConfirm {
    fn confirm(&mut self, _kind: PromptKind) -> bool {
        true
    }
}

/// Refuses every prompt.
pub struct Decline;

impl Confirm for Decline {
    fn confirm(&mut self, _kind: PromptKind) -> bool {
        false
    }
}
