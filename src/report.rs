//! Human-facing notices emitted while documents are processed.
//!
//! The engine pushes a [`Notice`] at the moment something happens; the
//! reporter decides how to show it. Notices are not log lines: logging stays
//! on `tracing` and goes to stderr.
use crate::config::IdentifierKind;
use crate::util::display_path;
use serde::Serialize;
use std::io::Write;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Notice {
    AddScanStarted {
        accounts: usize,
        identifier: IdentifierKind,
    },
    RemoveScanStarted {
        users: Vec<String>,
    },
    DocumentSkipped {
        path: PathBuf,
        reason: String,
    },
    Added {
        user: String,
        role: String,
        account: String,
    },
    AlreadyPresent {
        user: String,
        role: String,
        account: String,
    },
    RoleNotFound {
        role: String,
        account: String,
        path: PathBuf,
    },
    Removed {
        user: String,
        role: String,
        account: String,
    },
    DocumentUpdated {
        path: PathBuf,
    },
    AccountsNotFound {
        accounts: Vec<String>,
    },
    RemovalTotal {
        count: usize,
    },
    NoMatches,
    NoChanges,
}

impl Notice {
    /// Render the notice as a single console line (or block, for lists).
    pub fn render(&self, base: Option<&Path>) -> String {
        match self {
            Notice::AddScanStarted {
                accounts,
                identifier,
            } => format!(
                "[add] scanning for {accounts} account {}...",
                identifier.plural_label()
            ),
            Notice::RemoveScanStarted { users } => {
                format!("[remove] searching every account for: {}", users.join(", "))
            }
            Notice::DocumentSkipped { path, reason } => {
                format!("skipped {}: {reason}", display_path(path, base))
            }
            Notice::Added {
                user,
                role,
                account,
            } => format!("added {user} to {role} @ {account}"),
            Notice::AlreadyPresent {
                user,
                role,
                account,
            } => format!("user {user} already in {role} @ {account} (skipping)"),
            Notice::RoleNotFound {
                role,
                account,
                path,
            } => format!(
                "role '{role}' does not exist in {account} ({}), skipping",
                display_path(path, base)
            ),
            Notice::Removed {
                user,
                role,
                account,
            } => format!("removed {user} | account: {account} | role: {role}"),
            Notice::DocumentUpdated { path } => format!("updated {}", display_path(path, base)),
            Notice::AccountsNotFound { accounts } => {
                let mut out =
                    String::from("warning: the following accounts were not found in any document:");
                for account in accounts {
                    out.push_str("\n  - ");
                    out.push_str(account);
                }
                out
            }
            Notice::RemovalTotal { count } => format!("removed {count} entries in total"),
            Notice::NoMatches => "warning: no matching users were found in any document".into(),
            Notice::NoChanges => "no changes were needed".into(),
        }
    }
}

pub trait Reporter {
    fn notice(&mut self, notice: Notice);
}

/// Prints notices as they arrive. Paths are shown relative to `base`.
pub struct ConsoleReporter<W: Write> {
    out: W,
    base: Option<PathBuf>,
}

impl ConsoleReporter<std::io::Stdout> {
    pub fn stdout(base: Option<PathBuf>) -> Self {
        Self::new(std::io::stdout(), base)
    }
}

impl<W: Write> ConsoleReporter<W> {
    pub fn new(out: W, base: Option<PathBuf>) -> Self {
        Self { out, base }
    }
}

impl<W: Write> Reporter for ConsoleReporter<W> {
    fn notice(&mut self, notice: Notice) {
        let line = notice.render(self.base.as_deref());
        if let Err(err) = writeln!(self.out, "{line}") {
            tracing::warn!(error = %err, "failed to write notice");
        }
    }
}

/// Keeps every notice in order; backs `--json` output.
#[derive(Debug, Default)]
pub struct CollectingReporter {
    pub notices: Vec<Notice>,
}

impl Reporter for CollectingReporter {
    fn notice(&mut self, notice: Notice) {
        self.notices.push(notice);
    }
}
