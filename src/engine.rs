//! Bulk add/remove across every account document in a tree.
//!
//! Documents are processed one at a time: load, mutate, save if anything
//! changed. Run-wide state (accounts seen, removals counted) lives in the
//! outcome records returned to the caller.
use crate::config::IdentifierKind;
use crate::document::{Document, LoadError};
use crate::report::{Notice, Reporter};
use crate::util::normalize_list;
use anyhow::Result;
use serde::Serialize;
use std::collections::{BTreeSet, HashSet};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone)]
pub struct AddRequest {
    pub accounts: Vec<String>,
    pub roles: Vec<String>,
    pub users: Vec<String>,
    pub identifier: IdentifierKind,
}

#[derive(Debug, Clone)]
pub struct RemoveRequest {
    pub users: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct AddOutcome {
    pub modified: Vec<PathBuf>,
    pub missing_accounts: Vec<String>,
    pub added: usize,
    pub already_present: usize,
    pub roles_not_found: usize,
    pub documents_scanned: usize,
    pub documents_skipped: usize,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct RemoveOutcome {
    pub modified: Vec<PathBuf>,
    pub removed: usize,
    pub documents_scanned: usize,
    pub documents_skipped: usize,
}

/// Paths of documents written during a run. Recording a path twice is a
/// no-op.
#[derive(Debug, Default)]
pub struct ChangeTracker {
    paths: BTreeSet<PathBuf>,
}

impl ChangeTracker {
    pub fn record(&mut self, path: &Path) -> bool {
        self.paths.insert(path.to_path_buf())
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    pub fn into_paths(self) -> Vec<PathBuf> {
        self.paths.into_iter().collect()
    }
}

/// Add users to roles on the requested accounts, wherever those accounts
/// appear.
pub fn add_users(
    documents: &[PathBuf],
    request: &AddRequest,
    reporter: &mut dyn Reporter,
) -> Result<AddOutcome> {
    let targets = normalize_list(&request.accounts);
    let roles = normalize_list(&request.roles);
    let users = normalize_list(&request.users);

    reporter.notice(Notice::AddScanStarted {
        accounts: targets.len(),
        identifier: request.identifier,
    });

    let mut outcome = AddOutcome::default();
    let mut tracker = ChangeTracker::default();
    let mut found: HashSet<String> = HashSet::new();

    for path in documents {
        let Some(mut document) = load_applicable(path, reporter, &mut outcome.documents_skipped)
        else {
            continue;
        };
        outcome.documents_scanned += 1;

        for idx in 0..document.accounts().len() {
            let account = &document.accounts()[idx];
            let Some(id) = account
                .identifier(request.identifier)
                .filter(|id| targets.iter().any(|target| target == id))
                .map(str::to_string)
            else {
                continue;
            };
            tracing::debug!(
                account = %id,
                field = request.identifier.field_name(),
                path = %path.display(),
                "matched account"
            );
            found.insert(id.clone());

            for role in &roles {
                if document.accounts()[idx].role(role).is_none() {
                    outcome.roles_not_found += 1;
                    reporter.notice(Notice::RoleNotFound {
                        role: role.clone(),
                        account: id.clone(),
                        path: path.clone(),
                    });
                    continue;
                }
                for user in &users {
                    let present = document.accounts()[idx]
                        .role(role)
                        .is_some_and(|existing| existing.contains(user));
                    if present {
                        outcome.already_present += 1;
                        reporter.notice(Notice::AlreadyPresent {
                            user: user.clone(),
                            role: role.clone(),
                            account: id.clone(),
                        });
                        continue;
                    }
                    document.append_user(idx, role, user)?;
                    outcome.added += 1;
                    reporter.notice(Notice::Added {
                        user: user.clone(),
                        role: role.clone(),
                        account: id.clone(),
                    });
                }
            }
        }

        persist_if_dirty(&document, &mut tracker, reporter)?;
    }

    outcome.missing_accounts = targets
        .into_iter()
        .filter(|target| !found.contains(target))
        .collect();
    if !outcome.missing_accounts.is_empty() {
        reporter.notice(Notice::AccountsNotFound {
            accounts: outcome.missing_accounts.clone(),
        });
    }
    if tracker.is_empty() {
        reporter.notice(Notice::NoChanges);
    }
    outcome.modified = tracker.into_paths();
    Ok(outcome)
}

/// Remove users from every role of every account in every document.
pub fn remove_users(
    documents: &[PathBuf],
    request: &RemoveRequest,
    reporter: &mut dyn Reporter,
) -> Result<RemoveOutcome> {
    let users = normalize_list(&request.users);
    reporter.notice(Notice::RemoveScanStarted {
        users: users.clone(),
    });

    let mut outcome = RemoveOutcome::default();
    let mut tracker = ChangeTracker::default();

    for path in documents {
        let Some(mut document) = load_applicable(path, reporter, &mut outcome.documents_skipped)
        else {
            continue;
        };
        outcome.documents_scanned += 1;

        for idx in 0..document.accounts().len() {
            let account = &document.accounts()[idx];
            let label = account.label().to_string();
            let role_names: Vec<String> = account.roles.iter().map(|r| r.name.clone()).collect();

            for role in &role_names {
                for user in &users {
                    let present = document.accounts()[idx]
                        .role(role)
                        .is_some_and(|existing| existing.contains(user));
                    if !present {
                        continue;
                    }
                    document.remove_user(idx, role, user)?;
                    outcome.removed += 1;
                    reporter.notice(Notice::Removed {
                        user: user.clone(),
                        role: role.clone(),
                        account: label.clone(),
                    });
                }
            }
        }

        persist_if_dirty(&document, &mut tracker, reporter)?;
    }

    if outcome.removed == 0 {
        reporter.notice(Notice::NoMatches);
    } else {
        reporter.notice(Notice::RemovalTotal {
            count: outcome.removed,
        });
    }
    if tracker.is_empty() {
        reporter.notice(Notice::NoChanges);
    }
    outcome.modified = tracker.into_paths();
    Ok(outcome)
}

/// Load a document, turning "not an account document" into a notice (or a
/// debug log for YAML files that simply have no accounts).
fn load_applicable(
    path: &Path,
    reporter: &mut dyn Reporter,
    skipped: &mut usize,
) -> Option<Document> {
    match Document::load(path) {
        Ok(document) => Some(document),
        Err(err @ (LoadError::Empty | LoadError::MissingAccounts)) => {
            tracing::debug!(path = %path.display(), reason = %err, "not an account document");
            None
        }
        Err(err) => {
            tracing::info!(path = %path.display(), reason = %err, "skipping document");
            *skipped += 1;
            reporter.notice(Notice::DocumentSkipped {
                path: path.to_path_buf(),
                reason: err.to_string(),
            });
            None
        }
    }
}

fn persist_if_dirty(
    document: &Document,
    tracker: &mut ChangeTracker,
    reporter: &mut dyn Reporter,
) -> Result<()> {
    if !document.is_dirty() {
        return Ok(());
    }
    document.save()?;
    if tracker.record(document.path()) {
        reporter.notice(Notice::DocumentUpdated {
            path: document.path().to_path_buf(),
        });
    }
    Ok(())
}

#[cfg(test)]
#[path = "engine_tests.rs"]
mod tests;
