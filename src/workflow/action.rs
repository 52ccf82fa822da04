use crate::engine::{AddOutcome, RemoveOutcome};
use crate::report::Notice;
use serde::Serialize;
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub(crate) enum ActionKind {
    Add,
    Remove,
}

impl ActionKind {
    pub(crate) fn branch_name(self, reference: &str) -> String {
        match self {
            ActionKind::Add => format!("access/{reference}"),
            ActionKind::Remove => format!("chore/{reference}"),
        }
    }

    pub(crate) fn commit_message(self, reference: &str) -> String {
        match self {
            ActionKind::Add => format!("add access: add user {reference}"),
            ActionKind::Remove => format!("chore: remove user {reference}"),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub(crate) enum Outcome {
    Add(AddOutcome),
    Remove(RemoveOutcome),
}

impl Outcome {
    pub(crate) fn modified(&self) -> &[PathBuf] {
        match self {
            Outcome::Add(outcome) => &outcome.modified,
            Outcome::Remove(outcome) => &outcome.modified,
        }
    }
}

/// Machine-readable record of a run, printed with `--json`.
#[derive(Debug, Clone, Serialize)]
pub(crate) struct RunSummary {
    pub(crate) environment: String,
    pub(crate) reference: String,
    pub(crate) root: PathBuf,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) branch: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) commit_message: Option<String>,
    pub(crate) signed: bool,
    pub(crate) pushed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) pull_request_url: Option<String>,
    pub(crate) outcome: Outcome,
    pub(crate) notices: Vec<Notice>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn branch_and_commit_names_follow_the_action() {
        assert_eq!(ActionKind::Add.branch_name("T-1"), "access/T-1");
        assert_eq!(ActionKind::Remove.branch_name("T-1"), "chore/T-1");
        assert_eq!(
            ActionKind::Add.commit_message("T-1"),
            "add access: add user T-1"
        );
        assert_eq!(
            ActionKind::Remove.commit_message("T-1"),
            "chore: remove user T-1"
        );
    }

    #[test]
    fn outcome_serializes_with_action_tag() {
        let outcome = Outcome::Remove(RemoveOutcome {
            removed: 3,
            ..RemoveOutcome::default()
        });
        let json = serde_json::to_value(&outcome).unwrap();
        assert_eq!(json["action"], "remove");
        assert_eq!(json["removed"], 3);
    }
}
