//! Run orchestration around the mutation engine.
//!
//! Resolve the environment, prepare the work branch, hand the located
//! documents to the engine, then publish or abandon the branch.
mod action;
mod context;
mod run;

use crate::cli::{AddArgs, RemoveArgs};
use crate::engine::{add_users, remove_users, AddRequest, RemoveRequest};
use crate::util::normalize_list;
use action::{ActionKind, Outcome};
use anyhow::{anyhow, Result};
use context::RunContext;

pub fn run_add(args: &AddArgs) -> Result<()> {
    for (flag, values) in [
        ("--accounts", &args.accounts),
        ("--roles", &args.roles),
        ("--users", &args.users),
    ] {
        ensure_non_empty(flag, values)?;
    }
    let ctx = RunContext::load(&args.run)?;
    let request = AddRequest {
        accounts: args.accounts.clone(),
        roles: args.roles.clone(),
        users: args.users.clone(),
        identifier: ctx.environment.identifier,
    };
    run::execute(&ctx, ActionKind::Add, |documents, reporter| {
        add_users(documents, &request, reporter).map(Outcome::Add)
    })
}

pub fn run_remove(args: &RemoveArgs) -> Result<()> {
    ensure_non_empty("--users", &args.users)?;
    let ctx = RunContext::load(&args.run)?;
    let request = RemoveRequest {
        users: args.users.clone(),
    };
    run::execute(&ctx, ActionKind::Remove, |documents, reporter| {
        remove_users(documents, &request, reporter).map(Outcome::Remove)
    })
}

/// Reject lists that are blank after trimming before touching git.
fn ensure_non_empty(flag: &str, values: &[String]) -> Result<()> {
    if normalize_list(values).is_empty() {
        return Err(anyhow!("{flag} needs at least one non-empty value"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_lists_are_rejected() {
        let err = ensure_non_empty("--users", &[" ".to_string(), String::new()]).unwrap_err();
        assert!(err.to_string().contains("--users"));
        assert!(ensure_non_empty("--users", &["a@x.com".to_string()]).is_ok());
    }
}
