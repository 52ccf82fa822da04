//! Execute one add/remove run: prepare the work branch, mutate, then commit
//! and push, or abandon the branch when nothing changed.
use super::action::{ActionKind, Outcome, RunSummary};
use super::context::RunContext;
use crate::git::{BranchState, CommitSigning, Git};
use crate::locate::find_documents;
use crate::report::{CollectingReporter, ConsoleReporter, Reporter};
use anyhow::{Context, Result};
use std::path::PathBuf;

pub(crate) fn execute<F>(ctx: &RunContext, action: ActionKind, apply: F) -> Result<()>
where
    F: FnOnce(&[PathBuf], &mut dyn Reporter) -> Result<Outcome>,
{
    let branch = action.branch_name(&ctx.reference);
    let git = if ctx.use_git {
        Some(prepare_branch(ctx, &branch)?)
    } else {
        None
    };

    let documents = find_documents(&ctx.root, &ctx.config.excluded_dirs())?;
    tracing::debug!(count = documents.len(), root = %ctx.root.display(), "documents located");

    let (outcome, notices) = if ctx.json {
        let mut reporter = CollectingReporter::default();
        let outcome = apply(&documents, &mut reporter)?;
        (outcome, reporter.notices)
    } else {
        let mut reporter = ConsoleReporter::stdout(Some(ctx.root.clone()));
        (apply(&documents, &mut reporter)?, Vec::new())
    };

    let mut summary = RunSummary {
        environment: ctx.environment_name.clone(),
        reference: ctx.reference.clone(),
        root: ctx.root.clone(),
        branch: None,
        commit_message: None,
        signed: false,
        pushed: false,
        pull_request_url: None,
        outcome,
        notices,
    };

    if let Some(git) = git {
        publish(ctx, &git, action, &branch, &mut summary)?;
    }

    if ctx.json {
        let text = serde_json::to_string_pretty(&summary).context("serialize run summary")?;
        println!("{text}");
    }
    Ok(())
}

/// Check out and refresh the base branch, then move onto the work branch.
fn prepare_branch(ctx: &RunContext, branch: &str) -> Result<Git> {
    let env = &ctx.environment;
    let git = Git::locate(&env.path)?;
    stage(ctx, &format!("checking out {}", env.base_branch));
    git.checkout(&env.base_branch)?;
    git.pull(env.remote(), &env.base_branch)?;
    match git.create_or_switch_branch(branch)? {
        BranchState::Created => stage(ctx, &format!("created branch {branch}")),
        BranchState::Existing => stage(ctx, &format!("switched to existing branch {branch}")),
    }
    Ok(git)
}

fn publish(
    ctx: &RunContext,
    git: &Git,
    action: ActionKind,
    branch: &str,
    summary: &mut RunSummary,
) -> Result<()> {
    let env = &ctx.environment;
    let modified = summary.outcome.modified().to_vec();
    if modified.is_empty() {
        stage(ctx, "nothing to commit, abandoning work branch");
        git.checkout(&env.base_branch)?;
        if let Err(err) = git.delete_branch(branch) {
            tracing::warn!(error = %err, branch, "could not delete work branch");
        }
        return Ok(());
    }

    let message = action.commit_message(&ctx.reference);
    git.add(&modified)?;
    let signing = git.commit(&message)?;
    git.push(env.remote(), branch)?;

    let signed = signing == CommitSigning::Signed;
    let pull_request_url = env.pull_request_link(branch);
    if !ctx.json {
        println!();
        println!("pushed branch {branch}");
        println!("  commit: {message}");
        if !signed {
            println!("  note: commit is unsigned");
        }
        if let Some(url) = &pull_request_url {
            println!("  open a pull request: {url}");
        }
    }

    summary.branch = Some(branch.to_string());
    summary.commit_message = Some(message);
    summary.signed = signed;
    summary.pushed = true;
    summary.pull_request_url = pull_request_url;
    Ok(())
}

fn stage(ctx: &RunContext, message: &str) {
    tracing::info!("{message}");
    if !ctx.json {
        println!("==> {message}");
    }
}
