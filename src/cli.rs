//! CLI argument parsing.
//!
//! Lists arrive raw; trimming and dropping blanks happens in the engine.
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// Root CLI entrypoint.
#[derive(Parser, Debug)]
#[command(
    name = "access-sync",
    version,
    about = "Add or revoke user access across YAML account documents and open a review branch",
    after_help = "Commands:\n  add     Add users to roles on the given accounts\n  remove  Remove users from every role of every account\n\nExamples:\n  access-sync add --env KP --ref TICKET-123 --accounts team-a,team-b --roles viewer --users a@x.com\n  access-sync remove --env KM --ref TICKET-124 --users a@x.com,b@x.com\n  access-sync add --env KP --ref T-1 --accounts team-a --roles editor --users a@x.com --no-git --root ./accounts",
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct RootArgs {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    Add(AddArgs),
    Remove(RemoveArgs),
}

impl Command {
    pub fn run_args(&self) -> &RunArgs {
        match self {
            Command::Add(args) => &args.run,
            Command::Remove(args) => &args.run,
        }
    }
}

/// Inputs shared by every action.
#[derive(Args, Debug, Clone)]
pub struct RunArgs {
    /// Environment name from the config file (case-insensitive)
    #[arg(long = "env", value_name = "NAME")]
    pub environment: String,

    /// Reference id (ticket) used for the branch name and commit message
    #[arg(long = "ref", value_name = "ID")]
    pub reference: String,

    /// Config file (defaults to $ACCESS_SYNC_CONFIG, then the user config dir)
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Scan this directory instead of the environment's repository path
    #[arg(long, value_name = "DIR")]
    pub root: Option<PathBuf>,

    /// Edit documents in place without any git operations
    #[arg(long)]
    pub no_git: bool,

    /// Emit a machine-readable JSON summary instead of console notices
    #[arg(long)]
    pub json: bool,

    /// Emit a verbose transcript of the run on stderr
    #[arg(long)]
    pub verbose: bool,
}

/// Add users to roles on specific accounts.
#[derive(Parser, Debug)]
#[command(about = "Add users to roles on the given accounts")]
pub struct AddArgs {
    #[command(flatten)]
    pub run: RunArgs,

    /// Target account names or numbers, depending on the environment
    #[arg(long, value_name = "IDS", value_delimiter = ',', required = true)]
    pub accounts: Vec<String>,

    /// Role names to grant
    #[arg(long, value_name = "ROLES", value_delimiter = ',', required = true)]
    pub roles: Vec<String>,

    /// User identifiers (e.g. emails) to add
    #[arg(long, value_name = "USERS", value_delimiter = ',', required = true)]
    pub users: Vec<String>,
}

/// Remove users everywhere.
#[derive(Parser, Debug)]
#[command(about = "Remove users from every role of every account")]
pub struct RemoveArgs {
    #[command(flatten)]
    pub run: RunArgs,

    /// User identifiers (e.g. emails) to remove
    #[arg(long, value_name = "USERS", value_delimiter = ',', required = true)]
    pub users: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_splits_comma_separated_lists() {
        let args = RootArgs::try_parse_from([
            "access-sync",
            "add",
            "--env",
            "kp",
            "--ref",
            "T-1",
            "--accounts",
            "a, b",
            "--roles",
            "viewer",
            "--users",
            "x@y.com,z@y.com",
            "--no-git",
        ])
        .unwrap();
        let Command::Add(add) = args.command else {
            panic!("expected add");
        };
        assert_eq!(add.accounts, vec!["a", " b"]);
        assert_eq!(add.users, vec!["x@y.com", "z@y.com"]);
        assert!(add.run.no_git);
        assert_eq!(add.run.environment, "kp");
    }

    #[test]
    fn remove_requires_users() {
        let err = RootArgs::try_parse_from(["access-sync", "remove", "--env", "KP", "--ref", "T-2"])
            .unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::MissingRequiredArgument);
    }

    #[test]
    fn cli_definition_is_consistent() {
        use clap::CommandFactory;
        RootArgs::command().debug_assert();
    }
}
