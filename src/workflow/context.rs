use crate::cli::RunArgs;
use crate::config::{Config, Environment};
use crate::util::validate_reference;
use anyhow::{anyhow, Context, Result};
use std::path::{Path, PathBuf};

/// Everything a run needs, resolved once from the CLI and the config file.
pub(crate) struct RunContext {
    pub(crate) config: Config,
    pub(crate) environment_name: String,
    pub(crate) environment: Environment,
    /// Directory scanned for documents.
    pub(crate) root: PathBuf,
    pub(crate) reference: String,
    pub(crate) use_git: bool,
    pub(crate) json: bool,
}

impl RunContext {
    pub(crate) fn load(args: &RunArgs) -> Result<Self> {
        let config_path = Config::resolve_path(args.config.as_deref())?;
        let config = Config::load(&config_path)?;
        let (environment_name, environment) = config.environment(&args.environment)?;
        let environment_name = environment_name.to_string();
        let environment = environment.clone();
        let reference = validate_reference(&args.reference)?.to_string();

        let use_git = !args.no_git;
        if use_git && !environment.path.is_dir() {
            return Err(anyhow!(
                "repository path for {environment_name} not found: {}",
                environment.path.display()
            ));
        }
        let root = args
            .root
            .clone()
            .unwrap_or_else(|| environment.path.clone());
        let root = root
            .canonicalize()
            .with_context(|| format!("resolve document root {}", root.display()))?;
        if use_git {
            ensure_inside_repository(&root, &environment.path)?;
        }

        tracing::debug!(
            config = %config_path.display(),
            environment = %environment_name,
            root = %root.display(),
            use_git,
            "run context loaded"
        );

        Ok(Self {
            config,
            environment_name,
            environment,
            root,
            reference,
            use_git,
            json: args.json,
        })
    }
}

/// Documents edited under git must be stageable from the environment checkout.
fn ensure_inside_repository(root: &Path, repository: &Path) -> Result<()> {
    let repository = repository
        .canonicalize()
        .with_context(|| format!("resolve repository path {}", repository.display()))?;
    if !root.starts_with(&repository) {
        return Err(anyhow!(
            "document root {} is outside the repository {}; use --no-git to edit it",
            root.display(),
            repository.display()
        ));
    }
    Ok(())
}
