//! Environment configuration.
//!
//! Loaded once at startup and passed by reference; nothing downstream reads
//! the environment or the config file again.
use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

pub const CONFIG_SCHEMA_VERSION: u32 = 1;
pub const CONFIG_ENV_VAR: &str = "ACCESS_SYNC_CONFIG";
const CONFIG_DIR_NAME: &str = "access-sync";
const CONFIG_FILE_NAME: &str = "config.json";
const DEFAULT_REMOTE: &str = "origin";

/// Which account field identifies an account in a given environment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum IdentifierKind {
    #[serde(rename = "account_name")]
    ByName,
    #[serde(rename = "account_number")]
    ByNumber,
}

impl IdentifierKind {
    pub fn field_name(self) -> &'static str {
        match self {
            IdentifierKind::ByName => "account_name",
            IdentifierKind::ByNumber => "account_number",
        }
    }

    /// Label used in notices ("names" / "numbers").
    pub fn plural_label(self) -> &'static str {
        match self {
            IdentifierKind::ByName => "names",
            IdentifierKind::ByNumber => "numbers",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Environment {
    /// Checkout of the repository holding the account documents
    pub path: PathBuf,
    pub base_branch: String,
    pub identifier: IdentifierKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remote: Option<String>,
    /// Prefix for "open a pull request" links, the branch name is appended
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pull_request_url: Option<String>,
}

impl Environment {
    pub fn remote(&self) -> &str {
        self.remote
            .as_deref()
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .unwrap_or(DEFAULT_REMOTE)
    }

    pub fn pull_request_link(&self, branch: &str) -> Option<String> {
        let base = self.pull_request_url.as_deref()?.trim().trim_end_matches('/');
        if base.is_empty() {
            return None;
        }
        Some(format!("{base}/{branch}"))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub schema_version: u32,
    #[serde(default = "default_excluded_dirs")]
    pub excluded_dirs: Vec<String>,
    pub environments: BTreeMap<String, Environment>,
}

fn default_excluded_dirs() -> Vec<String> {
    vec![".git".to_string(), ".github".to_string()]
}

impl Config {
    /// Resolve the config path: explicit flag, then `$ACCESS_SYNC_CONFIG`,
    /// then the per-user config directory.
    pub fn resolve_path(explicit: Option<&Path>) -> Result<PathBuf> {
        if let Some(path) = explicit {
            return Ok(path.to_path_buf());
        }
        if let Some(path) = std::env::var_os(CONFIG_ENV_VAR).filter(|value| !value.is_empty()) {
            return Ok(PathBuf::from(path));
        }
        let base = dirs::config_dir()
            .ok_or_else(|| anyhow!("no config directory; pass --config or set {CONFIG_ENV_VAR}"))?;
        Ok(base.join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME))
    }

    pub fn load(path: &Path) -> Result<Self> {
        let bytes = fs::read(path).with_context(|| format!("read config {}", path.display()))?;
        let config: Config = serde_json::from_slice(&bytes)
            .with_context(|| format!("parse config JSON {}", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.schema_version != CONFIG_SCHEMA_VERSION {
            return Err(anyhow!(
                "unsupported config schema_version {}",
                self.schema_version
            ));
        }
        if self.environments.is_empty() {
            return Err(anyhow!("config defines no environments"));
        }
        for (name, env) in &self.environments {
            if env.base_branch.trim().is_empty() {
                return Err(anyhow!("environment {name} has an empty base_branch"));
            }
            if env.path.as_os_str().is_empty() {
                return Err(anyhow!("environment {name} has an empty path"));
            }
        }
        Ok(())
    }

    /// Look up an environment by name, ignoring case.
    pub fn environment(&self, name: &str) -> Result<(&str, &Environment)> {
        let wanted = name.trim();
        self.environments
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(wanted))
            .map(|(key, env)| (key.as_str(), env))
            .ok_or_else(|| {
                let known: Vec<&str> = self.environments.keys().map(String::as_str).collect();
                anyhow!(
                    "unknown environment {wanted:?} (expected one of: {})",
                    known.join(", ")
                )
            })
    }

    /// Directory names pruned during document discovery. `.git` is always
    /// included.
    pub fn excluded_dirs(&self) -> Vec<String> {
        let mut dirs: Vec<String> = self
            .excluded_dirs
            .iter()
            .map(|name| name.trim().to_string())
            .filter(|name| !name.is_empty())
            .collect();
        if !dirs.iter().any(|name| name == ".git") {
            dirs.push(".git".to_string());
        }
        dirs
    }
}
