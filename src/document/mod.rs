//! Account documents with format-preserving edits.
//!
//! A document keeps its original text line by line. `serde_yaml` provides the
//! semantic view (accounts, roles, users) and a line scanner records where each
//! role list lives, so an edit only touches the lines of the list it changes.
//! Untouched documents render back byte-for-byte.
mod layout;
mod scalar;

use crate::config::IdentifierKind;
use anyhow::{anyhow, Context, Result};
use layout::{AccountLayout, ListLayout, RoleLayout};
use scalar::{render_scalar, QuoteStyle};
use serde_yaml::Value;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

const UNKNOWN_ACCOUNT_LABEL: &str = "Unknown";
const BYTE_ORDER_MARK: char = '\u{feff}';

/// Reasons a document is not applicable. None of these abort a run.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("unreadable: {0}")]
    Read(#[from] io::Error),
    #[error("empty document")]
    Empty,
    #[error("malformed YAML: {0}")]
    Malformed(#[from] serde_yaml::Error),
    #[error("no accounts list")]
    MissingAccounts,
    #[error("unsupported layout: {0}")]
    Unsupported(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Account {
    pub name: Option<String>,
    pub number: Option<String>,
    pub roles: Vec<Role>,
}

impl Account {
    pub fn identifier(&self, kind: IdentifierKind) -> Option<&str> {
        match kind {
            IdentifierKind::ByName => self.name.as_deref(),
            IdentifierKind::ByNumber => self.number.as_deref(),
        }
    }

    /// Display label: the account name, else its number, else `Unknown`.
    pub fn label(&self) -> &str {
        [self.name.as_deref(), self.number.as_deref()]
            .into_iter()
            .flatten()
            .find(|value| !value.is_empty())
            .unwrap_or(UNKNOWN_ACCOUNT_LABEL)
    }

    pub fn role(&self, name: &str) -> Option<&Role> {
        self.roles.iter().find(|role| role.name == name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Role {
    pub name: String,
    pub users: Vec<String>,
}

impl Role {
    pub fn contains(&self, user: &str) -> bool {
        self.users.iter().any(|existing| existing == user)
    }
}

#[derive(Debug, Clone)]
struct Line {
    text: String,
    eol: &'static str,
}

#[derive(Debug, Clone)]
pub struct Document {
    path: PathBuf,
    /// Byte order mark stripped from the text before scanning, written back on render.
    bom: bool,
    lines: Vec<Line>,
    accounts: Vec<Account>,
    layout: Vec<AccountLayout>,
    dirty: bool,
}

impl Document {
    pub fn load(path: &Path) -> Result<Self, LoadError> {
        let text = fs::read_to_string(path)?;
        Self::parse(path, &text)
    }

    /// Build a document from text already in memory.
    pub fn parse(path: &Path, text: &str) -> Result<Self, LoadError> {
        let (bom, text) = match text.strip_prefix(BYTE_ORDER_MARK) {
            Some(rest) => (true, rest),
            None => (false, text),
        };
        if text.trim().is_empty() {
            return Err(LoadError::Empty);
        }
        let root: Value = serde_yaml::from_str(text)?;
        let accounts = semantic_accounts(&root)?;
        let lines = split_lines(text);
        let layout = layout::scan(&lines).map_err(LoadError::Unsupported)?;
        check_alignment(&accounts, &layout)?;
        Ok(Self {
            path: path.to_path_buf(),
            bom,
            lines,
            accounts,
            layout,
            dirty: false,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn accounts(&self) -> &[Account] {
        &self.accounts
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn render(&self) -> String {
        let capacity: usize = self
            .lines
            .iter()
            .map(|line| line.text.len() + line.eol.len())
            .sum();
        let mut out = String::with_capacity(capacity + BYTE_ORDER_MARK.len_utf8());
        if self.bom {
            out.push(BYTE_ORDER_MARK);
        }
        for line in &self.lines {
            out.push_str(&line.text);
            out.push_str(line.eol);
        }
        out
    }

    /// Rewrite the file with the current text.
    pub fn save(&self) -> Result<()> {
        fs::write(&self.path, self.render())
            .with_context(|| format!("write {}", self.path.display()))?;
        tracing::info!(path = %self.path.display(), "saved document");
        Ok(())
    }

    /// Append `user` to the end of a role's list, keeping the list's style.
    /// Membership is the caller's concern.
    pub fn append_user(&mut self, account: usize, role: &str, user: &str) -> Result<()> {
        let role_layout = self.role_layout(account, role)?.clone();
        match &role_layout.list {
            ListLayout::Block(items) => {
                let last = items
                    .last()
                    .ok_or_else(|| anyhow!("block list for role {role} has no items"))?;
                let prefix = &self.lines[last.line].text[..last.content_col];
                let text = format!("{prefix}{}", render_scalar(user, last.style));
                self.insert_line_after(last.line, text);
            }
            ListLayout::Flow { open, close, items } => {
                let style = items.last().map_or(QuoteStyle::Plain, |item| item.style);
                let rendered = render_scalar(user, style);
                let text = &mut self.lines[role_layout.key_line].text;
                match items.last() {
                    Some(last) => text.insert_str(last.end, &format!(", {rendered}")),
                    None => text.replace_range(open + 1..*close, &rendered),
                }
            }
            ListLayout::Null(Some((start, end))) => {
                let rendered = render_scalar(user, QuoteStyle::Plain);
                self.lines[role_layout.key_line]
                    .text
                    .replace_range(*start..*end, &format!("[{rendered}]"));
            }
            ListLayout::Null(None) => {
                let indent = " ".repeat(role_layout.key_indent + 2);
                let text = format!("{indent}- {}", render_scalar(user, QuoteStyle::Plain));
                self.insert_line_after(role_layout.key_line, text);
            }
        }
        self.mark_edited()
    }

    /// Remove every occurrence of `user` from a role's list. Returns how many
    /// entries were dropped.
    pub fn remove_user(&mut self, account: usize, role: &str, user: &str) -> Result<usize> {
        let role_layout = self.role_layout(account, role)?.clone();
        let removed = match &role_layout.list {
            ListLayout::Block(items) => {
                let doomed: Vec<usize> = items
                    .iter()
                    .filter(|item| item.value == user)
                    .map(|item| item.line)
                    .collect();
                if !doomed.is_empty() {
                    for line in doomed.iter().rev() {
                        self.remove_line(*line);
                    }
                    if doomed.len() == items.len() {
                        // Keep the value a list once its last entry is gone.
                        self.lines[role_layout.key_line]
                            .text
                            .insert_str(role_layout.value_col, " []");
                    }
                }
                doomed.len()
            }
            ListLayout::Flow { open, close, items } => {
                let text = &self.lines[role_layout.key_line].text;
                let kept: Vec<&str> = items
                    .iter()
                    .filter(|item| item.value != user)
                    .map(|item| &text[item.start..item.end])
                    .collect();
                let removed = items.len() - kept.len();
                if removed > 0 {
                    let rebuilt =
                        format!("{}{}{}", &text[..=*open], kept.join(", "), &text[*close..]);
                    self.lines[role_layout.key_line].text = rebuilt;
                }
                removed
            }
            ListLayout::Null(_) => 0,
        };
        if removed > 0 {
            self.mark_edited()?;
        }
        Ok(removed)
    }

    fn role_layout(&self, account: usize, role: &str) -> Result<&RoleLayout> {
        self.layout
            .get(account)
            .and_then(|layout| layout.roles.iter().find(|candidate| candidate.name == role))
            .ok_or_else(|| {
                anyhow!(
                    "role {role} not found on account #{account} in {}",
                    self.path.display()
                )
            })
    }

    fn insert_line_after(&mut self, idx: usize, text: String) {
        let eol = if self.lines[idx].eol.is_empty() {
            // Inserting after an unterminated last line: terminate it and
            // leave the new last line unterminated instead.
            self.lines[idx].eol = self.preferred_eol();
            ""
        } else {
            self.lines[idx].eol
        };
        self.lines.insert(idx + 1, Line { text, eol });
    }

    fn remove_line(&mut self, idx: usize) {
        let removed = self.lines.remove(idx);
        if removed.eol.is_empty() && idx == self.lines.len() && idx > 0 {
            self.lines[idx - 1].eol = "";
        }
    }

    fn preferred_eol(&self) -> &'static str {
        self.lines
            .iter()
            .map(|line| line.eol)
            .find(|eol| !eol.is_empty())
            .unwrap_or("\n")
    }

    /// Re-derive both views from the edited text so later edits see fresh
    /// offsets.
    fn mark_edited(&mut self) -> Result<()> {
        let reparsed = Self::parse(&self.path, &self.render()).map_err(|err| {
            anyhow!(
                "edit left {} in an unreadable state: {err}",
                self.path.display()
            )
        })?;
        self.lines = reparsed.lines;
        self.accounts = reparsed.accounts;
        self.layout = reparsed.layout;
        self.dirty = true;
        Ok(())
    }
}

fn split_lines(text: &str) -> Vec<Line> {
    text.split_inclusive('\n')
        .map(|raw| {
            if let Some(body) = raw.strip_suffix("\r\n") {
                Line {
                    text: body.to_string(),
                    eol: "\r\n",
                }
            } else if let Some(body) = raw.strip_suffix('\n') {
                Line {
                    text: body.to_string(),
                    eol: "\n",
                }
            } else {
                Line {
                    text: raw.to_string(),
                    eol: "",
                }
            }
        })
        .collect()
}

fn semantic_accounts(root: &Value) -> Result<Vec<Account>, LoadError> {
    let entries = match root.get("accounts") {
        Some(Value::Sequence(entries)) => entries,
        Some(Value::Null) | None => return Err(LoadError::MissingAccounts),
        Some(_) => return Err(LoadError::Unsupported("accounts is not a list".to_string())),
    };
    entries
        .iter()
        .enumerate()
        .map(|(idx, entry)| {
            let Value::Mapping(_) = entry else {
                return Err(LoadError::Unsupported(format!(
                    "account #{} is not a mapping",
                    idx + 1
                )));
            };
            Ok(Account {
                name: entry.get("account_name").and_then(scalar_string),
                number: entry.get("account_number").and_then(scalar_string),
                roles: semantic_roles(entry.get("roles"), idx)?,
            })
        })
        .collect()
}

fn semantic_roles(value: Option<&Value>, account_idx: usize) -> Result<Vec<Role>, LoadError> {
    let roles = match value {
        Some(Value::Mapping(roles)) => roles,
        Some(Value::Null) | None => return Ok(Vec::new()),
        Some(_) => {
            return Err(LoadError::Unsupported(format!(
                "roles of account #{} is not a mapping",
                account_idx + 1
            )))
        }
    };
    roles
        .iter()
        .map(|(name, users)| {
            let name = scalar_string(name).ok_or_else(|| {
                LoadError::Unsupported(format!(
                    "account #{} has a non-scalar role name",
                    account_idx + 1
                ))
            })?;
            let users = match users {
                Value::Sequence(items) => items
                    .iter()
                    .map(|item| {
                        scalar_string(item).ok_or_else(|| {
                            LoadError::Unsupported(format!("role {name} holds a non-scalar entry"))
                        })
                    })
                    .collect::<Result<Vec<_>, _>>()?,
                Value::Null => Vec::new(),
                _ => return Err(LoadError::Unsupported(format!("role {name} is not a list"))),
            };
            Ok(Role { name, users })
        })
        .collect()
}

/// String form of a scalar, whatever its YAML type.
fn scalar_string(value: &Value) -> Option<String> {
    match value {
        Value::String(text) => Some(text.clone()),
        Value::Number(number) => Some(number.to_string()),
        Value::Bool(flag) => Some(flag.to_string()),
        _ => None,
    }
}

fn check_alignment(accounts: &[Account], layout: &[AccountLayout]) -> Result<(), LoadError> {
    let mismatch = |what: String| LoadError::Unsupported(format!("could not map {what}"));
    if accounts.len() != layout.len() {
        return Err(mismatch(format!(
            "{} accounts onto {} list entries",
            accounts.len(),
            layout.len()
        )));
    }
    for (account, account_layout) in accounts.iter().zip(layout) {
        if account.roles.len() != account_layout.roles.len() {
            return Err(mismatch(format!("roles of account {}", account.label())));
        }
        for (role, role_layout) in account.roles.iter().zip(&account_layout.roles) {
            if role.name != role_layout.name || role.users != role_layout.list.values() {
                return Err(mismatch(format!(
                    "role {} of account {}",
                    role.name,
                    account.label()
                )));
            }
        }
    }
    Ok(())
}

#[cfg(test)]
#[path = "document_tests.rs"]
mod tests;
