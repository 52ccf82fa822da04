use anyhow::{anyhow, Result};
use regex::Regex;
use std::path::Path;
use std::sync::OnceLock;

pub fn display_path(path: &Path, base: Option<&Path>) -> String {
    if let Some(base) = base {
        if let Ok(relative) = path.strip_prefix(base) {
            return relative.display().to_string();
        }
    }
    path.display().to_string()
}

pub fn truncate_string(text: &str, max_bytes: usize) -> String {
    if text.len() <= max_bytes {
        return text.to_string();
    }
    let mut truncated = String::new();
    for ch in text.chars() {
        if truncated.len() + ch.len_utf8() > max_bytes {
            break;
        }
        truncated.push(ch);
    }
    truncated
}

/// Trim every entry, drop empty ones and repeated ones, keeping first-seen
/// order. Accepts values that still contain commas.
pub fn normalize_list<S: AsRef<str>>(values: &[S]) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for value in values {
        for part in value.as_ref().split(',') {
            let part = part.trim();
            if !part.is_empty() && !out.iter().any(|seen| seen == part) {
                out.push(part.to_string());
            }
        }
    }
    out
}

fn reference_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^[A-Za-z0-9][A-Za-z0-9._/-]*$").expect("reference id pattern compiles")
    })
}

/// Check that a reference id can be used inside a branch name.
pub fn validate_reference(reference: &str) -> Result<&str> {
    let reference = reference.trim();
    if reference.is_empty() {
        return Err(anyhow!("reference id is empty"));
    }
    let valid = reference_pattern().is_match(reference)
        && !reference.contains("..")
        && !reference.contains("//")
        && !reference.ends_with('/')
        && !reference.ends_with('.')
        && !reference.ends_with(".lock");
    if !valid {
        return Err(anyhow!(
            "reference id {reference:?} cannot be used in a branch name (letters, digits, '.', '_', '-', '/')"
        ));
    }
    Ok(reference)
}
