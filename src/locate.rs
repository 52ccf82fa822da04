//! Discovery of account documents under a repository root.
use anyhow::{anyhow, Result};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use walkdir::{DirEntry, WalkDir};

const DOCUMENT_EXTENSIONS: [&str; 2] = ["yml", "yaml"];

/// Collect every YAML document under `root`, skipping excluded directories
/// without descending into them. Results are sorted for stable output.
pub fn find_documents(root: &Path, excluded_dirs: &[String]) -> Result<Vec<PathBuf>> {
    if !root.is_dir() {
        return Err(anyhow!("document root {} is not a directory", root.display()));
    }
    let excluded: HashSet<&str> = excluded_dirs.iter().map(String::as_str).collect();

    let mut documents = Vec::new();
    let walker = WalkDir::new(root)
        .follow_links(false)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| !is_excluded_dir(entry, &excluded));
    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(err) => {
                tracing::warn!(error = %err, "skipping unreadable entry");
                continue;
            }
        };
        if entry.file_type().is_file() && is_document(entry.path()) {
            documents.push(entry.into_path());
        }
    }
    tracing::debug!(
        root = %root.display(),
        count = documents.len(),
        "document discovery complete"
    );
    Ok(documents)
}

fn is_excluded_dir(entry: &DirEntry, excluded: &HashSet<&str>) -> bool {
    // The root itself is never pruned, even if its name matches.
    if entry.depth() == 0 || !entry.file_type().is_dir() {
        return false;
    }
    entry
        .file_name()
        .to_str()
        .is_some_and(|name| excluded.contains(name))
}

fn is_document(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| {
            DOCUMENT_EXTENSIONS
                .iter()
                .any(|known| ext.eq_ignore_ascii_case(known))
        })
}
