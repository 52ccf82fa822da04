//! Line-level map of where accounts, roles and user entries sit in the
//! source text.
//!
//! The scanner only understands the block layout account documents use in
//! practice. Anything else is reported as an error and the document is left
//! alone; the semantic view from `serde_yaml` is then cross-checked against
//! this map before any edit is allowed.
use super::scalar::{
    is_blank_or_comment, parse_flow_list, parse_key, parse_scalar, strip_comment, FlowItem,
    QuoteStyle,
};
use super::Line;

#[derive(Debug, Clone)]
pub(crate) struct AccountLayout {
    pub(crate) roles: Vec<RoleLayout>,
}

#[derive(Debug, Clone)]
pub(crate) struct RoleLayout {
    pub(crate) name: String,
    pub(crate) key_line: usize,
    pub(crate) key_indent: usize,
    /// Byte offset in the key line just past the `:`.
    pub(crate) value_col: usize,
    pub(crate) list: ListLayout,
}

#[derive(Debug, Clone)]
pub(crate) enum ListLayout {
    /// Non-empty block sequence, one item per line.
    Block(Vec<BlockItem>),
    /// Single-line flow sequence on the key line.
    Flow {
        open: usize,
        close: usize,
        items: Vec<FlowItem>,
    },
    /// No value, or an explicit `null`/`~` at the given byte range.
    Null(Option<(usize, usize)>),
}

#[derive(Debug, Clone)]
pub(crate) struct BlockItem {
    pub(crate) line: usize,
    /// Byte offset where the scalar starts (after `- `).
    pub(crate) content_col: usize,
    pub(crate) value: String,
    pub(crate) style: QuoteStyle,
}

impl ListLayout {
    pub(crate) fn values(&self) -> Vec<&str> {
        match self {
            ListLayout::Block(items) => items.iter().map(|item| item.value.as_str()).collect(),
            ListLayout::Flow { items, .. } => {
                items.iter().map(|item| item.value.as_str()).collect()
            }
            ListLayout::Null(_) => Vec::new(),
        }
    }
}

type ScanResult<T> = Result<T, String>;

struct SeqItem {
    line: usize,
    content_col: Option<usize>,
    end: usize,
}

struct MapEntry {
    key: String,
    line: usize,
    indent: usize,
    value_col: usize,
    value_end: usize,
}

/// Build the layout of every entry in the top-level `accounts` sequence.
pub(crate) fn scan(lines: &[Line]) -> ScanResult<Vec<AccountLayout>> {
    let (accounts_line, value_col) = find_accounts_key(lines)?;
    let inline = strip_comment(&lines[accounts_line].text[value_col..]).trim();
    if inline == "[]" {
        return Ok(Vec::new());
    }
    if !inline.is_empty() {
        return Err("accounts is not a block sequence".to_string());
    }

    let end = (accounts_line + 1..lines.len())
        .find(|&idx| matches!(significant(lines, idx), Some((0, body)) if !is_dash(body)))
        .unwrap_or(lines.len());

    sequence_items(lines, accounts_line + 1, end)?
        .into_iter()
        .map(|item| scan_account(lines, &item))
        .collect()
}

fn find_accounts_key(lines: &[Line]) -> ScanResult<(usize, usize)> {
    for idx in 0..lines.len() {
        let Some((0, body)) = significant(lines, idx) else {
            continue;
        };
        if let Some((key, after)) = parse_key(body) {
            if key == "accounts" {
                return Ok((idx, after));
            }
        }
    }
    Err("no top-level accounts key in block layout".to_string())
}

fn scan_account(lines: &[Line], item: &SeqItem) -> ScanResult<AccountLayout> {
    let entries = match item.content_col {
        Some(col) => mapping_entries(lines, Some((item.line, col)), item.line + 1, item.end)?,
        None => mapping_entries(lines, None, item.line + 1, item.end)?,
    };
    let Some(roles) = entries.iter().find(|entry| entry.key == "roles") else {
        return Ok(AccountLayout { roles: Vec::new() });
    };

    let inline = strip_comment(&lines[roles.line].text[roles.value_col..]).trim();
    match inline {
        "" => {}
        "{}" | "null" | "~" => return Ok(AccountLayout { roles: Vec::new() }),
        _ => return Err(format!("roles on line {} is not a block mapping", roles.line + 1)),
    }

    let role_entries = mapping_entries(lines, None, roles.line + 1, roles.value_end)?;
    let roles = role_entries
        .iter()
        .map(|entry| scan_role(lines, entry))
        .collect::<ScanResult<Vec<_>>>()?;
    Ok(AccountLayout { roles })
}

fn scan_role(lines: &[Line], entry: &MapEntry) -> ScanResult<RoleLayout> {
    let text = &lines[entry.line].text;
    let after = &text[entry.value_col..];
    let token_start = entry.value_col + (after.len() - after.trim_start().len());
    let inline = strip_comment(&text[token_start..]);

    let list = if inline.is_empty() {
        let items = block_items(lines, entry)?;
        if items.is_empty() {
            ListLayout::Null(None)
        } else {
            ListLayout::Block(items)
        }
    } else if inline.starts_with('[') {
        let flow = parse_flow_list(text, token_start).ok_or_else(|| {
            format!(
                "role {} on line {} is not a single-line list",
                entry.key,
                entry.line + 1
            )
        })?;
        ensure_no_nested_value(lines, entry)?;
        ListLayout::Flow {
            open: flow.open,
            close: flow.close,
            items: flow.items,
        }
    } else if matches!(inline, "null" | "Null" | "NULL" | "~") {
        ensure_no_nested_value(lines, entry)?;
        ListLayout::Null(Some((token_start, token_start + inline.len())))
    } else {
        return Err(format!(
            "role {} on line {} is not a list",
            entry.key,
            entry.line + 1
        ));
    };

    Ok(RoleLayout {
        name: entry.key.clone(),
        key_line: entry.line,
        key_indent: entry.indent,
        value_col: entry.value_col,
        list,
    })
}

fn block_items(lines: &[Line], entry: &MapEntry) -> ScanResult<Vec<BlockItem>> {
    let mut items = Vec::new();
    for seq_item in sequence_items(lines, entry.line + 1, entry.value_end)? {
        let content_col = seq_item
            .content_col
            .filter(|_| seq_item.end == next_significant(lines, seq_item.line + 1, seq_item.end))
            .ok_or_else(|| {
                format!(
                    "entry on line {} under role {} spans multiple lines",
                    seq_item.line + 1,
                    entry.key
                )
            })?;
        let text = &lines[seq_item.line].text;
        let scalar = parse_scalar(&text[content_col..], false)
            .filter(|scalar| is_blank_or_comment(&text[content_col + scalar.end..]))
            .ok_or_else(|| {
                format!(
                    "entry on line {} under role {} is not a plain string",
                    seq_item.line + 1,
                    entry.key
                )
            })?;
        items.push(BlockItem {
            line: seq_item.line,
            content_col,
            value: scalar.value,
            style: scalar.style,
        });
    }
    Ok(items)
}

fn ensure_no_nested_value(lines: &[Line], entry: &MapEntry) -> ScanResult<()> {
    if next_significant(lines, entry.line + 1, entry.value_end) < entry.value_end {
        return Err(format!(
            "role {} on line {} has content after an inline value",
            entry.key,
            entry.line + 1
        ));
    }
    Ok(())
}

/// Split `start..end` into block sequence items. The first significant line
/// fixes the dash indentation.
fn sequence_items(lines: &[Line], start: usize, end: usize) -> ScanResult<Vec<SeqItem>> {
    let mut items: Vec<SeqItem> = Vec::new();
    let mut seq_indent = None;
    for idx in start..end {
        let Some((indent, body)) = significant(lines, idx) else {
            continue;
        };
        let expected = *seq_indent.get_or_insert(indent);
        if indent == expected && is_dash(body) {
            if let Some(last) = items.last_mut() {
                last.end = idx;
            }
            let after = &body[1..];
            let gap = after.len() - after.trim_start_matches(' ').len();
            let content_col =
                (!is_blank_or_comment(after)).then_some(indent + 1 + gap);
            items.push(SeqItem {
                line: idx,
                content_col,
                end,
            });
        } else if indent > expected && !items.is_empty() {
            continue;
        } else {
            return Err(format!("unexpected content on line {} in a list", idx + 1));
        }
    }
    Ok(items)
}

/// Collect mapping keys in `start..end`. `first` is a key that starts
/// mid-line, after a sequence dash.
fn mapping_entries(
    lines: &[Line],
    first: Option<(usize, usize)>,
    start: usize,
    end: usize,
) -> ScanResult<Vec<MapEntry>> {
    let mut entries: Vec<MapEntry> = Vec::new();
    let mut key_indent = None;

    if let Some((line, col)) = first {
        let body = &lines[line].text[col..];
        let (key, after) =
            parse_key(body).ok_or_else(|| format!("expected a mapping on line {}", line + 1))?;
        entries.push(MapEntry {
            key,
            line,
            indent: col,
            value_col: col + after,
            value_end: end,
        });
        key_indent = Some(col);
    }

    for idx in start..end {
        let Some((indent, body)) = significant(lines, idx) else {
            continue;
        };
        let expected = *key_indent.get_or_insert(indent);
        if indent > expected || (indent == expected && is_dash(body)) {
            if entries.is_empty() {
                return Err(format!("unexpected content on line {}", idx + 1));
            }
            continue;
        }
        if indent < expected {
            return Err(format!("unexpected indentation on line {}", idx + 1));
        }
        let (key, after) =
            parse_key(body).ok_or_else(|| format!("expected a mapping key on line {}", idx + 1))?;
        if let Some(last) = entries.last_mut() {
            last.value_end = idx;
        }
        entries.push(MapEntry {
            key,
            line: idx,
            indent,
            value_col: indent + after,
            value_end: end,
        });
    }
    Ok(entries)
}

/// Indentation and content of a line that carries YAML content; blank lines,
/// comments and document markers yield `None`.
fn significant(lines: &[Line], idx: usize) -> Option<(usize, &str)> {
    let text = lines[idx].text.as_str();
    let body = text.trim_start_matches(' ');
    if body.is_empty() || body.starts_with('#') {
        return None;
    }
    let indent = text.len() - body.len();
    if indent == 0 && (body.starts_with("---") || body.starts_with("...")) {
        let marker_rest = &body[3..];
        if marker_rest.is_empty() || marker_rest.starts_with(' ') {
            return None;
        }
    }
    if body.trim().is_empty() {
        return None;
    }
    Some((indent, body))
}

fn next_significant(lines: &[Line], start: usize, end: usize) -> usize {
    (start..end)
        .find(|&idx| significant(lines, idx).is_some())
        .unwrap_or(end)
}

fn is_dash(body: &str) -> bool {
    body == "-" || body.starts_with("- ")
}
