//! Scalar tokens as they appear in the source text.
//!
//! Only the subset needed to read and write user identifiers is handled:
//! plain, single-quoted and double-quoted scalars on a single line.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum QuoteStyle {
    Plain,
    Single,
    Double,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Scalar {
    pub(crate) value: String,
    pub(crate) style: QuoteStyle,
    /// Byte offset just past the token (closing quote, or last non-space
    /// character of a plain scalar).
    pub(crate) end: usize,
}

/// Parse the scalar at the start of `text`. In flow context a plain scalar
/// also stops at `,` and `]`.
pub(crate) fn parse_scalar(text: &str, in_flow: bool) -> Option<Scalar> {
    match text.chars().next()? {
        '\'' => parse_single(text),
        '"' => parse_double(text),
        '[' | '{' | ']' | '}' | '&' | '*' | '!' | '|' | '>' | '#' => None,
        _ => Some(parse_plain(text, in_flow)),
    }
}

fn parse_single(text: &str) -> Option<Scalar> {
    let mut value = String::new();
    let mut chars = text.char_indices().skip(1).peekable();
    while let Some((idx, ch)) = chars.next() {
        if ch == '\'' {
            if matches!(chars.peek(), Some((_, '\''))) {
                chars.next();
                value.push('\'');
                continue;
            }
            return Some(Scalar {
                value,
                style: QuoteStyle::Single,
                end: idx + 1,
            });
        }
        value.push(ch);
    }
    None
}

fn parse_double(text: &str) -> Option<Scalar> {
    let mut value = String::new();
    let mut chars = text.char_indices().skip(1);
    while let Some((idx, ch)) = chars.next() {
        match ch {
            '"' => {
                return Some(Scalar {
                    value,
                    style: QuoteStyle::Double,
                    end: idx + 1,
                })
            }
            '\\' => {
                let (_, escaped) = chars.next()?;
                match escaped {
                    'n' => value.push('\n'),
                    't' => value.push('\t'),
                    'r' => value.push('\r'),
                    '0' => value.push('\0'),
                    '\\' | '"' | '/' | ' ' => value.push(escaped),
                    'x' | 'u' | 'U' => {
                        let width = match escaped {
                            'x' => 2,
                            'u' => 4,
                            _ => 8,
                        };
                        let mut code = String::with_capacity(width);
                        for _ in 0..width {
                            code.push(chars.next()?.1);
                        }
                        let code = u32::from_str_radix(&code, 16).ok()?;
                        value.push(char::from_u32(code)?);
                    }
                    _ => return None,
                }
            }
            _ => value.push(ch),
        }
    }
    None
}

fn parse_plain(text: &str, in_flow: bool) -> Scalar {
    let mut stop = text.len();
    let mut prev_is_space = false;
    for (idx, ch) in text.char_indices() {
        if ch == '#' && prev_is_space {
            stop = idx;
            break;
        }
        if in_flow && (ch == ',' || ch == ']') {
            stop = idx;
            break;
        }
        prev_is_space = ch == ' ' || ch == '\t';
    }
    let value = text[..stop].trim_end();
    Scalar {
        value: value.to_string(),
        style: QuoteStyle::Plain,
        end: value.len(),
    }
}

/// True when nothing but whitespace or a comment follows.
pub(crate) fn is_blank_or_comment(rest: &str) -> bool {
    let rest = rest.trim_start();
    rest.is_empty() || rest.starts_with('#')
}

/// Drop a trailing ` # comment` from an inline value. Quoted values are
/// respected so a `#` inside quotes is kept.
pub(crate) fn strip_comment(text: &str) -> &str {
    let mut quote: Option<char> = None;
    let mut prev_is_space = true;
    for (idx, ch) in text.char_indices() {
        match quote {
            Some(open) if ch == open => quote = None,
            Some(_) => {}
            None if ch == '\'' || ch == '"' => quote = Some(ch),
            None if ch == '#' && prev_is_space => return text[..idx].trim_end(),
            None => {}
        }
        prev_is_space = ch == ' ' || ch == '\t';
    }
    text.trim_end()
}

/// Split `key: rest` at the mapping colon. Returns the decoded key and the
/// byte offset just past the colon.
pub(crate) fn parse_key(body: &str) -> Option<(String, usize)> {
    if body.starts_with('\'') || body.starts_with('"') {
        let scalar = parse_scalar(body, false)?;
        let after = &body[scalar.end..];
        let spaces = after.len() - after.trim_start_matches(' ').len();
        let colon = scalar.end + spaces;
        if !body[colon..].starts_with(':') || !colon_terminates(body, colon) {
            return None;
        }
        return Some((scalar.value, colon + 1));
    }
    if body.starts_with('-') && (body.len() == 1 || body[1..].starts_with(' ')) {
        return None;
    }
    let mut prev_is_space = false;
    for (idx, ch) in body.char_indices() {
        if ch == '#' && prev_is_space {
            return None;
        }
        if ch == ':' && colon_terminates(body, idx) {
            let key = body[..idx].trim_end();
            if key.is_empty() {
                return None;
            }
            return Some((key.to_string(), idx + 1));
        }
        prev_is_space = ch == ' ';
    }
    None
}

fn colon_terminates(body: &str, colon: usize) -> bool {
    matches!(body[colon + 1..].chars().next(), None | Some(' ') | Some('\t'))
}

/// A single-line flow sequence such as `[a, 'b']`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct FlowList {
    pub(crate) open: usize,
    pub(crate) close: usize,
    pub(crate) items: Vec<FlowItem>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct FlowItem {
    pub(crate) start: usize,
    pub(crate) end: usize,
    pub(crate) value: String,
    pub(crate) style: QuoteStyle,
}

/// Parse a flow sequence starting at `text[offset]`, which must be `[`.
/// Offsets in the result are relative to `text`.
pub(crate) fn parse_flow_list(text: &str, offset: usize) -> Option<FlowList> {
    if !text[offset..].starts_with('[') {
        return None;
    }
    let mut items = Vec::new();
    let mut pos = offset + 1;
    loop {
        pos = skip_spaces(text, pos);
        let rest = &text[pos..];
        if rest.starts_with(']') {
            break;
        }
        let scalar = parse_scalar(rest, true)?;
        if scalar.style == QuoteStyle::Plain && scalar.value.is_empty() {
            return None;
        }
        items.push(FlowItem {
            start: pos,
            end: pos + scalar.end,
            value: scalar.value,
            style: scalar.style,
        });
        pos = skip_spaces(text, pos + scalar.end);
        match text[pos..].chars().next() {
            Some(',') => pos += 1,
            Some(']') => break,
            _ => return None,
        }
    }
    let close = pos;
    if !is_blank_or_comment(&text[close + 1..]) {
        return None;
    }
    Some(FlowList {
        open: offset,
        close,
        items,
    })
}

fn skip_spaces(text: &str, pos: usize) -> usize {
    let rest = &text[pos..];
    pos + (rest.len() - rest.trim_start_matches([' ', '\t']).len())
}

/// Render a value in the requested style. Plain values that would not read
/// back as the same string are single-quoted instead.
pub(crate) fn render_scalar(value: &str, style: QuoteStyle) -> String {
    let style = if value.chars().any(char::is_control) {
        QuoteStyle::Double
    } else {
        style
    };
    match style {
        QuoteStyle::Plain if !needs_quotes(value) => value.to_string(),
        QuoteStyle::Plain | QuoteStyle::Single => format!("'{}'", value.replace('\'', "''")),
        QuoteStyle::Double => {
            let mut out = String::with_capacity(value.len() + 2);
            out.push('"');
            for ch in value.chars() {
                match ch {
                    '"' => out.push_str("\\\""),
                    '\\' => out.push_str("\\\\"),
                    '\n' => out.push_str("\\n"),
                    '\t' => out.push_str("\\t"),
                    '\r' => out.push_str("\\r"),
                    ch if ch.is_control() => out.push_str(&format!("\\u{:04x}", ch as u32)),
                    ch => out.push(ch),
                }
            }
            out.push('"');
            out
        }
    }
}

const RESERVED_WORDS: [&str; 13] = [
    "true", "false", "yes", "no", "on", "off", "y", "n", "null", "~", ".inf", "-.inf", ".nan",
];

fn needs_quotes(value: &str) -> bool {
    let Some(first) = value.chars().next() else {
        return true;
    };
    if value.trim() != value {
        return true;
    }
    if "-?:,[]{}#&*!|>'\"%@`".contains(first) {
        return true;
    }
    if value.contains(": ")
        || value.contains(" #")
        || value.ends_with(':')
        || value.contains(['[', ']', '{', '}', ','])
    {
        return true;
    }
    let lower = value.to_ascii_lowercase();
    if RESERVED_WORDS.contains(&lower.as_str()) {
        return true;
    }
    looks_numeric(value)
}

fn looks_numeric(value: &str) -> bool {
    if value.parse::<f64>().is_ok() {
        return true;
    }
    let digits = value.trim_start_matches(['+', '-']);
    ["0x", "0o", "0b"]
        .iter()
        .any(|prefix| digits.to_ascii_lowercase().starts_with(prefix))
        || (!digits.is_empty() && digits.chars().all(|c| c.is_ascii_digit() || c == '_'))
}
