//! Line parsing for the console.
//!
//! Two surface syntaxes map to the same commands:
//!
//! - `<command> [args...]`, whitespace separated, double quotes group
//! - `<Class>.<command>(<args>)`, comma separated

use crate::models::AttrValue;

/// One parsed input line.
#[derive(Debug, Clone, PartialEq)]
pub enum Line {
    Empty,
    Command { name: String, args: Vec<String> },
    /// `<Class>.update("<id>", {...})`
    UpdateFromJson {
        class: String,
        id: String,
        json: String,
    },
}

/// Parse a line. `None` means the line is not recognised syntax.
pub fn parse_line(line: &str) -> Option<Line> {
    let line = line.trim();
    if line.is_empty() {
        return Some(Line::Empty);
    }
    if let Some(call) = parse_dot_call(line) {
        return Some(call);
    }

    let mut tokens = tokenize(line).into_iter();
    let name = tokens.next()?;
    if name.contains('.') || name.contains('(') {
        return None;
    }
    Some(Line::Command {
        name,
        args: tokens.collect(),
    })
}

/// Split on whitespace outside double quotes. Quotes are kept; a backslash
/// inside quotes protects the following character. An unterminated quote runs
/// to the end of the line.
pub fn tokenize(line: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut chars = line.chars();

    while let Some(c) = chars.next() {
        match c {
            '\\' if in_quotes => {
                current.push(c);
                if let Some(next) = chars.next() {
                    current.push(next);
                }
            }
            '"' => {
                in_quotes = !in_quotes;
                current.push(c);
            }
            c if c.is_whitespace() && !in_quotes => {
                if !current.is_empty() {
                    tokens.push(std::mem::take(&mut current));
                }
            }
            c => current.push(c),
        }
    }
    if !current.is_empty() {
        tokens.push(current);
    }
    tokens
}

/// Parse a `key=value` creation parameter.
pub fn parse_param(token: &str) -> Option<(String, AttrValue)> {
    let (key, raw) = token.split_once('=')?;
    if key.is_empty() {
        return None;
    }
    Some((key.to_string(), parse_value(raw)?))
}

/// Parse a creation parameter value.
///
/// - `"..."`: a string; `\"` becomes `"` and `_` becomes a space
/// - contains `.`: a float
/// - otherwise: an integer
///
/// Anything else is rejected.
pub fn parse_value(raw: &str) -> Option<AttrValue> {
    if let Some(body) = raw.strip_prefix('"') {
        return parse_quoted(body).map(AttrValue::Str);
    }
    if raw.contains('.') {
        return raw
            .parse::<f64>()
            .ok()
            .filter(|f| f.is_finite())
            .map(AttrValue::Float);
    }
    raw.parse::<i64>().ok().map(AttrValue::Int)
}

/// Body of a quoted string, after the opening quote. The closing quote must be
/// the last character.
fn parse_quoted(body: &str) -> Option<String> {
    let mut value = String::with_capacity(body.len());
    let mut chars = body.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '\\' if chars.peek() == Some(&'"') => {
                chars.next();
                value.push('"');
            }
            '"' => {
                return if chars.next().is_none() {
                    Some(value)
                } else {
                    None
                };
            }
            '_' => value.push(' '),
            c => value.push(c),
        }
    }
    None
}

/// Strip one pair of surrounding double quotes, if present.
pub fn unquote(raw: &str) -> &str {
    raw.strip_prefix('"')
        .and_then(|s| s.strip_suffix('"'))
        .unwrap_or(raw)
}

/// `<Class>.<method>(<args>)`
fn parse_dot_call(line: &str) -> Option<Line> {
    let (class, rest) = line.split_once('.')?;
    let (method, rest) = rest.split_once('(')?;
    let args = rest.strip_suffix(')')?.trim();

    if class.is_empty() || class.contains(char::is_whitespace) {
        return None;
    }
    let class = class.to_string();

    let line = match method {
        "all" | "count" if args.is_empty() => Line::Command {
            name: method.to_string(),
            args: vec![class],
        },
        "show" | "destroy" => Line::Command {
            name: method.to_string(),
            args: std::iter::once(class).chain(split_args(args)).collect(),
        },
        "update" => match args.find('{') {
            Some(brace) => Line::UpdateFromJson {
                class,
                id: unquote(args[..brace].trim().trim_end_matches(',').trim()).to_string(),
                json: args[brace..].to_string(),
            },
            None => Line::Command {
                name: method.to_string(),
                args: std::iter::once(class).chain(split_args(args)).collect(),
            },
        },
        _ => return None,
    };
    Some(line)
}

/// Split call arguments on commas outside double quotes. Quotes are kept.
fn split_args(args: &str) -> Vec<String> {
    let mut parts = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;

    for c in args.chars() {
        match c {
            '"' => {
                in_quotes = !in_quotes;
                current.push(c);
            }
            ',' if !in_quotes => parts.push(std::mem::take(&mut current)),
            c => current.push(c),
        }
    }
    parts.push(current);

    parts
        .into_iter()
        .map(|part| part.trim().to_string())
        .filter(|part| !part.is_empty())
        .collect()
}
