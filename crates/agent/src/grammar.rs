//! Scanner for action tokens embedded in conversational text.
//!
//! A token is `IDENT ws* "(" ws* OBJECT ws* ")"` where `IDENT` is
//! `[A-Za-z_][A-Za-z0-9_]*` and `OBJECT` is a brace-balanced JSON object.
//! Braces inside JSON strings (including escaped quotes) do not count toward
//! the balance. Everything outside tokens is kept as prose.
//!
//! A known name whose argument list is broken is reported as malformed and
//! scanning resumes right after it, so later tokens still parse. When the
//! object never closes, only `IDENT(` is consumed.

use crate::actions::{ActionName, ActionRequest};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ParsedAction {
    Invocation(ActionRequest),
    Unknown { name: String },
    Malformed { name: String, error: String },
}

impl ParsedAction {
    pub fn name(&self) -> &str {
        match self {
            Self::Invocation(request) => request.name().as_str(),
            Self::Unknown { name } | Self::Malformed { name, .. } => name,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ParsedTurn {
    pub actions: Vec<ParsedAction>,
    pub stripped_text: String,
}

pub fn parse_turn(text: &str) -> ParsedTurn {
    let bytes = text.as_bytes();
    let mut actions = Vec::new();
    let mut prose = String::with_capacity(text.len());
    let mut kept_from = 0;
    let mut cursor = 0;

    while cursor < bytes.len() {
        let at_boundary = cursor == 0 || !is_ident_continue(bytes[cursor - 1]);
        if !(at_boundary && is_ident_start(bytes[cursor])) {
            cursor += 1;
            continue;
        }

        let start = cursor;
        let mut name_end = start + 1;
        while name_end < bytes.len() && is_ident_continue(bytes[name_end]) {
            name_end += 1;
        }
        let name = &text[start..name_end];

        match scan_call(bytes, name_end) {
            CallScan::Complete { payload, end } => {
                actions.push(classify(name, &text[payload.0..payload.1]));
                prose.push_str(&text[kept_from..start]);
                prose.push(' ');
                kept_from = end;
                cursor = end;
            }
            CallScan::Broken { end, error } if ActionName::parse(name).is_some() => {
                actions.push(ParsedAction::Malformed { name: name.to_string(), error });
                prose.push_str(&text[kept_from..start]);
                prose.push(' ');
                kept_from = end;
                cursor = end;
            }
            _ => cursor = name_end,
        }
    }
    prose.push_str(&text[kept_from..]);

    ParsedTurn { actions, stripped_text: prose.split_whitespace().collect::<Vec<_>>().join(" ") }
}

fn classify(name: &str, payload: &str) -> ParsedAction {
    let Some(action) = ActionName::parse(name) else {
        return ParsedAction::Unknown { name: name.to_string() };
    };
    match ActionRequest::decode(action, payload) {
        Ok(request) => ParsedAction::Invocation(request),
        Err(error) => ParsedAction::Malformed { name: name.to_string(), error: error.to_string() },
    }
}

enum CallScan {
    /// Not a call at all; the identifier is prose.
    NotCall,
    /// `payload` is the object's byte range; `end` is just past `)`.
    Complete { payload: (usize, usize), end: usize },
    /// An opening parenthesis without a well-formed object argument.
    Broken { end: usize, error: String },
}

fn scan_call(bytes: &[u8], after_name: usize) -> CallScan {
    let open = skip_whitespace(bytes, after_name);
    if bytes.get(open) != Some(&b'(') {
        return CallScan::NotCall;
    }

    let object_start = skip_whitespace(bytes, open + 1);
    if bytes.get(object_start) != Some(&b'{') {
        return CallScan::Broken {
            end: skip_to_close_paren(bytes, open + 1),
            error: "arguments must be a single JSON object".to_string(),
        };
    }

    let Some(object_end) = scan_object(bytes, object_start) else {
        return CallScan::Broken {
            end: open + 1,
            error: "argument object is not terminated".to_string(),
        };
    };

    let close = skip_whitespace(bytes, object_end);
    if bytes.get(close) != Some(&b')') {
        return CallScan::Broken {
            end: skip_to_close_paren(bytes, object_end),
            error: "expected `)` after the argument object".to_string(),
        };
    }

    CallScan::Complete { payload: (object_start, object_end), end: close + 1 }
}

/// Returns the index just past the brace closing the object opened at `start`.
fn scan_object(bytes: &[u8], start: usize) -> Option<usize> {
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, &byte) in bytes[start..].iter().enumerate() {
        if in_string {
            match byte {
                _ if escaped => escaped = false,
                b'\\' => escaped = true,
                b'"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match byte {
            b'"' => in_string = true,
            b'{' => depth += 1,
            b'}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(start + offset + 1);
                }
            }
            _ => {}
        }
    }
    None
}

/// Index just past the next `)`, unless another `(` opens first; then
/// `from` itself so the following call is not swallowed.
fn skip_to_close_paren(bytes: &[u8], from: usize) -> usize {
    match bytes[from..].iter().position(|&byte| byte == b')' || byte == b'(') {
        Some(offset) if bytes[from + offset] == b')' => from + offset + 1,
        _ => from,
    }
}

fn skip_whitespace(bytes: &[u8], mut index: usize) -> usize {
    while index < bytes.len() && bytes[index].is_ascii_whitespace() {
        index += 1;
    }
    index
}

fn is_ident_start(byte: u8) -> bool {
    byte.is_ascii_alphabetic() || byte == b'_'
}

fn is_ident_continue(byte: u8) -> bool {
    byte.is_ascii_alphanumeric() || byte == b'_'
}
