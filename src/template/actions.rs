// Splits template text into literal text and `{{ ... }}` actions before it reaches the parser.
const LEFT_DELIM: &str = "{{";
const RIGHT_DELIM: &str = "}}";
const LEFT_TRIM_MARKER: &str = "- ";
const RIGHT_TRIM_MARKER: &str = " -";
const LEFT_COMMENT: &str = "/*";
const RIGHT_COMMENT: &str = "*/";

// Actions starting with one of these produce no output of their own.
const CONTROL_KEYWORDS: [&str; 10] = [
    "block", "break", "continue", "define", "else", "end", "if", "range", "template", "with",
];

#[derive(Debug, PartialEq)]
pub(crate) enum Piece<'a> {
    Text(&'a str),
    /// The text between the delimiters, trim markers included.
    Action(&'a str),
    /// The whole comment action, delimiters included.
    Comment(&'a str),
}

/// Splits `text` into pieces. Fails on an action or comment that is never closed, or on a
/// quoted string left open inside an action.
pub(crate) fn split_actions(text: &str) -> Result<Vec<Piece<'_>>, String> {
    let mut pieces = Vec::new();
    let mut rest = text;
    while let Some(start) = rest.find(LEFT_DELIM) {
        if start > 0 {
            pieces.push(Piece::Text(&rest[..start]));
        }
        let inner = &rest[start + LEFT_DELIM.len()..];
        let marker = if inner.starts_with(LEFT_TRIM_MARKER) { LEFT_TRIM_MARKER.len() } else { 0 };
        if inner[marker..].starts_with(LEFT_COMMENT) {
            let len = comment_len(&inner[marker..])
                .ok_or_else(|| format!("unclosed comment at offset {}", text.len() - rest.len() + start))?;
            let end = start + LEFT_DELIM.len() + marker + len;
            pieces.push(Piece::Comment(&rest[start..end]));
            rest = &rest[end..];
        } else {
            let len = action_len(inner)
                .ok_or_else(|| format!("unclosed action at offset {}", text.len() - rest.len() + start))?;
            pieces.push(Piece::Action(&inner[..len]));
            rest = &inner[len + RIGHT_DELIM.len()..];
        }
    }
    if !rest.is_empty() {
        pieces.push(Piece::Text(rest));
    }
    Ok(pieces)
}

// Length of `s` up to the closing delimiter, skipping over quoted strings.
fn action_len(s: &str) -> Option<usize> {
    let mut quote: Option<char> = None;
    let mut escaped = false;
    for (i, c) in s.char_indices() {
        match quote {
            Some(q) => {
                if escaped {
                    escaped = false;
                } else if c == '\\' && q != '`' {
                    escaped = true;
                } else if c == q {
                    quote = None;
                }
            }
            None => match c {
                '"' | '`' | '\'' => quote = Some(c),
                '}' if s[i..].starts_with(RIGHT_DELIM) => return Some(i),
                _ => {}
            },
        }
    }
    None
}

// Length of a comment starting at `/*`, through its closing delimiter.
fn comment_len(s: &str) -> Option<usize> {
    let close = s.find(RIGHT_COMMENT)? + RIGHT_COMMENT.len();
    let after = &s[close..];
    if after.starts_with(RIGHT_DELIM) {
        Some(close + RIGHT_DELIM.len())
    } else if after.starts_with(RIGHT_TRIM_MARKER) && after[RIGHT_TRIM_MARKER.len()..].starts_with(RIGHT_DELIM) {
        Some(close + RIGHT_TRIM_MARKER.len() + RIGHT_DELIM.len())
    } else {
        None
    }
}

fn is_ident_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

// A declaration such as `$x := .value` assigns without printing.
fn is_declaration(body: &str) -> bool {
    let Some(var) = body.strip_prefix('$') else {
        return false;
    };
    let after = var.trim_start_matches(is_ident_char).trim_start();
    after.starts_with(":=") || after.starts_with(',') || (after.starts_with('=') && !after.starts_with("=="))
}

fn prints_output(body: &str) -> bool {
    let body = body.trim();
    if body.is_empty() {
        return false;
    }
    let word: String = body.chars().take_while(|c| is_ident_char(*c)).collect();
    if CONTROL_KEYWORDS.contains(&word.as_str()) {
        return false;
    }
    !is_declaration(body)
}

/// Appends `escaper` to the pipeline of every action that prints a value.
pub(crate) fn escape_actions(text: &str, escaper: &str) -> Result<String, String> {
    let pieces = split_actions(text)?;
    let mut out = String::with_capacity(text.len() + pieces.len() * (escaper.len() + 3));
    for piece in pieces {
        match piece {
            Piece::Text(s) | Piece::Comment(s) => out.push_str(s),
            Piece::Action(action) => {
                out.push_str(LEFT_DELIM);
                let lead = if action.starts_with(LEFT_TRIM_MARKER) { LEFT_TRIM_MARKER } else { "" };
                let trail = if action.len() >= lead.len() + RIGHT_TRIM_MARKER.len()
                    && action.ends_with(RIGHT_TRIM_MARKER)
                {
                    RIGHT_TRIM_MARKER
                } else {
                    ""
                };
                let body = &action[lead.len()..action.len() - trail.len()];
                if prints_output(body) {
                    out.push_str(lead);
                    out.push_str(body);
                    out.push_str(" | ");
                    out.push_str(escaper);
                    out.push_str(trail);
                } else {
                    out.push_str(action);
                }
                out.push_str(RIGHT_DELIM);
            }
        }
    }
    Ok(out)
}
