//! Best-effort structural repair of near-valid JSON
//!
//! Pure text-to-text. The output is not guaranteed to parse; callers re-parse
//! and decide what a failure means.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Frame {
    Object { after_colon: bool },
    Array,
}

impl Frame {
    fn closer(self) -> char {
        match self {
            Frame::Object { .. } => '}',
            Frame::Array => ']',
        }
    }

    fn closed_by(self, c: char) -> bool {
        self.closer() == c
    }
}

/// Repair common LLM JSON damage
///
/// Handles text before the first `[`/`{` and after the root value closes,
/// trailing commas, raw control characters inside strings, stray or
/// mismatched closers, and truncation (open strings, dangling keys,
/// half-written literals, unclosed brackets).
///
/// Returns `None` when the text contains no JSON container at all.
///
/// # Examples
///
/// ```
/// use shipnotes_extractor::repair_json;
///
/// assert_eq!(repair_json(r#"[{"a": 1},"#).as_deref(), Some(r#"[{"a": 1}]"#));
/// assert_eq!(repair_json("no json here"), None);
/// ```
pub fn repair_json(input: &str) -> Option<String> {
    let start = input.find(['[', '{'])?;

    let mut out = String::with_capacity(input.len() + 16);
    let mut stack: Vec<Frame> = Vec::new();
    let mut in_string = false;
    let mut escaped = false;

    for c in input[start..].chars() {
        if in_string {
            if escaped {
                out.push(c);
                escaped = false;
                continue;
            }
            match c {
                '\\' => {
                    out.push(c);
                    escaped = true;
                }
                '"' => {
                    out.push(c);
                    in_string = false;
                }
                '\n' => out.push_str("\\n"),
                '\r' => out.push_str("\\r"),
                '\t' => out.push_str("\\t"),
                _ => out.push(c),
            }
            continue;
        }

        match c {
            '"' => {
                out.push(c);
                in_string = true;
            }
            '{' => {
                stack.push(Frame::Object { after_colon: false });
                out.push(c);
            }
            '[' => {
                stack.push(Frame::Array);
                out.push(c);
            }
            '}' | ']' => {
                // Stray closer with nothing to match
                if !stack.iter().any(|f| f.closed_by(c)) {
                    continue;
                }
                while let Some(frame) = stack.pop() {
                    complete_dangling(&mut out, frame);
                    out.push(frame.closer());
                    if frame.closed_by(c) {
                        break;
                    }
                }
                if stack.is_empty() {
                    // Root closed; anything after it is commentary
                    return Some(out);
                }
            }
            ':' => {
                if let Some(Frame::Object { after_colon }) = stack.last_mut() {
                    *after_colon = true;
                }
                out.push(c);
            }
            ',' => {
                if let Some(Frame::Object { after_colon }) = stack.last_mut() {
                    *after_colon = false;
                }
                out.push(c);
            }
            _ => out.push(c),
        }
    }

    if in_string {
        if escaped {
            out.pop();
        }
        out.push('"');
    } else {
        trim_incomplete_literal(&mut out);
    }

    while let Some(frame) = stack.pop() {
        complete_dangling(&mut out, frame);
        out.push(frame.closer());
    }

    Some(out)
}

/// Prepare `out` for a closer: drop a trailing comma, give a dangling key or
/// colon a `null` value
fn complete_dangling(out: &mut String, frame: Frame) {
    let len = out.trim_end().len();
    out.truncate(len);

    if out.ends_with(',') {
        out.pop();
        return;
    }
    if out.ends_with(':') {
        out.push_str("null");
        return;
    }
    if frame == (Frame::Object { after_colon: false }) {
        if out.ends_with('"') && final_string_is_key(out) {
            out.push_str(":null");
        }
    }
}

/// Whether the string literal ending `out` sits directly after `{` or `,`
fn final_string_is_key(out: &str) -> bool {
    // Walk back over the final string literal
    let bytes = out.as_bytes();
    let mut i = bytes.len().saturating_sub(1);
    while i > 0 {
        i -= 1;
        if bytes[i] == b'"' {
            let mut backslashes = 0;
            let mut j = i;
            while j > 0 && bytes[j - 1] == b'\\' {
                backslashes += 1;
                j -= 1;
            }
            if backslashes % 2 == 0 {
                break;
            }
        }
    }
    let before = out[..i].trim_end();
    before.ends_with('{') || before.ends_with(',')
}

fn is_literal_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '+')
}

/// Drop a half-written `true`/`false`/`null` or number at the end of `out`
fn trim_incomplete_literal(out: &mut String) {
    let len = out.trim_end().len();
    out.truncate(len);

    let tail_start = out
        .char_indices()
        .rev()
        .find(|(_, c)| !is_literal_char(*c))
        .map(|(i, c)| i + c.len_utf8())
        .unwrap_or(0);
    let tail = &out[tail_start..];
    if tail.is_empty() {
        return;
    }

    let is_number = tail.starts_with(|c: char| c.is_ascii_digit() || c == '-')
        && tail.parse::<f64>().is_ok()
        && tail.ends_with(|c: char| c.is_ascii_digit());
    let complete = matches!(tail, "true" | "false" | "null") || is_number;
    if !complete {
        out.truncate(tail_start);
    }
}
