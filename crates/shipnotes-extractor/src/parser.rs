//! Parse LLM output into releases
//!
//! Stages, each attempted only if the previous one failed:
//!
//! 1. strip a surrounding markdown code fence
//! 2. parse directly as JSON
//! 3. repair the text and parse again
//! 4. classify the failure as [`ExtractorError::Format`] (model answered in
//!    markdown/prose) or [`ExtractorError::Parse`] (anything else)

use crate::error::ExtractorError;
use crate::repair::repair_json;
use serde_json::{Map, Value};
use shipnotes_domain::Release;
use tracing::{debug, warn};

/// Parse an LLM response into releases
///
/// A valid JSON value that is not an array yields no releases rather than an
/// error. Array elements keep the model's order.
pub fn parse_llm_response(response: &str) -> Result<Vec<Release>, ExtractorError> {
    let json_str = strip_code_fence(response);

    let direct_err = match serde_json::from_str::<Value>(&json_str) {
        Ok(value) => return Ok(into_releases(value)),
        Err(e) => e,
    };

    debug!("Direct parse failed ({}), attempting repair", direct_err);

    if let Some(repaired) = repair_json(&json_str) {
        if let Ok(value) = serde_json::from_str::<Value>(&repaired) {
            let releases = into_releases(value);
            // JSON fished out of surrounding prose must yield at least one release
            if starts_with_json(&json_str) || !releases.is_empty() {
                warn!("Recovered model output via JSON repair (original error: {})", direct_err);
                return Ok(releases);
            }
            debug!("Repair found no releases inside prose; classifying as failure");
        }
    }

    if let Some(signal) = markdown_signal(response) {
        return Err(ExtractorError::Format(signal.to_string()));
    }

    Err(ExtractorError::Parse(direct_err.to_string()))
}

/// Remove a surrounding ```` ``` ```` fence, if the response starts with one
pub fn strip_code_fence(response: &str) -> String {
    let trimmed = response.trim();
    if !trimmed.starts_with("```") {
        return trimmed.to_string();
    }

    let mut lines: Vec<&str> = trimmed.lines().collect();
    if lines.len() == 1 {
        // ```json [...]```
        return after_fence_marker(trimmed).trim_end_matches('`').trim().to_string();
    }

    // Keep anything after the info string, e.g. the `[` of "```json ["
    let opening = after_fence_marker(lines[0]);
    if opening.is_empty() {
        lines.remove(0);
    } else {
        lines[0] = opening;
    }
    if lines.last().is_some_and(|l| l.trim().starts_with("```")) {
        lines.pop();
    }
    lines.join("\n")
}

/// Text following the opening backticks and the language word
fn after_fence_marker(line: &str) -> &str {
    line.trim_start_matches('`')
        .trim_start_matches(|c: char| c.is_ascii_alphanumeric())
        .trim()
}

fn starts_with_json(text: &str) -> bool {
    text.trim_start().starts_with(['[', '{'])
}

/// Describe why `response` looks like markdown, if it does
fn markdown_signal(response: &str) -> Option<&'static str> {
    let trimmed = response.trim_start();
    if trimmed.starts_with('#') {
        Some("response starts with a markdown heading")
    } else if trimmed.starts_with("```") {
        Some("response starts with a code fence that does not contain JSON")
    } else if response.contains("## ") {
        Some("response contains markdown section headings")
    } else {
        None
    }
}

fn into_releases(value: Value) -> Vec<Release> {
    let Value::Array(items) = value else {
        debug!("Model output is valid JSON but not an array; treating as no releases");
        return Vec::new();
    };

    let mut releases = Vec::with_capacity(items.len());
    for (idx, item) in items.into_iter().enumerate() {
        match item {
            Value::Object(obj) => releases.push(release_from_object(&obj)),
            other => warn!("Skipping release {}: not a JSON object ({})", idx, kind(&other)),
        }
    }
    releases
}

fn release_from_object(obj: &Map<String, Value>) -> Release {
    Release {
        date: text_field(obj, &["date"]).unwrap_or_default(),
        title: text_field(obj, &["title"]).unwrap_or_default(),
        description: text_field(obj, &["description"]).unwrap_or_default(),
        source_message_id: text_field(obj, &["sourceMessageId", "source_message_id"])
            .unwrap_or_default(),
        why_this_matters: text_field(obj, &["whyThisMatters", "why_this_matters"]),
        impact: text_field(obj, &["impact"]),
    }
}

/// First present key rendered as text; scalars are stringified, null is absent
fn text_field(obj: &Map<String, Value>, keys: &[&str]) -> Option<String> {
    keys.iter().find_map(|key| match obj.get(*key)? {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    })
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
