//! Flatten a message and its thread into one prompt-ready text block

use shipnotes_domain::Message;

const UNKNOWN_DATE: &str = "unknown-date";

/// Render `message` and its replies as chronological lines
///
/// The parent line carries the message id and UTC date. Each reply follows on
/// its own line, in arrival order, with its own id, date and author label.
///
/// ```text
/// [m1 | 2024-01-15] Shipped v2.1.0 to everyone
///   ↳ reply [r1 | 2024-01-15] Ada: congrats
/// ```
pub fn normalize_message(message: &Message) -> String {
    let mut out = format!(
        "[{} | {}] {}",
        message.id,
        date_label(message),
        message.text.trim()
    );

    for reply in &message.thread_replies {
        out.push('\n');
        out.push_str(&format!(
            "  ↳ reply [{} | {}] {}: {}",
            reply.id,
            date_label(reply),
            author_label(reply),
            reply.text.trim()
        ));
    }

    out
}

fn date_label(message: &Message) -> String {
    message.date().unwrap_or_else(|| UNKNOWN_DATE.to_string())
}

/// Author display name, or a short placeholder derived from the author id
fn author_label(message: &Message) -> String {
    match message.author_name.as_deref().map(str::trim) {
        Some(name) if !name.is_empty() => name.to_string(),
        _ => {
            let source = if message.author_id.is_empty() {
                &message.id
            } else {
                &message.author_id
            };
            let short: String = source.chars().take(6).collect();
            format!("user-{}", short)
        }
    }
}
