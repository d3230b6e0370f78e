//! Release records extracted from messages

use serde::{Deserialize, Serialize};

/// A structured record describing one shipped change
///
/// Produced from model output. Every field defaults to empty when the model
/// omits it; shape problems inside an element are a data-quality concern for
/// the consumer, not a parse failure.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Release {
    /// Release date, `YYYY-MM-DD`
    #[serde(default)]
    pub date: String,

    /// Short title, usually a product or version name
    #[serde(default)]
    pub title: String,

    /// What shipped
    #[serde(default)]
    pub description: String,

    /// Id of the message this release was extracted from
    #[serde(default)]
    pub source_message_id: String,

    /// Optional customer-facing rationale
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub why_this_matters: Option<String>,

    /// Optional impact statement
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub impact: Option<String>,
}

impl Release {
    /// Create a release with the required fields
    pub fn new(
        date: impl Into<String>,
        title: impl Into<String>,
        description: impl Into<String>,
        source_message_id: impl Into<String>,
    ) -> Self {
        Self {
            date: date.into(),
            title: title.into(),
            description: description.into(),
            source_message_id: source_message_id.into(),
            why_this_matters: None,
            impact: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_release_wire_names() {
        let mut release = Release::new("2024-01-15", "v2.1.0", "Faster sync", "m1");
        release.why_this_matters = Some("Less waiting".to_string());

        let json = serde_json::to_value(&release).unwrap();
        assert_eq!(json["sourceMessageId"], "m1");
        assert_eq!(json["whyThisMatters"], "Less waiting");
        assert!(json.get("impact").is_none());
    }

    #[test]
    fn test_missing_fields_default_to_empty() {
        let release: Release = serde_json::from_str(r#"{"title": "only a title"}"#).unwrap();
        assert_eq!(release.title, "only a title");
        assert_eq!(release.date, "");
        assert_eq!(release.source_message_id, "");
        assert_eq!(release.impact, None);
    }
}
