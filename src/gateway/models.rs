use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A persisted meeting record, as returned by the analysis API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transcript {
    pub id: String,
    pub title: String,
    pub content: String,
    pub created_at: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key_points: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action_items: Option<Vec<ActionItem>>,
}

impl Transcript {
    pub fn is_analyzed(&self) -> bool {
        self.summary.as_deref().is_some_and(|s| !s.is_empty())
    }

    /// Label shown in the history list.
    pub fn status_label(&self) -> &'static str {
        if self.is_analyzed() {
            "Analyzed"
        } else {
            "Pending"
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    High,
    Medium,
    Low,
}

impl Priority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::High => "high",
            Priority::Medium => "medium",
            Priority::Low => "low",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "high" => Some(Priority::High),
            "medium" => Some(Priority::Medium),
            "low" => Some(Priority::Low),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ItemStatus {
    Pending,
    InProgress,
    Completed,
}

impl ItemStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ItemStatus::Pending => "pending",
            ItemStatus::InProgress => "in-progress",
            ItemStatus::Completed => "completed",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "pending" => Some(ItemStatus::Pending),
            "in-progress" | "in_progress" => Some(ItemStatus::InProgress),
            "completed" | "done" => Some(ItemStatus::Completed),
            _ => None,
        }
    }
}

/// A single extracted task. Always owned by one transcript.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionItem {
    pub id: String,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deadline: Option<String>,
    pub priority: Priority,
    pub status: ItemStatus,
    pub created_at: String,
}

/// Summary, key points and action items for one transcript.
///
/// Only the most recent result is held client-side; persistence is a
/// side effect of analyze-by-id on the server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResult {
    pub summary: String,
    pub key_points: Vec<String>,
    pub action_items: Vec<ActionItem>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub participant_count: Option<i64>,
}

impl AnalysisResult {
    /// Rebuild a result from a transcript that has already been analyzed.
    pub fn from_transcript(t: &Transcript) -> Option<Self> {
        let summary = t.summary.clone().filter(|s| !s.is_empty())?;
        Some(AnalysisResult {
            summary,
            key_points: t.key_points.clone().unwrap_or_default(),
            action_items: t.action_items.clone().unwrap_or_default(),
            duration: None,
            participant_count: None,
        })
    }
}

/// Partial transcript update. Omitted fields are left alone server-side.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TranscriptUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key_points: Option<Vec<String>>,
}

impl TranscriptUpdate {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.content.is_none()
            && self.summary.is_none()
            && self.key_points.is_none()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ActionItemUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub owner: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deadline: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<Priority>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<ItemStatus>,
}

/// Reply body of the external-tool export.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportMessage {
    pub message: String,
}

/// History ordering understood by GET /transcripts/sort.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SortKey {
    #[default]
    DateNewest,
    DateOldest,
    TitleAsc,
    TitleDesc,
}

impl SortKey {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortKey::DateNewest => "date-newest",
            SortKey::DateOldest => "date-oldest",
            SortKey::TitleAsc => "title-asc",
            SortKey::TitleDesc => "title-desc",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "date-newest" | "newest" | "date" => Some(SortKey::DateNewest),
            "date-oldest" | "oldest" => Some(SortKey::DateOldest),
            "title-asc" | "title" => Some(SortKey::TitleAsc),
            "title-desc" => Some(SortKey::TitleDesc),
            _ => None,
        }
    }
}

/// Inclusive date window for GET /transcripts/filter/date-range (YYYY-MM-DD).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DateRange {
    pub from: String,
    pub to: String,
}

impl DateRange {
    pub fn new(from: &str, to: &str) -> Result<Self, ValidationError> {
        let from_date = parse_day(from)?;
        let to_date = parse_day(to)?;
        if from_date > to_date {
            return Err(ValidationError::InvertedRange {
                from: from.to_string(),
                to: to.to_string(),
            });
        }
        Ok(DateRange {
            from: from.trim().to_string(),
            to: to.trim().to_string(),
        })
    }
}

fn parse_day(s: &str) -> Result<NaiveDate, ValidationError> {
    NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
        .map_err(|_| ValidationError::InvalidDate(s.to_string()))
}

/// Input rejected before any request is dispatched.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Please enter a meeting title")]
    EmptyTitle,
    #[error("Please enter or upload a transcript")]
    EmptyContent,
    #[error("Invalid date \"{0}\" (expected YYYY-MM-DD)")]
    InvalidDate(String),
    #[error("Date range start {from} is after end {to}")]
    InvertedRange { from: String, to: String },
}

/// Reject blank title/content the way the submission form does.
pub fn validate_submission(title: &str, content: &str) -> Result<(), ValidationError> {
    if title.trim().is_empty() {
        return Err(ValidationError::EmptyTitle);
    }
    if content.trim().is_empty() {
        return Err(ValidationError::EmptyContent);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transcript_decodes_camel_case_with_optional_analysis() {
        let json = r#"{
            "id": "T1",
            "title": "Standup",
            "content": "Alice: hi",
            "createdAt": "2024-05-01T10:00:00",
            "keyPoints": ["K1"],
            "actionItems": [{
                "id": "A1",
                "description": "Ship it",
                "priority": "high",
                "status": "in-progress",
                "createdAt": "2024-05-01T10:00:00"
            }]
        }"#;
        let t: Transcript = serde_json::from_str(json).unwrap();
        assert_eq!(t.summary, None);
        assert_eq!(t.status_label(), "Pending");
        let items = t.action_items.unwrap();
        assert_eq!(items[0].status, ItemStatus::InProgress);
        assert_eq!(items[0].priority, Priority::High);
        assert_eq!(items[0].owner, None);
    }

    #[test]
    fn unknown_priority_is_a_decode_error() {
        let json = r#"{"id":"A1","description":"x","priority":"urgent","status":"pending","createdAt":"d"}"#;
        assert!(serde_json::from_str::<ActionItem>(json).is_err());
    }

    #[test]
    fn analysis_result_omits_absent_optionals() {
        let result = AnalysisResult {
            summary: "S".into(),
            key_points: vec!["K1".into()],
            action_items: vec![],
            duration: None,
            participant_count: Some(3),
        };
        let value = serde_json::to_value(&result).unwrap();
        assert_eq!(value["keyPoints"][0], "K1");
        assert_eq!(value["participantCount"], 3);
        assert!(value.get("duration").is_none());
    }

    #[test]
    fn update_sends_only_set_fields() {
        let update = TranscriptUpdate {
            title: Some("Renamed".into()),
            ..Default::default()
        };
        assert_eq!(
            serde_json::to_string(&update).unwrap(),
            r#"{"title":"Renamed"}"#
        );
        assert!(TranscriptUpdate::default().is_empty());
    }

    #[test]
    fn sort_key_round_trips_wire_names() {
        for key in [
            SortKey::DateNewest,
            SortKey::DateOldest,
            SortKey::TitleAsc,
            SortKey::TitleDesc,
        ] {
            assert_eq!(SortKey::parse(key.as_str()), Some(key));
        }
        assert_eq!(SortKey::parse("size"), None);
        assert_eq!(SortKey::default(), SortKey::DateNewest);
    }

    #[test]
    fn date_range_rejects_bad_input() {
        assert!(DateRange::new("2024-01-01", "2024-01-31").is_ok());
        assert_eq!(
            DateRange::new("2024-13-01", "2024-01-31"),
            Err(ValidationError::InvalidDate("2024-13-01".into()))
        );
        assert!(matches!(
            DateRange::new("2024-02-01", "2024-01-01"),
            Err(ValidationError::InvertedRange { .. })
        ));
    }

    #[test]
    fn blank_submission_is_rejected() {
        assert_eq!(validate_submission("  ", "body"), Err(ValidationError::EmptyTitle));
        assert_eq!(validate_submission("t", "\n"), Err(ValidationError::EmptyContent));
        assert!(validate_submission("t", "body").is_ok());
    }

    #[test]
    fn analysis_from_unanalyzed_transcript_is_none() {
        let t = Transcript {
            id: "T1".into(),
            title: "t".into(),
            content: "c".into(),
            created_at: "d".into(),
            updated_at: None,
            summary: Some(String::new()),
            key_points: None,
            action_items: None,
        };
        assert!(AnalysisResult::from_transcript(&t).is_none());
    }
}
