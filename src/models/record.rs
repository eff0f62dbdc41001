use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::error::Error;

/// Lifecycle position of a record: `pending` while queued, then one terminal state.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum RecordStatus {
    #[default]
    Pending,
    Problem,
    Deleted,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Label {
    Problem,
    Solution,
    NotRelated,
}

impl Label {
    pub fn as_str(&self) -> &'static str {
        match self {
            Label::Problem => "problem",
            Label::Solution => "solution",
            Label::NotRelated => "not_related",
        }
    }

    /// Terminal queue state for a record carrying this label.
    pub fn disposition(&self) -> RecordStatus {
        match self {
            Label::Problem => RecordStatus::Problem,
            Label::Solution | Label::NotRelated => RecordStatus::Deleted,
        }
    }
}

impl std::fmt::Display for Label {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Label {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "problem" => Ok(Label::Problem),
            "solution" => Ok(Label::Solution),
            "not_related" => Ok(Label::NotRelated),
            other => Err(Error::InvalidLabel(other.to_string())),
        }
    }
}

fn default_sector() -> String {
    "Business".to_string()
}

fn default_author() -> String {
    "unknown".to_string()
}

/// One ingested comment as handed over by a source connector.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RawRecord {
    pub id: String,
    #[serde(default)]
    pub text: String,
    #[serde(default = "default_sector")]
    pub sector_hint: String,
    #[serde(default = "default_author")]
    pub author: String,
    #[serde(default)]
    pub score: i64,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub source_url: String,
    #[serde(default)]
    pub status: RecordStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subreddit: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub post_title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub platform: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ingested_at: Option<DateTime<Utc>>,
}

impl RawRecord {
    pub fn new(id: impl Into<String>, text: impl Into<String>, created_at: DateTime<Utc>) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
            sector_hint: default_sector(),
            author: default_author(),
            score: 0,
            created_at,
            source_url: String::new(),
            status: RecordStatus::Pending,
            subreddit: None,
            post_title: None,
            platform: None,
            ingested_at: None,
        }
    }
}

/// A raw record after its single classification pass.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ClassifiedRecord {
    #[serde(flatten)]
    pub record: RawRecord,
    pub label: Label,
    pub confidence: f32,
    pub reason: String,
    pub issue_title: String,
    pub issue_key: String,
    #[serde(default)]
    pub roles: Vec<String>,
    pub classified_at: DateTime<Utc>,
}

impl ClassifiedRecord {
    pub fn id(&self) -> &str {
        &self.record.id
    }
}

/// One classification decision, kept independently of where the record ended up.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AuditEntry {
    pub id: String,
    pub label: Label,
    pub issue_key: String,
    pub issue_title: String,
    pub confidence: f32,
    pub at: DateTime<Utc>,
}

impl From<&ClassifiedRecord> for AuditEntry {
    fn from(classified: &ClassifiedRecord) -> Self {
        Self {
            id: classified.record.id.clone(),
            label: classified.label,
            issue_key: classified.issue_key.clone(),
            issue_title: classified.issue_title.clone(),
            confidence: classified.confidence,
            at: classified.classified_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_label_parse_rejects_unknown() {
        assert_eq!(" Problem ".parse::<Label>().unwrap(), Label::Problem);
        assert_eq!("not_related".parse::<Label>().unwrap(), Label::NotRelated);
        assert!(matches!("maybe".parse::<Label>(), Err(Error::InvalidLabel(_))));
    }

    #[test]
    fn test_raw_record_defaults() {
        let json = r#"{"id": "c1", "text": "hello", "createdAt": "2024-05-01T12:00:00Z"}"#;
        let record: RawRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.sector_hint, "Business");
        assert_eq!(record.author, "unknown");
        assert_eq!(record.status, RecordStatus::Pending);
        assert!(record.subreddit.is_none());
    }

    #[test]
    fn test_classified_record_flattens_raw_fields() {
        let raw = RawRecord::new("c9", "late invoices", Utc::now());
        let classified = ClassifiedRecord {
            record: raw,
            label: Label::NotRelated,
            confidence: 0.62,
            reason: "none".to_string(),
            issue_title: "Late Invoices".to_string(),
            issue_key: "late-invoices".to_string(),
            roles: Vec::new(),
            classified_at: Utc::now(),
        };
        let value = serde_json::to_value(&classified).unwrap();
        assert_eq!(value["id"], "c9");
        assert_eq!(value["label"], "not_related");
        assert_eq!(value["issueKey"], "late-invoices");
        let back: ClassifiedRecord = serde_json::from_value(value).unwrap();
        assert_eq!(back.id(), "c9");
    }
}
