use serde::{Deserialize, Serialize};

use super::record::Label;

/// Outcome of classifying a single text.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Classification {
    pub label: Label,
    pub confidence: f32,
    pub reason: String,
    pub issue_title: String,
    pub roles: Vec<String>,
}

/// A validated answer from the remote oracle. Title may be absent; the classifier fills it in.
#[derive(Debug, Clone, PartialEq)]
pub struct OracleVerdict {
    pub label: Label,
    pub confidence: f32,
    pub reason: String,
    pub issue_title: Option<String>,
    pub roles: Vec<String>,
}
