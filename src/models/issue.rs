use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum IssueStatus {
    Published,
    Candidate,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum DemandTier {
    Low,
    Medium,
    High,
}

impl DemandTier {
    pub fn from_count(count: usize) -> Self {
        match count {
            c if c >= 30 => DemandTier::High,
            c if c >= 12 => DemandTier::Medium,
            _ => DemandTier::Low,
        }
    }
}

impl std::fmt::Display for DemandTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DemandTier::Low => write!(f, "low"),
            DemandTier::Medium => write!(f, "medium"),
            DemandTier::High => write!(f, "high"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ComplaintSample {
    pub text: String,
    pub subreddit: Option<String>,
    pub author: String,
    pub score: i64,
    pub created_at: DateTime<Utc>,
    pub post_title: Option<String>,
    pub source_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SolutionEntry {
    pub title: String,
    pub summary: String,
    pub roles: Vec<String>,
    pub author: String,
    pub subreddit: Option<String>,
    pub score: i64,
    pub source_url: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Issue {
    pub id: String,
    pub title: String,
    pub sector: String,
    pub summary: String,
    pub complaint_count: usize,
    pub interest_score: u64,
    pub demand_tier: DemandTier,
    pub source_subreddits: Vec<String>,
    pub status: IssueStatus,
    pub fresh: bool,
    pub team_count: usize,
    pub complaints: Vec<ComplaintSample>,
    pub solutions: Vec<SolutionEntry>,
}

/// Rebuilt issue catalog: the published tier plus lower-confidence candidates.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Catalog {
    pub published: Vec<Issue>,
    pub candidates: Vec<Issue>,
}

impl Catalog {
    pub fn is_empty(&self) -> bool {
        self.published.is_empty() && self.candidates.is_empty()
    }

    pub fn len(&self) -> usize {
        self.published.len() + self.candidates.len()
    }

    pub fn issues(&self) -> impl Iterator<Item = &Issue> {
        self.published.iter().chain(self.candidates.iter())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_demand_tier_boundaries() {
        assert_eq!(DemandTier::from_count(0), DemandTier::Low);
        assert_eq!(DemandTier::from_count(11), DemandTier::Low);
        assert_eq!(DemandTier::from_count(12), DemandTier::Medium);
        assert_eq!(DemandTier::from_count(29), DemandTier::Medium);
        assert_eq!(DemandTier::from_count(30), DemandTier::High);
    }

    #[test]
    fn test_issue_status_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&IssueStatus::Candidate).unwrap(), "\"candidate\"");
        assert_eq!(serde_json::to_string(&DemandTier::High).unwrap(), "\"high\"");
    }
}
