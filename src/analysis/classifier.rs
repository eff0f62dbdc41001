use std::collections::HashMap;
use std::sync::Arc;

use regex::Regex;
use std::sync::LazyLock;

use crate::analysis::normalizer::title_case;
use crate::llm::{ClassificationRequest, OracleProvider};
use crate::models::{Classification, Label};
use crate::taxonomy::stopwords::is_title_stopword;
use crate::taxonomy::{detect_roles, Lexicon};

pub const DEFAULT_ISSUE_TITLE: &str = "Operational Friction";

const CONFIDENCE_CAP: f32 = 0.95;

static RE_TITLE_TOKEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[a-zA-Z]{3,}").expect("valid title token regex"));

/// Title from the three most frequent non-stopword tokens; first occurrence breaks ties.
pub fn derive_issue_title(text: &str) -> String {
    let lower = text.to_lowercase();
    let mut counts: HashMap<&str, (usize, usize)> = HashMap::new();

    for (position, token) in RE_TITLE_TOKEN
        .find_iter(&lower)
        .map(|m| m.as_str())
        .filter(|t| !is_title_stopword(t))
        .enumerate()
    {
        counts.entry(token).or_insert((0, position)).0 += 1;
    }

    if counts.is_empty() {
        return DEFAULT_ISSUE_TITLE.to_string();
    }

    let mut ranked: Vec<(&str, usize, usize)> = counts
        .into_iter()
        .map(|(token, (count, first))| (token, count, first))
        .collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then(a.2.cmp(&b.2)));

    let words: Vec<&str> = ranked.iter().take(3).map(|(token, _, _)| *token).collect();
    if words.len() == 1 {
        return format!("{} Workflow Issues", title_case(words[0]));
    }
    title_case(&words.join(" "))
}

/// Deterministic lexicon-based classifier; always available.
pub struct HeuristicClassifier {
    lexicon: Lexicon,
}

impl HeuristicClassifier {
    pub fn new() -> Self {
        Self {
            lexicon: Lexicon::new(),
        }
    }

    pub fn classify(&self, text: &str, sector_hint: &str) -> Classification {
        let issue_title = derive_issue_title(text);

        if self.lexicon.is_boilerplate(text) {
            return Classification {
                label: Label::NotRelated,
                confidence: CONFIDENCE_CAP,
                reason: "Detected moderation/bot boilerplate.".to_string(),
                issue_title,
                roles: Vec::new(),
            };
        }

        let business = self.lexicon.business_hits(text);
        let complaint = self.lexicon.complaint_hits(text);
        let solution = self.lexicon.solution_hits(text);

        // Solutions must lead complaints by a full hit; ties go to the problem branch.
        if solution > 0 && solution >= complaint + 1 {
            return Classification {
                label: Label::Solution,
                confidence: (0.55 + solution as f32 * 0.08).min(CONFIDENCE_CAP),
                reason: "Contains explicit solution/proposal language.".to_string(),
                issue_title,
                roles: detect_roles(text, sector_hint),
            };
        }

        if complaint > 0 {
            return Classification {
                label: Label::Problem,
                confidence: (0.5 + complaint as f32 * 0.1).min(CONFIDENCE_CAP),
                reason: "Contains recurring pain/complaint signals.".to_string(),
                issue_title,
                roles: Vec::new(),
            };
        }

        if solution > 0 {
            return Classification {
                label: Label::Solution,
                confidence: 0.6,
                reason: "Contains solution language with business context.".to_string(),
                issue_title,
                roles: detect_roles(text, sector_hint),
            };
        }

        if business > 1 && text.split_whitespace().count() > 14 {
            return Classification {
                label: Label::Problem,
                confidence: 0.52,
                reason: "Likely friction discussion with weak explicit markers.".to_string(),
                issue_title,
                roles: Vec::new(),
            };
        }

        Classification {
            label: Label::NotRelated,
            confidence: 0.62,
            reason: "No clear problem/solution pattern detected.".to_string(),
            issue_title,
            roles: Vec::new(),
        }
    }
}

impl Default for HeuristicClassifier {
    fn default() -> Self {
        Self::new()
    }
}

/// Heuristic classifier with an optional oracle consulted first.
pub struct Classifier {
    heuristic: HeuristicClassifier,
    oracle: Option<Arc<dyn OracleProvider>>,
}

impl Classifier {
    pub fn heuristic_only() -> Self {
        Self {
            heuristic: HeuristicClassifier::new(),
            oracle: None,
        }
    }

    pub fn with_oracle(oracle: Arc<dyn OracleProvider>) -> Self {
        Self {
            heuristic: HeuristicClassifier::new(),
            oracle: Some(oracle),
        }
    }

    pub fn has_oracle(&self) -> bool {
        self.oracle.is_some()
    }

    pub async fn classify(&self, text: &str, sector_hint: &str) -> Classification {
        if let Some(oracle) = &self.oracle {
            let request = ClassificationRequest::new(text, sector_hint);
            if let Some(verdict) = oracle.try_classify(&request).await {
                let mut roles = verdict.roles;
                if verdict.label == Label::Solution && roles.is_empty() {
                    roles = detect_roles(text, sector_hint);
                }
                return Classification {
                    label: verdict.label,
                    confidence: verdict.confidence,
                    reason: verdict.reason,
                    issue_title: verdict
                        .issue_title
                        .unwrap_or_else(|| derive_issue_title(text)),
                    roles,
                };
            }
        }

        self.heuristic.classify(text, sector_hint)
    }
}
