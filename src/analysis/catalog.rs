use std::collections::{BTreeSet, HashSet};

use chrono::{DateTime, Duration, Utc};

use crate::analysis::assigner::{attach_solutions, centroid};
use crate::analysis::classifier::derive_issue_title;
use crate::analysis::clusterer::cluster_texts;
use crate::analysis::normalizer::{slugify, title_case};
use crate::analysis::vectorizer::{SparseVector, TfidfVectorizer, VectorizerOptions};
use crate::config::CurationConfig;
use crate::models::{
    Catalog, ClassifiedRecord, ComplaintSample, DemandTier, Issue, IssueStatus, Label,
};
use crate::taxonomy::stopwords::is_generic_title_word;

/// Authors whose posts never count as complaints.
pub const BOT_AUTHORS: &[&str] = &["automoderator", "moderator"];
pub const MAX_COMPLAINT_SAMPLES: usize = 220;
pub const ISSUE_ID_PREFIX: &str = "reddit-issue-";

const MAX_TITLE_WORDS: usize = 6;
const TITLE_FALLBACK_TEXTS: usize = 5;
const SUMMARY_TERMS: usize = 3;
const FRESH_WINDOW_DAYS: i64 = 7;

pub fn is_bot_author(author: &str) -> bool {
    let author = author.to_lowercase();
    BOT_AUTHORS.contains(&author.as_str())
}

/// `max(10, floor(count * 8 + positive score sum * 0.12))`
pub fn interest_score(complaint_count: usize, positive_score_sum: i64) -> u64 {
    let raw = complaint_count as f64 * 8.0 + positive_score_sum as f64 * 0.12;
    raw.floor().max(10.0) as u64
}

/// True when enough complaints landed within a week of `newest`.
pub fn is_fresh(created: &[DateTime<Utc>], newest: DateTime<Utc>) -> bool {
    let cutoff = newest - Duration::days(FRESH_WINDOW_DAYS);
    let recent = created.iter().filter(|at| **at >= cutoff).count();
    recent >= (created.len() / 5).max(2)
}

/// Turns the problems log into the published/candidate issue catalog.
pub struct IssueCatalogBuilder {
    config: CurationConfig,
}

impl IssueCatalogBuilder {
    pub fn new(config: CurationConfig) -> Self {
        Self { config }
    }

    /// Build the catalog. `deleted` is only consulted when solutions are surfaced.
    pub fn build(&self, problems: &[ClassifiedRecord], deleted: &[ClassifiedRecord]) -> Catalog {
        // 1. Drop bot and moderator posts
        let problems: Vec<&ClassifiedRecord> = problems
            .iter()
            .filter(|p| !is_bot_author(&p.record.author))
            .collect();

        let Some(newest) = problems.iter().map(|p| p.record.created_at).max() else {
            return Catalog::default();
        };

        // 2. Cluster all complaints
        let texts: Vec<&str> = problems.iter().map(|p| p.record.text.as_str()).collect();
        let clusters = cluster_texts(&texts, self.config.cluster_threshold);

        // 3. Keep clusters large enough for a tier
        let retained: Vec<&Vec<usize>> = clusters
            .partition
            .iter()
            .filter(|members| members.len() >= self.config.candidate_threshold)
            .collect();

        tracing::debug!(
            "{} problems formed {} clusters, {} retained",
            problems.len(),
            clusters.partition.len(),
            retained.len()
        );

        let mut issues: Vec<Issue> = retained
            .iter()
            .map(|members| {
                let items: Vec<&ClassifiedRecord> = members.iter().map(|&i| problems[i]).collect();
                self.build_issue(items, newest)
            })
            .collect();

        // 4. Optionally surface solution records
        if self.config.surface_solutions {
            if let Some(vectorizer) = &clusters.vectorizer {
                let solutions: Vec<&ClassifiedRecord> = deleted
                    .iter()
                    .filter(|r| r.label == Label::Solution)
                    .collect();
                let centroids: Vec<SparseVector> = retained
                    .iter()
                    .map(|members| {
                        let rows: Vec<&SparseVector> =
                            members.iter().map(|&i| &clusters.vectors[i]).collect();
                        centroid(&rows)
                    })
                    .collect();
                attach_solutions(
                    &mut issues,
                    &centroids,
                    vectorizer,
                    &solutions,
                    self.config.assignment_threshold,
                );
            }
        }

        // 5. Rank, cap and split into tiers
        issues.sort_by(|a, b| {
            b.complaint_count
                .cmp(&a.complaint_count)
                .then(b.interest_score.cmp(&a.interest_score))
        });
        issues.truncate(self.config.max_issues);
        disambiguate_ids(&mut issues);

        let (published, candidates): (Vec<Issue>, Vec<Issue>) = issues
            .into_iter()
            .partition(|issue| issue.status == IssueStatus::Published);

        Catalog {
            published,
            candidates,
        }
    }

    fn build_issue(&self, mut items: Vec<&ClassifiedRecord>, newest: DateTime<Utc>) -> Issue {
        items.sort_by(|a, b| {
            b.record
                .score
                .cmp(&a.record.score)
                .then(b.record.created_at.cmp(&a.record.created_at))
        });

        let texts: Vec<&str> = items.iter().map(|r| r.record.text.as_str()).collect();
        let title = cluster_title(&texts);
        let subreddits: Vec<String> = items
            .iter()
            .filter_map(|r| r.record.subreddit.clone())
            .filter(|s| !s.is_empty())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();

        let complaint_count = items.len();
        let positive_scores: i64 = items.iter().map(|r| r.record.score.max(0)).sum();
        let created: Vec<DateTime<Utc>> = items.iter().map(|r| r.record.created_at).collect();

        let status = if complaint_count >= self.config.publish_threshold {
            IssueStatus::Published
        } else {
            IssueStatus::Candidate
        };

        Issue {
            id: format!("{}{}", ISSUE_ID_PREFIX, slugify(&title)),
            sector: majority_sector(&items),
            summary: cluster_summary(&texts, complaint_count, subreddits.len()),
            title,
            complaint_count,
            interest_score: interest_score(complaint_count, positive_scores),
            demand_tier: DemandTier::from_count(complaint_count),
            source_subreddits: subreddits,
            status,
            fresh: is_fresh(&created, newest),
            team_count: 0,
            complaints: items
                .iter()
                .take(MAX_COMPLAINT_SAMPLES)
                .map(|r| ComplaintSample {
                    text: r.record.text.clone(),
                    subreddit: r.record.subreddit.clone(),
                    author: r.record.author.clone(),
                    score: r.record.score,
                    created_at: r.record.created_at,
                    post_title: r.record.post_title.clone(),
                    source_url: r.record.source_url.clone(),
                })
                .collect(),
            solutions: Vec::new(),
        }
    }
}

/// Highest-weighted phrase without generic words, else a heuristic title over the leading texts.
fn cluster_title(texts: &[&str]) -> String {
    let mut vectorizer = TfidfVectorizer::new(VectorizerOptions::phrases());
    if let Ok(rows) = vectorizer.fit_transform(texts) {
        let phrase = vectorizer
            .ranked_terms(&rows)
            .into_iter()
            .map(|(term, _)| term)
            .find(|term| !term.split_whitespace().any(is_generic_title_word));
        if let Some(phrase) = phrase {
            let words: Vec<&str> = phrase.split_whitespace().take(MAX_TITLE_WORDS).collect();
            return title_case(&words.join(" "));
        }
    }

    let leading: Vec<&str> = texts.iter().take(TITLE_FALLBACK_TEXTS).copied().collect();
    derive_issue_title(&leading.join(" "))
}

fn cluster_summary(texts: &[&str], complaint_count: usize, subreddit_count: usize) -> String {
    let mut vectorizer = TfidfVectorizer::new(VectorizerOptions::keywords());
    if let Ok(rows) = vectorizer.fit_transform(texts) {
        let top: Vec<String> = vectorizer
            .ranked_terms(&rows)
            .into_iter()
            .take(SUMMARY_TERMS)
            .map(|(term, _)| term)
            .collect();
        if !top.is_empty() {
            return format!(
                "Recurring complaints mention {}. Evidence: {} comments across {} subreddits.",
                top.join(", "),
                complaint_count,
                subreddit_count
            );
        }
    }

    format!(
        "Recurring complaints detected from {} comments across {} subreddits.",
        complaint_count, subreddit_count
    )
}

/// Most common sector hint; the first one seen wins ties.
fn majority_sector(items: &[&ClassifiedRecord]) -> String {
    let mut tally: Vec<(&str, usize)> = Vec::new();
    for item in items {
        let sector = item.record.sector_hint.as_str();
        match tally.iter_mut().find(|(name, _)| *name == sector) {
            Some((_, count)) => *count += 1,
            None => tally.push((sector, 1)),
        }
    }

    let mut best: Option<(&str, usize)> = None;
    for (sector, count) in tally {
        if best.map_or(true, |(_, top)| count > top) {
            best = Some((sector, count));
        }
    }
    best.map(|(sector, _)| sector.to_string())
        .unwrap_or_else(|| "Business".to_string())
}

/// Suffix repeated ids with `-2`, `-3`, ... in ranking order.
fn disambiguate_ids(issues: &mut [Issue]) {
    let mut used: HashSet<String> = HashSet::new();
    for issue in issues.iter_mut() {
        if used.insert(issue.id.clone()) {
            continue;
        }
        let mut n = 2;
        loop {
            let candidate = format!("{}-{}", issue.id, n);
            if used.insert(candidate.clone()) {
                issue.id = candidate;
                break;
            }
            n += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::RawRecord;
    use chrono::TimeZone;

    fn base_time() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap()
    }

    fn problem(id: &str, text: &str, sector: &str, score: i64, days_ago: i64) -> ClassifiedRecord {
        let mut record = RawRecord::new(id, text, base_time() - Duration::days(days_ago));
        record.sector_hint = sector.to_string();
        record.score = score;
        let subreddit = if score % 2 == 0 { "smallbusiness" } else { "accounting" };
        record.subreddit = Some(subreddit.to_string());
        ClassifiedRecord {
            record,
            label: Label::Problem,
            confidence: 0.7,
            reason: "complaint".to_string(),
            issue_title: "Invoice Approvals".to_string(),
            issue_key: "invoice-approvals".to_string(),
            roles: Vec::new(),
            classified_at: base_time(),
        }
    }

    fn problems_log() -> Vec<ClassifiedRecord> {
        let mut log = vec![
            problem("a1", "invoice approvals stall at month end", "FinTech", 4, 0),
            problem("a2", "invoice approvals stall again for our finance team", "FinTech", 2, 1),
            problem("a3", "month end invoice approvals stall constantly", "Business", 7, 2),
            problem("a4", "our invoice approvals stall when managers travel", "Business", 1, 20),
            problem("a5", "invoice approvals stall and vendors get angry", "FinTech", 0, 30),
            problem("b1", "warehouse scanners crash during inventory counts", "Logistics", 3, 3),
            problem("b2", "warehouse scanners crash after the firmware update", "Logistics", 5, 4),
            problem("b3", "warehouse scanners crash on cold mornings", "Logistics", 2, 5),
            problem("c1", "payroll exports break in the new format", "HR", 1, 1),
            problem("c2", "payroll exports break for contractors", "HR", 1, 2),
        ];
        let mut bot = problem("m1", "invoice approvals stall reminder from the mods", "FinTech", 1, 0);
        bot.record.author = "AutoModerator".to_string();
        log.push(bot);
        log
    }

    fn builder() -> IssueCatalogBuilder {
        IssueCatalogBuilder::new(CurationConfig {
            publish_threshold: 5,
            candidate_threshold: 3,
            show_progress: false,
            ..Default::default()
        })
    }

    #[test]
    fn test_interest_score_floor_and_minimum() {
        assert_eq!(interest_score(1, 0), 10);
        assert_eq!(interest_score(4, 0), 32);
        assert_eq!(interest_score(3, 100), 36);
    }

    #[test]
    fn test_freshness_window() {
        let newest = base_time();
        let recent = vec![newest, newest - Duration::days(3), newest - Duration::days(30)];
        assert!(is_fresh(&recent, newest));

        let stale = vec![newest, newest - Duration::days(8), newest - Duration::days(30)];
        assert!(!is_fresh(&stale, newest));

        // 15 complaints need floor(15 * 0.2) = 3 recent ones
        let mut many = vec![newest - Duration::days(40); 13];
        many.extend([newest, newest - Duration::days(6)]);
        assert!(!is_fresh(&many, newest));
    }

    #[test]
    fn test_bot_authors_are_case_insensitive() {
        assert!(is_bot_author("AutoModerator"));
        assert!(is_bot_author("moderator"));
        assert!(!is_bot_author("mod_helper"));
    }

    #[test]
    fn test_empty_log_builds_empty_catalog() {
        let catalog = builder().build(&[], &[]);
        assert!(catalog.is_empty());
    }

    #[test]
    fn test_tiers_follow_cluster_size() {
        let catalog = builder().build(&problems_log(), &[]);

        assert_eq!(catalog.published.len(), 1);
        assert_eq!(catalog.candidates.len(), 1);

        let published = &catalog.published[0];
        assert_eq!(published.complaint_count, 5);
        assert_eq!(published.complaints.len(), 5);
        assert_eq!(published.status, IssueStatus::Published);
        assert_eq!(published.sector, "FinTech");
        assert_eq!(published.demand_tier, DemandTier::Low);
        assert_eq!(published.interest_score, interest_score(5, 14));
        assert_eq!(published.source_subreddits, vec!["accounting", "smallbusiness"]);
        assert!(published.fresh);
        assert!(published.id.starts_with(ISSUE_ID_PREFIX));
        assert!(published.summary.starts_with("Recurring complaints mention"));
        assert!(published.summary.ends_with("Evidence: 5 comments across 2 subreddits."));
        assert_eq!(published.complaints[0].score, 7);

        let candidate = &catalog.candidates[0];
        assert_eq!(candidate.complaint_count, 3);
        assert_eq!(candidate.status, IssueStatus::Candidate);
        assert_eq!(candidate.sector, "Logistics");

        for issue in catalog.issues() {
            assert!(issue.solutions.is_empty());
            assert_eq!(issue.team_count, 0);
        }
    }

    #[test]
    fn test_max_issues_caps_catalog() {
        let builder = IssueCatalogBuilder::new(CurationConfig {
            max_issues: 1,
            ..CurationConfig::default()
        });
        let catalog = builder.build(&problems_log(), &[]);
        assert_eq!(catalog.len(), 1);
        assert_eq!(catalog.published[0].complaint_count, 5);
    }

    #[test]
    fn test_solutions_only_surface_when_enabled() {
        let mut solution = problem("s1", "automate invoice approvals with a simple rule", "FinTech", 9, 0);
        solution.label = Label::Solution;
        let deleted = vec![solution];

        let hidden = builder().build(&problems_log(), &deleted);
        assert!(hidden.published[0].solutions.is_empty());

        let surfacing = IssueCatalogBuilder::new(CurationConfig {
            surface_solutions: true,
            ..CurationConfig::default()
        });
        let shown = surfacing.build(&problems_log(), &deleted);
        assert_eq!(shown.published[0].solutions.len(), 1);
        assert_eq!(shown.published[0].team_count, 1);
        assert!(shown.candidates[0].solutions.is_empty());
    }

    #[test]
    fn test_majority_sector_first_seen_wins_ties() {
        let a = problem("x1", "text", "SaaS", 0, 0);
        let b = problem("x2", "text", "FinTech", 0, 0);
        let c = problem("x3", "text", "FinTech", 0, 0);
        assert_eq!(majority_sector(&[&a, &b]), "SaaS");
        assert_eq!(majority_sector(&[&a, &b, &c]), "FinTech");
    }

    #[test]
    fn test_duplicate_ids_get_suffixes() {
        let mut issues = builder().build(&problems_log(), &[]).published;
        issues.push(issues[0].clone());
        issues.push(issues[0].clone());
        disambiguate_ids(&mut issues);
        let base = issues[0].id.clone();
        assert_eq!(issues[1].id, format!("{}-2", base));
        assert_eq!(issues[2].id, format!("{}-3", base));
    }

    #[test]
    fn test_title_falls_back_to_heuristic() {
        assert_eq!(cluster_title(&["Shipping!"]), "Shipping Workflow Issues");
    }

    #[test]
    fn test_rebuild_is_deterministic() {
        let log = problems_log();
        assert_eq!(builder().build(&log, &[]), builder().build(&log, &[]));
    }
}
