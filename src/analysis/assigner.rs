use std::collections::{BTreeMap, HashSet};

use crate::analysis::normalizer::normalize;
use crate::analysis::vectorizer::{SparseVector, TfidfVectorizer};
use crate::models::{ClassifiedRecord, Issue, SolutionEntry};
use crate::taxonomy::detect_roles;

pub const MAX_SOLUTIONS_PER_ISSUE: usize = 80;
pub const SOLUTION_TITLE: &str = "Proposed Approach";

/// Element-wise mean of the member vectors.
pub fn centroid(members: &[&SparseVector]) -> SparseVector {
    if members.is_empty() {
        return SparseVector::default();
    }

    let mut sums: BTreeMap<usize, f64> = BTreeMap::new();
    for member in members {
        for &(index, value) in member.entries() {
            *sums.entry(index).or_insert(0.0) += value;
        }
    }

    let n = members.len() as f64;
    SparseVector::from_pairs(sums.into_iter().map(|(index, sum)| (index, sum / n)))
}

/// Nearest centroid for every solution vector, or `None` when the best similarity is below `threshold`.
///
/// Ties resolve to the lowest centroid index.
pub fn assign(
    centroids: &[SparseVector],
    solutions: &[SparseVector],
    threshold: f64,
) -> Vec<Option<usize>> {
    solutions
        .iter()
        .map(|solution| {
            let mut best: Option<(usize, f64)> = None;
            for (index, centroid) in centroids.iter().enumerate() {
                let similarity = solution.cosine(centroid);
                if best.map_or(true, |(_, score)| similarity > score) {
                    best = Some((index, similarity));
                }
            }
            best.filter(|&(_, score)| score >= threshold)
                .map(|(index, _)| index)
        })
        .collect()
}

/// Attach solution records to `issues`, where `centroids[i]` belongs to `issues[i]`.
///
/// Every issue's solution list is replaced, including issues that receive none.
pub fn attach_solutions(
    issues: &mut [Issue],
    centroids: &[SparseVector],
    vectorizer: &TfidfVectorizer,
    solutions: &[&ClassifiedRecord],
    threshold: f64,
) {
    let texts: Vec<&str> = solutions.iter().map(|s| s.record.text.as_str()).collect();
    let vectors = vectorizer.transform(&texts);
    let assignments = assign(centroids, &vectors, threshold);

    let mut grouped: Vec<Vec<&ClassifiedRecord>> = vec![Vec::new(); issues.len()];
    for (&solution, target) in solutions.iter().zip(assignments) {
        if let Some(slot) = target.and_then(|i| grouped.get_mut(i)) {
            slot.push(solution);
        }
    }

    for (issue, mut candidates) in issues.iter_mut().zip(grouped) {
        candidates.sort_by(|a, b| {
            b.record
                .score
                .cmp(&a.record.score)
                .then(b.record.created_at.cmp(&a.record.created_at))
        });

        let mut seen: HashSet<(String, String)> = HashSet::new();
        let mut entries = Vec::new();
        for candidate in candidates {
            let summary = normalize(&candidate.record.text);
            let key = (candidate.record.author.clone(), summary.to_lowercase());
            if !seen.insert(key) {
                continue;
            }
            entries.push(SolutionEntry {
                title: SOLUTION_TITLE.to_string(),
                roles: detect_roles(&candidate.record.text, &issue.sector),
                summary,
                author: candidate.record.author.clone(),
                subreddit: candidate.record.subreddit.clone(),
                score: candidate.record.score,
                source_url: candidate.record.source_url.clone(),
                created_at: candidate.record.created_at,
            });
            if entries.len() >= MAX_SOLUTIONS_PER_ISSUE {
                break;
            }
        }

        let authors: HashSet<&str> = entries
            .iter()
            .map(|entry| entry.author.as_str())
            .filter(|author| !author.is_empty())
            .collect();
        issue.team_count = authors.len();
        issue.solutions = entries;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::vectorizer::VectorizerOptions;
    use crate::models::{DemandTier, IssueStatus, Label, RawRecord};
    use chrono::{Duration, TimeZone, Utc};

    fn issue(sector: &str) -> Issue {
        Issue {
            id: "reddit-issue-late-invoices".to_string(),
            title: "Late Invoices".to_string(),
            sector: sector.to_string(),
            summary: String::new(),
            complaint_count: 5,
            interest_score: 40,
            demand_tier: DemandTier::Low,
            source_subreddits: Vec::new(),
            status: IssueStatus::Published,
            fresh: false,
            team_count: 0,
            complaints: Vec::new(),
            solutions: Vec::new(),
        }
    }

    fn solution(id: &str, author: &str, text: &str, score: i64, minutes: i64) -> ClassifiedRecord {
        let base = Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap();
        let mut record = RawRecord::new(id, text, base + Duration::minutes(minutes));
        record.author = author.to_string();
        record.score = score;
        ClassifiedRecord {
            record,
            label: Label::Solution,
            confidence: 0.79,
            reason: "proposal".to_string(),
            issue_title: "Invoice Reminders".to_string(),
            issue_key: "invoice-reminders".to_string(),
            roles: Vec::new(),
            classified_at: base,
        }
    }

    #[test]
    fn test_centroid_is_mean() {
        let a = SparseVector::from_dense(&[1.0, 0.0, 2.0]);
        let b = SparseVector::from_dense(&[0.0, 4.0, 2.0]);
        let c = centroid(&[&a, &b]);
        assert_eq!(c.entries(), &[(0, 0.5), (1, 2.0), (2, 2.0)]);
        assert!(centroid(&[]).is_empty());
    }

    #[test]
    fn test_assignment_respects_threshold() {
        let centroids = vec![SparseVector::from_dense(&[1.0, 0.0])];
        let solutions = vec![
            SparseVector::from_dense(&[0.4, 0.84f64.sqrt()]),
            SparseVector::from_dense(&[0.05, 0.9975f64.sqrt()]),
        ];
        assert_eq!(assign(&centroids, &solutions, 0.15), vec![Some(0), None]);
    }

    #[test]
    fn test_assignment_picks_nearest_and_first_on_ties() {
        let centroids = vec![
            SparseVector::from_dense(&[1.0, 0.0]),
            SparseVector::from_dense(&[0.0, 1.0]),
            SparseVector::from_dense(&[0.0, 1.0]),
        ];
        let solutions = vec![
            SparseVector::from_dense(&[0.2, 0.9]),
            SparseVector::from_dense(&[0.9, 0.2]),
        ];
        assert_eq!(assign(&centroids, &solutions, 0.1), vec![Some(1), Some(0)]);
    }

    #[test]
    fn test_assignment_without_centroids() {
        let solutions = vec![SparseVector::from_dense(&[1.0])];
        assert_eq!(assign(&[], &solutions, 0.0), vec![None]);
    }

    #[test]
    fn test_attach_sorts_dedups_and_counts_teams() {
        let complaints = [
            "invoice reminders never reach clients on time",
            "invoice reminders bounce and clients pay late",
            "warehouse scanners crash during inventory counts",
        ];
        let mut vectorizer = TfidfVectorizer::new(VectorizerOptions::clustering());
        let rows = vectorizer.fit_transform(&complaints).unwrap();
        let centroids = vec![centroid(&[&rows[0], &rows[1]])];

        let solutions = vec![
            solution("s1", "ana", "Automate invoice reminders with a scheduled job", 3, 0),
            solution("s2", "ben", "Send invoice reminders from the accounting tool", 9, 5),
            solution("s3", "ana", "automate invoice reminders   with a scheduled job", 1, 10),
            solution("s4", "cy", "Water your plants twice a week", 50, 0),
        ];

        let mut issues = vec![issue("FinTech")];
        let borrowed: Vec<&ClassifiedRecord> = solutions.iter().collect();
        attach_solutions(&mut issues, &centroids, &vectorizer, &borrowed, 0.15);

        let attached = &issues[0].solutions;
        assert_eq!(attached.len(), 2);
        assert_eq!(attached[0].author, "ben");
        assert_eq!(attached[1].author, "ana");
        assert_eq!(attached[1].summary, "Automate invoice reminders with a scheduled job");
        assert_eq!(attached[0].title, SOLUTION_TITLE);
        assert_eq!(attached[0].roles.len(), 3);
        assert_eq!(issues[0].team_count, 2);
    }
}
