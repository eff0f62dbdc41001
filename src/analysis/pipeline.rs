use std::time::Duration;

use chrono::Utc;
use indicatif::{ProgressBar, ProgressStyle};

use crate::analysis::catalog::IssueCatalogBuilder;
use crate::analysis::classifier::{derive_issue_title, Classifier, DEFAULT_ISSUE_TITLE};
use crate::analysis::normalizer::{is_placeholder, normalize, slugify};
use crate::config::CurationConfig;
use crate::error::Result;
use crate::models::{
    AuditEntry, Catalog, Classification, ClassifiedRecord, Label, RawRecord, RecordStatus,
};
use crate::storage::CurationStore;

/// Result of classifying one batch. Nothing is persisted yet.
#[derive(Debug, Default)]
pub struct BatchOutcome {
    pub problems: Vec<ClassifiedRecord>,
    pub deleted: Vec<ClassifiedRecord>,
    pub audit: Vec<AuditEntry>,
    pub solution_count: usize,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct IngestSummary {
    pub accepted: usize,
    pub duplicates: usize,
    pub discarded: usize,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RunSummary {
    pub processed: usize,
    pub problems: usize,
    pub solutions: usize,
    pub deleted: usize,
    pub remaining: usize,
    pub published: usize,
    pub candidates: usize,
}

pub struct CurationPipeline<S: CurationStore> {
    classifier: Classifier,
    catalog_builder: IssueCatalogBuilder,
    store: S,
    config: CurationConfig,
}

impl<S: CurationStore> CurationPipeline<S> {
    pub fn new(classifier: Classifier, store: S, config: CurationConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            classifier,
            catalog_builder: IssueCatalogBuilder::new(config.clone()),
            store,
            config,
        })
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Queue new records. Records already known to any log are skipped, as are empty,
    /// placeholder and too-short texts.
    pub fn ingest(&self, records: Vec<RawRecord>) -> Result<IngestSummary> {
        let mut known = self.store.known_ids()?;
        let now = Utc::now();
        let mut summary = IngestSummary::default();
        let mut accepted = Vec::new();

        for mut record in records {
            let text = normalize(&record.text);
            if text.is_empty()
                || is_placeholder(&text)
                || text.chars().count() < self.config.min_text_length
            {
                summary.discarded += 1;
                continue;
            }
            if !known.insert(record.id.clone()) {
                summary.duplicates += 1;
                continue;
            }

            record.text = text;
            record.status = RecordStatus::Pending;
            record.ingested_at.get_or_insert(now);
            accepted.push(record);
        }

        summary.accepted = accepted.len();
        self.store.append_queue(&accepted)?;

        tracing::info!(
            "Ingested {} records ({} duplicates, {} discarded)",
            summary.accepted,
            summary.duplicates,
            summary.discarded
        );
        Ok(summary)
    }

    /// Classify a batch. Every record ends up in exactly one of problems/deleted and once in audit.
    pub async fn process_batch(&self, records: &[RawRecord]) -> BatchOutcome {
        let classified_at = Utc::now();
        let mut outcome = BatchOutcome::default();

        let pb = self.progress_bar(records.len());

        for record in records {
            let text = normalize(&record.text);
            let classification = if text.is_empty() {
                Classification {
                    label: Label::NotRelated,
                    confidence: 0.95,
                    reason: "Empty text after normalization.".to_string(),
                    issue_title: DEFAULT_ISSUE_TITLE.to_string(),
                    roles: Vec::new(),
                }
            } else {
                self.classifier.classify(&text, &record.sector_hint).await
            };

            let issue_title = match classification.issue_title.trim() {
                "" => derive_issue_title(&text),
                title => title.to_string(),
            };

            let mut stored = record.clone();
            stored.text = text;
            stored.status = classification.label.disposition();

            let classified = ClassifiedRecord {
                record: stored,
                label: classification.label,
                confidence: classification.confidence,
                reason: classification.reason,
                issue_key: slugify(&issue_title),
                issue_title,
                roles: classification.roles,
                classified_at,
            };

            outcome.audit.push(AuditEntry::from(&classified));
            match classified.label {
                Label::Problem => outcome.problems.push(classified),
                Label::Solution => {
                    // Solutions stay out of the problems log; the catalog may surface them later.
                    outcome.solution_count += 1;
                    outcome.deleted.push(classified);
                }
                Label::NotRelated => outcome.deleted.push(classified),
            }

            pb.inc(1);
        }

        pb.finish_and_clear();
        outcome
    }

    /// Process one batch from the head of the queue, then rebuild the catalog.
    pub async fn run_once(&self) -> Result<RunSummary> {
        let queue = self.store.load_queue()?;

        if queue.is_empty() {
            let catalog = self.rebuild_catalog()?;
            tracing::info!(
                "Queue is empty | catalog refreshed ({} published, {} candidates)",
                catalog.published.len(),
                catalog.candidates.len()
            );
            return Ok(RunSummary {
                published: catalog.published.len(),
                candidates: catalog.candidates.len(),
                ..Default::default()
            });
        }

        let split = self.config.batch_size.min(queue.len());
        let (batch, remaining) = queue.split_at(split);

        let outcome = self.process_batch(batch).await;

        self.store.replace_queue(remaining)?;
        self.store.append_problems(&outcome.problems)?;
        self.store.append_deleted(&outcome.deleted)?;
        self.store.append_audit(&outcome.audit)?;

        let catalog = self.rebuild_catalog()?;

        let summary = RunSummary {
            processed: batch.len(),
            problems: outcome.problems.len(),
            solutions: outcome.solution_count,
            deleted: outcome.deleted.len(),
            remaining: remaining.len(),
            published: catalog.published.len(),
            candidates: catalog.candidates.len(),
        };

        tracing::info!(
            "Processed {} | problems={} | solutions_filtered={} | deleted={} | remaining={}",
            summary.processed,
            summary.problems,
            summary.solutions,
            summary.deleted,
            summary.remaining
        );

        Ok(summary)
    }

    /// Rebuild and persist the catalog from the full problems log.
    pub fn rebuild_catalog(&self) -> Result<Catalog> {
        let problems = self.store.load_problems()?;
        let deleted = if self.config.surface_solutions {
            self.store.load_deleted()?
        } else {
            Vec::new()
        };

        let catalog = self.catalog_builder.build(&problems, &deleted);
        self.store.write_catalog(&catalog)?;
        Ok(catalog)
    }

    /// Run forever with a fixed delay between cycles; failed cycles are logged and skipped.
    pub async fn run_continuous(&self, cycle_delay: Duration) {
        loop {
            if let Err(e) = self.run_once().await {
                tracing::warn!("Curation cycle failed: {}", e);
            }
            tokio::time::sleep(cycle_delay).await;
        }
    }

    fn progress_bar(&self, len: usize) -> ProgressBar {
        if !self.config.show_progress {
            return ProgressBar::hidden();
        }

        let pb = ProgressBar::new(len as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} records")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("#>-"),
        );
        pb
    }
}
