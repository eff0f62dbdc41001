use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::LazyLock;

use regex::Regex;

use crate::error::{Error, Result};
use crate::taxonomy::stopwords::is_english_stopword;

static RE_TOKEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b\w\w+\b").expect("valid token regex"));

/// Sparse row of a TF-IDF matrix, sorted by column index with no explicit zeros.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SparseVector {
    entries: Vec<(usize, f64)>,
}

impl SparseVector {
    pub fn from_pairs(pairs: impl IntoIterator<Item = (usize, f64)>) -> Self {
        let mut merged: BTreeMap<usize, f64> = BTreeMap::new();
        for (index, value) in pairs {
            *merged.entry(index).or_insert(0.0) += value;
        }
        Self {
            entries: merged.into_iter().filter(|(_, v)| *v != 0.0).collect(),
        }
    }

    pub fn from_dense(values: &[f64]) -> Self {
        Self::from_pairs(values.iter().copied().enumerate())
    }

    pub fn entries(&self) -> &[(usize, f64)] {
        &self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn dot(&self, other: &SparseVector) -> f64 {
        let (mut i, mut j, mut sum) = (0, 0, 0.0);
        while i < self.entries.len() && j < other.entries.len() {
            let (a_idx, a_val) = self.entries[i];
            let (b_idx, b_val) = other.entries[j];
            match a_idx.cmp(&b_idx) {
                std::cmp::Ordering::Less => i += 1,
                std::cmp::Ordering::Greater => j += 1,
                std::cmp::Ordering::Equal => {
                    sum += a_val * b_val;
                    i += 1;
                    j += 1;
                }
            }
        }
        sum
    }

    pub fn norm(&self) -> f64 {
        self.entries.iter().map(|(_, v)| v * v).sum::<f64>().sqrt()
    }

    /// Cosine similarity; zero when either vector is all zeros.
    pub fn cosine(&self, other: &SparseVector) -> f64 {
        let denominator = self.norm() * other.norm();
        if denominator == 0.0 {
            0.0
        } else {
            self.dot(other) / denominator
        }
    }

    fn l2_normalized(self) -> Self {
        let norm = self.norm();
        if norm == 0.0 {
            return self;
        }
        Self {
            entries: self.entries.into_iter().map(|(i, v)| (i, v / norm)).collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct VectorizerOptions {
    pub ngram_range: (usize, usize),
    /// Minimum number of documents a term must appear in.
    pub min_df: usize,
    /// Maximum share of documents a term may appear in.
    pub max_df: f64,
    pub max_features: usize,
}

impl VectorizerOptions {
    /// Vocabulary for similarity clustering: terms must recur across documents.
    pub fn clustering() -> Self {
        Self {
            ngram_range: (1, 2),
            min_df: 2,
            max_df: 0.93,
            max_features: 10_000,
        }
    }

    /// Multi-word phrases for cluster titles; works on a single document.
    pub fn phrases() -> Self {
        Self {
            ngram_range: (2, 4),
            min_df: 1,
            max_df: 1.0,
            max_features: 2_500,
        }
    }

    /// Words and bigrams for cluster summaries.
    pub fn keywords() -> Self {
        Self {
            ngram_range: (1, 2),
            min_df: 1,
            max_df: 1.0,
            max_features: 4_000,
        }
    }
}

/// TF-IDF vectorizer with smoothed IDF and L2-normalized rows.
#[derive(Debug, Clone)]
pub struct TfidfVectorizer {
    options: VectorizerOptions,
    vocabulary: HashMap<String, usize>,
    terms: Vec<String>,
    idf: Vec<f64>,
}

impl TfidfVectorizer {
    pub fn new(options: VectorizerOptions) -> Self {
        Self {
            options,
            vocabulary: HashMap::new(),
            terms: Vec::new(),
            idf: Vec::new(),
        }
    }

    pub fn vocabulary_len(&self) -> usize {
        self.terms.len()
    }

    pub fn terms(&self) -> &[String] {
        &self.terms
    }

    pub fn fit<S: AsRef<str>>(&mut self, documents: &[S]) -> Result<()> {
        let n_docs = documents.len();
        if n_docs == 0 {
            return Err(Error::Vectorize("no documents to fit".to_string()));
        }

        let mut doc_freq: HashMap<String, usize> = HashMap::new();
        let mut term_count: HashMap<String, usize> = HashMap::new();

        for doc in documents {
            let terms = self.analyze(doc.as_ref());
            let mut seen: HashSet<&str> = HashSet::new();
            for term in &terms {
                *term_count.entry(term.clone()).or_insert(0) += 1;
                if seen.insert(term.as_str()) {
                    *doc_freq.entry(term.clone()).or_insert(0) += 1;
                }
            }
        }

        let max_doc_count = if self.options.max_df >= 1.0 {
            n_docs as f64
        } else {
            self.options.max_df * n_docs as f64
        };
        if max_doc_count < self.options.min_df as f64 {
            return Err(Error::Vectorize(format!(
                "max_df covers {:.2} of {} documents, fewer than min_df {}",
                max_doc_count, n_docs, self.options.min_df
            )));
        }

        let mut kept: Vec<(String, usize, usize)> = doc_freq
            .into_iter()
            .filter(|(_, df)| *df >= self.options.min_df && (*df as f64) <= max_doc_count)
            .map(|(term, df)| {
                let count = term_count.get(&term).copied().unwrap_or(0);
                (term, df, count)
            })
            .collect();

        if kept.len() > self.options.max_features {
            kept.sort_by(|a, b| b.2.cmp(&a.2).then_with(|| a.0.cmp(&b.0)));
            kept.truncate(self.options.max_features);
        }

        if kept.is_empty() {
            return Err(Error::Vectorize(
                "empty vocabulary; documents may be too short or too uniform".to_string(),
            ));
        }

        kept.sort_by(|a, b| a.0.cmp(&b.0));

        self.vocabulary.clear();
        self.terms.clear();
        self.idf.clear();
        for (index, (term, df, _)) in kept.into_iter().enumerate() {
            self.vocabulary.insert(term.clone(), index);
            self.terms.push(term);
            self.idf
                .push(((1.0 + n_docs as f64) / (1.0 + df as f64)).ln() + 1.0);
        }

        Ok(())
    }

    /// Vectorize documents against the fitted vocabulary; unknown terms are ignored.
    pub fn transform<S: AsRef<str>>(&self, documents: &[S]) -> Vec<SparseVector> {
        documents
            .iter()
            .map(|doc| {
                let pairs = self
                    .analyze(doc.as_ref())
                    .into_iter()
                    .filter_map(|term| self.vocabulary.get(&term).copied())
                    .map(|index| (index, self.idf[index]));
                SparseVector::from_pairs(pairs).l2_normalized()
            })
            .collect()
    }

    pub fn fit_transform<S: AsRef<str>>(&mut self, documents: &[S]) -> Result<Vec<SparseVector>> {
        self.fit(documents)?;
        Ok(self.transform(documents))
    }

    /// Vocabulary terms ordered by their summed weight over `rows`, highest first.
    pub fn ranked_terms(&self, rows: &[SparseVector]) -> Vec<(String, f64)> {
        let mut sums = vec![0.0; self.terms.len()];
        for row in rows {
            for &(index, value) in row.entries() {
                if let Some(slot) = sums.get_mut(index) {
                    *slot += value;
                }
            }
        }

        let mut ranked: Vec<(usize, f64)> = sums.into_iter().enumerate().collect();
        ranked.sort_by(|a, b| b.1.total_cmp(&a.1).then(a.0.cmp(&b.0)));
        ranked
            .into_iter()
            .map(|(index, score)| (self.terms[index].clone(), score))
            .collect()
    }

    fn analyze(&self, document: &str) -> Vec<String> {
        let lower = document.to_lowercase();
        let tokens: Vec<&str> = RE_TOKEN
            .find_iter(&lower)
            .map(|m| m.as_str())
            .filter(|t| !is_english_stopword(t))
            .collect();

        let (min_n, max_n) = self.options.ngram_range;
        let mut terms = Vec::new();
        for n in min_n.max(1)..=max_n {
            if n > tokens.len() {
                break;
            }
            for window in tokens.windows(n) {
                terms.push(window.join(" "));
            }
        }
        terms
    }
}
