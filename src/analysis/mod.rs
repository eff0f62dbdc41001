pub mod normalizer;
pub mod classifier;
pub mod vectorizer;
pub mod clusterer;
pub mod assigner;
pub mod catalog;
pub mod pipeline;

pub use classifier::{Classifier, HeuristicClassifier};
pub use vectorizer::{SparseVector, TfidfVectorizer, VectorizerOptions};
pub use catalog::IssueCatalogBuilder;
pub use pipeline::{BatchOutcome, CurationPipeline, IngestSummary, RunSummary};
