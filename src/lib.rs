pub mod config;
pub mod error;
pub mod models;
pub mod llm;
pub mod taxonomy;
pub mod analysis;
pub mod storage;

pub use config::{Config, CurationConfig, StoreBackend};
pub use error::{Error, Result};
pub use llm::{OpenAiOracle, OracleProvider};
pub use analysis::{Classifier, CurationPipeline};
pub use storage::{CurationStore, JsonlStore, SqliteStore};
