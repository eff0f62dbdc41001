use crate::error::{Error, Result};
use std::env;
use std::path::PathBuf;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    Jsonl,
    Sqlite,
}

impl FromStr for StoreBackend {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "jsonl" | "files" => Ok(StoreBackend::Jsonl),
            "sqlite" => Ok(StoreBackend::Sqlite),
            other => Err(Error::Config(format!("Unknown store backend: {}", other))),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub openai_api_key: Option<String>,
    pub oracle_model: String,
    pub oracle_enabled: bool,
    pub oracle_timeout_secs: u64,
    pub store_backend: StoreBackend,
    pub data_dir: PathBuf,
    pub catalog_dir: PathBuf,
    pub database_path: PathBuf,
    pub batch_size: usize,
    pub publish_threshold: usize,
    pub candidate_threshold: usize,
    pub cluster_threshold: f64,
    pub assignment_threshold: f64,
    pub min_text_length: usize,
    pub max_issues: usize,
    pub surface_solutions: bool,
    pub cycle_delay_secs: u64,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let openai_api_key = env::var("OPENAI_API_KEY")
            .ok()
            .filter(|key| !key.trim().is_empty());

        let oracle_model = env::var("ORACLE_MODEL").unwrap_or_else(|_| "gpt-4.1-mini".to_string());

        // The oracle stays off without a key regardless of ORACLE_ENABLED.
        let oracle_enabled = env_flag("ORACLE_ENABLED").unwrap_or(true) && openai_api_key.is_some();

        let store_backend = match env::var("STORE_BACKEND") {
            Ok(value) => value.parse()?,
            Err(_) => StoreBackend::Jsonl,
        };

        Ok(Self {
            openai_api_key,
            oracle_model,
            oracle_enabled,
            oracle_timeout_secs: env_parse("ORACLE_TIMEOUT_SECS").unwrap_or(40),
            store_backend,
            data_dir: env::var("DATA_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("data/agent")),
            catalog_dir: env::var("CATALOG_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("data")),
            database_path: env::var("DATABASE_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("issuecurator.db")),
            batch_size: env_parse("BATCH_SIZE").unwrap_or(25),
            publish_threshold: env_parse("PUBLISH_THRESHOLD").unwrap_or(5),
            candidate_threshold: env_parse("CANDIDATE_THRESHOLD").unwrap_or(3),
            cluster_threshold: env_parse("CLUSTER_THRESHOLD").unwrap_or(0.24),
            assignment_threshold: env_parse("ASSIGNMENT_THRESHOLD").unwrap_or(0.15),
            min_text_length: env_parse("MIN_TEXT_LENGTH").unwrap_or(45),
            max_issues: env_parse("MAX_ISSUES").unwrap_or(120),
            surface_solutions: env_flag("SURFACE_SOLUTIONS").unwrap_or(false),
            cycle_delay_secs: env_parse("CYCLE_DELAY_SECS").unwrap_or(10),
        })
    }
}

fn env_parse<T: FromStr>(key: &str) -> Option<T> {
    env::var(key).ok().and_then(|v| v.trim().parse().ok())
}

fn env_flag(key: &str) -> Option<bool> {
    env::var(key)
        .ok()
        .map(|v| matches!(v.trim().to_lowercase().as_str(), "1" | "true" | "yes" | "on"))
}

/// Tunables consumed by the curation pipeline.
#[derive(Debug, Clone)]
pub struct CurationConfig {
    pub batch_size: usize,
    pub publish_threshold: usize,
    pub candidate_threshold: usize,
    pub cluster_threshold: f64,
    pub assignment_threshold: f64,
    pub min_text_length: usize,
    pub max_issues: usize,
    pub surface_solutions: bool,
    pub show_progress: bool,
}

impl CurationConfig {
    pub fn validate(&self) -> Result<()> {
        if self.batch_size == 0 {
            return Err(Error::Config("batch size must be at least 1".to_string()));
        }
        if self.candidate_threshold == 0 {
            return Err(Error::Config("candidate threshold must be at least 1".to_string()));
        }
        if self.candidate_threshold > self.publish_threshold {
            return Err(Error::Config(format!(
                "candidate threshold ({}) exceeds publish threshold ({})",
                self.candidate_threshold, self.publish_threshold
            )));
        }
        for (name, value) in [
            ("cluster threshold", self.cluster_threshold),
            ("assignment threshold", self.assignment_threshold),
        ] {
            // Values just above 1.0 are allowed so callers can force singleton clusters.
            if !value.is_finite() || !(0.0..=1.01).contains(&value) {
                return Err(Error::Config(format!("{} must lie in [0, 1], got {}", name, value)));
            }
        }
        Ok(())
    }
}

impl Default for CurationConfig {
    fn default() -> Self {
        Self {
            batch_size: 25,
            publish_threshold: 5,
            candidate_threshold: 3,
            cluster_threshold: 0.24,
            assignment_threshold: 0.15,
            min_text_length: 45,
            max_issues: 120,
            surface_solutions: false,
            show_progress: true,
        }
    }
}

impl From<&Config> for CurationConfig {
    fn from(config: &Config) -> Self {
        Self {
            batch_size: config.batch_size,
            publish_threshold: config.publish_threshold,
            candidate_threshold: config.candidate_threshold,
            cluster_threshold: config.cluster_threshold,
            assignment_threshold: config.assignment_threshold,
            min_text_length: config.min_text_length,
            max_issues: config.max_issues,
            surface_solutions: config.surface_solutions,
            show_progress: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(CurationConfig::default().validate().is_ok());
    }

    #[test]
    fn test_candidate_above_publish_rejected() {
        let config = CurationConfig {
            publish_threshold: 3,
            candidate_threshold: 4,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(Error::Config(_))));
    }

    #[test]
    fn test_zero_batch_rejected() {
        let config = CurationConfig {
            batch_size: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_unreachable_threshold_allowed() {
        let config = CurationConfig {
            cluster_threshold: 1.01,
            ..Default::default()
        };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_store_backend_parse() {
        assert_eq!("SQLite".parse::<StoreBackend>().unwrap(), StoreBackend::Sqlite);
        assert_eq!("jsonl".parse::<StoreBackend>().unwrap(), StoreBackend::Jsonl);
        assert!("mongo".parse::<StoreBackend>().is_err());
    }
}
