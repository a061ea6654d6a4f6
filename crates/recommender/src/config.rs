//! Recommender configuration.
//!
//! Loaded from a JSON file; any field can be overridden afterwards (the CLI
//! does this from its flags) before calling [`RecommenderConfig::validate`].

use crate::error::{RecommenderError, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

fn default_rating_threshold() -> f64 {
    3.0
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecommenderConfig {
    /// Item feature file
    pub content_path: PathBuf,
    /// User rating file
    pub rating_path: PathBuf,
    /// Ratings at or above this value count as liked
    #[serde(default = "default_rating_threshold")]
    pub rating_threshold: f64,
}

impl Default for RecommenderConfig {
    fn default() -> Self {
        Self {
            content_path: PathBuf::from("data/features.txt"),
            rating_path: PathBuf::from("data/ratings.txt"),
            rating_threshold: default_rating_threshold(),
        }
    }
}

impl RecommenderConfig {
    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path).map_err(|e| {
            RecommenderError::Config(format!("cannot read {}: {}", path.display(), e))
        })?;
        Self::from_json(&raw)
    }

    pub fn from_json(raw: &str) -> Result<Self> {
        serde_json::from_str(raw).map_err(|e| RecommenderError::Config(e.to_string()))
    }

    pub fn validate(&self) -> Result<()> {
        if !self.rating_threshold.is_finite() {
            return Err(RecommenderError::Config(format!(
                "rating_threshold must be a finite number, got {}",
                self.rating_threshold
            )));
        }
        if self.content_path.as_os_str().is_empty() {
            return Err(RecommenderError::Config("content_path is empty".to_string()));
        }
        if self.rating_path.as_os_str().is_empty() {
            return Err(RecommenderError::Config("rating_path is empty".to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_json_with_default_threshold() {
        let config = RecommenderConfig::from_json(
            r#"{ "content_path": "f.txt", "rating_path": "r.txt" }"#,
        )
        .unwrap();
        assert_eq!(config.content_path, PathBuf::from("f.txt"));
        assert_eq!(config.rating_threshold, 3.0);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_from_json_rejects_garbage() {
        let result = RecommenderConfig::from_json("{ not json");
        assert!(matches!(result, Err(RecommenderError::Config(_))));
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = RecommenderConfig::default();
        config.rating_threshold = f64::INFINITY;
        assert!(config.validate().is_err());

        let mut config = RecommenderConfig::default();
        config.content_path = PathBuf::new();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_missing_file() {
        let result = RecommenderConfig::from_file(Path::new("/no/such/config.json"));
        assert!(matches!(result, Err(RecommenderError::Config(_))));
    }
}
