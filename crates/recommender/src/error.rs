//! Error types for training and prediction.

use data_loader::{DataLoadError, ItemIndex, UserIndex};
use thiserror::Error;

/// Errors raised by the recommender
#[derive(Error, Debug)]
pub enum RecommenderError {
    /// Feature or rating ingestion failed
    #[error(transparent)]
    Load(#[from] DataLoadError),

    /// A user's rating row can't be trained on (negative rating, unknown item, ...)
    #[error("Invalid ratings for user {user}: {reason}")]
    Validation { user: UserIndex, reason: String },

    /// No trained profile exists for this user
    #[error("No trained profile for user {user} (trained users: {num_users})")]
    UnknownUser { user: UserIndex, num_users: usize },

    /// Item index is outside the feature matrix
    #[error("Item {item} is outside the feature matrix ({num_items} items)")]
    UnknownItem { item: ItemIndex, num_items: usize },

    /// A rating matrix doesn't have the shape the model was trained on
    #[error("Rating matrix has {actual} {dimension}, model was trained on {expected}")]
    ShapeMismatch {
        dimension: &'static str,
        expected: usize,
        actual: usize,
    },

    /// Configuration is missing or inconsistent
    #[error("Configuration error: {0}")]
    Config(String),
}

impl RecommenderError {
    /// Per-request lookup failures, which leave the model untouched
    pub fn is_lookup(&self) -> bool {
        matches!(
            self,
            RecommenderError::UnknownUser { .. } | RecommenderError::UnknownItem { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, RecommenderError>;
