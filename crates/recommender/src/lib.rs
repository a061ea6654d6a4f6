//! Content-based rating prediction with per-user Naive Bayes models.
//!
//! This crate provides:
//! - `UserProfile`: Laplace-smoothed priors and feature likelihoods for one user
//! - `predictor`: posterior, log-odds and rescaling onto the (1, 5) range
//! - `NaiveBayesRecommender`: trains every user in parallel and answers
//!   predict / recommend / evaluate requests
//! - `RecommenderConfig`: where to find the feature and rating files
//!
//! ## Example Usage
//! ```ignore
//! use recommender::{NaiveBayesRecommender, RecommenderConfig};
//!
//! let config = RecommenderConfig::from_file("recommender.json".as_ref())?;
//! let model = NaiveBayesRecommender::from_config(&config)?;
//!
//! let item = model.catalog().items().index_of("item42").unwrap();
//! println!("predicted rating: {:.2}", model.predict(0, item)?);
//! ```

pub mod config;
pub mod error;
pub mod evaluation;
pub mod model;
pub mod predictor;
pub mod profile;

// Re-export main types
pub use config::RecommenderConfig;
pub use error::{RecommenderError, Result};
pub use evaluation::Evaluation;
pub use model::{NaiveBayesRecommender, ScoredItem};
pub use predictor::{posterior, predict_rating, Posterior};
pub use profile::{FeatureCounts, Likelihood, UserProfile, LAPLACE_ALPHA};
