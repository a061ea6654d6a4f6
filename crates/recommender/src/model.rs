//! The trained recommender: one profile per user over a shared catalogue.
//!
//! The catalogue sits behind an `Arc` and profiles never change after
//! training, so training runs users in parallel and any number of
//! predictions can run concurrently without locks.

use crate::config::RecommenderConfig;
use crate::error::{RecommenderError, Result};
use crate::evaluation::Evaluation;
use crate::predictor::{self, Posterior};
use crate::profile::UserProfile;
use data_loader::{FeatureCatalog, FeatureIndex, ItemIndex, RatingMatrix, UserIndex};
use rayon::prelude::*;
use serde::Serialize;
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, instrument};

/// An item and its predicted rating
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ScoredItem {
    pub item: ItemIndex,
    pub rating: f64,
}

#[derive(Debug, Clone)]
pub struct NaiveBayesRecommender {
    catalog: Arc<FeatureCatalog>,
    rating_threshold: f64,
    profiles: Vec<UserProfile>,
}

impl NaiveBayesRecommender {
    /// Load the feature and rating files named by `config`, then train.
    pub fn from_config(config: &RecommenderConfig) -> Result<Self> {
        config.validate()?;
        let catalog = Arc::new(FeatureCatalog::load_from_file(&config.content_path)?);
        let ratings = RatingMatrix::load_from_file(&config.rating_path, &catalog)?;
        Self::train(catalog, &ratings, config.rating_threshold)
    }

    /// Train a profile for every row of `ratings`.
    ///
    /// Any invalid row fails the whole pass; there is no partially trained model.
    /// A non-finite `rating_threshold` is a `Config` error.
    #[instrument(skip_all, fields(users = ratings.num_users()))]
    pub fn train(
        catalog: Arc<FeatureCatalog>,
        ratings: &RatingMatrix,
        rating_threshold: f64,
    ) -> Result<Self> {
        if !rating_threshold.is_finite() {
            return Err(RecommenderError::Config(format!(
                "rating_threshold must be finite, got {}",
                rating_threshold
            )));
        }
        let start = Instant::now();
        let features = catalog.matrix();

        let profiles = ratings
            .rows()
            .par_iter()
            .enumerate()
            .map(|(user, row)| UserProfile::train(user, row, features, rating_threshold))
            .collect::<Result<Vec<_>>>()?;

        info!(
            users = profiles.len(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Trained user profiles"
        );

        Ok(Self {
            catalog,
            rating_threshold,
            profiles,
        })
    }

    pub fn catalog(&self) -> &FeatureCatalog {
        &self.catalog
    }

    pub fn rating_threshold(&self) -> f64 {
        self.rating_threshold
    }

    pub fn num_users(&self) -> usize {
        self.profiles.len()
    }

    pub fn profile(&self, user: UserIndex) -> Result<&UserProfile> {
        self.profiles.get(user).ok_or(RecommenderError::UnknownUser {
            user,
            num_users: self.profiles.len(),
        })
    }

    fn item_features(&self, item: ItemIndex) -> Result<&[FeatureIndex]> {
        self.catalog
            .matrix()
            .row(item)
            .ok_or(RecommenderError::UnknownItem {
                item,
                num_items: self.catalog.matrix().num_rows(),
            })
    }

    /// Predicted rating in (1, 5) for `user` on `item`
    pub fn predict(&self, user: UserIndex, item: ItemIndex) -> Result<f64> {
        self.explain(user, item).map(|post| post.rating())
    }

    /// Posterior class probabilities behind [`Self::predict`]
    pub fn explain(&self, user: UserIndex, item: ItemIndex) -> Result<Posterior> {
        let profile = self.profile(user)?;
        let features = self.item_features(item)?;
        Ok(predictor::posterior(profile, features))
    }

    /// Top `limit` items `user` hasn't rated, best predicted rating first.
    ///
    /// `ratings` must be the matrix the model was trained on (or one with the
    /// same users and items); a different shape is a `ShapeMismatch`.
    /// Ties keep ascending item order.
    pub fn recommend(
        &self,
        user: UserIndex,
        ratings: &RatingMatrix,
        limit: usize,
    ) -> Result<Vec<ScoredItem>> {
        let matrix = self.catalog.matrix();
        check_shape("users", self.num_users(), ratings.num_users())?;
        check_shape("items", matrix.num_rows(), ratings.num_items())?;

        let profile = self.profile(user)?;
        let rated = ratings.row(user);

        let mut scored: Vec<ScoredItem> = (0..matrix.num_rows())
            .into_par_iter()
            .filter(|&item| rated.is_none_or(|row| row.get(item).is_none()))
            .map(|item| ScoredItem {
                item,
                rating: predictor::predict_rating(profile, matrix.row(item).unwrap_or(&[])),
            })
            .collect();

        scored.sort_by(|a, b| {
            b.rating
                .partial_cmp(&a.rating)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.item.cmp(&b.item))
        });
        scored.truncate(limit);
        Ok(scored)
    }

    /// MAE / RMSE of predictions against every rating in `test`.
    ///
    /// Test users and items are matched by index; a test row beyond the
    /// trained users is a lookup error.
    pub fn evaluate(&self, test: &RatingMatrix) -> Result<Evaluation> {
        let pairs = test
            .rows()
            .par_iter()
            .enumerate()
            .flat_map_iter(|(user, row)| row.iter().map(move |(item, actual)| (user, item, actual)))
            .map(|(user, item, actual)| self.predict(user, item).map(|predicted| (predicted, actual)))
            .collect::<Result<Vec<_>>>()?;

        let evaluation = Evaluation::from_pairs(pairs);
        info!(
            count = evaluation.count,
            mae = evaluation.mae,
            rmse = evaluation.rmse,
            "Evaluated held-out ratings"
        );
        Ok(evaluation)
    }
}

fn check_shape(dimension: &'static str, expected: usize, actual: usize) -> Result<()> {
    if expected == actual {
        Ok(())
    } else {
        Err(RecommenderError::ShapeMismatch {
            dimension,
            expected,
            actual,
        })
    }
}
