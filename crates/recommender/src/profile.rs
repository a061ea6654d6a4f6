//! Per-user Naive Bayes profile.
//!
//! A profile classifies each of the user's ratings as liked (rating at or
//! above the threshold) or not liked, then derives Laplace-smoothed class
//! priors and per-feature likelihoods from the features of the rated items.
//!
//! ## Formulas
//! With smoothing constant α:
//! - `P(L)          = (liked + α) / (rated + 2α)`
//! - `P(f | L)      = (count_liked(f) + α) / (liked + 2α)`
//! - `P(f | ~L)     = (count_not_liked(f) + α) / (not_liked + 2α)`
//! - unseen feature: `(α / (liked + 2α), α / (not_liked + 2α))`

use crate::error::{RecommenderError, Result};
use data_loader::{FeatureIndex, FeatureMatrix, SparseVector, UserIndex};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use tracing::debug;

/// Additive smoothing constant applied to every count
pub const LAPLACE_ALPHA: f64 = 0.01;

/// How many liked / not-liked rated items contained a feature
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct FeatureCounts {
    pub liked: usize,
    pub not_liked: usize,
}

/// `(P(f | Like), P(f | NotLike))` for one feature
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Likelihood {
    pub like: f64,
    pub not_like: f64,
}

/// Trained profile for a single user. Read-only after [`UserProfile::train`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UserProfile {
    pub user: UserIndex,
    pub num_rated: usize,
    pub num_liked: usize,
    pub num_not_liked: usize,
    pub p_like: f64,
    pub p_not_like: f64,
    pub feature_counts: BTreeMap<FeatureIndex, FeatureCounts>,
    pub feature_probabilities: BTreeMap<FeatureIndex, Likelihood>,
    /// Likelihood pair for any feature absent from `feature_probabilities`
    pub unseen: Likelihood,
}

impl UserProfile {
    /// Train a profile from one user's rating row.
    ///
    /// Every rated entry is validated before anything is counted: ratings
    /// must be finite and non-negative, items must be rows of `features`.
    pub fn train(
        user: UserIndex,
        ratings: &SparseVector,
        features: &FeatureMatrix,
        rating_threshold: f64,
    ) -> Result<Self> {
        validate_ratings(user, ratings, features)?;

        let mut num_liked = 0;
        let mut num_not_liked = 0;
        let mut feature_counts: BTreeMap<FeatureIndex, FeatureCounts> = BTreeMap::new();

        for (item, rating) in ratings.iter() {
            let liked = rating >= rating_threshold;
            if liked {
                num_liked += 1;
            } else {
                num_not_liked += 1;
            }

            for &feature in features.row(item).unwrap_or(&[]) {
                let counts = feature_counts.entry(feature).or_default();
                if liked {
                    counts.liked += 1;
                } else {
                    counts.not_liked += 1;
                }
            }
        }

        let num_rated = num_liked + num_not_liked;
        let p_like = smoothed(num_liked, num_rated);
        let p_not_like = 1.0 - p_like;

        let feature_probabilities = feature_counts
            .iter()
            .map(|(&feature, counts)| {
                let likelihood = Likelihood {
                    like: smoothed(counts.liked, num_liked),
                    not_like: smoothed(counts.not_liked, num_not_liked),
                };
                (feature, likelihood)
            })
            .collect();

        let unseen = Likelihood {
            like: smoothed(0, num_liked),
            not_like: smoothed(0, num_not_liked),
        };

        debug!(
            user,
            num_rated,
            num_liked,
            features = feature_counts.len(),
            "Trained user profile"
        );

        Ok(Self {
            user,
            num_rated,
            num_liked,
            num_not_liked,
            p_like,
            p_not_like,
            feature_counts,
            feature_probabilities,
            unseen,
        })
    }

    /// Likelihood pair for `feature`, falling back to the unseen pair
    pub fn likelihood(&self, feature: FeatureIndex) -> Likelihood {
        self.feature_probabilities
            .get(&feature)
            .copied()
            .unwrap_or(self.unseen)
    }

    /// JSON rendering of the whole profile
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

/// `(count + α) / (total + 2α)`
fn smoothed(count: usize, total: usize) -> f64 {
    (count as f64 + LAPLACE_ALPHA) / (total as f64 + 2.0 * LAPLACE_ALPHA)
}

fn validate_ratings(user: UserIndex, ratings: &SparseVector, features: &FeatureMatrix) -> Result<()> {
    for (item, rating) in ratings.iter() {
        if !rating.is_finite() || rating < 0.0 {
            return Err(RecommenderError::Validation {
                user,
                reason: format!("rating {} for item {} is not a non-negative number", rating, item),
            });
        }
        if item >= features.num_rows() {
            return Err(RecommenderError::Validation {
                user,
                reason: format!(
                    "item {} is outside the feature matrix ({} items)",
                    item,
                    features.num_rows()
                ),
            });
        }
    }
    Ok(())
}

impl fmt::Display for UserProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "User {}", self.user)?;
        writeln!(f, "Items rated: {}", self.num_rated)?;
        writeln!(f, "Items liked: {}", self.num_liked)?;
        writeln!(f, "Items not liked: {}", self.num_not_liked)?;
        writeln!(f, "P(L): {}", self.p_like)?;
        writeln!(f, "P(~L): {}", self.p_not_like)?;

        write!(f, "Feature counts: {{")?;
        for (feature, counts) in &self.feature_counts {
            write!(f, " {}: [{}, {}],", feature, counts.liked, counts.not_liked)?;
        }
        writeln!(f, " }}")?;

        write!(f, "Feature probabilities: {{")?;
        for (feature, p) in &self.feature_probabilities {
            write!(f, " {}: [{}, {}],", feature, p.like, p.not_like)?;
        }
        writeln!(f, " }}")?;

        write!(f, "Unseen feature: [{}, {}]", self.unseen.like, self.unseen.not_like)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-12;

    /// item0 {0, 1}, item1 {0}, item2 {2}
    fn features() -> FeatureMatrix {
        FeatureMatrix::from_rows(3, vec![vec![0, 1], vec![0], vec![2]]).unwrap()
    }

    #[test]
    fn test_counts_and_priors() {
        let ratings = SparseVector::from_pairs(vec![(0, 5.0), (1, 2.0), (2, 4.0)]);
        let profile = UserProfile::train(0, &ratings, &features(), 3.0).unwrap();

        assert_eq!(profile.num_rated, 3);
        assert_eq!(profile.num_liked, 2);
        assert_eq!(profile.num_not_liked, 1);
        assert!((profile.p_like - (2.0 + 0.01) / (3.0 + 0.02)).abs() < EPS);
        assert!((profile.p_like + profile.p_not_like - 1.0).abs() < EPS);

        assert_eq!(profile.feature_counts[&0], FeatureCounts { liked: 1, not_liked: 1 });
        assert_eq!(profile.feature_counts[&1], FeatureCounts { liked: 1, not_liked: 0 });
        assert_eq!(profile.feature_counts[&2], FeatureCounts { liked: 1, not_liked: 0 });
    }

    #[test]
    fn test_feature_probabilities() {
        let ratings = SparseVector::from_pairs(vec![(0, 5.0), (1, 2.0), (2, 4.0)]);
        let profile = UserProfile::train(0, &ratings, &features(), 3.0).unwrap();

        let f0 = profile.likelihood(0);
        assert!((f0.like - 1.01 / 2.02).abs() < EPS);
        assert!((f0.not_like - 1.01 / 1.02).abs() < EPS);

        let f2 = profile.likelihood(2);
        assert!((f2.like - 1.01 / 2.02).abs() < EPS);
        assert!((f2.not_like - 0.01 / 1.02).abs() < EPS);

        for p in profile.feature_probabilities.values() {
            assert!(p.like > 0.0 && p.like < 1.0);
            assert!(p.not_like > 0.0 && p.not_like < 1.0);
        }
    }

    #[test]
    fn test_unseen_fallback() {
        let ratings = SparseVector::from_pairs(vec![(1, 5.0)]);
        let profile = UserProfile::train(0, &ratings, &features(), 3.0).unwrap();

        assert!(!profile.feature_probabilities.contains_key(&2));
        assert_eq!(profile.likelihood(2), profile.unseen);
        assert!((profile.unseen.like - 0.01 / 1.02).abs() < EPS);
        assert!((profile.unseen.not_like - 0.5).abs() < EPS);
    }

    #[test]
    fn test_all_liked_user() {
        let ratings = SparseVector::from_pairs(vec![(0, 4.0), (1, 5.0), (2, 3.0)]);
        let profile = UserProfile::train(0, &ratings, &features(), 3.0).unwrap();

        assert_eq!(profile.num_not_liked, 0);
        assert!((profile.p_not_like - 0.01 / 3.02).abs() < EPS);
        assert!(profile.p_not_like > 0.0);
    }

    #[test]
    fn test_user_without_ratings() {
        let profile = UserProfile::train(7, &SparseVector::new(), &features(), 3.0).unwrap();

        assert_eq!(profile.num_rated, 0);
        assert_eq!(profile.p_like, 0.5);
        assert_eq!(profile.p_not_like, 0.5);
        assert!(profile.feature_probabilities.is_empty());
        assert_eq!(profile.unseen, Likelihood { like: 0.5, not_like: 0.5 });
    }

    #[test]
    fn test_item_without_features_still_counts() {
        let matrix = FeatureMatrix::from_rows(1, vec![vec![], vec![0]]).unwrap();
        let ratings = SparseVector::from_pairs(vec![(0, 1.0), (1, 5.0)]);
        let profile = UserProfile::train(0, &ratings, &matrix, 3.0).unwrap();

        assert_eq!(profile.num_rated, 2);
        assert_eq!(profile.num_not_liked, 1);
        assert_eq!(profile.feature_counts.len(), 1);
    }

    #[test]
    fn test_negative_rating_is_rejected() {
        let ratings = SparseVector::from_pairs(vec![(0, 4.0), (1, -1.0)]);
        let result = UserProfile::train(3, &ratings, &features(), 3.0);
        assert!(matches!(result, Err(RecommenderError::Validation { user: 3, .. })));
    }

    #[test]
    fn test_non_finite_rating_is_rejected() {
        let ratings = SparseVector::from_pairs(vec![(0, f64::NAN)]);
        let result = UserProfile::train(0, &ratings, &features(), 3.0);
        assert!(matches!(result, Err(RecommenderError::Validation { .. })));
    }

    #[test]
    fn test_out_of_range_item_is_rejected() {
        let ratings = SparseVector::from_pairs(vec![(9, 4.0)]);
        let result = UserProfile::train(0, &ratings, &features(), 3.0);
        assert!(matches!(result, Err(RecommenderError::Validation { .. })));
    }

    #[test]
    fn test_display_dump() {
        let ratings = SparseVector::from_pairs(vec![(0, 5.0), (1, 2.0)]);
        let profile = UserProfile::train(0, &ratings, &features(), 3.0).unwrap();
        let dump = profile.to_string();

        assert!(dump.contains("Items liked: 1"));
        assert!(dump.contains("Items not liked: 1"));
        assert!(dump.contains("P(L): 0.5"));
        assert!(dump.contains("Feature probabilities: { 0: ["));
        assert!(dump.contains("Unseen feature: ["));
    }

    #[test]
    fn test_json_dump() {
        let ratings = SparseVector::from_pairs(vec![(0, 5.0)]);
        let profile = UserProfile::train(0, &ratings, &features(), 3.0).unwrap();
        let json: serde_json::Value = serde_json::from_str(&profile.to_json().unwrap()).unwrap();

        assert_eq!(json["num_liked"], 1);
        assert!(json["feature_probabilities"]["1"]["like"].is_number());
        assert!(json["unseen"]["not_like"].is_number());
    }
}
