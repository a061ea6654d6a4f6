//! Naive Bayes rating prediction.
//!
//! ## Algorithm
//! 1. Multiply the user's per-feature likelihoods over the item's features
//!    (unseen features use the profile's fallback pair)
//! 2. Weight by the class priors and normalize into P(L | item), P(~L | item)
//! 3. Take the log-odds and squash them back through the logistic function
//! 4. Rescale from (0, 1) onto the (1, 5) rating range
//!
//! The products are accumulated as sums of logarithms. That leaves
//! `ln P(L | item) - ln P(~L | item)` unchanged and keeps items with many
//! features from underflowing to zero.

use crate::profile::UserProfile;
use data_loader::FeatureIndex;
use serde::Serialize;

/// Width of the output rating range
pub const RATING_SCALE: f64 = 4.0;

/// Lowest rating the scale approaches
pub const RATING_OFFSET: f64 = 1.0;

/// Smallest f64 above `RATING_OFFSET`
const RATING_FLOOR: f64 = RATING_OFFSET + f64::EPSILON;

/// Largest f64 below `RATING_OFFSET + RATING_SCALE` (one ulp in [4, 8) is 4 * EPSILON)
const RATING_CEILING: f64 = RATING_OFFSET + RATING_SCALE - 4.0 * f64::EPSILON;

/// Class posteriors for one (user, item) pair
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Posterior {
    /// P(Like | item features)
    pub p_like: f64,
    /// P(NotLike | item features)
    pub p_not_like: f64,
    /// ln(p_like) - ln(p_not_like)
    pub logit: f64,
}

impl Posterior {
    /// Map the log-odds onto the rating scale.
    ///
    /// The logistic saturates to exactly 0 or 1 once |logit| passes ~37, so
    /// the result is held one ulp inside the open interval (1, 5).
    pub fn rating(&self) -> f64 {
        (sigmoid(self.logit) * RATING_SCALE + RATING_OFFSET).clamp(RATING_FLOOR, RATING_CEILING)
    }
}

/// Combine the profile's priors and likelihoods over `item_features`.
///
/// The order of `item_features` has no effect on the result.
pub fn posterior(profile: &UserProfile, item_features: &[FeatureIndex]) -> Posterior {
    let (log_like, log_not_like) = item_features.iter().fold(
        (profile.p_like.ln(), profile.p_not_like.ln()),
        |(like, not_like), &feature| {
            let p = profile.likelihood(feature);
            (like + p.like.ln(), not_like + p.not_like.ln())
        },
    );

    let logit = log_like - log_not_like;
    let p_like = sigmoid(logit);

    Posterior {
        p_like,
        p_not_like: 1.0 - p_like,
        logit,
    }
}

/// Predicted rating in (1, 5) for an item with the given features
pub fn predict_rating(profile: &UserProfile, item_features: &[FeatureIndex]) -> f64 {
    posterior(profile, item_features).rating()
}

/// Logistic function, evaluated so neither branch overflows `exp`
pub fn sigmoid(x: f64) -> f64 {
    if x >= 0.0 {
        1.0 / (1.0 + (-x).exp())
    } else {
        let e = x.exp();
        e / (1.0 + e)
    }
}
