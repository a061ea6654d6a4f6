//! Error metrics over held-out ratings.

use serde::Serialize;

/// Mean absolute and root mean squared error of a set of predictions
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct Evaluation {
    pub count: usize,
    pub mae: f64,
    pub rmse: f64,
}

impl Evaluation {
    /// Compute metrics from (predicted, actual) pairs.
    ///
    /// No pairs at all gives a zero count and zero errors.
    pub fn from_pairs(pairs: impl IntoIterator<Item = (f64, f64)>) -> Self {
        let (count, abs_sum, sq_sum) = pairs.into_iter().fold(
            (0usize, 0.0, 0.0),
            |(count, abs_sum, sq_sum), (predicted, actual)| {
                let err = predicted - actual;
                (count + 1, abs_sum + err.abs(), sq_sum + err * err)
            },
        );

        if count == 0 {
            return Self::default();
        }

        Self {
            count,
            mae: abs_sum / count as f64,
            rmse: (sq_sum / count as f64).sqrt(),
        }
    }
}
