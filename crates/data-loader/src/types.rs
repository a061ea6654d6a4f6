//! Core data types shared by the loader and the recommender.
//!
//! Key points:
//! - Dense integer indices for users, items and features (type aliases)
//! - `IdMap`, a bijective label <-> index map that hands out ids in order
//! - `FeatureMatrix`, a sparse binary items x features matrix
//! - `SparseVector` / `RatingMatrix`, the sparse user -> item ratings

use crate::error::{DataLoadError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

// =============================================================================
// Type Aliases
// =============================================================================

/// Dense row index of a user in the rating matrix
pub type UserIndex = usize;

/// Dense row index of an item in the feature matrix (and column of the rating matrix)
pub type ItemIndex = usize;

/// Dense column index of a feature in the feature matrix
pub type FeatureIndex = usize;

// =============================================================================
// Identifier Maps
// =============================================================================

/// Bijective mapping between string labels and dense indices.
///
/// The first time a label is seen it gets the next unused index
/// (0, 1, 2, ...). Later sightings return the same index.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdMap {
    indices: HashMap<String, usize>,
    labels: Vec<String>,
}

impl IdMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the index for `label`, allocating the next one on first sighting
    pub fn get_or_insert(&mut self, label: &str) -> usize {
        if let Some(&index) = self.indices.get(label) {
            return index;
        }
        let index = self.labels.len();
        self.labels.push(label.to_string());
        self.indices.insert(label.to_string(), index);
        index
    }

    pub fn index_of(&self, label: &str) -> Option<usize> {
        self.indices.get(label).copied()
    }

    pub fn label_of(&self, index: usize) -> Option<&str> {
        self.labels.get(index).map(|s| s.as_str())
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// Labels in index order
    pub fn labels(&self) -> &[String] {
        &self.labels
    }
}

// =============================================================================
// Feature Matrix
// =============================================================================

/// Sparse binary item x feature matrix.
///
/// Every stored cell has the value 1; absence is implied. Built once by
/// [`crate::index::FeatureCatalogBuilder`] and immutable afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureMatrix {
    num_cols: usize,
    /// Feature indices present in each item row, sorted and deduplicated
    rows: Vec<Vec<FeatureIndex>>,
}

impl FeatureMatrix {
    /// Build a matrix from per-item feature lists.
    ///
    /// Rows are sorted and deduplicated so repeated cells collapse to one.
    pub fn from_rows(num_cols: usize, rows: Vec<Vec<FeatureIndex>>) -> Result<Self> {
        let mut rows = rows;
        for row in &mut rows {
            row.sort_unstable();
            row.dedup();
            if let Some(&col) = row.last() {
                if col >= num_cols {
                    return Err(DataLoadError::InvalidValue {
                        field: "feature index".to_string(),
                        value: format!("{} (matrix has {} columns)", col, num_cols),
                    });
                }
            }
        }
        Ok(Self { num_cols, rows })
    }

    pub(crate) fn from_sorted_rows(num_cols: usize, rows: Vec<Vec<FeatureIndex>>) -> Self {
        Self { num_cols, rows }
    }

    pub fn num_rows(&self) -> usize {
        self.rows.len()
    }

    pub fn num_cols(&self) -> usize {
        self.num_cols
    }

    /// Feature indices present for `item`, or `None` if the row doesn't exist
    ///
    /// Callers must not rely on the order of the returned indices.
    pub fn row(&self, item: ItemIndex) -> Option<&[FeatureIndex]> {
        self.rows.get(item).map(|v| v.as_slice())
    }

    pub fn contains(&self, item: ItemIndex, feature: FeatureIndex) -> bool {
        self.row(item)
            .map(|row| row.binary_search(&feature).is_ok())
            .unwrap_or(false)
    }

    /// Number of stored (non-zero) cells
    pub fn nnz(&self) -> usize {
        self.rows.iter().map(|r| r.len()).sum()
    }
}

// =============================================================================
// Ratings
// =============================================================================

/// One user's ratings, keyed by item index.
///
/// Entries are sorted by item. A rating of exactly 0.0 means "not rated"
/// and is never stored.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SparseVector {
    entries: Vec<(ItemIndex, f64)>,
}

impl SparseVector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from (item, rating) pairs. For a repeated item the last pair wins.
    pub fn from_pairs(pairs: impl IntoIterator<Item = (ItemIndex, f64)>) -> Self {
        let mut by_item: HashMap<ItemIndex, f64> = HashMap::new();
        for (item, rating) in pairs {
            by_item.insert(item, rating);
        }
        let mut entries: Vec<(ItemIndex, f64)> = by_item
            .into_iter()
            .filter(|&(_, rating)| rating != 0.0)
            .collect();
        entries.sort_unstable_by_key(|&(item, _)| item);
        Self { entries }
    }

    /// Indices of the rated items, ascending
    pub fn index_list(&self) -> Vec<ItemIndex> {
        self.entries.iter().map(|&(item, _)| item).collect()
    }

    pub fn get(&self, item: ItemIndex) -> Option<f64> {
        self.entries
            .binary_search_by_key(&item, |&(i, _)| i)
            .ok()
            .map(|pos| self.entries[pos].1)
    }

    pub fn iter(&self) -> impl Iterator<Item = (ItemIndex, f64)> + '_ {
        self.entries.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Sparse users x items rating matrix, one [`SparseVector`] per user.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RatingMatrix {
    num_items: usize,
    rows: Vec<SparseVector>,
    /// User labels, present when the matrix was loaded from a file
    users: IdMap,
}

impl RatingMatrix {
    /// Build from (user, item, rating) triples.
    ///
    /// Fails if a user or item index is outside the given dimensions.
    pub fn from_entries(
        num_users: usize,
        num_items: usize,
        entries: impl IntoIterator<Item = (UserIndex, ItemIndex, f64)>,
    ) -> Result<Self> {
        let mut per_user: Vec<Vec<(ItemIndex, f64)>> = vec![Vec::new(); num_users];
        for (user, item, rating) in entries {
            if user >= num_users {
                return Err(DataLoadError::InvalidValue {
                    field: "user index".to_string(),
                    value: format!("{} (matrix has {} users)", user, num_users),
                });
            }
            if item >= num_items {
                return Err(DataLoadError::InvalidValue {
                    field: "item index".to_string(),
                    value: format!("{} (matrix has {} items)", item, num_items),
                });
            }
            per_user[user].push((item, rating));
        }

        Ok(Self {
            num_items,
            rows: per_user.into_iter().map(SparseVector::from_pairs).collect(),
            users: IdMap::new(),
        })
    }

    /// Attach the user label map produced while parsing a rating file
    pub(crate) fn with_users(mut self, users: IdMap) -> Self {
        self.users = users;
        self
    }

    pub fn num_users(&self) -> usize {
        self.rows.len()
    }

    pub fn num_items(&self) -> usize {
        self.num_items
    }

    /// A user's rating row, or `None` for an index outside the matrix
    pub fn row(&self, user: UserIndex) -> Option<&SparseVector> {
        self.rows.get(user)
    }

    pub fn rows(&self) -> &[SparseVector] {
        &self.rows
    }

    pub fn users(&self) -> &IdMap {
        &self.users
    }

    /// Total number of stored ratings
    pub fn nnz(&self) -> usize {
        self.rows.iter().map(|r| r.len()).sum()
    }
}
