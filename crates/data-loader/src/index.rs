//! Catalogue building and file loading.
//!
//! `FeatureCatalogBuilder` owns the identifier assignment while a feature
//! file is consumed; `build()` freezes it into an immutable
//! `FeatureCatalog`. Rating files are resolved against a finished
//! catalogue so rating columns line up with feature-matrix rows.

use crate::error::{DataLoadError, Result};
use crate::parser::{self, FeatureRecord};
use crate::types::*;
use std::collections::BTreeSet;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use tracing::{debug, info};

/// Incremental builder for a [`FeatureCatalog`].
#[derive(Debug, Default)]
pub struct FeatureCatalogBuilder {
    items: IdMap,
    features: IdMap,
    rows: Vec<BTreeSet<FeatureIndex>>,
}

impl FeatureCatalogBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record that `item` carries every feature in `features`.
    ///
    /// Repeating an item or a feature is harmless; cells are sets.
    pub fn add_item<S: AsRef<str>>(&mut self, item: &str, features: &[S]) -> ItemIndex {
        let row = self.items.get_or_insert(item);
        if row == self.rows.len() {
            self.rows.push(BTreeSet::new());
        }
        for feature in features {
            let col = self.features.get_or_insert(feature.as_ref());
            self.rows[row].insert(col);
        }
        row
    }

    pub fn add_record(&mut self, record: &FeatureRecord) -> ItemIndex {
        self.add_item(&record.item, record.features.as_slice())
    }

    /// Freeze the builder. Dimensions are the distinct items and features seen.
    pub fn build(self) -> FeatureCatalog {
        let num_cols = self.features.len();
        let rows = self
            .rows
            .into_iter()
            .map(|set| set.into_iter().collect())
            .collect();

        // BTreeSet rows are already sorted, unique and within `num_cols`
        let matrix = FeatureMatrix::from_sorted_rows(num_cols, rows);

        FeatureCatalog {
            items: self.items,
            features: self.features,
            matrix,
        }
    }
}

/// Item and feature identifier maps plus the item x feature matrix.
///
/// Immutable once built; share it behind an `Arc`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeatureCatalog {
    items: IdMap,
    features: IdMap,
    matrix: FeatureMatrix,
}

impl FeatureCatalog {
    /// Load a feature file from disk
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let catalog = Self::from_reader(open(path)?, path)?;

        info!(
            path = %path.display(),
            items = catalog.num_items(),
            features = catalog.num_features(),
            cells = catalog.matrix.nnz(),
            "Loaded item features"
        );
        Ok(catalog)
    }

    /// Parse feature records from any buffered reader.
    ///
    /// `path` names the source in errors.
    pub fn from_reader<R: BufRead>(reader: R, path: &Path) -> Result<Self> {
        let mut builder = FeatureCatalogBuilder::new();
        parser::for_each_line(reader, path, |_, line| {
            if let Some(record) = parser::parse_feature_line(line) {
                builder.add_record(&record);
            }
            Ok(())
        })?;
        Ok(builder.build())
    }

    pub fn items(&self) -> &IdMap {
        &self.items
    }

    pub fn features(&self) -> &IdMap {
        &self.features
    }

    pub fn matrix(&self) -> &FeatureMatrix {
        &self.matrix
    }

    pub fn num_items(&self) -> usize {
        self.items.len()
    }

    pub fn num_features(&self) -> usize {
        self.features.len()
    }

    /// Feature labels of an item, in no particular order
    pub fn feature_labels(&self, item: ItemIndex) -> Vec<&str> {
        self.matrix
            .row(item)
            .unwrap_or(&[])
            .iter()
            .filter_map(|&f| self.features.label_of(f))
            .collect()
    }
}

impl RatingMatrix {
    /// Load a rating file, resolving item labels through `catalog`.
    pub fn load_from_file(path: &Path, catalog: &FeatureCatalog) -> Result<Self> {
        let ratings = Self::from_reader(open(path)?, path, catalog)?;

        info!(
            path = %path.display(),
            users = ratings.num_users(),
            ratings = ratings.nnz(),
            "Loaded ratings"
        );
        Ok(ratings)
    }

    /// Parse rating records from any buffered reader.
    ///
    /// User labels get dense ids on first sighting. An item label the
    /// catalogue doesn't know is a `MissingReference` error.
    pub fn from_reader<R: BufRead>(reader: R, path: &Path, catalog: &FeatureCatalog) -> Result<Self> {
        let mut users = IdMap::new();
        let entries = read_entries(reader, path, catalog, |label| Ok(users.get_or_insert(label)))?;

        let matrix = Self::from_entries(users.len(), catalog.num_items(), entries)?;
        Ok(matrix.with_users(users))
    }

    /// Load a held-out rating file whose users must already exist in `users`.
    ///
    /// Rows line up with the matrix `users` came from, so a model trained
    /// on that matrix can be evaluated directly.
    pub fn load_for_users(path: &Path, catalog: &FeatureCatalog, users: &IdMap) -> Result<Self> {
        let entries = read_entries(open(path)?, path, catalog, |label| {
            users.index_of(label).ok_or_else(|| DataLoadError::MissingReference {
                entity: "User".to_string(),
                label: label.to_string(),
            })
        })?;

        info!(path = %path.display(), ratings = entries.len(), "Loaded held-out ratings");

        let matrix = Self::from_entries(users.len(), catalog.num_items(), entries)?;
        Ok(matrix.with_users(users.clone()))
    }
}

fn open(path: &Path) -> Result<BufReader<File>> {
    File::open(path)
        .map(BufReader::new)
        .map_err(|source| DataLoadError::Ingestion {
            path: path.to_path_buf(),
            source,
        })
}

/// Parse every rating line into (user, item, rating), resolving labels.
fn read_entries<R, F>(
    reader: R,
    path: &Path,
    catalog: &FeatureCatalog,
    mut resolve_user: F,
) -> Result<Vec<(UserIndex, ItemIndex, f64)>>
where
    R: BufRead,
    F: FnMut(&str) -> Result<UserIndex>,
{
    let file_name = path.display().to_string();
    let mut entries = Vec::new();

    parser::for_each_line(reader, path, |line_no, line| {
        let record = parser::parse_rating_line(&file_name, line_no, line)?;
        let item = catalog.items().index_of(&record.item).ok_or_else(|| {
            DataLoadError::MissingReference {
                entity: "Item".to_string(),
                label: record.item.clone(),
            }
        })?;
        let user = resolve_user(&record.user)?;
        entries.push((user, item, record.rating));
        Ok(())
    })?;

    debug!(entries = entries.len(), "Parsed rating records");
    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    const FEATURES: &str = "item1 f1 f2\nitem2 f1\nitem3 f3\n";

    fn catalog_from(input: &str) -> FeatureCatalog {
        FeatureCatalog::from_reader(Cursor::new(input), Path::new("features.txt")).unwrap()
    }

    /// Item label -> sorted feature labels, independent of id assignment
    fn logical_content(catalog: &FeatureCatalog) -> Vec<(String, Vec<String>)> {
        let mut content: Vec<(String, Vec<String>)> = (0..catalog.num_items())
            .map(|item| {
                let mut labels: Vec<String> = catalog
                    .feature_labels(item)
                    .into_iter()
                    .map(String::from)
                    .collect();
                labels.sort();
                (catalog.items().label_of(item).unwrap().to_string(), labels)
            })
            .collect();
        content.sort();
        content
    }

    #[test]
    fn test_catalog_ids_follow_first_sighting() {
        let catalog = catalog_from(FEATURES);

        assert_eq!(catalog.num_items(), 3);
        assert_eq!(catalog.num_features(), 3);
        assert_eq!(catalog.items().index_of("item2"), Some(1));
        assert_eq!(catalog.features().index_of("f3"), Some(2));

        let matrix = catalog.matrix();
        assert_eq!(matrix.num_rows(), 3);
        assert_eq!(matrix.num_cols(), 3);
        assert_eq!(matrix.row(0), Some(&[0, 1][..]));
        assert_eq!(matrix.row(2), Some(&[2][..]));
    }

    #[test]
    fn test_duplicate_features_are_idempotent() {
        let catalog = catalog_from("item1 f1 f1,f1 f2\nitem1 f2 f3\n");
        assert_eq!(catalog.num_items(), 1);
        assert_eq!(catalog.matrix().row(0), Some(&[0, 1, 2][..]));
        assert_eq!(catalog.matrix().nnz(), 3);
    }

    #[test]
    fn test_item_without_features_gets_empty_row() {
        let catalog = catalog_from("lonely\nitem1 f1\n");
        assert_eq!(catalog.num_items(), 2);
        assert!(catalog.matrix().row(0).unwrap().is_empty());
    }

    #[test]
    fn test_permutations_keep_logical_content() {
        let original = catalog_from(FEATURES);
        let shuffled = catalog_from("item3 f3\nitem2 f1\nitem1 f2,f1\n");

        assert_eq!(logical_content(&original), logical_content(&shuffled));
    }

    #[test]
    fn test_loading_twice_is_identical() {
        assert_eq!(catalog_from(FEATURES), catalog_from(FEATURES));
    }

    #[test]
    fn test_missing_file_is_ingestion_error() {
        let path = Path::new("/definitely/not/here/features.txt");
        let err = FeatureCatalog::load_from_file(path).unwrap_err();
        assert!(err.is_ingestion());
        assert!(err.to_string().contains("features.txt"));
    }

    #[test]
    fn test_ratings_resolve_against_catalog() {
        let catalog = catalog_from(FEATURES);
        let ratings = RatingMatrix::from_reader(
            Cursor::new("alice item1 5\nalice item2 2\nbob item3 4\nalice item3,4\n"),
            Path::new("ratings.txt"),
            &catalog,
        )
        .unwrap();

        assert_eq!(ratings.num_users(), 2);
        assert_eq!(ratings.num_items(), 3);
        assert_eq!(ratings.users().index_of("bob"), Some(1));

        let alice = ratings.row(0).unwrap();
        assert_eq!(alice.index_list(), vec![0, 1, 2]);
        assert_eq!(alice.get(1), Some(2.0));
    }

    #[test]
    fn test_held_out_ratings_use_known_users() {
        let catalog = catalog_from(FEATURES);
        let mut users = IdMap::new();
        users.get_or_insert("alice");
        users.get_or_insert("bob");

        let path = std::env::temp_dir().join(format!("held-out-{}.txt", std::process::id()));
        std::fs::write(&path, "bob item2 3\n").unwrap();
        let test = RatingMatrix::load_for_users(&path, &catalog, &users).unwrap();
        assert_eq!(test.num_users(), 2);
        assert!(test.row(0).unwrap().is_empty());
        assert_eq!(test.row(1).unwrap().get(1), Some(3.0));

        std::fs::write(&path, "carol item2 3\n").unwrap();
        let unknown = RatingMatrix::load_for_users(&path, &catalog, &users);
        assert!(matches!(unknown, Err(DataLoadError::MissingReference { .. })));
        std::fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_rating_for_unknown_item_fails() {
        let catalog = catalog_from(FEATURES);
        let result = RatingMatrix::from_reader(
            Cursor::new("alice item9 5\n"),
            Path::new("ratings.txt"),
            &catalog,
        );
        assert!(matches!(result, Err(DataLoadError::MissingReference { .. })));
    }
}
