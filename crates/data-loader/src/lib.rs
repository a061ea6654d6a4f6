//! # Data Loader Crate
//!
//! This crate ingests the item feature file and the user rating file into
//! the sparse structures the recommender trains on.
//!
//! ## Main Components
//!
//! - **types**: Index aliases, `IdMap`, `FeatureMatrix`, `SparseVector`, `RatingMatrix`
//! - **parser**: Line reading and tokenization for both file formats
//! - **index**: `FeatureCatalogBuilder` / `FeatureCatalog` and the file loaders
//! - **error**: Error types for data loading
//!
//! ## Example Usage
//!
//! ```ignore
//! use data_loader::{FeatureCatalog, RatingMatrix};
//! use std::path::Path;
//!
//! let catalog = FeatureCatalog::load_from_file(Path::new("data/features.txt"))?;
//! let ratings = RatingMatrix::load_from_file(Path::new("data/ratings.txt"), &catalog)?;
//!
//! let item = catalog.items().index_of("item1").unwrap();
//! println!("item1 has features {:?}", catalog.feature_labels(item));
//! ```

// Public modules
pub mod error;
pub mod types;
pub mod parser;
pub mod index;

// Re-export commonly used types for convenience
pub use error::{DataLoadError, Result};
pub use index::{FeatureCatalog, FeatureCatalogBuilder};
pub use types::{
    // Type aliases
    UserIndex,
    ItemIndex,
    FeatureIndex,
    // Core types
    IdMap,
    FeatureMatrix,
    SparseVector,
    RatingMatrix,
};
