//! Error types for catalog data and models

use std::path::PathBuf;

/// A recipe or resource node that failed validation.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ModelError {
    #[error("recipe '{recipe}' has invalid duration {time} (must be > 0)")]
    InvalidDuration { recipe: String, time: f64 },

    #[error("recipe '{recipe}' has invalid amount {amount} of '{item}' (must be >= 0)")]
    InvalidAmount {
        recipe: String,
        item: String,
        amount: f64,
    },

    #[error("recipe '{recipe}' lists ingredient '{item}' more than once")]
    DuplicateIngredient { recipe: String, item: String },

    #[error("recipe '{recipe}' lists product '{item}' more than once")]
    DuplicateProduct { recipe: String, item: String },

    /// Resource node text that isn't `kind:purity:tier`.
    #[error("invalid resource node '{0}' (expected kind:purity:tier)")]
    InvalidNode(String),
}

/// Errors that can occur while reading a catalog.
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("failed to read catalog {file}: {source}")]
    Io {
        file: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("parse error in {file}: {source}")]
    Json {
        file: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid recipe exclusion pattern: {0}")]
    Pattern(#[from] regex::Error),
}
