use thiserror::Error;

/// Errors produced by catalogue loading and known-source matching.
#[derive(Debug, Error)]
pub enum MatchError {
    /// A threshold was configured with a non-positive value.
    #[error("invalid parameter {name}: {value} (must be positive)")]
    InvalidParameter {
        /// Name of the offending parameter.
        name: &'static str,
        /// The rejected value.
        value: f64,
    },

    /// The requested catalogue is not in the supported set.
    #[error("unsupported catalogue: {0}")]
    UnsupportedCatalogue(String),

    /// The catalogue was loaded twice without an intervening unload.
    #[error("catalogue already loaded: {0}")]
    AlreadyLoaded(String),

    /// The catalogue contained no usable entries after parsing.
    #[error("no catalogue data loaded")]
    EmptyCatalogue,

    /// Catalogue reference data could not be read or parsed.
    #[error("failed to load catalogue: {0}")]
    CatalogueLoadFailed(String),

    /// The matcher was queried before a catalogue and search tree were set
    /// up. This is a programmer error, not a data error.
    #[error("matcher not ready: {0}")]
    NotReady(&'static str),

    /// The spatial index rejected an insert or query.
    #[error("search tree error: {0}")]
    SearchTree(String),
}
