//! Error types for the penance-core crate.
//!
//! Only configuration and store errors are ever returned to callers of the
//! engine. Capability failures during a respawn are downgraded to
//! [`SkippedPenalty`](penance_types::SkippedPenalty) entries and a warning.

/// A penalty document that cannot be turned into a catalog.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    /// A reduction string is not `<digits>` or `<digits>%`.
    #[error("invalid {field} config node {raw:?}: {reason}")]
    InvalidReduction {
        /// Document key of the offending value (`xpReduction`, `moneyReduction`).
        field: String,
        /// The raw value as written.
        raw: String,
        /// What is wrong with it.
        reason: &'static str,
    },

    /// The death message template does not compile.
    #[error("invalid deathMessage template: {reason}")]
    InvalidTemplate {
        /// The template engine's description of the syntax error.
        reason: String,
    },
}

/// A host capability call that failed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CapabilityError {
    /// The capability is not available right now (e.g. no account).
    #[error("capability unavailable: {0}")]
    Unavailable(String),

    /// The capability refused the operation.
    #[error("capability rejected the operation: {0}")]
    Rejected(String),
}

/// Errors raised by a [`PersistentStore`](crate::capability::PersistentStore).
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Reading or writing the backing file failed.
    #[error("store I/O error: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// The document is not valid YAML or does not match the schema.
    #[error("failed to parse penalty document: {source}")]
    Yaml {
        /// The underlying YAML error.
        source: serde_yml::Error,
    },

    /// The document parsed but has an unusable shape.
    #[error("malformed penalty document: {0}")]
    Malformed(String),
}

impl From<serde_yml::Error> for StoreError {
    fn from(source: serde_yml::Error) -> Self {
        Self::Yaml { source }
    }
}

/// Errors that stop the engine from starting or a reload from taking effect.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// The document loaded but failed validation.
    #[error("config error: {source}")]
    Config {
        /// The underlying validation error.
        #[from]
        source: ConfigError,
    },

    /// The document could not be loaded.
    #[error("store error: {source}")]
    Store {
        /// The underlying store error.
        #[from]
        source: StoreError,
    },
}
