//! Error types for the Ganesha configuration engine
//!
//! Each stage of the pipeline has its own error enum so callers can match on
//! exactly what failed. [`Error`] wraps all of them for collaborator traits
//! and for callers that only need to report.

use thiserror::Error;

/// Result type alias for ganesha-core operations
pub type Result<T> = std::result::Result<T, Error>;

/// Grammar violation while parsing a configuration document
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// The text does not follow the block grammar
    #[error("Malformed config: {message}\n** Parsed **\n{parsed}\n** Remaining **\n{remaining}")]
    MalformedConfig {
        /// What went wrong
        message: String,
        /// Normalized text consumed before the failure
        parsed: String,
        /// Normalized text not yet consumed
        remaining: String,
    },
}

impl ParseError {
    /// The short description, without the parsed/remaining dump
    pub fn message(&self) -> &str {
        match self {
            ParseError::MalformedConfig { message, .. } => message,
        }
    }
}

/// Failure while merging per-daemon export definitions
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConsolidationError {
    /// An export matched more than one canonical export
    #[error("Fatal error: export from daemon '{daemon}' matches {matches} canonical exports")]
    AmbiguousDuplicate {
        /// Daemon that contributed the export
        daemon: String,
        /// Number of canonical entries it matched
        matches: usize,
    },

    /// A daemon's config could not be parsed
    #[error("Failed to parse config of daemon '{daemon}': {source}")]
    Parse {
        /// Daemon whose config failed
        daemon: String,
        /// Underlying grammar error
        #[source]
        source: ParseError,
    },
}

/// Failure while writing export / daemon objects
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PersistError {
    /// The object already exists with different content
    #[error("Object '{0}' already exists")]
    Conflict(String),

    /// The object store itself failed
    #[error("Object store error: {0}")]
    Store(String),
}

/// Failure while adding credentials to exports
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SecretError {
    /// A required field is absent
    #[error("Bad format: {context} \"{field}\" is missing")]
    MissingField {
        /// Name of the missing field
        field: String,
        /// Where it was expected
        context: String,
    },

    /// FSAL name is neither CEPH nor RGW
    #[error("Unrecognized FSAL \"{0}\"")]
    UnrecognizedFsal(String),

    /// Credential service has no key for this user
    #[error("User \"{0}\" does not exist")]
    UnknownUser(String),

    /// The credential service itself failed
    #[error("Credential service error: {0}")]
    Credentials(String),
}

impl SecretError {
    pub(crate) fn missing(field: impl Into<String>, context: impl Into<String>) -> Self {
        Self::MissingField {
            field: field.into(),
            context: context.into(),
        }
    }
}

/// Failure in the migration runner
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MigrationError {
    /// A daemon appears more than once across the Ganesha roles
    #[error("Minion {minion} is part of two different ganesha configurations ({first}, {second})")]
    DuplicateDaemon {
        /// The daemon's host
        minion: String,
        /// First role it was seen in
        first: String,
        /// Second role it was seen in
        second: String,
    },

    /// A daemon's config parsed to nothing
    #[error("Empty or unparsable NFS-Ganesha configuration in {0}")]
    EmptyConfig(String),

    /// Consolidation failed
    #[error(transparent)]
    Consolidation(#[from] ConsolidationError),

    /// Persisting objects failed
    #[error(transparent)]
    Persist(#[from] PersistError),

    /// A remote operation failed or returned an unexpected reply
    #[error("Remote operation '{operation}' failed: {message}")]
    Remote {
        /// Operation name
        operation: String,
        /// Failure detail
        message: String,
    },
}

impl MigrationError {
    pub fn remote(operation: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Remote {
            operation: operation.into(),
            message: message.into(),
        }
    }
}

/// Core error type for ganesha-core
#[derive(Error, Debug)]
pub enum Error {
    /// Grammar errors
    #[error(transparent)]
    Parse(#[from] ParseError),

    /// Consolidation errors
    #[error(transparent)]
    Consolidation(#[from] ConsolidationError),

    /// Persistence errors
    #[error(transparent)]
    Persist(#[from] PersistError),

    /// Secret injection errors
    #[error(transparent)]
    Secret(#[from] SecretError),

    /// Migration runner errors
    #[error(transparent)]
    Migration(#[from] MigrationError),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Object store backend errors
    #[error("Object store error: {0}")]
    Store(String),

    /// Credential backend errors
    #[error("Credential service error: {0}")]
    Credentials(String),

    /// Live status backend errors
    #[error("Live status error: {0}")]
    LiveStatus(String),

    /// Remote execution backend errors
    #[error("Remote execution error: {0}")]
    Remote(String),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic error with context
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create an object store error
    pub fn store(msg: impl Into<String>) -> Self {
        Self::Store(msg.into())
    }

    /// Create a credential service error
    pub fn credentials(msg: impl Into<String>) -> Self {
        Self::Credentials(msg.into())
    }

    /// Create a live status error
    pub fn live_status(msg: impl Into<String>) -> Self {
        Self::LiveStatus(msg.into())
    }

    /// Create a remote execution error
    pub fn remote(msg: impl Into<String>) -> Self {
        Self::Remote(msg.into())
    }
}

/// Helper for converting anyhow::Error to our Error type
impl From<anyhow::Error> for Error {
    fn from(err: anyhow::Error) -> Self {
        Self::Other(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_error_message() {
        let err = ParseError::MalformedConfig {
            message: "Cannot find block name".to_string(),
            parsed: "EXPORT{".to_string(),
            remaining: "x".to_string(),
        };
        assert_eq!(err.message(), "Cannot find block name");
        assert!(err.to_string().contains("** Remaining **\nx"));
    }

    #[test]
    fn test_secret_error_display() {
        let err = SecretError::missing("host", "host identifier");
        assert_eq!(err.to_string(), "Bad format: host identifier \"host\" is missing");
    }

    #[test]
    fn test_wraps_stage_errors() {
        let err: Error = PersistError::Conflict("export-1".to_string()).into();
        assert!(matches!(err, Error::Persist(PersistError::Conflict(ref k)) if k == "export-1"));
        assert_eq!(err.to_string(), "Object 'export-1' already exists");
    }

    #[test]
    fn test_from_anyhow() {
        let err: Error = anyhow::anyhow!("rados unreachable").into();
        assert!(matches!(err, Error::Other(ref msg) if msg == "rados unreachable"));
    }
}
