//! Core error types.

use thiserror::Error;

/// Result alias used throughout the compiler.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Problems with the static schema, index policy, or compiler configuration.
///
/// These are always detected before any statement reaches the database.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// An object class names a parent that no loaded document defines.
    #[error("object class {object_class} references undefined parent {parent}")]
    UndefinedParent {
        /// The referencing object class.
        object_class: String,
        /// The missing parent.
        parent: String,
    },

    /// An object class merges attributes from a class that is not defined.
    #[error("object class {object_class} merges undefined object class {merged}")]
    UndefinedMerge {
        /// The referencing object class.
        object_class: String,
        /// The missing merge source.
        merged: String,
    },

    /// An attribute is routed to a subtable of a table that is never planned.
    #[error("attribute {attribute} is routed to a subtable of unknown table {table}")]
    UnknownSubtableParent {
        /// Attribute carrying the directive.
        attribute: String,
        /// Table named by the directive.
        table: String,
    },

    /// A definition has no names at all.
    #[error("{kind} definition #{position} has no names")]
    Unnamed {
        /// "attribute" or "object class".
        kind: &'static str,
        /// Zero-based position in its document.
        position: usize,
    },

    /// A document could not be parsed.
    #[error("malformed {document}: {source}")]
    Malformed {
        /// Which document failed.
        document: String,
        /// Underlying parse error.
        #[source]
        source: serde_json::Error,
    },

    /// A server version string could not be parsed.
    #[error("invalid server version: {0}")]
    InvalidVersion(String),

    /// A document could not be read from disk.
    #[error("cannot read {path}: {source}")]
    Read {
        /// Path that failed.
        path: String,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
}

/// Errors reported by a live database session.
#[derive(Debug, Error)]
pub enum SessionError {
    /// The object being created already exists.
    #[error("duplicate object: {0}")]
    DuplicateObject(String),

    /// The statement references a table that does not exist.
    #[error("no such table: {0}")]
    NoSuchTable(String),

    /// Error reported by the database backend.
    #[error("database error: {0}")]
    Database(String),

    /// Backend-specific error.
    #[error(transparent)]
    Backend(Box<dyn std::error::Error + Send + Sync>),
}

/// Top-level compiler errors.
#[derive(Debug, Error)]
pub enum Error {
    /// Schema, policy, or configuration problem.
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// A DDL statement failed.
    #[error("statement failed: {statement}: {source}")]
    Execution {
        /// Rendered statement text.
        statement: String,
        /// Error reported by the session.
        #[source]
        source: SessionError,
    },

    /// Catalog introspection failed.
    #[error("catalog introspection failed: {0}")]
    Introspection(#[source] SessionError),

    /// The statement audit log could not be written.
    #[error("audit log error: {0}")]
    AuditLog(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::from(ConfigError::UndefinedParent {
            object_class: "gluuPerson".to_string(),
            parent: "missingClass".to_string(),
        });
        let text = err.to_string();
        assert!(text.contains("gluuPerson"));
        assert!(text.contains("missingClass"));
    }

    #[test]
    fn test_execution_error_keeps_statement() {
        let err = Error::Execution {
            statement: "CREATE TABLE t (doc_id VARCHAR(64))".to_string(),
            source: SessionError::DuplicateObject("t".to_string()),
        };
        assert!(err.to_string().contains("CREATE TABLE t"));
        assert!(std::error::Error::source(&err).is_some());
    }
}
