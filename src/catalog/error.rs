//! Catalog loading errors and per-record diagnostics

use super::parser::CatalogTag;

/// Failures that stop catalog loading
///
/// Neither variant is fatal to the launcher: the menu simply shows whatever
/// the store holds (nothing, or the records committed before the failure).
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    /// The catalog source could not be opened. The store is left empty.
    #[error("Catalog source {origin} unavailable: {source}")]
    SourceUnavailable {
        origin: String,
        #[source]
        source: std::io::Error,
    },

    /// Syntax or stream failure mid-document. Records committed before the
    /// failure stay in the store.
    #[error("Malformed catalog document at byte {position}: {message}")]
    MalformedDocument { position: u64, message: String },
}

impl LoadError {
    pub fn unavailable(origin: impl Into<String>, source: std::io::Error) -> Self {
        Self::SourceUnavailable {
            origin: origin.into(),
            source,
        }
    }

    pub fn malformed(position: u64, message: impl Into<String>) -> Self {
        Self::MalformedDocument {
            position,
            message: message.into(),
        }
    }
}

/// Problems recovered locally while building records
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CatalogDiagnostic {
    #[error("{tag} tag found when one is already open")]
    DuplicateOpen { tag: CatalogTag },

    #[error("{tag} already defined for this record, keeping the first value")]
    DuplicateField { tag: CatalogTag },

    #[error("record closed while {tag} was still open, dropping it")]
    UnclosedChild { tag: CatalogTag },

    #[error("record is missing {tag}, dropping it")]
    MissingRequiredField { tag: CatalogTag },

    #[error("closing tag mismatch: {tag} is not open")]
    MismatchedClose { tag: CatalogTag },

    #[error("{tag} outside of a record")]
    OrphanField { tag: CatalogTag },

    #[error("text too long, dropped {dropped} characters past {limit}")]
    TextTruncated { dropped: usize, limit: usize },
}
