// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Error types for countersign-core.

use thiserror::Error;

/// Signing service errors.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    /// Request validation failed; no side effects were performed.
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// No stored document matches the identifier.
    #[error("Document not found: {0}")]
    NotFound(String),

    /// The bytes are not a valid document package.
    #[error("Malformed package: {0}")]
    MalformedPackage(String),

    /// Template substitution failed; the stored blob is untouched.
    #[error("Template render failed: {0}")]
    TemplateRender(String),

    /// Filesystem operation on the document store failed.
    #[error("Storage failure during {op}: {source}")]
    Storage {
        /// The store operation that failed.
        op: &'static str,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Mail relay rejected the dispatch or never completed it.
    #[error("Delivery failure: {0}")]
    Delivery(String),

    /// Another signing operation already holds this identifier.
    #[error("Signing already in progress for document {0}")]
    Conflict(String),

    /// Store invariant violated: more than one blob matches an identifier.
    #[error("Corrupt store state: {0}")]
    CorruptState(String),
}

/// Result type using the signing service Error.
pub type Result<T> = std::result::Result<T, Error>;
