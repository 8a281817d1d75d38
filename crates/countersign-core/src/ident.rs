// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Document identifier allocation.

use uuid::Uuid;

use crate::error::{Error, Result};

/// Opaque identifier naming a stored document.
///
/// Allocated once at upload and embedded in the share link. Identifiers
/// are never recycled: after a purge the value simply stops resolving.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DocumentId(String);

impl DocumentId {
    /// Allocate a fresh identifier (UUID v4).
    pub fn allocate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Parse an identifier received from an untrusted caller.
    ///
    /// Only lowercase hex digits and hyphens are accepted, so a parsed
    /// identifier can never name a path outside the store directory.
    pub fn parse(raw: &str) -> Result<Self> {
        if raw.is_empty()
            || raw.len() > 64
            || !raw.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f' | b'-'))
        {
            return Err(Error::InvalidRequest(format!(
                "invalid document identifier: {raw:?}"
            )));
        }
        Ok(Self(raw.to_string()))
    }

    /// The identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for DocumentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}
