// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Flat-directory document store.
//!
//! Documents live as `<identifier>.<extension>` files in a single
//! directory. There is no metadata index: the identifier-to-extension
//! mapping is reconstructed by scanning filenames, and exactly one file
//! per live identifier is an invariant the scan enforces.

use std::path::{Path, PathBuf};
use tokio::fs;
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::ident::DocumentId;

/// Extension accepted at the upload boundary.
pub const DOCX_EXTENSION: &str = "docx";

/// Prefix for in-progress temporary files, excluded from identifier scans.
const TMP_PREFIX: &str = ".tmp-";

/// A resolved document: its on-disk location and original extension.
#[derive(Debug, Clone)]
pub struct StoredDocument {
    /// Absolute or store-relative path of the blob.
    pub path: PathBuf,
    /// Extension recorded in the filename (without the dot).
    pub extension: String,
}

/// Flat-directory blob store, one file per live identifier.
///
/// Created once at process start and shared for the process lifetime.
#[derive(Debug, Clone)]
pub struct DocumentStore {
    root: PathBuf,
}

fn storage_err(op: &'static str) -> impl FnOnce(std::io::Error) -> Error {
    move |source| Error::Storage { op, source }
}

impl DocumentStore {
    /// Open the store, creating the directory if absent.
    pub async fn open(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        fs::create_dir_all(&root)
            .await
            .map_err(storage_err("create store directory"))?;
        Ok(Self { root })
    }

    /// The store directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Write a new blob for the identifier.
    ///
    /// The bytes land under a temporary name first and become visible only
    /// after the rename, so a concurrent read never observes a
    /// half-written file.
    pub async fn store(
        &self,
        id: &DocumentId,
        extension: &str,
        bytes: &[u8],
    ) -> Result<StoredDocument> {
        let path = self.root.join(format!("{id}.{extension}"));
        self.write_atomic(&path, bytes, "store").await?;
        Ok(StoredDocument {
            path,
            extension: extension.to_string(),
        })
    }

    /// Replace an existing blob's content, with the same atomicity as
    /// [`store`](Self::store).
    pub async fn overwrite(&self, doc: &StoredDocument, bytes: &[u8]) -> Result<()> {
        self.write_atomic(&doc.path, bytes, "overwrite").await
    }

    /// Locate the blob whose filename stem equals the identifier.
    ///
    /// Zero matches is `NotFound`. More than one match means the store
    /// directory was tampered with; resolution refuses to pick a winner
    /// and reports `CorruptState`.
    pub async fn resolve(&self, id: &DocumentId) -> Result<StoredDocument> {
        let mut entries = fs::read_dir(&self.root)
            .await
            .map_err(storage_err("scan"))?;
        let mut found: Option<StoredDocument> = None;
        while let Some(entry) = entries.next_entry().await.map_err(storage_err("scan"))? {
            let name = entry.file_name();
            let Some(name) = name.to_str() else { continue };
            if name.starts_with(TMP_PREFIX) {
                continue;
            }
            let path = entry.path();
            if path.file_stem().and_then(|s| s.to_str()) != Some(id.as_str()) {
                continue;
            }
            if found.is_some() {
                return Err(Error::CorruptState(format!(
                    "multiple blobs match identifier {id}"
                )));
            }
            let extension = path
                .extension()
                .and_then(|e| e.to_str())
                .unwrap_or_default()
                .to_string();
            found = Some(StoredDocument { path, extension });
        }
        found.ok_or_else(|| Error::NotFound(id.to_string()))
    }

    /// Read the blob's current bytes.
    pub async fn read(&self, doc: &StoredDocument) -> Result<Vec<u8>> {
        fs::read(&doc.path).await.map_err(storage_err("read"))
    }

    /// Remove the blob.
    ///
    /// A missing file is reported, not ignored: the workflow's own
    /// ordering guarantees the blob exists when delete runs.
    pub async fn delete(&self, doc: &StoredDocument) -> Result<()> {
        fs::remove_file(&doc.path)
            .await
            .map_err(storage_err("delete"))
    }

    async fn write_atomic(&self, dest: &Path, bytes: &[u8], op: &'static str) -> Result<()> {
        let tmp = self.root.join(format!("{TMP_PREFIX}{}", Uuid::new_v4()));
        fs::write(&tmp, bytes).await.map_err(storage_err(op))?;
        if let Err(source) = fs::rename(&tmp, dest).await {
            fs::remove_file(&tmp).await.ok();
            return Err(Error::Storage { op, source });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    async fn open_store() -> (TempDir, DocumentStore) {
        let dir = TempDir::new().unwrap();
        let store = DocumentStore::open(dir.path().to_path_buf()).await.unwrap();
        (dir, store)
    }

    #[tokio::test]
    async fn test_store_resolve_read_delete() {
        let (_dir, store) = open_store().await;
        let id = DocumentId::allocate();

        let doc = store.store(&id, DOCX_EXTENSION, b"payload").await.unwrap();
        let resolved = store.resolve(&id).await.unwrap();
        assert_eq!(resolved.path, doc.path);
        assert_eq!(resolved.extension, DOCX_EXTENSION);
        assert_eq!(store.read(&resolved).await.unwrap(), b"payload");

        store.delete(&doc).await.unwrap();
        assert!(matches!(
            store.resolve(&id).await,
            Err(Error::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_overwrite_replaces_content() {
        let (_dir, store) = open_store().await;
        let id = DocumentId::allocate();
        let doc = store.store(&id, DOCX_EXTENSION, b"before").await.unwrap();

        store.overwrite(&doc, b"after").await.unwrap();
        assert_eq!(store.read(&doc).await.unwrap(), b"after");
    }

    #[tokio::test]
    async fn test_resolve_unknown_identifier_is_not_found() {
        let (_dir, store) = open_store().await;
        assert!(matches!(
            store.resolve(&DocumentId::allocate()).await,
            Err(Error::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_two_blobs_for_one_identifier_is_corrupt_state() {
        let (dir, store) = open_store().await;
        let id = DocumentId::allocate();
        store.store(&id, DOCX_EXTENSION, b"a").await.unwrap();
        // A second file with the same stem can only appear through outside
        // interference; plant one directly.
        std::fs::write(dir.path().join(format!("{id}.bak")), b"b").unwrap();

        assert!(matches!(
            store.resolve(&id).await,
            Err(Error::CorruptState(_))
        ));
    }

    #[tokio::test]
    async fn test_temporary_files_are_invisible_to_resolve() {
        let (dir, store) = open_store().await;
        let id = DocumentId::allocate();
        std::fs::write(dir.path().join(format!(".tmp-{id}")), b"half").unwrap();

        assert!(matches!(
            store.resolve(&id).await,
            Err(Error::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_delete_missing_blob_is_reported() {
        let (_dir, store) = open_store().await;
        let id = DocumentId::allocate();
        let doc = store.store(&id, DOCX_EXTENSION, b"x").await.unwrap();
        store.delete(&doc).await.unwrap();

        assert!(matches!(
            store.delete(&doc).await,
            Err(Error::Storage { op: "delete", .. })
        ));
    }
}
