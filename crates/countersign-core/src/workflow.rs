// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Signing workflow engine.
//!
//! Orchestrates the full lifecycle of a stored document: locate, render
//! the template, persist the rendered bytes, deliver them by mail, purge
//! the blob. Stages run in that order and short-circuit on the first
//! failure; completed stages are never rolled back. A failure after the
//! overwrite leaves the rendered document stored and fetchable, so a
//! retry of the same sign request can still deliver it.
//!
//! At most one signing operation may be in flight per identifier; a
//! concurrent attempt fails fast with `Conflict`. The in-flight claim is
//! held from before the resolve until after the delete, so a second
//! render can never interleave with the overwrite/delete span.

use dashmap::DashSet;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{info, warn};

use crate::error::{Error, Result};
use crate::ident::DocumentId;
use crate::notify::{Notification, Notifier};
use crate::store::{DOCX_EXTENSION, DocumentStore};
use crate::template::TemplateDocument;

/// Template field bound to the signer's name.
pub const SIGNER_NAME_FIELD: &str = "signerName";

/// Outcome of a completed signing workflow.
#[derive(Debug, Clone)]
pub struct SignOutcome {
    /// The identifier that was signed and purged.
    pub id: DocumentId,
    /// The signer name that was substituted, trimmed.
    pub signer_name: String,
}

/// The signing workflow engine.
///
/// Constructed once at process start and shared behind `Arc` across
/// request handlers; all collaborators are explicit, no module-level
/// singletons.
pub struct SigningEngine {
    store: DocumentStore,
    notifier: Arc<dyn Notifier>,
    recipient: String,
    /// Identifiers with a signing operation currently in flight.
    in_flight: DashSet<String>,
}

/// Releases the in-flight slot when the signing attempt ends.
struct InFlightGuard<'a> {
    registry: &'a DashSet<String>,
    key: String,
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.registry.remove(&self.key);
    }
}

impl SigningEngine {
    /// Create an engine over a store and a notifier.
    pub fn new(store: DocumentStore, notifier: Arc<dyn Notifier>, recipient: String) -> Self {
        Self {
            store,
            notifier,
            recipient,
            in_flight: DashSet::new(),
        }
    }

    /// Store a new document and hand back its identifier.
    ///
    /// Only the packaged document format is accepted; anything else fails
    /// at this boundary before a blob is written.
    pub async fn upload(&self, extension: &str, bytes: &[u8]) -> Result<DocumentId> {
        if !extension.eq_ignore_ascii_case(DOCX_EXTENSION) {
            return Err(Error::InvalidRequest(format!(
                "only .{DOCX_EXTENSION} uploads are accepted"
            )));
        }
        let id = DocumentId::allocate();
        self.store.store(&id, DOCX_EXTENSION, bytes).await?;
        info!(id = %id, size = bytes.len(), "document stored");
        Ok(id)
    }

    /// Serve the document's current bytes, whatever its lifecycle state.
    ///
    /// Post-purge the identifier no longer resolves and this is `NotFound`.
    pub async fn fetch(&self, id: &DocumentId) -> Result<(Vec<u8>, String)> {
        let doc = self.store.resolve(id).await?;
        let bytes = self.store.read(&doc).await?;
        Ok((bytes, doc.extension))
    }

    /// Run the signing workflow for one document.
    pub async fn sign(&self, id: &DocumentId, signer_name: &str) -> Result<SignOutcome> {
        let signer_name = signer_name.trim();
        if signer_name.is_empty() {
            // Fail before any storage or codec work.
            return Err(Error::InvalidRequest("signer name is required".to_string()));
        }

        let _guard = self.claim(id)?;

        let doc = self.store.resolve(id).await?;
        let bytes = self.store.read(&doc).await?;

        let rendered = render(&bytes, signer_name)?;
        self.store.overwrite(&doc, &rendered).await?;
        info!(id = %id, "rendered document persisted");

        let notification = Notification {
            recipient: self.recipient.clone(),
            subject: format!("Document signed by {signer_name}"),
            html_body: "<p>The signed document is attached.</p>".to_string(),
            attachment_name: format!("{id}.{}", doc.extension),
            attachment_bytes: rendered,
        };
        if let Err(e) = self.notifier.send(notification).await {
            // The blob now holds the rendered content and stays fetchable.
            warn!(id = %id, "delivery failed after persist; rendered document remains stored");
            return Err(e);
        }

        self.store.delete(&doc).await?;
        info!(id = %id, signer = signer_name, "document delivered and purged");

        Ok(SignOutcome {
            id: id.clone(),
            signer_name: signer_name.to_string(),
        })
    }

    fn claim(&self, id: &DocumentId) -> Result<InFlightGuard<'_>> {
        let key = id.as_str().to_string();
        if !self.in_flight.insert(key.clone()) {
            return Err(Error::Conflict(id.to_string()));
        }
        Ok(InFlightGuard {
            registry: &self.in_flight,
            key,
        })
    }
}

/// Decode the package, substitute the signer name, re-encode.
fn render(bytes: &[u8], signer_name: &str) -> Result<Vec<u8>> {
    let mut document = TemplateDocument::decode(bytes)?;
    let fields = HashMap::from([(SIGNER_NAME_FIELD.to_string(), signer_name.to_string())]);
    document.substitute(&fields)?;
    document.encode()
}
