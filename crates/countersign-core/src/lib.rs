// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Countersign core - document lifecycle and signing workflow.
//!
//! This crate provides the signing workflow for uploaded docx templates:
//! - Upload stores the template under a fresh identifier
//! - Signing fills the `{{signerName}}` placeholder, mails the signed copy,
//!   and purges the stored blob
//! - Retrieval serves whatever is currently stored for an identifier
//!
//! Lifecycle state is encoded entirely in filesystem presence/absence. A
//! purged identifier is indistinguishable from one that was never issued.
//!
//! # Lifecycle
//!
//! ```text
//! Stored --(resolve)--> Located --(render)--> Rendered
//!     --(overwrite)--> Persisted --(dispatch)--> Delivered
//!     --(delete)--> Purged
//! ```
//!
//! Any stage may fail; completed stages are never rolled back. A failure
//! after the overwrite leaves the rendered document stored and fetchable.

pub mod error;
pub mod ident;
pub mod notify;
pub mod store;
pub mod template;
pub mod workflow;

pub use error::{Error, Result};
pub use ident::DocumentId;
pub use store::DocumentStore;
pub use workflow::SigningEngine;
