// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Countersign server - HTTP surface over the signing workflow engine.
//!
//! Routes:
//!
//! | Route | Description |
//! |-------|-------------|
//! | `POST /upload` | Multipart docx upload, responds with a share link |
//! | `POST /sign/{file_id}` | Fill the signer name, mail the result, purge |
//! | `GET /file/{file_id}` | Serve the stored bytes for an identifier |

pub mod config;
pub mod handlers;

use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::http::{HeaderValue, Method, header};
use axum::routing::{get, post};
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;

use countersign_core::SigningEngine;

/// Maximum accepted upload size (16 MB).
const MAX_UPLOAD_BYTES: usize = 16 * 1024 * 1024;

/// Shared state for request handlers.
///
/// Built once at startup and cloned into every handler; there is no
/// module-level singleton state.
#[derive(Clone)]
pub struct AppState {
    /// The signing workflow engine.
    pub engine: Arc<SigningEngine>,
    /// Base URL embedded in share links.
    pub share_base_url: String,
}

/// Assemble the application router.
pub fn build_router(state: AppState, allowed_origins: &[String]) -> Router {
    let origins: Vec<HeaderValue> = allowed_origins
        .iter()
        .filter_map(|origin| origin.parse().ok())
        .collect();
    let cors = CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([header::CONTENT_TYPE]);

    Router::new()
        .route("/upload", post(handlers::upload))
        .route("/sign/{file_id}", post(handlers::sign))
        .route("/file/{file_id}", get(handlers::fetch))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
