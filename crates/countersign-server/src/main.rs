// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Countersign - Document Signing Service
//!
//! An HTTP server responsible for:
//! - Receiving docx template uploads and issuing share identifiers
//! - Filling the signer name into a stored template on sign
//! - Mailing the signed document and purging the stored copy
//! - Serving the stored bytes of a not-yet-signed document

use std::sync::Arc;
use tracing::{info, warn};

use countersign_core::notify::SmtpNotifier;
use countersign_core::{DocumentStore, SigningEngine};
use countersign_server::config::Config;
use countersign_server::{AppState, build_router};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "countersign_server=info,countersign_core=info".into()),
        )
        .init();

    // Load .env file if present
    if let Err(e) = dotenvy::dotenv() {
        warn!("No .env file loaded: {}", e);
    }

    // Load configuration
    let config = Config::from_env()?;

    info!(
        listen_addr = %config.listen_addr,
        upload_dir = %config.upload_dir.display(),
        smtp_relay = %config.smtp_relay,
        "Starting Countersign"
    );

    // The store directory lives for the process lifetime, created here
    // if absent.
    let store = DocumentStore::open(config.upload_dir.clone()).await?;

    let notifier = Arc::new(SmtpNotifier::new(
        &config.smtp_relay,
        &config.email_address,
        &config.email_password,
        config.mail_timeout,
    )?);

    let engine = Arc::new(SigningEngine::new(
        store,
        notifier,
        config.recipient.clone(),
    ));

    let state = AppState {
        engine,
        share_base_url: config.share_base_url.clone(),
    };
    let app = build_router(state, &config.allowed_origins);

    let listener = tokio::net::TcpListener::bind(config.listen_addr).await?;
    info!(addr = %config.listen_addr, "Server ready");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Countersign shut down");

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for shutdown signal: {}", e);
        return;
    }
    info!("Shutdown signal received");
}
