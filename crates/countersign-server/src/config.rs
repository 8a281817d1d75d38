// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Configuration for countersign-server.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

/// Origins allowed by default: the local dev client and the deployed one.
const DEFAULT_ALLOWED_ORIGINS: &[&str] = &[
    "http://localhost:3000",
    "https://client-digital-signature-x7xa.vercel.app",
];

/// Base URL embedded in share links handed back after upload.
const DEFAULT_SHARE_BASE_URL: &str = "https://client-digital-signature-x7xa.vercel.app";

/// Server configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Listen address for the HTTP server.
    pub listen_addr: SocketAddr,
    /// SMTP account address; also the default sender and recipient.
    pub email_address: String,
    /// SMTP account password or app token.
    pub email_password: String,
    /// SMTP relay host.
    pub smtp_relay: String,
    /// Where signed documents are mailed.
    pub recipient: String,
    /// Directory holding uploaded documents.
    pub upload_dir: PathBuf,
    /// Base URL for share links.
    pub share_base_url: String,
    /// CORS origin allow-list.
    pub allowed_origins: Vec<String>,
    /// Bound on each mail dispatch.
    pub mail_timeout: Duration,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        let port: u16 = std::env::var("PORT")
            .unwrap_or_else(|_| "5000".to_string())
            .parse()
            .map_err(|_| ConfigError::InvalidPort)?;
        let listen_addr = SocketAddr::from(([0, 0, 0, 0], port));

        let email_address = std::env::var("EMAIL_ADDRESS")
            .map_err(|_| ConfigError::MissingEnvVar("EMAIL_ADDRESS"))?;
        let email_password = std::env::var("EMAIL_PASSWORD")
            .map_err(|_| ConfigError::MissingEnvVar("EMAIL_PASSWORD"))?;

        let smtp_relay = std::env::var("COUNTERSIGN_SMTP_RELAY")
            .unwrap_or_else(|_| "smtp.gmail.com".to_string());

        // The original deployment mails the signed document back to its
        // own account; keep that as the default.
        let recipient =
            std::env::var("COUNTERSIGN_RECIPIENT").unwrap_or_else(|_| email_address.clone());

        let upload_dir = PathBuf::from(
            std::env::var("COUNTERSIGN_UPLOAD_DIR").unwrap_or_else(|_| "uploads".to_string()),
        );

        let share_base_url = std::env::var("COUNTERSIGN_SHARE_BASE_URL")
            .unwrap_or_else(|_| DEFAULT_SHARE_BASE_URL.to_string())
            .trim_end_matches('/')
            .to_string();

        let allowed_origins = match std::env::var("COUNTERSIGN_ALLOWED_ORIGINS") {
            Ok(raw) => parse_origins(&raw),
            Err(_) => DEFAULT_ALLOWED_ORIGINS
                .iter()
                .map(|s| s.to_string())
                .collect(),
        };

        let mail_timeout_secs: u64 = std::env::var("COUNTERSIGN_MAIL_TIMEOUT_SECS")
            .unwrap_or_else(|_| "30".to_string())
            .parse()
            .map_err(|_| ConfigError::InvalidMailTimeout)?;

        Ok(Self {
            listen_addr,
            email_address,
            email_password,
            smtp_relay,
            recipient,
            upload_dir,
            share_base_url,
            allowed_origins,
            mail_timeout: Duration::from_secs(mail_timeout_secs),
        })
    }
}

/// Split a comma-separated origin list, dropping empty entries.
fn parse_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|o| !o.is_empty())
        .map(str::to_string)
        .collect()
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// A required environment variable is missing.
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(&'static str),
    /// The port number is invalid.
    #[error("Invalid port number")]
    InvalidPort,
    /// The mail timeout is invalid.
    #[error("Invalid mail timeout")]
    InvalidMailTimeout,
}
