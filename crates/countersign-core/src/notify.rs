// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Notification dispatch.
//!
//! The signed document leaves the system as a mail attachment. Dispatch
//! sits behind a trait so the workflow can be exercised without a relay,
//! and so a relay failure stays distinguishable from codec and storage
//! failures.

use async_trait::async_trait;
use lettre::message::header::ContentType;
use lettre::message::{Attachment, MultiPart, SinglePart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use std::time::Duration;

use crate::error::{Error, Result};

/// Content type of a packaged document attachment.
const DOCX_CONTENT_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document";

/// An outbound notification carrying the signed document.
#[derive(Debug, Clone)]
pub struct Notification {
    /// Destination address.
    pub recipient: String,
    /// Subject line.
    pub subject: String,
    /// HTML body.
    pub html_body: String,
    /// Filename shown for the attachment.
    pub attachment_name: String,
    /// The signed document bytes.
    pub attachment_bytes: Vec<u8>,
}

/// Dispatches notifications to an external relay.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Send one notification. Transport, auth, and timeout failures all
    /// surface as `Delivery`.
    async fn send(&self, notification: Notification) -> Result<()>;
}

/// SMTP notifier over an authenticated TLS relay.
pub struct SmtpNotifier {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    sender: String,
    timeout: Duration,
}

impl SmtpNotifier {
    /// Build a notifier for `relay` with the given account credentials.
    ///
    /// `timeout` bounds each dispatch; the relay is the only unbounded
    /// external network call in the signing chain.
    pub fn new(relay: &str, address: &str, password: &str, timeout: Duration) -> Result<Self> {
        let transport = AsyncSmtpTransport::<Tokio1Executor>::relay(relay)
            .map_err(|e| Error::Delivery(format!("invalid mail relay '{relay}': {e}")))?
            .credentials(Credentials::new(address.to_string(), password.to_string()))
            .build();
        Ok(Self {
            transport,
            sender: address.to_string(),
            timeout,
        })
    }
}

#[async_trait]
impl Notifier for SmtpNotifier {
    async fn send(&self, notification: Notification) -> Result<()> {
        let attachment_type = ContentType::parse(DOCX_CONTENT_TYPE)
            .map_err(|e| Error::Delivery(format!("attachment content type: {e}")))?;
        let message = Message::builder()
            .from(self
                .sender
                .parse()
                .map_err(|e| Error::Delivery(format!("invalid sender address: {e}")))?)
            .to(notification
                .recipient
                .parse()
                .map_err(|e| Error::Delivery(format!("invalid recipient address: {e}")))?)
            .subject(notification.subject.clone())
            .multipart(
                MultiPart::mixed()
                    .singlepart(SinglePart::html(notification.html_body.clone()))
                    .singlepart(
                        Attachment::new(notification.attachment_name.clone())
                            .body(notification.attachment_bytes.clone(), attachment_type),
                    ),
            )
            .map_err(|e| Error::Delivery(format!("failed to build message: {e}")))?;

        match tokio::time::timeout(self.timeout, self.transport.send(message)).await {
            Ok(Ok(_)) => Ok(()),
            Ok(Err(e)) => Err(Error::Delivery(format!("mail relay rejected dispatch: {e}"))),
            Err(_) => Err(Error::Delivery(format!(
                "mail dispatch timed out after {}s",
                self.timeout.as_secs()
            ))),
        }
    }
}
