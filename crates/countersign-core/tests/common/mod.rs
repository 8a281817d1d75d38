// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Shared fixtures for workflow tests.

use async_trait::async_trait;
use std::io::{Cursor, Write};
use std::sync::{Arc, Mutex};
use tokio::sync::Notify;
use zip::ZipWriter;
use zip::write::SimpleFileOptions;

use countersign_core::error::{Error, Result};
use countersign_core::notify::{Notification, Notifier};

/// Build a minimal docx package whose document part is `markup`.
pub fn minimal_docx(markup: &str) -> Vec<u8> {
    let options = SimpleFileOptions::default();
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    for (name, content) in [
        ("[Content_Types].xml", "<Types/>"),
        ("_rels/.rels", "<Relationships/>"),
        ("word/document.xml", markup),
    ] {
        writer.start_file(name, options).unwrap();
        writer.write_all(content.as_bytes()).unwrap();
    }
    writer.finish().unwrap().into_inner()
}

/// Notifier that records every dispatched notification.
#[derive(Default)]
pub struct RecordingNotifier {
    pub sent: Mutex<Vec<Notification>>,
}

impl RecordingNotifier {
    pub fn sent_count(&self) -> usize {
        self.sent.lock().unwrap().len()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn send(&self, notification: Notification) -> Result<()> {
        self.sent.lock().unwrap().push(notification);
        Ok(())
    }
}

/// Notifier that always fails with a delivery error.
pub struct FailingNotifier;

#[async_trait]
impl Notifier for FailingNotifier {
    async fn send(&self, _notification: Notification) -> Result<()> {
        Err(Error::Delivery("relay refused connection".to_string()))
    }
}

/// Notifier that parks inside `send` until released, for exercising
/// concurrent signing attempts deterministically.
pub struct BlockingNotifier {
    pub entered: Arc<Notify>,
    pub release: Arc<Notify>,
}

impl BlockingNotifier {
    pub fn new() -> Self {
        Self {
            entered: Arc::new(Notify::new()),
            release: Arc::new(Notify::new()),
        }
    }
}

#[async_trait]
impl Notifier for BlockingNotifier {
    async fn send(&self, _notification: Notification) -> Result<()> {
        self.entered.notify_one();
        self.release.notified().await;
        Ok(())
    }
}
