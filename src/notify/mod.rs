//! Notification channel
//!
//! The engine only needs three things from a chat channel: deliver a message
//! and get its id back, edit a delivered message, delete one. Telegram is the
//! production channel; the dry-run channel logs instead of sending.

mod message;
mod telegram;

pub use message::{escape_html, render_signal, SignalView};
pub use telegram::TelegramNotifier;

use crate::config::TelegramConfig;
use crate::error::Result;
use crate::types::DeliveryId;
use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Send a new message, returning the channel's id for it
    async fn deliver(&self, text: &str) -> Result<DeliveryId>;

    /// Replace the text of a delivered message
    async fn edit(&self, id: DeliveryId, text: &str) -> Result<()>;

    async fn delete(&self, id: DeliveryId) -> Result<()>;
}

/// Logs messages instead of sending them
#[derive(Default)]
pub struct DryRunNotifier {
    next_id: AtomicI64,
    delivered: Mutex<Vec<(DeliveryId, String)>>,
}

impl DryRunNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Messages "delivered" so far, with edits applied
    pub fn delivered(&self) -> Vec<(DeliveryId, String)> {
        self.delivered.lock().clone()
    }
}

#[async_trait]
impl Notifier for DryRunNotifier {
    async fn deliver(&self, text: &str) -> Result<DeliveryId> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed) + 1;
        info!("📨 [dry-run] message #{}:\n{}", id, text.trim());
        self.delivered.lock().push((id, text.to_string()));
        Ok(id)
    }

    async fn edit(&self, id: DeliveryId, text: &str) -> Result<()> {
        info!("✏️ [dry-run] edit #{}:\n{}", id, text.trim());
        if let Some(entry) = self.delivered.lock().iter_mut().find(|(i, _)| *i == id) {
            entry.1 = text.to_string();
        }
        Ok(())
    }

    async fn delete(&self, id: DeliveryId) -> Result<()> {
        info!("🗑️ [dry-run] delete #{}", id);
        self.delivered.lock().retain(|(i, _)| *i != id);
        Ok(())
    }
}

/// Telegram when configured and not in dry-run mode, otherwise dry-run
pub fn build_notifier(
    telegram: Option<&TelegramConfig>,
    dry_run: bool,
    timeout: Duration,
) -> Result<Arc<dyn Notifier>> {
    match telegram {
        Some(cfg) if !dry_run => Ok(Arc::new(TelegramNotifier::new(cfg, timeout)?)),
        _ => {
            info!("Notifications in dry-run mode");
            Ok(Arc::new(DryRunNotifier::new()))
        }
    }
}
