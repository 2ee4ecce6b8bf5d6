//! # Notification Channel
//!
//! Best-effort push to the kitchen and front-of-house. Publishing is always an auxiliary
//! saga step: a failed or slow publish is logged and reported as a warning, never as a
//! failure of the operation that triggered it.

use crate::model::OrderId;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;
use tokio::sync::broadcast;
use tracing::info;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Notification {
    NewOrder {
        order_id: OrderId,
        table_number: u32,
        item_count: usize,
    },
    OrderReady {
        order_id: OrderId,
        table_number: u32,
    },
}

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("No subscribers listening")]
    NoSubscribers,
    #[error("Publish exceeded deadline of {0:?}")]
    Timeout(Duration),
    #[error("Publish failed: {0}")]
    Failed(String),
}

#[async_trait]
pub trait Notifier: Send + Sync {
    async fn publish(&self, notification: &Notification) -> Result<(), NotifyError>;
}

/// Publishes with an upper bound of `deadline`.
pub async fn publish_within(
    notifier: &dyn Notifier,
    notification: &Notification,
    deadline: Duration,
) -> Result<(), NotifyError> {
    tokio::time::timeout(deadline, notifier.publish(notification))
        .await
        .map_err(|_| NotifyError::Timeout(deadline))?
}

/// Fans notifications out to every subscriber of a `tokio::sync::broadcast` channel.
#[derive(Debug, Clone)]
pub struct BroadcastNotifier {
    sender: broadcast::Sender<Notification>,
}

impl BroadcastNotifier {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Notification> {
        self.sender.subscribe()
    }
}

#[async_trait]
impl Notifier for BroadcastNotifier {
    async fn publish(&self, notification: &Notification) -> Result<(), NotifyError> {
        self.sender
            .send(notification.clone())
            .map(|_| ())
            .map_err(|_| NotifyError::NoSubscribers)
    }
}

/// Writes each notification to the log as JSON.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn publish(&self, notification: &Notification) -> Result<(), NotifyError> {
        let payload =
            serde_json::to_string(notification).map_err(|e| NotifyError::Failed(e.to_string()))?;
        info!(%payload, "Notification");
        Ok(())
    }
}
