//! Push notification gateway.
//!
//! The engine hands resolved token lists to this trait and records the
//! accepted-delivery count; transport details (FCM, APNs, web push)
//! live behind the implementation. Partial delivery failure is not an
//! error: the gateway reports how many sends were accepted and the
//! caller logs the count.

use std::sync::Mutex;

use async_trait::async_trait;

/// Gateway for batched push notifications.
#[async_trait]
pub trait NotificationGateway: Send + Sync {
    /// Send one message to every token. Returns the number of accepted
    /// deliveries.
    async fn send_batch(
        &self,
        tokens: &[String],
        title: &str,
        body: &str,
        metadata: serde_json::Value,
    ) -> usize;
}

/// One batch captured by [`MockNotificationGateway`].
#[derive(Debug, Clone)]
pub struct SentBatch {
    pub tokens: Vec<String>,
    pub title: String,
    pub body: String,
    pub metadata: serde_json::Value,
}

/// Mock gateway for development and testing.
///
/// Logs batches, records them for inspection and reports every
/// delivery as accepted (or none, when simulating failure).
#[derive(Debug, Default)]
pub struct MockNotificationGateway {
    /// Whether to report zero accepted deliveries.
    pub simulate_failure: bool,
    sent: Mutex<Vec<SentBatch>>,
}

impl MockNotificationGateway {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a mock gateway that accepts nothing.
    pub fn failing() -> Self {
        Self {
            simulate_failure: true,
            sent: Mutex::new(Vec::new()),
        }
    }

    /// Batches captured so far.
    pub fn sent_batches(&self) -> Vec<SentBatch> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl NotificationGateway for MockNotificationGateway {
    async fn send_batch(
        &self,
        tokens: &[String],
        title: &str,
        body: &str,
        metadata: serde_json::Value,
    ) -> usize {
        self.sent.lock().unwrap().push(SentBatch {
            tokens: tokens.to_vec(),
            title: title.to_string(),
            body: body.to_string(),
            metadata,
        });

        if self.simulate_failure {
            tracing::warn!(
                tokens = tokens.len(),
                title = %title,
                "Mock gateway simulating delivery failure"
            );
            return 0;
        }

        tracing::info!(
            tokens = tokens.len(),
            title = %title,
            "Mock: would send push notification batch"
        );
        tokens.len()
    }
}
