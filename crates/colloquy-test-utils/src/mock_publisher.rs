// SPDX-FileCopyrightText: 2026 Colloquy Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock event publisher for deterministic testing.
//!
//! `MockPublisher` implements `EventPublisher`, captures every record the
//! broker "accepted", and can be switched into an outage to exercise the
//! dispatcher's retry path.

use async_trait::async_trait;
use tokio::sync::Mutex;

use colloquy_core::{
    AdapterType, ColloquyError, EventPublisher, HealthStatus, OutboundRecord, PluginAdapter,
};

#[derive(Default)]
struct State {
    published: Vec<OutboundRecord>,
    attempts: usize,
    /// Remaining publishes before the outage starts; `None` means healthy.
    budget: Option<usize>,
    /// Keys refused with a non-retryable error regardless of the outage.
    refused: Vec<String>,
}

/// A mock broker publisher for testing.
#[derive(Default)]
pub struct MockPublisher {
    state: Mutex<State>,
}

impl MockPublisher {
    /// Create a healthy publisher with nothing captured.
    pub fn new() -> Self {
        Self::default()
    }

    /// Accept the next `n` publishes, then fail every one after that.
    pub async fn fail_after(&self, n: usize) {
        self.state.lock().await.budget = Some(n);
    }

    /// Fail every publish until [`recover`](Self::recover) is called.
    pub async fn fail_always(&self) {
        self.fail_after(0).await;
    }

    /// Permanently refuse records with this key, as a broker does for a
    /// record it can never encode.
    pub async fn refuse_key(&self, key: impl Into<String>) {
        self.state.lock().await.refused.push(key.into());
    }

    /// End the outage.
    pub async fn recover(&self) {
        self.state.lock().await.budget = None;
    }

    /// Records accepted so far, in publish order.
    pub async fn published(&self) -> Vec<OutboundRecord> {
        self.state.lock().await.published.clone()
    }

    /// Publish calls so far, including failed ones.
    pub async fn attempts(&self) -> usize {
        self.state.lock().await.attempts
    }
}

#[async_trait]
impl PluginAdapter for MockPublisher {
    fn name(&self) -> &str {
        "mock-publisher"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Publisher
    }

    async fn health_check(&self) -> Result<HealthStatus, ColloquyError> {
        match self.state.lock().await.budget {
            Some(0) => Ok(HealthStatus::Unhealthy("broker outage".into())),
            _ => Ok(HealthStatus::Healthy),
        }
    }

    async fn shutdown(&self) -> Result<(), ColloquyError> {
        Ok(())
    }
}

#[async_trait]
impl EventPublisher for MockPublisher {
    async fn publish(&self, record: &OutboundRecord) -> Result<(), ColloquyError> {
        let mut state = self.state.lock().await;
        state.attempts += 1;
        if state.refused.contains(&record.key) {
            return Err(ColloquyError::codec(format!(
                "mock broker cannot encode key {:?}",
                record.key
            )));
        }
        match state.budget {
            Some(0) => {
                return Err(ColloquyError::Broker {
                    message: format!("mock broker rejected record for key {}", record.key),
                    source: None,
                });
            }
            Some(ref mut remaining) => *remaining -= 1,
            None => {}
        }
        state.published.push(record.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use colloquy_core::OutboxEventType;

    fn record(key: &str) -> OutboundRecord {
        OutboundRecord {
            event_type: OutboxEventType::NewUnreadMessage,
            key: key.to_string(),
            value: "{}".to_string(),
        }
    }

    #[tokio::test]
    async fn captures_published_records() {
        let publisher = MockPublisher::new();
        publisher.publish(&record("a_b")).await.unwrap();
        publisher.publish(&record("a_c")).await.unwrap();

        let keys: Vec<_> = publisher.published().await.into_iter().map(|r| r.key).collect();
        assert_eq!(keys, vec!["a_b", "a_c"]);
        assert_eq!(publisher.attempts().await, 2);
    }

    #[tokio::test]
    async fn outage_after_budget_then_recovery() {
        let publisher = MockPublisher::new();
        publisher.fail_after(1).await;
        assert!(publisher.publish(&record("one")).await.is_ok());
        let err = publisher.publish(&record("two")).await.unwrap_err();
        assert!(matches!(err, ColloquyError::Broker { .. }));
        assert!(matches!(
            publisher.health_check().await.unwrap(),
            HealthStatus::Unhealthy(_)
        ));

        publisher.recover().await;
        assert!(publisher.publish(&record("two")).await.is_ok());
        assert_eq!(publisher.published().await.len(), 2);
        assert_eq!(publisher.attempts().await, 3);
    }

    #[tokio::test]
    async fn refused_key_is_a_permanent_error() {
        let publisher = MockPublisher::new();
        publisher.refuse_key("bad").await;
        let err = publisher.publish(&record("bad")).await.unwrap_err();
        assert!(!err.is_retryable());
        assert!(publisher.publish(&record("good")).await.is_ok());
        assert_eq!(publisher.published().await.len(), 1);
    }

    #[tokio::test]
    async fn fail_always_rejects_everything() {
        let publisher = MockPublisher::new();
        publisher.fail_always().await;
        assert!(publisher.publish(&record("x")).await.is_err());
        assert!(publisher.published().await.is_empty());
    }
}
