// SPDX-FileCopyrightText: 2026 Colloquy Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Broker publisher that POSTs outbox records to an HTTP endpoint.
//!
//! The record value is sent as the JSON body. The partition key, event type
//! and topic travel as `x-message-key`, `x-message-type` and `x-topic`
//! headers. Any 2xx response counts as a broker acknowledgement.

use std::time::Duration;

use async_trait::async_trait;
use colloquy_config::model::BrokerConfig;
use colloquy_core::{
    AdapterType, ColloquyError, EventPublisher, HealthStatus, OutboundRecord, PluginAdapter,
};
use reqwest::header::{CONTENT_TYPE, HeaderValue};
use tracing::debug;

pub const KEY_HEADER: &str = "x-message-key";
pub const TYPE_HEADER: &str = "x-message-type";
pub const TOPIC_HEADER: &str = "x-topic";

/// [`EventPublisher`] backed by an HTTP webhook.
#[derive(Debug, Clone)]
pub struct WebhookPublisher {
    client: reqwest::Client,
    endpoint: String,
    topic: String,
    timeout: Duration,
}

impl WebhookPublisher {
    /// Builds a publisher from the `[broker]` section.
    ///
    /// Fails with a configuration error when no endpoint is set.
    pub fn new(config: &BrokerConfig) -> Result<Self, ColloquyError> {
        let endpoint = config
            .endpoint
            .clone()
            .ok_or_else(|| ColloquyError::Config("broker.endpoint is not set".into()))?;
        let timeout = Duration::from_secs(config.request_timeout_secs);

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ColloquyError::Broker {
                message: format!("failed to build HTTP client: {e}"),
                source: Some(Box::new(e)),
            })?;

        Ok(Self {
            client,
            endpoint,
            topic: config.topic.clone(),
            timeout,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn header(value: &str) -> Result<HeaderValue, ColloquyError> {
        HeaderValue::from_str(value)
            .map_err(|e| ColloquyError::codec(format!("invalid header value {value:?}: {e}")))
    }
}

#[async_trait]
impl PluginAdapter for WebhookPublisher {
    fn name(&self) -> &str {
        "webhook"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Publisher
    }

    async fn health_check(&self) -> Result<HealthStatus, ColloquyError> {
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), ColloquyError> {
        Ok(())
    }
}

#[async_trait]
impl EventPublisher for WebhookPublisher {
    async fn publish(&self, record: &OutboundRecord) -> Result<(), ColloquyError> {
        let response = self
            .client
            .post(&self.endpoint)
            .header(CONTENT_TYPE, HeaderValue::from_static("application/json"))
            .header(KEY_HEADER, Self::header(&record.key)?)
            .header(TYPE_HEADER, Self::header(&record.event_type.to_string())?)
            .header(TOPIC_HEADER, Self::header(&self.topic)?)
            .body(record.value.clone())
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ColloquyError::Timeout {
                        duration: self.timeout,
                    }
                } else {
                    ColloquyError::Broker {
                        message: format!("HTTP request failed: {e}"),
                        source: Some(Box::new(e)),
                    }
                }
            })?;

        let status = response.status();
        debug!(status = %status, key = %record.key, "broker responded");
        if status.is_success() {
            return Ok(());
        }

        let body = response.text().await.unwrap_or_default();
        Err(ColloquyError::Broker {
            message: format!("broker returned {status}: {body}"),
            source: None,
        })
    }
}
