//! Publishing normalized payloads onto the Zenoh transport.
//!
//! Every payload is published on `<topic>/<ordering_key>`. Reliable
//! congestion-blocking puts from a single session keep per-key FIFO order,
//! which is the transport-level equivalent of an ordering key: all
//! messages sharing a key are delivered in publish order.

use async_trait::async_trait;
use serde_json::Value;
use std::time::Duration;
use zenoh::qos::CongestionControl;

use crate::error::{RelayError, Result};

/// Outbound message transport. The HTTP layer depends on this seam so
/// tests can record published payloads instead of requiring a router.
#[async_trait]
pub trait Publisher: Send + Sync {
    /// Publish `payload` under `ordering_key`, blocking until the
    /// transport accepts it or the configured timeout elapses.
    async fn publish(&self, payload: &Value, ordering_key: &str) -> Result<()>;
}

/// Zenoh-backed publisher with a bounded acknowledgment wait.
pub struct ZenohPublisher {
    session: zenoh::Session,
    topic: String,
    timeout: Duration,
}

impl ZenohPublisher {
    pub fn new(session: zenoh::Session, topic: impl Into<String>, timeout: Duration) -> Self {
        Self {
            session,
            topic: topic.into(),
            timeout,
        }
    }

    fn key_expr(&self, ordering_key: &str) -> String {
        ordered_key_expr(&self.topic, ordering_key)
    }
}

fn ordered_key_expr(topic: &str, ordering_key: &str) -> String {
    format!("{}/{}", topic.trim_end_matches('/'), ordering_key)
}

#[async_trait]
impl Publisher for ZenohPublisher {
    async fn publish(&self, payload: &Value, ordering_key: &str) -> Result<()> {
        let key = self.key_expr(ordering_key);
        let bytes = serde_json::to_vec(payload)?;

        let put = async {
            let publisher = self
                .session
                .declare_publisher(key.clone())
                .congestion_control(CongestionControl::Block)
                .await
                .map_err(|e| RelayError::Zenoh(format!("declare failed on '{key}': {e}")))?;
            publisher
                .put(bytes)
                .await
                .map_err(|e| RelayError::Zenoh(format!("put failed on '{key}': {e}")))
        };

        match tokio::time::timeout(self.timeout, put).await {
            Ok(result) => result?,
            Err(_) => return Err(RelayError::PublishTimeout(self.timeout.as_secs())),
        }

        log::debug!("Published {ordering_key} payload");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_expr_joins_topic_and_ordering_key() {
        assert_eq!(
            ordered_key_expr("weather/climacell", "realtime"),
            "weather/climacell/realtime"
        );
        assert_eq!(
            ordered_key_expr("weather/climacell/", "hourly"),
            "weather/climacell/hourly"
        );
    }
}
