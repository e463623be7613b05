//! NATS-backed status publishing.
//!
//! Status events are ephemeral: they exist only for live editor sessions, so
//! they ride core NATS pub/sub with no stream or consumer management. Each
//! run publishes on its own subject (`workflow.status.<workflow_id>.<run_id>`),
//! which is what keeps concurrent runs of the same workflow from
//! cross-talking.

use crate::status::{PublishError, StatusEvent, StatusPublisher, status_subject};
use async_nats::{Client, Subscriber};
use async_trait::async_trait;
use futures::StreamExt;
use tributary_core::{WorkflowId, WorkflowRunId};

/// Publishes status events over core NATS.
#[derive(Debug, Clone)]
pub struct NatsStatusPublisher {
    client: Client,
}

impl NatsStatusPublisher {
    /// Connects to a NATS server.
    ///
    /// # Errors
    ///
    /// Returns an error if the connection fails.
    pub async fn connect(url: &str) -> Result<Self, PublishError> {
        let client = async_nats::connect(url)
            .await
            .map_err(|e| PublishError::ConnectionFailed {
                message: e.to_string(),
            })?;
        Ok(Self::new(client))
    }

    /// Wraps an existing NATS client.
    #[must_use]
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Returns the underlying client, e.g. for subscribing.
    #[must_use]
    pub fn client(&self) -> &Client {
        &self.client
    }
}

#[async_trait]
impl StatusPublisher for NatsStatusPublisher {
    async fn publish(&self, event: &StatusEvent) -> Result<(), PublishError> {
        let subject = status_subject(event.workflow_id, event.run_id);
        let bytes = serde_json::to_vec(event).map_err(|e| PublishError::PublishFailed {
            message: format!("failed to serialize status event: {e}"),
        })?;

        self.client
            .publish(subject, bytes.into())
            .await
            .map_err(|e| PublishError::PublishFailed {
                message: e.to_string(),
            })?;

        // The scheduler relies on publish completing before the next node is
        // scheduled, so force the write out instead of leaving it buffered.
        self.client
            .flush()
            .await
            .map_err(|e| PublishError::PublishFailed {
                message: e.to_string(),
            })?;

        Ok(())
    }
}

/// Subscribes to one run's status events.
///
/// # Errors
///
/// Returns an error if the subscription cannot be established.
pub async fn subscribe_status(
    client: &Client,
    workflow_id: WorkflowId,
    run_id: WorkflowRunId,
) -> Result<Subscriber, PublishError> {
    client
        .subscribe(status_subject(workflow_id, run_id))
        .await
        .map_err(|e| PublishError::ConnectionFailed {
            message: e.to_string(),
        })
}

/// Awaits the next decodable status event on a subscription.
///
/// Returns `None` when the subscription ends. Undecodable payloads are
/// skipped: subscribers must tolerate imperfect delivery on this channel.
pub async fn next_status(subscriber: &mut Subscriber) -> Option<StatusEvent> {
    while let Some(message) = subscriber.next().await {
        match decode_status(&message.payload) {
            Ok(event) => return Some(event),
            Err(error) => {
                tracing::warn!(error = %error, "skipping undecodable status event");
            }
        }
    }
    None
}

/// Decodes a status event from a message payload.
///
/// # Errors
///
/// Returns an error if the payload is not a valid status event.
pub fn decode_status(payload: &[u8]) -> Result<StatusEvent, serde_json::Error> {
    serde_json::from_slice(payload)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::NodeId;
    use crate::status::NodeStatus;

    #[test]
    fn events_decode_from_published_bytes() {
        let event = StatusEvent::new(
            WorkflowId::new(),
            WorkflowRunId::new(),
            NodeId::new(),
            NodeStatus::Success,
        );

        let bytes = serde_json::to_vec(&event).expect("serialize");
        let decoded = decode_status(&bytes).expect("decode");

        assert_eq!(decoded, event);
    }

    #[test]
    fn garbage_payloads_fail_to_decode() {
        assert!(decode_status(b"not an event").is_err());
    }
}
