//! Result publishing.
//!
//! The finished probe is handed to a queue as a single JSON message. Delivery
//! guarantees belong to the queue; this module only defines the wire shape
//! and the hand-off.

use std::future::Future;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::mpsc;

use crate::error_handling::PublishError;
use crate::fetch::MimeType;
use crate::probe::ProbeResult;
use crate::tls::TlsVersion;

/// Message placed on the queue for every probed endpoint.
///
/// Field names are the wire contract downstream consumers depend on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub url: String,
    /// Empty when the probe succeeded
    pub err: String,
    #[serde(rename = "mimeTypes")]
    pub mime_types: Vec<MimeType>,
    #[serde(rename = "tlsVersion")]
    pub tls_version: TlsVersion,
    #[serde(rename = "httpResponse")]
    pub http_response: u16,
    #[serde(rename = "capabilityStatement")]
    pub capability_statement: Option<Value>,
}

impl From<&ProbeResult> for Message {
    fn from(result: &ProbeResult) -> Self {
        Self {
            url: result.url.clone(),
            err: result.error.clone().unwrap_or_default(),
            mime_types: result.supported_mime_types.clone(),
            tls_version: result.tls_version,
            http_response: result.http_status,
            capability_statement: result.capability_statement.clone(),
        }
    }
}

/// Destination for finished messages.
pub trait Publisher {
    /// Hands `payload` to the queue named `destination`. Called once per
    /// message; implementations must not retry internally.
    fn publish(
        &self,
        destination: &str,
        payload: String,
    ) -> impl Future<Output = Result<(), PublishError>> + Send;
}

/// A message as received from a [`ChannelPublisher`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueuedMessage {
    pub destination: String,
    pub payload: String,
}

/// Publisher backed by an in-process `tokio` channel.
#[derive(Debug, Clone)]
pub struct ChannelPublisher {
    sender: mpsc::Sender<QueuedMessage>,
}

impl ChannelPublisher {
    /// Creates a publisher and the receiver its messages arrive on.
    ///
    /// `publish` waits while the channel is full, so when nothing drains the
    /// receiver during a run the capacity must cover one message per
    /// endpoint. A capacity of 0 is raised to 1.
    pub fn new(capacity: usize) -> (Self, mpsc::Receiver<QueuedMessage>) {
        let (sender, receiver) = mpsc::channel(capacity.max(1));
        (Self { sender }, receiver)
    }
}

impl Publisher for ChannelPublisher {
    async fn publish(&self, destination: &str, payload: String) -> Result<(), PublishError> {
        self.sender
            .send(QueuedMessage {
                destination: destination.to_string(),
                payload,
            })
            .await
            .map_err(|_| PublishError::Closed(destination.to_string()))
    }
}
