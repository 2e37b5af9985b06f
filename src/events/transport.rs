//! Wire transport to a peer's event source.

use std::time::Duration;

use async_trait::async_trait;
use futures_util::stream::BoxStream;
use futures_util::{future, SinkExt, StreamExt};
use tokio_tungstenite::{connect_async, tungstenite::Message};

use crate::error::TransportError;
use crate::protocol::messages::{DeliverResponse, Envelope};

/// Path of the deliver endpoint below a peer's event address.
pub const DELIVER_PATH: &str = "v1/deliver";

/// Frames from an open subscription, in arrival order.
pub type DeliverStream = BoxStream<'static, Result<DeliverResponse, TransportError>>;

/// Opens a subscription with a signed seek envelope.
#[async_trait]
pub trait DeliverTransport: Send + Sync {
    async fn open(&self, seek: Envelope) -> Result<DeliverStream, TransportError>;
}

/// WebSocket deliver transport: one connection per subscription.
#[derive(Debug, Clone)]
pub struct WsDeliver {
    name: String,
    url: String,
    connect_timeout: Duration,
}

impl WsDeliver {
    pub fn new(name: impl Into<String>, event_address: &str, connect_timeout: Duration) -> Self {
        Self {
            name: name.into(),
            url: format!("{}/{}", event_address.trim_end_matches('/'), DELIVER_PATH),
            connect_timeout,
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl DeliverTransport for WsDeliver {
    async fn open(&self, seek: Envelope) -> Result<DeliverStream, TransportError> {
        let connect = tokio::time::timeout(self.connect_timeout, connect_async(self.url.as_str()));
        let (mut ws, _) = match connect.await {
            Ok(Ok(conn)) => conn,
            Ok(Err(e)) => {
                return Err(TransportError::Connect {
                    endpoint: self.name.clone(),
                    message: e.to_string(),
                })
            }
            Err(_) => {
                return Err(TransportError::Timeout {
                    endpoint: self.name.clone(),
                    after: self.connect_timeout,
                })
            }
        };

        let request = serde_json::to_string(&seek).map_err(|e| TransportError::Malformed {
            endpoint: self.name.clone(),
            message: e.to_string(),
        })?;
        ws.send(Message::Text(request.into()))
            .await
            .map_err(|e| TransportError::Closed {
                endpoint: self.name.clone(),
                message: e.to_string(),
            })?;

        tracing::debug!(source = %self.name, url = %self.url, "Deliver stream opened");

        let endpoint = self.name.clone();
        let frames = ws.filter_map(move |msg| {
            let frame = match msg {
                Ok(Message::Text(text)) => Some(parse_frame(&endpoint, text.as_bytes())),
                Ok(Message::Binary(bytes)) => Some(parse_frame(&endpoint, &bytes)),
                Ok(Message::Close(frame)) => Some(Err(TransportError::Closed {
                    endpoint: endpoint.clone(),
                    message: frame
                        .map(|f| f.reason.to_string())
                        .unwrap_or_else(|| "close frame".to_string()),
                })),
                Ok(_) => None,
                Err(e) => Some(Err(TransportError::Closed {
                    endpoint: endpoint.clone(),
                    message: e.to_string(),
                })),
            };
            future::ready(frame)
        });
        Ok(frames.boxed())
    }
}

fn parse_frame(endpoint: &str, bytes: &[u8]) -> Result<DeliverResponse, TransportError> {
    serde_json::from_slice(bytes).map_err(|e| TransportError::Malformed {
        endpoint: endpoint.to_string(),
        message: e.to_string(),
    })
}
