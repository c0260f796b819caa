use std::sync::Arc;

use async_trait::async_trait;
use futures::StreamExt;
use reqwest::Client;
use serde_json::Value;
use shared::{error::BridgeError, protocol::HostMessage};
use tokio_tungstenite::{connect_async, tungstenite::Message};
use tracing::{debug, info, warn};
use url::Url;

use crate::{
    registry::{EventHandler, SubscriberRegistry, Subscription},
    HostBridge,
};

/// Overlay-style bridge: actions are POSTed as JSON to `{base_url}/{action}`
/// and pushed events arrive as `{"action", "data"}` text frames on a
/// WebSocket.
pub struct HttpBridge {
    http: Client,
    base_url: Url,
    registry: Arc<SubscriberRegistry>,
}

impl HttpBridge {
    pub fn new(base_url: &str) -> Result<Self, BridgeError> {
        let base_url = Url::parse(base_url)
            .map_err(|err| BridgeError::transport(format!("invalid host url '{base_url}': {err}")))?;
        if base_url.cannot_be_a_base() {
            return Err(BridgeError::transport(format!(
                "host url '{base_url}' cannot carry action paths"
            )));
        }

        Ok(Self {
            http: Client::new(),
            base_url,
            registry: SubscriberRegistry::new(),
        })
    }

    pub fn action_url(&self, action: &str) -> Result<Url, BridgeError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| BridgeError::transport("host url cannot carry action paths"))?
            .pop_if_empty()
            .push(action);
        Ok(url)
    }

    /// Decodes one pushed frame and hands it to subscribers.
    pub fn deliver(&self, frame: &str) -> Result<usize, BridgeError> {
        let message: HostMessage =
            serde_json::from_str(frame).map_err(|err| BridgeError::Decode(err.to_string()))?;
        debug!(event = %message.action, "host event received");
        Ok(self.registry.dispatch(&message.action, &message.data))
    }

    /// Reads pushed events until the host closes the stream. Frames that do
    /// not decode are logged and skipped.
    pub async fn run_event_stream(&self, events_url: &str) -> Result<(), BridgeError> {
        let (mut stream, _) = connect_async(events_url)
            .await
            .map_err(|err| BridgeError::transport(format!("event stream connect failed: {err}")))?;
        info!(events_url, "host event stream connected");

        while let Some(message) = stream.next().await {
            let message = message
                .map_err(|err| BridgeError::transport(format!("event stream failed: {err}")))?;
            match message {
                Message::Text(frame) => {
                    if let Err(err) = self.deliver(&frame) {
                        warn!(%err, "skipping undecodable host event frame");
                    }
                }
                Message::Close(_) => break,
                _ => {}
            }
        }

        info!(events_url, "host event stream closed");
        Ok(())
    }
}

#[async_trait]
impl HostBridge for HttpBridge {
    async fn request(&self, action: &str, payload: Option<Value>) -> Result<Value, BridgeError> {
        let url = self.action_url(action)?;
        let body = payload.unwrap_or_else(|| Value::Object(Default::default()));

        let response = self
            .http
            .post(url)
            .json(&body)
            .send()
            .await
            .map_err(|err| {
                warn!(action, %err, "host request failed");
                BridgeError::transport(err.to_string())
            })?;

        let status = response.status();
        if !status.is_success() {
            warn!(action, status = status.as_u16(), "host answered with error status");
            return Err(BridgeError::Status {
                action: action.to_string(),
                status: status.as_u16(),
            });
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|err| BridgeError::transport(err.to_string()))?;
        debug!(action, reply_bytes = bytes.len(), "host request settled");

        Ok(decode_reply(&bytes))
    }

    fn subscribe(&self, event: &str, handler: EventHandler) -> Subscription {
        self.registry.subscribe(event, handler)
    }
}

/// Hosts commonly acknowledge with a bare string such as `ok`; anything that
/// is not JSON is kept as text instead of failing the request.
fn decode_reply(bytes: &[u8]) -> Value {
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Value::Null;
    }
    serde_json::from_slice(bytes)
        .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(bytes).into_owned()))
}
