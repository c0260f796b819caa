use std::sync::{
    atomic::{AtomicU64, Ordering},
    Arc,
};

use async_trait::async_trait;
use serde_json::Value;
use shared::error::BridgeError;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, warn};

use crate::{
    registry::{EventHandler, SubscriberRegistry, Subscription},
    HostBridge,
};

/// In-process bridge. Requests travel to a [`HostEndpoint`] over a channel
/// and each one carries its own reply slot, so replies can never be matched
/// to the wrong caller regardless of the order the host answers in.
pub struct ChannelBridge {
    outbound: mpsc::UnboundedSender<HostRequest>,
    registry: Arc<SubscriberRegistry>,
    next_request_id: AtomicU64,
}

/// Host side of a [`ChannelBridge`]: receives requests and pushes events.
pub struct HostEndpoint {
    requests: mpsc::UnboundedReceiver<HostRequest>,
    registry: Arc<SubscriberRegistry>,
}

/// Cloneable event pusher detached from the request queue, so events can
/// be emitted while another task drains requests.
#[derive(Clone)]
pub struct HostEmitter {
    registry: Arc<SubscriberRegistry>,
}

/// One outstanding request as seen by the host.
#[derive(Debug)]
pub struct HostRequest {
    pub id: u64,
    pub action: String,
    pub payload: Option<Value>,
    reply: oneshot::Sender<Value>,
}

pub fn channel_bridge() -> (ChannelBridge, HostEndpoint) {
    let (outbound, requests) = mpsc::unbounded_channel();
    let registry = SubscriberRegistry::new();

    (
        ChannelBridge {
            outbound,
            registry: Arc::clone(&registry),
            next_request_id: AtomicU64::new(1),
        },
        HostEndpoint { requests, registry },
    )
}

impl HostRequest {
    /// Completes the request. Returns `false` when the caller stopped waiting.
    pub fn reply(self, value: Value) -> bool {
        let delivered = self.reply.send(value).is_ok();
        if !delivered {
            debug!(request_id = self.id, action = %self.action, "reply discarded: requester gone");
        }
        delivered
    }

    /// Plain acknowledgement, the reply every menu action expects.
    pub fn ack(self) -> bool {
        self.reply(Value::String("ok".to_string()))
    }
}

impl HostEndpoint {
    /// Next request from the UI, or `None` once the bridge is dropped.
    pub async fn next_request(&mut self) -> Option<HostRequest> {
        self.requests.recv().await
    }

    pub fn try_next_request(&mut self) -> Option<HostRequest> {
        self.requests.try_recv().ok()
    }

    /// Pushes an event; subscribers run before this returns.
    pub fn emit(&self, event: &str, payload: Value) -> usize {
        self.registry.dispatch(event, &payload)
    }

    pub fn emitter(&self) -> HostEmitter {
        HostEmitter {
            registry: Arc::clone(&self.registry),
        }
    }
}

impl HostEmitter {
    pub fn emit(&self, event: &str, payload: Value) -> usize {
        self.registry.dispatch(event, &payload)
    }
}

#[async_trait]
impl HostBridge for ChannelBridge {
    async fn request(&self, action: &str, payload: Option<Value>) -> Result<Value, BridgeError> {
        let id = self.next_request_id.fetch_add(1, Ordering::Relaxed);
        let (reply_tx, reply_rx) = oneshot::channel();

        self.outbound
            .send(HostRequest {
                id,
                action: action.to_string(),
                payload,
                reply: reply_tx,
            })
            .map_err(|_| {
                warn!(request_id = id, action, "host endpoint closed; request not sent");
                BridgeError::Disconnected
            })?;
        debug!(request_id = id, action, "host request sent");

        let reply = reply_rx.await.map_err(|_| BridgeError::ReplyDropped {
            action: action.to_string(),
        })?;
        debug!(request_id = id, action, "host request settled");
        Ok(reply)
    }

    fn subscribe(&self, event: &str, handler: EventHandler) -> Subscription {
        self.registry.subscribe(event, handler)
    }
}
