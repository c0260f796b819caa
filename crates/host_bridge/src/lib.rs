//! Host bridge: the only I/O surface between the rental menu and the host
//! process. Two primitives are exposed, a request/response call and a named
//! event subscription.

use async_trait::async_trait;
use serde_json::Value;
use shared::error::BridgeError;

mod channel;
mod http;
mod registry;

pub use channel::{channel_bridge, ChannelBridge, HostEmitter, HostEndpoint, HostRequest};
pub use http::HttpBridge;
pub use registry::{EventHandler, SubscriberRegistry, Subscription};

#[async_trait]
pub trait HostBridge: Send + Sync {
    /// Sends `action` with an optional payload and waits for the host's reply.
    ///
    /// There is no built-in timeout: if the host never replies the future
    /// never completes. Errors are transport failures only.
    async fn request(&self, action: &str, payload: Option<Value>) -> Result<Value, BridgeError>;

    /// Registers `handler` for every pushed event named `event`. The handler
    /// stays registered until the returned [`Subscription`] is unsubscribed
    /// or dropped.
    fn subscribe(&self, event: &str, handler: EventHandler) -> Subscription;
}

#[cfg(test)]
#[path = "tests/registry_tests.rs"]
mod registry_tests;

#[cfg(test)]
#[path = "tests/channel_tests.rs"]
mod channel_tests;

#[cfg(test)]
#[path = "tests/http_tests.rs"]
mod http_tests;
