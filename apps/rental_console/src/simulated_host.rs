use std::{fs, path::Path, time::Duration};

use anyhow::Context;
use host_bridge::{HostEmitter, HostEndpoint};
use serde_json::Value;
use shared::protocol::OPEN_RENTAL_MENU;
use tokio::task::JoinHandle;
use tracing::info;

const SAMPLE_OFFER: &str = include_str!("../assets/sample_offer.json");

/// Loads the offer pushed by `open`, from `path` or the bundled sample.
pub fn load_offer(path: Option<&Path>) -> anyhow::Result<Value> {
    match path {
        Some(path) => {
            let raw = fs::read_to_string(path)
                .with_context(|| format!("failed to read offer '{}'", path.display()))?;
            serde_json::from_str(&raw)
                .with_context(|| format!("offer '{}' is not valid JSON", path.display()))
        }
        None => serde_json::from_str(SAMPLE_OFFER).context("bundled sample offer is not valid JSON"),
    }
}

/// Stands in for the game host: acknowledges every request after
/// `reply_delay` and pushes the offer on demand.
pub struct SimulatedHost {
    emitter: HostEmitter,
    offer: Value,
    worker: JoinHandle<()>,
}

impl SimulatedHost {
    pub fn spawn(mut endpoint: HostEndpoint, offer: Value, reply_delay: Duration) -> Self {
        let emitter = endpoint.emitter();
        let worker = tokio::spawn(async move {
            while let Some(request) = endpoint.next_request().await {
                info!(id = request.id, action = %request.action, "simulated host received request");
                tokio::spawn(async move {
                    tokio::time::sleep(reply_delay).await;
                    request.ack();
                });
            }
        });

        Self {
            emitter,
            offer,
            worker,
        }
    }

    /// Returns how many subscribers received the offer.
    pub fn open_menu(&self) -> usize {
        self.emitter.emit(OPEN_RENTAL_MENU, self.offer.clone())
    }
}

impl Drop for SimulatedHost {
    fn drop(&mut self) {
        self.worker.abort();
    }
}
