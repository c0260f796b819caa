use std::sync::{
    atomic::{AtomicU64, Ordering},
    Arc,
};

use host_bridge::{HostBridge, Subscription};
use parking_lot::Mutex;
use serde_json::Value;
use shared::{
    domain::{Color, PaymentMethod, RentalOffer, Vehicle, VehicleId},
    error::BridgeError,
    protocol::OPEN_RENTAL_MENU,
};
use tracing::{debug, info, warn};

use crate::{
    error::{MenuError, MenuOperation},
    keyboard::Key,
    session::{MenuSession, RequestTicket, Settlement},
    settings::ControllerSettings,
    view::MenuView,
};

pub type RenderCallback = Arc<dyn Fn(&MenuView) + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObserverId(u64);

/// How a rent/return/close call ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequestOutcome {
    /// The host acknowledged and the menu closed.
    Completed,
    /// The host acknowledged but a newer offer had arrived meanwhile.
    Superseded,
    /// Transport failure; the banner names the operation.
    Failed(MenuError),
    /// Local validation failed; the host was not contacted.
    Rejected(MenuError),
    /// Not issued: menu closed or another request in flight.
    Ignored,
}

/// Owns the menu session and drives it from user actions and host events.
///
/// The session lock is never held across an await, so host events and
/// other actions keep flowing while a request is outstanding.
pub struct RentalMenuController {
    bridge: Arc<dyn HostBridge>,
    settings: ControllerSettings,
    session: Mutex<MenuSession>,
    observers: Mutex<Vec<(ObserverId, RenderCallback)>>,
    next_observer_id: AtomicU64,
    subscription: Mutex<Option<Subscription>>,
}

impl RentalMenuController {
    /// Creates a controller and subscribes it to `openRentalMenu` before
    /// returning. The subscription is released by [`detach`](Self::detach)
    /// or when the controller is dropped.
    pub fn attach(bridge: Arc<dyn HostBridge>, settings: ControllerSettings) -> Arc<Self> {
        let controller = Arc::new(Self {
            bridge,
            settings,
            session: Mutex::new(MenuSession::new()),
            observers: Mutex::new(Vec::new()),
            next_observer_id: AtomicU64::new(1),
            subscription: Mutex::new(None),
        });

        let weak = Arc::downgrade(&controller);
        let subscription = controller.bridge.subscribe(
            OPEN_RENTAL_MENU,
            Arc::new(move |payload: &Value| {
                if let Some(controller) = weak.upgrade() {
                    controller.on_open_event(payload.clone());
                }
            }),
        );
        *controller.subscription.lock() = Some(subscription);
        debug!("rental menu controller attached");
        controller
    }

    /// Stops listening for host events. Safe to call more than once.
    pub fn detach(&self) {
        if let Some(subscription) = self.subscription.lock().take() {
            subscription.unsubscribe();
            debug!("rental menu controller detached");
        }
    }

    pub fn is_attached(&self) -> bool {
        self.subscription.lock().is_some()
    }

    pub fn settings(&self) -> &ControllerSettings {
        &self.settings
    }

    pub fn view(&self) -> MenuView {
        MenuView::from_session(&self.session.lock())
    }

    pub fn session(&self) -> MenuSession {
        self.session.lock().clone()
    }

    pub fn add_observer(&self, callback: RenderCallback) -> ObserverId {
        let id = ObserverId(self.next_observer_id.fetch_add(1, Ordering::Relaxed));
        self.observers.lock().push((id, callback));
        id
    }

    pub fn remove_observer(&self, id: ObserverId) -> bool {
        let mut observers = self.observers.lock();
        let before = observers.len();
        observers.retain(|(existing, _)| *existing != id);
        observers.len() != before
    }

    fn on_open_event(&self, payload: Value) {
        let parsed = RentalOffer::from_payload(payload);
        if let Some(issue) = &parsed.catalog_issue {
            warn!(%issue, "openRentalMenu carried no usable catalog; showing empty menu");
        }
        for entry in &parsed.skipped {
            warn!(%entry, "skipping unreadable catalog entry");
        }

        let categories = parsed.offer.categories.len();
        self.mutate(|session| {
            if session.pending {
                debug!("offer refreshed while a request is in flight");
            }
            session.open(parsed.offer);
            info!(
                categories,
                active_category = session.active_category.as_deref().unwrap_or_default(),
                generation = session.generation(),
                "rental menu opened"
            );
        });
    }

    pub fn select_category(&self, name: &str) -> bool {
        self.mutate(|session| session.select_category(name))
    }

    pub fn set_search_query(&self, text: impl Into<String>) {
        let text = text.into();
        self.mutate(|session| session.set_search_query(text));
    }

    pub fn select_vehicle(&self, vehicle: &Vehicle) -> Result<(), MenuError> {
        self.mutate(|session| session.select_vehicle(vehicle))
    }

    pub fn select_vehicle_by_id(&self, id: &VehicleId) -> Result<(), MenuError> {
        self.mutate(|session| session.select_vehicle_by_id(id))
    }

    pub fn select_color(&self, color: &Color) -> Result<bool, MenuError> {
        self.mutate(|session| session.select_color(color))
    }

    pub fn select_color_by_value(&self, value: &str) -> Result<bool, MenuError> {
        self.mutate(|session| session.select_color_by_value(value))
    }

    pub fn set_payment_method(&self, method: PaymentMethod) {
        self.mutate(|session| session.set_payment_method(method));
    }

    pub async fn request_rent(&self) -> RequestOutcome {
        let started = self.mutate(|session| {
            if !session.visible || session.pending {
                return Err(RequestOutcome::Ignored);
            }
            let payload = session.prepare_rent().map_err(RequestOutcome::Rejected)?;
            let ticket = session.begin(MenuOperation::Rent).ok_or(RequestOutcome::Ignored)?;
            Ok((ticket, payload))
        });
        let (ticket, payload) = match started {
            Ok(started) => started,
            Err(outcome) => {
                if let RequestOutcome::Rejected(err) = &outcome {
                    info!(%err, "rent rejected by validation");
                }
                return outcome;
            }
        };

        info!(
            model = %payload.model,
            color = %payload.color,
            payment_method = %payload.payment_method,
            "requesting rental"
        );
        let payload = match serde_json::to_value(&payload) {
            Ok(payload) => payload,
            Err(err) => {
                warn!(%err, "failed to encode rent payload");
                return self.finish(
                    ticket,
                    Err(BridgeError::transport(format!("rent payload not encodable: {err}"))),
                );
            }
        };
        let result = self.send(ticket.operation, Some(payload)).await;
        let outcome = self.finish(ticket, result);

        if outcome == RequestOutcome::Completed {
            // The acknowledged rental hides the menu only after the grace
            // delay; nothing is locked meanwhile.
            tokio::time::sleep(self.settings.rent_close_grace).await;
            let (closed, still_visible) =
                self.mutate(|session| (session.finish_rent_close(ticket), session.visible));
            if closed {
                info!("rental menu closed after rental");
            } else if !still_visible {
                debug!("menu already closed during rent grace delay");
            } else {
                debug!("menu changed during rent grace delay; staying open");
                return RequestOutcome::Superseded;
            }
        }
        outcome
    }

    pub async fn request_return(&self) -> RequestOutcome {
        self.run_simple(MenuOperation::Return).await
    }

    /// Close action and Escape key. While a close (or any other request) is
    /// pending, repeated calls send nothing.
    pub async fn request_close(&self) -> RequestOutcome {
        self.run_simple(MenuOperation::Close).await
    }

    pub async fn handle_key(&self, key: Key) -> RequestOutcome {
        match key {
            Key::Escape => self.request_close().await,
            Key::Other(_) => RequestOutcome::Ignored,
        }
    }

    async fn run_simple(&self, operation: MenuOperation) -> RequestOutcome {
        let ticket = self.mutate(|session| {
            if !session.visible {
                return None;
            }
            session.begin(operation)
        });
        let Some(ticket) = ticket else {
            debug!(%operation, "request ignored: menu closed or busy");
            return RequestOutcome::Ignored;
        };

        info!(%operation, "requesting host action");
        let result = self.send(operation, None).await;
        self.finish(ticket, result)
    }

    async fn send(
        &self,
        operation: MenuOperation,
        payload: Option<Value>,
    ) -> Result<Value, BridgeError> {
        let action = operation.action();
        let request = self.bridge.request(action, payload);
        match self.settings.request_timeout {
            None => request.await,
            Some(limit) => match tokio::time::timeout(limit, request).await {
                Ok(result) => result,
                Err(_) => Err(BridgeError::TimedOut {
                    action: action.to_string(),
                }),
            },
        }
    }

    fn finish(&self, ticket: RequestTicket, result: Result<Value, BridgeError>) -> RequestOutcome {
        let operation = ticket.operation;
        let failure = result.as_ref().err().cloned();
        let settlement = self.mutate(|session| session.settle(ticket, failure.is_none()));

        match (settlement, failure) {
            (Settlement::Closed, _) => {
                info!(%operation, "host acknowledged; rental menu closed");
                RequestOutcome::Completed
            }
            (Settlement::CloseAfterGrace, _) => {
                info!(%operation, "host acknowledged");
                RequestOutcome::Completed
            }
            (Settlement::Failed, Some(err)) => {
                warn!(%operation, %err, "host request failed");
                RequestOutcome::Failed(MenuError::RequestFailed { operation })
            }
            (Settlement::Failed, None) => {
                RequestOutcome::Failed(MenuError::RequestFailed { operation })
            }
            (Settlement::Superseded, failure) => {
                match failure {
                    Some(err) => warn!(%operation, %err, "stale request failed after offer refresh"),
                    None => debug!(%operation, "stale request settled after offer refresh"),
                }
                RequestOutcome::Superseded
            }
        }
    }

    /// Runs one state transition and then notifies observers with the
    /// committed state. Observers run after the lock is released.
    fn mutate<R>(&self, transition: impl FnOnce(&mut MenuSession) -> R) -> R {
        let (result, view) = {
            let mut session = self.session.lock();
            let result = transition(&mut session);
            (result, MenuView::from_session(&session))
        };
        self.notify(&view);
        result
    }

    fn notify(&self, view: &MenuView) {
        let observers: Vec<RenderCallback> = self
            .observers
            .lock()
            .iter()
            .map(|(_, callback)| Arc::clone(callback))
            .collect();
        for observer in observers {
            observer(view);
        }
    }
}

impl Drop for RentalMenuController {
    fn drop(&mut self) {
        self.detach();
    }
}
