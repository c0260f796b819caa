//! Menu session state and its synchronous transitions.
//!
//! Every method here runs to completion under the controller's lock; the
//! asynchronous side (talking to the host) lives in the controller.

use shared::{
    domain::{Color, PaymentMethod, RentalOffer, Vehicle, VehicleId},
    protocol::RentVehicleRequest,
};

use crate::error::{MenuError, MenuOperation};

#[derive(Debug, Clone, PartialEq, Default)]
pub struct MenuSession {
    pub visible: bool,
    pub offer: Option<RentalOffer>,
    pub active_category: Option<String>,
    pub selected_vehicle: Option<Vehicle>,
    pub selected_color: Option<Color>,
    pub payment_method: PaymentMethod,
    pub search_query: String,
    pub pending: bool,
    pub last_error: Option<MenuError>,
    in_flight: Option<MenuOperation>,
    generation: u64,
}

/// Issued when a request starts; settlement hands it back.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestTicket {
    pub operation: MenuOperation,
    pub generation: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Settlement {
    /// Close or return acknowledged; the session is back to its closed baseline.
    Closed,
    /// Rent acknowledged; closing is deferred by the grace delay.
    CloseAfterGrace,
    /// The request failed and the error banner was set.
    Failed,
    /// A newer offer arrived while the request was in flight; only the
    /// pending flag was touched.
    Superseded,
}

impl MenuSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Which `openRentalMenu` the session currently reflects.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn in_flight(&self) -> Option<MenuOperation> {
        self.in_flight
    }

    pub fn last_error_message(&self) -> Option<String> {
        self.last_error.as_ref().map(ToString::to_string)
    }

    /// Applies an `openRentalMenu` event. Allowed in every state, including
    /// while a request is pending; the pending flag is left alone so the
    /// in-flight request still settles normally.
    pub fn open(&mut self, offer: RentalOffer) {
        self.generation += 1;
        self.active_category = offer.first_category_name().map(str::to_string);
        self.offer = Some(offer);
        self.selected_vehicle = None;
        self.selected_color = None;
        self.last_error = None;
        self.visible = true;
    }

    /// Back to the mount-time baseline. The offer generation survives so
    /// stale settlements can still be recognised.
    pub fn reset_to_closed(&mut self) {
        *self = Self {
            generation: self.generation,
            ..Self::default()
        };
    }

    /// Switches the active tab. Unknown names are ignored.
    pub fn select_category(&mut self, name: &str) -> bool {
        let known = self
            .offer
            .as_ref()
            .is_some_and(|offer| offer.category(name).is_some());
        if known {
            self.active_category = Some(name.to_string());
        }
        known
    }

    pub fn set_search_query(&mut self, text: impl Into<String>) {
        self.search_query = text.into();
    }

    pub fn select_vehicle(&mut self, vehicle: &Vehicle) -> Result<(), MenuError> {
        let in_catalog = self
            .offer
            .as_ref()
            .is_some_and(|offer| offer.contains_vehicle(vehicle));
        if !in_catalog {
            return Err(self.fail(MenuError::VehicleNotInCatalog));
        }
        self.pick(vehicle.clone())
    }

    pub fn select_vehicle_by_id(&mut self, id: &VehicleId) -> Result<(), MenuError> {
        let vehicle = self
            .offer
            .as_ref()
            .and_then(|offer| offer.find_vehicle(id))
            .cloned();
        match vehicle {
            Some(vehicle) => self.pick(vehicle),
            None => Err(self.fail(MenuError::VehicleNotInCatalog)),
        }
    }

    fn pick(&mut self, vehicle: Vehicle) -> Result<(), MenuError> {
        let Some(color) = vehicle.default_color().cloned() else {
            return Err(self.fail(MenuError::VehicleWithoutColors));
        };
        self.selected_color = Some(color);
        self.selected_vehicle = Some(vehicle);
        self.last_error = None;
        Ok(())
    }

    /// Changes the color of the selected vehicle.
    ///
    /// Without a selected vehicle this is a silent no-op (`Ok(false)`). A
    /// color the vehicle does not offer is rejected and the current color
    /// is kept.
    pub fn select_color(&mut self, color: &Color) -> Result<bool, MenuError> {
        self.select_color_by_value(&color.value)
    }

    pub fn select_color_by_value(&mut self, value: &str) -> Result<bool, MenuError> {
        let Some(vehicle) = self.selected_vehicle.as_ref() else {
            return Ok(false);
        };
        match vehicle.colors.iter().find(|offered| offered.value == value) {
            Some(offered) => {
                self.selected_color = Some(offered.clone());
                self.last_error = None;
                Ok(true)
            }
            None => Err(self.fail(MenuError::ColorNotOffered)),
        }
    }

    pub fn set_payment_method(&mut self, method: PaymentMethod) {
        self.payment_method = method;
    }

    /// Vehicles of the active category whose model contains the search
    /// query, ignoring case. Empty when the active category is unknown.
    pub fn filtered_vehicles(&self) -> Vec<&Vehicle> {
        let (Some(offer), Some(active)) = (self.offer.as_ref(), self.active_category.as_deref())
        else {
            return Vec::new();
        };
        let Some(category) = offer.category(active) else {
            return Vec::new();
        };
        category
            .vehicles
            .iter()
            .filter(|vehicle| vehicle.model_matches(&self.search_query))
            .collect()
    }

    /// Validates the current selection and builds the rent payload. On
    /// failure the banner is set and nothing should be sent.
    pub fn prepare_rent(&mut self) -> Result<RentVehicleRequest, MenuError> {
        let error = match (&self.selected_color, &self.selected_vehicle, &self.offer) {
            (None, _, _) => MenuError::MissingColor,
            (Some(_), None, _) | (Some(_), _, None) => MenuError::NoVehicleSelected,
            // The selected color may be left over from a vehicle with a
            // different color set.
            (Some(color), Some(vehicle), Some(_)) if !vehicle.offers_color(color) => {
                MenuError::ColorNotOffered
            }
            (Some(color), Some(vehicle), Some(offer)) => {
                return Ok(RentVehicleRequest::new(
                    vehicle,
                    color,
                    offer,
                    self.payment_method,
                ));
            }
        };
        Err(self.fail(error))
    }

    /// Marks `operation` as in flight. Returns `None` when another request
    /// is still pending.
    pub fn begin(&mut self, operation: MenuOperation) -> Option<RequestTicket> {
        if self.pending {
            return None;
        }
        self.pending = true;
        self.in_flight = Some(operation);
        self.last_error = None;
        Some(RequestTicket {
            operation,
            generation: self.generation,
        })
    }

    /// Applies the outcome of the request identified by `ticket`.
    pub fn settle(&mut self, ticket: RequestTicket, succeeded: bool) -> Settlement {
        self.pending = false;
        self.in_flight = None;

        if ticket.generation != self.generation {
            return Settlement::Superseded;
        }
        if !succeeded {
            self.last_error = Some(MenuError::RequestFailed {
                operation: ticket.operation,
            });
            return Settlement::Failed;
        }
        match ticket.operation {
            MenuOperation::Rent => Settlement::CloseAfterGrace,
            MenuOperation::Return | MenuOperation::Close => {
                self.reset_to_closed();
                Settlement::Closed
            }
        }
    }

    /// Deferred close after a successful rent. Skipped when the menu was
    /// refreshed, already closed, or is busy with a newer request.
    pub fn finish_rent_close(&mut self, ticket: RequestTicket) -> bool {
        if ticket.generation != self.generation || !self.visible || self.pending {
            return false;
        }
        self.reset_to_closed();
        true
    }

    fn fail(&mut self, error: MenuError) -> MenuError {
        self.last_error = Some(error.clone());
        error
    }
}
