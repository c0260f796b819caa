use serde::{Deserialize, Serialize};
use serde_json::{Number, Value};

use crate::domain::{Color, PaymentMethod, RentalOffer, Vehicle};

/// Host → UI: open (or refresh) the menu with a [`RentalOffer`] payload.
pub const OPEN_RENTAL_MENU: &str = "openRentalMenu";
/// UI → host: close the menu. No payload, acknowledged with any reply.
pub const CLOSE_RENTAL_MENU: &str = "closeRentalMenu";
/// UI → host: commit a rental with a [`RentVehicleRequest`].
pub const RENT_VEHICLE: &str = "rental:rentVehicle";
/// UI → host: return the currently rented vehicle.
pub const RETURN_VEHICLE: &str = "rental:returnVehicle";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RentVehicleRequest {
    pub model: String,
    /// Same number the offer carried, integer or not.
    pub price: Number,
    /// The offer payload exactly as received.
    pub rental: Value,
    /// Color key, not the display label.
    pub color: String,
    pub payment_method: PaymentMethod,
}

impl RentVehicleRequest {
    pub fn new(
        vehicle: &Vehicle,
        color: &Color,
        offer: &RentalOffer,
        payment_method: PaymentMethod,
    ) -> Self {
        Self {
            model: vehicle.model.clone(),
            price: vehicle.price.clone(),
            rental: offer.raw().clone(),
            color: color.value.clone(),
            payment_method,
        }
    }
}

/// Push message framing used by overlay hosts: `{"action": .., "data": ..}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HostMessage {
    pub action: String,
    #[serde(default)]
    pub data: Value,
}

impl HostMessage {
    pub fn new(action: impl Into<String>, data: Value) -> Self {
        Self {
            action: action.into(),
            data,
        }
    }
}
