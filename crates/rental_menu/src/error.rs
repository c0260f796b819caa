use std::fmt;

use shared::protocol::{CLOSE_RENTAL_MENU, RENT_VEHICLE, RETURN_VEHICLE};
use thiserror::Error;

/// Host-bound operations the menu can have in flight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MenuOperation {
    Rent,
    Return,
    Close,
}

impl MenuOperation {
    /// Wire action name sent to the host.
    pub fn action(self) -> &'static str {
        match self {
            Self::Rent => RENT_VEHICLE,
            Self::Return => RETURN_VEHICLE,
            Self::Close => CLOSE_RENTAL_MENU,
        }
    }

    pub fn failure_message(self) -> &'static str {
        match self {
            Self::Rent => "Failed to rent vehicle. Please try again.",
            Self::Return => "Failed to return vehicle. Please try again.",
            Self::Close => "Failed to close menu. Please try again.",
        }
    }
}

impl fmt::Display for MenuOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Rent => "rent",
            Self::Return => "return",
            Self::Close => "close",
        })
    }
}

/// Everything that can end up in the error banner. `Display` is the text
/// shown to the player.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MenuError {
    #[error("Please select a vehicle to rent")]
    NoVehicleSelected,
    #[error("Please select a color for your vehicle")]
    MissingColor,
    #[error("Invalid color selection for this vehicle")]
    ColorNotOffered,
    #[error("This vehicle is not part of the current offer")]
    VehicleNotInCatalog,
    #[error("This vehicle has no colors to choose from")]
    VehicleWithoutColors,
    #[error("{}", .operation.failure_message())]
    RequestFailed { operation: MenuOperation },
}

impl MenuError {
    pub fn is_validation(&self) -> bool {
        !matches!(self, Self::RequestFailed { .. })
    }
}
