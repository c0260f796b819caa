//! Rental menu interaction layer: session state, transition rules and the
//! controller that connects them to the host bridge.

pub mod controller;
pub mod error;
pub mod keyboard;
pub mod session;
pub mod settings;
pub mod view;

pub use controller::{ObserverId, RenderCallback, RentalMenuController, RequestOutcome};
pub use error::{MenuError, MenuOperation};
pub use keyboard::Key;
pub use session::{MenuSession, RequestTicket, Settlement};
pub use settings::{ControllerSettings, DEFAULT_RENT_CLOSE_GRACE};
pub use view::MenuView;

#[cfg(test)]
#[path = "tests/session_tests.rs"]
mod session_tests;

#[cfg(test)]
#[path = "tests/controller_tests.rs"]
mod controller_tests;
