use shared::domain::{Color, PaymentMethod, Vehicle};

use crate::{
    error::MenuOperation,
    session::MenuSession,
};

/// Read-only render projection of a [`MenuSession`].
#[derive(Debug, Clone, PartialEq)]
pub struct MenuView {
    pub visible: bool,
    pub category_names: Vec<String>,
    pub active_category: Option<String>,
    /// Active category filtered by the search query.
    pub vehicles: Vec<Vehicle>,
    pub selected_vehicle: Option<Vehicle>,
    pub selected_color: Option<Color>,
    pub payment_method: PaymentMethod,
    pub search_query: String,
    pub pending: bool,
    pub in_flight: Option<MenuOperation>,
    pub error_banner: Option<String>,
}

impl MenuView {
    pub fn from_session(session: &MenuSession) -> Self {
        Self {
            visible: session.visible,
            category_names: session
                .offer
                .as_ref()
                .map(|offer| offer.categories.iter().map(|c| c.name.clone()).collect())
                .unwrap_or_default(),
            active_category: session.active_category.clone(),
            vehicles: session.filtered_vehicles().into_iter().cloned().collect(),
            selected_vehicle: session.selected_vehicle.clone(),
            selected_color: session.selected_color.clone(),
            payment_method: session.payment_method,
            search_query: session.search_query.clone(),
            pending: session.pending,
            in_flight: session.in_flight(),
            error_banner: session.last_error_message(),
        }
    }

    /// Rent, return, close and the selection controls must only be offered
    /// while this holds.
    pub fn actions_enabled(&self) -> bool {
        self.visible && !self.pending
    }

    pub fn button_label(&self, operation: MenuOperation) -> &'static str {
        if self.pending {
            return "Processing...";
        }
        match operation {
            MenuOperation::Rent => "Rent Now",
            MenuOperation::Return => "Return Vehicle",
            MenuOperation::Close => "Close",
        }
    }
}
