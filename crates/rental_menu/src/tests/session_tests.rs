use serde_json::{json, Value};
use shared::domain::{Color, PaymentMethod, RentalOffer, VehicleId};

use crate::{MenuError, MenuOperation, MenuSession, MenuView, Settlement};

fn offer_payload() -> Value {
    json!({
        "coords": {"x": -1037.5, "y": -2737.6, "z": 20.2},
        "ped": {"name": "a_m_y_hipster_01"},
        "blip": {"sprite": 226},
        "spawnpoint": {"x": -1030.0, "y": -2730.0, "z": 20.0, "w": 240.0},
        "type": "airport",
        "categories": [
            {"name": "Bicycles", "vehicles": [
                {"id": "bikeA", "model": "Cruiser", "price": 25, "seats": 1,
                 "colors": [{"name": "Red", "value": "red"}, {"name": "Blue", "value": "blue"}],
                 "type": "bike"},
                {"id": "bikeB", "model": "Tri-Cycles Race Bike", "price": 40, "seats": 1,
                 "colors": [{"name": "White", "value": "white"}],
                 "type": "bike"}
            ]},
            {"name": "Cars", "vehicles": []}
        ]
    })
}

fn opened() -> MenuSession {
    let mut session = MenuSession::new();
    session.open(RentalOffer::from_payload(offer_payload()).offer);
    session
}

fn bike(session: &MenuSession, id: &str) -> shared::domain::Vehicle {
    session
        .offer
        .as_ref()
        .and_then(|offer| offer.find_vehicle(&VehicleId::from(id)))
        .cloned()
        .expect("vehicle in catalog")
}

#[test]
fn new_session_is_closed_with_defaults() {
    let session = MenuSession::new();
    assert!(!session.visible);
    assert!(session.offer.is_none());
    assert_eq!(session.payment_method, PaymentMethod::Cash);
    assert_eq!(session.search_query, "");
    assert!(!session.pending);
    assert!(session.last_error.is_none());
}

#[test]
fn open_activates_first_category() {
    let session = opened();
    assert!(session.visible);
    assert_eq!(session.active_category.as_deref(), Some("Bicycles"));
    assert_eq!(session.generation(), 1);
}

#[test]
fn open_with_empty_catalog_still_shows_menu() {
    let mut session = MenuSession::new();
    session.open(RentalOffer::from_payload(json!({"categories": [], "type": "car"})).offer);

    assert!(session.visible);
    assert!(session.active_category.is_none());
    assert!(session.filtered_vehicles().is_empty());
}

#[test]
fn reopen_replaces_offer_and_clears_selection() {
    let mut session = opened();
    let cruiser = bike(&session, "bikeA");
    session.select_vehicle(&cruiser).expect("select");
    session.select_category("Cars");
    session.last_error = Some(MenuError::MissingColor);

    session.open(
        RentalOffer::from_payload(json!({"categories": [{"name": "Boats", "vehicles": []}]}))
            .offer,
    );

    assert_eq!(session.active_category.as_deref(), Some("Boats"));
    assert!(session.selected_vehicle.is_none());
    assert!(session.selected_color.is_none());
    assert!(session.last_error.is_none());
    assert_eq!(session.generation(), 2);
}

#[test]
fn unknown_category_is_ignored_and_selection_survives_tab_switch() {
    let mut session = opened();
    let cruiser = bike(&session, "bikeA");
    session.select_vehicle(&cruiser).expect("select");

    assert!(!session.select_category("Planes"));
    assert_eq!(session.active_category.as_deref(), Some("Bicycles"));

    assert!(session.select_category("Cars"));
    assert_eq!(session.active_category.as_deref(), Some("Cars"));
    assert_eq!(session.selected_vehicle.as_ref(), Some(&cruiser));
    assert!(session.filtered_vehicles().is_empty());
}

#[test]
fn selecting_vehicle_defaults_to_first_color() {
    let mut session = opened();
    for id in ["bikeA", "bikeB"] {
        let vehicle = bike(&session, id);
        session.select_vehicle(&vehicle).expect("select");
        assert_eq!(session.selected_color.as_ref(), vehicle.colors.first());
    }
}

#[test]
fn vehicle_outside_catalog_is_rejected() {
    let mut session = opened();
    let mut stranger = bike(&session, "bikeA");
    stranger.model = "Not Offered".to_string();

    assert_eq!(
        session.select_vehicle(&stranger),
        Err(MenuError::VehicleNotInCatalog)
    );
    assert!(session.selected_vehicle.is_none());
    assert_eq!(session.last_error, Some(MenuError::VehicleNotInCatalog));

    assert_eq!(
        session.select_vehicle_by_id(&VehicleId::from("ghost")),
        Err(MenuError::VehicleNotInCatalog)
    );
}

#[test]
fn vehicle_without_colors_cannot_be_selected() {
    let mut session = MenuSession::new();
    session.open(
        RentalOffer::from_payload(json!({"categories": [{"name": "Cars", "vehicles": [
            {"id": 1, "model": "Panto", "price": 10, "colors": []}
        ]}]}))
        .offer,
    );

    assert_eq!(
        session.select_vehicle_by_id(&VehicleId::from("1")),
        Err(MenuError::VehicleWithoutColors)
    );
    assert!(session.selected_vehicle.is_none());
}

#[test]
fn foreign_color_is_rejected_and_current_color_kept() {
    let mut session = opened();
    let cruiser = bike(&session, "bikeA");
    session.select_vehicle(&cruiser).expect("select");

    let green = Color::new("Green", "green");
    assert_eq!(session.select_color(&green), Err(MenuError::ColorNotOffered));
    assert_eq!(session.selected_color.as_ref().map(|c| c.value.as_str()), Some("red"));
    assert_eq!(session.last_error, Some(MenuError::ColorNotOffered));

    assert_eq!(session.select_color_by_value("blue"), Ok(true));
    assert_eq!(session.selected_color.as_ref().map(|c| c.name.as_str()), Some("Blue"));
    assert!(session.last_error.is_none());
}

#[test]
fn color_without_vehicle_is_a_silent_no_op() {
    let mut session = opened();
    let before = session.clone();

    assert_eq!(session.select_color(&Color::new("Red", "red")), Ok(false));
    assert_eq!(session, before);
}

#[test]
fn search_filters_active_category_case_insensitively() {
    let mut session = opened();

    session.set_search_query("RACE");
    let models: Vec<_> = session
        .filtered_vehicles()
        .iter()
        .map(|vehicle| vehicle.model.clone())
        .collect();
    assert_eq!(models, vec!["Tri-Cycles Race Bike"]);

    session.set_search_query("");
    assert_eq!(session.filtered_vehicles().len(), 2);
}

#[test]
fn dangling_active_category_yields_empty_list() {
    let mut session = opened();
    session.active_category = Some("Removed".to_string());
    assert!(session.filtered_vehicles().is_empty());
}

#[test]
fn rent_requires_a_color() {
    let mut session = opened();
    assert_eq!(session.prepare_rent(), Err(MenuError::MissingColor));
    assert_eq!(
        session.last_error_message().as_deref(),
        Some("Please select a color for your vehicle")
    );
}

#[test]
fn rent_rejects_stale_color() {
    let mut session = opened();
    let cruiser = bike(&session, "bikeA");
    session.select_vehicle(&cruiser).expect("select");
    session.selected_color = Some(Color::new("White", "white"));

    assert_eq!(session.prepare_rent(), Err(MenuError::ColorNotOffered));
}

#[test]
fn rent_payload_echoes_offer_and_selection() {
    let mut session = opened();
    let cruiser = bike(&session, "bikeA");
    session.select_vehicle(&cruiser).expect("select");
    session.select_color_by_value("blue").expect("color");
    session.set_payment_method(PaymentMethod::Bank);

    let payload = serde_json::to_value(session.prepare_rent().expect("valid")).expect("encode");
    assert_eq!(
        payload,
        json!({
            "model": "Cruiser",
            "price": 25,
            "rental": offer_payload(),
            "color": "blue",
            "paymentMethod": "bank"
        })
    );
}

#[test]
fn begin_refuses_overlapping_requests() {
    let mut session = opened();
    let ticket = session.begin(MenuOperation::Close).expect("first request");
    assert!(session.pending);
    assert_eq!(session.in_flight(), Some(MenuOperation::Close));
    assert!(session.begin(MenuOperation::Close).is_none());
    assert!(session.begin(MenuOperation::Return).is_none());

    assert_eq!(session.settle(ticket, true), Settlement::Closed);
    assert!(!session.pending);
    assert!(!session.visible);
}

#[test]
fn failed_settlement_keeps_menu_open_with_operation_error() {
    let mut session = opened();
    let cruiser = bike(&session, "bikeA");
    session.select_vehicle(&cruiser).expect("select");
    let ticket = session.begin(MenuOperation::Return).expect("ticket");

    assert_eq!(session.settle(ticket, false), Settlement::Failed);
    assert!(session.visible);
    assert!(!session.pending);
    assert_eq!(session.selected_vehicle.as_ref(), Some(&cruiser));
    assert_eq!(
        session.last_error_message().as_deref(),
        Some("Failed to return vehicle. Please try again.")
    );
}

#[test]
fn settlement_after_refresh_only_clears_pending() {
    let mut session = opened();
    let ticket = session.begin(MenuOperation::Close).expect("ticket");

    session.open(
        RentalOffer::from_payload(json!({"categories": [{"name": "Boats", "vehicles": []}]}))
            .offer,
    );
    assert!(session.pending, "refresh must not clear the in-flight flag");

    assert_eq!(session.settle(ticket, true), Settlement::Superseded);
    assert!(!session.pending);
    assert!(session.visible);
    assert_eq!(session.active_category.as_deref(), Some("Boats"));
}

#[test]
fn rent_close_is_deferred_and_skipped_after_refresh() {
    let mut session = opened();
    let ticket = session.begin(MenuOperation::Rent).expect("ticket");
    assert_eq!(session.settle(ticket, true), Settlement::CloseAfterGrace);
    assert!(session.visible);

    let mut refreshed = session.clone();
    refreshed.open(RentalOffer::from_payload(offer_payload()).offer);
    assert!(!refreshed.finish_rent_close(ticket));
    assert!(refreshed.visible);

    assert!(session.finish_rent_close(ticket));
    assert!(!session.visible);
    assert!(session.offer.is_none());
    assert!(session.selected_vehicle.is_none());
}

#[test]
fn view_disables_actions_while_pending() {
    let mut session = opened();
    let view = MenuView::from_session(&session);
    assert!(view.actions_enabled());
    assert_eq!(view.category_names, vec!["Bicycles", "Cars"]);
    assert_eq!(view.button_label(MenuOperation::Rent), "Rent Now");

    session.begin(MenuOperation::Rent).expect("ticket");
    let view = MenuView::from_session(&session);
    assert!(!view.actions_enabled());
    assert_eq!(view.in_flight, Some(MenuOperation::Rent));
    assert_eq!(view.button_label(MenuOperation::Return), "Processing...");
}

#[test]
fn only_request_failures_are_not_validation_errors() {
    let mut session = opened();
    let rejected = session.prepare_rent().expect_err("nothing selected");
    assert!(rejected.is_validation());
    assert!(MenuError::ColorNotOffered.is_validation());

    let ticket = session.begin(MenuOperation::Rent).expect("ticket");
    session.settle(ticket, false);
    let failure = session.last_error.clone().expect("failure recorded");
    assert!(!failure.is_validation());
}
