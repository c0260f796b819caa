use std::fmt::Write as _;

use rental_menu::{MenuOperation, MenuView};
use serde_json::Number;

/// Whole amounts print without cents, whatever form the host used.
pub fn format_price(price: &Number) -> String {
    if price.is_u64() || price.is_i64() {
        return format!("${price}");
    }
    match price.as_f64() {
        Some(amount) if amount.fract() == 0.0 => format!("${amount:.0}"),
        Some(amount) => format!("${amount:.2}"),
        None => format!("${price}"),
    }
}

/// One-line status used by the observer after each state change.
pub fn status_line(view: &MenuView) -> String {
    if !view.visible {
        return "[menu closed]".to_string();
    }
    let mut line = format!(
        "[{}] {} vehicle(s)",
        view.active_category.as_deref().unwrap_or("-"),
        view.vehicles.len()
    );
    if let Some(vehicle) = &view.selected_vehicle {
        let _ = write!(line, " | {}", vehicle.model);
        if let Some(color) = &view.selected_color {
            let _ = write!(line, " ({})", color.name);
        }
    }
    let _ = write!(line, " | pay: {}", view.payment_method);
    if let Some(operation) = view.in_flight {
        let _ = write!(line, " | {operation}: {}", view.button_label(operation));
    }
    if let Some(banner) = &view.error_banner {
        let _ = write!(line, " | error: {banner}");
    }
    line
}

pub fn render_menu(view: &MenuView) -> String {
    if !view.visible {
        return "menu is closed".to_string();
    }

    let mut out = String::new();
    let tabs: Vec<String> = view
        .category_names
        .iter()
        .map(|name| {
            if view.active_category.as_deref() == Some(name.as_str()) {
                format!("[{name}]")
            } else {
                name.clone()
            }
        })
        .collect();
    let _ = writeln!(out, "categories: {}", tabs.join("  "));
    if !view.search_query.is_empty() {
        let _ = writeln!(out, "search: \"{}\"", view.search_query);
    }

    if view.vehicles.is_empty() {
        let _ = writeln!(out, "  (no vehicles)");
    }
    for vehicle in &view.vehicles {
        let marker = match &view.selected_vehicle {
            Some(selected) if selected.id == vehicle.id => '*',
            _ => ' ',
        };
        let _ = writeln!(
            out,
            " {marker} {:<10} {:<14} {:>8}  seats {}  speed {}  eff. {}",
            vehicle.id.to_string(),
            vehicle.model,
            format_price(&vehicle.price),
            vehicle.seats,
            vehicle.speed,
            vehicle.efficiency
        );
    }

    if let Some(vehicle) = &view.selected_vehicle {
        let colors: Vec<String> = vehicle
            .colors
            .iter()
            .map(|color| {
                let chosen = view
                    .selected_color
                    .as_ref()
                    .is_some_and(|selected| selected.value == color.value);
                if chosen {
                    format!("[{}={}]", color.name, color.value)
                } else {
                    format!("{}={}", color.name, color.value)
                }
            })
            .collect();
        let _ = writeln!(out, "colors: {}", colors.join(" "));
    }

    let _ = writeln!(out, "payment: {}", view.payment_method);
    if let Some(banner) = &view.error_banner {
        let _ = writeln!(out, "! {banner}");
    }
    let _ = write!(
        out,
        "<{}> <{}> <{}>",
        view.button_label(MenuOperation::Rent),
        view.button_label(MenuOperation::Return),
        view.button_label(MenuOperation::Close)
    );
    out
}
