use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Number, Value};

/// Vehicle identifier as sent by the host. Hosts emit either strings or
/// numbers here, so both are accepted and kept in textual form.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct VehicleId(pub String);

impl<'de> Deserialize<'de> for VehicleId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        match Value::deserialize(deserializer)? {
            Value::String(raw) => Ok(Self(raw)),
            Value::Number(raw) => Ok(Self(raw.to_string())),
            other => Err(serde::de::Error::custom(format!(
                "vehicle id must be a string or number, got {other}"
            ))),
        }
    }
}

impl fmt::Display for VehicleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for VehicleId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Color {
    pub name: String,
    pub value: String,
}

impl Color {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// Display-only fields tolerate `null` as well as absence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Vehicle {
    pub id: VehicleId,
    pub model: String,
    /// Kept in the host's numeric form so it is echoed back unchanged.
    pub price: Number,
    #[serde(default, deserialize_with = "null_as_default")]
    pub image: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub seats: u32,
    #[serde(default, deserialize_with = "null_as_default")]
    pub speed: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub efficiency: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub colors: Vec<Color>,
    #[serde(rename = "type", default, deserialize_with = "null_as_default")]
    pub kind: String,
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

impl Vehicle {
    /// Color preselected when the vehicle is picked.
    pub fn default_color(&self) -> Option<&Color> {
        self.colors.first()
    }

    /// Membership is decided by color key, the only part the host reads back.
    pub fn offers_color(&self, color: &Color) -> bool {
        self.colors.iter().any(|offered| offered.value == color.value)
    }

    pub fn model_matches(&self, query: &str) -> bool {
        self.model.to_lowercase().contains(&query.to_lowercase())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Category {
    pub name: String,
    #[serde(default)]
    pub vehicles: Vec<Vehicle>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    #[default]
    Cash,
    Bank,
}

impl PaymentMethod {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Cash => "cash",
            Self::Bank => "bank",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "cash" => Some(Self::Cash),
            "bank" => Some(Self::Bank),
            _ => None,
        }
    }
}

impl fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Catalog and session context pushed by the host with `openRentalMenu`.
///
/// Only `categories` and `type` are interpreted. `coords`, `ped`, `blip` and
/// `spawnpoint` belong to the host and are kept as raw JSON; the complete
/// payload is retained in [`RentalOffer::raw`] and echoed back unmodified
/// when a rental is committed.
#[derive(Debug, Clone, PartialEq)]
pub struct RentalOffer {
    pub coords: Value,
    pub ped: Value,
    pub blip: Value,
    pub spawnpoint: Value,
    pub categories: Vec<Category>,
    pub kind: String,
    raw: Value,
}

/// Outcome of reading an offer payload.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedOffer {
    pub offer: RentalOffer,
    /// Set when `categories` was missing or not a list and an empty catalog
    /// was substituted.
    pub catalog_issue: Option<String>,
    /// Categories and vehicles left out because they could not be read.
    /// The rest of the catalog is kept.
    pub skipped: Vec<String>,
}

impl RentalOffer {
    /// Reads an offer from an event payload. Never fails: a payload whose
    /// `categories` is absent or not a list yields an empty catalog and a
    /// description of the problem. Unreadable categories or vehicles are
    /// dropped one at a time and listed in [`ParsedOffer::skipped`].
    pub fn from_payload(raw: Value) -> ParsedOffer {
        let field = |name: &str| raw.get(name).cloned().unwrap_or(Value::Null);

        let mut skipped = Vec::new();
        let (categories, catalog_issue) = match raw.get("categories") {
            None | Some(Value::Null) => (Vec::new(), Some("offer has no categories".to_string())),
            Some(Value::Array(entries)) => (read_categories(entries, &mut skipped), None),
            Some(other) => (
                Vec::new(),
                Some(format!("categories is not a list: {}", json_kind(other))),
            ),
        };

        let kind = raw
            .get("type")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();

        ParsedOffer {
            offer: Self {
                coords: field("coords"),
                ped: field("ped"),
                blip: field("blip"),
                spawnpoint: field("spawnpoint"),
                categories,
                kind,
                raw,
            },
            catalog_issue,
            skipped,
        }
    }

    /// The payload exactly as the host sent it.
    pub fn raw(&self) -> &Value {
        &self.raw
    }

    pub fn category(&self, name: &str) -> Option<&Category> {
        self.categories.iter().find(|category| category.name == name)
    }

    pub fn first_category_name(&self) -> Option<&str> {
        self.categories.first().map(|category| category.name.as_str())
    }

    pub fn vehicles(&self) -> impl Iterator<Item = &Vehicle> {
        self.categories
            .iter()
            .flat_map(|category| category.vehicles.iter())
    }

    pub fn find_vehicle(&self, id: &VehicleId) -> Option<&Vehicle> {
        self.vehicles().find(|vehicle| &vehicle.id == id)
    }

    pub fn contains_vehicle(&self, vehicle: &Vehicle) -> bool {
        self.vehicles().any(|candidate| candidate == vehicle)
    }
}

fn read_categories(entries: &[Value], skipped: &mut Vec<String>) -> Vec<Category> {
    let mut categories = Vec::with_capacity(entries.len());
    for (index, entry) in entries.iter().enumerate() {
        let Some(name) = entry.get("name").and_then(Value::as_str) else {
            skipped.push(format!("category #{index} has no name"));
            continue;
        };

        let mut vehicles = Vec::new();
        match entry.get("vehicles") {
            None | Some(Value::Null) => {}
            Some(Value::Array(list)) => {
                for (position, vehicle) in list.iter().enumerate() {
                    match Vehicle::deserialize(vehicle) {
                        Ok(vehicle) => vehicles.push(vehicle),
                        Err(err) => {
                            skipped.push(format!("{name} vehicle #{position}: {err}"));
                        }
                    }
                }
            }
            Some(other) => skipped.push(format!(
                "{name} vehicles is not a list: {}",
                json_kind(other)
            )),
        }

        categories.push(Category {
            name: name.to_string(),
            vehicles,
        });
    }
    categories
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
