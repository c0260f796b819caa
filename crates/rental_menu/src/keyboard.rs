/// Keys the menu reacts to. Everything else arrives as `Other`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Key {
    Escape,
    Other(String),
}

impl Key {
    /// Maps DOM-style key names (`"Escape"`, `"Enter"`, ...).
    pub fn from_name(name: &str) -> Self {
        match name {
            "Escape" | "Esc" => Self::Escape,
            other => Self::Other(other.to_string()),
        }
    }
}
