use std::time::Duration;

/// Delay between a confirmed rental and hiding the menu, so host-side
/// effects land first.
pub const DEFAULT_RENT_CLOSE_GRACE: Duration = Duration::from_millis(50);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControllerSettings {
    pub rent_close_grace: Duration,
    /// `None` waits for the host indefinitely.
    pub request_timeout: Option<Duration>,
}

impl Default for ControllerSettings {
    fn default() -> Self {
        Self {
            rent_close_grace: DEFAULT_RENT_CLOSE_GRACE,
            request_timeout: None,
        }
    }
}
