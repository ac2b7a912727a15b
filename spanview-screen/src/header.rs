use spanview_core::CountThresholds;
use spanview_protocol::query::Counts;
use spanview_protocol::timespan::Timespan;

/// Styling band for the header's count display.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CountLevel {
    Normal,
    Warning,
    Danger,
}

/// Count text and styling for the screen header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CountBadge {
    pub text: String,
    pub level: CountLevel,
}

impl CountBadge {
    pub fn new(counts: Counts, thresholds: CountThresholds) -> Self {
        let level = if counts.value >= thresholds.danger {
            CountLevel::Danger
        } else if counts.value >= thresholds.warning {
            CountLevel::Warning
        } else {
            CountLevel::Normal
        };

        let text = if counts.is_capped {
            format!("{}+", counts.value)
        } else {
            counts.value.to_string()
        };

        Self { text, level }
    }
}

/// What the header shows: the window, the live toggle and the count estimate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeaderFrame {
    pub timespan: Timespan,
    pub live: bool,
    pub count: CountBadge,
    /// Manual navigation controls are disabled while live.
    pub time_controls_enabled: bool,
}
