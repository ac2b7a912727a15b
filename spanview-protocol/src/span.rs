use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// Point in time used for span boundaries and windows.
pub type Timestamp = DateTime<Utc>;

/// Stable identity of a span across re-fetches.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(transparent)]
pub struct SpanId(pub Uuid);

impl SpanId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SpanId {
    fn default() -> Self {
        Self::new()
    }
}

impl FromStr for SpanId {
    type Err = uuid::Error;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(raw.trim()).map(SpanId)
    }
}

impl fmt::Display for SpanId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Severity a span was recorded with.
#[derive(
    Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord, Default,
)]
#[serde(rename_all = "snake_case")]
pub enum Level {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

impl Level {
    pub fn as_str(self) -> &'static str {
        match self {
            Level::Trace => "TRACE",
            Level::Debug => "DEBUG",
            Level::Info => "INFO",
            Level::Warn => "WARN",
            Level::Error => "ERROR",
        }
    }

    /// Case-insensitive lookup that also accepts the common `warning` spelling.
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "trace" => Some(Level::Trace),
            "debug" => Some(Level::Debug),
            "info" => Some(Level::Info),
            "warn" | "warning" => Some(Level::Warn),
            "error" => Some(Level::Error),
            _ => None,
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A time-bounded unit of recorded work.
///
/// `closed_at` is absent while the span is still open. Once closed a span
/// never changes.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Span {
    pub id: SpanId,
    pub created_at: Timestamp,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub closed_at: Option<Timestamp>,
    #[serde(default)]
    pub level: Level,
    pub name: String,
    #[serde(default)]
    pub target: String,
    #[serde(default)]
    pub attributes: BTreeMap<String, Value>,
}

impl Span {
    /// Create a span with the minimum required information.
    pub fn new(name: impl Into<String>, created_at: Timestamp) -> Self {
        SpanBuilder::new(name, created_at).build()
    }

    pub fn builder(name: impl Into<String>, created_at: Timestamp) -> SpanBuilder {
        SpanBuilder::new(name, created_at)
    }

    pub fn is_open(&self) -> bool {
        self.closed_at.is_none()
    }

    /// Elapsed time between creation and close, `None` while open.
    pub fn duration(&self) -> Option<Duration> {
        self.closed_at.map(|closed| closed - self.created_at)
    }

    /// Whether the span's extent touches `[start, end]`; open spans extend forever.
    pub fn intersects(&self, start: Option<Timestamp>, end: Option<Timestamp>) -> bool {
        let starts_before_end = end.map_or(true, |end| self.created_at <= end);
        let ends_after_start = match (start, self.closed_at) {
            (Some(start), Some(closed)) => closed >= start,
            _ => true,
        };
        starts_before_end && ends_after_start
    }

    pub fn attribute(&self, key: &str) -> Option<&Value> {
        self.attributes.get(key)
    }

    /// Identity comparison that ignores any field refreshed since the span was fetched.
    pub fn same_span(&self, other: &Span) -> bool {
        self.id == other.id
    }
}

/// Builder helper to create spans with many optional fields.
pub struct SpanBuilder {
    span: Span,
}

impl SpanBuilder {
    pub fn new(name: impl Into<String>, created_at: Timestamp) -> Self {
        let span = Span {
            id: SpanId::new(),
            created_at,
            closed_at: None,
            level: Level::Info,
            name: name.into(),
            target: String::new(),
            attributes: BTreeMap::new(),
        };

        Self { span }
    }

    pub fn id(mut self, id: SpanId) -> Self {
        self.span.id = id;
        self
    }

    pub fn closed_at(mut self, closed_at: Timestamp) -> Self {
        self.span.closed_at = Some(closed_at);
        self
    }

    pub fn lasting(mut self, duration: Duration) -> Self {
        self.span.closed_at = Some(self.span.created_at + duration);
        self
    }

    pub fn level(mut self, level: Level) -> Self {
        self.span.level = level;
        self
    }

    pub fn target(mut self, target: impl Into<String>) -> Self {
        self.span.target = target.into();
        self
    }

    pub fn attribute(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.span.attributes.insert(key.into(), value.into());
        self
    }

    pub fn build(self) -> Span {
        self.span
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(minute: u32) -> Timestamp {
        Utc.with_ymd_and_hms(2024, 1, 1, 12, minute, 0).unwrap()
    }

    #[test]
    fn closed_span_intersects_overlapping_window() {
        let span = Span::builder("db.query", at(10)).closed_at(at(20)).build();

        assert!(span.intersects(Some(at(15)), Some(at(30))));
        assert!(span.intersects(Some(at(20)), None));
        assert!(!span.intersects(Some(at(21)), None));
        assert!(!span.intersects(None, Some(at(9))));
    }

    #[test]
    fn span_id_parses_its_display_form() {
        let id = SpanId::new();
        assert_eq!(id.to_string().parse::<SpanId>(), Ok(id));
        assert!("not-an-id".parse::<SpanId>().is_err());
    }

    #[test]
    fn open_span_extends_to_the_future() {
        let span = Span::new("request", at(10));

        assert!(span.is_open());
        assert!(span.duration().is_none());
        assert!(span.intersects(Some(at(59)), None));
    }

    #[test]
    fn deserializes_with_defaults() {
        let span: Span = serde_json::from_value(serde_json::json!({
            "id": "6c3f1c1e-1111-4c4c-8a8a-000000000001",
            "created_at": "2024-01-01T12:00:00Z",
            "name": "startup",
        }))
        .expect("span");

        assert_eq!(span.level, Level::Info);
        assert!(span.attributes.is_empty());
        assert!(span.closed_at.is_none());
    }

    #[test]
    fn level_names_are_case_insensitive() {
        assert_eq!(Level::from_name("Warning"), Some(Level::Warn));
        assert_eq!(Level::from_name("ERROR"), Some(Level::Error));
        assert_eq!(Level::from_name("fatal"), None);
        assert!(Level::Warn > Level::Info);
    }
}
