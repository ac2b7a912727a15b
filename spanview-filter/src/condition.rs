use serde::{Deserialize, Serialize};
use serde_json::Value;
use spanview_protocol::span::Span;

/// Dotted path used to inspect attributes on a [`Span`].
///
/// The full path is tried as a literal key first, so flat keys such as
/// `http.method` resolve before nested objects are walked.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct FieldPath(String);

impl FieldPath {
    pub fn new(path: impl Into<String>) -> Self {
        Self(path.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    fn segments(&self) -> impl Iterator<Item = &str> {
        self.0.split('.').filter(|segment| !segment.is_empty())
    }

    /// Resolves the path against the span's attributes.
    pub fn resolve<'a>(&self, span: &'a Span) -> Option<&'a Value> {
        if let Some(value) = span.attribute(&self.0) {
            return Some(value);
        }

        let mut segments = self.segments();
        let root = span.attribute(segments.next()?)?;
        locate(root, segments)
    }
}

fn locate<'a, 's>(root: &'a Value, segments: impl Iterator<Item = &'s str>) -> Option<&'a Value> {
    let mut current = root;
    for segment in segments {
        match current {
            Value::Object(map) => current = map.get(segment)?,
            Value::Array(items) => {
                let index: usize = segment.parse().ok()?;
                current = items.get(index)?;
            }
            _ => return None,
        }
    }
    Some(current)
}

impl From<&str> for FieldPath {
    fn from(value: &str) -> Self {
        FieldPath::new(value)
    }
}

impl From<String> for FieldPath {
    fn from(value: String) -> Self {
        FieldPath::new(value)
    }
}

/// Text rendering of an attribute value as it is matched by text predicates.
pub(crate) fn value_text(value: &Value) -> Option<String> {
    match value {
        Value::String(text) => Some(text.clone()),
        Value::Number(number) => Some(number.to_string()),
        Value::Bool(flag) => Some(flag.to_string()),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}
