use serde_json::Value;
use spanview_protocol::filter::{quote_value, FilterPredicate};
use spanview_protocol::span::Span;

use super::{AsyncCallback, ColumnCallback, FrameProps, SpanCallback};
use crate::error::ScreenError;

pub struct DetailCallbacks {
    pub on_select: SpanCallback,
    pub on_add_predicate: AsyncCallback<String>,
    pub on_add_column: ColumnCallback,
}

/// One line of the detail pane with the predicate and column it offers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetailField {
    pub label: String,
    pub value: String,
    /// Filter text selecting spans with the same value.
    pub predicate: String,
    pub in_filter: bool,
    /// Column text showing this field in the table.
    pub column: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DetailFrame {
    pub span: Span,
    pub fields: Vec<DetailField>,
    /// Whether the span overlaps the current window.
    pub in_window: bool,
}

/// Inspector for the selected span. Holds no data of its own.
pub struct DetailPane {
    callbacks: DetailCallbacks,
}

impl DetailPane {
    pub fn new(callbacks: DetailCallbacks) -> Self {
        Self { callbacks }
    }

    /// Shown if and only if something is selected.
    pub fn frame(&self, props: &FrameProps<'_>) -> Option<DetailFrame> {
        let span = props.selected?;
        let fields = fields(span)
            .into_iter()
            .map(|(property, label, value)| {
                let predicate = format!("{}: {}", property, quote_value(&value));
                DetailField {
                    in_filter: in_filter(props.filter, &predicate),
                    column: property,
                    label,
                    value,
                    predicate,
                }
            })
            .collect();

        Some(DetailFrame {
            span: span.clone(),
            fields,
            in_window: span.intersects(Some(props.timespan.start()), Some(props.timespan.end())),
        })
    }

    pub fn close(&self) {
        (self.callbacks.on_select)(None);
    }

    pub async fn add_predicate(&self, text: impl Into<String>) -> Result<(), ScreenError> {
        (self.callbacks.on_add_predicate)(text.into()).await
    }

    pub fn add_column(&self, text: impl Into<String>) -> Result<(), ScreenError> {
        (self.callbacks.on_add_column)(text.into())
    }
}

fn fields(span: &Span) -> Vec<(String, String, String)> {
    let mut fields = vec![
        ("#level".to_string(), "level".to_string(), span.level.to_string()),
        ("#name".to_string(), "name".to_string(), span.name.clone()),
    ];
    if !span.target.is_empty() {
        fields.push(("#target".to_string(), "target".to_string(), span.target.clone()));
    }
    fields.push((
        "#closed".to_string(),
        "closed".to_string(),
        (!span.is_open()).to_string(),
    ));

    fields.extend(span.attributes.iter().map(|(key, value)| {
        let text = match value {
            Value::String(text) => text.clone(),
            other => other.to_string(),
        };
        (format!("@{}", key), key.clone(), text)
    }));
    fields
}

fn in_filter(filter: &[FilterPredicate], predicate: &str) -> bool {
    filter.iter().any(|existing| existing.to_string() == predicate)
}

#[cfg(test)]
mod tests {
    use super::*;

    use spanview_filter::parse_span_filter;
    use spanview_protocol::filter::PredicateValue;
    use test_case::test_case;

    #[test_case("WARN" ; "plain word")]
    #[test_case("GET /users" ; "spaces")]
    #[test_case(r"C:\tmp" ; "backslash")]
    #[test_case(r#"say "hi""# ; "inner quotes")]
    #[test_case("line\nbreak\ttab" ; "control characters")]
    fn offered_predicate_parses_back_to_the_value(value: &str) {
        let text = format!("@field: {}", quote_value(value));
        let predicates = parse_span_filter(&text).expect("offered predicate parses");

        let parsed = match &predicates[0].value {
            PredicateValue::Literal(parsed) | PredicateValue::Quoted(parsed) => parsed.clone(),
            other => panic!("unexpected value form {:?}", other),
        };
        assert_eq!(parsed, value);
        assert!(in_filter(&predicates, &text));
    }
}
