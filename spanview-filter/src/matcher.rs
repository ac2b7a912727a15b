use std::cmp::Ordering;

use regex::Regex;
use serde_json::Value;
use spanview_protocol::filter::{
    FilterPredicate, InherentProperty, PredicateValue, Property, ValueOperator,
};
use spanview_protocol::span::{Level, Span};
use tracing::trace;

use crate::condition::{value_text, FieldPath};
use crate::duration::parse_duration_micros;
use crate::error::FilterError;

/// Runtime evaluator for the conjunction of a filter's predicates.
#[derive(Debug, Default, Clone)]
pub struct SpanMatcher {
    predicates: Vec<CompiledPredicate>,
}

#[derive(Debug, Clone)]
struct CompiledPredicate {
    subject: Subject,
    negated: bool,
    operator: ValueOperator,
    value: CompiledValue,
}

#[derive(Debug, Clone)]
enum Subject {
    Level,
    Name,
    Target,
    Duration,
    Closed,
    Attribute(FieldPath),
}

#[derive(Debug, Clone)]
enum CompiledValue {
    Text(String),
    Pattern(Regex),
}

impl SpanMatcher {
    /// Compiles predicates once so regex and wildcard values are not rebuilt per span.
    pub fn compile(filter: &[FilterPredicate]) -> Result<Self, FilterError> {
        let predicates = filter
            .iter()
            .map(CompiledPredicate::compile)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { predicates })
    }

    /// Whether the matcher accepts every span.
    pub fn is_empty(&self) -> bool {
        self.predicates.is_empty()
    }

    /// Evaluate a span against every predicate.
    pub fn matches(&self, span: &Span) -> bool {
        self.predicates.iter().all(|predicate| {
            let matched = predicate.evaluate(span) != predicate.negated;
            if !matched {
                trace!(span_id = %span.id, "span rejected by predicate");
            }
            matched
        })
    }
}

impl CompiledPredicate {
    fn compile(predicate: &FilterPredicate) -> Result<Self, FilterError> {
        let subject = match &predicate.property {
            Property::Inherent(InherentProperty::Level) => Subject::Level,
            Property::Inherent(InherentProperty::Name) => Subject::Name,
            Property::Inherent(InherentProperty::Target) => Subject::Target,
            Property::Inherent(InherentProperty::Duration) => Subject::Duration,
            Property::Inherent(InherentProperty::Closed) => Subject::Closed,
            Property::Attribute(name) => Subject::Attribute(FieldPath::new(name.as_str())),
        };

        let value = match &predicate.value {
            PredicateValue::Literal(text) | PredicateValue::Quoted(text) => {
                CompiledValue::Text(text.clone())
            }
            PredicateValue::Regex(pattern) => CompiledValue::Pattern(
                Regex::new(pattern).map_err(|err| FilterError::invalid_regex(pattern, &err))?,
            ),
            PredicateValue::Wildcard(pattern) => {
                let anchored = wildcard_to_regex(pattern);
                CompiledValue::Pattern(
                    Regex::new(&anchored).map_err(|err| FilterError::invalid_regex(pattern, &err))?,
                )
            }
        };

        Ok(Self {
            subject,
            negated: predicate.negated,
            operator: predicate.operator,
            value,
        })
    }

    fn evaluate(&self, span: &Span) -> bool {
        match &self.subject {
            Subject::Level => self.evaluate_level(span.level),
            Subject::Name => self.evaluate_text(&span.name),
            Subject::Target => self.evaluate_text(&span.target),
            Subject::Duration => match (span.duration(), self.literal()) {
                (Some(duration), Some(literal)) => {
                    match (duration.num_microseconds(), parse_duration_micros(literal)) {
                        (Some(actual), Some(expected)) => self.compare(actual.cmp(&expected)),
                        _ => false,
                    }
                }
                _ => false,
            },
            Subject::Closed => match self.literal() {
                Some("true") => !span.is_open(),
                Some("false") => span.is_open(),
                _ => false,
            },
            Subject::Attribute(path) => path
                .resolve(span)
                .map(|value| self.evaluate_value(value))
                .unwrap_or(false),
        }
    }

    fn literal(&self) -> Option<&str> {
        match &self.value {
            CompiledValue::Text(text) => Some(text),
            CompiledValue::Pattern(_) => None,
        }
    }

    fn compare(&self, ordering: Ordering) -> bool {
        match self.operator {
            ValueOperator::Eq => ordering == Ordering::Equal,
            ValueOperator::Gt => ordering == Ordering::Greater,
            ValueOperator::Gte => ordering != Ordering::Less,
            ValueOperator::Lt => ordering == Ordering::Less,
            ValueOperator::Lte => ordering != Ordering::Greater,
        }
    }

    fn evaluate_level(&self, level: Level) -> bool {
        match self.literal().and_then(Level::from_name) {
            Some(expected) => self.compare(level.cmp(&expected)),
            None => false,
        }
    }

    fn evaluate_text(&self, actual: &str) -> bool {
        match &self.value {
            CompiledValue::Pattern(pattern) => pattern.is_match(actual),
            CompiledValue::Text(expected) => self.compare(actual.cmp(expected.as_str())),
        }
    }

    fn evaluate_value(&self, value: &Value) -> bool {
        if let (Some(actual), Some(expected)) = (
            value.as_f64(),
            self.literal().and_then(|text| text.parse::<f64>().ok()),
        ) {
            return actual
                .partial_cmp(&expected)
                .map(|ordering| self.compare(ordering))
                .unwrap_or(false);
        }

        match value_text(value) {
            Some(text) => self.evaluate_text(&text),
            None => false,
        }
    }
}

fn wildcard_to_regex(pattern: &str) -> String {
    let escaped: Vec<String> = pattern.split('*').map(regex::escape).collect();
    format!("^{}$", escaped.join(".*"))
}
