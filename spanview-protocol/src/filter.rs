use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Invalid filter text, reported at the filter input.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[error("{message} (at offset {offset})")]
pub struct ParseError {
    pub message: String,
    /// Byte offset into the parsed text where the problem was detected.
    pub offset: usize,
}

impl ParseError {
    pub fn new(message: impl Into<String>, offset: usize) -> Self {
        Self {
            message: message.into(),
            offset,
        }
    }
}

/// Properties every span carries regardless of its attributes.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum InherentProperty {
    Level,
    Name,
    Target,
    /// Closed duration in microseconds.
    Duration,
    Closed,
}

impl InherentProperty {
    pub fn as_str(self) -> &'static str {
        match self {
            InherentProperty::Level => "level",
            InherentProperty::Name => "name",
            InherentProperty::Target => "target",
            InherentProperty::Duration => "duration",
            InherentProperty::Closed => "closed",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "level" => Some(InherentProperty::Level),
            "name" => Some(InherentProperty::Name),
            "target" => Some(InherentProperty::Target),
            "duration" => Some(InherentProperty::Duration),
            "closed" => Some(InherentProperty::Closed),
            _ => None,
        }
    }
}

/// What a predicate inspects on a span.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(tag = "kind", content = "name", rename_all = "snake_case")]
pub enum Property {
    Inherent(InherentProperty),
    Attribute(String),
}

impl fmt::Display for Property {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Property::Inherent(inherent) => write!(f, "#{}", inherent.as_str()),
            Property::Attribute(name) => write!(f, "@{}", name),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "snake_case")]
pub enum ValueOperator {
    #[default]
    Eq,
    Gt,
    Gte,
    Lt,
    Lte,
}

impl ValueOperator {
    pub fn symbol(self) -> &'static str {
        match self {
            ValueOperator::Eq => "",
            ValueOperator::Gt => ">",
            ValueOperator::Gte => ">=",
            ValueOperator::Lt => "<",
            ValueOperator::Lte => "<=",
        }
    }
}

/// Right-hand side of a predicate, in the form it was written.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(tag = "form", content = "value", rename_all = "snake_case")]
pub enum PredicateValue {
    Literal(String),
    Quoted(String),
    Regex(String),
    Wildcard(String),
}

impl fmt::Display for PredicateValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PredicateValue::Literal(value) | PredicateValue::Wildcard(value) => f.write_str(value),
            PredicateValue::Quoted(value) => write!(f, "\"{}\"", escape_quoted(value)),
            PredicateValue::Regex(value) => write!(f, "/{}/", value.replace('/', "\\/")),
        }
    }
}

/// Writes `value` as filter text that parses back to exactly `value`.
///
/// Plain words are left bare; anything else is quoted with `"` and `\` escaped.
pub fn quote_value(value: &str) -> String {
    let plain = !value.is_empty()
        && value
            .chars()
            .all(|c| c.is_alphanumeric() || matches!(c, '.' | '_' | '-'));
    if plain {
        value.to_string()
    } else {
        format!("\"{}\"", escape_quoted(value))
    }
}

fn escape_quoted(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        if matches!(c, '"' | '\\') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

/// Validated, structured filter condition. A filter is the conjunction of its predicates.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct FilterPredicate {
    pub property: Property,
    #[serde(default)]
    pub negated: bool,
    #[serde(default)]
    pub operator: ValueOperator,
    pub value: PredicateValue,
}

impl FilterPredicate {
    pub fn new(property: Property, value: PredicateValue) -> Self {
        Self {
            property,
            negated: false,
            operator: ValueOperator::Eq,
            value,
        }
    }

    pub fn negate(mut self) -> Self {
        self.negated = !self.negated;
        self
    }

    pub fn with_operator(mut self, operator: ValueOperator) -> Self {
        self.operator = operator;
        self
    }
}

impl fmt::Display for FilterPredicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {}{}{}",
            self.property,
            if self.negated { "!" } else { "" },
            self.operator.symbol(),
            self.value
        )
    }
}

/// Raw, editable filter entry: either a validated predicate or text that failed to parse.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(tag = "input", rename_all = "snake_case")]
pub enum Input {
    Valid { predicate: FilterPredicate },
    Invalid { text: String, error: String },
}

impl Input {
    pub fn valid(predicate: FilterPredicate) -> Self {
        Input::Valid { predicate }
    }

    pub fn invalid(text: impl Into<String>, error: &ParseError) -> Self {
        Input::Invalid {
            text: text.into(),
            error: error.to_string(),
        }
    }

    pub fn predicate(&self) -> Option<&FilterPredicate> {
        match self {
            Input::Valid { predicate } => Some(predicate),
            Input::Invalid { .. } => None,
        }
    }

    pub fn is_valid(&self) -> bool {
        matches!(self, Input::Valid { .. })
    }

    /// Text shown in the filter input for this entry.
    pub fn text(&self) -> String {
        match self {
            Input::Valid { predicate } => predicate.to_string(),
            Input::Invalid { text, .. } => text.clone(),
        }
    }
}

impl From<FilterPredicate> for Input {
    fn from(predicate: FilterPredicate) -> Self {
        Input::valid(predicate)
    }
}
