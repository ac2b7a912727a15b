//! Filter predicate grammar for spans.
//!
//! Filters are written as whitespace-separated predicates: `#` selects an
//! inherent property (`level`, `name`, `target`, `duration`, `closed`) and `@`
//! selects an attribute. Values may be plain, `"quoted"`, `/regex/` or contain
//! `*` wildcards, and may be prefixed by `!` and a comparison operator.

mod condition;
mod duration;
mod error;
mod matcher;
mod parser;

use async_trait::async_trait;
use spanview_protocol::filter::{FilterPredicate, ParseError};
use spanview_protocol::source::FilterParser;

pub use condition::FieldPath;
pub use duration::parse_duration_micros;
pub use error::FilterError;
pub use matcher::SpanMatcher;
pub use parser::{parse_inputs, parse_span_filter};

/// [`FilterParser`] backed by the built-in grammar.
#[derive(Debug, Default, Clone, Copy)]
pub struct SpanFilterParser;

#[async_trait]
impl FilterParser for SpanFilterParser {
    async fn parse_span_filter(&self, text: &str) -> Result<Vec<FilterPredicate>, ParseError> {
        parse_span_filter(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use spanview_protocol::span::{Level, Span};

    #[tokio::test]
    async fn parser_trait_and_matcher_agree() {
        let predicates = SpanFilterParser
            .parse_span_filter("#level: >=WARN")
            .await
            .expect("valid filter");
        let matcher = SpanMatcher::compile(&predicates).expect("compiles");

        let warn = Span::builder("slow", Utc::now()).level(Level::Warn).build();
        let info = Span::builder("fast", Utc::now()).level(Level::Info).build();
        assert!(matcher.matches(&warn));
        assert!(!matcher.matches(&info));
    }

    #[tokio::test]
    async fn parser_trait_reports_errors() {
        let err = SpanFilterParser
            .parse_span_filter("#level: loud")
            .await
            .unwrap_err();
        assert!(err.message.contains("loud"));
    }
}
