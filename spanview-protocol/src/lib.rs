pub mod filter;
pub mod query;
pub mod source;
pub mod span;
pub mod timespan;

pub mod prelude {
    pub use crate::filter::{
        quote_value, FilterPredicate, Input, InherentProperty, ParseError, PredicateValue,
        Property, ValueOperator,
    };
    pub use crate::query::{Counts, Order, PartialCountFilter, PartialFilter, PositionedSpan};
    pub use crate::source::{FilterParser, SpanSource};
    pub use crate::span::{Level, Span, SpanBuilder, SpanId, Timestamp};
    pub use crate::timespan::{InvalidTimespan, Timespan};
}
