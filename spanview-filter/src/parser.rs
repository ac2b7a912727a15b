use spanview_protocol::filter::{
    FilterPredicate, InherentProperty, Input, ParseError, PredicateValue, Property,
    ValueOperator,
};
use spanview_protocol::span::Level;

use crate::duration::parse_duration_micros;

/// Parses whitespace-separated predicates such as `#level: >=WARN @user: "ada lovelace"`.
///
/// The result is all-or-nothing: the first invalid predicate fails the whole text.
pub fn parse_span_filter(text: &str) -> Result<Vec<FilterPredicate>, ParseError> {
    let mut cursor = Cursor::new(text);
    let mut predicates = Vec::new();

    loop {
        cursor.skip_whitespace();
        if cursor.is_done() {
            break;
        }
        predicates.push(cursor.predicate()?);
    }

    Ok(predicates)
}

/// Parses each predicate independently so that a partially edited filter keeps
/// its valid entries and reports the broken ones as [`Input::Invalid`].
pub fn parse_inputs(text: &str) -> Vec<Input> {
    let mut cursor = Cursor::new(text);
    let mut inputs = Vec::new();

    loop {
        cursor.skip_whitespace();
        if cursor.is_done() {
            break;
        }

        let begin = cursor.offset;
        match cursor.predicate() {
            Ok(predicate) => inputs.push(Input::valid(predicate)),
            Err(error) => {
                cursor.offset = begin;
                cursor.skip_token();
                inputs.push(Input::invalid(&text[begin..cursor.offset], &error));
            }
        }
    }

    inputs
}

struct Cursor<'a> {
    text: &'a str,
    offset: usize,
}

impl<'a> Cursor<'a> {
    fn new(text: &'a str) -> Self {
        Self { text, offset: 0 }
    }

    fn rest(&self) -> &'a str {
        &self.text[self.offset..]
    }

    fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    fn is_done(&self) -> bool {
        self.offset >= self.text.len()
    }

    fn bump(&mut self) -> Option<char> {
        let next = self.peek()?;
        self.offset += next.len_utf8();
        Some(next)
    }

    fn eat(&mut self, expected: &str) -> bool {
        if self.rest().starts_with(expected) {
            self.offset += expected.len();
            true
        } else {
            false
        }
    }

    fn skip_whitespace(&mut self) {
        while self.peek().is_some_and(char::is_whitespace) {
            self.bump();
        }
    }

    /// Skips one predicate worth of text: a property, its colon and a value.
    fn skip_token(&mut self) {
        let mut seen_colon = false;
        while let Some(next) = self.peek() {
            if next.is_whitespace() {
                let next_is_property = self
                    .rest()
                    .trim_start()
                    .starts_with(|c: char| c == '#' || c == '@');
                if seen_colon && !next_is_property {
                    self.skip_whitespace();
                    if self.is_done() {
                        break;
                    }
                    seen_colon = false;
                    continue;
                }
                break;
            }
            if next == ':' {
                seen_colon = true;
            }
            if next == '"' || next == '/' {
                let _ = self.delimited(next);
                continue;
            }
            self.bump();
        }
    }

    fn error(&self, message: impl Into<String>) -> ParseError {
        ParseError::new(message, self.offset)
    }

    fn predicate(&mut self) -> Result<FilterPredicate, ParseError> {
        let property = self.property()?;
        self.skip_whitespace_inline();
        if !self.eat(":") {
            return Err(self.error(format!("expected ':' after {}", property)));
        }
        self.skip_whitespace_inline();

        let negated = self.eat("!");
        let operator = self.operator();
        let value_offset = self.offset;
        let value = self.value()?;

        let predicate = FilterPredicate {
            property,
            negated,
            operator,
            value,
        };
        validate(&predicate).map_err(|message| ParseError::new(message, value_offset))?;
        Ok(predicate)
    }

    fn skip_whitespace_inline(&mut self) {
        while self.peek().is_some_and(|c| c == ' ' || c == '\t') {
            self.bump();
        }
    }

    fn property(&mut self) -> Result<Property, ParseError> {
        let start = self.offset;
        let sigil = match self.bump() {
            Some(sigil @ ('#' | '@')) => sigil,
            _ => {
                return Err(ParseError::new(
                    "predicate must start with '#' or '@'",
                    start,
                ))
            }
        };

        let name_start = self.offset;
        while self
            .peek()
            .is_some_and(|c| c.is_alphanumeric() || matches!(c, '_' | '.' | '-'))
        {
            self.bump();
        }
        let name = &self.text[name_start..self.offset];
        if name.is_empty() {
            return Err(ParseError::new("expected a property name", name_start));
        }

        if sigil == '@' {
            return Ok(Property::Attribute(name.to_string()));
        }

        InherentProperty::from_name(name)
            .map(Property::Inherent)
            .ok_or_else(|| ParseError::new(format!("unknown property #{}", name), name_start))
    }

    fn operator(&mut self) -> ValueOperator {
        if self.eat(">=") {
            ValueOperator::Gte
        } else if self.eat("<=") {
            ValueOperator::Lte
        } else if self.eat(">") {
            ValueOperator::Gt
        } else if self.eat("<") {
            ValueOperator::Lt
        } else {
            ValueOperator::Eq
        }
    }

    fn value(&mut self) -> Result<PredicateValue, ParseError> {
        match self.peek() {
            None => Err(self.error("expected a value")),
            Some('"') => self.delimited('"').map(PredicateValue::Quoted),
            Some('/') => {
                let start = self.offset;
                let pattern = self.delimited('/')?;
                regex::Regex::new(&pattern)
                    .map_err(|err| ParseError::new(format!("invalid regex: {}", err), start))?;
                Ok(PredicateValue::Regex(pattern))
            }
            Some(_) => {
                let start = self.offset;
                while self.peek().is_some_and(|c| !c.is_whitespace()) {
                    self.bump();
                }
                let raw = &self.text[start..self.offset];
                if raw.is_empty() {
                    return Err(ParseError::new("expected a value", start));
                }
                if raw.contains('*') {
                    Ok(PredicateValue::Wildcard(raw.to_string()))
                } else {
                    Ok(PredicateValue::Literal(raw.to_string()))
                }
            }
        }
    }

    /// Reads text between two `delimiter` characters, honouring backslash escapes.
    ///
    /// `\\` unescapes only inside quotes; regex bodies keep it for the regex engine.
    fn delimited(&mut self, delimiter: char) -> Result<String, ParseError> {
        let start = self.offset;
        self.bump();
        let mut out = String::new();
        loop {
            match self.bump() {
                None => {
                    return Err(ParseError::new(
                        format!("unterminated {}", delimiter),
                        start,
                    ))
                }
                Some('\\') => match self.bump() {
                    Some(escaped) if escaped == delimiter => out.push(escaped),
                    Some('\\') if delimiter == '"' => out.push('\\'),
                    Some(escaped) => {
                        out.push('\\');
                        out.push(escaped);
                    }
                    None => {
                        return Err(ParseError::new(
                            format!("unterminated {}", delimiter),
                            start,
                        ))
                    }
                },
                Some(c) if c == delimiter => return Ok(out),
                Some(c) => out.push(c),
            }
        }
    }
}

fn validate(predicate: &FilterPredicate) -> Result<(), String> {
    let is_literal = matches!(predicate.value, PredicateValue::Literal(_));
    if predicate.operator != ValueOperator::Eq && !is_literal {
        return Err(format!(
            "'{}' only applies to plain values",
            predicate.operator.symbol()
        ));
    }

    let Property::Inherent(inherent) = &predicate.property else {
        return Ok(());
    };
    let literal = match &predicate.value {
        PredicateValue::Literal(literal) => Some(literal.as_str()),
        _ => None,
    };

    match inherent {
        InherentProperty::Level => match literal {
            Some(name) if Level::from_name(name).is_some() => Ok(()),
            Some(name) => Err(format!("unknown level {:?}", name)),
            None => Err("#level expects a level name".to_string()),
        },
        InherentProperty::Duration => match literal.map(parse_duration_micros) {
            Some(Some(_)) => Ok(()),
            _ => Err("#duration expects a number with an optional unit (us, ms, s, m, h)".to_string()),
        },
        InherentProperty::Closed => match literal {
            Some("true" | "false") if predicate.operator == ValueOperator::Eq => Ok(()),
            _ => Err("#closed expects true or false".to_string()),
        },
        InherentProperty::Name | InherentProperty::Target => Ok(()),
    }
}
