use std::fmt;

use serde::{Deserialize, Serialize};
use spanview_protocol::filter::ParseError;
use spanview_protocol::span::Span;

use crate::error::ScreenError;

pub const DEFAULT_WIDTH: &str = "auto";

/// Built-in span fields that can be shown as a column.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum InherentColumn {
    Level,
    When,
    Duration,
    Name,
    Target,
    Closed,
}

impl InherentColumn {
    pub fn as_str(self) -> &'static str {
        match self {
            InherentColumn::Level => "level",
            InherentColumn::When => "when",
            InherentColumn::Duration => "duration",
            InherentColumn::Name => "name",
            InherentColumn::Target => "target",
            InherentColumn::Closed => "closed",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "level" => Some(InherentColumn::Level),
            "when" | "created_at" => Some(InherentColumn::When),
            "duration" => Some(InherentColumn::Duration),
            "name" => Some(InherentColumn::Name),
            "target" => Some(InherentColumn::Target),
            "closed" | "closed_at" => Some(InherentColumn::Closed),
            _ => None,
        }
    }
}

/// What one table column displays.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(tag = "kind", content = "name", rename_all = "snake_case")]
pub enum ColumnDef {
    Inherent(InherentColumn),
    Attribute(String),
}

impl ColumnDef {
    pub fn header(&self) -> String {
        self.to_string()
    }

    /// Text shown for `span` in this column.
    pub fn cell(&self, span: &Span) -> String {
        match self {
            ColumnDef::Inherent(InherentColumn::Level) => span.level.to_string(),
            ColumnDef::Inherent(InherentColumn::When) => {
                span.created_at.format("%Y-%m-%d %H:%M:%S%.3f").to_string()
            }
            ColumnDef::Inherent(InherentColumn::Duration) => match span.duration() {
                Some(duration) => format_micros(duration.num_microseconds().unwrap_or(i64::MAX)),
                None => "---".to_string(),
            },
            ColumnDef::Inherent(InherentColumn::Name) => span.name.clone(),
            ColumnDef::Inherent(InherentColumn::Target) => span.target.clone(),
            ColumnDef::Inherent(InherentColumn::Closed) => match span.closed_at {
                Some(closed) => closed.format("%Y-%m-%d %H:%M:%S%.3f").to_string(),
                None => "---".to_string(),
            },
            ColumnDef::Attribute(name) => match span.attribute(name) {
                Some(serde_json::Value::String(text)) => text.clone(),
                Some(value) => value.to_string(),
                None => String::new(),
            },
        }
    }
}

impl fmt::Display for ColumnDef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ColumnDef::Inherent(column) => write!(f, "#{}", column.as_str()),
            ColumnDef::Attribute(name) => write!(f, "@{}", name),
        }
    }
}

fn format_micros(micros: i64) -> String {
    match micros {
        m if m < 1_000 => format!("{}us", m),
        m if m < 1_000_000 => format!("{:.1}ms", m as f64 / 1_000.0),
        m if m < 60_000_000 => format!("{:.2}s", m as f64 / 1_000_000.0),
        m => format!("{:.1}m", m as f64 / 60_000_000.0),
    }
}

/// Parses column text: `#name` for an inherent field, `@name` or a bare name for an attribute.
pub fn parse_span_column(text: &str) -> Result<ColumnDef, ParseError> {
    let text = text.trim();
    if let Some(name) = text.strip_prefix('#') {
        return InherentColumn::from_name(name)
            .map(ColumnDef::Inherent)
            .ok_or_else(|| ParseError::new(format!("unknown inherent column '{}'", name), 1));
    }

    let name = text.strip_prefix('@').unwrap_or(text);
    if name.is_empty() {
        return Err(ParseError::new("expected a column name", text.len()));
    }
    Ok(ColumnDef::Attribute(name.to_string()))
}

/// Insertion point for a new column; `Append` is the conventional `-1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnIndex {
    At(usize),
    Append,
}

impl From<isize> for ColumnIndex {
    fn from(index: isize) -> Self {
        usize::try_from(index)
            .map(ColumnIndex::At)
            .unwrap_or(ColumnIndex::Append)
    }
}

/// Column definitions and their widths, kept the same length.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnLayout {
    columns: Vec<ColumnDef>,
    widths: Vec<String>,
    min: usize,
}

impl ColumnLayout {
    pub fn new(columns: Vec<ColumnDef>, min: usize) -> Self {
        let widths = vec![DEFAULT_WIDTH.to_string(); columns.len()];
        Self {
            columns,
            widths,
            min,
        }
    }

    pub fn default_spans(min: usize) -> Self {
        Self::new(
            vec![
                ColumnDef::Inherent(InherentColumn::Level),
                ColumnDef::Inherent(InherentColumn::When),
                ColumnDef::Inherent(InherentColumn::Duration),
                ColumnDef::Inherent(InherentColumn::Name),
            ],
            min,
        )
    }

    /// Column used when a column is added without a definition.
    pub fn default_column() -> ColumnDef {
        ColumnDef::Inherent(InherentColumn::Name)
    }

    pub fn columns(&self) -> &[ColumnDef] {
        &self.columns
    }

    pub fn widths(&self) -> &[String] {
        &self.widths
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn min(&self) -> usize {
        self.min
    }

    fn check(&self, index: usize) -> Result<(), ScreenError> {
        if index < self.columns.len() {
            Ok(())
        } else {
            Err(ScreenError::ColumnIndex {
                index,
                len: self.columns.len(),
            })
        }
    }

    pub fn update(&mut self, index: usize, def: ColumnDef) -> Result<(), ScreenError> {
        self.check(index)?;
        self.columns[index] = def;
        Ok(())
    }

    pub fn update_width(&mut self, index: usize, width: impl Into<String>) -> Result<(), ScreenError> {
        self.check(index)?;
        self.widths[index] = width.into();
        Ok(())
    }

    /// Moves the column at `index` so it ends up at position `to`.
    pub fn move_column(&mut self, index: usize, to: usize) -> Result<(), ScreenError> {
        self.check(index)?;
        self.check(to)?;
        let column = self.columns.remove(index);
        let width = self.widths.remove(index);
        self.columns.insert(to, column);
        self.widths.insert(to, width);
        Ok(())
    }

    /// Inserts before `index`, or at the end for [`ColumnIndex::Append`].
    ///
    /// Returns the position the column landed at.
    pub fn insert(&mut self, index: ColumnIndex, def: ColumnDef) -> Result<usize, ScreenError> {
        let position = match index {
            ColumnIndex::Append => self.columns.len(),
            ColumnIndex::At(index) if index <= self.columns.len() => index,
            ColumnIndex::At(index) => {
                return Err(ScreenError::ColumnIndex {
                    index,
                    len: self.columns.len(),
                })
            }
        };
        self.columns.insert(position, def);
        self.widths.insert(position, DEFAULT_WIDTH.to_string());
        Ok(position)
    }

    pub fn remove(&mut self, index: usize) -> Result<ColumnDef, ScreenError> {
        self.check(index)?;
        if self.columns.len() <= self.min {
            return Err(ScreenError::ColumnMinimum { min: self.min });
        }
        self.widths.remove(index);
        Ok(self.columns.remove(index))
    }
}
