use std::env;
use std::str::FromStr;

use chrono::Duration;

use crate::errors::{ConfigError, SpanViewError};

/// Runtime environment used by the process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Environment {
    #[default]
    Development,
    Staging,
    Production,
}

impl Environment {
    fn parse(value: &str) -> Self {
        match value.to_ascii_lowercase().as_str() {
            "production" | "prod" => Environment::Production,
            "staging" | "stage" => Environment::Staging,
            _ => Environment::Development,
        }
    }
}

/// Count levels at which the header switches to warning and danger styling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CountThresholds {
    pub warning: u64,
    pub danger: u64,
}

impl Default for CountThresholds {
    fn default() -> Self {
        Self {
            warning: 1000,
            danger: 5000,
        }
    }
}

impl FromStr for CountThresholds {
    type Err = ();

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let mut parts = raw.split(',').map(|part| part.trim().parse::<u64>());
        match (parts.next(), parts.next(), parts.next()) {
            (Some(Ok(warning)), Some(Ok(danger)), None) if warning <= danger => {
                Ok(Self { warning, danger })
            }
            _ => Err(()),
        }
    }
}

/// Tunables for the spans screen and the in-memory store behind it.
#[derive(Debug, Clone)]
pub struct ScreenConfig {
    pub environment: Environment,
    /// Rows requested per table page.
    pub page_size: usize,
    /// Maximum positioned spans requested by the graph.
    pub graph_limit: usize,
    pub count_thresholds: CountThresholds,
    /// Columns the table refuses to drop below.
    pub column_min: usize,
    /// Width of the initial window when none is supplied.
    pub default_window: Duration,
    /// Whether neighbour lookups wait for data to materialise.
    pub navigation_wait: bool,
    /// Whether view queries wait for data to materialise.
    pub view_wait: bool,
    /// Counts above this value are reported as capped.
    pub count_cap: u64,
}

impl Default for ScreenConfig {
    fn default() -> Self {
        Self {
            environment: Environment::Development,
            page_size: 50,
            graph_limit: 10_000,
            count_thresholds: CountThresholds::default(),
            column_min: 3,
            default_window: Duration::seconds(900),
            navigation_wait: false,
            view_wait: true,
            count_cap: 10_000,
        }
    }
}

impl ScreenConfig {
    /// Loads configuration from `SPANVIEW_*` variables in the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_env_with_prefix("SPANVIEW_")
    }

    /// Loads configuration from env vars prefixed with the provided value (e.g. `SPANVIEW_`).
    pub fn from_env_with_prefix(prefix: &str) -> Result<Self, ConfigError> {
        Self::from_lookup(prefix, |key| env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary key lookup. Unset keys keep their defaults.
    pub fn from_lookup<F>(prefix: &str, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let key = |suffix: &str| format!("{}{}", prefix, suffix);
        let defaults = Self::default();

        let environment = lookup(&key("ENV"))
            .map(|raw| Environment::parse(&raw))
            .unwrap_or_default();

        let page_size = parse_positive(&lookup, &key("PAGE_SIZE"))?.unwrap_or(defaults.page_size);
        let graph_limit =
            parse_positive(&lookup, &key("GRAPH_LIMIT"))?.unwrap_or(defaults.graph_limit);
        let column_min = parse_value(&lookup, &key("COLUMN_MIN"))?.unwrap_or(defaults.column_min);
        let count_thresholds = parse_value(&lookup, &key("COUNT_THRESHOLDS"))?
            .unwrap_or(defaults.count_thresholds);
        let window_key = key("WINDOW_SECS");
        let default_window = match parse_positive::<i64, _>(&lookup, &window_key)? {
            Some(secs) => Duration::try_seconds(secs).ok_or_else(|| ConfigError::InvalidValue {
                key: window_key.clone(),
                value: secs.to_string(),
            })?,
            None => defaults.default_window,
        };
        let navigation_wait =
            parse_value(&lookup, &key("NAVIGATION_WAIT"))?.unwrap_or(defaults.navigation_wait);
        let view_wait = parse_value(&lookup, &key("VIEW_WAIT"))?.unwrap_or(defaults.view_wait);
        let count_cap = parse_positive(&lookup, &key("COUNT_CAP"))?.unwrap_or(defaults.count_cap);

        Ok(Self {
            environment,
            page_size,
            graph_limit,
            count_thresholds,
            column_min,
            default_window,
            navigation_wait,
            view_wait,
            count_cap,
        })
    }

    /// Whether the process is running in production.
    pub fn is_production(&self) -> bool {
        matches!(self.environment, Environment::Production)
    }
}

fn parse_value<T, F>(lookup: &F, key: &str) -> Result<Option<T>, ConfigError>
where
    T: FromStr,
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        None => Ok(None),
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|_| ConfigError::InvalidValue {
                key: key.to_string(),
                value: raw,
            }),
    }
}

fn parse_positive<T, F>(lookup: &F, key: &str) -> Result<Option<T>, ConfigError>
where
    T: FromStr + PartialOrd + Default,
    F: Fn(&str) -> Option<String>,
{
    match parse_value::<T, F>(lookup, key)? {
        Some(value) if value <= T::default() => Err(ConfigError::InvalidValue {
            key: key.to_string(),
            value: lookup(key).unwrap_or_default(),
        }),
        other => Ok(other),
    }
}

/// Helper that loads config and converts to the canonical spanview error type.
pub fn load_screen_config() -> Result<ScreenConfig, SpanViewError> {
    Ok(ScreenConfig::from_env()?)
}
