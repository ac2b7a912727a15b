use std::env;
use std::io;

use tracing_subscriber::filter::EnvFilter;
use tracing_subscriber::fmt::SubscriberBuilder;

use crate::errors::{Result, SpanViewError};

/// Level used when neither the caller nor `RUST_LOG` names one.
pub const DEFAULT_LEVEL: &str = "warn";

/// Shape of the log lines written to stderr.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

/// Filter directive: an explicit level wins over `RUST_LOG`, which wins over [`DEFAULT_LEVEL`].
pub fn filter_directive(explicit: Option<&str>, from_env: Option<String>) -> String {
    match (explicit, from_env) {
        (Some(level), _) if !level.trim().is_empty() => level.trim().to_string(),
        (_, Some(directive)) if !directive.trim().is_empty() => directive,
        _ => DEFAULT_LEVEL.to_string(),
    }
}

/// Installs the global subscriber. Logs go to stderr so command output stays clean.
pub fn init_tracing(level: Option<&str>, format: LogFormat) -> Result<()> {
    let directive = filter_directive(level, env::var(EnvFilter::DEFAULT_ENV).ok());
    let filter = EnvFilter::try_new(&directive)
        .map_err(|err| SpanViewError::ConfigError(format!("log filter {:?}: {}", directive, err)))?;

    let builder = SubscriberBuilder::default()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(io::stderr);

    let installed = match format {
        LogFormat::Text => builder.with_ansi(atty::is(atty::Stream::Stderr)).try_init(),
        LogFormat::Json => builder.json().try_init(),
    };
    installed.map_err(|err| SpanViewError::GeneralError(err.to_string()))
}
