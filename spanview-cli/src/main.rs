use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration as StdDuration;

use anyhow::{bail, Context, Result};
use chrono::{DateTime, Utc};
use clap::{Args, Parser, Subcommand};
use spanview_core::logging::{init_tracing, LogFormat};
use spanview_core::serde_utils::to_pretty_json;
use spanview_core::{config::load_screen_config, ScreenConfig};
use spanview_filter::{parse_inputs, SpanFilterParser};
use spanview_protocol::span::{Span, SpanId};
use spanview_protocol::timespan::Timespan;
use spanview_screen::ScreenCoordinator;
use spanview_store::MemoryStore;
use tracing::info;

mod render;

use render::{
    print_detail, print_filter_problems, print_graph, print_header, print_table, print_timestamp,
};

#[derive(Parser)]
#[command(name = "spanview")]
#[command(about = "Browse recorded spans by filter and time window", long_about = None)]
struct Cli {
    /// Newline-delimited JSON file of spans
    #[arg(long, global = true, env = "SPANVIEW_SPANS")]
    spans: Option<PathBuf>,
    #[command(flatten)]
    window: WindowArgs,
    /// Log level; overrides RUST_LOG when given
    #[arg(long, global = true)]
    log_level: Option<String>,
    /// Write logs to stderr as JSON lines
    #[arg(long, global = true, default_value_t = false)]
    log_json: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct WindowArgs {
    /// Filter predicates, e.g. `#level: >=WARN @user: ada`
    #[arg(long, global = true, default_value = "")]
    filter: String,
    /// Window start (RFC3339)
    #[arg(long, global = true)]
    from: Option<DateTime<Utc>>,
    /// Window end (RFC3339)
    #[arg(long, global = true)]
    to: Option<DateTime<Utc>>,
}

#[derive(Subcommand)]
enum Commands {
    /// List the spans in the window
    List {
        /// Load every page instead of only the first
        #[arg(long, default_value_t = false)]
        all: bool,
        /// Extra columns to show, e.g. `@user`
        #[arg(long = "column")]
        columns: Vec<String>,
    },
    /// Draw the spans in the window as lanes
    Graph,
    /// Show the number of spans in the window
    Count,
    /// Show one span in detail
    Show {
        /// Span id
        id: SpanId,
        /// Print the span as JSON instead of the detail pane
        #[arg(long, default_value_t = false)]
        json: bool,
    },
    /// Creation time of the span before a timestamp
    Before { at: DateTime<Utc> },
    /// Creation time of the span after a timestamp
    After { at: DateTime<Utc> },
    /// Follow the most recent spans
    Tail {
        #[arg(long, default_value_t = 5)]
        ticks: u32,
        #[arg(long = "interval-ms", default_value_t = 1000)]
        interval_ms: u64,
    },
    /// Show version information
    Version,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let format = if cli.log_json {
        LogFormat::Json
    } else {
        LogFormat::Text
    };
    init_tracing(cli.log_level.as_deref(), format)?;

    if let Commands::Version = cli.command {
        println!("spanview v{}", env!("CARGO_PKG_VERSION"));
        return Ok(());
    }

    let config = load_screen_config().context("invalid SPANVIEW_* configuration")?;
    let path = cli
        .spans
        .context("no spans file given; pass --spans or set SPANVIEW_SPANS")?;
    let store = MemoryStore::from_ndjson_file(&path, config.count_cap).await?;

    let inputs = parse_inputs(&cli.window.filter);
    print_filter_problems(&inputs);

    let screen = ScreenCoordinator::builder(Arc::new(store.clone()), Arc::new(SpanFilterParser))
        .config(config.clone())
        .filter(inputs)
        .build();
    let window = resolve_window(&screen, &cli.window, &config).await?;
    screen.set_timespan(window).await?;
    info!(start = %window.start(), end = %window.end(), "window resolved");

    match cli.command {
        Commands::List { all, columns } => {
            for column in &columns {
                screen.add_column(column)?;
            }
            screen.refresh().await;
            if all {
                while screen.table().has_more() {
                    if screen.load_more().await == 0 {
                        break;
                    }
                }
            }
            print_header(&screen.header_frame());
            print_table(&screen.table_frame());
        }
        Commands::Graph => {
            screen.refresh().await;
            print_header(&screen.header_frame());
            print_graph(&screen.graph_frame());
        }
        Commands::Count => {
            screen.refresh().await;
            print_header(&screen.header_frame());
        }
        Commands::Show { id, json } => {
            let span = locate(&store, id)?;
            if json {
                println!("{}", to_pretty_json(&span)?);
                return Ok(());
            }
            screen.refresh().await;
            screen.select_row(Some(span));
            match screen.detail_frame() {
                Some(frame) => print_detail(&frame),
                None => bail!("span {} could not be selected", id),
            }
        }
        Commands::Before { at } => print_timestamp("before", screen.timestamp_before(at).await),
        Commands::After { at } => print_timestamp("after", screen.timestamp_after(at).await),
        Commands::Tail { ticks, interval_ms } => {
            screen.set_live(true).await;
            screen.refresh().await;
            print_header(&screen.header_frame());
            for _ in 0..ticks {
                tokio::time::sleep(StdDuration::from_millis(interval_ms)).await;
                if screen.tick().await.is_some() {
                    print_header(&screen.header_frame());
                    print_table(&screen.table_frame());
                }
            }
            screen.set_live(false).await;
        }
        Commands::Version => {}
    }

    Ok(())
}

/// Looks a span up by id anywhere in the store, not only in the loaded window.
fn locate(store: &MemoryStore, id: SpanId) -> Result<Span> {
    store
        .get(id)
        .with_context(|| format!("no span with id {}", id))
}

/// Window from `--from`/`--to`, or the configured width ending at the newest span.
async fn resolve_window(
    screen: &ScreenCoordinator,
    args: &WindowArgs,
    config: &ScreenConfig,
) -> Result<Timespan> {
    let window = match (args.from, args.to) {
        (Some(from), Some(to)) => Timespan::new(from, to)?,
        (Some(from), None) => Timespan::new(from, from + config.default_window)?,
        (None, Some(to)) => Timespan::ending_at(to, config.default_window),
        (None, None) => {
            let end = screen
                .timestamp_before(Utc::now())
                .await
                .unwrap_or_else(Utc::now);
            Timespan::ending_at(end, config.default_window)
        }
    };
    Ok(window)
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, TimeZone};

    use super::*;

    #[test]
    fn spans_are_found_beyond_the_first_page() {
        let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let store = MemoryStore::new(100);
        let spans: Vec<Span> = (0..120)
            .map(|i| Span::builder(format!("s{}", i), start + Duration::seconds(i)).build())
            .collect();
        let last = spans[119].clone();
        store.extend(spans);

        assert_eq!(locate(&store, last.id).expect("stored").name, "s119");
        assert!(locate(&store, SpanId::new()).is_err());
    }
}
