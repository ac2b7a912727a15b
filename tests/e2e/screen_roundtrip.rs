// End-to-end test loading spans from disk and driving a screen over them.
use std::io::Write;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use spanview::filter::parse_inputs;
use spanview::protocol::prelude::*;
use spanview::screen::ManualClock;
use spanview::{memory_screen, open_screen, ScreenConfig};
use spanview_store::MemoryStore;
use tempfile::NamedTempFile;

fn ts(raw: &str) -> Timestamp {
    raw.parse::<DateTime<Utc>>().expect("valid timestamp")
}

fn write_spans() -> anyhow::Result<NamedTempFile> {
    let mut file = NamedTempFile::new()?;
    for (i, (created, level, name, user)) in [
        ("2024-03-01T10:00:00Z", "info", "login", "ada"),
        ("2024-03-01T10:05:00Z", "warn", "checkout", "ada"),
        ("2024-03-01T10:10:00Z", "error", "checkout", "grace"),
        ("2024-03-01T10:20:00Z", "info", "logout", "grace"),
    ]
    .into_iter()
    .enumerate()
    {
        let closed = ts(created) + Duration::seconds(30);
        writeln!(
            file,
            r#"{{"id":"00000000-0000-4000-8000-00000000000{}","created_at":"{}","closed_at":"{}","level":"{}","name":"{}","target":"shop","attributes":{{"user":"{}"}}}}"#,
            i,
            created,
            closed.to_rfc3339(),
            level,
            name,
            user
        )?;
    }
    Ok(file)
}

#[tokio::test]
async fn browse_filter_and_navigate_loaded_spans() -> anyhow::Result<()> {
    let file = write_spans()?;
    let screen = open_screen(file.path(), ScreenConfig::default()).await?;
    screen
        .set_timespan(Timespan::new(
            ts("2024-03-01T09:55:00Z"),
            ts("2024-03-01T10:15:00Z"),
        )?)
        .await?;

    assert_eq!(screen.table().rows().len(), 3);
    assert_eq!(screen.count(), Counts::exact(3));

    screen.set_filter(parse_inputs("#name: checkout")).await;
    let rows = screen.table().rows();
    assert_eq!(rows.len(), 2);

    screen.table().click(rows[0].clone());
    screen.table().add_predicate("@user: grace").await?;
    assert_eq!(screen.table().rows().len(), 1);
    assert_eq!(screen.selected_row().map(|s| s.name), Some("checkout".into()));
    assert!(screen.detail_visible());

    let later = screen.jump_after().await;
    assert!(later.is_none(), "no checkout by grace after the window");
    assert_eq!(
        screen.timestamp_before(ts("2024-03-01T11:00:00Z")).await,
        Some(ts("2024-03-01T10:10:00Z"))
    );
    Ok(())
}

#[tokio::test]
async fn live_tail_follows_the_clock() -> anyhow::Result<()> {
    let store = MemoryStore::new(100);
    let start = ts("2024-03-01T10:00:00Z");
    let clock = Arc::new(ManualClock::new(start));
    let screen = memory_screen(store.clone(), ScreenConfig::default())
        .clock(clock.clone())
        .live(true)
        .build();
    screen.refresh().await;
    assert!(screen.table().rows().is_empty());

    store.insert(
        Span::builder("heartbeat", start + Duration::seconds(30))
            .lasting(Duration::seconds(1))
            .build(),
    );
    clock.advance(Duration::minutes(1));
    let window = screen.tick().await.expect("live window moves");

    assert_eq!(window.end(), start + Duration::minutes(1));
    assert_eq!(screen.table().rows().len(), 1);
    assert_eq!(screen.count(), Counts::exact(1));
    Ok(())
}
