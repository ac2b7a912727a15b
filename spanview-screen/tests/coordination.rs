// Tests driving the screen coordinator end to end against the in-memory store.
use std::sync::Arc;

use chrono::{Duration, TimeZone, Utc};
use spanview_core::ScreenConfig;
use spanview_filter::{parse_inputs, SpanFilterParser};
use spanview_protocol::prelude::*;
use spanview_screen::{
    ColumnDef, CountLevel, ManualClock, ScreenCoordinator, ScreenError,
};
use spanview_store::MemoryStore;

fn t0() -> Timestamp {
    Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()
}

fn at(minute: i64) -> Timestamp {
    t0() + Duration::minutes(minute)
}

fn window(start: i64, end: i64) -> Timespan {
    Timespan::new(at(start), at(end)).unwrap()
}

fn seeded_store() -> MemoryStore {
    let store = MemoryStore::new(10_000);
    store.extend(vec![
        Span::builder("a", at(10))
            .lasting(Duration::minutes(4))
            .attribute("user", "ada")
            .build(),
        Span::builder("b", at(30))
            .lasting(Duration::minutes(4))
            .level(Level::Warn)
            .build(),
        Span::builder("c", at(50))
            .lasting(Duration::minutes(4))
            .level(Level::Error)
            .build(),
    ]);
    store
}

fn screen_over(store: MemoryStore, timespan: Timespan) -> (ScreenCoordinator, Arc<ManualClock>) {
    let clock = Arc::new(ManualClock::new(at(60)));
    let screen = ScreenCoordinator::builder(Arc::new(store), Arc::new(SpanFilterParser))
        .clock(clock.clone())
        .timespan(timespan)
        .build();
    (screen, clock)
}

fn names(spans: &[Span]) -> Vec<String> {
    spans.iter().map(|span| span.name.clone()).collect()
}

#[tokio::test]
async fn refresh_fills_graph_table_and_count() {
    let (screen, _) = screen_over(seeded_store(), window(0, 60));
    screen.refresh().await;

    assert_eq!(names(&screen.table().rows()), vec!["a", "b", "c"]);
    assert_eq!(screen.graph().spans().len(), 3);
    assert_eq!(screen.count(), Counts::exact(3));

    let header = screen.header_frame();
    assert_eq!(header.count.text, "3");
    assert_eq!(header.count.level, CountLevel::Normal);
    assert!(header.time_controls_enabled);
}

#[tokio::test]
async fn filter_edits_requery_both_views() {
    let (screen, _) = screen_over(seeded_store(), window(0, 60));
    screen.refresh().await;

    assert!(screen.set_filter(parse_inputs("#level: >=WARN")).await);
    assert_eq!(names(&screen.table().rows()), vec!["b", "c"]);
    assert_eq!(screen.graph().spans().len(), 2);
    assert_eq!(screen.count(), Counts::exact(2));

    assert!(!screen.set_filter(parse_inputs("#level: >=WARN")).await);
}

#[tokio::test]
async fn invalid_filter_entry_keeps_previous_results() {
    let (screen, _) = screen_over(seeded_store(), window(0, 60));
    screen.set_filter(parse_inputs("#level: ERROR")).await;

    assert!(!screen.set_filter(parse_inputs("#level: ERROR #level: loud")).await);
    assert_eq!(screen.raw_filter().len(), 2);
    assert_eq!(screen.filter().len(), 1);
    assert_eq!(names(&screen.table().rows()), vec!["c"]);
}

#[tokio::test]
async fn unparseable_addition_changes_nothing() {
    let (screen, _) = screen_over(seeded_store(), window(0, 60));
    screen.set_filter(parse_inputs("#level: >=WARN")).await;
    let raw = screen.raw_filter();
    let filter = screen.filter();

    let err = screen.add_to_filter("#name: b #level: loud").await.unwrap_err();
    assert!(matches!(err, ScreenError::Parse(_)));
    assert_eq!(screen.raw_filter(), raw);
    assert_eq!(screen.filter(), filter);
}

#[tokio::test]
async fn selection_survives_the_row_disappearing() {
    let (screen, _) = screen_over(seeded_store(), window(0, 60));
    screen.refresh().await;

    let row = screen.table().rows()[0].clone();
    screen.table().click(row.clone());
    assert!(screen.detail_visible());

    screen.table().add_predicate("#name: c").await.unwrap();
    assert!(!screen.table().contains(row.id));
    assert_eq!(screen.selected_row(), Some(row.clone()));

    let detail = screen.detail_frame().expect("detail pane shown");
    assert_eq!(detail.span.id, row.id);

    screen.detail().close();
    assert!(!screen.detail_visible());
    assert!(screen.detail_frame().is_none());
}

#[tokio::test]
async fn live_toggle_freezes_window_when_switched_off() {
    let (screen, clock) = screen_over(seeded_store(), window(0, 15));

    screen.set_live(true).await;
    assert_eq!(screen.timespan(), window(45, 60));
    assert!(!screen.header_frame().time_controls_enabled);

    clock.advance(Duration::minutes(5));
    assert_eq!(screen.tick().await, Some(window(50, 65)));

    screen.set_live(false).await;
    clock.advance(Duration::minutes(10));
    assert_eq!(screen.tick().await, None);
    assert_eq!(screen.timespan(), window(50, 65));
}

#[tokio::test]
async fn manual_window_changes_are_refused_while_live() {
    let (screen, _) = screen_over(seeded_store(), window(0, 15));
    screen.set_live(true).await;

    assert_eq!(
        screen.set_timespan(window(0, 30)).await,
        Err(ScreenError::LiveTailActive)
    );
    assert_eq!(
        screen.graph().select_range(window(0, 30)).await,
        Err(ScreenError::LiveTailActive)
    );
    assert_eq!(screen.jump_before().await, None);
    assert_eq!(screen.timespan(), window(45, 60));
}

#[tokio::test]
async fn graph_brush_zooms_the_window() {
    let (screen, _) = screen_over(seeded_store(), window(0, 60));
    screen.refresh().await;

    screen.graph().select_range(window(25, 40)).await.unwrap();
    assert_eq!(screen.timespan(), window(25, 40));
    assert_eq!(names(&screen.table().rows()), vec!["b"]);
}

#[tokio::test]
async fn neighbour_lookups_follow_creation_times() {
    let (screen, _) = screen_over(seeded_store(), window(0, 60));

    assert_eq!(screen.timestamp_before(at(60)).await, Some(at(50)));
    assert_eq!(screen.timestamp_after(at(55)).await, None);

    let (empty, _) = screen_over(MemoryStore::new(100), window(0, 60));
    assert_eq!(empty.timestamp_before(at(60)).await, None);
    assert_eq!(empty.timestamp_after(at(0)).await, None);
}

#[tokio::test]
async fn jumps_recentre_on_neighbours() {
    let (screen, _) = screen_over(seeded_store(), window(0, 20));

    assert_eq!(screen.jump_after().await, Some(window(20, 40)));
    assert_eq!(names(&screen.table().rows()), vec!["b"]);

    assert_eq!(screen.jump_before().await, Some(window(0, 20)));
    assert_eq!(names(&screen.table().rows()), vec!["a"]);

    screen.set_timespan(window(60, 80)).await.unwrap();
    assert_eq!(screen.jump_after().await, None);
    assert_eq!(screen.timespan(), window(60, 80));
}

#[tokio::test]
async fn hover_is_highlighted_in_the_other_view() {
    let (screen, _) = screen_over(seeded_store(), window(0, 60));
    screen.refresh().await;

    let row = screen.table().rows()[1].clone();
    screen.table().hover(Some(row.clone()));
    assert_eq!(screen.graph_frame().highlighted, Some(row.id));

    let stranger = Span::new("elsewhere", at(5));
    screen.graph().hover(Some(stranger));
    assert_eq!(screen.graph_frame().highlighted, None);
    assert!(screen.table_frame().rows.iter().all(|r| !r.hovered));

    screen.graph().hover(Some(row.clone()));
    let frame = screen.table_frame();
    assert!(frame.rows.iter().any(|r| r.id == row.id && r.hovered));
}

#[tokio::test]
async fn detail_pane_offers_predicates_and_columns() {
    let (screen, _) = screen_over(seeded_store(), window(0, 60));
    screen.refresh().await;
    screen.select_row(screen.table().rows().first().cloned());

    let detail = screen.detail_frame().expect("selected");
    let user = detail
        .fields
        .iter()
        .find(|field| field.label == "user")
        .expect("attribute field")
        .clone();
    assert_eq!(user.predicate, "@user: ada");
    assert!(!user.in_filter);

    screen.detail().add_predicate(user.predicate.clone()).await.unwrap();
    assert_eq!(names(&screen.table().rows()), vec!["a"]);
    let detail = screen.detail_frame().expect("still selected");
    assert!(detail.fields.iter().any(|f| f.label == "user" && f.in_filter));

    screen.detail().add_column(user.column.clone()).unwrap();
    let columns = screen.columns();
    assert_eq!(columns.columns().last(), Some(&ColumnDef::Attribute("user".into())));
    assert_eq!(screen.table_frame().rows[0].cells.last().map(String::as_str), Some("ada"));

    assert!(matches!(
        screen.detail().add_column("#bogus"),
        Err(ScreenError::Parse(_))
    ));
    assert_eq!(screen.columns(), columns);
}

#[tokio::test]
async fn column_removal_stops_at_minimum() {
    let (screen, _) = screen_over(seeded_store(), window(0, 60));
    screen.column_remove(0).unwrap();
    assert_eq!(
        screen.column_remove(0),
        Err(ScreenError::ColumnMinimum { min: 3 })
    );
    assert_eq!(screen.columns().len(), 3);
}

#[tokio::test]
async fn table_pages_through_the_window() {
    let store = MemoryStore::new(100);
    store.extend((1..=5).map(|minute| {
        Span::builder(format!("s{}", minute), at(minute))
            .lasting(Duration::seconds(30))
            .build()
    }));
    let screen = ScreenCoordinator::builder(Arc::new(store), Arc::new(SpanFilterParser))
        .config(ScreenConfig {
            page_size: 2,
            ..ScreenConfig::default()
        })
        .timespan(window(0, 60))
        .build();
    screen.refresh().await;
    assert_eq!(names(&screen.table().rows()), vec!["s1", "s2"]);

    let mut added = Vec::new();
    while screen.table().has_more() {
        added.push(screen.load_more().await);
    }
    assert_eq!(added, vec![2, 1]);
    assert_eq!(
        names(&screen.table().rows()),
        vec!["s1", "s2", "s3", "s4", "s5"]
    );
}

#[tokio::test]
async fn paging_continues_past_spans_still_open() {
    let store = MemoryStore::new(100);
    store.extend(vec![Span::new("long1", at(1)), Span::new("long2", at(2))]);
    store.extend((3..=5).map(|minute| {
        Span::builder(format!("s{}", minute), at(minute))
            .lasting(Duration::seconds(30))
            .build()
    }));
    let shared = Span::builder("tie", at(5)).lasting(Duration::seconds(1)).build();
    store.insert(shared);
    let screen = ScreenCoordinator::builder(Arc::new(store), Arc::new(SpanFilterParser))
        .config(ScreenConfig {
            page_size: 2,
            ..ScreenConfig::default()
        })
        .timespan(window(0, 60))
        .build();
    screen.refresh().await;

    let mut added = Vec::new();
    while screen.table().has_more() {
        added.push(screen.load_more().await);
    }
    assert_eq!(added, vec![2, 2, 0]);

    let mut rows = names(&screen.table().rows());
    assert_eq!(rows.len(), 6);
    rows.sort();
    assert_eq!(rows, vec!["long1", "long2", "s3", "s4", "s5", "tie"]);
}

#[tokio::test]
async fn detail_predicates_keep_matching_their_span() {
    let store = MemoryStore::new(100);
    store.extend(vec![
        Span::builder("copy", at(10))
            .lasting(Duration::minutes(1))
            .attribute("path", r"C:\tmp")
            .attribute("note", "first line\nsecond \"quoted\"")
            .build(),
        Span::builder("copy", at(20))
            .lasting(Duration::minutes(1))
            .attribute("path", "C:tmp")
            .build(),
    ]);
    let (screen, _) = screen_over(store, window(0, 60));
    screen.refresh().await;
    screen.select_row(screen.table().rows().first().cloned());

    for label in ["path", "note"] {
        let field = screen
            .detail_frame()
            .expect("selected")
            .fields
            .into_iter()
            .find(|field| field.label == label)
            .expect("attribute field");
        screen.detail().add_predicate(field.predicate).await.unwrap();

        assert_eq!(screen.table().rows().len(), 1, "filtering on {}", label);
        let detail = screen.detail_frame().expect("still selected");
        assert!(detail.fields.iter().any(|f| f.label == label && f.in_filter));
    }
}

#[tokio::test]
async fn capped_counts_show_a_lower_bound() {
    let store = MemoryStore::new(2);
    store.extend(["d", "e", "f"].into_iter().enumerate().map(|(i, name)| {
        Span::builder(name, at(10 * i as i64 + 5))
            .lasting(Duration::minutes(1))
            .build()
    }));
    let (screen, _) = screen_over(store, window(0, 60));
    screen.refresh().await;

    assert_eq!(screen.count(), Counts::capped(2));
    assert_eq!(screen.header_frame().count.text, "2+");
}
