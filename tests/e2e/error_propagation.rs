// End-to-end test ensuring failures surface as the canonical error type.
use std::io::Write;

use spanview::{open_screen, ScreenConfig, SpanViewError};
use spanview_screen::ScreenError;
use tempfile::NamedTempFile;

#[tokio::test]
async fn malformed_span_file_is_a_deserialization_error() {
    let mut file = NamedTempFile::new().expect("temp file");
    writeln!(file, r#"{{"name": "missing fields"}}"#).expect("write");

    let err = match open_screen(file.path(), ScreenConfig::default()).await {
        Err(err) => err,
        Ok(_) => panic!("malformed spans were accepted"),
    };
    assert!(matches!(err, SpanViewError::DeserializationError(_)));
    assert!(err.to_string().contains("line 1"));
}

#[tokio::test]
async fn missing_span_file_is_an_io_error() {
    let dir = tempfile::tempdir().expect("temp dir");
    let result = open_screen(dir.path().join("nope.ndjson"), ScreenConfig::default()).await;
    assert!(matches!(result, Err(SpanViewError::IoError(_))));
}

#[tokio::test]
async fn screen_errors_map_onto_canonical_variants() {
    let file = NamedTempFile::new().expect("temp file");
    let screen = open_screen(file.path(), ScreenConfig::default())
        .await
        .expect("empty file loads");

    let err: SpanViewError = screen
        .add_to_filter("#level: loud")
        .await
        .expect_err("invalid level")
        .into();
    assert!(matches!(err, SpanViewError::ParseError(_)));

    screen.set_live(true).await;
    let err: SpanViewError = screen
        .set_timespan(screen.timespan())
        .await
        .expect_err("live window is locked")
        .into();
    assert!(matches!(err, SpanViewError::LiveTailActive));

    let err: SpanViewError = ScreenError::ColumnMinimum { min: 3 }.into();
    assert!(matches!(err, SpanViewError::GeneralError(_)));
}
