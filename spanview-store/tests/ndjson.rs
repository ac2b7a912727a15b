use std::io::Write;

use chrono::{TimeZone, Utc};
use spanview_core::SpanViewError;
use spanview_protocol::prelude::*;
use spanview_store::{MemoryStore, StoreError};
use tempfile::NamedTempFile;

#[tokio::test]
async fn loads_spans_from_ndjson_file() -> anyhow::Result<()> {
    let mut file = NamedTempFile::new()?;
    writeln!(
        file,
        r#"{{"id":"6f1c5f5e-8f58-4c57-9d3c-0d6f1c7e2a01","created_at":"2024-01-01T12:10:00Z","closed_at":"2024-01-01T12:12:00Z","level":"warn","name":"checkout","target":"shop::cart"}}"#
    )?;
    writeln!(file)?;
    writeln!(
        file,
        r#"{{"id":"6f1c5f5e-8f58-4c57-9d3c-0d6f1c7e2a02","created_at":"2024-01-01T12:30:00Z","name":"poll"}}"#
    )?;

    let store = MemoryStore::from_ndjson_file(file.path(), 100).await?;
    assert_eq!(store.len(), 2);

    let t = Utc.with_ymd_and_hms(2024, 1, 1, 13, 0, 0).unwrap();
    let latest = store
        .get_spans(vec![], PartialFilter::latest_before(t), false)
        .await
        .expect("materialised");
    assert_eq!(latest[0].name, "poll");
    assert!(latest[0].is_open());
    Ok(())
}

#[tokio::test]
async fn malformed_line_reports_path() -> anyhow::Result<()> {
    let mut file = NamedTempFile::new()?;
    writeln!(file, "{{not json")?;

    let err = match MemoryStore::from_ndjson_file(file.path(), 100).await {
        Err(err) => err,
        Ok(_) => anyhow::bail!("malformed input was accepted"),
    };
    assert!(matches!(err, StoreError::Parse { .. }));
    assert!(err.to_string().contains(&file.path().display().to_string()));

    let converted: SpanViewError = err.into();
    assert!(matches!(converted, SpanViewError::DeserializationError(_)));
    Ok(())
}

#[tokio::test]
async fn missing_file_is_an_io_error() {
    let dir = tempfile::tempdir().expect("tempdir");
    let result = MemoryStore::from_ndjson_file(dir.path().join("absent.ndjson"), 10).await;
    assert!(matches!(result, Err(StoreError::Io { .. })));
}
