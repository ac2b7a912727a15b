// Tests covering screen configuration loaded from prefixed environment keys.
use std::collections::HashMap;

use chrono::Duration;
use spanview::{CountThresholds, ScreenConfig, SpanViewError};
use spanview_core::ConfigError;
use test_case::test_case;

fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let map: HashMap<String, String> = pairs
        .iter()
        .map(|(key, value)| (key.to_string(), value.to_string()))
        .collect();
    move |key| map.get(key).cloned()
}

#[test]
fn full_configuration_is_read() {
    let config = ScreenConfig::from_lookup(
        "SV_",
        lookup(&[
            ("SV_PAGE_SIZE", "25"),
            ("SV_GRAPH_LIMIT", "500"),
            ("SV_COUNT_THRESHOLDS", "100,200"),
            ("SV_COLUMN_MIN", "2"),
            ("SV_WINDOW_SECS", "120"),
            ("SV_VIEW_WAIT", "false"),
            ("SV_COUNT_CAP", "300"),
        ]),
    )
    .expect("valid configuration");

    assert_eq!(config.page_size, 25);
    assert_eq!(config.graph_limit, 500);
    assert_eq!(
        config.count_thresholds,
        CountThresholds {
            warning: 100,
            danger: 200
        }
    );
    assert_eq!(config.column_min, 2);
    assert_eq!(config.default_window, Duration::minutes(2));
    assert!(!config.view_wait);
    assert_eq!(config.count_cap, 300);
}

#[test_case("SV_PAGE_SIZE", "lots" ; "non numeric page size")]
#[test_case("SV_GRAPH_LIMIT", "0" ; "zero graph limit")]
#[test_case("SV_WINDOW_SECS", "-5" ; "negative window")]
#[test_case("SV_COUNT_THRESHOLDS", "1000" ; "single threshold")]
#[test_case("SV_NAVIGATION_WAIT", "maybe" ; "non boolean wait")]
fn malformed_values_are_rejected(key: &str, value: &str) {
    let err = ScreenConfig::from_lookup("SV_", lookup(&[(key, value)])).unwrap_err();
    assert!(matches!(err, ConfigError::InvalidValue { .. }));

    let canonical: SpanViewError = err.into();
    assert!(matches!(canonical, SpanViewError::ConfigError(_)));
}
