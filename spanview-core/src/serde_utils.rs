use crate::errors::{Result, SpanViewError};

/// Serializes a value to pretty JSON with canonical error handling.
pub fn to_pretty_json<T: serde::Serialize>(value: &T) -> Result<String> {
    serde_json::to_string_pretty(value)
        .map_err(|err| SpanViewError::SerializationError(err.to_string()))
}

/// Deserializes a JSON string into the provided type with shared error semantics.
pub fn from_json_str<T: serde::de::DeserializeOwned>(input: &str) -> Result<T> {
    serde_json::from_str(input).map_err(|err| SpanViewError::DeserializationError(err.to_string()))
}

/// Deserializes newline-delimited JSON, skipping blank lines.
///
/// Errors carry the 1-based line number of the offending record.
pub fn from_ndjson_str<T: serde::de::DeserializeOwned>(input: &str) -> Result<Vec<T>> {
    input
        .lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(index, line)| {
            serde_json::from_str(line).map_err(|err| {
                SpanViewError::DeserializationError(format!("line {}: {}", index + 1, err))
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pretty_output_is_readable_back() {
        let value = serde_json::json!({"key": "value"});
        let json = to_pretty_json(&value).expect("serialize");
        let decoded: serde_json::Value = from_json_str(&json).expect("deserialize");
        assert_eq!(decoded["key"], "value");
    }

    #[test]
    fn ndjson_reports_failing_line() {
        let input = "{\"a\": 1}\n\n{\"a\": }\n";
        let err = from_ndjson_str::<serde_json::Value>(input).unwrap_err();
        assert!(err.to_string().contains("line 3"));
    }

    #[test]
    fn ndjson_skips_blank_lines() {
        let input = "{\"a\": 1}\n   \n{\"a\": 2}\n";
        let values: Vec<serde_json::Value> = from_ndjson_str(input).expect("parse");
        assert_eq!(values.len(), 2);
        assert_eq!(values[1]["a"], 2);
    }
}
