/// Parses `150`, `150us`, `2.5ms`, `3s`, `1m` or `2h` into microseconds.
pub fn parse_duration_micros(text: &str) -> Option<i64> {
    let split = text
        .find(|c: char| !(c.is_ascii_digit() || c == '.'))
        .unwrap_or(text.len());
    let (number, unit) = text.split_at(split);
    let number: f64 = number.parse().ok()?;

    let scale = match unit {
        "" | "us" | "µs" => 1.0,
        "ms" => 1_000.0,
        "s" => 1_000_000.0,
        "m" => 60_000_000.0,
        "h" => 3_600_000_000.0,
        _ => return None,
    };

    let micros = number * scale;
    if !micros.is_finite() || micros > i64::MAX as f64 {
        return None;
    }
    Some(micros.round() as i64)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_units() {
        assert_eq!(parse_duration_micros("150"), Some(150));
        assert_eq!(parse_duration_micros("150us"), Some(150));
        assert_eq!(parse_duration_micros("2.5ms"), Some(2_500));
        assert_eq!(parse_duration_micros("3s"), Some(3_000_000));
        assert_eq!(parse_duration_micros("1m"), Some(60_000_000));
    }

    #[test]
    fn rejects_unknown_units_and_garbage() {
        assert_eq!(parse_duration_micros("3 days"), None);
        assert_eq!(parse_duration_micros("ms"), None);
        assert_eq!(parse_duration_micros("1.2.3s"), None);
    }
}
