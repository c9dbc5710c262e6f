use std::time::Duration;

/// Default when the `timeout` query parameter is absent entirely.
const DEFAULT_ABSENT: Duration = Duration::from_secs(300);
/// Default when `timeout` is present but fails to parse.
const DEFAULT_PARSE_FAILURE: Duration = Duration::from_secs(60);
const MAX_SECS: u64 = 300;
const MAX_MINS: u64 = 5;

/// Parses the `timeout` query parameter grammar: `<int><unit>` where unit is
/// `s` (capped at 300) or `m` (capped at 5). Absent entirely -> 300s.
/// Present but unparseable -> 60s.
pub fn parse_timeout(raw: Option<&str>) -> Duration {
	let Some(raw) = raw else {
		return DEFAULT_ABSENT;
	};

	let Some((digits, unit)) = split_unit(raw) else {
		return DEFAULT_PARSE_FAILURE;
	};

	let Ok(value) = digits.parse::<u64>() else {
		return DEFAULT_PARSE_FAILURE;
	};

	match unit {
		"s" => Duration::from_secs(value.min(MAX_SECS)),
		"m" => Duration::from_secs(value.min(MAX_MINS) * 60),
		_ => DEFAULT_PARSE_FAILURE,
	}
}

fn split_unit(raw: &str) -> Option<(&str, &str)> {
	let raw = raw.trim();
	if raw.is_empty() {
		return None;
	}
	let split_at = raw.len() - 1;
	if !raw.is_char_boundary(split_at) {
		return None;
	}
	Some(raw.split_at(split_at))
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn seconds_pass_through() {
		assert_eq!(parse_timeout(Some("30s")), Duration::from_secs(30));
	}

	#[test]
	fn seconds_capped_at_300() {
		assert_eq!(parse_timeout(Some("999s")), Duration::from_secs(300));
	}

	#[test]
	fn minutes_capped_at_5() {
		assert_eq!(parse_timeout(Some("10m")), Duration::from_secs(300));
		assert_eq!(parse_timeout(Some("2m")), Duration::from_secs(120));
	}

	#[test]
	fn garbage_defaults_to_60s() {
		assert_eq!(parse_timeout(Some("banana")), Duration::from_secs(60));
		assert_eq!(parse_timeout(Some("5h")), Duration::from_secs(60));
		assert_eq!(parse_timeout(Some("")), Duration::from_secs(60));
	}

	#[test]
	fn absent_defaults_to_300s() {
		assert_eq!(parse_timeout(None), Duration::from_secs(300));
	}
}
