//! Task id format (spec §3): `T` followed by at least 3 digits, zero-padded.

use crate::error::TodoError;
use once_cell::sync::Lazy;
use regex::Regex;

static ID_PATTERN: Lazy<Regex> = Lazy::new(|| Regex::new(r"^T\d{3,}$").unwrap());

/// Validate that `id` matches the canonical task-id form.
pub fn validate_id_format(id: &str) -> Result<(), TodoError> {
    if ID_PATTERN.is_match(id) {
        Ok(())
    } else {
        Err(TodoError::InvalidIdFormat { id: id.to_string() })
    }
}

/// Format a counter value as the canonical task id (zero-padded to 3 digits
/// minimum; wider counters simply grow the field).
#[must_use]
pub fn format_id(counter: u64) -> String {
    format!("T{counter:03}")
}

/// Parse the numeric counter out of a canonical task id. Returns `None` if
/// the id does not match the canonical form.
#[must_use]
pub fn parse_id(id: &str) -> Option<u64> {
    if !ID_PATTERN.is_match(id) {
        return None;
    }
    id[1..].parse().ok()
}

/// Validate every id in `ids` and return the maximum numeric counter seen
/// (0 if `ids` is empty). Fails with [`TodoError::InvalidIdFormat`] if any
/// id does not match the canonical form.
pub fn max_counter<'a>(ids: impl Iterator<Item = &'a str>) -> Result<u64, TodoError> {
    let mut max = 0u64;
    for id in ids {
        let counter = parse_id(id).ok_or_else(|| TodoError::InvalidIdFormat { id: id.to_string() })?;
        max = max.max(counter);
    }
    Ok(max)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_with_zero_padding() {
        assert_eq!(format_id(1), "T001");
        assert_eq!(format_id(42), "T042");
        assert_eq!(format_id(1000), "T1000");
    }

    #[test]
    fn parses_back_to_counter() {
        assert_eq!(parse_id("T001"), Some(1));
        assert_eq!(parse_id("T1000"), Some(1000));
        assert_eq!(parse_id("bogus"), None);
        assert_eq!(parse_id("T1"), None);
    }

    #[test]
    fn validate_rejects_bad_format() {
        assert!(validate_id_format("T001").is_ok());
        assert!(validate_id_format("t001").is_err());
        assert!(validate_id_format("T1").is_err());
        assert!(validate_id_format("001").is_err());
    }

    #[test]
    fn max_counter_finds_largest() {
        let ids = vec!["T001", "T010", "T003"];
        assert_eq!(max_counter(ids.into_iter()).unwrap(), 10);
    }

    #[test]
    fn max_counter_rejects_bad_id() {
        let ids = vec!["T001", "bogus"];
        assert!(max_counter(ids.into_iter()).is_err());
    }

    #[test]
    fn max_counter_empty_is_zero() {
        let ids: Vec<&str> = vec![];
        assert_eq!(max_counter(ids.into_iter()).unwrap(), 0);
    }
}
