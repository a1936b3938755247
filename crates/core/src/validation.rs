//! Input validation utilities.
//!
//! Value-range checks shared by the record models, plus the identifier check applied to every
//! column name before it is spliced into SQL.

use crate::{CoreError, CoreResult};

/// Validates that a column name is a plain lower-case SQL identifier.
///
/// Column names come from serde field names, but rows also pass through client payloads, so
/// every key is checked before it reaches a statement:
/// - Rejects empty strings and names longer than 63 bytes (the Postgres identifier limit)
/// - Must start with a lower-case ASCII letter or `_`
/// - Restricts the rest to `[a-z0-9_]`
///
/// # Errors
///
/// Returns `CoreError::InvalidInput` if the name is not a safe identifier.
pub fn validate_column_name(name: &str) -> CoreResult<()> {
    const MAX_IDENTIFIER_LEN: usize = 63;

    if name.is_empty() || name.len() > MAX_IDENTIFIER_LEN {
        return Err(CoreError::InvalidInput(format!(
            "invalid column name length: '{name}'"
        )));
    }

    let mut bytes = name.bytes();
    let first_ok = bytes
        .next()
        .is_some_and(|b| b.is_ascii_lowercase() || b == b'_');
    let rest_ok = bytes.all(|b| matches!(b, b'a'..=b'z' | b'0'..=b'9' | b'_'));

    if !first_ok || !rest_ok {
        return Err(CoreError::InvalidInput(format!(
            "invalid column name: '{name}'"
        )));
    }

    Ok(())
}

/// Checks an optional numeric field against an inclusive range.
pub fn check_range<T>(field: &str, value: Option<T>, min: T, max: T) -> CoreResult<()>
where
    T: PartialOrd + std::fmt::Display + Copy,
{
    match value {
        Some(v) if v < min || v > max => Err(CoreError::InvalidInput(format!(
            "{field} must be between {min} and {max} (got {v})"
        ))),
        _ => Ok(()),
    }
}

/// Checks an optional numeric field is strictly above `min` and at most `max`.
pub fn check_range_exclusive_min(field: &str, value: Option<f64>, min: f64, max: f64) -> CoreResult<()> {
    match value {
        Some(v) if v <= min || v > max => Err(CoreError::InvalidInput(format!(
            "{field} must be greater than {min} and at most {max} (got {v})"
        ))),
        _ => Ok(()),
    }
}

/// Checks an optional integer count is not negative.
pub fn check_non_negative(field: &str, value: Option<i32>) -> CoreResult<()> {
    match value {
        Some(v) if v < 0 => Err(CoreError::InvalidInput(format!(
            "{field} cannot be negative (got {v})"
        ))),
        _ => Ok(()),
    }
}

/// Body-mass index from kilograms and centimetres, rounded to two decimals.
///
/// Returns `None` when either value is missing or the height is not positive.
pub fn body_mass_index(weight_kg: Option<f64>, height_cm: Option<f64>) -> Option<f64> {
    let (weight, height) = (weight_kg?, height_cm?);
    if height <= 0.0 {
        return None;
    }
    let metres = height / 100.0;
    Some(round_to(weight / (metres * metres), 2))
}

pub fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

/// Share of `part` in `total` as a percentage with one decimal; zero when `total` is zero.
pub fn percentage(part: u64, total: u64) -> f64 {
    if total == 0 {
        return 0.0;
    }
    round_to(part as f64 * 100.0 / total as f64, 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_column_name() {
        assert!(validate_column_name("patient_id").is_ok());
        assert!(validate_column_name("_x1").is_ok());
        assert!(validate_column_name("").is_err());
        assert!(validate_column_name("1abc").is_err());
        assert!(validate_column_name("name; drop table patients").is_err());
        assert!(validate_column_name("Name").is_err());
        assert!(validate_column_name(&"a".repeat(64)).is_err());
    }

    #[test]
    fn test_check_range() {
        assert!(check_range("apgar", Some(10), 0, 10).is_ok());
        assert!(check_range("apgar", Some(11), 0, 10).is_err());
        assert!(check_range::<i32>("apgar", None, 0, 10).is_ok());
        assert!(check_range_exclusive_min("weight_kg", Some(0.0), 0.0, 150.0).is_err());
        assert!(check_range_exclusive_min("weight_kg", Some(150.0), 0.0, 150.0).is_ok());
        assert!(check_non_negative("parity", Some(-1)).is_err());
    }

    #[test]
    fn test_body_mass_index_and_percentage() {
        assert_eq!(body_mass_index(Some(70.0), Some(175.0)), Some(22.86));
        assert_eq!(body_mass_index(Some(70.0), None), None);
        assert_eq!(body_mass_index(Some(70.0), Some(0.0)), None);
        assert_eq!(percentage(1, 3), 33.3);
        assert_eq!(percentage(5, 0), 0.0);
    }
}
