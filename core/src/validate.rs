//! Input checks run before any request is built.
//!
//! Each check returns `ApiError::InvalidArgument` with the message the API
//! wrapper has always used; callers match on these strings.

use chrono::{DateTime, NaiveDate, NaiveDateTime};

use crate::error::ApiError;
use crate::types::Numeric;

pub const FORM_ID_NOT_NUMERIC: &str = "Form ID must be numeric";
pub const SUBMISSION_ID_NOT_NUMERIC: &str = "Submission ID must be numeric";
pub const FIELD_IDS_NOT_NUMERIC: &str = "Field IDs must be numeric";
pub const SEARCH_MISMATCH: &str = "You must have a one to one relationship";
pub const FIELD_MISMATCH: &str =
    "There must be a one-to-one relationship between Field IDs and their values";
pub const INVALID_MIN_TIME: &str = "Invalid value for minTime parameter";
pub const INVALID_MAX_TIME: &str = "Invalid value for maxTime parameter";
pub const PER_PAGE_NOT_NUMERIC: &str = "The perPage value must be numeric";
pub const PER_PAGE_RANGE: &str =
    "You can only retrieve a minimum of 1 and maximum of 100 submissions per request";
pub const PAGE_NUMBER_NOT_NUMERIC: &str = "The pageNumber value must be numeric";
pub const INVALID_SORT: &str = "The sort parameter must be ASC or DESC";
pub const INVALID_TIMESTAMP: &str =
    "You must use a valid Date/Time string formatted in YYYY-MM-DD HH:MM:SS";
pub const MISSING_ENDPOINT: &str = "Missing End Point";

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

fn numeric(value: &Numeric, message: &str) -> Result<i128, ApiError> {
    value.as_integer().ok_or_else(|| ApiError::invalid(message))
}

pub fn form_id(id: &Numeric) -> Result<i128, ApiError> {
    numeric(id, FORM_ID_NOT_NUMERIC)
}

pub fn submission_id(id: &Numeric) -> Result<i128, ApiError> {
    numeric(id, SUBMISSION_ID_NOT_NUMERIC)
}

/// Every ID must be numeric; the first offender fails the whole list.
pub fn field_ids(ids: &[Numeric]) -> Result<Vec<i128>, ApiError> {
    ids.iter().map(|id| numeric(id, FIELD_IDS_NOT_NUMERIC)).collect()
}

pub fn one_to_one(ids: usize, values: usize, message: &str) -> Result<(), ApiError> {
    if ids == values {
        Ok(())
    } else {
        Err(ApiError::invalid(message))
    }
}

pub fn per_page(value: &Numeric) -> Result<u8, ApiError> {
    let n = numeric(value, PER_PAGE_NOT_NUMERIC)?;
    match u8::try_from(n) {
        Ok(n) if (1..=100).contains(&n) => Ok(n),
        _ => Err(ApiError::invalid(PER_PAGE_RANGE)),
    }
}

pub fn page_number(value: &Numeric) -> Result<i128, ApiError> {
    numeric(value, PAGE_NUMBER_NOT_NUMERIC)
}

pub fn sort(value: &str) -> Result<(), ApiError> {
    match value {
        "ASC" | "DESC" => Ok(()),
        _ => Err(ApiError::invalid(INVALID_SORT)),
    }
}

/// Empty means "no bound". Otherwise the value must be a recognisable
/// date or date/time.
pub fn time_bound(value: &str, message: &str) -> Result<(), ApiError> {
    if value.is_empty() || is_datetime(value) {
        Ok(())
    } else {
        Err(ApiError::invalid(message))
    }
}

/// Empty means "let the server stamp it". Otherwise a full date and time
/// is required.
pub fn timestamp(value: &str) -> Result<(), ApiError> {
    if value.is_empty()
        || NaiveDateTime::parse_from_str(value, TIMESTAMP_FORMAT).is_ok()
        || DateTime::parse_from_rfc3339(value).is_ok()
    {
        Ok(())
    } else {
        Err(ApiError::invalid(INVALID_TIMESTAMP))
    }
}

pub fn endpoint(value: &str) -> Result<(), ApiError> {
    if value.is_empty() {
        Err(ApiError::invalid(MISSING_ENDPOINT))
    } else {
        Ok(())
    }
}

fn is_datetime(value: &str) -> bool {
    NaiveDateTime::parse_from_str(value, TIMESTAMP_FORMAT).is_ok()
        || NaiveDateTime::parse_from_str(value, "%Y-%m-%d %H:%M").is_ok()
        || NaiveDate::parse_from_str(value, "%Y-%m-%d").is_ok()
        || DateTime::parse_from_rfc3339(value).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn message(result: Result<impl std::fmt::Debug, ApiError>) -> String {
        result.unwrap_err().to_string()
    }

    #[test]
    fn ids_must_be_numeric() {
        assert_eq!(form_id(&Numeric::from(12)).unwrap(), 12);
        assert_eq!(message(form_id(&Numeric::from("TEXT"))), FORM_ID_NOT_NUMERIC);
        assert_eq!(message(submission_id(&Numeric::from("abc"))), SUBMISSION_ID_NOT_NUMERIC);
    }

    #[test]
    fn ids_beyond_the_signed_range_are_numeric() {
        let max = i128::from(u64::MAX);
        assert_eq!(form_id(&Numeric::from(u64::MAX)).unwrap(), max);
        assert_eq!(submission_id(&Numeric::from("18446744073709551615")).unwrap(), max);
        assert_eq!(field_ids(&[Numeric::from(u64::MAX)]).unwrap(), vec![max]);
        assert_eq!(message(per_page(&Numeric::from(u64::MAX))), PER_PAGE_RANGE);
    }

    #[test]
    fn first_non_numeric_field_id_fails() {
        let ids = vec![Numeric::from(1), Numeric::from("two"), Numeric::from(3)];
        assert_eq!(message(field_ids(&ids)), FIELD_IDS_NOT_NUMERIC);
        assert_eq!(field_ids(&[Numeric::from(1), Numeric::from("2")]).unwrap(), vec![1, 2]);
    }

    #[test]
    fn per_page_bounds_are_inclusive() {
        assert_eq!(per_page(&Numeric::from(1)).unwrap(), 1);
        assert_eq!(per_page(&Numeric::from(100)).unwrap(), 100);
        assert_eq!(message(per_page(&Numeric::from(0))), PER_PAGE_RANGE);
        assert_eq!(message(per_page(&Numeric::from(101))), PER_PAGE_RANGE);
        assert_eq!(message(per_page(&Numeric::from(-5))), PER_PAGE_RANGE);
        assert_eq!(message(per_page(&Numeric::from("fail"))), PER_PAGE_NOT_NUMERIC);
    }

    #[test]
    fn sort_is_case_sensitive() {
        assert!(sort("ASC").is_ok());
        assert!(sort("DESC").is_ok());
        assert_eq!(message(sort("asc")), INVALID_SORT);
        assert_eq!(message(sort("fail")), INVALID_SORT);
    }

    #[test]
    fn time_bounds() {
        assert!(time_bound("", INVALID_MIN_TIME).is_ok());
        assert!(time_bound("2024-03-01", INVALID_MIN_TIME).is_ok());
        assert!(time_bound("2024-03-01 08:30", INVALID_MIN_TIME).is_ok());
        assert!(time_bound("2024-03-01 08:30:00", INVALID_MIN_TIME).is_ok());
        assert!(time_bound("2024-03-01T08:30:00Z", INVALID_MIN_TIME).is_ok());
        assert_eq!(message(time_bound("BAD", INVALID_MAX_TIME)), INVALID_MAX_TIME);
        assert_eq!(message(time_bound("2024-13-01", INVALID_MIN_TIME)), INVALID_MIN_TIME);
    }

    #[test]
    fn timestamp_requires_date_and_time() {
        assert!(timestamp("").is_ok());
        assert!(timestamp("2024-03-01 08:30:00").is_ok());
        assert_eq!(message(timestamp("2024-03-01")), INVALID_TIMESTAMP);
        assert_eq!(message(timestamp("yesterday")), INVALID_TIMESTAMP);
    }

    #[test]
    fn mismatched_lengths_fail_either_way() {
        assert!(one_to_one(2, 2, SEARCH_MISMATCH).is_ok());
        assert_eq!(message(one_to_one(3, 2, SEARCH_MISMATCH)), SEARCH_MISMATCH);
        assert_eq!(message(one_to_one(2, 3, FIELD_MISMATCH)), FIELD_MISMATCH);
    }
}
