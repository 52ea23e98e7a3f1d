//! Request field checks shared by the handlers. Failures are 400s.
use axum::http::StatusCode;
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};

use crate::errors::ServerError;

pub const MIN_PASSWORD_LEN: usize = 6;

pub fn bad_request(message: impl Into<String>) -> ServerError {
    ServerError::new(StatusCode::BAD_REQUEST, message)
}

pub fn is_valid_email(raw: &str) -> bool {
    let Some((local, domain)) = raw.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && !domain.contains('@')
        && domain.contains('.')
        && domain.split('.').all(|label| !label.is_empty())
        && !raw.chars().any(char::is_whitespace)
}

/// Trimmed value, or `None` when absent or blank.
pub fn trimmed(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

pub fn required_text(value: Option<String>, field: &str) -> Result<String, ServerError> {
    trimmed(value).ok_or_else(|| bad_request(format!("{field} is required")))
}

pub fn required_id(value: Option<i64>, field: &str) -> Result<i64, ServerError> {
    value.ok_or_else(|| bad_request(format!("{field} is required")))
}

/// RFC 3339, a naive `YYYY-MM-DDTHH:MM:SS[.f]` taken as UTC, or a bare date at midnight UTC.
pub fn parse_timestamp(raw: &str, field: &str) -> Result<DateTime<Utc>, ServerError> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Ok(dt.with_timezone(&Utc));
    }
    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, format) {
            return Ok(naive.and_utc());
        }
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
        .ok_or_else(|| bad_request(format!("{field} must be an ISO-8601 date or datetime")))
}

pub fn parse_optional_timestamp(
    raw: Option<String>,
    field: &str,
) -> Result<Option<DateTime<Utc>>, ServerError> {
    trimmed(raw)
        .map(|value| parse_timestamp(&value, field))
        .transpose()
}

/// Calendar date of an ISO-8601 date or datetime.
pub fn parse_date(raw: &str, field: &str) -> Result<NaiveDate, ServerError> {
    let raw = raw.trim();
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return Ok(date);
    }
    parse_timestamp(raw, field).map(|dt| dt.date_naive())
}

pub fn validate_coordinates(latitude: f64, longitude: f64) -> Result<(), ServerError> {
    if !(-90.0..=90.0).contains(&latitude) {
        return Err(bad_request("latitude must be between -90 and 90"));
    }
    if !(-180.0..=180.0).contains(&longitude) {
        return Err(bad_request("longitude must be between -180 and 180"));
    }
    Ok(())
}
