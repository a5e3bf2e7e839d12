use crate::error::{config_error, invalid_arguments, AgentResult};
use chrono::{Duration, NaiveDateTime, Utc};
use chrono_tz::Tz;

/// Timestamp format used for event times ("YYYY-MM-DDTHH:MM:SS")
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// Parse an IANA timezone name
pub fn parse_timezone(timezone: &str) -> AgentResult<Tz> {
    timezone
        .parse::<Tz>()
        .map_err(|_| config_error(&format!("Invalid timezone: {}", timezone)))
}

/// Current local datetime string in the given timezone
///
/// Fed to the model's system instruction so relative phrases like
/// "tomorrow" resolve against the right reference point.
pub fn current_datetime(timezone: &str) -> AgentResult<String> {
    let tz = parse_timezone(timezone)?;
    Ok(Utc::now().with_timezone(&tz).format(TIMESTAMP_FORMAT).to_string())
}

/// Current time in the given timezone as RFC 3339, for `timeMin` bounds
pub fn now_rfc3339(timezone: &str) -> AgentResult<String> {
    let tz = parse_timezone(timezone)?;
    Ok(Utc::now().with_timezone(&tz).to_rfc3339())
}

/// Parse an event timestamp, reporting which function argument was bad
pub fn parse_timestamp(function: &str, field: &str, value: &str) -> AgentResult<NaiveDateTime> {
    NaiveDateTime::parse_from_str(value, TIMESTAMP_FORMAT).map_err(|_| {
        invalid_arguments(
            function,
            &format!("{} must be a YYYY-MM-DDTHH:MM:SS timestamp, got '{}'", field, value),
        )
    })
}

/// Default end time: one hour after the start
pub fn default_end_time(start: NaiveDateTime) -> String {
    (start + Duration::hours(1)).format(TIMESTAMP_FORMAT).to_string()
}

/// Normalize a time bound to RFC 3339
///
/// Accepts either RFC 3339 (passed through unchanged) or a naive
/// local timestamp, which gets the configured timezone's offset.
pub fn rfc3339_bound(
    function: &str,
    field: &str,
    value: &str,
    timezone: &str,
) -> AgentResult<String> {
    if chrono::DateTime::parse_from_rfc3339(value).is_ok() {
        return Ok(value.to_string());
    }

    let naive = NaiveDateTime::parse_from_str(value, TIMESTAMP_FORMAT).map_err(|_| {
        invalid_arguments(
            function,
            &format!("{} must be an RFC 3339 or YYYY-MM-DDTHH:MM:SS timestamp, got '{}'", field, value),
        )
    })?;
    let tz = parse_timezone(timezone)?;
    naive
        .and_local_timezone(tz)
        .earliest()
        .map(|dt| dt.to_rfc3339())
        .ok_or_else(|| {
            invalid_arguments(
                function,
                &format!("{} does not exist in timezone {}", field, timezone),
            )
        })
}
