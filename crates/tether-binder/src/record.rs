//! Mapping of flat import records to [`BindRequest`]s.
//!
//! Columns, in order:
//!
//! | # | column          | type                 |
//! |---|-----------------|----------------------|
//! | 0 | `url`           | absolute URL         |
//! | 1 | `id`            | string               |
//! | 2 | `max_requests`  | unsigned integer     |
//! | 3 | `expire_on`     | RFC 3339 timestamp   |
//! | 4 | `ttl`           | seconds              |
//! | 5 | `expired_url`   | absolute URL         |
//! | 6 | `exhausted_url` | absolute URL         |
//!
//! Only `url` is required. Trailing columns may be omitted and empty cells
//! are unset. URLs are not checked here; binding the request does that.

use jiff::Timestamp;
use std::str::FromStr;
use tether_core::{BindRequest, Error, Result};

const COLUMNS: [&str; 7] = [
    "url",
    "id",
    "max_requests",
    "expire_on",
    "ttl",
    "expired_url",
    "exhausted_url",
];

/// Returns `true` for a header row: first field `url`, ignoring case and
/// surrounding whitespace.
pub fn is_header<F: AsRef<str>>(fields: &[F]) -> bool {
    fields
        .first()
        .is_some_and(|first| first.as_ref().trim().eq_ignore_ascii_case(COLUMNS[0]))
}

/// Parses one record into a request.
pub fn parse_record<F: AsRef<str>>(fields: &[F]) -> Result<BindRequest> {
    if fields.len() > COLUMNS.len() {
        return Err(Error::InvalidRecord(format!(
            "expected at most {} fields, got {}",
            COLUMNS.len(),
            fields.len()
        )));
    }

    let cell = |index: usize| {
        fields
            .get(index)
            .map(|field| field.as_ref().trim())
            .filter(|field| !field.is_empty())
    };

    let url = cell(0).ok_or_else(|| Error::InvalidRecord("url is missing".to_string()))?;

    Ok(BindRequest {
        url: url.to_string(),
        id: cell(1).map(str::to_string),
        max_access: parse_cell(cell(2), COLUMNS[2])?,
        expire_at: parse_cell::<Timestamp>(cell(3), COLUMNS[3])?,
        ttl: parse_cell(cell(4), COLUMNS[4])?,
        expired_url: cell(5).map(str::to_string),
        exhausted_url: cell(6).map(str::to_string),
    })
}

fn parse_cell<T>(value: Option<&str>, column: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    value
        .map(|raw| {
            raw.parse::<T>()
                .map_err(|e| Error::InvalidRecord(format!("{column} '{raw}': {e}")))
        })
        .transpose()
}
