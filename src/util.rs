use std::iter::repeat;
use std::path::{Path, PathBuf};

use base64::engine::GeneralPurpose;
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};

use crate::error::ServiceError;

pub fn find_first_subpath<P: AsRef<Path>, F: Fn(&Path) -> bool>(
    root: impl AsRef<Path>,
    subpaths: &[P],
    search: F,
) -> Option<PathBuf> {
    subpaths
        .iter()
        .zip(repeat(root.as_ref()))
        .map(|(b, a)| a.join(b))
        .find(|it: &PathBuf| search(it))
}

pub fn base64_engine() -> GeneralPurpose {
    base64::engine::GeneralPurpose::new(
        &base64::alphabet::URL_SAFE,
        base64::engine::GeneralPurposeConfig::new(),
    )
}

/// Parses an ISO 8601 date or date-time.
///
/// Accepts RFC 3339 (`2024-05-01T12:00:00Z`), a naive date-time
/// (`2024-05-01T12:00[:00]`, read as UTC) and a plain date (`2024-05-01`,
/// midnight UTC).
pub fn parse_iso_date(value: &str) -> Result<DateTime<Utc>, ServiceError> {
    let value = value.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Ok(dt.with_timezone(&Utc));
    }

    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M:%S"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(value, format) {
            return Ok(naive.and_utc());
        }
    }

    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
        .ok_or_else(|| ServiceError::Validation(format!("'{}' is not an ISO 8601 date.", value)))
}

pub mod date_time_as_unix_seconds {
    //! JWT "NumericDate" (RFC 7519 section 2) for `DateTime<Utc>`.
    use chrono::{DateTime, TimeZone, Utc};
    use serde::{self, Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(date: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_i64(date.timestamp())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
    where
        D: Deserializer<'de>,
    {
        Utc.timestamp_opt(i64::deserialize(deserializer)?, 0)
            .single()
            .ok_or_else(|| serde::de::Error::custom("Invalid Unix timestamp value."))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Timelike};

    #[test]
    fn parses_supported_iso_shapes() {
        let full = parse_iso_date("2024-05-01T08:30:00+02:00").unwrap();
        assert_eq!(full.hour(), 6);

        let naive = parse_iso_date("2024-05-01T08:30").unwrap();
        assert_eq!((naive.hour(), naive.minute()), (8, 30));

        let date = parse_iso_date("2024-05-01").unwrap();
        assert_eq!((date.month(), date.day(), date.hour()), (5, 1, 0));
    }

    #[test]
    fn rejects_garbage_dates() {
        assert!(matches!(
            parse_iso_date("next friday"),
            Err(ServiceError::Validation(_))
        ));
    }
}
