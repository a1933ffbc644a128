//! Serde helpers for optional local timestamps
//!
//! Reads RFC 3339 strings as well as offset-less `YYYY-MM-DDTHH:MM:SS[.f]`
//! values (taken as local time). The `0001-01-01T00:00:00` placeholder written
//! for never-checked entries, `null`, and unreadable values all map to `None`.

use chrono::{DateTime, Datelike, Local, NaiveDateTime};
use serde::{Deserialize, Deserializer, Serializer};

pub fn serialize<S: Serializer>(
    value: &Option<DateTime<Local>>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    match value {
        Some(at) => serializer.serialize_str(&at.to_rfc3339()),
        None => serializer.serialize_none(),
    }
}

pub fn deserialize<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<DateTime<Local>>, D::Error> {
    let raw: Option<String> = Option::deserialize(deserializer)?;
    Ok(raw.as_deref().and_then(parse_timestamp))
}

pub fn parse_timestamp(raw: &str) -> Option<DateTime<Local>> {
    if let Ok(at) = DateTime::parse_from_rfc3339(raw) {
        return (at.year() > 1).then(|| at.with_timezone(&Local));
    }

    let naive = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f").ok()?;
    if naive.year() <= 1 {
        return None;
    }
    naive.and_local_timezone(Local).earliest()
}
