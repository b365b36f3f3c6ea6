//! Wire formats for calendar dates ("2025-06-01") and times of day
//! ("10:00"). The `time` crate's default serde representation is not
//! human-readable, so the API types opt into these helpers explicitly.

use std::sync::OnceLock;
use time::format_description::{self, FormatItem};
use time::{Date, Time};

fn date_format() -> &'static [FormatItem<'static>] {
    static FORMAT: OnceLock<Vec<FormatItem<'static>>> = OnceLock::new();
    FORMAT.get_or_init(|| {
        format_description::parse("[year]-[month]-[day]").expect("static date format is valid")
    })
}

fn time_format() -> &'static [FormatItem<'static>] {
    static FORMAT: OnceLock<Vec<FormatItem<'static>>> = OnceLock::new();
    FORMAT.get_or_init(|| {
        format_description::parse("[hour]:[minute]").expect("static time format is valid")
    })
}

pub fn parse_date(input: &str) -> Result<Date, time::error::Parse> {
    Date::parse(input, date_format())
}

pub fn parse_time(input: &str) -> Result<Time, time::error::Parse> {
    Time::parse(input, time_format())
}

pub mod date {
    use serde::{de, Deserialize, Deserializer, Serializer};
    use time::Date;

    pub fn serialize<S: Serializer>(value: &Date, serializer: S) -> Result<S::Ok, S::Error> {
        let formatted = value
            .format(super::date_format())
            .map_err(serde::ser::Error::custom)?;
        serializer.serialize_str(&formatted)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Date, D::Error> {
        let raw = String::deserialize(deserializer)?;
        super::parse_date(&raw).map_err(de::Error::custom)
    }
}

pub mod option_date {
    use serde::{de, Deserialize, Deserializer, Serializer};
    use time::Date;

    pub fn serialize<S: Serializer>(
        value: &Option<Date>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match value {
            Some(date) => super::date::serialize(date, serializer),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<Date>, D::Error> {
        let raw = Option::<String>::deserialize(deserializer)?;
        raw.map(|s| super::parse_date(&s).map_err(de::Error::custom))
            .transpose()
    }
}

pub mod option_time {
    use serde::{de, Deserialize, Deserializer, Serializer};
    use time::Time;

    pub fn serialize<S: Serializer>(
        value: &Option<Time>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match value {
            Some(time) => {
                let formatted = time
                    .format(super::time_format())
                    .map_err(serde::ser::Error::custom)?;
                serializer.serialize_str(&formatted)
            }
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<Time>, D::Error> {
        let raw = Option::<String>::deserialize(deserializer)?;
        raw.map(|s| super::parse_time(&s).map_err(de::Error::custom))
            .transpose()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_iso_date() {
        let date = parse_date("2025-06-01").unwrap();
        assert_eq!(date.to_string(), "2025-06-01");
    }

    #[test]
    fn parses_hour_minute() {
        let time = parse_time("10:00").unwrap();
        assert_eq!((time.hour(), time.minute()), (10, 0));
    }

    #[test]
    fn rejects_garbage() {
        assert!(parse_date("June 1st").is_err());
        assert!(parse_time("10am").is_err());
    }
}
