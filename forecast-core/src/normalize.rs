//! Rendering of provider timestamps into station-local display strings.
//!
//! Normalization is pure: records go in, display-ready records come out, and
//! the bookkeeping fields the narrator should never see are dropped.

use chrono::{DateTime, Datelike, FixedOffset, TimeZone, Utc};
use chrono_tz::Tz;
use std::fmt;

use crate::model::{DayRecord, HourRecord, NormalizedDay, NormalizedHour, RawTelemetryDocument};

const PRUNED_DAY_FIELDS: &[&str] = &["day_num", "month_num", "icon", "precip_icon"];

const PRUNED_HOUR_FIELDS: &[&str] = &[
    "day_num",
    "month_num",
    "icon",
    "precip_icon",
    "local_day",
    "local_hour",
];

/// Named display patterns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisplayFormat {
    /// `7:33 AM`
    ClockTime,
    /// `Tuesday, 11/14/2023`
    CalendarDay,
    /// `Tuesday, November 14th, 2023 at 4:13:20 PM`
    FullMoment,
    /// `7 33 PM`, the way the narrator is asked to read times aloud.
    SpokenClock,
}

impl DisplayFormat {
    pub fn render<Z>(&self, dt: &DateTime<Z>) -> String
    where
        Z: TimeZone,
        Z::Offset: fmt::Display,
    {
        match self {
            DisplayFormat::ClockTime => dt.format("%-I:%M %p").to_string(),
            DisplayFormat::CalendarDay => dt.format("%A, %m/%d/%Y").to_string(),
            DisplayFormat::FullMoment => format!(
                "{}, {} {}{}, {} at {}",
                dt.format("%A"),
                dt.format("%B"),
                dt.day(),
                ordinal_suffix(dt.day()),
                dt.format("%Y"),
                dt.format("%-I:%M:%S %p"),
            ),
            DisplayFormat::SpokenClock => dt.format("%-I %M %p").to_string(),
        }
    }
}

fn ordinal_suffix(day: u32) -> &'static str {
    match (day % 10, day % 100) {
        (_, 11..=13) => "th",
        (1, _) => "st",
        (2, _) => "nd",
        (3, _) => "rd",
        _ => "th",
    }
}

/// A point in time to render: either raw provider epoch seconds, or a local
/// time the caller already has (the live clock announcement).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Moment {
    Epoch(i64),
    Local(DateTime<FixedOffset>),
}

impl From<i64> for Moment {
    fn from(secs: i64) -> Self {
        Moment::Epoch(secs)
    }
}

impl From<DateTime<FixedOffset>> for Moment {
    fn from(dt: DateTime<FixedOffset>) -> Self {
        Moment::Local(dt)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Normalizer {
    zone: Tz,
}

impl Normalizer {
    pub fn new(zone: Tz) -> Self {
        Self { zone }
    }

    /// Use the station zone reported by the document, or `fallback` when the
    /// provider did not send a recognizable one.
    pub fn for_document(doc: &RawTelemetryDocument, fallback: Tz) -> Self {
        let zone = doc
            .timezone
            .as_deref()
            .and_then(|name| name.parse::<Tz>().ok())
            .unwrap_or(fallback);
        Self::new(zone)
    }

    pub fn zone(&self) -> Tz {
        self.zone
    }

    /// Render `moment` in the station zone.
    ///
    /// Epoch values outside the representable range violate the caller's
    /// contract; they come back as their decimal digits.
    pub fn render(&self, moment: impl Into<Moment>, format: DisplayFormat) -> String {
        match moment.into() {
            Moment::Epoch(secs) => match DateTime::<Utc>::from_timestamp(secs, 0) {
                Some(utc) => format.render(&utc.with_timezone(&self.zone)),
                None => secs.to_string(),
            },
            Moment::Local(dt) => format.render(&dt),
        }
    }

    pub fn day(&self, day: DayRecord) -> NormalizedDay {
        let DayRecord {
            day_start_local,
            sunrise,
            sunset,
            mut fields,
        } = day;

        for key in PRUNED_DAY_FIELDS {
            fields.remove(*key);
        }

        NormalizedDay {
            day_start_local: self.render(day_start_local, DisplayFormat::CalendarDay),
            sunrise: self.render(sunrise, DisplayFormat::ClockTime),
            sunset: self.render(sunset, DisplayFormat::ClockTime),
            fields,
        }
    }

    pub fn hour(&self, hour: HourRecord) -> NormalizedHour {
        let HourRecord { time, mut fields } = hour;

        for key in PRUNED_HOUR_FIELDS {
            fields.remove(*key);
        }

        NormalizedHour {
            time: self.render(time, DisplayFormat::FullMoment),
            fields,
        }
    }
}
