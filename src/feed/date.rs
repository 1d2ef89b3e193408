//! Publish date normalization.
//!
//! Feeds in the wild deliver `pubDate` in several grammars. [`normalize`]
//! tries each [`DateLayout`] in a fixed order and returns the first match
//! as a UTC instant.

use chrono::{
    DateTime, FixedOffset, NaiveDateTime, SecondsFormat, TimeZone, Utc, Weekday,
};
use chrono_tz::{OffsetComponents, Tz};

use crate::{GatorError, Result};

/// A publish date grammar, in the order they are tried.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateLayout {
    /// `Mon, 02 Jan 2006 15:04:05 -0700`
    Rfc1123Z,
    /// `Mon, 02 Jan 2006 15:04:05 MST`
    Rfc1123,
    /// `02 Jan 06 15:04 -0700`
    Rfc822Z,
    /// `02 Jan 06 15:04 MST`
    Rfc822,
    /// `2006-01-02T15:04:05Z07:00`
    Rfc3339,
}

impl DateLayout {
    /// All layouts in matching order.
    pub const ALL: [DateLayout; 5] = [
        DateLayout::Rfc1123Z,
        DateLayout::Rfc1123,
        DateLayout::Rfc822Z,
        DateLayout::Rfc822,
        DateLayout::Rfc3339,
    ];

    /// Parse `input` with this layout only.
    pub fn parse(self, input: &str) -> Option<DateTime<Utc>> {
        match self {
            DateLayout::Rfc1123Z => {
                let rest = strip_weekday(input)?;
                parse_numeric_offset(rest, "%d %b %Y %H:%M:%S %z")
            }
            DateLayout::Rfc1123 => {
                let rest = strip_weekday(input)?;
                parse_named_zone(rest, "%d %b %Y %H:%M:%S")
            }
            DateLayout::Rfc822Z => parse_numeric_offset(input, "%d %b %y %H:%M %z"),
            DateLayout::Rfc822 => parse_named_zone(input, "%d %b %y %H:%M"),
            DateLayout::Rfc3339 => DateTime::parse_from_rfc3339(input)
                .ok()
                .map(|dt| dt.with_timezone(&Utc)),
        }
    }

    /// Find the first layout that accepts `input`.
    #[cfg(test)]
    fn detect(input: &str) -> Option<DateLayout> {
        let input = input.trim();
        Self::ALL
            .into_iter()
            .find(|layout| layout.parse(input).is_some())
    }
}

/// Normalize a raw publish date to UTC.
pub fn normalize(raw: &str) -> Result<DateTime<Utc>> {
    let input = raw.trim();

    DateLayout::ALL
        .into_iter()
        .find_map(|layout| layout.parse(input))
        .ok_or_else(|| GatorError::UnparseableDate(raw.to_string()))
}

/// Format an instant in the canonical form (RFC 3339, UTC).
pub fn canonical(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Strip a leading `Mon, ` weekday. The weekday itself is not checked
/// against the date.
fn strip_weekday(input: &str) -> Option<&str> {
    let (day, rest) = input.split_once(',')?;
    if day.len() != 3 || day.parse::<Weekday>().is_err() {
        return None;
    }
    Some(rest.trim_start())
}

fn parse_numeric_offset(input: &str, fmt: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_str(input, fmt)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

fn parse_named_zone(input: &str, fmt: &str) -> Option<DateTime<Utc>> {
    let (head, zone) = input.rsplit_once(char::is_whitespace)?;
    let naive = NaiveDateTime::parse_from_str(head.trim_end(), fmt).ok()?;
    resolve_zone(zone, &naive)
}

/// Offset in hours for the zone names RFC 822 defines.
fn rfc822_offset_hours(zone: &str) -> Option<i32> {
    let hours = match zone {
        "UT" | "UTC" | "GMT" | "Z" => 0,
        "EST" => -5,
        "EDT" => -4,
        "CST" => -6,
        "CDT" => -5,
        "MST" => -7,
        "MDT" => -6,
        "PST" => -8,
        "PDT" => -7,
        _ => return None,
    };
    Some(hours)
}

fn resolve_zone(zone: &str, naive: &NaiveDateTime) -> Option<DateTime<Utc>> {
    if let Some(hours) = rfc822_offset_hours(zone) {
        return fixed_to_utc(FixedOffset::east_opt(hours * 3600)?, naive);
    }

    if let Ok(tz) = zone.parse::<Tz>() {
        // Area/City names follow the zone's DST rules. A bare abbreviation
        // names one offset, so it always reads as standard time.
        if zone.contains('/') {
            if let Some(dt) = tz.from_local_datetime(naive).earliest() {
                return Some(dt.with_timezone(&Utc));
            }
        }
        return fixed_to_utc(standard_offset(tz, naive)?, naive);
    }

    // Unknown abbreviations are read as UTC.
    if (3..=5).contains(&zone.len()) && zone.chars().all(|c| c.is_ascii_uppercase()) {
        return Some(Utc.from_utc_datetime(naive));
    }

    None
}

fn standard_offset(tz: Tz, naive: &NaiveDateTime) -> Option<FixedOffset> {
    let base = tz.offset_from_utc_datetime(naive).base_utc_offset();
    FixedOffset::east_opt(i32::try_from(base.num_seconds()).ok()?)
}

fn fixed_to_utc(offset: FixedOffset, naive: &NaiveDateTime) -> Option<DateTime<Utc>> {
    offset
        .from_local_datetime(naive)
        .single()
        .map(|dt| dt.with_timezone(&Utc))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn utc(y: i32, mo: u32, d: u32, h: u32, mi: u32, s: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, mo, d, h, mi, s).unwrap()
    }

    #[test]
    fn test_rfc1123_numeric_offset() {
        let dt = normalize("Mon, 02 Jan 2006 15:04:05 -0700").unwrap();
        assert_eq!(dt, utc(2006, 1, 2, 22, 4, 5));
        assert_eq!(canonical(&dt), "2006-01-02T22:04:05Z");
    }

    #[test]
    fn test_rfc1123_named_zone() {
        assert_eq!(
            normalize("Mon, 02 Jan 2006 15:04:05 GMT").unwrap(),
            utc(2006, 1, 2, 15, 4, 5)
        );
        assert_eq!(
            normalize("Mon, 02 Jan 2006 15:04:05 PST").unwrap(),
            utc(2006, 1, 2, 23, 4, 5)
        );
        assert_eq!(
            normalize("Mon, 02 Jan 2006 15:04:05 EDT").unwrap(),
            utc(2006, 1, 2, 19, 4, 5)
        );
    }

    #[test]
    fn test_iana_zone_name() {
        // CET is UTC+1 in January.
        assert_eq!(
            normalize("Mon, 02 Jan 2006 15:04:05 CET").unwrap(),
            utc(2006, 1, 2, 14, 4, 5)
        );
    }

    #[test]
    fn test_abbreviation_ignores_summer_time() {
        assert_eq!(
            normalize("Mon, 01 Jul 2024 12:00:00 CET").unwrap(),
            utc(2024, 7, 1, 11, 0, 0)
        );
        assert_eq!(
            normalize("Mon, 01 Jul 2024 12:00:00 EET").unwrap(),
            utc(2024, 7, 1, 10, 0, 0)
        );
    }

    #[test]
    fn test_abbreviation_in_spring_forward_gap() {
        assert_eq!(
            normalize("Sun, 31 Mar 2024 02:30:00 CET").unwrap(),
            utc(2024, 3, 31, 1, 30, 0)
        );
    }

    #[test]
    fn test_area_city_zone() {
        // Europe/Paris observes summer time.
        assert_eq!(
            normalize("Mon, 01 Jul 2024 12:00:00 Europe/Paris").unwrap(),
            utc(2024, 7, 1, 10, 0, 0)
        );
        // 02:30 does not exist on this day, so the standard offset applies.
        assert_eq!(
            normalize("Sun, 31 Mar 2024 02:30:00 Europe/Paris").unwrap(),
            utc(2024, 3, 31, 1, 30, 0)
        );
    }

    #[test]
    fn test_long_uppercase_token_is_rejected() {
        assert!(matches!(
            normalize("Mon, 02 Jan 2006 15:04:05 NOTAZONE"),
            Err(GatorError::UnparseableDate(_))
        ));
        assert!(normalize("Mon, 02 Jan 2006 15:04:05 ABCDE").is_ok());
    }

    #[test]
    fn test_unknown_abbreviation_is_utc() {
        assert_eq!(
            normalize("Mon, 02 Jan 2006 15:04:05 XYZ").unwrap(),
            utc(2006, 1, 2, 15, 4, 5)
        );
    }

    #[test]
    fn test_rfc822_numeric_offset() {
        assert_eq!(
            normalize("02 Jan 06 15:04 -0700").unwrap(),
            utc(2006, 1, 2, 22, 4, 0)
        );
    }

    #[test]
    fn test_rfc822_named_zone() {
        assert_eq!(
            normalize("02 Jan 06 15:04 UTC").unwrap(),
            utc(2006, 1, 2, 15, 4, 0)
        );
    }

    #[test]
    fn test_rfc3339() {
        assert_eq!(
            normalize("2006-01-02T15:04:05+07:00").unwrap(),
            utc(2006, 1, 2, 8, 4, 5)
        );
        assert_eq!(
            normalize("2006-01-02T15:04:05Z").unwrap(),
            utc(2006, 1, 2, 15, 4, 5)
        );
    }

    #[test]
    fn test_surrounding_whitespace() {
        assert_eq!(
            normalize("  Mon, 02 Jan 2006 15:04:05 -0700\n").unwrap(),
            utc(2006, 1, 2, 22, 4, 5)
        );
    }

    #[test]
    fn test_weekday_not_checked() {
        assert_eq!(
            normalize("Fri, 02 Jan 2006 15:04:05 +0000").unwrap(),
            utc(2006, 1, 2, 15, 4, 5)
        );
    }

    #[test]
    fn test_unparseable() {
        for raw in ["not-a-date", "", "   ", "02/01/2006", "Mon, 02 Jan 2006"] {
            assert!(
                matches!(normalize(raw), Err(GatorError::UnparseableDate(_))),
                "{raw:?} should not parse"
            );
        }
    }

    #[test]
    fn test_idempotent_on_canonical_output() {
        let dt = normalize("Mon, 02 Jan 2006 15:04:05 -0700").unwrap();
        assert_eq!(normalize(&canonical(&dt)).unwrap(), dt);
        assert_eq!(normalize(&dt.to_rfc3339()).unwrap(), dt);
    }

    #[test]
    fn test_layout_order() {
        assert_eq!(
            DateLayout::detect("Mon, 02 Jan 2006 15:04:05 -0700"),
            Some(DateLayout::Rfc1123Z)
        );
        assert_eq!(
            DateLayout::detect("Mon, 02 Jan 2006 15:04:05 MST"),
            Some(DateLayout::Rfc1123)
        );
        assert_eq!(
            DateLayout::detect("02 Jan 06 15:04 +0100"),
            Some(DateLayout::Rfc822Z)
        );
        assert_eq!(
            DateLayout::detect("02 Jan 06 15:04 GMT"),
            Some(DateLayout::Rfc822)
        );
        assert_eq!(
            DateLayout::detect("2006-01-02T15:04:05Z"),
            Some(DateLayout::Rfc3339)
        );
        assert_eq!(DateLayout::detect("yesterday"), None);
    }

    #[test]
    fn test_named_layout_rejects_numeric_offset() {
        let input = "Mon, 02 Jan 2006 15:04:05 -0700";
        assert!(DateLayout::Rfc1123.parse(input).is_none());
        assert!(DateLayout::Rfc1123Z.parse(input).is_some());
    }
}
