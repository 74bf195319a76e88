//! # Window Boundaries
//!
//! "Today" and "this week" in the shop's reference zone.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Records are stored in UTC. The zone is applied once, here:            │
//! │                                                                         │
//! │   now (UTC) ──► local date ──► local midnight ──► back to UTC           │
//! │                      │                                                  │
//! │                      └── ThisWeek: step back to Monday first            │
//! │                                                                         │
//! │   Window = [start, now]   (now inclusive: a caller sees its own sale)   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! When a DST jump skips local midnight, the window starts at the first
//! local instant of the day that exists.

use chrono::{DateTime, Datelike, Duration, FixedOffset, Local, NaiveDate, NaiveTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::ValidationError;
use crate::types::WindowKind;

// =============================================================================
// Window Bounds
// =============================================================================

/// An inclusive UTC interval `[start, end]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WindowBounds {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl WindowBounds {
    #[inline]
    pub fn contains(&self, at: DateTime<Utc>) -> bool {
        at >= self.start && at <= self.end
    }
}

// =============================================================================
// Reference Zone
// =============================================================================

/// The zone in which "midnight" and "Monday" are evaluated.
///
/// Parsed from `utc`, `local` or a fixed offset such as `+01:00`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum ReferenceZone {
    #[default]
    Utc,
    /// The host's zone, DST-aware.
    Local,
    Fixed(FixedOffset),
}

impl ReferenceZone {
    /// Start of the window containing `now`.
    pub fn window_start(&self, kind: WindowKind, now: DateTime<Utc>) -> DateTime<Utc> {
        match self {
            ReferenceZone::Utc => start_in(&Utc, kind, now),
            ReferenceZone::Local => start_in(&Local, kind, now),
            ReferenceZone::Fixed(offset) => start_in(offset, kind, now),
        }
    }

    /// `[window_start, now]`.
    ///
    /// ## Example
    /// ```rust
    /// use barber_core::types::WindowKind;
    /// use barber_core::window::ReferenceZone;
    /// use chrono::{TimeZone, Utc};
    ///
    /// // Wednesday afternoon
    /// let now = Utc.with_ymd_and_hms(2026, 10, 21, 15, 0, 0).unwrap();
    /// let week = ReferenceZone::Utc.bounds(WindowKind::ThisWeek, now);
    /// assert_eq!(week.start, Utc.with_ymd_and_hms(2026, 10, 19, 0, 0, 0).unwrap());
    /// assert_eq!(week.end, now);
    /// ```
    pub fn bounds(&self, kind: WindowKind, now: DateTime<Utc>) -> WindowBounds {
        WindowBounds {
            start: self.window_start(kind, now),
            end: now,
        }
    }
}

fn start_in<Tz: TimeZone>(tz: &Tz, kind: WindowKind, now: DateTime<Utc>) -> DateTime<Utc> {
    let today = now.with_timezone(tz).date_naive();
    let day = match kind {
        WindowKind::Today => today,
        WindowKind::ThisWeek => {
            today - Duration::days(today.weekday().num_days_from_monday() as i64)
        }
    };
    first_instant_of(tz, day)
}

fn first_instant_of<Tz: TimeZone>(tz: &Tz, day: NaiveDate) -> DateTime<Utc> {
    let midnight = day.and_time(NaiveTime::MIN);
    let mut candidate = midnight;
    // DST gaps are at most a few hours
    for _ in 0..(4 * 24) {
        if let Some(instant) = tz.from_local_datetime(&candidate).earliest() {
            return instant.with_timezone(&Utc);
        }
        candidate = candidate + Duration::minutes(15);
    }
    Utc.from_utc_datetime(&midnight)
}

impl FromStr for ReferenceZone {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        match s.to_lowercase().as_str() {
            "utc" | "z" => return Ok(ReferenceZone::Utc),
            "local" => return Ok(ReferenceZone::Local),
            _ => {}
        }
        parse_offset(s).map(ReferenceZone::Fixed).ok_or_else(|| {
            ValidationError::InvalidFormat {
                field: "timezone".to_string(),
                reason: format!("'{}' is not utc, local or an offset like +01:00", s),
            }
        })
    }
}

fn parse_offset(s: &str) -> Option<FixedOffset> {
    let (sign, rest) = match s.as_bytes().first()? {
        b'+' => (1, &s[1..]),
        b'-' => (-1, &s[1..]),
        _ => return None,
    };
    let (hours, minutes) = match rest.split_once(':') {
        Some((h, m)) => (h, m),
        None if rest.len() == 4 => rest.split_at(2),
        None => (rest, "0"),
    };
    let hours: i32 = hours.parse().ok()?;
    let minutes: i32 = minutes.parse().ok()?;
    if hours > 23 || minutes > 59 {
        return None;
    }
    FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60))
}

impl fmt::Display for ReferenceZone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReferenceZone::Utc => write!(f, "utc"),
            ReferenceZone::Local => write!(f, "local"),
            ReferenceZone::Fixed(offset) => write!(f, "{}", offset),
        }
    }
}

impl TryFrom<String> for ReferenceZone {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<ReferenceZone> for String {
    fn from(zone: ReferenceZone) -> Self {
        zone.to_string()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn utc(y: i32, mo: u32, d: u32, h: u32, mi: u32, s: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, mo, d, h, mi, s).unwrap()
    }

    #[test]
    fn test_today_starts_at_utc_midnight() {
        let now = utc(2026, 10, 19, 14, 30, 0);
        let bounds = ReferenceZone::Utc.bounds(WindowKind::Today, now);
        assert_eq!(bounds.start, utc(2026, 10, 19, 0, 0, 0));
        assert!(bounds.contains(now));
        assert!(!bounds.contains(utc(2026, 10, 18, 23, 59, 59)));
    }

    #[test]
    fn test_week_starts_on_monday() {
        // 2026-10-19 is a Monday
        for day in 19..=25 {
            let now = utc(2026, 10, day, 9, 0, 0);
            assert_eq!(
                ReferenceZone::Utc.window_start(WindowKind::ThisWeek, now),
                utc(2026, 10, 19, 0, 0, 0)
            );
        }
        let next_monday = utc(2026, 10, 26, 0, 0, 0);
        assert_eq!(
            ReferenceZone::Utc.window_start(WindowKind::ThisWeek, next_monday),
            next_monday
        );
    }

    #[test]
    fn test_fixed_offset_day_boundary() {
        let zone: ReferenceZone = "+01:00".parse().unwrap();
        // 23:30 UTC is already 00:30 on the next local day
        let now = utc(2026, 10, 19, 23, 30, 0);
        assert_eq!(
            zone.window_start(WindowKind::Today, now),
            utc(2026, 10, 19, 23, 0, 0)
        );

        let zone: ReferenceZone = "-03:00".parse().unwrap();
        assert_eq!(
            zone.window_start(WindowKind::Today, utc(2026, 10, 19, 2, 0, 0)),
            utc(2026, 10, 18, 3, 0, 0)
        );
    }

    #[test]
    fn test_last_second_belongs_to_its_own_day() {
        let late = utc(2026, 10, 19, 23, 59, 59);
        let next = utc(2026, 10, 20, 0, 0, 1);
        let today = ReferenceZone::Utc.bounds(WindowKind::Today, next);
        assert!(!today.contains(late));
        assert_eq!(ReferenceZone::Utc.window_start(WindowKind::Today, late), utc(2026, 10, 19, 0, 0, 0));
    }

    #[test]
    fn test_zone_parsing() {
        assert_eq!("UTC".parse::<ReferenceZone>().unwrap(), ReferenceZone::Utc);
        assert_eq!("local".parse::<ReferenceZone>().unwrap(), ReferenceZone::Local);
        assert_eq!(
            "+0530".parse::<ReferenceZone>().unwrap(),
            ReferenceZone::Fixed(FixedOffset::east_opt(5 * 3600 + 30 * 60).unwrap())
        );
        assert!("Europe/Lisbon".parse::<ReferenceZone>().is_err());
        assert!("+25:00".parse::<ReferenceZone>().is_err());
        assert_eq!(ReferenceZone::Fixed(FixedOffset::east_opt(3600).unwrap()).to_string(), "+01:00");
    }

    #[test]
    fn test_zone_serde_as_string() {
        let zone: ReferenceZone = serde_json::from_str("\"+01:00\"").unwrap();
        assert_eq!(serde_json::to_string(&zone).unwrap(), "\"+01:00\"");
        assert!(serde_json::from_str::<ReferenceZone>("\"mars\"").is_err());
    }
}
