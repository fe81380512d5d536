//! Period calculator: turns a semantic period into concrete duty dates.
//!
//! Everything here is pure: no clock reads, no I/O. Callers that want
//! "next week" pass their own reference date to [`next_monday`].

use chrono::{Datelike, Days, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

// ─── Kind ────────────────────────────────────────────────────────────────────

/// The span a single duty holder is assigned to.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Hash,
  Serialize,
  Deserialize,
  strum::Display,
  strum::EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum PeriodKind {
  Day,
  Week,
  Month,
  Year,
}

// ─── Resolved period ─────────────────────────────────────────────────────────

/// A period pinned to the calendar.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedPeriod {
  pub kind:  PeriodKind,
  /// First calendar date of the span (before working-day filtering).
  pub start: NaiveDate,
  /// Last calendar date of the span, inclusive.
  pub end:   NaiveDate,
  /// The duty dates, ascending. Weekends are absent when the period was
  /// resolved with `working_days_only`.
  pub dates: Vec<NaiveDate>,
}

impl ResolvedPeriod {
  pub fn len(&self) -> usize { self.dates.len() }

  pub fn is_empty(&self) -> bool { self.dates.is_empty() }
}

/// Resolve `kind` anchored at `start` into an ordered list of dates.
///
/// - `Day`: `start` alone.
/// - `Week`: seven consecutive days beginning at `start`.
/// - `Month`: the whole calendar month containing `start`.
/// - `Year`: the whole calendar year containing `start`.
///
/// With `working_days_only`, Saturdays and Sundays are dropped. A period left
/// without any date is rejected as [`Error::InvalidPeriod`].
pub fn resolve_period(
  kind: PeriodKind,
  start: NaiveDate,
  working_days_only: bool,
) -> Result<ResolvedPeriod> {
  let (first, last) = match kind {
    PeriodKind::Day => (start, start),
    PeriodKind::Week => {
      let end = start
        .checked_add_days(Days::new(6))
        .ok_or_else(|| out_of_range(start))?;
      (start, end)
    }
    PeriodKind::Month => month_bounds(start.year(), start.month())?,
    PeriodKind::Year => year_bounds(start.year())?,
  };

  let dates: Vec<NaiveDate> = first
    .iter_days()
    .take_while(|d| *d <= last)
    .filter(|d| !working_days_only || !is_weekend(*d))
    .collect();

  if dates.is_empty() {
    return Err(Error::InvalidPeriod(format!(
      "{kind} starting {start} contains no working days"
    )));
  }

  Ok(ResolvedPeriod { kind, start: first, end: last, dates })
}

// ─── Calendar helpers ────────────────────────────────────────────────────────

/// First and last day of `month` in `year`.
pub fn month_bounds(year: i32, month: u32) -> Result<(NaiveDate, NaiveDate)> {
  if !(1..=12).contains(&month) {
    return Err(Error::InvalidPeriod(format!(
      "month must be within 1-12, got {month}"
    )));
  }
  let first = NaiveDate::from_ymd_opt(year, month, 1)
    .ok_or_else(|| Error::InvalidPeriod(format!("year {year} is out of range")))?;
  let last = first
    .checked_add_months(chrono::Months::new(1))
    .and_then(|next| next.pred_opt())
    .ok_or_else(|| out_of_range(first))?;
  Ok((first, last))
}

/// January 1st and December 31st of `year`.
pub fn year_bounds(year: i32) -> Result<(NaiveDate, NaiveDate)> {
  match (
    NaiveDate::from_ymd_opt(year, 1, 1),
    NaiveDate::from_ymd_opt(year, 12, 31),
  ) {
    (Some(first), Some(last)) => Ok((first, last)),
    _ => Err(Error::InvalidPeriod(format!("year {year} is out of range"))),
  }
}

/// Saturday or Sunday.
pub fn is_weekend(date: NaiveDate) -> bool {
  matches!(date.weekday(), Weekday::Sat | Weekday::Sun)
}

/// Monday of the ISO week containing `date`.
///
/// Fails with [`Error::InvalidPeriod`] in the first days of the calendar,
/// whose Monday is not representable.
pub fn week_anchor(date: NaiveDate) -> Result<NaiveDate> {
  date
    .checked_sub_days(Days::new(u64::from(date.weekday().num_days_from_monday())))
    .ok_or_else(|| Error::InvalidPeriod(format!("week of {date} leaves the calendar range")))
}

/// The first Monday strictly after `reference`.
///
/// Interactive callers use this as the default start of a weekly assignment.
pub fn next_monday(reference: NaiveDate) -> Result<NaiveDate> {
  week_anchor(reference)?
    .checked_add_days(Days::new(7))
    .ok_or_else(|| Error::InvalidPeriod(format!("no Monday follows {reference}")))
}

fn out_of_range(date: NaiveDate) -> Error {
  Error::InvalidPeriod(format!("period starting {date} leaves the calendar range"))
}

#[cfg(test)]
mod tests {
  use super::*;

  fn d(y: i32, m: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, day).unwrap()
  }

  #[test]
  fn day_is_single_date() {
    let p = resolve_period(PeriodKind::Day, d(2026, 5, 13), false).unwrap();
    assert_eq!(p.dates, vec![d(2026, 5, 13)]);
    assert_eq!(p.start, p.end);
  }

  #[test]
  fn week_is_seven_days_from_start() {
    let p = resolve_period(PeriodKind::Week, d(2026, 12, 28), false).unwrap();
    assert_eq!(p.len(), 7);
    assert_eq!(p.dates.first(), Some(&d(2026, 12, 28)));
    assert_eq!(p.dates.last(), Some(&d(2027, 1, 3)));
  }

  #[test]
  fn week_working_days_drops_weekend() {
    let p = resolve_period(PeriodKind::Week, d(2026, 3, 2), true).unwrap();
    assert_eq!(p.len(), 5);
    assert!(p.dates.iter().all(|date| !is_weekend(*date)));
    assert_eq!(p.end, d(2026, 3, 8));
  }

  #[test]
  fn month_covers_whole_month_regardless_of_start() {
    let p = resolve_period(PeriodKind::Month, d(2028, 2, 17), false).unwrap();
    assert_eq!(p.start, d(2028, 2, 1));
    assert_eq!(p.end, d(2028, 2, 29));
    assert_eq!(p.len(), 29);
  }

  #[test]
  fn december_month_bounds() {
    assert_eq!(month_bounds(2026, 12).unwrap(), (d(2026, 12, 1), d(2026, 12, 31)));
  }

  #[test]
  fn month_out_of_range_is_invalid() {
    assert!(matches!(month_bounds(2026, 13), Err(Error::InvalidPeriod(_))));
    assert!(matches!(month_bounds(2026, 0), Err(Error::InvalidPeriod(_))));
  }

  #[test]
  fn year_counts() {
    let all = resolve_period(PeriodKind::Year, d(2026, 7, 4), false).unwrap();
    assert_eq!(all.len(), 365);
    let working = resolve_period(PeriodKind::Year, d(2026, 7, 4), true).unwrap();
    assert_eq!(working.len(), 261);
    assert_eq!(working.start, d(2026, 1, 1));
    assert_eq!(working.end, d(2026, 12, 31));
  }

  #[test]
  fn weekend_day_with_working_days_only_is_invalid() {
    let err = resolve_period(PeriodKind::Day, d(2026, 3, 7), true).unwrap_err();
    assert!(matches!(err, Error::InvalidPeriod(_)));
  }

  #[test]
  fn anchors() {
    assert_eq!(week_anchor(d(2026, 10, 16)).unwrap(), d(2026, 10, 12));
    assert_eq!(week_anchor(d(2026, 10, 12)).unwrap(), d(2026, 10, 12));
    assert_eq!(next_monday(d(2026, 10, 16)).unwrap(), d(2026, 10, 19));
    assert_eq!(next_monday(d(2026, 10, 19)).unwrap(), d(2026, 10, 26));
  }

  #[test]
  fn anchors_at_the_calendar_edges_fail_cleanly() {
    // Days before the first representable Monday have no anchor.
    let leading = (7 - NaiveDate::MIN.weekday().num_days_from_monday()) % 7;
    for offset in 0..7 {
      let date = NaiveDate::MIN + Days::new(u64::from(offset));
      match week_anchor(date) {
        Ok(monday) => {
          assert!(offset >= leading, "{date} anchored to {monday}");
          assert_eq!(monday.weekday(), Weekday::Mon);
        }
        Err(err) => {
          assert!(offset < leading, "{date} failed: {err}");
          assert!(matches!(err, Error::InvalidPeriod(_)));
        }
      }
    }

    let err = next_monday(NaiveDate::MAX).unwrap_err();
    assert!(matches!(err, Error::InvalidPeriod(_)));
  }

  #[test]
  fn kind_parses_and_displays() {
    assert_eq!("month".parse::<PeriodKind>().unwrap(), PeriodKind::Month);
    assert_eq!(PeriodKind::Week.to_string(), "week");
    assert_eq!(
      serde_json::to_string(&PeriodKind::Year).unwrap(),
      "\"year\""
    );
  }
}
