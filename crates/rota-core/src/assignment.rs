//! Assignment rows, statistics counters, and the engine's request/outcome
//! types.

use std::collections::BTreeMap;

use chrono::{DateTime, Datelike, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::{
  SectorId, UserId,
  period::{PeriodKind, ResolvedPeriod},
  planning::PlannedDay,
  selection::SelectionPath,
};

// ─── Stored rows ─────────────────────────────────────────────────────────────

/// One duty-day. A sector has at most one assignment per date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Assignment {
  pub assignment_id: i64,
  pub user_id:       UserId,
  pub sector_id:     SectorId,
  pub duty_date:     NaiveDate,
  /// First date of the period this row was generated for.
  pub period_start:  NaiveDate,
  pub created_at:    DateTime<Utc>,
  pub created_by:    Option<UserId>,
}

/// An assignment with the names a caller needs to display it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DutyEntry {
  #[serde(flatten)]
  pub assignment:  Assignment,
  pub user_name:   String,
  pub sector_name: String,
}

/// Per `(user, sector, year)` counters.
///
/// `total_duties` always equals the number of assignment rows for that
/// triple; `last_duty_date` is the latest of their dates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Statistics {
  pub user_id:        UserId,
  pub sector_id:      SectorId,
  pub year:           i32,
  pub total_duties:   i64,
  pub last_duty_date: Option<NaiveDate>,
  pub updated_at:     DateTime<Utc>,
}

/// How many of a set of dates fall into one calendar year, and the latest.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct YearTally {
  pub year:  i32,
  pub count: i64,
  pub last:  NaiveDate,
}

/// Split `dates` by calendar year. Statistics are kept per year, so a week
/// spanning New Year credits two rows.
pub fn tally_by_year(dates: &[NaiveDate]) -> Vec<YearTally> {
  let mut by_year: BTreeMap<i32, YearTally> = BTreeMap::new();
  for &date in dates {
    by_year
      .entry(date.year())
      .and_modify(|t| {
        t.count += 1;
        t.last = t.last.max(date);
      })
      .or_insert(YearTally { year: date.year(), count: 1, last: date });
  }
  by_year.into_values().collect()
}

// ─── Requests ────────────────────────────────────────────────────────────────

/// Input to [`crate::store::DutyStore::assign_period`].
#[derive(Debug, Clone)]
pub struct PeriodAssignment {
  pub sector_id:         SectorId,
  pub kind:              PeriodKind,
  pub start:             NaiveDate,
  pub created_by:        Option<UserId>,
  /// Allow the holder of the preceding period to be picked again.
  pub allow_same_holder: bool,
  pub working_days_only: bool,
}

impl PeriodAssignment {
  pub fn new(sector_id: SectorId, kind: PeriodKind, start: NaiveDate) -> Self {
    Self {
      sector_id,
      kind,
      start,
      created_by: None,
      allow_same_holder: false,
      working_days_only: false,
    }
  }
}

/// Input to [`crate::store::DutyStore::assign_manual`].
#[derive(Debug, Clone)]
pub struct ManualAssignment {
  pub sector_id:         SectorId,
  pub kind:              PeriodKind,
  pub start:             NaiveDate,
  pub user_id:           UserId,
  pub created_by:        Option<UserId>,
  /// Overwrite existing assignments and skip the pool membership check.
  pub force:             bool,
  pub working_days_only: bool,
}

/// Input to [`crate::store::DutyStore::plan_year`].
#[derive(Debug, Clone, Copy)]
pub struct YearPlanRequest {
  pub sector_id:         SectorId,
  pub year:              i32,
  pub working_days_only: bool,
}

// ─── Outcomes ────────────────────────────────────────────────────────────────

/// Result of a successful automatic or manual assignment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssignmentOutcome {
  pub sector_id:   SectorId,
  pub sector_name: String,
  pub user_id:     UserId,
  pub user_name:   String,
  pub period:      ResolvedPeriod,
  /// How the holder was chosen; `None` for manual assignments.
  pub selection:   Option<SelectionPath>,
  /// Rows deleted by a forced manual assignment.
  pub overwritten: Vec<Assignment>,
}

/// How many days one member received in a yearly plan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanShare {
  pub user_id:   UserId,
  pub user_name: String,
  pub days:      usize,
}

/// Result of [`crate::store::DutyStore::plan_year`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct YearPlan {
  pub sector_id:         SectorId,
  pub year:              i32,
  pub working_days_only: bool,
  /// Assignments of that year deleted before planning.
  pub removed:           usize,
  pub days:              Vec<PlannedDay>,
  pub shares:            Vec<PlanShare>,
}

/// One active pool member's bookings within a date range.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Availability {
  pub user_id:      UserId,
  pub user_name:    String,
  pub booked_dates: Vec<NaiveDate>,
  pub booked_count: usize,
  /// `true` only when the member has no booking at all in the range.
  pub available:    bool,
}

#[cfg(test)]
mod tests {
  use super::*;

  fn d(y: i32, m: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, day).unwrap()
  }

  #[test]
  fn tally_splits_new_year_week() {
    let dates: Vec<_> = d(2026, 12, 28).iter_days().take(7).collect();
    let tallies = tally_by_year(&dates);
    assert_eq!(tallies, vec![
      YearTally { year: 2026, count: 4, last: d(2026, 12, 31) },
      YearTally { year: 2027, count: 3, last: d(2027, 1, 3) },
    ]);
  }

  #[test]
  fn tally_of_nothing_is_empty() {
    assert!(tally_by_year(&[]).is_empty());
  }
}
