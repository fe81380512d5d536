//! Round-robin distribution of a whole year across a pool.
//!
//! Dates are grouped by ISO week. A week that offers every slot (five working
//! days, or seven days) goes to the next member in rotation order. Days of
//! partial weeks, which only occur at the edges of the year, are handed out
//! one at a time to whoever carries the least load at that moment.

use std::collections::HashMap;

use chrono::{Datelike, IsoWeek, NaiveDate};
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::{
  UserId,
  selection::{Candidate, pick_least_loaded},
};

/// One date of a plan and the member who holds it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlannedDay {
  pub date:         NaiveDate,
  pub user_id:      UserId,
  /// First date of the chunk (week or single day) this date was planned in.
  pub period_start: NaiveDate,
}

/// Distribute `dates` (ascending) across `members` in rotation order.
///
/// Loads start at zero: the caller is expected to have wiped the year before
/// planning it. Returns an empty plan when `members` is empty.
pub fn plan_rotation<R>(
  dates: &[NaiveDate],
  members: &[UserId],
  working_days_only: bool,
  rng: &mut R,
) -> Vec<PlannedDay>
where
  R: Rng + ?Sized,
{
  if members.is_empty() {
    return Vec::new();
  }

  let full_week = if working_days_only { 5 } else { 7 };
  let mut loads: HashMap<UserId, Candidate> =
    members.iter().map(|&id| (id, Candidate::fresh(id))).collect();
  let mut cursor = 0usize;
  let mut plan = Vec::with_capacity(dates.len());

  for week in iso_weeks(dates) {
    if week.len() == full_week {
      let holder = members[cursor % members.len()];
      cursor += 1;
      let period_start = week[0];
      for &date in week {
        record(&mut loads, holder, date);
        plan.push(PlannedDay { date, user_id: holder, period_start });
      }
      continue;
    }

    for &date in week {
      // Member order keeps candidate order independent of hash iteration.
      let candidates: Vec<Candidate> =
        members.iter().filter_map(|id| loads.get(id).copied()).collect();
      let Some(holder) = pick_least_loaded(&candidates, rng) else { continue };
      record(&mut loads, holder.user_id, date);
      plan.push(PlannedDay { date, user_id: holder.user_id, period_start: date });
    }
  }

  plan
}

fn record(loads: &mut HashMap<UserId, Candidate>, user_id: UserId, date: NaiveDate) {
  if let Some(c) = loads.get_mut(&user_id) {
    c.total_duties += 1;
    c.last_duty_date = Some(date);
  }
}

/// Split ascending `dates` into runs sharing an ISO week.
fn iso_weeks(dates: &[NaiveDate]) -> Vec<&[NaiveDate]> {
  let mut weeks = Vec::new();
  let mut start = 0;
  for i in 1..=dates.len() {
    let boundary = i == dates.len() || week_of(dates[i]) != week_of(dates[start]);
    if boundary {
      weeks.push(&dates[start..i]);
      start = i;
    }
  }
  weeks
}

fn week_of(date: NaiveDate) -> IsoWeek { date.iso_week() }

#[cfg(test)]
mod tests {
  use rand::{SeedableRng, rngs::StdRng};

  use super::*;
  use crate::period::{PeriodKind, is_weekend, resolve_period};

  fn d(y: i32, m: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, day).unwrap()
  }

  fn shares(plan: &[PlannedDay], members: &[UserId]) -> Vec<usize> {
    members
      .iter()
      .map(|m| plan.iter().filter(|p| p.user_id == *m).count())
      .collect()
  }

  #[test]
  fn working_days_2026_split_evenly_between_three() {
    let year = resolve_period(PeriodKind::Year, d(2026, 1, 1), true).unwrap();
    let members = [10, 20, 30];
    let mut rng = StdRng::seed_from_u64(42);
    let plan = plan_rotation(&year.dates, &members, true, &mut rng);

    assert_eq!(plan.len(), 261);
    assert!(plan.iter().all(|p| !is_weekend(p.date)));

    let counts = shares(&plan, &members);
    let spread = counts.iter().max().unwrap() - counts.iter().min().unwrap();
    assert!(spread <= 1, "uneven shares: {counts:?}");
  }

  #[test]
  fn every_date_planned_exactly_once() {
    let year = resolve_period(PeriodKind::Year, d(2027, 1, 1), false).unwrap();
    let mut rng = StdRng::seed_from_u64(1);
    let plan = plan_rotation(&year.dates, &[1, 2], false, &mut rng);
    let planned: Vec<NaiveDate> = plan.iter().map(|p| p.date).collect();
    assert_eq!(planned, year.dates);
  }

  #[test]
  fn full_weeks_rotate_in_member_order() {
    // 2026-01-05 is a Monday; three full weeks.
    let dates: Vec<NaiveDate> = d(2026, 1, 5).iter_days().take(21).collect();
    let mut rng = StdRng::seed_from_u64(0);
    let plan = plan_rotation(&dates, &[7, 8], false, &mut rng);

    assert!(plan[0..7].iter().all(|p| p.user_id == 7 && p.period_start == d(2026, 1, 5)));
    assert!(plan[7..14].iter().all(|p| p.user_id == 8 && p.period_start == d(2026, 1, 12)));
    assert!(plan[14..21].iter().all(|p| p.user_id == 7));
  }

  #[test]
  fn partial_week_days_go_to_least_loaded() {
    // Thursday..Sunday is a partial week; with three members nobody gets a
    // second day before everyone has one.
    let dates: Vec<NaiveDate> = d(2026, 1, 1).iter_days().take(4).collect();
    let mut rng = StdRng::seed_from_u64(9);
    let plan = plan_rotation(&dates, &[1, 2, 3], false, &mut rng);

    let first_three: std::collections::HashSet<UserId> =
      plan[0..3].iter().map(|p| p.user_id).collect();
    assert_eq!(first_three.len(), 3);
    assert!(plan.iter().all(|p| p.period_start == p.date));
  }

  #[test]
  fn empty_pool_plans_nothing() {
    let mut rng = StdRng::seed_from_u64(0);
    assert!(plan_rotation(&[d(2026, 1, 5)], &[], false, &mut rng).is_empty());
  }
}
