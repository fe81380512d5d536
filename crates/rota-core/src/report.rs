//! Read-model builders for schedule views and statistics summaries.
//!
//! Backends fetch the relevant [`DutyEntry`] rows; the shaping into weeks,
//! calendar grids, and yearly totals happens here so every backend renders
//! identical views.

use std::collections::{BTreeMap, HashMap};

use chrono::{Datelike, Days, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::{
  Result, UserId,
  assignment::DutyEntry,
  period::{is_weekend, month_bounds},
};

/// Holders listed per month in a [`YearOverview`].
pub const TOP_HOLDERS_PER_MONTH: usize = 3;
/// Holders listed for the whole year in a [`YearOverview`].
pub const TOP_HOLDERS_PER_YEAR: usize = 5;

// ─── Day slots ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DaySlot {
  pub date:       NaiveDate,
  /// 0 = Monday … 6 = Sunday.
  pub weekday:    u32,
  pub is_today:   bool,
  pub is_weekend: bool,
  pub duties:     Vec<DutyEntry>,
}

fn group_by_date(entries: Vec<DutyEntry>) -> BTreeMap<NaiveDate, Vec<DutyEntry>> {
  let mut by_date: BTreeMap<NaiveDate, Vec<DutyEntry>> = BTreeMap::new();
  for e in entries {
    by_date.entry(e.assignment.duty_date).or_default().push(e);
  }
  by_date
}

fn slot(
  date: NaiveDate,
  today: NaiveDate,
  by_date: &mut BTreeMap<NaiveDate, Vec<DutyEntry>>,
) -> DaySlot {
  DaySlot {
    date,
    weekday: date.weekday().num_days_from_monday(),
    is_today: date == today,
    is_weekend: is_weekend(date),
    duties: by_date.remove(&date).unwrap_or_default(),
  }
}

// ─── Week ────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeekView {
  pub start: NaiveDate,
  pub end:   NaiveDate,
  pub days:  Vec<DaySlot>,
}

/// Seven consecutive day slots starting at `start`.
pub fn build_week_view(
  start: NaiveDate,
  today: NaiveDate,
  entries: Vec<DutyEntry>,
) -> WeekView {
  let mut by_date = group_by_date(entries);
  let days: Vec<DaySlot> = start
    .iter_days()
    .take(7)
    .map(|date| slot(date, today, &mut by_date))
    .collect();
  WeekView { start, end: start + Days::new(6), days }
}

// ─── Month ───────────────────────────────────────────────────────────────────

/// A Monday-first calendar grid. Cells outside the month are `None`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonthCalendar {
  pub year:      i32,
  pub month:     u32,
  pub first_day: NaiveDate,
  pub last_day:  NaiveDate,
  pub weeks:     Vec<Vec<Option<DaySlot>>>,
}

pub fn build_month_calendar(
  year: i32,
  month: u32,
  today: NaiveDate,
  entries: Vec<DutyEntry>,
) -> Result<MonthCalendar> {
  let (first_day, last_day) = month_bounds(year, month)?;
  let mut by_date = group_by_date(entries);

  let mut weeks = Vec::new();
  let mut week: Vec<Option<DaySlot>> =
    vec![None; first_day.weekday().num_days_from_monday() as usize];

  for date in first_day.iter_days().take_while(|d| *d <= last_day) {
    week.push(Some(slot(date, today, &mut by_date)));
    if week.len() == 7 {
      weeks.push(std::mem::take(&mut week));
    }
  }
  if !week.is_empty() {
    week.resize(7, None);
    weeks.push(week);
  }

  Ok(MonthCalendar { year, month, first_day, last_day, weeks })
}

// ─── Year ────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HolderCount {
  pub user_id:   UserId,
  pub user_name: String,
  pub count:     usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonthTotals {
  pub month:        u32,
  pub total_duties: usize,
  pub top_holders:  Vec<HolderCount>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct YearOverview {
  pub year:              i32,
  pub total_duties:      usize,
  pub average_per_month: f64,
  /// Always twelve entries, January first.
  pub months:            Vec<MonthTotals>,
  pub top_holders:       Vec<HolderCount>,
}

/// Aggregate a year's entries into monthly totals and top holders.
///
/// Entries outside `year` are ignored.
pub fn build_year_overview(year: i32, entries: &[DutyEntry]) -> YearOverview {
  let in_year: Vec<&DutyEntry> = entries
    .iter()
    .filter(|e| e.assignment.duty_date.year() == year)
    .collect();

  let months = (1..=12)
    .map(|month| {
      let of_month: Vec<&DutyEntry> = in_year
        .iter()
        .copied()
        .filter(|e| e.assignment.duty_date.month() == month)
        .collect();
      MonthTotals {
        month,
        total_duties: of_month.len(),
        top_holders: top_holders(&of_month, TOP_HOLDERS_PER_MONTH),
      }
    })
    .collect();

  let total = in_year.len();
  YearOverview {
    year,
    total_duties: total,
    average_per_month: total as f64 / 12.0,
    months,
    top_holders: top_holders(&in_year, TOP_HOLDERS_PER_YEAR),
  }
}

/// Most frequent holders, busiest first, ties by ascending user id.
fn top_holders(entries: &[&DutyEntry], n: usize) -> Vec<HolderCount> {
  let mut counts: HashMap<UserId, HolderCount> = HashMap::new();
  for e in entries {
    counts
      .entry(e.assignment.user_id)
      .or_insert_with(|| HolderCount {
        user_id:   e.assignment.user_id,
        user_name: e.user_name.clone(),
        count:     0,
      })
      .count += 1;
  }
  let mut ranked: Vec<HolderCount> = counts.into_values().collect();
  ranked.sort_by(|a, b| b.count.cmp(&a.count).then(a.user_id.cmp(&b.user_id)));
  ranked.truncate(n);
  ranked
}

// ─── Distribution ────────────────────────────────────────────────────────────

pub const MONTH_LABELS: [&str; 12] = [
  "January", "February", "March", "April", "May", "June",
  "July", "August", "September", "October", "November", "December",
];
pub const WEEKDAY_LABELS: [&str; 7] = ["Mon", "Tue", "Wed", "Thu", "Fri", "Sat", "Sun"];

/// A labelled count series for charting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Series {
  pub labels: Vec<String>,
  pub data:   Vec<usize>,
}

impl Series {
  fn zeroed(labels: &[&str]) -> Self {
    Self {
      labels: labels.iter().map(|l| (*l).to_owned()).collect(),
      data:   vec![0; labels.len()],
    }
  }
}

/// How a year's duties spread over months and weekdays.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Distribution {
  pub year:    i32,
  /// January first.
  pub monthly: Series,
  /// Monday first.
  pub weekly:  Series,
  pub total:   usize,
}

/// Count a year's entries per month and per weekday.
///
/// Entries outside `year` are ignored.
pub fn build_distribution(year: i32, entries: &[DutyEntry]) -> Distribution {
  let mut monthly = Series::zeroed(&MONTH_LABELS);
  let mut weekly = Series::zeroed(&WEEKDAY_LABELS);
  let mut total = 0;
  for date in entries.iter().map(|e| e.assignment.duty_date) {
    if date.year() != year {
      continue;
    }
    monthly.data[date.month0() as usize] += 1;
    weekly.data[date.weekday().num_days_from_monday() as usize] += 1;
    total += 1;
  }
  Distribution { year, monthly, weekly, total }
}

// ─── Statistics summary ──────────────────────────────────────────────────────

/// One user's standing in a sector for a year.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SummaryRow {
  pub user_id:        UserId,
  pub user_name:      String,
  pub total_duties:   i64,
  pub last_duty_date: Option<NaiveDate>,
  /// Active pool membership right now.
  pub in_pool:        bool,
}

/// Pool members first, then heaviest load first, then by user id.
pub fn sort_summary(rows: &mut [SummaryRow]) {
  rows.sort_by(|a, b| {
    b.in_pool
      .cmp(&a.in_pool)
      .then(b.total_duties.cmp(&a.total_duties))
      .then(a.user_id.cmp(&b.user_id))
  });
}
