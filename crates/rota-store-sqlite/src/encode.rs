//! Encoding and decoding helpers between Rust domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! Timestamps are stored as RFC 3339 strings with a fixed microsecond width,
//! dates as `YYYY-MM-DD`; both therefore sort correctly as text.

use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use rota_core::{
  SectorId, UserId,
  assignment::{Assignment, DutyEntry, Statistics},
  directory::{sector_name_or_default, user_name_or_default},
  pool::PoolEntry,
};

use crate::{Error, Result};

// ─── DateTime<Utc> ───────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String {
  dt.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

// ─── NaiveDate ───────────────────────────────────────────────────────────────

pub fn encode_date(d: NaiveDate) -> String { d.format("%Y-%m-%d").to_string() }

pub fn decode_date(s: &str) -> Result<NaiveDate> {
  NaiveDate::parse_from_str(s, "%Y-%m-%d")
    .map_err(|e| Error::DateParse(format!("{s:?}: {e}")))
}

/// `YYYY-01-01` and `YYYY-12-31` as stored text, for year-range predicates.
pub fn encode_year_range(year: i32) -> Result<(String, String)> {
  let (first, last) = rota_core::period::year_bounds(year)?;
  Ok((encode_date(first), encode_date(last)))
}

// ─── Row types ───────────────────────────────────────────────────────────────

/// Raw values read directly from a `pool_entries` row.
pub struct RawPoolEntry {
  pub user_id:   UserId,
  pub sector_id: SectorId,
  pub is_active: bool,
  pub added_at:  String,
  pub added_by:  Option<UserId>,
}

impl RawPoolEntry {
  pub const COLUMNS: &'static str = "p.user_id, p.sector_id, p.is_active, p.added_at, p.added_by";

  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      user_id:   row.get(0)?,
      sector_id: row.get(1)?,
      is_active: row.get(2)?,
      added_at:  row.get(3)?,
      added_by:  row.get(4)?,
    })
  }

  pub fn into_entry(self) -> Result<PoolEntry> {
    Ok(PoolEntry {
      user_id:   self.user_id,
      sector_id: self.sector_id,
      is_active: self.is_active,
      added_at:  decode_dt(&self.added_at)?,
      added_by:  self.added_by,
    })
  }
}

/// Raw values of an `assignments` row joined with directory names.
pub struct RawDutyEntry {
  pub assignment_id: i64,
  pub user_id:       UserId,
  pub sector_id:     SectorId,
  pub duty_date:     String,
  pub period_start:  String,
  pub created_at:    String,
  pub created_by:    Option<UserId>,
  pub user_name:     Option<String>,
  pub sector_name:   Option<String>,
}

impl RawDutyEntry {
  pub const SELECT: &'static str = "
    SELECT a.assignment_id, a.user_id, a.sector_id, a.duty_date,
           a.period_start, a.created_at, a.created_by,
           u.display_name, s.name
    FROM assignments a
    LEFT JOIN users   u ON u.user_id   = a.user_id
    LEFT JOIN sectors s ON s.sector_id = a.sector_id";

  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      assignment_id: row.get(0)?,
      user_id:       row.get(1)?,
      sector_id:     row.get(2)?,
      duty_date:     row.get(3)?,
      period_start:  row.get(4)?,
      created_at:    row.get(5)?,
      created_by:    row.get(6)?,
      user_name:     row.get(7)?,
      sector_name:   row.get(8)?,
    })
  }

  pub fn into_entry(self) -> Result<DutyEntry> {
    let user_name = user_name_or_default(self.user_id, self.user_name.as_deref());
    let sector_name = sector_name_or_default(self.sector_id, self.sector_name.as_deref());
    Ok(DutyEntry {
      assignment: Assignment {
        assignment_id: self.assignment_id,
        user_id:       self.user_id,
        sector_id:     self.sector_id,
        duty_date:     decode_date(&self.duty_date)?,
        period_start:  decode_date(&self.period_start)?,
        created_at:    decode_dt(&self.created_at)?,
        created_by:    self.created_by,
      },
      user_name,
      sector_name,
    })
  }
}

/// Raw values read directly from a `statistics` row.
pub struct RawStatistics {
  pub user_id:        UserId,
  pub sector_id:      SectorId,
  pub year:           i32,
  pub total_duties:   i64,
  pub last_duty_date: Option<String>,
  pub updated_at:     String,
}

impl RawStatistics {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      user_id:        row.get(0)?,
      sector_id:      row.get(1)?,
      year:           row.get(2)?,
      total_duties:   row.get(3)?,
      last_duty_date: row.get(4)?,
      updated_at:     row.get(5)?,
    })
  }

  pub fn into_statistics(self) -> Result<Statistics> {
    Ok(Statistics {
      user_id:        self.user_id,
      sector_id:      self.sector_id,
      year:           self.year,
      total_duties:   self.total_duties,
      last_duty_date: self.last_duty_date.as_deref().map(decode_date).transpose()?,
      updated_at:     decode_dt(&self.updated_at)?,
    })
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn timestamps_have_fixed_width() {
    let a = DateTime::parse_from_rfc3339("2026-01-01T00:00:00Z").unwrap().with_timezone(&Utc);
    let b = DateTime::parse_from_rfc3339("2026-01-01T00:00:00.5Z").unwrap().with_timezone(&Utc);
    assert_eq!(encode_dt(a), "2026-01-01T00:00:00.000000Z");
    assert!(encode_dt(a) < encode_dt(b));
    assert_eq!(decode_dt(&encode_dt(b)).unwrap(), b);
  }

  #[test]
  fn dates_are_iso() {
    let d = NaiveDate::from_ymd_opt(2026, 3, 9).unwrap();
    assert_eq!(encode_date(d), "2026-03-09");
    assert_eq!(decode_date("2026-03-09").unwrap(), d);
    assert!(decode_date("09.03.2026").is_err());
  }
}
