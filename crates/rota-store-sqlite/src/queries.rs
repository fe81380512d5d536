//! Synchronous read helpers shared by the engine's transactions and the
//! read-only query methods.
//!
//! Every function takes a plain `&Connection`; a `rusqlite::Transaction`
//! derefs to one, so the same helpers serve both paths.

use std::collections::HashSet;

use chrono::NaiveDate;
use rusqlite::{Connection, OptionalExtension as _, params};
use rota_core::{
  Error as DutyError, SectorId, UserId,
  assignment::{Assignment, DutyEntry, Statistics},
  directory::{DutyUser, Sector, user_name_or_default},
  pool::{Page, PoolEntry, PoolMember, PoolQuery},
  report::SummaryRow,
  selection::Candidate,
  store::{ScheduleQuery, StatisticsQuery},
};

use crate::{
  Result,
  encode::{RawDutyEntry, RawPoolEntry, RawStatistics, decode_date, encode_date},
};

/// `LIMIT`/`OFFSET` operand; anything past `i64::MAX` saturates.
fn sql_bound(n: usize) -> i64 { i64::try_from(n).unwrap_or(i64::MAX) }

// ─── Directory ───────────────────────────────────────────────────────────────

pub fn sector(conn: &Connection, sector_id: SectorId) -> Result<Option<Sector>> {
  Ok(
    conn
      .query_row(
        "SELECT sector_id, name FROM sectors WHERE sector_id = ?1",
        params![sector_id],
        |row| Ok(Sector { sector_id: row.get(0)?, name: row.get(1)? }),
      )
      .optional()?,
  )
}

pub fn require_sector(conn: &Connection, sector_id: SectorId) -> Result<Sector> {
  sector(conn, sector_id)?.ok_or_else(|| DutyError::SectorNotFound(sector_id).into())
}

pub fn user(conn: &Connection, user_id: UserId) -> Result<Option<DutyUser>> {
  Ok(
    conn
      .query_row(
        "SELECT user_id, display_name, is_duty_eligible FROM users WHERE user_id = ?1",
        params![user_id],
        |row| {
          Ok(DutyUser {
            user_id:          row.get(0)?,
            display_name:     row.get(1)?,
            is_duty_eligible: row.get(2)?,
          })
        },
      )
      .optional()?,
  )
}

pub fn require_user(conn: &Connection, user_id: UserId) -> Result<DutyUser> {
  user(conn, user_id)?.ok_or_else(|| DutyError::UserNotFound(user_id).into())
}

pub fn user_name(conn: &Connection, user_id: UserId) -> Result<String> {
  let name: Option<String> = conn
    .query_row(
      "SELECT display_name FROM users WHERE user_id = ?1",
      params![user_id],
      |row| row.get(0),
    )
    .optional()?
    .flatten();
  Ok(user_name_or_default(user_id, name.as_deref()))
}

// ─── Pool ────────────────────────────────────────────────────────────────────

pub fn pool_entry(
  conn: &Connection,
  user_id: UserId,
  sector_id: SectorId,
) -> Result<Option<PoolEntry>> {
  let sql = format!(
    "SELECT {} FROM pool_entries p WHERE p.user_id = ?1 AND p.sector_id = ?2",
    RawPoolEntry::COLUMNS
  );
  conn
    .query_row(&sql, params![user_id, sector_id], RawPoolEntry::from_row)
    .optional()?
    .map(RawPoolEntry::into_entry)
    .transpose()
}

pub fn is_active_member(
  conn: &Connection,
  user_id: UserId,
  sector_id: SectorId,
) -> Result<bool> {
  Ok(pool_entry(conn, user_id, sector_id)?.is_some_and(|e| e.is_active))
}

/// Active members of a sector in rotation order, with their load for `year`.
pub fn active_candidates(
  conn: &Connection,
  sector_id: SectorId,
  year: i32,
) -> Result<Vec<Candidate>> {
  let mut stmt = conn.prepare(
    "SELECT p.user_id, COALESCE(st.total_duties, 0), st.last_duty_date
     FROM pool_entries p
     LEFT JOIN statistics st
       ON st.user_id = p.user_id AND st.sector_id = p.sector_id AND st.year = ?2
     WHERE p.sector_id = ?1 AND p.is_active = 1
     ORDER BY p.added_at ASC, p.user_id ASC",
  )?;
  let rows = stmt
    .query_map(params![sector_id, year], |row| {
      Ok((
        row.get::<_, UserId>(0)?,
        row.get::<_, i64>(1)?,
        row.get::<_, Option<String>>(2)?,
      ))
    })?
    .collect::<rusqlite::Result<Vec<_>>>()?;

  rows
    .into_iter()
    .map(|(user_id, total_duties, last)| {
      Ok(Candidate {
        user_id,
        total_duties,
        last_duty_date: last.as_deref().map(decode_date).transpose()?,
      })
    })
    .collect()
}

pub fn list_pool(
  conn: &Connection,
  sector_id: SectorId,
  query: &PoolQuery,
) -> Result<Page<PoolMember>> {
  let total: i64 = conn.query_row(
    "SELECT COUNT(*) FROM pool_entries
     WHERE sector_id = ?1 AND (?2 = 0 OR is_active = 1)",
    params![sector_id, query.active_only],
    |row| row.get(0),
  )?;

  let sql = format!(
    "SELECT {}, u.display_name
     FROM pool_entries p
     LEFT JOIN users u ON u.user_id = p.user_id
     WHERE p.sector_id = ?1 AND (?2 = 0 OR p.is_active = 1)
     ORDER BY p.added_at DESC, p.user_id ASC
     LIMIT ?3 OFFSET ?4",
    RawPoolEntry::COLUMNS
  );
  let mut stmt = conn.prepare(&sql)?;
  let rows = stmt
    .query_map(
      params![sector_id, query.active_only, sql_bound(query.limit), sql_bound(query.offset)],
      |row| Ok((RawPoolEntry::from_row(row)?, row.get::<_, Option<String>>(5)?)),
    )?
    .collect::<rusqlite::Result<Vec<_>>>()?;

  let items = rows
    .into_iter()
    .map(|(raw, name)| {
      let entry = raw.into_entry()?;
      let user_name = user_name_or_default(entry.user_id, name.as_deref());
      Ok(PoolMember { entry, user_name })
    })
    .collect::<Result<Vec<_>>>()?;

  Ok(Page {
    items,
    total: total as usize,
    limit: query.limit,
    offset: query.offset,
  })
}

pub fn user_pool_entries(conn: &Connection, user_id: UserId) -> Result<Vec<PoolEntry>> {
  let sql = format!(
    "SELECT {} FROM pool_entries p WHERE p.user_id = ?1 ORDER BY p.sector_id",
    RawPoolEntry::COLUMNS
  );
  let mut stmt = conn.prepare(&sql)?;
  let raws = stmt
    .query_map(params![user_id], RawPoolEntry::from_row)?
    .collect::<rusqlite::Result<Vec<_>>>()?;
  raws.into_iter().map(RawPoolEntry::into_entry).collect()
}

// ─── Assignments ─────────────────────────────────────────────────────────────

/// Filter shared by every assignment listing; `None` means unrestricted.
#[derive(Debug, Clone, Copy, Default)]
pub struct EntryFilter {
  pub sector_id: Option<SectorId>,
  pub user_id:   Option<UserId>,
  pub from:      Option<NaiveDate>,
  pub to:        Option<NaiveDate>,
}

const ENTRY_WHERE: &str = "
    WHERE (?1 IS NULL OR a.sector_id = ?1)
      AND (?2 IS NULL OR a.user_id   = ?2)
      AND (?3 IS NULL OR a.duty_date >= ?3)
      AND (?4 IS NULL OR a.duty_date <= ?4)";

/// Assignments matching `filter`, oldest date first.
pub fn duty_entries(conn: &Connection, filter: EntryFilter) -> Result<Vec<DutyEntry>> {
  let sql = format!(
    "{} {ENTRY_WHERE} ORDER BY a.duty_date ASC, a.sector_id ASC",
    RawDutyEntry::SELECT
  );
  let mut stmt = conn.prepare(&sql)?;
  let raws = stmt
    .query_map(
      params![
        filter.sector_id,
        filter.user_id,
        filter.from.map(encode_date),
        filter.to.map(encode_date),
      ],
      RawDutyEntry::from_row,
    )?
    .collect::<rusqlite::Result<Vec<_>>>()?;
  raws.into_iter().map(RawDutyEntry::into_entry).collect()
}

pub fn list_schedule(conn: &Connection, query: &ScheduleQuery) -> Result<Page<DutyEntry>> {
  let from = query.from.map(encode_date);
  let to = query.to.map(encode_date);

  let total: i64 = conn.query_row(
    &format!("SELECT COUNT(*) FROM assignments a {ENTRY_WHERE}"),
    params![query.sector_id, query.user_id, from, to],
    |row| row.get(0),
  )?;

  let sql = format!(
    "{} {ENTRY_WHERE} ORDER BY a.duty_date DESC, a.sector_id ASC LIMIT ?5 OFFSET ?6",
    RawDutyEntry::SELECT
  );
  let mut stmt = conn.prepare(&sql)?;
  let raws = stmt
    .query_map(
      params![
        query.sector_id,
        query.user_id,
        from,
        to,
        sql_bound(query.limit),
        sql_bound(query.offset),
      ],
      RawDutyEntry::from_row,
    )?
    .collect::<rusqlite::Result<Vec<_>>>()?;

  Ok(Page {
    items:  raws
      .into_iter()
      .map(RawDutyEntry::into_entry)
      .collect::<Result<_>>()?,
    total:  total as usize,
    limit:  query.limit,
    offset: query.offset,
  })
}

/// Assignments of a sector falling on any of `dates`.
pub fn assignments_on(
  conn: &Connection,
  sector_id: SectorId,
  dates: &[NaiveDate],
) -> Result<Vec<Assignment>> {
  let (Some(first), Some(last)) = (dates.first(), dates.last()) else {
    return Ok(Vec::new());
  };
  let wanted: HashSet<&NaiveDate> = dates.iter().collect();
  let filter = EntryFilter {
    sector_id: Some(sector_id),
    from: Some(*first.min(last)),
    to: Some(*first.max(last)),
    ..Default::default()
  };
  Ok(
    duty_entries(conn, filter)?
      .into_iter()
      .map(|e| e.assignment)
      .filter(|a| wanted.contains(&a.duty_date))
      .collect(),
  )
}

/// Holder of the sector's latest assignment strictly before `date`, if any.
///
/// Weekends skipped by working-days periods and other gaps are looked past.
pub fn previous_holder(
  conn: &Connection,
  sector_id: SectorId,
  date: NaiveDate,
) -> Result<Option<UserId>> {
  Ok(
    conn
      .query_row(
        "SELECT user_id FROM assignments
         WHERE sector_id = ?1 AND duty_date < ?2
         ORDER BY duty_date DESC
         LIMIT 1",
        params![sector_id, encode_date(date)],
        |row| row.get(0),
      )
      .optional()?,
  )
}

// ─── Statistics ──────────────────────────────────────────────────────────────

pub fn list_statistics(
  conn: &Connection,
  query: &StatisticsQuery,
) -> Result<Page<Statistics>> {
  const WHERE: &str = "
    WHERE (?1 IS NULL OR sector_id = ?1)
      AND (?2 IS NULL OR user_id   = ?2)
      AND (?3 IS NULL OR year      = ?3)";

  let total: i64 = conn.query_row(
    &format!("SELECT COUNT(*) FROM statistics {WHERE}"),
    params![query.sector_id, query.user_id, query.year],
    |row| row.get(0),
  )?;

  let mut stmt = conn.prepare(&format!(
    "SELECT user_id, sector_id, year, total_duties, last_duty_date, updated_at
     FROM statistics {WHERE}
     ORDER BY year DESC, total_duties DESC, user_id ASC
     LIMIT ?4 OFFSET ?5"
  ))?;
  let raws = stmt
    .query_map(
      params![
        query.sector_id,
        query.user_id,
        query.year,
        sql_bound(query.limit),
        sql_bound(query.offset),
      ],
      RawStatistics::from_row,
    )?
    .collect::<rusqlite::Result<Vec<_>>>()?;

  Ok(Page {
    items:  raws
      .into_iter()
      .map(RawStatistics::into_statistics)
      .collect::<Result<_>>()?,
    total:  total as usize,
    limit:  query.limit,
    offset: query.offset,
  })
}

/// Unsorted summary rows for every user relevant to a sector's year.
pub fn summary_rows(
  conn: &Connection,
  sector_id: SectorId,
  year: i32,
) -> Result<Vec<SummaryRow>> {
  let mut stmt = conn.prepare(
    "SELECT x.user_id, u.display_name,
            COALESCE(st.total_duties, 0), st.last_duty_date,
            COALESCE(p.is_active, 0)
     FROM (
       SELECT user_id FROM users WHERE is_duty_eligible = 1
       UNION
       SELECT user_id FROM pool_entries WHERE sector_id = ?1
       UNION
       SELECT user_id FROM statistics WHERE sector_id = ?1 AND year = ?2
     ) x
     LEFT JOIN users u ON u.user_id = x.user_id
     LEFT JOIN statistics st
       ON st.user_id = x.user_id AND st.sector_id = ?1 AND st.year = ?2
     LEFT JOIN pool_entries p
       ON p.user_id = x.user_id AND p.sector_id = ?1",
  )?;
  let rows = stmt
    .query_map(params![sector_id, year], |row| {
      Ok((
        row.get::<_, UserId>(0)?,
        row.get::<_, Option<String>>(1)?,
        row.get::<_, i64>(2)?,
        row.get::<_, Option<String>>(3)?,
        row.get::<_, bool>(4)?,
      ))
    })?
    .collect::<rusqlite::Result<Vec<_>>>()?;

  rows
    .into_iter()
    .map(|(user_id, name, total_duties, last, in_pool)| {
      Ok(SummaryRow {
        user_id,
        user_name: user_name_or_default(user_id, name.as_deref()),
        total_duties,
        last_duty_date: last.as_deref().map(decode_date).transpose()?,
        in_pool,
      })
    })
    .collect()
}
