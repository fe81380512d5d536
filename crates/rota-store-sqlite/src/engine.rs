//! Transactional write paths of the duty engine.
//!
//! Each public function opens one `BEGIN IMMEDIATE` transaction, reads the
//! pool and statistics, decides, writes assignments and statistics, and
//! commits. Any early return drops the transaction, which rolls it back.

use std::collections::BTreeMap;

use chrono::{DateTime, Datelike, NaiveDate, Utc};
use rusqlite::{Connection, Transaction, TransactionBehavior, params};
use rota_core::{
  Error as DutyError, SectorId, UserId,
  assignment::{
    Assignment, AssignmentOutcome, ManualAssignment, PeriodAssignment, PlanShare,
    YearPlan, YearPlanRequest, tally_by_year,
  },
  period::{PeriodKind, ResolvedPeriod, resolve_period, year_bounds},
  planning::plan_rotation,
  pool::{NewPoolEntry, PoolEntry},
  selection::{SelectionPath, select_holder},
};
use tracing::{debug, info, warn};

use crate::{
  Result,
  encode::{encode_date, encode_dt, encode_year_range},
  queries,
};

fn begin(conn: &mut Connection) -> Result<Transaction<'_>> {
  Ok(conn.transaction_with_behavior(TransactionBehavior::Immediate)?)
}

// ─── Pool ────────────────────────────────────────────────────────────────────

pub fn add_to_pool(
  conn: &mut Connection,
  input: &NewPoolEntry,
  now: DateTime<Utc>,
) -> Result<PoolEntry> {
  let tx = begin(conn)?;
  queries::require_sector(&tx, input.sector_id)?;
  let user = queries::require_user(&tx, input.user_id)?;
  if !user.is_duty_eligible {
    return Err(DutyError::UserNotEligible(input.user_id).into());
  }

  tx.execute(
    "INSERT INTO pool_entries (user_id, sector_id, is_active, added_at, added_by)
     VALUES (?1, ?2, 1, ?3, ?4)
     ON CONFLICT (user_id, sector_id) DO UPDATE SET
       is_active = 1,
       added_at  = excluded.added_at,
       added_by  = excluded.added_by",
    params![input.user_id, input.sector_id, encode_dt(now), input.added_by],
  )?;

  let entry = queries::pool_entry(&tx, input.user_id, input.sector_id)?
    .ok_or(DutyError::PoolEntryNotFound {
      user_id:   input.user_id,
      sector_id: input.sector_id,
    })?;
  tx.commit()?;

  info!(user_id = input.user_id, sector_id = input.sector_id, "added to duty pool");
  Ok(entry)
}

pub fn remove_from_pool(
  conn: &mut Connection,
  user_id: UserId,
  sector_id: SectorId,
) -> Result<PoolEntry> {
  let tx = begin(conn)?;
  let changed = tx.execute(
    "UPDATE pool_entries SET is_active = 0
     WHERE user_id = ?1 AND sector_id = ?2 AND is_active = 1",
    params![user_id, sector_id],
  )?;
  if changed == 0 {
    return Err(DutyError::PoolEntryNotFound { user_id, sector_id }.into());
  }

  let entry = queries::pool_entry(&tx, user_id, sector_id)?
    .ok_or(DutyError::PoolEntryNotFound { user_id, sector_id })?;
  tx.commit()?;

  info!(user_id, sector_id, "removed from duty pool");
  Ok(entry)
}

// ─── Automatic assignment ────────────────────────────────────────────────────

pub fn assign_period(
  conn: &mut Connection,
  request: &PeriodAssignment,
  now: DateTime<Utc>,
) -> Result<AssignmentOutcome> {
  let period = resolve_period(request.kind, request.start, request.working_days_only)?;
  let sector_id = request.sector_id;

  let tx = begin(conn)?;
  let sector = queries::require_sector(&tx, sector_id)?;

  let candidates = queries::active_candidates(&tx, sector_id, request.start.year())?;
  if candidates.is_empty() {
    return Err(DutyError::NoActivePool(sector_id).into());
  }
  ensure_free(&tx, sector_id, &period.dates)?;

  let previous_holder = if request.allow_same_holder {
    None
  } else {
    queries::previous_holder(&tx, sector_id, period.start)?
  };

  let selection = select_holder(&candidates, previous_holder, &mut rand::rng())
    .ok_or(DutyError::NoActivePool(sector_id))?;
  let user_id = selection.candidate.user_id;
  if selection.path == SelectionPath::Fallback {
    warn!(
      sector_id,
      user_id,
      "previous holder is the only pool member; selecting them again"
    );
  }
  debug!(
    sector_id,
    user_id,
    total_duties = selection.candidate.total_duties,
    path = ?selection.path,
    "selected duty holder"
  );

  let rows: Vec<(NaiveDate, NaiveDate)> =
    period.dates.iter().map(|&d| (d, period.start)).collect();
  insert_assignments(&tx, sector_id, user_id, &rows, request.created_by, now)?;
  credit_statistics(&tx, user_id, sector_id, &period.dates, now)?;

  let user_name = queries::user_name(&tx, user_id)?;
  tx.commit()?;

  info!(
    sector_id,
    user_id,
    kind = %request.kind,
    days = period.len(),
    "assigned duty period"
  );

  Ok(AssignmentOutcome {
    sector_id,
    sector_name: sector.name,
    user_id,
    user_name,
    period,
    selection: Some(selection.path),
    overwritten: Vec::new(),
  })
}

// ─── Manual assignment ───────────────────────────────────────────────────────

pub fn assign_manual(
  conn: &mut Connection,
  request: &ManualAssignment,
  now: DateTime<Utc>,
) -> Result<AssignmentOutcome> {
  let period = resolve_period(request.kind, request.start, request.working_days_only)?;
  let (sector_id, user_id) = (request.sector_id, request.user_id);

  let tx = begin(conn)?;
  let sector = queries::require_sector(&tx, sector_id)?;
  let user = queries::require_user(&tx, user_id)?;

  let overwritten = if request.force {
    let existing = queries::assignments_on(&tx, sector_id, &period.dates)?;
    release(&tx, &existing, now)?;
    existing
  } else {
    if !queries::is_active_member(&tx, user_id, sector_id)? {
      return Err(DutyError::UserNotInPool { user_id, sector_id }.into());
    }
    ensure_free(&tx, sector_id, &period.dates)?;
    Vec::new()
  };

  let rows: Vec<(NaiveDate, NaiveDate)> =
    period.dates.iter().map(|&d| (d, period.start)).collect();
  insert_assignments(&tx, sector_id, user_id, &rows, request.created_by, now)?;
  credit_statistics(&tx, user_id, sector_id, &period.dates, now)?;
  tx.commit()?;

  info!(
    sector_id,
    user_id,
    kind = %request.kind,
    days = period.len(),
    overwritten = overwritten.len(),
    "manually assigned duty period"
  );

  Ok(AssignmentOutcome {
    sector_id,
    sector_name: sector.name,
    user_id,
    user_name: user.name(),
    period,
    selection: None,
    overwritten,
  })
}

// ─── Yearly plan ─────────────────────────────────────────────────────────────

pub fn plan_year(
  conn: &mut Connection,
  request: &YearPlanRequest,
  now: DateTime<Utc>,
) -> Result<YearPlan> {
  let (jan_first, _) = year_bounds(request.year)?;
  let ResolvedPeriod { dates, .. } =
    resolve_period(PeriodKind::Year, jan_first, request.working_days_only)?;
  let sector_id = request.sector_id;
  let (year_start, year_end) = encode_year_range(request.year)?;

  let tx = begin(conn)?;
  queries::require_sector(&tx, sector_id)?;

  let members: Vec<UserId> = queries::active_candidates(&tx, sector_id, request.year)?
    .into_iter()
    .map(|c| c.user_id)
    .collect();
  if members.is_empty() {
    return Err(DutyError::NoActivePool(sector_id).into());
  }

  let removed = tx.execute(
    "DELETE FROM assignments
     WHERE sector_id = ?1 AND duty_date BETWEEN ?2 AND ?3",
    params![sector_id, year_start, year_end],
  )?;
  tx.execute(
    "UPDATE statistics
     SET total_duties = 0, last_duty_date = NULL, updated_at = ?3
     WHERE sector_id = ?1 AND year = ?2",
    params![sector_id, request.year, encode_dt(now)],
  )?;

  let plan = plan_rotation(&dates, &members, request.working_days_only, &mut rand::rng());

  let mut by_user: BTreeMap<UserId, Vec<(NaiveDate, NaiveDate)>> = BTreeMap::new();
  for day in &plan {
    by_user
      .entry(day.user_id)
      .or_default()
      .push((day.date, day.period_start));
  }
  for (&user_id, rows) in &by_user {
    insert_assignments(&tx, sector_id, user_id, rows, None, now)?;
    let planned: Vec<NaiveDate> = rows.iter().map(|(d, _)| *d).collect();
    credit_statistics(&tx, user_id, sector_id, &planned, now)?;
  }

  let shares = members
    .iter()
    .map(|&user_id| -> Result<PlanShare> {
      Ok(PlanShare {
        user_id,
        user_name: queries::user_name(&tx, user_id)?,
        days: by_user.get(&user_id).map_or(0, Vec::len),
      })
    })
    .collect::<Result<Vec<_>>>()?;
  tx.commit()?;

  info!(
    sector_id,
    year = request.year,
    removed,
    planned = plan.len(),
    members = members.len(),
    "planned duty year"
  );

  Ok(YearPlan {
    sector_id,
    year: request.year,
    working_days_only: request.working_days_only,
    removed,
    days: plan,
    shares,
  })
}

// ─── Shared write helpers ────────────────────────────────────────────────────

/// Fail with `ConflictExists` if any of `dates` is already assigned.
fn ensure_free(tx: &Transaction<'_>, sector_id: SectorId, dates: &[NaiveDate]) -> Result<()> {
  let taken: Vec<NaiveDate> = queries::assignments_on(tx, sector_id, dates)?
    .into_iter()
    .map(|a| a.duty_date)
    .collect();
  if taken.is_empty() {
    return Ok(());
  }
  warn!(sector_id, conflicts = taken.len(), "duty dates already assigned");
  Err(DutyError::ConflictExists { sector_id, dates: taken }.into())
}

/// Insert `(duty_date, period_start)` rows for one holder.
///
/// A UNIQUE violation on `(sector_id, duty_date)` is reported as
/// `ConflictExists` for the offending date.
fn insert_assignments(
  tx: &Transaction<'_>,
  sector_id: SectorId,
  user_id: UserId,
  rows: &[(NaiveDate, NaiveDate)],
  created_by: Option<UserId>,
  now: DateTime<Utc>,
) -> Result<()> {
  let created_at = encode_dt(now);
  let mut stmt = tx.prepare_cached(
    "INSERT INTO assignments
       (user_id, sector_id, duty_date, period_start, created_at, created_by)
     VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
  )?;
  for &(duty_date, period_start) in rows {
    let inserted = stmt.execute(params![
      user_id,
      sector_id,
      encode_date(duty_date),
      encode_date(period_start),
      created_at,
      created_by,
    ]);
    match inserted {
      Ok(_) => {}
      Err(rusqlite::Error::SqliteFailure(e, _))
        if e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE =>
      {
        return Err(
          DutyError::ConflictExists { sector_id, dates: vec![duty_date] }.into(),
        );
      }
      Err(e) => return Err(e.into()),
    }
  }
  Ok(())
}

/// Add `dates` to the holder's per-year counters.
fn credit_statistics(
  tx: &Transaction<'_>,
  user_id: UserId,
  sector_id: SectorId,
  dates: &[NaiveDate],
  now: DateTime<Utc>,
) -> Result<()> {
  let updated_at = encode_dt(now);
  for tally in tally_by_year(dates) {
    tx.execute(
      "INSERT INTO statistics
         (user_id, sector_id, year, total_duties, last_duty_date, updated_at)
       VALUES (?1, ?2, ?3, ?4, ?5, ?6)
       ON CONFLICT (user_id, sector_id, year) DO UPDATE SET
         total_duties   = total_duties + excluded.total_duties,
         last_duty_date = CASE
           WHEN last_duty_date IS NULL OR last_duty_date < excluded.last_duty_date
             THEN excluded.last_duty_date
           ELSE last_duty_date
         END,
         updated_at     = excluded.updated_at",
      params![
        user_id,
        sector_id,
        tally.year,
        tally.count,
        encode_date(tally.last),
        updated_at,
      ],
    )?;
  }
  Ok(())
}

/// Delete `existing` assignments and debit each previous holder by exactly the
/// number of their rows removed, recomputing their last duty date.
fn release(tx: &Transaction<'_>, existing: &[Assignment], now: DateTime<Utc>) -> Result<()> {
  if existing.is_empty() {
    return Ok(());
  }

  let mut by_holder: BTreeMap<(UserId, SectorId), Vec<NaiveDate>> = BTreeMap::new();
  for a in existing {
    tx.execute(
      "DELETE FROM assignments WHERE assignment_id = ?1",
      params![a.assignment_id],
    )?;
    by_holder
      .entry((a.user_id, a.sector_id))
      .or_default()
      .push(a.duty_date);
  }

  let updated_at = encode_dt(now);
  for ((user_id, sector_id), dates) in by_holder {
    for tally in tally_by_year(&dates) {
      let (year_start, year_end) = encode_year_range(tally.year)?;
      tx.execute(
        "UPDATE statistics
         SET total_duties   = total_duties - ?4,
             last_duty_date = (
               SELECT MAX(duty_date) FROM assignments
               WHERE user_id = ?1 AND sector_id = ?2
                 AND duty_date BETWEEN ?5 AND ?6
             ),
             updated_at     = ?7
         WHERE user_id = ?1 AND sector_id = ?2 AND year = ?3",
        params![
          user_id,
          sector_id,
          tally.year,
          tally.count,
          year_start,
          year_end,
          updated_at,
        ],
      )?;
    }
    debug!(user_id, sector_id, released = dates.len(), "overwrote assignments");
  }
  Ok(())
}
