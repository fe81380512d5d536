//! [`SqliteStore`], the SQLite implementation of [`DutyStore`].

use std::{collections::HashMap, path::Path};

use chrono::{Datelike, Days, NaiveDate, Utc};
use rota_core::{
  Error as DutyError, SectorId, UserId,
  assignment::{
    AssignmentOutcome, Availability, DutyEntry, ManualAssignment, PeriodAssignment,
    Statistics, YearPlan, YearPlanRequest,
  },
  directory::{DutyUser, Sector},
  period::{month_bounds, year_bounds},
  pool::{NewPoolEntry, Page, PoolEntry, PoolMember, PoolQuery},
  report::{
    Distribution, MonthCalendar, SummaryRow, WeekView, YearOverview, build_distribution,
    build_month_calendar, build_week_view, build_year_overview, sort_summary,
  },
  store::{DutyStore, ScheduleQuery, StatisticsQuery},
};
use tracing::debug;

use crate::{
  Error, Result, engine,
  queries::{self, EntryFilter},
  schema::SCHEMA,
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A duty rotation store backed by a single SQLite file.
///
/// Cloning is cheap; the inner connection is reference-counted and every call
/// is serialised onto its one background thread.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store, mainly for tests.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  // ── Directory ─────────────────────────────────────────────────────────────

  /// Insert or rename a sector.
  pub async fn upsert_sector(&self, sector_id: SectorId, name: impl Into<String>) -> Result<Sector> {
    let name = name.into();
    let stored = name.clone();
    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO sectors (sector_id, name) VALUES (?1, ?2)
           ON CONFLICT (sector_id) DO UPDATE SET name = excluded.name",
          rusqlite::params![sector_id, stored],
        )?;
        Ok(())
      })
      .await?;
    debug!(sector_id, %name, "upserted sector");
    Ok(Sector { sector_id, name })
  }

  /// Insert or update a user's directory record.
  pub async fn upsert_user(&self, user: DutyUser) -> Result<DutyUser> {
    let row = user.clone();
    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO users (user_id, display_name, is_duty_eligible) VALUES (?1, ?2, ?3)
           ON CONFLICT (user_id) DO UPDATE SET
             display_name     = excluded.display_name,
             is_duty_eligible = excluded.is_duty_eligible",
          rusqlite::params![row.user_id, row.display_name, row.is_duty_eligible],
        )?;
        Ok(())
      })
      .await?;
    debug!(user_id = user.user_id, eligible = user.is_duty_eligible, "upserted user");
    Ok(user)
  }

  pub async fn sectors(&self) -> Result<Vec<Sector>> {
    let sectors = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare("SELECT sector_id, name FROM sectors ORDER BY sector_id")?;
        let rows = stmt
          .query_map([], |row| Ok(Sector { sector_id: row.get(0)?, name: row.get(1)? }))?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;
    Ok(sectors)
  }

  /// Assignments matching `filter`, oldest first.
  async fn entries(&self, filter: EntryFilter) -> Result<Vec<DutyEntry>> {
    self
      .conn
      .call(move |conn| Ok(queries::duty_entries(conn, filter)))
      .await?
  }
}

// ─── DutyStore impl ──────────────────────────────────────────────────────────

impl DutyStore for SqliteStore {
  type Error = Error;

  // ── Pool ──────────────────────────────────────────────────────────────────

  async fn add_to_pool(&self, entry: NewPoolEntry) -> Result<PoolEntry> {
    let now = Utc::now();
    self
      .conn
      .call(move |conn| Ok(engine::add_to_pool(conn, &entry, now)))
      .await?
  }

  async fn remove_from_pool(&self, user_id: UserId, sector_id: SectorId) -> Result<PoolEntry> {
    self
      .conn
      .call(move |conn| Ok(engine::remove_from_pool(conn, user_id, sector_id)))
      .await?
  }

  async fn list_pool(&self, sector_id: SectorId, query: PoolQuery) -> Result<Page<PoolMember>> {
    self
      .conn
      .call(move |conn| {
        Ok(
          queries::require_sector(conn, sector_id)
            .and_then(|_| queries::list_pool(conn, sector_id, &query)),
        )
      })
      .await?
  }

  async fn user_pool_entries(&self, user_id: UserId) -> Result<Vec<PoolEntry>> {
    self
      .conn
      .call(move |conn| Ok(queries::user_pool_entries(conn, user_id)))
      .await?
  }

  // ── Assignment engine ─────────────────────────────────────────────────────

  async fn assign_period(&self, request: PeriodAssignment) -> Result<AssignmentOutcome> {
    let now = Utc::now();
    self
      .conn
      .call(move |conn| Ok(engine::assign_period(conn, &request, now)))
      .await?
  }

  async fn assign_manual(&self, request: ManualAssignment) -> Result<AssignmentOutcome> {
    let now = Utc::now();
    self
      .conn
      .call(move |conn| Ok(engine::assign_manual(conn, &request, now)))
      .await?
  }

  async fn plan_year(&self, request: YearPlanRequest) -> Result<YearPlan> {
    let now = Utc::now();
    self
      .conn
      .call(move |conn| Ok(engine::plan_year(conn, &request, now)))
      .await?
  }

  // ── Availability ──────────────────────────────────────────────────────────

  async fn check_availability(
    &self,
    sector_id: SectorId,
    start: NaiveDate,
    end: NaiveDate,
  ) -> Result<Vec<Availability>> {
    if start > end {
      return Err(DutyError::InvalidPeriod(format!("{start} is after {end}")).into());
    }

    let (members, entries) = self
      .conn
      .call(move |conn| {
        let load = || -> Result<(Vec<(UserId, String)>, Vec<DutyEntry>)> {
          queries::require_sector(conn, sector_id)?;
          let members = queries::active_candidates(conn, sector_id, start.year())?;
          let names = members
            .iter()
            .map(|c| -> Result<(UserId, String)> {
              Ok((c.user_id, queries::user_name(conn, c.user_id)?))
            })
            .collect::<Result<Vec<_>>>()?;
          let filter = EntryFilter {
            sector_id: Some(sector_id),
            from: Some(start),
            to: Some(end),
            ..Default::default()
          };
          Ok((names, queries::duty_entries(conn, filter)?))
        };
        Ok(load())
      })
      .await??;

    let mut booked: HashMap<UserId, Vec<NaiveDate>> = HashMap::new();
    for entry in entries {
      booked
        .entry(entry.assignment.user_id)
        .or_default()
        .push(entry.assignment.duty_date);
    }

    Ok(
      members
        .into_iter()
        .map(|(user_id, user_name)| {
          let booked_dates = booked.remove(&user_id).unwrap_or_default();
          Availability {
            user_id,
            user_name,
            booked_count: booked_dates.len(),
            available: booked_dates.is_empty(),
            booked_dates,
          }
        })
        .collect(),
    )
  }

  // ── Reads ─────────────────────────────────────────────────────────────────

  async fn duties_on(
    &self,
    date: NaiveDate,
    sector_id: Option<SectorId>,
  ) -> Result<Vec<DutyEntry>> {
    self
      .entries(EntryFilter { sector_id, from: Some(date), to: Some(date), ..Default::default() })
      .await
  }

  async fn week_view(
    &self,
    sector_id: Option<SectorId>,
    start: NaiveDate,
    today: NaiveDate,
  ) -> Result<WeekView> {
    let end = start
      .checked_add_days(Days::new(6))
      .ok_or_else(|| DutyError::InvalidPeriod(format!("week starting {start} is out of range")))?;
    let entries = self
      .entries(EntryFilter { sector_id, from: Some(start), to: Some(end), ..Default::default() })
      .await?;
    Ok(build_week_view(start, today, entries))
  }

  async fn month_calendar(
    &self,
    sector_id: Option<SectorId>,
    year: i32,
    month: u32,
    today: NaiveDate,
  ) -> Result<MonthCalendar> {
    let (first, last) = month_bounds(year, month)?;
    let entries = self
      .entries(EntryFilter { sector_id, from: Some(first), to: Some(last), ..Default::default() })
      .await?;
    Ok(build_month_calendar(year, month, today, entries)?)
  }

  async fn year_overview(&self, sector_id: Option<SectorId>, year: i32) -> Result<YearOverview> {
    let (first, last) = year_bounds(year)?;
    let entries = self
      .entries(EntryFilter { sector_id, from: Some(first), to: Some(last), ..Default::default() })
      .await?;
    Ok(build_year_overview(year, &entries))
  }

  async fn statistics_summary(&self, sector_id: SectorId, year: i32) -> Result<Vec<SummaryRow>> {
    let mut rows = self
      .conn
      .call(move |conn| {
        Ok(
          queries::require_sector(conn, sector_id)
            .and_then(|_| queries::summary_rows(conn, sector_id, year)),
        )
      })
      .await??;
    sort_summary(&mut rows);
    Ok(rows)
  }

  async fn distribution(
    &self,
    sector_id: Option<SectorId>,
    user_id: Option<UserId>,
    year: i32,
  ) -> Result<Distribution> {
    let (first, last) = year_bounds(year)?;
    let entries = self
      .entries(EntryFilter { sector_id, user_id, from: Some(first), to: Some(last) })
      .await?;
    Ok(build_distribution(year, &entries))
  }

  async fn list_schedule(&self, query: &ScheduleQuery) -> Result<Page<DutyEntry>> {
    let query = query.clone();
    self
      .conn
      .call(move |conn| Ok(queries::list_schedule(conn, &query)))
      .await?
  }

  async fn list_statistics(&self, query: &StatisticsQuery) -> Result<Page<Statistics>> {
    let query = query.clone();
    self
      .conn
      .call(move |conn| Ok(queries::list_statistics(conn, &query)))
      .await?
  }
}
