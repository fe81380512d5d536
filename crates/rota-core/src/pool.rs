//! Pool membership: who may be selected as duty holder for a sector.
//!
//! Entries are never deleted. Removal flips `is_active`; re-adding the same
//! user reactivates the existing row, so there is at most one entry per
//! `(user_id, sector_id)` pair.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{SectorId, UserId};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolEntry {
  pub user_id:   UserId,
  pub sector_id: SectorId,
  pub is_active: bool,
  /// Refreshed every time the entry is (re)activated.
  pub added_at:  DateTime<Utc>,
  pub added_by:  Option<UserId>,
}

/// A pool entry together with the member's display name.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PoolMember {
  #[serde(flatten)]
  pub entry:     PoolEntry,
  pub user_name: String,
}

/// Input to [`crate::store::DutyStore::add_to_pool`].
#[derive(Debug, Clone, Deserialize)]
pub struct NewPoolEntry {
  pub user_id:   UserId,
  pub sector_id: SectorId,
  pub added_by:  Option<UserId>,
}

/// Parameters for [`crate::store::DutyStore::list_pool`].
#[derive(Debug, Clone)]
pub struct PoolQuery {
  pub active_only: bool,
  pub limit:       usize,
  pub offset:      usize,
}

impl Default for PoolQuery {
  fn default() -> Self { Self { active_only: true, limit: 100, offset: 0 } }
}

/// One page of a listing plus the unpaginated total.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Page<T> {
  pub items:  Vec<T>,
  pub total:  usize,
  pub limit:  usize,
  pub offset: usize,
}
