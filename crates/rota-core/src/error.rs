//! Error types for `rota-core`.

use chrono::NaiveDate;
use thiserror::Error;

use crate::{SectorId, UserId};

/// Typed failures of the duty engine.
///
/// Every variant except [`Error::Storage`] is a domain outcome the caller is
/// expected to turn into user-facing messaging. The `IntoStaticStr` derive
/// yields a stable snake_case kind name (e.g. `"conflict_exists"`).
#[derive(Debug, Error, strum::IntoStaticStr)]
#[strum(serialize_all = "snake_case")]
pub enum Error {
  #[error("sector not found: {0}")]
  SectorNotFound(SectorId),

  #[error("user not found: {0}")]
  UserNotFound(UserId),

  #[error("user {0} is not eligible for duty")]
  UserNotEligible(UserId),

  #[error("user {user_id} has no active pool entry in sector {sector_id}")]
  PoolEntryNotFound { user_id: UserId, sector_id: SectorId },

  #[error("sector {0} has no active pool members")]
  NoActivePool(SectorId),

  #[error("sector {sector_id} already has duty assigned on {}", join_dates(.dates))]
  ConflictExists {
    sector_id: SectorId,
    dates:     Vec<NaiveDate>,
  },

  #[error("user {user_id} is not an active pool member of sector {sector_id}")]
  UserNotInPool { user_id: UserId, sector_id: SectorId },

  #[error("invalid period: {0}")]
  InvalidPeriod(String),

  #[error("storage error: {0}")]
  Storage(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl Error {
  /// The snake_case name of this error kind.
  pub fn kind(&self) -> &'static str { self.into() }
}

fn join_dates(dates: &[NaiveDate]) -> String {
  dates
    .iter()
    .map(|d| d.to_string())
    .collect::<Vec<_>>()
    .join(", ")
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn kind_names_are_snake_case() {
    assert_eq!(Error::NoActivePool(1).kind(), "no_active_pool");
    assert_eq!(
      Error::ConflictExists { sector_id: 1, dates: vec![] }.kind(),
      "conflict_exists"
    );
    assert_eq!(
      Error::UserNotInPool { user_id: 1, sector_id: 2 }.kind(),
      "user_not_in_pool"
    );
  }

  #[test]
  fn conflict_message_lists_dates() {
    let err = Error::ConflictExists {
      sector_id: 4,
      dates:     vec![
        NaiveDate::from_ymd_opt(2026, 3, 2).unwrap(),
        NaiveDate::from_ymd_opt(2026, 3, 3).unwrap(),
      ],
    };
    assert_eq!(
      err.to_string(),
      "sector 4 already has duty assigned on 2026-03-02, 2026-03-03"
    );
  }
}
