//! Collaborator data the engine reads but does not own.
//!
//! Sectors and users are managed by the surrounding application. The engine
//! only needs to know that a sector exists, what to call it, and whether a
//! user may ever be put into a duty pool.

use serde::{Deserialize, Serialize};

use crate::{SectorId, UserId};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sector {
  pub sector_id: SectorId,
  pub name:      String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DutyUser {
  pub user_id:          UserId,
  pub display_name:     Option<String>,
  /// Gate for pool membership; an ineligible user can never be added.
  pub is_duty_eligible: bool,
}

impl DutyUser {
  pub fn name(&self) -> String {
    user_name_or_default(self.user_id, self.display_name.as_deref())
  }
}

/// Display name used in results when the directory has none on file.
pub fn user_name_or_default(user_id: UserId, name: Option<&str>) -> String {
  match name.map(str::trim) {
    Some(n) if !n.is_empty() => n.to_owned(),
    _ => format!("User {user_id}"),
  }
}

/// Sector label used in results when the directory has none on file.
pub fn sector_name_or_default(sector_id: SectorId, name: Option<&str>) -> String {
  match name.map(str::trim) {
    Some(n) if !n.is_empty() => n.to_owned(),
    _ => format!("Sector {sector_id}"),
  }
}
