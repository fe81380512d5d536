//! Least-loaded holder selection.
//!
//! Candidates are ordered by yearly load, then by how long ago they last held
//! duty (never-served first). Among candidates tied on both keys the pick is
//! random, so the same person does not systematically win tie-breaks.

use chrono::NaiveDate;
use rand::{Rng, seq::IndexedRandom};
use serde::{Deserialize, Serialize};

use crate::UserId;

/// A pool member as seen by the selection policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Candidate {
  pub user_id:        UserId,
  pub total_duties:   i64,
  pub last_duty_date: Option<NaiveDate>,
}

impl Candidate {
  pub fn fresh(user_id: UserId) -> Self {
    Self { user_id, total_duties: 0, last_duty_date: None }
  }

  // `None < Some(_)`, which puts members who never served first.
  fn load_key(&self) -> (i64, Option<NaiveDate>) {
    (self.total_duties, self.last_duty_date)
  }
}

/// Which candidate set a selection was made from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SelectionPath {
  /// Nobody was excluded.
  Unfiltered,
  /// The previous holder was excluded and someone else was available.
  Filtered,
  /// Excluding the previous holder left nobody, so they were kept.
  Fallback,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Selection {
  pub candidate: Candidate,
  pub path:      SelectionPath,
}

/// Pick the least-loaded candidate, breaking exact ties at random.
pub fn pick_least_loaded<R>(candidates: &[Candidate], rng: &mut R) -> Option<Candidate>
where
  R: Rng + ?Sized,
{
  let best = candidates.iter().map(Candidate::load_key).min()?;
  let tied: Vec<&Candidate> = candidates
    .iter()
    .filter(|c| c.load_key() == best)
    .collect();
  tied.choose(rng).map(|c| **c)
}

/// Choose a duty holder, optionally excluding `previous_holder`.
///
/// If the exclusion would empty the candidate set, the unfiltered set is used
/// instead and the result is marked [`SelectionPath::Fallback`]. Returns
/// `None` only when `candidates` is empty.
pub fn select_holder<R>(
  candidates: &[Candidate],
  previous_holder: Option<UserId>,
  rng: &mut R,
) -> Option<Selection>
where
  R: Rng + ?Sized,
{
  let Some(excluded) = previous_holder else {
    return pick_least_loaded(candidates, rng)
      .map(|candidate| Selection { candidate, path: SelectionPath::Unfiltered });
  };

  let filtered: Vec<Candidate> = candidates
    .iter()
    .copied()
    .filter(|c| c.user_id != excluded)
    .collect();

  if let Some(candidate) = pick_least_loaded(&filtered, rng) {
    return Some(Selection { candidate, path: SelectionPath::Filtered });
  }

  pick_least_loaded(candidates, rng)
    .map(|candidate| Selection { candidate, path: SelectionPath::Fallback })
}
