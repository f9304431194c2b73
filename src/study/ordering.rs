//! Filtering and ordering of a session's working list.
//!
//! The working list is a list of indices into the session's card pool, so
//! reordering never copies cards and local flag edits stay in one place.

use rand::Rng;
use rand::seq::SliceRandom;

use crate::domain::{Card, CardOrder, StudyOptions};

/// Indices of the cards that pass the active filters, in pool order
pub fn select(cards: &[Card], options: &StudyOptions) -> Vec<usize> {
  cards
    .iter()
    .enumerate()
    .filter(|(_, c)| !(options.exclude_ignored && c.ignored))
    .filter(|(_, c)| !options.favorites_only || c.favorite)
    .map(|(i, _)| i)
    .collect()
}

/// Order a working list in place.
///
/// `Linear` is stable by card position (ties keep their current order).
pub fn arrange<R: Rng + ?Sized>(indices: &mut [usize], cards: &[Card], order: CardOrder, rng: &mut R) {
  match order {
    CardOrder::Linear => indices.sort_by_key(|&i| cards[i].position),
    CardOrder::Random => indices.shuffle(rng),
  }
}

/// Filter then order. An empty result means "no cards available".
pub fn prepare<R: Rng + ?Sized>(cards: &[Card], options: &StudyOptions, rng: &mut R) -> Vec<usize> {
  let mut indices = select(cards, options);
  arrange(&mut indices, cards, options.order, rng);
  indices
}
