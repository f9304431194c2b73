//! Answer checking for the typed and multiple-choice quiz modes.
//!
//! Typed answers are compared leniently (case, surrounding whitespace and
//! Unicode composition are ignored). Multiple-choice selections must match the
//! correct answer set exactly: a subset or superset is wrong.

use std::collections::HashSet;
use unicode_normalization::UnicodeNormalization;

/// Normalize typed input for comparison.
///
/// - Composes to NFC so "é" typed as `e + ◌́` matches a stored "é"
/// - Lowercases
/// - Trims surrounding whitespace
pub fn normalize_answer(input: &str) -> String {
  input.nfc().collect::<String>().to_lowercase().trim().to_string()
}

/// Check a typed answer against the primary answer and any accepted alternates
pub fn check_typed_answer(input: &str, primary: &str, accepted: &[String]) -> bool {
  let normalized = normalize_answer(input);
  if normalized.is_empty() {
    return false;
  }

  std::iter::once(primary)
    .chain(accepted.iter().map(String::as_str))
    .any(|candidate| normalize_answer(candidate) == normalized)
}

/// Check a multiple-choice selection. The selected set must equal the correct set.
///
/// Duplicate selections collapse; ordering does not matter.
pub fn check_choices(selected: &[String], correct: &[String]) -> bool {
  let selected: HashSet<&str> = selected.iter().map(String::as_str).collect();
  let correct: HashSet<&str> = correct.iter().map(String::as_str).collect();
  !correct.is_empty() && selected == correct
}
