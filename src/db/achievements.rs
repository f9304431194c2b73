//! Persisted achievement flags. Flags only ever turn on.

use chrono::Utc;
use rusqlite::{params, Connection, Result};

use crate::achievements::{Achievement, AchievementFlags};

pub fn get_achievements(conn: &Connection) -> Result<AchievementFlags> {
  let mut stmt = conn.prepare("SELECT key FROM achievements ORDER BY unlocked_at ASC")?;
  let keys = stmt
    .query_map([], |row| row.get::<_, String>(0))?
    .collect::<Result<Vec<_>>>()?;

  Ok(keys.iter().filter_map(|k| Achievement::from_str(k)).collect())
}

/// Unlock an achievement. Returns true if it was newly unlocked.
pub fn unlock_achievement(conn: &Connection, achievement: Achievement) -> Result<bool> {
  let inserted = conn.execute(
    "INSERT OR IGNORE INTO achievements (key, unlocked_at) VALUES (?1, ?2)",
    params![achievement.as_str(), Utc::now().to_rfc3339()],
  )?;
  Ok(inserted > 0)
}
