//! Deck CRUD plus community publish/unpublish

use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension, Result, Row};

use crate::domain::{Card, CommunityDeck, Deck, DeckDraft, Difficulty, LanguagePair, Media};

use super::cards::{kind_columns, kind_from_row, parse_timestamp};

const DECK_COLUMNS: &str = r#"
    d.id, d.name, d.emoji, d.color, d.category, d.subtopic, d.difficulty,
    d.source_language, d.target_language, d.community_id, d.created_at,
    (SELECT COUNT(*) FROM cards c WHERE c.deck_id = d.id) AS card_count
"#;

fn row_to_deck(row: &Row) -> Result<Deck> {
    let difficulty: String = row.get(6)?;
    let source: Option<String> = row.get(7)?;
    let target: Option<String> = row.get(8)?;
    let created_at: String = row.get(10)?;
    Ok(Deck {
        id: row.get(0)?,
        name: row.get(1)?,
        emoji: row.get(2)?,
        color: row.get(3)?,
        category: row.get(4)?,
        subtopic: row.get(5)?,
        difficulty: Difficulty::from_str(&difficulty).unwrap_or_default(),
        language: match (source, target) {
            (Some(source), Some(target)) => Some(LanguagePair { source, target }),
            _ => None,
        },
        community_id: row.get(9)?,
        created_at: parse_timestamp(&created_at),
        card_count: row.get(11)?,
    })
}

pub fn insert_deck(conn: &Connection, draft: &DeckDraft) -> Result<i64> {
    conn.execute(
        r#"
    INSERT INTO decks (name, emoji, color, category, subtopic, difficulty, source_language,
                       target_language, created_at)
    VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
    "#,
        params![
            draft.name.trim(),
            draft.emoji,
            draft.color,
            draft.category,
            draft.subtopic,
            draft.difficulty.as_str(),
            draft.language.as_ref().map(|l| l.source.as_str()),
            draft.language.as_ref().map(|l| l.target.as_str()),
            Utc::now().to_rfc3339(),
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn get_deck(conn: &Connection, id: i64) -> Result<Option<Deck>> {
    conn.query_row(
        &format!("SELECT {} FROM decks d WHERE d.id = ?1", DECK_COLUMNS),
        params![id],
        |row| row_to_deck(row),
    )
    .optional()
}

pub fn list_decks(conn: &Connection) -> Result<Vec<Deck>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {} FROM decks d ORDER BY d.created_at DESC, d.id DESC",
        DECK_COLUMNS
    ))?;

    let decks = stmt
        .query_map([], |row| row_to_deck(row))?
        .collect::<Result<Vec<_>>>()?;
    Ok(decks)
}

/// Returns false if the deck does not exist
pub fn update_deck(conn: &Connection, id: i64, draft: &DeckDraft) -> Result<bool> {
    let updated = conn.execute(
        r#"
    UPDATE decks
    SET name = ?1, emoji = ?2, color = ?3, category = ?4, subtopic = ?5, difficulty = ?6,
        source_language = ?7, target_language = ?8
    WHERE id = ?9
    "#,
        params![
            draft.name.trim(),
            draft.emoji,
            draft.color,
            draft.category,
            draft.subtopic,
            draft.difficulty.as_str(),
            draft.language.as_ref().map(|l| l.source.as_str()),
            draft.language.as_ref().map(|l| l.target.as_str()),
            id,
        ],
    )?;
    Ok(updated > 0)
}

/// Delete a deck with its cards and sessions, unpublishing its community copy.
///
/// Returns false if the deck does not exist.
pub fn delete_deck(conn: &Connection, id: i64) -> Result<bool> {
    let community_id: Option<Option<i64>> = conn
        .query_row(
            "SELECT community_id FROM decks WHERE id = ?1",
            params![id],
            |row| row.get(0),
        )
        .optional()?;

    let Some(community_id) = community_id else {
        return Ok(false);
    };

    let tx = conn.unchecked_transaction()?;
    if let Some(cid) = community_id {
        delete_community_deck(&tx, cid)?;
    }
    tx.execute("DELETE FROM cards WHERE deck_id = ?1", params![id])?;
    tx.execute("DELETE FROM study_sessions WHERE deck_id = ?1", params![id])?;
    tx.execute("DELETE FROM decks WHERE id = ?1", params![id])?;
    tx.commit()?;

    tracing::info!("Deleted deck {} (community copy: {:?})", id, community_id);
    Ok(true)
}

fn delete_community_deck(conn: &Connection, community_id: i64) -> Result<()> {
    conn.execute(
        "DELETE FROM community_cards WHERE community_deck_id = ?1",
        params![community_id],
    )?;
    conn.execute("DELETE FROM community_decks WHERE id = ?1", params![community_id])?;
    Ok(())
}

/// Publish a snapshot of a deck to the community tables.
///
/// Republishing replaces the previous snapshot. Ignored cards are left out.
/// Returns the community deck id, or None if the deck does not exist.
pub fn publish_deck(conn: &Connection, deck_id: i64) -> Result<Option<i64>> {
    let Some(deck) = get_deck(conn, deck_id)? else {
        return Ok(None);
    };

    let tx = conn.unchecked_transaction()?;
    if let Some(previous) = deck.community_id {
        delete_community_deck(&tx, previous)?;
    }

    let now = Utc::now().to_rfc3339();
    tx.execute(
        r#"
    INSERT INTO community_decks (source_deck_id, name, emoji, color, category, difficulty, published_at)
    VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
    "#,
        params![
            deck.id,
            deck.name,
            deck.emoji,
            deck.color,
            deck.category,
            deck.difficulty.as_str(),
            now,
        ],
    )?;
    let community_id = tx.last_insert_rowid();

    for card in super::cards::get_deck_cards(&tx, deck_id)?
        .iter()
        .filter(|c| !c.ignored)
    {
        let kind = kind_columns(&card.kind)?;
        tx.execute(
            r#"
      INSERT INTO community_cards (community_deck_id, card_type, front, back, options,
                                   correct_answers, accepted_answers, front_image, front_audio,
                                   back_image, back_audio, position, created_at)
      VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)
      "#,
            params![
                community_id,
                kind.card_type,
                card.front,
                kind.back,
                kind.options,
                kind.correct_answers,
                kind.accepted_answers,
                card.front_media.image,
                card.front_media.audio,
                card.back_media.image,
                card.back_media.audio,
                card.position,
                now,
            ],
        )?;
    }

    tx.execute(
        "UPDATE decks SET community_id = ?1 WHERE id = ?2",
        params![community_id, deck_id],
    )?;
    tx.commit()?;

    tracing::info!("Published deck {} as community deck {}", deck_id, community_id);
    Ok(Some(community_id))
}

/// Remove a deck's community copy. Returns false if it was not published.
pub fn unpublish_deck(conn: &Connection, deck_id: i64) -> Result<bool> {
    let Some(deck) = get_deck(conn, deck_id)? else {
        return Ok(false);
    };
    let Some(community_id) = deck.community_id else {
        return Ok(false);
    };

    let tx = conn.unchecked_transaction()?;
    delete_community_deck(&tx, community_id)?;
    tx.execute(
        "UPDATE decks SET community_id = NULL WHERE id = ?1",
        params![deck_id],
    )?;
    tx.commit()?;
    Ok(true)
}

pub fn get_community_deck(conn: &Connection, id: i64) -> Result<Option<CommunityDeck>> {
    conn.query_row(
        r#"
    SELECT d.id, d.source_deck_id, d.name, d.emoji, d.color, d.category, d.difficulty, d.published_at,
           (SELECT COUNT(*) FROM community_cards c WHERE c.community_deck_id = d.id)
    FROM community_decks d WHERE d.id = ?1
    "#,
        params![id],
        |row| {
            let difficulty: String = row.get(6)?;
            let published_at: String = row.get(7)?;
            Ok(CommunityDeck {
                id: row.get(0)?,
                source_deck_id: row.get(1)?,
                name: row.get(2)?,
                emoji: row.get(3)?,
                color: row.get(4)?,
                category: row.get(5)?,
                difficulty: Difficulty::from_str(&difficulty).unwrap_or_default(),
                published_at: parse_timestamp(&published_at),
                card_count: row.get(8)?,
            })
        },
    )
    .optional()
}

/// Cards of a community snapshot, shaped as regular cards owned by the community deck.
///
/// Favorite and ignored flags are always false: they belong to the learner's own copy.
pub fn get_community_cards(conn: &Connection, community_id: i64) -> Result<Vec<Card>> {
    let mut stmt = conn.prepare(
        r#"
    SELECT id, community_deck_id, card_type, front, back, options, correct_answers, accepted_answers,
           front_image, front_audio, back_image, back_audio, position, created_at
    FROM community_cards
    WHERE community_deck_id = ?1
    ORDER BY position ASC, id ASC
    "#,
    )?;

    let cards = stmt
        .query_map(params![community_id], |row| {
            let created_at: String = row.get(13)?;
            Ok(Card {
                id: row.get(0)?,
                deck_id: row.get(1)?,
                front: row.get(3)?,
                kind: kind_from_row(row, 2)?,
                front_media: Media {
                    image: row.get(8)?,
                    audio: row.get(9)?,
                },
                back_media: Media {
                    image: row.get(10)?,
                    audio: row.get(11)?,
                },
                favorite: false,
                ignored: false,
                position: row.get(12)?,
                created_at: parse_timestamp(&created_at),
            })
        })?
        .collect::<Result<Vec<_>>>()?;
    Ok(cards)
}
