//! Card CRUD and query operations

use chrono::{DateTime, Utc};
use rusqlite::types::Type;
use rusqlite::{params, Connection, Result, Row};

use crate::domain::{Card, CardDraft, CardFlagsPatch, CardKind, CardType, Media};

const CARD_COLUMNS: &str = r#"
    id, deck_id, card_type, front, back, options, correct_answers, accepted_answers,
    front_image, front_audio, back_image, back_audio, favorite, ignored, position, created_at
"#;

/// Column values encoding a `CardKind`
pub(crate) struct KindColumns {
    pub card_type: &'static str,
    pub back: Option<String>,
    pub options: Option<String>,
    pub correct_answers: Option<String>,
    pub accepted_answers: Option<String>,
}

fn to_json(values: &[String]) -> Result<String> {
    serde_json::to_string(values).map_err(|e| rusqlite::Error::ToSqlConversionFailure(Box::new(e)))
}

pub(crate) fn kind_columns(kind: &CardKind) -> Result<KindColumns> {
    let card_type = kind.card_type().as_str();
    Ok(match kind {
        CardKind::Classic { back } => KindColumns {
            card_type,
            back: Some(back.clone()),
            options: None,
            correct_answers: None,
            accepted_answers: None,
        },
        CardKind::MultipleChoice {
            options,
            correct_answers,
        } => KindColumns {
            card_type,
            back: None,
            options: Some(to_json(options)?),
            correct_answers: Some(to_json(correct_answers)?),
            accepted_answers: None,
        },
        CardKind::TypeAnswer {
            back,
            accepted_answers,
        } => KindColumns {
            card_type,
            back: Some(back.clone()),
            options: None,
            correct_answers: None,
            accepted_answers: Some(to_json(accepted_answers)?),
        },
    })
}

fn json_list(row: &Row, idx: usize) -> Result<Vec<String>> {
    let raw: Option<String> = row.get(idx)?;
    match raw {
        Some(s) => serde_json::from_str(&s)
            .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e))),
        None => Ok(Vec::new()),
    }
}

/// Decode a `CardKind` from the type tag at `type_idx`.
///
/// Expects the column layout `card_type, front, back, options, correct_answers,
/// accepted_answers` starting at `type_idx`.
pub(crate) fn kind_from_row(row: &Row, type_idx: usize) -> Result<CardKind> {
    let type_str: String = row.get(type_idx)?;
    let card_type = CardType::from_str(&type_str).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            type_idx,
            Type::Text,
            format!("unknown card type: {}", type_str).into(),
        )
    })?;

    let back: Option<String> = row.get(type_idx + 2)?;
    let back = back.unwrap_or_default();
    Ok(match card_type {
        CardType::Classic => CardKind::Classic { back },
        CardType::MultipleChoice => CardKind::MultipleChoice {
            options: json_list(row, type_idx + 3)?,
            correct_answers: json_list(row, type_idx + 4)?,
        },
        CardType::TypeAnswer => CardKind::TypeAnswer {
            back,
            accepted_answers: json_list(row, type_idx + 5)?,
        },
    })
}

pub(crate) fn parse_timestamp(s: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|_| Utc::now())
}

fn row_to_card(row: &Row) -> Result<Card> {
    let created_at: String = row.get(15)?;
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
        favorite: row.get(12)?,
        ignored: row.get(13)?,
        position: row.get(14)?,
        created_at: parse_timestamp(&created_at),
    })
}

pub fn insert_card(conn: &Connection, card: &Card) -> Result<i64> {
    let kind = kind_columns(&card.kind)?;
    conn.execute(
        r#"
    INSERT INTO cards (deck_id, card_type, front, back, options, correct_answers, accepted_answers,
                       front_image, front_audio, back_image, back_audio, favorite, ignored, position,
                       created_at)
    VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15)
    "#,
        params![
            card.deck_id,
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
            card.favorite,
            card.ignored,
            card.position,
            card.created_at.to_rfc3339(),
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn get_card_by_id(conn: &Connection, id: i64) -> Result<Option<Card>> {
    let mut stmt = conn.prepare(&format!("SELECT {} FROM cards WHERE id = ?1", CARD_COLUMNS))?;

    let mut rows = stmt.query(params![id])?;
    if let Some(row) = rows.next()? {
        Ok(Some(row_to_card(row)?))
    } else {
        Ok(None)
    }
}

/// All cards of a deck, in position order
pub fn get_deck_cards(conn: &Connection, deck_id: i64) -> Result<Vec<Card>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {} FROM cards WHERE deck_id = ?1 ORDER BY position ASC, id ASC",
        CARD_COLUMNS
    ))?;

    let cards = stmt
        .query_map(params![deck_id], |row| row_to_card(row))?
        .collect::<Result<Vec<_>>>()?;
    Ok(cards)
}

/// Every card across all decks
pub fn get_all_cards(conn: &Connection) -> Result<Vec<Card>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {} FROM cards ORDER BY deck_id ASC, position ASC, id ASC",
        CARD_COLUMNS
    ))?;

    let cards = stmt
        .query_map([], |row| row_to_card(row))?
        .collect::<Result<Vec<_>>>()?;
    Ok(cards)
}

/// Position for a card appended to the end of a deck
pub fn next_position(conn: &Connection, deck_id: i64) -> Result<i64> {
    conn.query_row(
        "SELECT COALESCE(MAX(position) + 1, 0) FROM cards WHERE deck_id = ?1",
        params![deck_id],
        |row| row.get(0),
    )
}

/// Replace a card's content. Returns false if the card does not exist.
pub fn update_card(conn: &Connection, id: i64, draft: &CardDraft) -> Result<bool> {
    let kind = kind_columns(&draft.kind)?;
    let updated = conn.execute(
        r#"
    UPDATE cards
    SET card_type = ?1, front = ?2, back = ?3, options = ?4, correct_answers = ?5,
        accepted_answers = ?6, front_image = ?7, front_audio = ?8, back_image = ?9,
        back_audio = ?10, favorite = ?11
    WHERE id = ?12
    "#,
        params![
            kind.card_type,
            draft.front,
            kind.back,
            kind.options,
            kind.correct_answers,
            kind.accepted_answers,
            draft.front_media.image,
            draft.front_media.audio,
            draft.back_media.image,
            draft.back_media.audio,
            draft.favorite,
            id,
        ],
    )?;
    Ok(updated > 0)
}

/// Apply a partial favorite/ignored patch. Returns false if the card does not exist.
pub fn update_card_flags(conn: &Connection, id: i64, patch: &CardFlagsPatch) -> Result<bool> {
    let updated = conn.execute(
        r#"
    UPDATE cards
    SET favorite = COALESCE(?1, favorite), ignored = COALESCE(?2, ignored)
    WHERE id = ?3
    "#,
        params![patch.favorite, patch.ignored, id],
    )?;
    Ok(updated > 0)
}

pub fn delete_card(conn: &Connection, id: i64) -> Result<bool> {
    let deleted = conn.execute("DELETE FROM cards WHERE id = ?1", params![id])?;
    Ok(deleted > 0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::decks::insert_deck;
    use crate::db::schema::run_migrations;
    use crate::domain::DeckDraft;

    fn setup() -> (Connection, i64) {
        let conn = Connection::open_in_memory().unwrap();
        run_migrations(&conn).unwrap();
        let draft: DeckDraft = serde_json::from_str(r#"{"name":"Geography"}"#).unwrap();
        let deck_id = insert_deck(&conn, &draft).unwrap();
        (conn, deck_id)
    }

    fn card(deck_id: i64, front: &str, kind: CardKind, position: i64) -> Card {
        Card {
            position,
            ..Card::new(deck_id, front.to_string(), kind)
        }
    }

    #[test]
    fn test_insert_and_get_each_kind() {
        let (conn, deck_id) = setup();

        let kinds = vec![
            CardKind::Classic {
                back: "Paris".into(),
            },
            CardKind::MultipleChoice {
                options: vec!["Lyon".into()],
                correct_answers: vec!["Paris".into(), "Paname".into()],
            },
            CardKind::TypeAnswer {
                back: "Paris".into(),
                accepted_answers: vec!["paris".into()],
            },
        ];

        for kind in kinds {
            let id = insert_card(&conn, &card(deck_id, "Capital of France?", kind.clone(), 0)).unwrap();
            let loaded = get_card_by_id(&conn, id).unwrap().unwrap();
            assert_eq!(loaded.kind, kind);
            assert_eq!(loaded.deck_id, deck_id);
        }
    }

    #[test]
    fn test_media_roundtrip() {
        let (conn, deck_id) = setup();
        let mut c = card(deck_id, "Q", CardKind::Classic { back: "A".into() }, 0);
        c.front_media.image = Some("front.png".into());
        c.back_media.audio = Some("answer.mp3".into());

        let id = insert_card(&conn, &c).unwrap();
        let loaded = get_card_by_id(&conn, id).unwrap().unwrap();
        assert_eq!(loaded.front_media.image.as_deref(), Some("front.png"));
        assert!(loaded.front_media.audio.is_none());
        assert_eq!(loaded.back_media.audio.as_deref(), Some("answer.mp3"));
    }

    #[test]
    fn test_get_missing_card() {
        let (conn, _) = setup();
        assert!(get_card_by_id(&conn, 999).unwrap().is_none());
    }

    #[test]
    fn test_deck_cards_ordered_by_position() {
        let (conn, deck_id) = setup();
        insert_card(&conn, &card(deck_id, "third", CardKind::Classic { back: "3".into() }, 2)).unwrap();
        insert_card(&conn, &card(deck_id, "first", CardKind::Classic { back: "1".into() }, 0)).unwrap();
        insert_card(&conn, &card(deck_id, "second", CardKind::Classic { back: "2".into() }, 1)).unwrap();

        let fronts: Vec<String> = get_deck_cards(&conn, deck_id)
            .unwrap()
            .into_iter()
            .map(|c| c.front)
            .collect();
        assert_eq!(fronts, vec!["first", "second", "third"]);
    }

    #[test]
    fn test_next_position() {
        let (conn, deck_id) = setup();
        assert_eq!(next_position(&conn, deck_id).unwrap(), 0);
        insert_card(&conn, &card(deck_id, "a", CardKind::Classic { back: "1".into() }, 4)).unwrap();
        assert_eq!(next_position(&conn, deck_id).unwrap(), 5);
    }

    #[test]
    fn test_update_flags_is_partial() {
        let (conn, deck_id) = setup();
        let id = insert_card(&conn, &card(deck_id, "Q", CardKind::Classic { back: "A".into() }, 0)).unwrap();

        let patch = CardFlagsPatch {
            favorite: Some(true),
            ignored: None,
        };
        assert!(update_card_flags(&conn, id, &patch).unwrap());
        let loaded = get_card_by_id(&conn, id).unwrap().unwrap();
        assert!(loaded.favorite);
        assert!(!loaded.ignored);

        let patch = CardFlagsPatch {
            favorite: None,
            ignored: Some(true),
        };
        update_card_flags(&conn, id, &patch).unwrap();
        let loaded = get_card_by_id(&conn, id).unwrap().unwrap();
        assert!(loaded.favorite);
        assert!(loaded.ignored);

        assert!(!update_card_flags(&conn, 999, &patch).unwrap());
    }

    #[test]
    fn test_update_card_changes_kind() {
        let (conn, deck_id) = setup();
        let id = insert_card(&conn, &card(deck_id, "Q", CardKind::Classic { back: "A".into() }, 0)).unwrap();

        let draft = CardDraft {
            front: "Q2".into(),
            kind: CardKind::TypeAnswer {
                back: "B".into(),
                accepted_answers: vec!["b".into()],
            },
            front_media: Media::default(),
            back_media: Media::default(),
            favorite: true,
        };
        assert!(update_card(&conn, id, &draft).unwrap());

        let loaded = get_card_by_id(&conn, id).unwrap().unwrap();
        assert_eq!(loaded.front, "Q2");
        assert_eq!(loaded.kind, draft.kind);
        assert!(loaded.favorite);
        assert!(!update_card(&conn, 999, &draft).unwrap());
    }

    #[test]
    fn test_delete_card() {
        let (conn, deck_id) = setup();
        let id = insert_card(&conn, &card(deck_id, "Q", CardKind::Classic { back: "A".into() }, 0)).unwrap();
        assert!(delete_card(&conn, id).unwrap());
        assert!(!delete_card(&conn, id).unwrap());
        assert!(get_card_by_id(&conn, id).unwrap().is_none());
    }

    #[test]
    fn test_unknown_card_type_is_an_error() {
        let (conn, deck_id) = setup();
        conn.execute(
            "INSERT INTO cards (deck_id, card_type, front, created_at) VALUES (?1, 'cloze', 'Q', ?2)",
            params![deck_id, Utc::now().to_rfc3339()],
        )
        .unwrap();
        assert!(get_deck_cards(&conn, deck_id).is_err());
    }
}
