pub mod card;
pub mod deck;
pub mod study;

pub use card::{Card, CardDraft, CardFlagsPatch, CardKind, CardType, Media};
pub use deck::{CommunityDeck, Deck, DeckDraft, Difficulty, LanguagePair};
pub use study::{CardOrder, StudyOptions, StudySession, StudySource};
