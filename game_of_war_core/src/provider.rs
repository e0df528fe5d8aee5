use crate::card::{standard_deck, Card, CardRecord};
use crate::error::SetupError;
use crate::state::Decks;
use futures_util::future::{BoxFuture, FutureExt};
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use serde::Deserialize;
use std::collections::HashSet;
use std::path::PathBuf;
use tracing::{debug, warn};

/// Cards in a full deck; a game is only set up from exactly this many.
pub const DECK_SIZE: usize = 52;

/// Source of a shuffled deck. Asked exactly once per game.
pub trait DeckProvider: Send + Sync {
    fn fetch(&self) -> BoxFuture<'_, Result<Vec<CardRecord>, SetupError>>;
}

/// Shuffles a standard deck locally. A seed makes the deal reproducible.
#[derive(Debug, Default, Clone, Copy)]
pub struct ShuffledDeck {
    pub seed: Option<u64>,
}

impl ShuffledDeck {
    pub fn seeded(seed: u64) -> Self {
        ShuffledDeck { seed: Some(seed) }
    }

    pub fn deal(&self) -> Vec<CardRecord> {
        let mut deck = standard_deck();
        match self.seed {
            Some(seed) => deck.shuffle(&mut StdRng::seed_from_u64(seed)),
            None => deck.shuffle(&mut rand::rng()),
        }
        deck
    }
}

impl DeckProvider for ShuffledDeck {
    fn fetch(&self) -> BoxFuture<'_, Result<Vec<CardRecord>, SetupError>> {
        let deck = self.deal();
        async move { Ok::<_, SetupError>(deck) }.boxed()
    }
}

/// Hands back exactly the cards it was given, in order.
#[derive(Debug, Clone)]
pub struct FixedDeck(pub Vec<CardRecord>);

impl DeckProvider for FixedDeck {
    fn fetch(&self) -> BoxFuture<'_, Result<Vec<CardRecord>, SetupError>> {
        async move { Ok::<_, SetupError>(self.0.clone()) }.boxed()
    }
}

/// A deck-of-cards "draw" response, either inline or saved to a file.
#[derive(Debug, Clone)]
pub enum JsonDeck {
    Text(String),
    File(PathBuf),
}

/// The parts of a deck-of-cards draw response we care about.
#[derive(Debug, Deserialize)]
struct DrawResponse {
    #[serde(default = "default_success")]
    success: bool,
    #[serde(default)]
    deck_id: String,
    #[serde(default)]
    cards: Vec<CardRecord>,
    #[serde(default)]
    error: Option<String>,
}

fn default_success() -> bool {
    true
}

/// Reads the cards out of a deck-of-cards draw response.
pub fn parse_draw_response(text: &str) -> Result<Vec<CardRecord>, SetupError> {
    let response: DrawResponse = serde_json::from_str(text)?;
    if !response.success {
        let reason = response.error.unwrap_or_else(|| "provider reported failure".to_string());
        return Err(SetupError::Fetch(reason));
    }
    debug!(deck_id = %response.deck_id, cards = response.cards.len(), "deck response parsed");
    Ok(response.cards)
}

impl JsonDeck {
    async fn load(&self) -> Result<Vec<CardRecord>, SetupError> {
        match self {
            JsonDeck::Text(text) => parse_draw_response(text),
            JsonDeck::File(path) => {
                let text = tokio::fs::read_to_string(path).await?;
                parse_draw_response(&text)
            }
        }
    }
}

impl DeckProvider for JsonDeck {
    fn fetch(&self) -> BoxFuture<'_, Result<Vec<CardRecord>, SetupError>> {
        self.load().boxed()
    }
}

/// Checks the provider's answer and deals it into the two starting decks.
///
/// Anything other than exactly [`DECK_SIZE`] cards is refused. Repeated cards are
/// tolerated but logged.
pub fn prepare_decks(records: Vec<CardRecord>) -> Result<Decks, SetupError> {
    if records.len() != DECK_SIZE {
        return Err(SetupError::WrongCardCount { expected: DECK_SIZE, found: records.len() });
    }

    let mut seen = HashSet::new();
    for record in &records {
        let key = (record.value.to_ascii_uppercase(), record.suit.to_ascii_uppercase());
        if !seen.insert(key) {
            warn!(value = %record.value, suit = %record.suit, "duplicate card in provided deck");
        }
    }

    let cards: Vec<Card> = records.into_iter().map(Card::from_record).collect();
    Ok(Decks::deal(cards))
}

// --- Unit tests ---
