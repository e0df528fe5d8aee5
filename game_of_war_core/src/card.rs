use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::warn;

// --- Core data structures ---

/// Rank order given to a card whose label could not be recognised.
/// It loses against every known rank and ties only with another unknown card.
pub const UNKNOWN_RANK: i8 = -1;

/// Where the deck-of-cards service keeps its card faces.
pub const IMAGE_BASE: &str = "https://deckofcardsapi.com/static/img";

/// Suit. Never used to break a tie.
#[derive(Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Clone, Copy, Serialize, Deserialize)]
pub enum Suit {
    Spade,
    Heart,
    Club,
    Diamond,
}

/// Rank, ordered low to high. Discriminants are the numeric rank order.
#[derive(Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Clone, Copy, Serialize, Deserialize)]
#[repr(i8)]
pub enum Rank {
    Two = 2,
    Three = 3,
    Four = 4,
    Five = 5,
    Six = 6,
    Seven = 7,
    Eight = 8,
    Nine = 9,
    Ten = 10,
    Jack = 11,
    Queen = 12,
    King = 13,
    Ace = 14,
}

/// A card as the deck provider hands it over (deck-of-cards JSON shape).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CardRecord {
    pub value: String,
    pub suit: String,
    pub image: String,
    #[serde(default)]
    pub code: String,
}

/// A single playing card. Immutable once drawn.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Card {
    /// `None` when the provider sent a label we do not know.
    pub rank: Option<Rank>,
    pub suit: Option<Suit>,
    /// The rank label exactly as it was received.
    pub label: String,
    /// Opaque reference to the card face, only meaningful to the presentation layer.
    pub image: String,
}

/// Result of putting two cards against each other.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Comparison {
    First,
    Second,
    Tie,
}

impl Suit {
    pub const ALL: [Suit; 4] = [Suit::Spade, Suit::Heart, Suit::Club, Suit::Diamond];

    /// Parses a provider suit label such as `"HEARTS"` (case-insensitive).
    pub fn from_label(label: &str) -> Option<Suit> {
        match label.to_ascii_uppercase().as_str() {
            "SPADES" => Some(Suit::Spade),
            "HEARTS" => Some(Suit::Heart),
            "CLUBS" => Some(Suit::Club),
            "DIAMONDS" => Some(Suit::Diamond),
            _ => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Suit::Spade => "SPADES",
            Suit::Heart => "HEARTS",
            Suit::Club => "CLUBS",
            Suit::Diamond => "DIAMONDS",
        }
    }

    fn code(self) -> char {
        match self {
            Suit::Spade => 'S',
            Suit::Heart => 'H',
            Suit::Club => 'C',
            Suit::Diamond => 'D',
        }
    }
}

impl Rank {
    pub const ALL: [Rank; 13] = [
        Rank::Two, Rank::Three, Rank::Four, Rank::Five, Rank::Six, Rank::Seven,
        Rank::Eight, Rank::Nine, Rank::Ten, Rank::Jack, Rank::Queen, Rank::King, Rank::Ace,
    ];

    /// Parses a provider rank label (`"2"`..`"10"`, `"JACK"`, `"QUEEN"`, `"KING"`, `"ACE"`),
    /// ignoring case.
    pub fn from_label(label: &str) -> Option<Rank> {
        let rank = match label.to_ascii_uppercase().as_str() {
            "2" => Rank::Two,
            "3" => Rank::Three,
            "4" => Rank::Four,
            "5" => Rank::Five,
            "6" => Rank::Six,
            "7" => Rank::Seven,
            "8" => Rank::Eight,
            "9" => Rank::Nine,
            "10" => Rank::Ten,
            "JACK" => Rank::Jack,
            "QUEEN" => Rank::Queen,
            "KING" => Rank::King,
            "ACE" => Rank::Ace,
            _ => return None,
        };
        Some(rank)
    }

    pub fn value(self) -> i8 {
        self as i8
    }

    pub fn label(self) -> &'static str {
        match self {
            Rank::Two => "2",
            Rank::Three => "3",
            Rank::Four => "4",
            Rank::Five => "5",
            Rank::Six => "6",
            Rank::Seven => "7",
            Rank::Eight => "8",
            Rank::Nine => "9",
            Rank::Ten => "10",
            Rank::Jack => "JACK",
            Rank::Queen => "QUEEN",
            Rank::King => "KING",
            Rank::Ace => "ACE",
        }
    }

    fn code(self) -> char {
        match self {
            Rank::Ten => '0', // deck-of-cards writes ten as "0"
            Rank::Jack => 'J',
            Rank::Queen => 'Q',
            Rank::King => 'K',
            Rank::Ace => 'A',
            other => char::from(b'0' + other.value() as u8),
        }
    }
}

impl Card {
    pub fn new(rank: Rank, suit: Suit) -> Card {
        Card {
            rank: Some(rank),
            suit: Some(suit),
            label: rank.label().to_string(),
            image: format!("{}/{}.png", IMAGE_BASE, card_code(rank, suit)),
        }
    }

    /// Converts a provider record, normalising case once here.
    /// Unknown ranks are kept (they always lose) and reported.
    pub fn from_record(record: CardRecord) -> Card {
        let rank = Rank::from_label(&record.value);
        if rank.is_none() {
            warn!(value = %record.value, code = %record.code, "unknown card rank, treating it as the lowest");
        }
        Card {
            rank,
            suit: Suit::from_label(&record.suit),
            label: record.value,
            image: record.image,
        }
    }
}

impl CardRecord {
    pub fn new(rank: Rank, suit: Suit) -> CardRecord {
        let code = card_code(rank, suit);
        CardRecord {
            value: rank.label().to_string(),
            suit: suit.label().to_string(),
            image: format!("{}/{}.png", IMAGE_BASE, code),
            code,
        }
    }
}

impl Comparison {
    /// The same comparison seen from the other card.
    pub fn reversed(self) -> Comparison {
        match self {
            Comparison::First => Comparison::Second,
            Comparison::Second => Comparison::First,
            Comparison::Tie => Comparison::Tie,
        }
    }
}

fn card_code(rank: Rank, suit: Suit) -> String {
    format!("{}{}", rank.code(), suit.code())
}

// --- Ranking ---

/// Numeric order of a card: 2..=14, or [`UNKNOWN_RANK`].
pub fn rank_of(card: &Card) -> i8 {
    card.rank.map_or(UNKNOWN_RANK, Rank::value)
}

/// Compares two cards strictly by rank.
pub fn compare(a: &Card, b: &Card) -> Comparison {
    let (ra, rb) = (rank_of(a), rank_of(b));
    if ra > rb {
        Comparison::First
    } else if ra < rb {
        Comparison::Second
    } else {
        Comparison::Tie
    }
}

// --- Display helpers ---

impl fmt::Display for Suit {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", match self {
            Suit::Spade => "♠️",
            Suit::Heart => "♥️",
            Suit::Club => "♣️",
            Suit::Diamond => "♦️",
        })
    }
}

impl fmt::Display for Rank {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", match self {
            Rank::Ten => "10",
            Rank::Jack => "J",
            Rank::Queen => "Q",
            Rank::King => "K",
            Rank::Ace => "A",
            other => other.label(),
        })
    }
}

impl fmt::Display for Card {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match (self.suit, self.rank) {
            (Some(suit), Some(rank)) => write!(f, "{}{}", suit, rank),
            (None, Some(rank)) => write!(f, "?{}", rank),
            (_, None) => write!(f, "?({})", self.label),
        }
    }
}

// --- Deck generation ---

/// The 52 distinct provider records, in suit-then-rank order.
pub fn standard_deck() -> Vec<CardRecord> {
    let mut deck = Vec::with_capacity(52);
    for &suit in &Suit::ALL {
        for &rank in &Rank::ALL {
            deck.push(CardRecord::new(rank, suit));
        }
    }
    deck
}

// --- Unit tests ---

#[cfg(test)]
mod tests {
    use super::*;
    use Rank::*;
    use Suit::*;
    use std::collections::HashSet;

    fn record(value: &str, suit: &str) -> CardRecord {
        CardRecord {
            value: value.to_string(),
            suit: suit.to_string(),
            image: "img".to_string(),
            code: String::new(),
        }
    }

    #[test]
    fn test_rank_of_maps_every_label() {
        let expected = [
            ("2", 2), ("3", 3), ("4", 4), ("5", 5), ("6", 6), ("7", 7), ("8", 8),
            ("9", 9), ("10", 10), ("JACK", 11), ("QUEEN", 12), ("KING", 13), ("ACE", 14),
        ];
        for (label, value) in expected {
            let card = Card::from_record(record(label, "SPADES"));
            assert_eq!(rank_of(&card), value, "label {}", label);
        }
    }

    #[test]
    fn test_rank_labels_are_case_insensitive() {
        assert_eq!(Card::from_record(record("queen", "hearts")).rank, Some(Queen));
        assert_eq!(Card::from_record(record("Ace", "Clubs")).suit, Some(Club));
    }

    #[test]
    fn test_unknown_rank_is_lowest() {
        let joker = Card::from_record(record("JOKER", "SPADES"));
        assert_eq!(joker.rank, None);
        assert_eq!(rank_of(&joker), UNKNOWN_RANK);
        assert_eq!(joker.label, "JOKER");
        assert_eq!(compare(&joker, &Card::new(Two, Heart)), Comparison::Second);
    }

    #[test]
    fn test_two_unknown_cards_tie() {
        let a = Card::from_record(record("JOKER", "SPADES"));
        let b = Card::from_record(record("", ""));
        assert_eq!(compare(&a, &b), Comparison::Tie);
    }

    #[test]
    fn test_compare_is_antisymmetric() {
        for &a in &Rank::ALL {
            for &b in &Rank::ALL {
                let (ca, cb) = (Card::new(a, Spade), Card::new(b, Heart));
                assert_eq!(compare(&ca, &cb), compare(&cb, &ca).reversed());
            }
        }
    }

    #[test]
    fn test_suit_never_breaks_a_tie() {
        for &s1 in &Suit::ALL {
            for &s2 in &Suit::ALL {
                assert_eq!(compare(&Card::new(Seven, s1), &Card::new(Seven, s2)), Comparison::Tie);
            }
        }
    }

    #[test]
    fn test_higher_rank_wins() {
        assert_eq!(compare(&Card::new(Ace, Club), &Card::new(King, Club)), Comparison::First);
        assert_eq!(compare(&Card::new(Ten, Club), &Card::new(Jack, Club)), Comparison::Second);
    }

    #[test]
    fn test_standard_deck_has_52_unique_cards() {
        let deck = standard_deck();
        assert_eq!(deck.len(), 52);
        let codes: HashSet<_> = deck.iter().map(|r| r.code.clone()).collect();
        assert_eq!(codes.len(), 52);
        assert!(deck.iter().any(|r| r.code == "0D" && r.value == "10"));
        assert!(deck.iter().all(|r| Rank::from_label(&r.value).is_some()));
    }

    #[test]
    fn test_record_round_trips_into_same_card() {
        let card = Card::from_record(CardRecord::new(Ten, Diamond));
        assert_eq!(card, Card::new(Ten, Diamond));
        assert_eq!(card.to_string(), "♦️10");
    }
}
