use crate::card::{Card, Comparison};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use uuid::Uuid;

pub type GameId = Uuid;

/// Most cards a side puts face down in one war round.
pub const FACEDOWN_PER_WAR: usize = 3;

/// One of the two seats at the table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Side {
    Player,
    Computer,
}

/// Who took the last comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Winner {
    Player,
    Computer,
    Tie,
}

/// Position in the battle state machine. Exactly one is active.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BattlePhase {
    /// No battle running; next advance draws a pair.
    Idle,
    /// A face-up pair is on the table and has been compared.
    Drawn,
    /// A war is due; next advance places the face-down cards.
    Facedown,
    /// Face-down cards are placed; next advance reveals one card each.
    Reveal,
    /// Stakes are being shown moving to the winner. The engine is busy.
    Animating,
}

/// How the game ended. Derived from the deck sizes, never stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Outcome {
    PlayerWon,
    ComputerWon,
    /// Both decks ran dry during a war and the stakes were thrown away.
    Abandoned,
}

impl Winner {
    /// Reads a comparison made as `compare(player_card, computer_card)`.
    pub fn from_comparison(comparison: Comparison) -> Winner {
        match comparison {
            Comparison::First => Winner::Player,
            Comparison::Second => Winner::Computer,
            Comparison::Tie => Winner::Tie,
        }
    }

    pub fn side(self) -> Option<Side> {
        match self {
            Winner::Player => Some(Side::Player),
            Winner::Computer => Some(Side::Computer),
            Winner::Tie => None,
        }
    }
}

impl From<Side> for Winner {
    fn from(side: Side) -> Self {
        match side {
            Side::Player => Winner::Player,
            Side::Computer => Winner::Computer,
        }
    }
}

/// The two decks plus the cards currently at stake.
/// Front of a deck is the next card to play; won cards go to the back.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Decks {
    pub player: VecDeque<Card>,
    pub computer: VecDeque<Card>,
    pub stakes: Vec<Card>,
}

impl Decks {
    /// Deals alternately: even positions to the player, odd ones to the computer.
    pub fn deal(cards: Vec<Card>) -> Decks {
        let mut decks = Decks::default();
        for (i, card) in cards.into_iter().enumerate() {
            if i % 2 == 0 {
                decks.player.push_back(card);
            } else {
                decks.computer.push_back(card);
            }
        }
        decks
    }

    pub fn from_parts(player: Vec<Card>, computer: Vec<Card>) -> Decks {
        Decks {
            player: player.into(),
            computer: computer.into(),
            stakes: Vec::new(),
        }
    }

    pub fn deck(&self, side: Side) -> &VecDeque<Card> {
        match side {
            Side::Player => &self.player,
            Side::Computer => &self.computer,
        }
    }

    fn deck_mut(&mut self, side: Side) -> &mut VecDeque<Card> {
        match side {
            Side::Player => &mut self.player,
            Side::Computer => &mut self.computer,
        }
    }

    pub fn both_have_cards(&self) -> bool {
        !self.player.is_empty() && !self.computer.is_empty()
    }

    /// Pops the top card of each deck into the stakes.
    /// Returns `(player_card, computer_card)`, or `None` if either deck is empty.
    pub fn draw_pair(&mut self) -> Option<(Card, Card)> {
        if !self.both_have_cards() {
            return None;
        }
        let player_card = self.player.pop_front()?;
        let computer_card = self.computer.pop_front()?;
        self.stakes.push(player_card.clone());
        self.stakes.push(computer_card.clone());
        Some((player_card, computer_card))
    }

    /// Puts up to [`FACEDOWN_PER_WAR`] cards from each side into the stakes,
    /// alternating player and computer. Returns how many cards moved.
    pub fn place_facedown(&mut self) -> usize {
        let mut moved = 0;
        for _ in 0..FACEDOWN_PER_WAR {
            for side in [Side::Player, Side::Computer] {
                if let Some(card) = self.deck_mut(side).pop_front() {
                    self.stakes.push(card);
                    moved += 1;
                }
            }
        }
        moved
    }

    /// Moves every staked card to the bottom of the winner's deck, in capture order.
    pub fn award(&mut self, side: Side) -> usize {
        let won = self.stakes.len();
        let stakes = std::mem::take(&mut self.stakes);
        self.deck_mut(side).extend(stakes);
        won
    }

    pub fn discard_stakes(&mut self) -> usize {
        let dropped = self.stakes.len();
        self.stakes.clear();
        dropped
    }

    pub fn total(&self) -> usize {
        self.player.len() + self.computer.len() + self.stakes.len()
    }

    pub fn outcome(&self) -> Option<Outcome> {
        match (self.player.is_empty(), self.computer.is_empty()) {
            (true, true) => Some(Outcome::Abandoned),
            (true, false) => Some(Outcome::ComputerWon),
            (false, true) => Some(Outcome::PlayerWon),
            (false, false) => None,
        }
    }
}

/// Read-only picture of the table handed to the presentation layer after every step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    pub game_id: GameId,
    pub phase: BattlePhase,
    /// Computer's face-up card.
    pub left: Option<Card>,
    /// Player's face-up card.
    pub right: Option<Card>,
    pub player_count: usize,
    pub computer_count: usize,
    pub stakes_count: usize,
    pub last_winner: Option<Winner>,
    pub war_in_progress: bool,
    /// War rounds fought in the current battle.
    pub war_rounds: u32,
    /// Battles resolved so far in this game.
    pub battles: u32,
    pub discarded: usize,
    pub busy: bool,
    pub outcome: Option<Outcome>,
}

impl Snapshot {
    pub fn is_game_over(&self) -> bool {
        self.outcome.is_some()
    }

    /// The one-line banner shown above the cards.
    pub fn headline(&self) -> String {
        if let Some(outcome) = self.outcome {
            return match outcome {
                Outcome::PlayerWon => "You won the game!".to_string(),
                Outcome::ComputerWon => "The computer won the game!".to_string(),
                Outcome::Abandoned => "Both decks ran out! Nobody wins.".to_string(),
            };
        }
        if self.war_in_progress {
            return match self.phase {
                BattlePhase::Reveal => "War! Cards are down, reveal the next pair".to_string(),
                _ => format!("War! ({} at stake)", self.stakes_count),
            };
        }
        match self.last_winner {
            Some(Winner::Player) => "You win!".to_string(),
            Some(Winner::Computer) => "Computer wins!".to_string(),
            Some(Winner::Tie) => "Tie!".to_string(),
            None => "Game of War".to_string(),
        }
    }
}

// --- Unit tests ---
