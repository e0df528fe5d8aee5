use crate::autoplay::{AutoPlayEnd, PlayMode};
use crate::card::Card;
use crate::state::{GameId, Outcome, Side, Snapshot};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// --- Table -> presentation ---
// Everything the presentation layer learns about the game arrives as one of these.

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub enum GameEvent {
    /// A fresh deck was dealt.
    GameStarted {
        game_id: GameId,
        player_count: usize,
        computer_count: usize,
    },
    /// State after a step (and once mid-step, right after an award).
    Snapshot(Snapshot),
    /// The stakes are on their way to `winner`. Decks change once the animation is over.
    Animating {
        game_id: GameId,
        winner: Side,
        cards: Vec<Card>,
    },
    /// Sent once per game, when a deck first runs out.
    GameOver {
        game_id: GameId,
        outcome: Outcome,
        battles: u32,
    },
    /// The deck provider failed; no game was started.
    SetupFailed { message: String },
    AutoPlayStarted { mode: PlayMode },
    AutoPlayStopped { reason: AutoPlayEnd },
}

// --- Presentation -> table ---

/// Requests a presentation layer can make.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Shuffle a new deck locally, optionally from a seed.
    NewGame { seed: Option<u64> },
    /// Start a game from a saved deck-of-cards response.
    LoadDeck { path: String },
    /// Manual step.
    Advance,
    StartAutoPlay(PlayMode),
    StopAutoPlay,
    ToggleAutoPlay(PlayMode),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseCommandError(pub String);

impl fmt::Display for ParseCommandError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "unknown command: {}", self.0)
    }
}

impl std::error::Error for ParseCommandError {}

impl FromStr for Command {
    type Err = ParseCommandError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.split_whitespace().collect();
        let err = || ParseCommandError(s.trim().to_string());
        match parts.as_slice() {
            [] | ["next"] | ["n"] => Ok(Command::Advance),
            ["new"] => Ok(Command::NewGame { seed: None }),
            ["new", seed] => seed
                .parse()
                .map(|seed| Command::NewGame { seed: Some(seed) })
                .map_err(|_| err()),
            ["load", path] => Ok(Command::LoadDeck { path: path.to_string() }),
            ["auto"] => Ok(Command::ToggleAutoPlay(PlayMode::Stepped)),
            ["fast"] => Ok(Command::StartAutoPlay(PlayMode::Fast)),
            ["stop"] => Ok(Command::StopAutoPlay),
            _ => Err(err()),
        }
    }
}
