//! # Game of War core
//!
//! The card game "War" as a library: card ranking, the two decks and their stakes,
//! the battle state machine, auto-play, deck providers and the events a presentation
//! layer renders. Nothing in here draws to a screen; front ends subscribe to the
//! [`GameEvent`] stream of a [`Table`] and send it requests.

mod autoplay;
mod card;
mod clock;
mod config;
mod error;
mod logic;
mod message;
mod provider;
mod state;
mod table;

pub use autoplay::{AutoPlay, AutoPlayEnd, PlayMode};

pub use card::*;

pub use clock::*;

pub use config::TableConfig;

pub use error::SetupError;

pub use logic::{BattleEngine, Settle, Step};

pub use message::*;

pub use provider::*;

pub use state::*;

pub use table::Table;
