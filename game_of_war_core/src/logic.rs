use crate::card::{compare, Card};
use crate::state::*;
use tracing::{debug, info, warn};
use uuid::Uuid;

// --- Step results ---

/// What `begin_step` did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    /// A transition finished; nothing left to do.
    Moved,
    /// The stakes are ready to go to `side`. Play the animation, then call
    /// [`BattleEngine::complete_step`]. Decks are untouched until then.
    Animate { side: Side, cards: Vec<Card> },
    /// A deck is empty; the game is over and nothing changed.
    Unchanged,
    /// A step is already in flight.
    Rejected,
}

/// What `complete_step` did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Settle {
    /// Stakes were handed over. When `lookahead_due` is set the engine stays busy
    /// until one more `complete_step` draws the next pair.
    Awarded { side: Side, won: usize, lookahead_due: bool },
    /// The next pair was drawn after an award.
    LookedAhead,
    /// No step was pending.
    Nothing,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Pending {
    Award { side: Side, lookahead: bool },
    Lookahead,
}

// --- Battle engine ---

/// The War state machine. Owns both decks and the stakes.
///
/// Each call to [`advance`](Self::advance) (or a `begin_step` / `complete_step` pair)
/// performs one transition:
///
/// - `Idle`: draw one card each and compare -> `Drawn`
/// - `Drawn` after a tie: start the war -> `Facedown`
/// - `Drawn` otherwise: award the stakes, then draw the next pair -> `Drawn`, `Facedown` or `Idle`
/// - `Facedown`: place up to three cards each -> `Reveal`
/// - `Reveal`: draw one card each; a tie goes back to `Facedown`, anything else awards -> `Idle`
///
/// War rounds are a loop through `Facedown`/`Reveal`, never recursion.
#[derive(Debug, Clone)]
pub struct BattleEngine {
    game_id: GameId,
    decks: Decks,
    phase: BattlePhase,
    last_winner: Option<Winner>,
    /// `(player, computer)` cards currently face up.
    face_up: Option<(Card, Card)>,
    pending: Option<Pending>,
    war_rounds: u32,
    battles: u32,
    discarded: usize,
    initial_total: usize,
}

impl BattleEngine {
    pub fn new(decks: Decks) -> Self {
        Self::with_id(Uuid::new_v4(), decks)
    }

    pub fn with_id(game_id: GameId, decks: Decks) -> Self {
        let initial_total = decks.total();
        BattleEngine {
            game_id,
            decks,
            phase: BattlePhase::Idle,
            last_winner: None,
            face_up: None,
            pending: None,
            war_rounds: 0,
            battles: 0,
            discarded: 0,
            initial_total,
        }
    }

    pub fn game_id(&self) -> GameId {
        self.game_id
    }

    pub fn phase(&self) -> BattlePhase {
        self.phase
    }

    pub fn decks(&self) -> &Decks {
        &self.decks
    }

    /// True between a `Step::Animate` and the `complete_step` calls that finish it.
    pub fn is_busy(&self) -> bool {
        self.pending.is_some()
    }

    pub fn outcome(&self) -> Option<Outcome> {
        self.decks.outcome()
    }

    pub fn discarded(&self) -> usize {
        self.discarded
    }

    pub fn initial_total(&self) -> usize {
        self.initial_total
    }

    pub fn war_in_progress(&self) -> bool {
        self.phase != BattlePhase::Idle
            && (self.war_rounds > 0 || self.last_winner == Some(Winner::Tie))
    }

    /// Runs one full transition, with the animation reduced to nothing.
    pub fn advance(&mut self) -> Snapshot {
        if let Step::Animate { .. } = self.begin_step() {
            while self.complete_step() != Settle::Nothing {}
        }
        self.snapshot()
    }

    /// Starts the transition for the current phase.
    pub fn begin_step(&mut self) -> Step {
        if self.is_busy() {
            debug!(game_id = %self.game_id, "step already in flight, ignoring advance");
            return Step::Rejected;
        }

        match self.phase {
            BattlePhase::Idle => {
                if !self.decks.both_have_cards() {
                    return Step::Unchanged;
                }
                self.war_rounds = 0;
                self.draw_and_compare();
                self.phase = BattlePhase::Drawn;
                Step::Moved
            }
            BattlePhase::Drawn => match self.last_winner {
                Some(Winner::Tie) => {
                    self.start_war();
                    Step::Moved
                }
                Some(Winner::Player) => self.hold_award(Side::Player, true),
                Some(Winner::Computer) => self.hold_award(Side::Computer, true),
                None => {
                    self.phase = BattlePhase::Idle;
                    Step::Moved
                }
            },
            BattlePhase::Facedown => {
                let placed = self.decks.place_facedown();
                debug!(placed, stakes = self.decks.stakes.len(), "facedown cards placed");
                self.phase = BattlePhase::Reveal;
                Step::Moved
            }
            BattlePhase::Reveal => self.reveal(),
            // Only reachable with a pending award, which is handled above.
            BattlePhase::Animating => Step::Rejected,
        }
    }

    /// Finishes whatever `begin_step` left pending.
    pub fn complete_step(&mut self) -> Settle {
        match self.pending.take() {
            None => Settle::Nothing,
            Some(Pending::Award { side, lookahead }) => {
                let won = self.decks.award(side);
                self.battles += 1;
                self.face_up = None;
                debug!(?side, won, player = self.decks.player.len(), computer = self.decks.computer.len(), "stakes awarded");

                let lookahead_due = lookahead && self.decks.both_have_cards();
                if lookahead_due {
                    self.pending = Some(Pending::Lookahead);
                } else {
                    self.phase = BattlePhase::Idle;
                    self.log_if_over();
                }
                Settle::Awarded { side, won, lookahead_due }
            }
            Some(Pending::Lookahead) => {
                self.war_rounds = 0;
                match self.draw_and_compare() {
                    Some(Winner::Tie) => self.start_war(),
                    Some(_) => self.phase = BattlePhase::Drawn,
                    None => self.phase = BattlePhase::Idle,
                }
                Settle::LookedAhead
            }
        }
    }

    pub fn snapshot(&self) -> Snapshot {
        let (right, left) = match &self.face_up {
            Some((player, computer)) => (Some(player.clone()), Some(computer.clone())),
            None => (None, None),
        };
        Snapshot {
            game_id: self.game_id,
            phase: self.phase,
            left,
            right,
            player_count: self.decks.player.len(),
            computer_count: self.decks.computer.len(),
            stakes_count: self.decks.stakes.len(),
            last_winner: self.last_winner,
            war_in_progress: self.war_in_progress(),
            war_rounds: self.war_rounds,
            battles: self.battles,
            discarded: self.discarded,
            busy: self.is_busy(),
            outcome: self.outcome(),
        }
    }

    // --- Internal transitions ---

    /// Draws one card each and records who won. `None` if a deck is empty.
    fn draw_and_compare(&mut self) -> Option<Winner> {
        let (player_card, computer_card) = self.decks.draw_pair()?;
        let winner = Winner::from_comparison(compare(&player_card, &computer_card));
        debug!(player = %player_card, computer = %computer_card, ?winner, "cards compared");
        self.face_up = Some((player_card, computer_card));
        self.last_winner = Some(winner);
        Some(winner)
    }

    fn start_war(&mut self) {
        self.war_rounds += 1;
        self.phase = BattlePhase::Facedown;
        debug!(round = self.war_rounds, stakes = self.decks.stakes.len(), "war");
    }

    fn reveal(&mut self) -> Step {
        match self.draw_and_compare() {
            Some(Winner::Tie) => {
                self.start_war();
                Step::Moved
            }
            Some(Winner::Player) => self.hold_award(Side::Player, false),
            Some(Winner::Computer) => self.hold_award(Side::Computer, false),
            None => self.settle_exhausted(),
        }
    }

    /// A side ran out before the war could be decided.
    /// Whoever still holds cards takes everything; if nobody does, the stakes are lost.
    fn settle_exhausted(&mut self) -> Step {
        match (self.decks.player.is_empty(), self.decks.computer.is_empty()) {
            (true, true) => {
                let dropped = self.decks.discard_stakes();
                self.discarded += dropped;
                self.battles += 1;
                self.face_up = None;
                self.phase = BattlePhase::Idle;
                warn!(game_id = %self.game_id, dropped, "both decks ran out during a war, stakes discarded");
                self.log_if_over();
                Step::Moved
            }
            (true, false) => self.hold_award(Side::Computer, false),
            (false, _) => self.hold_award(Side::Player, false),
        }
    }

    fn hold_award(&mut self, side: Side, lookahead: bool) -> Step {
        self.pending = Some(Pending::Award { side, lookahead });
        self.last_winner = Some(side.into());
        self.phase = BattlePhase::Animating;
        Step::Animate { side, cards: self.decks.stakes.clone() }
    }

    fn log_if_over(&self) {
        if let Some(outcome) = self.outcome() {
            info!(game_id = %self.game_id, ?outcome, battles = self.battles, "game over");
        }
    }
}

// --- Unit tests ---
