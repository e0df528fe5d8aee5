use crate::autoplay::{AutoPlay, PlayMode};
use crate::clock::Clock;
use crate::config::TableConfig;
use crate::error::SetupError;
use crate::logic::{BattleEngine, Settle, Step};
use crate::message::GameEvent;
use crate::provider::{prepare_decks, DeckProvider};
use crate::state::{Decks, GameId, Snapshot};
use parking_lot::Mutex;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{info, warn};

/// The engine of the current game plus what has already been announced about it.
struct Session {
    engine: BattleEngine,
    game_over_sent: bool,
}

/// A game session: owns the engine, runs the animation pauses and
/// reports every change as a [`GameEvent`].
///
/// The engine lock is never held across an `.await`. While an award is animating
/// the engine reports itself busy, so an `advance` arriving in that window is dropped.
pub struct Table {
    session: Mutex<Option<Session>>,
    events: mpsc::UnboundedSender<GameEvent>,
    pub(crate) clock: Arc<dyn Clock>,
    pub(crate) config: TableConfig,
    pub(crate) auto: AutoPlay,
}

impl Table {
    pub fn new(config: TableConfig, clock: Arc<dyn Clock>) -> (Table, mpsc::UnboundedReceiver<GameEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let table = Table {
            session: Mutex::new(None),
            events: tx,
            clock,
            config,
            auto: AutoPlay::default(),
        };
        (table, rx)
    }

    pub fn config(&self) -> &TableConfig {
        &self.config
    }

    pub fn snapshot(&self) -> Option<Snapshot> {
        self.session.lock().as_ref().map(|s| s.engine.snapshot())
    }

    pub fn is_busy(&self) -> bool {
        self.session.lock().as_ref().is_some_and(|s| s.engine.is_busy())
    }

    /// Fetches one deck and starts a new game with it.
    ///
    /// Stops auto-play first. If the provider fails, `SetupFailed` is emitted and
    /// whatever game was on the table stays there.
    pub async fn new_game(&self, provider: &dyn DeckProvider) -> Result<GameId, SetupError> {
        self.stop_auto_play();

        let dealt = match provider.fetch().await {
            Ok(records) => prepare_decks(records),
            Err(e) => Err(e),
        };
        match dealt {
            Ok(decks) => Ok(self.install(decks)),
            Err(e) => {
                warn!(error = %e, "new game could not be set up");
                self.emit(GameEvent::SetupFailed { message: e.to_string() });
                Err(e)
            }
        }
    }

    /// Puts an already dealt pair of decks on the table, replacing any current game.
    pub fn install(&self, decks: Decks) -> GameId {
        let engine = BattleEngine::new(decks);
        let game_id = engine.game_id();
        let snapshot = engine.snapshot();
        *self.session.lock() = Some(Session { engine, game_over_sent: false });

        info!(%game_id, player = snapshot.player_count, computer = snapshot.computer_count, "new game");
        self.emit(GameEvent::GameStarted {
            game_id,
            player_count: snapshot.player_count,
            computer_count: snapshot.computer_count,
        });
        self.emit(GameEvent::Snapshot(snapshot));
        game_id
    }

    /// Manual step. Ignored while auto-play is running, while another step is
    /// animating, or when no game has been set up.
    pub async fn advance(&self) -> Option<Snapshot> {
        if self.is_auto_playing() {
            return None;
        }
        self.step(PlayMode::Stepped).await
    }

    /// One engine step, including the animation pauses the mode asks for.
    pub(crate) async fn step(&self, mode: PlayMode) -> Option<Snapshot> {
        let (game_id, step) = {
            let mut guard = self.session.lock();
            let session = guard.as_mut()?;
            (session.engine.game_id(), session.engine.begin_step())
        };

        match step {
            Step::Rejected => return None,
            Step::Moved | Step::Unchanged => {}
            Step::Animate { side, cards } => {
                self.emit(GameEvent::Animating { game_id, winner: side, cards });
                if mode.animates() {
                    self.clock.sleep(self.config.animation_delay).await;
                }

                let settle = self.with_game(game_id, |engine| engine.complete_step())?;
                if let Settle::Awarded { lookahead_due: true, .. } = settle {
                    if let Some(snapshot) = self.with_game(game_id, |engine| engine.snapshot()) {
                        self.emit(GameEvent::Snapshot(snapshot));
                    }
                    if mode.animates() {
                        self.clock.sleep(self.config.lookahead_delay).await;
                    }
                    self.with_game(game_id, |engine| engine.complete_step())?;
                }
            }
        }

        self.publish(game_id)
    }

    /// Runs `f` on the engine, provided the game has not been replaced meanwhile.
    fn with_game<R>(&self, game_id: GameId, f: impl FnOnce(&mut BattleEngine) -> R) -> Option<R> {
        let mut guard = self.session.lock();
        match guard.as_mut() {
            Some(session) if session.engine.game_id() == game_id => Some(f(&mut session.engine)),
            _ => None,
        }
    }

    /// Emits the post-step snapshot, plus `GameOver` the first time a deck is empty.
    fn publish(&self, game_id: GameId) -> Option<Snapshot> {
        let (snapshot, newly_over) = {
            let mut guard = self.session.lock();
            let session = guard.as_mut().filter(|s| s.engine.game_id() == game_id)?;
            let snapshot = session.engine.snapshot();
            let newly_over = match snapshot.outcome {
                Some(outcome) if !session.game_over_sent => {
                    session.game_over_sent = true;
                    Some(outcome)
                }
                _ => None,
            };
            (snapshot, newly_over)
        };

        self.emit(GameEvent::Snapshot(snapshot.clone()));
        if let Some(outcome) = newly_over {
            info!(%game_id, ?outcome, battles = snapshot.battles, "game over");
            self.emit(GameEvent::GameOver { game_id, outcome, battles: snapshot.battles });
        }
        Some(snapshot)
    }

    pub(crate) fn emit(&self, event: GameEvent) {
        // Nobody listening is fine; the game carries on.
        let _ = self.events.send(event);
    }
}

// --- Unit tests ---
