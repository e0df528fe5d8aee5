use crate::message::GameEvent;
use crate::state::Outcome;
use crate::table::Table;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::task::JoinHandle;
use tracing::{info, warn};

/// How auto-play paces itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PlayMode {
    /// Every phase change is paused on and animated.
    Stepped,
    /// No animation, only a minimal yield between steps.
    Fast,
}

impl PlayMode {
    pub fn animates(self) -> bool {
        self == PlayMode::Stepped
    }
}

/// Why an auto-play run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AutoPlayEnd {
    GameOver(Outcome),
    Stopped,
    /// Ran `max_auto_steps` steps without a winner.
    StepLimit,
    AlreadyRunning,
    NoGame,
}

/// Auto-play flags shared between the driver loop and whoever wants it stopped.
#[derive(Debug, Default)]
pub struct AutoPlay {
    running: AtomicBool,
    stop_requested: AtomicBool,
}

/// Clears `running` however a claimed run exits.
struct RunningGuard<'a>(&'a AutoPlay);

impl Drop for RunningGuard<'_> {
    fn drop(&mut self) {
        self.0.running.store(false, Ordering::Release);
    }
}

impl AutoPlay {
    /// Marks a run as active. Clears any stop request left over from an earlier run.
    fn try_claim(&self) -> bool {
        if self
            .running
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return false;
        }
        self.stop_requested.store(false, Ordering::Release);
        true
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    fn stop_requested(&self) -> bool {
        self.stop_requested.load(Ordering::Acquire)
    }
}

impl Table {
    /// Keeps advancing until a deck runs out, `stop_auto_play` is called, or the
    /// step budget is spent. Calling it while a run is active does nothing.
    pub async fn start_auto_play(&self, mode: PlayMode) -> AutoPlayEnd {
        if !self.auto.try_claim() {
            return AutoPlayEnd::AlreadyRunning;
        }
        self.run_claimed(mode).await
    }

    /// Like [`start_auto_play`](Self::start_auto_play), but on its own task. The run is
    /// claimed before this returns, so a `stop_auto_play` right after it is honoured.
    /// `None` if a run is already active.
    pub fn spawn_auto_play(self: &Arc<Self>, mode: PlayMode) -> Option<JoinHandle<AutoPlayEnd>> {
        if !self.auto.try_claim() {
            return None;
        }
        let table = Arc::clone(self);
        Some(tokio::spawn(async move { table.run_claimed(mode).await }))
    }

    async fn run_claimed(&self, mode: PlayMode) -> AutoPlayEnd {
        let _running = RunningGuard(&self.auto);
        info!(?mode, "auto-play started");
        self.emit(GameEvent::AutoPlayStarted { mode });
        let end = self.drive(mode).await;
        info!(?end, "auto-play finished");
        self.emit(GameEvent::AutoPlayStopped { reason: end });
        end
    }

    /// Asks a running auto-play to stop before its next step. A step already in
    /// flight finishes first. Returns whether a run was active.
    pub fn stop_auto_play(&self) -> bool {
        self.auto.stop_requested.store(true, Ordering::Release);
        self.auto.is_running()
    }

    pub async fn toggle_auto_play(&self, mode: PlayMode) -> AutoPlayEnd {
        if self.stop_auto_play() {
            AutoPlayEnd::Stopped
        } else {
            self.start_auto_play(mode).await
        }
    }

    pub fn is_auto_playing(&self) -> bool {
        self.auto.is_running()
    }

    async fn drive(&self, mode: PlayMode) -> AutoPlayEnd {
        let pause = match mode {
            PlayMode::Stepped => self.config.step_delay,
            PlayMode::Fast => self.config.fast_step_delay,
        };

        let mut steps = 0u64;
        loop {
            if self.auto.stop_requested() {
                return AutoPlayEnd::Stopped;
            }
            let Some(current) = self.snapshot() else {
                return AutoPlayEnd::NoGame;
            };
            if let Some(outcome) = current.outcome {
                return AutoPlayEnd::GameOver(outcome);
            }
            if steps >= self.config.max_auto_steps {
                warn!(steps, battles = current.battles, "auto-play step limit reached");
                return AutoPlayEnd::StepLimit;
            }

            self.step(mode).await;
            steps += 1;
            self.clock.sleep(pause).await;
        }
    }
}

// --- Unit tests ---

#[cfg(test)]
mod tests {
    use super::*;
    use crate::card::{Card, Rank, Suit};
    use crate::clock::InstantClock;
    use crate::config::TableConfig;
    use crate::provider::ShuffledDeck;
    use crate::state::{BattlePhase, Decks};
    use std::sync::Arc;
    use std::time::Duration;
    use tokio::sync::mpsc;

    fn table(config: TableConfig) -> (Arc<Table>, mpsc::UnboundedReceiver<GameEvent>, Arc<InstantClock>) {
        let clock = Arc::new(InstantClock::new());
        let (table, rx) = Table::new(config, clock.clone());
        (Arc::new(table), rx, clock)
    }

    fn drain(rx: &mut mpsc::UnboundedReceiver<GameEvent>) -> Vec<GameEvent> {
        let mut events = Vec::new();
        while let Ok(event) = rx.try_recv() {
            events.push(event);
        }
        events
    }

    fn cards(ranks: &[Rank]) -> Vec<Card> {
        ranks.iter().map(|&r| Card::new(r, Suit::Diamond)).collect()
    }

    async fn wait_until_running(table: &Table) {
        for _ in 0..100 {
            if table.is_auto_playing() {
                return;
            }
            tokio::task::yield_now().await;
        }
        panic!("auto-play never started");
    }

    #[tokio::test]
    async fn test_fast_mode_plays_to_the_end() {
        let (table, mut rx, clock) = table(TableConfig::instant());
        table.new_game(&ShuffledDeck::seeded(11)).await.unwrap();

        let end = table.start_auto_play(PlayMode::Fast).await;
        assert_eq!(end, AutoPlayEnd::GameOver(Outcome::ComputerWon));
        let snapshot = table.snapshot().unwrap();
        assert_eq!(snapshot.outcome, Some(Outcome::ComputerWon));
        assert_eq!((snapshot.player_count, snapshot.computer_count, snapshot.stakes_count), (0, 52, 0));
        assert_eq!(snapshot.phase, BattlePhase::Idle);
        assert!(!table.is_auto_playing());
        // Fast mode never pauses for animations.
        assert!(clock.requested().iter().all(|d| d.is_zero()));

        let events = drain(&mut rx);
        let game_overs = events.iter().filter(|e| matches!(e, GameEvent::GameOver { .. })).count();
        assert_eq!(game_overs, 1);
        assert!(matches!(events.last(), Some(GameEvent::AutoPlayStopped { reason }) if *reason == end));
    }

    #[tokio::test]
    async fn test_cycling_deal_stops_at_the_step_limit() {
        let (table, rx, _) = table(TableConfig::instant());
        drop(rx);
        // Three beats two, then two loses to three, and the decks are back where they started.
        table.install(Decks::from_parts(cards(&[Rank::Three, Rank::Two]), cards(&[Rank::Two, Rank::Three])));

        let end = table.start_auto_play(PlayMode::Fast).await;
        assert_eq!(end, AutoPlayEnd::StepLimit);
        let snapshot = table.snapshot().unwrap();
        assert!(snapshot.outcome.is_none());
        assert_eq!(u64::from(snapshot.battles), TableConfig::default().max_auto_steps - 1);
        assert_eq!(snapshot.player_count + snapshot.computer_count + snapshot.stakes_count, 4);
    }

    #[tokio::test]
    async fn test_fast_mode_is_deterministic_for_a_deal() {
        let mut results = Vec::new();
        for _ in 0..2 {
            let (table, _rx, _) = table(TableConfig::instant());
            table.new_game(&ShuffledDeck::seeded(2024)).await.unwrap();
            let end = table.start_auto_play(PlayMode::Fast).await;
            let s = table.snapshot().unwrap();
            results.push((end, s.battles, s.player_count, s.computer_count));
        }
        assert_eq!(results[0], results[1]);
    }

    #[tokio::test]
    async fn test_step_limit_bounds_a_run() {
        let config = TableConfig { max_auto_steps: 3, ..TableConfig::instant() };
        let (table, _rx, _) = table(config);
        table.new_game(&ShuffledDeck::seeded(5)).await.unwrap();
        assert_eq!(table.start_auto_play(PlayMode::Fast).await, AutoPlayEnd::StepLimit);
    }

    #[tokio::test]
    async fn test_stepped_mode_pauses_between_steps() {
        let (table, _rx, clock) = table(TableConfig::default());
        table.install(Decks::from_parts(cards(&[Rank::Ace]), cards(&[Rank::Two])));

        let end = table.start_auto_play(PlayMode::Stepped).await;
        assert_eq!(end, AutoPlayEnd::GameOver(Outcome::PlayerWon));
        // draw, pause, award (animation), pause
        assert_eq!(
            clock.requested(),
            vec![Duration::from_millis(80), Duration::from_millis(600), Duration::from_millis(80)]
        );
    }

    #[tokio::test]
    async fn test_double_exhaustion_ends_auto_play() {
        let (table, mut rx, _) = table(TableConfig::instant());
        table.install(Decks::from_parts(cards(&[Rank::Four, Rank::Jack]), cards(&[Rank::Four, Rank::Queen])));

        assert_eq!(table.start_auto_play(PlayMode::Fast).await, AutoPlayEnd::GameOver(Outcome::Abandoned));
        let snapshot = table.snapshot().unwrap();
        assert_eq!(snapshot.discarded, 4);
        let over: Vec<_> = drain(&mut rx)
            .into_iter()
            .filter(|e| matches!(e, GameEvent::GameOver { .. }))
            .collect();
        assert_eq!(over.len(), 1);
    }

    #[tokio::test(flavor = "current_thread")]
    async fn test_stop_halts_a_running_game() {
        let (table, _rx, _) = table(TableConfig::default());
        table.new_game(&ShuffledDeck::seeded(8)).await.unwrap();

        let runner = tokio::spawn({
            let table = table.clone();
            async move { table.start_auto_play(PlayMode::Stepped).await }
        });
        wait_until_running(&table).await;

        assert_eq!(table.start_auto_play(PlayMode::Fast).await, AutoPlayEnd::AlreadyRunning);
        assert!(table.advance().await.is_none(), "manual steps are refused during auto-play");

        assert!(table.stop_auto_play());
        assert_eq!(runner.await.unwrap(), AutoPlayEnd::Stopped);
        assert!(!table.is_auto_playing());
        assert!(!table.is_busy());
    }

    #[tokio::test(flavor = "current_thread")]
    async fn test_stop_right_after_spawn_is_honoured() {
        let (table, _rx, _) = table(TableConfig::instant());
        table.new_game(&ShuffledDeck::seeded(11)).await.unwrap();

        let handle = table.spawn_auto_play(PlayMode::Fast).unwrap();
        assert!(table.is_auto_playing());
        assert!(table.spawn_auto_play(PlayMode::Fast).is_none());
        assert!(table.stop_auto_play());

        assert_eq!(handle.await.unwrap(), AutoPlayEnd::Stopped);
        let snapshot = table.snapshot().unwrap();
        assert_eq!(snapshot.battles, 0);
        assert_eq!(snapshot.phase, BattlePhase::Idle);
        assert!(!table.is_auto_playing());
    }

    #[tokio::test(flavor = "current_thread")]
    async fn test_stale_stop_does_not_cancel_the_next_run() {
        let (table, _rx, _) = table(TableConfig::instant());
        table.new_game(&ShuffledDeck::seeded(11)).await.unwrap();
        assert!(!table.stop_auto_play());

        let handle = table.spawn_auto_play(PlayMode::Fast).unwrap();
        assert_eq!(handle.await.unwrap(), AutoPlayEnd::GameOver(Outcome::ComputerWon));
    }

    #[tokio::test(flavor = "current_thread")]
    async fn test_toggle_starts_and_stops() {
        let (table, _rx, _) = table(TableConfig::default());
        table.new_game(&ShuffledDeck::seeded(9)).await.unwrap();

        let runner = tokio::spawn({
            let table = table.clone();
            async move { table.toggle_auto_play(PlayMode::Stepped).await }
        });
        wait_until_running(&table).await;

        assert_eq!(table.toggle_auto_play(PlayMode::Stepped).await, AutoPlayEnd::Stopped);
        assert_eq!(runner.await.unwrap(), AutoPlayEnd::Stopped);
    }

    #[tokio::test]
    async fn test_auto_play_without_game() {
        let (table, _rx, _) = table(TableConfig::instant());
        assert_eq!(table.start_auto_play(PlayMode::Fast).await, AutoPlayEnd::NoGame);
        assert!(!table.is_auto_playing());
    }

    #[tokio::test(flavor = "current_thread")]
    async fn test_new_game_stops_auto_play() {
        let (table, _rx, _) = table(TableConfig::default());
        table.new_game(&ShuffledDeck::seeded(10)).await.unwrap();
        let runner = tokio::spawn({
            let table = table.clone();
            async move { table.start_auto_play(PlayMode::Stepped).await }
        });
        wait_until_running(&table).await;

        let fresh = table.new_game(&ShuffledDeck::seeded(12)).await.unwrap();
        assert_eq!(runner.await.unwrap(), AutoPlayEnd::Stopped);
        assert_eq!(table.snapshot().unwrap().game_id, fresh);
    }
}
