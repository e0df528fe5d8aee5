use std::io::Write;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::debug;
use tracing_subscriber::EnvFilter;

use game_of_war_core::{
    AutoPlayEnd, BattlePhase, Card, Command, GameEvent, JsonDeck, Outcome, PlayMode, ShuffledDeck, Snapshot,
    Table, TableConfig, TokioClock,
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .init();

    let (table, mut events) = Table::new(TableConfig::from_env(), Arc::new(TokioClock));
    let table = Arc::new(table);

    // Render everything the table reports, as it happens.
    tokio::spawn(async move {
        let mut renderer = Renderer::default();
        while let Some(event) = events.recv().await {
            if renderer.render(&event) {
                prompt();
            }
        }
    });

    println!("--- Game of War ---");
    print_help();

    let mut stdin = BufReader::new(tokio::io::stdin()).lines();
    loop {
        prompt();
        let Some(line) = stdin.next_line().await? else {
            break;
        };

        match line.trim() {
            "exit" | "quit" => break,
            "help" => {
                print_help();
                continue;
            }
            "state" => {
                match table.snapshot() {
                    Some(snapshot) => print_snapshot(&snapshot),
                    None => println!("No game yet. Type `new` to deal."),
                }
                continue;
            }
            _ => {}
        }

        match line.parse::<Command>() {
            Ok(command) => dispatch(&table, command).await,
            Err(e) => println!("{} (type `help`)", e),
        }
    }

    table.stop_auto_play();
    println!("Bye!");
    Ok(())
}

/// Carries out one request. Long-running work goes to its own task so the
/// prompt stays responsive; setup failures come back as `SetupFailed` events.
async fn dispatch(table: &Arc<Table>, command: Command) {
    debug!(?command, "dispatching");
    match command {
        Command::NewGame { seed } => {
            let _ = table.new_game(&ShuffledDeck { seed }).await;
        }
        Command::LoadDeck { path } => {
            let _ = table.new_game(&JsonDeck::File(path.into())).await;
        }
        Command::Advance => {
            if table.snapshot().is_none() {
                println!("No game yet. Type `new` to deal.");
            } else if table.is_auto_playing() {
                println!("Auto-play is running. Type `stop` first.");
            } else {
                let table = table.clone();
                tokio::spawn(async move { table.advance().await });
            }
        }
        Command::StartAutoPlay(mode) => {
            if table.spawn_auto_play(mode).is_none() {
                println!("Auto-play is already running.");
            }
        }
        Command::ToggleAutoPlay(mode) => {
            if !table.stop_auto_play() {
                let _ = table.spawn_auto_play(mode);
            }
        }
        Command::StopAutoPlay => {
            if !table.stop_auto_play() {
                println!("Auto-play is not running.");
            }
        }
    }
}

// --- Rendering ---

/// Turns events into terminal output. While fast auto-play runs only
/// battle results are printed.
#[derive(Debug, Default)]
struct Renderer {
    fast: bool,
    last_battles: u32,
}

impl Renderer {
    /// Prints the event if it is worth showing; returns whether anything was printed.
    fn render(&mut self, event: &GameEvent) -> bool {
        if !self.should_show(event) {
            return false;
        }
        match event {
            GameEvent::GameStarted { game_id, player_count, computer_count } => {
                println!("\nNew game {} dealt: you {} cards, computer {} cards.", game_id, player_count, computer_count);
            }
            GameEvent::Snapshot(snapshot) => print_snapshot(snapshot),
            GameEvent::Animating { winner, cards, .. } => {
                let faces: Vec<String> = cards.iter().map(Card::to_string).collect();
                println!("  >> {} card(s) fly to {:?}: {}", cards.len(), winner, faces.join(" "));
            }
            GameEvent::GameOver { outcome, battles, .. } => {
                let text = match outcome {
                    Outcome::PlayerWon => "You won the game!",
                    Outcome::ComputerWon => "The computer won the game!",
                    Outcome::Abandoned => "Both decks ran out mid-war. Nobody wins.",
                };
                println!("\n*** {} ({} battles) ***", text, battles);
            }
            GameEvent::SetupFailed { message } => println!("\nCould not start a new game: {}", message),
            GameEvent::AutoPlayStarted { mode } => println!("\nAuto-play started ({:?}).", mode),
            GameEvent::AutoPlayStopped { reason } => match reason {
                AutoPlayEnd::Stopped => println!("\nAuto-play stopped."),
                AutoPlayEnd::StepLimit => println!("\nAuto-play gave up: this deal looks endless."),
                AutoPlayEnd::NoGame => println!("\nNothing to play. Type `new` to deal."),
                AutoPlayEnd::GameOver(_) | AutoPlayEnd::AlreadyRunning => return false,
            },
        }
        true
    }

    fn should_show(&mut self, event: &GameEvent) -> bool {
        match event {
            GameEvent::AutoPlayStarted { mode } => {
                self.fast = *mode == PlayMode::Fast;
                true
            }
            GameEvent::AutoPlayStopped { .. } => {
                self.fast = false;
                true
            }
            GameEvent::Animating { .. } => !self.fast,
            GameEvent::Snapshot(snapshot) => {
                let battle_ended = snapshot.battles != self.last_battles;
                self.last_battles = snapshot.battles;
                !self.fast || battle_ended
            }
            GameEvent::GameStarted { .. } => {
                self.last_battles = 0;
                true
            }
            _ => true,
        }
    }
}

fn print_snapshot(snapshot: &Snapshot) {
    let face = |card: &Option<Card>| card.as_ref().map_or("--".to_string(), Card::to_string);
    println!("\n== {} ==", snapshot.headline());
    println!(
        "  Computer ({:>2})  [{}]  vs  [{}]  ({:>2}) You",
        snapshot.computer_count,
        face(&snapshot.left),
        face(&snapshot.right),
        snapshot.player_count,
    );
    if snapshot.phase == BattlePhase::Reveal {
        println!("  [##][##][##]  war round {}  [##][##][##]", snapshot.war_rounds);
    }
    if snapshot.stakes_count > 0 {
        println!("  at stake: {} card(s)   next: {}", snapshot.stakes_count, next_action(snapshot.phase));
    }
}

fn next_action(phase: BattlePhase) -> &'static str {
    match phase {
        BattlePhase::Idle => "draw",
        BattlePhase::Drawn => "collect",
        BattlePhase::Facedown => "place cards face down",
        BattlePhase::Reveal => "reveal",
        BattlePhase::Animating => "wait",
    }
}

fn prompt() {
    print!("> ");
    let _ = std::io::stdout().flush();
}

fn print_help() {
    println!("Commands:");
    println!("  new [seed]        - shuffle and deal a new game");
    println!("  load <file.json>  - deal from a saved deck-of-cards response");
    println!("  next (or Enter)   - advance one step");
    println!("  auto              - toggle stepped auto-play");
    println!("  fast              - play the rest of the game quickly");
    println!("  stop              - stop auto-play");
    println!("  state             - show the table");
    println!("  help              - this list");
    println!("  exit              - quit");
}

#[cfg(test)]
mod tests {
    use super::*;
    use game_of_war_core::{BattleEngine, Decks, Rank, Suit};

    fn snapshot_after(steps: usize) -> Snapshot {
        let cards = |r: Rank| vec![Card::new(r, Suit::Club), Card::new(Rank::Two, Suit::Club)];
        let mut engine = BattleEngine::new(Decks::from_parts(cards(Rank::King), cards(Rank::Three)));
        for _ in 0..steps {
            engine.advance();
        }
        engine.snapshot()
    }

    #[test]
    fn test_fast_mode_hides_intermediate_steps() {
        let mut renderer = Renderer::default();
        assert!(renderer.should_show(&GameEvent::AutoPlayStarted { mode: PlayMode::Fast }));
        assert!(!renderer.should_show(&GameEvent::Snapshot(snapshot_after(1))));
        assert!(renderer.should_show(&GameEvent::Snapshot(snapshot_after(2))));
        assert!(renderer.should_show(&GameEvent::AutoPlayStopped { reason: AutoPlayEnd::Stopped }));
        assert!(renderer.should_show(&GameEvent::Snapshot(snapshot_after(1))));
    }

    #[test]
    fn test_next_action_labels() {
        assert_eq!(next_action(BattlePhase::Reveal), "reveal");
        assert_eq!(next_action(BattlePhase::Idle), "draw");
    }
}
