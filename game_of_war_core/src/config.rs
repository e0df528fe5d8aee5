use std::time::Duration;
use tracing::warn;

/// Timing knobs for a table. Defaults follow the browser client's feel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableConfig {
    /// Pause between auto-play steps so every phase can be seen.
    pub step_delay: Duration,
    /// Pause between steps in fast mode; just enough to let other tasks run.
    pub fast_step_delay: Duration,
    /// How long the stakes take to fly to the winner's pile.
    pub animation_delay: Duration,
    /// Breathing room between an award and the look-ahead draw that follows it.
    pub lookahead_delay: Duration,
    /// Auto-play gives up after this many steps.
    pub max_auto_steps: u64,
}

impl Default for TableConfig {
    fn default() -> Self {
        TableConfig {
            step_delay: Duration::from_millis(80),
            fast_step_delay: Duration::from_millis(1),
            animation_delay: Duration::from_millis(600),
            lookahead_delay: Duration::from_millis(400),
            max_auto_steps: 100_000,
        }
    }
}

impl TableConfig {
    /// A config with every delay set to zero, for tests and headless runs.
    pub fn instant() -> Self {
        TableConfig {
            step_delay: Duration::ZERO,
            fast_step_delay: Duration::ZERO,
            animation_delay: Duration::ZERO,
            lookahead_delay: Duration::ZERO,
            ..TableConfig::default()
        }
    }

    /// Defaults overridden by `WAR_STEP_DELAY_MS`, `WAR_FAST_STEP_DELAY_MS`,
    /// `WAR_ANIMATION_MS`, `WAR_LOOKAHEAD_MS` and `WAR_MAX_AUTO_STEPS`.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = TableConfig::default();
        let read = |key: &str| -> Option<u64> {
            let raw = lookup(key)?;
            match raw.trim().parse() {
                Ok(value) => Some(value),
                Err(_) => {
                    warn!(key, value = %raw, "ignoring invalid setting");
                    None
                }
            }
        };
        if let Some(ms) = read("WAR_STEP_DELAY_MS") {
            config.step_delay = Duration::from_millis(ms);
        }
        if let Some(ms) = read("WAR_FAST_STEP_DELAY_MS") {
            config.fast_step_delay = Duration::from_millis(ms);
        }
        if let Some(ms) = read("WAR_ANIMATION_MS") {
            config.animation_delay = Duration::from_millis(ms);
        }
        if let Some(ms) = read("WAR_LOOKAHEAD_MS") {
            config.lookahead_delay = Duration::from_millis(ms);
        }
        if let Some(steps) = read("WAR_MAX_AUTO_STEPS") {
            config.max_auto_steps = steps;
        }
        config
    }
}
