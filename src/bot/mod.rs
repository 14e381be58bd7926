//! Dart bot
//!
//! - `accuracy`: Offset curve, performance calibration, treble preference
//! - `simulator`: Per-leg pacing and the dart-by-dart turn loop
//!
//! Producing a bot turn never changes the match. The caller pushes the
//! returned turn through `add_turn` like any other.

pub mod accuracy;
pub mod simulator;

use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

pub use simulator::{BotLegState, leg_jitter, simulate_turn};

use crate::engine::{Match, Turn, compute_progress};
use crate::error::{EngineError, MESSAGE_MATCH_CONCLUDED, MESSAGE_NOT_BOT_TURN, Result};

/// Simulate the bot's next visit with a fresh generator
pub fn create_dart_bot_turn(m: &Match) -> Result<Turn> {
    let mut rng = Pcg32::seed_from_u64(rand::random());
    create_dart_bot_turn_with(m, &mut rng)
}

/// Reproducible variant of [`create_dart_bot_turn`]
pub fn create_dart_bot_turn_seeded(m: &Match, seed: u64) -> Result<Turn> {
    let mut rng = Pcg32::seed_from_u64(seed);
    create_dart_bot_turn_with(m, &mut rng)
}

/// Leg state for the bot that is up next
pub fn bot_leg_state(m: &Match) -> Result<BotLegState> {
    if m.is_concluded() {
        return Err(EngineError::conflict(MESSAGE_MATCH_CONCLUDED));
    }

    // Progress may need to open a fresh set/leg/round; do that on a scratch copy
    let mut scratch = m.clone();
    let progress = compute_progress(&mut scratch)?;
    let (Some(set), Some(leg), Some(thrower)) = (
        progress.current_set,
        progress.current_leg,
        progress.current_thrower,
    ) else {
        return Err(EngineError::conflict(MESSAGE_MATCH_CONCLUDED));
    };

    let player = scratch
        .player(thrower)
        .ok_or_else(|| EngineError::illegal_state(format!("thrower {thrower} not in match")))?;
    if !player.is_bot() {
        return Err(EngineError::conflict(MESSAGE_NOT_BOT_TURN));
    }
    let average = player
        .bot_average
        .ok_or_else(|| EngineError::illegal_state(format!("bot {} has no average", player.name)))?;

    let current = scratch.set(set)?.leg(leg)?;
    Ok(BotLegState::new(
        m.settings.x01,
        current.points_of(thrower),
        current.darts_of(thrower),
        average,
        leg_jitter(m.id, set, leg),
    ))
}

fn create_dart_bot_turn_with<R: Rng>(m: &Match, rng: &mut R) -> Result<Turn> {
    let state = bot_leg_state(m)?;
    let turn = simulate_turn(&state, rng);
    log::debug!(
        "Bot turn: {} in {} dart(s) from {} (budget {} darts, {} thrown)",
        turn.score,
        turn.darts_used,
        state.remaining(),
        state.target_darts,
        state.darts_thrown
    );
    Ok(turn)
}
