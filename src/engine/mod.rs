//! Match engine
//!
//! Organized as:
//! - `state`: Match aggregate and data types
//! - `progress`: Lazy set/leg/round creation and the current thrower
//! - `standings`: Best-of and clear-by-two winner rules
//! - `result`: Bottom-up leg/set/match recomputation
//! - `turn`: Turn validation, bust correction, edit and delete
//! - `stats`: Per-player statistics rebuilt from history
//! - `play`: Public operations over a match

pub mod play;
pub mod progress;
pub mod result;
pub mod standings;
pub mod state;
pub mod stats;
pub mod turn;

pub use play::{add_turn, create_match, delete_last_turn, edit_turn, scorelines};
pub use progress::compute_progress;
pub use state::{
    Leg, Match, MatchId, MatchProgress, MatchStatus, NewPlayer, Player, PlayerId, PlayerType,
    ResultType, Round, Score, Scoreline, ScorelineSnapshot, Set,
};
pub use stats::Statistics;
pub use turn::{EditRequest, Turn};
