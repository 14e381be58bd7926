//! Match aggregate and core data types
//!
//! The whole match is one owned tree: Match -> Sets -> Legs -> Rounds -> Scores.
//! Sets, legs and rounds live in `BTreeMap`s keyed by their 1-based number so
//! iteration is always in play order. Scores inside a round are kept in throw
//! order.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::stats::Statistics;
use crate::error::{EngineError, Result};
use crate::settings::MatchSettings;

pub type PlayerId = Uuid;
pub type MatchId = Uuid;

/// Lifecycle of a match
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MatchStatus {
    InPlay,
    Concluded,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PlayerType {
    Human,
    DartBot,
}

/// Outcome of a set or match for one player
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ResultType {
    Win,
    Loss,
    Draw,
}

impl ResultType {
    /// Counts as a won entity in the level above
    pub fn is_winning(&self) -> bool {
        matches!(self, ResultType::Win | ResultType::Draw)
    }
}

/// Request to add a player to a new match
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewPlayer {
    pub name: String,
    pub player_type: PlayerType,
    /// Target three-dart average (bots only)
    #[serde(default)]
    pub bot_average: Option<u32>,
}

impl NewPlayer {
    pub fn human(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            player_type: PlayerType::Human,
            bot_average: None,
        }
    }

    pub fn bot(name: impl Into<String>, three_dart_average: u32) -> Self {
        Self {
            name: name.into(),
            player_type: PlayerType::DartBot,
            bot_average: Some(three_dart_average),
        }
    }
}

/// A match participant
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Player {
    pub id: PlayerId,
    /// Unique within the match
    pub name: String,
    pub player_type: PlayerType,
    /// Absent while the match is in play
    #[serde(default)]
    pub result: Option<ResultType>,
    /// Target three-dart average (bots only)
    #[serde(default)]
    pub bot_average: Option<u32>,
    /// Derived, recomputed on every mutation
    #[serde(default)]
    pub statistics: Statistics,
}

impl Player {
    pub fn is_bot(&self) -> bool {
        self.player_type == PlayerType::DartBot
    }
}

/// One player's visit to the oche
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Score {
    pub player_id: PlayerId,
    /// 1-3
    pub darts_used: u8,
    /// 0-3
    pub doubles_missed: u8,
    /// Points scored this visit
    pub score: u32,
    /// Points left after this visit
    pub remaining: u32,
}

impl Score {
    pub fn is_checkout(&self) -> bool {
        self.remaining == 0
    }
}

/// One pass through the throwing order
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Round {
    pub number: u32,
    /// Throw order
    pub scores: Vec<Score>,
}

impl Round {
    pub fn new(number: u32) -> Self {
        Self {
            number,
            scores: Vec::new(),
        }
    }

    pub fn score_of(&self, player_id: PlayerId) -> Option<&Score> {
        self.scores.iter().find(|s| s.player_id == player_id)
    }

    pub fn score_of_mut(&mut self, player_id: PlayerId) -> Option<&mut Score> {
        self.scores.iter_mut().find(|s| s.player_id == player_id)
    }

    /// Replace the player's score in place, or append it
    pub fn upsert(&mut self, score: Score) {
        match self.score_of_mut(score.player_id) {
            Some(existing) => *existing = score,
            None => self.scores.push(score),
        }
    }

    pub fn remove(&mut self, player_id: PlayerId) -> Option<Score> {
        let pos = self.scores.iter().position(|s| s.player_id == player_id)?;
        Some(self.scores.remove(pos))
    }

    /// Every player has thrown
    pub fn is_complete(&self, players: &[Player]) -> bool {
        players.iter().all(|p| self.score_of(p.id).is_some())
    }

    pub fn is_empty(&self) -> bool {
        self.scores.is_empty()
    }
}

/// One countdown from x01 to zero
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Leg {
    pub number: u32,
    /// Absent until decided
    #[serde(default)]
    pub winner: Option<PlayerId>,
    /// Throws first in round 1
    pub thrower: PlayerId,
    pub rounds: BTreeMap<u32, Round>,
}

impl Leg {
    pub fn new(number: u32, thrower: PlayerId) -> Self {
        Self {
            number,
            winner: None,
            thrower,
            rounds: BTreeMap::new(),
        }
    }

    /// The player's scores in round order
    pub fn scores_of(&self, player_id: PlayerId) -> impl Iterator<Item = (u32, &Score)> + '_ {
        self.rounds
            .values()
            .filter_map(move |r| r.score_of(player_id).map(|s| (r.number, s)))
    }

    pub fn points_of(&self, player_id: PlayerId) -> u32 {
        self.scores_of(player_id).map(|(_, s)| s.score).sum()
    }

    pub fn darts_of(&self, player_id: PlayerId) -> u32 {
        self.scores_of(player_id)
            .map(|(_, s)| s.darts_used as u32)
            .sum()
    }

    /// Points the player still needs
    pub fn remaining_of(&self, x01: u32, player_id: PlayerId) -> u32 {
        x01.saturating_sub(self.points_of(player_id))
    }

    pub fn round(&self, number: u32) -> Result<&Round> {
        self.rounds
            .get(&number)
            .ok_or_else(|| EngineError::not_found(format!("round {number}")))
    }

    pub fn round_mut(&mut self, number: u32) -> Result<&mut Round> {
        self.rounds
            .get_mut(&number)
            .ok_or_else(|| EngineError::not_found(format!("round {number}")))
    }

    pub fn has_scores(&self) -> bool {
        self.rounds.values().any(|r| !r.is_empty())
    }
}

/// A group of legs
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Set {
    pub number: u32,
    /// Throws first in leg 1
    pub thrower: PlayerId,
    pub legs: BTreeMap<u32, Leg>,
    /// Absent until decided
    #[serde(default)]
    pub result: Option<BTreeMap<PlayerId, ResultType>>,
}

impl Set {
    pub fn new(number: u32, thrower: PlayerId) -> Self {
        Self {
            number,
            thrower,
            legs: BTreeMap::new(),
            result: None,
        }
    }

    pub fn legs_won(&self, player_id: PlayerId) -> u32 {
        self.legs
            .values()
            .filter(|l| l.winner == Some(player_id))
            .count() as u32
    }

    /// Players holding a WIN or DRAW for this set
    pub fn winners(&self) -> Vec<PlayerId> {
        self.result
            .iter()
            .flatten()
            .filter(|(_, r)| r.is_winning())
            .map(|(id, _)| *id)
            .collect()
    }

    pub fn leg(&self, number: u32) -> Result<&Leg> {
        self.legs
            .get(&number)
            .ok_or_else(|| EngineError::not_found(format!("leg {number} of set {}", self.number)))
    }

    pub fn leg_mut(&mut self, number: u32) -> Result<&mut Leg> {
        let set = self.number;
        self.legs
            .get_mut(&number)
            .ok_or_else(|| EngineError::not_found(format!("leg {number} of set {set}")))
    }
}

/// Where play currently stands
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchProgress {
    pub current_set: Option<u32>,
    pub current_leg: Option<u32>,
    pub current_round: Option<u32>,
    pub current_thrower: Option<PlayerId>,
    /// Current thrower's remaining score
    #[serde(default)]
    pub remaining: Option<u32>,
    /// Suggested route when the remaining score is a finish, e.g. `T20 D20`
    #[serde(default)]
    pub suggested_checkout: Option<String>,
}

impl MatchProgress {
    /// Progress of a fresh match: set 1, leg 1, round 1, first player up
    pub fn start(first: PlayerId, x01: u32) -> Self {
        Self {
            current_set: Some(1),
            current_leg: Some(1),
            current_round: Some(1),
            current_thrower: Some(first),
            remaining: Some(x01),
            suggested_checkout: None,
        }
    }
}

/// One player's line on the scoreboard
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scoreline {
    pub player_id: PlayerId,
    pub sets_won: u32,
    /// Legs won in the current set
    pub legs_won: u32,
    /// Remaining in the current leg
    pub remaining: u32,
}

/// Scoreboard as it stood after a mutation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScorelineSnapshot {
    pub timestamp: DateTime<Utc>,
    pub set: Option<u32>,
    pub leg: Option<u32>,
    pub round: Option<u32>,
    pub lines: Vec<Scoreline>,
}

/// The match aggregate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Match {
    pub id: MatchId,
    pub start_date: DateTime<Utc>,
    #[serde(default)]
    pub end_date: Option<DateTime<Utc>>,
    pub status: MatchStatus,
    pub settings: MatchSettings,
    /// Player order is the base throwing order
    pub players: Vec<Player>,
    pub sets: BTreeMap<u32, Set>,
    pub progress: MatchProgress,
    /// Chronological scoreboard history
    #[serde(default)]
    pub timeline: Vec<ScorelineSnapshot>,
}

impl Match {
    pub fn player(&self, id: PlayerId) -> Option<&Player> {
        self.players.iter().find(|p| p.id == id)
    }

    pub fn player_mut(&mut self, id: PlayerId) -> Option<&mut Player> {
        self.players.iter_mut().find(|p| p.id == id)
    }

    /// Index in the base throwing order
    ///
    /// A miss here means the aggregate references a player it doesn't hold.
    pub fn player_index(&self, id: PlayerId) -> Result<usize> {
        player_index(&self.players, id)
    }

    pub fn bot(&self) -> Option<&Player> {
        self.players.iter().find(|p| p.is_bot())
    }

    /// Concluded once every player has a result
    pub fn is_concluded(&self) -> bool {
        !self.players.is_empty() && self.players.iter().all(|p| p.result.is_some())
    }

    pub fn set(&self, number: u32) -> Result<&Set> {
        self.sets
            .get(&number)
            .ok_or_else(|| EngineError::not_found(format!("set {number}")))
    }

    pub fn set_mut(&mut self, number: u32) -> Result<&mut Set> {
        self.sets
            .get_mut(&number)
            .ok_or_else(|| EngineError::not_found(format!("set {number}")))
    }

    pub fn sets_won(&self, player_id: PlayerId) -> u32 {
        self.sets
            .values()
            .filter(|s| s.winners().contains(&player_id))
            .count() as u32
    }

    /// Leg the progress pointer refers to
    pub fn current_leg(&self) -> Option<&Leg> {
        let set = self.sets.get(&self.progress.current_set?)?;
        set.legs.get(&self.progress.current_leg?)
    }

    /// Whether any score has been recorded
    pub fn has_scores(&self) -> bool {
        self.sets
            .values()
            .flat_map(|s| s.legs.values())
            .any(Leg::has_scores)
    }
}

/// Position of `id` in `players`, or an illegal-state error
pub fn player_index(players: &[Player], id: PlayerId) -> Result<usize> {
    players
        .iter()
        .position(|p| p.id == id)
        .ok_or_else(|| EngineError::illegal_state(format!("player {id} is not in this match")))
}
