//! Per-player statistics
//!
//! Always rebuilt from the full set -> leg -> round history, never patched
//! incrementally, so retroactive edits and deletes can't leave stale numbers.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::state::{Match, PlayerId, Score};

/// Score buckets, highest first
const BUCKETS: [u32; 6] = [180, 140, 100, 80, 60, 40];

/// Rounds that make up the first nine darts
const FIRST_NINE_ROUNDS: u32 = 3;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Statistics {
    pub average: AverageStats,
    pub checkout: CheckoutStats,
    pub score: ScoreStats,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AverageStats {
    pub points_thrown: u32,
    pub darts_thrown: u32,
    /// Three-dart average, rounded
    pub average: u32,
    pub first_nine_points: u32,
    pub first_nine_darts: u32,
    pub first_nine_average: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CheckoutStats {
    pub highest: u32,
    /// Checkouts of 100 or more
    pub ton_plus: u32,
    pub hits: u32,
    /// Doubles missed
    pub misses: u32,
    pub hit_percentage: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreStats {
    pub forty_plus: u32,
    pub sixty_plus: u32,
    pub eighty_plus: u32,
    pub ton_plus: u32,
    pub ton_forty_plus: u32,
    pub ton_eighty: u32,
}

/// `round(points / darts * 3)`, 0 before any dart
pub fn three_dart_average(points: u32, darts: u32) -> u32 {
    if darts == 0 {
        return 0;
    }
    (points as f64 / darts as f64 * 3.0).round() as u32
}

impl AverageStats {
    fn record(&mut self, round_number: u32, score: &Score) {
        self.points_thrown += score.score;
        self.darts_thrown += score.darts_used as u32;
        self.average = three_dart_average(self.points_thrown, self.darts_thrown);

        if round_number <= FIRST_NINE_ROUNDS {
            self.first_nine_points += score.score;
            self.first_nine_darts += score.darts_used as u32;
            self.first_nine_average =
                three_dart_average(self.first_nine_points, self.first_nine_darts);
        }
    }
}

impl CheckoutStats {
    fn record(&mut self, score: &Score, leg_deciding: bool) {
        if leg_deciding {
            self.hits += 1;
            self.highest = self.highest.max(score.score);
            if score.score >= 100 {
                self.ton_plus += 1;
            }
        }
        self.misses += score.doubles_missed as u32;

        let attempts = self.hits + self.misses;
        self.hit_percentage = if attempts == 0 {
            0.0
        } else {
            self.hits as f64 / attempts as f64 * 100.0
        };
    }
}

impl ScoreStats {
    fn record(&mut self, score: &Score) {
        let Some(bucket) = BUCKETS.iter().find(|&&b| score.score >= b) else {
            return;
        };
        let counter = match *bucket {
            180 => &mut self.ton_eighty,
            140 => &mut self.ton_forty_plus,
            100 => &mut self.ton_plus,
            80 => &mut self.eighty_plus,
            60 => &mut self.sixty_plus,
            _ => &mut self.forty_plus,
        };
        *counter += 1;
    }
}

impl Statistics {
    /// Fold one visit into the block
    pub fn record(&mut self, round_number: u32, score: &Score, leg_deciding: bool) {
        self.average.record(round_number, score);
        self.checkout.record(score, leg_deciding);
        self.score.record(score);
    }
}

/// Reset and rebuild every player's statistics from the match history
pub fn update_statistics(m: &mut Match) {
    let mut blocks: BTreeMap<PlayerId, Statistics> = m
        .players
        .iter()
        .map(|p| (p.id, Statistics::default()))
        .collect();

    for set in m.sets.values() {
        for leg in set.legs.values() {
            for round in leg.rounds.values() {
                for score in &round.scores {
                    let Some(block) = blocks.get_mut(&score.player_id) else {
                        continue;
                    };
                    let leg_deciding =
                        leg.winner == Some(score.player_id) && score.is_checkout();
                    block.record(round.number, score, leg_deciding);
                }
            }
        }
    }

    for player in &mut m.players {
        player.statistics = blocks.remove(&player.id).unwrap_or_default();
    }
}
