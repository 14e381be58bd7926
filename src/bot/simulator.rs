//! Dart-by-dart turn simulation
//!
//! The bot paces itself against a per-leg dart budget: while it is ahead of
//! the budget it keeps scoring and declines finishes, and once the budget is
//! reached it throws the suggested checkout cleanly. A bot that spends its
//! budget before a finish is on scores cleanly until one is.

use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use uuid::Uuid;

use super::accuracy::{calibrated_offset, pick_treble};
use crate::board::{Bed, checkout_table, geometry};
use crate::consts::DARTS_PER_TURN;
use crate::engine::Turn;

/// Bounds of the per-leg dart budget jitter
pub const JITTER_MIN: f64 = 0.95;
pub const JITTER_MAX: f64 = 1.05;

/// What the bot knows about its leg before a turn
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BotLegState {
    pub x01: u32,
    /// Points scored earlier in the leg
    pub points_scored: u32,
    /// Darts thrown earlier in the leg
    pub darts_thrown: u32,
    /// Target one-dart average
    pub target_avg: f64,
    /// Darts the bot should take to finish the leg
    pub target_darts: u32,
}

impl BotLegState {
    pub fn new(
        x01: u32,
        points_scored: u32,
        darts_thrown: u32,
        three_dart_average: u32,
        jitter: f64,
    ) -> Self {
        let target_avg = three_dart_average as f64 / 3.0;
        let target_darts = if target_avg > 0.0 {
            (x01 as f64 / target_avg * jitter).floor().max(1.0) as u32
        } else {
            u32::MAX
        };
        Self {
            x01,
            points_scored,
            darts_thrown,
            target_avg,
            target_darts,
        }
    }

    pub fn remaining(&self) -> u32 {
        self.x01.saturating_sub(self.points_scored)
    }
}

/// Dart budget jitter, fixed for a given leg of a given match
pub fn leg_jitter(match_id: Uuid, set: u32, leg: u32) -> f64 {
    let (high, low) = match_id.as_u64_pair();
    let seed = (high ^ low.rotate_left(17))
        .wrapping_add((set as u64).wrapping_mul(2654435761))
        .wrapping_add((leg as u64).wrapping_mul(40503));
    let mut rng = Pcg32::seed_from_u64(seed);
    rng.random_range(JITTER_MIN..=JITTER_MAX)
}

/// Scatter a dart around `target`
///
/// Radial and lateral offsets are uniform in `[-offset, offset]` mm. Around
/// the double bull there is no meaningful lateral direction, so the dart
/// scatters in a random direction instead.
pub fn throw_at<R: Rng>(target: Bed, offset: f64, rng: &mut R) -> Bed {
    if offset <= 0.0 {
        return target;
    }
    let (r, _) = target.center();
    let offset_r = rng.random_range(-offset..=offset);
    let offset_theta = if r > 0.0 {
        rng.random_range(-offset..=offset) / r
    } else {
        rng.random_range(-std::f64::consts::PI..=std::f64::consts::PI)
    };
    geometry::score(target, offset_r, offset_theta)
}

/// Remaining after `bed`, or `None` if the dart busts
fn after_dart(remaining: u32, bed: Bed) -> Option<u32> {
    let left = remaining.checked_sub(bed.value())?;
    match left {
        1 => None,
        0 if !bed.is_double() => None,
        _ => Some(left),
    }
}

/// Where a dart thrown at `target` counts, and whether it cost a double
///
/// A missed double is thrown away. So is a dart that would finish the leg
/// before `may_finish` allows it.
fn settle_dart(target: Bed, hit: Bed, remaining: u32, may_finish: bool) -> (Bed, bool) {
    if target.is_double() && !hit.same_bed(&target) {
        return (Bed::MISS, true);
    }
    if hit.value() == remaining && !may_finish {
        return (Bed::MISS, target.is_double());
    }
    (hit, false)
}

/// Simulate one visit of up to three darts
pub fn simulate_turn<R: Rng>(state: &BotLegState, rng: &mut R) -> Turn {
    let table = checkout_table();
    let mut remaining = state.remaining();
    let mut points = state.points_scored;
    let mut darts_in_leg = state.darts_thrown;
    let mut score = 0u32;
    let mut darts_used = 0u8;
    let mut doubles_missed = 0u8;

    while darts_used < DARTS_PER_TURN && remaining > 0 {
        let darts_left = DARTS_PER_TURN - darts_used;
        let checkout = table.get(remaining);

        // On budget: throw the whole route as suggested
        let on_budget = checkout
            .filter(|c| darts_in_leg + c.min_darts as u32 >= state.target_darts);
        if let Some(checkout) = on_budget {
            log::debug!("Bot going for {} on {remaining}", checkout.route());
            for &bed in checkout.darts.iter().take(darts_left as usize) {
                remaining -= bed.value();
                score += bed.value();
                darts_used += 1;
            }
            break;
        }

        // Budget spent with no finish on: score cleanly to get back in range
        if checkout.is_none() && darts_in_leg >= state.target_darts {
            let bed = Bed::treble(20);
            if let Some(left) = after_dart(remaining, bed) {
                remaining = left;
                score += bed.value();
                points += bed.value();
                darts_used += 1;
                darts_in_leg += 1;
                continue;
            }
        }

        let current_avg = (darts_in_leg > 0).then(|| points as f64 / darts_in_leg as f64);
        let offset = calibrated_offset(state.target_avg, current_avg);
        let target = match checkout {
            Some(checkout) => checkout.first(),
            None => Bed::treble(pick_treble(state.target_avg, rng)),
        };
        let thrown = throw_at(target, offset, rng);
        let may_finish = darts_in_leg + 1 >= state.target_darts;
        let (hit, missed_double) = settle_dart(target, thrown, remaining, may_finish);
        if missed_double {
            doubles_missed += 1;
        }

        darts_used += 1;
        darts_in_leg += 1;
        match after_dart(remaining, hit) {
            Some(left) => {
                remaining = left;
                score += hit.value();
                points += hit.value();
            }
            None => {
                log::debug!("Bot bust on {hit} with {remaining} left");
                return Turn::new(0, DARTS_PER_TURN, doubles_missed);
            }
        }
    }

    Turn::new(score, darts_used, doubles_missed)
}
