//! Turn application
//!
//! A visit is written into its round first, then the thrower's entire leg
//! history is re-checked. An illegal history is never rejected: the submitted
//! visit is rewritten in place to a bust (0 points, 3 darts).

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

use super::state::{Leg, Match, PlayerId, Score};
use crate::board::{Bed, checkout_table};
use crate::consts::DARTS_PER_TURN;
use crate::error::{EngineError, MESSAGE_LEG_ALREADY_WON, MESSAGE_NO_TURNS, Result};

/// Highest score a single dart can make
const MAX_DART_SCORE: u32 = 60;

/// `REACHABLE[n][total]`: whether exactly `n` darts can add up to `total`
///
/// A dart that misses the board counts, scoring 0.
static REACHABLE: Lazy<Vec<Vec<bool>>> = Lazy::new(|| {
    let mut values = vec![Bed::MISS.value(), Bed::OUTER_BULL.value(), Bed::BULL.value()];
    for section in 1..=20 {
        values.extend([
            Bed::single(section).value(),
            Bed::double(section).value(),
            Bed::treble(section).value(),
        ]);
    }

    let mut reachable = vec![vec![true]];
    for darts in 1..=DARTS_PER_TURN as usize {
        let mut next = vec![false; MAX_DART_SCORE as usize * darts + 1];
        for (total, _) in reachable[darts - 1].iter().enumerate().filter(|(_, r)| **r) {
            for &value in &values {
                next[total + value as usize] = true;
            }
        }
        reachable.push(next);
    }
    reachable
});

/// Whether `darts` darts can score exactly `score` between them
pub fn is_reachable(score: u32, darts: u8) -> bool {
    REACHABLE
        .get(darts as usize)
        .and_then(|totals| totals.get(score as usize))
        .copied()
        .unwrap_or(false)
}

/// A visit as submitted by a thrower (or produced by the bot)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Turn {
    pub score: u32,
    pub darts_used: u8,
    #[serde(default)]
    pub doubles_missed: u8,
}

impl Turn {
    pub fn new(score: u32, darts_used: u8, doubles_missed: u8) -> Self {
        Self {
            score,
            darts_used,
            doubles_missed,
        }
    }

    /// Three darts, no doubles missed
    pub fn visit(score: u32) -> Self {
        Self::new(score, DARTS_PER_TURN, 0)
    }
}

/// Replace a recorded visit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EditRequest {
    pub set: u32,
    pub leg: u32,
    pub round: u32,
    pub player_id: PlayerId,
    #[serde(flatten)]
    pub turn: Turn,
}

/// Reject visits outside the domain of a three-dart throw
pub fn validate_turn(turn: &Turn) -> Result<()> {
    if !(1..=DARTS_PER_TURN).contains(&turn.darts_used) {
        return Err(EngineError::invalid(format!(
            "darts used must be 1-3 (got {})",
            turn.darts_used
        )));
    }
    if turn.doubles_missed > turn.darts_used {
        return Err(EngineError::invalid(format!(
            "doubles missed ({}) exceeds darts used ({})",
            turn.doubles_missed, turn.darts_used
        )));
    }
    if turn.score > MAX_DART_SCORE * turn.darts_used as u32 {
        return Err(EngineError::invalid(format!(
            "score {} is not possible with {} dart(s)",
            turn.score, turn.darts_used
        )));
    }
    if !is_reachable(turn.score, turn.darts_used) {
        return Err(EngineError::invalid(format!(
            "score {} can't be thrown with {} dart(s)",
            turn.score, turn.darts_used
        )));
    }
    Ok(())
}

/// Whether the player's recorded visits form a legal countdown
///
/// Remaining never drops below zero or lands on one, and a visit that reaches
/// zero must be a checkout the table allows with the darts it used.
pub fn history_is_legal(leg: &Leg, x01: u32, player_id: PlayerId) -> bool {
    let table = checkout_table();
    let mut remaining = x01 as i64;
    for (_, score) in leg.scores_of(player_id) {
        remaining -= score.score as i64;
        if remaining < 0 || remaining == 1 {
            return false;
        }
        if remaining == 0 && !table.is_valid_checkout(score.score, score.darts_used) {
            return false;
        }
    }
    true
}

/// Rewrite every `remaining` for the player from the top of the leg
pub fn recompute_remaining(leg: &mut Leg, x01: u32, player_id: PlayerId) {
    let mut total = 0u32;
    for round in leg.rounds.values_mut() {
        if let Some(score) = round.score_of_mut(player_id) {
            total += score.score;
            score.remaining = x01.saturating_sub(total);
        }
    }
}

/// Insert or replace `score` in the round, then re-check the thrower's leg
///
/// Returns `true` when the visit had to be recorded as a bust.
pub fn add_score(x01: u32, leg: &mut Leg, round_number: u32, score: Score) -> Result<bool> {
    let player_id = score.player_id;
    leg.round_mut(round_number)?.upsert(score);

    let busted = !history_is_legal(leg, x01, player_id);
    if busted {
        if let Some(recorded) = leg
            .rounds
            .get_mut(&round_number)
            .and_then(|r| r.score_of_mut(player_id))
        {
            log::warn!(
                "Leg {} round {round_number}: {} in {} dart(s) is a bust",
                leg.number,
                recorded.score,
                recorded.darts_used
            );
            recorded.score = 0;
            recorded.darts_used = DARTS_PER_TURN;
        }
    }
    recompute_remaining(leg, x01, player_id);
    Ok(busted)
}

/// Replace an existing visit, subject to the same legality checks as a new one
pub fn edit_score(m: &mut Match, request: &EditRequest, doubles_missed: u8) -> Result<bool> {
    if m.player(request.player_id).is_none() {
        return Err(EngineError::not_found(format!(
            "player {}",
            request.player_id
        )));
    }
    let x01 = m.settings.x01;
    let leg = m.set_mut(request.set)?.leg_mut(request.leg)?;
    if leg.winner.is_some_and(|w| w != request.player_id) {
        return Err(EngineError::conflict(MESSAGE_LEG_ALREADY_WON));
    }
    if leg.round(request.round)?.score_of(request.player_id).is_none() {
        return Err(EngineError::not_found(format!(
            "score for player {} in round {}",
            request.player_id, request.round
        )));
    }

    let score = Score {
        player_id: request.player_id,
        darts_used: request.turn.darts_used,
        doubles_missed,
        score: request.turn.score,
        remaining: 0,
    };
    add_score(x01, leg, request.round, score)
}

/// Remove the most recently recorded visit and prune emptied rounds, legs and sets
pub fn delete_last_score(m: &mut Match) -> Result<Score> {
    let target = m.sets.iter().rev().find_map(|(&set_number, set)| {
        set.legs.iter().rev().find_map(|(&leg_number, leg)| {
            leg.rounds
                .iter()
                .rev()
                .find(|(_, round)| !round.is_empty())
                .map(|(&round_number, _)| (set_number, leg_number, round_number))
        })
    });
    let (set_number, leg_number, round_number) =
        target.ok_or_else(|| EngineError::not_found(MESSAGE_NO_TURNS))?;

    let x01 = m.settings.x01;
    let leg = m.set_mut(set_number)?.leg_mut(leg_number)?;
    let removed = leg
        .round_mut(round_number)?
        .scores
        .pop()
        .ok_or_else(|| EngineError::not_found(MESSAGE_NO_TURNS))?;
    recompute_remaining(leg, x01, removed.player_id);
    log::debug!(
        "Deleted {} by {} from set {set_number} leg {leg_number} round {round_number}",
        removed.score,
        removed.player_id
    );

    prune_empty(m);
    Ok(removed)
}

/// Drop rounds without scores, legs without rounds and sets without legs
pub fn prune_empty(m: &mut Match) {
    for set in m.sets.values_mut() {
        for leg in set.legs.values_mut() {
            leg.rounds.retain(|_, r| !r.is_empty());
        }
        set.legs.retain(|_, l| !l.rounds.is_empty());
    }
    m.sets.retain(|_, s| !s.legs.is_empty());
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::state::Round;
    use uuid::Uuid;

    fn leg_with_rounds(player: PlayerId, rounds: u32) -> Leg {
        let mut leg = Leg::new(1, player);
        for n in 1..=rounds {
            leg.rounds.insert(n, Round::new(n));
        }
        leg
    }

    fn visit(player_id: PlayerId, score: u32, darts_used: u8) -> Score {
        Score {
            player_id,
            darts_used,
            doubles_missed: 0,
            score,
            remaining: 0,
        }
    }

    #[test]
    fn test_validate_turn_domain() {
        assert!(validate_turn(&Turn::visit(180)).is_ok());
        assert!(validate_turn(&Turn::new(40, 1, 1)).is_ok());
        assert!(validate_turn(&Turn::visit(181)).is_err());
        assert!(validate_turn(&Turn::visit(179)).is_err());
        assert!(validate_turn(&Turn::new(61, 1, 0)).is_err());
        assert!(validate_turn(&Turn::new(60, 0, 0)).is_err());
        assert!(validate_turn(&Turn::new(60, 2, 3)).is_err());
    }

    #[test]
    fn test_impossible_two_dart_totals_rejected() {
        for score in [103, 106, 109, 112, 113, 115, 116, 118, 119] {
            assert!(validate_turn(&Turn::new(score, 2, 0)).is_err(), "{score} in 2");
            assert!(validate_turn(&Turn::new(score, 3, 0)).is_ok(), "{score} in 3");
        }
        for score in [120, 117, 110, 104, 101, 100, 0] {
            assert!(validate_turn(&Turn::new(score, 2, 0)).is_ok(), "{score} in 2");
        }
    }

    #[test]
    fn test_one_dart_must_match_a_bed() {
        for score in [0, 1, 20, 25, 50, 57, 60] {
            assert!(is_reachable(score, 1), "{score}");
        }
        for score in [23, 29, 31, 41, 59] {
            assert!(validate_turn(&Turn::new(score, 1, 0)).is_err(), "{score}");
        }
        assert!(!is_reachable(10, 0));
        assert!(!is_reachable(10, 4));
    }

    #[test]
    fn test_legal_visits_track_remaining() {
        let a = Uuid::new_v4();
        let mut leg = leg_with_rounds(a, 2);
        assert!(!add_score(501, &mut leg, 1, visit(a, 140, 3)).unwrap());
        assert!(!add_score(501, &mut leg, 2, visit(a, 100, 3)).unwrap());
        assert_eq!(leg.rounds[&2].score_of(a).unwrap().remaining, 261);
    }

    #[test]
    fn test_overshoot_is_bust() {
        let a = Uuid::new_v4();
        let mut leg = leg_with_rounds(a, 2);
        add_score(101, &mut leg, 1, visit(a, 60, 3)).unwrap();
        assert!(add_score(101, &mut leg, 2, visit(a, 45, 2)).unwrap());
        let s = leg.rounds[&2].score_of(a).unwrap();
        assert_eq!((s.score, s.darts_used, s.remaining), (0, 3, 41));
    }

    #[test]
    fn test_leaving_one_is_bust() {
        let a = Uuid::new_v4();
        let mut leg = leg_with_rounds(a, 1);
        assert!(add_score(101, &mut leg, 1, visit(a, 100, 3)).unwrap());
    }

    #[test]
    fn test_checkout_needs_enough_darts() {
        let a = Uuid::new_v4();
        let mut leg = leg_with_rounds(a, 2);
        add_score(201, &mut leg, 1, visit(a, 100, 3)).unwrap();
        // 101 needs two darts at least
        assert!(add_score(201, &mut leg, 2, visit(a, 101, 1)).unwrap());
        assert!(!add_score(201, &mut leg, 2, visit(a, 101, 2)).unwrap());
        assert_eq!(leg.rounds[&2].score_of(a).unwrap().remaining, 0);
    }

    #[test]
    fn test_bogey_checkout_is_bust() {
        let a = Uuid::new_v4();
        let mut leg = leg_with_rounds(a, 2);
        add_score(301, &mut leg, 1, visit(a, 132, 3)).unwrap();
        assert!(add_score(301, &mut leg, 2, visit(a, 169, 3)).is_ok_and(|b| b));
    }

    #[test]
    fn test_missing_round_is_not_found() {
        let a = Uuid::new_v4();
        let mut leg = leg_with_rounds(a, 1);
        let err = add_score(501, &mut leg, 4, visit(a, 60, 3)).unwrap_err();
        assert!(matches!(err, EngineError::NotFound(_)));
    }
}
