//! Set/leg/round progression
//!
//! Finds the lowest-numbered open entity at each level, creating the next
//! one lazily when the level above is still live. Nothing is pre-allocated.

use std::collections::BTreeMap;

use super::state::{Leg, Match, MatchProgress, Player, PlayerId, Round, Set, player_index};
use crate::board::checkout_table;
use crate::error::{EngineError, Result};
use crate::settings::MatchSettings;

/// Smallest positive number not yet used as a key, if within `ceiling`
pub fn next_number<T>(taken: &BTreeMap<u32, T>, ceiling: u32) -> Option<u32> {
    let mut n = 1;
    while taken.contains_key(&n) {
        n += 1;
    }
    (n <= ceiling).then_some(n)
}

/// Throwing order rotated to start at `first`
pub fn throw_order(players: &[Player], first: PlayerId) -> Result<Vec<PlayerId>> {
    let start = player_index(players, first)?;
    Ok((0..players.len())
        .map(|i| players[(start + i) % players.len()].id)
        .collect())
}

/// Player `offset` places after `first` in the base order
fn rotate(players: &[Player], first: PlayerId, offset: u32) -> Result<PlayerId> {
    let start = player_index(players, first)?;
    Ok(players[(start + offset as usize) % players.len()].id)
}

/// Lowest incomplete round, or a fresh one if the leg is still open
pub fn current_round_or_create(leg: &mut Leg, players: &[Player]) -> Option<u32> {
    if leg.winner.is_some() {
        return None;
    }
    if let Some(round) = leg.rounds.values().find(|r| !r.is_complete(players)) {
        return Some(round.number);
    }
    let number = next_number(&leg.rounds, u32::MAX)?;
    leg.rounds.insert(number, Round::new(number));
    Some(number)
}

/// Lowest undecided leg, or a fresh one if the set is still open
///
/// Leg N is opened by the player N-1 places after the set's first thrower.
pub fn current_leg_or_create(
    set: &mut Set,
    players: &[Player],
    settings: &MatchSettings,
) -> Result<Option<u32>> {
    if set.result.is_some() {
        return Ok(None);
    }
    if let Some(leg) = set.legs.values().find(|l| l.winner.is_none()) {
        return Ok(Some(leg.number));
    }
    let Some(number) = next_number(&set.legs, settings.max_legs()) else {
        return Ok(None);
    };
    let thrower = rotate(players, set.thrower, number - 1)?;
    log::debug!("Opening leg {number} of set {} (thrower {thrower})", set.number);
    set.legs.insert(number, Leg::new(number, thrower));
    Ok(Some(number))
}

/// Lowest undecided set, or a fresh one if the match is still live
///
/// Set N is opened by player N-1 in the base order.
pub fn current_set_or_create(m: &mut Match) -> Result<Option<u32>> {
    if m.is_concluded() || m.players.is_empty() {
        return Ok(None);
    }
    if let Some(set) = m.sets.values().find(|s| s.result.is_none()) {
        return Ok(Some(set.number));
    }
    let Some(number) = next_number(&m.sets, m.settings.max_sets()) else {
        return Ok(None);
    };
    let thrower = m.players[(number as usize - 1) % m.players.len()].id;
    log::debug!("Opening set {number} (thrower {thrower})");
    m.sets.insert(number, Set::new(number, thrower));
    Ok(Some(number))
}

/// Resolve (and lazily create) the current set, leg and round and who throws next
pub fn compute_progress(m: &mut Match) -> Result<MatchProgress> {
    let Some(set_number) = current_set_or_create(m)? else {
        m.progress = MatchProgress::default();
        return Ok(m.progress.clone());
    };

    let x01 = m.settings.x01;
    let set = m
        .sets
        .get_mut(&set_number)
        .ok_or_else(|| EngineError::not_found(format!("set {set_number}")))?;
    let leg_number = current_leg_or_create(set, &m.players, &m.settings)?;
    let leg_number = leg_number.ok_or_else(|| {
        EngineError::illegal_state(format!("set {set_number} is open but has no open leg"))
    })?;
    let leg = set.leg_mut(leg_number)?;
    let round_number = current_round_or_create(leg, &m.players).ok_or_else(|| {
        EngineError::illegal_state(format!("leg {leg_number} is open but has no open round"))
    })?;

    let round = leg.round(round_number)?;
    let thrower = throw_order(&m.players, leg.thrower)?
        .into_iter()
        .find(|id| round.score_of(*id).is_none());
    let remaining = thrower.map(|id| leg.remaining_of(x01, id));
    let suggested_checkout = remaining
        .and_then(|r| checkout_table().get(r))
        .map(|c| c.route());

    m.progress = MatchProgress {
        current_set: Some(set_number),
        current_leg: Some(leg_number),
        current_round: Some(round_number),
        current_thrower: thrower,
        remaining,
        suggested_checkout,
    };
    Ok(m.progress.clone())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::state::{PlayerType, Score};
    use crate::engine::stats::Statistics;
    use uuid::Uuid;

    fn players(n: usize) -> Vec<Player> {
        (0..n)
            .map(|i| Player {
                id: Uuid::new_v4(),
                name: format!("P{i}"),
                player_type: PlayerType::Human,
                result: None,
                bot_average: None,
                statistics: Statistics::default(),
            })
            .collect()
    }

    fn score(player_id: PlayerId) -> Score {
        Score {
            player_id,
            darts_used: 3,
            doubles_missed: 0,
            score: 60,
            remaining: 441,
        }
    }

    #[test]
    fn test_next_number_fills_gaps_under_ceiling() {
        let mut taken = BTreeMap::new();
        assert_eq!(next_number(&taken, 3), Some(1));
        taken.insert(1, ());
        taken.insert(3, ());
        assert_eq!(next_number(&taken, 3), Some(2));
        taken.insert(2, ());
        assert_eq!(next_number(&taken, 3), None);
    }

    #[test]
    fn test_round_created_only_when_previous_complete() {
        let ps = players(2);
        let mut leg = Leg::new(1, ps[0].id);
        assert_eq!(current_round_or_create(&mut leg, &ps), Some(1));
        assert_eq!(current_round_or_create(&mut leg, &ps), Some(1));

        leg.rounds.get_mut(&1).unwrap().upsert(score(ps[0].id));
        assert_eq!(current_round_or_create(&mut leg, &ps), Some(1));
        leg.rounds.get_mut(&1).unwrap().upsert(score(ps[1].id));
        assert_eq!(current_round_or_create(&mut leg, &ps), Some(2));
        assert_eq!(leg.rounds.len(), 2);

        leg.winner = Some(ps[0].id);
        assert_eq!(current_round_or_create(&mut leg, &ps), None);
    }

    #[test]
    fn test_leg_throwers_rotate_from_set_thrower() {
        let ps = players(3);
        let settings = MatchSettings {
            best_of: crate::BestOf { sets: 1, legs: 5 },
            ..Default::default()
        };
        let mut set = Set::new(1, ps[1].id);
        for expected in [1usize, 2, 0, 1] {
            let n = current_leg_or_create(&mut set, &ps, &settings).unwrap().unwrap();
            assert_eq!(set.legs[&n].thrower, ps[expected].id);
            set.legs.get_mut(&n).unwrap().winner = Some(ps[0].id);
        }
    }

    #[test]
    fn test_leg_ceiling_stops_creation() {
        let ps = players(2);
        let settings = MatchSettings {
            best_of: crate::BestOf { sets: 1, legs: 1 },
            ..Default::default()
        };
        let mut set = Set::new(1, ps[0].id);
        let n = current_leg_or_create(&mut set, &ps, &settings).unwrap().unwrap();
        set.legs.get_mut(&n).unwrap().winner = Some(ps[0].id);
        assert_eq!(current_leg_or_create(&mut set, &ps, &settings).unwrap(), None);
    }

    #[test]
    fn test_unknown_set_thrower_is_illegal_state() {
        let ps = players(2);
        let mut set = Set::new(1, Uuid::new_v4());
        let err = current_leg_or_create(&mut set, &ps, &MatchSettings::default()).unwrap_err();
        assert!(matches!(err, EngineError::IllegalState(_)));
    }

    #[test]
    fn test_throw_order_rotation() {
        let ps = players(3);
        let order = throw_order(&ps, ps[2].id).unwrap();
        assert_eq!(order, vec![ps[2].id, ps[0].id, ps[1].id]);
    }
}
