//! Bottom-up result recomputation
//!
//! Legs, then sets, then the match. Every pass starts from recorded scores,
//! so running it twice on an unchanged aggregate is a no-op. After a winner
//! is found at any level, anything recorded after the decisive point is
//! trimmed: an edit to an earlier round can change who won and strand
//! later play.

use std::collections::BTreeMap;

use chrono::Utc;

use super::standings::determine_winners;
use super::state::{Leg, Match, MatchStatus, Player, PlayerId, ResultType, Set};
use crate::settings::{ClearByTwo, MatchSettings};

/// Decide the leg: the first player, in throw order, to reach exactly zero
pub fn update_leg_result(leg: &mut Leg, x01: u32) {
    let mut totals: BTreeMap<PlayerId, u32> = BTreeMap::new();
    let mut decisive = None;

    'rounds: for round in leg.rounds.values() {
        for (pos, score) in round.scores.iter().enumerate() {
            let total = totals.entry(score.player_id).or_default();
            *total += score.score;
            if *total == x01 {
                decisive = Some((round.number, pos, score.player_id));
                break 'rounds;
            }
        }
    }

    leg.winner = decisive.map(|(_, _, id)| id);
    if let Some((round_number, pos, _)) = decisive {
        let removed = remove_scores_after_winner(leg, round_number, pos);
        if removed > 0 {
            log::debug!("Leg {}: trimmed {removed} scores after checkout", leg.number);
        }
    }
}

/// Drop everything thrown after the checkout at `round_number`/`pos`
///
/// Returns the number of scores removed.
pub fn remove_scores_after_winner(leg: &mut Leg, round_number: u32, pos: usize) -> usize {
    let mut removed = 0;
    if let Some(round) = leg.rounds.get_mut(&round_number) {
        removed += round.scores.len().saturating_sub(pos + 1);
        round.scores.truncate(pos + 1);
    }
    let stale: Vec<u32> = leg
        .rounds
        .range(round_number + 1..)
        .map(|(n, _)| *n)
        .collect();
    for number in stale {
        removed += leg.rounds.remove(&number).map_or(0, |r| r.scores.len());
    }
    removed
}

/// WIN for a lone winner, DRAW for tied winners, LOSS for the rest
fn results_for(players: &[Player], winners: &[PlayerId]) -> BTreeMap<PlayerId, ResultType> {
    let winning = if winners.len() > 1 {
        ResultType::Draw
    } else {
        ResultType::Win
    };
    players
        .iter()
        .map(|p| {
            let result = if winners.contains(&p.id) {
                winning
            } else {
                ResultType::Loss
            };
            (p.id, result)
        })
        .collect()
}

/// Walk entities in order, crediting wins, until the standings produce winners
///
/// `credited` yields the ids credited by one entity (empty while undecided).
/// Returns the decisive entity number and the winners.
fn first_decision<I>(
    entities: I,
    players: &[Player],
    best_of: u32,
    rule: ClearByTwo,
) -> Option<(u32, Vec<PlayerId>)>
where
    I: Iterator<Item = (u32, Vec<PlayerId>)>,
{
    let mut wins: BTreeMap<PlayerId, u32> = players.iter().map(|p| (p.id, 0)).collect();
    let mut played = 0;

    for (number, credited) in entities {
        if credited.is_empty() {
            continue;
        }
        for id in credited {
            *wins.entry(id).or_default() += 1;
        }
        played += 1;
        let winners = determine_winners(&wins, played, best_of, rule);
        if !winners.is_empty() {
            return Some((number, winners));
        }
    }
    None
}

/// Recompute every leg, then decide the set from leg wins
pub fn update_set_result(set: &mut Set, settings: &MatchSettings, players: &[Player]) {
    for leg in set.legs.values_mut() {
        update_leg_result(leg, settings.x01);
    }

    let legs = set
        .legs
        .values()
        .map(|l| (l.number, l.winner.into_iter().collect::<Vec<_>>()));
    match first_decision(
        legs,
        players,
        settings.best_of.legs,
        settings.clear_by_two_legs,
    ) {
        Some((decisive_leg, winners)) => {
            set.result = Some(results_for(players, &winners));
            remove_legs_after_set_winner(set, decisive_leg);
        }
        None => set.result = None,
    }
}

/// Drop legs recorded after the leg that decided the set
pub fn remove_legs_after_set_winner(set: &mut Set, decisive_leg: u32) -> usize {
    let before = set.legs.len();
    set.legs.retain(|&n, _| n <= decisive_leg);
    let removed = before - set.legs.len();
    if removed > 0 {
        log::debug!("Set {}: trimmed {removed} legs after decisive leg", set.number);
    }
    removed
}

/// Drop sets recorded after the set that decided the match
pub fn remove_sets_after_match_winner(m: &mut Match, decisive_set: u32) -> usize {
    let before = m.sets.len();
    m.sets.retain(|&n, _| n <= decisive_set);
    let removed = before - m.sets.len();
    if removed > 0 {
        log::debug!("Match {}: trimmed {removed} sets after decisive set", m.id);
    }
    removed
}

/// Recompute legs, sets and the match, strictly bottom-up
pub fn update_match_result(m: &mut Match) {
    for set in m.sets.values_mut() {
        update_set_result(set, &m.settings, &m.players);
    }

    let sets = m.sets.values().map(|s| (s.number, s.winners()));
    let decision = first_decision(
        sets,
        &m.players,
        m.settings.best_of.sets,
        m.settings.clear_by_two_sets,
    );
    let was_concluded = m.status == MatchStatus::Concluded;

    match decision {
        Some((decisive_set, winners)) => {
            let results = results_for(&m.players, &winners);
            for player in &mut m.players {
                player.result = results.get(&player.id).copied();
            }
            m.status = MatchStatus::Concluded;
            if m.end_date.is_none() {
                m.end_date = Some(Utc::now());
            }
            remove_sets_after_match_winner(m, decisive_set);
            if !was_concluded {
                log::info!("Match {} concluded ({} winner(s))", m.id, winners.len());
            }
        }
        None => {
            for player in &mut m.players {
                player.result = None;
            }
            m.status = MatchStatus::InPlay;
            m.end_date = None;
            if was_concluded {
                log::info!("Match {} back in play", m.id);
            }
        }
    }
}
