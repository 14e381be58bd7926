//! Winner determination under best-of and clear-by-two rules
//!
//! Shared by both levels: legs within a set and sets within a match. Only
//! the meaning of "played" and "best of" changes between them.

use std::collections::BTreeMap;

use super::state::PlayerId;
use crate::settings::ClearByTwo;

/// Ids grouped by win count, highest count first
pub fn standings(wins: &BTreeMap<PlayerId, u32>) -> Vec<(u32, Vec<PlayerId>)> {
    let mut groups: BTreeMap<u32, Vec<PlayerId>> = BTreeMap::new();
    for (&id, &count) in wins {
        groups.entry(count).or_default().push(id);
    }
    groups.into_iter().rev().collect()
}

/// Winners for the current standings, empty while play must continue
///
/// More than one winner means a draw between the tied leaders. With clear-by-two
/// a one-win lead is still accepted once `best_of + limit` entities have been
/// played.
pub fn determine_winners(
    wins: &BTreeMap<PlayerId, u32>,
    played: u32,
    best_of: u32,
    clear_by_two: ClearByTwo,
) -> Vec<PlayerId> {
    let groups = standings(wins);
    let Some((leader, leaders)) = groups.first() else {
        return Vec::new();
    };

    // Lone contestant: play out the full distance
    if wins.len() == 1 {
        return if played >= best_of {
            leaders.clone()
        } else {
            Vec::new()
        };
    }

    let runner_up = groups.get(1).map(|(count, _)| *count).unwrap_or(*leader);
    let diff = (*leader - runner_up) as i64;
    let remaining = best_of as i64 - played as i64;

    let uncatchable = remaining == 0 || diff > remaining;
    let cleared = !clear_by_two.enabled
        || diff >= 2
        || played >= best_of + clear_by_two.limit;

    if uncatchable && cleared {
        leaders.clone()
    } else {
        Vec::new()
    }
}
