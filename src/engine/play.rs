//! Public match operations
//!
//! Each mutation clones the incoming aggregate, applies the change, then runs
//! the same pipeline: results (legs, sets, match), statistics, progress, and a
//! scoreline snapshot. The caller's match is never touched, so an error leaves
//! nothing half-applied.

use std::collections::HashSet;

use chrono::Utc;
use uuid::Uuid;

use super::progress::compute_progress;
use super::result::update_match_result;
use super::state::{
    Match, MatchProgress, MatchStatus, NewPlayer, Player, PlayerType, Score, Scoreline,
    ScorelineSnapshot,
};
use super::stats::{Statistics, update_statistics};
use super::turn::{EditRequest, Turn, add_score, delete_last_score, edit_score, validate_turn};
use crate::error::{EngineError, MESSAGE_MATCH_CONCLUDED, Result};
use crate::settings::MatchSettings;

/// Bot three-dart average bounds
pub const MIN_BOT_AVERAGE: u32 = 1;
pub const MAX_BOT_AVERAGE: u32 = 167;

fn validate_players(players: &[NewPlayer]) -> Result<()> {
    if players.is_empty() {
        return Err(EngineError::invalid("a match needs at least one player"));
    }

    let mut names = HashSet::new();
    for player in players {
        let name = player.name.trim();
        if name.is_empty() {
            return Err(EngineError::invalid("player name can't be empty"));
        }
        if !names.insert(name.to_lowercase()) {
            return Err(EngineError::invalid(format!("duplicate player name '{name}'")));
        }
    }

    let bots: Vec<&NewPlayer> = players
        .iter()
        .filter(|p| p.player_type == PlayerType::DartBot)
        .collect();
    if bots.len() > 1 {
        return Err(EngineError::invalid("only one dart bot per match"));
    }
    if let Some(bot) = bots.first() {
        if bots.len() == players.len() {
            return Err(EngineError::invalid("a dart bot needs a human opponent"));
        }
        match bot.bot_average {
            Some(avg) if (MIN_BOT_AVERAGE..=MAX_BOT_AVERAGE).contains(&avg) => {}
            Some(avg) => {
                return Err(EngineError::invalid(format!(
                    "bot average {avg} outside {MIN_BOT_AVERAGE}-{MAX_BOT_AVERAGE}"
                )));
            }
            None => return Err(EngineError::invalid("dart bot needs a target average")),
        }
    }
    Ok(())
}

/// New match in play, players in the given (base throwing) order
pub fn create_match(settings: MatchSettings, players: Vec<NewPlayer>) -> Result<Match> {
    settings.validate()?;
    validate_players(&players)?;

    let players: Vec<Player> = players
        .into_iter()
        .map(|p| Player {
            id: Uuid::new_v4(),
            name: p.name.trim().to_string(),
            bot_average: match p.player_type {
                PlayerType::DartBot => p.bot_average,
                PlayerType::Human => None,
            },
            player_type: p.player_type,
            result: None,
            statistics: Statistics::default(),
        })
        .collect();
    let first = players[0].id;

    let m = Match {
        id: Uuid::new_v4(),
        start_date: Utc::now(),
        end_date: None,
        status: MatchStatus::InPlay,
        progress: MatchProgress::start(first, settings.x01),
        settings,
        players,
        sets: Default::default(),
        timeline: Vec::new(),
    };
    log::info!(
        "Created match {} ({} players, {} best of {} sets / {} legs)",
        m.id,
        m.players.len(),
        m.settings.x01,
        m.settings.best_of.sets,
        m.settings.best_of.legs
    );
    Ok(m)
}

/// Record a visit for whoever is up next
pub fn add_turn(m: &Match, turn: &Turn) -> Result<Match> {
    validate_turn(turn)?;
    if m.is_concluded() {
        return Err(EngineError::conflict(MESSAGE_MATCH_CONCLUDED));
    }

    let mut next = m.clone();
    let progress = compute_progress(&mut next)?;
    let (Some(set), Some(leg), Some(round), Some(thrower)) = (
        progress.current_set,
        progress.current_leg,
        progress.current_round,
        progress.current_thrower,
    ) else {
        return Err(EngineError::conflict(MESSAGE_MATCH_CONCLUDED));
    };

    let score = Score {
        player_id: thrower,
        darts_used: turn.darts_used,
        doubles_missed: doubles_recorded(&next, turn),
        score: turn.score,
        remaining: 0,
    };
    let x01 = next.settings.x01;
    let target = next.set_mut(set)?.leg_mut(leg)?;
    add_score(x01, target, round, score)?;

    recompute(&mut next)?;
    Ok(next)
}

/// Replace a recorded visit
pub fn edit_turn(m: &Match, request: &EditRequest) -> Result<Match> {
    validate_turn(&request.turn)?;

    let mut next = m.clone();
    let doubles_missed = doubles_recorded(&next, &request.turn);
    edit_score(&mut next, request, doubles_missed)?;

    recompute(&mut next)?;
    Ok(next)
}

/// Undo the most recent visit, wherever it was recorded
pub fn delete_last_turn(m: &Match) -> Result<Match> {
    let mut next = m.clone();
    delete_last_score(&mut next)?;

    recompute(&mut next)?;
    Ok(next)
}

fn doubles_recorded(m: &Match, turn: &Turn) -> u8 {
    if m.settings.track_doubles {
        turn.doubles_missed
    } else {
        0
    }
}

/// Results, then statistics, then progress, then a snapshot
fn recompute(m: &mut Match) -> Result<()> {
    update_match_result(m);
    update_statistics(m);
    compute_progress(m)?;
    record_snapshot(m);
    Ok(())
}

/// Current scoreboard
pub fn scorelines(m: &Match) -> Vec<Scoreline> {
    let set = m.progress.current_set.and_then(|n| m.sets.get(&n));
    let leg = m.current_leg();
    m.players
        .iter()
        .map(|p| Scoreline {
            player_id: p.id,
            sets_won: m.sets_won(p.id),
            legs_won: set.map_or(0, |s| s.legs_won(p.id)),
            remaining: leg.map_or(m.settings.x01, |l| l.remaining_of(m.settings.x01, p.id)),
        })
        .collect()
}

/// Append the current scoreboard to the timeline
pub fn record_snapshot(m: &mut Match) {
    let snapshot = ScorelineSnapshot {
        timestamp: Utc::now(),
        set: m.progress.current_set,
        leg: m.progress.current_leg,
        round: m.progress.current_round,
        lines: scorelines(m),
    };
    m.timeline.push(snapshot);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::state::ResultType;
    use crate::error::{MESSAGE_LEG_ALREADY_WON, MESSAGE_NO_TURNS};
    use crate::settings::BestOf;

    fn settings(x01: u32, legs: u32) -> MatchSettings {
        MatchSettings {
            x01,
            best_of: BestOf { sets: 1, legs },
            ..Default::default()
        }
    }

    fn duel(x01: u32, legs: u32) -> Match {
        create_match(
            settings(x01, legs),
            vec![NewPlayer::human("Anna"), NewPlayer::human("Ben")],
        )
        .unwrap()
    }

    #[test]
    fn test_create_match_defaults() {
        let m = duel(501, 3);
        assert_eq!(m.status, MatchStatus::InPlay);
        assert!(m.sets.is_empty());
        assert_eq!(m.progress.current_thrower, Some(m.players[0].id));
        assert_eq!(m.progress.remaining, Some(501));
    }

    #[test]
    fn test_create_match_rejects_bad_players() {
        let s = MatchSettings::default();
        assert!(create_match(s, vec![]).is_err());
        assert!(
            create_match(s, vec![NewPlayer::human("Anna"), NewPlayer::human(" anna ")]).is_err()
        );
        assert!(create_match(s, vec![NewPlayer::bot("Bot", 60)]).is_err());
        assert!(
            create_match(s, vec![NewPlayer::human("Anna"), NewPlayer::bot("Bot", 170)]).is_err()
        );
        assert!(
            create_match(
                s,
                vec![
                    NewPlayer::human("Anna"),
                    NewPlayer::bot("Bot", 60),
                    NewPlayer::bot("Bot 2", 60)
                ]
            )
            .is_err()
        );
        assert!(create_match(s, vec![NewPlayer::human("Anna"), NewPlayer::bot("Bot", 60)]).is_ok());
    }

    #[test]
    fn test_turns_alternate_and_leave_input_untouched() {
        let m = duel(501, 3);
        let after = add_turn(&m, &Turn::visit(60)).unwrap();
        assert!(m.sets.is_empty());
        assert_eq!(after.progress.current_thrower, Some(m.players[1].id));
        assert_eq!(after.progress.remaining, Some(501));
        assert_eq!(after.timeline.len(), 1);
        assert_eq!(after.timeline[0].lines[0].remaining, 441);
    }

    #[test]
    fn test_doubles_dropped_when_untracked() {
        let m = duel(501, 3);
        let after = add_turn(&m, &Turn::new(40, 3, 2)).unwrap();
        let leg = &after.sets[&1].legs[&1];
        assert_eq!(leg.rounds[&1].scores[0].doubles_missed, 0);
    }

    #[test]
    fn test_concluded_match_rejects_turns() {
        let mut m = duel(101, 1);
        m = add_turn(&m, &Turn::new(101, 2, 0)).unwrap();
        assert_eq!(m.status, MatchStatus::Concluded);
        assert_eq!(m.players[0].result, Some(ResultType::Win));
        assert_eq!(
            add_turn(&m, &Turn::visit(60)).unwrap_err(),
            EngineError::conflict(MESSAGE_MATCH_CONCLUDED)
        );
    }

    #[test]
    fn test_edit_guarded_by_leg_winner() {
        let mut m = duel(101, 3);
        m = add_turn(&m, &Turn::visit(60)).unwrap();
        m = add_turn(&m, &Turn::new(101, 2, 0)).unwrap();
        let request = EditRequest {
            set: 1,
            leg: 1,
            round: 1,
            player_id: m.players[0].id,
            turn: Turn::visit(45),
        };
        assert_eq!(
            edit_turn(&m, &request).unwrap_err(),
            EngineError::conflict(MESSAGE_LEG_ALREADY_WON)
        );
    }

    #[test]
    fn test_edit_missing_round_is_not_found() {
        let m = add_turn(&duel(501, 3), &Turn::visit(60)).unwrap();
        let request = EditRequest {
            set: 1,
            leg: 1,
            round: 7,
            player_id: m.players[0].id,
            turn: Turn::visit(45),
        };
        assert!(matches!(edit_turn(&m, &request), Err(EngineError::NotFound(_))));
    }

    #[test]
    fn test_delete_on_empty_match() {
        assert_eq!(
            delete_last_turn(&duel(501, 3)).unwrap_err(),
            EngineError::not_found(MESSAGE_NO_TURNS)
        );
    }

    #[test]
    fn test_delete_prunes_back_to_fresh() {
        let m = add_turn(&duel(501, 3), &Turn::visit(60)).unwrap();
        let m = delete_last_turn(&m).unwrap();
        assert!(!m.has_scores());
        assert_eq!(m.progress.current_thrower, Some(m.players[0].id));
        assert_eq!(m.players[0].statistics, Statistics::default());
    }
}
