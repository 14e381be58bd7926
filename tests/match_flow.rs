use oche::engine::{
    EditRequest, Match, MatchStatus, NewPlayer, ResultType, Turn, add_turn, create_match,
    delete_last_turn, edit_turn,
};
use oche::error::MESSAGE_LEG_ALREADY_WON;
use oche::{BestOf, ClearByTwo, EngineError, MatchSettings};

fn settings(x01: u32, sets: u32, legs: u32) -> MatchSettings {
    MatchSettings {
        x01,
        best_of: BestOf { sets, legs },
        clear_by_two_legs: ClearByTwo::default(),
        clear_by_two_sets: ClearByTwo::default(),
        track_doubles: true,
    }
}

fn duel(settings: MatchSettings) -> Match {
    create_match(
        settings,
        vec![NewPlayer::human("Anna"), NewPlayer::human("Ben")],
    )
    .unwrap()
}

fn play(mut m: Match, turns: &[Turn]) -> Match {
    for turn in turns {
        m = add_turn(&m, turn).unwrap();
    }
    m
}

/// Anna: 140, 140, 140, then 81 in two darts; Ben scores 60s
fn anna_checks_out() -> Match {
    play(
        duel(settings(501, 1, 1)),
        &[
            Turn::visit(140),
            Turn::visit(60),
            Turn::visit(140),
            Turn::visit(60),
            Turn::visit(140),
            Turn::visit(60),
            Turn::new(81, 2, 0),
        ],
    )
}

#[test]
fn test_checkout_wins_leg_and_match() {
    let m = anna_checks_out();
    let anna = m.players[0].id;
    let leg = &m.sets[&1].legs[&1];

    assert_eq!(leg.winner, Some(anna));
    assert_eq!(leg.rounds.len(), 4);
    assert_eq!(leg.rounds[&4].scores.len(), 1);
    assert_eq!(leg.rounds[&4].scores[0].remaining, 0);
    assert_eq!(m.status, MatchStatus::Concluded);
    assert!(m.end_date.is_some());
    assert_eq!(m.players[0].result, Some(ResultType::Win));
    assert_eq!(m.players[1].result, Some(ResultType::Loss));
    assert_eq!(m.progress.current_thrower, None);

    let stats = &m.players[0].statistics;
    assert_eq!(stats.checkout.hits, 1);
    assert_eq!(stats.checkout.highest, 81);
    assert_eq!(stats.average.darts_thrown, 11);
    assert_eq!(stats.score.ton_forty_plus, 3);
}

#[test]
fn test_delete_last_turn_reopens_match() {
    let m = delete_last_turn(&anna_checks_out()).unwrap();
    let anna = m.players[0].id;

    assert_eq!(m.status, MatchStatus::InPlay);
    assert!(m.end_date.is_none());
    assert!(m.players.iter().all(|p| p.result.is_none()));
    assert!(m.sets[&1].result.is_none());
    assert_eq!(m.sets[&1].legs[&1].winner, None);
    assert_eq!(m.progress.current_round, Some(4));
    assert_eq!(m.progress.current_thrower, Some(anna));
    assert_eq!(m.progress.remaining, Some(81));
    assert_eq!(m.progress.suggested_checkout.as_deref(), Some("T15 D18"));
    assert_eq!(m.players[0].statistics.checkout.hits, 0);
}

#[test]
fn test_edit_winners_checkout_reopens_leg() {
    let m = anna_checks_out();
    let request = EditRequest {
        set: 1,
        leg: 1,
        round: 4,
        player_id: m.players[0].id,
        turn: Turn::visit(60),
    };
    let m = edit_turn(&m, &request).unwrap();

    assert_eq!(m.status, MatchStatus::InPlay);
    assert_eq!(m.sets[&1].legs[&1].winner, None);
    assert_eq!(m.progress.current_thrower, Some(m.players[1].id));
    assert_eq!(m.sets[&1].legs[&1].remaining_of(501, m.players[0].id), 21);
}

#[test]
fn test_edit_loser_in_won_leg_conflicts() {
    let m = anna_checks_out();
    let request = EditRequest {
        set: 1,
        leg: 1,
        round: 2,
        player_id: m.players[1].id,
        turn: Turn::visit(100),
    };
    assert_eq!(
        edit_turn(&m, &request).unwrap_err(),
        EngineError::conflict(MESSAGE_LEG_ALREADY_WON)
    );
}

#[test]
fn test_earlier_edit_busts_when_history_overshoots() {
    let m = play(
        duel(settings(301, 1, 3)),
        &[Turn::visit(100), Turn::visit(60), Turn::visit(150)],
    );
    // 160 then 150 would take Anna past 301, so the edited visit busts
    let request = EditRequest {
        set: 1,
        leg: 1,
        round: 1,
        player_id: m.players[0].id,
        turn: Turn::visit(160),
    };
    let m = edit_turn(&m, &request).unwrap();
    let leg = &m.sets[&1].legs[&1];
    let anna = m.players[0].id;
    let edited = leg.rounds[&1].score_of(anna).unwrap();
    assert_eq!((edited.score, edited.darts_used), (0, 3));
    assert_eq!(leg.rounds[&2].score_of(anna).unwrap().remaining, 151);
}

#[test]
fn test_bust_is_recorded_not_rejected() {
    let m = play(duel(settings(101, 1, 1)), &[Turn::visit(100)]);
    let score = m.sets[&1].legs[&1].rounds[&1].scores[0];
    assert_eq!((score.score, score.darts_used, score.remaining), (0, 3, 101));
    assert_eq!(m.progress.current_thrower, Some(m.players[1].id));
}

#[test]
fn test_edit_into_overshoot_busts_edited_turn() {
    let m = play(
        duel(settings(101, 1, 1)),
        &[Turn::visit(60), Turn::visit(20), Turn::visit(20)],
    );
    // Anna now sits on 21; 60 + 45 overshoots 101
    let request = EditRequest {
        set: 1,
        leg: 1,
        round: 2,
        player_id: m.players[0].id,
        turn: Turn::visit(45),
    };
    let m = edit_turn(&m, &request).unwrap();
    let score = m.sets[&1].legs[&1].rounds[&2].scores[0];
    assert_eq!((score.score, score.darts_used, score.remaining), (0, 3, 41));
}

#[test]
fn test_leg_throwers_alternate_between_legs() {
    let m = play(duel(settings(101, 1, 3)), &[Turn::new(101, 2, 1)]);
    assert_eq!(m.sets[&1].legs[&1].winner, Some(m.players[0].id));
    assert_eq!(m.progress.current_leg, Some(2));
    assert_eq!(m.progress.current_thrower, Some(m.players[1].id));
    assert_eq!(m.sets[&1].legs[&2].thrower, m.players[1].id);

    let stats = &m.players[0].statistics.checkout;
    assert_eq!((stats.hits, stats.misses), (1, 1));
    assert!((stats.hit_percentage - 50.0).abs() < 1e-9);
}

#[test]
fn test_clear_by_two_plays_to_cap() {
    let mut rules = settings(101, 1, 3);
    rules.clear_by_two_legs = ClearByTwo::enabled(2);
    let mut m = duel(rules);

    // Whoever opens each leg checks out straight away: A, B, A, B, A
    for leg in 1..=4 {
        m = add_turn(&m, &Turn::new(101, 2, 0)).unwrap();
        assert_eq!(m.status, MatchStatus::InPlay, "after leg {leg}");
    }
    assert_eq!(m.progress.current_leg, Some(5));

    m = add_turn(&m, &Turn::new(101, 2, 0)).unwrap();
    assert_eq!(m.status, MatchStatus::Concluded);
    assert_eq!(m.sets[&1].legs.len(), 5);
    assert_eq!(m.players[0].result, Some(ResultType::Win));
}

#[test]
fn test_split_set_is_a_drawn_match() {
    let m = play(
        duel(settings(101, 1, 2)),
        &[Turn::new(101, 2, 0), Turn::new(101, 2, 0)],
    );
    assert_eq!(m.status, MatchStatus::Concluded);
    assert!(m.players.iter().all(|p| p.result == Some(ResultType::Draw)));
}

#[test]
fn test_sets_rotate_first_thrower() {
    let m = play(duel(settings(101, 3, 1)), &[Turn::new(101, 2, 0)]);
    assert_eq!(m.progress.current_set, Some(2));
    assert_eq!(m.sets[&2].thrower, m.players[1].id);
    assert_eq!(m.sets_won(m.players[0].id), 1);

    let last = m.timeline.last().unwrap();
    assert_eq!(last.set, Some(2));
    assert_eq!(last.lines[0].sets_won, 1);
    assert_eq!(last.lines[0].legs_won, 0);
    assert_eq!(last.lines[0].remaining, 101);
}

#[test]
fn test_every_mutation_appends_snapshot() {
    let m = play(
        duel(settings(501, 1, 3)),
        &[Turn::visit(45), Turn::visit(26)],
    );
    assert_eq!(m.timeline.len(), 2);
    let m = delete_last_turn(&m).unwrap();
    assert_eq!(m.timeline.len(), 3);
    assert_eq!(m.timeline[2].lines[1].remaining, 501);
}
