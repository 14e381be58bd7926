//! Oche demo
//!
//! Plays a complete match: an autoplayed human against the dart bot, through
//! the in-memory service. Run with `RUST_LOG=info` (or `debug` for every dart).

use rand::SeedableRng;
use rand_pcg::Pcg32;

use oche::bot::{BotLegState, leg_jitter, simulate_turn};
use oche::engine::{Match, NewPlayer, Turn};
use oche::persistence::InMemoryRepository;
use oche::service::MatchService;
use oche::{EngineError, MatchFormat, MatchSettings, Result};

/// Three-dart average the autoplayed human throws at
const HUMAN_AVERAGE: u32 = 70;
const BOT_AVERAGE: u32 = 65;
/// Safety stop for the visit loop
const MAX_VISITS: usize = 5_000;

/// Visit for the human, thrown by the simulator
fn autoplay(m: &Match, rng: &mut Pcg32) -> Result<Turn> {
    let progress = &m.progress;
    let (Some(set), Some(leg), Some(thrower)) =
        (progress.current_set, progress.current_leg, progress.current_thrower)
    else {
        return Err(EngineError::illegal_state("no one is up"));
    };
    let state = match m.current_leg() {
        Some(current) => BotLegState::new(
            m.settings.x01,
            current.points_of(thrower),
            current.darts_of(thrower),
            HUMAN_AVERAGE,
            leg_jitter(thrower, set, leg),
        ),
        None => BotLegState::new(m.settings.x01, 0, 0, HUMAN_AVERAGE, 1.0),
    };
    Ok(simulate_turn(&state, rng))
}

fn run(seed: u64) -> Result<()> {
    let mut rng = Pcg32::seed_from_u64(seed);
    let mut service = MatchService::new(InMemoryRepository::new());
    let mut settings = MatchSettings::from_format(MatchFormat::Standard);
    settings.track_doubles = true;

    let mut m = service.create(
        settings,
        vec![
            NewPlayer::human("Player"),
            NewPlayer::bot("Dart Bot", BOT_AVERAGE),
        ],
    )?;
    let id = m.id;
    log::info!("Seed {seed}, {} vs {}", m.players[0].name, m.players[1].name);

    let mut visits = 0;
    while !m.is_concluded() && visits < MAX_VISITS {
        let up = m
            .progress
            .current_thrower
            .and_then(|t| m.player(t))
            .ok_or_else(|| EngineError::illegal_state("no one is up"))?;
        m = if up.is_bot() {
            service.play_dart_bot_turn(id)?
        } else {
            let turn = autoplay(&m, &mut rng)?;
            service.add_turn(id, turn)?
        };
        visits += 1;

        if let Some(snapshot) = m.timeline.last() {
            let line = snapshot
                .lines
                .iter()
                .map(|l| format!("{}s {}l {:>3}", l.sets_won, l.legs_won, l.remaining))
                .collect::<Vec<_>>()
                .join(" | ");
            log::debug!("{line}");
        }
        if let Some(route) = &m.progress.suggested_checkout {
            log::debug!("Checkout on: {route}");
        }
    }

    for player in &m.players {
        let stats = &player.statistics;
        log::info!(
            "{}: {:?}, average {}, first nine {}, checkouts {}/{} ({:.1}%), highest {}, 180s {}",
            player.name,
            player.result,
            stats.average.average,
            stats.average.first_nine_average,
            stats.checkout.hits,
            stats.checkout.hits + stats.checkout.misses,
            stats.checkout.hit_percentage,
            stats.checkout.highest,
            stats.score.ton_eighty
        );
    }
    log::info!("Match {id} finished after {visits} visits");
    Ok(())
}

fn main() {
    env_logger::init();
    log::info!("Oche starting...");

    let seed = std::env::args()
        .nth(1)
        .and_then(|s| s.parse().ok())
        .unwrap_or_else(rand::random);
    if let Err(e) = run(seed) {
        log::error!("{e}");
        std::process::exit(1);
    }
}
