//! Bot accuracy model
//!
//! How far a dart strays from its target, as a function of the bot's target
//! one-dart average, plus the treble it prefers when scoring.

use rand::Rng;

/// (one-dart average, max offset in mm), ascending by average
pub const ACCURACY_CURVE: [(f64, f64); 11] = [
    (0.0, 80.0),
    (10.0, 55.0),
    (15.0, 40.0),
    (20.0, 26.0),
    (25.0, 21.0),
    (30.0, 17.0),
    (35.0, 13.5),
    (40.0, 10.0),
    (45.0, 8.0),
    (50.0, 5.5),
    (53.0, 0.0),
];

/// How strongly the running average moves the offset
pub const CALIBRATION_FACTOR: f64 = 5.0;

/// One-dart average at which the bot stops spreading over other trebles
pub const NINE_DART_PACE: f64 = 50.0;

/// Relative preference for each scoring treble
pub const TREBLE_WEIGHTS: [(u8, f64); 4] = [(20, 85.0), (19, 12.5), (18, 5.0), (17, 2.5)];

/// Curve segment bracketing `avg`, clamped to the ends of the curve
///
/// An average sitting exactly on a breakpoint belongs to the segment above it.
fn segment(avg: f64) -> ((f64, f64), (f64, f64)) {
    let last = ACCURACY_CURVE.len() - 1;
    let i = ACCURACY_CURVE[1..]
        .iter()
        .position(|&(a, _)| avg < a)
        .unwrap_or(last - 1);
    (ACCURACY_CURVE[i], ACCURACY_CURVE[i + 1])
}

/// Uncalibrated offset for a one-dart average
pub fn base_offset(avg: f64) -> f64 {
    let ((a0, o0), (a1, o1)) = segment(avg);
    let avg = avg.clamp(ACCURACY_CURVE[0].0, ACCURACY_CURVE[ACCURACY_CURVE.len() - 1].0);
    let t = (avg - a0) / (a1 - a0);
    o0 + (o1 - o0) * t
}

/// Offset adjusted for how the bot is doing so far this leg
///
/// Running ahead of target tightens the spread, falling behind loosens it.
/// The result stays within the curve segment bracketing the target average.
pub fn calibrated_offset(target_avg: f64, current_avg: Option<f64>) -> f64 {
    let base = base_offset(target_avg);
    let Some(current) = current_avg else {
        return base;
    };
    if target_avg <= 0.0 {
        return base;
    }

    let ratio = (current - target_avg) / target_avg;
    let effective_avg = target_avg * (1.0 + ratio * CALIBRATION_FACTOR);
    let ((_, high), (_, low)) = segment(target_avg);
    base_offset(effective_avg).clamp(low, high)
}

/// Treble to aim at while scoring
pub fn pick_treble<R: Rng>(target_avg: f64, rng: &mut R) -> u8 {
    if target_avg >= NINE_DART_PACE {
        return 20;
    }
    let total: f64 = TREBLE_WEIGHTS.iter().map(|(_, w)| w).sum();
    let mut roll = rng.random_range(0.0..total);
    for &(section, weight) in &TREBLE_WEIGHTS {
        if roll < weight {
            return section;
        }
        roll -= weight;
    }
    20
}
