//! Oche - X01 darts match scoring engine
//!
//! Core modules:
//! - `board`: Dartboard geometry and the checkout table
//! - `engine`: Match progression, results, turn application, statistics
//! - `bot`: Dart-bot throw simulator
//! - `persistence`: Match repository seam with a versioned JSON envelope
//! - `service`: Load-mutate-save facade keyed by match id
//!
//! The engine is synchronous and performs no I/O. Every mutation takes a
//! match aggregate and returns an updated copy.

pub mod board;
pub mod bot;
pub mod engine;
pub mod error;
pub mod persistence;
pub mod service;
pub mod settings;

pub use error::{EngineError, Result};
pub use settings::{BestOf, ClearByTwo, MatchFormat, MatchSettings};

use glam::DVec2;

/// Board constants
pub mod consts {
    /// Band radii in millimetres from the board centre
    pub const DOUBLE_BULL_RADIUS: f64 = 7.0;
    pub const BULL_RADIUS: f64 = 17.0;
    pub const TREBLE_INNER_RADIUS: f64 = 97.0;
    pub const TREBLE_OUTER_RADIUS: f64 = 107.0;
    pub const DOUBLE_INNER_RADIUS: f64 = 160.0;
    pub const DOUBLE_OUTER_RADIUS: f64 = 170.0;

    /// Number of numbered wedges
    pub const WEDGES: usize = 20;
    /// Wedge order clockwise starting from the top
    pub const WEDGE_ORDER: [u8; WEDGES] = [
        20, 1, 18, 4, 13, 6, 10, 15, 2, 17, 3, 19, 7, 16, 8, 11, 14, 9, 12, 5,
    ];

    /// Darts in a single turn
    pub const DARTS_PER_TURN: u8 = 3;
    /// Highest finish reachable with three darts
    pub const MAX_CHECKOUT: u32 = 170;
}

/// Normalize angle to (-π, π]
#[inline]
pub fn normalize_angle(mut angle: f64) -> f64 {
    use std::f64::consts::{PI, TAU};
    while angle > PI {
        angle -= TAU;
    }
    while angle <= -PI {
        angle += TAU;
    }
    angle
}

/// Convert polar (r, theta) to cartesian (x, y)
#[inline]
pub fn polar_to_cartesian(r: f64, theta: f64) -> DVec2 {
    DVec2::new(r * theta.cos(), r * theta.sin())
}

/// Convert cartesian (x, y) to polar (r, theta), theta in (-π, π]
#[inline]
pub fn cartesian_to_polar(pos: DVec2) -> (f64, f64) {
    (pos.length(), normalize_angle(pos.y.atan2(pos.x)))
}
