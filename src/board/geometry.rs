//! Dartboard geometry
//!
//! The board is a set of concentric bands split into 20 wedges. Angles use
//! the usual math convention (counter-clockwise from +x), so the 20 wedge
//! sits at π/2 and the wedge order runs clockwise (decreasing theta).
//!
//! Band radii (mm): double bull 0-7, bull 7-17, inner single 17-97,
//! treble 97-107, outer single 107-160, double 160-170, miss beyond.

use std::fmt;

use glam::DVec2;
use serde::{Deserialize, Serialize};

use crate::consts::*;
use crate::error::EngineError;
use crate::{cartesian_to_polar, polar_to_cartesian};

/// Section number used for both bull beds
pub const BULL_SECTION: u8 = 25;

/// Angular width of one wedge
const WEDGE_WIDTH: f64 = std::f64::consts::PI / 10.0;

/// Radial band of the board
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Area {
    DoubleBull,
    SingleBull,
    InnerSingle,
    Treble,
    OuterSingle,
    Double,
    Miss,
}

impl Area {
    /// Inner and outer radius of the band
    pub fn band(&self) -> (f64, f64) {
        match self {
            Area::DoubleBull => (0.0, DOUBLE_BULL_RADIUS),
            Area::SingleBull => (DOUBLE_BULL_RADIUS, BULL_RADIUS),
            Area::InnerSingle => (BULL_RADIUS, TREBLE_INNER_RADIUS),
            Area::Treble => (TREBLE_INNER_RADIUS, TREBLE_OUTER_RADIUS),
            Area::OuterSingle => (TREBLE_OUTER_RADIUS, DOUBLE_INNER_RADIUS),
            Area::Double => (DOUBLE_INNER_RADIUS, DOUBLE_OUTER_RADIUS),
            Area::Miss => (DOUBLE_OUTER_RADIUS, f64::INFINITY),
        }
    }

    /// Radius a thrower aims at for this band (double bull is dead centre)
    pub fn aim_radius(&self) -> f64 {
        match self {
            Area::DoubleBull => 0.0,
            Area::Miss => DOUBLE_OUTER_RADIUS + 15.0,
            _ => {
                let (inner, outer) = self.band();
                (inner + outer) / 2.0
            }
        }
    }

    /// Band containing radius `r` (bands are half-open, inner edge inclusive)
    pub fn from_radius(r: f64) -> Area {
        let r = r.abs();
        if r < DOUBLE_BULL_RADIUS {
            Area::DoubleBull
        } else if r < BULL_RADIUS {
            Area::SingleBull
        } else if r < TREBLE_INNER_RADIUS {
            Area::InnerSingle
        } else if r < TREBLE_OUTER_RADIUS {
            Area::Treble
        } else if r < DOUBLE_INNER_RADIUS {
            Area::OuterSingle
        } else if r < DOUBLE_OUTER_RADIUS {
            Area::Double
        } else {
            Area::Miss
        }
    }

    pub fn multiplier(&self) -> u32 {
        match self {
            Area::InnerSingle | Area::OuterSingle | Area::SingleBull => 1,
            Area::Double | Area::DoubleBull => 2,
            Area::Treble => 3,
            Area::Miss => 0,
        }
    }

    /// Valid finishing band
    pub fn is_double(&self) -> bool {
        matches!(self, Area::Double | Area::DoubleBull)
    }
}

/// A concrete bed on the board: section plus area
///
/// Numbered beds use sections 1-20, both bulls use 25 and a miss uses 0.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Bed {
    pub section: u8,
    pub area: Area,
}

impl Bed {
    pub const BULL: Bed = Bed {
        section: BULL_SECTION,
        area: Area::DoubleBull,
    };
    pub const OUTER_BULL: Bed = Bed {
        section: BULL_SECTION,
        area: Area::SingleBull,
    };
    pub const MISS: Bed = Bed {
        section: 0,
        area: Area::Miss,
    };

    /// Single bed; aims at the larger inner single band
    pub fn single(section: u8) -> Self {
        Self {
            section,
            area: Area::InnerSingle,
        }
    }

    pub fn double(section: u8) -> Self {
        Self {
            section,
            area: Area::Double,
        }
    }

    pub fn treble(section: u8) -> Self {
        Self {
            section,
            area: Area::Treble,
        }
    }

    /// Points scored by landing here
    pub fn value(&self) -> u32 {
        match self.area {
            Area::DoubleBull => 50,
            Area::SingleBull => 25,
            Area::Miss => 0,
            area => self.section as u32 * area.multiplier(),
        }
    }

    pub fn is_double(&self) -> bool {
        self.area.is_double()
    }

    pub fn is_miss(&self) -> bool {
        self.area == Area::Miss
    }

    /// Same scoring bed (inner and outer singles are interchangeable)
    pub fn same_bed(&self, other: &Bed) -> bool {
        self.section == other.section && self.value() == other.value()
    }

    /// Polar centre of the bed as (r, theta)
    pub fn center(&self) -> (f64, f64) {
        let theta = wedge_center(self.section).unwrap_or(std::f64::consts::FRAC_PI_2);
        (self.area.aim_radius(), theta)
    }

    /// Parse a label such as `T20`, `D16`, `S5`, `5`, `25`, `BULL`, `MISS`
    pub fn parse(label: &str) -> Option<Self> {
        let label = label.trim().to_uppercase();
        match label.as_str() {
            "BULL" | "DB" | "50" => return Some(Bed::BULL),
            "25" | "SB" | "OB" => return Some(Bed::OUTER_BULL),
            "MISS" | "M" | "0" => return Some(Bed::MISS),
            _ => {}
        }
        let (area, digits) = match label.as_bytes().first()? {
            b'T' => (Area::Treble, &label[1..]),
            b'D' => (Area::Double, &label[1..]),
            b'S' => (Area::InnerSingle, &label[1..]),
            _ => (Area::InnerSingle, label.as_str()),
        };
        let section: u8 = digits.parse().ok()?;
        if !(1..=20).contains(&section) {
            return None;
        }
        Some(Self { section, area })
    }
}

impl fmt::Display for Bed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.area {
            Area::DoubleBull => write!(f, "BULL"),
            Area::SingleBull => write!(f, "25"),
            Area::Miss => write!(f, "MISS"),
            Area::Treble => write!(f, "T{}", self.section),
            Area::Double => write!(f, "D{}", self.section),
            Area::InnerSingle | Area::OuterSingle => write!(f, "S{}", self.section),
        }
    }
}

impl TryFrom<String> for Bed {
    type Error = EngineError;

    fn try_from(label: String) -> Result<Self, Self::Error> {
        Bed::parse(&label).ok_or_else(|| EngineError::invalid(format!("unknown bed '{label}'")))
    }
}

impl From<Bed> for String {
    fn from(bed: Bed) -> Self {
        bed.to_string()
    }
}

/// Centre angle of a numbered wedge
pub fn wedge_center(section: u8) -> Option<f64> {
    let index = WEDGE_ORDER.iter().position(|&s| s == section)?;
    Some(crate::normalize_angle(
        std::f64::consts::FRAC_PI_2 - index as f64 * WEDGE_WIDTH,
    ))
}

/// Section number of the wedge containing `theta`
///
/// A theta exactly on a wedge boundary belongs to the clockwise-following wedge.
pub fn section_at(theta: f64) -> u8 {
    let k = (std::f64::consts::FRAC_PI_2 + WEDGE_WIDTH / 2.0 - theta) / WEDGE_WIDTH;
    let nearest = k.round();
    let k = if (k - nearest).abs() < 1e-9 {
        nearest
    } else {
        k.floor()
    };
    WEDGE_ORDER[(k as i64).rem_euclid(WEDGES as i64) as usize]
}

/// Bed containing a cartesian board position
pub fn locate(point: DVec2) -> Bed {
    let (r, theta) = cartesian_to_polar(point);
    let area = Area::from_radius(r);
    match area {
        Area::DoubleBull | Area::SingleBull => Bed {
            section: BULL_SECTION,
            area,
        },
        Area::Miss => Bed::MISS,
        _ => Bed {
            section: section_at(theta),
            area,
        },
    }
}

/// Where a dart lands when thrown at `target` and deflected by a polar offset
///
/// The offsets are added to the target's polar centre; a negative resulting
/// radius flips through the centre.
pub fn score(target: Bed, offset_r: f64, offset_theta: f64) -> Bed {
    let (r, theta) = target.center();
    locate(polar_to_cartesian(r + offset_r, theta + offset_theta))
}
