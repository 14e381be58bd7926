//! Checkout table
//!
//! Static lookup of remaining score -> minimum darts and a suggested
//! finishing route. Every entry ends on a double or the bull. The standard
//! table is generated once per process; a service may instead install an
//! externally sourced table at startup after it passes validation.

use std::collections::HashMap;

use once_cell::sync::OnceCell;
use serde::{Deserialize, Serialize};

use super::geometry::{Area, Bed};
use crate::consts::{DARTS_PER_TURN, MAX_CHECKOUT};
use crate::error::{EngineError, Result};

/// Preferred finishing doubles, best first (25 stands for the bull)
const FAVOURITE_DOUBLES: [u8; 21] = [
    20, 16, 8, 18, 12, 10, 4, 2, 6, 14, 19, 17, 15, 13, 11, 9, 7, 5, 3, 1, 25,
];

static TABLE: OnceCell<CheckoutTable> = OnceCell::new();

/// One finish: the darts to throw for a remaining score
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Checkout {
    pub remaining: u32,
    pub min_darts: u8,
    pub darts: Vec<Bed>,
}

impl Checkout {
    /// First bed of the route
    pub fn first(&self) -> Bed {
        self.darts.first().copied().unwrap_or(Bed::MISS)
    }

    /// Route as a display string, e.g. `T20 T20 BULL`
    pub fn route(&self) -> String {
        self.darts
            .iter()
            .map(|d| d.to_string())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Ordered checkout lookup
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckoutTable {
    /// Sorted by remaining
    entries: Vec<Checkout>,
}

impl CheckoutTable {
    /// Generate the standard table for every finish up to 170
    pub fn standard() -> Self {
        let beds = scoring_beds();
        let best_single = best_single_by_value(&beds);
        let best_pair = best_pair_by_value(&beds);

        let mut entries = Vec::new();
        for remaining in 2..=MAX_CHECKOUT {
            if let Some(darts) = best_route(remaining, &best_single, &best_pair) {
                entries.push(Checkout {
                    remaining,
                    min_darts: darts.len() as u8,
                    darts,
                });
            }
        }
        Self { entries }
    }

    /// Build a table from externally supplied entries, validating each one
    pub fn from_entries(mut entries: Vec<Checkout>) -> Result<Self> {
        entries.sort_by_key(|e| e.remaining);
        for pair in entries.windows(2) {
            if pair[0].remaining == pair[1].remaining {
                return Err(EngineError::invalid(format!(
                    "duplicate checkout entry for {}",
                    pair[0].remaining
                )));
            }
        }
        for entry in &entries {
            validate_entry(entry)?;
        }
        Ok(Self { entries })
    }

    /// Parse a JSON array of entries (`{"remaining":170,"min_darts":3,"darts":["T20","T20","BULL"]}`)
    pub fn from_json(json: &str) -> Result<Self> {
        let entries: Vec<Checkout> = serde_json::from_str(json)
            .map_err(|e| EngineError::invalid(format!("checkout table: {e}")))?;
        Self::from_entries(entries)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(&self.entries)?)
    }

    pub fn entries(&self) -> &[Checkout] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, remaining: u32) -> Option<&Checkout> {
        self.entries
            .binary_search_by_key(&remaining, |e| e.remaining)
            .ok()
            .map(|i| &self.entries[i])
    }

    /// Whether `remaining` can be finished this visit
    pub fn in_range(&self, remaining: u32) -> bool {
        self.get(remaining).is_some()
    }

    pub fn min_darts(&self, remaining: u32) -> Option<u8> {
        self.get(remaining).map(|e| e.min_darts)
    }

    /// A finishing score is legal if it is in the table and enough darts were used
    pub fn is_valid_checkout(&self, score: u32, darts_used: u8) -> bool {
        self.get(score)
            .is_some_and(|e| darts_used >= e.min_darts && darts_used <= DARTS_PER_TURN)
    }
}

/// Process-wide checkout table (standard unless one was installed)
pub fn checkout_table() -> &'static CheckoutTable {
    TABLE.get_or_init(|| {
        let table = CheckoutTable::standard();
        log::debug!("Generated standard checkout table ({} entries)", table.len());
        table
    })
}

/// Install an externally sourced table; must happen before first use
pub fn install_checkout_table(table: CheckoutTable) -> Result<()> {
    let len = table.len();
    TABLE.set(table).map_err(|_| {
        log::warn!("Checkout table already initialised, rejecting replacement");
        EngineError::conflict("checkout table already initialised")
    })?;
    log::info!("Installed checkout table ({len} entries)");
    Ok(())
}

fn validate_entry(entry: &Checkout) -> Result<()> {
    let fail = |why: &str| {
        Err(EngineError::invalid(format!(
            "checkout {}: {why}",
            entry.remaining
        )))
    };
    if !(2..=MAX_CHECKOUT).contains(&entry.remaining) {
        return fail("remaining out of range");
    }
    if entry.darts.is_empty() || entry.darts.len() > DARTS_PER_TURN as usize {
        return fail("route must use 1-3 darts");
    }
    if entry.min_darts as usize != entry.darts.len() {
        return fail("min_darts does not match route length");
    }
    if entry.darts.iter().any(Bed::is_miss) {
        return fail("route contains a miss");
    }
    if !entry.darts.last().is_some_and(Bed::is_double) {
        return fail("route must finish on a double or the bull");
    }
    let total: u32 = entry.darts.iter().map(Bed::value).sum();
    if total != entry.remaining {
        return fail("route does not add up");
    }
    Ok(())
}

/// Every bed a dart can score on
fn scoring_beds() -> Vec<Bed> {
    let mut beds = Vec::with_capacity(62);
    for section in 1..=20 {
        beds.push(Bed::single(section));
        beds.push(Bed::double(section));
        beds.push(Bed::treble(section));
    }
    beds.push(Bed::OUTER_BULL);
    beds.push(Bed::BULL);
    beds
}

/// Setup preference on equal value: singles, trebles, doubles, bulls
fn kind_rank(bed: &Bed) -> u8 {
    match bed.area {
        Area::InnerSingle | Area::OuterSingle => 0,
        Area::Treble => 1,
        Area::Double => 2,
        Area::SingleBull => 3,
        Area::DoubleBull => 4,
        Area::Miss => 5,
    }
}

fn best_single_by_value(beds: &[Bed]) -> HashMap<u32, Bed> {
    let mut best: HashMap<u32, Bed> = HashMap::new();
    for bed in beds {
        best.entry(bed.value())
            .and_modify(|cur| {
                if kind_rank(bed) < kind_rank(cur) {
                    *cur = *bed;
                }
            })
            .or_insert(*bed);
    }
    best
}

/// Best two-dart setup per total: biggest first dart, then simplest beds
fn best_pair_by_value(beds: &[Bed]) -> HashMap<u32, (Bed, Bed)> {
    let key = |a: &Bed, b: &Bed| (u32::MAX - a.value(), kind_rank(a), kind_rank(b));
    let mut best: HashMap<u32, (Bed, Bed)> = HashMap::new();
    for a in beds {
        for b in beds.iter().filter(|b| b.value() <= a.value()) {
            let total = a.value() + b.value();
            match best.get(&total) {
                Some((ca, cb)) if key(ca, cb) <= key(a, b) => {}
                _ => {
                    best.insert(total, (*a, *b));
                }
            }
        }
    }
    best
}

fn finishing_bed(section: u8) -> Bed {
    if section == super::geometry::BULL_SECTION {
        Bed::BULL
    } else {
        Bed::double(section)
    }
}

/// Fewest darts first, then favourite double, then preferred setup
fn best_route(
    remaining: u32,
    best_single: &HashMap<u32, Bed>,
    best_pair: &HashMap<u32, (Bed, Bed)>,
) -> Option<Vec<Bed>> {
    let finishes = FAVOURITE_DOUBLES.iter().map(|&s| finishing_bed(s));

    for finish in finishes.clone() {
        if finish.value() == remaining {
            return Some(vec![finish]);
        }
    }
    for finish in finishes.clone() {
        let Some(rest) = remaining.checked_sub(finish.value()) else {
            continue;
        };
        if let Some(setup) = best_single.get(&rest) {
            return Some(vec![*setup, finish]);
        }
    }
    for finish in finishes {
        let Some(rest) = remaining.checked_sub(finish.value()) else {
            continue;
        };
        if let Some((a, b)) = best_pair.get(&rest) {
            return Some(vec![*a, *b, finish]);
        }
    }
    None
}
