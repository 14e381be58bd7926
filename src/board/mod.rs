//! Dartboard model
//!
//! Pure lookups only: polar geometry and the checkout table.

pub mod checkout;
pub mod geometry;

pub use checkout::{Checkout, CheckoutTable, checkout_table, install_checkout_table};
pub use geometry::{Area, BULL_SECTION, Bed, locate, score, section_at};
