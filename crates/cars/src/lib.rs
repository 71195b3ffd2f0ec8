//! Cars domain module.
//!
//! This crate contains the `Car` record: field accessors, age normalization,
//! identity-based equality and partial-update merging. No IO, no HTTP, no storage.

pub mod car;

pub use car::{Car, CarId};
