//! Shared utilities.

pub mod date;
pub mod species_list;
