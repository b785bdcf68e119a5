//! Command-line interface.

mod args;
mod species;

pub use args::{AnalyzeArgs, Cli, Command, ConfigAction, SortOrder, SpeciesArgs, WatchArgs};
pub use species::generate_species_list;
