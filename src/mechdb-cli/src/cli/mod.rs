//! CLI argument definitions for mechdb
//!
//! This module contains all clap-derived structs and enums for CLI parsing.

mod catalog;
mod core;
mod jobs;

pub use catalog::CatalogCommand;
pub use core::{Cli, Commands, OutputFormat};
pub use jobs::JobsCommand;
