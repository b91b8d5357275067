//! FBM Admin Library
//!
//! Command-line surface over the user table. The command runner is written
//! against [`fbm_core::UserStore`] so it can be exercised without a backend.

pub mod cli;
pub mod commands;

pub use cli::{Cli, Command};
pub use commands::execute;
