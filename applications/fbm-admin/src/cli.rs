//! Argument definitions

use clap::{Parser, Subcommand};
use fbm_core::{UserField, UserId};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "fbm-admin")]
#[command(about = "Manage users stored in the FBM backend", long_about = None)]
pub struct Cli {
    /// Configuration file path (defaults to ./config.toml if present)
    #[arg(short, long, global = true, env = "FBM_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Connect to the backend and probe the user table
    Check,
    /// List all users
    List,
    /// Show one user
    Get {
        /// User ID
        id: UserId,
    },
    /// Create a new user
    Create {
        #[arg(long)]
        name: String,
        #[arg(long)]
        login: String,
        #[arg(long)]
        password: String,
        #[arg(long)]
        age: i32,
    },
    /// Replace every field of an existing user
    Update {
        /// User ID
        id: UserId,
        #[arg(long)]
        name: String,
        #[arg(long)]
        login: String,
        #[arg(long)]
        password: String,
        #[arg(long)]
        age: i32,
    },
    /// Change a single field (name, login, password or age)
    Set {
        /// User ID
        id: UserId,
        /// Field to change
        field: UserField,
        /// New value
        value: String,
    },
    /// Delete a user
    Delete {
        /// User ID
        id: UserId,
    },
}
