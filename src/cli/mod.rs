//! CLI module - Command-line interface for Animelist
//!
//! This module provides a structured CLI using clap for argument parsing.

mod commands;

use clap::{Parser, Subcommand};

/// Animelist - personal anime list service
/// Keeps per-user favorites and proxies the Jikan catalog
#[derive(Parser)]
#[command(name = "animelist")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the HTTP API server (default)
    #[command(alias = "daemon")]
    Serve,

    /// Create default config file
    Init,

    /// Manage user accounts
    User {
        #[command(subcommand)]
        command: UserCommands,
    },

    /// Show a user's list
    #[command(alias = "ls", alias = "l")]
    List {
        /// Owner of the list
        username: String,
        /// Only show entries with this status
        #[arg(long, short)]
        status: Option<String>,
    },

    /// Search the catalog
    #[command(alias = "s")]
    Search {
        /// Search query
        #[arg(required = true)]
        query: Vec<String>,
        /// Maximum number of results
        #[arg(long, default_value = "10")]
        limit: u32,
    },
}

#[derive(Subcommand)]
pub enum UserCommands {
    /// Create a user and print its API key
    Add {
        username: String,
        /// Password for the new account
        #[arg(long, env = "ANIMELIST_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Issue a fresh API key, invalidating the old one
    ResetApiKey { username: String },
}

pub use commands::*;
