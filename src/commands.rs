//! This module defines the command-line interface for the application using
//! `clap`.
//!
//! It provides a `Cli` struct that represents the parsed command-line
//! arguments, and a `Commands` enum that represents the available subcommands
//! and their options.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Represents the parsed command-line arguments.
///
/// This struct is constructed by parsing the command-line arguments using
/// `clap`. It contains a `command` field that holds the parsed subcommand and
/// its options.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None, propagate_version = true, color = clap::ColorChoice::Always)]
pub struct Cli {
    /// Path to a config file; defaults to config.yaml in the per-platform
    /// configuration directory.
    #[arg(name = "config", short = 'c', long = "config", global = true)]
    pub config: Option<PathBuf>,

    /// The parsed subcommand and its options.
    #[command(subcommand)]
    pub command: Commands,
}

/// Represents the available subcommands and their options.
#[derive(Subcommand, Debug)]
#[command(about, long_about = None, color = clap::ColorChoice::Always)]
pub enum Commands {
    /// Interactive shopping conversation: first message searches the
    /// catalog, follow-ups narrow the same candidate pool.
    #[clap(name = "chat", alias = "i")]
    Chat,

    /// One-shot search with a direct query (no intent rewriting).
    #[clap(name = "search", alias = "s")]
    Search {
        /// The search query, e.g. "women's linen shirts".
        query: String,
    },

    /// Products similar to a cataloged product.
    #[clap(name = "similar")]
    Similar {
        /// Exact product name as it appears in the catalog.
        product: String,

        /// How many similar products to show.
        #[arg(name = "count", short = 'k', long = "count")]
        count: Option<usize>,
    },

    /// Inspect or maintain the durable summary cache.
    #[clap(name = "cache")]
    Cache {
        #[command(subcommand)]
        action: CacheAction,
    },

    /// Write a default config.yaml into the configuration directory.
    Init,
}

/// Maintenance operations on the summary cache.
#[derive(Subcommand, Debug)]
pub enum CacheAction {
    /// Entry count and on-disk size.
    Stats,

    /// Delete every cached summary.
    Clear,

    /// Drop entries not read within the retention window.
    Evict {
        /// Retention window in days; defaults to the configured value.
        #[arg(name = "days", short = 'd', long = "days")]
        days: Option<u32>,
    },
}
