// ABOUTME: Command-line interface definition using clap derive macros.
// ABOUTME: Defines the deploy, render and status subcommands and global flags.

use clap::{Parser, Subcommand};
use std::net::IpAddr;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "cutover")]
#[command(about = "Zero-downtime release cutover for a container behind nginx")]
#[command(version)]
pub struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Print only final results (for CI)
    #[arg(short, long, global = true, conflicts_with = "json")]
    pub quiet: bool,

    /// Print results as JSON lines
    #[arg(long, global = true)]
    pub json: bool,

    /// Layout file overriding images, names and paths
    #[arg(short, long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start a release, wait for it, and cut production over to it
    Deploy {
        /// Release tag (defaults to $TAG, then "latest")
        #[arg(short, long)]
        tag: Option<String>,

        /// Stage the release under its own name without touching production
        #[arg(long)]
        no_promote: bool,

        /// Break an existing deploy lock
        #[arg(long)]
        force: bool,
    },

    /// Print a rendered nginx config without writing it
    Render {
        /// Release tag
        #[arg(short, long)]
        tag: String,

        /// Render the production virtual host instead of the release upstream
        #[arg(long)]
        production: bool,

        /// Container address to render into the upstream
        #[arg(long, default_value = "127.0.0.1")]
        ip: IpAddr,
    },

    /// Show the applied tag and release containers
    Status,
}
