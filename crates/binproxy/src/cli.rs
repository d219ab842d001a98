//! Command-line interface.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Generate binary-substituted proxy packages from a resolved dependency
/// graph.
#[derive(Parser, Debug)]
#[command(name = "binproxy", version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Raise the default log level to debug.
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Generate the proxy workspace.
    Gen {
        /// Resolved-graph document produced by the resolver toolchain.
        #[arg(long, env = "BINPROXY_GRAPH")]
        graph: PathBuf,
        /// Output root the proxy workspace is written under.
        #[arg(long, env = "BINPROXY_OUT")]
        out: PathBuf,
        /// Directory holding prebuilt binary artifacts.
        #[arg(long, env = "BINPROXY_BINARIES")]
        binaries: PathBuf,
    },
    /// Dump every package manifest as JSON.
    Metadata {
        /// Resolved-graph document produced by the resolver toolchain.
        #[arg(long, env = "BINPROXY_GRAPH")]
        graph: PathBuf,
        /// Directory the manifest dumps are written into.
        #[arg(long, env = "BINPROXY_OUT")]
        out: PathBuf,
    },
}

pub fn parse() -> Cli {
    Cli::parse()
}
