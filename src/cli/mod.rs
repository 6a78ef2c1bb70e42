//! CLI command definitions and parsing
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "concord",
    version,
    author = "neur0map",
    about = "Multi-source retrieval with authority-aware consistency analysis",
    long_about = "Concord indexes documentation, blog posts and forum threads, retrieves the passages \
                  most relevant to a question, reranks them, and asks a reasoning model whether the \
                  sources agree. When they disagree, the answer from the most authoritative source wins."
)]
pub struct Cli {
    /// Global config file path (defaults to ~/.config/concord/config.toml)
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Answer one or more questions against the corpus
    Query {
        /// Questions to run, each processed independently
        #[arg(required = true, num_args = 1..)]
        questions: Vec<String>,

        /// Corpus directory (overrides corpus.data_dir)
        #[arg(short, long, value_name = "DIR")]
        data_dir: Option<PathBuf>,

        /// Number of passages to retrieve before reranking
        #[arg(short = 'k', long)]
        top_k: Option<usize>,

        /// Number of passages kept after reranking
        #[arg(short, long)]
        rerank_top_k: Option<usize>,

        /// Print outcomes as JSON
        #[arg(long)]
        json: bool,

        /// Do not append outcomes to the query log
        #[arg(long)]
        no_log: bool,
    },

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show current configuration
    Show,

    /// Validate configuration file
    Validate {
        /// Path to config file (defaults to standard location)
        #[arg(short, long)]
        file: Option<PathBuf>,
    },

    /// Initialize default configuration
    Init {
        /// Force overwrite existing config
        #[arg(short, long)]
        force: bool,
    },
}

impl Cli {
    /// Parse CLI arguments from command line
    pub fn parse_args() -> Self {
        Self::parse()
    }
}
