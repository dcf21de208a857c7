//! CLI argument definitions using clap

use std::path::PathBuf;

use clap::builder::NonEmptyStringValueParser;
use clap::{ArgAction, Parser, Subcommand, ValueHint};

/// Sanitize a router boot configuration before first boot
#[derive(Parser, Debug)]
#[command(name = "bootscrub")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    /// Settings file (default: ~/.config/bootscrub/bootscrub.toml)
    #[arg(long, global = true, value_hint = ValueHint::FilePath)]
    pub settings: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Strip hw-id from the keep-interface and delete all other interfaces
    Sanitize {
        /// Boot configuration (default: settings config_path)
        #[arg(value_hint = ValueHint::FilePath)]
        file: Option<PathBuf>,
        /// Interface to keep
        #[arg(short, long, value_parser = NonEmptyStringValueParser::new())]
        keep: Option<String>,
        /// Print the result instead of writing it
        #[arg(short = 'n', long)]
        dry_run: bool,
        /// Copy the original to <file>.bak first
        #[arg(short, long, conflicts_with = "dry_run")]
        backup: bool,
    },

    /// Print the normalized document
    Show {
        /// Boot configuration (default: settings config_path)
        #[arg(value_hint = ValueHint::FilePath)]
        file: Option<PathBuf>,
    },

    /// Show the node hierarchy as a tree
    Tree {
        /// Start node, `/` or space separated (default: root)
        path: Option<String>,
        /// Boot configuration (default: settings config_path)
        #[arg(short, long, value_hint = ValueHint::FilePath)]
        file: Option<PathBuf>,
    },

    /// List child node names
    List {
        /// Node path, `/` or space separated
        path: String,
        /// Boot configuration (default: settings config_path)
        #[arg(short, long, value_hint = ValueHint::FilePath)]
        file: Option<PathBuf>,
    },

    /// Print leaf values
    Get {
        /// Leaf path, `/` or space separated
        path: String,
        /// Boot configuration (default: settings config_path)
        #[arg(short, long, value_hint = ValueHint::FilePath)]
        file: Option<PathBuf>,
    },

    /// Manage settings
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },

    /// Generate shell completions
    Completion {
        /// Shell type
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Show effective settings
    Show,

    /// Print settings template, or write it to the global location
    Init {
        /// Write to the global settings path instead of stdout
        #[arg(short, long)]
        write: bool,
    },

    /// Show settings paths
    Path,
}
