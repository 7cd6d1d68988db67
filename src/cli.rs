//! CLI argument parsing using clap v4
//!
//! Defines the command-line interface for persona-switcher.

use clap::{Args, Parser, Subcommand};

/// Persona Switcher - switch between named instruction sets
///
/// Serves persona files to a host over stdio, and manages them from the
/// terminal with the same operations the host can call.
#[derive(Parser, Debug)]
#[command(name = "persona-switcher")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Increase logging verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Where to find configuration and personas
#[derive(Args, Debug, Clone, Default)]
pub struct StoreArgs {
    /// Path to configuration file
    #[arg(short, long, env = "PERSONA_SWITCHER_CONFIG")]
    pub config: Option<String>,

    /// Personas directory (overrides config and PERSONAS_DIR)
    #[arg(long)]
    pub personas_dir: Option<String>,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the stdio server a host connects to
    Serve {
        #[command(flatten)]
        store: StoreArgs,
    },

    /// List available personas
    List {
        #[command(flatten)]
        store: StoreArgs,

        /// Print the response as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show a persona's instructions
    Show {
        /// Persona name (filename without .md)
        name: String,

        #[command(flatten)]
        store: StoreArgs,

        /// Print the response as JSON
        #[arg(long)]
        json: bool,
    },

    /// Create a new persona
    Create {
        /// Persona name (lowercase letters, numbers and hyphens)
        name: String,

        /// Brief description (10-200 characters)
        #[arg(short, long)]
        description: String,

        /// Instructions text (minimum 20 characters)
        #[arg(short, long, required_unless_present = "instructions_file")]
        instructions: Option<String>,

        /// Read instructions from a file
        #[arg(long, conflicts_with = "instructions")]
        instructions_file: Option<String>,

        /// Author name
        #[arg(short, long)]
        author: Option<String>,

        #[command(flatten)]
        store: StoreArgs,

        /// Print the response as JSON
        #[arg(long)]
        json: bool,
    },

    /// Replace one field of a persona
    Edit {
        /// Persona name
        name: String,

        /// Field to update: description, instructions, author, version
        field: String,

        /// New value
        value: String,

        #[command(flatten)]
        store: StoreArgs,

        /// Print the response as JSON
        #[arg(long)]
        json: bool,
    },

    /// Delete a persona file
    Delete {
        /// Persona name
        name: String,

        /// Confirm deletion
        #[arg(short, long)]
        yes: bool,

        #[command(flatten)]
        store: StoreArgs,

        /// Print the response as JSON
        #[arg(long)]
        json: bool,
    },

    /// Display version and build information
    Version,

    /// Configuration management
    Config {
        #[command(subcommand)]
        subcommand: ConfigSubcommand,
    },
}

/// Configuration subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum ConfigSubcommand {
    /// Display the effective configuration
    Show {
        /// Path to configuration file
        #[arg(short, long, env = "PERSONA_SWITCHER_CONFIG")]
        config: Option<String>,
    },

    /// Initialize a new configuration file
    Init {
        /// Path where to create the config file
        #[arg(short, long)]
        path: Option<String>,

        /// Overwrite existing configuration
        #[arg(short, long)]
        force: bool,
    },

    /// Validate a configuration file
    Validate {
        /// Path to configuration file to validate
        #[arg(short, long, env = "PERSONA_SWITCHER_CONFIG")]
        config: Option<String>,
    },
}

impl Commands {
    /// Store location flags, for commands that touch personas
    pub fn store_args(&self) -> Option<&StoreArgs> {
        match self {
            Commands::Serve { store }
            | Commands::List { store, .. }
            | Commands::Show { store, .. }
            | Commands::Create { store, .. }
            | Commands::Edit { store, .. }
            | Commands::Delete { store, .. } => Some(store),
            Commands::Version | Commands::Config { .. } => None,
        }
    }
}
