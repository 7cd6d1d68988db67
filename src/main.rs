//! persona-switcher - serve and manage persona files
//!
//! `serve` runs the stdio server a host launches. The other commands run
//! the same persona operations once from a terminal.

mod cli;

use std::fs;
use std::sync::Arc;

use clap::Parser;
use serde::Serialize;
use tracing::{info, warn, Level};

use persona_switcher::config::{self, ServerConfig};
use persona_switcher::error::{Error, Result};
use persona_switcher::logging;
use persona_switcher::persona::PersonaStore;
use persona_switcher::server::handlers::{ActivateArgs, CreateArgs, DeleteArgs, EditArgs};
use persona_switcher::server::{self, McpServer, PersonaHandlers};
use persona_switcher::version;

use crate::cli::{Cli, Commands, ConfigSubcommand, StoreArgs};

fn main() {
    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        eprint!("{}", e.format_for_terminal());
        std::process::exit(e.exit_code());
    }
}

fn run(cli: Cli) -> Result<()> {
    // Commands that never touch the personas directory
    match &cli.command {
        Commands::Version => {
            version::print_version();
            return Ok(());
        }
        Commands::Config { subcommand } => {
            logging::init_simple(Level::WARN)?;
            return handle_config_command(subcommand.clone());
        }
        _ => {}
    }

    let store_args = cli.command.store_args().cloned().unwrap_or_default();
    let config = load_config(&store_args)?;

    if let Commands::Serve { .. } = cli.command {
        // Dropping the guards stops the file writer
        let _log_guards = logging::init_logging(&config.logging, cli.verbose, cli.quiet)?;
        return run_server(config);
    }

    logging::init_simple(cli_level(cli.verbose, cli.quiet))?;
    let handlers = PersonaHandlers::new(Arc::new(PersonaStore::from_config(&config)));

    match cli.command {
        Commands::List { json, .. } => {
            let response = handlers.list_personas()?;
            if json {
                return print_json(&response);
            }
            if response.personas.is_empty() {
                println!(
                    "No personas found in {}",
                    handlers.store().personas_dir().display()
                );
            }
            for p in &response.personas {
                println!("{:<24} {:<24} {}", p.slug, p.name, p.description);
            }
        }
        Commands::Show { name, json, .. } => {
            let response = handlers.activate_persona(&ActivateArgs { name })?;
            if json {
                return print_json(&response);
            }
            println!("{}", response.instructions);
        }
        Commands::Create {
            name,
            description,
            instructions,
            instructions_file,
            author,
            json,
            ..
        } => {
            let instructions = match (instructions, instructions_file) {
                (Some(text), _) => text,
                (None, Some(path)) => fs::read_to_string(&path).map_err(|e| Error::IoRead {
                    path: path.into(),
                    source: e,
                })?,
                (None, None) => String::new(),
            };
            let response = handlers.create_persona(&CreateArgs {
                name,
                description,
                instructions,
                author,
            })?;
            if json {
                return print_json(&response);
            }
            println!("{} ({})", response.message, response.file_path);
        }
        Commands::Edit {
            name,
            field,
            value,
            json,
            ..
        } => {
            let response = handlers.edit_persona(&EditArgs { name, field, value })?;
            if json {
                return print_json(&response);
            }
            println!("{}", response.message);
        }
        Commands::Delete { name, yes, json, .. } => {
            let response = handlers.delete_persona(&DeleteArgs { name, confirm: yes })?;
            if json {
                return print_json(&response);
            }
            println!("{}", response.message);
        }
        // Returned early above
        Commands::Serve { .. } | Commands::Version | Commands::Config { .. } => {}
    }

    Ok(())
}

/// Load configuration and apply the `--personas-dir` override
fn load_config(args: &StoreArgs) -> Result<ServerConfig> {
    let mut config = ServerConfig::load(args.config.as_deref())?;
    if let Some(ref dir) = args.personas_dir {
        config.storage.personas_dir = dir.clone();
        config.expand_paths();
        config.validate()?;
    }
    Ok(config)
}

/// Console level for one-shot commands: warnings unless asked for more
fn cli_level(verbose: u8, quiet: bool) -> Level {
    if quiet {
        return Level::ERROR;
    }
    match verbose {
        0 => Level::WARN,
        1 => Level::DEBUG,
        _ => Level::TRACE,
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Run the stdio server until the host disconnects
fn run_server(config: ServerConfig) -> Result<()> {
    let build = version::build_info();
    info!(
        version = %build.full_version(),
        target = %build.target,
        "Starting persona-switcher server"
    );
    info!(
        personas_dir = %config.storage.personas_dir,
        auto_reload = config.server.auto_reload,
        "Configuration loaded"
    );

    let store = Arc::new(PersonaStore::from_config(&config));
    match store.ensure_initialized() {
        Ok(true) => info!("Created example persona"),
        Ok(false) => {}
        Err(e) => warn!(error = %e.format_for_log(), "Could not initialize personas directory"),
    }

    match store.list() {
        Ok(personas) => info!(
            count = personas.len(),
            dir = %store.personas_dir().display(),
            "Loaded prompts"
        ),
        Err(e) => warn!(error = %e.format_for_log(), "Could not list personas"),
    }

    let mcp = McpServer::new(PersonaHandlers::new(store), &config.server);

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|e| Error::Internal(format!("Failed to create async runtime: {}", e)))?;

    runtime.block_on(server::run_stdio(mcp))
}

fn handle_config_command(subcommand: ConfigSubcommand) -> Result<()> {
    match subcommand {
        ConfigSubcommand::Show { config } => {
            let cfg = ServerConfig::load(config.as_deref())?;
            println!("{}", toml::to_string_pretty(&cfg)?);
        }
        ConfigSubcommand::Init { path, force } => {
            let written = config::init_config(path.as_deref(), force)?;
            println!("Configuration written to {}", written.display());
        }
        ConfigSubcommand::Validate { config } => {
            ServerConfig::load(config.as_deref())?;
            println!("Configuration is valid.");
        }
    }

    Ok(())
}
