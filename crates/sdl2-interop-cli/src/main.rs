use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use sdl2_interop::Sdl;
use sdl2_interop_config::{ConfigLoader, InteropConfig};
use std::path::PathBuf;

mod commands;

use commands::subsystems::Subsystem;

/// Inspect the SDL2 library this machine would load.
///
/// The library is located through the configuration hierarchy
/// (~/.sdl2-interop/config.toml, sdl2-interop.toml, SDL2_INTEROP_*);
/// --library overrides all of it.
///
/// EXAMPLES:
///     sdl2-info info                       Version, platform, CPU and power
///     sdl2-info subsystems timer video     Start subsystems and list them
///     sdl2-info clipboard set "Test"       Replace the clipboard text
///     sdl2-info load assets/level.bin      Read a file through SDL
///
/// ENVIRONMENT VARIABLES:
///     SDL2_INTEROP_LIBRARY      Path of the SDL2 library
///     SDL2_INTEROP_MIN_VERSION  Oldest acceptable SDL2 version
///     SDL2_INTEROP_LOG          Log level (error, warn, info, debug, trace)
#[derive(Parser)]
#[command(name = "sdl2-info")]
#[command(version)]
#[command(propagate_version = true)]
struct Cli {
    /// Path of the SDL2 shared library
    #[arg(long, global = true)]
    library: Option<PathBuf>,

    /// Log library activity at debug level
    #[arg(long, short = 'v', global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show library version, platform, CPU and power information
    Info,

    /// Initialize subsystems and print what is running
    ///
    /// EXAMPLES:
    ///     sdl2-info subsystems timer
    ///     sdl2-info subsystems game-controller sensor
    Subsystems {
        /// Subsystems to start
        #[arg(value_enum, required = true)]
        flags: Vec<Subsystem>,
    },

    /// Read or replace the clipboard text
    Clipboard {
        #[command(subcommand)]
        action: ClipboardAction,
    },

    /// Read a whole file through SDL_LoadFile and print its size
    Load {
        /// File to read
        file: PathBuf,
    },
}

#[derive(Subcommand)]
enum ClipboardAction {
    /// Print the clipboard text
    Get,
    /// Replace the clipboard text
    Set {
        /// New clipboard text
        text: String,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = ConfigLoader::new()
        .load_from_directory(&std::env::current_dir()?)
        .context("Failed to load sdl2-interop configuration")?;
    if let Some(path) = &cli.library {
        config.set_library_path(path);
    }

    init_logging(&config, cli.verbose);
    let sdl = load(&config)?;

    match cli.command {
        Commands::Info => commands::info::run(&sdl)?,
        Commands::Subsystems { flags } => commands::subsystems::run(&sdl, &flags)?,
        Commands::Clipboard { action } => match action {
            ClipboardAction::Get => commands::clipboard::get(&sdl)?,
            ClipboardAction::Set { text } => commands::clipboard::set(&sdl, &text)?,
        },
        Commands::Load { file } => commands::load::run(&sdl, &file)?,
    }

    Ok(())
}

/// Flag beats configuration beats the `warn` default
fn init_logging(config: &InteropConfig, verbose: bool) {
    let level = if verbose {
        String::from("debug")
    } else {
        config.log_level().unwrap_or_else(|| String::from("warn"))
    };

    env_logger::Builder::new()
        .parse_filters(&level)
        .format_timestamp(None)
        .init();
}

fn load(config: &InteropConfig) -> Result<Sdl> {
    let sdl = Sdl::load_with_config(config).context("Failed to load SDL2")?;
    sdl.forward_log_output()
        .context("Failed to route SDL log output")?;
    log::debug!("Using {}", sdl.describe());
    Ok(sdl)
}
