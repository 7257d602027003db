//! Application orchestration and command routing.
//!
//! Handles command-line argument parsing and delegates to appropriate command handlers.

use crate::commands;
use crate::logging;
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::{generate, Shell};
use std::io;
use std::process;

/// A terminal capture pad for story prompts: record audio and sketch drawings
#[derive(Parser)]
#[command(name = "bedtime")]
#[command(version)]
#[command(about = "Record audio and sketch drawings, exported as base64")]
#[command(
    long_about = "A terminal capture pad for story prompts.\n\nRecord up to ten seconds of audio with a live countdown and level meter,\nor sketch a freehand drawing with the mouse. Both surfaces export their\nresult as base64 for piping into other tools.\n\nDEFAULT COMMAND:\n    If no command is specified, 'record' is used by default.\n    The output option (-o) can be used without explicitly saying 'record'.\n\nEXAMPLES:\n    # Record and pipe the base64 WAV to another command\n    $ bedtime | base64 -d > prompt.wav\n    $ bedtime record | base64 -d > prompt.wav\n\n    # Record and write the base64 payload to a file\n    $ bedtime -o prompt.b64\n\n    # Sketch a drawing, press Enter to export\n    $ bedtime draw -o sketch.b64\n\n    # Play back the last recording\n    $ bedtime replay\n\n    # Edit configuration file\n    $ bedtime config"
)]
#[command(
    after_help = "CONFIGURATION:\n    Config file:        ~/.config/bedtime/bedtime.toml\n    Logs:               ~/.local/state/bedtime/bedtime.log.*"
)]
struct Cli {
    /// Write the base64 payload to a file instead of stdout (record default command)
    #[arg(short, long, value_name = "FILE", global = true)]
    output: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Record audio with countdown and level meter (default)
    ///
    /// Press Space to start and stop, Escape/q to quit. Recordings stop
    /// automatically at the configured maximum duration. The finished
    /// recording is printed as base64 WAV to stdout for piping.
    #[command(visible_alias = "r")]
    Record {
        /// Write the base64 payload to a file instead of stdout
        #[arg(short, long, value_name = "FILE")]
        output: Option<String>,
    },

    /// Sketch a freehand drawing with the mouse
    ///
    /// Drag to draw, 'c' to clear, 's' to save a PNG, Enter to export
    /// the sketch as base64 PNG, Escape/q to quit.
    #[command(visible_alias = "d")]
    Draw {
        /// Write the base64 payload to a file instead of stdout
        #[arg(short, long, value_name = "FILE")]
        output: Option<String>,
    },

    /// Replay the last recording using the system audio player
    ///
    /// Plays back the preview WAV written by the most recent capture.
    #[command(visible_alias = "rp")]
    Replay,

    /// Open configuration file in your preferred editor
    ///
    /// Edit audio, canvas, and word field settings.
    /// Uses $EDITOR environment variable or falls back to nano/vi.
    #[command(visible_alias = "c")]
    Config,

    /// List available audio input devices
    ///
    /// Shows device IDs, names, and configurations to help configure
    /// the correct input device in bedtime.toml.
    #[command(name = "list-devices")]
    ListDevices,

    /// Show recent log entries from the application
    ///
    /// Display the last 50 lines of the most recent log file.
    /// Useful for troubleshooting issues.
    Logs,

    /// Generate shell completion script
    ///
    /// Generate completion script for your shell. Save the output to your
    /// shell's completion directory or source it directly.
    ///
    /// Examples:
    ///   bedtime completions bash > bedtime.bash
    ///   bedtime completions zsh > _bedtime
    ///   bedtime completions fish > bedtime.fish
    Completions {
        /// The shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// Runs the main application based on command-line arguments.
///
/// # Exit Codes
/// - 0: Success
/// - 1: General error
/// - 2: Usage error (invalid arguments)
///
/// # Errors
/// - If logging initialization fails
/// - If command execution fails (e.g., recording, drawing, playback)
pub async fn run() -> Result<(), anyhow::Error> {
    let cli = Cli::parse();

    // Handle commands that don't need logging or config setup
    match &cli.command {
        Some(Commands::Completions { shell }) => {
            generate(*shell, &mut Cli::command(), "bedtime", &mut io::stdout());
            return Ok(());
        }
        Some(Commands::ListDevices) => {
            return match commands::handle_list_devices() {
                Ok(()) => Ok(()),
                Err(e) => {
                    eprintln!("Error: {e}");
                    process::exit(1);
                }
            };
        }
        Some(Commands::Logs) => {
            return match commands::handle_logs() {
                Ok(()) => Ok(()),
                Err(e) => {
                    eprintln!("Error: {e}");
                    process::exit(1);
                }
            };
        }
        _ => {}
    }

    // Initialize logging for all other commands
    logging::init_logging()?;

    // Route to appropriate command handler
    match cli.command {
        None | Some(Commands::Record { .. }) => {
            // Default command is record
            // If both top-level and explicit record options are specified,
            // the explicit record command options take precedence
            let output = match cli.command {
                Some(Commands::Record { output }) => output,
                None => cli.output,
                _ => unreachable!(),
            };
            commands::handle_record(output).await?;
        }
        Some(Commands::Draw { output }) => {
            let output = output.or(cli.output);
            commands::handle_draw(output).await?;
        }
        Some(Commands::Replay) => {
            commands::handle_replay().await?;
        }
        Some(Commands::Config) => {
            commands::handle_config()?;
        }
        Some(Commands::Completions { .. }) | Some(Commands::ListDevices) | Some(Commands::Logs) => {
            unreachable!("These commands are handled earlier")
        }
    }

    Ok(())
}
