use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use stateguard::cli::{
    handle_backup_command, handle_check_command, handle_health_command, handle_init_command,
    handle_migrate_command, handle_upgrade_command, handle_version_command, BackupCommands,
    MigrateCommands, VersionCommands,
};
use stateguard::config::{ProjectPaths, Settings};

#[derive(Parser)]
#[command(
    name = "stateguard",
    version,
    about = "Keeps project state safe across tool upgrades",
    long_about = "stateguard checks whether a project's stored state is compatible \
                  with the running tool version, migrates it behind a backup when \
                  it is not, and verifies the result."
)]
struct Cli {
    /// Project directory (defaults to the current directory)
    #[arg(short, long, global = true, env = "STATEGUARD_PROJECT_DIR")]
    project: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize a new project
    Init,

    /// Check whether the stored state is compatible with this version
    Check {
        /// Print the result as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show or set the project's version marker
    #[command(subcommand)]
    Version(VersionCommands),

    /// Backup management commands
    #[command(subcommand)]
    Backup(BackupCommands),

    /// Schema migration commands
    #[command(subcommand)]
    Migrate(MigrateCommands),

    /// Run the post-update health checks
    Health,

    /// Check, back up, migrate and verify the project in one step
    Upgrade,
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "info" } else { "warn" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)))
        .init();
}

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    // Initialize paths and settings
    let paths = match cli.project {
        Some(dir) => ProjectPaths::with_project_dir(dir),
        None => ProjectPaths::new()?,
    };
    let settings = Settings::load_or_default(&paths)?;

    let ok = match cli.command {
        Some(Commands::Init) => {
            handle_init_command(&paths, &settings)?;
            true
        }
        Some(Commands::Check { json }) => handle_check_command(&paths, &settings, json)?,
        Some(Commands::Version(cmd)) => {
            handle_version_command(&paths, &settings, cmd)?;
            true
        }
        Some(Commands::Backup(cmd)) => {
            handle_backup_command(&paths, &settings, cmd, cli.verbose)?;
            true
        }
        Some(Commands::Migrate(cmd)) => {
            handle_migrate_command(&paths, &settings, cmd)?;
            true
        }
        Some(Commands::Health) => handle_health_command(&paths, &settings, cli.verbose)?,
        Some(Commands::Upgrade) => handle_upgrade_command(&paths, &settings, cli.verbose)?,
        None => {
            println!("stateguard - project state compatibility, backup and migration");
            println!();
            println!("Run 'stateguard --help' for usage information.");
            println!("Run 'stateguard check' to inspect the current project.");
            true
        }
    };

    Ok(if ok { ExitCode::SUCCESS } else { ExitCode::FAILURE })
}
