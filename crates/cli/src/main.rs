mod commands;
mod interactive;
mod logging;
mod output;

use anyhow::Result;
use clap::{ArgGroup, Parser};
use commands::{OutputFormat, Session, Settings};
use date_renamer_core::{app_paths, load_config, TimestampMode};
use std::io;
use std::path::PathBuf;
use tracing::debug;

#[derive(Debug, Parser)]
#[command(name = "date-renamer", version)]
#[command(about = "Rename image files to the date they were modified or taken")]
#[command(group(
    ArgGroup::new("mode").args(["modified", "check", "rename_meta", "interactive", "undo"])
))]
struct Cli {
    /// Rename using the file modification date
    #[arg(short = 'm', long)]
    modified: bool,
    /// Report files whose name disagrees with their Date Taken
    #[arg(short = 'c', long)]
    check: bool,
    /// Rename using the EXIF Date Taken
    #[arg(short = 'r', long = "rename-meta")]
    rename_meta: bool,
    /// Open the interactive menu (default when no mode is given)
    #[arg(short = 'i', long)]
    interactive: bool,
    /// Revert the renames recorded in the operation log
    #[arg(short = 'u', long)]
    undo: bool,

    /// Show what would be renamed without touching any file
    #[arg(short = 'd', long = "dry-run")]
    dry_run: bool,
    /// Add _001, _002, ... suffixes instead of skipping on collisions
    #[arg(short = 's', long)]
    safe: bool,
    /// Write the operation log next to the images
    #[arg(short = 'l', long)]
    log: bool,
    /// Also report files that are already correctly named, and debug logs
    #[arg(short = 'v', long)]
    verbose: bool,
    /// Descend into subdirectories
    #[arg(short = 'R', long)]
    recursive: bool,

    #[arg(long, value_enum, default_value_t = OutputFormat::Table)]
    output: OutputFormat,
    /// Print the config file location and the effective settings
    #[arg(long = "show-config")]
    show_config: bool,

    /// Image file or folder
    #[arg(default_value = ".")]
    path: PathBuf,
}

impl Cli {
    fn flags(&self) -> Settings {
        Settings {
            dry_run: self.dry_run,
            safe: self.safe,
            log: self.log,
            verbose: self.verbose,
            recursive: self.recursive,
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = load_config()?;
    let settings = Settings::merged(&config, cli.flags());
    logging::init_tracing(settings.verbose)?;
    debug!(?settings, path = %cli.path.display(), "starting");

    if cli.show_config {
        return cmd_show_config(&settings.apply_to(&config));
    }

    let mut session = Session {
        target: cli.path.clone(),
        settings,
        config,
        format: cli.output,
    };

    if cli.modified {
        commands::rename(&session, TimestampMode::Modified)?;
    } else if cli.rename_meta {
        commands::rename(&session, TimestampMode::ExifDateTaken)?;
    } else if cli.check {
        commands::check(&session)?;
    } else if cli.undo {
        commands::undo(&session)?;
    } else {
        let stdin = io::stdin();
        interactive::run_menu(&mut session, &mut stdin.lock(), &mut io::stdout())?;
    }
    Ok(())
}

fn cmd_show_config(config: &date_renamer_core::AppConfig) -> Result<()> {
    let paths = app_paths()?;
    println!("Config file: {}", paths.config_path.display());
    println!("{}", toml::to_string_pretty(config)?);
    Ok(())
}
