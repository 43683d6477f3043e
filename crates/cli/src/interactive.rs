//! Numbered menu used when no mode flag is given.
//!
//! Input and output are generic so the loop can be driven from tests. The
//! rename and check commands still print their reports to stdout.

use crate::commands::{self, Session};
use crate::output as out;
use anyhow::Result;
use date_renamer_core::{save_config, TimestampMode};
use std::io::{BufRead, Write};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MainChoice {
    RenameModified,
    Check,
    RenameDateTaken,
    Settings,
    Exit,
}

impl MainChoice {
    fn parse(input: &str) -> Option<Self> {
        match input.trim() {
            "1" => Some(Self::RenameModified),
            "2" => Some(Self::Check),
            "3" => Some(Self::RenameDateTaken),
            "4" => Some(Self::Settings),
            "5" | "q" => Some(Self::Exit),
            _ => None,
        }
    }
}

/// Reads one trimmed line after printing `text`. `None` on end of input.
fn prompt<R: BufRead, W: Write>(
    input: &mut R,
    output: &mut W,
    text: &str,
) -> Result<Option<String>> {
    write!(output, "{text}")?;
    output.flush()?;
    let mut line = String::new();
    if input.read_line(&mut line)? == 0 {
        return Ok(None);
    }
    Ok(Some(line.trim().to_string()))
}

fn print_main_menu<W: Write>(session: &Session, output: &mut W) -> Result<()> {
    let s = session.settings;
    writeln!(output)?;
    writeln!(output, "{}", out::heading("Date Renamer"))?;
    writeln!(output, "Folder: {}", session.target.display())?;
    writeln!(
        output,
        "Dry-run: {}  Safe: {}  Log: {}  Verbose: {}",
        out::flag(s.dry_run),
        out::flag(s.safe),
        out::flag(s.log),
        out::flag(s.verbose)
    )?;
    writeln!(output, "  1) Rename by modified date")?;
    writeln!(output, "  2) Check filename/Date Taken mismatches")?;
    writeln!(output, "  3) Rename by Date Taken")?;
    writeln!(output, "  4) Settings")?;
    writeln!(output, "  5) Exit")?;
    Ok(())
}

pub fn run_menu<R: BufRead, W: Write>(
    session: &mut Session,
    input: &mut R,
    output: &mut W,
) -> Result<()> {
    loop {
        print_main_menu(session, output)?;
        let Some(line) = prompt(input, output, "Select an option: ")? else {
            return Ok(());
        };

        let result = match MainChoice::parse(&line) {
            Some(MainChoice::RenameModified) => {
                commands::rename(session, TimestampMode::Modified).map(|_| ())
            }
            Some(MainChoice::Check) => commands::check(session),
            Some(MainChoice::RenameDateTaken) => {
                commands::rename(session, TimestampMode::ExifDateTaken).map(|_| ())
            }
            Some(MainChoice::Settings) => {
                if !settings_menu(session, input, output)? {
                    return Ok(());
                }
                Ok(())
            }
            Some(MainChoice::Exit) => return Ok(()),
            None => {
                writeln!(output, "Invalid choice: {line}")?;
                Ok(())
            }
        };

        // A failed run returns to the menu.
        if let Err(err) = result {
            out::print_error(&format!("{err:#}"));
        }
    }
}

/// Returns `false` when input ended inside the submenu.
fn settings_menu<R: BufRead, W: Write>(
    session: &mut Session,
    input: &mut R,
    output: &mut W,
) -> Result<bool> {
    loop {
        let s = session.settings;
        writeln!(output)?;
        writeln!(output, "{}", out::heading("Settings"))?;
        writeln!(output, "  1) Dry-run: {}", out::flag(s.dry_run))?;
        writeln!(output, "  2) Safe mode: {}", out::flag(s.safe))?;
        writeln!(output, "  3) Logging: {}", out::flag(s.log))?;
        writeln!(output, "  4) Verbose: {}", out::flag(s.verbose))?;
        writeln!(output, "  5) Save as defaults")?;
        writeln!(output, "  6) Back")?;

        let Some(line) = prompt(input, output, "Select an option: ")? else {
            return Ok(false);
        };
        match line.as_str() {
            "1" => session.settings.dry_run = !s.dry_run,
            "2" => session.settings.safe = !s.safe,
            "3" => session.settings.log = !s.log,
            "4" => session.settings.verbose = !s.verbose,
            "5" => {
                let config = session.settings.apply_to(&session.config);
                match save_config(&config) {
                    Ok(path) => {
                        writeln!(output, "Saved defaults to {}", path.display())?;
                        session.config = config;
                    }
                    Err(err) => out::print_error(&format!("{err:#}")),
                }
            }
            "6" | "b" => return Ok(true),
            other => writeln!(output, "Invalid choice: {other}")?,
        }
    }
}
