//! Command-line interface module for downtidy.
//!
//! Every operation follows the same flow:
//! 1. Locate the watched directory
//! 2. Snapshot what would change and print it
//! 3. Ask for the operation's confirmation word (unless `--yes`)
//! 4. Execute item by item with a progress bar
//! 5. Print the summary and any per-item failures
//!
//! Declining the prompt or passing `--dry-run` leaves the tree untouched.

use crate::cleaner::{self, CleanupReport};
use crate::config::Settings;
use crate::confirm::{AutoConfirm, Confirm, ConsoleConfirmer, PromptKind};
use crate::date_bucket::{DateOrganizer, DateReport, resolve_by_date};
use crate::file_category::{CategoryTable, DestinationResolver};
use crate::file_organizer::{FileOrganizer, OrganizeReport, OrganizeResult};
use crate::layout::RELOCATED_DIR;
use crate::output::{BarProgress, OutputFormatter, human_bytes};
use crate::protection::ProtectionSet;
use crate::pruner::{self, PruneReport};
use crate::report::{ItemFailure, MoveRecord, NoProgress, ProgressSink};
use anyhow::Context;
use clap::{Parser, Subcommand};
use serde::Serialize;
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};

/// Sort a downloads folder by category or date and clean up after it.
#[derive(Debug, Parser)]
#[command(name = "downtidy", version, about, long_about = None)]
pub struct Cli {
    /// Directory to organize (defaults to the configured or detected downloads folder)
    #[arg(short, long, global = true, value_hint = clap::ValueHint::DirPath)]
    pub dir: Option<PathBuf>,

    /// Path to a TOML settings file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Skip the confirmation prompt
    #[arg(short, long, global = true)]
    pub yes: bool,

    /// Show what would be done without modifying anything
    #[arg(long, global = true)]
    pub dry_run: bool,

    /// Print the final report as JSON
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Option<OrganizeCommand>,
}

/// Represents a CLI command to execute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Subcommand)]
pub enum OrganizeCommand {
    /// Move loose files into category folders and subfolders aside
    Organize,
    /// Move loose files into year/month folders
    ByDate,
    /// Delete empty and temporary files
    Clean,
    /// Delete empty folders the organizer does not own
    Prune,
    /// Interactive menu (the default)
    Menu,
}

/// One of the four batch operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Organize,
    OrganizeByDate,
    Clean,
    Prune,
}

impl OrganizeCommand {
    pub fn operation(self) -> Option<Operation> {
        match self {
            Self::Organize => Some(Operation::Organize),
            Self::ByDate => Some(Operation::OrganizeByDate),
            Self::Clean => Some(Operation::Clean),
            Self::Prune => Some(Operation::Prune),
            Self::Menu => None,
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct RunOptions {
    pub dry_run: bool,
    pub json: bool,
    pub show_progress: bool,
}

/// How an operation ended.
#[derive(Debug)]
pub enum Outcome<R> {
    Executed(R),
    /// The operator did not type the confirmation word.
    Cancelled,
    NothingToDo,
    DryRun,
}

/// Runs the parsed command line.
///
/// # Examples
///
/// ```no_run
/// use clap::Parser;
/// use downtidy::cli::{Cli, run_cli};
///
/// let cli = Cli::parse_from(["downtidy", "organize", "--dir", "/tmp/dl", "--yes"]);
/// if let Err(e) = run_cli(cli) {
///     eprintln!("Error: {:#}", e);
/// }
/// ```
pub fn run_cli(cli: Cli) -> anyhow::Result<()> {
    let settings =
        Settings::load(cli.config.as_deref()).context("Error loading configuration")?;
    let root = settings.discover_root(cli.dir.as_deref());
    tracing::debug!(root = %root.display(), "watched directory");

    let options = RunOptions {
        dry_run: cli.dry_run,
        json: cli.json,
        show_progress: !cli.json,
    };

    let mut confirm: Box<dyn Confirm> = if cli.yes {
        Box::new(AutoConfirm)
    } else {
        Box::new(ConsoleConfirmer::new(settings.tokens.clone()))
    };

    match cli.command.unwrap_or(OrganizeCommand::Menu).operation() {
        Some(operation) => {
            run_operation(operation, &root, &settings, confirm.as_mut(), options)?;
            Ok(())
        }
        None => run_menu(&root, &settings, confirm.as_mut(), options),
    }
}

/// Runs one operation, discarding the report after it has been printed.
pub fn run_operation(
    operation: Operation,
    root: &Path,
    settings: &Settings,
    confirm: &mut dyn Confirm,
    options: RunOptions,
) -> OrganizeResult<()> {
    match operation {
        Operation::Organize => organize_by_category(root, settings, confirm, options).map(drop),
        Operation::OrganizeByDate => organize_by_date(root, confirm, options).map(drop),
        Operation::Clean => clean_files(root, confirm, options).map(drop),
        Operation::Prune => remove_empty_folders(root, confirm, options).map(drop),
    }
}

/// The numbered menu loop. Errors of one operation are printed and the
/// menu is shown again.
pub fn run_menu(
    root: &Path,
    settings: &Settings,
    confirm: &mut dyn Confirm,
    options: RunOptions,
) -> anyhow::Result<()> {
    let stdin = io::stdin();

    loop {
        display_menu(root);
        print!("Enter your choice (1-5): ");
        io::stdout().flush()?;

        let mut choice = String::new();
        if stdin.lock().read_line(&mut choice)? == 0 {
            break;
        }

        let operation = match choice.trim() {
            "1" => Operation::Organize,
            "2" => Operation::Clean,
            "3" => Operation::Prune,
            "4" => Operation::OrganizeByDate,
            "5" => {
                OutputFormatter::plain("Leaving the organizer. Bye!");
                break;
            }
            _ => {
                OutputFormatter::warning("Invalid option. Please choose 1, 2, 3, 4 or 5.");
                continue;
            }
        };

        if let Err(e) = run_operation(operation, root, settings, confirm, options) {
            OutputFormatter::error(&e.to_string());
        }
    }

    Ok(())
}

fn display_menu(root: &Path) {
    let rule = "=".repeat(40);
    OutputFormatter::plain(&format!("\n{}", rule));
    OutputFormatter::header("      DOWNLOADS ORGANIZER");
    OutputFormatter::plain(&format!("      {}", root.display()));
    OutputFormatter::plain(&rule);
    OutputFormatter::plain("1. Organize files (by category)");
    OutputFormatter::plain("2. Clean files (empty/temporary)");
    OutputFormatter::plain("3. Remove empty folders");
    OutputFormatter::plain("4. Organize files (by date)");
    OutputFormatter::plain("5. Exit");
    OutputFormatter::plain(&rule);
}

/// Moves loose files into `Arquivos/` and subfolders into `Pastas_Organizadas/`.
pub fn organize_by_category(
    root: &Path,
    settings: &Settings,
    confirm: &mut dyn Confirm,
    options: RunOptions,
) -> OrganizeResult<Outcome<OrganizeReport>> {
    let organizer = FileOrganizer::new(
        DestinationResolver::new(CategoryTable::default()),
        settings.folder_collision,
    );

    OutputFormatter::info(&format!("Analyzing contents of: {}", root.display()));
    let plan = organizer.plan(root)?;
    print_scan_errors(&plan.errors);

    if plan.is_empty() {
        OutputFormatter::plain("No files or folders to organize.");
        return Ok(Outcome::NothingToDo);
    }

    if !plan.files.is_empty() {
        OutputFormatter::header("Files to organize by category:");
        for file in &plan.files {
            let destination = organizer.destination_for(root, &file.name);
            let leaf = destination
                .leaf_dir
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_default();
            OutputFormatter::plain(&format!(
                " - {} -> {} -> {}/{}/",
                file.name, destination.category, destination.category, leaf
            ));
        }
    }

    if !plan.folders.is_empty() {
        OutputFormatter::header(&format!("Folders to move to {}/:", RELOCATED_DIR));
        for folder in &plan.folders {
            OutputFormatter::plain(&format!(" - {}/", folder.name));
        }
    }

    if options.dry_run {
        OutputFormatter::dry_run_notice("No files were modified.");
        return Ok(Outcome::DryRun);
    }

    if !confirm.confirm(PromptKind::Organize) {
        OutputFormatter::cancelled("Organization by category");
        return Ok(Outcome::Cancelled);
    }

    let mut progress = progress_sink(options, plan.total());
    let report = organizer.execute(&plan, progress.as_mut());

    if options.json {
        print_json(&report);
    } else {
        print_renames(&report.moves);
        OutputFormatter::success(&format!(
            "Organization complete! {} of {} items processed.",
            report.processed, report.total
        ));
        if report.folders_moved > 0 {
            OutputFormatter::plain(&format!(
                "Folders moved to {}/: {}",
                RELOCATED_DIR, report.folders_moved
            ));
        }
        if report.moved_by_category.is_empty() {
            OutputFormatter::plain("No file was moved by category.");
        } else {
            OutputFormatter::summary_table("Category", &report.moved_by_category);
        }
        OutputFormatter::failures(&report.failures);
    }

    Ok(Outcome::Executed(report))
}

/// Moves loose files into `Organizado_Por_Data/<YYYY>/<MM - Month>/`.
pub fn organize_by_date(
    root: &Path,
    confirm: &mut dyn Confirm,
    options: RunOptions,
) -> OrganizeResult<Outcome<DateReport>> {
    OutputFormatter::info(&format!(
        "Analyzing files to organize by date in: {}",
        root.display()
    ));
    let plan = DateOrganizer::plan(root)?;
    print_scan_errors(&plan.errors);

    if plan.is_empty() {
        OutputFormatter::plain("No loose files to organize by date.");
        return Ok(Outcome::NothingToDo);
    }

    OutputFormatter::header("Files to organize by date:");
    for file in &plan.files {
        match resolve_by_date(&file.path) {
            Ok(bucket) => OutputFormatter::plain(&format!(" - {} -> {}/", file.name, bucket)),
            Err(_) => OutputFormatter::plain(&format!(" - {}", file.name)),
        }
    }

    if options.dry_run {
        OutputFormatter::dry_run_notice("No files were modified.");
        return Ok(Outcome::DryRun);
    }

    if !confirm.confirm(PromptKind::OrganizeByDate) {
        OutputFormatter::cancelled("Organization by date");
        return Ok(Outcome::Cancelled);
    }

    let mut progress = progress_sink(options, plan.files.len());
    let report = DateOrganizer::execute(&plan, progress.as_mut());

    if options.json {
        print_json(&report);
    } else {
        print_renames(&report.moves);
        OutputFormatter::success(&format!(
            "Organization by date complete! {} files moved.",
            report.files_moved()
        ));
        if report.moved_by_bucket.is_empty() {
            OutputFormatter::plain("No file was moved by date.");
        } else {
            OutputFormatter::summary_table("Month", &report.moved_by_bucket);
        }
        OutputFormatter::failures(&report.failures);
    }

    Ok(Outcome::Executed(report))
}

/// Deletes zero-byte and temporary files anywhere under the root.
pub fn clean_files(
    root: &Path,
    confirm: &mut dyn Confirm,
    options: RunOptions,
) -> OrganizeResult<Outcome<CleanupReport>> {
    OutputFormatter::info(&format!(
        "Analyzing files to clean in: {}",
        root.display()
    ));
    let scan = cleaner::scan(root)?;

    print_scan_errors(&scan.errors);

    if scan.candidates.is_empty() {
        OutputFormatter::plain("No empty or temporary files found.");
        return Ok(Outcome::NothingToDo);
    }

    OutputFormatter::header("Files to clean:");
    for (index, candidate) in scan.candidates.iter().enumerate() {
        OutputFormatter::plain(&format!(
            "{}. {} (reason: {}, size: {})",
            index + 1,
            relative(&candidate.path, root),
            candidate.reason,
            human_bytes(candidate.size)
        ));
    }
    OutputFormatter::plain(&format!(
        "\n{} files to remove, {} in total.",
        scan.candidates.len(),
        human_bytes(scan.total_bytes)
    ));

    if options.dry_run {
        OutputFormatter::dry_run_notice("No files were removed.");
        return Ok(Outcome::DryRun);
    }

    if !confirm.confirm(PromptKind::Clean) {
        OutputFormatter::cancelled("Cleanup");
        return Ok(Outcome::Cancelled);
    }

    let mut progress = progress_sink(options, scan.candidates.len());
    let report = cleaner::delete_all(&scan.candidates, progress.as_mut());

    if options.json {
        print_json(&report);
    } else {
        OutputFormatter::success(&format!(
            "Cleanup complete! {} files removed.",
            report.removed
        ));
        OutputFormatter::plain(&format!(
            "Space reclaimed: {}.",
            human_bytes(report.reclaimed_bytes)
        ));
        OutputFormatter::failures(&report.failures);
    }

    Ok(Outcome::Executed(report))
}

/// Deletes empty directories outside the organizer's own structure.
pub fn remove_empty_folders(
    root: &Path,
    confirm: &mut dyn Confirm,
    options: RunOptions,
) -> OrganizeResult<Outcome<PruneReport>> {
    OutputFormatter::info(&format!(
        "Analyzing empty folders in: {}",
        root.display()
    ));
    let protection = ProtectionSet::build(&CategoryTable::default(), root);
    let scan = pruner::scan(root, &protection)?;

    print_scan_errors(&scan.errors);

    if scan.candidates.is_empty() {
        OutputFormatter::plain("No empty folders to remove.");
        return Ok(Outcome::NothingToDo);
    }

    OutputFormatter::header("Empty folders to remove:");
    for (index, dir) in scan.candidates.iter().enumerate() {
        OutputFormatter::plain(&format!("{}. {}/", index + 1, relative(dir, root)));
    }

    if options.dry_run {
        OutputFormatter::dry_run_notice("No folders were removed.");
        return Ok(Outcome::DryRun);
    }

    if !confirm.confirm(PromptKind::Prune) {
        OutputFormatter::cancelled("Empty folder removal");
        return Ok(Outcome::Cancelled);
    }

    let mut progress = progress_sink(options, scan.candidates.len());
    let report = pruner::remove(&scan.candidates, progress.as_mut());

    if options.json {
        print_json(&report);
    } else {
        OutputFormatter::success(&format!(
            "Empty folder removal complete! {} folders removed.",
            report.removed.len()
        ));
        OutputFormatter::failures(&report.failures);
    }

    Ok(Outcome::Executed(report))
}

fn progress_sink(options: RunOptions, total: usize) -> Box<dyn ProgressSink> {
    if options.show_progress {
        Box::new(BarProgress::new(total))
    } else {
        Box::new(NoProgress)
    }
}

fn print_scan_errors(errors: &[ItemFailure]) {
    for error in errors {
        OutputFormatter::warning(&format!(
            "Could not analyze {}: {}",
            error.path.display(),
            error.reason
        ));
    }
}

fn print_renames(moves: &[MoveRecord]) {
    for record in moves.iter().filter(|record| record.renamed) {
        OutputFormatter::warning(&format!(
            "Conflict: '{}' renamed to '{}'",
            file_name(&record.from),
            file_name(&record.to)
        ));
    }
}

fn print_json<T: Serialize>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(json) => println!("{}", json),
        Err(e) => OutputFormatter::error(&format!("Could not serialize report: {}", e)),
    }
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default()
}

fn relative(path: &Path, root: &Path) -> String {
    path.strip_prefix(root)
        .unwrap_or(path)
        .display()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::confirm::Decline;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_cli_parses_global_flags_after_subcommand() {
        let cli = Cli::parse_from(["downtidy", "clean", "--dir", "/tmp/dl", "--yes", "--json"]);
        assert_eq!(cli.command, Some(OrganizeCommand::Clean));
        assert_eq!(cli.dir, Some(PathBuf::from("/tmp/dl")));
        assert!(cli.yes);
        assert!(cli.json);
        assert!(!cli.dry_run);
    }

    #[test]
    fn test_cli_defaults_to_menu() {
        let cli = Cli::parse_from(["downtidy"]);
        assert_eq!(cli.command, None);
        assert_eq!(OrganizeCommand::Menu.operation(), None);
        assert_eq!(
            OrganizeCommand::ByDate.operation(),
            Some(Operation::OrganizeByDate)
        );
    }

    #[test]
    fn test_declined_prompt_modifies_nothing() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let root = temp_dir.path();
        fs::write(root.join("a.jpg"), "a").expect("Failed to write file");

        let outcome = organize_by_category(
            root,
            &Settings::default(),
            &mut Decline,
            RunOptions::default(),
        )
        .expect("Organize failed");

        assert!(matches!(outcome, Outcome::Cancelled));
        assert!(root.join("a.jpg").exists());
        assert!(!root.join("Arquivos").exists());
    }

    #[test]
    fn test_relative_display() {
        assert_eq!(
            relative(Path::new("/dl/Arquivos/x.tmp"), Path::new("/dl")),
            "Arquivos/x.tmp"
        );
        assert_eq!(relative(Path::new("/other"), Path::new("/dl")), "/other");
    }
}
