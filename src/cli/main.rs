use anyhow::{Context, Result};
use clap::Parser;
use std::io::Write;
use std::path::{Path, PathBuf};

use camerahub_tagger::api::ApiClient;
use camerahub_tagger::config::{Config, RunConfig};
use camerahub_tagger::exif::TagChange;
use camerahub_tagger::pipeline::{self, Outcome, Prompter};

#[derive(Parser, Debug)]
#[command(
    name = "camerahub-tagger",
    version,
    about = "Tag scanned film negatives with EXIF metadata from a CameraHub catalogue"
)]
struct Cli {
    /// Search for scans recursively
    #[arg(short, long)]
    recursive: bool,

    /// Don't prompt to identify scans, only guess based on filename
    #[arg(short, long)]
    auto: bool,

    /// Accept all changes without per-file confirmation
    #[arg(short, long)]
    yes: bool,

    /// Don't write any tags
    #[arg(short, long)]
    dry_run: bool,

    /// Image file to be tagged
    #[arg(short, long, value_name = "PATH")]
    file: Option<PathBuf>,

    /// CameraHub connection profile
    #[arg(short, long, default_value = "prod")]
    profile: String,

    /// Path to config file (default: camerahub.json in the home directory)
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Write a default config file and exit
    #[arg(long)]
    init: bool,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set up logging
    let log_level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level))
        .format_timestamp(None)
        .init();

    // Handle --init
    if cli.init {
        let config = Config::default();
        let path = cli.config.as_deref();
        config.save(path)?;
        let save_path = match path {
            Some(p) => p.to_path_buf(),
            None => Config::config_path()?,
        };
        println!("Default config written to {}", save_path.display());
        println!("Add your CameraHub credentials to the 'prod' profile before tagging.");
        return Ok(());
    }

    // Load config and resolve the profile. An unknown profile is fatal.
    let config = Config::load(cli.config.as_deref())?;
    let profile = config.profile(&cli.profile)?;

    let run = RunConfig {
        recursive: cli.recursive,
        auto: cli.auto,
        assume_yes: cli.yes,
        dry_run: cli.dry_run,
        file: cli.file.clone(),
        profile: cli.profile.clone(),
    };

    // Enumerate scans before touching the network, so a bad --file path
    // fails fast without a connection.
    let scans = pipeline::collect_scans(&run, Path::new("."))?;
    if scans.is_empty() {
        anyhow::bail!("No scan files found. Use --recursive to search subdirectories.");
    }

    log::info!("Found {} scan(s) to process", scans.len());
    if run.dry_run {
        log::info!("DRY RUN — no files will be modified");
    }

    let api = ApiClient::new(&profile.server, &profile.username, &profile.password)?;
    api.test_credentials()
        .await
        .with_context(|| format!("Credential check against {} failed", profile.api_base()))?;
    log::debug!("Credentials accepted by {}", profile.api_base());

    let mut prompter = StdinPrompter;
    let mut results = Vec::new();
    let total = scans.len();

    for (i, path) in scans.iter().enumerate() {
        log::info!("[{}/{}] Processing: {}", i + 1, total, path.display());

        let report = pipeline::process_scan(path, &api, &run, &mut prompter).await;

        match report.outcome {
            Outcome::Written => {
                log::info!("  Wrote {} tag(s)", report.changes.len());
            }
            Outcome::UpToDate => {
                log::info!("  Already up to date");
            }
            Outcome::Unmatched => {
                log::info!("  Unmatched, skipped");
            }
            Outcome::Declined => {
                log::info!("  Skipped at your request");
            }
            Outcome::Preview => {
                print_changes(path, &report.changes);
            }
            Outcome::Failed => {
                if let Some(ref err) = report.error {
                    log::error!("  Error: {err}");
                }
            }
        }

        results.push(report);
    }

    log::info!("{}", summary(&results, run.dry_run));

    Ok(())
}

fn count(results: &[pipeline::ScanReport], outcome: Outcome) -> usize {
    results.iter().filter(|r| r.outcome == outcome).count()
}

/// One line accounting for every processed file.
fn summary(results: &[pipeline::ScanReport], dry_run: bool) -> String {
    let total = results.len();
    let up_to_date = count(results, Outcome::UpToDate);
    let unmatched = count(results, Outcome::Unmatched);
    let failed = count(results, Outcome::Failed);
    if dry_run {
        let previewed = count(results, Outcome::Preview);
        format!(
            "Done: {previewed} of {total} scan(s) would change \
             ({up_to_date} up to date, {unmatched} unmatched, {failed} failed)"
        )
    } else {
        let written = count(results, Outcome::Written);
        let declined = count(results, Outcome::Declined);
        format!(
            "Done: {written} tagged, {up_to_date} up to date, {unmatched} unmatched, \
             {declined} declined, {failed} failed out of {total} scan(s)"
        )
    }
}

// ANSI color codes
const GREEN: &str = "\x1b[32m";
const DIM: &str = "\x1b[2m";
const RESET: &str = "\x1b[0m";
const BOLD: &str = "\x1b[1m";

/// Print the pending tag changes for a file as a table.
fn print_changes(path: &Path, changes: &[TagChange]) {
    println!();
    println!("  {BOLD}{}{RESET}", path.display());
    println!("  {DIM}{}{RESET}", "─".repeat(72));
    for change in changes {
        let tag_col = format!("{:<22}", change.tag);
        match change.old {
            Some(ref old) => {
                println!("  {tag_col} : {DIM}{old}{RESET} -> {GREEN}{}{RESET}", change.new);
            }
            None => {
                println!("  {tag_col} : {GREEN}{}{RESET}", change.new);
            }
        }
    }
    println!("  {DIM}{}{RESET}", "─".repeat(72));
}

/// Interactive prompter over stdin/stdout.
struct StdinPrompter;

impl StdinPrompter {
    fn read_line(&self) -> Result<String> {
        let mut line = String::new();
        std::io::stdin()
            .read_line(&mut line)
            .context("Failed to read input")?;
        Ok(line.trim().to_string())
    }

    fn yes_or_no(&self, question: &str) -> Result<bool> {
        loop {
            print!("{question} (y/n): ");
            std::io::stdout().flush().ok();
            let answer = self.read_line()?.to_lowercase();
            match answer.as_str() {
                "y" | "yes" => return Ok(true),
                "n" | "no" => return Ok(false),
                _ => println!("Input yes or no"),
            }
        }
    }
}

impl Prompter for StdinPrompter {
    fn confirm(&mut self, question: &str) -> Result<bool> {
        self.yes_or_no(question)
    }

    fn ask(&mut self, question: &str) -> Result<String> {
        print!("{question}: ");
        std::io::stdout().flush().ok();
        self.read_line()
    }

    fn choose(&mut self, question: &str, options: &[String]) -> Result<Option<usize>> {
        println!("{question}:");
        for (i, option) in options.iter().enumerate() {
            println!("  {}. {option}", i + 1);
        }
        loop {
            print!("Enter a number, or press Enter to skip: ");
            std::io::stdout().flush().ok();
            let answer = self.read_line()?;
            if answer.is_empty() {
                return Ok(None);
            }
            match answer.parse::<usize>() {
                Ok(n) if n >= 1 && n <= options.len() => return Ok(Some(n - 1)),
                _ => println!("Enter a number between 1 and {}", options.len()),
            }
        }
    }

    fn review(&mut self, path: &Path, changes: &[TagChange]) -> Result<bool> {
        print_changes(path, changes);
        self.yes_or_no("Write this metadata to the file?")
    }
}
