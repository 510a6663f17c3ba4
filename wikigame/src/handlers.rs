use anyhow::{Context, bail};
use clap::ArgMatches;
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::warn;
use tracing_subscriber::EnvFilter;
use wikigame_core::game::{
    PhilosophyOptions, RaceOptions, StepCallback, play_philosophy, play_race, record_summary,
};
use wikigame_core::report::{
    ReportFormat, RunSummary, format_outcome, format_step, generate_report, save_report,
};
use wikigame_core::semantic::{Aggregation, SemanticConfig, WordStrategy};
use wikigame_core::store::Stats;
use wikigame_core::traversal::{MatchCase, StepReport, TerminationMode};
use wikigame_core::LexiconOracle;
use wikigame_scanner::result::{PageId, WIKI_PREFIX};
use wikigame_scanner::WikiFetcher;

pub const DATABASE_FILE: &str = "wikigame.db";

/// Settings shared by every subcommand
#[derive(Debug, Clone)]
pub struct GlobalOptions {
    pub quiet: bool,
    pub verbose: bool,
    pub db: PathBuf,
    pub base_url: String,
    pub timeout: u64,
}

impl GlobalOptions {
    pub fn from_matches(matches: &ArgMatches) -> Self {
        Self {
            quiet: matches.get_flag("quiet"),
            verbose: matches.get_flag("verbose"),
            db: resolve_db_path(
                matches
                    .get_one::<String>("db")
                    .map(String::as_str)
                    .unwrap_or("~/.config/wikigame/wikigame.db"),
            ),
            base_url: matches
                .get_one::<String>("base-url")
                .cloned()
                .unwrap_or_else(|| wikigame_scanner::fetcher::DEFAULT_BASE_URL.to_string()),
            timeout: matches.get_one::<u64>("timeout").copied().unwrap_or(10),
        }
    }

    fn fetcher(&self) -> anyhow::Result<WikiFetcher> {
        WikiFetcher::with_timeout(&self.base_url, self.timeout)
            .with_context(|| format!("Invalid wiki base URL {}", self.base_url))
    }
}

// Helper functions for game handlers

/// Install the tracing subscriber. `RUST_LOG` wins over `--verbose`.
pub fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init();
}

/// Turn a page argument into a page id.
///
/// Accepts `Ginza`, `/wiki/Ginza`, `Shopping district` and full article URLs.
pub fn parse_page_arg(arg: &str) -> PageId {
    let arg = arg.trim();
    if let Some(index) = arg.find(WIKI_PREFIX) {
        return arg[index..].replace(' ', "_");
    }
    format!("{}{}", WIKI_PREFIX, arg.replace(' ', "_"))
}

pub fn parse_aggregation(method: &str, floor: f64) -> Option<Aggregation> {
    match method.to_lowercase().as_str() {
        "max" => Some(Aggregation::Max),
        "mean" => Some(Aggregation::ThresholdMean { floor }),
        _ => None,
    }
}

pub fn parse_word_strategy(strategy: &str) -> Option<WordStrategy> {
    match strategy.to_lowercase().as_str() {
        "pooled" => Some(WordStrategy::Pooled),
        "first" => Some(WordStrategy::FirstWithSenses),
        _ => None,
    }
}

pub fn resolve_db_path(path: &str) -> PathBuf {
    PathBuf::from(shellexpand::tilde(path).as_ref())
}

/// Open the statistics database, creating it and its directory when missing.
pub fn open_stats(path: &Path) -> anyhow::Result<Stats> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    Stats::open(path).with_context(|| format!("Failed to open database {}", path.display()))
}

/// Build race options from the `race` subcommand's arguments.
pub fn race_options_from_args(args: &ArgMatches) -> anyhow::Result<RaceOptions> {
    let random = args.get_flag("random");
    let floor = args.get_one::<f64>("floor").copied().unwrap_or_default();
    if !(0.0..=1.0).contains(&floor) {
        bail!("--floor must be between 0 and 1, got {}", floor);
    }

    let method = args.get_one::<String>("aggregate").map(String::as_str).unwrap_or("mean");
    let aggregation = parse_aggregation(method, floor)
        .with_context(|| format!("Unknown aggregation method: {}", method))?;
    let words = args.get_one::<String>("words").map(String::as_str).unwrap_or("pooled");
    let words = parse_word_strategy(words)
        .with_context(|| format!("Unknown word strategy: {}", words))?;

    let page = |name: &str| -> Option<PageId> {
        if random {
            None
        } else {
            args.get_one::<String>(name).map(|p| parse_page_arg(p))
        }
    };

    Ok(RaceOptions {
        start: page("start"),
        end: page("end"),
        semantic: SemanticConfig {
            aggregation,
            words,
            no_nouns: args.get_flag("no-nouns"),
        },
        termination: if args.get_flag("lenient") {
            TerminationMode::Lenient
        } else {
            TerminationMode::Strict
        },
        case: if args.get_flag("case-sensitive") {
            MatchCase::Sensitive
        } else {
            MatchCase::Insensitive
        },
        max_steps: args.get_one::<usize>("max-steps").copied(),
    })
}

fn print_divider() {
    println!("{}", "═".repeat(60).bright_blue().bold());
}

fn print_prompt(msg: &str) -> io::Result<String> {
    print!("{} ", msg.bright_cyan().bold());
    io::stdout().flush()?;
    let mut response = String::new();
    io::stdin().read_line(&mut response)?;
    Ok(response.trim().to_lowercase())
}

fn step_spinner(quiet: bool) -> ProgressBar {
    if quiet {
        return ProgressBar::hidden();
    }
    let spinner = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.cyan} {msg}") {
        spinner.set_style(style);
    }
    spinner.enable_steady_tick(Duration::from_millis(100));
    spinner
}

fn step_printer(spinner: &ProgressBar) -> StepCallback {
    let spinner = spinner.clone();
    Arc::new(move |report: &StepReport| {
        spinner.println(format_step(report));
        spinner.set_message(format!("step {}", report.step_index + 1));
    })
}

fn print_outcome(summary: &RunSummary) {
    let line = format_outcome(&summary.outcome);
    if summary.outcome.is_won() {
        println!("{} {}", "✓".green().bold(), line.green());
    } else {
        println!("{} {}", "✗".red().bold(), line.yellow());
    }
}

pub fn handle_init(args: &ArgMatches) -> anyhow::Result<()> {
    print_divider();
    println!("{}", "  WIKIGAME INITIALIZATION".bright_white().bold());
    print_divider();
    println!();

    let config_dir = args
        .get_one::<String>("PATH")
        .map(String::as_str)
        .unwrap_or("~/.config/wikigame/");
    let force = args.get_flag("force");
    let config_dir = resolve_db_path(config_dir);
    let db_path = config_dir.join(DATABASE_FILE);

    println!(
        "{} Target: {}",
        "→".blue(),
        config_dir.display().to_string().bright_white()
    );
    println!();

    if Stats::exists(&db_path) {
        let overwrite = if force {
            true
        } else {
            println!("{}", "⚠ WARNING".yellow().bold());
            println!("Database already exists at:");
            println!(
                "  {} {}",
                "•".yellow(),
                db_path.display().to_string().bright_white()
            );
            println!("{}", "Overwriting it resets the win counter.".yellow());
            println!();

            let response = print_prompt("Would you like to overwrite it? [y/N]:")?;
            println!();
            response == "y" || response == "yes"
        };

        if !overwrite {
            println!("{} Keeping existing database", "→".blue());
            return Ok(());
        }

        Stats::drop(&db_path)
            .with_context(|| format!("Failed to remove {}", db_path.display()))?;
        println!("{} Existing database removed", "✓".green().bold());
    }

    println!("{} Creating database...", "→".blue());
    let stats = open_stats(&db_path)?;
    let wins = stats.wins()?;

    println!();
    print_divider();
    println!("{}", "  INITIALIZATION COMPLETE".green().bold());
    print_divider();
    println!(
        "{} Database: {}",
        "✓".green().bold(),
        db_path.display().to_string().bright_white()
    );
    println!("{} Wins so far: {}", "✓".green().bold(), wins.to_string().cyan());
    println!();

    Ok(())
}

pub async fn handle_philosophy(global: &GlobalOptions, args: &ArgMatches) -> anyhow::Result<()> {
    let fetcher = global.fetcher()?;
    let mut stats = open_stats(&global.db)?;

    let forever = args.get_flag("forever");
    let games = args.get_one::<usize>("games").copied().unwrap_or(1);
    let options = PhilosophyOptions {
        start: args.get_one::<String>("start").map(|p| parse_page_arg(p)),
        marker: args
            .get_one::<String>("marker")
            .cloned()
            .unwrap_or_else(|| PhilosophyOptions::default().marker),
        max_steps: args.get_one::<usize>("max-steps").copied(),
    };

    let mut played = 0usize;
    while forever || played < games {
        played += 1;
        if !global.quiet {
            print_divider();
            println!("{}", format!("  GAME {}", played).bright_white().bold());
            print_divider();
        }

        let spinner = step_spinner(global.quiet);
        let callback = step_printer(&spinner);
        let result = play_philosophy(&fetcher, &options, Some(&callback)).await;
        spinner.finish_and_clear();

        let mut summary = match result {
            Ok(summary) => summary,
            Err(e) if forever => {
                warn!("Skipping game {}: {}", played, e);
                continue;
            }
            Err(e) => return Err(e.into()),
        };

        let wins = record_summary(&mut stats, &mut summary)?;
        print_outcome(&summary);
        if summary.outcome.is_won() {
            println!("{} Total wins: {}", "★".yellow().bold(), wins.to_string().cyan());
        }
        if !global.quiet {
            println!();
        }
    }

    Ok(())
}

pub async fn handle_race(global: &GlobalOptions, args: &ArgMatches) -> anyhow::Result<()> {
    let options = race_options_from_args(args)?;
    let format = args
        .get_one::<String>("format")
        .and_then(|f| ReportFormat::from_str(f))
        .unwrap_or(ReportFormat::Text);
    let output = args.get_one::<PathBuf>("output");

    let Some(lexicon_path) = args.get_one::<PathBuf>("lexicon") else {
        bail!("--lexicon is required");
    };
    let oracle = LexiconOracle::load(lexicon_path)?;
    let fetcher = global.fetcher()?;
    let mut stats = open_stats(&global.db)?;

    if !global.quiet {
        println!(
            "{} Loaded {} senses from {}",
            "✓".green().bold(),
            oracle.sense_count().to_string().cyan(),
            lexicon_path.display().to_string().bright_white()
        );
    }

    let spinner = step_spinner(global.quiet);
    let callback = step_printer(&spinner);
    let result = play_race(&fetcher, &oracle, &options, Some(&callback)).await;
    spinner.finish_and_clear();

    let mut summary = result?;
    record_summary(&mut stats, &mut summary)?;
    print_outcome(&summary);

    let report = generate_report(&summary, format)?;
    match output {
        Some(path) => {
            save_report(&report, path)
                .with_context(|| format!("Failed to write report to {}", path.display()))?;
            println!(
                "{} Report saved to {}",
                "✓".green().bold(),
                path.display().to_string().bright_white()
            );
        }
        None if !global.quiet || format == ReportFormat::Json => {
            println!();
            print!("{}", report);
            if !report.ends_with('\n') {
                println!();
            }
        }
        None => {}
    }

    Ok(())
}

pub fn handle_stats(global: &GlobalOptions, args: &ArgMatches) -> anyhow::Result<()> {
    if !Stats::exists(&global.db) {
        println!(
            "{} No games played yet. Database not found at {}",
            "ℹ".blue(),
            global.db.display().to_string().bright_white()
        );
        return Ok(());
    }

    let stats = open_stats(&global.db)?;
    let limit = args.get_one::<usize>("limit").copied().unwrap_or(10);

    print_divider();
    println!("{}", "  STATISTICS".bright_white().bold());
    print_divider();
    println!("{} Wins:  {}", "★".yellow().bold(), stats.wins()?.to_string().cyan());
    println!(
        "{} Games: {}",
        "→".blue(),
        stats.game_count()?.to_string().cyan()
    );

    let games = stats.recent_games(limit)?;
    if games.is_empty() {
        return Ok(());
    }

    println!();
    println!("{}", "RECENT GAMES".bright_blue().bold());
    for game in games {
        let when = chrono::DateTime::from_timestamp(game.finished_at, 0)
            .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
            .unwrap_or_default();
        let outcome = if game.is_win() {
            game.outcome.green()
        } else {
            game.outcome.yellow()
        };
        let route = match &game.end {
            Some(end) => format!("{} → {}", game.start, end),
            None => game.start.clone(),
        };
        println!(
            "  {} {:<10} {:<11} {:>4} steps  {}",
            when.bright_black(),
            game.mode.as_str(),
            outcome,
            game.steps,
            route
        );
    }

    Ok(())
}
