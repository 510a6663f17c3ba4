// Rendering of game progress and results

use crate::store::GameMode;
use crate::traversal::{StepAction, StepReport, TraversalOutcome};
use colored::Colorize;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Write;
use std::path::Path;
use wikigame_scanner::result::{PageId, title_from_id};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReportFormat {
    Text,
    Json,
}

impl ReportFormat {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "text" => Some(ReportFormat::Text),
            "json" => Some(ReportFormat::Json),
            _ => None,
        }
    }
}

/// Everything worth reporting about one finished game.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunSummary {
    pub mode: GameMode,
    pub start: PageId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end: Option<PageId>,
    pub outcome: TraversalOutcome,
    pub path: Vec<PageId>,
    pub dead_ends: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_wins: Option<u64>,
}

impl RunSummary {
    pub fn steps(&self) -> usize {
        self.path.len().saturating_sub(1)
    }

    pub fn start_title(&self) -> String {
        match &self.outcome {
            TraversalOutcome::Won { start_title, .. }
            | TraversalOutcome::Impossible { start_title, .. }
            | TraversalOutcome::Abandoned { start_title, .. } => start_title.clone(),
            _ => title_from_id(&self.start),
        }
    }
}

/// One status line per step: `(Start: 3) Current page`.
pub fn format_step(report: &StepReport) -> String {
    let title = report
        .current_title
        .clone()
        .unwrap_or_else(|| title_from_id(&report.page));
    let prefix = format!("({}: {})", report.start_title, report.step_index);

    let detail = match &report.action {
        StepAction::Advanced { next, score } => match score {
            Some(score) => format!("-> {} (score {:.2})", title_from_id(next), score),
            None => format!("-> {}", title_from_id(next)),
        },
        StepAction::Backtracked { to, depth } => format!(
            "dead end, going back {} to {}",
            plural(*depth, "step"),
            title_from_id(to)
        )
        .yellow()
        .to_string(),
        StepAction::Arrived { target, .. } => {
            format!("-> {}", title_from_id(target)).green().bold().to_string()
        }
        StepAction::Stuck => "no way back".red().to_string(),
    };

    match &report.fetch_error {
        Some(error) => format!("{} {} [{}] {}", prefix.cyan(), title, error.red(), detail),
        None => format!("{} {} {}", prefix.cyan(), title, detail),
    }
}

/// One line verdict for a finished game.
pub fn format_outcome(outcome: &TraversalOutcome) -> String {
    match outcome {
        TraversalOutcome::Won { steps, start_title } => {
            format!("Found it! Took {} from {}", plural(*steps, "step"), start_title)
        }
        TraversalOutcome::Impossible {
            steps,
            start_title,
            reason,
        } => format!(
            "Can't step backwards anymore after {} from {}: {}",
            plural(*steps, "step"),
            start_title,
            reason
        ),
        TraversalOutcome::FetchFailed { page, error } => {
            format!("Could not fetch {}: {}", page, error)
        }
        TraversalOutcome::Abandoned { steps, start_title } => {
            format!("Gave up after {} from {}", plural(*steps, "step"), start_title)
        }
        TraversalOutcome::InProgress => "Still playing".to_string(),
    }
}

pub fn generate_text_report(summary: &RunSummary) -> String {
    let mut report = String::new();

    report.push_str("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━\n");
    report.push_str(&format!("Mode:       {}\n", summary.mode.as_str()));
    report.push_str(&format!("Start:      {}\n", summary.start_title()));
    if let Some(ref end) = summary.end {
        report.push_str(&format!("End:        {}\n", title_from_id(end)));
    }
    report.push_str(&format!("Outcome:    {}\n", summary.outcome.as_str()));
    report.push_str(&format!("Steps:      {}\n", summary.steps()));
    report.push_str(&format!("Dead ends:  {}\n", summary.dead_ends));
    if let Some(wins) = summary.total_wins {
        report.push_str(&format!("Total wins: {}\n", wins));
    }
    report.push('\n');
    report.push_str(&format_outcome(&summary.outcome));
    report.push_str("\n\nPath:\n");
    for (idx, page) in summary.path.iter().enumerate() {
        report.push_str(&format!("  {:>3}. {}\n", idx, title_from_id(page)));
    }

    report
}

pub fn generate_json_report(summary: &RunSummary) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(summary)
}

pub fn generate_report(summary: &RunSummary, format: ReportFormat) -> Result<String, serde_json::Error> {
    match format {
        ReportFormat::Text => Ok(generate_text_report(summary)),
        ReportFormat::Json => generate_json_report(summary),
    }
}

pub fn save_report(content: &str, path: &Path) -> std::io::Result<()> {
    let mut file = File::create(path)?;
    file.write_all(content.as_bytes())
}

fn plural(count: usize, word: &str) -> String {
    if count == 1 {
        format!("{} {}", count, word)
    } else {
        format!("{} {}s", count, word)
    }
}
