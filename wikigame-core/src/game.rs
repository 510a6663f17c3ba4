use crate::report::RunSummary;
use crate::scorer::FirstLinkScorer;
use crate::semantic::{ScorerError, SemanticConfig, SemanticScorer, SimilarityOracle, WordStrategy, collect_senses};
use crate::store::{GameMode, GameRecord, Stats};
use crate::traversal::{
    MatchCase, StepReport, TargetPredicate, TerminationMode, TraversalConfig, TraversalSession,
};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info};
use wikigame_scanner::error::FetchError;
use wikigame_scanner::fetcher::PageFetcher;
use wikigame_scanner::result::PageId;

/// Attempts at drawing a random page that has usable senses.
pub const RANDOM_PAGE_ATTEMPTS: usize = 25;

/// Callback for reporting each step as it is played
pub type StepCallback = Arc<dyn Fn(&StepReport) + Send + Sync>;

#[derive(Error, Debug)]
pub enum GameError {
    #[error("Could not pick a page: {0}")]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Scorer(#[from] ScorerError),

    #[error("No random page with usable senses after {0} attempts")]
    NoRandomPage(usize),
}

/// Options for the classic "first link until Philosophy" game
#[derive(Debug, Clone)]
pub struct PhilosophyOptions {
    /// Random article when `None`.
    pub start: Option<PageId>,
    pub marker: String,
    pub max_steps: Option<usize>,
}

impl Default for PhilosophyOptions {
    fn default() -> Self {
        Self {
            start: None,
            marker: "/wiki/Philosophy".to_string(),
            max_steps: None,
        }
    }
}

/// Options for racing from a start page to an arbitrary end page
#[derive(Debug, Clone, Default)]
pub struct RaceOptions {
    /// Random article when `None`.
    pub start: Option<PageId>,
    /// Random article when `None`.
    pub end: Option<PageId>,
    pub semantic: SemanticConfig,
    pub termination: TerminationMode,
    pub case: MatchCase,
    pub max_steps: Option<usize>,
}

/// Play one game of "getting to Philosophy".
pub async fn play_philosophy<F: PageFetcher>(
    fetcher: &F,
    options: &PhilosophyOptions,
    on_step: Option<&StepCallback>,
) -> Result<RunSummary, GameError> {
    let start = match &options.start {
        Some(start) => start.clone(),
        None => fetcher.random_page().await?,
    };
    info!("Starting philosophy game from {}", start);

    let config = TraversalConfig::new(TargetPredicate::Contains(options.marker.clone()))
        .with_max_steps(options.max_steps);
    let mut session = TraversalSession::new(fetcher, &FirstLinkScorer, config, start.clone());
    let outcome = session
        .run_with(|report| {
            if let Some(callback) = on_step {
                callback(report);
            }
        })
        .await;

    Ok(RunSummary {
        mode: GameMode::Philosophy,
        start,
        end: None,
        outcome,
        path: session.route(),
        dead_ends: session.dead_ends().len(),
        total_wins: None,
    })
}

/// Play one race to `options.end`, steering by title similarity.
///
/// Fails before any page is fetched when a given end page has no senses in
/// the oracle. A random end page is drawn first, then the start page.
pub async fn play_race<F: PageFetcher, O: SimilarityOracle>(
    fetcher: &F,
    oracle: &O,
    options: &RaceOptions,
    on_step: Option<&StepCallback>,
) -> Result<RunSummary, GameError> {
    let end = match &options.end {
        Some(end) => end.clone(),
        None => random_page_with_senses(fetcher, oracle).await?,
    };
    let scorer = SemanticScorer::new(oracle, &end, options.semantic)?;

    let start = match &options.start {
        Some(start) => start.clone(),
        None => random_page_with_senses(fetcher, oracle).await?,
    };
    info!("Racing from {} to {}", start, end);

    let target = TargetPredicate::Exact {
        id: end.clone(),
        case: options.case,
    };
    let config = TraversalConfig::new(target)
        .with_short_circuit(true)
        .with_termination(options.termination)
        .with_max_steps(options.max_steps);
    let mut session = TraversalSession::new(fetcher, &scorer, config, start.clone());
    let outcome = session
        .run_with(|report| {
            if let Some(callback) = on_step {
                callback(report);
            }
        })
        .await;

    Ok(RunSummary {
        mode: GameMode::Race,
        start,
        end: Some(end),
        outcome,
        path: session.route(),
        dead_ends: session.dead_ends().len(),
        total_wins: None,
    })
}

/// Draw random pages until one has non-noun senses for some title word.
pub async fn random_page_with_senses<F: PageFetcher, O: SimilarityOracle>(
    fetcher: &F,
    oracle: &O,
) -> Result<PageId, GameError> {
    for attempt in 1..=RANDOM_PAGE_ATTEMPTS {
        let page = fetcher.random_page().await?;
        if !collect_senses(oracle, &page, WordStrategy::Pooled, true).is_empty() {
            return Ok(page);
        }
        debug!("Random page {} has no usable senses (attempt {})", page, attempt);
    }

    Err(GameError::NoRandomPage(RANDOM_PAGE_ATTEMPTS))
}

/// Persist a finished game and fill in the cumulative win count.
pub fn record_summary(stats: &mut Stats, summary: &mut RunSummary) -> rusqlite::Result<u64> {
    let record = GameRecord::new(
        summary.mode,
        &summary.start,
        summary.end.as_deref(),
        summary.outcome.as_str(),
        summary.steps(),
    );
    let wins = stats.record_game(&record)?;
    summary.total_wins = Some(wins);
    Ok(wins)
}
