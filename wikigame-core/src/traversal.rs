use crate::scorer::{LinkScorer, ScanMode};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::{debug, info, warn};
use wikigame_scanner::fetcher::PageFetcher;
use wikigame_scanner::result::{PageId, PageRecord, WIKI_PREFIX, canonical_id, title_from_id};

/// Namespaces whose pages are utility pages rather than articles.
pub const DEFAULT_EXCLUDED_NAMESPACES: &[&str] = &[
    "Special:",
    "File:",
    "Help:",
    "Wikipedia:",
    "Template:",
    "Template_talk:",
    "Category:",
    "Portal:",
    "Talk:",
];

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum MatchCase {
    #[default]
    Insensitive,
    Sensitive,
}

/// When the game counts as won.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TargetPredicate {
    /// The page id contains a marker, e.g. `Philosophy`.
    Contains(String),
    /// The page id equals the end page.
    Exact { id: PageId, case: MatchCase },
}

impl TargetPredicate {
    pub fn philosophy() -> Self {
        TargetPredicate::Contains("/wiki/Philosophy".to_string())
    }

    pub fn exact(id: impl Into<PageId>) -> Self {
        TargetPredicate::Exact {
            id: id.into(),
            case: MatchCase::default(),
        }
    }

    /// Ids are compared in canonical form, so percent-escaped links match
    /// typed titles.
    pub fn is_satisfied_by(&self, page: &str) -> bool {
        let page = canonical_id(page);
        match self {
            TargetPredicate::Contains(marker) => page.contains(canonical_id(marker).as_str()),
            TargetPredicate::Exact {
                id,
                case: MatchCase::Sensitive,
            } => page == canonical_id(id),
            TargetPredicate::Exact {
                id,
                case: MatchCase::Insensitive,
            } => page.to_lowercase() == canonical_id(id).to_lowercase(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum TerminationMode {
    /// Only landing on the target page wins.
    #[default]
    Strict,
    /// A perfect similarity score for the chosen link also wins.
    Lenient,
}

#[derive(Debug, Clone)]
pub struct TraversalConfig {
    pub target: TargetPredicate,
    /// Win as soon as a link on the current page satisfies the target,
    /// before scoring the rest of the page.
    pub short_circuit: bool,
    pub termination: TerminationMode,
    pub excluded_namespaces: Vec<String>,
    /// Give up after this many steps.
    pub max_steps: Option<usize>,
}

impl TraversalConfig {
    pub fn new(target: TargetPredicate) -> Self {
        Self {
            target,
            short_circuit: false,
            termination: TerminationMode::Strict,
            excluded_namespaces: DEFAULT_EXCLUDED_NAMESPACES
                .iter()
                .map(|ns| ns.to_string())
                .collect(),
            max_steps: None,
        }
    }

    pub fn with_short_circuit(mut self, short_circuit: bool) -> Self {
        self.short_circuit = short_circuit;
        self
    }

    pub fn with_termination(mut self, termination: TerminationMode) -> Self {
        self.termination = termination;
        self
    }

    pub fn with_max_steps(mut self, max_steps: Option<usize>) -> Self {
        self.max_steps = max_steps;
        self
    }

    pub fn is_excluded(&self, link: &str) -> bool {
        let name = link.strip_prefix(WIKI_PREFIX).unwrap_or(link);
        self.excluded_namespaces
            .iter()
            .any(|ns| name.starts_with(ns.as_str()))
    }
}

/// Append-only path of fetched pages, doubling as the set of visited pages.
///
/// Membership is by canonical id.
#[derive(Debug, Clone, Default)]
pub struct VisitedSequence {
    path: Vec<PageId>,
    seen: HashSet<PageId>,
}

impl VisitedSequence {
    pub fn push(&mut self, page: PageId) {
        self.seen.insert(canonical_id(&page));
        self.path.push(page);
    }

    pub fn contains(&self, page: &str) -> bool {
        self.seen.contains(&canonical_id(page))
    }

    pub fn len(&self) -> usize {
        self.path.len()
    }

    pub fn is_empty(&self) -> bool {
        self.path.is_empty()
    }

    /// Moves made so far; the start page is step 0.
    pub fn steps(&self) -> usize {
        self.path.len().saturating_sub(1)
    }

    pub fn last(&self) -> Option<&PageId> {
        self.path.last()
    }

    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &PageId> {
        self.path.iter()
    }

    pub fn as_slice(&self) -> &[PageId] {
        &self.path
    }
}

/// Pages known to have no viable next link.
#[derive(Debug, Clone, Default)]
pub struct DeadEndSet {
    pages: HashSet<PageId>,
}

impl DeadEndSet {
    /// Returns `false` if the page was already a dead end.
    pub fn insert(&mut self, page: &str) -> bool {
        self.pages.insert(canonical_id(page))
    }

    pub fn contains(&self, page: &str) -> bool {
        self.pages.contains(&canonical_id(page))
    }

    pub fn len(&self) -> usize {
        self.pages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TraversalOutcome {
    InProgress,
    Won {
        steps: usize,
        start_title: String,
    },
    Impossible {
        steps: usize,
        start_title: String,
        reason: String,
    },
    FetchFailed {
        page: PageId,
        error: String,
    },
    Abandoned {
        steps: usize,
        start_title: String,
    },
}

impl TraversalOutcome {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, TraversalOutcome::InProgress)
    }

    pub fn is_won(&self) -> bool {
        matches!(self, TraversalOutcome::Won { .. })
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TraversalOutcome::InProgress => "in_progress",
            TraversalOutcome::Won { .. } => "won",
            TraversalOutcome::Impossible { .. } => "impossible",
            TraversalOutcome::FetchFailed { .. } => "fetch_failed",
            TraversalOutcome::Abandoned { .. } => "abandoned",
        }
    }
}

/// What a single step did after fetching its page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum StepAction {
    /// Moved forward to an unvisited link.
    Advanced { next: PageId, score: Option<f64> },
    /// No viable link; re-rooted at an earlier page.
    Backtracked { to: PageId, depth: usize },
    /// The target was reached.
    Arrived { target: PageId, score: Option<f64> },
    /// Backtracking ran out of pages.
    Stuck,
}

/// Per-step status handed to observers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepReport {
    pub step_index: usize,
    pub page: PageId,
    pub start_title: String,
    /// Title of the fetched page, `None` when the fetch failed.
    pub current_title: Option<String>,
    pub fetch_error: Option<String>,
    pub action: StepAction,
}

enum Selection {
    Target(PageId),
    Next { page: PageId, score: Option<f64> },
    Nothing,
}

/// State of one game: owns the path and dead ends and drives the walk.
///
/// A session is created per game and never reused, so history from one game
/// cannot leak into the next.
pub struct TraversalSession<'a, F: PageFetcher, S: LinkScorer> {
    fetcher: &'a F,
    scorer: &'a S,
    config: TraversalConfig,
    start: PageId,
    current: PageId,
    start_title: String,
    visited: VisitedSequence,
    dead_ends: DeadEndSet,
    backtrack_depth: usize,
    outcome: TraversalOutcome,
}

impl<'a, F: PageFetcher, S: LinkScorer> TraversalSession<'a, F, S> {
    pub fn new(fetcher: &'a F, scorer: &'a S, config: TraversalConfig, start: impl Into<PageId>) -> Self {
        let start = start.into();
        let start_title = title_from_id(&start);
        let mut session = Self {
            fetcher,
            scorer,
            config,
            current: start.clone(),
            start,
            start_title,
            visited: VisitedSequence::default(),
            dead_ends: DeadEndSet::default(),
            backtrack_depth: 0,
            outcome: TraversalOutcome::InProgress,
        };

        if session.config.target.is_satisfied_by(&session.start) {
            info!("Start page {} is already the target", session.start);
            session.visited.push(session.start.clone());
            session.outcome = TraversalOutcome::Won {
                steps: 0,
                start_title: session.start_title.clone(),
            };
        }

        session
    }

    pub fn start_title(&self) -> &str {
        &self.start_title
    }

    pub fn current(&self) -> &str {
        &self.current
    }

    pub fn visited(&self) -> &VisitedSequence {
        &self.visited
    }

    /// Pages of the game in order: everything fetched, then the target once won.
    pub fn route(&self) -> Vec<PageId> {
        let mut route = self.visited.as_slice().to_vec();
        if self.outcome.is_won() && self.visited.last() != Some(&self.current) {
            route.push(self.current.clone());
        }
        route
    }

    pub fn dead_ends(&self) -> &DeadEndSet {
        &self.dead_ends
    }

    pub fn outcome(&self) -> &TraversalOutcome {
        &self.outcome
    }

    /// Play until the game ends.
    pub async fn run(&mut self) -> TraversalOutcome {
        self.run_with(|_| {}).await
    }

    /// Play until the game ends, reporting every step to `on_step`.
    pub async fn run_with<C>(&mut self, mut on_step: C) -> TraversalOutcome
    where
        C: FnMut(&StepReport),
    {
        while !self.outcome.is_terminal() {
            if let Some(max) = self.config.max_steps
                && self.visited.steps() >= max
            {
                warn!("Giving up after {} steps", max);
                self.outcome = TraversalOutcome::Abandoned {
                    steps: self.visited.steps(),
                    start_title: self.start_title.clone(),
                };
                break;
            }

            if let Some(report) = self.step().await {
                on_step(&report);
            }
        }

        self.outcome.clone()
    }

    /// Visit the current page and move to the next one.
    ///
    /// Returns `None` once the game has ended.
    pub async fn step(&mut self) -> Option<StepReport> {
        if self.outcome.is_terminal() {
            return None;
        }

        let page = self.current.clone();
        self.visited.push(page.clone());
        let step_index = self.visited.len() - 1;

        let (current_title, fetch_error, selection) = match self.fetcher.fetch(&page).await {
            Ok(record) => {
                if step_index == 0 {
                    self.start_title = record.title.clone();
                }
                let selection = self.select(&record);
                (Some(record.title), None, selection)
            }
            Err(e) => {
                warn!("{} not a valid page: {}", page, e);
                self.dead_ends.insert(&page);
                (None, Some(e.to_string()), Selection::Nothing)
            }
        };

        let action = match selection {
            Selection::Target(target) => self.arrive(target, None),
            Selection::Next { page: next, score } => {
                let lenient_win = self.config.termination == TerminationMode::Lenient
                    && score.is_some_and(|s| s >= 1.0);
                if lenient_win || self.config.target.is_satisfied_by(&next) {
                    self.arrive(next, score)
                } else {
                    debug!("Next page is {} (score {:?})", next, score);
                    self.backtrack_depth = 0;
                    self.current = next.clone();
                    StepAction::Advanced { next, score }
                }
            }
            Selection::Nothing => self.backtrack(&page, fetch_error.as_deref()),
        };

        Some(StepReport {
            step_index,
            page,
            start_title: self.start_title.clone(),
            current_title,
            fetch_error,
            action,
        })
    }

    /// The target is never fetched, so it counts as a step without joining
    /// the visited path.
    fn arrive(&mut self, target: PageId, score: Option<f64>) -> StepAction {
        let steps = self.visited.len();
        info!(
            "Found it! Got from {} to {} in {} steps",
            self.start_title, target, steps
        );
        self.current = target.clone();
        self.outcome = TraversalOutcome::Won {
            steps,
            start_title: self.start_title.clone(),
        };
        StepAction::Arrived { target, score }
    }

    /// Pick the next link from a fetched page.
    fn select(&self, record: &PageRecord) -> Selection {
        let mut best: Option<(&PageId, f64)> = None;

        for link in &record.links {
            if self.config.short_circuit && self.config.target.is_satisfied_by(link) {
                return Selection::Target(link.clone());
            }
            if self.visited.contains(link) || self.config.is_excluded(link) {
                continue;
            }

            match self.scorer.scan_mode() {
                ScanMode::FirstEligible => {
                    return Selection::Next {
                        page: link.clone(),
                        score: None,
                    };
                }
                ScanMode::HighestScore => {
                    let Some(score) = self.scorer.score(link) else {
                        continue;
                    };
                    if score > best.map_or(0.0, |(_, s)| s) {
                        best = Some((link, score));
                    }
                }
            }
        }

        match best {
            Some((page, score)) => Selection::Next {
                page: page.clone(),
                score: Some(score),
            },
            None => Selection::Nothing,
        }
    }

    /// Mark `failed` as a dead end and re-root at the most recent live page.
    fn backtrack(&mut self, failed: &str, fetch_error: Option<&str>) -> StepAction {
        if self.dead_ends.insert(failed) {
            debug!("Marked {} as a dead end", failed);
        }

        let target = self
            .visited
            .iter()
            .rev()
            .skip(1)
            .find(|p| !self.dead_ends.contains(p))
            .cloned();

        match target {
            Some(to) => {
                self.backtrack_depth += 1;
                info!(
                    "No links found on page {}, going backwards {} steps to {}",
                    failed, self.backtrack_depth, to
                );
                self.current = to.clone();
                StepAction::Backtracked {
                    to,
                    depth: self.backtrack_depth,
                }
            }
            None => {
                warn!("Can't step backwards anymore, end of game");
                self.outcome = match fetch_error {
                    Some(error) => TraversalOutcome::FetchFailed {
                        page: failed.to_string(),
                        error: error.to_string(),
                    },
                    _ => TraversalOutcome::Impossible {
                        steps: self.visited.steps(),
                        start_title: self.start_title.clone(),
                        reason: format!(
                            "every page reachable from {} is a dead end ({} dead ends)",
                            self.start,
                            self.dead_ends.len()
                        ),
                    },
                };
                StepAction::Stuck
            }
        }
    }
}
