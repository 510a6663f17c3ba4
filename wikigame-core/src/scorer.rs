// Link selection policies

/// How the traversal engine walks a page's candidate links.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanMode {
    /// Take the first eligible link in document order and stop scanning.
    FirstEligible,
    /// Score every eligible link and take the highest scorer.
    HighestScore,
}

/// Policy that ranks candidate links against the target it was built for.
pub trait LinkScorer {
    fn scan_mode(&self) -> ScanMode;

    /// Desirability of `candidate` in `[0, 1]`, or `None` when there is no
    /// basis for comparison.
    fn score(&self, candidate: &str) -> Option<f64>;
}

/// The classic "first unvisited link" heuristic.
#[derive(Debug, Clone, Copy, Default)]
pub struct FirstLinkScorer;

impl LinkScorer for FirstLinkScorer {
    fn scan_mode(&self) -> ScanMode {
        ScanMode::FirstEligible
    }

    fn score(&self, _candidate: &str) -> Option<f64> {
        None
    }
}

impl<T: LinkScorer + ?Sized> LinkScorer for &T {
    fn scan_mode(&self) -> ScanMode {
        (**self).scan_mode()
    }

    fn score(&self, candidate: &str) -> Option<f64> {
        (**self).score(candidate)
    }
}
