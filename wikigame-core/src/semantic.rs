use crate::scorer::{LinkScorer, ScanMode};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;
use wikigame_scanner::result::article_name;

pub const DEFAULT_RELEVANCE_FLOOR: f64 = 0.3;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ScorerError {
    #[error("No senses found for target {0} - try a different end page")]
    NoTargetSynonyms(String),
}

/// Lexical similarity source: word senses and a pairwise sense similarity.
pub trait SimilarityOracle {
    type Sense;

    /// All senses of `word`, most common first.
    fn senses(&self, word: &str) -> Vec<Self::Sense>;

    fn is_noun(&self, sense: &Self::Sense) -> bool;

    /// Similarity in `[0, 1]`, or `None` when the senses are unrelated.
    fn similarity(&self, a: &Self::Sense, b: &Self::Sense) -> Option<f64>;
}

impl<T: SimilarityOracle + ?Sized> SimilarityOracle for &T {
    type Sense = T::Sense;

    fn senses(&self, word: &str) -> Vec<Self::Sense> {
        (**self).senses(word)
    }

    fn is_noun(&self, sense: &Self::Sense) -> bool {
        (**self).is_noun(sense)
    }

    fn similarity(&self, a: &Self::Sense, b: &Self::Sense) -> Option<f64> {
        (**self).similarity(a, b)
    }
}

/// How pairwise sense similarities collapse into one candidate score.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Aggregation {
    /// Best single pair; unrelated pairs are skipped.
    Max,
    /// Mean over all pairs, where unrelated pairs and pairs below `floor` count as 0.
    ThresholdMean { floor: f64 },
}

impl Default for Aggregation {
    fn default() -> Self {
        Aggregation::ThresholdMean {
            floor: DEFAULT_RELEVANCE_FLOOR,
        }
    }
}

/// Which words of a multi-word title contribute senses.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum WordStrategy {
    /// Senses of the first word that has any.
    FirstWithSenses,
    /// Senses of every word, pooled in title order.
    #[default]
    Pooled,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct SemanticConfig {
    pub aggregation: Aggregation,
    pub words: WordStrategy,
    /// Drop noun senses of candidate links to avoid favouring proper nouns.
    pub no_nouns: bool,
}

/// Split a page id into the words of its title.
///
/// `/wiki/Financial_engineering` yields `["Financial", "engineering"]`.
pub fn representative_words(id: &str) -> Vec<String> {
    article_name(id)
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .map(str::to_string)
        .collect()
}

/// Collapse pairwise similarities according to `aggregation`.
///
/// Returns `None` when there is nothing to aggregate.
pub fn aggregate<I>(scores: I, aggregation: Aggregation) -> Option<f64>
where
    I: IntoIterator<Item = Option<f64>>,
{
    match aggregation {
        Aggregation::Max => scores.into_iter().flatten().reduce(f64::max),
        Aggregation::ThresholdMean { floor } => {
            let mut total = 0.0;
            let mut count = 0usize;
            for score in scores {
                count += 1;
                if let Some(s) = score
                    && s >= floor
                {
                    total += s;
                }
            }
            (count > 0).then(|| total / count as f64)
        }
    }
}

/// Scores links by lexical similarity of their titles to the end page's title.
pub struct SemanticScorer<O: SimilarityOracle> {
    oracle: O,
    config: SemanticConfig,
    target_senses: Vec<O::Sense>,
}

impl<O: SimilarityOracle> SemanticScorer<O> {
    /// Build a scorer for `target`, failing before any page is fetched when
    /// the target title yields no senses.
    pub fn new(oracle: O, target: &str, config: SemanticConfig) -> Result<Self, ScorerError> {
        let target_senses = collect_senses(&oracle, target, config.words, false);
        if target_senses.is_empty() {
            return Err(ScorerError::NoTargetSynonyms(target.to_string()));
        }

        debug!("Target {} has {} senses", target, target_senses.len());
        Ok(Self {
            oracle,
            config,
            target_senses,
        })
    }
}

impl<O: SimilarityOracle> LinkScorer for SemanticScorer<O> {
    fn scan_mode(&self) -> ScanMode {
        ScanMode::HighestScore
    }

    fn score(&self, candidate: &str) -> Option<f64> {
        let senses = collect_senses(&self.oracle, candidate, self.config.words, self.config.no_nouns);
        if senses.is_empty() {
            return None;
        }

        let oracle = &self.oracle;
        let senses = &senses;
        let pairs = self
            .target_senses
            .iter()
            .flat_map(move |t| senses.iter().map(move |c| oracle.similarity(t, c)));
        aggregate(pairs, self.config.aggregation)
    }
}

/// Senses for the title words of `id` under the given word strategy.
pub fn collect_senses<O: SimilarityOracle>(
    oracle: &O,
    id: &str,
    strategy: WordStrategy,
    no_nouns: bool,
) -> Vec<O::Sense> {
    let mut pooled = Vec::new();

    for word in representative_words(id) {
        let mut senses = oracle.senses(&word);
        if no_nouns {
            senses.retain(|s| !oracle.is_noun(s));
        }
        if senses.is_empty() {
            continue;
        }

        pooled.extend(senses);
        if strategy == WordStrategy::FirstWithSenses {
            break;
        }
    }

    pooled
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    /// Oracle whose senses are `(word, pos)` pairs with table-driven similarities.
    #[derive(Default)]
    struct TableOracle {
        senses: HashMap<String, Vec<(String, char)>>,
        pairs: HashMap<(String, String), f64>,
    }

    impl TableOracle {
        fn sense(mut self, word: &str, id: &str, pos: char) -> Self {
            self.senses
                .entry(word.to_lowercase())
                .or_default()
                .push((id.to_string(), pos));
            self
        }

        fn pair(mut self, a: &str, b: &str, score: f64) -> Self {
            self.pairs.insert((a.to_string(), b.to_string()), score);
            self
        }
    }

    impl SimilarityOracle for TableOracle {
        type Sense = (String, char);

        fn senses(&self, word: &str) -> Vec<Self::Sense> {
            self.senses.get(&word.to_lowercase()).cloned().unwrap_or_default()
        }

        fn is_noun(&self, sense: &Self::Sense) -> bool {
            sense.1 == 'n'
        }

        fn similarity(&self, a: &Self::Sense, b: &Self::Sense) -> Option<f64> {
            self.pairs.get(&(a.0.clone(), b.0.clone())).copied()
        }
    }

    #[test]
    fn test_representative_words() {
        assert_eq!(
            representative_words("/wiki/Financial_engineering"),
            vec!["Financial", "engineering"]
        );
        assert_eq!(
            representative_words("/wiki/Sense_and_Sensibility_(novel)"),
            vec!["Sense", "and", "Sensibility", "novel"]
        );
        assert!(representative_words("/wiki/__").is_empty());
    }

    #[test]
    fn test_threshold_mean_floors_weak_pairs() {
        let score = aggregate([Some(0.1), Some(0.4), Some(0.9)], Aggregation::default()).unwrap();
        assert!((score - 1.3 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_threshold_mean_counts_unrelated_as_zero() {
        let score = aggregate([None, Some(0.8)], Aggregation::default()).unwrap();
        assert!((score - 0.4).abs() < 1e-9);
    }

    #[test]
    fn test_max_skips_unrelated_pairs() {
        assert_eq!(aggregate([None, Some(0.2), Some(0.7)], Aggregation::Max), Some(0.7));
        assert_eq!(aggregate([None, None], Aggregation::Max), None);
    }

    #[test]
    fn test_aggregate_of_nothing_is_unscored() {
        assert_eq!(aggregate(Vec::new(), Aggregation::default()), None);
    }

    #[test]
    fn test_no_target_synonyms() {
        let oracle = TableOracle::default();
        let err = SemanticScorer::new(oracle, "/wiki/Xyzzy", SemanticConfig::default())
            .err()
            .unwrap();
        assert_eq!(err, ScorerError::NoTargetSynonyms("/wiki/Xyzzy".to_string()));
    }

    #[test]
    fn test_word_strategies_differ() {
        let oracle = || {
            TableOracle::default()
                .sense("cold", "cold.a", 'a')
                .sense("war", "war.n", 'n')
                .sense("peace", "peace.n", 'n')
        };

        let first = collect_senses(&oracle(), "/wiki/Cold_War", WordStrategy::FirstWithSenses, false);
        assert_eq!(first, vec![("cold.a".to_string(), 'a')]);

        let pooled = collect_senses(&oracle(), "/wiki/Cold_War", WordStrategy::Pooled, false);
        assert_eq!(pooled.len(), 2);

        let no_nouns = collect_senses(&oracle(), "/wiki/War_and_Peace", WordStrategy::Pooled, true);
        assert!(no_nouns.is_empty());
    }

    #[test]
    fn test_score_uses_all_target_and_candidate_senses() {
        let oracle = TableOracle::default()
            .sense("reason", "reason.n", 'n')
            .sense("logic", "logic.n", 'n')
            .sense("logic", "logic.a", 'a')
            .sense("banana", "banana.n", 'n')
            .pair("reason.n", "logic.n", 0.9)
            .pair("reason.n", "logic.a", 0.1)
            .pair("reason.n", "banana.n", 0.2);

        let scorer = SemanticScorer::new(oracle, "/wiki/Reason", SemanticConfig::default()).unwrap();

        assert_eq!(scorer.scan_mode(), ScanMode::HighestScore);
        assert!((scorer.score("/wiki/Logic").unwrap() - 0.45).abs() < 1e-9);
        assert_eq!(scorer.score("/wiki/Banana"), Some(0.0));
        assert_eq!(scorer.score("/wiki/Quux"), None);
    }

    #[test]
    fn test_no_nouns_filters_candidates_only() {
        let oracle = TableOracle::default()
            .sense("reason", "reason.n", 'n')
            .sense("logic", "logic.n", 'n')
            .sense("logic", "logic.a", 'a')
            .pair("reason.n", "logic.n", 0.9)
            .pair("reason.n", "logic.a", 0.5);

        let config = SemanticConfig {
            aggregation: Aggregation::Max,
            no_nouns: true,
            ..SemanticConfig::default()
        };
        let scorer = SemanticScorer::new(oracle, "/wiki/Reason", config).unwrap();

        assert_eq!(scorer.score("/wiki/Logic"), Some(0.5));
    }
}
