// Similarity oracle backed by a sense taxonomy loaded from JSON

use crate::semantic::SimilarityOracle;
use serde::Deserialize;
use std::collections::{HashMap, HashSet, VecDeque};
use std::fs;
use std::path::Path;
use thiserror::Error;
use tracing::debug;

#[derive(Error, Debug)]
pub enum LexiconError {
    #[error("Failed to read lexicon {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid lexicon JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Lemma {lemma} refers to unknown sense {sense}")]
    UnknownSense { lemma: String, sense: String },
}

#[derive(Debug, Clone, Deserialize)]
pub struct SenseEntry {
    /// Part of speech, WordNet style: `n`, `v`, `a`, `s` or `r`.
    pub pos: String,
    #[serde(default)]
    pub hypernyms: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
struct LexiconFile {
    senses: HashMap<String, SenseEntry>,
    lemmas: HashMap<String, Vec<String>>,
}

/// Word senses arranged in a hypernym taxonomy, compared with Wu-Palmer
/// similarity as WordNet tools compute it: the subsumer is the common
/// ancestor with the greatest minimum depth, its depth is its longest path to
/// a root, and senses other than nouns share a simulated root above all of
/// their roots.
///
/// The file format is
///
/// ```json
/// {
///   "senses": {
///     "entity.n.01":  { "pos": "n", "hypernyms": [] },
///     "reason.n.01":  { "pos": "n", "hypernyms": ["entity.n.01"] }
///   },
///   "lemmas": { "reason": ["reason.n.01"] }
/// }
/// ```
#[derive(Debug, Clone)]
pub struct LexiconOracle {
    senses: HashMap<String, SenseEntry>,
    lemmas: HashMap<String, Vec<String>>,
}

impl LexiconOracle {
    pub fn load(path: &Path) -> Result<Self, LexiconError> {
        let content = fs::read_to_string(path).map_err(|source| LexiconError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json(&content)
    }

    pub fn from_json(json: &str) -> Result<Self, LexiconError> {
        let file: LexiconFile = serde_json::from_str(json)?;

        let mut lemmas = HashMap::with_capacity(file.lemmas.len());
        for (lemma, senses) in file.lemmas {
            if let Some(missing) = senses.iter().find(|s| !file.senses.contains_key(*s)) {
                return Err(LexiconError::UnknownSense {
                    lemma,
                    sense: missing.clone(),
                });
            }
            lemmas.insert(lemma.to_lowercase(), senses);
        }

        debug!(
            "Loaded lexicon with {} senses and {} lemmas",
            file.senses.len(),
            lemmas.len()
        );
        Ok(Self {
            senses: file.senses,
            lemmas,
        })
    }

    pub fn sense_count(&self) -> usize {
        self.senses.len()
    }

    /// Hop distance from `sense` to each of its ancestors, itself included at 0.
    fn ancestors(&self, sense: &str) -> HashMap<String, usize> {
        let mut distances = HashMap::new();
        let mut queue = VecDeque::from([(sense.to_string(), 0usize)]);

        while let Some((id, dist)) = queue.pop_front() {
            if distances.contains_key(&id) {
                continue;
            }
            if let Some(entry) = self.senses.get(&id) {
                for parent in &entry.hypernyms {
                    queue.push_back((parent.clone(), dist + 1));
                }
            }
            distances.insert(id, dist);
        }

        distances
    }

    fn is_root(&self, sense: &str) -> bool {
        self.senses
            .get(sense)
            .is_none_or(|entry| entry.hypernyms.is_empty())
    }

    /// Hops from `sense` to its nearest root.
    fn min_depth(&self, sense: &str) -> usize {
        self.ancestors(sense)
            .into_iter()
            .filter(|(id, _)| self.is_root(id))
            .map(|(_, dist)| dist)
            .min()
            .unwrap_or(0)
    }

    /// Hops from `sense` to its farthest root.
    fn max_depth(&self, sense: &str) -> usize {
        let mut on_path = HashSet::new();
        self.longest_path(sense, &mut on_path)
    }

    fn longest_path<'a>(&'a self, sense: &'a str, on_path: &mut HashSet<&'a str>) -> usize {
        let Some(entry) = self.senses.get(sense) else {
            return 0;
        };
        if !on_path.insert(sense) {
            return 0;
        }
        let depth = entry
            .hypernyms
            .iter()
            .map(|parent| 1 + self.longest_path(parent, on_path))
            .max()
            .unwrap_or(0);
        on_path.remove(sense);
        depth
    }
}

impl SimilarityOracle for LexiconOracle {
    type Sense = String;

    fn senses(&self, word: &str) -> Vec<String> {
        self.lemmas
            .get(&word.to_lowercase())
            .cloned()
            .unwrap_or_default()
    }

    fn is_noun(&self, sense: &String) -> bool {
        self.senses.get(sense).is_some_and(|entry| entry.pos == "n")
    }

    fn similarity(&self, a: &String, b: &String) -> Option<f64> {
        if a == b {
            return Some(1.0);
        }

        let from_a = self.ancestors(a);
        let from_b = self.ancestors(b);

        let mut common: Vec<&String> = from_a.keys().filter(|id| from_b.contains_key(*id)).collect();
        common.sort();
        let lowest = common.iter().map(|id| self.min_depth(id)).max();

        let (depth, dist_a, dist_b) = match lowest {
            Some(lowest) => {
                let subsumer = common
                    .iter()
                    .copied()
                    .find(|id| self.min_depth(id) == lowest)?;
                (self.max_depth(subsumer) + 1, from_a[subsumer], from_b[subsumer])
            }
            None if !self.is_noun(a) => {
                // Simulated root, one hop above the farthest ancestor of each side.
                let beyond = |dists: &HashMap<String, usize>| dists.values().max().map_or(1, |d| d + 1);
                (1, beyond(&from_a), beyond(&from_b))
            }
            None => return None,
        };

        let depth = depth as f64;
        Some(2.0 * depth / (dist_a as f64 + dist_b as f64 + 2.0 * depth))
    }
}
