pub mod game;
pub mod lexicon;
pub mod report;
pub mod scorer;
pub mod semantic;
pub mod store;
pub mod traversal;

pub use game::{GameError, PhilosophyOptions, RaceOptions, StepCallback, play_philosophy, play_race};
pub use lexicon::LexiconOracle;
pub use scorer::{FirstLinkScorer, LinkScorer, ScanMode};
pub use semantic::{Aggregation, SemanticConfig, SemanticScorer, SimilarityOracle, WordStrategy};
pub use store::Stats;
pub use traversal::{TargetPredicate, TraversalConfig, TraversalOutcome, TraversalSession};

pub fn print_banner() {
    use colored::Colorize;

    println!(
        "{}",
        r#"
          _ _    _
__      _(_) | _(_) __ _  __ _ _ __ ___   ___
\ \ /\ / / | |/ / |/ _` |/ _` | '_ ` _ \ / _ \
 \ V  V /| |   <| | (_| | (_| | | | | | |  __/
  \_/\_/ |_|_|\_\_|\__, |\__,_|_| |_| |_|\___|
                   |___/
"#
        .bright_cyan()
    );
}
