use crate::CLAP_STYLING;
use clap::{arg, command};

pub(crate) fn command_argument_builder() -> clap::Command {
    clap::Command::new("wikigame")
        .version(env!("CARGO_PKG_VERSION"))
        .bin_name("wikigame")
        .styles(CLAP_STYLING)
        .arg(
            arg!(-q --"quiet" "Suppress banner and per-step output")
                .required(false)
                .global(true),
        )
        .arg(
            arg!(-v --"verbose" "Log every fetch, score and backtrack")
                .required(false)
                .global(true),
        )
        .arg(
            arg!(--"db" <PATH>)
                .required(false)
                .global(true)
                .help("Location of the statistics database")
                .default_value("~/.config/wikigame/wikigame.db"),
        )
        .arg(
            arg!(--"base-url" <URL>)
                .required(false)
                .global(true)
                .help("Wiki to play on")
                .default_value("https://en.wikipedia.org"),
        )
        .arg(
            arg!(--"timeout" <SECONDS>)
                .required(false)
                .global(true)
                .help("Request timeout in seconds")
                .value_parser(clap::value_parser!(u64))
                .default_value("10"),
        )
        .subcommand_required(false)
        .subcommand(
            command!("init")
                .about("Initializes the wikigame statistics database on your filesystem")
                .arg(
                    arg!([PATH])
                        .required(false)
                        .help("Directory to store the database in")
                        .default_value("~/.config/wikigame/"),
                )
                .arg(
                    arg!(-f --"force")
                        .help("Overwrite any existing database at the specified location.")
                        .required(false),
                ),
        )
        .subcommand(
            command!("philosophy")
                .about(
                    "Follow the first unvisited body link of each page until reaching \
                Philosophy.",
                )
                .arg(
                    arg!(-s --"start" <PAGE>)
                        .required(false)
                        .help("Start page, e.g. Ginza or /wiki/Ginza (default: random article)"),
                )
                .arg(
                    arg!(-m --"marker" <TEXT>)
                        .required(false)
                        .help("Win when a page id contains this text")
                        .default_value("/wiki/Philosophy"),
                )
                .arg(
                    arg!(-g --"games" <NUM>)
                        .required(false)
                        .help("Number of games to play")
                        .value_parser(clap::value_parser!(usize))
                        .default_value("1")
                        .conflicts_with("forever"),
                )
                .arg(
                    arg!(--"forever")
                        .required(false)
                        .help("Keep playing new games until interrupted")
                        .action(clap::ArgAction::SetTrue),
                )
                .arg(
                    arg!(--"max-steps" <NUM>)
                        .required(false)
                        .help("Give up a game after this many steps")
                        .value_parser(clap::value_parser!(usize)),
                ),
        )
        .subcommand(
            command!("race")
                .about(
                    "Race from a start page to an end page, following the link whose title is \
                most similar to the end page's title.",
                )
                .arg(
                    arg!(-l --"lexicon" <PATH>)
                        .required(true)
                        .help("JSON sense taxonomy used for title similarity")
                        .value_parser(clap::value_parser!(std::path::PathBuf)),
                )
                .arg(
                    arg!(-s --"start" <PAGE>)
                        .required(false)
                        .help("Start page")
                        .default_value("/wiki/Ginza"),
                )
                .arg(
                    arg!(-e --"end" <PAGE>)
                        .required(false)
                        .help("End page")
                        .default_value("/wiki/Reason"),
                )
                .arg(
                    arg!(-r --"random")
                        .required(false)
                        .help("Pick random start and end pages instead")
                        .action(clap::ArgAction::SetTrue),
                )
                .arg(
                    arg!(-a --"aggregate" <METHOD>)
                        .required(false)
                        .help("How sense similarities combine: mean (thresholded) or max")
                        .value_parser(["mean", "max"])
                        .default_value("mean"),
                )
                .arg(
                    arg!(--"floor" <SCORE>)
                        .required(false)
                        .help("Similarities below this count as 0 in the mean")
                        .value_parser(clap::value_parser!(f64))
                        .default_value("0.3"),
                )
                .arg(
                    arg!(-w --"words" <STRATEGY>)
                        .required(false)
                        .help("Title words used: pooled (all) or first (first with senses)")
                        .value_parser(["pooled", "first"])
                        .default_value("pooled"),
                )
                .arg(
                    arg!(--"no-nouns")
                        .required(false)
                        .help("Ignore noun senses of link titles")
                        .action(clap::ArgAction::SetTrue),
                )
                .arg(
                    arg!(--"lenient")
                        .required(false)
                        .help("Accept a perfect similarity score as reaching the end page")
                        .action(clap::ArgAction::SetTrue),
                )
                .arg(
                    arg!(--"case-sensitive")
                        .required(false)
                        .help("Match the end page id case-sensitively")
                        .action(clap::ArgAction::SetTrue),
                )
                .arg(
                    arg!(--"max-steps" <NUM>)
                        .required(false)
                        .help("Give up after this many steps")
                        .value_parser(clap::value_parser!(usize)),
                )
                .arg(
                    arg!(-o --"output" <PATH>)
                        .required(false)
                        .help("Save report to file (default: display to screen)")
                        .value_parser(clap::value_parser!(std::path::PathBuf)),
                )
                .arg(
                    arg!(-f --"format" <FORMAT>)
                        .required(false)
                        .help("Report format: text, json")
                        .value_parser(["text", "json"])
                        .default_value("text"),
                ),
        )
        .subcommand(
            command!("stats")
                .about("Show cumulative wins and recent games")
                .arg(
                    arg!(-n --"limit" <NUM>)
                        .required(false)
                        .help("Number of recent games to list")
                        .value_parser(clap::value_parser!(usize))
                        .default_value("10"),
                ),
        )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_definition_is_valid() {
        command_argument_builder().debug_assert();
    }

    #[test]
    fn test_race_defaults() {
        let matches = command_argument_builder()
            .try_get_matches_from(["wikigame", "race", "--lexicon", "lexicon.json"])
            .unwrap();
        let (_, race) = matches.subcommand().unwrap();

        assert_eq!(race.get_one::<String>("start").unwrap(), "/wiki/Ginza");
        assert_eq!(race.get_one::<String>("aggregate").unwrap(), "mean");
        assert_eq!(*race.get_one::<f64>("floor").unwrap(), 0.3);
        assert!(!race.get_flag("lenient"));
    }

    #[test]
    fn test_games_conflicts_with_forever() {
        let result = command_argument_builder().try_get_matches_from([
            "wikigame",
            "philosophy",
            "--games",
            "3",
            "--forever",
        ]);
        assert!(result.is_err());
    }
}
