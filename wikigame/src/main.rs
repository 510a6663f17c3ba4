use colored::Colorize;
use commands::command_argument_builder;
use wikigame::handlers::{
    GlobalOptions, handle_init, handle_philosophy, handle_race, handle_stats, init_tracing,
};
use wikigame_core::print_banner;

mod commands;

#[tokio::main]
async fn main() {
    let cmd = command_argument_builder();
    let chosen_command = cmd.get_matches();
    let global = GlobalOptions::from_matches(&chosen_command);

    // Show banner unless --quiet flag is set
    if !global.quiet {
        print_banner();
    }

    if chosen_command.subcommand().is_none() {
        // No subcommand provided, just show the banner
        return;
    }

    init_tracing(global.verbose);

    let result = match chosen_command.subcommand() {
        Some(("init", primary_command)) => handle_init(primary_command),
        Some(("philosophy", primary_command)) => handle_philosophy(&global, primary_command).await,
        Some(("race", primary_command)) => handle_race(&global, primary_command).await,
        Some(("stats", primary_command)) => handle_stats(&global, primary_command),
        _ => unreachable!("clap should ensure we don't get here"),
    };

    if let Err(e) = result {
        eprintln!("{} {:#}", "✗".red().bold(), e);
        std::process::exit(1);
    }
}

pub const CLAP_STYLING: clap::builder::styling::Styles = clap::builder::styling::Styles::styled()
    .header(clap_cargo::style::HEADER)
    .usage(clap_cargo::style::USAGE)
    .literal(clap_cargo::style::LITERAL)
    .placeholder(clap_cargo::style::PLACEHOLDER)
    .error(clap_cargo::style::ERROR)
    .valid(clap_cargo::style::VALID)
    .invalid(clap_cargo::style::INVALID);
