// Include handlers module directly from handlers.rs
#[path = "handlers.rs"]
pub mod handlers;

// Re-export commonly used handler functions for convenience
pub use handlers::{
    GlobalOptions, init_tracing, open_stats, parse_aggregation, parse_page_arg,
    parse_word_strategy, race_options_from_args, resolve_db_path,
};
