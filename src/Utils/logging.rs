//! Console logging setup shared by the demo binary and ad-hoc scripts.

use log::LevelFilter;
use simplelog::{ColorChoice, Config, SimpleLogger, TermLogger, TerminalMode};

/// Initializes a terminal logger at the given level; falls back to the plain
/// logger when no terminal is attached. Safe to call more than once, later
/// calls keep the first configuration.
pub fn init_console_logging(level: LevelFilter) {
    if TermLogger::init(
        level,
        Config::default(),
        TerminalMode::Mixed,
        ColorChoice::Auto,
    )
    .is_err()
    {
        let _ = SimpleLogger::init(level, Config::default());
    }
}
