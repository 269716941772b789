use env_logger::{Builder, Target};
use log::LevelFilter;

/// Install the process-wide logger for hosts embedding the engine.
///
/// Honours `RUST_LOG` when set; otherwise warnings from everything and
/// `level` from this crate. Safe to call more than once.
pub fn init_logging(level: LevelFilter) {
    let result = if std::env::var("RUST_LOG").is_ok() {
        Builder::from_default_env().target(Target::Stdout).try_init()
    } else {
        Builder::new()
            .target(Target::Stdout)
            .filter_level(LevelFilter::Warn)
            .filter_module("playhead_player", level)
            .try_init()
    };

    if result.is_err() {
        log::debug!("Logger already initialized, keeping existing logger");
    }
}
