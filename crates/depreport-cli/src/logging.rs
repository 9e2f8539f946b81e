use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::EnvFilter;

/// Numeric log level for a `-v` count: 40 (error) down to 10 (debug).
pub fn calc_log_level(count: u8) -> u32 {
    40u32.saturating_sub(u32::from(count) * 10).max(10)
}

pub fn level_filter(level: u32) -> LevelFilter {
    match level {
        40.. => LevelFilter::ERROR,
        30..=39 => LevelFilter::WARN,
        20..=29 => LevelFilter::INFO,
        _ => LevelFilter::DEBUG,
    }
}

/// Install the stdout subscriber. `RUST_LOG` overrides the verbosity.
pub fn init(verbose: u8) {
    let default = level_filter(calc_log_level(verbose));
    let filter = EnvFilter::builder()
        .with_default_directive(default.into())
        .from_env_lossy();
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stdout)
        .with_target(false)
        .init();
}
