use chrono::Local;
use eyre::Result;
use fern::Dispatch;

/// Sets up the application logger with console output.
///
/// The level comes from the `RUST_LOG` env var and falls back to `Info`
/// when it is missing or unparsable.
///
/// # Errors
/// * If a global logger was already installed
pub fn setup_logger() -> Result<()> {
    setup_logger_with_level(
        std::env::var("RUST_LOG")
            .map(|level| level.parse().unwrap_or(log::LevelFilter::Info))
            .unwrap_or(log::LevelFilter::Info),
    )
}

/// Sets up the application logger at an explicit level.
///
/// # Errors
/// * If a global logger was already installed
pub fn setup_logger_with_level(level: log::LevelFilter) -> Result<()> {
    Dispatch::new()
        .level(level)
        .chain(std::io::stdout())
        // Format log messages with time, level and the emitting module
        .format(|out, message, record| {
            out.finish(format_args!(
                "{} [{}] {}: {}",
                Local::now().format("%Y-%m-%d %H:%M:%S%.3f"),
                record.level(),
                record.target(),
                message
            ));
        })
        .apply()?;
    Ok(())
}
