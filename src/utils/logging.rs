use std::{path::Path, sync::LazyLock};

use anyhow::Result;
use tracing::level_filters::LevelFilter;
use tracing_appender::rolling::Rotation;
use tracing_subscriber::fmt::writer::MakeWriterExt;

pub const SERVER_PREFIX: &str = "server";

/// Sets up logging into rolling files under `<data_path>/logs`, with an
/// optional stdout tee for running in a console.
pub fn enable_logging(
    prefix: &str,
    data_path: &Path,
    log_level: Option<LevelFilter>,
    show_std: bool,
) -> Result<()> {
    let appender = tracing_appender::rolling::Builder::new()
        .rotation(Rotation::DAILY)
        .max_log_files(5)
        .filename_prefix(prefix)
        .build(data_path.join("logs"))?;

    let stdout = std::io::stdout.with_filter(move |_| show_std);

    let level = log_level
        .map(|v| v.to_string())
        .unwrap_or_else(|| std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()));

    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::new(format!(
            "{}={level}",
            env!("CARGO_PKG_NAME").replace("-", "_"),
        )))
        .with_writer(stdout.and(appender))
        .pretty()
        .init();
    Ok(())
}

/// Console-only logging for the one-shot terminal commands, which shouldn't
/// leave a logs directory next to the record files.
pub fn enable_console_logging(log_level: Option<LevelFilter>) -> Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(log_level.unwrap_or(LevelFilter::WARN))
        .init();
    Ok(())
}

pub static TEST_LOGGING: LazyLock<()> = LazyLock::new(|| {
    tracing_subscriber::fmt()
        .with_max_level(LevelFilter::TRACE)
        .with_test_writer()
        .pretty()
        .init()
});
