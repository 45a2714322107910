//! Subscriber setup: console layer on stderr plus an optional JSON file layer.

use std::path::Path;

use toaster_config::Logging;
use tracing_appender::rolling::RollingFileAppender;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer, fmt};

use crate::cli::FILE_GUARD;

fn appender(path: &Path, rotation: Option<&str>) -> eyre::Result<RollingFileAppender> {
    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    let Some(name) = path.file_name() else {
        eyre::bail!("logging.file has no file name: {}", path.display());
    };
    Ok(match rotation.unwrap_or("never") {
        "never" => tracing_appender::rolling::never(dir, name),
        "daily" => tracing_appender::rolling::daily(dir, name),
        "hourly" => tracing_appender::rolling::hourly(dir, name),
        other => eyre::bail!("unknown logging.rotation {other:?} (never|daily|hourly)"),
    })
}

pub fn init(json: bool, level: &str, logging: &Logging) -> eyre::Result<()> {
    let console_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let console = if json {
        fmt::layer().json().with_writer(std::io::stderr).boxed()
    } else {
        fmt::layer()
            .with_target(false)
            .with_writer(std::io::stderr)
            .boxed()
    }
    .with_filter(console_filter);

    let file = match logging.file.as_deref() {
        Some(path) => {
            let appender = appender(Path::new(path), logging.rotation.as_deref())?;
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let _ = FILE_GUARD.set(guard);
            let filter = EnvFilter::new(logging.level.as_deref().unwrap_or("debug"));
            Some(
                fmt::layer()
                    .json()
                    .with_ansi(false)
                    .with_writer(writer)
                    .with_filter(filter),
            )
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(console)
        .with(file)
        .try_init()?;
    Ok(())
}
