use std::path::Path;
use tracing::{info, warn};
use tracing_appender::non_blocking;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Environment variable naming an optional directory for file logs.
pub const LOG_DIR_ENV: &str = "APOLLO_LOG_DIR";

/// Initialize logging for the harness binaries.
///
/// Console output goes to stderr so stdout only carries results. When
/// `APOLLO_LOG_DIR` is set and writable, a second file layer is added.
pub fn init_cli_logging(service_name: &str) -> Result<(), anyhow::Error> {
    let log_dir = std::env::var(LOG_DIR_ENV)
        .ok()
        .filter(|dir| !dir.trim().is_empty());
    init_logging(service_name, log_dir.as_deref())
}

pub fn init_logging(service_name: &str, log_dir: Option<&str>) -> Result<(), anyhow::Error> {
    // Set up environment filter (can be controlled via RUST_LOG env var)
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    let Some(log_dir) = log_dir.filter(|dir| can_write_logs(dir)) else {
        let console_layer = fmt::layer()
            .with_writer(std::io::stderr)
            .with_ansi(true)
            .with_target(false)
            .compact();

        tracing_subscriber::registry()
            .with(env_filter)
            .with(console_layer)
            .try_init()?;
        return Ok(());
    };

    let rotated = rotate_logs_on_startup(log_dir, service_name);

    let file_appender = tracing_appender::rolling::daily(log_dir, format!("{service_name}.log"));
    let (non_blocking_file, guard_file) = non_blocking(file_appender);

    let file_layer = fmt::layer()
        .with_writer(non_blocking_file)
        .with_ansi(false) // No colors in file logs
        .with_target(true)
        .with_line_number(true);

    let console_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_ansi(true)
        .with_target(false)
        .compact();

    tracing_subscriber::registry()
        .with(env_filter)
        .with(file_layer)
        .with(console_layer)
        .try_init()?;

    // Keep the writer alive for the rest of the process
    std::mem::forget(guard_file);

    if let Err(e) = rotated {
        warn!("Failed to back up previous log file in {log_dir}: {e}");
    }
    info!("Logging initialized - logs will be written to {log_dir}/{service_name}.log");
    Ok(())
}

fn can_write_logs(log_dir: &str) -> bool {
    std::fs::create_dir_all(log_dir)
        .and_then(|_| std::fs::File::create(format!("{log_dir}/.test_write")))
        .map(|_| std::fs::remove_file(format!("{log_dir}/.test_write")))
        .is_ok()
}

pub fn rotate_logs_on_startup(log_dir: &str, service_name: &str) -> Result<(), anyhow::Error> {
    let log_file = format!("{log_dir}/{service_name}.log");
    let log_path = Path::new(&log_file);

    if log_path.exists() {
        let timestamp = chrono::Utc::now().format("%Y%m%d_%H%M%S");
        let backup_file = format!("{log_dir}/{service_name}.{timestamp}.log");

        std::fs::rename(&log_file, &backup_file)?;
        info!("Previous log file backed up to: {backup_file}");
    }

    Ok(())
}
