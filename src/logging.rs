use anyhow::{Context, Result, anyhow};
use std::fs::{self, OpenOptions};
use std::path::Path;
use std::sync::Mutex;
use tracing_subscriber::EnvFilter;

pub const LOG_ENV: &str = "SUPPORT_CHAT_LOG";
const LOG_FILE: &str = "support-chat.log";
const FILE_DEFAULT: &str = "info";
/// Only problems reach the terminal; stdout carries the reply
const STDERR_DEFAULT: &str = "warn";

/// Log to a file under `log_dir`, keeping the terminal free for the UI
pub fn init_file(log_dir: &Path) -> Result<()> {
    fs::create_dir_all(log_dir).context("Failed to create log directory")?;
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_dir.join(LOG_FILE))
        .context("Failed to open log file")?;

    tracing_subscriber::fmt()
        .with_env_filter(filter(FILE_DEFAULT))
        .with_ansi(false)
        .with_writer(Mutex::new(file))
        .try_init()
        .map_err(|e| anyhow!("Failed to install logger: {e}"))
}

/// Log to stderr, for one-shot commands whose stdout carries the reply
pub fn init_stderr() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(filter(STDERR_DEFAULT))
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|e| anyhow!("Failed to install logger: {e}"))
}

fn filter(default: &str) -> EnvFilter {
    filter_from(std::env::var(LOG_ENV).ok().as_deref(), default)
}

fn filter_from(directives: Option<&str>, default: &str) -> EnvFilter {
    directives
        .and_then(|d| EnvFilter::try_new(d).ok())
        .unwrap_or_else(|| EnvFilter::new(default))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_differ_per_sink() {
        assert_eq!(filter_from(None, FILE_DEFAULT).to_string(), "info");
        assert_eq!(filter_from(None, STDERR_DEFAULT).to_string(), "warn");
    }

    #[test]
    fn env_directives_win_over_default() {
        let filter = filter_from(Some("support_chat=debug"), STDERR_DEFAULT);
        assert_eq!(filter.to_string(), "support_chat=debug");
    }

    #[test]
    fn unparsable_directives_fall_back() {
        let filter = filter_from(Some("support_chat=loud"), FILE_DEFAULT);
        assert_eq!(filter.to_string(), "info");
    }
}
