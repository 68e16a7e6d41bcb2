use anyhow::{Context, Result};
use log::LevelFilter;
use log4rs::append::console::{ConsoleAppender, Target};
use log4rs::config::{Appender, Root};
use log4rs::encode::pattern::PatternEncoder;
use log4rs::{Config, Handle};

// ISO 8601 timestamp and color coded level tag
const LOG_PATTERN: &str = "{d(%Y-%m-%dT%H:%M:%S)} {h({l})} {t} - {m}{n}";

pub fn build_config(level: LevelFilter) -> Result<Config> {
    // Logs go to stderr so stdout stays free for the summary.
    let stderr = ConsoleAppender::builder()
        .target(Target::Stderr)
        .encoder(Box::new(PatternEncoder::new(LOG_PATTERN)))
        .build();
    Config::builder()
        .appender(Appender::builder().build("stderr", Box::new(stderr)))
        .build(Root::builder().appender("stderr").build(level))
        .context("Failed to build logging configuration")
}

/// Installs the global logger. Call once per process.
pub fn init(level: LevelFilter) -> Result<Handle> {
    let config = build_config(level)?;
    log4rs::init_config(config).context("Failed to install logger")
}
