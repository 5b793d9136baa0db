//! Opinionated logger that behaves the same on and off SageMaker
//!
//! Training containers may swallow stderr, so on SageMaker every record goes
//! to stdout without ANSI styling. Locally records go to stderr as usual.
//! Coded pipeline events are forwarded into the same `log` output.

use crate::protocol;
use chrono::Local;
use env_logger::{Builder, Env, Target, WriteStyle};
use log::{Level, LevelFilter};
use smep_compiler::logging::{self, LogEvent, LogLevel, Logger, LoggingService};
use std::io::Write;
use std::sync::Arc;

pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Target name used for forwarded pipeline events
pub const PIPELINE_TARGET: &str = "smep";

#[derive(Debug, thiserror::Error)]
pub enum LoggerSetupError {
    #[error("A global logger is already installed: {0}")]
    AlreadyInstalled(#[from] log::SetLoggerError),

    #[error("Pipeline logging bridge failed: {0}")]
    Bridge(String),
}

/// Install `env_logger` with the `[time] [LEVEL] target message` format.
///
/// `RUST_LOG` still overrides `level`. The pipeline's coded events are bridged
/// into `log` unless a pipeline logger was already set up.
pub fn setup_opinionated_logger(name: &str, level: LevelFilter) -> Result<(), LoggerSetupError> {
    let on_sagemaker = protocol::is_on_sagemaker();

    let mut builder = Builder::from_env(Env::default().default_filter_or(level.as_str()));
    builder.filter_module(name, level);
    builder.filter_module(PIPELINE_TARGET, level);
    builder.format(|buf, record| {
        writeln!(
            buf,
            "{}",
            format_line(
                &Local::now().format(TIMESTAMP_FORMAT).to_string(),
                record.level(),
                record.target(),
                &record.args().to_string(),
            )
        )
    });

    if on_sagemaker {
        builder.target(Target::Stdout).write_style(WriteStyle::Never);
    } else {
        builder.target(Target::Stderr);
    }

    builder.try_init()?;

    if !logging::is_initialized() {
        let service = Arc::new(LoggingService::new(
            Arc::new(LogBridge),
            to_event_level(level),
        ));
        logging::init_global_logging_with_service(service).map_err(LoggerSetupError::Bridge)?;
    }

    log::debug!(
        target: name,
        "logger ready: level={}, on_sagemaker={}, stream={}",
        level,
        on_sagemaker,
        if on_sagemaker { "stdout" } else { "stderr" }
    );

    Ok(())
}

pub fn format_line(timestamp: &str, level: Level, target: &str, message: &str) -> String {
    format!("[{}] [{}] {} {}", timestamp, level, target, message)
}

/// Forwards pipeline `LogEvent`s into the `log` facade
pub struct LogBridge;

impl Logger for LogBridge {
    fn log(&self, event: &LogEvent) {
        log::log!(target: PIPELINE_TARGET, to_log_level(event.level), "{}", bridge_message(event));
    }
}

fn bridge_message(event: &LogEvent) -> String {
    let mut message = format!("{} - {}", event.code.as_str(), event.message);
    if !event.context.is_empty() {
        let pairs: Vec<String> = event
            .context
            .iter()
            .map(|(key, value)| format!("{}={}", key, value))
            .collect();
        message.push_str(&format!(" {{{}}}", pairs.join(", ")));
    }
    message
}

pub fn to_log_level(level: LogLevel) -> Level {
    match level {
        LogLevel::Error => Level::Error,
        LogLevel::Warning => Level::Warn,
        LogLevel::Info => Level::Info,
        LogLevel::Debug => Level::Debug,
    }
}

pub fn to_event_level(filter: LevelFilter) -> LogLevel {
    match filter {
        LevelFilter::Off | LevelFilter::Error => LogLevel::Error,
        LevelFilter::Warn => LogLevel::Warning,
        LevelFilter::Info => LogLevel::Info,
        LevelFilter::Debug | LevelFilter::Trace => LogLevel::Debug,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use smep_compiler::logging::codes;

    #[test]
    fn test_line_format() {
        let line = format_line("2024-01-02 03:04:05", Level::Info, "entrypoint", "Epoch 1");
        assert_eq!(line, "[2024-01-02 03:04:05] [INFO] entrypoint Epoch 1");
    }

    #[test]
    fn test_bridge_message_drops_level() {
        let event = LogEvent::error(codes::tokenizer::DANGLING_FLAG, "Flag has no value")
            .with_context("key", "epochs");
        assert_eq!(bridge_message(&event), "E020 - Flag has no value {key=epochs}");
    }

    #[test]
    fn test_level_mapping() {
        assert_eq!(to_log_level(LogLevel::Warning), Level::Warn);
        assert_eq!(to_event_level(LevelFilter::Trace), LogLevel::Debug);
        assert_eq!(to_event_level(LevelFilter::Off), LogLevel::Error);
    }
}
