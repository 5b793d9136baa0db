//! Global logging for the lowering pipeline
//!
//! A write-once global `LoggingService` receives coded events from every stage.
//! Until it is initialized the macros drop everything except warnings, which
//! fall back to stderr.

pub mod codes;
pub mod config;
pub mod events;
pub mod macros;
pub mod service;

use std::sync::{Arc, OnceLock};

pub use codes::Code;
pub use events::{LogEvent, LogLevel};
pub use service::{ConsoleLogger, Logger, LoggingService, MemoryLogger, StructuredLogger};

static GLOBAL_LOGGER: OnceLock<Arc<LoggingService>> = OnceLock::new();

// ============================================================================
// INITIALIZATION
// ============================================================================

/// Initialize global logging from runtime preferences
pub fn init_global_logging() -> Result<(), String> {
    config::validate_config().map_err(|e| format!("Configuration validation failed: {}", e))?;

    let logging_service = Arc::new(service::create_configured_service());
    init_global_logging_with_service(logging_service.clone())?;

    logging_service.log_event(LogEvent::success(
        codes::success::SYSTEM_INITIALIZATION_COMPLETED,
        "Global logging system initialized",
    ));

    Ok(())
}

/// Initialize with a custom service (SDK bridges, tests)
pub fn init_global_logging_with_service(service: Arc<LoggingService>) -> Result<(), String> {
    for code in [
        codes::system::INTERNAL_ERROR,
        codes::tokenizer::DANGLING_FLAG,
        codes::ir::MISSING_CLASS_DECLARATION,
        codes::materialize::CONSTRUCTION_FAILED,
    ] {
        if codes::get_error_metadata(code.as_str()).is_none() {
            return Err(format!("Missing metadata for error code: {}", code));
        }
    }

    GLOBAL_LOGGER
        .set(service)
        .map_err(|_| "Global logger already initialized".to_string())
}

pub fn is_initialized() -> bool {
    GLOBAL_LOGGER.get().is_some()
}

pub fn try_get_global_logger() -> Option<&'static LoggingService> {
    GLOBAL_LOGGER.get().map(|service| service.as_ref())
}

/// Whether debug events would reach a logger
pub fn debug_enabled() -> bool {
    try_get_global_logger()
        .map(|logger| logger.should_log(LogLevel::Debug))
        .unwrap_or(false)
}

// ============================================================================
// MACRO SUPPORT FUNCTIONS
// ============================================================================

fn with_context(mut event: LogEvent, context: Vec<(&str, &str)>) -> LogEvent {
    for (key, value) in context {
        event = event.with_context(key, value);
    }
    event
}

fn dispatch(event: LogEvent, context: Vec<(&str, &str)>) {
    if let Some(logger) = try_get_global_logger() {
        logger.log_event(with_context(event, context));
    }
}

/// Log a coded event (used by `log_error!`, `log_warning!`, `log_success!`)
///
/// Errors also travel back as `Err` values; warnings have no other channel,
/// so without a service they are written to stderr.
pub fn log_with_context(level: LogLevel, code: Code, message: &str, context: Vec<(&str, &str)>) {
    if try_get_global_logger().is_none() {
        if level == LogLevel::Warning {
            eprintln!("{}", fallback_line(code, message, context));
        }
        return;
    }

    let event = match level {
        LogLevel::Error => LogEvent::error(code, message),
        LogLevel::Warning => LogEvent::warning(code, message),
        LogLevel::Info | LogLevel::Debug => LogEvent::success(code, message),
    };
    dispatch(event, context);
}

fn fallback_line(code: Code, message: &str, context: Vec<(&str, &str)>) -> String {
    with_context(LogEvent::warning(code, message), context).format()
}

pub fn log_info_with_context(message: &str, context: Vec<(&str, &str)>) {
    if try_get_global_logger().is_some() {
        dispatch(LogEvent::info(message), context);
    }
}

pub fn log_debug_with_context(message: &str, context: Vec<(&str, &str)>) {
    if try_get_global_logger().is_some() {
        dispatch(LogEvent::debug(message), context);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_warning_fallback_line() {
        let line = fallback_line(
            codes::tokenizer::SUSPICIOUS_PAIR,
            "Value looks like a flag",
            vec![("key", "lr"), ("value", "--epochs")],
        );
        assert_eq!(
            line,
            "[WARN] W020 - Value looks like a flag {key=lr, value=--epochs}"
        );
    }
}
