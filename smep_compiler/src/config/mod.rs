//! Configuration module for hyperparameter lowering
//!
//! Limits are generated at compile time from `config/<profile>.toml`.
//! Behavioral preferences are read from `SMEP_*` environment variables or a TOML file.

include!(concat!(env!("OUT_DIR"), "/constants.rs"));

pub mod runtime;

pub use runtime::{
    IrPreferences, LoggingPreferences, MaterializePreferences, RuntimeConfig,
    TokenizerPreferences,
};

/// Build information and configuration metadata
pub mod build_info {
    /// Returns the configuration profile used during build
    pub fn profile() -> &'static str {
        option_env!("SMEP_BUILD_PROFILE").unwrap_or("development")
    }

    /// Returns the configuration directory used during build
    pub fn config_dir() -> &'static str {
        option_env!("SMEP_CONFIG_DIR").unwrap_or("config")
    }

    /// Returns configuration source information
    pub fn source_info() -> String {
        format!("Generated from {}/{}.toml", config_dir(), profile())
    }
}

/// Human-readable summary of the active limits
pub fn limits_summary() -> String {
    format!(
        "Lowering limits ({}):\n\
         - Max tokens: {}\n\
         - Max key length: {}\n\
         - Max value length: {}\n\
         - Max nesting depth: {}\n\
         - Max object nodes: {}\n\
         - Max positional index: {}",
        build_info::source_info(),
        compile_time::lexical::MAX_TOKEN_COUNT,
        compile_time::lexical::MAX_KEY_LENGTH,
        compile_time::lexical::MAX_VALUE_LENGTH,
        compile_time::ir::MAX_NESTING_DEPTH,
        compile_time::ir::MAX_OBJECT_NODES,
        compile_time::ir::MAX_POSITIONAL_INDEX,
    )
}
