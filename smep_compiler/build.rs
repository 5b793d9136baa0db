// build.rs - TOML-driven limit constants for hyperparameter lowering
use std::env;
use std::fs;
use std::path::Path;

#[derive(serde::Deserialize)]
struct CompileTimeConfig {
    lexical: LexicalLimits,
    ir: IrLimits,
    logging: LoggingLimits,
}

#[derive(serde::Deserialize)]
struct LexicalLimits {
    max_token_count: usize,
    max_key_length: usize,
    max_value_length: usize,
}

#[derive(serde::Deserialize)]
struct IrLimits {
    max_nesting_depth: usize,
    max_object_nodes: usize,
    max_positional_index: usize,
}

#[derive(serde::Deserialize)]
struct LoggingLimits {
    log_buffer_size: usize,
    max_log_message_length: usize,
}

fn main() {
    println!("cargo:rerun-if-changed=build.rs");
    println!("cargo:rerun-if-env-changed=SMEP_BUILD_PROFILE");
    println!("cargo:rerun-if-env-changed=SMEP_CONFIG_DIR");

    let profile = env::var("SMEP_BUILD_PROFILE").unwrap_or_else(|_| "development".to_string());
    let config_dir = env::var("SMEP_CONFIG_DIR").unwrap_or_else(|_| "config".to_string());

    // Workspace root is the parent of smep_compiler
    let manifest_dir = env::var("CARGO_MANIFEST_DIR").unwrap();
    let workspace_root = Path::new(&manifest_dir)
        .parent()
        .expect("Could not find workspace root (parent directory)");

    let config_path = workspace_root
        .join(&config_dir)
        .join(format!("{}.toml", profile));

    println!("cargo:rerun-if-changed={}", config_path.display());

    if !config_path.exists() {
        panic!(
            "Configuration file not found: {}\nWorkspace root: {}\nLooking for: {}/{}/{}.toml",
            config_path.display(),
            workspace_root.display(),
            workspace_root.display(),
            config_dir,
            profile
        );
    }

    let config_content = fs::read_to_string(&config_path)
        .unwrap_or_else(|e| panic!("Failed to read {}: {}", config_path.display(), e));

    let config: CompileTimeConfig = toml::from_str(&config_content)
        .unwrap_or_else(|e| panic!("Invalid TOML in {}: {}", config_path.display(), e));

    validate_limits(&config, &profile);
    generate_constants(&config, &profile);
}

fn validate_limits(config: &CompileTimeConfig, profile: &str) {
    const ABSOLUTE_MAX_TOKENS: usize = 1_000_000;
    const ABSOLUTE_MAX_VALUE_LENGTH: usize = 64 * 1024 * 1024;
    const ABSOLUTE_MAX_NESTING_DEPTH: usize = 256;

    if config.lexical.max_token_count > ABSOLUTE_MAX_TOKENS {
        panic!("LIMITS: max_token_count exceeds absolute maximum");
    }

    if config.lexical.max_value_length > ABSOLUTE_MAX_VALUE_LENGTH {
        panic!("LIMITS: max_value_length exceeds absolute maximum");
    }

    if config.ir.max_nesting_depth == 0 || config.ir.max_nesting_depth > ABSOLUTE_MAX_NESTING_DEPTH
    {
        panic!("LIMITS: max_nesting_depth must be within 1..={}", ABSOLUTE_MAX_NESTING_DEPTH);
    }

    if config.ir.max_object_nodes == 0 {
        panic!("LIMITS: max_object_nodes must be positive");
    }

    if config.logging.log_buffer_size < 100 {
        panic!("LIMITS: log_buffer_size too small (min: 100)");
    }

    if profile == "production" && config.ir.max_nesting_depth > 64 {
        panic!("PRODUCTION: max_nesting_depth too high for production");
    }
}

fn generate_constants(config: &CompileTimeConfig, profile: &str) {
    let out_dir = env::var("OUT_DIR").unwrap();
    let output_path = Path::new(&out_dir).join("constants.rs");

    let constants_code = format!(
        r#"
// Generated compile-time constants from TOML configuration
// Profile: {}
// DO NOT EDIT - Generated by build.rs

pub mod compile_time {{
    pub mod lexical {{
        pub const MAX_TOKEN_COUNT: usize = {};
        pub const MAX_KEY_LENGTH: usize = {};
        pub const MAX_VALUE_LENGTH: usize = {};
    }}

    pub mod ir {{
        pub const MAX_NESTING_DEPTH: usize = {};
        pub const MAX_OBJECT_NODES: usize = {};
        pub const MAX_POSITIONAL_INDEX: usize = {};
    }}

    pub mod logging {{
        pub const LOG_BUFFER_SIZE: usize = {};
        pub const MAX_LOG_MESSAGE_LENGTH: usize = {};
    }}
}}
"#,
        profile,
        config.lexical.max_token_count,
        config.lexical.max_key_length,
        config.lexical.max_value_length,
        config.ir.max_nesting_depth,
        config.ir.max_object_nodes,
        config.ir.max_positional_index,
        config.logging.log_buffer_size,
        config.logging.max_log_message_length,
    );

    fs::write(output_path, constants_code).unwrap();
}
