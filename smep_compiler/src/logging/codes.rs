//! Error, warning and success codes with their classification metadata
//!
//! Every stage error maps to one of these codes through its `error_code()` method.

use std::collections::HashMap;
use std::sync::OnceLock;

// ============================================================================
// CODE WRAPPER TYPE
// ============================================================================

/// Universal code wrapper for error, warning and success codes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Code(&'static str);

impl Code {
    pub const fn new(code: &'static str) -> Self {
        Self(code)
    }

    pub fn as_str(&self) -> &'static str {
        self.0
    }
}

impl std::fmt::Display for Code {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ============================================================================
// ERROR CLASSIFICATION TYPES
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Critical = 0,
    High = 1,
    Medium = 2,
    Low = 3,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Critical => "Critical",
            Severity::High => "High",
            Severity::Medium => "Medium",
            Severity::Low => "Low",
        }
    }
}

/// Complete metadata for a code
#[derive(Debug, Clone)]
pub struct ErrorMetadata {
    pub code: &'static str,
    pub category: &'static str,
    pub severity: Severity,
    pub recoverable: bool,
    pub requires_halt: bool,
    pub description: &'static str,
    pub recommended_action: &'static str,
}

impl ErrorMetadata {
    pub fn new(
        code: &'static str,
        category: &'static str,
        severity: Severity,
        recoverable: bool,
        requires_halt: bool,
        description: &'static str,
        recommended_action: &'static str,
    ) -> Self {
        Self {
            code,
            category,
            severity,
            recoverable,
            requires_halt,
            description,
            recommended_action,
        }
    }
}

// ============================================================================
// CODE CONSTANTS
// ============================================================================

pub mod system {
    use super::Code;

    pub const INTERNAL_ERROR: Code = Code::new("ERR001");
    pub const INITIALIZATION_FAILURE: Code = Code::new("ERR002");
}

/// Flat argument tokenizer
pub mod tokenizer {
    use super::Code;

    pub const DANGLING_FLAG: Code = Code::new("E020");
    pub const MISSING_FLAG_PREFIX: Code = Code::new("E021");
    pub const EMPTY_KEY: Code = Code::new("E022");
    pub const TOO_MANY_TOKENS: Code = Code::new("E023");
    pub const KEY_TOO_LONG: Code = Code::new("E024");
    pub const VALUE_TOO_LONG: Code = Code::new("E025");

    pub const SUSPICIOUS_PAIR: Code = Code::new("W020");
}

pub mod partition {
    use super::Code;

    pub const CONFLICTING_KEYS: Code = Code::new("E030");
}

/// Object IR construction and serialization
pub mod ir {
    use super::Code;

    pub const MISSING_CLASS_DECLARATION: Code = Code::new("E040");
    pub const INVALID_CLASS_REFERENCE: Code = Code::new("E041");
    pub const EMPTY_SEGMENT: Code = Code::new("E042");
    pub const DUPLICATE_ARGUMENT: Code = Code::new("E043");
    pub const NESTING_TOO_DEEP: Code = Code::new("E044");
    pub const TOO_MANY_OBJECTS: Code = Code::new("E045");
    pub const POSITIONAL_INDEX_TOO_LARGE: Code = Code::new("E046");
    pub const MALFORMED_ENCODING: Code = Code::new("E047");
}

pub mod materialize {
    use super::Code;

    pub const SPARSE_POSITIONAL_ARGS: Code = Code::new("E050");
    pub const UNRESOLVABLE_CLASS: Code = Code::new("E051");
    pub const CONSTRUCTION_FAILED: Code = Code::new("E052");
    pub const ARGUMENT_BINDING: Code = Code::new("E053");
}

pub mod registry {
    use super::Code;

    pub const DUPLICATE_CLASS: Code = Code::new("E060");
    pub const INVALID_CLASS_NAME: Code = Code::new("E061");
}

/// Entrypoint protocol adapter
pub mod protocol {
    use super::Code;

    pub const CONFIGURATION_ERROR: Code = Code::new("E070");
    pub const DIRECTORY_CREATION_FAILED: Code = Code::new("E071");
    pub const INVALID_PROTOCOL_ARGUMENT: Code = Code::new("E072");
}

pub mod success {
    use super::Code;

    pub const OPERATION_COMPLETED_SUCCESSFULLY: Code = Code::new("I001");
    pub const SYSTEM_INITIALIZATION_COMPLETED: Code = Code::new("I004");
    pub const TOKENIZATION_COMPLETE: Code = Code::new("I020");
    pub const PARTITION_COMPLETE: Code = Code::new("I030");
    pub const IR_CONSTRUCTION_COMPLETE: Code = Code::new("I040");
    pub const MATERIALIZATION_COMPLETE: Code = Code::new("I050");
    pub const REGISTRY_READY: Code = Code::new("I060");
    pub const PROTOCOL_RESOLVED: Code = Code::new("I070");
}

// ============================================================================
// METADATA REGISTRY
// ============================================================================

static ERROR_REGISTRY: OnceLock<HashMap<&'static str, ErrorMetadata>> = OnceLock::new();

fn get_error_registry() -> &'static HashMap<&'static str, ErrorMetadata> {
    ERROR_REGISTRY.get_or_init(|| {
        let entries = [
            // System
            ErrorMetadata::new(
                "ERR001",
                "System",
                Severity::Critical,
                false,
                true,
                "Critical internal error",
                "File a bug report with the failing argument list",
            ),
            ErrorMetadata::new(
                "ERR002",
                "System",
                Severity::Critical,
                false,
                true,
                "Logging or configuration initialization failed",
                "Check SMEP_* environment variables and configuration files",
            ),
            // Tokenizer
            ErrorMetadata::new(
                "E020",
                "Tokenizer",
                Severity::High,
                false,
                true,
                "Flag has no following value",
                "Supply a value after every --flag",
            ),
            ErrorMetadata::new(
                "E021",
                "Tokenizer",
                Severity::High,
                false,
                true,
                "Flag token does not start with --",
                "Prefix every key with --",
            ),
            ErrorMetadata::new(
                "E022",
                "Tokenizer",
                Severity::High,
                false,
                true,
                "Flag token has an empty key",
                "Use --name instead of a bare --",
            ),
            ErrorMetadata::new(
                "E023",
                "Tokenizer",
                Severity::High,
                false,
                true,
                "Argument list exceeds the token limit",
                "Reduce the number of hyperparameters or raise max_token_count",
            ),
            ErrorMetadata::new(
                "E024",
                "Tokenizer",
                Severity::Medium,
                false,
                true,
                "Key exceeds the maximum key length",
                "Shorten the key or raise max_key_length",
            ),
            ErrorMetadata::new(
                "E025",
                "Tokenizer",
                Severity::Medium,
                false,
                true,
                "Value exceeds the maximum value length",
                "Pass large payloads through a channel instead of a hyperparameter",
            ),
            ErrorMetadata::new(
                "W020",
                "Tokenizer",
                Severity::Low,
                true,
                false,
                "Value token looks like a flag",
                "Check for a missing value earlier in the argument list",
            ),
            // Partition
            ErrorMetadata::new(
                "E030",
                "Partition",
                Severity::High,
                false,
                true,
                "Plain key collides with an object root",
                "Rename the plain key or the dotted object path",
            ),
            // IR
            ErrorMetadata::new(
                "E040",
                "ObjectIR",
                Severity::High,
                false,
                true,
                "Argument targets an object with no __class__ declaration",
                "Add --<path>.__class__ for the owning object",
            ),
            ErrorMetadata::new(
                "E041",
                "ObjectIR",
                Severity::High,
                false,
                true,
                "__class__ value is not a class name",
                "Pass a dotted class name as the __class__ value",
            ),
            ErrorMetadata::new(
                "E042",
                "ObjectIR",
                Severity::High,
                false,
                true,
                "Dotted key contains an empty segment",
                "Remove doubled, leading or trailing dots",
            ),
            ErrorMetadata::new(
                "E043",
                "ObjectIR",
                Severity::High,
                false,
                true,
                "Argument slot assigned more than once",
                "Remove the duplicate assignment",
            ),
            ErrorMetadata::new(
                "E044",
                "ObjectIR",
                Severity::High,
                false,
                true,
                "Object nesting exceeds the depth limit",
                "Flatten the object graph or raise max_nesting_depth",
            ),
            ErrorMetadata::new(
                "E045",
                "ObjectIR",
                Severity::High,
                false,
                true,
                "Too many object declarations",
                "Reduce declared objects or raise max_object_nodes",
            ),
            ErrorMetadata::new(
                "E046",
                "ObjectIR",
                Severity::Medium,
                false,
                true,
                "Positional index exceeds the limit",
                "Use a smaller positional index or a keyword argument",
            ),
            ErrorMetadata::new(
                "E047",
                "ObjectIR",
                Severity::Medium,
                false,
                true,
                "Serialized object IR is malformed",
                "Check the __kind__, class, args and kwargs fields",
            ),
            // Materializer
            ErrorMetadata::new(
                "E050",
                "Materializer",
                Severity::High,
                false,
                true,
                "Positional arguments have gaps",
                "Supply every positional index from 0 upwards",
            ),
            ErrorMetadata::new(
                "E051",
                "Materializer",
                Severity::High,
                false,
                true,
                "Class is not registered",
                "Register the class or fix the __class__ value",
            ),
            ErrorMetadata::new(
                "E052",
                "Materializer",
                Severity::High,
                false,
                true,
                "Constructor rejected its arguments",
                "Inspect the underlying constructor error",
            ),
            ErrorMetadata::new(
                "E053",
                "Materializer",
                Severity::Medium,
                false,
                true,
                "Argument could not be bound to a constructor parameter",
                "Check argument names and types against the constructor",
            ),
            // Registry
            ErrorMetadata::new(
                "E060",
                "Registry",
                Severity::Medium,
                false,
                true,
                "Class name registered twice",
                "Unregister the existing class first",
            ),
            ErrorMetadata::new(
                "E061",
                "Registry",
                Severity::Medium,
                false,
                true,
                "Class name is not a dotted identifier path",
                "Use names like module.Class",
            ),
            // Protocol
            ErrorMetadata::new(
                "E070",
                "Protocol",
                Severity::High,
                false,
                true,
                "Protocol configuration is invalid",
                "Check the protocol TOML file",
            ),
            ErrorMetadata::new(
                "E071",
                "Protocol",
                Severity::High,
                false,
                true,
                "Could not create a local directory",
                "Check permissions on the model and output directories",
            ),
            ErrorMetadata::new(
                "E072",
                "Protocol",
                Severity::Medium,
                false,
                true,
                "Protocol argument is missing its value",
                "Pass a value after the protocol flag",
            ),
        ];

        entries
            .into_iter()
            .map(|metadata| (metadata.code, metadata))
            .collect()
    })
}

// ============================================================================
// CLASSIFICATION FUNCTIONS
// ============================================================================

pub fn get_error_metadata(code: &str) -> Option<&'static ErrorMetadata> {
    get_error_registry().get(code)
}

pub fn get_severity(code: &str) -> Severity {
    get_error_registry()
        .get(code)
        .map(|metadata| metadata.severity)
        .unwrap_or(Severity::Medium)
}

pub fn is_recoverable(code: &str) -> bool {
    get_error_registry()
        .get(code)
        .map(|metadata| metadata.recoverable)
        .unwrap_or(true)
}

pub fn requires_halt(code: &str) -> bool {
    get_error_registry()
        .get(code)
        .map(|metadata| metadata.requires_halt)
        .unwrap_or(false)
}

pub fn get_description(code: &str) -> &'static str {
    get_error_registry()
        .get(code)
        .map(|metadata| metadata.description)
        .unwrap_or("Unknown error")
}

pub fn get_action(code: &str) -> &'static str {
    get_error_registry()
        .get(code)
        .map(|metadata| metadata.recommended_action)
        .unwrap_or("No specific action available")
}

pub fn get_category(code: &str) -> &'static str {
    get_error_registry()
        .get(code)
        .map(|metadata| metadata.category)
        .unwrap_or("Unknown")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_error_code_has_metadata() {
        let all = [
            system::INTERNAL_ERROR,
            system::INITIALIZATION_FAILURE,
            tokenizer::DANGLING_FLAG,
            tokenizer::MISSING_FLAG_PREFIX,
            tokenizer::EMPTY_KEY,
            tokenizer::TOO_MANY_TOKENS,
            tokenizer::KEY_TOO_LONG,
            tokenizer::VALUE_TOO_LONG,
            tokenizer::SUSPICIOUS_PAIR,
            partition::CONFLICTING_KEYS,
            ir::MISSING_CLASS_DECLARATION,
            ir::INVALID_CLASS_REFERENCE,
            ir::EMPTY_SEGMENT,
            ir::DUPLICATE_ARGUMENT,
            ir::NESTING_TOO_DEEP,
            ir::TOO_MANY_OBJECTS,
            ir::POSITIONAL_INDEX_TOO_LARGE,
            ir::MALFORMED_ENCODING,
            materialize::SPARSE_POSITIONAL_ARGS,
            materialize::UNRESOLVABLE_CLASS,
            materialize::CONSTRUCTION_FAILED,
            materialize::ARGUMENT_BINDING,
            registry::DUPLICATE_CLASS,
            registry::INVALID_CLASS_NAME,
            protocol::CONFIGURATION_ERROR,
            protocol::DIRECTORY_CREATION_FAILED,
            protocol::INVALID_PROTOCOL_ARGUMENT,
        ];

        for code in all {
            assert!(
                get_error_metadata(code.as_str()).is_some(),
                "missing metadata for {}",
                code
            );
        }
    }

    #[test]
    fn test_classification() {
        assert_eq!(get_severity("ERR001"), Severity::Critical);
        assert!(requires_halt("E040"));
        assert!(is_recoverable("W020"));
        assert_eq!(get_category("E051"), "Materializer");
        assert_eq!(get_description("X999"), "Unknown error");
    }
}
