//! Object IR errors

use crate::logging::codes;

pub type IrResult<T> = Result<T, IrError>;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IrError {
    #[error("Argument '{key}' targets '{owner}', which has no '{owner}.__class__' declaration")]
    MissingClassDeclaration { key: String, owner: String },

    #[error("'{path}.__class__' must be a class name, found a {found} value")]
    InvalidClassReference { path: String, found: String },

    #[error("Key '{key}' contains an empty segment")]
    EmptySegment { key: String },

    #[error("Argument '{slot}' of '{path}' is assigned more than once")]
    DuplicateArgument { path: String, slot: String },

    #[error("Object '{path}' is nested {depth} levels deep (limit {limit})")]
    NestingTooDeep {
        path: String,
        depth: usize,
        limit: usize,
    },

    #[error("Too many object declarations: {count} (limit {limit})")]
    TooManyObjects { count: usize, limit: usize },

    #[error("Positional index '{index}' in '{key}' exceeds the limit of {limit}")]
    PositionalIndexTooLarge {
        key: String,
        index: String,
        limit: usize,
    },

    #[error("Positional arguments of '{path}' skip index {missing}")]
    PositionalGap { path: String, missing: usize },

    #[error("Malformed object encoding at '{path}': {reason}")]
    MalformedEncoding { path: String, reason: String },
}

impl IrError {
    pub fn error_code(&self) -> crate::logging::Code {
        match self {
            IrError::MissingClassDeclaration { .. } => codes::ir::MISSING_CLASS_DECLARATION,
            IrError::InvalidClassReference { .. } => codes::ir::INVALID_CLASS_REFERENCE,
            IrError::EmptySegment { .. } => codes::ir::EMPTY_SEGMENT,
            IrError::DuplicateArgument { .. } => codes::ir::DUPLICATE_ARGUMENT,
            IrError::NestingTooDeep { .. } => codes::ir::NESTING_TOO_DEEP,
            IrError::TooManyObjects { .. } => codes::ir::TOO_MANY_OBJECTS,
            IrError::PositionalIndexTooLarge { .. } => codes::ir::POSITIONAL_INDEX_TOO_LARGE,
            IrError::PositionalGap { .. } => codes::materialize::SPARSE_POSITIONAL_ARGS,
            IrError::MalformedEncoding { .. } => codes::ir::MALFORMED_ENCODING,
        }
    }

    pub fn missing_class_declaration(key: &str, owner: &str) -> Self {
        Self::MissingClassDeclaration {
            key: key.to_string(),
            owner: owner.to_string(),
        }
    }

    pub fn duplicate_argument(path: &str, slot: impl std::fmt::Display) -> Self {
        Self::DuplicateArgument {
            path: path.to_string(),
            slot: slot.to_string(),
        }
    }

    pub fn malformed(path: &str, reason: &str) -> Self {
        Self::MalformedEncoding {
            path: path.to_string(),
            reason: reason.to_string(),
        }
    }
}
