use crate::ir::IrError;
use crate::lexical::TokenizeError;
use crate::partition::PartitionError;

/// Lowering pipeline errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PipelineError {
    #[error("Malformed arguments: {0}")]
    Tokenize(#[from] TokenizeError),

    #[error("Argument partitioning failed: {0}")]
    Partition(#[from] PartitionError),

    #[error("Object IR construction failed: {0}")]
    ObjectIr(#[from] IrError),
}

impl PipelineError {
    pub fn error_code(&self) -> crate::logging::Code {
        match self {
            PipelineError::Tokenize(e) => e.error_code(),
            PipelineError::Partition(e) => e.error_code(),
            PipelineError::ObjectIr(e) => e.error_code(),
        }
    }
}
