//! Lowering of CLI-style hyperparameters into typed values and object IR

pub mod config;
pub mod inference;
pub mod ir;
pub mod lexical;
#[macro_use]
pub mod logging;
pub mod partition;
pub mod pipeline;
pub mod values;

// Re-export key types for library consumers
pub use inference::infer_value;
pub use ir::{IrError, IrValue, ObjectForest, ObjectNode};
pub use lexical::{FlatArgs, TokenizeError};
pub use pipeline::{lower_arguments, LoweredArguments, PipelineError};
pub use values::Value;
