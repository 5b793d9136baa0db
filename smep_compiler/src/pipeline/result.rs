use crate::ir::ObjectForest;
use crate::lexical::{FlatArgs, SuspiciousPair, TokenizerMetrics};
use std::time::Duration;

#[derive(Debug, Clone, Default)]
pub struct LoweringMetrics {
    pub tokenizer: TokenizerMetrics,
    pub plain_count: usize,
    pub compound_count: usize,
    pub root_count: usize,
    pub object_count: usize,
    pub duration: Duration,
}

/// Plain values plus root object IR, ready for materialization
#[derive(Debug, Clone)]
pub struct LoweredArguments {
    pub plain: FlatArgs,
    pub roots: ObjectForest,
    pub warnings: Vec<SuspiciousPair>,
    pub metrics: LoweringMetrics,
}

impl LoweredArguments {
    pub fn log_success(&self) {
        crate::log_success!(
            crate::logging::codes::success::OPERATION_COMPLETED_SUCCESSFULLY,
            "Hyperparameter lowering succeeded",
            "plain" => self.metrics.plain_count,
            "roots" => self.metrics.root_count,
            "objects" => self.metrics.object_count,
            "warnings" => self.warnings.len(),
            "duration_ms" => format!("{:.3}", self.metrics.duration.as_secs_f64() * 1000.0)
        );
    }
}
