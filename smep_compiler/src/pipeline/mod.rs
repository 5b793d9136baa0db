//! Tokenize -> partition -> object IR

mod error;
mod result;

pub use error::PipelineError;
pub use result::{LoweredArguments, LoweringMetrics};

use crate::config::runtime::RuntimeConfig;
use crate::ir::ObjectIrBuilder;
use crate::lexical::ArgumentTokenizer;
use crate::partition;
use std::time::Instant;

/// Lower raw CLI tokens into plain values and root object IR
pub fn lower_arguments<S: AsRef<str>>(tokens: &[S]) -> Result<LoweredArguments, PipelineError> {
    lower_arguments_with_config(tokens, &RuntimeConfig::default())
}

pub fn lower_arguments_with_config<S: AsRef<str>>(
    tokens: &[S],
    config: &RuntimeConfig,
) -> Result<LoweredArguments, PipelineError> {
    let start_time = Instant::now();
    crate::log_info!("Lowering hyperparameters", "tokens" => tokens.len());

    // Stage 1: tokenize + infer
    let tokenized = ArgumentTokenizer::with_preferences(config.tokenizer.clone()).tokenize(tokens)?;

    // Stage 2: plain / compound split
    let split = if config.ir.reject_conflicting_keys {
        partition::partition_checked(tokenized.args)?
    } else {
        partition::partition(tokenized.args)
    };

    // Stage 3: object IR
    let roots = ObjectIrBuilder::with_preferences(config.ir.clone()).build(&split.compound)?;

    let metrics = LoweringMetrics {
        tokenizer: tokenized.metrics,
        plain_count: split.plain.len(),
        compound_count: split.compound.len(),
        root_count: roots.len(),
        object_count: roots.node_count(),
        duration: start_time.elapsed(),
    };

    let lowered = LoweredArguments {
        plain: split.plain,
        roots,
        warnings: tokenized.warnings,
        metrics,
    };
    lowered.log_success();

    Ok(lowered)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::IrValue;
    use crate::lexical::TokenizeError;
    use crate::values::Value;
    use assert_matches::assert_matches;

    #[test]
    fn test_plain_and_object_arguments() {
        let lowered = lower_arguments(&[
            "--epochs",
            "3",
            "--trainer.__class__",
            "mymodule.Trainer",
            "--trainer.epochs",
            "100",
            "--trainer.0",
            "abcd",
        ])
        .unwrap();

        assert_eq!(lowered.plain.get("epochs"), Some(&Value::Int(3)));
        assert_eq!(lowered.roots.len(), 1);
        let trainer = lowered.roots.get("trainer").unwrap();
        assert_eq!(
            trainer.named_args.get("epochs"),
            Some(&IrValue::Value(Value::Int(100)))
        );
        assert_eq!(lowered.metrics.plain_count, 1);
        assert_eq!(lowered.metrics.compound_count, 3);
        assert_eq!(lowered.metrics.object_count, 1);
    }

    #[test]
    fn test_stage_errors_are_wrapped() {
        assert_matches!(
            lower_arguments(&["--epochs"]),
            Err(PipelineError::Tokenize(TokenizeError::DanglingFlag { .. }))
        );
        assert_matches!(
            lower_arguments(&["--t", "1", "--t.__class__", "X"]),
            Err(PipelineError::Partition(_))
        );
        assert_matches!(
            lower_arguments(&["--t.x", "1"]),
            Err(PipelineError::ObjectIr(_))
        );
    }

    #[test]
    fn test_conflict_check_can_be_disabled() {
        let mut config = RuntimeConfig::default();
        config.ir.reject_conflicting_keys = false;

        let lowered =
            lower_arguments_with_config(&["--t", "1", "--t.__class__", "X"], &config).unwrap();
        assert!(lowered.plain.contains_key("t"));
        assert!(lowered.roots.get("t").is_some());
    }

    #[test]
    fn test_error_codes_follow_stage() {
        let error = lower_arguments(&["--a.b", "1"]).unwrap_err();
        assert_eq!(error.error_code().as_str(), "E040");
    }
}
