//! Hyperparameters in, keyword arguments out

use crate::args::Argument;
use crate::materialize::{MaterializeError, Materializer};
use crate::registry::ClassRegistry;
use smep_compiler::config::runtime::RuntimeConfig;
use smep_compiler::lexical::{self, FlatArgs, SuspiciousPair, TokenizeError};
use smep_compiler::logging::Code;
use smep_compiler::pipeline::{self, PipelineError};
use std::collections::BTreeMap;

/// Keyword arguments for an entrypoint: plain values merged with built objects
pub type Kwargs = BTreeMap<String, Argument>;

/// Keyword arguments plus the value tokens that looked like flags
#[derive(Debug)]
pub struct ParsedHyperparameters {
    pub kwargs: Kwargs,
    pub warnings: Vec<SuspiciousPair>,
}

#[derive(Debug, thiserror::Error)]
pub enum HyperparameterError {
    #[error(transparent)]
    Lowering(#[from] PipelineError),

    #[error(transparent)]
    Materialize(#[from] MaterializeError),
}

impl HyperparameterError {
    pub fn error_code(&self) -> Code {
        match self {
            HyperparameterError::Lowering(e) => e.error_code(),
            HyperparameterError::Materialize(e) => e.error_code(),
        }
    }
}

/// Flat parse: `["--epochs", "7"]` becomes `{epochs: 7}`; dotted keys are not lowered
pub fn parse_for_func<S: AsRef<str>>(cli_args: &[S]) -> Result<FlatArgs, TokenizeError> {
    lexical::parse_flat(cli_args)
}

/// Full parse: typed plain values plus every root object built through `registry`
pub fn parse_hyperparameters<S: AsRef<str>>(
    cli_args: &[S],
    registry: &ClassRegistry,
) -> Result<Kwargs, HyperparameterError> {
    parse_hyperparameters_with_config(cli_args, registry, &RuntimeConfig::default())
}

pub fn parse_hyperparameters_with_config<S: AsRef<str>>(
    cli_args: &[S],
    registry: &ClassRegistry,
    config: &RuntimeConfig,
) -> Result<Kwargs, HyperparameterError> {
    parse_hyperparameters_with_warnings(cli_args, registry, config).map(|parsed| parsed.kwargs)
}

/// Like [`parse_hyperparameters_with_config`], also returning suspicious `--k --v` pairs
pub fn parse_hyperparameters_with_warnings<S: AsRef<str>>(
    cli_args: &[S],
    registry: &ClassRegistry,
    config: &RuntimeConfig,
) -> Result<ParsedHyperparameters, HyperparameterError> {
    let lowered = pipeline::lower_arguments_with_config(cli_args, config)?;

    let materializer = Materializer::with_preferences(registry, config.materialize.clone());
    let roots = materializer.materialize_forest(&lowered.roots)?;

    let mut kwargs: Kwargs = lowered
        .plain
        .into_iter()
        .map(|(key, value)| (key, Argument::Value(value)))
        .collect();

    // A root only shares a name with a plain key when conflict rejection is off
    for (name, instance) in roots {
        kwargs.insert(name, Argument::Object(instance));
    }

    Ok(ParsedHyperparameters {
        kwargs,
        warnings: lowered.warnings,
    })
}
