//! # smep entrypoint
//!
//! Resolves the SageMaker protocol dirs, turns the remaining CLI tokens into
//! keyword arguments and trains the selected estimator with them.

use clap::Parser;
use log::LevelFilter;
use smep_compiler::logging::{codes, Code};
use smep_compiler::{ir, lower_arguments, PipelineError};
use smep_runtime::{
    BoxError, ClassRegistry, HyperparameterError, Kwargs, MaterializeError, Materializer,
    RegistryError,
};
use smep_sdk::logger::LoggerSetupError;
use smep_sdk::{
    as_estimator, create_default_registry, is_on_sagemaker, setup_opinionated_logger,
    ProtocolConfig, ProtocolError,
};
use std::path::PathBuf;
use std::process::ExitCode;

const LOGGER_NAME: &str = "smep";

#[derive(Parser, Debug)]
#[command(name = "smep", version, about = "SageMaker entrypoint with typed hyperparameters")]
struct Cli {
    /// Class to construct with the hyperparameters and train
    #[arg(long, default_value = "dummyest.DummyEstimator")]
    algo: String,

    /// Print the registered classes and exit
    #[arg(long)]
    list_classes: bool,

    /// Print the lowered object IR as JSON and exit
    #[arg(long)]
    dump_ir: bool,

    /// Build the keyword arguments but do not train
    #[arg(long)]
    dry_run: bool,

    #[arg(long, default_value_t = LevelFilter::Info)]
    log_level: LevelFilter,

    /// TOML file overriding the local protocol defaults
    #[arg(long, value_name = "FILE")]
    protocol_config: Option<PathBuf>,

    /// Protocol flags and hyperparameters, e.g. `--model-dir m --epochs 7`
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    args: Vec<String>,
}

#[derive(Debug, thiserror::Error)]
enum EntrypointError {
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    #[error(transparent)]
    Logger(#[from] LoggerSetupError),

    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error(transparent)]
    Lowering(#[from] PipelineError),

    #[error(transparent)]
    Hyperparameters(#[from] HyperparameterError),

    #[error(transparent)]
    Construction(#[from] MaterializeError),

    #[error(transparent)]
    Encoding(#[from] ir::IrError),

    #[error("Cannot serialize output: {0}")]
    Output(#[from] serde_json::Error),

    #[error("{class_ref} has no fit(); --algo must name an estimator")]
    NotAnEstimator { class_ref: String },

    #[error("Training failed: {0}")]
    Fit(BoxError),
}

impl EntrypointError {
    fn error_code(&self) -> Code {
        match self {
            EntrypointError::Protocol(e) => e.error_code(),
            EntrypointError::Logger(_) => codes::system::INITIALIZATION_FAILURE,
            EntrypointError::Registry(e) => e.error_code(),
            EntrypointError::Lowering(e) => e.error_code(),
            EntrypointError::Hyperparameters(e) => e.error_code(),
            EntrypointError::Construction(e) => e.error_code(),
            EntrypointError::Encoding(e) => e.error_code(),
            EntrypointError::Output(_) | EntrypointError::Fit(_) => codes::system::INTERNAL_ERROR,
            EntrypointError::NotAnEstimator { .. } => codes::materialize::CONSTRUCTION_FAILED,
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            log::error!(target: LOGGER_NAME, "[{}] {}", error.error_code(), error);
            eprintln!("error[{}]: {}", error.error_code(), error);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<(), EntrypointError> {
    let protocol_config = match &cli.protocol_config {
        Some(path) => ProtocolConfig::from_file(path)?,
        None => ProtocolConfig::default(),
    };

    setup_opinionated_logger(LOGGER_NAME, cli.log_level)?;

    let registry = create_default_registry()?;
    if cli.list_classes {
        print_classes(&registry);
        return Ok(());
    }

    let (protocol, train_args) = protocol_config.parse_known_args(&cli.args)?;
    log::info!(target: LOGGER_NAME, "cfg: {}", serde_json::to_string(&protocol)?);
    log::info!(target: LOGGER_NAME, "train_args: {:?}", train_args);

    if cli.dump_ir {
        let lowered = lower_arguments(&train_args)?;
        let plain = serde_json::to_value(&lowered.plain)?;
        let objects = ir::encode_forest(&lowered.roots)?;
        let document = serde_json::json!({ "plain": plain, "objects": objects });
        println!("{}", serde_json::to_string_pretty(&document)?);
        return Ok(());
    }

    let kwargs = smep_runtime::parse_hyperparameters(&train_args, &registry)?;
    log_kwargs(&kwargs);

    if cli.dry_run {
        for (name, argument) in &kwargs {
            println!("{} = {}", name, argument);
        }
        return Ok(());
    }

    if !is_on_sagemaker() && protocol_config.mkdir_local {
        log::info!(target: LOGGER_NAME, "Create model & output dirs prior to training.");
        protocol.create_local_dirs()?;
    }

    let instance = Materializer::new(&registry).invoke(&cli.algo, kwargs)?;
    let estimator = as_estimator(&instance).ok_or_else(|| EntrypointError::NotAnEstimator {
        class_ref: instance.class_ref().to_string(),
    })?;

    let summary = estimator.fit(&protocol).map_err(EntrypointError::Fit)?;
    log::info!(target: LOGGER_NAME, "Model summary written to {}", summary.display());

    Ok(())
}

fn log_kwargs(kwargs: &Kwargs) {
    for (name, argument) in kwargs {
        log::info!(target: LOGGER_NAME, "kwarg {} ({}) = {}", name, argument.kind(), argument);
    }
}

fn print_classes(registry: &ClassRegistry) {
    println!("Registered classes:");
    for name in registry.list_classes() {
        println!("    {}", name);
    }

    let aliases = registry.list_aliases();
    if !aliases.is_empty() {
        println!("\nAliases:");
        for (alias, target) in aliases {
            println!("    {} -> {}", alias, target);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hyperparameters_after_options() {
        let cli = Cli::try_parse_from([
            "smep",
            "--dry-run",
            "--epochs",
            "7",
            "--trainer.__class__",
            "mymodule.Trainer",
        ])
        .unwrap();

        assert!(cli.dry_run);
        assert_eq!(cli.algo, "dummyest.DummyEstimator");
        assert_eq!(cli.log_level, LevelFilter::Info);
        assert_eq!(cli.args, vec!["--epochs", "7", "--trainer.__class__", "mymodule.Trainer"]);
    }

    #[test]
    fn test_options_parse() {
        let cli = Cli::try_parse_from([
            "smep",
            "--algo",
            "mymodule.Trainer",
            "--log-level",
            "debug",
            "--",
            "--trainer.0",
            "abcd",
        ])
        .unwrap();

        assert_eq!(cli.algo, "mymodule.Trainer");
        assert_eq!(cli.log_level, LevelFilter::Debug);
        assert_eq!(cli.args, vec!["--trainer.0", "abcd"]);
    }

    #[test]
    fn test_error_codes() {
        let error = EntrypointError::NotAnEstimator {
            class_ref: "pathlib.Path".into(),
        };
        assert_eq!(error.error_code().as_str(), "E052");

        let error = EntrypointError::from(ProtocolError::MissingValue {
            flag: "model-dir".into(),
        });
        assert_eq!(error.error_code().as_str(), "E072");
    }
}
