//! # smep SDK
//!
//! SageMaker entrypoint support: protocol dirs, logger setup, and the
//! built-in classes hyperparameters can construct.

pub mod estimators;
pub mod logger;
pub mod protocol;

pub use estimators::{as_estimator, Estimator};
pub use logger::setup_opinionated_logger;
pub use protocol::{is_on_sagemaker, mkdir, pathify, ProtocolArgs, ProtocolConfig, ProtocolError};

use smep_runtime::{add_collections, ClassRegistry, RegistryBuilder, RegistryError};

/// Registry with every built-in class
///
/// Includes:
/// - `dummyest.DummyEstimator` (alias `DummyEstimator`)
/// - `dummyest.DummyCallback`
/// - `mymodule.Trainer`
/// - `pathlib.Path`
/// - `smepu.list`, `smepu.set`
pub fn create_default_registry() -> Result<ClassRegistry, RegistryError> {
    use estimators::{dummy, path, trainer};

    let builder = add_collections(RegistryBuilder::new())?;
    Ok(builder
        .add_class(dummy::ESTIMATOR_CLASS, estimators::DummyEstimator::from_args)?
        .add_class(dummy::CALLBACK_CLASS, estimators::DummyCallback::from_args)?
        .add_class(trainer::TRAINER_CLASS, estimators::Trainer::from_args)?
        .add_class(path::PATH_CLASS, estimators::PathObject::from_args)?
        .add_alias("DummyEstimator", dummy::ESTIMATOR_CLASS)?
        .build())
}

#[cfg(test)]
mod tests {
    use super::*;
    use smep_runtime::{parse_hyperparameters, Argument};

    #[test]
    fn test_default_registry_contents() {
        let registry = create_default_registry().unwrap();
        assert_eq!(
            registry.list_classes(),
            vec![
                "dummyest.DummyCallback",
                "dummyest.DummyEstimator",
                "mymodule.Trainer",
                "pathlib.Path",
                "smepu.list",
                "smepu.set",
            ]
        );
        assert_eq!(
            registry.canonical_name("DummyEstimator"),
            Some("dummyest.DummyEstimator")
        );
    }

    #[test]
    fn test_trainer_from_cli() {
        let registry = create_default_registry().unwrap();
        let kwargs = parse_hyperparameters(
            &[
                "--trainer.__class__",
                "mymodule.Trainer",
                "--trainer.epochs",
                "100",
                "--trainer.0",
                "abcd",
                "--data.__class__",
                "pathlib.Path",
                "--data.0",
                "/opt/ml/input",
            ],
            &registry,
        )
        .unwrap();

        let trainer = kwargs["trainer"]
            .as_instance()
            .and_then(|instance| instance.downcast_ref::<estimators::Trainer>())
            .unwrap();
        assert_eq!(trainer.name, "abcd");
        assert_eq!(trainer.epochs, 100);

        let Argument::Object(data) = &kwargs["data"] else {
            panic!("data should be an object");
        };
        assert!(data.is::<estimators::PathObject>());
    }

    #[test]
    fn test_nested_callback_in_estimator() {
        let registry = create_default_registry().unwrap();
        let kwargs = parse_hyperparameters(
            &[
                "--est.__class__",
                "DummyEstimator",
                "--est.callbacks.__class__",
                "dummyest.DummyCallback",
                "--est.callbacks.name",
                "progress",
            ],
            &registry,
        )
        .unwrap();

        let instance = kwargs["est"].as_instance().unwrap();
        assert_eq!(instance.class_ref(), "dummyest.DummyEstimator");
        assert!(as_estimator(instance).is_some());

        let estimator = instance.downcast_ref::<estimators::DummyEstimator>().unwrap();
        assert_eq!(estimator.callback_names(), vec!["progress"]);
    }

    #[test]
    fn test_callback_list_in_estimator() {
        let registry = create_default_registry().unwrap();
        let kwargs = parse_hyperparameters(
            &[
                "--est.__class__",
                "DummyEstimator",
                "--est.callbacks.__class__",
                "smepu.list",
                "--est.callbacks.0.__class__",
                "dummyest.DummyCallback",
                "--est.callbacks.0.name",
                "a",
                "--est.callbacks.1.__class__",
                "dummyest.DummyCallback",
                "--est.callbacks.1.name",
                "b",
            ],
            &registry,
        )
        .unwrap();

        let estimator = kwargs["est"]
            .as_instance()
            .and_then(|instance| instance.downcast_ref::<estimators::DummyEstimator>())
            .unwrap();
        assert_eq!(estimator.callback_names(), vec!["a", "b"]);
        assert_eq!(
            estimator.to_string(),
            r#"DummyEstimator(epochs=2, init="uniform", callbacks=[DummyCallback(name="a"), DummyCallback(name="b")])"#
        );
    }
}
