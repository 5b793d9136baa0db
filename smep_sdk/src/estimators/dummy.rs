//! Dummy estimator and callback for exercising the entrypoint end to end

use super::{write_model_summary, Estimator};
use crate::protocol::ProtocolArgs;
use serde::Serialize;
use smep_runtime::{BoxError, CallArgs, Instance};
use std::fmt;
use std::path::PathBuf;

pub const ESTIMATOR_CLASS: &str = "dummyest.DummyEstimator";
pub const CALLBACK_CLASS: &str = "dummyest.DummyCallback";

#[derive(Debug)]
pub struct DummyEstimator {
    pub epochs: i64,
    pub init: String,
    pub callbacks: Vec<Instance>,
}

impl DummyEstimator {
    /// `DummyEstimator(epochs=2, init="uniform", callbacks=[])`
    pub fn from_args(mut args: CallArgs) -> Result<Self, BoxError> {
        let epochs: i64 = args.value_or(0, "epochs", 2)?;
        let init = args
            .take(1, "init")?
            .map(|init| init.to_string())
            .unwrap_or_else(|| "uniform".to_string());
        let callbacks = args.take_instances(2, "callbacks")?;
        args.finish()?;

        if epochs < 0 {
            return Err(format!("epochs must be non-negative, got {}", epochs).into());
        }

        Ok(Self {
            epochs,
            init,
            callbacks,
        })
    }

    fn dummy_callbacks(&self) -> impl Iterator<Item = &DummyCallback> {
        self.callbacks
            .iter()
            .filter_map(|instance| instance.downcast_ref::<DummyCallback>())
    }

    pub fn callback_names(&self) -> Vec<&str> {
        self.dummy_callbacks().map(|callback| callback.name.as_str()).collect()
    }
}

impl fmt::Display for DummyEstimator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "DummyEstimator(epochs={}, init=\"{}\", callbacks=[", self.epochs, self.init)?;
        for (i, instance) in self.callbacks.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            match instance.downcast_ref::<DummyCallback>() {
                Some(callback) => write!(f, "{}", callback)?,
                None => write!(f, "{}", instance)?,
            }
        }
        f.write_str("])")
    }
}

#[derive(Serialize)]
struct DummySummary<'a> {
    class: &'static str,
    epochs: i64,
    init: &'a str,
    callbacks: Vec<&'a str>,
    epochs_completed: i64,
}

impl Estimator for DummyEstimator {
    fn fit(&self, protocol: &ProtocolArgs) -> Result<PathBuf, BoxError> {
        log::info!("{}", self);

        for epoch in 1..=self.epochs {
            log::info!("Epoch {}", epoch);
            for callback in self.dummy_callbacks() {
                callback.on_epoch_end(epoch);
            }
        }

        write_model_summary(
            protocol,
            &DummySummary {
                class: ESTIMATOR_CLASS,
                epochs: self.epochs,
                init: &self.init,
                callbacks: self.callbacks.iter().map(Instance::class_ref).collect(),
                epochs_completed: self.epochs,
            },
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DummyCallback {
    pub name: String,
}

impl DummyCallback {
    /// `DummyCallback(name)`
    pub fn from_args(mut args: CallArgs) -> Result<Self, BoxError> {
        let name = args.required_value(0, "name")?;
        args.finish()?;
        Ok(Self { name })
    }

    pub fn on_epoch_end(&self, epoch: i64) {
        log::info!("[{}] epoch {} done", self.name, epoch);
    }
}

impl fmt::Display for DummyCallback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "DummyCallback(name=\"{}\")", self.name)
    }
}
