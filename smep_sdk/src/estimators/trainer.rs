use super::{write_model_summary, DummyCallback, Estimator};
use crate::protocol::ProtocolArgs;
use serde::Serialize;
use smep_runtime::{BoxError, CallArgs, Instance};
use std::path::PathBuf;

pub const TRAINER_CLASS: &str = "mymodule.Trainer";

/// `Trainer(name, epochs=100, learning_rate=0.001, callback=None)`
#[derive(Debug)]
pub struct Trainer {
    pub name: String,
    pub epochs: i64,
    pub learning_rate: f64,
    pub callback: Option<Instance>,
}

impl Trainer {
    pub fn from_args(mut args: CallArgs) -> Result<Self, BoxError> {
        let trainer = Self {
            name: args.required_value(0, "name")?,
            epochs: args.value_or(1, "epochs", 100)?,
            learning_rate: args.value_or(2, "learning_rate", 0.001)?,
            callback: args.take_instance(3, "callback")?,
        };
        args.finish()?;

        if !(trainer.learning_rate.is_finite() && trainer.learning_rate > 0.0) {
            return Err(format!("learning_rate must be positive, got {}", trainer.learning_rate).into());
        }

        Ok(trainer)
    }
}

#[derive(Serialize)]
struct TrainerSummary<'a> {
    class: &'static str,
    name: &'a str,
    epochs: i64,
    learning_rate: f64,
    callback: Option<&'a str>,
}

impl Estimator for Trainer {
    fn fit(&self, protocol: &ProtocolArgs) -> Result<PathBuf, BoxError> {
        log::info!(
            "Training {} for {} epochs (lr={})",
            self.name,
            self.epochs,
            self.learning_rate
        );

        let callback = self
            .callback
            .as_ref()
            .and_then(|instance| instance.downcast_ref::<DummyCallback>());
        for epoch in 1..=self.epochs {
            if let Some(callback) = callback {
                callback.on_epoch_end(epoch);
            }
        }

        write_model_summary(
            protocol,
            &TrainerSummary {
                class: TRAINER_CLASS,
                name: &self.name,
                epochs: self.epochs,
                learning_rate: self.learning_rate,
                callback: self.callback.as_ref().map(Instance::class_ref),
            },
        )
    }
}
