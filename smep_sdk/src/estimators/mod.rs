//! Built-in classes that hyperparameters can construct
//!
//! - `dummyest.DummyEstimator`, `dummyest.DummyCallback`
//! - `mymodule.Trainer`
//! - `pathlib.Path`

pub mod dummy;
pub mod path;
pub mod trainer;

pub use dummy::{DummyCallback, DummyEstimator};
pub use path::PathObject;
pub use trainer::Trainer;

use crate::protocol::ProtocolArgs;
use serde::Serialize;
use smep_runtime::{BoxError, Instance};
use std::fs;
use std::path::PathBuf;

pub const MODEL_SUMMARY_FILE: &str = "model.json";

/// Something that can be trained by the entrypoint
pub trait Estimator: Send + Sync {
    fn fit(&self, protocol: &ProtocolArgs) -> Result<PathBuf, BoxError>;
}

/// The estimator behind an instance, if its class is trainable
pub fn as_estimator(instance: &Instance) -> Option<&dyn Estimator> {
    if let Some(estimator) = instance.downcast_ref::<DummyEstimator>() {
        return Some(estimator);
    }
    if let Some(trainer) = instance.downcast_ref::<Trainer>() {
        return Some(trainer);
    }
    None
}

/// Write `model.json` into the model dir
pub fn write_model_summary<T: Serialize>(
    protocol: &ProtocolArgs,
    summary: &T,
) -> Result<PathBuf, BoxError> {
    let path = protocol.model_dir.join(MODEL_SUMMARY_FILE);
    let content = serde_json::to_string_pretty(summary)?;
    fs::write(&path, content)?;
    Ok(path)
}
