//! # smep runtime
//!
//! Turns lowered hyperparameters into keyword arguments by building every
//! declared object through an explicit [`ClassRegistry`].

pub mod api;
pub mod args;
pub mod collections;
pub mod materialize;
pub mod registry;

// Convenience re-exports
pub use api::{
    parse_for_func, parse_hyperparameters, parse_hyperparameters_with_config,
    parse_hyperparameters_with_warnings, HyperparameterError, Kwargs, ParsedHyperparameters,
};
pub use args::{Argument, ArgumentError, BoxError, CallArgs, HyperObject, Instance};
pub use collections::{add_collections, collection_items, CollectionError, ObjectList, ObjectSet};
pub use materialize::{MaterializeError, Materializer};
pub use registry::{ClassRegistry, Constructor, RegistryBuilder, RegistryError};

pub mod prelude {
    pub use crate::api::{parse_hyperparameters, HyperparameterError, Kwargs};
    pub use crate::args::{Argument, BoxError, CallArgs, Instance};
    pub use crate::registry::{ClassRegistry, RegistryBuilder};

    pub use smep_compiler::{FlatArgs, Value};
}
