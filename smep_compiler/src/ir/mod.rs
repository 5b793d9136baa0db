//! Object construction IR
//!
//! Dotted keys such as `--trainer.epochs 100` describe a tree of pending
//! constructor calls. The builder groups them into [`ObjectNode`]s and threads
//! nested nodes into their parents so only root objects remain.

pub mod builder;
pub mod encoding;
pub mod error;
pub mod node;

use crate::config::runtime::IrPreferences;
use crate::lexical::FlatArgs;

pub use builder::{ObjectForest, ObjectIrBuilder};
pub use encoding::{decode_node, encode_forest, encode_node};
pub use error::{IrError, IrResult};
pub use node::{densify_positional, ArgSlot, IrValue, ObjectNode, PositionalGap, CLASS_SEGMENT};

/// Build root objects from the compound half of the arguments
pub fn build_object_forest(compound: &FlatArgs) -> IrResult<ObjectForest> {
    ObjectIrBuilder::new().build(compound)
}

pub fn build_object_forest_with_preferences(
    compound: &FlatArgs,
    preferences: IrPreferences,
) -> IrResult<ObjectForest> {
    ObjectIrBuilder::with_preferences(preferences).build(compound)
}
