//! Three-pass object IR construction from dotted keys
//!
//! 1. class discovery: every `<path>.__class__` key creates a node at `<path>`
//! 2. argument scatter: every other key lands in the node named by its prefix
//! 3. threading: nested nodes move into their parent's slot, deepest first,
//!    until only dot-free roots remain
//!
//! Declarations may appear in any token order, which is why discovery runs
//! before any argument is placed.

use super::error::{IrError, IrResult};
use super::node::{ArgSlot, IrValue, ObjectNode, CLASS_SEGMENT};
use crate::config::compile_time::ir::{MAX_NESTING_DEPTH, MAX_OBJECT_NODES};
use crate::config::runtime::IrPreferences;
use crate::lexical::FlatArgs;
use crate::logging::codes;
use crate::partition::KEY_SEPARATOR;
use crate::values::Value;
use crate::{log_debug, log_error, log_success};
use std::collections::HashMap;

/// Root objects in declaration order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ObjectForest {
    roots: Vec<ObjectNode>,
}

impl ObjectForest {
    pub fn get(&self, name: &str) -> Option<&ObjectNode> {
        self.roots.iter().find(|node| node.path == name)
    }

    pub fn len(&self) -> usize {
        self.roots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.roots.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ObjectNode> {
        self.roots.iter()
    }

    pub fn node_count(&self) -> usize {
        self.roots.iter().map(ObjectNode::node_count).sum()
    }
}

impl IntoIterator for ObjectForest {
    type Item = ObjectNode;
    type IntoIter = std::vec::IntoIter<ObjectNode>;

    fn into_iter(self) -> Self::IntoIter {
        self.roots.into_iter()
    }
}

pub struct ObjectIrBuilder {
    preferences: IrPreferences,
}

impl ObjectIrBuilder {
    pub fn new() -> Self {
        Self::with_preferences(IrPreferences::default())
    }

    pub fn with_preferences(preferences: IrPreferences) -> Self {
        Self { preferences }
    }

    pub fn build(&self, compound: &FlatArgs) -> IrResult<ObjectForest> {
        let (mut nodes, order) = Self::discover_classes(compound)
            .map_err(Self::logged)?;
        Self::scatter_arguments(compound, &mut nodes).map_err(Self::logged)?;
        let forest = self.thread_nodes(nodes, order).map_err(Self::logged)?;

        log_success!(codes::success::IR_CONSTRUCTION_COMPLETE, "Object IR constructed",
            "roots" => forest.len(),
            "objects" => forest.node_count()
        );

        Ok(forest)
    }

    fn logged(error: IrError) -> IrError {
        log_error!(error.error_code(), &error.to_string());
        error
    }

    /// Pass 1
    fn discover_classes(
        compound: &FlatArgs,
    ) -> IrResult<(HashMap<String, ObjectNode>, Vec<String>)> {
        let mut nodes = HashMap::new();
        let mut order = Vec::new();

        for (key, value) in compound.iter() {
            let segments = split_segments(key)?;
            if segments.last() != Some(&CLASS_SEGMENT) {
                continue;
            }

            let owner = &key[..key.len() - CLASS_SEGMENT.len() - 1];
            let depth = segments.len() - 1;
            if depth > MAX_NESTING_DEPTH {
                return Err(IrError::NestingTooDeep {
                    path: owner.to_string(),
                    depth,
                    limit: MAX_NESTING_DEPTH,
                });
            }

            let Value::Str(class_ref) = value else {
                return Err(IrError::InvalidClassReference {
                    path: owner.to_string(),
                    found: value.type_name().to_string(),
                });
            };

            if nodes.len() >= MAX_OBJECT_NODES {
                return Err(IrError::TooManyObjects {
                    count: nodes.len() + 1,
                    limit: MAX_OBJECT_NODES,
                });
            }

            nodes.insert(owner.to_string(), ObjectNode::new(owner, class_ref.as_str()));
            order.push(owner.to_string());
        }

        Ok((nodes, order))
    }

    /// Pass 2
    fn scatter_arguments(
        compound: &FlatArgs,
        nodes: &mut HashMap<String, ObjectNode>,
    ) -> IrResult<()> {
        for (key, value) in compound.iter() {
            let Some((owner, slot_name)) = key.rsplit_once(KEY_SEPARATOR) else {
                continue;
            };
            if slot_name == CLASS_SEGMENT {
                continue;
            }

            let node = nodes
                .get_mut(owner)
                .ok_or_else(|| IrError::missing_class_declaration(key, owner))?;
            let slot = ArgSlot::parse(slot_name, key)?;
            node.set_arg(slot, IrValue::Value(value.clone()))?;
        }

        Ok(())
    }

    /// Pass 3
    fn thread_nodes(
        &self,
        mut nodes: HashMap<String, ObjectNode>,
        order: Vec<String>,
    ) -> IrResult<ObjectForest> {
        let mut nested: Vec<&String> = order
            .iter()
            .filter(|path| path.contains(KEY_SEPARATOR))
            .collect();
        // Deepest first, so a child is complete before it moves
        nested.sort_by_key(|path| std::cmp::Reverse(path.matches(KEY_SEPARATOR).count()));

        for path in nested {
            let Some((parent_path, slot_name)) = path.rsplit_once(KEY_SEPARATOR) else {
                continue;
            };
            let Some(child) = nodes.remove(path.as_str()) else {
                continue;
            };

            let class_key = format!("{}.{}", path, CLASS_SEGMENT);
            let slot = ArgSlot::parse(slot_name, &class_key)?;
            let parent = nodes
                .get_mut(parent_path)
                .ok_or_else(|| IrError::missing_class_declaration(&class_key, parent_path))?;

            if self.preferences.log_threading_details {
                log_debug!("Attaching nested object",
                    "child" => path,
                    "parent" => parent_path,
                    "slot" => &slot
                );
            }

            parent.set_arg(slot, IrValue::Node(Box::new(child)))?;
        }

        let roots = order
            .iter()
            .filter_map(|path| nodes.remove(path.as_str()))
            .collect();

        Ok(ObjectForest { roots })
    }
}

impl Default for ObjectIrBuilder {
    fn default() -> Self {
        Self::new()
    }
}

fn split_segments(key: &str) -> IrResult<Vec<&str>> {
    let segments: Vec<&str> = key.split(KEY_SEPARATOR).collect();
    if segments.iter().any(|segment| segment.is_empty()) {
        return Err(IrError::EmptySegment {
            key: key.to_string(),
        });
    }
    Ok(segments)
}
