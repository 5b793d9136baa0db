//! Object construction nodes

use super::error::{IrError, IrResult};
use crate::config::compile_time::ir::MAX_POSITIONAL_INDEX;
use crate::values::Value;
use std::collections::BTreeMap;
use std::fmt;

/// Final key segment naming the class of the owning object
pub const CLASS_SEGMENT: &str = "__class__";

/// Where an argument lands in a constructor call
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ArgSlot {
    Positional(usize),
    Named(String),
}

impl ArgSlot {
    /// All-ASCII-digit segments are positional indices (base 10), anything else is a keyword.
    ///
    /// `key` is only used for error reporting.
    pub fn parse(segment: &str, key: &str) -> IrResult<Self> {
        if segment.is_empty() || !segment.bytes().all(|b| b.is_ascii_digit()) {
            return Ok(ArgSlot::Named(segment.to_string()));
        }

        let too_large = || IrError::PositionalIndexTooLarge {
            key: key.to_string(),
            index: segment.to_string(),
            limit: MAX_POSITIONAL_INDEX,
        };

        match segment.parse::<usize>() {
            Ok(index) if index <= MAX_POSITIONAL_INDEX => Ok(ArgSlot::Positional(index)),
            _ => Err(too_large()),
        }
    }
}

impl fmt::Display for ArgSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgSlot::Positional(index) => write!(f, "{}", index),
            ArgSlot::Named(name) => write!(f, "{}", name),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum IrValue {
    Value(Value),
    Node(Box<ObjectNode>),
}

impl IrValue {
    pub fn as_node(&self) -> Option<&ObjectNode> {
        match self {
            IrValue::Node(node) => Some(node),
            IrValue::Value(_) => None,
        }
    }
}

/// First missing index in a sparse positional map
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PositionalGap {
    pub missing: usize,
    pub present: Vec<usize>,
}

/// Values of a sparse positional map in index order; fails on the first gap
pub fn densify_positional<T>(positional: BTreeMap<usize, T>) -> Result<Vec<T>, PositionalGap> {
    let present: Vec<usize> = positional.keys().copied().collect();
    let mut dense = Vec::with_capacity(positional.len());

    for (expected, (index, value)) in positional.into_iter().enumerate() {
        if index != expected {
            return Err(PositionalGap {
                missing: expected,
                present,
            });
        }
        dense.push(value);
    }

    Ok(dense)
}

/// One pending constructor call.
///
/// Positional arguments are kept sparse until [`ObjectNode::densify`].
/// Nested objects are owned by exactly one parent slot.
#[derive(Debug, Clone, PartialEq)]
pub struct ObjectNode {
    pub path: String,
    pub class_ref: String,
    pub positional_args: BTreeMap<usize, IrValue>,
    pub named_args: BTreeMap<String, IrValue>,
}

impl ObjectNode {
    pub fn new(path: impl Into<String>, class_ref: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            class_ref: class_ref.into(),
            positional_args: BTreeMap::new(),
            named_args: BTreeMap::new(),
        }
    }

    /// Fill an empty slot
    pub fn set_arg(&mut self, slot: ArgSlot, value: IrValue) -> IrResult<()> {
        let occupied = match &slot {
            ArgSlot::Positional(index) => self.positional_args.contains_key(index),
            ArgSlot::Named(name) => self.named_args.contains_key(name),
        };
        if occupied {
            return Err(IrError::duplicate_argument(&self.path, &slot));
        }

        match slot {
            ArgSlot::Positional(index) => {
                self.positional_args.insert(index, value);
            }
            ArgSlot::Named(name) => {
                self.named_args.insert(name, value);
            }
        }
        Ok(())
    }

    pub fn get_arg(&self, slot: &ArgSlot) -> Option<&IrValue> {
        match slot {
            ArgSlot::Positional(index) => self.positional_args.get(index),
            ArgSlot::Named(name) => self.named_args.get(name),
        }
    }

    /// Positional arguments in index order; fails on the first gap
    pub fn densify(&self) -> Result<Vec<&IrValue>, PositionalGap> {
        densify_positional(
            self.positional_args
                .iter()
                .map(|(&index, value)| (index, value))
                .collect(),
        )
    }

    pub fn children(&self) -> impl Iterator<Item = &ObjectNode> {
        self.positional_args
            .values()
            .chain(self.named_args.values())
            .filter_map(IrValue::as_node)
    }

    /// Levels in this subtree, counting this node
    pub fn depth(&self) -> usize {
        1 + self.children().map(ObjectNode::depth).max().unwrap_or(0)
    }

    /// Nodes in this subtree, counting this node
    pub fn node_count(&self) -> usize {
        1 + self.children().map(ObjectNode::node_count).sum::<usize>()
    }

    /// Indented tree rendering for diagnostics
    pub fn render(&self) -> String {
        let mut output = String::new();
        self.render_into(&mut output, 0);
        output
    }

    fn render_into(&self, output: &mut String, indent: usize) {
        let pad = "  ".repeat(indent);
        output.push_str(&format!("{}{} = {}(\n", pad, self.path, self.class_ref));

        let slots = self
            .positional_args
            .iter()
            .map(|(index, value)| (index.to_string(), value))
            .chain(
                self.named_args
                    .iter()
                    .map(|(name, value)| (name.clone(), value)),
            );

        for (slot, value) in slots {
            match value {
                IrValue::Value(v) => {
                    output.push_str(&format!("{}  {}: {}\n", pad, slot, v));
                }
                IrValue::Node(node) => node.render_into(output, indent + 1),
            }
        }

        output.push_str(&format!("{})\n", pad));
    }
}
