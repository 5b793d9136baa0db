//! `smepu.list` and `smepu.set`: collections built from positional arguments
//!
//! ```text
//! --cbs.__class__ smepu.list
//! --cbs.0.__class__ dummyest.DummyCallback --cbs.0.name a
//! --cbs.1.__class__ dummyest.DummyCallback --cbs.1.name b
//! ```
//!
//! builds a two-element list of callbacks. Items may mix plain values and
//! objects. Keyword arguments are rejected.

use crate::args::{Argument, ArgumentError, BoxError, CallArgs, Instance};
use crate::registry::{RegistryBuilder, RegistryError};
use smep_compiler::logging::{codes, Code};
use smep_compiler::Value;
use std::fmt;

pub const LIST_CLASS: &str = "smepu.list";
pub const SET_CLASS: &str = "smepu.set";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CollectionError {
    #[error("{class_ref}() item {index} is unhashable ({kind})")]
    Unhashable {
        class_ref: String,
        index: usize,
        kind: &'static str,
    },
}

impl CollectionError {
    pub fn error_code(&self) -> Code {
        codes::materialize::ARGUMENT_BINDING
    }
}

/// `smepu.list(*items)`
#[derive(Clone)]
pub struct ObjectList {
    items: Vec<Argument>,
}

impl ObjectList {
    pub fn from_args(mut args: CallArgs) -> Result<Self, BoxError> {
        let items = args.take_rest();
        args.finish()?;
        Ok(Self { items })
    }

    pub fn items(&self) -> &[Argument] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// `smepu.set(*items)`.
///
/// Keeps the first occurrence of each item. Plain values compare by value and
/// objects by identity, so every nested object survives. JSON lists and dicts
/// are unhashable.
#[derive(Clone)]
pub struct ObjectSet {
    items: Vec<Argument>,
}

impl ObjectSet {
    pub fn from_args(mut args: CallArgs) -> Result<Self, BoxError> {
        let mut items: Vec<Argument> = Vec::new();

        for (index, item) in args.take_rest().into_iter().enumerate() {
            if let Argument::Value(Value::Json(_)) = &item {
                return Err(CollectionError::Unhashable {
                    class_ref: args.class_ref().to_string(),
                    index,
                    kind: item.kind(),
                }
                .into());
            }
            if !items.iter().any(|seen| same_item(seen, &item)) {
                items.push(item);
            }
        }

        args.finish()?;
        Ok(Self { items })
    }

    pub fn items(&self) -> &[Argument] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn contains(&self, value: &Value) -> bool {
        self.items
            .iter()
            .any(|item| item.as_value() == Some(value))
    }
}

fn same_item(a: &Argument, b: &Argument) -> bool {
    match (a, b) {
        (Argument::Value(a), Argument::Value(b)) => a == b,
        (Argument::Object(a), Argument::Object(b)) => a.same_object(b),
        _ => false,
    }
}

fn write_items(f: &mut fmt::Formatter<'_>, open: &str, close: &str, items: &[Argument]) -> fmt::Result {
    f.write_str(open)?;
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            f.write_str(", ")?;
        }
        write!(f, "{}", item)?;
    }
    f.write_str(close)
}

impl fmt::Debug for ObjectList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_items(f, "[", "]", &self.items)
    }
}

impl fmt::Debug for ObjectSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_items(f, "{", "}", &self.items)
    }
}

/// Items of a `smepu.list` or `smepu.set` argument
pub fn collection_items(argument: &Argument) -> Option<&[Argument]> {
    let instance = argument.as_instance()?;
    if let Some(list) = instance.downcast_ref::<ObjectList>() {
        return Some(list.items());
    }
    instance.downcast_ref::<ObjectSet>().map(ObjectSet::items)
}

/// Register both collection classes
pub fn add_collections(builder: RegistryBuilder) -> Result<RegistryBuilder, RegistryError> {
    builder
        .add_class(LIST_CLASS, ObjectList::from_args)?
        .add_class(SET_CLASS, ObjectSet::from_args)
}

impl CallArgs {
    /// Bind a parameter holding objects.
    ///
    /// Accepts a `smepu.list`/`smepu.set` of objects, a single object, `None`
    /// or nothing. Plain values inside the collection are rejected.
    pub fn take_instances(
        &mut self,
        index: usize,
        name: &str,
    ) -> Result<Vec<Instance>, ArgumentError> {
        let argument = match self.take(index, name)? {
            None | Some(Argument::Value(Value::None)) => return Ok(Vec::new()),
            Some(argument) => argument,
        };

        let items = match collection_items(&argument) {
            Some(items) => items.to_vec(),
            None => vec![argument],
        };

        items
            .into_iter()
            .enumerate()
            .map(|(position, item)| match item {
                Argument::Object(instance) => Ok(instance),
                Argument::Value(value) => Err(ArgumentError::TypeMismatch {
                    class_ref: self.class_ref().to_string(),
                    name: format!("{}[{}]", name, position),
                    expected: "object",
                    found: value.type_name(),
                    reason: format!("declare it with --<path>.{}.__class__ {}", name, LIST_CLASS),
                }),
            })
            .collect()
    }
}
