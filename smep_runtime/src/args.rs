//! Constructed objects and constructor call arguments
//!
//! A constructor receives a [`CallArgs`]: the densified positional sequence
//! and the named mapping of one IR node, with nested nodes already built.
//! Parameters are pulled out by position-or-name, the way a Python signature
//! binds `f(a, b=1)`.

use serde::de::DeserializeOwned;
use smep_compiler::logging::{codes, Code};
use smep_compiler::Value;
use std::any::{type_name, Any};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// Error type returned by constructors
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Anything a registered constructor can produce
pub trait HyperObject: Any + Send + Sync + fmt::Debug {
    fn as_any(&self) -> &dyn Any;
    fn into_any(self: Arc<Self>) -> Arc<dyn Any + Send + Sync>;
}

impl<T: Any + Send + Sync + fmt::Debug> HyperObject for T {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn into_any(self: Arc<Self>) -> Arc<dyn Any + Send + Sync> {
        self
    }
}

/// A materialized object together with the class name it was built from
#[derive(Clone)]
pub struct Instance {
    class_ref: String,
    object: Arc<dyn HyperObject>,
}

impl Instance {
    pub fn new(class_ref: impl Into<String>, object: Arc<dyn HyperObject>) -> Self {
        Self {
            class_ref: class_ref.into(),
            object,
        }
    }

    pub fn class_ref(&self) -> &str {
        &self.class_ref
    }

    pub fn object(&self) -> &dyn HyperObject {
        &*self.object
    }

    pub fn is<T: Any>(&self) -> bool {
        self.downcast_ref::<T>().is_some()
    }

    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        // Deref first so the call does not resolve to the Arc's own impl
        let object: &dyn HyperObject = &*self.object;
        object.as_any().downcast_ref::<T>()
    }

    /// Whether both instances hold the very same object
    pub fn same_object(&self, other: &Instance) -> bool {
        Arc::ptr_eq(&self.object, &other.object)
    }

    pub fn downcast_arc<T: Any + Send + Sync>(&self) -> Option<Arc<T>> {
        <dyn HyperObject as HyperObject>::into_any(Arc::clone(&self.object))
            .downcast::<T>()
            .ok()
    }
}

impl fmt::Debug for Instance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Instance")
            .field("class_ref", &self.class_ref)
            .field("object", &self.object)
            .finish()
    }
}

impl fmt::Display for Instance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self.object)
    }
}

/// A keyword-argument value: either a scalar/JSON value or a built object
#[derive(Debug, Clone)]
pub enum Argument {
    Value(Value),
    Object(Instance),
}

impl Argument {
    pub fn as_value(&self) -> Option<&Value> {
        match self {
            Argument::Value(value) => Some(value),
            Argument::Object(_) => None,
        }
    }

    pub fn as_instance(&self) -> Option<&Instance> {
        match self {
            Argument::Object(instance) => Some(instance),
            Argument::Value(_) => None,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Argument::Value(value) => value.type_name(),
            Argument::Object(_) => "object",
        }
    }
}

impl From<Value> for Argument {
    fn from(value: Value) -> Self {
        Argument::Value(value)
    }
}

impl From<Instance> for Argument {
    fn from(instance: Instance) -> Self {
        Argument::Object(instance)
    }
}

impl fmt::Display for Argument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Argument::Value(value) => write!(f, "{}", value),
            Argument::Object(instance) => write!(f, "{}", instance),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ArgumentError {
    #[error("{class_ref}() got multiple values for argument '{name}' (position {index} and keyword)")]
    MultipleValues {
        class_ref: String,
        name: String,
        index: usize,
    },

    #[error("{class_ref}() missing required argument '{name}'")]
    Missing { class_ref: String, name: String },

    #[error("{class_ref}() argument '{name}' expects {expected}, got {found}: {reason}")]
    TypeMismatch {
        class_ref: String,
        name: String,
        expected: &'static str,
        found: &'static str,
        reason: String,
    },

    #[error("{class_ref}() argument '{name}' expects an instance of {expected}, got {found}")]
    WrongObjectType {
        class_ref: String,
        name: String,
        expected: &'static str,
        found: String,
    },

    #[error("{class_ref}() got unexpected arguments: {}", arguments.join(", "))]
    Unexpected {
        class_ref: String,
        arguments: Vec<String>,
    },
}

impl ArgumentError {
    pub fn error_code(&self) -> Code {
        codes::materialize::ARGUMENT_BINDING
    }
}

/// Arguments of one constructor call.
///
/// Each `take_*` consumes the parameter, so a later [`CallArgs::finish`]
/// can reject anything the constructor did not ask for.
#[derive(Debug)]
pub struct CallArgs {
    class_ref: String,
    positional: Vec<Option<Argument>>,
    named: BTreeMap<String, Argument>,
}

impl CallArgs {
    pub fn new(
        class_ref: impl Into<String>,
        positional: Vec<Argument>,
        named: BTreeMap<String, Argument>,
    ) -> Self {
        Self {
            class_ref: class_ref.into(),
            positional: positional.into_iter().map(Some).collect(),
            named,
        }
    }

    pub fn class_ref(&self) -> &str {
        &self.class_ref
    }

    /// Arguments not yet taken
    pub fn remaining(&self) -> usize {
        self.positional.iter().flatten().count() + self.named.len()
    }

    /// Bind parameter `name` at position `index`
    pub fn take(&mut self, index: usize, name: &str) -> Result<Option<Argument>, ArgumentError> {
        let by_position = self.positional.get_mut(index).and_then(Option::take);
        let by_name = self.named.remove(name);

        match (by_position, by_name) {
            (Some(_), Some(_)) => Err(ArgumentError::MultipleValues {
                class_ref: self.class_ref.clone(),
                name: name.to_string(),
                index,
            }),
            (by_position, by_name) => Ok(by_position.or(by_name)),
        }
    }

    /// Bind a keyword-only parameter
    pub fn take_named(&mut self, name: &str) -> Option<Argument> {
        self.named.remove(name)
    }

    /// Bind `*args`: every positional argument not taken yet, in order
    pub fn take_rest(&mut self) -> Vec<Argument> {
        self.positional.iter_mut().filter_map(Option::take).collect()
    }

    /// Bind a plain value, converting through serde
    pub fn take_value<T: DeserializeOwned>(
        &mut self,
        index: usize,
        name: &str,
    ) -> Result<Option<T>, ArgumentError> {
        match self.take(index, name)? {
            None => Ok(None),
            Some(argument) => self.convert(name, argument).map(Some),
        }
    }

    pub fn value_or<T: DeserializeOwned>(
        &mut self,
        index: usize,
        name: &str,
        default: T,
    ) -> Result<T, ArgumentError> {
        Ok(self.take_value(index, name)?.unwrap_or(default))
    }

    pub fn required_value<T: DeserializeOwned>(
        &mut self,
        index: usize,
        name: &str,
    ) -> Result<T, ArgumentError> {
        self.take_value(index, name)?
            .ok_or_else(|| self.missing(name))
    }

    /// Bind an object parameter; an explicit `None` counts as absent
    pub fn take_instance(
        &mut self,
        index: usize,
        name: &str,
    ) -> Result<Option<Instance>, ArgumentError> {
        match self.take(index, name)? {
            None | Some(Argument::Value(Value::None)) => Ok(None),
            Some(Argument::Object(instance)) => Ok(Some(instance)),
            Some(Argument::Value(value)) => Err(ArgumentError::TypeMismatch {
                class_ref: self.class_ref.clone(),
                name: name.to_string(),
                expected: "object",
                found: value.type_name(),
                reason: format!("declare it with --<path>.{}.__class__", name),
            }),
        }
    }

    /// Bind an object parameter of a concrete Rust type
    pub fn take_object<T: Any + Send + Sync>(
        &mut self,
        index: usize,
        name: &str,
    ) -> Result<Option<Arc<T>>, ArgumentError> {
        let Some(instance) = self.take_instance(index, name)? else {
            return Ok(None);
        };

        instance
            .downcast_arc::<T>()
            .map(Some)
            .ok_or_else(|| ArgumentError::WrongObjectType {
                class_ref: self.class_ref.clone(),
                name: name.to_string(),
                expected: type_name::<T>(),
                found: instance.class_ref().to_string(),
            })
    }

    /// Reject arguments the constructor never bound
    pub fn finish(self) -> Result<(), ArgumentError> {
        let mut leftovers: Vec<String> = self
            .positional
            .iter()
            .enumerate()
            .filter(|(_, argument)| argument.is_some())
            .map(|(index, _)| index.to_string())
            .collect();
        leftovers.extend(self.named.into_keys());

        if leftovers.is_empty() {
            Ok(())
        } else {
            Err(ArgumentError::Unexpected {
                class_ref: self.class_ref,
                arguments: leftovers,
            })
        }
    }

    fn convert<T: DeserializeOwned>(&self, name: &str, argument: Argument) -> Result<T, ArgumentError> {
        let mismatch = |found: &'static str, reason: String| ArgumentError::TypeMismatch {
            class_ref: self.class_ref.clone(),
            name: name.to_string(),
            expected: type_name::<T>(),
            found,
            reason,
        };

        match argument {
            Argument::Value(value) => serde_json::from_value(value.to_json())
                .map_err(|e| mismatch(value.type_name(), e.to_string())),
            Argument::Object(instance) => Err(mismatch(
                "object",
                format!("{} is not a plain value", instance.class_ref()),
            )),
        }
    }

    fn missing(&self, name: &str) -> ArgumentError {
        ArgumentError::Missing {
            class_ref: self.class_ref.clone(),
            name: name.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[derive(Debug, PartialEq)]
    struct Marker(u32);

    fn call(positional: Vec<Argument>, named: &[(&str, Argument)]) -> CallArgs {
        let named = named
            .iter()
            .map(|(name, argument)| (name.to_string(), argument.clone()))
            .collect();
        CallArgs::new("mymodule.Trainer", positional, named)
    }

    fn marker(id: u32) -> Instance {
        Instance::new("test.Marker", Arc::new(Marker(id)))
    }

    #[test]
    fn test_bind_by_position_or_name() {
        let mut args = call(
            vec![Argument::Value(Value::from("abcd"))],
            &[("epochs", Argument::Value(Value::Int(100)))],
        );

        let name: String = args.required_value(0, "name").unwrap();
        let epochs: i64 = args.value_or(1, "epochs", 1).unwrap();
        let lr: f64 = args.value_or(2, "learning_rate", 0.001).unwrap();

        assert_eq!(name, "abcd");
        assert_eq!(epochs, 100);
        assert_eq!(lr, 0.001);
        assert!(args.finish().is_ok());
    }

    #[test]
    fn test_same_parameter_bound_twice() {
        let mut args = call(
            vec![Argument::Value(Value::from("abcd"))],
            &[("name", Argument::Value(Value::from("efgh")))],
        );
        assert_matches!(
            args.take(0, "name"),
            Err(ArgumentError::MultipleValues { index: 0, .. })
        );
    }

    #[test]
    fn test_take_rest_skips_bound_positions() {
        let mut args = call(
            vec![
                Argument::Value(Value::Int(0)),
                Argument::Value(Value::Int(1)),
                Argument::Object(marker(2)),
            ],
            &[],
        );

        let first: i64 = args.required_value(0, "first").unwrap();
        let rest = args.take_rest();

        assert_eq!(first, 0);
        assert_eq!(rest.len(), 2);
        assert_eq!(rest[0].as_value(), Some(&Value::Int(1)));
        assert!(rest[1].as_instance().unwrap().is::<Marker>());
        assert_eq!(args.remaining(), 0);
    }

    #[test]
    fn test_same_object_is_identity() {
        let a = marker(1);
        let b = marker(1);
        assert!(a.same_object(&a.clone()));
        assert!(!a.same_object(&b));
    }

    #[test]
    fn test_int_widens_to_float() {
        let mut args = call(vec![], &[("lr", Argument::Value(Value::Int(1)))]);
        let lr: f64 = args.required_value(0, "lr").unwrap();
        assert_eq!(lr, 1.0);
    }

    #[test]
    fn test_type_mismatch_reports_found_type() {
        let mut args = call(vec![], &[("epochs", Argument::Value(Value::from("many")))]);
        assert_matches!(
            args.take_value::<i64>(0, "epochs"),
            Err(ArgumentError::TypeMismatch { found: "str", .. })
        );
    }

    #[test]
    fn test_missing_required() {
        let mut args = call(vec![], &[]);
        assert_matches!(
            args.required_value::<String>(0, "name"),
            Err(ArgumentError::Missing { ref name, .. }) if name == "name"
        );
    }

    #[test]
    fn test_object_downcast() {
        let mut args = call(vec![], &[("callback", Argument::Object(marker(7)))]);
        let callback = args.take_object::<Marker>(0, "callback").unwrap().unwrap();
        assert_eq!(*callback, Marker(7));
    }

    #[test]
    fn test_object_of_wrong_type() {
        let mut args = call(vec![], &[("callback", Argument::Object(marker(7)))]);
        assert_matches!(
            args.take_object::<String>(0, "callback"),
            Err(ArgumentError::WrongObjectType { ref found, .. }) if found == "test.Marker"
        );
    }

    #[test]
    fn test_none_is_absent_object() {
        let mut args = call(vec![], &[("callback", Argument::Value(Value::None))]);
        assert!(args.take_instance(0, "callback").unwrap().is_none());

        let mut args = call(vec![], &[("callback", Argument::Value(Value::Int(3)))]);
        assert_matches!(
            args.take_instance(0, "callback"),
            Err(ArgumentError::TypeMismatch { expected: "object", .. })
        );
    }

    #[test]
    fn test_leftovers_rejected() {
        let args = call(
            vec![Argument::Value(Value::Int(1))],
            &[("typo", Argument::Value(Value::Int(2)))],
        );
        assert_eq!(args.remaining(), 2);
        assert_matches!(
            args.finish(),
            Err(ArgumentError::Unexpected { ref arguments, .. }) if arguments == &["0", "typo"]
        );
    }

    #[test]
    fn test_instance_downcast_ref() {
        let instance = marker(3);
        assert!(instance.is::<Marker>());
        assert!(!instance.is::<String>());
        assert_eq!(instance.downcast_ref::<Marker>(), Some(&Marker(3)));
        assert_eq!(instance.to_string(), "Marker(3)");
    }
}
