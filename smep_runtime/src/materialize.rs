//! Recursive instantiation of object IR through a [`ClassRegistry`]
//!
//! Per node: resolve the class, build nested nodes depth-first, densify the
//! positional arguments, then call the constructor. Nothing is cached; every
//! node produces a fresh object.

use crate::args::{Argument, BoxError, CallArgs, Instance};
use crate::registry::{ClassRegistry, Constructor};
use smep_compiler::config::runtime::MaterializePreferences;
use smep_compiler::ir::{densify_positional, IrValue, ObjectForest, ObjectNode};
use smep_compiler::logging::{codes, Code};
use smep_compiler::{log_debug, log_error, log_success};
use std::collections::BTreeMap;

#[derive(Debug, thiserror::Error)]
pub enum MaterializeError {
    #[error("Cannot construct '{path}': class '{class_ref}' is not registered")]
    UnresolvableClass { path: String, class_ref: String },

    #[error("Positional arguments of '{path}' ({class_ref}) skip index {missing}; given {present:?}")]
    SparsePositionalArgs {
        path: String,
        class_ref: String,
        missing: usize,
        present: Vec<usize>,
    },

    #[error("Constructing '{path}' as {class_ref} failed: {source}")]
    ConstructionFailed {
        path: String,
        class_ref: String,
        #[source]
        source: BoxError,
    },
}

impl MaterializeError {
    pub fn error_code(&self) -> Code {
        match self {
            MaterializeError::UnresolvableClass { .. } => codes::materialize::UNRESOLVABLE_CLASS,
            MaterializeError::SparsePositionalArgs { .. } => {
                codes::materialize::SPARSE_POSITIONAL_ARGS
            }
            MaterializeError::ConstructionFailed { .. } => codes::materialize::CONSTRUCTION_FAILED,
        }
    }

    /// IR path of the node that failed
    pub fn path(&self) -> &str {
        match self {
            MaterializeError::UnresolvableClass { path, .. }
            | MaterializeError::SparsePositionalArgs { path, .. }
            | MaterializeError::ConstructionFailed { path, .. } => path,
        }
    }
}

pub struct Materializer<'r> {
    registry: &'r ClassRegistry,
    preferences: MaterializePreferences,
}

impl<'r> Materializer<'r> {
    pub fn new(registry: &'r ClassRegistry) -> Self {
        Self::with_preferences(registry, MaterializePreferences::default())
    }

    pub fn with_preferences(registry: &'r ClassRegistry, preferences: MaterializePreferences) -> Self {
        Self {
            registry,
            preferences,
        }
    }

    pub fn materialize(&self, node: &ObjectNode) -> Result<Instance, MaterializeError> {
        let constructor = self.registry.resolve(&node.class_ref).map_err(|_| {
            logged(MaterializeError::UnresolvableClass {
                path: node.path.clone(),
                class_ref: node.class_ref.clone(),
            })
        })?;

        let mut positional = BTreeMap::new();
        for (&index, value) in &node.positional_args {
            positional.insert(index, self.materialize_value(value)?);
        }

        let mut named = BTreeMap::new();
        for (name, value) in &node.named_args {
            named.insert(name.clone(), self.materialize_value(value)?);
        }

        let positional = densify(node, positional)?;

        if self.preferences.log_constructions {
            log_debug!("Constructing object",
                "path" => node.path,
                "class" => node.class_ref,
                "positional" => positional.len(),
                "named" => named.len()
            );
        }

        self.construct(&node.path, &node.class_ref, constructor, positional, named)
    }

    /// Call `class_ref` with keyword arguments only, as in `Class(**kwargs)`
    pub fn invoke(
        &self,
        class_ref: &str,
        named: BTreeMap<String, Argument>,
    ) -> Result<Instance, MaterializeError> {
        let constructor = self.registry.resolve(class_ref).map_err(|_| {
            logged(MaterializeError::UnresolvableClass {
                path: class_ref.to_string(),
                class_ref: class_ref.to_string(),
            })
        })?;

        self.construct(class_ref, class_ref, constructor, Vec::new(), named)
    }

    /// Materialize every root, keeping root order
    pub fn materialize_forest(
        &self,
        forest: &ObjectForest,
    ) -> Result<Vec<(String, Instance)>, MaterializeError> {
        let mut roots = Vec::with_capacity(forest.len());
        for node in forest.iter() {
            roots.push((node.path.clone(), self.materialize(node)?));
        }

        log_success!(codes::success::MATERIALIZATION_COMPLETE, "Objects materialized",
            "roots" => roots.len(),
            "objects" => forest.node_count()
        );

        Ok(roots)
    }

    fn construct(
        &self,
        path: &str,
        class_ref: &str,
        constructor: &dyn Constructor,
        positional: Vec<Argument>,
        named: BTreeMap<String, Argument>,
    ) -> Result<Instance, MaterializeError> {
        let canonical = self.registry.canonical_name(class_ref).unwrap_or(class_ref);

        let object = constructor
            .construct(CallArgs::new(class_ref, positional, named))
            .map_err(|source| {
                logged(MaterializeError::ConstructionFailed {
                    path: path.to_string(),
                    class_ref: class_ref.to_string(),
                    source,
                })
            })?;

        Ok(Instance::new(canonical, object))
    }

    fn materialize_value(&self, value: &IrValue) -> Result<Argument, MaterializeError> {
        match value {
            IrValue::Value(v) => Ok(Argument::Value(v.clone())),
            IrValue::Node(child) => self.materialize(child).map(Argument::Object),
        }
    }
}

fn densify(
    node: &ObjectNode,
    positional: BTreeMap<usize, Argument>,
) -> Result<Vec<Argument>, MaterializeError> {
    densify_positional(positional).map_err(|gap| {
        logged(MaterializeError::SparsePositionalArgs {
            path: node.path.clone(),
            class_ref: node.class_ref.clone(),
            missing: gap.missing,
            present: gap.present,
        })
    })
}

fn logged(error: MaterializeError) -> MaterializeError {
    log_error!(error.error_code(), &error.to_string(), "path" => error.path());
    error
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::args::ArgumentError;
    use assert_matches::assert_matches;
    use smep_compiler::ir::ObjectIrBuilder;
    use smep_compiler::lexical::parse_flat;
    use std::sync::{Arc, Mutex};

    #[derive(Debug, PartialEq)]
    struct Trainer {
        name: String,
        epochs: i64,
        learning_rate: f64,
    }

    #[derive(Debug)]
    struct Holder {
        cb: Option<Instance>,
        label: Option<String>,
    }

    #[derive(Debug)]
    struct Callback {
        name: String,
    }

    fn registry() -> ClassRegistry {
        let mut registry = ClassRegistry::new();
        registry
            .register_fn("mymodule.Trainer", |mut args: CallArgs| {
                let trainer = Trainer {
                    name: args.required_value(0, "name")?,
                    epochs: args.value_or(1, "epochs", 100)?,
                    learning_rate: args.value_or(2, "learning_rate", 0.001)?,
                };
                args.finish()?;
                Ok(trainer)
            })
            .unwrap();
        registry
            .register_fn("X", |mut args: CallArgs| {
                let holder = Holder {
                    cb: args.take_instance(0, "cb")?,
                    label: args.take_value(1, "label")?,
                };
                args.finish()?;
                Ok(holder)
            })
            .unwrap();
        registry
            .register_fn("Y", |mut args: CallArgs| {
                let callback = Callback {
                    name: args.required_value(0, "name")?,
                };
                args.finish()?;
                Ok(callback)
            })
            .unwrap();
        registry
    }

    fn forest(tokens: &[&str]) -> ObjectForest {
        let flat = parse_flat(tokens).unwrap();
        let compound = smep_compiler::partition::partition(flat).compound;
        ObjectIrBuilder::new().build(&compound).unwrap()
    }

    #[test]
    fn test_trainer_construction() {
        let registry = registry();
        let forest = forest(&[
            "--trainer.__class__",
            "mymodule.Trainer",
            "--trainer.epochs",
            "100",
            "--trainer.0",
            "abcd",
        ]);

        let instance = Materializer::new(&registry)
            .materialize(forest.get("trainer").unwrap())
            .unwrap();

        assert_eq!(instance.class_ref(), "mymodule.Trainer");
        assert_eq!(
            instance.downcast_ref::<Trainer>(),
            Some(&Trainer {
                name: "abcd".into(),
                epochs: 100,
                learning_rate: 0.001,
            })
        );
    }

    #[test]
    fn test_nested_object_built_first() {
        let registry = registry();
        let forest = forest(&["--a.__class__", "X", "--a.cb.__class__", "Y", "--a.cb.name", "n"]);

        let roots = Materializer::new(&registry).materialize_forest(&forest).unwrap();
        assert_eq!(roots.len(), 1);

        let holder = roots[0].1.downcast_ref::<Holder>().unwrap();
        let callback = holder.cb.as_ref().unwrap();
        assert_eq!(callback.class_ref(), "Y");
        assert_eq!(callback.downcast_ref::<Callback>().unwrap().name, "n");
        assert!(holder.label.is_none());
    }

    #[test]
    fn test_sparse_positional_args() {
        let registry = registry();
        let forest = forest(&[
            "--t.__class__",
            "mymodule.Trainer",
            "--t.0",
            "a",
            "--t.2",
            "0.1",
        ]);

        let result = Materializer::new(&registry).materialize(forest.get("t").unwrap());
        assert_matches!(
            result,
            Err(MaterializeError::SparsePositionalArgs { missing: 1, ref present, .. })
                if present == &[0, 2]
        );
    }

    #[test]
    fn test_unresolvable_class() {
        let registry = registry();
        let forest = forest(&["--t.__class__", "mymodule.Missing"]);

        let error = Materializer::new(&registry)
            .materialize(forest.get("t").unwrap())
            .unwrap_err();
        assert_matches!(error, MaterializeError::UnresolvableClass { ref class_ref, .. } if class_ref == "mymodule.Missing");
        assert_eq!(error.error_code(), codes::materialize::UNRESOLVABLE_CLASS);
    }

    #[test]
    fn test_unresolvable_nested_class() {
        let registry = registry();
        let forest = forest(&["--a.__class__", "X", "--a.cb.__class__", "Z"]);

        let error = Materializer::new(&registry)
            .materialize(forest.get("a").unwrap())
            .unwrap_err();
        assert_eq!(error.path(), "a.cb");
    }

    #[test]
    fn test_constructor_failure_keeps_source() {
        let registry = registry();
        let forest = forest(&["--t.__class__", "mymodule.Trainer", "--t.typo", "1", "--t.0", "n"]);

        let error = Materializer::new(&registry)
            .materialize(forest.get("t").unwrap())
            .unwrap_err();

        let MaterializeError::ConstructionFailed { source, .. } = &error else {
            panic!("expected ConstructionFailed, got {:?}", error);
        };
        assert_matches!(
            source.downcast_ref::<ArgumentError>(),
            Some(ArgumentError::Unexpected { .. })
        );
        assert!(std::error::Error::source(&error).is_some());
    }

    #[test]
    fn test_invoke_with_kwargs() {
        let registry = registry();
        let mut kwargs = BTreeMap::new();
        kwargs.insert("name".to_string(), Argument::Value(smep_compiler::Value::from("t")));
        kwargs.insert("epochs".to_string(), Argument::Value(smep_compiler::Value::Int(3)));

        let instance = Materializer::new(&registry)
            .invoke("mymodule.Trainer", kwargs)
            .unwrap();
        assert_eq!(instance.downcast_ref::<Trainer>().unwrap().epochs, 3);

        assert_matches!(
            Materializer::new(&registry).invoke("nope.Nope", BTreeMap::new()),
            Err(MaterializeError::UnresolvableClass { .. })
        );
    }

    #[test]
    fn test_every_node_is_fresh() {
        let calls = Arc::new(Mutex::new(0));
        let counter = Arc::clone(&calls);

        let mut registry = ClassRegistry::new();
        registry
            .register_fn("Y", move |mut args: CallArgs| {
                if let Ok(mut count) = counter.lock() {
                    *count += 1;
                }
                let callback = Callback {
                    name: args.value_or(0, "name", String::new())?,
                };
                Ok(callback)
            })
            .unwrap();

        let forest = forest(&["--a.__class__", "Y", "--b.__class__", "Y"]);
        let roots = Materializer::new(&registry).materialize_forest(&forest).unwrap();

        assert_eq!(roots.len(), 2);
        assert_eq!(*calls.lock().unwrap(), 2);
    }
}
