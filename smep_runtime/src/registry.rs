//! Class registry mapping qualified class names to constructors
//!
//! Only registered names can be built from hyperparameters. Names follow
//! dotted identifier syntax (`mymodule.Trainer`); aliases let a short name
//! resolve to a registered class.

use crate::args::{BoxError, CallArgs, HyperObject};
use chrono::{DateTime, Utc};
use regex::Regex;
use smep_compiler::logging::{codes, Code};
use smep_compiler::{log_error, log_success};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::{Arc, OnceLock};

const CLASS_NAME_PATTERN: &str = r"^[A-Za-z_][A-Za-z0-9_]*(\.[A-Za-z_][A-Za-z0-9_]*)*$";

static CLASS_NAME_REGEX: OnceLock<Result<Regex, String>> = OnceLock::new();

/// Builds one class from its call arguments
pub trait Constructor: Send + Sync {
    fn construct(&self, args: CallArgs) -> Result<Arc<dyn HyperObject>, BoxError>;
}

impl<F> Constructor for F
where
    F: Fn(CallArgs) -> Result<Arc<dyn HyperObject>, BoxError> + Send + Sync,
{
    fn construct(&self, args: CallArgs) -> Result<Arc<dyn HyperObject>, BoxError> {
        self(args)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegistryError {
    #[error("Class '{name}' is already registered")]
    DuplicateClass { name: String },

    #[error("Invalid class name '{name}': expected dotted identifiers such as 'module.Class'")]
    InvalidClassName { name: String },

    #[error("Unknown class '{name}'")]
    UnknownClass { name: String },

    #[error("Class name pattern failed to compile: {0}")]
    Pattern(String),
}

impl RegistryError {
    pub fn error_code(&self) -> Code {
        match self {
            RegistryError::DuplicateClass { .. } => codes::registry::DUPLICATE_CLASS,
            RegistryError::InvalidClassName { .. } => codes::registry::INVALID_CLASS_NAME,
            RegistryError::UnknownClass { .. } => codes::materialize::UNRESOLVABLE_CLASS,
            RegistryError::Pattern(_) => codes::system::INTERNAL_ERROR,
        }
    }
}

struct ClassEntry {
    constructor: Box<dyn Constructor>,
    registered_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct RegistryMetadata {
    pub total_classes: usize,
    pub creation_time: DateTime<Utc>,
    pub last_registration: Option<DateTime<Utc>>,
    pub validation_enabled: bool,
}

/// Read-only during materialization; `Send + Sync` so it can be shared
pub struct ClassRegistry {
    classes: HashMap<String, ClassEntry>,
    aliases: HashMap<String, String>,
    metadata: RegistryMetadata,
}

impl ClassRegistry {
    pub fn new() -> Self {
        Self {
            classes: HashMap::new(),
            aliases: HashMap::new(),
            metadata: RegistryMetadata {
                total_classes: 0,
                creation_time: Utc::now(),
                last_registration: None,
                validation_enabled: true,
            },
        }
    }

    /// Registry that accepts any non-empty name (for testing)
    pub fn new_unvalidated() -> Self {
        let mut registry = Self::new();
        registry.metadata.validation_enabled = false;
        registry
    }

    pub fn register(
        &mut self,
        name: &str,
        constructor: Box<dyn Constructor>,
    ) -> Result<(), RegistryError> {
        self.validate_name(name)?;

        if self.contains(name) {
            let error = RegistryError::DuplicateClass {
                name: name.to_string(),
            };
            log_error!(error.error_code(), "Class registered twice", "class" => name);
            return Err(error);
        }

        let now = Utc::now();
        self.classes.insert(
            name.to_string(),
            ClassEntry {
                constructor,
                registered_at: now,
            },
        );

        self.metadata.total_classes += 1;
        self.metadata.last_registration = Some(now);

        Ok(())
    }

    /// Register a closure returning a concrete object type
    pub fn register_fn<T, F>(&mut self, name: &str, constructor: F) -> Result<(), RegistryError>
    where
        T: HyperObject,
        F: Fn(CallArgs) -> Result<T, BoxError> + Send + Sync + 'static,
    {
        self.register(
            name,
            Box::new(move |args: CallArgs| {
                constructor(args).map(|object| Arc::new(object) as Arc<dyn HyperObject>)
            }),
        )
    }

    /// Make `alias` resolve to the registered class `target`
    pub fn alias(&mut self, alias: &str, target: &str) -> Result<(), RegistryError> {
        self.validate_name(alias)?;

        if self.contains(alias) {
            return Err(RegistryError::DuplicateClass {
                name: alias.to_string(),
            });
        }

        let canonical = self
            .canonical_name(target)
            .ok_or_else(|| RegistryError::UnknownClass {
                name: target.to_string(),
            })?
            .to_string();

        self.aliases.insert(alias.to_string(), canonical);
        Ok(())
    }

    /// Registered name behind `name`, following one alias hop
    pub fn canonical_name<'a>(&'a self, name: &'a str) -> Option<&'a str> {
        if self.classes.contains_key(name) {
            return Some(name);
        }
        self.aliases.get(name).map(String::as_str)
    }

    pub fn resolve(&self, name: &str) -> Result<&dyn Constructor, RegistryError> {
        self.canonical_name(name)
            .and_then(|canonical| self.classes.get(canonical))
            .map(|entry| entry.constructor.as_ref())
            .ok_or_else(|| RegistryError::UnknownClass {
                name: name.to_string(),
            })
    }

    pub fn contains(&self, name: &str) -> bool {
        self.classes.contains_key(name) || self.aliases.contains_key(name)
    }

    pub fn registered_at(&self, name: &str) -> Option<DateTime<Utc>> {
        self.canonical_name(name)
            .and_then(|canonical| self.classes.get(canonical))
            .map(|entry| entry.registered_at)
    }

    /// Remove a class and every alias pointing at it
    pub fn unregister(&mut self, name: &str) -> Result<(), RegistryError> {
        if self.classes.remove(name).is_none() {
            return Err(RegistryError::UnknownClass {
                name: name.to_string(),
            });
        }

        self.aliases.retain(|_, target| target != name);
        self.metadata.total_classes = self.metadata.total_classes.saturating_sub(1);
        Ok(())
    }

    /// Registered class names, sorted
    pub fn list_classes(&self) -> Vec<String> {
        let mut names: Vec<String> = self.classes.keys().cloned().collect();
        names.sort();
        names
    }

    /// `(alias, target)` pairs, sorted by alias
    pub fn list_aliases(&self) -> Vec<(String, String)> {
        let mut aliases: Vec<(String, String)> = self
            .aliases
            .iter()
            .map(|(alias, target)| (alias.clone(), target.clone()))
            .collect();
        aliases.sort();
        aliases
    }

    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }

    pub fn metadata(&self) -> &RegistryMetadata {
        &self.metadata
    }

    pub fn get_statistics(&self) -> RegistryStatistics {
        let mut namespaces = BTreeMap::new();
        for name in self.classes.keys() {
            let namespace = name
                .rsplit_once('.')
                .map(|(namespace, _)| namespace)
                .unwrap_or("");
            *namespaces.entry(namespace.to_string()).or_insert(0) += 1;
        }

        RegistryStatistics {
            total_classes: self.classes.len(),
            total_aliases: self.aliases.len(),
            namespaces,
            creation_time: self.metadata.creation_time,
            last_registration: self.metadata.last_registration,
        }
    }

    pub fn clear(&mut self) {
        self.classes.clear();
        self.aliases.clear();
        self.metadata.total_classes = 0;
        self.metadata.last_registration = None;
    }

    pub fn set_validation_enabled(&mut self, enabled: bool) {
        self.metadata.validation_enabled = enabled;
    }

    fn validate_name(&self, name: &str) -> Result<(), RegistryError> {
        let valid = if self.metadata.validation_enabled {
            class_name_regex()?.is_match(name)
        } else {
            !name.is_empty()
        };

        if valid {
            Ok(())
        } else {
            let error = RegistryError::InvalidClassName {
                name: name.to_string(),
            };
            log_error!(error.error_code(), "Rejected class name", "class" => name);
            Err(error)
        }
    }
}

impl Default for ClassRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for ClassRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClassRegistry")
            .field("classes", &self.list_classes())
            .field("aliases", &self.list_aliases())
            .field("metadata", &self.metadata)
            .finish()
    }
}

fn class_name_regex() -> Result<&'static Regex, RegistryError> {
    CLASS_NAME_REGEX
        .get_or_init(|| Regex::new(CLASS_NAME_PATTERN).map_err(|e| e.to_string()))
        .as_ref()
        .map_err(|e| RegistryError::Pattern(e.clone()))
}

/// Whether `name` is a syntactically valid class name
pub fn is_valid_class_name(name: &str) -> bool {
    class_name_regex()
        .map(|regex| regex.is_match(name))
        .unwrap_or(false)
}

// ============================================================================
// Supporting Data Structures
// ============================================================================

#[derive(Debug, Clone)]
pub struct RegistryStatistics {
    pub total_classes: usize,
    pub total_aliases: usize,
    /// Class count per module prefix (`""` for top-level names)
    pub namespaces: BTreeMap<String, usize>,
    pub creation_time: DateTime<Utc>,
    pub last_registration: Option<DateTime<Utc>>,
}

// ============================================================================
// Registry Builder
// ============================================================================

pub struct RegistryBuilder {
    registry: ClassRegistry,
}

impl RegistryBuilder {
    pub fn new() -> Self {
        Self {
            registry: ClassRegistry::new(),
        }
    }

    pub fn with_validation(mut self, enabled: bool) -> Self {
        self.registry.set_validation_enabled(enabled);
        self
    }

    pub fn add_class<T, F>(mut self, name: &str, constructor: F) -> Result<Self, RegistryError>
    where
        T: HyperObject,
        F: Fn(CallArgs) -> Result<T, BoxError> + Send + Sync + 'static,
    {
        self.registry.register_fn(name, constructor)?;
        Ok(self)
    }

    pub fn add_alias(mut self, alias: &str, target: &str) -> Result<Self, RegistryError> {
        self.registry.alias(alias, target)?;
        Ok(self)
    }

    pub fn build(self) -> ClassRegistry {
        log_success!(codes::success::REGISTRY_READY, "Class registry ready",
            "classes" => self.registry.len(),
            "aliases" => self.registry.aliases.len()
        );
        self.registry
    }
}

impl Default for RegistryBuilder {
    fn default() -> Self {
        Self::new()
    }
}
