//! Splits flat arguments into plain keys and dotted (compound) keys

use crate::lexical::FlatArgs;
use crate::log_error;
use crate::log_success;
use crate::logging::codes;
use std::collections::HashSet;

pub const KEY_SEPARATOR: char = '.';

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PartitionError {
    #[error("Plain argument '{key}' collides with the object rooted at '{key}.'")]
    ConflictingKeys { key: String },
}

impl PartitionError {
    pub fn error_code(&self) -> crate::logging::Code {
        match self {
            PartitionError::ConflictingKeys { .. } => codes::partition::CONFLICTING_KEYS,
        }
    }
}

/// Disjoint halves of a [`FlatArgs`], each keeping input order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PartitionedArgs {
    pub plain: FlatArgs,
    pub compound: FlatArgs,
}

pub fn is_compound_key(key: &str) -> bool {
    key.contains(KEY_SEPARATOR)
}

/// Pure split on the presence of `.`; values are untouched
pub fn partition(args: FlatArgs) -> PartitionedArgs {
    let mut result = PartitionedArgs::default();

    for (key, value) in args {
        if is_compound_key(&key) {
            result.compound.insert(key, value);
        } else {
            result.plain.insert(key, value);
        }
    }

    result
}

/// Rejects a plain key that equals the first segment of any compound key
pub fn check_conflicts(partitioned: &PartitionedArgs) -> Result<(), PartitionError> {
    let roots: HashSet<&str> = partitioned
        .compound
        .keys()
        .filter_map(|key| key.split(KEY_SEPARATOR).next())
        .collect();

    if let Some(key) = partitioned.plain.keys().find(|key| roots.contains(key)) {
        let error = PartitionError::ConflictingKeys {
            key: key.to_string(),
        };
        log_error!(error.error_code(), "Plain argument shadows an object root", "key" => key);
        return Err(error);
    }

    Ok(())
}

/// Split and reject root collisions
pub fn partition_checked(args: FlatArgs) -> Result<PartitionedArgs, PartitionError> {
    let partitioned = partition(args);
    check_conflicts(&partitioned)?;

    log_success!(codes::success::PARTITION_COMPLETE, "Arguments partitioned",
        "plain" => partitioned.plain.len(),
        "compound" => partitioned.compound.len()
    );

    Ok(partitioned)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::values::Value;
    use assert_matches::assert_matches;

    fn flat(pairs: &[(&str, Value)]) -> FlatArgs {
        pairs.iter().cloned().collect()
    }

    #[test]
    fn test_split_is_disjoint_and_complete() {
        let args = flat(&[
            ("epochs", Value::Int(3)),
            ("trainer.__class__", Value::from("mymodule.Trainer")),
            ("lr", Value::Float(0.1)),
            ("trainer.epochs", Value::Int(100)),
        ]);

        let result = partition(args);

        assert_eq!(result.plain.keys().collect::<Vec<_>>(), vec!["epochs", "lr"]);
        assert_eq!(
            result.compound.keys().collect::<Vec<_>>(),
            vec!["trainer.__class__", "trainer.epochs"]
        );
        assert_eq!(result.compound.get("trainer.epochs"), Some(&Value::Int(100)));
    }

    #[test]
    fn test_empty_input() {
        let result = partition(FlatArgs::new());
        assert!(result.plain.is_empty());
        assert!(result.compound.is_empty());
    }

    #[test]
    fn test_plain_key_shadowing_object_root() {
        let args = flat(&[
            ("trainer", Value::from("x")),
            ("trainer.__class__", Value::from("mymodule.Trainer")),
        ]);

        assert_matches!(
            partition_checked(args),
            Err(PartitionError::ConflictingKeys { ref key }) if key == "trainer"
        );
    }

    #[test]
    fn test_prefix_without_separator_is_not_a_conflict() {
        let args = flat(&[
            ("train", Value::Int(1)),
            ("trainer.__class__", Value::from("mymodule.Trainer")),
        ]);

        assert!(partition_checked(args).is_ok());
    }
}
