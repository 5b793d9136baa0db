//! Pairwise `--key value` tokenizer

use super::args::FlatArgs;
use crate::config::compile_time::lexical::*;
use crate::config::runtime::TokenizerPreferences;
use crate::inference::infer_value;
use crate::logging::codes;
use crate::{log_debug, log_error, log_success, log_warning};
use std::collections::BTreeMap;

const FLAG_PREFIX: &str = "--";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TokenizeError {
    #[error("Flag '--{key}' at position {position} has no value")]
    DanglingFlag { key: String, position: usize },

    #[error("Expected a '--' flag at position {position}, found '{token}'")]
    MissingFlagPrefix { token: String, position: usize },

    #[error("Empty flag name at position {position}")]
    EmptyKey { position: usize },

    #[error("Too many argument tokens: {count} (limit {limit})")]
    TooManyTokens { count: usize, limit: usize },

    #[error("Key '{key}' is {length} bytes long (limit {limit})")]
    KeyTooLong {
        key: String,
        length: usize,
        limit: usize,
    },

    #[error("Value for '{key}' is {length} bytes long (limit {limit})")]
    ValueTooLong {
        key: String,
        length: usize,
        limit: usize,
    },
}

impl TokenizeError {
    pub fn error_code(&self) -> crate::logging::Code {
        match self {
            TokenizeError::DanglingFlag { .. } => codes::tokenizer::DANGLING_FLAG,
            TokenizeError::MissingFlagPrefix { .. } => codes::tokenizer::MISSING_FLAG_PREFIX,
            TokenizeError::EmptyKey { .. } => codes::tokenizer::EMPTY_KEY,
            TokenizeError::TooManyTokens { .. } => codes::tokenizer::TOO_MANY_TOKENS,
            TokenizeError::KeyTooLong { .. } => codes::tokenizer::KEY_TOO_LONG,
            TokenizeError::ValueTooLong { .. } => codes::tokenizer::VALUE_TOO_LONG,
        }
    }

    pub fn dangling_flag(key: &str, position: usize) -> Self {
        Self::DanglingFlag {
            key: key.to_string(),
            position,
        }
    }

    pub fn missing_flag_prefix(token: &str, position: usize) -> Self {
        Self::MissingFlagPrefix {
            token: token.to_string(),
            position,
        }
    }
}

/// A value token that itself looks like a flag, e.g. `--lr --epochs`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SuspiciousPair {
    pub key: String,
    pub value: String,
    pub position: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TokenizerMetrics {
    pub token_count: usize,
    pub pair_count: usize,
    pub overwritten_keys: Vec<String>,
    pub suspicious_pairs: usize,
    pub type_counts: BTreeMap<&'static str, usize>,
}

#[derive(Debug, Clone)]
pub struct TokenizeOutput {
    pub args: FlatArgs,
    pub warnings: Vec<SuspiciousPair>,
    pub metrics: TokenizerMetrics,
}

pub struct ArgumentTokenizer {
    preferences: TokenizerPreferences,
    metrics: TokenizerMetrics,
}

impl ArgumentTokenizer {
    pub fn new() -> Self {
        Self::with_preferences(TokenizerPreferences::default())
    }

    pub fn with_preferences(preferences: TokenizerPreferences) -> Self {
        Self {
            preferences,
            metrics: TokenizerMetrics::default(),
        }
    }

    pub fn metrics(&self) -> &TokenizerMetrics {
        &self.metrics
    }

    pub fn tokenize<S: AsRef<str>>(&mut self, tokens: &[S]) -> Result<TokenizeOutput, TokenizeError> {
        self.metrics = TokenizerMetrics {
            token_count: tokens.len(),
            ..TokenizerMetrics::default()
        };

        if tokens.len() > MAX_TOKEN_COUNT {
            let error = TokenizeError::TooManyTokens {
                count: tokens.len(),
                limit: MAX_TOKEN_COUNT,
            };
            log_error!(error.error_code(), "Token limit exceeded",
                "token_count" => tokens.len(),
                "limit" => MAX_TOKEN_COUNT
            );
            return Err(error);
        }

        let mut args = FlatArgs::new();
        let mut warnings = Vec::new();
        let mut position = 0;

        while position < tokens.len() {
            let key = Self::parse_flag(tokens[position].as_ref(), position)?;

            let Some(raw) = tokens.get(position + 1) else {
                let error = TokenizeError::dangling_flag(key, position);
                log_error!(error.error_code(), "Flag has no value", "key" => key);
                return Err(error);
            };
            let raw: &str = raw.as_ref();

            if raw.len() > MAX_VALUE_LENGTH {
                let error = TokenizeError::ValueTooLong {
                    key: key.to_string(),
                    length: raw.len(),
                    limit: MAX_VALUE_LENGTH,
                };
                log_error!(error.error_code(), "Value too long", "key" => key);
                return Err(error);
            }

            if raw.starts_with(FLAG_PREFIX) {
                self.metrics.suspicious_pairs += 1;
                if self.preferences.warn_on_suspicious_pairs {
                    log_warning!(codes::tokenizer::SUSPICIOUS_PAIR,
                        "Value looks like a flag; an earlier value may be missing",
                        "key" => key,
                        "value" => raw,
                        "position" => position + 1
                    );
                }
                warnings.push(SuspiciousPair {
                    key: key.to_string(),
                    value: raw.to_string(),
                    position: position + 1,
                });
            }

            let value = infer_value(raw);
            if self.preferences.collect_type_metrics {
                *self.metrics.type_counts.entry(value.type_name()).or_insert(0) += 1;
            }
            if self.preferences.log_inferred_values {
                log_debug!("Inferred value", "key" => key, "type" => value.type_name());
            }

            if args.insert(key, value).is_some() {
                self.metrics.overwritten_keys.push(key.to_string());
            }

            self.metrics.pair_count += 1;
            position += 2;
        }

        log_success!(codes::success::TOKENIZATION_COMPLETE, "Argument tokenization completed",
            "pairs" => self.metrics.pair_count,
            "keys" => args.len(),
            "suspicious_pairs" => self.metrics.suspicious_pairs
        );

        Ok(TokenizeOutput {
            args,
            warnings,
            metrics: self.metrics.clone(),
        })
    }

    fn parse_flag(token: &str, position: usize) -> Result<&str, TokenizeError> {
        let Some(key) = token.strip_prefix(FLAG_PREFIX) else {
            let error = TokenizeError::missing_flag_prefix(token, position);
            log_error!(error.error_code(), "Expected a --flag", "token" => token);
            return Err(error);
        };

        if key.is_empty() {
            let error = TokenizeError::EmptyKey { position };
            log_error!(error.error_code(), "Empty flag name", "position" => position);
            return Err(error);
        }

        if key.len() > MAX_KEY_LENGTH {
            let error = TokenizeError::KeyTooLong {
                key: key.to_string(),
                length: key.len(),
                limit: MAX_KEY_LENGTH,
            };
            log_error!(error.error_code(), "Key too long", "length" => key.len());
            return Err(error);
        }

        Ok(key)
    }
}

impl Default for ArgumentTokenizer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::values::Value;
    use assert_matches::assert_matches;
    use serde_json::json;

    fn tokenize(tokens: &[&str]) -> Result<TokenizeOutput, TokenizeError> {
        ArgumentTokenizer::new().tokenize(tokens)
    }

    #[test]
    fn test_basic_pairs_are_inferred() {
        let output = tokenize(&[
            "--epochs",
            "7",
            "--init",
            "xavier",
            "--dict_arg",
            r#"{"seq": [1, 2]}"#,
        ])
        .unwrap();

        assert_eq!(output.args.len(), 3);
        assert_eq!(output.args.get("epochs"), Some(&Value::Int(7)));
        assert_eq!(output.args.get("init"), Some(&Value::from("xavier")));
        assert_eq!(
            output.args.get("dict_arg"),
            Some(&Value::Json(json!({"seq": [1, 2]})))
        );
        assert!(output.warnings.is_empty());
    }

    #[test]
    fn test_empty_input() {
        let output = tokenize(&[]).unwrap();
        assert!(output.args.is_empty());
        assert_eq!(output.metrics.pair_count, 0);
    }

    #[test]
    fn test_dangling_flag() {
        let result = tokenize(&["--epochs", "7", "--init"]);
        assert_matches!(
            result,
            Err(TokenizeError::DanglingFlag { ref key, position: 2 }) if key == "init"
        );
    }

    #[test]
    fn test_missing_prefix() {
        let result = tokenize(&["epochs", "7"]);
        assert_matches!(result, Err(TokenizeError::MissingFlagPrefix { position: 0, .. }));

        let result = tokenize(&["-e", "7"]);
        assert_matches!(result, Err(TokenizeError::MissingFlagPrefix { .. }));
    }

    #[test]
    fn test_bare_double_dash() {
        assert_matches!(
            tokenize(&["--", "7"]),
            Err(TokenizeError::EmptyKey { position: 0 })
        );
    }

    #[test]
    fn test_duplicate_keys_last_wins() {
        let output = tokenize(&["--lr", "0.1", "--epochs", "3", "--lr", "0.5"]).unwrap();

        assert_eq!(output.args.get("lr"), Some(&Value::Float(0.5)));
        assert_eq!(output.args.keys().collect::<Vec<_>>(), vec!["lr", "epochs"]);
        assert_eq!(output.metrics.overwritten_keys, vec!["lr".to_string()]);
    }

    #[test]
    fn test_suspicious_pair_is_kept_and_reported() {
        let output = tokenize(&["--lr", "--epochs", "3", "4"]);
        // "3" is in flag position
        assert_matches!(output, Err(TokenizeError::MissingFlagPrefix { position: 2, .. }));

        let output = tokenize(&["--name", "--weird"]).unwrap();
        assert_eq!(output.args.get("name"), Some(&Value::from("--weird")));
        assert_eq!(
            output.warnings,
            vec![SuspiciousPair {
                key: "name".into(),
                value: "--weird".into(),
                position: 1,
            }]
        );
        assert_eq!(output.metrics.suspicious_pairs, 1);
    }

    #[test]
    fn test_negative_numbers_are_not_suspicious() {
        let output = tokenize(&["--offset", "-5"]).unwrap();
        assert_eq!(output.args.get("offset"), Some(&Value::Int(-5)));
        assert!(output.warnings.is_empty());
    }

    #[test]
    fn test_type_metrics() {
        let output = tokenize(&["--a", "1", "--b", "2", "--c", "x"]).unwrap();
        assert_eq!(output.metrics.type_counts.get("int"), Some(&2));
        assert_eq!(output.metrics.type_counts.get("str"), Some(&1));
    }

    #[test]
    fn test_key_length_limit() {
        let key = format!("--{}", "k".repeat(MAX_KEY_LENGTH + 1));
        assert_matches!(
            tokenize(&[key.as_str(), "1"]),
            Err(TokenizeError::KeyTooLong { .. })
        );
    }

    #[test]
    fn test_error_codes() {
        assert_eq!(
            TokenizeError::dangling_flag("x", 0).error_code(),
            codes::tokenizer::DANGLING_FLAG
        );
        assert_eq!(
            TokenizeError::EmptyKey { position: 0 }.error_code().as_str(),
            "E022"
        );
    }
}
