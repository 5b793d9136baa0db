//! Minimal SageMaker entrypoint protocol
//!
//! Resolves the model dir, output dir and data channels from
//! `--model-dir`, `--output-data-dir` and `--<channel>` flags, falling back to
//! `SM_*` environment variables and then to local relative paths. Every token
//! not claimed here is handed back as hyperparameters.

use serde::{Deserialize, Serialize};
use smep_compiler::logging::{codes, Code};
use smep_compiler::{log_error, log_success};
use std::collections::BTreeMap;
use std::env;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

pub const MODEL_DIR_FLAG: &str = "model-dir";
pub const OUTPUT_DATA_DIR_FLAG: &str = "output-data-dir";

pub mod env_vars {
    pub const MODEL_DIR: &str = "SM_MODEL_DIR";
    pub const OUTPUT_DATA_DIR: &str = "SM_OUTPUT_DATA_DIR";
    pub const CHANNEL_PREFIX: &str = "SM_CHANNEL_";
    /// Set on every SageMaker host
    pub const HOSTS: &str = "SM_HOSTS";
}

#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    #[error("Cannot read protocol config {path}: {source}")]
    ConfigRead {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Invalid protocol config: {0}")]
    ConfigParse(#[from] toml::de::Error),

    #[error("Invalid channel name '{name}': {reason}")]
    InvalidChannel { name: String, reason: &'static str },

    #[error("Cannot create directory {path}: {source}")]
    DirectoryCreation {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Argument --{flag} expects a value")]
    MissingValue { flag: String },
}

impl ProtocolError {
    pub fn error_code(&self) -> Code {
        match self {
            ProtocolError::ConfigRead { .. }
            | ProtocolError::ConfigParse(_)
            | ProtocolError::InvalidChannel { .. } => codes::protocol::CONFIGURATION_ERROR,
            ProtocolError::DirectoryCreation { .. } => codes::protocol::DIRECTORY_CREATION_FAILED,
            ProtocolError::MissingValue { .. } => codes::protocol::INVALID_PROTOCOL_ARGUMENT,
        }
    }
}

/// Local fallbacks used when the `SM_*` variables are absent
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProtocolConfig {
    pub model: String,
    pub output: String,
    pub channels: Vec<String>,
    /// Parent of local channel dirs: `<channel_prefix>/<channel>`
    pub channel_prefix: String,
    /// Create model and output dirs when running outside SageMaker
    pub mkdir_local: bool,
}

impl Default for ProtocolConfig {
    fn default() -> Self {
        Self {
            model: "model".to_string(),
            output: "output".to_string(),
            channels: vec!["train".to_string(), "test".to_string(), "validation".to_string()],
            channel_prefix: "data".to_string(),
            mkdir_local: true,
        }
    }
}

impl ProtocolConfig {
    pub fn from_toml_str(content: &str) -> Result<Self, ProtocolError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, ProtocolError> {
        let content = fs::read_to_string(path).map_err(|source| ProtocolError::ConfigRead {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    pub fn validate(&self) -> Result<(), ProtocolError> {
        for name in &self.channels {
            let reason = if name.is_empty() {
                Some("empty name")
            } else if name == MODEL_DIR_FLAG || name == OUTPUT_DATA_DIR_FLAG {
                Some("collides with a directory flag")
            } else if name.starts_with('-') || name.contains('=') || name.contains(char::is_whitespace) {
                Some("must be a bare flag name")
            } else {
                None
            };

            if let Some(reason) = reason {
                return Err(ProtocolError::InvalidChannel {
                    name: name.clone(),
                    reason,
                });
            }
        }
        Ok(())
    }

    /// Defaults from the process environment
    pub fn defaults(&self) -> ProtocolArgs {
        self.defaults_from(|key| env::var(key).ok())
    }

    /// Defaults with an explicit environment lookup
    pub fn defaults_from<F>(&self, lookup: F) -> ProtocolArgs
    where
        F: Fn(&str) -> Option<String>,
    {
        let model_dir = lookup(env_vars::MODEL_DIR).unwrap_or_else(|| self.model.clone());
        let output_data_dir =
            lookup(env_vars::OUTPUT_DATA_DIR).unwrap_or_else(|| self.output.clone());

        let channels = self
            .channels
            .iter()
            .map(|channel| {
                let path = lookup(&channel_env_var(channel))
                    .map(PathBuf::from)
                    .unwrap_or_else(|| Path::new(&self.channel_prefix).join(channel));
                (channel.clone(), path)
            })
            .collect();

        ProtocolArgs {
            model_dir: PathBuf::from(model_dir),
            output_data_dir: PathBuf::from(output_data_dir),
            channels,
        }
    }

    /// Split `cli_args` into protocol args and the unclaimed remainder
    pub fn parse_known_args<S: AsRef<str>>(
        &self,
        cli_args: &[S],
    ) -> Result<(ProtocolArgs, Vec<String>), ProtocolError> {
        self.parse_known_args_with(cli_args, self.defaults())
    }

    pub fn parse_known_args_with<S: AsRef<str>>(
        &self,
        cli_args: &[S],
        mut resolved: ProtocolArgs,
    ) -> Result<(ProtocolArgs, Vec<String>), ProtocolError> {
        let mut remainder = Vec::new();
        let mut tokens = cli_args.iter().map(AsRef::<str>::as_ref);

        while let Some(token) = tokens.next() {
            let Some(flag) = token.strip_prefix("--") else {
                remainder.push(token.to_string());
                continue;
            };

            let (name, inline_value) = match flag.split_once('=') {
                Some((name, value)) => (name, Some(value)),
                None => (flag, None),
            };

            if !self.is_protocol_flag(name) {
                remainder.push(token.to_string());
                continue;
            }

            let value = match inline_value {
                Some(value) => value,
                None => match tokens.next() {
                    Some(value) if !value.starts_with("--") => value,
                    _ => {
                        let error = ProtocolError::MissingValue {
                            flag: name.to_string(),
                        };
                        log_error!(error.error_code(), "Protocol flag without value", "flag" => name);
                        return Err(error);
                    }
                },
            };

            resolved.set(name, PathBuf::from(value));
        }

        log_success!(codes::success::PROTOCOL_RESOLVED, "Protocol arguments resolved",
            "model_dir" => resolved.model_dir.display(),
            "output_data_dir" => resolved.output_data_dir.display(),
            "hyperparameter_tokens" => remainder.len()
        );

        Ok((resolved, remainder))
    }

    fn is_protocol_flag(&self, name: &str) -> bool {
        name == MODEL_DIR_FLAG
            || name == OUTPUT_DATA_DIR_FLAG
            || self.channels.iter().any(|channel| channel == name)
    }
}

/// Resolved directories of one training run
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProtocolArgs {
    pub model_dir: PathBuf,
    pub output_data_dir: PathBuf,
    pub channels: BTreeMap<String, PathBuf>,
}

impl ProtocolArgs {
    pub fn channel(&self, name: &str) -> Option<&Path> {
        self.channels.get(name).map(PathBuf::as_path)
    }

    /// Create the model and output dirs if missing
    pub fn create_local_dirs(&self) -> Result<(), ProtocolError> {
        mkdir(&self.model_dir)?;
        mkdir(&self.output_data_dir)?;
        Ok(())
    }

    fn set(&mut self, flag: &str, path: PathBuf) {
        match flag {
            MODEL_DIR_FLAG => self.model_dir = path,
            OUTPUT_DATA_DIR_FLAG => self.output_data_dir = path,
            channel => {
                self.channels.insert(channel.to_string(), path);
            }
        }
    }
}

/// `SM_CHANNEL_<NAME>` for a channel
pub fn channel_env_var(channel: &str) -> String {
    format!("{}{}", env_vars::CHANNEL_PREFIX, channel.to_uppercase())
}

/// Guess whether the process runs on SageMaker
pub fn is_on_sagemaker() -> bool {
    env::var_os(env_vars::HOSTS).is_some()
}

/// Create a directory and its parents; existing dirs are fine
pub fn mkdir(path: impl AsRef<Path>) -> Result<PathBuf, ProtocolError> {
    let path = pathify(path);
    fs::create_dir_all(&path).map_err(|source| {
        let error = ProtocolError::DirectoryCreation {
            path: path.clone(),
            source,
        };
        log_error!(error.error_code(), "Directory creation failed", "path" => path.display());
        error
    })?;
    Ok(path)
}

pub fn pathify(path: impl AsRef<Path>) -> PathBuf {
    path.as_ref().to_path_buf()
}
