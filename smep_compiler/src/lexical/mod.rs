//! Flat argument tokenizing
//!
//! Turns `["--key", "value", ...]` into an ordered [`FlatArgs`] mapping with
//! every value passed through scalar inference.

pub mod args;
pub mod tokenizer;

use crate::config::runtime::TokenizerPreferences;

pub use args::FlatArgs;
pub use tokenizer::{
    ArgumentTokenizer, SuspiciousPair, TokenizeError, TokenizeOutput, TokenizerMetrics,
};

/// Tokenize with default preferences
pub fn tokenize<S: AsRef<str>>(tokens: &[S]) -> Result<TokenizeOutput, TokenizeError> {
    ArgumentTokenizer::new().tokenize(tokens)
}

pub fn tokenize_with_preferences<S: AsRef<str>>(
    tokens: &[S],
    preferences: TokenizerPreferences,
) -> Result<TokenizeOutput, TokenizeError> {
    ArgumentTokenizer::with_preferences(preferences).tokenize(tokens)
}

/// Flat parse only: no object lowering, values inferred
pub fn parse_flat<S: AsRef<str>>(tokens: &[S]) -> Result<FlatArgs, TokenizeError> {
    tokenize(tokens).map(|output| output.args)
}
