//! Sampling parameters accepted by [`crate::client::CompletionClient::completion`].
//!
//! The allowed key set is closed: callers override by name, and any name
//! outside the set fails validation with *every* offending key listed.
//! Catching a typo like `temprature` at validation time is the whole point —
//! the OpenAI API silently ignores unknown body fields, so a misspelt
//! parameter would otherwise change model behaviour without any signal.
//!
//! Values are taken as supplied; there is no range checking beyond key
//! membership (the API reports its own 400 for out-of-range values).

use crate::error::CompletionError;
use std::collections::BTreeMap;

/// Names of the parameters callers may override, in sorted order.
pub const ALLOWED_PARAM_KEYS: [&str; 5] = [
    "frequency_penalty",
    "max_tokens",
    "presence_penalty",
    "temperature",
    "top_p",
];

/// The merged sampling-parameter set for one completion call.
///
/// Constructed per call via [`LlmParams::validate`] and discarded afterwards;
/// never stored on the client.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize)]
pub struct LlmParams {
    pub max_tokens: u32,
    pub temperature: f32,
    pub top_p: f32,
    pub frequency_penalty: f32,
    pub presence_penalty: f32,
}

impl Default for LlmParams {
    fn default() -> Self {
        Self {
            max_tokens: 1000,
            temperature: 0.0,
            top_p: 1.0,
            frequency_penalty: 0.0,
            presence_penalty: 0.0,
        }
    }
}

impl LlmParams {
    /// Validate caller-supplied overrides and merge them over the defaults.
    ///
    /// Keys present in `overrides` win; every absent key keeps its default.
    /// A `BTreeMap` input keeps the rejected-key listing sorted and therefore
    /// deterministic across runs.
    ///
    /// # Errors
    /// [`CompletionError::InvalidParams`] naming all keys outside
    /// [`ALLOWED_PARAM_KEYS`].
    pub fn validate(overrides: &BTreeMap<String, f64>) -> Result<Self, CompletionError> {
        let invalid: Vec<&str> = overrides
            .keys()
            .map(String::as_str)
            .filter(|k| !ALLOWED_PARAM_KEYS.contains(k))
            .collect();
        if !invalid.is_empty() {
            return Err(CompletionError::InvalidParams {
                keys: invalid.join(", "),
            });
        }

        let mut params = Self::default();
        for (key, &value) in overrides {
            match key.as_str() {
                "max_tokens" => params.max_tokens = value as u32,
                "temperature" => params.temperature = value as f32,
                "top_p" => params.top_p = value as f32,
                "frequency_penalty" => params.frequency_penalty = value as f32,
                "presence_penalty" => params.presence_penalty = value as f32,
                _ => unreachable!("key membership checked above"),
            }
        }
        Ok(params)
    }
}
