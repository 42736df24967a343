//! Named generation parameters sent in the `parameters` object of every request.

use serde::{Deserialize, Serialize};

use crate::error_handler::{Result, validate_range_f32, validate_stop_sequences};

/// Sampling/decoding knobs understood by text-generation-inference style servers.
///
/// Serializes to exactly the keys the endpoint expects:
/// `do_sample`, `top_p`, `temperature`, `max_new_tokens`,
/// `repetition_penalty`, `stop`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationParams {
    pub do_sample: bool,
    pub top_p: f32,
    pub temperature: f32,
    pub max_new_tokens: u32,
    pub repetition_penalty: f32,
    pub stop: Vec<String>,
}

impl Default for GenerationParams {
    fn default() -> Self {
        Self {
            do_sample: true,
            top_p: 0.9,
            temperature: 0.1,
            max_new_tokens: 400,
            repetition_penalty: 10.0,
            stop: vec![
                "\nInstruction:".to_string(),
                "<|endoftext|>".to_string(),
                "</s>".to_string(),
            ],
        }
    }
}

impl GenerationParams {
    /// Checks ranges before the params are ever sent.
    ///
    /// # Errors
    /// [`crate::ConfigError::OutOfRange`] for `temperature` outside `0..=2`,
    /// `top_p` outside `0..=1` or a non-positive `repetition_penalty`;
    /// [`crate::ConfigError::InvalidStopSequence`] for empty stop strings.
    pub fn validate(&self) -> Result<()> {
        validate_range_f32("temperature", self.temperature, 0.0, 2.0)?;
        validate_range_f32("top_p", self.top_p, 0.0, 1.0)?;
        validate_range_f32("repetition_penalty", self.repetition_penalty, 0.0, 100.0)?;
        validate_stop_sequences(&self.stop)
    }
}
