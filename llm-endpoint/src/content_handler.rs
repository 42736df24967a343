//! Payload translation between a prompt and the endpoint's JSON wire format.
//!
//! Outgoing: `{"inputs": "<prompt>", "parameters": {...}}`.
//! Incoming: `[{"generated_text": "<prompt echo + continuation>"}]`.
//!
//! Instruct endpoints usually echo the prompt in front of the continuation, so
//! the answer is recovered by an [`AnswerExtractor`]. The default strategy cuts
//! at a delimiter that the prompt template ends with; the template and the
//! delimiter must stay in sync.

use serde::Serialize;
use serde_json::Value;

use crate::config::generation_params::GenerationParams;
use crate::error_handler::{FormatError, Result};

/// `Content-Type` of the request body.
pub const CONTENT_TYPE: &str = "application/json";
/// `Accept` header sent with the request.
pub const ACCEPTS: &str = "application/json";

/// Strategy that turns raw model output into the answer shown to the user.
///
/// `prompt` is the exact text that was sent, so implementations can tell the
/// echoed prompt apart from the continuation.
pub trait AnswerExtractor: Send + Sync {
    /// # Errors
    /// A [`FormatError`] when the raw text does not have the expected structure.
    fn extract_answer(&self, prompt: &str, raw_text: &str)
    -> std::result::Result<String, FormatError>;
}

/// Recovers the continuation of a prompt that ends with a delimiter.
///
/// When the output starts with the sent prompt, exactly that prefix is
/// removed. Otherwise the text after the **last** delimiter is returned, since
/// the template ends with it and anything earlier may be document or question
/// text. The result is whitespace-trimmed.
///
/// # Example
/// ```
/// use llm_endpoint::{AnswerExtractor, DelimiterExtractor};
///
/// let ex = DelimiterExtractor::new("Solution:");
/// let prompt = "Doc: Solution: reboot.\nSolution:";
/// assert_eq!(ex.extract_answer(prompt, "Doc: Solution: reboot.\nSolution: 42\n").unwrap(), "42");
/// assert_eq!(ex.extract_answer(prompt, "...Solution: 42").unwrap(), "42");
/// assert!(ex.extract_answer(prompt, "no marker here").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DelimiterExtractor {
    delimiter: String,
}

impl DelimiterExtractor {
    pub fn new(delimiter: impl Into<String>) -> Self {
        Self {
            delimiter: delimiter.into(),
        }
    }

    pub fn delimiter(&self) -> &str {
        &self.delimiter
    }
}

impl AnswerExtractor for DelimiterExtractor {
    fn extract_answer(
        &self,
        prompt: &str,
        raw_text: &str,
    ) -> std::result::Result<String, FormatError> {
        let sent = prompt.trim_end();
        if !sent.is_empty() {
            if let Some(continuation) = raw_text.strip_prefix(sent) {
                return Ok(continuation.trim().to_string());
            }
        }

        raw_text
            .rfind(&self.delimiter)
            .map(|at| raw_text[at + self.delimiter.len()..].trim().to_string())
            .ok_or_else(|| FormatError::MissingDelimiter {
                delimiter: self.delimiter.clone(),
            })
    }
}

/// Passes the generated text through untouched.
///
/// For backends that return only the continuation (no prompt echo).
#[derive(Debug, Clone, Copy, Default)]
pub struct FullTextExtractor;

impl AnswerExtractor for FullTextExtractor {
    fn extract_answer(
        &self,
        _prompt: &str,
        raw_text: &str,
    ) -> std::result::Result<String, FormatError> {
        Ok(raw_text.to_string())
    }
}

/// Request body.
#[derive(Debug, Serialize)]
struct InvocationRequest<'a> {
    inputs: &'a str,
    parameters: &'a GenerationParams,
}

/// Stateless JSON content handler.
#[derive(Debug, Clone, Copy, Default)]
pub struct ContentHandler;

impl ContentHandler {
    /// Serializes `prompt` and `params` into the request body.
    ///
    /// # Errors
    /// [`crate::EndpointError::Encode`] if serialization fails.
    pub fn encode(prompt: &str, params: &GenerationParams) -> Result<Vec<u8>> {
        let body = InvocationRequest {
            inputs: prompt,
            parameters: params,
        };
        Ok(serde_json::to_vec(&body)?)
    }

    /// Extracts `[0].generated_text` from a raw response body.
    ///
    /// # Errors
    /// [`FormatError`] variants for invalid JSON, a non-array body, an empty
    /// array or a missing `generated_text` string.
    pub fn generated_text(raw: &[u8]) -> std::result::Result<String, FormatError> {
        let value: Value =
            serde_json::from_slice(raw).map_err(|e| FormatError::InvalidJson(e.to_string()))?;
        let generations = value
            .as_array()
            .ok_or(FormatError::UnexpectedShape("expected a JSON array of generations"))?;
        let first = generations.first().ok_or(FormatError::EmptyResponse)?;
        first
            .get("generated_text")
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or(FormatError::MissingGeneratedText)
    }

    /// Decodes the response to `prompt` into the answer using `extractor`.
    ///
    /// # Errors
    /// Any [`FormatError`] from [`ContentHandler::generated_text`] or the extractor.
    pub fn decode(
        prompt: &str,
        raw: &[u8],
        extractor: &dyn AnswerExtractor,
    ) -> std::result::Result<String, FormatError> {
        let text = Self::generated_text(raw)?;
        extractor.extract_answer(prompt, &text)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn encode_produces_inputs_and_parameters() {
        let body = ContentHandler::encode("What is Kendra?", &GenerationParams::default()).unwrap();
        let v: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(v["inputs"], "What is Kendra?");
        assert_eq!(v["parameters"]["top_p"].as_f64().unwrap() as f32, 0.9);
        assert_eq!(v["parameters"]["repetition_penalty"], 10.0);
        assert_eq!(v["parameters"]["stop"].as_array().unwrap().len(), 3);
    }

    #[test]
    fn decode_strips_everything_up_to_the_delimiter() {
        let raw = br#"[{"generated_text": "...Solution: 42"}]"#;
        let answer =
            ContentHandler::decode("", raw, &DelimiterExtractor::new("Solution:")).unwrap();
        assert_eq!(answer, "42");
    }

    #[test]
    fn echoed_prompt_is_removed_exactly() {
        let prompt = "Doc: Troubleshooting. Solution: restart the indexer.\nSolution:\n";
        let raw = serde_json::to_vec(&json!([{ "generated_text": format!("{prompt} Restart it.") }]))
            .unwrap();
        let answer =
            ContentHandler::decode(prompt, &raw, &DelimiterExtractor::new("Solution:")).unwrap();
        assert_eq!(answer, "Restart it.");
    }

    #[test]
    fn continuation_may_mention_the_delimiter() {
        let prompt = "Question?\nSolution:";
        let raw = br#"[{"generated_text": "Question?\nSolution: Use Solution: B "}]"#;
        let answer =
            ContentHandler::decode(prompt, raw, &DelimiterExtractor::new("Solution:")).unwrap();
        assert_eq!(answer, "Use Solution: B");
    }

    #[test]
    fn without_echo_the_last_delimiter_wins() {
        let raw = br#"[{"generated_text": "Doc says Solution: reboot\nSolution: Restart it."}]"#;
        let answer =
            ContentHandler::decode("other prompt", raw, &DelimiterExtractor::new("Solution:"))
                .unwrap();
        assert_eq!(answer, "Restart it.");
    }

    #[test]
    fn missing_delimiter_is_a_format_error() {
        let raw = br#"[{"generated_text": "no marker"}]"#;
        let err = ContentHandler::decode("prompt", raw, &DelimiterExtractor::new("Solution:"))
            .unwrap_err();
        assert_eq!(
            err,
            FormatError::MissingDelimiter {
                delimiter: "Solution:".into()
            }
        );
    }

    #[test]
    fn malformed_payloads_are_classified() {
        let ex = FullTextExtractor;
        assert!(matches!(
            ContentHandler::decode("p", b"not json", &ex),
            Err(FormatError::InvalidJson(_))
        ));
        assert!(matches!(
            ContentHandler::decode("p", br#"{"generated_text": "x"}"#, &ex),
            Err(FormatError::UnexpectedShape(_))
        ));
        assert_eq!(
            ContentHandler::decode("p", b"[]", &ex),
            Err(FormatError::EmptyResponse)
        );
        assert_eq!(
            ContentHandler::decode("p", br#"[{"text": "x"}]"#, &ex),
            Err(FormatError::MissingGeneratedText)
        );
    }

    #[test]
    fn echo_round_trip_preserves_prompt() {
        let body = ContentHandler::encode("hello", &GenerationParams::default()).unwrap();

        // What an echo backend would answer.
        let sent: Value = serde_json::from_slice(&body).unwrap();
        let echoed = serde_json::to_vec(&json!([{ "generated_text": sent["inputs"] }])).unwrap();

        assert_eq!(
            ContentHandler::decode("hello", &echoed, &FullTextExtractor).unwrap(),
            "hello"
        );
    }
}
