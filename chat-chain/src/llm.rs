//! Seam between the chain and the text-generation endpoint.

use std::future::Future;
use std::pin::Pin;

use llm_endpoint::{AnswerExtractor, EndpointError, EndpointService};

/// Boxed future returned by [`TextGenerator::generate`].
pub type GenerateFuture<'a> = Pin<Box<dyn Future<Output = Result<String, EndpointError>> + Send + 'a>>;

/// Anything that turns a prompt into an answer.
///
/// The extractor travels with the call because each prompt template has its
/// own answer delimiter.
pub trait TextGenerator: Send + Sync {
    fn generate<'a>(
        &'a self,
        prompt: &'a str,
        extractor: &'a dyn AnswerExtractor,
    ) -> GenerateFuture<'a>;
}

impl TextGenerator for EndpointService {
    fn generate<'a>(
        &'a self,
        prompt: &'a str,
        extractor: &'a dyn AnswerExtractor,
    ) -> GenerateFuture<'a> {
        Box::pin(self.invoke(prompt, extractor))
    }
}
