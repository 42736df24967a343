//! Conversational retrieval chain.
//!
//! Public API: [`ConversationalChain::run`]. For one user question it
//! optionally rewrites the question into a standalone one using the chat
//! history, retrieves documents from the index, composes the QA prompt, calls
//! the text-generation endpoint and returns the answer together with the
//! documents it was grounded on.

mod api_types;
mod cfg;
mod error;
mod llm;
mod progress;
pub mod prompt;
mod retrieve;
mod session;

pub use api_types::{ChainAnswer, ChainOptions, RetrievedDocument};
pub use cfg::ChainConfig;
pub use error::ChainError;
pub use llm::{GenerateFuture, TextGenerator};
pub use progress::{IndicatifProgress, NoopProgress, Progress, Stage};
pub use retrieve::{KendraRetriever, RetrieveFuture, Retriever};
pub use session::{
    ConversationHistory, ConversationTurn, DEFAULT_MAX_HISTORY, RESET_PREFIX, TurnInput,
    parse_reset_command,
};

use llm_endpoint::EndpointService;
use prompt::{PromptTemplate, compose_condense_prompt, compose_qa_prompt, documents_in_context};
use tracing::{debug, info, instrument};

/// Retriever + generator + knobs. Holds no conversation state; the caller
/// owns the [`ConversationHistory`] and passes it to every run.
pub struct ConversationalChain {
    generator: Box<dyn TextGenerator>,
    retriever: Box<dyn Retriever>,
    opts: ChainOptions,
}

impl ConversationalChain {
    pub fn new(
        generator: Box<dyn TextGenerator>,
        retriever: Box<dyn Retriever>,
        opts: ChainOptions,
    ) -> Self {
        Self {
            generator,
            retriever,
            opts,
        }
    }

    /// Answers `question` in the context of `history`.
    ///
    /// `history` is read, never modified: appending the finished turn is up
    /// to the caller, so a failed run leaves the conversation untouched.
    ///
    /// # Errors
    /// `ChainError::Endpoint` when generation fails (including an answer
    /// without the expected delimiter), retrieval errors otherwise.
    ///
    /// # Example
    /// ```no_run
    /// # use chat_chain::{ChainConfig, ConversationHistory, NoopProgress, build_chain};
    /// # use llm_endpoint::{EndpointService, ProcessEnv, config_falcon};
    /// # #[tokio::main] async fn main() {
    /// let cfg = ChainConfig::new("us-east-1", "my-index");
    /// let endpoint_cfg = config_falcon(&ProcessEnv, "us-east-1", "falcon-40b").unwrap();
    /// let endpoint = EndpointService::new(endpoint_cfg).unwrap();
    /// let chain = build_chain(&cfg, endpoint).unwrap();
    /// let history = ConversationHistory::default();
    /// let out = chain.run("What is Kendra?", &history, &NoopProgress).await.unwrap();
    /// println!("{}", out.answer);
    /// # }
    /// ```
    #[instrument(skip_all, fields(history = history.len()))]
    pub async fn run(
        &self,
        question: &str,
        history: &ConversationHistory,
        progress: &dyn Progress,
    ) -> Result<ChainAnswer, ChainError> {
        let question = question.trim();

        let standalone = if self.opts.condense_question && !history.is_empty() {
            progress.enter(Stage::Rephrasing);
            self.condense(question, history).await?
        } else {
            question.to_string()
        };

        progress.enter(Stage::Searching);
        let mut docs = self.retriever.retrieve(&standalone).await?;
        let retrieved = docs.len();
        // Only documents that made it into the prompt are reported as sources.
        docs.truncate(documents_in_context(&docs, self.opts.max_ctx_chars));
        debug!(retrieved, used = docs.len(), "retrieved documents");

        progress.enter(Stage::Generating);
        let prompt = compose_qa_prompt(&standalone, &docs, self.opts.max_ctx_chars);
        let extractor = PromptTemplate::QA.extractor();
        let answer = self.generator.generate(&prompt, &extractor).await?;
        info!(chars = answer.len(), "answer generated");

        Ok(ChainAnswer {
            question: standalone,
            answer,
            source_documents: docs,
        })
    }

    async fn condense(
        &self,
        question: &str,
        history: &ConversationHistory,
    ) -> Result<String, ChainError> {
        let prompt = compose_condense_prompt(history, question);
        let extractor = PromptTemplate::CONDENSE.extractor();
        let rewritten = self.generator.generate(&prompt, &extractor).await?;

        // Keep the original when the model gives nothing usable back.
        let rewritten = rewritten.lines().next().unwrap_or_default().trim();
        if rewritten.is_empty() {
            debug!("empty standalone question, using input as is");
            Ok(question.to_string())
        } else {
            debug!(standalone = %rewritten, "question condensed");
            Ok(rewritten.to_string())
        }
    }
}

/// Wires the production chain: index retriever plus the given endpoint.
///
/// # Errors
/// `ChainError::Http` if the retriever's HTTP client cannot be built.
pub fn build_chain(
    cfg: &ChainConfig,
    endpoint: EndpointService,
) -> Result<ConversationalChain, ChainError> {
    let retriever = KendraRetriever::new(cfg)?;
    Ok(ConversationalChain::new(
        Box::new(endpoint),
        Box::new(retriever),
        cfg.options(),
    ))
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use llm_endpoint::{AnswerExtractor, EndpointError, FormatError};

    use super::*;

    /// Echoes the prompt and appends a canned continuation, like the real
    /// endpoint does, and records every prompt it sees.
    struct EchoGenerator {
        standalone: String,
        answer: String,
        prompts: Mutex<Vec<String>>,
    }

    impl EchoGenerator {
        fn new(standalone: &str, answer: &str) -> Self {
            Self {
                standalone: standalone.into(),
                answer: answer.into(),
                prompts: Mutex::new(Vec::new()),
            }
        }
    }

    impl TextGenerator for EchoGenerator {
        fn generate<'a>(
            &'a self,
            prompt: &'a str,
            extractor: &'a dyn AnswerExtractor,
        ) -> GenerateFuture<'a> {
            self.prompts.lock().unwrap().push(prompt.to_string());
            let tail = if prompt.contains("Standalone question:") {
                &self.standalone
            } else {
                &self.answer
            };
            let raw = format!("{prompt} {tail}");
            Box::pin(async move {
                extractor
                    .extract_answer(prompt, &raw)
                    .map_err(EndpointError::from)
            })
        }
    }

    /// Generator whose output never contains the delimiter.
    struct RawGenerator;

    impl TextGenerator for RawGenerator {
        fn generate<'a>(
            &'a self,
            prompt: &'a str,
            extractor: &'a dyn AnswerExtractor,
        ) -> GenerateFuture<'a> {
            Box::pin(async move {
                extractor
                    .extract_answer(prompt, "no marker here")
                    .map_err(EndpointError::from)
            })
        }
    }

    struct StaticRetriever {
        docs: Vec<RetrievedDocument>,
        queries: Mutex<Vec<String>>,
    }

    impl StaticRetriever {
        fn new(docs: Vec<RetrievedDocument>) -> Self {
            Self {
                docs,
                queries: Mutex::new(Vec::new()),
            }
        }
    }

    impl Retriever for StaticRetriever {
        fn retrieve<'a>(&'a self, query: &'a str) -> RetrieveFuture<'a> {
            self.queries.lock().unwrap().push(query.to_string());
            let docs = self.docs.clone();
            Box::pin(async move { Ok::<_, ChainError>(docs) })
        }
    }

    /// Lets a test keep a handle on the stubs after boxing them into the chain.
    struct Shared<T>(std::sync::Arc<T>);

    impl<T: TextGenerator> TextGenerator for Shared<T> {
        fn generate<'a>(
            &'a self,
            prompt: &'a str,
            extractor: &'a dyn AnswerExtractor,
        ) -> GenerateFuture<'a> {
            self.0.generate(prompt, extractor)
        }
    }

    impl<T: Retriever> Retriever for Shared<T> {
        fn retrieve<'a>(&'a self, query: &'a str) -> RetrieveFuture<'a> {
            self.0.retrieve(query)
        }
    }

    fn kendra_doc() -> RetrievedDocument {
        RetrievedDocument::new(
            "Document Title: Kendra\nDocument Excerpt: \nKendra is a search service.\n",
            "https://example.com/kendra",
        )
    }

    fn chain(
        generator: &std::sync::Arc<EchoGenerator>,
        retriever: &std::sync::Arc<StaticRetriever>,
        opts: ChainOptions,
    ) -> ConversationalChain {
        ConversationalChain::new(
            Box::new(Shared(generator.clone())),
            Box::new(Shared(retriever.clone())),
            opts,
        )
    }

    #[tokio::test]
    async fn first_question_skips_condensing() {
        let generator = std::sync::Arc::new(EchoGenerator::new("unused", "It searches."));
        let retriever = std::sync::Arc::new(StaticRetriever::new(vec![kendra_doc()]));
        let chain = chain(&generator, &retriever, ChainOptions::default());

        let out = chain
            .run("What is Kendra?", &ConversationHistory::default(), &NoopProgress)
            .await
            .unwrap();

        assert_eq!(out.answer, "It searches.");
        assert_eq!(out.question, "What is Kendra?");
        assert_eq!(out.sources().collect::<Vec<_>>(), ["https://example.com/kendra"]);

        let prompts = generator.prompts.lock().unwrap();
        assert_eq!(prompts.len(), 1);
        assert!(prompts[0].contains("Kendra is a search service."));
        assert!(prompts[0].contains("provide a detailed answer for, What is Kendra?."));
        assert_eq!(*retriever.queries.lock().unwrap(), ["What is Kendra?"]);
    }

    #[tokio::test]
    async fn follow_up_is_condensed_before_retrieval() {
        let generator = std::sync::Arc::new(EchoGenerator::new(
            "Is Kendra a managed service?\nextra line",
            "Yes.",
        ));
        let retriever = std::sync::Arc::new(StaticRetriever::new(vec![kendra_doc()]));
        let chain = chain(&generator, &retriever, ChainOptions::default());

        let mut history = ConversationHistory::default();
        history.append("What is Kendra?", "A search service.");

        let out = chain.run("Is it managed?", &history, &NoopProgress).await.unwrap();

        assert_eq!(out.question, "Is Kendra a managed service?");
        assert_eq!(out.answer, "Yes.");
        assert_eq!(
            *retriever.queries.lock().unwrap(),
            ["Is Kendra a managed service?"]
        );

        let prompts = generator.prompts.lock().unwrap();
        assert_eq!(prompts.len(), 2);
        assert!(prompts[0].contains("Human: What is Kendra?\nAssistant: A search service."));
        assert!(prompts[0].contains("Follow Up Input: Is it managed?"));
        assert!(prompts[1].contains("provide a detailed answer for, Is Kendra a managed service?."));
        assert_eq!(history.len(), 1);
    }

    #[tokio::test]
    async fn empty_rewrite_falls_back_to_input() {
        let generator = std::sync::Arc::new(EchoGenerator::new("   ", "ok"));
        let retriever = std::sync::Arc::new(StaticRetriever::new(vec![]));
        let chain = chain(&generator, &retriever, ChainOptions::default());

        let mut history = ConversationHistory::default();
        history.append("q", "a");

        let out = chain.run("and then?", &history, &NoopProgress).await.unwrap();
        assert_eq!(out.question, "and then?");
        assert!(out.source_documents.is_empty());
    }

    #[tokio::test]
    async fn condensing_can_be_disabled() {
        let generator = std::sync::Arc::new(EchoGenerator::new("unused", "ok"));
        let retriever = std::sync::Arc::new(StaticRetriever::new(vec![]));
        let opts = ChainOptions {
            condense_question: false,
            ..ChainOptions::default()
        };
        let chain = chain(&generator, &retriever, opts);

        let mut history = ConversationHistory::default();
        history.append("q", "a");

        chain.run("follow up", &history, &NoopProgress).await.unwrap();
        assert_eq!(generator.prompts.lock().unwrap().len(), 1);
        assert_eq!(*retriever.queries.lock().unwrap(), ["follow up"]);
    }

    #[tokio::test]
    async fn missing_delimiter_surfaces_as_endpoint_error() {
        let chain = ConversationalChain::new(
            Box::new(RawGenerator),
            Box::new(StaticRetriever::new(vec![kendra_doc()])),
            ChainOptions::default(),
        );

        let err = chain
            .run("What is Kendra?", &ConversationHistory::default(), &NoopProgress)
            .await
            .unwrap_err();

        match err {
            ChainError::Endpoint(EndpointError::Format(FormatError::MissingDelimiter {
                delimiter,
            })) => assert_eq!(delimiter, "Solution:"),
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[tokio::test]
    async fn delimiter_in_document_or_question_stays_out_of_the_answer() {
        let generator = std::sync::Arc::new(EchoGenerator::new("unused", "Restart it."));
        let retriever = std::sync::Arc::new(StaticRetriever::new(vec![RetrievedDocument::new(
            "Troubleshooting. Solution: restart the indexer.",
            "runbook",
        )]));
        let chain = chain(&generator, &retriever, ChainOptions::default());
        let empty = ConversationHistory::default();

        let out = chain.run("How do I fix it?", &empty, &NoopProgress).await.unwrap();
        assert_eq!(out.answer, "Restart it.");

        let out = chain
            .run("what does Solution: mean here?", &empty, &NoopProgress)
            .await
            .unwrap();
        assert_eq!(out.answer, "Restart it.");
    }

    #[tokio::test]
    async fn sources_only_list_documents_in_the_prompt() {
        let generator = std::sync::Arc::new(EchoGenerator::new("unused", "ok"));
        let retriever = std::sync::Arc::new(StaticRetriever::new(vec![
            RetrievedDocument::new("u".repeat(50), "used-doc"),
            RetrievedDocument::new("d".repeat(50), "dropped-doc"),
        ]));
        let opts = ChainOptions {
            max_ctx_chars: 60,
            ..ChainOptions::default()
        };
        let chain = chain(&generator, &retriever, opts);

        let out = chain
            .run("q", &ConversationHistory::default(), &NoopProgress)
            .await
            .unwrap();

        assert_eq!(out.sources().collect::<Vec<_>>(), ["used-doc"]);
        let prompts = generator.prompts.lock().unwrap();
        assert!(!prompts[0].contains(&"d".repeat(50)));
    }

    #[derive(Default)]
    struct StageLog(Mutex<Vec<Stage>>);

    impl Progress for StageLog {
        fn enter(&self, stage: Stage) {
            self.0.lock().unwrap().push(stage);
        }
    }

    #[tokio::test]
    async fn stages_are_reported_in_order() {
        let generator = std::sync::Arc::new(EchoGenerator::new("standalone", "ok"));
        let retriever = std::sync::Arc::new(StaticRetriever::new(vec![kendra_doc()]));
        let chain = chain(&generator, &retriever, ChainOptions::default());

        let log = StageLog::default();
        chain
            .run("first", &ConversationHistory::default(), &log)
            .await
            .unwrap();
        assert_eq!(*log.0.lock().unwrap(), [Stage::Searching, Stage::Generating]);

        let log = StageLog::default();
        let mut history = ConversationHistory::default();
        history.append("q", "a");
        chain.run("again", &history, &log).await.unwrap();
        assert_eq!(
            *log.0.lock().unwrap(),
            [Stage::Rephrasing, Stage::Searching, Stage::Generating]
        );
    }
}
