//! Public API types re-used by external crates (e.g., the CLI layer).

/// A document snippet returned by a [`crate::Retriever`].
///
/// `page_content` is what goes into the prompt; `source` is what gets cited.
///
/// # Example
/// ```
/// use chat_chain::RetrievedDocument;
/// let d = RetrievedDocument::new("Kendra is an enterprise search service.", "https://docs/kendra");
/// assert_eq!(d.source, "https://docs/kendra");
/// assert!(d.title.is_none());
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct RetrievedDocument {
    pub page_content: String,
    pub source: String,
    pub title: Option<String>,
    pub excerpt: Option<String>,
    /// Result type reported by the index (e.g. `ANSWER`, `DOCUMENT`).
    pub kind: Option<String>,
}

impl RetrievedDocument {
    pub fn new(page_content: impl Into<String>, source: impl Into<String>) -> Self {
        Self {
            page_content: page_content.into(),
            source: source.into(),
            title: None,
            excerpt: None,
            kind: None,
        }
    }
}

/// Final answer together with the documents that were fed to the model.
///
/// `question` is the effective question used for retrieval: the user's input,
/// or its standalone rewrite when history was taken into account.
///
/// # Example
/// ```
/// use chat_chain::{ChainAnswer, RetrievedDocument};
/// let a = ChainAnswer {
///     question: "what is kendra?".into(),
///     answer: "A search service.".into(),
///     source_documents: vec![RetrievedDocument::new("...", "doc-1")],
/// };
/// assert_eq!(a.sources().collect::<Vec<_>>(), vec!["doc-1"]);
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct ChainAnswer {
    pub question: String,
    pub answer: String,
    pub source_documents: Vec<RetrievedDocument>,
}

impl ChainAnswer {
    /// Source identifiers of the documents used, in retrieval order.
    pub fn sources(&self) -> impl Iterator<Item = &str> {
        self.source_documents.iter().map(|d| d.source.as_str())
    }
}

/// Knobs for a single chain run.
///
/// # Example
/// ```
/// use chat_chain::ChainOptions;
/// let opts = ChainOptions::default();
/// assert!(opts.condense_question);
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct ChainOptions {
    /// Character budget for the document context in the QA prompt.
    pub max_ctx_chars: usize,
    /// Rewrite follow-ups into standalone questions when history exists.
    pub condense_question: bool,
}

impl Default for ChainOptions {
    fn default() -> Self {
        Self {
            max_ctx_chars: 8_000,
            condense_question: true,
        }
    }
}
