//! Prompt composer: fixed templates filled with document context, question
//! and chat history.
//!
//! Every template ends with the marker the model continues from, and carries
//! that marker as its answer delimiter. Endpoints echo the prompt in front of
//! the continuation, so the answer is whatever follows the marker.

use llm_endpoint::DelimiterExtractor;

use crate::api_types::RetrievedDocument;
use crate::session::ConversationHistory;

/// A fixed template plus the delimiter its answers are cut at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PromptTemplate {
    template: &'static str,
    delimiter: &'static str,
}

impl PromptTemplate {
    /// Question answering over retrieved documents.
    pub const QA: PromptTemplate = PromptTemplate {
        template: r#"
The following is a friendly conversation between a human and an AI.
The AI is talkative and provides lots of specific details from its context.
If the AI does not know the answer to a question, it truthfully says it does not know.
{context}
Instruction: Based on the above documents, provide a detailed answer for, {question}.
Answer "I don't know" if no documents are provided
Solution:
"#,
        delimiter: "Solution:",
    };

    /// Rewrites a follow-up into a standalone question.
    pub const CONDENSE: PromptTemplate = PromptTemplate {
        template: r#"Given the following conversation and a follow up question, rephrase the follow up question to be a standalone question.

Chat History:
{chat_history}
Follow Up Input: {question}
Standalone question:"#,
        delimiter: "Standalone question:",
    };

    pub fn template(&self) -> &'static str {
        self.template
    }

    pub fn delimiter(&self) -> &'static str {
        self.delimiter
    }

    /// Extractor matching this template's delimiter.
    pub fn extractor(&self) -> DelimiterExtractor {
        DelimiterExtractor::new(self.delimiter)
    }

    /// Substitutes `{name}` placeholders in a single pass.
    ///
    /// Values are inserted verbatim and never re-scanned, so a document that
    /// happens to contain `{question}` stays as is. Unknown placeholders are
    /// left untouched.
    pub fn render(&self, vars: &[(&str, &str)]) -> String {
        let extra: usize = vars.iter().map(|(_, v)| v.len()).sum();
        let mut out = String::with_capacity(self.template.len() + extra);
        let mut rest = self.template;

        while let Some(open) = rest.find('{') {
            out.push_str(&rest[..open]);
            let after = &rest[open + 1..];
            let value = after.find('}').and_then(|close| {
                let name = &after[..close];
                vars.iter()
                    .find(|(k, _)| *k == name)
                    .map(|(_, v)| (*v, close))
            });
            match value {
                Some((v, close)) => {
                    out.push_str(v);
                    rest = &after[close + 1..];
                }
                None => {
                    out.push('{');
                    rest = after;
                }
            }
        }
        out.push_str(rest);
        out
    }
}

/// Builds the QA prompt for `question` over `docs`.
///
/// With no documents the context is empty and the template still tells the
/// model to answer "I don't know".
///
/// # Example
/// ```
/// use chat_chain::prompt::compose_qa_prompt;
/// let prompt = compose_qa_prompt("What is X?", &[], 2000);
/// assert!(prompt.contains("What is X?"));
/// assert!(prompt.contains(r#"Answer "I don't know" if no documents are provided"#));
/// ```
pub fn compose_qa_prompt(question: &str, docs: &[RetrievedDocument], max_ctx_chars: usize) -> String {
    let context = build_context(docs, max_ctx_chars);
    PromptTemplate::QA.render(&[("context", &context), ("question", question.trim())])
}

/// Builds the condense prompt that turns a follow-up into a standalone question.
pub fn compose_condense_prompt(history: &ConversationHistory, question: &str) -> String {
    let chat_history = format_chat_history(history);
    PromptTemplate::CONDENSE.render(&[
        ("chat_history", &chat_history),
        ("question", question.trim()),
    ])
}

/// Renders turns as `\nHuman: q\nAssistant: a`, oldest first.
pub fn format_chat_history(history: &ConversationHistory) -> String {
    let mut out = String::new();
    for turn in history.iter() {
        out.push_str("\nHuman: ");
        out.push_str(turn.question());
        out.push_str("\nAssistant: ");
        out.push_str(turn.answer());
    }
    out
}

/// Joins document contents with a blank line within a character budget,
/// preserving retrieval order.
///
/// Whole documents are added while they fit. If even the first one does not
/// fit it is cut at the budget; later documents that do not fit are dropped.
pub fn build_context(docs: &[RetrievedDocument], max_chars: usize) -> String {
    fit_context(docs, max_chars).0
}

/// How many leading documents of `docs` end up in the context built by
/// [`build_context`] with the same budget.
pub fn documents_in_context(docs: &[RetrievedDocument], max_chars: usize) -> usize {
    fit_context(docs, max_chars).1
}

fn fit_context(docs: &[RetrievedDocument], max_chars: usize) -> (String, usize) {
    let mut out = String::new();
    let mut used = 0;

    for (i, doc) in docs.iter().enumerate() {
        let text = doc.page_content.trim();
        let sep = if i == 0 { "" } else { "\n\n" };
        let needed = sep.len() + text.len();

        if out.len() + needed <= max_chars {
            out.push_str(sep);
            out.push_str(text);
            used += 1;
        } else {
            if out.is_empty() {
                out.push_str(safe_truncate(text, max_chars));
                used = 1;
            }
            break;
        }
    }

    (out, used)
}

fn safe_truncate(s: &str, max: usize) -> &str {
    if s.len() <= max {
        s
    } else {
        let mut end = max;
        while end > 0 && !s.is_char_boundary(end) {
            end -= 1;
        }
        &s[..end]
    }
}
