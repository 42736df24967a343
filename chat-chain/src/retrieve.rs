//! Retrieval: fetch documents relevant to a query from the search index.
//!
//! The chain only depends on the [`Retriever`] trait. [`KendraRetriever`] is the
//! production implementation; it calls the index `Query` API over HTTPS JSON
//! and maps the top result items to [`RetrievedDocument`]s.

use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use llm_endpoint::error_handler::make_snippet;
use reqwest::{Client, header};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, instrument};

use crate::api_types::RetrievedDocument;
use crate::cfg::ChainConfig;
use crate::error::ChainError;

/// Boxed future returned by [`Retriever::retrieve`].
pub type RetrieveFuture<'a> =
    Pin<Box<dyn Future<Output = Result<Vec<RetrievedDocument>, ChainError>> + Send + 'a>>;

/// Source of ranked documents for a text query.
///
/// Implement this trait to plug in another index (or a fixed list in tests).
pub trait Retriever: Send + Sync {
    fn retrieve<'a>(&'a self, query: &'a str) -> RetrieveFuture<'a>;
}

const AMZ_JSON: &str = "application/x-amz-json-1.1";
const QUERY_TARGET: &str = "AWSKendraFrontendService.Query";

/// Retriever backed by a Kendra index.
#[derive(Debug)]
pub struct KendraRetriever {
    http: Client,
    url: String,
    index_id: String,
    top_k: usize,
}

impl KendraRetriever {
    /// Construct a retriever from the chain config.
    ///
    /// # Errors
    /// `ChainError::Http` if the HTTP client cannot be built.
    pub fn new(cfg: &ChainConfig) -> Result<Self, ChainError> {
        let http = Client::builder()
            .timeout(Duration::from_secs(cfg.retrieval_timeout_secs))
            .build()?;
        Ok(Self {
            http,
            url: cfg.kendra_query_url(),
            index_id: cfg.kendra_index_id.clone(),
            top_k: cfg.top_k,
        })
    }

    /// Run a query and return at most `top_k` documents, in index order.
    ///
    /// # Errors
    /// `ChainError::RetrievalStatus` for non-2xx responses, `ChainError::Http`
    /// on transport errors or an undecodable body.
    #[instrument(skip_all, fields(index = %self.index_id, top_k = self.top_k))]
    pub async fn query(&self, text: &str) -> Result<Vec<RetrievedDocument>, ChainError> {
        let body = QueryRequest {
            index_id: &self.index_id,
            query_text: text.trim(),
        };

        debug!("POST {}", self.url);
        let resp = self
            .http
            .post(&self.url)
            .header(header::CONTENT_TYPE, AMZ_JSON)
            .header("X-Amz-Target", QUERY_TARGET)
            .body(serde_json::to_vec(&body)?)
            .send()
            .await?;

        if !resp.status().is_success() {
            let status = resp.status();
            let snippet = make_snippet(&resp.text().await.unwrap_or_default());
            error!(%status, url = %self.url, %snippet, "index query returned non-success status");
            return Err(ChainError::RetrievalStatus {
                status,
                url: self.url.clone(),
                snippet,
            });
        }

        let out: QueryResponse = resp.json().await?;
        let docs: Vec<RetrievedDocument> = out
            .result_items
            .into_iter()
            .take(self.top_k)
            .map(to_document)
            .collect();

        debug!(returned = docs.len(), "index query completed");
        Ok(docs)
    }
}

impl Retriever for KendraRetriever {
    fn retrieve<'a>(&'a self, query: &'a str) -> RetrieveFuture<'a> {
        Box::pin(self.query(query))
    }
}

/* ==========================
HTTP payloads
========================== */

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
struct QueryRequest<'a> {
    index_id: &'a str,
    query_text: &'a str,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct QueryResponse {
    #[serde(default)]
    result_items: Vec<ResultItem>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ResultItem {
    #[serde(rename = "Type")]
    kind: Option<String>,
    document_id: Option<String>,
    document_title: Option<TextWithHighlights>,
    document_excerpt: Option<TextWithHighlights>,
    #[serde(rename = "DocumentURI")]
    document_uri: Option<String>,
    #[serde(default)]
    additional_attributes: Vec<AdditionalAttribute>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct TextWithHighlights {
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct AdditionalAttribute {
    key: String,
    value: AttributeValue,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct AttributeValue {
    text_with_highlights_value: Option<TextWithHighlights>,
}

/// Suggested answers carry their text in the `AnswerText` attribute; plain
/// documents only have an excerpt.
fn to_document(item: ResultItem) -> RetrievedDocument {
    let title = item
        .document_title
        .and_then(|t| t.text)
        .unwrap_or_default();

    let answer_text = item
        .additional_attributes
        .into_iter()
        .find(|a| a.key == "AnswerText")
        .and_then(|a| a.value.text_with_highlights_value)
        .and_then(|t| t.text);
    let raw_excerpt = answer_text
        .or_else(|| item.document_excerpt.and_then(|e| e.text))
        .unwrap_or_default();
    let excerpt = clean_excerpt(&raw_excerpt);

    let source = item
        .document_uri
        .or(item.document_id)
        .unwrap_or_else(|| title.clone());

    RetrievedDocument {
        page_content: format!("Document Title: {title}\nDocument Excerpt: \n{excerpt}\n"),
        source,
        title: Some(title),
        excerpt: Some(excerpt),
        kind: item.kind,
    }
}

/// Collapses newlines and runs of whitespace into single spaces.
fn clean_excerpt(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}
