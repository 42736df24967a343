//! Line-driven chat loop.
//!
//! Reads one line at a time, keeps the bounded conversation history, runs the
//! chain for every question and prints the result. A failed turn is reported
//! and skipped; only end of input stops the loop.

use std::io::Write;

use chat_chain::{
    ConversationHistory, ConversationalChain, IndicatifProgress, NoopProgress, Progress, TurnInput,
};
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tracing::{debug, info, warn};

use crate::error_handler::AppResult;
use crate::output;

/// One interactive session. Owns the history for its whole lifetime.
pub struct ChatLoop<'a> {
    chain: &'a ConversationalChain,
    history: ConversationHistory,
    spinner: bool,
}

impl<'a> ChatLoop<'a> {
    pub fn new(chain: &'a ConversationalChain, max_history: usize) -> Self {
        Self {
            chain,
            history: ConversationHistory::new(max_history),
            spinner: false,
        }
    }

    /// Show a spinner on stderr while a turn is running.
    pub fn with_spinner(mut self, on: bool) -> Self {
        self.spinner = on;
        self
    }

    pub fn history(&self) -> &ConversationHistory {
        &self.history
    }

    /// Runs until `input` is exhausted.
    ///
    /// # Errors
    /// Only I/O failures on `input` or `out` end the loop early; chain errors
    /// and lines that are not UTF-8 are reported and the next line is read.
    pub async fn run<R, W>(&mut self, mut input: R, out: &mut W) -> AppResult<()>
    where
        R: AsyncBufRead + Unpin,
        W: Write,
    {
        output::greeting(out)?;
        output::prompt(out)?;

        let mut buf = Vec::new();
        loop {
            buf.clear();
            if input.read_until(b'\n', &mut buf).await? == 0 {
                break;
            }
            match std::str::from_utf8(&buf) {
                Ok(line) => self.turn(line.trim_end_matches(['\n', '\r']), out).await?,
                Err(e) => {
                    warn!(error = %e, "input line is not valid UTF-8");
                    output::turn_error(out, &format!("input is not valid UTF-8 ({e})"))?;
                }
            }
            output::prompt(out)?;
        }

        output::farewell(out)?;
        info!(turns = self.history.len(), "input closed");
        Ok(())
    }

    async fn turn<W: Write>(&mut self, line: &str, out: &mut W) -> AppResult<()> {
        let question = match TurnInput::classify(line) {
            TurnInput::Blank => return Ok(()),
            TurnInput::Reset(query) => {
                self.history.reset();
                debug!("history cleared");
                if query.is_empty() {
                    output::new_search(out)?;
                    return Ok(());
                }
                query
            }
            TurnInput::Question(q) => {
                if self.history.evict_if_full().is_some() {
                    debug!("oldest turn evicted");
                }
                q
            }
        };

        let progress: Box<dyn Progress> = if self.spinner {
            Box::new(IndicatifProgress::spinner())
        } else {
            Box::new(NoopProgress)
        };
        let result = self
            .chain
            .run(&question, &self.history, progress.as_ref())
            .await;
        progress.clear();

        match result {
            Ok(answer) => {
                output::answer(out, &answer)?;
                self.history.append(question, answer.answer);
            }
            Err(e) => {
                warn!(error = %e, "turn failed");
                output::turn_error(out, &e)?;
            }
        }
        Ok(())
    }
}
