//! Conversation session state: a bounded FIFO of question/answer turns and
//! recognition of the reset command.
//!
//! The history is an explicit value owned by the caller for the lifetime of
//! one chat session. Nothing here is shared or global.

use std::collections::VecDeque;

/// Default number of turns kept.
pub const DEFAULT_MAX_HISTORY: usize = 5;

/// Case-insensitive line prefix that starts a fresh conversation.
pub const RESET_PREFIX: &str = "new search:";

/// One question/answer exchange. Immutable once created.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversationTurn {
    question: String,
    answer: String,
}

impl ConversationTurn {
    pub fn new(question: impl Into<String>, answer: impl Into<String>) -> Self {
        Self {
            question: question.into(),
            answer: answer.into(),
        }
    }

    pub fn question(&self) -> &str {
        &self.question
    }

    pub fn answer(&self) -> &str {
        &self.answer
    }
}

/// Capacity-bounded, oldest-first conversation history.
///
/// Invariant: `len() <= capacity()` after every operation. Eviction always
/// removes the oldest turn.
///
/// # Example
/// ```
/// use chat_chain::ConversationHistory;
///
/// let mut h = ConversationHistory::new(2);
/// h.append("q1", "a1");
/// h.append("q2", "a2");
/// h.append("q3", "a3");
/// let qs: Vec<_> = h.iter().map(|t| t.question()).collect();
/// assert_eq!(qs, ["q2", "q3"]);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversationHistory {
    turns: VecDeque<ConversationTurn>,
    capacity: usize,
}

impl Default for ConversationHistory {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_HISTORY)
    }
}

impl ConversationHistory {
    /// Empty history holding at most `capacity` turns (at least one).
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            turns: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Adds a turn, evicting the oldest ones while over capacity.
    pub fn append(&mut self, question: impl Into<String>, answer: impl Into<String>) {
        self.turns.push_back(ConversationTurn::new(question, answer));
        while self.turns.len() > self.capacity {
            self.turns.pop_front();
        }
    }

    /// Drops the oldest turn if the history is full, making room for the next one.
    pub fn evict_if_full(&mut self) -> Option<ConversationTurn> {
        if self.turns.len() >= self.capacity {
            self.turns.pop_front()
        } else {
            None
        }
    }

    /// Clears every turn.
    pub fn reset(&mut self) {
        self.turns.clear();
    }

    pub fn iter(&self) -> impl ExactSizeIterator<Item = &ConversationTurn> {
        self.turns.iter()
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

/// If `line` starts with the reset command, returns the query that follows it.
///
/// Matching is case-insensitive on the trimmed line. The returned query is
/// lowercased and trimmed; it may be empty when the line holds only the prefix.
///
/// # Example
/// ```
/// use chat_chain::parse_reset_command;
/// assert_eq!(parse_reset_command("New search: What is X?").as_deref(), Some("what is x?"));
/// assert_eq!(parse_reset_command("What is X?"), None);
/// ```
pub fn parse_reset_command(line: &str) -> Option<String> {
    line.trim()
        .to_lowercase()
        .strip_prefix(RESET_PREFIX)
        .map(|rest| rest.trim().to_string())
}

/// How the chat loop should treat one input line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TurnInput {
    /// Nothing to ask.
    Blank,
    /// Clear history first, then ask the (possibly empty) query.
    Reset(String),
    /// Ask within the current conversation.
    Question(String),
}

impl TurnInput {
    pub fn classify(line: &str) -> Self {
        if let Some(query) = parse_reset_command(line) {
            return TurnInput::Reset(query);
        }
        let q = line.trim();
        if q.is_empty() {
            TurnInput::Blank
        } else {
            TurnInput::Question(q.to_string())
        }
    }
}
