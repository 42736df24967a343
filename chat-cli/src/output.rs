//! Terminal rendering for the chat loop.
//!
//! Everything goes through a caller-supplied writer so the loop can be
//! driven against a buffer.

use std::fmt::Display;
use std::io::{self, Write};

use chat_chain::ChainAnswer;
use colored::Colorize;

pub const GREETING: &str = "Hello! How can I help you?";
pub const HINT: &str = "Ask a question, start a New search: or CTRL-D to exit.";
pub const PROMPT: &str = "> ";
pub const NEW_SEARCH: &str = "History cleared. Ask your new question.";
pub const FAREWELL: &str = "Bye";

pub fn greeting(out: &mut impl Write) -> io::Result<()> {
    writeln!(out, "{}", GREETING.bright_blue())
}

/// Hint line plus the input prompt, flushed so it shows before reading.
pub fn prompt(out: &mut impl Write) -> io::Result<()> {
    writeln!(out, "{}", HINT.bright_cyan())?;
    write!(out, "{PROMPT}")?;
    out.flush()
}

pub fn new_search(out: &mut impl Write) -> io::Result<()> {
    writeln!(out, "{}", NEW_SEARCH.bright_cyan())
}

/// Answer text, then the `Sources:` section when documents were used.
pub fn answer(out: &mut impl Write, answer: &ChainAnswer) -> io::Result<()> {
    writeln!(out, "{}", answer.answer.green())?;
    if !answer.source_documents.is_empty() {
        writeln!(out, "{}", "Sources:".green())?;
        for source in answer.sources() {
            writeln!(out, "{source}")?;
        }
    }
    writeln!(out)
}

pub fn turn_error(out: &mut impl Write, err: &dyn Display) -> io::Result<()> {
    writeln!(out, "{}", format!("Error: {err}").red())?;
    writeln!(out, "{}", "The question was not answered, please try again.".red())
}

pub fn farewell(out: &mut impl Write) -> io::Result<()> {
    writeln!(out)?;
    writeln!(out, "{}", FAREWELL.bright_blue())
}
