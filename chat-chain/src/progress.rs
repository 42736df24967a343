//! Progress reporting for a single chain run.
//!
//! The chain announces each [`Stage`] it enters. The CLI shows them on a
//! spinner; tests and piped runs use [`NoopProgress`].

use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};

/// Stages of one question/answer turn, in the order they can occur.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    /// Rewriting a follow-up into a standalone question.
    Rephrasing,
    /// Querying the index.
    Searching,
    /// Waiting for the model endpoint.
    Generating,
}

impl Stage {
    pub fn label(self) -> &'static str {
        match self {
            Stage::Rephrasing => "rephrasing question",
            Stage::Searching => "searching documents",
            Stage::Generating => "generating answer",
        }
    }
}

pub trait Progress: Send + Sync {
    fn enter(&self, _stage: Stage) {}
    /// Remove the indicator so regular output can follow.
    fn clear(&self) {}
}

#[derive(Default, Clone, Copy)]
pub struct NoopProgress;
impl Progress for NoopProgress {}

/// Spinner on stderr labelled with the current stage.
pub struct IndicatifProgress {
    pb: ProgressBar,
}

impl IndicatifProgress {
    pub fn spinner() -> Self {
        let pb = ProgressBar::new_spinner();
        pb.set_style(
            ProgressStyle::with_template("{spinner:.cyan} {msg} ({elapsed})")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        pb.enable_steady_tick(Duration::from_millis(100));
        Self { pb }
    }
}

impl Progress for IndicatifProgress {
    fn enter(&self, stage: Stage) {
        self.pb.set_message(stage.label());
    }

    fn clear(&self) {
        self.pb.finish_and_clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_stage_has_a_distinct_label() {
        let labels = [Stage::Rephrasing, Stage::Searching, Stage::Generating].map(Stage::label);
        assert_eq!(
            labels,
            ["rephrasing question", "searching documents", "generating answer"]
        );
    }

    #[test]
    fn spinner_follows_the_current_stage() {
        let p = IndicatifProgress::spinner();
        p.enter(Stage::Searching);
        assert_eq!(p.pb.message(), "searching documents");
        p.enter(Stage::Generating);
        assert_eq!(p.pb.message(), "generating answer");
        p.clear();
        assert!(p.pb.is_finished());
    }
}
