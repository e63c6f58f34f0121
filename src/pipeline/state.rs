// file: src/pipeline/state.rs
// description: lifecycle states of a single pipeline run
// reference: explicit state machine with validated transitions

use crate::error::{PipelineError, Result};
use serde::Serialize;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineState {
    Idle,
    Acquiring,
    Discovering,
    Parsing,
    Aggregated,
    Done,
    Failed,
    Cancelled,
}

impl PipelineState {
    pub fn can_transition_to(self, next: PipelineState) -> bool {
        use PipelineState::*;

        matches!(
            (self, next),
            (Idle, Acquiring)
                | (Acquiring, Discovering)
                | (Acquiring, Failed)
                | (Discovering, Parsing)
                | (Discovering, Failed)
                | (Parsing, Aggregated)
                | (Parsing, Cancelled)
                | (Aggregated, Done)
        )
    }

    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            PipelineState::Done | PipelineState::Failed | PipelineState::Cancelled
        )
    }
}

impl fmt::Display for PipelineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PipelineState::Idle => "idle",
            PipelineState::Acquiring => "acquiring",
            PipelineState::Discovering => "discovering",
            PipelineState::Parsing => "parsing",
            PipelineState::Aggregated => "aggregated",
            PipelineState::Done => "done",
            PipelineState::Failed => "failed",
            PipelineState::Cancelled => "cancelled",
        };
        f.write_str(name)
    }
}

/// Tracks the current state of one run and refuses illegal moves.
#[derive(Debug)]
pub struct RunState {
    current: PipelineState,
    history: Vec<PipelineState>,
}

impl Default for RunState {
    fn default() -> Self {
        Self::new()
    }
}

impl RunState {
    pub fn new() -> Self {
        Self {
            current: PipelineState::Idle,
            history: vec![PipelineState::Idle],
        }
    }

    pub fn current(&self) -> PipelineState {
        self.current
    }

    pub fn history(&self) -> &[PipelineState] {
        &self.history
    }

    pub fn advance(&mut self, next: PipelineState) -> Result<()> {
        if !self.current.can_transition_to(next) {
            return Err(PipelineError::InvalidTransition {
                from: self.current.to_string(),
                to: next.to_string(),
            });
        }
        tracing::debug!("Pipeline state {} -> {}", self.current, next);
        self.current = next;
        self.history.push(next);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_happy_path() {
        let mut state = RunState::new();
        for next in [
            PipelineState::Acquiring,
            PipelineState::Discovering,
            PipelineState::Parsing,
            PipelineState::Aggregated,
            PipelineState::Done,
        ] {
            state.advance(next).unwrap();
        }

        assert!(state.current().is_terminal());
        assert_eq!(state.history().len(), 6);
    }

    #[test]
    fn test_parsing_cannot_fail() {
        assert!(!PipelineState::Parsing.can_transition_to(PipelineState::Failed));
        assert!(PipelineState::Parsing.can_transition_to(PipelineState::Cancelled));
        assert!(PipelineState::Acquiring.can_transition_to(PipelineState::Failed));
        assert!(PipelineState::Discovering.can_transition_to(PipelineState::Failed));
    }

    #[test]
    fn test_invalid_transition_rejected() {
        let mut state = RunState::new();
        let err = state.advance(PipelineState::Parsing).unwrap_err();

        assert_eq!(err.kind(), "invalid_transition");
        assert_eq!(
            err.to_string(),
            "Invalid pipeline transition from idle to parsing"
        );
        assert_eq!(state.current(), PipelineState::Idle);
    }

    #[test]
    fn test_terminal_states_are_final() {
        for state in [
            PipelineState::Done,
            PipelineState::Failed,
            PipelineState::Cancelled,
        ] {
            assert!([
                PipelineState::Idle,
                PipelineState::Acquiring,
                PipelineState::Parsing,
                PipelineState::Done,
            ]
            .iter()
            .all(|next| !state.can_transition_to(*next)));
        }
    }
}
