/// Resolution state definitions for a single (entity, kind) pair
use std::fmt;
use thiserror::Error;

/// Represents the current state of one (entity, kind) resolution
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResolutionState {
    // ===== Active States =====
    /// Nothing has been attempted yet
    Unresolved,

    /// Candidate batches are being probed
    Probing,

    // ===== Terminal States =====
    /// An asset is recorded for this kind (fetched now or already present)
    Resolved,

    /// Every candidate was probed and none exists
    Exhausted,

    /// The winning candidate could not be fetched or stored
    Failed,
}

impl ResolutionState {
    /// Returns true if no further transitions are possible
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Resolved | Self::Exhausted | Self::Failed)
    }

    /// Returns true if the transition `self → next` is allowed
    ///
    /// `Unresolved → Resolved` is allowed directly for kinds whose asset is
    /// already recorded in the catalog.
    pub fn can_transition_to(&self, next: ResolutionState) -> bool {
        matches!(
            (self, next),
            (Self::Unresolved, Self::Probing)
                | (Self::Unresolved, Self::Resolved)
                | (Self::Probing, Self::Resolved)
                | (Self::Probing, Self::Exhausted)
                | (Self::Probing, Self::Failed)
        )
    }

    /// Moves to `next`, or returns `InvalidTransition` and stays put
    pub fn transition(&mut self, next: ResolutionState) -> Result<(), InvalidTransition> {
        if !self.can_transition_to(next) {
            return Err(InvalidTransition {
                from: *self,
                to: next,
            });
        }
        *self = next;
        Ok(())
    }

    /// Converts the state to its database string representation
    pub fn to_db_string(&self) -> &'static str {
        match self {
            Self::Unresolved => "unresolved",
            Self::Probing => "probing",
            Self::Resolved => "resolved",
            Self::Exhausted => "exhausted",
            Self::Failed => "failed",
        }
    }

    /// Returns all possible states
    pub fn all_states() -> Vec<Self> {
        vec![
            Self::Unresolved,
            Self::Probing,
            Self::Resolved,
            Self::Exhausted,
            Self::Failed,
        ]
    }
}

/// A transition the state machine does not allow
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("Invalid state transition: {from} -> {to}")]
pub struct InvalidTransition {
    pub from: ResolutionState,
    pub to: ResolutionState,
}

impl Default for ResolutionState {
    fn default() -> Self {
        Self::Unresolved
    }
}

impl fmt::Display for ResolutionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_db_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_terminal() {
        assert!(!ResolutionState::Unresolved.is_terminal());
        assert!(!ResolutionState::Probing.is_terminal());

        assert!(ResolutionState::Resolved.is_terminal());
        assert!(ResolutionState::Exhausted.is_terminal());
        assert!(ResolutionState::Failed.is_terminal());
    }

    #[test]
    fn test_valid_transitions() {
        let mut state = ResolutionState::default();
        state.transition(ResolutionState::Probing).unwrap();
        state.transition(ResolutionState::Exhausted).unwrap();
        assert_eq!(state, ResolutionState::Exhausted);

        let mut state = ResolutionState::Unresolved;
        state.transition(ResolutionState::Resolved).unwrap();
        assert_eq!(state, ResolutionState::Resolved);
    }

    #[test]
    fn test_terminal_states_are_final() {
        for terminal in [
            ResolutionState::Resolved,
            ResolutionState::Exhausted,
            ResolutionState::Failed,
        ] {
            for next in ResolutionState::all_states() {
                assert!(
                    !terminal.can_transition_to(next),
                    "{:?} -> {:?} should be rejected",
                    terminal,
                    next
                );
            }
        }
    }

    #[test]
    fn test_invalid_transition_error() {
        let mut state = ResolutionState::Unresolved;
        let err = state.transition(ResolutionState::Failed).unwrap_err();
        assert_eq!(
            err,
            InvalidTransition {
                from: ResolutionState::Unresolved,
                to: ResolutionState::Failed
            }
        );
        assert_eq!(err.to_string(), "Invalid state transition: unresolved -> failed");
        assert_eq!(state, ResolutionState::Unresolved);
    }
}
