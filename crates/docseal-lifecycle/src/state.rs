use std::fmt;

use serde::Serialize;

use crate::error::{LifecycleError, LifecycleResult};

/// Where a document operation is in the write pipeline.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LifecycleState {
    /// Validated input, nothing written yet.
    Draft,
    /// Bytes stored and version staged.
    Stored,
    /// Hash confirmed in the ledger.
    Anchored,
    /// Version published and indexed.
    Active,
    Deleted,
    /// The operation was rolled back.
    Failed,
}

/// Step outcomes that drive [`LifecycleState`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LifecycleEvent {
    Stored,
    Anchored,
    Published,
    Deleted,
    Failed,
}

impl LifecycleState {
    /// Apply `event`, rejecting anything the pipeline does not allow.
    pub fn transition(self, event: LifecycleEvent) -> LifecycleResult<Self> {
        use LifecycleEvent as E;
        use LifecycleState as S;

        let next = match (self, event) {
            (S::Draft, E::Stored) => S::Stored,
            (S::Stored, E::Anchored) => S::Anchored,
            (S::Anchored, E::Published) => S::Active,
            (S::Active, E::Deleted) => S::Deleted,
            (S::Draft | S::Stored | S::Anchored, E::Failed) => S::Failed,
            (from, event) => return Err(LifecycleError::InvalidTransition { from, event }),
        };
        Ok(next)
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Active | Self::Deleted | Self::Failed)
    }
}

impl fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Draft => "draft",
            Self::Stored => "stored",
            Self::Anchored => "anchored",
            Self::Active => "active",
            Self::Deleted => "deleted",
            Self::Failed => "failed",
        };
        f.write_str(s)
    }
}

impl fmt::Display for LifecycleEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Stored => "stored",
            Self::Anchored => "anchored",
            Self::Published => "published",
            Self::Deleted => "deleted",
            Self::Failed => "failed",
        };
        f.write_str(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn happy_path_reaches_active() {
        let state = LifecycleState::Draft
            .transition(LifecycleEvent::Stored)
            .and_then(|s| s.transition(LifecycleEvent::Anchored))
            .and_then(|s| s.transition(LifecycleEvent::Published))
            .unwrap();
        assert_eq!(state, LifecycleState::Active);
        assert!(state.is_terminal());
    }

    #[test]
    fn only_active_documents_can_be_deleted() {
        assert_eq!(
            LifecycleState::Active.transition(LifecycleEvent::Deleted).unwrap(),
            LifecycleState::Deleted
        );
        assert!(LifecycleState::Stored
            .transition(LifecycleEvent::Deleted)
            .is_err());
    }

    #[test]
    fn failure_only_before_active() {
        for state in [LifecycleState::Draft, LifecycleState::Stored, LifecycleState::Anchored] {
            assert_eq!(state.transition(LifecycleEvent::Failed).unwrap(), LifecycleState::Failed);
        }
        assert!(LifecycleState::Active.transition(LifecycleEvent::Failed).is_err());
    }

    #[test]
    fn steps_cannot_be_skipped() {
        let err = LifecycleState::Draft
            .transition(LifecycleEvent::Published)
            .unwrap_err();
        assert!(matches!(
            err,
            LifecycleError::InvalidTransition {
                from: LifecycleState::Draft,
                event: LifecycleEvent::Published
            }
        ));
        assert!(LifecycleState::Deleted
            .transition(LifecycleEvent::Stored)
            .is_err());
    }
}
