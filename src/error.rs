//! Runner error types

use thiserror::Error;

/// Result type for runner operations
pub type RunnerResult<T> = Result<T, RunnerError>;

/// Errors observed by the runner, either from the group collaborator or
/// from user handlers.
#[derive(Error, Debug)]
pub enum RunnerError {
    /// The group is rebalancing; the member must re-join
    #[error("the group is rebalancing, re-joining the group is required")]
    RebalanceInProgress,

    /// The broker that answered is not the group coordinator
    #[error("the coordinator is not the coordinator for this group")]
    NotCoordinatorForGroup,

    /// The coordinator no longer recognizes this member id
    #[error("the coordinator is not aware of this member")]
    UnknownMemberId,

    /// The fetch offset is outside the range available on the broker.
    /// The group collaborator repositions the cursor before surfacing this.
    #[error("offset out of range for {topic}-{partition}")]
    OffsetOutOfRange {
        /// Topic of the repositioned partition
        topic: String,
        /// Repositioned partition
        partition: i32,
    },

    /// A required protocol feature is not supported
    #[error("not implemented: {0}")]
    NotImplemented(String),

    /// Network or broker connectivity failures
    #[error("connection error: {0}")]
    Connection(String),

    /// Failures raised by user handlers or message decoding
    #[error("processing error: {0}")]
    Processing(String),

    /// Offset commit failures
    #[error("commit error: {0}")]
    Commit(String),

    /// Invalid runner configuration
    #[error("configuration error: {0}")]
    Config(String),
}

impl RunnerError {
    /// True for errors that signal a group rebalance and are recovered by
    /// re-joining rather than surfaced to the crash handler.
    pub fn is_rebalancing(&self) -> bool {
        matches!(
            self,
            RunnerError::RebalanceInProgress | RunnerError::NotCoordinatorForGroup
        )
    }

    /// True for errors that carry group-protocol meaning. Anything else is
    /// opaque user or transport failure and gets logged with its source
    /// before being funneled through the retry policy.
    pub fn is_protocol(&self) -> bool {
        matches!(
            self,
            RunnerError::RebalanceInProgress
                | RunnerError::NotCoordinatorForGroup
                | RunnerError::UnknownMemberId
                | RunnerError::OffsetOutOfRange { .. }
                | RunnerError::NotImplemented(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rebalancing_classification() {
        assert!(RunnerError::RebalanceInProgress.is_rebalancing());
        assert!(RunnerError::NotCoordinatorForGroup.is_rebalancing());
        assert!(!RunnerError::UnknownMemberId.is_rebalancing());
        assert!(!RunnerError::Processing("boom".to_string()).is_rebalancing());
    }

    #[test]
    fn test_protocol_classification() {
        assert!(RunnerError::UnknownMemberId.is_protocol());
        assert!(RunnerError::OffsetOutOfRange {
            topic: "events".to_string(),
            partition: 0,
        }
        .is_protocol());
        assert!(RunnerError::NotImplemented("incremental fetch".to_string()).is_protocol());
        assert!(!RunnerError::Connection("broker down".to_string()).is_protocol());
        assert!(!RunnerError::Processing("bad payload".to_string()).is_protocol());
    }
}
