//! Error kinds raised by the shortest-path core.
//!
//! Application-level plumbing (file I/O, configuration) reports through
//! `eyre`; everything the algorithms can signal lives here.

use thiserror::Error;

use crate::cartographer::Source;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApspError {
    /// Declared counts disagree with the edges, or an edge is out of range.
    #[error("malformed input: {0}")]
    MalformedInput(String),

    #[error("negative-weight cycle reachable from {origin}")]
    NegativeCycleDetected { origin: Source },

    #[error("source {0} is not in the graph")]
    SourceNotFound(Source),

    /// The caller gave up on this solve (deadline passed).
    #[error("solve cancelled")]
    Cancelled,
}

impl ApspError {
    pub fn malformed(reason: impl Into<String>) -> Self {
        ApspError::MalformedInput(reason.into())
    }

    pub fn is_negative_cycle(&self) -> bool {
        matches!(self, ApspError::NegativeCycleDetected { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cartographer::Vertex;

    #[test]
    fn test_error_messages_name_the_source() {
        let err = ApspError::NegativeCycleDetected {
            origin: Source::Real(Vertex(3)),
        };
        assert_eq!(err.to_string(), "negative-weight cycle reachable from vertex 3");
        assert!(err.is_negative_cycle());

        let err = ApspError::SourceNotFound(Source::Virtual);
        assert_eq!(err.to_string(), "source virtual source is not in the graph");
        assert!(!err.is_negative_cycle());
    }
}
