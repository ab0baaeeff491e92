use std::fmt;

/// Errors raised by graph construction and the analysis stages.
///
/// All of these are precondition violations reported straight back to the
/// caller; none of them are transient.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GraphError {
    /// A construction argument was rejected (negative vertex count, non-finite weight).
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// A vertex id fell outside `[0, vertex_count)`.
    #[error("vertex {vertex} is out of range for a graph with {vertex_count} vertices")]
    OutOfRange { vertex: i64, vertex_count: usize },

    /// Topological sort found a cycle; only `sorted` of `total` vertices were ordered.
    #[error("graph contains a cycle ({sorted} of {total} vertices ordered)")]
    CycleDetected { sorted: usize, total: usize },
}

impl GraphError {
    pub(crate) fn out_of_range(vertex: usize, vertex_count: usize) -> Self {
        Self::OutOfRange {
            vertex: i64::try_from(vertex).unwrap_or(i64::MAX),
            vertex_count,
        }
    }

    /// Machine-readable code for this error.
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::InvalidArgument(_) => ErrorCode::InvalidArgument,
            Self::OutOfRange { .. } => ErrorCode::VertexOutOfRange,
            Self::CycleDetected { .. } => ErrorCode::CycleDetected,
        }
    }
}

/// Machine-readable error codes for agent-friendly decision making.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    InvalidArgument,
    VertexOutOfRange,
    CycleDetected,
    DatasetUnreadable,
    DatasetMalformed,
    ConfigParseError,
}

impl ErrorCode {
    /// Stable code identifier (`E####`) for machine parsing.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::InvalidArgument => "E1001",
            Self::VertexOutOfRange => "E1002",
            Self::CycleDetected => "E2001",
            Self::DatasetUnreadable => "E3001",
            Self::DatasetMalformed => "E3002",
            Self::ConfigParseError => "E4001",
        }
    }

    /// Short human-facing summary for logs and terminal output.
    #[must_use]
    pub const fn message(self) -> &'static str {
        match self {
            Self::InvalidArgument => "Invalid argument",
            Self::VertexOutOfRange => "Vertex out of range",
            Self::CycleDetected => "Cycle detected",
            Self::DatasetUnreadable => "Dataset could not be read",
            Self::DatasetMalformed => "Dataset is malformed",
            Self::ConfigParseError => "Config file parse error",
        }
    }

    /// Optional remediation hint that can be surfaced to operators and agents.
    #[must_use]
    pub const fn hint(self) -> Option<&'static str> {
        match self {
            Self::InvalidArgument => Some("Use a non-negative vertex count and finite edge weights."),
            Self::VertexOutOfRange => Some("Vertex ids must lie in [0, n)."),
            Self::CycleDetected => {
                Some("Sort the condensation graph, not the original graph, when cycles are possible.")
            }
            Self::DatasetUnreadable => Some("Check the dataset path and read permissions."),
            Self::DatasetMalformed => {
                Some("Expected {\"n\": int, \"edges\": [{\"u\": int, \"v\": int, \"w\": float}]}.")
            }
            Self::ConfigParseError => Some("Fix syntax in depgraph.toml and retry."),
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

#[cfg(test)]
mod tests {
    use super::{ErrorCode, GraphError};
    use std::collections::HashSet;

    #[test]
    fn all_codes_are_unique() {
        let all = [
            ErrorCode::InvalidArgument,
            ErrorCode::VertexOutOfRange,
            ErrorCode::CycleDetected,
            ErrorCode::DatasetUnreadable,
            ErrorCode::DatasetMalformed,
            ErrorCode::ConfigParseError,
        ];

        let mut seen = HashSet::new();
        for code in all {
            assert!(seen.insert(code.code()), "duplicate code {}", code.code());
        }
    }

    #[test]
    fn code_format_is_machine_friendly() {
        let code = ErrorCode::CycleDetected.code();
        assert_eq!(code.len(), 5);
        assert!(code.starts_with('E'));
        assert!(code.chars().skip(1).all(|c| c.is_ascii_digit()));
    }

    #[test]
    fn graph_errors_map_to_codes() {
        assert_eq!(
            GraphError::CycleDetected { sorted: 0, total: 2 }.code(),
            ErrorCode::CycleDetected
        );
        assert_eq!(
            GraphError::out_of_range(7, 3).code(),
            ErrorCode::VertexOutOfRange
        );
    }

    #[test]
    fn out_of_range_message_names_vertex_and_bound() {
        let err = GraphError::out_of_range(7, 3);
        assert_eq!(
            err.to_string(),
            "vertex 7 is out of range for a graph with 3 vertices"
        );
    }
}
