//! Warning types for non-fatal errors during JSONL processing.
//!
//! A malformed line is never a reason to abort a load: the line is kept
//! verbatim (see [`crate::lines::read_preserving`]) and a [`Warning`] is
//! recorded so the caller can report it at the end of the session.

/// A non-fatal warning that occurred while reading a JSONL file.
///
/// Each variant carries the 1-based line number where the issue
/// occurred for reporting purposes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Warning {
    /// A non-blank line contained JSON that could not be parsed into the
    /// requested record type.
    ///
    /// The line is retained verbatim in its original position and will
    /// round-trip unchanged through a subsequent write.
    MalformedLine {
        /// The 1-based line number where the error occurred.
        line_number: usize,
        /// A description of the JSON parsing error.
        error: String,
    },
}

impl Warning {
    /// Returns the line number associated with this warning.
    #[must_use]
    pub fn line_number(&self) -> usize {
        match self {
            Self::MalformedLine { line_number, .. } => *line_number,
        }
    }

    /// Returns a human-readable description of the warning.
    #[must_use]
    pub fn description(&self) -> String {
        match self {
            Self::MalformedLine { line_number, error } => {
                format!("line {line_number}: malformed record: {error}")
            }
        }
    }

    /// Returns a static string identifying the warning kind.
    ///
    /// Useful for programmatic filtering without pattern matching on the
    /// enum variants.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::MalformedLine { .. } => "malformed_line",
        }
    }
}

impl std::fmt::Display for Warning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.description())
    }
}

impl std::error::Error for Warning {}
