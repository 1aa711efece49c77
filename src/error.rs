use std::fmt;

/// Route registration error
///
/// Returned when a mask fails to compile or when a `RouteList` is
/// mutated with an invalid index. Routing-time failures (host mismatch,
/// path mismatch, filter rejection, missing parameters) are never
/// errors; they are reported as `None` by `match_request` and
/// `construct_url`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouterError {
    /// The mask string is syntactically invalid
    ///
    /// Raised for unbalanced `[`/`]` or `<`/`>`, an empty or malformed
    /// placeholder name, or a placeholder regex fragment that does not
    /// compile.
    MaskSyntax {
        /// The offending mask string
        mask: String,
        /// What went wrong, in human terms
        reason: String,
    },
    /// A parameter name is defined twice with conflicting meanings
    ///
    /// Raised when a placeholder name appears more than once in a mask,
    /// or when a mask-inline default and a metadata default for the
    /// same name disagree.
    DuplicateParameter {
        /// The conflicting parameter name
        name: String,
    },
    /// `RouteList::modify` was called with an index past the end
    OutOfRange {
        /// The requested index
        index: usize,
        /// Number of routers currently in the list
        len: usize,
    },
}

impl fmt::Display for RouterError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RouterError::MaskSyntax { mask, reason } => {
                write!(f, "invalid mask '{}': {}", mask, reason)
            }
            RouterError::DuplicateParameter { name } => {
                write!(
                    f,
                    "parameter '{}' is defined twice with conflicting values",
                    name
                )
            }
            RouterError::OutOfRange { index, len } => {
                write!(
                    f,
                    "router index {} is out of range for a list of {} routers",
                    index, len
                )
            }
        }
    }
}

impl std::error::Error for RouterError {}
