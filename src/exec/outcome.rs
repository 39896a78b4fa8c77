use std::fmt;

/// Typed failure produced by every remote call wrapper.
///
/// These are values, not raised faults: once an operation is wrapped by the
/// timeout guard its result always comes back as an [`Outcome`], and nothing
/// above the wrapper ever needs a `catch`-style recovery path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SignError {
    Auth { message: String },
    Timeout { label: String, timeout_ms: u64 },
    Remote { label: String, message: String },
    Config { message: String },
    Notification { message: String },
}

impl SignError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, SignError::Timeout { .. })
    }
}

impl fmt::Display for SignError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SignError::Auth { message } => write!(f, "authentication failed: {message}"),
            SignError::Timeout { label, timeout_ms } => {
                write!(f, "{label} timed out after {timeout_ms}ms")
            }
            SignError::Remote { label, message } => write!(f, "{label} failed: {message}"),
            SignError::Config { message } => write!(f, "configuration error: {message}"),
            SignError::Notification { message } => {
                write!(f, "notification delivery failed: {message}")
            }
        }
    }
}

impl std::error::Error for SignError {}

/// Result of a single guarded remote operation.
pub type Outcome<T> = Result<T, SignError>;
