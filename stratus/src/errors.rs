use std::error::Error;
use std::fmt::{Debug, Display, Formatter};
use std::result::Result;

/// Error kinds for Stratus operations
///
/// This enum represents all possible error types that can occur during Stratus
/// database operations. Each error kind describes a specific category of failure,
/// enabling precise error handling.
///
/// # Examples
///
/// ```rust,ignore
/// use stratus::errors::{StratusError, ErrorKind, StratusResult};
///
/// fn example() -> StratusResult<()> {
///     Err(StratusError::new("Document not found", ErrorKind::NotFound))
/// }
/// ```
#[derive(Debug, PartialEq, Eq, Clone)]
pub enum ErrorKind {
    /// The requested document or blob was not found
    NotFound,
    /// A unique constraint was violated by a write
    UniqueConstraintViolation,
    /// A conditional write on the index catalog failed after retries
    Conflict,
    /// A value type has no tag encoding; the field is skipped
    Unsupported,
    /// A malformed query or invalid argument
    ValidationError,
    /// A transient failure from the underlying store
    Transient,
    /// Error encoding or decoding data
    EncodingError,
    /// A collection, container, or blob name is invalid
    InvalidName,
    /// The operation is not valid in the current context
    InvalidOperation,
    /// Error from the storage backend
    BackendError,
    /// Internal error (usually indicates a bug)
    InternalError,
}

impl Display for ErrorKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorKind::NotFound => write!(f, "Not found"),
            ErrorKind::UniqueConstraintViolation => write!(f, "Unique constraint violation"),
            ErrorKind::Conflict => write!(f, "Conflict"),
            ErrorKind::Unsupported => write!(f, "Unsupported value"),
            ErrorKind::ValidationError => write!(f, "Validation error"),
            ErrorKind::Transient => write!(f, "Transient error"),
            ErrorKind::EncodingError => write!(f, "Encoding error"),
            ErrorKind::InvalidName => write!(f, "Invalid name"),
            ErrorKind::InvalidOperation => write!(f, "Invalid operation"),
            ErrorKind::BackendError => write!(f, "Backend error"),
            ErrorKind::InternalError => write!(f, "Internal error"),
        }
    }
}

/// Custom Stratus error type.
///
/// `StratusError` encapsulates error information including the error message,
/// kind, and optional cause. It supports error chaining for debugging.
///
/// # Examples
///
/// ```rust,ignore
/// use stratus::errors::{StratusError, ErrorKind};
///
/// // Create a simple error
/// let err = StratusError::new("Catalog save failed", ErrorKind::Conflict);
///
/// // Create an error with a cause
/// let cause = StratusError::new("Precondition failed", ErrorKind::Conflict);
/// let err = StratusError::new_with_cause("Index creation failed", ErrorKind::Conflict, cause);
/// ```
#[derive(Clone)]
pub struct StratusError {
    message: String,
    error_kind: ErrorKind,
    cause: Option<Box<StratusError>>,
}

impl StratusError {
    /// Creates a new `StratusError` with the specified message and error kind.
    pub fn new(message: &str, error_kind: ErrorKind) -> Self {
        StratusError {
            message: message.to_string(),
            error_kind,
            cause: None,
        }
    }

    /// Creates a new `StratusError` with a cause error.
    ///
    /// This creates an error chain where the cause error is preserved for
    /// debugging.
    pub fn new_with_cause(message: &str, error_kind: ErrorKind, cause: StratusError) -> Self {
        StratusError {
            message: message.to_string(),
            error_kind,
            cause: Some(Box::new(cause)),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn kind(&self) -> &ErrorKind {
        &self.error_kind
    }

    pub fn cause(&self) -> Option<&StratusError> {
        self.cause.as_deref()
    }
}

impl Display for StratusError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl Debug for StratusError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        // print error message followed by cause chain
        match &self.cause {
            Some(cause) => write!(f, "{}\nCaused by: {:?}", self.message, cause),
            None => write!(f, "{} ({})", self.message, self.error_kind),
        }
    }
}

impl Error for StratusError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match &self.cause {
            Some(cause) => Some(cause.as_ref()),
            None => None,
        }
    }
}

/// A result type alias for Stratus operations.
///
/// `StratusResult<T>` is shorthand for `Result<T, StratusError>`.
/// All fallible Stratus operations return this type.
pub type StratusResult<T> = Result<T, StratusError>;

// From trait implementations for automatic error conversion
impl From<std::io::Error> for StratusError {
    fn from(err: std::io::Error) -> Self {
        StratusError::new(&format!("IO error: {}", err), ErrorKind::BackendError)
    }
}

impl From<serde_json::Error> for StratusError {
    fn from(err: serde_json::Error) -> Self {
        StratusError::new(
            &format!("JSON encoding error: {}", err),
            ErrorKind::EncodingError,
        )
    }
}

impl From<std::string::FromUtf8Error> for StratusError {
    fn from(err: std::string::FromUtf8Error) -> Self {
        StratusError::new(
            &format!("UTF-8 encoding error: {}", err),
            ErrorKind::EncodingError,
        )
    }
}

impl From<String> for StratusError {
    fn from(msg: String) -> Self {
        StratusError::new(&msg, ErrorKind::InternalError)
    }
}

impl From<&str> for StratusError {
    fn from(msg: &str) -> Self {
        StratusError::new(msg, ErrorKind::InternalError)
    }
}
