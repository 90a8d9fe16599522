//! Error types for the reconciliation engine and its collaborators.
//!
//! Uses `thiserror` for structured error handling with automatic `From` implementations.
//! Input errors are always recoverable by re-prompting; everything else aborts the
//! current step and leaves the session where it was.

use std::time::Duration;

/// Errors from the bibliometric API collaborator.
#[derive(thiserror::Error, Debug)]
pub enum ClientError {
    /// HTTP transport error (connection, DNS, TLS, etc.)
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Middleware error
    #[error("Middleware error: {0}")]
    Middleware(#[from] reqwest_middleware::Error),

    /// Quota exhausted (429 response)
    #[error("Rate limited, retry after {retry_after:?}")]
    RateLimited {
        /// Suggested wait time before retry
        retry_after: Duration,
    },

    /// Resource not found (404 response)
    #[error("Resource not found: {resource}")]
    NotFound {
        /// Description of the missing resource
        resource: String,
    },

    /// Invalid request parameters (400 response)
    #[error("Bad request: {message}")]
    BadRequest {
        /// Error message from API
        message: String,
    },

    /// Credentials rejected (401/403 response)
    #[error("Not authorized: {message}")]
    Unauthorized {
        /// Error message from API
        message: String,
    },

    /// JSON parsing error
    #[error("Failed to parse response: {0}")]
    Parse(#[from] serde_json::Error),

    /// Payload decoded but does not have the expected shape.
    #[error("Malformed {context} payload: {detail}")]
    Malformed {
        /// Endpoint or structure being decoded
        context: String,
        /// What was wrong with it
        detail: String,
    },

    /// A search matched more records than paging can reach.
    #[error("Search matched {total} results but only {reachable} can be retrieved")]
    Incomplete {
        /// `opensearch:totalResults` of the search
        total: u64,
        /// Records the paging mode can deliver
        reachable: u64,
    },

    /// Server error (5xx response)
    #[error("Server error ({status}): {message}")]
    Server {
        /// HTTP status code
        status: u16,
        /// Error message
        message: String,
    },

    /// Unexpected HTTP status
    #[error("Unexpected status {status}: {message}")]
    UnexpectedStatus {
        /// HTTP status code
        status: u16,
        /// Response body or message
        message: String,
    },
}

impl ClientError {
    /// Create a rate limited error with retry-after duration.
    #[must_use]
    pub fn rate_limited(seconds: u64) -> Self {
        Self::RateLimited { retry_after: Duration::from_secs(seconds) }
    }

    /// Create a not found error.
    #[must_use]
    pub fn not_found(resource: impl Into<String>) -> Self {
        Self::NotFound { resource: resource.into() }
    }

    /// Create a bad request error.
    #[must_use]
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::BadRequest { message: message.into() }
    }

    /// Create a server error.
    #[must_use]
    pub fn server(status: u16, message: impl Into<String>) -> Self {
        Self::Server { status, message: message.into() }
    }

    /// Create a malformed payload error.
    #[must_use]
    pub fn malformed(context: impl Into<String>, detail: impl Into<String>) -> Self {
        Self::Malformed { context: context.into(), detail: detail.into() }
    }

    /// Returns true if this error is retryable.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::RateLimited { .. } | Self::Server { .. })
    }

    /// Returns true if the upstream reported the resource as missing.
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Get the retry-after duration if this is a rate limit error.
    #[must_use]
    pub const fn retry_after(&self) -> Option<Duration> {
        match self {
            Self::RateLimited { retry_after } => Some(*retry_after),
            _ => None,
        }
    }
}

/// Recoverable user-input failures.
///
/// The session answers each of these by re-emitting the current prompt.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum InputError {
    /// Search returned zero candidates.
    #[error("No match found for '{query}'")]
    NoMatch {
        /// The query as submitted
        query: String,
    },

    /// Candidate index outside `0..count` or not an integer.
    #[error("Invalid index '{input}': expected a number between 0 and {max}")]
    InvalidIndex {
        /// Raw input
        input: String,
        /// Largest accepted index
        max: usize,
    },

    /// A type selection token is unknown, duplicated or malformed.
    #[error("Invalid selection '{token}': {reason}")]
    InvalidSelection {
        /// Offending token
        token: String,
        /// What is wrong with it
        reason: String,
    },

    /// The selection has the wrong number of top-level groups.
    #[error("Expected {expected} groups, found {found}")]
    WrongArity {
        /// Required number of groups
        expected: usize,
        /// Number actually given
        found: usize,
    },

    /// Year window input rejected.
    #[error("Invalid year window: {reason}")]
    InvalidWindow {
        /// What is wrong with it
        reason: String,
    },

    /// Menu choice not among the listed options.
    #[error("Unknown option '{input}'")]
    UnknownOption {
        /// Raw input
        input: String,
    },

    /// Search text is neither a `last, first` pair nor an identifier list.
    #[error("Malformed query '{input}': {reason}")]
    MalformedQuery {
        /// Raw input
        input: String,
        /// What is wrong with it
        reason: String,
    },
}

impl InputError {
    /// Create a no-match error.
    #[must_use]
    pub fn no_match(query: impl Into<String>) -> Self {
        Self::NoMatch { query: query.into() }
    }

    /// Create an invalid selection error.
    #[must_use]
    pub fn invalid_selection(token: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidSelection { token: token.into(), reason: reason.into() }
    }

    /// Create an invalid window error.
    #[must_use]
    pub fn invalid_window(reason: impl Into<String>) -> Self {
        Self::InvalidWindow { reason: reason.into() }
    }

    /// Create an unknown option error.
    #[must_use]
    pub fn unknown_option(input: impl Into<String>) -> Self {
        Self::UnknownOption { input: input.into() }
    }

    /// Create a malformed query error.
    #[must_use]
    pub fn malformed_query(input: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::MalformedQuery { input: input.into(), reason: reason.into() }
    }
}

/// Errors from the rendering collaborator.
#[derive(thiserror::Error, Debug)]
pub enum RenderError {
    /// The handle is unknown or already closed.
    #[error("Unknown render handle {0}")]
    UnknownHandle(String),

    /// The renderer failed to write or finish a document.
    #[error("Render failed: {0}")]
    Failed(String),
}

/// Errors from the roster-loading collaborator.
#[derive(thiserror::Error, Debug)]
pub enum RosterError {
    /// The roster file could not be read.
    #[error("Roster I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The roster is not valid CSV.
    #[error("Roster CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// A required column is absent from the header row.
    #[error("Roster is missing the '{column}' column")]
    MissingColumn {
        /// Expected header
        column: String,
    },
}

/// Errors raised by an engine step.
#[derive(thiserror::Error, Debug)]
pub enum EngineError {
    /// Upstream collaborator call failed.
    #[error("Upstream failure: {0}")]
    Upstream(#[from] ClientError),

    /// Upstream data passed the wire layer but violates an engine invariant.
    #[error("Malformed {context}: {detail}")]
    Malformed {
        /// Structure being processed
        context: String,
        /// What was wrong with it
        detail: String,
    },

    /// Recoverable input failure.
    #[error(transparent)]
    Input(#[from] InputError),

    /// Rendering collaborator failure.
    #[error("Rendering failed: {0}")]
    Render(#[from] RenderError),

    /// Engine logic error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl EngineError {
    /// Create a malformed data error.
    #[must_use]
    pub fn malformed(context: impl Into<String>, detail: impl Into<String>) -> Self {
        Self::Malformed { context: context.into(), detail: detail.into() }
    }

    /// Create an internal error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Returns true if re-prompting can recover from this error.
    #[must_use]
    pub const fn is_recoverable(&self) -> bool {
        matches!(self, Self::Input(_))
    }

    /// Convert to a message suitable for showing to the user verbatim.
    #[must_use]
    pub fn to_user_message(&self) -> String {
        match self {
            Self::Upstream(ClientError::RateLimited { retry_after }) => {
                format!(
                    "The bibliometric API quota is exhausted. Please wait {:?} before retrying.",
                    retry_after
                )
            }
            Self::Upstream(ClientError::NotFound { resource }) => {
                format!("Not found: {resource}. Please check the identifier is correct.")
            }
            Self::Upstream(ClientError::Unauthorized { .. }) => {
                "The API key or institution token was rejected.".to_string()
            }
            Self::Upstream(ClientError::Incomplete { total, .. }) => {
                format!("The search matched {total} documents, too many to retrieve. Please narrow it.")
            }
            _ => self.to_string(),
        }
    }
}

/// Result type alias for client operations.
pub type ClientResult<T> = Result<T, ClientError>;

/// Result type alias for engine operations.
pub type EngineResult<T> = Result<T, EngineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_error_retryable() {
        assert!(ClientError::rate_limited(60).is_retryable());
        assert!(ClientError::server(500, "Internal error").is_retryable());

        assert!(!ClientError::not_found("author 123").is_retryable());
        assert!(!ClientError::bad_request("invalid query").is_retryable());
        assert!(!ClientError::malformed("citations", "missing matrix").is_retryable());
    }

    #[test]
    fn test_client_error_retry_after() {
        let err = ClientError::rate_limited(60);
        assert_eq!(err.retry_after(), Some(Duration::from_secs(60)));

        let err = ClientError::not_found("author");
        assert_eq!(err.retry_after(), None);
    }

    #[test]
    fn test_input_errors_are_recoverable() {
        let err: EngineError = InputError::no_match("Smith, John").into();
        assert!(err.is_recoverable());

        let err: EngineError = ClientError::server(503, "down").into();
        assert!(!err.is_recoverable());
    }

    #[test]
    fn test_selection_error_names_token() {
        let err = InputError::invalid_selection("[1;7]", "index 7 does not exist");
        assert!(err.to_string().contains("[1;7]"));
    }

    #[test]
    fn test_incomplete_search_is_fatal() {
        let err = EngineError::Upstream(ClientError::Incomplete { total: 6000, reachable: 5000 });
        assert!(!err.is_recoverable());
        assert!(err.to_user_message().contains("6000"));
    }

    #[test]
    fn test_user_message_for_quota() {
        let err = EngineError::Upstream(ClientError::rate_limited(30));
        assert!(err.to_user_message().contains("quota"));
    }
}
