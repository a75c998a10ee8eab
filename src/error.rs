//! Error types for figsync library.

use thiserror::Error;

/// Result type alias for figsync operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Where to look when the provider rejects a request.
pub const TOKEN_HELP_URL: &str = "https://www.figma.com/developers/api#access-tokens";

/// Error types that can occur while fetching files, styles and images.
#[derive(Error, Debug)]
pub enum Error {
    /// No access token was configured.
    #[error("You must define a {0} environment variable.")]
    MissingToken(&'static str),

    /// A request to the design-file API failed.
    #[error(
        "Failed to get Figma file {file_id}. Check to make sure you have a valid token \
         and proper permissions to access the file: {}\n{message}",
        TOKEN_HELP_URL
    )]
    Provider {
        /// File the request was made for
        file_id: String,
        /// Underlying failure
        message: String,
    },

    /// The render response had no URL for a requested component.
    #[error("No image source was returned for component {id}")]
    MissingSource {
        /// Component id
        id: String,
    },

    /// Transport-level failure while downloading an asset.
    #[error("Network error while fetching {url}: {message}")]
    Network {
        /// Asset URL
        url: String,
        /// Underlying failure
        message: String,
    },

    /// A single download attempt exceeded its time budget.
    #[error("Timed out after {millis}ms while fetching {url}")]
    Timeout {
        /// Asset URL
        url: String,
        /// Per-attempt timeout in milliseconds
        millis: u64,
    },

    /// The asset server answered with something other than 200.
    #[error("Fetching {url} failed with status {status}")]
    Status {
        /// Asset URL
        url: String,
        /// HTTP status code
        status: u16,
    },

    /// The asset server answered 200 with no body.
    #[error("Fetching {url} returned an empty body")]
    EmptyPayload {
        /// Asset URL
        url: String,
    },

    /// Every attempt for an asset failed with a retryable error.
    #[error("Fetching {url} failed after multiple retries ({retries}): {last}")]
    RetriesExhausted {
        /// Asset URL
        url: String,
        /// Number of attempts made
        retries: u32,
        /// The last retryable failure
        last: Box<Error>,
    },

    /// JSON decoding error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A spawned task panicked or was cancelled.
    #[error("Task failed: {0}")]
    Task(#[from] tokio::task::JoinError),

    /// Generic error with message.
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Whether a download attempt failing with this error may be re-issued.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Error::Network { .. } | Error::Timeout { .. })
    }

    /// Wrap any failure as a provider error for `file_id`.
    pub fn provider(file_id: impl Into<String>, message: impl ToString) -> Self {
        Error::Provider {
            file_id: file_id.into(),
            message: message.to_string(),
        }
    }
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        let url = err.url().map(|u| u.to_string()).unwrap_or_default();
        match err.status() {
            Some(status) => Error::Status {
                url,
                status: status.as_u16(),
            },
            None => Error::Network {
                url,
                message: err.to_string(),
            },
        }
    }
}
