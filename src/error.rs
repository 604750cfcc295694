//! Error types for Magento API operations.

use thiserror::Error;

/// Errors that can occur during Magento API operations.
///
/// The variants form a closed taxonomy. Entity operations may wrap an
/// underlying error in [`MagentoError::Context`]; use [`MagentoError::root`]
/// (or the `is_*` helpers) to inspect the original outcome:
///
/// ```
/// use m2rest::MagentoError;
///
/// let err = MagentoError::NotFound.context("get product by SKU");
/// assert!(matches!(err.root(), MagentoError::NotFound));
/// assert!(err.is_not_found());
/// ```
#[derive(Debug, Error)]
pub enum MagentoError {
    /// The remote resource does not exist (HTTP 404 or an empty search).
    #[error("resource not found")]
    NotFound,

    /// The API answered with an error status other than 404.
    #[error("error while trying to {operation}: bad request (status {status}): {body}")]
    BadRequest {
        operation: String,
        status: u16,
        body: String,
    },

    /// A cart item could not be added because its SKU does not resolve.
    #[error("cart item not found (sku '{sku}', item id {item_id:?})")]
    ItemNotFound { item_id: Option<u64>, sku: String },

    /// The library was used in a way that can never succeed.
    #[error("invalid usage: {0}")]
    InvalidUsage(String),

    /// The caller cancelled the operation.
    #[error("request cancelled")]
    Cancelled,

    /// The request did not complete within the client timeout.
    #[error("request timed out")]
    Timeout,

    /// The token endpoint rejected the supplied credentials.
    #[error("authentication failed with status {status}: {body}")]
    Authentication { status: u16, body: String },

    /// A successful response did not have the expected shape.
    #[error("unexpected response while trying to {operation}: {body}")]
    UnexpectedResponse { operation: String, body: String },

    /// Configuration is missing or incomplete.
    #[error("Magento configuration required: {0}")]
    ConfigMissing(String),

    /// An error annotated with the operation that was attempted.
    #[error("{context}: {source}")]
    Context {
        context: String,
        #[source]
        source: Box<MagentoError>,
    },

    /// HTTP transport error.
    #[error("HTTP error: {0}")]
    HttpError(#[from] reqwest::Error),

    /// JSON parsing error.
    #[error("Failed to parse response: {0}")]
    ParseError(#[from] serde_json::Error),

    /// URL parsing error.
    #[error("Invalid URL: {0}")]
    UrlError(#[from] url::ParseError),

    /// File I/O error (bulk tooling).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// CSV read/write error (bulk tooling).
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

impl MagentoError {
    /// Wrap this error with a description of the attempted operation.
    #[must_use]
    pub fn context(self, context: impl Into<String>) -> Self {
        Self::Context {
            context: context.into(),
            source: Box::new(self),
        }
    }

    /// The innermost error, with all [`MagentoError::Context`] layers removed.
    pub fn root(&self) -> &Self {
        let mut current = self;
        while let Self::Context { source, .. } = current {
            current = source;
        }
        current
    }

    /// Returns true if the root cause is [`MagentoError::NotFound`].
    pub fn is_not_found(&self) -> bool {
        matches!(self.root(), Self::NotFound)
    }

    /// Returns true if the root cause is [`MagentoError::Cancelled`].
    pub fn is_cancelled(&self) -> bool {
        matches!(self.root(), Self::Cancelled)
    }

    /// The HTTP status carried by the root cause, if any.
    pub fn status(&self) -> Option<u16> {
        match self.root() {
            Self::NotFound => Some(404),
            Self::BadRequest { status, .. } | Self::Authentication { status, .. } => {
                Some(*status)
            }
            Self::HttpError(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}

/// Result type alias for Magento operations.
pub type Result<T> = core::result::Result<T, MagentoError>;

/// Extension for annotating fallible results with an operation description.
pub trait ResultExt<T> {
    /// Wrap the error (if any) in [`MagentoError::Context`].
    fn context(self, context: impl Into<String>) -> Result<T>;
}

impl<T> ResultExt<T> for Result<T> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| e.context(context))
    }
}
