//! Lookup error types.
//!
//! Library modules return [`Result`] with a [`LookupError`]; the CLI wraps
//! everything in `anyhow` for convenient propagation.
//!
//! # Taxonomy
//!
//! - [`LookupError::Provider`]: scoped to one provider (conversion failures,
//!   unsupported operations)
//! - [`LookupError::Response`]: a provider error for a structurally invalid
//!   response, carrying the offending URL
//! - [`LookupError::CacheMiss`]: a snapshot ceiling could not be satisfied
//!   and live data was not allowed
//! - [`LookupError::Compatibility`]: providers disagree on a field that must
//!   have exactly one value

use std::fmt::Write as _;

/// Result type used throughout the lookup engine.
pub type Result<T> = std::result::Result<T, LookupError>;

/// Anything that breaks a lookup.
#[derive(Debug, thiserror::Error)]
pub enum LookupError {
    /// Error scoped to a single provider
    #[error("{provider}: {message}")]
    Provider { provider: String, message: String },

    /// The response for `url` does not have the expected shape
    #[error("{provider}: invalid response for {url}: {message}")]
    Response {
        provider: String,
        url: String,
        message: String,
    },

    /// Nothing matched the lookup in any region
    #[error("{provider}: {message}")]
    NotFound { provider: String, message: String },

    /// No snapshot at or before the requested ceiling
    #[error("No snapshot of {url} available at or before {max_timestamp}")]
    CacheMiss { url: String, max_timestamp: i64 },

    /// Providers report mutually exclusive values for one field
    #[error("Providers disagree on {field}: {}", describe_values(.values))]
    Compatibility {
        field: String,
        /// (value, names of the providers that reported it)
        values: Vec<(String, Vec<String>)>,
    },

    /// Malformed user input (GTIN, region, timestamp, URL)
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Transport failure (connection, timeout)
    #[error("Network error: {0}")]
    Network(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Error with additional context
    #[error("{context}: {source}")]
    WithContext {
        context: String,
        #[source]
        source: Box<LookupError>,
    },
}

fn describe_values(values: &[(String, Vec<String>)]) -> String {
    let mut out = String::new();
    for (index, (value, providers)) in values.iter().enumerate() {
        if index > 0 {
            out.push_str(", ");
        }
        let _ = write!(out, "\"{}\" ({})", value, providers.join(", "));
    }
    out
}

impl LookupError {
    /// Create a provider-scoped error.
    pub fn provider(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Provider {
            provider: provider.into(),
            message: message.into(),
        }
    }

    /// Create an invalid response error.
    pub fn response(
        provider: impl Into<String>,
        url: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::Response {
            provider: provider.into(),
            url: url.into(),
            message: message.into(),
        }
    }

    /// Create a not found error.
    pub fn not_found(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self::NotFound {
            provider: provider.into(),
            message: message.into(),
        }
    }

    /// Create an invalid input error.
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput(message.into())
    }

    /// Name of the provider this error is scoped to, if any.
    pub fn provider_name(&self) -> Option<&str> {
        match self {
            Self::Provider { provider, .. }
            | Self::Response { provider, .. }
            | Self::NotFound { provider, .. } => Some(provider),
            Self::WithContext { source, .. } => source.provider_name(),
            _ => None,
        }
    }

    /// Whether a snapshot ceiling could not be satisfied.
    pub fn is_cache_miss(&self) -> bool {
        match self {
            Self::CacheMiss { .. } => true,
            Self::WithContext { source, .. } => source.is_cache_miss(),
            _ => false,
        }
    }

    /// Add context to an error.
    pub fn context(self, ctx: impl Into<String>) -> Self {
        Self::WithContext {
            context: ctx.into(),
            source: Box::new(self),
        }
    }
}

/// Extension trait for adding context to Results.
pub trait ResultExt<T> {
    /// Add context to an error result.
    fn with_context(self, ctx: impl Into<String>) -> Result<T>;
}

impl<T> ResultExt<T> for Result<T> {
    fn with_context(self, ctx: impl Into<String>) -> Result<T> {
        self.map_err(|e| e.context(ctx))
    }
}

impl<T> ResultExt<T> for std::result::Result<T, std::io::Error> {
    fn with_context(self, ctx: impl Into<String>) -> Result<T> {
        self.map_err(|e| LookupError::Io(e).context(ctx))
    }
}
