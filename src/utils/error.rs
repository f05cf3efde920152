//! Error types for Strix

use thiserror::Error;

/// Main error type for Strix operations
#[derive(Debug, Error)]
pub enum StrixError {
    /// Malformed CSS selector
    #[error("invalid selector `{0}`")]
    Selector(String),

    /// Malformed or unsupported XPath expression
    #[error("invalid xpath `{0}`")]
    XPath(String),

    /// JavaScript execution error
    #[error("script error: {0}")]
    Script(String),

    /// Form submission error
    #[error("form error: {0}")]
    Form(String),

    /// A node handle that does not belong to the document
    #[error("node is not attached to this document")]
    DetachedNode,

    /// No element matched a lookup
    #[error("no element found for {0}")]
    NotFound(String),

    /// Invalid URL in an href, form action, or base
    #[error("invalid URL: {0}")]
    Url(#[from] url::ParseError),
}

/// Convenience Result type for Strix operations
pub type Result<T> = std::result::Result<T, StrixError>;
