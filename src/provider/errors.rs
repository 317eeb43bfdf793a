use thiserror::Error;

/// Errors returned by a [`QuoteProvider`](super::QuoteProvider)
#[derive(Debug, Error)]
pub enum ProviderError {
    /// The HTTP client could not be constructed
    #[error("Client error: {0}")]
    Client(String),

    /// Transport failure or unexpected HTTP status
    #[error("Request failed for {symbol}: {message}")]
    Request { symbol: String, message: String },

    /// Cookie/crumb handshake failed or was rejected
    #[error("Authentication failed: {0}")]
    Auth(String),

    /// The provider does not know the symbol
    #[error("Symbol not found: {0}")]
    SymbolNotFound(String),

    /// The response body did not have the expected shape
    #[error("Invalid response for {symbol}: {message}")]
    InvalidResponse { symbol: String, message: String },
}

impl ProviderError {
    /// Returns true if retrying the same request later could succeed
    pub fn is_transient(&self) -> bool {
        matches!(self, ProviderError::Request { .. } | ProviderError::Auth(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ProviderError::Request {
            symbol: "AAPL".to_string(),
            message: "HTTP 500".to_string(),
        };
        assert_eq!(err.to_string(), "Request failed for AAPL: HTTP 500");
        assert!(err.is_transient());
        assert!(!ProviderError::SymbolNotFound("ZZZZ".to_string()).is_transient());
    }
}
