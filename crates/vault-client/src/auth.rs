use crate::error::VaultError;
use reqwest::header::{HeaderMap, HeaderValue};

/// The header Vault reads the client token from.
pub const TOKEN_HEADER: &str = "X-Vault-Token";

/// Builds the default headers that authenticate every request.
///
/// The header value is marked sensitive so it is masked if the headers are
/// ever printed.
pub fn token_headers(token: &str) -> Result<HeaderMap, VaultError> {
    let mut value = HeaderValue::from_str(token)
        .map_err(|_| VaultError::InvalidToken("token contains characters not allowed in an HTTP header".to_string()))?;
    value.set_sensitive(true);

    let mut headers = HeaderMap::new();
    headers.insert(TOKEN_HEADER, value);
    Ok(headers)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_header_is_sensitive() {
        let headers = token_headers("s.abc123").unwrap();
        let value = headers.get(TOKEN_HEADER).unwrap();
        assert_eq!(value, "s.abc123");
        assert!(value.is_sensitive());
    }

    #[test]
    fn rejects_tokens_with_newlines() {
        assert!(matches!(token_headers("bad\ntoken"), Err(VaultError::InvalidToken(_))));
    }
}
