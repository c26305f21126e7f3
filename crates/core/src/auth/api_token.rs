//! API token authentication.

use async_trait::async_trait;

use super::{AuthError, AuthRequest, Authenticator, Identity};

/// Authenticator that validates requests against the configured API token.
///
/// Accepts the token in either:
/// - `X-API-Token: <token>` header
/// - `?apikey=<token>` query parameter
pub struct ApiTokenAuthenticator {
    expected_token: String,
}

impl ApiTokenAuthenticator {
    pub fn new(api_token: String) -> Self {
        Self {
            expected_token: api_token,
        }
    }

    /// Extract the token, preferring the header over the query string.
    ///
    /// An empty header does not count as a token.
    fn extract_token<'a>(&self, request: &'a AuthRequest) -> Option<&'a str> {
        request
            .headers
            .get("x-api-token")
            .filter(|token| !token.is_empty())
            .or_else(|| request.query.get("apikey"))
            .map(String::as_str)
    }
}

#[async_trait]
impl Authenticator for ApiTokenAuthenticator {
    async fn authenticate(&self, request: &AuthRequest) -> Result<Identity, AuthError> {
        let provided = self
            .extract_token(request)
            .ok_or(AuthError::NotAuthenticated)?;

        // Constant-time comparison to prevent timing attacks
        if constant_time_eq(provided.as_bytes(), self.expected_token.as_bytes()) {
            Ok(Identity {
                user_id: "api_token_user".to_string(),
                method: "api_token".to_string(),
            })
        } else {
            Err(AuthError::InvalidCredentials("Invalid API token".to_string()))
        }
    }

    fn method_name(&self) -> &'static str {
        "api_token"
    }
}

/// Constant-time byte comparison to prevent timing attacks.
fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }

    let mut result = 0u8;
    for (x, y) in a.iter().zip(b.iter()) {
        result |= x ^ y;
    }
    result == 0
}
