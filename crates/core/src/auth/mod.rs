mod api_token;
mod none;
mod traits;
mod types;

pub use api_token::*;
pub use none::*;
pub use traits::*;
pub use types::*;

use crate::config::AuthConfig;

/// Factory function to create authenticator from config.
///
/// An empty token disables authentication.
pub fn create_authenticator(config: &AuthConfig) -> Box<dyn Authenticator> {
    if config.api_token.is_empty() {
        Box::new(NoneAuthenticator::new())
    } else {
        Box::new(ApiTokenAuthenticator::new(config.api_token.clone()))
    }
}
