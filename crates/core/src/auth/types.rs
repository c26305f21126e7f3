use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Request information for authentication
#[derive(Debug, Clone, Default)]
pub struct AuthRequest {
    /// Header names are lowercased.
    pub headers: HashMap<String, String>,
    pub query: HashMap<String, String>,
}

/// Authenticated identity
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub user_id: String,
    pub method: String,
}

impl Identity {
    pub fn anonymous() -> Self {
        Self {
            user_id: "anonymous".to_string(),
            method: "none".to_string(),
        }
    }
}
