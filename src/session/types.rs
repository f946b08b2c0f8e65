use serde::{Deserialize, Serialize};

/// JWT claims carried by every bearer token. The token is only a
/// tamper-evident pointer; the session row it references is what makes it
/// valid.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SessionClaims {
    pub email: String,
    pub session_id: String,
    pub iss: String,
    pub exp: usize, // Expiration timestamp (standard JWT claim)
    pub iat: usize, // Issued at timestamp (standard JWT claim)
}

/// Authenticated identity inserted into request extensions by the auth
/// middleware. Handlers must take identity from here, never from request
/// fields.
#[derive(Debug, Clone, PartialEq)]
pub struct AuthedUser {
    pub email: String,
    pub session_id: String,
}

/// Response structure for the login endpoint
#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct LoginResponse {
    pub login: String,
    pub token_string: String,
}
