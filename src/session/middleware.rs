use axum::{
    extract::{Request, State},
    http::header::AUTHORIZATION,
    middleware::Next,
    response::Response,
};
use tracing::{debug, instrument, warn};

use super::repository::SessionRepository;
use super::types::AuthedUser;
use crate::shared::{AppError, AppState};

/// Bearer-token authentication middleware.
/// Usage: .route_layer(middleware::from_fn_with_state(app_state.clone(), session::token_auth))
///
/// Two checks must both pass before the wrapped handler runs: the token's
/// signature verifies, and the session it references is still in the store.
/// A signed token whose session was revoked is rejected. Handlers extract
/// Extension(caller): Extension<AuthedUser> for the authenticated identity.
#[instrument(skip(state, req, next))]
pub async fn token_auth(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    debug!(uri = %req.uri(), "Authentication middleware triggered");

    let token = extract_token(&req).ok_or_else(|| {
        warn!("No token in request");
        AppError::Unauthorized("token not provided".to_string())
    })?;

    let claims = match state.token_config.verify(&token) {
        Ok(claims) => claims,
        Err(e) => {
            warn!("Token verification failed: {}", e);
            return Err(e);
        }
    };

    // Signature alone is not enough; the referenced session must be live
    let live = state
        .session_repository
        .session_exists(&claims.email, &claims.session_id)
        .await?;
    if !live {
        warn!(
            email = %claims.email,
            session_id = %claims.session_id,
            "Token references a revoked or unknown session"
        );
        return Err(AppError::Unauthorized("invalid token".to_string()));
    }

    debug!(
        email = %claims.email,
        session_id = %claims.session_id,
        "Authentication successful, adding identity to request"
    );

    req.extensions_mut().insert(AuthedUser {
        email: claims.email,
        session_id: claims.session_id,
    });

    Ok(next.run(req).await)
}

/// Pulls the bearer token out of a request: the `token` query parameter
/// wins (email-verification links), otherwise the first token after the
/// scheme word in the Authorization header.
fn extract_token(req: &Request) -> Option<String> {
    if let Some(query) = req.uri().query() {
        if let Some(token) = query
            .split('&')
            .find_map(|pair| pair.strip_prefix("token="))
        {
            if !token.is_empty() {
                return Some(token.to_string());
            }
        }
    }

    let header = req.headers().get(AUTHORIZATION)?.to_str().ok()?;
    let mut parts = header.split_whitespace();
    let _scheme = parts.next();
    parts.next().map(|token| token.to_string())
}
