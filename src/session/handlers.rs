use axum::{extract::State, http::StatusCode, Extension, Json};
use serde_json::json;
use std::sync::Arc;
use tracing::{info, instrument};

use super::{
    service::SessionService,
    types::{AuthedUser, LoginResponse},
};
use crate::shared::{AppError, AppState};
use crate::user::{service::UserService, types::LoginRequest};

/// HTTP handler for logging in
///
/// POST /login
/// Returns 202 with a bearer token for a fresh session
#[instrument(name = "login", skip(state, request))]
pub async fn login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> Result<(StatusCode, Json<LoginResponse>), AppError> {
    let users = UserService::new(Arc::clone(&state.user_repository));
    users.authenticate(&request.email, &request.password).await?;

    let sessions = SessionService::new(
        Arc::clone(&state.session_repository),
        state.token_config.clone(),
    );
    let token = sessions.open_session(&request.email).await?;

    info!(email = %request.email, "Login successful");

    Ok((
        StatusCode::ACCEPTED,
        Json(LoginResponse {
            login: "successful".to_string(),
            token_string: token,
        }),
    ))
}

/// HTTP handler for logging out the calling session
///
/// GET /logout (bearer)
/// Revokes only the session referenced by the presented token
#[instrument(name = "logout", skip(state))]
pub async fn logout(
    State(state): State<AppState>,
    Extension(caller): Extension<AuthedUser>,
) -> Result<(StatusCode, Json<serde_json::Value>), AppError> {
    let sessions = SessionService::new(
        Arc::clone(&state.session_repository),
        state.token_config.clone(),
    );
    sessions.revoke(&caller.email, &caller.session_id).await?;

    info!(email = %caller.email, "Logout successful");

    Ok((
        StatusCode::ACCEPTED,
        Json(json!({ "logged_out": "successfully" })),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::middleware::token_auth;
    use crate::shared::test_utils::AppStateBuilder;
    use crate::user::repository::{InMemoryUserRepository, UserRepository};
    use crate::user::types::CreateUserRequest;
    use axum::{
        body::Body,
        http::{Request, StatusCode},
        middleware,
        routing::{get, post},
        Router,
    };
    use tower::ServiceExt; // for `oneshot`

    fn app(state: AppState) -> Router {
        Router::new()
            .route("/login", post(login))
            .route(
                "/logout",
                get(logout).route_layer(middleware::from_fn_with_state(
                    state.clone(),
                    token_auth,
                )),
            )
            .with_state(state)
    }

    /// Registers a user straight through the service layer
    async fn seed_user(state: &AppState, email: &str, password: &str, verified: bool) {
        let users = UserService::new(Arc::clone(&state.user_repository));
        users
            .register(CreateUserRequest {
                email: email.to_string(),
                username: "ayla".to_string(),
                first_name: "Ayla".to_string(),
                last_name: "Xu".to_string(),
                password: password.to_string(),
                date_of_birth: "01-02-1990".to_string(),
            })
            .await
            .unwrap();
        if verified {
            state.user_repository.set_verified(email).await.unwrap();
        }
    }

    fn login_request(email: &str, password: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/login")
            .header("content-type", "application/json")
            .body(Body::from(
                json!({ "email": email, "password": password }).to_string(),
            ))
            .unwrap()
    }

    #[tokio::test]
    async fn test_login_success_returns_202_and_token() {
        let state = AppStateBuilder::new()
            .with_user_repository(Arc::new(InMemoryUserRepository::new()))
            .build();
        seed_user(&state, "a@x.com", "p", true).await;
        let app = app(state);

        let response = app.oneshot(login_request("a@x.com", "p")).await.unwrap();
        assert_eq!(response.status(), StatusCode::ACCEPTED);

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let login_response: LoginResponse = serde_json::from_slice(&body).unwrap();
        assert_eq!(login_response.login, "successful");
        assert!(login_response.token_string.contains('.')); // JWT has dots
    }

    #[tokio::test]
    async fn test_login_unverified_account_rejected() {
        let state = AppStateBuilder::new().build();
        seed_user(&state, "a@x.com", "p", false).await;
        let app = app(state);

        let response = app.oneshot(login_request("a@x.com", "p")).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let error: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(error["error"], "email not verified");
    }

    #[tokio::test]
    async fn test_login_failures_share_one_message() {
        let state = AppStateBuilder::new().build();
        seed_user(&state, "a@x.com", "p", true).await;
        let app = app(state);

        let wrong_password = app
            .clone()
            .oneshot(login_request("a@x.com", "q"))
            .await
            .unwrap();
        let unknown_email = app
            .oneshot(login_request("nobody@x.com", "p"))
            .await
            .unwrap();

        assert_eq!(wrong_password.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(unknown_email.status(), StatusCode::UNAUTHORIZED);

        let first = axum::body::to_bytes(wrong_password.into_body(), usize::MAX)
            .await
            .unwrap();
        let second = axum::body::to_bytes(unknown_email.into_body(), usize::MAX)
            .await
            .unwrap();
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_logout_revokes_only_the_calling_session() {
        let state = AppStateBuilder::new().build();
        seed_user(&state, "a@x.com", "p", true).await;
        let sessions = SessionService::new(
            Arc::clone(&state.session_repository),
            state.token_config.clone(),
        );
        let first = sessions.open_session("a@x.com").await.unwrap();
        let second = sessions.open_session("a@x.com").await.unwrap();
        let app = app(state.clone());

        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .method("GET")
                    .uri("/logout")
                    .header("Authorization", format!("Bearer {}", first))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::ACCEPTED);

        // The first token is now dead, the second still works
        let replay = app
            .clone()
            .oneshot(
                Request::builder()
                    .method("GET")
                    .uri("/logout")
                    .header("Authorization", format!("Bearer {}", first))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(replay.status(), StatusCode::UNAUTHORIZED);

        let other = app
            .oneshot(
                Request::builder()
                    .method("GET")
                    .uri("/logout")
                    .header("Authorization", format!("Bearer {}", second))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(other.status(), StatusCode::ACCEPTED);
    }

    #[tokio::test]
    async fn test_logout_without_token_is_401() {
        let state = AppStateBuilder::new().build();
        let app = app(state);

        let response = app
            .oneshot(
                Request::builder()
                    .method("GET")
                    .uri("/logout")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }
}
