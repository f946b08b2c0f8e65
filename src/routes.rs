use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use tower_http::trace::TraceLayer;

use crate::session;
use crate::shared::AppState;
use crate::user;

/// Builds the full application router. Protected routes carry the token
/// middleware per-route so `POST /user` (registration) stays public while
/// `GET`/`DELETE /user` require a live session.
pub fn app(state: AppState) -> Router {
    let auth = middleware::from_fn_with_state(state.clone(), session::token_auth);

    Router::new()
        .route("/users", get(user::list_users))
        .route(
            "/user",
            get(user::get_user)
                .delete(user::delete_user)
                .route_layer(auth.clone())
                .post(user::create_user),
        )
        .route(
            "/user/verify",
            get(user::verify_user).route_layer(auth.clone()),
        )
        .route("/user/isVerified", get(user::is_verified))
        .route(
            "/user/resendVerificationMail",
            get(user::resend_verification_mail),
        )
        .route("/login", post(session::login))
        .route("/logout", get(session::logout).route_layer(auth))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
