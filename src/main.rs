use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use userauth::config::AppConfig;
use userauth::mail::SmtpMailer;
use userauth::routes;
use userauth::session::repository::PostgresSessionRepository;
use userauth::session::token::TokenConfig;
use userauth::shared::AppState;
use userauth::user::repository::PostgresUserRepository;

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "userauth=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting user authentication server");

    // All required configuration up front, or don't start at all
    let config = AppConfig::from_env().unwrap_or_else(|e| {
        eprintln!("refusing to start: {}", e);
        std::process::exit(1);
    });

    let pool = sqlx::PgPool::connect(&config.database_url)
        .await
        .expect("Failed to connect to database");
    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("Failed to run database migrations");

    let mailer = SmtpMailer::new(&config.smtp).unwrap_or_else(|e| {
        eprintln!("refusing to start: {}", e);
        std::process::exit(1);
    });

    // Create shared application state with dependency injection
    let app_state = AppState::new(
        Arc::new(PostgresUserRepository::new(pool.clone())),
        Arc::new(PostgresSessionRepository::new(pool)),
        TokenConfig::new(config.jwt_secret.clone(), config.session_expiration_days),
        Arc::new(mailer),
        config.backend_url.clone(),
    );

    let app = routes::app(app_state);

    let listener = tokio::net::TcpListener::bind(&config.listen_addr)
        .await
        .unwrap();
    info!("Server running on http://{}", config.listen_addr);
    axum::serve(listener, app).await.unwrap();
}
