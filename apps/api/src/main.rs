//! Fusionboard API composition root.

#![forbid(unsafe_code)]

mod auth;
mod dto;
mod error;
mod handlers;
mod middleware;
mod state;

use std::env;
use std::net::{IpAddr, SocketAddr};
use std::str::FromStr;
use std::sync::Arc;

use axum::Router;
use axum::http::header::CONTENT_TYPE;
use axum::http::{HeaderValue, Method};
use axum::middleware::from_fn_with_state;
use axum::routing::{delete, get, post, put};
use fusionboard_application::{AuthorizationService, ProjectService, TaskService, UserService};
use fusionboard_core::AppError;
use fusionboard_domain::RoleGrants;
use fusionboard_infrastructure::{
    Argon2PasswordHasher, PostgresMembershipRepository, PostgresProjectRepository,
    PostgresTaskRepository, PostgresTenantRepository, PostgresUserRepository,
};
use sqlx::postgres::PgPoolOptions;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tower_sessions::cookie::SameSite;
use tower_sessions::cookie::time::Duration;
use tower_sessions::{Expiry, SessionManagerLayer};
use tower_sessions_sqlx_store::PostgresStore;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<(), AppError> {
    dotenvy::dotenv().ok();
    init_tracing();

    let migrate_only = env::args().nth(1).as_deref() == Some("migrate");

    let database_url = required_env("DATABASE_URL")?;
    let frontend_url =
        env::var("FRONTEND_URL").unwrap_or_else(|_| "http://localhost:3000".to_owned());
    let api_host = env::var("API_HOST").unwrap_or_else(|_| "127.0.0.1".to_owned());
    let api_port = env::var("API_PORT")
        .ok()
        .and_then(|value| value.parse::<u16>().ok())
        .unwrap_or(3001);
    let cookie_secure = env::var("SESSION_COOKIE_SECURE")
        .unwrap_or_else(|_| "false".to_owned())
        .eq_ignore_ascii_case("true");

    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(&database_url)
        .await
        .map_err(|error| AppError::Internal(format!("failed to connect to database: {error}")))?;

    sqlx::migrate!("../../crates/infrastructure/migrations")
        .run(&pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to run migrations: {error}")))?;

    if migrate_only {
        info!("database migrations applied successfully");
        return Ok(());
    }

    let session_store = PostgresStore::new(pool.clone())
        .with_table_name("tower_sessions")
        .map_err(|error| {
            AppError::Validation(format!("invalid session table name configuration: {error}"))
        })?;
    session_store.migrate().await.map_err(|error| {
        AppError::Internal(format!("failed to initialize session store: {error}"))
    })?;

    let session_layer = SessionManagerLayer::new(session_store)
        .with_secure(cookie_secure)
        .with_same_site(SameSite::Lax)
        .with_http_only(true)
        .with_expiry(Expiry::OnInactivity(Duration::minutes(30)));

    // The role table is immutable configuration, built once and shared.
    let role_grants = Arc::new(RoleGrants::standard());
    let membership_repository = Arc::new(PostgresMembershipRepository::new(pool.clone()));
    let authorization_service = AuthorizationService::new(role_grants, membership_repository);

    let user_repository = Arc::new(PostgresUserRepository::new(pool.clone()));
    let tenant_repository = Arc::new(PostgresTenantRepository::new(pool.clone()));
    let password_hasher = Arc::new(Argon2PasswordHasher::new());
    let user_service = UserService::new(
        authorization_service.clone(),
        user_repository.clone(),
        tenant_repository,
        password_hasher,
    );

    let project_repository = Arc::new(PostgresProjectRepository::new(pool.clone()));
    let project_service = ProjectService::new(
        authorization_service.clone(),
        project_repository.clone(),
        user_repository,
    );

    let task_repository = Arc::new(PostgresTaskRepository::new(pool.clone()));
    let task_service = TaskService::new(
        authorization_service.clone(),
        task_repository,
        project_repository,
    );

    let app_state = AppState {
        authorization_service,
        user_service,
        project_service,
        task_service,
        frontend_url: frontend_url.clone(),
    };

    bootstrap_system_admin(&app_state).await?;

    let protected_routes = Router::new()
        .route("/auth/me", get(auth::me_handler))
        .route(
            "/api/users",
            get(handlers::users::list_users_handler).post(handlers::users::create_user_handler),
        )
        .route(
            "/api/users/{user_id}",
            delete(handlers::users::delete_user_handler),
        )
        .route(
            "/api/projects",
            get(handlers::projects::list_projects_handler)
                .post(handlers::projects::create_project_handler),
        )
        .route(
            "/api/projects/{project_id}",
            put(handlers::projects::update_project_handler)
                .delete(handlers::projects::delete_project_handler),
        )
        .route(
            "/api/projects/{project_id}/members",
            post(handlers::projects::invite_member_handler),
        )
        .route(
            "/api/projects/{project_id}/members/{user_id}/role",
            put(handlers::projects::change_member_role_handler),
        )
        .route(
            "/api/projects/{project_id}/tasks",
            get(handlers::tasks::list_tasks_handler).post(handlers::tasks::create_task_handler),
        )
        .route(
            "/api/tasks/{task_id}",
            put(handlers::tasks::update_task_handler).delete(handlers::tasks::delete_task_handler),
        )
        .route(
            "/api/tasks/{task_id}/status",
            put(handlers::tasks::change_task_status_handler),
        )
        .route_layer(from_fn_with_state(
            app_state.clone(),
            middleware::require_auth,
        ));

    let cors_layer = CorsLayer::new()
        .allow_origin(
            HeaderValue::from_str(&frontend_url)
                .map_err(|error| AppError::Internal(format!("invalid FRONTEND_URL: {error}")))?,
        )
        .allow_credentials(true)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([CONTENT_TYPE]);

    let app = Router::new()
        .route("/health", get(handlers::health::health_handler))
        .route("/auth/register", post(auth::register_handler))
        .route("/auth/login", post(auth::login_handler))
        .route("/auth/logout", post(auth::logout_handler))
        .merge(protected_routes)
        .route_layer(from_fn_with_state(
            app_state.clone(),
            middleware::require_same_origin_for_mutations,
        ))
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer)
        .layer(session_layer)
        .with_state(app_state);

    let host = IpAddr::from_str(&api_host)
        .map_err(|error| AppError::Internal(format!("invalid API_HOST '{api_host}': {error}")))?;
    let address = SocketAddr::from((host, api_port));

    let listener = tokio::net::TcpListener::bind(address)
        .await
        .map_err(|error| AppError::Internal(format!("failed to bind listener: {error}")))?;

    info!(%address, "fusionboard-api listening");

    axum::serve(listener, app)
        .await
        .map_err(|error| AppError::Internal(format!("api server error: {error}")))
}

/// Seeds the bootstrap system administrator when credentials are configured.
async fn bootstrap_system_admin(state: &AppState) -> Result<(), AppError> {
    let email = env::var("BOOTSTRAP_ADMIN_EMAIL").ok();
    let password = env::var("BOOTSTRAP_ADMIN_PASSWORD").ok();

    match (email, password) {
        (Some(email), Some(password)) => {
            let admin = state
                .user_service
                .bootstrap_system_admin(&email, &password)
                .await?;
            info!(user_id = %admin.id, "bootstrap system administrator ready");
        }
        _ => {
            info!("bootstrap admin credentials not configured; skipping seed");
        }
    }

    Ok(())
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .compact()
        .init();
}

fn required_env(name: &str) -> Result<String, AppError> {
    env::var(name).map_err(|_| AppError::Validation(format!("{name} is required")))
}
