//! # labsched: Laboratory Scheduling Service
//!
//! `labsched` books weekly laboratory slots for a school. A booking ties a course and a section
//! (a cohort of students, e.g. BSIT-1A) to a lab room and an instructor, on one day of the week,
//! within a semester. The service guarantees that no two bookings of the same semester and day
//! overlap in time on the same room, the same section, or the same instructor, and tells
//! instructors about assignments and cancellations through an in-app inbox.
//!
//! ## Architecture
//!
//! The application is built on [Axum](https://github.com/tokio-rs/axum) for the HTTP layer. Data
//! lives either in PostgreSQL (recommended for production) or in process memory (tests and local
//! development), behind the same [`db::Database`] interface.
//!
//! ### Request Flow
//!
//! Requests to `/api/v1/*` arrive from an authenticating proxy that forwards the caller's user id
//! in a header. The [`api::models::users::CurrentUser`] extractor resolves that id to a user and
//! derives their permission set from their roles. Handlers open a unit of work on the database and
//! pass it, together with the resolved actor, to the service functions, which commit it before
//! returning.
//!
//! ### Core Components
//!
//! The **API layer** ([`api`]) exposes RESTful endpoints for schedules, the catalog a schedule
//! references (semesters, courses, sections, lab rooms), users and notifications.
//!
//! The **authentication layer** ([`auth`]) resolves the forwarded identity and maps roles to
//! permissions. Guards check permissions, never role names.
//!
//! The **scheduling core** ([`scheduling`]) holds the overlap rules ([`scheduling::conflicts`])
//! and the create/update/delete flow ([`scheduling::service`]). Writes to one semester and day
//! are serialized by a partition lock taken inside the unit of work, and PostgreSQL exclusion
//! constraints back the check up.
//!
//! The **database layer** ([`db`]) uses the repository pattern. [`db::Database::begin`] opens a
//! [`db::Store`], one unit of work, from which per-entity repositories are borrowed.
//!
//! **Notifications** ([`notifications`]) are enqueued after commit and written by a background
//! worker; a lost notice never fails the request that produced it.
//!
//! ## Configuration
//!
//! Configuration is loaded from a YAML file (default `config.yaml`) and environment variables
//! prefixed with `LABSCHED_`. See [`config`] for every option.
//!
//! ## Getting Started
//!
//! ```bash
//! # Run against the in-memory store
//! labsched
//!
//! # Run against PostgreSQL
//! DATABASE_URL=postgres://localhost/labsched labsched -f config.yaml
//! ```

pub mod api;
pub mod auth;
pub mod config;
pub mod db;
pub mod errors;
pub mod notifications;
mod openapi;
pub mod scheduling;
pub mod telemetry;
pub mod types;
pub mod validation;

#[cfg(test)]
mod test_utils;

use crate::config::{CorsOrigin, DatabaseConfig};
use crate::{
    api::models::users::Role,
    db::errors::DbError,
    db::handlers::Repository,
    db::models::users::{UserCreateDBRequest, UserUpdateDBRequest},
    db::{Database, MemoryDatabase, PgDatabase},
    notifications::{NotificationSink, Notifier},
    openapi::ApiDoc,
};
use axum::http::HeaderValue;
use axum::{
    Json, Router, http,
    routing::{get, put},
};
use bon::Builder;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::{Level, debug, info, instrument, warn};
use utoipa::OpenApi;
use utoipa_scalar::{Scalar, Servable};

pub use config::Config;
pub use errors::{Error, Result};
pub use types::UserId;

/// Shared state handed to every handler.
///
/// - `db`: the configured backend, PostgreSQL or in-memory
/// - `config`: application configuration
/// - `notifier`: where the scheduling service enqueues instructor notices
#[derive(Clone, Builder)]
pub struct AppState {
    pub db: Arc<dyn Database>,
    pub config: Config,
    pub notifier: Arc<dyn NotificationSink>,
}

/// Get the labsched database migrator
pub fn migrator() -> sqlx::migrate::Migrator {
    sqlx::migrate!("./migrations")
}

/// Create the initial administrator if it doesn't exist.
///
/// Idempotent: an existing account with `email` is reactivated and given the
/// `system_administrator` role if it lacks either. Called on startup so there is always someone
/// able to manage users.
#[instrument(skip_all)]
pub async fn create_initial_admin_user(email: &str, db: &dyn Database) -> std::result::Result<UserId, DbError> {
    let mut store = db.begin().await?;

    let existing = store.users().get_user_by_email(email).await?;
    let user_id = match existing {
        Some(user) if user.is_active && user.roles.contains(&Role::SystemAdministrator) => user.id,
        Some(user) => {
            let mut roles = user.roles.clone();
            if !roles.contains(&Role::SystemAdministrator) {
                roles.push(Role::SystemAdministrator);
            }
            let update = UserUpdateDBRequest {
                is_active: Some(true),
                roles: Some(roles),
                ..Default::default()
            };
            store.users().update(user.id, &update).await?;
            info!(user_id = user.id, "Restored administrator access for {}", email);
            user.id
        }
        None => {
            let create = UserCreateDBRequest {
                email: email.to_string(),
                first_name: "System".to_string(),
                last_name: "Administrator".to_string(),
                student_id: None,
                classification: None,
                roles: vec![Role::SystemAdministrator],
            };
            let created = store.users().create(&create).await?;
            info!(user_id = created.id, "Created initial administrator {}", email);
            created.id
        }
    };

    store.commit().await?;
    Ok(user_id)
}

/// Open the configured backend. PostgreSQL migrations run as part of connecting.
#[instrument(skip_all)]
async fn setup_database(config: &Config) -> anyhow::Result<Arc<dyn Database>> {
    let db: Arc<dyn Database> = match &config.database {
        DatabaseConfig::Memory => {
            warn!("Using the in-memory store; all data is lost on restart");
            Arc::new(MemoryDatabase::new())
        }
        DatabaseConfig::External { url, pool } => {
            info!("Connecting to external PostgreSQL database");
            Arc::new(PgDatabase::connect(url, pool).await?)
        }
    };

    create_initial_admin_user(&config.admin_email, db.as_ref()).await?;
    Ok(db)
}

fn create_cors_layer(config: &Config) -> anyhow::Result<CorsLayer> {
    let allow_origin = if config.cors.allowed_origins.contains(&CorsOrigin::Wildcard) {
        if config.cors.allow_credentials {
            anyhow::bail!("cors.allow_credentials cannot be combined with a wildcard origin");
        }
        AllowOrigin::any()
    } else {
        let mut origins = Vec::new();
        for origin in &config.cors.allowed_origins {
            if let CorsOrigin::Url(url) = origin {
                // Url::as_str keeps a trailing slash that browsers never send in Origin
                origins.push(url.as_str().trim_end_matches('/').parse::<HeaderValue>()?);
            }
        }
        AllowOrigin::list(origins)
    };

    let mut cors = CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods([http::Method::GET, http::Method::POST, http::Method::PATCH, http::Method::PUT, http::Method::DELETE])
        .allow_headers([http::header::CONTENT_TYPE])
        .allow_credentials(config.cors.allow_credentials)
        .expose_headers(vec![http::header::LOCATION]);

    if let Some(max_age) = config.cors.max_age {
        cors = cors.max_age(std::time::Duration::from_secs(max_age));
    }

    Ok(cors)
}

/// Build the application router: the `/api/v1` surface, health check, OpenAPI document, CORS and
/// request tracing.
///
/// # Errors
///
/// Returns an error if the CORS configuration holds an origin that is not a valid header value.
#[instrument(skip_all)]
pub fn build_router(state: &AppState) -> anyhow::Result<Router> {
    use api::handlers::{courses, lab_rooms, notifications, schedules, sections, semesters, users};

    let api_routes = Router::new()
        // Schedules
        .route("/schedules", get(schedules::list_schedules).post(schedules::create_schedule))
        .route(
            "/schedules/{id}",
            get(schedules::get_schedule)
                .patch(schedules::update_schedule)
                .delete(schedules::delete_schedule),
        )
        // Catalog
        .route("/semesters", get(semesters::list_semesters).post(semesters::create_semester))
        .route(
            "/semesters/{id}",
            get(semesters::get_semester)
                .patch(semesters::update_semester)
                .delete(semesters::delete_semester),
        )
        .route("/courses", get(courses::list_courses).post(courses::create_course))
        .route(
            "/courses/{id}",
            get(courses::get_course).patch(courses::update_course).delete(courses::delete_course),
        )
        .route("/sections", get(sections::list_sections).post(sections::create_section))
        .route(
            "/sections/{id}",
            get(sections::get_section).patch(sections::update_section).delete(sections::delete_section),
        )
        .route("/lab-rooms", get(lab_rooms::list_lab_rooms).post(lab_rooms::create_lab_room))
        .route(
            "/lab-rooms/{id}",
            get(lab_rooms::get_lab_room)
                .patch(lab_rooms::update_lab_room)
                .delete(lab_rooms::delete_lab_room),
        )
        // Users
        .route("/users", get(users::list_users).post(users::create_user))
        .route("/users/current", get(users::get_current_user))
        .route("/users/{id}", get(users::get_user).patch(users::update_user).delete(users::delete_user))
        // Notification inbox
        .route(
            "/notifications",
            get(notifications::list_notifications).delete(notifications::delete_all_notifications),
        )
        .route("/notifications/count", get(notifications::count_notifications))
        .route("/notifications/read-all", put(notifications::mark_all_notifications_read))
        .route(
            "/notifications/{id}",
            get(notifications::get_notification).delete(notifications::delete_notification),
        )
        .route("/notifications/{id}/read", put(notifications::mark_notification_read))
        .route("/openapi.json", get(|| async { Json(ApiDoc::openapi()) }))
        .with_state(state.clone());

    let router = Router::new()
        .route("/healthz", get(api::handlers::health::healthz))
        .with_state(state.clone())
        .nest("/api/v1", api_routes)
        .merge(Scalar::with_url("/api/docs", ApiDoc::openapi()));

    // Create CORS layer from config
    let cors_layer = create_cors_layer(&state.config)?;
    let router = router.layer(cors_layer);

    // Add tracing layer
    let router = router.layer(
        TraceLayer::new_for_http()
            .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
            .on_request(DefaultOnRequest::new().level(Level::INFO))
            .on_response(DefaultOnResponse::new().level(Level::INFO)),
    );

    Ok(router)
}

/// Main application struct that owns all resources
pub struct Application {
    router: Router,
    app_state: AppState,
    config: Config,
    shutdown_token: CancellationToken,
    notifier_handle: JoinHandle<()>,
}

impl Application {
    /// Create a new application instance with all resources initialized
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        debug!("Starting labsched with configuration: {:#?}", config);

        let db = setup_database(&config).await?;

        // Create a shutdown token for coordinating graceful shutdown of background tasks
        let shutdown_token = CancellationToken::new();
        let (notifier, notifier_handle) = Notifier::spawn(db.clone(), config.notifications.queue_capacity, shutdown_token.clone());

        let app_state = AppState::builder()
            .db(db)
            .config(config.clone())
            .notifier(Arc::new(notifier) as Arc<dyn NotificationSink>)
            .build();
        let router = build_router(&app_state)?;

        Ok(Self {
            router,
            app_state,
            config,
            shutdown_token,
            notifier_handle,
        })
    }

    /// Wrap the router in a test server. The notification worker keeps running in the background.
    #[cfg(test)]
    pub fn into_test_server(self) -> (axum_test::TestServer, AppState) {
        let server = axum_test::TestServer::new(self.router).expect("Failed to create test server");
        (server, self.app_state)
    }

    /// Start serving the application
    pub async fn serve<F>(self, shutdown: F) -> anyhow::Result<()>
    where
        F: std::future::Future<Output = ()> + Send + 'static,
    {
        let bind_addr = self.config.bind_address();
        let listener = TcpListener::bind(&bind_addr).await?;
        info!(
            "labsched listening on http://{}, available at http://localhost:{}",
            bind_addr, self.config.port
        );

        // Run the server with graceful shutdown
        axum::serve(listener, self.router.into_make_service())
            .with_graceful_shutdown(shutdown)
            .await?;

        // Stop the notification writer and wait for it to finish its current write
        info!("Stopping notification writer...");
        self.shutdown_token.cancel();
        if let Err(e) = self.notifier_handle.await {
            warn!("Notification writer ended abnormally: {}", e);
        }

        self.app_state.db.close().await;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{test_app, test_config};
    use axum::http::StatusCode;

    #[test_log::test(tokio::test)]
    async fn test_healthz() {
        let (server, _state) = test_app().await;

        let response = server.get("/healthz").await;
        response.assert_status_ok();
        assert_eq!(response.text(), "OK");
    }

    #[test_log::test(tokio::test)]
    async fn test_openapi_document_lists_schedule_routes() {
        let (server, _state) = test_app().await;

        let response = server.get("/api/v1/openapi.json").await;
        response.assert_status_ok();
        let doc: serde_json::Value = response.json();
        assert_eq!(doc["servers"][0]["url"], "/api/v1");
        assert!(doc["paths"]["/schedules"]["post"].is_object());
        assert!(doc["paths"]["/schedules/{id}"].is_object());
        assert!(doc["components"]["securitySchemes"]["X-Labsched-User"].is_object());
    }

    #[test_log::test(tokio::test)]
    async fn test_api_requires_identity() {
        let (server, _state) = test_app().await;

        let response = server.get("/api/v1/schedules").await;
        assert_eq!(response.status_code(), StatusCode::UNAUTHORIZED);
    }

    #[test_log::test(tokio::test)]
    async fn test_initial_admin_is_created_once() {
        let db = MemoryDatabase::new();

        let first = create_initial_admin_user("admin@example.edu", &db).await.unwrap();
        let second = create_initial_admin_user("admin@example.edu", &db).await.unwrap();
        assert_eq!(first, second);

        let mut store = db.begin().await.unwrap();
        let admin = store.users().get_by_id(first).await.unwrap().unwrap();
        assert!(admin.roles.contains(&Role::SystemAdministrator));
        assert_eq!(admin.full_name(), "System Administrator");
    }

    #[test_log::test(tokio::test)]
    async fn test_initial_admin_restores_role_on_existing_account() {
        let db = MemoryDatabase::new();
        let mut store = db.begin().await.unwrap();
        let user = store
            .users()
            .create(&UserCreateDBRequest {
                email: "admin@example.edu".to_string(),
                first_name: "Ada".to_string(),
                last_name: "Reyes".to_string(),
                student_id: None,
                classification: None,
                roles: vec![Role::FacultyStaff],
            })
            .await
            .unwrap();
        store.commit().await.unwrap();

        let id = create_initial_admin_user("admin@example.edu", &db).await.unwrap();
        assert_eq!(id, user.id);

        let mut store = db.begin().await.unwrap();
        let admin = store.users().get_by_id(id).await.unwrap().unwrap();
        assert!(admin.roles.contains(&Role::SystemAdministrator));
        assert!(admin.roles.contains(&Role::FacultyStaff));
    }

    #[test]
    fn test_migrations_create_each_type_once() {
        let mut types = std::collections::HashSet::new();
        for migration in migrator().iter() {
            for line in migration.sql.lines() {
                if let Some(rest) = line.trim().strip_prefix("CREATE TYPE ") {
                    let name = rest.split_whitespace().next().unwrap_or_default().to_string();
                    assert!(types.insert(name.clone()), "type {name} is created twice");
                }
            }
        }
        assert!(types.contains("timerange"));
        assert!(types.contains("day_of_week"));
    }

    #[test]
    fn test_cors_layer_accepts_configured_origins() {
        let mut config = test_config();
        config.cors.allowed_origins = vec![
            CorsOrigin::Url(url::Url::parse("https://scheduling.example.edu").unwrap()),
            CorsOrigin::Url(url::Url::parse("http://localhost:5173").unwrap()),
        ];
        assert!(create_cors_layer(&config).is_ok());
    }

    #[test_log::test(tokio::test)]
    async fn test_cors_preflight_allows_configured_origin() {
        let mut config = test_config();
        config.cors.allowed_origins = vec![CorsOrigin::Url(url::Url::parse("https://scheduling.example.edu").unwrap())];
        let (server, _state) = Application::new(config).await.unwrap().into_test_server();

        let response = server
            .method(http::Method::OPTIONS, "/api/v1/schedules")
            .add_header("origin", "https://scheduling.example.edu")
            .add_header("access-control-request-method", "POST")
            .await;
        assert_eq!(
            response.headers().get("access-control-allow-origin").unwrap(),
            "https://scheduling.example.edu"
        );
    }
}
