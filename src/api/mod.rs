//! HTTP shell around the services: routing, admin session cookies and
//! flash notices. Views are returned as JSON.

pub mod handlers;
pub mod notice;
pub mod session;

use axum::{
    http::{header, HeaderValue},
    middleware,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::set_header::SetResponseHeaderLayer;
use tower_http::trace::TraceLayer;

use crate::{
    database::{repositories::JsonStudentRepository, DataFile},
    services::{AuthService, StudentService},
    utils::config::Config,
};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub auth: Arc<AuthService>,
    pub students: Arc<StudentService>,
    pub data_file: DataFile,
}

impl AppState {
    pub fn new(config: Arc<Config>, auth: AuthService) -> Self {
        let data_file = DataFile::new(config.data_file.clone());
        let repository = Arc::new(JsonStudentRepository::new(data_file.clone()));

        Self {
            auth: Arc::new(auth),
            students: Arc::new(StudentService::new(repository, config)),
            data_file,
        }
    }

    pub fn from_config(config: Arc<Config>) -> anyhow::Result<Self> {
        let auth = AuthService::from_config(&config)?;
        Ok(Self::new(config, auth))
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::listing))
        .route("/login", get(handlers::login_page).post(handlers::login))
        .route("/logout", get(handlers::logout))
        .route("/students", post(handlers::add_student))
        .route(
            "/students/:id",
            get(handlers::edit_page).post(handlers::update_student),
        )
        .route("/students/:id/delete", post(handlers::delete_student))
        .route("/health", get(handlers::health))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            session::session_middleware,
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::CACHE_CONTROL,
            HeaderValue::from_static(
                "no-store, no-cache, must-revalidate, post-check=0, pre-check=0, max-age=0",
            ),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::PRAGMA,
            HeaderValue::from_static("no-cache"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::EXPIRES,
            HeaderValue::from_static("-1"),
        ))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub async fn serve(config: Arc<Config>) -> anyhow::Result<()> {
    let state = AppState::from_config(config.clone())?;

    if !state.data_file.health_check().await? {
        anyhow::bail!(
            "Data file {} is not a valid student list",
            state.data_file.path().display()
        );
    }

    let addr = config.listen_addr();
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Listening on http://{}", addr);

    axum::serve(listener, router(state)).await?;
    Ok(())
}
