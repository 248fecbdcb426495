use crate::adapters::{JsonFileStore, MemoryStore, TokioTimeProvider};
use crate::auth as auth_service;
use crate::config;
use crate::ports::push::PushSender;
use crate::ports::store::Store;
use crate::ports::time::TimeProvider;
use crate::push as push_service;
use crate::state;

use axum::Router;
use axum::middleware;
use axum::routing::get;
use axum::routing::post;
use std::sync::Arc;

mod auth;
mod push;

pub fn app(config: config::AppConfig) -> Router {
    let store: Arc<dyn Store> = match config.storage.data_dir.as_ref() {
        Some(dir) => Arc::new(
            JsonFileStore::open(dir)
                .unwrap_or_else(|err| panic!("failed to open data directory: {err}")),
        ),
        None => {
            tracing::warn!("no data directory configured; push state is kept in memory");
            Arc::new(MemoryStore::default())
        }
    };
    let sender = push_service::build_sender(&config);
    let service = push_service::PushService::new(&config, TokioTimeProvider, sender, store)
        .unwrap_or_else(|err| panic!("failed to load push state: {err}"));
    tracing::info!(
        subscriptions = service.subscription_count(),
        "push state loaded"
    );
    router(config, service)
}

pub(crate) fn router<T, S>(
    config: config::AppConfig,
    service: push_service::PushService<T, S>,
) -> Router
where
    T: TimeProvider,
    S: PushSender,
{
    let auth = auth_service::AuthState::from_config(&config)
        .unwrap_or_else(|err| panic!("invalid auth configuration: {err}"));
    let state = state::AppState {
        config,
        auth,
        push: Arc::new(service),
    };
    Router::new()
        .route("/api/send", post(push::send::<T, S>))
        .route("/api/subscribe", post(push::subscribe::<T, S>))
        .route("/api/notifications", get(push::notifications::<T, S>))
        .route("/api/clear", post(push::clear_notifications::<T, S>))
        .route(
            "/api/clear-subscriptions",
            post(push::clear_subscriptions::<T, S>),
        )
        .route("/api/push/public-key", get(push::public_key::<T, S>))
        .route("/health", get(health))
        .with_state(state.clone())
        .layer(middleware::from_fn_with_state(
            state,
            auth::auth_middleware::<T, S>,
        ))
}

pub(crate) async fn health() -> &'static str {
    "ok"
}
