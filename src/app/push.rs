use crate::error::PushError;
use crate::ports::push::PushSender;
use crate::ports::time::TimeProvider;
use crate::push as push_service;
use crate::state;
use crate::types::push::Notification;

use axum::Json;
use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

#[derive(Serialize)]
pub(crate) struct ErrorResponse {
    pub(crate) error: String,
}

impl IntoResponse for PushError {
    fn into_response(self) -> Response {
        let status = match &self {
            PushError::InvalidInput(_) | PushError::InvalidOption(_) => StatusCode::BAD_REQUEST,
            PushError::CapacityExceeded { .. } => StatusCode::TOO_MANY_REQUESTS,
            PushError::Unauthorized => StatusCode::UNAUTHORIZED,
            PushError::Configuration(_) => StatusCode::SERVICE_UNAVAILABLE,
            PushError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        let error = match &self {
            PushError::Storage(err) => {
                tracing::error!("push storage error: {err}");
                "Failed to access push storage.".to_string()
            }
            other => other.to_string(),
        };
        (status, Json(ErrorResponse { error })).into_response()
    }
}

// Bodies that are not JSON, or whose fields have the wrong type, are caller errors.
fn invalid_body(rejection: JsonRejection) -> PushError {
    PushError::InvalidInput(rejection.body_text())
}

pub(crate) async fn send<T, S>(
    State(state): State<state::AppState<T, S>>,
    request: Result<Json<push_service::SendRequest>, JsonRejection>,
) -> Result<Json<push_service::SendReport>, PushError>
where
    T: TimeProvider,
    S: PushSender,
{
    let Json(request) = request.map_err(invalid_body)?;
    let report = state.push.send(request).await?;
    Ok(Json(report))
}

#[derive(Serialize)]
pub(crate) struct SubscribeResponse {
    pub(crate) status: String,
    pub(crate) registered: bool,
    pub(crate) total: usize,
}

pub(crate) async fn subscribe<T, S>(
    State(state): State<state::AppState<T, S>>,
    request: Result<Json<push_service::SubscribeRequest>, JsonRejection>,
) -> Result<Json<SubscribeResponse>, PushError>
where
    T: TimeProvider,
    S: PushSender,
{
    let Json(request) = request.map_err(invalid_body)?;
    let registration = state.push.subscribe(request)?;
    Ok(Json(SubscribeResponse {
        status: "subscribed".to_string(),
        registered: registration.registered,
        total: registration.total,
    }))
}

#[derive(Serialize)]
pub(crate) struct NotificationsResponse {
    pub(crate) notifications: Vec<Notification>,
    pub(crate) count: usize,
}

pub(crate) async fn notifications<T, S>(
    State(state): State<state::AppState<T, S>>,
) -> Json<NotificationsResponse>
where
    T: TimeProvider,
    S: PushSender,
{
    let notifications = state.push.notifications();
    let count = notifications.len();
    Json(NotificationsResponse {
        notifications,
        count,
    })
}

#[derive(Serialize)]
pub(crate) struct StatusResponse {
    pub(crate) status: String,
    pub(crate) message: String,
}

pub(crate) async fn clear_notifications<T, S>(
    State(state): State<state::AppState<T, S>>,
) -> Result<Json<StatusResponse>, PushError>
where
    T: TimeProvider,
    S: PushSender,
{
    state.push.clear_notifications()?;
    Ok(Json(StatusResponse {
        status: "cleared".to_string(),
        message: "All notifications cleared".to_string(),
    }))
}

pub(crate) async fn clear_subscriptions<T, S>(
    State(state): State<state::AppState<T, S>>,
) -> Result<Json<StatusResponse>, PushError>
where
    T: TimeProvider,
    S: PushSender,
{
    state.push.clear_subscriptions()?;
    Ok(Json(StatusResponse {
        status: "success".to_string(),
        message: "All subscriptions cleared".to_string(),
    }))
}

#[derive(Serialize)]
pub(crate) struct PublicKeyResponse {
    #[serde(rename = "publicKey")]
    pub(crate) public_key: String,
}

pub(crate) async fn public_key<T, S>(
    State(state): State<state::AppState<T, S>>,
) -> Result<Json<PublicKeyResponse>, PushError>
where
    T: TimeProvider,
    S: PushSender,
{
    match push_service::load_vapid_config(&state.config) {
        push_service::VapidConfigStatus::Ready(vapid) => Ok(Json(PublicKeyResponse {
            public_key: vapid.public_key,
        })),
        push_service::VapidConfigStatus::Incomplete | push_service::VapidConfigStatus::Missing => {
            Err(PushError::Configuration(
                "VAPID keys are not configured".to_string(),
            ))
        }
    }
}
