use crate::error::PushError;
use crate::ports::push::PushSender;
use crate::ports::time::TimeProvider;
use crate::state;

use axum::body::Body;
use axum::extract::State;
use axum::http::Request;
use axum::http::header::AUTHORIZATION;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};

pub(crate) async fn auth_middleware<T, S>(
    State(state): State<state::AppState<T, S>>,
    req: Request<Body>,
    next: Next,
) -> Response
where
    T: TimeProvider,
    S: PushSender,
{
    let auth = match &state.auth {
        Some(auth) => auth,
        None => return next.run(req).await,
    };

    if !requires_auth(req.uri().path()) {
        return next.run(req).await;
    }

    let header = req
        .headers()
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok());
    match auth.verify_header(header) {
        Ok(()) => next.run(req).await,
        Err(err) => {
            tracing::debug!("rejected api request: {err}");
            PushError::Unauthorized.into_response()
        }
    }
}

// Browsers register without the shared token, and need the public key to do so.
fn requires_auth(path: &str) -> bool {
    path.starts_with("/api/") && path != "/api/subscribe" && path != "/api/push/public-key"
}
