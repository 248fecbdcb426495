use crate::auth::AuthState;
use crate::config::AppConfig;
use crate::push::PushService;

use std::sync::Arc;

#[derive(Clone)]
pub(crate) struct AppState<T, S> {
    pub(crate) config: AppConfig,
    pub(crate) auth: Option<AuthState>,
    pub(crate) push: Arc<PushService<T, S>>,
}
