use crate::adapters::WebPushSender;
use crate::config;

pub(crate) mod dispatcher;
mod ledger;
mod policy;
mod registry;
pub(crate) mod service;
pub(crate) mod vapid;

pub use dispatcher::DeliveryOutcome;
pub use registry::Registration;
pub use service::{PushService, SendReport, SendRequest, SubscribeRequest};
pub(crate) use vapid::{VapidConfigStatus, load_vapid_config};

/// Builds the web-push transport, or `None` when sending is not possible.
pub(crate) fn build_sender(config: &config::AppConfig) -> Option<WebPushSender> {
    let vapid = match load_vapid_config(config) {
        VapidConfigStatus::Ready(vapid) => vapid,
        VapidConfigStatus::Incomplete => {
            tracing::warn!("push notifications disabled: incomplete VAPID configuration");
            return None;
        }
        VapidConfigStatus::Missing => {
            tracing::warn!("push notifications disabled: no VAPID keys configured");
            return None;
        }
    };

    match WebPushSender::new(vapid) {
        Ok(sender) => Some(sender),
        Err(err) => {
            tracing::error!("push notifications disabled: failed to init web-push ({err})");
            None
        }
    }
}
