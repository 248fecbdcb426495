use crate::config;
use crate::error::{PushError, StoreError};
use crate::ports::push::PushSender;
use crate::ports::store::Store;
use crate::ports::time::TimeProvider;
use crate::push::dispatcher::{DispatchResult, Dispatcher};
use crate::push::ledger::NotificationLedger;
use crate::push::policy::DeliveryPolicy;
use crate::push::registry::{Registration, SubscriptionRegistry};
use crate::types::push::{
    DeliveryOptions, DeliveryOverrides, Notification, PushPayload, Subscription, SubscriptionKeys,
};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashSet;
use std::sync::Arc;
use std::sync::atomic::{AtomicI64, Ordering};

const DEFAULT_TITLE: &str = "Notification";
const DEFAULT_URL: &str = "/";

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SendRequest {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub data: Option<Value>,
    #[serde(flatten)]
    pub overrides: DeliveryOverrides,
}

/// A browser subscription as posted by the page. Fields stay raw JSON so a
/// value of the wrong shape is reported as invalid input.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SubscribeRequest {
    #[serde(default)]
    pub endpoint: Option<Value>,
    #[serde(default)]
    pub keys: Option<Value>,
}

impl SubscribeRequest {
    fn into_subscription(self) -> Result<Subscription, PushError> {
        let endpoint = required_str(self.endpoint.as_ref(), "endpoint")?;
        let keys = match self.keys {
            Some(Value::Object(keys)) => keys,
            None | Some(Value::Null) => {
                return Err(PushError::InvalidInput("keys are required".to_string()));
            }
            Some(_) => {
                return Err(PushError::InvalidInput(
                    "keys must be an object".to_string(),
                ));
            }
        };
        Ok(Subscription {
            endpoint,
            keys: SubscriptionKeys {
                auth: required_str(keys.get("auth"), "keys.auth")?,
                p256dh: required_str(keys.get("p256dh"), "keys.p256dh")?,
            },
        })
    }
}

fn required(value: Option<String>, field: &str) -> Result<String, PushError> {
    match value {
        Some(value) if !value.trim().is_empty() => Ok(value),
        _ => Err(PushError::InvalidInput(format!("{field} is required"))),
    }
}

fn required_str(value: Option<&Value>, field: &str) -> Result<String, PushError> {
    match value {
        Some(Value::String(value)) => required(Some(value.clone()), field),
        None | Some(Value::Null) => required(None, field),
        Some(_) => Err(PushError::InvalidInput(format!("{field} must be a string"))),
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SendReport {
    Sent {
        sent: usize,
        failed: usize,
        total: usize,
        id: String,
    },
    NoSubscribers {
        message: &'static str,
        id: String,
    },
}

/// Composes policy, ledger, registry and dispatcher into the operations the
/// HTTP layer exposes.
pub struct PushService<T, S> {
    time: T,
    dispatcher: Option<Dispatcher<S>>,
    policy: DeliveryPolicy,
    registry: SubscriptionRegistry,
    ledger: NotificationLedger,
    payload: config::PayloadConfig,
    last_id: AtomicI64,
}

impl<T, S> PushService<T, S>
where
    T: TimeProvider,
    S: PushSender,
{
    /// `sender` is `None` when push credentials are not configured; sends
    /// then fail with [`PushError::Configuration`].
    pub fn new(
        config: &config::AppConfig,
        time: T,
        sender: Option<S>,
        store: Arc<dyn Store>,
    ) -> Result<Self, StoreError> {
        let registry =
            SubscriptionRegistry::load(Arc::clone(&store), config.storage.max_subscriptions)?;
        let ledger = NotificationLedger::load(store, config.storage.max_notifications)?;
        let dispatcher = sender.map(|sender| {
            Dispatcher::new(
                sender,
                config.push.concurrency,
                config.push.attempt_timeout,
            )
        });
        Ok(Self {
            time,
            dispatcher,
            policy: DeliveryPolicy::from_config(&config.push),
            registry,
            ledger,
            payload: config.payload.clone(),
            last_id: AtomicI64::new(0),
        })
    }

    pub async fn send(&self, request: SendRequest) -> Result<SendReport, PushError> {
        let dispatcher = self.dispatcher.as_ref().ok_or_else(|| {
            PushError::Configuration("VAPID keys are not configured".to_string())
        })?;
        let message = required(request.message, "message")?;
        let options = self.policy.resolve(&request.overrides)?;

        let notification = Notification {
            id: self.next_id().to_string(),
            title: request.title.unwrap_or_else(|| DEFAULT_TITLE.to_string()),
            message,
            url: request.url,
            data: request.data,
            timestamp: self.time.now(),
        };
        self.ledger.record(notification.clone())?;

        let subscriptions = self.registry.snapshot();
        if subscriptions.is_empty() {
            return Ok(SendReport::NoSubscribers {
                message: "No active subscriptions",
                id: notification.id,
            });
        }

        let payload = self.payload_for(&notification);
        let payload = serde_json::to_string(&payload).map_err(StoreError::from)?;
        let result = self
            .deliver_with_retries(dispatcher, &subscriptions, &payload, &options)
            .await;

        if !result.invalid.is_empty() {
            let endpoints: HashSet<&str> = result
                .invalid
                .iter()
                .map(|subscription| subscription.endpoint.as_str())
                .collect();
            let removed = self.registry.remove_all(&endpoints)?;
            tracing::info!(removed, "pruned expired push subscriptions");
        }

        Ok(SendReport::Sent {
            sent: result.sent,
            failed: result.failed,
            total: subscriptions.len(),
            id: notification.id,
        })
    }

    async fn deliver_with_retries(
        &self,
        dispatcher: &Dispatcher<S>,
        subscriptions: &[Subscription],
        payload: &str,
        options: &DeliveryOptions,
    ) -> DispatchResult {
        let mut result = dispatcher.dispatch(subscriptions, payload, options).await;
        let mut attempt = 0;
        while attempt < self.policy.max_retries() && !result.retryable.is_empty() {
            attempt += 1;
            self.time.sleep(self.policy.retry_delay()).await;
            tracing::debug!(
                attempt,
                endpoints = result.retryable.len(),
                "retrying push delivery"
            );
            let retry = dispatcher
                .dispatch(&result.retryable, payload, options)
                .await;
            result.absorb_retry(retry);
        }
        result
    }

    fn payload_for(&self, notification: &Notification) -> PushPayload {
        let mut data = Map::new();
        data.insert(
            "url".to_string(),
            Value::String(
                notification
                    .url
                    .clone()
                    .unwrap_or_else(|| DEFAULT_URL.to_string()),
            ),
        );
        match &notification.data {
            Some(Value::Object(extra)) => {
                data.extend(extra.iter().map(|(key, value)| (key.clone(), value.clone())));
            }
            Some(Value::Null) | None => {}
            Some(other) => {
                data.insert("value".to_string(), other.clone());
            }
        }

        PushPayload {
            title: notification.title.clone(),
            body: notification.message.clone(),
            icon: self.payload.icon_url.clone(),
            badge: self.payload.badge_url.clone(),
            timestamp: self.time.now_millis(),
            data,
        }
    }

    // Millisecond timestamps, bumped when two sends land in the same millisecond.
    fn next_id(&self) -> i64 {
        let now = self.time.now_millis();
        let mut current = self.last_id.load(Ordering::Relaxed);
        loop {
            let next = now.max(current + 1);
            match self.last_id.compare_exchange_weak(
                current,
                next,
                Ordering::Relaxed,
                Ordering::Relaxed,
            ) {
                Ok(_) => return next,
                Err(actual) => current = actual,
            }
        }
    }

    pub fn subscribe(&self, request: SubscribeRequest) -> Result<Registration, PushError> {
        let subscription = request.into_subscription()?;
        let registration = self.registry.register(subscription)?;
        if registration.registered {
            tracing::info!(total = registration.total, "push subscription registered");
        }
        Ok(registration)
    }

    pub fn notifications(&self) -> Vec<Notification> {
        self.ledger.list()
    }

    pub fn clear_notifications(&self) -> Result<(), PushError> {
        self.ledger.clear()?;
        Ok(())
    }

    pub fn clear_subscriptions(&self) -> Result<(), PushError> {
        self.registry.clear()?;
        Ok(())
    }

    pub fn subscription_count(&self) -> usize {
        self.registry.len()
    }
}
