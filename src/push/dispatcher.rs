use crate::ports::push::{DeliveryError, PushSender};
use crate::types::push::{DeliveryOptions, Subscription};

use futures_util::StreamExt;
use futures_util::stream;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeliveryOutcome {
    Delivered {
        endpoint: String,
    },
    TransientFailure {
        endpoint: String,
        status: Option<u16>,
        message: String,
    },
    PermanentFailure {
        endpoint: String,
        status: u16,
        message: String,
    },
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct DispatchResult {
    pub(crate) sent: usize,
    pub(crate) failed: usize,
    /// Endpoints the push service reported as gone.
    pub(crate) invalid: Vec<Subscription>,
    /// Endpoints that failed for a recoverable reason.
    pub(crate) retryable: Vec<Subscription>,
}

impl DispatchResult {
    fn tally(&mut self, subscription: Subscription, outcome: DeliveryOutcome) {
        match outcome {
            DeliveryOutcome::Delivered { .. } => self.sent += 1,
            DeliveryOutcome::TransientFailure { .. } => {
                self.failed += 1;
                self.retryable.push(subscription);
            }
            DeliveryOutcome::PermanentFailure { .. } => {
                self.failed += 1;
                self.invalid.push(subscription);
            }
        }
    }

    /// Folds in a dispatch over this result's `retryable` endpoints.
    pub(crate) fn absorb_retry(&mut self, retry: DispatchResult) {
        self.failed -= self.retryable.len();
        self.sent += retry.sent;
        self.failed += retry.failed;
        self.invalid.extend(retry.invalid);
        self.retryable = retry.retryable;
    }
}

/// Fans one payload out to many subscriptions.
#[derive(Debug, Clone)]
pub(crate) struct Dispatcher<S> {
    sender: S,
    concurrency: usize,
    attempt_timeout: Duration,
}

impl<S> Dispatcher<S>
where
    S: PushSender,
{
    pub(crate) fn new(sender: S, concurrency: usize, attempt_timeout: Duration) -> Self {
        Self {
            sender,
            concurrency: concurrency.max(1),
            attempt_timeout,
        }
    }

    pub(crate) async fn dispatch(
        &self,
        subscriptions: &[Subscription],
        payload: &str,
        options: &DeliveryOptions,
    ) -> DispatchResult {
        let mut result = DispatchResult::default();
        if subscriptions.is_empty() {
            return result;
        }

        let mut attempts = stream::iter(subscriptions.iter().cloned())
            .map(move |subscription| async move {
                let outcome = self.attempt(&subscription, payload, options).await;
                (subscription, outcome)
            })
            .buffer_unordered(self.concurrency);

        while let Some((subscription, outcome)) = attempts.next().await {
            log_outcome(&outcome);
            result.tally(subscription, outcome);
        }
        result
    }

    async fn attempt(
        &self,
        subscription: &Subscription,
        payload: &str,
        options: &DeliveryOptions,
    ) -> DeliveryOutcome {
        let endpoint = subscription.endpoint.clone();
        let send = self.sender.send(subscription, payload, options);
        match tokio::time::timeout(self.attempt_timeout, send).await {
            Ok(Ok(())) => DeliveryOutcome::Delivered { endpoint },
            Ok(Err(err)) => classify(endpoint, err.status_code(), err.to_string()),
            Err(_) => DeliveryOutcome::TransientFailure {
                endpoint,
                status: None,
                message: format!("timed out after {:?}", self.attempt_timeout),
            },
        }
    }
}

/// 404 and 410 mean the subscription no longer exists. Every other failure,
/// including 400, leaves the subscription in place.
pub(crate) fn classify(endpoint: String, status: Option<u16>, message: String) -> DeliveryOutcome {
    match status {
        Some(status @ (404 | 410)) => DeliveryOutcome::PermanentFailure {
            endpoint,
            status,
            message,
        },
        status => DeliveryOutcome::TransientFailure {
            endpoint,
            status,
            message,
        },
    }
}

fn log_outcome(outcome: &DeliveryOutcome) {
    match outcome {
        DeliveryOutcome::Delivered { endpoint } => {
            tracing::debug!(%endpoint, "push delivered");
        }
        DeliveryOutcome::TransientFailure {
            endpoint,
            status,
            message,
        } => {
            tracing::warn!(%endpoint, ?status, "push delivery error: {message}");
        }
        DeliveryOutcome::PermanentFailure {
            endpoint,
            status,
            message,
        } => {
            tracing::info!(%endpoint, status, "push subscription gone: {message}");
        }
    }
}
