use crate::types::push::{DeliveryOptions, Subscription};

/// A delivery failure that may carry the push service's HTTP status.
pub trait DeliveryError: std::fmt::Display + Send + Sync + 'static {
    fn status_code(&self) -> Option<u16>;
}

pub trait PushSender: Clone + Send + Sync + 'static {
    type Error: DeliveryError;
    type Fut<'a>: Future<Output = Result<(), Self::Error>> + Send + 'a
    where
        Self: 'a;

    fn send<'a>(
        &'a self,
        subscription: &'a Subscription,
        payload: &'a str,
        options: &'a DeliveryOptions,
    ) -> Self::Fut<'a>;
}
