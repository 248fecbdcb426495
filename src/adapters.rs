use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::pin::Pin;
use std::sync::Mutex;
use std::time::Duration;

use serde_json::Value;
use time::OffsetDateTime;
use web_push::WebPushClient;

use crate::error::StoreError;
use crate::ports;
use crate::types::push::{DeliveryOptions, Subscription, Urgency, VapidConfig};

#[derive(Debug, Clone, Copy, Default)]
pub struct TokioTimeProvider;

impl ports::time::TimeProvider for TokioTimeProvider {
    type Sleep<'a>
        = tokio::time::Sleep
    where
        Self: 'a;

    fn now(&self) -> OffsetDateTime {
        OffsetDateTime::now_utc()
    }

    fn sleep<'a>(&'a self, duration: Duration) -> Self::Sleep<'a> {
        tokio::time::sleep(duration)
    }
}

/// Transport backed by the `web-push` crate: encrypts the payload for the
/// subscription and signs the request with the VAPID key.
#[derive(Clone)]
pub struct WebPushSender {
    vapid: VapidConfig,
    client: web_push::IsahcWebPushClient,
}

impl WebPushSender {
    pub fn new(vapid: VapidConfig) -> Result<Self, web_push::WebPushError> {
        let client = web_push::IsahcWebPushClient::new()?;
        Ok(Self { vapid, client })
    }

    fn message(
        &self,
        subscription: &Subscription,
        payload: &str,
        options: &DeliveryOptions,
    ) -> Result<web_push::WebPushMessage, web_push::WebPushError> {
        let subscription_info = web_push::SubscriptionInfo::new(
            subscription.endpoint.as_str(),
            subscription.keys.p256dh.as_str(),
            subscription.keys.auth.as_str(),
        );
        let mut builder = web_push::WebPushMessageBuilder::new(&subscription_info);
        builder.set_payload(web_push::ContentEncoding::Aes128Gcm, payload.as_bytes());
        builder.set_ttl(options.ttl);
        builder.set_urgency(options.urgency.into());
        if let Some(topic) = &options.topic {
            builder.set_topic(topic.clone());
        }
        let mut signature_builder = web_push::VapidSignatureBuilder::from_base64(
            &self.vapid.private_key,
            web_push::URL_SAFE_NO_PAD,
            &subscription_info,
        )?;
        signature_builder.add_claim("sub", self.vapid.subject.as_str());
        builder.set_vapid_signature(signature_builder.build()?);
        builder.build()
    }
}

impl From<Urgency> for web_push::Urgency {
    fn from(urgency: Urgency) -> Self {
        match urgency {
            Urgency::VeryLow => web_push::Urgency::VeryLow,
            Urgency::Low => web_push::Urgency::Low,
            Urgency::Normal => web_push::Urgency::Normal,
            Urgency::High => web_push::Urgency::High,
        }
    }
}

impl ports::push::DeliveryError for web_push::WebPushError {
    fn status_code(&self) -> Option<u16> {
        match self {
            web_push::WebPushError::EndpointNotValid => Some(410),
            web_push::WebPushError::EndpointNotFound => Some(404),
            web_push::WebPushError::Unauthorized => Some(401),
            web_push::WebPushError::BadRequest(_) => Some(400),
            web_push::WebPushError::PayloadTooLarge => Some(413),
            web_push::WebPushError::ServerError(_) => Some(500),
            _ => None,
        }
    }
}

impl ports::push::PushSender for WebPushSender {
    type Error = web_push::WebPushError;
    type Fut<'a>
        = Pin<Box<dyn Future<Output = Result<(), Self::Error>> + Send + 'a>>
    where
        Self: 'a;

    fn send<'a>(
        &'a self,
        subscription: &'a Subscription,
        payload: &'a str,
        options: &'a DeliveryOptions,
    ) -> Self::Fut<'a> {
        Box::pin(async move {
            let message = self.message(subscription, payload, options)?;
            self.client.send(message).await
        })
    }
}

/// Keeps each collection in `<dir>/<key>.json`.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    dir: PathBuf,
}

impl JsonFileStore {
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }
}

impl ports::store::Store for JsonFileStore {
    fn load(&self, key: &str) -> Result<Vec<Value>, StoreError> {
        let path = self.path_for(key);
        let contents = match std::fs::read(&path) {
            Ok(contents) => contents,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(err) => return Err(err.into()),
        };
        Ok(serde_json::from_slice(&contents)?)
    }

    fn replace(&self, key: &str, items: Vec<Value>) -> Result<(), StoreError> {
        let path = self.path_for(key);
        let contents = serde_json::to_vec_pretty(&items)?;
        write_atomically(&path, &contents)?;
        Ok(())
    }
}

fn write_atomically(path: &Path, contents: &[u8]) -> std::io::Result<()> {
    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);
    std::fs::write(&tmp, contents)?;
    std::fs::rename(&tmp, path)
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    collections: Mutex<HashMap<String, Vec<Value>>>,
}

impl ports::store::Store for MemoryStore {
    fn load(&self, key: &str) -> Result<Vec<Value>, StoreError> {
        let collections = self.collections.lock().expect("memory store lock");
        Ok(collections.get(key).cloned().unwrap_or_default())
    }

    fn replace(&self, key: &str, items: Vec<Value>) -> Result<(), StoreError> {
        let mut collections = self.collections.lock().expect("memory store lock");
        collections.insert(key.to_string(), items);
        Ok(())
    }
}
