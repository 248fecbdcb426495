use crate::types::push::Urgency;

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Clone)]
pub struct AppConfig {
    pub listen: SocketAddr,
    pub vapid_private_key: Option<String>,
    pub vapid_public_key: Option<String>,
    pub vapid_subject: String,
    pub auth: Option<AuthConfig>,
    pub push: PushConfig,
    pub storage: StorageConfig,
    pub payload: PayloadConfig,
}

#[derive(Clone)]
pub struct AuthConfig {
    pub token: String,
}

#[derive(Debug, Clone)]
pub struct PushConfig {
    pub ttl: u32,
    pub urgency: Urgency,
    pub max_retries: u32,
    pub retry_delay: Duration,
    pub attempt_timeout: Duration,
    pub concurrency: usize,
}

#[derive(Debug, Clone)]
pub struct StorageConfig {
    /// Directory holding one JSON file per collection. In-memory when unset.
    pub data_dir: Option<PathBuf>,
    pub max_notifications: usize,
    pub max_subscriptions: usize,
}

/// Defaults merged into every outgoing payload.
#[derive(Debug, Clone)]
pub struct PayloadConfig {
    pub icon_url: String,
    pub badge_url: String,
}

impl Default for PushConfig {
    fn default() -> Self {
        Self {
            ttl: 0,
            urgency: Urgency::High,
            max_retries: 3,
            retry_delay: Duration::from_millis(1000),
            attempt_timeout: Duration::from_secs(10),
            concurrency: 16,
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: None,
            max_notifications: 100,
            max_subscriptions: 1000,
        }
    }
}

impl Default for PayloadConfig {
    fn default() -> Self {
        Self {
            icon_url: "/icon-192.png".to_string(),
            badge_url: "/badge-72.png".to_string(),
        }
    }
}

#[cfg(test)]
impl Default for AppConfig {
    fn default() -> Self {
        Self {
            listen: SocketAddr::from(([127, 0, 0, 1], 3000)),
            vapid_private_key: None,
            vapid_public_key: None,
            vapid_subject: "mailto:admin@example.com".to_string(),
            auth: None,
            push: PushConfig::default(),
            storage: StorageConfig::default(),
            payload: PayloadConfig::default(),
        }
    }
}
