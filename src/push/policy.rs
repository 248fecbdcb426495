use crate::config::PushConfig;
use crate::error::PushError;
use crate::types::push::{DeliveryOptions, DeliveryOverrides, Urgency};

use serde_json::Value;
use std::time::Duration;

const MAX_TOPIC_LEN: usize = 32;

#[derive(Debug, Clone)]
pub(crate) struct DeliveryPolicy {
    defaults: DeliveryOptions,
    max_retries: u32,
    retry_delay: Duration,
}

impl DeliveryPolicy {
    pub(crate) fn from_config(config: &PushConfig) -> Self {
        Self {
            defaults: DeliveryOptions {
                ttl: config.ttl,
                urgency: config.urgency,
                topic: None,
            },
            max_retries: config.max_retries,
            retry_delay: config.retry_delay,
        }
    }

    pub(crate) fn max_retries(&self) -> u32 {
        self.max_retries
    }

    pub(crate) fn retry_delay(&self) -> Duration {
        self.retry_delay
    }

    /// Merges caller overrides over the defaults, field by field.
    pub(crate) fn resolve(
        &self,
        overrides: &DeliveryOverrides,
    ) -> Result<DeliveryOptions, PushError> {
        let ttl = match &overrides.ttl {
            Some(raw) => parse_ttl(raw)?,
            None => self.defaults.ttl,
        };
        let urgency = match &overrides.urgency {
            Some(raw) => option_str(raw, "urgency")?
                .parse::<Urgency>()
                .map_err(PushError::InvalidOption)?,
            None => self.defaults.urgency,
        };
        let topic = match &overrides.topic {
            Some(raw) => Some(parse_topic(option_str(raw, "topic")?)?),
            None => self.defaults.topic.clone(),
        };

        Ok(DeliveryOptions {
            ttl,
            urgency,
            topic,
        })
    }
}

fn option_str<'a>(raw: &'a Value, name: &str) -> Result<&'a str, PushError> {
    raw.as_str()
        .ok_or_else(|| PushError::InvalidOption(format!("{name} must be a string (got {raw})")))
}

fn parse_ttl(raw: &Value) -> Result<u32, PushError> {
    let Some(ttl) = raw.as_i64() else {
        return Err(PushError::InvalidOption(format!(
            "ttl must be a non-negative integer (got {raw})"
        )));
    };
    if ttl < 0 {
        return Err(PushError::InvalidOption(format!(
            "ttl must not be negative (got {ttl})"
        )));
    }
    u32::try_from(ttl)
        .map_err(|_| PushError::InvalidOption(format!("ttl {ttl} is too large")))
}

// Push services only accept topics of up to 32 URL-safe base64 characters.
fn parse_topic(raw: &str) -> Result<String, PushError> {
    let topic = raw.trim();
    if topic.is_empty() || topic.len() > MAX_TOPIC_LEN {
        return Err(PushError::InvalidOption(format!(
            "topic must be 1 to {MAX_TOPIC_LEN} characters"
        )));
    }
    if !topic
        .chars()
        .all(|ch| ch.is_ascii_alphanumeric() || ch == '-' || ch == '_')
    {
        return Err(PushError::InvalidOption(
            "topic may only contain URL-safe base64 characters".to_string(),
        ));
    }
    Ok(topic.to_string())
}

#[cfg(test)]
#[allow(non_snake_case)]
mod tests {
    use super::*;
    use serde_json::json;

    fn policy() -> DeliveryPolicy {
        DeliveryPolicy::from_config(&PushConfig {
            ttl: 0,
            urgency: Urgency::High,
            ..Default::default()
        })
    }

    #[test]
    fn resolve__should_return_defaults_without_overrides() {
        // When
        let options = policy()
            .resolve(&DeliveryOverrides::default())
            .expect("resolve");

        // Then
        assert_eq!(
            options,
            DeliveryOptions {
                ttl: 0,
                urgency: Urgency::High,
                topic: None,
            }
        );
    }

    #[test]
    fn resolve__should_apply_urgency_override_and_keep_default_ttl() {
        // Given
        let overrides = DeliveryOverrides {
            urgency: Some(json!("normal")),
            ..Default::default()
        };

        // When
        let options = policy().resolve(&overrides).expect("resolve");

        // Then
        assert_eq!(options.ttl, 0);
        assert_eq!(options.urgency, Urgency::Normal);
        assert_eq!(options.topic, None);
    }

    #[test]
    fn resolve__should_apply_every_override() {
        // Given
        let overrides = DeliveryOverrides {
            ttl: Some(json!(3600)),
            urgency: Some(json!("very-low")),
            topic: Some(json!("daily-digest")),
        };

        // When
        let options = policy().resolve(&overrides).expect("resolve");

        // Then
        assert_eq!(options.ttl, 3600);
        assert_eq!(options.urgency, Urgency::VeryLow);
        assert_eq!(options.topic.as_deref(), Some("daily-digest"));
    }

    #[test]
    fn resolve__should_reject_unknown_urgency() {
        // Given
        let overrides = DeliveryOverrides {
            urgency: Some(json!("urgent")),
            ..Default::default()
        };

        // When
        let result = policy().resolve(&overrides);

        // Then
        assert!(matches!(result, Err(PushError::InvalidOption(_))));
    }

    #[test]
    fn resolve__should_reject_negative_ttl() {
        // Given
        let overrides = DeliveryOverrides {
            ttl: Some(json!(-1)),
            ..Default::default()
        };

        // Then
        assert!(matches!(
            policy().resolve(&overrides),
            Err(PushError::InvalidOption(_))
        ));
    }

    #[test]
    fn resolve__should_reject_malformed_topics() {
        let too_long = "x".repeat(33);
        for topic in ["", "has space", "a/b", too_long.as_str()] {
            let overrides = DeliveryOverrides {
                topic: Some(json!(topic)),
                ..Default::default()
            };

            assert!(
                matches!(
                    policy().resolve(&overrides),
                    Err(PushError::InvalidOption(_))
                ),
                "topic {topic:?} should be rejected"
            );
        }
    }

    #[test]
    fn resolve__should_reject_ttl_that_is_not_an_integer() {
        for ttl in [json!(1.5), json!("60"), json!(true), json!(u64::MAX)] {
            let overrides = DeliveryOverrides {
                ttl: Some(ttl.clone()),
                ..Default::default()
            };

            assert!(
                matches!(
                    policy().resolve(&overrides),
                    Err(PushError::InvalidOption(_))
                ),
                "ttl {ttl} should be rejected"
            );
        }
    }

    #[test]
    fn resolve__should_reject_non_string_urgency_and_topic() {
        // Given
        let urgency = DeliveryOverrides {
            urgency: Some(json!(3)),
            ..Default::default()
        };
        let topic = DeliveryOverrides {
            topic: Some(json!(["digest"])),
            ..Default::default()
        };

        // Then
        assert!(matches!(
            policy().resolve(&urgency),
            Err(PushError::InvalidOption(_))
        ));
        assert!(matches!(
            policy().resolve(&topic),
            Err(PushError::InvalidOption(_))
        ));
    }

    #[test]
    fn urgency__should_order_from_very_low_to_high() {
        assert!(Urgency::VeryLow < Urgency::Low);
        assert!(Urgency::Low < Urgency::Normal);
        assert!(Urgency::Normal < Urgency::High);
    }
}
