use base64::{URL_SAFE_NO_PAD, encode_config};
use jwt_simple::prelude::ES256KeyPair;
use rand::rngs::OsRng;
use rand::{CryptoRng, RngCore};

use crate::config;
use crate::types::push::VapidConfig;

#[derive(Debug, Clone)]
pub struct VapidCredentials {
    pub private_key: String,
    pub public_key: String,
}

#[derive(Debug, Clone)]
pub(crate) enum VapidConfigStatus {
    Missing,
    Incomplete,
    Ready(VapidConfig),
}

/// Both keys are required; the subject always has a default.
pub(crate) fn load_vapid_config(config: &config::AppConfig) -> VapidConfigStatus {
    let private_key = non_empty(config.vapid_private_key.as_deref());
    let public_key = non_empty(config.vapid_public_key.as_deref());

    match (private_key, public_key) {
        (Some(private_key), Some(public_key)) => VapidConfigStatus::Ready(VapidConfig {
            private_key: private_key.to_string(),
            public_key: public_key.to_string(),
            subject: config.vapid_subject.clone(),
        }),
        (None, None) => VapidConfigStatus::Missing,
        _ => VapidConfigStatus::Incomplete,
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|value| !value.is_empty())
}

pub fn generate_vapid_credentials() -> Result<VapidCredentials, web_push::WebPushError> {
    let mut rng = OsRng;
    generate_vapid_credentials_with_rng(&mut rng)
}

pub(crate) fn generate_vapid_credentials_with_rng<R: RngCore + CryptoRng>(
    rng: &mut R,
) -> Result<VapidCredentials, web_push::WebPushError> {
    let key_pair = generate_es256_keypair_with_rng(rng);
    let private_key = encode_config(key_pair.to_bytes(), URL_SAFE_NO_PAD);
    let public_key =
        web_push::VapidSignatureBuilder::from_base64_no_sub(&private_key, URL_SAFE_NO_PAD)?
            .get_public_key();
    let public_key = encode_config(public_key, URL_SAFE_NO_PAD);

    Ok(VapidCredentials {
        private_key,
        public_key,
    })
}

// Not every 32-byte string is a valid P-256 scalar; draw until one is.
fn generate_es256_keypair_with_rng<R: RngCore + CryptoRng>(rng: &mut R) -> ES256KeyPair {
    let mut key_bytes = [0u8; 32];
    loop {
        rng.fill_bytes(&mut key_bytes);
        if let Ok(key_pair) = ES256KeyPair::from_bytes(&key_bytes) {
            return key_pair;
        }
    }
}

#[cfg(test)]
#[allow(non_snake_case)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn config_with(private_key: Option<&str>, public_key: Option<&str>) -> config::AppConfig {
        config::AppConfig {
            vapid_private_key: private_key.map(str::to_string),
            vapid_public_key: public_key.map(str::to_string),
            ..Default::default()
        }
    }

    #[test]
    fn load_vapid_config__should_be_missing_without_keys() {
        assert!(matches!(
            load_vapid_config(&config_with(None, None)),
            VapidConfigStatus::Missing
        ));
    }

    #[test]
    fn load_vapid_config__should_be_incomplete_with_one_key() {
        assert!(matches!(
            load_vapid_config(&config_with(Some("private"), None)),
            VapidConfigStatus::Incomplete
        ));
        assert!(matches!(
            load_vapid_config(&config_with(Some("private"), Some("  "))),
            VapidConfigStatus::Incomplete
        ));
    }

    #[test]
    fn load_vapid_config__should_use_default_subject() {
        // When
        let status = load_vapid_config(&config_with(Some("private"), Some("public")));

        // Then
        let VapidConfigStatus::Ready(vapid) = status else {
            panic!("expected ready config");
        };
        assert_eq!(vapid.private_key, "private");
        assert_eq!(vapid.public_key, "public");
        assert_eq!(vapid.subject, "mailto:admin@example.com");
    }

    #[test]
    fn generate_vapid_credentials_with_rng__should_return_expected_fixture() {
        // Given
        let seed = [7u8; 32];
        let mut rng = StdRng::from_seed(seed);

        // When
        let credentials =
            generate_vapid_credentials_with_rng(&mut rng).expect("credentials should generate");

        // Then
        assert_eq!(
            credentials.private_key,
            "9pKJeIXAyyCj5M0QagsVvDYHlPF-cymJCbB5iHPsdEE"
        );
        assert_eq!(
            credentials.public_key,
            "BCRweRf_U5iQM4pKNucGRzM6OuLp8Hisa8yX0N2ePIf1oxKitvFT6qvuGgYoTxlMatMDaytXbZR3rVClc2w_p6U"
        );
    }
}
