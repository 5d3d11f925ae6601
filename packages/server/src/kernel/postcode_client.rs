use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use tracing::{debug, warn};

use crate::common::LifecycleError;
use crate::domains::locations::models::Coordinates;

use super::traits::BaseGeocoder;

/// Postcode lookup API response (postcodes.io shape)
#[derive(Debug, Deserialize)]
struct PostcodeLookupResponse {
    result: PostcodeRecord,
}

#[derive(Debug, Deserialize)]
struct PostcodeRecord {
    longitude: f64,
    latitude: f64,
}

/// HTTP client for the external postcode-resolution service.
///
/// 404 is a definitive "no such postcode" and maps to `Ok(None)`; every
/// other failure mode is transient and retried on a later run.
pub struct PostcodeApiClient {
    client: Client,
    base_url: String,
}

impl PostcodeApiClient {
    pub fn new(base_url: String) -> Self {
        Self {
            client: Client::new(),
            base_url,
        }
    }
}

#[async_trait]
impl BaseGeocoder for PostcodeApiClient {
    async fn lookup(&self, postcode: &str) -> Result<Option<Coordinates>, LifecycleError> {
        let url = format!(
            "{}/postcodes/{}",
            self.base_url.trim_end_matches('/'),
            urlencoding::encode(postcode)
        );

        debug!(postcode = %postcode, "looking up postcode");

        let response = self
            .client
            .get(&url)
            .timeout(std::time::Duration::from_secs(10))
            .send()
            .await
            .map_err(|e| {
                warn!(postcode = %postcode, error = %e, "postcode lookup request failed");
                LifecycleError::Transient(format!("postcode lookup request failed: {}", e))
            })?;

        match response.status() {
            StatusCode::NOT_FOUND => {
                debug!(postcode = %postcode, "postcode not known to lookup service");
                Ok(None)
            }
            status if status.is_success() => {
                let body: PostcodeLookupResponse = response.json().await.map_err(|e| {
                    LifecycleError::Transient(format!(
                        "failed to parse postcode lookup response: {}",
                        e
                    ))
                })?;

                Ok(Some(Coordinates {
                    longitude: body.result.longitude,
                    latitude: body.result.latitude,
                }))
            }
            status => {
                warn!(postcode = %postcode, status = %status, "postcode service error");
                Err(LifecycleError::Transient(format!(
                    "postcode service returned {}",
                    status
                )))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_response_parses_service_payload() {
        let raw = r#"
        {
            "status": 200,
            "result": {
                "postcode": "M2 2BB",
                "longitude": -2.23,
                "latitude": 53.48,
                "region": "North West"
            }
        }
        "#;

        let parsed: PostcodeLookupResponse = serde_json::from_str(raw).unwrap();
        assert_eq!(parsed.result.longitude, -2.23);
        assert_eq!(parsed.result.latitude, 53.48);
    }
}
