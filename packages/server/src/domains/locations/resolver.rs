use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::debug;

use crate::common::{normalize_postcode, LifecycleError};
use crate::kernel::BaseGeocoder;

use super::models::Coordinates;

/// Resolves postcodes to coordinates through the external lookup service,
/// memoizing results per resolver instance.
///
/// Both hits and not-founds are cached (a postcode the service does not know
/// will not be known five minutes later either); transient failures are not,
/// so the next call retries the network.
pub struct GeocodeResolver {
    geocoder: Arc<dyn BaseGeocoder>,
    cache: Mutex<HashMap<String, Option<Coordinates>>>,
}

impl GeocodeResolver {
    pub fn new(geocoder: Arc<dyn BaseGeocoder>) -> Self {
        Self {
            geocoder,
            cache: Mutex::new(HashMap::new()),
        }
    }

    /// Resolve a postcode to coordinates.
    ///
    /// Input is normalized before lookup, so spacing and case variants of the
    /// same postcode share one cache entry and one network call. Blank input
    /// short-circuits to `Ok(None)` without touching the network.
    pub async fn resolve(&self, postcode: &str) -> Result<Option<Coordinates>, LifecycleError> {
        let normalized = normalize_postcode(postcode);
        if normalized.is_empty() {
            return Ok(None);
        }

        {
            let cache = self.cache.lock().await;
            if let Some(cached) = cache.get(&normalized) {
                debug!(postcode = %normalized, "geocode cache hit");
                return Ok(*cached);
            }
        }

        let result = self.geocoder.lookup(&normalized).await?;
        self.cache.lock().await.insert(normalized, result);
        Ok(result)
    }
}
