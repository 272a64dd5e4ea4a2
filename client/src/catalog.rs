//! Category lookup with a time-bounded cache.

use crate::device::DeviceIdentity;
use crate::remote::RemoteStore;
use basket_engine::{Clock, SystemClock, TtlCache};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

const CATEGORIES_KEY: &str = "categories";

/// A product category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    #[serde(alias = "_id")]
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slug: Option<String>,
}

/// Fetches categories and keeps them for the configured TTL.
///
/// The list is the same for every device, so one cached copy serves all;
/// the fetch still identifies the device like every other backend call.
#[derive(Debug)]
pub struct CategoryLookup<C = SystemClock> {
    remote: RemoteStore,
    identity: DeviceIdentity,
    cache: Mutex<TtlCache<&'static str, Vec<Category>, C>>,
}

impl CategoryLookup<SystemClock> {
    pub fn new(remote: RemoteStore, identity: DeviceIdentity, ttl: Duration) -> Self {
        Self::with_clock(remote, identity, ttl, SystemClock)
    }
}

impl<C: Clock> CategoryLookup<C> {
    pub fn with_clock(
        remote: RemoteStore,
        identity: DeviceIdentity,
        ttl: Duration,
        clock: C,
    ) -> Self {
        let ttl_millis = u64::try_from(ttl.as_millis()).unwrap_or(u64::MAX);
        Self {
            remote,
            identity,
            cache: Mutex::new(TtlCache::with_clock(ttl_millis, clock)),
        }
    }

    /// Cached categories, fetched from the backend when missing or expired.
    ///
    /// A failed fetch returns an empty list and caches nothing.
    pub async fn categories(&self) -> Vec<Category> {
        let cached = self.cache().get(&CATEGORIES_KEY);
        if let Some(categories) = cached {
            return categories;
        }

        let device_id = self.identity.device_id();
        match self.remote.fetch_categories(&device_id).await {
            Ok(body) => {
                let categories = categories_from_response(&body);
                tracing::debug!(count = categories.len(), "Fetched categories");
                self.cache().set(CATEGORIES_KEY, categories.clone());
                categories
            }
            Err(e) => {
                tracing::warn!(error = %e, "Category fetch failed");
                Vec::new()
            }
        }
    }

    /// Force the next lookup to refetch.
    pub fn invalidate(&self) {
        self.cache().invalidate(&CATEGORIES_KEY);
    }

    fn cache(&self) -> MutexGuard<'_, TtlCache<&'static str, Vec<Category>, C>> {
        self.cache
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

/// Accepts `data.categories`, `categories`, `data` or the root as the list;
/// entries that do not decode are skipped.
pub fn categories_from_response(body: &Value) -> Vec<Category> {
    let data = body.get("data");
    let list = [
        data.and_then(|d| d.get("categories")),
        body.get("categories"),
        data,
        Some(body),
    ]
    .into_iter()
    .flatten()
    .find_map(Value::as_array);

    list.map(|entries| {
        entries
            .iter()
            .filter_map(|entry| serde_json::from_value(entry.clone()).ok())
            .collect()
    })
    .unwrap_or_default()
}
