//! HTTP client for the storefront backend's cart, wishlist and category
//! endpoints.
//!
//! Responses are returned as raw JSON; decoding into engine types happens in
//! [`basket_engine::transform`] so envelope quirks stay in one place.

use crate::device::is_identified;
use reqwest::{Client, Method, RequestBuilder, Url};
use serde::Serialize;
use serde_json::Value;
use std::time::Duration;

/// Header carrying the device id for guest-session correlation.
pub const DEVICE_ID_HEADER: &str = "X-Device-Id";

/// Remote store errors.
#[derive(Debug, thiserror::Error)]
pub enum RemoteError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("invalid base URL \"{url}\": {reason}")]
    InvalidBaseUrl { url: String, reason: String },

    #[error("unexpected HTTP status {status} from {url}")]
    UnexpectedStatus { status: u16, url: String },

    #[error("JSON decode error for {context}: {source}")]
    Decode {
        context: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Body of `POST /api/v1/cart/items`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct AddCartItemBody<'a> {
    device_id: &'a str,
    product_id: &'a str,
    qty: u32,
}

/// Body of `PUT /api/v1/cart/items/:id`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct UpdateCartItemBody<'a> {
    device_id: &'a str,
    qty: i64,
}

/// Body of `POST /api/v1/wishlist/items`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct AddWishlistItemBody<'a> {
    product_id: &'a str,
}

/// Backend REST client.
///
/// Sends cookies back to the backend (the browser's "include credentials")
/// and the [`DEVICE_ID_HEADER`] on every call made for a real device.
#[derive(Debug, Clone)]
pub struct RemoteStore {
    client: Client,
    base_url: Url,
}

impl RemoteStore {
    /// Create a client for `base_url`.
    ///
    /// With `timeout` unset, reqwest's default (no overall timeout) applies.
    ///
    /// # Errors
    ///
    /// Returns [`RemoteError::InvalidBaseUrl`] if `base_url` is not an
    /// absolute http(s) URL, or [`RemoteError::Http`] if the client cannot be
    /// built.
    pub fn new(base_url: &str, timeout: Option<Duration>) -> Result<Self, RemoteError> {
        let base_url = Url::parse(base_url).map_err(|e| RemoteError::InvalidBaseUrl {
            url: base_url.to_string(),
            reason: e.to_string(),
        })?;
        if base_url.cannot_be_a_base() || !matches!(base_url.scheme(), "http" | "https") {
            return Err(RemoteError::InvalidBaseUrl {
                url: base_url.to_string(),
                reason: "expected an http(s) URL".to_string(),
            });
        }

        let mut builder = Client::builder()
            .cookie_store(true)
            .user_agent(concat!("basket/", env!("CARGO_PKG_VERSION")));
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }

        Ok(Self {
            client: builder.build()?,
            base_url,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// `GET /api/v1/cart/:deviceId`
    pub async fn fetch_cart(&self, device_id: &str) -> Result<Value, RemoteError> {
        let url = self.url(&["api", "v1", "cart", device_id], &[]);
        self.send(self.request(Method::GET, url, device_id)).await
    }

    /// `POST /api/v1/cart/items`
    pub async fn add_cart_item(
        &self,
        device_id: &str,
        product_id: &str,
        qty: u32,
    ) -> Result<Value, RemoteError> {
        let url = self.url(&["api", "v1", "cart", "items"], &[]);
        let body = AddCartItemBody {
            device_id,
            product_id,
            qty,
        };
        self.send(self.request(Method::POST, url, device_id).json(&body))
            .await
    }

    /// `PUT /api/v1/cart/items/:id`
    pub async fn update_cart_item(
        &self,
        device_id: &str,
        item_id: &str,
        qty: i64,
    ) -> Result<Value, RemoteError> {
        let url = self.url(&["api", "v1", "cart", "items", item_id], &[]);
        let body = UpdateCartItemBody { device_id, qty };
        self.send(self.request(Method::PUT, url, device_id).json(&body))
            .await
    }

    /// `DELETE /api/v1/cart/items/:id?deviceId=`
    pub async fn remove_cart_item(
        &self,
        device_id: &str,
        item_id: &str,
    ) -> Result<Value, RemoteError> {
        let url = self.url(
            &["api", "v1", "cart", "items", item_id],
            &[("deviceId", device_id)],
        );
        self.send(self.request(Method::DELETE, url, device_id)).await
    }

    /// `DELETE /api/v1/cart?deviceId=`
    pub async fn clear_cart(&self, device_id: &str) -> Result<Value, RemoteError> {
        let url = self.url(&["api", "v1", "cart"], &[("deviceId", device_id)]);
        self.send(self.request(Method::DELETE, url, device_id)).await
    }

    /// `GET /api/v1/wishlist`
    pub async fn fetch_wishlist(&self, device_id: &str) -> Result<Value, RemoteError> {
        let url = self.url(&["api", "v1", "wishlist"], &[]);
        self.send(self.request(Method::GET, url, device_id)).await
    }

    /// `POST /api/v1/wishlist/items`
    pub async fn add_wishlist_item(
        &self,
        device_id: &str,
        product_id: &str,
    ) -> Result<Value, RemoteError> {
        let url = self.url(&["api", "v1", "wishlist", "items"], &[]);
        self.send(
            self.request(Method::POST, url, device_id)
                .json(&AddWishlistItemBody { product_id }),
        )
        .await
    }

    /// `DELETE /api/v1/wishlist/items/:id`
    pub async fn remove_wishlist_item(
        &self,
        device_id: &str,
        item_id: &str,
    ) -> Result<Value, RemoteError> {
        let url = self.url(&["api", "v1", "wishlist", "items", item_id], &[]);
        self.send(self.request(Method::DELETE, url, device_id)).await
    }

    /// `DELETE /api/v1/wishlist`
    pub async fn clear_wishlist(&self, device_id: &str) -> Result<Value, RemoteError> {
        let url = self.url(&["api", "v1", "wishlist"], &[]);
        self.send(self.request(Method::DELETE, url, device_id)).await
    }

    /// `GET /api/v1/categories`
    pub async fn fetch_categories(&self, device_id: &str) -> Result<Value, RemoteError> {
        let url = self.url(&["api", "v1", "categories"], &[]);
        self.send(self.request(Method::GET, url, device_id)).await
    }

    /// Join path segments onto the base URL, percent-encoding each one.
    fn url(&self, segments: &[&str], query: &[(&str, &str)]) -> Url {
        let mut url = self.base_url.clone();
        // checked in new(): the base can carry path segments
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        if !query.is_empty() {
            url.query_pairs_mut().extend_pairs(query);
        }
        url
    }

    fn request(&self, method: Method, url: Url, device_id: &str) -> RequestBuilder {
        let request = self.client.request(method, url);
        if is_identified(device_id) {
            request.header(DEVICE_ID_HEADER, device_id)
        } else {
            request
        }
    }

    /// Send a request and decode its JSON body. An empty body is `null`.
    async fn send(&self, request: RequestBuilder) -> Result<Value, RemoteError> {
        let response = request.send().await?;
        let status = response.status();
        let url = response.url().to_string();

        if !status.is_success() {
            tracing::debug!(status = status.as_u16(), url = %url, "Backend returned error status");
            return Err(RemoteError::UnexpectedStatus {
                status: status.as_u16(),
                url,
            });
        }

        let body = response.bytes().await?;
        if body.iter().all(u8::is_ascii_whitespace) {
            return Ok(Value::Null);
        }

        serde_json::from_slice(&body).map_err(|e| RemoteError::Decode {
            context: url,
            source: e,
        })
    }
}
