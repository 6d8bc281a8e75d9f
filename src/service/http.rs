//! Blocking HTTP client for the order API

use reqwest::blocking::{Client, Response};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::{debug, info, warn};

use super::{OrderService, ServiceError};
use crate::catalog::OperatingSystem;
use crate::order::{OrderCreated, OrderLookup, OrderNumber, OrderRecord, OrderRequest};

const USER_AGENT: &str = concat!("techserve/", env!("CARGO_PKG_VERSION"));

/// `{ "error": "..." }` body returned with every failure status.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: String,
}

/// REST client rooted at the API base URL (e.g. `http://localhost:3000/api`).
#[derive(Debug, Clone)]
pub struct HttpOrderService {
    client: Client,
    base_url: String,
}

impl HttpOrderService {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, ServiceError> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| ServiceError::Transport(e.to_string()))?;

        let base_url = base_url.into().trim_end_matches('/').to_string();
        debug!("HTTP order service at {}", base_url);
        Ok(Self { client, base_url })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn send(request: reqwest::blocking::RequestBuilder) -> Result<Response, ServiceError> {
        request
            .send()
            .map_err(|e| ServiceError::Transport(e.to_string()))
    }

    /// Decode a success body, or turn a failure status into a [`ServiceError`]
    /// carrying the backend's reason.
    fn decode<T: DeserializeOwned>(response: Response) -> Result<T, ServiceError> {
        let status = response.status();
        let body = response
            .text()
            .map_err(|e| ServiceError::Transport(e.to_string()))?;

        if status.is_success() {
            return serde_json::from_str(&body)
                .map_err(|e| ServiceError::InvalidResponse(e.to_string()));
        }

        let reason = serde_json::from_str::<ErrorBody>(&body)
            .map(|b| b.error)
            .unwrap_or_else(|_| {
                status
                    .canonical_reason()
                    .unwrap_or("Unknown error")
                    .to_string()
            });
        warn!("Order API returned {}: {}", status.as_u16(), reason);
        Err(ServiceError::from_status(status.as_u16(), reason))
    }
}

impl OrderService for HttpOrderService {
    fn load_catalog(&self) -> Result<Vec<OperatingSystem>, ServiceError> {
        let response = Self::send(self.client.get(self.url("/operating-systems")))?;
        let systems: Vec<OperatingSystem> = Self::decode(response)?;
        debug!("Loaded {} operating systems", systems.len());
        Ok(systems)
    }

    fn create_order(&self, request: &OrderRequest) -> Result<OrderCreated, ServiceError> {
        info!("Submitting order {}", request.order_number);
        let response = Self::send(self.client.post(self.url("/orders")).json(request))?;
        Self::decode(response)
    }

    fn find_orders(&self, lookup: &OrderLookup) -> Result<Vec<OrderRecord>, ServiceError> {
        info!("Looking up orders for {}", lookup.email);
        let response = Self::send(self.client.post(self.url("/orders/find")).json(lookup))?;
        match Self::decode(response) {
            Err(e) if e.is_not_found() => Ok(Vec::new()),
            other => other,
        }
    }

    fn get_order(&self, order_number: &OrderNumber) -> Result<OrderRecord, ServiceError> {
        let path = format!("/orders/{}", order_number);
        let response = Self::send(self.client.get(self.url(&path)))?;
        Self::decode(response)
    }
}
