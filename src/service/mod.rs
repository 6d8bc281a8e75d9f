//! Order service transport
//!
//! [`OrderService`] is the contract the wizard talks to. Two implementations
//! ship with the crate:
//!
//! - [`HttpOrderService`]: blocking REST client for the order API
//! - [`MemoryBackend`]: in-process backend with transactional order creation,
//!   server-side validation and the administrator operations

pub mod http;
pub mod memory;

pub use http::HttpOrderService;
pub use memory::{AddOnPricingPolicy, MemoryBackend};

use thiserror::Error;

use crate::catalog::OperatingSystem;
use crate::order::{OrderCreated, OrderLookup, OrderNumber, OrderRecord, OrderRequest};

/// Transport or backend failure. The message is the backend's raw reason.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ServiceError {
    /// 400
    #[error("{0}")]
    BadRequest(String),

    /// 404
    #[error("{0}")]
    NotFound(String),

    /// 409
    #[error("{0}")]
    Conflict(String),

    /// Any other non-success status
    #[error("{message} (HTTP {status})")]
    Server { status: u16, message: String },

    /// The request never produced a response
    #[error("Network error: {0}")]
    Transport(String),

    /// The response body did not have the expected shape
    #[error("Unexpected response: {0}")]
    InvalidResponse(String),
}

impl ServiceError {
    /// Map an HTTP status and reason onto the error taxonomy.
    pub fn from_status(status: u16, message: impl Into<String>) -> Self {
        let message = message.into();
        match status {
            400 => Self::BadRequest(message),
            404 => Self::NotFound(message),
            409 => Self::Conflict(message),
            _ => Self::Server { status, message },
        }
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            Self::BadRequest(_) => Some(400),
            Self::NotFound(_) => Some(404),
            Self::Conflict(_) => Some(409),
            Self::Server { status, .. } => Some(*status),
            Self::Transport(_) | Self::InvalidResponse(_) => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}

impl From<ServiceError> for crate::error::TechServeError {
    fn from(err: ServiceError) -> Self {
        crate::error::TechServeError::Service(err.to_string())
    }
}

/// Catalog load, order creation and order lookup.
pub trait OrderService {
    /// Active operating systems with their nested active versions.
    fn load_catalog(&self) -> Result<Vec<OperatingSystem>, ServiceError>;

    /// Create the order and all child rows atomically.
    fn create_order(&self, request: &OrderRequest) -> Result<OrderCreated, ServiceError>;

    /// Orders for a contact, newest first. No match is an empty list.
    fn find_orders(&self, lookup: &OrderLookup) -> Result<Vec<OrderRecord>, ServiceError>;

    /// A single order by number.
    fn get_order(&self, order_number: &OrderNumber) -> Result<OrderRecord, ServiceError>;
}
