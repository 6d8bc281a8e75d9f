//! Order status tracking
//!
//! Lookup by `(email, phone)`. Both credentials are validated before any
//! request goes out, and only one lookup may be in flight at a time.

use chrono::{DateTime, Utc};
use thiserror::Error;
use tracing::{debug, info};

use crate::order::{OrderLookup, OrderNumber, OrderRecord};
use crate::service::{OrderService, ServiceError};
use crate::types::{OrderStatus, StatusTone};
use crate::validation::FieldErrors;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TrackError {
    #[error("{0}")]
    Invalid(FieldErrors),

    #[error("Lookup already in progress")]
    InProgress,

    #[error(transparent)]
    Service(#[from] ServiceError),

    #[error("Lookup result belongs to an earlier session")]
    Stale,
}

impl From<TrackError> for crate::error::TechServeError {
    fn from(err: TrackError) -> Self {
        match err {
            TrackError::Invalid(e) => crate::error::TechServeError::Validation(e.to_string()),
            other => crate::error::TechServeError::Service(other.to_string()),
        }
    }
}

/// Display-ready status card for one order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderStatusView {
    pub order_number: OrderNumber,
    pub type_label: &'static str,
    pub os_text: String,
    pub status: OrderStatus,
    pub badge: String,
    pub tone: StatusTone,
    pub progress_percent: u8,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&OrderRecord> for OrderStatusView {
    fn from(record: &OrderRecord) -> Self {
        Self {
            order_number: record.order_number.clone(),
            type_label: record.installation_type.short_label(),
            os_text: record.os_text(),
            status: record.status,
            badge: record.status.badge(),
            tone: record.status.tone(),
            progress_percent: record.progress_percent(),
            created_at: record.created_at,
            updated_at: record.updated_at,
        }
    }
}

/// An in-flight lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackingTicket {
    generation: u64,
    lookup: OrderLookup,
}

impl TrackingTicket {
    pub fn lookup(&self) -> &OrderLookup {
        &self.lookup
    }
}

#[derive(Debug, Clone, Default)]
pub struct OrderTracker {
    busy: bool,
    generation: u64,
    results: Option<Vec<OrderStatusView>>,
}

impl OrderTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_busy(&self) -> bool {
        self.busy
    }

    /// Results of the last completed lookup.
    pub fn results(&self) -> Option<&[OrderStatusView]> {
        self.results.as_deref()
    }

    pub fn begin_lookup(&mut self, email: &str, phone: &str) -> Result<TrackingTicket, TrackError> {
        if self.busy {
            return Err(TrackError::InProgress);
        }
        let lookup = OrderLookup::new(email, phone).map_err(TrackError::Invalid)?;
        self.busy = true;
        debug!("Order lookup started for {}", lookup.email);

        Ok(TrackingTicket {
            generation: self.generation,
            lookup,
        })
    }

    /// A not-found answer is an empty list, not an error.
    pub fn complete_lookup(
        &mut self,
        ticket: TrackingTicket,
        result: Result<Vec<OrderRecord>, ServiceError>,
    ) -> Result<Vec<OrderStatusView>, TrackError> {
        if ticket.generation != self.generation {
            return Err(TrackError::Stale);
        }
        self.busy = false;

        let records = match result {
            Ok(records) => records,
            Err(e) if e.is_not_found() => Vec::new(),
            Err(e) => return Err(e.into()),
        };

        let views: Vec<OrderStatusView> = records.iter().map(OrderStatusView::from).collect();
        info!("{} order(s) found for {}", views.len(), ticket.lookup.email);
        self.results = Some(views.clone());
        Ok(views)
    }

    pub fn track(
        &mut self,
        service: &dyn OrderService,
        email: &str,
        phone: &str,
    ) -> Result<Vec<OrderStatusView>, TrackError> {
        let ticket = self.begin_lookup(email, phone)?;
        let result = service.find_orders(ticket.lookup());
        self.complete_lookup(ticket, result)
    }

    /// Back to the login view; in-flight lookups are discarded.
    pub fn reset(&mut self) {
        self.generation += 1;
        self.busy = false;
        self.results = None;
    }
}
