//! TechServe Order Wizard Library
//!
//! This library provides the core of the TechServe OS-installation ordering
//! flow: catalog snapshot, selection state machine, step navigation, field
//! validation, pricing, and the order submission and status protocol.

pub mod app;
pub mod catalog;
pub mod cli;
pub mod config_file;
pub mod draft;
pub mod error;
pub mod navigator;
pub mod order;
pub mod pricing;
pub mod selection;
pub mod service;
pub mod types;
pub mod validation;

// Re-export session types
pub use app::{Notice, NoticeLevel, OrderStatusView, OrderTracker, OrderWizard, SubmissionOutcome};

// Re-export main types for convenience
pub use catalog::{CatalogSnapshot, OperatingSystem, OsId, OsVersion, VersionId};
pub use config_file::AppConfig;
pub use draft::OrderDraft;
pub use error::TechServeError;
pub use navigator::{NavigationError, StepNavigator, WizardStep};
pub use order::{OrderCreated, OrderLookup, OrderNumber, OrderRecord, OrderRequest, SubmissionError};
pub use pricing::{OrderSummary, PriceTable, ServiceType};
pub use selection::{SelectionError, SelectionState, Slot, TypeChange};
pub use types::{AddOn, InstallationType, OrderStatus, OsKind};
pub use validation::{CustomerField, CustomerInfo, FieldErrors};

// Order API clients
pub use service::{AddOnPricingPolicy, HttpOrderService, MemoryBackend, OrderService, ServiceError};
