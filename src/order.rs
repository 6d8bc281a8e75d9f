//! Order numbers, submission payloads and order records
//!
//! The request shape (`orderNumber`, `osSelections`, ...) and the record shape
//! (`order_number`, `os_selections`, ...) differ in casing; both are fixed by
//! the order API.

use chrono::{DateTime, Utc};
use rand::Rng;
use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;
use thiserror::Error;

use crate::catalog::{OsId, VersionId};
use crate::navigator::{NavigationError, WizardStep};
use crate::pricing::PriceTable;
use crate::selection::SelectionState;
use crate::service::ServiceError;
use crate::types::{AddOn, InstallationType, OrderStatus};
use crate::validation::{self, FieldErrors};

static ORDER_NUMBER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^TS-[0-9]{10}$").expect("order number pattern is valid"));

// ============================================================================
// Order number
// ============================================================================

/// Client-generated order reference, `TS-` followed by ten digits.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrderNumber(String);

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Invalid order number '{0}' (expected TS- followed by 10 digits)")]
pub struct InvalidOrderNumber(pub String);

impl OrderNumber {
    pub const PREFIX: &'static str = "TS-";

    /// Last six digits of the millisecond clock plus a random 4-digit suffix.
    pub fn generate() -> Self {
        Self::generate_at(Utc::now().timestamp_millis(), &mut rand::rng())
    }

    pub fn generate_at<R: Rng>(timestamp_millis: i64, rng: &mut R) -> Self {
        let clock = timestamp_millis.rem_euclid(1_000_000);
        let suffix: u16 = rng.random_range(1000..=9999);
        Self(format!("{}{:06}{}", Self::PREFIX, clock, suffix))
    }

    /// A fresh number guaranteed to differ from `previous`.
    pub fn generate_distinct(previous: &OrderNumber) -> Self {
        loop {
            let candidate = Self::generate();
            if &candidate != previous {
                return candidate;
            }
        }
    }

    pub fn parse(value: &str) -> Result<Self, InvalidOrderNumber> {
        let value = value.trim();
        if ORDER_NUMBER_RE.is_match(value) {
            Ok(Self(value.to_string()))
        } else {
            Err(InvalidOrderNumber(value.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Well-formed numbers only; records coming back from a backend are not
    /// re-checked on deserialization.
    pub fn is_well_formed(&self) -> bool {
        ORDER_NUMBER_RE.is_match(&self.0)
    }
}

impl FromStr for OrderNumber {
    type Err = InvalidOrderNumber;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for OrderNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for OrderNumber {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

// ============================================================================
// Submission payload
// ============================================================================

/// One `{osId, versionId}` pair, in slot order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OsSelection {
    pub os_id: OsId,
    pub version_id: VersionId,
}

/// A checked add-on with its price at submission time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddOnEntry {
    #[serde(rename = "type")]
    pub add_on: AddOn,
    #[serde(deserialize_with = "deserialize_price")]
    pub price: u32,
}

/// Order creation request, sent as a single atomic unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderRequest {
    pub order_number: OrderNumber,
    pub installation_type: InstallationType,
    pub customer_name: String,
    pub customer_email: String,
    pub customer_phone: String,
    pub customer_address: String,
    pub os_selections: Vec<OsSelection>,
    #[serde(default)]
    pub addons: Vec<AddOnEntry>,
}

/// Successful creation response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderCreated {
    #[serde(default)]
    pub message: String,
    pub order_id: u64,
    pub order_number: OrderNumber,
}

/// Why an order could not be submitted.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SubmissionError {
    #[error(transparent)]
    Incomplete(#[from] NavigationError),

    #[error("Submission already in progress")]
    InProgress,

    #[error("Order {0} has already been submitted")]
    AlreadySubmitted(OrderNumber),

    #[error("Orders are submitted from the customer information step (current: {0})")]
    WrongStep(WizardStep),

    #[error("Failed to submit your order. Please try again. Error: {0}")]
    Service(#[from] ServiceError),
}

impl From<SubmissionError> for crate::error::TechServeError {
    fn from(err: SubmissionError) -> Self {
        match err {
            SubmissionError::Incomplete(e) => e.into(),
            other => crate::error::TechServeError::Service(other.to_string()),
        }
    }
}

/// Assemble the creation request from a complete selection.
///
/// Every step predicate up to and including customer info must hold. Customer
/// fields are trimmed and the phone is normalized; add-on prices are read from
/// `prices` at call time.
pub fn build_order_request(
    selection: &SelectionState,
    prices: &PriceTable,
) -> Result<OrderRequest, SubmissionError> {
    for step in [
        WizardStep::InstallationType,
        WizardStep::OsSelection,
        WizardStep::VersionSelection,
        WizardStep::CustomerInfo,
    ] {
        selection.check_advance(step)?;
    }

    let installation_type = selection
        .installation_type()
        .ok_or(NavigationError::NoInstallationType)?;

    let os_selections = selection
        .slots()
        .map(|slot| {
            let os_id = selection.os_at(slot).ok_or(NavigationError::NoOsSelected)?;
            let version_id = selection.version_at(slot).ok_or(NavigationError::VersionsIncomplete {
                required: installation_type.required_slots(),
            })?;
            Ok(OsSelection { os_id, version_id })
        })
        .collect::<Result<Vec<_>, NavigationError>>()?;

    let addons = selection
        .add_ons()
        .iter()
        .map(|&add_on| AddOnEntry {
            add_on,
            price: prices.add_on_price(add_on),
        })
        .collect();

    let customer = selection.customer().normalized();

    Ok(OrderRequest {
        order_number: selection.order_number().clone(),
        installation_type,
        customer_name: customer.name,
        customer_email: customer.email,
        customer_phone: customer.phone,
        customer_address: customer.address,
        os_selections,
        addons,
    })
}

// ============================================================================
// Lookup & records
// ============================================================================

/// Contact credentials for an order status lookup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderLookup {
    pub email: String,
    pub phone: String,
}

impl OrderLookup {
    /// Validate both credentials; the phone is normalized the same way it was
    /// at submission.
    pub fn new(email: &str, phone: &str) -> Result<Self, FieldErrors> {
        validation::validate_lookup(email, phone)?;
        Ok(Self {
            email: email.trim().to_string(),
            phone: validation::normalize_phone(phone),
        })
    }
}

/// OS and version names as stored on an order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OsSelectionDetail {
    pub os_id: OsId,
    pub os_name: String,
    #[serde(default)]
    pub version_id: Option<VersionId>,
    #[serde(default)]
    pub version_name: Option<String>,
}

impl OsSelectionDetail {
    pub fn display_text(&self) -> String {
        match &self.version_name {
            Some(version) => format!("{} ({})", self.os_name, version),
            None => self.os_name.clone(),
        }
    }
}

/// Add-on row as stored on an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddOnRecord {
    pub addon_type: AddOn,
    #[serde(deserialize_with = "deserialize_price")]
    pub price: u32,
}

/// A stored order with its child rows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderRecord {
    pub id: u64,
    pub order_number: OrderNumber,
    pub installation_type: InstallationType,
    pub customer_name: String,
    pub customer_email: String,
    pub customer_phone: String,
    pub customer_address: String,
    #[serde(default)]
    pub status: OrderStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub os_selections: Vec<OsSelectionDetail>,
    #[serde(default)]
    pub addons: Vec<AddOnRecord>,
}

impl OrderRecord {
    /// `Ubuntu (22.04 LTS) + Windows 11 (Pro)`, or `Not specified`.
    pub fn os_text(&self) -> String {
        if self.os_selections.is_empty() {
            return "Not specified".to_string();
        }
        self.os_selections
            .iter()
            .map(OsSelectionDetail::display_text)
            .collect::<Vec<_>>()
            .join(" + ")
    }

    pub fn progress_percent(&self) -> u8 {
        self.status.progress_percent()
    }

    pub fn addons_total(&self) -> u32 {
        self.addons.iter().map(|a| a.price).sum()
    }
}

/// Prices arrive as integers, decimals (`30.00`) or decimal strings depending
/// on the backend; they are whole currency units here.
fn deserialize_price<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawPrice {
        Int(u64),
        Float(f64),
        Text(String),
    }

    let value = match RawPrice::deserialize(deserializer)? {
        RawPrice::Int(n) => n as f64,
        RawPrice::Float(f) => f,
        RawPrice::Text(s) => s
            .trim()
            .parse::<f64>()
            .map_err(|_| serde::de::Error::custom(format!("invalid price '{}'", s)))?,
    };

    if !value.is_finite() || value < 0.0 || value > u32::MAX as f64 {
        return Err(serde::de::Error::custom(format!("price out of range: {}", value)));
    }
    Ok(value.round() as u32)
}
