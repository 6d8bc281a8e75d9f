//! Customer field validation
//!
//! Pure, stateless rules shared by inline (on-blur) feedback, the customer
//! step gate, submission and order lookup:
//!
//! | Field    | Rule                                                        |
//! |----------|-------------------------------------------------------------|
//! | required | non-empty after trimming                                    |
//! | email    | `local@domain.tld`, no whitespace, single `@`, no empty     |
//! |          | domain labels                                               |
//! | phone    | spaces/hyphens stripped, then `07` followed by 8 digits     |

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::LazyLock;
use strum::{Display, EnumIter, IntoEnumIterator};

static EMAIL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[^\s@]+@[^\s@.]+(\.[^\s@.]+)+$").expect("email pattern is valid")
});

static PHONE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^07[0-9]{8}$").expect("phone pattern is valid"));

pub const REQUIRED_MESSAGE: &str = "This field is required";
pub const EMAIL_MESSAGE: &str = "Please enter a valid email address";
pub const PHONE_MESSAGE: &str = "Phone number must start with 07 and have 10 digits";

/// Customer form fields, in form order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Display, EnumIter)]
#[strum(serialize_all = "lowercase")]
pub enum CustomerField {
    Name,
    Email,
    Phone,
    Address,
}

/// Customer contact details as typed into the form.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomerInfo {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub address: String,
}

impl CustomerInfo {
    pub fn get(&self, field: CustomerField) -> &str {
        match field {
            CustomerField::Name => &self.name,
            CustomerField::Email => &self.email,
            CustomerField::Phone => &self.phone,
            CustomerField::Address => &self.address,
        }
    }

    pub fn set(&mut self, field: CustomerField, value: impl Into<String>) {
        let value = value.into();
        match field {
            CustomerField::Name => self.name = value,
            CustomerField::Email => self.email = value,
            CustomerField::Phone => self.phone = value,
            CustomerField::Address => self.address = value,
        }
    }

    pub fn is_empty(&self) -> bool {
        CustomerField::iter().all(|f| self.get(f).trim().is_empty())
    }

    /// Copy with surrounding whitespace trimmed and the phone normalized,
    /// as sent to the backend.
    pub fn normalized(&self) -> Self {
        Self {
            name: self.name.trim().to_string(),
            email: self.email.trim().to_string(),
            phone: normalize_phone(&self.phone),
            address: self.address.trim().to_string(),
        }
    }
}

/// A single field-level validation failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    pub field: CustomerField,
    pub message: &'static str,
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

impl std::error::Error for FieldError {}

/// One error per invalid field, keyed by field.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldErrors(BTreeMap<CustomerField, &'static str>);

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn get(&self, field: CustomerField) -> Option<&'static str> {
        self.0.get(&field).copied()
    }

    pub fn contains(&self, field: CustomerField) -> bool {
        self.0.contains_key(&field)
    }

    /// Attach an inline error to a field, replacing any previous one.
    pub fn attach(&mut self, error: FieldError) {
        self.0.insert(error.field, error.message);
    }

    /// Remove the inline error from a field.
    pub fn clear(&mut self, field: CustomerField) {
        self.0.remove(&field);
    }

    pub fn clear_all(&mut self) {
        self.0.clear();
    }

    pub fn iter(&self) -> impl Iterator<Item = FieldError> + '_ {
        self.0
            .iter()
            .map(|(field, message)| FieldError {
                field: *field,
                message: *message,
            })
    }
}

impl fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.iter().map(|e| e.to_string()).collect();
        write!(f, "{}", parts.join("; "))
    }
}

impl std::error::Error for FieldErrors {}

/// Non-empty after trimming whitespace.
pub fn is_present(value: &str) -> bool {
    !value.trim().is_empty()
}

/// Standard `local@domain.tld` shape.
pub fn is_valid_email(value: &str) -> bool {
    EMAIL_RE.is_match(value.trim())
}

/// Strip the separators customers commonly type (spaces and hyphens).
pub fn normalize_phone(value: &str) -> String {
    value
        .trim()
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '-')
        .collect()
}

/// `07` followed by eight digits, after normalization.
pub fn is_valid_phone(value: &str) -> bool {
    PHONE_RE.is_match(&normalize_phone(value))
}

/// Strict form checked by the backend: no separators allowed.
pub fn is_canonical_phone(value: &str) -> bool {
    PHONE_RE.is_match(value)
}

/// Validate one field the way the on-blur handler does.
///
/// Every customer field is required; format rules apply only to non-empty values.
pub fn validate_field(field: CustomerField, value: &str) -> Result<(), FieldError> {
    let message = if !is_present(value) {
        REQUIRED_MESSAGE
    } else {
        match field {
            CustomerField::Email if !is_valid_email(value) => EMAIL_MESSAGE,
            CustomerField::Phone if !is_valid_phone(value) => PHONE_MESSAGE,
            _ => return Ok(()),
        }
    };

    Err(FieldError { field, message })
}

/// All-fields gate used before advancing past the customer step and before
/// submission. Values are never modified.
pub fn validate_customer(info: &CustomerInfo) -> Result<(), FieldErrors> {
    let mut errors = FieldErrors::new();
    for field in CustomerField::iter() {
        if let Err(e) = validate_field(field, info.get(field)) {
            errors.attach(e);
        }
    }

    if errors.is_empty() { Ok(()) } else { Err(errors) }
}

/// Both lookup credentials must independently pass before a lookup is issued.
pub fn validate_lookup(email: &str, phone: &str) -> Result<(), FieldErrors> {
    let mut errors = FieldErrors::new();
    if let Err(e) = validate_field(CustomerField::Email, email) {
        errors.attach(e);
    }
    if let Err(e) = validate_field(CustomerField::Phone, phone) {
        errors.attach(e);
    }

    if errors.is_empty() { Ok(()) } else { Err(errors) }
}
