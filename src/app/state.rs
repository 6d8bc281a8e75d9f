//! Session state definitions
//!
//! Types the wizard hands back to its binding layer: notices, submission
//! tickets and outcomes, and the per-slot version choices.

use crate::catalog::{OperatingSystem, OsVersion, VersionId};
use crate::order::{OrderCreated, OrderRequest, SubmissionError};
use crate::selection::Slot;

/// Severity of a blocking notice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Info,
    Success,
    Error,
}

/// Message the UI shows as a blocking alert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

impl Notice {
    pub fn info(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Info,
            message: message.into(),
        }
    }

    pub fn success(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Success,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Error,
            message: message.into(),
        }
    }
}

/// An in-flight submission: the request snapshot plus the session it belongs to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmissionTicket {
    pub(crate) generation: u64,
    pub(crate) request: OrderRequest,
}

impl SubmissionTicket {
    /// The exact payload to send.
    pub fn request(&self) -> &OrderRequest {
        &self.request
    }
}

/// How a completed submission was applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmissionOutcome {
    /// Order created; the wizard is on the summary step
    Created(OrderCreated),
    /// Rejected or not delivered; the wizard stays put with all input intact
    Failed(SubmissionError),
    /// The session was reset while the request was in flight
    Stale,
}

/// Version drop-down for one selected OS slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionChoice<'a> {
    pub slot: Slot,
    pub os: &'a OperatingSystem,
    pub selected: Option<VersionId>,
}

impl VersionChoice<'_> {
    pub fn options(&self) -> &[OsVersion] {
        &self.os.versions
    }

    /// Drop-down label, e.g. `Ubuntu Version` or `First OS: Ubuntu Version`.
    pub fn label(&self, dual: bool) -> String {
        if dual {
            let position = match self.slot {
                Slot::First => "First OS",
                Slot::Second => "Second OS",
            };
            format!("{}: {} Version", position, self.os.name)
        } else {
            format!("{} Version", self.os.name)
        }
    }
}
