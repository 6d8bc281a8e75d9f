//! Type-safe domain enums for TechServe
//!
//! Wire values (`full`, `in_progress`, `additional_drivers`, ...) are fixed by
//! the order API, so both the strum and serde spellings are pinned here.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};

/// Installation type chosen on the first wizard step
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[derive(Display, EnumString, EnumIter)]
#[serde(rename_all = "lowercase")]
pub enum InstallationType {
    /// Single operating system, whole disk
    #[strum(serialize = "full")]
    Full,
    /// Two operating systems behind a boot manager
    #[strum(serialize = "dual")]
    Dual,
}

impl InstallationType {
    /// Number of OS slots this installation type fills.
    pub const fn required_slots(self) -> usize {
        match self {
            Self::Full => 1,
            Self::Dual => 2,
        }
    }

    /// Customer-facing label used by the summary and live preview.
    pub const fn label(self) -> &'static str {
        match self {
            Self::Full => "Full Installation",
            Self::Dual => "Dual Boot Installation",
        }
    }

    /// Short label used in order status listings.
    pub const fn short_label(self) -> &'static str {
        match self {
            Self::Full => "Full Installation",
            Self::Dual => "Dual Boot",
        }
    }
}

/// Operating system family
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[derive(Display, EnumString, EnumIter)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum OsKind {
    Windows,
    Linux,
}

/// Order lifecycle status, mutated only by an administrator after creation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[derive(Display, EnumString, EnumIter)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum OrderStatus {
    #[default]
    Pending,
    InProgress,
    Completed,
    Rejected,
    Cancelled,
}

/// Visual tone a status renders with; terminal statuses share full progress
/// and are told apart only by label and tone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusTone {
    Warning,
    Info,
    Success,
    Danger,
    Neutral,
}

impl OrderStatus {
    /// Progress bar percentage for status tracking.
    pub const fn progress_percent(self) -> u8 {
        match self {
            Self::Pending => 25,
            Self::InProgress => 60,
            Self::Completed | Self::Rejected | Self::Cancelled => 100,
        }
    }

    /// Returns true once no further work will happen on the order.
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Rejected | Self::Cancelled)
    }

    pub const fn tone(self) -> StatusTone {
        match self {
            Self::Pending => StatusTone::Warning,
            Self::InProgress => StatusTone::Info,
            Self::Completed => StatusTone::Success,
            Self::Rejected => StatusTone::Danger,
            Self::Cancelled => StatusTone::Neutral,
        }
    }

    /// Upper-case badge label, e.g. `IN_PROGRESS`.
    pub fn badge(self) -> String {
        self.to_string().to_uppercase()
    }
}

/// Optional paid extra attached to an order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[derive(Display, EnumString, EnumIter)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum AddOn {
    AdditionalDrivers,
    OfficeSuite,
}

impl AddOn {
    pub const fn label(self) -> &'static str {
        match self {
            Self::AdditionalDrivers => "Additional Drivers",
            Self::OfficeSuite => "Office Suite",
        }
    }
}
