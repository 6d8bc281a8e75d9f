//! Step navigator
//!
//! Linear five-step progression through the order wizard:
//!
//! ```text
//! InstallationType -> OsSelection -> VersionSelection -> CustomerInfo -> Summary
//! ```
//!
//! Moving forward requires the predicate of the current step and of every
//! step before it to hold (see [`SelectionState::check_advance`]), so an
//! earlier choice undone later still blocks; moving back is always allowed
//! above the first step. There is no terminal state beyond the summary, only a reset.

use std::fmt;
use thiserror::Error;
use tracing::debug;

use crate::selection::SelectionState;
use crate::validation::FieldErrors;

/// Wizard steps in display order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
#[repr(u8)]
pub enum WizardStep {
    /// Full installation or dual boot
    #[default]
    InstallationType = 1,
    /// One OS, or two distinct ones for dual boot
    OsSelection = 2,
    /// A version per selected OS
    VersionSelection = 3,
    /// Contact details
    CustomerInfo = 4,
    /// Priced summary; submission lands here
    Summary = 5,
}

impl WizardStep {
    /// Total number of wizard steps.
    pub const TOTAL_STEPS: usize = 5;

    pub const fn all() -> &'static [Self] {
        &[
            Self::InstallationType,
            Self::OsSelection,
            Self::VersionSelection,
            Self::CustomerInfo,
            Self::Summary,
        ]
    }

    pub const fn next(self) -> Option<Self> {
        match self {
            Self::InstallationType => Some(Self::OsSelection),
            Self::OsSelection => Some(Self::VersionSelection),
            Self::VersionSelection => Some(Self::CustomerInfo),
            Self::CustomerInfo => Some(Self::Summary),
            Self::Summary => None,
        }
    }

    pub const fn previous(self) -> Option<Self> {
        match self {
            Self::InstallationType => None,
            Self::OsSelection => Some(Self::InstallationType),
            Self::VersionSelection => Some(Self::OsSelection),
            Self::CustomerInfo => Some(Self::VersionSelection),
            Self::Summary => Some(Self::CustomerInfo),
        }
    }

    /// Step number, 1-indexed for display.
    pub const fn step_number(self) -> usize {
        self as usize
    }

    pub const fn from_number(number: usize) -> Option<Self> {
        match number {
            1 => Some(Self::InstallationType),
            2 => Some(Self::OsSelection),
            3 => Some(Self::VersionSelection),
            4 => Some(Self::CustomerInfo),
            5 => Some(Self::Summary),
            _ => None,
        }
    }

    pub const fn title(self) -> &'static str {
        match self {
            Self::InstallationType => "Installation Type",
            Self::OsSelection => "Operating System",
            Self::VersionSelection => "Version",
            Self::CustomerInfo => "Customer Information",
            Self::Summary => "Summary",
        }
    }

    pub const fn can_go_back(self) -> bool {
        self.previous().is_some()
    }
}

impl fmt::Display for WizardStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.title())
    }
}

/// Why a step change was refused. Messages are shown to the customer as-is.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NavigationError {
    #[error("Please select an installation type")]
    NoInstallationType,

    #[error("Please select operating system(s)")]
    NoOsSelected,

    #[error("{}", if *required > 1 { "Please select versions for both operating systems" } else { "Please select a version" })]
    VersionsIncomplete { required: usize },

    #[error("Please correct the highlighted fields ({0})")]
    CustomerInvalid(FieldErrors),

    #[error("Already at the first step")]
    AtFirstStep,

    #[error("Already at the summary")]
    AtLastStep,
}

impl From<NavigationError> for crate::error::TechServeError {
    fn from(err: NavigationError) -> Self {
        crate::error::TechServeError::Navigation(err.to_string())
    }
}

/// Progress indicator state of a single step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepStatus {
    Completed,
    Current,
    Upcoming,
}

/// Owns the current wizard step and enforces the transition rules.
#[derive(Debug, Clone, Default)]
pub struct StepNavigator {
    current: WizardStep,
}

impl StepNavigator {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn current(&self) -> WizardStep {
        self.current
    }

    /// Advance one step if the predicates up to and including the current
    /// step hold.
    pub fn forward(&mut self, selection: &SelectionState) -> Result<WizardStep, NavigationError> {
        let next = self.current.next().ok_or(NavigationError::AtLastStep)?;
        for step in WizardStep::all().iter().take_while(|s| **s <= self.current) {
            selection.check_advance(*step)?;
        }

        debug!("Wizard step {} -> {}", self.current, next);
        self.current = next;
        Ok(next)
    }

    /// Go back one step. Never blocked above the first step.
    pub fn backward(&mut self) -> Result<WizardStep, NavigationError> {
        let previous = self.current.previous().ok_or(NavigationError::AtFirstStep)?;

        debug!("Wizard step {} -> {}", self.current, previous);
        self.current = previous;
        Ok(previous)
    }

    /// Land on the summary after a successful submission.
    pub fn finish(&mut self) {
        debug!("Wizard step {} -> {}", self.current, WizardStep::Summary);
        self.current = WizardStep::Summary;
    }

    pub fn reset(&mut self) {
        self.current = WizardStep::InstallationType;
    }

    /// Status of every step, for the progress indicator.
    pub fn progress(&self) -> Vec<(WizardStep, StepStatus)> {
        WizardStep::all()
            .iter()
            .map(|&step| {
                let status = match step.cmp(&self.current) {
                    std::cmp::Ordering::Less => StepStatus::Completed,
                    std::cmp::Ordering::Equal => StepStatus::Current,
                    std::cmp::Ordering::Greater => StepStatus::Upcoming,
                };
                (step, status)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{CatalogSnapshot, OperatingSystem, OsId, OsVersion, VersionId};
    use crate::order::OrderNumber;
    use crate::selection::Slot;
    use crate::types::{InstallationType, OsKind};
    use crate::validation::CustomerField;
    use std::time::Instant;

    fn catalog() -> CatalogSnapshot {
        CatalogSnapshot::from_records(vec![OperatingSystem {
            id: OsId(3),
            name: "Ubuntu".to_string(),
            kind: OsKind::Linux,
            logo_url: None,
            is_active: true,
            versions: vec![OsVersion {
                id: VersionId(7),
                name: "22.04 LTS".to_string(),
                is_active: true,
            }],
        }])
    }

    fn selection() -> SelectionState {
        SelectionState::new(OrderNumber::parse("TS-1234561234").unwrap())
    }

    // =========================================================================
    // WizardStep Tests
    // =========================================================================

    #[test]
    fn test_step_sequence() {
        let mut step = WizardStep::InstallationType;
        let mut count = 1;
        while let Some(next) = step.next() {
            assert_eq!(next.previous(), Some(step));
            step = next;
            count += 1;
        }
        assert_eq!(step, WizardStep::Summary);
        assert_eq!(count, WizardStep::TOTAL_STEPS);
    }

    #[test]
    fn test_step_numbers_round_trip() {
        for step in WizardStep::all() {
            assert_eq!(WizardStep::from_number(step.step_number()), Some(*step));
        }
        assert_eq!(WizardStep::from_number(0), None);
        assert_eq!(WizardStep::from_number(6), None);
    }

    #[test]
    fn test_first_step_cannot_go_back() {
        assert!(!WizardStep::InstallationType.can_go_back());
        assert!(WizardStep::Summary.can_go_back());
    }

    // =========================================================================
    // StepNavigator Tests
    // =========================================================================

    #[test]
    fn test_forward_blocked_without_type() {
        let mut nav = StepNavigator::new();
        let err = nav.forward(&selection()).unwrap_err();
        assert_eq!(err, NavigationError::NoInstallationType);
        assert_eq!(nav.current(), WizardStep::InstallationType);
    }

    #[test]
    fn test_forward_through_all_steps() {
        let cat = catalog();
        let mut sel = selection();
        let mut nav = StepNavigator::new();

        sel.set_installation_type(InstallationType::Full, Instant::now(), |_| true);
        nav.forward(&sel).unwrap();

        assert_eq!(nav.forward(&sel), Err(NavigationError::NoOsSelected));
        sel.select_single_os(&cat, OsId(3)).unwrap();
        nav.forward(&sel).unwrap();

        let err = nav.forward(&sel).unwrap_err();
        assert_eq!(err.to_string(), "Please select a version");
        sel.select_version(&cat, Slot::First, VersionId(7)).unwrap();
        nav.forward(&sel).unwrap();

        assert!(matches!(nav.forward(&sel), Err(NavigationError::CustomerInvalid(_))));
        sel.set_customer_field(CustomerField::Name, "Jane");
        sel.set_customer_field(CustomerField::Email, "jane@example.com");
        sel.set_customer_field(CustomerField::Phone, "0793587167");
        sel.set_customer_field(CustomerField::Address, "Nairobi");
        assert_eq!(nav.forward(&sel), Ok(WizardStep::Summary));

        assert_eq!(nav.forward(&sel), Err(NavigationError::AtLastStep));
    }

    #[test]
    fn test_forward_rechecks_earlier_steps() {
        let cat = catalog();
        let mut sel = selection();
        let mut nav = StepNavigator::new();

        sel.set_installation_type(InstallationType::Full, Instant::now(), |_| true);
        nav.forward(&sel).unwrap();
        sel.select_single_os(&cat, OsId(3)).unwrap();
        nav.forward(&sel).unwrap();
        sel.select_version(&cat, Slot::First, VersionId(7)).unwrap();
        nav.forward(&sel).unwrap();
        sel.set_customer_field(CustomerField::Name, "Jane");
        sel.set_customer_field(CustomerField::Email, "jane@example.com");
        sel.set_customer_field(CustomerField::Phone, "0793587167");
        sel.set_customer_field(CustomerField::Address, "Nairobi");

        // Switching type on the customer step drops the OS choice
        sel.set_installation_type(InstallationType::Dual, Instant::now(), |_| true);
        assert_eq!(nav.forward(&sel), Err(NavigationError::NoOsSelected));
        assert_eq!(nav.current(), WizardStep::CustomerInfo);
    }

    #[test]
    fn test_dual_versions_message() {
        let err = NavigationError::VersionsIncomplete { required: 2 };
        assert_eq!(err.to_string(), "Please select versions for both operating systems");
    }

    #[test]
    fn test_backward_is_unconditional() {
        let mut sel = selection();
        let mut nav = StepNavigator::new();
        sel.set_installation_type(InstallationType::Dual, Instant::now(), |_| true);
        nav.forward(&sel).unwrap();

        assert_eq!(nav.backward(), Ok(WizardStep::InstallationType));
        assert_eq!(nav.backward(), Err(NavigationError::AtFirstStep));
    }

    #[test]
    fn test_progress_statuses() {
        let mut sel = selection();
        let mut nav = StepNavigator::new();
        sel.set_installation_type(InstallationType::Full, Instant::now(), |_| true);
        nav.forward(&sel).unwrap();

        let progress = nav.progress();
        assert_eq!(progress.len(), WizardStep::TOTAL_STEPS);
        assert_eq!(progress[0], (WizardStep::InstallationType, StepStatus::Completed));
        assert_eq!(progress[1], (WizardStep::OsSelection, StepStatus::Current));
        assert_eq!(progress[4], (WizardStep::Summary, StepStatus::Upcoming));

        nav.reset();
        assert_eq!(nav.current(), WizardStep::InstallationType);
    }
}
