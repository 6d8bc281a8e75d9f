//! Selection state machine
//!
//! Holds everything the customer has chosen so far and keeps it consistent:
//!
//! - `full` installs hold at most one OS, `dual` installs at most two distinct ones
//! - a version is only kept for a slot whose OS is set; changing the OS in a
//!   slot clears its version
//! - switching installation type clears OS and version choices, after the
//!   user confirms, unless nothing was selected yet
//!
//! A confirmed type switch arms a time-limited undo. The snapshot is an
//! explicit value with its own arming instant; nothing runs on a timer.
//!
//! Every operation either applies completely or leaves the state untouched.
//! The one deliberate exception is an invalid dual-boot pair, whose defined
//! outcome is to clear the OS selection.

use std::collections::BTreeSet;
use std::fmt;
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::debug;

use crate::catalog::{CatalogSnapshot, OsId, VersionId};
use crate::navigator::{NavigationError, WizardStep};
use crate::order::OrderNumber;
use crate::types::{AddOn, InstallationType};
use crate::validation::{self, CustomerField, CustomerInfo};

/// Default lifetime of the undo offered after an installation type switch.
pub const DEFAULT_UNDO_WINDOW: Duration = Duration::from_secs(10);

/// Prompt shown before a type switch discards OS selections.
pub const SWITCH_CONFIRMATION: &str =
    "Switching installation type will clear your current OS selections. Continue?";

/// Positional index of an OS within the selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Slot {
    First,
    Second,
}

impl Slot {
    pub const ALL: [Slot; 2] = [Slot::First, Slot::Second];

    pub const fn index(self) -> usize {
        match self {
            Self::First => 0,
            Self::Second => 1,
        }
    }
}

impl fmt::Display for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::First => write!(f, "first"),
            Self::Second => write!(f, "second"),
        }
    }
}

/// Selection consistency errors, surfaced next to the offending control.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SelectionError {
    #[error("Please select both operating systems")]
    DualBothRequired,

    #[error("Please select two different operating systems")]
    DualMustDiffer,

    #[error("Please select an installation type first")]
    NoInstallationType,

    #[error("This selection is only available for {expected} installations (current: {actual})")]
    WrongInstallationType {
        expected: InstallationType,
        actual: InstallationType,
    },

    #[error("Operating system {0} is not available")]
    UnknownOs(OsId),

    #[error("Version {version} is not available for operating system {os}")]
    UnknownVersion { os: OsId, version: VersionId },

    #[error("No operating system selected in the {0} slot")]
    EmptySlot(Slot),

    #[error("Nothing to undo")]
    UndoUnavailable,

    #[error("The order has already been sent; start a new order to change it")]
    OrderLocked,
}

impl From<SelectionError> for crate::error::TechServeError {
    fn from(err: SelectionError) -> Self {
        crate::error::TechServeError::Selection(err.to_string())
    }
}

/// The part of the selection that an undo restores.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectionSnapshot {
    pub installation_type: Option<InstallationType>,
    pub os_ids: Vec<OsId>,
    pub version_ids: [Option<VersionId>; 2],
}

#[derive(Debug, Clone)]
struct PendingUndo {
    snapshot: SelectionSnapshot,
    armed_at: Instant,
}

/// Result of an installation type change request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeChange {
    /// The type is now set; `cleared` reports whether OS choices were dropped.
    Applied {
        installation_type: InstallationType,
        cleared: bool,
        undo_armed: bool,
    },
    /// The user declined the confirmation; nothing changed.
    Declined,
    /// The order is submitted or being submitted; nothing changed.
    Locked,
}

/// How many versions are chosen versus how many the installation type needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VersionProgress {
    pub selected: usize,
    pub required: usize,
}

impl VersionProgress {
    pub fn is_complete(&self) -> bool {
        self.selected >= self.required && self.required > 0
    }
}

/// Session-scoped selection state.
#[derive(Debug, Clone)]
pub struct SelectionState {
    installation_type: Option<InstallationType>,
    os_ids: Vec<OsId>,
    version_ids: [Option<VersionId>; 2],
    /// The two dual-boot drop-downs, which may hold an invalid pair
    dual_draft: [Option<OsId>; 2],
    /// Inline error under the dual-boot drop-downs
    dual_error: Option<SelectionError>,
    customer: CustomerInfo,
    add_ons: BTreeSet<AddOn>,
    order_number: OrderNumber,
    undo: Option<PendingUndo>,
    undo_window: Duration,
}

impl SelectionState {
    pub fn new(order_number: OrderNumber) -> Self {
        Self::with_undo_window(order_number, DEFAULT_UNDO_WINDOW)
    }

    pub fn with_undo_window(order_number: OrderNumber, undo_window: Duration) -> Self {
        Self {
            installation_type: None,
            os_ids: Vec::with_capacity(2),
            version_ids: [None; 2],
            dual_draft: [None; 2],
            dual_error: None,
            customer: CustomerInfo::default(),
            add_ons: BTreeSet::new(),
            order_number,
            undo: None,
            undo_window,
        }
    }

    // ------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------

    pub fn installation_type(&self) -> Option<InstallationType> {
        self.installation_type
    }

    pub fn selected_os_ids(&self) -> &[OsId] {
        &self.os_ids
    }

    pub fn os_at(&self, slot: Slot) -> Option<OsId> {
        self.os_ids.get(slot.index()).copied()
    }

    /// Version for a slot; `None` whenever the slot has no OS.
    pub fn version_at(&self, slot: Slot) -> Option<VersionId> {
        self.os_at(slot).and(self.version_ids[slot.index()])
    }

    pub fn dual_draft(&self) -> [Option<OsId>; 2] {
        self.dual_draft
    }

    pub fn dual_error(&self) -> Option<&SelectionError> {
        self.dual_error.as_ref()
    }

    pub fn customer(&self) -> &CustomerInfo {
        &self.customer
    }

    pub fn add_ons(&self) -> &BTreeSet<AddOn> {
        &self.add_ons
    }

    pub fn has_add_on(&self, add_on: AddOn) -> bool {
        self.add_ons.contains(&add_on)
    }

    pub fn order_number(&self) -> &OrderNumber {
        &self.order_number
    }

    pub fn undo_window(&self) -> Duration {
        self.undo_window
    }

    pub fn snapshot(&self) -> SelectionSnapshot {
        SelectionSnapshot {
            installation_type: self.installation_type,
            os_ids: self.os_ids.clone(),
            version_ids: self.version_ids,
        }
    }

    /// Selected slots in order.
    pub fn slots(&self) -> impl Iterator<Item = Slot> + '_ {
        Slot::ALL.into_iter().take(self.os_ids.len())
    }

    pub fn version_progress(&self) -> VersionProgress {
        let required = self
            .installation_type
            .map(InstallationType::required_slots)
            .unwrap_or(0);
        let selected = self.slots().filter(|s| self.version_at(*s).is_some()).count();
        VersionProgress { selected, required }
    }

    // ------------------------------------------------------------------
    // Installation type & undo
    // ------------------------------------------------------------------

    /// Set the installation type.
    ///
    /// When a different type is already set and an OS is selected, `confirm`
    /// is asked with [`SWITCH_CONFIRMATION`]; declining changes nothing.
    pub fn set_installation_type<F>(
        &mut self,
        installation_type: InstallationType,
        now: Instant,
        confirm: F,
    ) -> TypeChange
    where
        F: FnOnce(&str) -> bool,
    {
        let previous = self.snapshot();
        let switching = self.installation_type != Some(installation_type);
        let mut cleared = false;

        if switching {
            if !self.os_ids.is_empty() && !confirm(SWITCH_CONFIRMATION) {
                debug!("Installation type switch to {} declined", installation_type);
                return TypeChange::Declined;
            }
            cleared = !self.os_ids.is_empty();
            self.clear_os_selection();
            self.dual_draft = [None; 2];
        }

        self.installation_type = Some(installation_type);

        // Only a switch away from a previously chosen type can be undone
        let undo_armed = switching && previous.installation_type.is_some();
        if undo_armed {
            self.undo = Some(PendingUndo {
                snapshot: previous,
                armed_at: now,
            });
        }

        debug!(
            "Installation type set to {} (cleared={}, undo_armed={})",
            installation_type, cleared, undo_armed
        );

        TypeChange::Applied {
            installation_type,
            cleared,
            undo_armed,
        }
    }

    /// Returns true while the undo from the last type switch can still be used.
    pub fn undo_available(&self, now: Instant) -> bool {
        self.undo_remaining(now).is_some()
    }

    /// Time left on the pending undo, if any.
    pub fn undo_remaining(&self, now: Instant) -> Option<Duration> {
        let pending = self.undo.as_ref()?;
        let elapsed = now.saturating_duration_since(pending.armed_at);
        self.undo_window.checked_sub(elapsed).filter(|d| !d.is_zero())
    }

    /// Restore the selection captured before the last type switch.
    ///
    /// The undo is single-use and expires after the undo window.
    pub fn undo(&mut self, now: Instant) -> Result<SelectionSnapshot, SelectionError> {
        if !self.undo_available(now) {
            self.undo = None;
            return Err(SelectionError::UndoUnavailable);
        }
        let pending = self.undo.take().ok_or(SelectionError::UndoUnavailable)?;
        let restored = pending.snapshot;

        self.installation_type = restored.installation_type;
        self.os_ids = restored.os_ids.clone();
        self.version_ids = restored.version_ids;
        self.dual_error = None;
        self.dual_draft = match self.installation_type {
            Some(InstallationType::Dual) => [self.os_at(Slot::First), self.os_at(Slot::Second)],
            _ => [None; 2],
        };

        debug!("Selection restored by undo: {:?}", restored);
        Ok(restored)
    }

    // ------------------------------------------------------------------
    // OS & version selection
    // ------------------------------------------------------------------

    fn require_type(&self, expected: InstallationType) -> Result<(), SelectionError> {
        match self.installation_type {
            None => Err(SelectionError::NoInstallationType),
            Some(actual) if actual != expected => {
                Err(SelectionError::WrongInstallationType { expected, actual })
            }
            Some(_) => Ok(()),
        }
    }

    fn clear_os_selection(&mut self) {
        self.os_ids.clear();
        self.version_ids = [None; 2];
        self.dual_error = None;
    }

    /// Full-install path: choose the single OS.
    pub fn select_single_os(
        &mut self,
        catalog: &CatalogSnapshot,
        os_id: OsId,
    ) -> Result<(), SelectionError> {
        self.require_type(InstallationType::Full)?;
        if !catalog.contains_os(os_id) {
            return Err(SelectionError::UnknownOs(os_id));
        }

        self.os_ids.clear();
        self.os_ids.push(os_id);
        self.version_ids = [None; 2];
        debug!("Single OS selected: {}", os_id);
        Ok(())
    }

    /// Dual-boot path: choose both operating systems at once.
    ///
    /// An incomplete or duplicate pair clears the OS selection and reports
    /// why; the reason also stays on the state as the inline error.
    pub fn select_dual_os(
        &mut self,
        catalog: &CatalogSnapshot,
        first: Option<OsId>,
        second: Option<OsId>,
    ) -> Result<(), SelectionError> {
        self.require_type(InstallationType::Dual)?;
        for id in [first, second].into_iter().flatten() {
            if !catalog.contains_os(id) {
                return Err(SelectionError::UnknownOs(id));
            }
        }

        self.dual_draft = [first, second];

        match (first, second) {
            (Some(a), Some(b)) if a != b => {
                self.os_ids.clear();
                self.os_ids.extend([a, b]);
                self.version_ids = [None; 2];
                self.dual_error = None;
                debug!("Dual OS selected: {} + {}", a, b);
                Ok(())
            }
            (Some(_), Some(_)) => self.reject_dual(SelectionError::DualMustDiffer),
            _ => self.reject_dual(SelectionError::DualBothRequired),
        }
    }

    fn reject_dual(&mut self, error: SelectionError) -> Result<(), SelectionError> {
        self.clear_os_selection();
        self.dual_error = Some(error.clone());
        debug!("Dual OS selection rejected: {}", error);
        Err(error)
    }

    /// Change one dual-boot drop-down and re-validate the pair.
    pub fn set_dual_slot(
        &mut self,
        catalog: &CatalogSnapshot,
        slot: Slot,
        os_id: Option<OsId>,
    ) -> Result<(), SelectionError> {
        self.require_type(InstallationType::Dual)?;
        let mut draft = self.dual_draft;
        draft[slot.index()] = os_id;
        self.select_dual_os(catalog, draft[0], draft[1])
    }

    /// Choose the version for a selected slot.
    pub fn select_version(
        &mut self,
        catalog: &CatalogSnapshot,
        slot: Slot,
        version_id: VersionId,
    ) -> Result<VersionProgress, SelectionError> {
        let os_id = self.os_at(slot).ok_or(SelectionError::EmptySlot(slot))?;
        if catalog.version(os_id, version_id).is_none() {
            return Err(SelectionError::UnknownVersion {
                os: os_id,
                version: version_id,
            });
        }

        self.version_ids[slot.index()] = Some(version_id);
        let progress = self.version_progress();
        debug!(
            "Version {} selected for {} slot ({}/{})",
            version_id, slot, progress.selected, progress.required
        );
        Ok(progress)
    }

    // ------------------------------------------------------------------
    // Customer info & add-ons
    // ------------------------------------------------------------------

    pub fn set_customer_field(&mut self, field: CustomerField, value: impl Into<String>) {
        self.customer.set(field, value);
    }

    pub fn set_add_on(&mut self, add_on: AddOn, enabled: bool) {
        if enabled {
            self.add_ons.insert(add_on);
        } else {
            self.add_ons.remove(&add_on);
        }
    }

    // ------------------------------------------------------------------
    // Step predicates
    // ------------------------------------------------------------------

    /// Why the given step cannot be left forwards, if it cannot.
    pub fn check_advance(&self, step: WizardStep) -> Result<(), NavigationError> {
        match step {
            WizardStep::InstallationType => {
                self.installation_type
                    .ok_or(NavigationError::NoInstallationType)?;
            }
            WizardStep::OsSelection => {
                let required = self
                    .installation_type
                    .ok_or(NavigationError::NoInstallationType)?
                    .required_slots();
                if self.os_ids.len() != required {
                    return Err(NavigationError::NoOsSelected);
                }
            }
            WizardStep::VersionSelection => {
                let progress = self.version_progress();
                if progress.required == 0 || self.os_ids.len() != progress.required {
                    return Err(NavigationError::NoOsSelected);
                }
                if !progress.is_complete() {
                    return Err(NavigationError::VersionsIncomplete {
                        required: progress.required,
                    });
                }
            }
            WizardStep::CustomerInfo => {
                validation::validate_customer(&self.customer)
                    .map_err(NavigationError::CustomerInvalid)?;
            }
            WizardStep::Summary => return Err(NavigationError::AtLastStep),
        }
        Ok(())
    }

    pub fn is_advanceable(&self, step: WizardStep) -> bool {
        self.check_advance(step).is_ok()
    }

    /// Clear every selection and adopt a fresh order number.
    pub fn reset(&mut self, order_number: OrderNumber) {
        *self = Self::with_undo_window(order_number, self.undo_window);
    }
}
