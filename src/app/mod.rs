//! Wizard session
//!
//! [`OrderWizard`] owns every piece of per-session state (catalog, prices,
//! selection, current step, inline errors, submission flags) and exposes one
//! command method per user action. A UI binding layer calls these and renders
//! from the accessors; nothing here touches a terminal or a network socket
//! except through an [`OrderService`] passed in.
//!
//! # Module Structure
//! - `state` - notices, submission tickets and outcomes, version choices
//! - `tracker` - order status lookup with its own busy flag
//! - Main module - the `OrderWizard` session controller

mod state;
mod tracker;

pub use state::{Notice, NoticeLevel, SubmissionOutcome, SubmissionTicket, VersionChoice};
pub use tracker::{OrderStatusView, OrderTracker, TrackError, TrackingTicket};

use std::time::Instant;
use tracing::{debug, info, warn};

use crate::catalog::{CatalogSnapshot, OsId, VersionId};
use crate::config_file::AppConfig;
use crate::navigator::{NavigationError, StepNavigator, StepStatus, WizardStep};
use crate::order::{self, OrderCreated, OrderNumber, SubmissionError};
use crate::pricing::{self, OrderSummary, PriceTable};
use crate::selection::{
    SelectionError, SelectionSnapshot, SelectionState, Slot, TypeChange, VersionProgress,
};
use crate::service::{OrderService, ServiceError};
use crate::types::{AddOn, InstallationType};
use crate::validation::{self, CustomerField, FieldErrors};

/// One customer's pass through the order wizard.
#[derive(Debug, Clone)]
pub struct OrderWizard {
    catalog: CatalogSnapshot,
    prices: PriceTable,
    currency: String,
    selection: SelectionState,
    navigator: StepNavigator,
    /// Inline errors under the customer fields
    field_errors: FieldErrors,
    /// Bumped on reset; completions carrying an older value are discarded
    generation: u64,
    submitting: bool,
    submitted: Option<OrderCreated>,
    summary: Option<OrderSummary>,
    notice: Option<Notice>,
}

impl OrderWizard {
    pub fn new(catalog: CatalogSnapshot, config: &AppConfig) -> Self {
        let selection =
            SelectionState::with_undo_window(OrderNumber::generate(), config.undo_window());
        info!(
            "Order wizard started with {} operating systems, order {}",
            catalog.len(),
            selection.order_number()
        );

        Self {
            catalog,
            prices: config.pricing,
            currency: config.currency.clone(),
            selection,
            navigator: StepNavigator::new(),
            field_errors: FieldErrors::new(),
            generation: 0,
            submitting: false,
            submitted: None,
            summary: None,
            notice: None,
        }
    }

    /// Load the catalog once from `service` and start a session.
    pub fn load(service: &dyn OrderService, config: &AppConfig) -> Result<Self, ServiceError> {
        let records = service.load_catalog()?;
        Ok(Self::new(CatalogSnapshot::from_records(records), config))
    }

    // ------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------

    pub fn catalog(&self) -> &CatalogSnapshot {
        &self.catalog
    }

    pub fn prices(&self) -> &PriceTable {
        &self.prices
    }

    pub fn currency(&self) -> &str {
        &self.currency
    }

    pub fn selection(&self) -> &SelectionState {
        &self.selection
    }

    pub fn current_step(&self) -> WizardStep {
        self.navigator.current()
    }

    pub fn progress(&self) -> Vec<(WizardStep, StepStatus)> {
        self.navigator.progress()
    }

    pub fn order_number(&self) -> &OrderNumber {
        self.selection.order_number()
    }

    pub fn field_errors(&self) -> &FieldErrors {
        &self.field_errors
    }

    pub fn notice(&self) -> Option<&Notice> {
        self.notice.as_ref()
    }

    pub fn take_notice(&mut self) -> Option<Notice> {
        self.notice.take()
    }

    pub fn is_submitting(&self) -> bool {
        self.submitting
    }

    pub fn submitted(&self) -> Option<&OrderCreated> {
        self.submitted.as_ref()
    }

    /// Summary computed when the summary step was last entered.
    pub fn summary(&self) -> Option<&OrderSummary> {
        self.summary.as_ref()
    }

    pub fn live_preview(&self) -> String {
        pricing::live_preview(&self.catalog, &self.selection)
    }

    pub fn can_advance(&self) -> bool {
        self.selection.is_advanceable(self.current_step())
    }

    /// One version drop-down per selected OS slot.
    pub fn version_choices(&self) -> Vec<VersionChoice<'_>> {
        self.selection
            .slots()
            .filter_map(|slot| {
                let os = self.catalog.os(self.selection.os_at(slot)?)?;
                Some(VersionChoice {
                    slot,
                    os,
                    selected: self.selection.version_at(slot),
                })
            })
            .collect()
    }

    pub fn formatted_total(&self) -> Option<String> {
        let installation_type = self.selection.installation_type()?;
        let total = self.prices.total(installation_type, self.selection.add_ons());
        Some(pricing::format_amount(&self.currency, total))
    }

    // ------------------------------------------------------------------
    // Selection commands
    // ------------------------------------------------------------------

    pub fn choose_installation_type<F>(
        &mut self,
        installation_type: InstallationType,
        confirm: F,
    ) -> TypeChange
    where
        F: FnOnce(&str) -> bool,
    {
        self.choose_installation_type_at(installation_type, Instant::now(), confirm)
    }

    pub fn choose_installation_type_at<F>(
        &mut self,
        installation_type: InstallationType,
        now: Instant,
        confirm: F,
    ) -> TypeChange
    where
        F: FnOnce(&str) -> bool,
    {
        if self.ensure_editable().is_err() {
            return TypeChange::Locked;
        }
        self.selection.set_installation_type(installation_type, now, confirm)
    }

    pub fn undo_available(&self) -> bool {
        self.selection.undo_available(Instant::now())
    }

    pub fn undo_type_change(&mut self) -> Result<SelectionSnapshot, SelectionError> {
        self.undo_type_change_at(Instant::now())
    }

    pub fn undo_type_change_at(&mut self, now: Instant) -> Result<SelectionSnapshot, SelectionError> {
        self.ensure_editable()?;
        let restored = self.selection.undo(now)?;
        self.notice = Some(Notice::info("Previous selection restored"));
        Ok(restored)
    }

    pub fn select_os(&mut self, os_id: OsId) -> Result<(), SelectionError> {
        self.ensure_editable()?;
        self.selection.select_single_os(&self.catalog, os_id)
    }

    pub fn select_dual_os(
        &mut self,
        first: Option<OsId>,
        second: Option<OsId>,
    ) -> Result<(), SelectionError> {
        self.ensure_editable()?;
        self.selection.select_dual_os(&self.catalog, first, second)
    }

    pub fn set_dual_slot(&mut self, slot: Slot, os_id: Option<OsId>) -> Result<(), SelectionError> {
        self.ensure_editable()?;
        self.selection.set_dual_slot(&self.catalog, slot, os_id)
    }

    pub fn select_version(
        &mut self,
        slot: Slot,
        version_id: VersionId,
    ) -> Result<VersionProgress, SelectionError> {
        self.ensure_editable()?;
        self.selection.select_version(&self.catalog, slot, version_id)
    }

    pub fn toggle_add_on(&mut self, add_on: AddOn, enabled: bool) -> Result<(), SelectionError> {
        self.ensure_editable()?;
        self.selection.set_add_on(add_on, enabled);
        Ok(())
    }

    /// Selections are frozen while a submission is in flight and after it
    /// succeeded; reset starts an editable order.
    fn ensure_editable(&self) -> Result<(), SelectionError> {
        if self.submitting || self.submitted.is_some() {
            return Err(SelectionError::OrderLocked);
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // Customer fields
    // ------------------------------------------------------------------

    /// Editing a field clears its inline error.
    pub fn set_field(&mut self, field: CustomerField, value: impl Into<String>) {
        self.selection.set_customer_field(field, value);
        self.field_errors.clear(field);
    }

    /// On-blur validation: attach or remove the field's inline error.
    pub fn blur_field(&mut self, field: CustomerField) -> bool {
        match validation::validate_field(field, self.selection.customer().get(field)) {
            Ok(()) => {
                self.field_errors.clear(field);
                true
            }
            Err(e) => {
                self.field_errors.attach(e);
                false
            }
        }
    }

    // ------------------------------------------------------------------
    // Navigation
    // ------------------------------------------------------------------

    pub fn forward(&mut self) -> Result<WizardStep, NavigationError> {
        match self.navigator.forward(&self.selection) {
            Ok(step) => {
                self.on_enter(step);
                Ok(step)
            }
            Err(NavigationError::CustomerInvalid(errors)) => {
                self.field_errors = errors.clone();
                Err(NavigationError::CustomerInvalid(errors))
            }
            Err(e) => Err(e),
        }
    }

    pub fn backward(&mut self) -> Result<WizardStep, NavigationError> {
        self.navigator.backward()
    }

    fn on_enter(&mut self, step: WizardStep) {
        if step == WizardStep::Summary {
            self.summary = OrderSummary::compute(&self.catalog, &self.selection, &self.prices);
        }
    }

    // ------------------------------------------------------------------
    // Submission
    // ------------------------------------------------------------------

    /// Validate, snapshot the request and mark the submit control busy.
    pub fn begin_submission(&mut self) -> Result<SubmissionTicket, SubmissionError> {
        if self.submitting {
            return Err(SubmissionError::InProgress);
        }
        if let Some(created) = &self.submitted {
            return Err(SubmissionError::AlreadySubmitted(created.order_number.clone()));
        }
        if self.current_step() != WizardStep::CustomerInfo {
            return Err(SubmissionError::WrongStep(self.current_step()));
        }

        if let Err(errors) = validation::validate_customer(self.selection.customer()) {
            self.field_errors = errors.clone();
            return Err(NavigationError::CustomerInvalid(errors).into());
        }

        let request = order::build_order_request(&self.selection, &self.prices)?;
        self.submitting = true;
        debug!("Submission of {} started", request.order_number);

        Ok(SubmissionTicket {
            generation: self.generation,
            request,
        })
    }

    /// Apply the backend's answer to a submission started by
    /// [`begin_submission`](Self::begin_submission).
    pub fn complete_submission(
        &mut self,
        ticket: SubmissionTicket,
        result: Result<OrderCreated, ServiceError>,
    ) -> SubmissionOutcome {
        if ticket.generation != self.generation {
            debug!(
                "Discarding completion for {} from an earlier session",
                ticket.request.order_number
            );
            return SubmissionOutcome::Stale;
        }
        self.submitting = false;

        match result {
            Ok(created) => {
                info!("Order {} submitted (id {})", created.order_number, created.order_id);
                self.notice = Some(Notice::success(format!(
                    "Order submitted successfully! Your order number is: {}",
                    ticket.request.order_number
                )));
                self.navigator.finish();
                self.on_enter(WizardStep::Summary);
                self.submitted = Some(created.clone());
                SubmissionOutcome::Created(created)
            }
            Err(e) => {
                warn!("Order {} failed: {}", ticket.request.order_number, e);
                let error = SubmissionError::Service(e);
                self.notice = Some(Notice::error(error.to_string()));
                SubmissionOutcome::Failed(error)
            }
        }
    }

    /// Begin, send and complete in one call.
    pub fn submit(&mut self, service: &dyn OrderService) -> Result<OrderCreated, SubmissionError> {
        let ticket = self.begin_submission()?;
        let result = service.create_order(ticket.request());
        match self.complete_submission(ticket, result) {
            SubmissionOutcome::Created(created) => Ok(created),
            SubmissionOutcome::Failed(e) => Err(e),
            // The session cannot change underneath a synchronous call
            SubmissionOutcome::Stale => Err(SubmissionError::InProgress),
        }
    }

    /// Start over: first step, nothing selected, fresh order number.
    pub fn reset(&mut self) {
        let fresh = OrderNumber::generate_distinct(self.selection.order_number());
        info!("Wizard reset, new order {}", fresh);

        self.generation += 1;
        self.selection.reset(fresh);
        self.navigator.reset();
        self.field_errors.clear_all();
        self.submitting = false;
        self.submitted = None;
        self.summary = None;
        self.notice = None;
    }
}
