//! Order drafts
//!
//! A draft is a JSON description of the choices a customer would make in the
//! wizard. Applying it replays those choices through [`OrderWizard`] command
//! by command, so every selection and navigation rule still applies.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::debug;

use crate::app::OrderWizard;
use crate::catalog::{OsId, VersionId};
use crate::error::{Result, TechServeError};
use crate::navigator::WizardStep;
use crate::selection::Slot;
use crate::types::{AddOn, InstallationType};
use crate::validation::{CustomerField, CustomerInfo};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderDraft {
    pub installation_type: InstallationType,
    /// One id for a full installation, two for dual boot
    #[serde(default)]
    pub os_ids: Vec<OsId>,
    /// Version ids in the same order as `os_ids`
    #[serde(default)]
    pub version_ids: Vec<VersionId>,
    #[serde(default)]
    pub customer: CustomerInfo,
    #[serde(default)]
    pub add_ons: Vec<AddOn>,
}

impl OrderDraft {
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path)?;
        let draft: Self = serde_json::from_str(&content)?;
        debug!("Loaded order draft from {:?}", path.as_ref());
        Ok(draft)
    }

    /// Replay the draft from the first step up to the customer step.
    ///
    /// Stops at the first rejected command; the wizard keeps whatever was
    /// accepted before it.
    pub fn apply(&self, wizard: &mut OrderWizard) -> Result<()> {
        if wizard.current_step() != WizardStep::InstallationType {
            return Err(TechServeError::navigation(format!(
                "Draft must start at {}, wizard is at {}",
                WizardStep::InstallationType,
                wizard.current_step()
            )));
        }

        wizard.choose_installation_type(self.installation_type, |_| true);
        wizard.forward()?;

        match self.installation_type {
            InstallationType::Full => {
                let os_id = self
                    .os_ids
                    .first()
                    .copied()
                    .ok_or_else(|| TechServeError::selection("Draft names no operating system"))?;
                wizard.select_os(os_id)?;
            }
            InstallationType::Dual => {
                wizard.select_dual_os(self.os_ids.first().copied(), self.os_ids.get(1).copied())?;
            }
        }
        wizard.forward()?;

        for (slot, version_id) in Slot::ALL.into_iter().zip(&self.version_ids) {
            wizard.select_version(slot, *version_id)?;
        }
        wizard.forward()?;

        for add_on in &self.add_ons {
            wizard.toggle_add_on(*add_on, true)?;
        }
        for field in [
            CustomerField::Name,
            CustomerField::Email,
            CustomerField::Phone,
            CustomerField::Address,
        ] {
            wizard.set_field(field, self.customer.get(field));
        }

        Ok(())
    }
}
