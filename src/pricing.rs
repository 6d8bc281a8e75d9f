//! Pricing and order summary
//!
//! Prices are whole currency units. The same slot rendering rule feeds the
//! live preview and the final summary, and it never omits a slot:
//!
//! - `OsName (VersionName)` when both are chosen
//! - `OsName (Version not selected)` when only the OS is chosen
//! - a placeholder otherwise (`Not specified`, `First OS not selected`,
//!   `Second OS not selected`)

use serde::{Deserialize, Serialize};
use std::fmt::Write as _;
use strum::{Display, EnumIter, EnumString};

use crate::catalog::CatalogSnapshot;
use crate::order::OrderNumber;
use crate::selection::{SelectionState, Slot};
use crate::types::{AddOn, InstallationType};
use crate::validation::CustomerInfo;

pub const DEFAULT_CURRENCY: &str = "KSh";

/// Billable service keys, as used by the price administration surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[derive(Display, EnumString, EnumIter)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ServiceType {
    FullInstallation,
    DualBootInstallation,
    AdditionalDrivers,
    OfficeSuite,
}

impl From<InstallationType> for ServiceType {
    fn from(value: InstallationType) -> Self {
        match value {
            InstallationType::Full => Self::FullInstallation,
            InstallationType::Dual => Self::DualBootInstallation,
        }
    }
}

impl From<AddOn> for ServiceType {
    fn from(value: AddOn) -> Self {
        match value {
            AddOn::AdditionalDrivers => Self::AdditionalDrivers,
            AddOn::OfficeSuite => Self::OfficeSuite,
        }
    }
}

/// Price per billable service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PriceTable {
    pub full_installation: u32,
    pub dual_boot_installation: u32,
    pub additional_drivers: u32,
    pub office_suite: u32,
}

impl Default for PriceTable {
    fn default() -> Self {
        Self {
            full_installation: 100,
            dual_boot_installation: 150,
            additional_drivers: 30,
            office_suite: 50,
        }
    }
}

impl PriceTable {
    pub fn price(&self, service: ServiceType) -> u32 {
        match service {
            ServiceType::FullInstallation => self.full_installation,
            ServiceType::DualBootInstallation => self.dual_boot_installation,
            ServiceType::AdditionalDrivers => self.additional_drivers,
            ServiceType::OfficeSuite => self.office_suite,
        }
    }

    /// Upsert a single service price.
    pub fn set_price(&mut self, service: ServiceType, price: u32) {
        let slot = match service {
            ServiceType::FullInstallation => &mut self.full_installation,
            ServiceType::DualBootInstallation => &mut self.dual_boot_installation,
            ServiceType::AdditionalDrivers => &mut self.additional_drivers,
            ServiceType::OfficeSuite => &mut self.office_suite,
        };
        *slot = price;
    }

    pub fn base_price(&self, installation_type: InstallationType) -> u32 {
        self.price(installation_type.into())
    }

    pub fn add_on_price(&self, add_on: AddOn) -> u32 {
        self.price(add_on.into())
    }

    /// Base price plus every enabled add-on.
    pub fn total<'a>(
        &self,
        installation_type: InstallationType,
        add_ons: impl IntoIterator<Item = &'a AddOn>,
    ) -> u32 {
        add_ons
            .into_iter()
            .fold(self.base_price(installation_type), |acc, a| {
                acc.saturating_add(self.add_on_price(*a))
            })
    }
}

/// `KSh 130`
pub fn format_amount(currency: &str, amount: u32) -> String {
    format!("{} {}", currency, amount)
}

/// Render one OS slot for display.
pub fn render_slot(
    catalog: &CatalogSnapshot,
    selection: &SelectionState,
    installation_type: InstallationType,
    slot: Slot,
) -> String {
    let Some(os) = selection.os_at(slot).and_then(|id| catalog.os(id)) else {
        return match (installation_type, slot) {
            (InstallationType::Full, _) => "Not specified".to_string(),
            (InstallationType::Dual, Slot::First) => "First OS not selected".to_string(),
            (InstallationType::Dual, Slot::Second) => "Second OS not selected".to_string(),
        };
    };

    match selection.version_at(slot).and_then(|v| os.version(v)) {
        Some(version) => format!("{} ({})", os.name, version.name),
        None => format!("{} (Version not selected)", os.name),
    }
}

/// All slots for the installation type, joined with ` + `.
pub fn render_os_text(
    catalog: &CatalogSnapshot,
    selection: &SelectionState,
    installation_type: InstallationType,
) -> String {
    Slot::ALL
        .into_iter()
        .take(installation_type.required_slots())
        .map(|slot| render_slot(catalog, selection, installation_type, slot))
        .collect::<Vec<_>>()
        .join(" + ")
}

/// One-line preview shown while the customer is still choosing.
pub fn live_preview(catalog: &CatalogSnapshot, selection: &SelectionState) -> String {
    let Some(installation_type) = selection.installation_type() else {
        return "No selections made".to_string();
    };

    let label = installation_type.label();
    if selection.selected_os_ids().is_empty() {
        label.to_string()
    } else {
        format!(
            "{} - {}",
            label,
            render_os_text(catalog, selection, installation_type)
        )
    }
}

/// Priced line for a checked add-on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddOnLine {
    pub add_on: AddOn,
    pub price: u32,
}

/// Final summary, recomputed every time the summary step is entered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderSummary {
    pub order_number: OrderNumber,
    pub installation_type: InstallationType,
    pub os_text: String,
    pub base_price: u32,
    pub add_ons: Vec<AddOnLine>,
    pub total: u32,
    pub customer: CustomerInfo,
}

impl OrderSummary {
    /// Returns `None` until an installation type is chosen.
    pub fn compute(
        catalog: &CatalogSnapshot,
        selection: &SelectionState,
        prices: &PriceTable,
    ) -> Option<Self> {
        let installation_type = selection.installation_type()?;
        let add_ons: Vec<AddOnLine> = selection
            .add_ons()
            .iter()
            .map(|&add_on| AddOnLine {
                add_on,
                price: prices.add_on_price(add_on),
            })
            .collect();

        Some(Self {
            order_number: selection.order_number().clone(),
            installation_type,
            os_text: render_os_text(catalog, selection, installation_type),
            base_price: prices.base_price(installation_type),
            total: prices.total(installation_type, selection.add_ons()),
            add_ons,
            customer: selection.customer().clone(),
        })
    }

    /// Plain-text rendering for terminals and logs.
    pub fn render(&self, currency: &str) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "Order number: {}", self.order_number);
        let _ = writeln!(out, "Type:         {}", self.installation_type.label());
        let _ = writeln!(out, "OS:           {}", self.os_text);
        let _ = writeln!(out, "Base price:   {}", format_amount(currency, self.base_price));
        for line in &self.add_ons {
            let _ = writeln!(
                out,
                "  {}: +{}",
                line.add_on.label(),
                format_amount(currency, line.price)
            );
        }
        let _ = writeln!(out, "Total:        {}", format_amount(currency, self.total));
        let _ = writeln!(out, "Customer:     {}", self.customer.name);
        let _ = writeln!(out, "              {}", self.customer.email);
        let _ = writeln!(out, "              {}", self.customer.phone);
        let _ = write!(out, "              {}", self.customer.address);
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{OperatingSystem, OsId, OsVersion, VersionId};
    use crate::types::OsKind;
    use std::time::Instant;

    fn catalog() -> CatalogSnapshot {
        let os = |id: u32, name: &str, vid: u32, vname: &str| OperatingSystem {
            id: OsId(id),
            name: name.to_string(),
            kind: OsKind::Linux,
            logo_url: None,
            is_active: true,
            versions: vec![OsVersion {
                id: VersionId(vid),
                name: vname.to_string(),
                is_active: true,
            }],
        };
        CatalogSnapshot::from_records(vec![
            os(3, "Ubuntu", 7, "22.04 LTS"),
            os(5, "Linux Mint", 9, "21.3"),
        ])
    }

    fn selection(installation_type: Option<InstallationType>) -> SelectionState {
        let mut s = SelectionState::new(OrderNumber::parse("TS-1234561234").unwrap());
        if let Some(t) = installation_type {
            s.set_installation_type(t, Instant::now(), |_| true);
        }
        s
    }

    #[test]
    fn test_default_prices() {
        let prices = PriceTable::default();
        assert_eq!(prices.base_price(InstallationType::Full), 100);
        assert_eq!(prices.base_price(InstallationType::Dual), 150);
        assert_eq!(prices.add_on_price(AddOn::AdditionalDrivers), 30);
        assert_eq!(prices.add_on_price(AddOn::OfficeSuite), 50);
    }

    #[test]
    fn test_total_adds_checked_add_ons() {
        let prices = PriceTable::default();
        assert_eq!(prices.total(InstallationType::Full, &[AddOn::AdditionalDrivers]), 130);
        assert_eq!(
            prices.total(InstallationType::Dual, &[AddOn::AdditionalDrivers, AddOn::OfficeSuite]),
            230
        );
    }

    #[test]
    fn test_set_price() {
        let mut prices = PriceTable::default();
        prices.set_price(ServiceType::OfficeSuite, 75);
        assert_eq!(prices.add_on_price(AddOn::OfficeSuite), 75);
    }

    #[test]
    fn test_format_amount() {
        assert_eq!(format_amount(DEFAULT_CURRENCY, 130), "KSh 130");
    }

    #[test]
    fn test_slot_rendering_three_ways() {
        let cat = catalog();
        let mut s = selection(Some(InstallationType::Dual));
        assert_eq!(
            render_os_text(&cat, &s, InstallationType::Dual),
            "First OS not selected + Second OS not selected"
        );

        s.select_dual_os(&cat, Some(OsId(3)), Some(OsId(5))).unwrap();
        s.select_version(&cat, Slot::First, VersionId(7)).unwrap();
        assert_eq!(
            render_os_text(&cat, &s, InstallationType::Dual),
            "Ubuntu (22.04 LTS) + Linux Mint (Version not selected)"
        );
    }

    #[test]
    fn test_full_placeholder() {
        let cat = catalog();
        let s = selection(Some(InstallationType::Full));
        assert_eq!(render_os_text(&cat, &s, InstallationType::Full), "Not specified");
    }

    #[test]
    fn test_live_preview() {
        let cat = catalog();
        assert_eq!(live_preview(&cat, &selection(None)), "No selections made");

        let mut s = selection(Some(InstallationType::Full));
        assert_eq!(live_preview(&cat, &s), "Full Installation");

        s.select_single_os(&cat, OsId(3)).unwrap();
        assert_eq!(
            live_preview(&cat, &s),
            "Full Installation - Ubuntu (Version not selected)"
        );
    }

    #[test]
    fn test_summary_compute() {
        let cat = catalog();
        let mut s = selection(Some(InstallationType::Full));
        s.select_single_os(&cat, OsId(3)).unwrap();
        s.select_version(&cat, Slot::First, VersionId(7)).unwrap();
        s.set_add_on(AddOn::AdditionalDrivers, true);

        let summary = OrderSummary::compute(&cat, &s, &PriceTable::default()).unwrap();
        assert_eq!(summary.os_text, "Ubuntu (22.04 LTS)");
        assert_eq!(summary.base_price, 100);
        assert_eq!(summary.total, 130);
        assert_eq!(summary.add_ons.len(), 1);
        assert!(summary.render(DEFAULT_CURRENCY).contains("Total:        KSh 130"));
    }

    #[test]
    fn test_summary_requires_type() {
        assert!(OrderSummary::compute(&catalog(), &selection(None), &PriceTable::default()).is_none());
    }
}
