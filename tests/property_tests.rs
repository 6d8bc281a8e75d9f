//! Property-Based Tests for TechServe
//!
//! Uses proptest for testing invariants and edge cases
//!
//! These tests verify:
//! - Phone and email validator acceptance rules
//! - Order number shape
//! - OS rendering never drops a slot and names every chosen version exactly
//! - Dual-boot pair and pricing invariants

use proptest::prelude::*;
use rand::SeedableRng;
use rand::rngs::StdRng;
use std::collections::BTreeSet;
use std::time::Instant;

use techserve::order::OrderNumber;
use techserve::pricing::{self, OrderSummary, PriceTable};
use techserve::validation::{self, CustomerField};
use techserve::{
    AddOn, CatalogSnapshot, InstallationType, OperatingSystem, OsId, OsKind, OsVersion,
    SelectionError, SelectionState, Slot, VersionId,
};

// =============================================================================
// Phone Validator Property Tests
// =============================================================================

/// Strategy for phone numbers with separators between digit groups
fn separated_phone_strategy() -> impl Strategy<Value = (String, String)> {
    ("[0-9]{8}", prop::sample::select(vec![" ", "-", " - "])).prop_map(|(rest, sep)| {
        let canonical = format!("07{}", rest);
        let typed = format!(
            "{}{}{}{}{}",
            &canonical[..4],
            sep,
            &canonical[4..7],
            sep,
            &canonical[7..]
        );
        (canonical, typed)
    })
}

proptest! {
    /// 07 followed by eight digits is always accepted, by client and backend
    #[test]
    fn canonical_phone_accepted(rest in "[0-9]{8}") {
        let phone = format!("07{}", rest);
        prop_assert!(validation::is_valid_phone(&phone));
        prop_assert!(validation::is_canonical_phone(&phone));
    }

    /// Separators are tolerated on the client and normalized away
    #[test]
    fn separated_phone_normalizes((canonical, typed) in separated_phone_strategy()) {
        prop_assert!(validation::is_valid_phone(&typed));
        prop_assert!(!validation::is_canonical_phone(&typed));
        prop_assert_eq!(validation::normalize_phone(&typed), canonical);
    }

    /// Any other prefix is rejected
    #[test]
    fn wrong_prefix_rejected(prefix in "0[0-689]|[1-9][0-9]", rest in "[0-9]{8}") {
        let phone = format!("{}{}", prefix, rest);
        prop_assert!(!validation::is_valid_phone(&phone));
        prop_assert!(validation::validate_field(CustomerField::Phone, &phone).is_err());
    }

    /// Anything but exactly ten digits is rejected
    #[test]
    fn wrong_length_rejected(rest in "[0-9]{0,7}|[0-9]{9,12}") {
        let phone = format!("07{}", rest);
        prop_assert!(!validation::is_valid_phone(&phone));
    }
}

// =============================================================================
// Email Validator Property Tests
// =============================================================================

proptest! {
    /// local@domain.tld is accepted, surrounding whitespace included
    #[test]
    fn simple_email_accepted(
        local in "[a-z0-9._]{1,12}",
        domain in "[a-z0-9-]{1,12}",
        tld in "[a-z]{2,6}",
    ) {
        let email = format!("  {}@{}.{} ", local, domain, tld);
        prop_assert!(validation::is_valid_email(&email));
    }

    /// No @ means no email
    #[test]
    fn email_without_at_rejected(value in "[a-z0-9.]{1,24}") {
        prop_assert!(!validation::is_valid_email(&value));
    }

    /// Whitespace inside the address is rejected
    #[test]
    fn email_with_inner_space_rejected(local in "[a-z]{1,6}", domain in "[a-z]{1,6}") {
        let email = format!("{} x@{}.com", local, domain);
        prop_assert!(!validation::is_valid_email(&email));
    }
}

// =============================================================================
// Order Number Property Tests
// =============================================================================

proptest! {
    /// Every generated number is TS- plus ten digits and parses back
    #[test]
    fn order_number_well_formed(millis in any::<i64>(), seed in any::<u64>()) {
        let mut rng = StdRng::seed_from_u64(seed);
        let number = OrderNumber::generate_at(millis, &mut rng);
        prop_assert!(number.is_well_formed());
        prop_assert_eq!(number.as_str().len(), 13);
        prop_assert_eq!(OrderNumber::parse(number.as_str()), Ok(number.clone()));
    }

    /// A fresh number never repeats the previous one
    #[test]
    fn distinct_number_differs(millis in 0i64..1_000_000, seed in any::<u64>()) {
        let mut rng = StdRng::seed_from_u64(seed);
        let previous = OrderNumber::generate_at(millis, &mut rng);
        prop_assert_ne!(OrderNumber::generate_distinct(&previous), previous);
    }
}

// =============================================================================
// Selection & Rendering Property Tests
// =============================================================================

const OS_IDS: [u32; 4] = [1, 2, 3, 4];

/// Four systems with versions `id * 10 + 1` and `id * 10 + 2`.
fn catalog() -> CatalogSnapshot {
    let systems = OS_IDS
        .iter()
        .map(|&id| OperatingSystem {
            id: OsId(id),
            name: format!("OS {}", id),
            kind: OsKind::Linux,
            logo_url: None,
            is_active: true,
            versions: (1..=2)
                .map(|v| OsVersion {
                    id: VersionId(id * 10 + v),
                    name: format!("v{}", v),
                    is_active: true,
                })
                .collect(),
        })
        .collect();
    CatalogSnapshot::from_records(systems)
}

fn selection(installation_type: InstallationType) -> SelectionState {
    let mut state = SelectionState::new(OrderNumber::generate());
    state.set_installation_type(installation_type, Instant::now(), |_| true);
    state
}

fn add_on_strategy() -> impl Strategy<Value = BTreeSet<AddOn>> {
    prop::collection::btree_set(
        prop_oneof![Just(AddOn::AdditionalDrivers), Just(AddOn::OfficeSuite)],
        0..=2,
    )
}

proptest! {
    /// Picking the same OS for both slots always fails the same way
    #[test]
    fn equal_dual_ids_must_differ(id in prop::sample::select(OS_IDS.to_vec())) {
        let cat = catalog();
        let mut state = selection(InstallationType::Dual);
        let result = state.select_dual_os(&cat, Some(OsId(id)), Some(OsId(id)));
        prop_assert_eq!(result, Err(SelectionError::DualMustDiffer));
        prop_assert!(state.selected_os_ids().is_empty());
    }

    /// Dual rendering always shows two slots, whatever is chosen
    #[test]
    fn dual_rendering_keeps_both_slots(
        pair in prop::sample::subsequence(OS_IDS.to_vec(), 2),
        versions in prop::collection::vec(prop::option::of(1u32..=2), 2),
        select in any::<bool>(),
    ) {
        let cat = catalog();
        let mut state = selection(InstallationType::Dual);
        if select {
            state
                .select_dual_os(&cat, Some(OsId(pair[0])), Some(OsId(pair[1])))
                .unwrap();
            for (slot, v) in Slot::ALL.into_iter().zip(&versions) {
                if let Some(v) = v {
                    let os = state.os_at(slot).unwrap();
                    state.select_version(&cat, slot, VersionId(os.0 * 10 + v)).unwrap();
                }
            }
        }

        let text = pricing::render_os_text(&cat, &state, InstallationType::Dual);
        prop_assert_eq!(text.split(" + ").count(), 2);
        if !select {
            prop_assert_eq!(text, "First OS not selected + Second OS not selected");
        }
    }

    /// Full rendering is a single slot
    #[test]
    fn full_rendering_single_slot(id in prop::sample::select(OS_IDS.to_vec())) {
        let cat = catalog();
        let mut state = selection(InstallationType::Full);
        state.select_single_os(&cat, OsId(id)).unwrap();
        let text = pricing::render_os_text(&cat, &state, InstallationType::Full);
        prop_assert!(!text.contains(" + "));
        prop_assert_eq!(text, format!("OS {} (Version not selected)", id));
    }

    /// A full installation with a version renders as `OsName (VersionName)`
    #[test]
    fn full_rendering_names_version(
        id in prop::sample::select(OS_IDS.to_vec()),
        v in 1u32..=2,
    ) {
        let cat = catalog();
        let mut state = selection(InstallationType::Full);
        state.select_single_os(&cat, OsId(id)).unwrap();
        state.select_version(&cat, Slot::First, VersionId(id * 10 + v)).unwrap();

        let summary = OrderSummary::compute(&cat, &state, &PriceTable::default()).unwrap();
        prop_assert_eq!(summary.os_text, format!("OS {} (v{})", id, v));
    }

    /// Both dual-boot slots render their own `OsName (VersionName)`
    #[test]
    fn dual_rendering_names_both_versions(
        pair in prop::sample::subsequence(OS_IDS.to_vec(), 2),
        flip in any::<bool>(),
        versions in (1u32..=2, 1u32..=2),
    ) {
        let (first, second) = if flip { (pair[1], pair[0]) } else { (pair[0], pair[1]) };
        let cat = catalog();
        let mut state = selection(InstallationType::Dual);
        state.select_dual_os(&cat, Some(OsId(first)), Some(OsId(second))).unwrap();
        state.select_version(&cat, Slot::First, VersionId(first * 10 + versions.0)).unwrap();
        state.select_version(&cat, Slot::Second, VersionId(second * 10 + versions.1)).unwrap();

        let summary = OrderSummary::compute(&cat, &state, &PriceTable::default()).unwrap();
        prop_assert_eq!(
            summary.os_text,
            format!("OS {} (v{}) + OS {} (v{})", first, versions.0, second, versions.1)
        );
    }

    /// Total is the base price plus every checked add-on
    #[test]
    fn total_is_base_plus_add_ons(
        dual in any::<bool>(),
        add_ons in add_on_strategy(),
        drivers in 0u32..1000,
        office in 0u32..1000,
    ) {
        let mut prices = PriceTable::default();
        prices.additional_drivers = drivers;
        prices.office_suite = office;
        let installation_type = if dual { InstallationType::Dual } else { InstallationType::Full };

        let expected = prices.base_price(installation_type)
            + add_ons.iter().map(|a| prices.add_on_price(*a)).sum::<u32>();
        prop_assert_eq!(prices.total(installation_type, &add_ons), expected);
    }
}

/// Every selectable version of every catalog entry renders exactly
#[test]
fn every_catalog_version_renders_exactly() {
    let cat = catalog();
    for os in cat.systems() {
        for version in os.selectable_versions() {
            let mut state = selection(InstallationType::Full);
            state.select_single_os(&cat, os.id).unwrap();
            state.select_version(&cat, Slot::First, version.id).unwrap();
            let summary = OrderSummary::compute(&cat, &state, &PriceTable::default()).unwrap();
            assert_eq!(summary.os_text, format!("{} ({})", os.name, version.name));

            for other in cat.systems().iter().filter(|o| o.id != os.id) {
                let mut state = selection(InstallationType::Dual);
                state.select_dual_os(&cat, Some(other.id), Some(os.id)).unwrap();
                let other_version = other.selectable_versions().next().unwrap();
                state.select_version(&cat, Slot::First, other_version.id).unwrap();
                state.select_version(&cat, Slot::Second, version.id).unwrap();
                let summary =
                    OrderSummary::compute(&cat, &state, &PriceTable::default()).unwrap();
                assert_eq!(
                    summary.os_text,
                    format!(
                        "{} ({}) + {} ({})",
                        other.name, other_version.name, os.name, version.name
                    )
                );
            }
        }
    }
}
