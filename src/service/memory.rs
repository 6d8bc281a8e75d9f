//! In-memory order backend
//!
//! Mirrors the order API's server-side behaviour without a database:
//!
//! - order creation is all-or-nothing: every rule is checked before anything
//!   is inserted
//! - OS and version names on order records are resolved at read time
//! - administrator operations (catalog, pricing, order status) are plain
//!   methods; authentication is out of scope here

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::sync::{Mutex, MutexGuard};
use strum::{Display, EnumString};
use tracing::{debug, info, warn};

use super::{OrderService, ServiceError};
use crate::catalog::{OperatingSystem, OsId, OsVersion, VersionId};
use crate::order::{
    AddOnRecord, OrderCreated, OrderLookup, OrderNumber, OrderRecord, OrderRequest, OsSelection,
    OsSelectionDetail,
};
use crate::pricing::{PriceTable, ServiceType};
use crate::types::{InstallationType, OrderStatus, OsKind};
use crate::validation::{self, PHONE_MESSAGE};

/// How the backend treats add-on prices sent by the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[derive(Display, EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum AddOnPricingPolicy {
    /// Store the price the client submitted
    #[default]
    ClientSnapshot,
    /// Re-price from the backend's own price table
    Authoritative,
}

/// Fields accepted when adding or updating an operating system.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OsDraft {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: OsKind,
    #[serde(default)]
    pub logo_url: Option<String>,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone)]
struct StoredOrder {
    id: u64,
    order_number: OrderNumber,
    installation_type: InstallationType,
    customer_name: String,
    customer_email: String,
    customer_phone: String,
    customer_address: String,
    status: OrderStatus,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    selections: Vec<OsSelection>,
    addons: Vec<AddOnRecord>,
}

#[derive(Debug, Default)]
struct Store {
    systems: Vec<OperatingSystem>,
    orders: Vec<StoredOrder>,
    prices: PriceTable,
    next_os_id: u32,
    next_version_id: u32,
    next_order_id: u64,
}

impl Store {
    fn os(&self, id: OsId) -> Option<&OperatingSystem> {
        self.systems.iter().find(|os| os.id == id)
    }

    fn os_mut(&mut self, id: OsId) -> Option<&mut OperatingSystem> {
        self.systems.iter_mut().find(|os| os.id == id)
    }

    fn version_mut(&mut self, id: VersionId) -> Option<&mut OsVersion> {
        self.systems
            .iter_mut()
            .flat_map(|os| os.versions.iter_mut())
            .find(|v| v.id == id)
    }

    fn alloc_os_id(&mut self) -> OsId {
        self.next_os_id += 1;
        OsId(self.next_os_id)
    }

    fn alloc_version_id(&mut self) -> VersionId {
        self.next_version_id += 1;
        VersionId(self.next_version_id)
    }

    /// Join OS and version names onto a stored order. Selections whose OS no
    /// longer exists are dropped.
    fn to_record(&self, order: &StoredOrder) -> OrderRecord {
        let os_selections = order
            .selections
            .iter()
            .filter_map(|sel| {
                let os = self.os(sel.os_id)?;
                let version = os.version(sel.version_id);
                Some(OsSelectionDetail {
                    os_id: os.id,
                    os_name: os.name.clone(),
                    version_id: version.map(|v| v.id),
                    version_name: version.map(|v| v.name.clone()),
                })
            })
            .collect();

        OrderRecord {
            id: order.id,
            order_number: order.order_number.clone(),
            installation_type: order.installation_type,
            customer_name: order.customer_name.clone(),
            customer_email: order.customer_email.clone(),
            customer_phone: order.customer_phone.clone(),
            customer_address: order.customer_address.clone(),
            status: order.status,
            created_at: order.created_at,
            updated_at: order.updated_at,
            os_selections,
            addons: order.addons.clone(),
        }
    }

    /// Records matching `filter`, newest first.
    fn records_where<F>(&self, filter: F) -> Vec<OrderRecord>
    where
        F: Fn(&StoredOrder) -> bool,
    {
        let mut matching: Vec<&StoredOrder> = self.orders.iter().filter(|o| filter(*o)).collect();
        matching.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        matching.into_iter().map(|o| self.to_record(o)).collect()
    }

    /// Every server-side rule for order creation. Nothing is mutated here.
    fn check_request(&self, request: &OrderRequest) -> Result<(), ServiceError> {
        if !validation::is_canonical_phone(&request.customer_phone) {
            return Err(ServiceError::BadRequest(PHONE_MESSAGE.to_string()));
        }

        let required = [
            &request.customer_name,
            &request.customer_email,
            &request.customer_address,
        ];
        if required.iter().any(|v| !validation::is_present(v)) {
            return Err(ServiceError::BadRequest(
                "Customer name, email, phone and address are required".to_string(),
            ));
        }

        if !request.order_number.is_well_formed() {
            return Err(ServiceError::BadRequest(format!(
                "Invalid order number: {}",
                request.order_number
            )));
        }

        if self
            .orders
            .iter()
            .any(|o| o.order_number == request.order_number)
        {
            return Err(ServiceError::Conflict(format!(
                "Order number {} already exists",
                request.order_number
            )));
        }

        let expected = request.installation_type.required_slots();
        if request.os_selections.len() != expected {
            return Err(ServiceError::BadRequest(format!(
                "{} requires exactly {} OS selection(s), got {}",
                request.installation_type.label(),
                expected,
                request.os_selections.len()
            )));
        }

        let distinct: BTreeSet<OsId> = request.os_selections.iter().map(|s| s.os_id).collect();
        if distinct.len() != request.os_selections.len() {
            return Err(ServiceError::BadRequest(
                "Please select two different operating systems".to_string(),
            ));
        }

        for selection in &request.os_selections {
            let os = self
                .os(selection.os_id)
                .filter(|os| os.is_active)
                .ok_or_else(|| {
                    ServiceError::BadRequest(format!(
                        "Operating system {} is not available",
                        selection.os_id
                    ))
                })?;
            os.version(selection.version_id)
                .filter(|v| v.is_active)
                .ok_or_else(|| {
                    ServiceError::BadRequest(format!(
                        "Version {} is not available for {}",
                        selection.version_id, os.name
                    ))
                })?;
        }

        let mut seen = BTreeSet::new();
        for addon in &request.addons {
            if !seen.insert(addon.add_on) {
                return Err(ServiceError::BadRequest(format!(
                    "Duplicate add-on: {}",
                    addon.add_on
                )));
            }
        }

        Ok(())
    }
}

/// Thread-safe in-memory backend.
#[derive(Debug)]
pub struct MemoryBackend {
    store: Mutex<Store>,
    policy: AddOnPricingPolicy,
}

impl Default for MemoryBackend {
    fn default() -> Self {
        Self::new(PriceTable::default(), AddOnPricingPolicy::default())
    }
}

impl MemoryBackend {
    /// Empty catalog, no orders.
    pub fn new(prices: PriceTable, policy: AddOnPricingPolicy) -> Self {
        Self {
            store: Mutex::new(Store {
                prices,
                ..Store::default()
            }),
            policy,
        }
    }

    /// Backend seeded with the standard catalog.
    pub fn seeded(prices: PriceTable, policy: AddOnPricingPolicy) -> Self {
        let backend = Self::new(prices, policy);
        let seed: [(&str, OsKind, &str, [&str; 2]); 4] = [
            ("Ubuntu", OsKind::Linux, "/images/ubuntu-logo.png", ["22.04 LTS", "24.04 LTS"]),
            ("Linux Mint", OsKind::Linux, "/images/mint-logo.png", ["21.3", "22.0"]),
            ("Windows 10", OsKind::Windows, "/images/windows10-logo.png", ["Home", "Pro"]),
            ("Windows 11", OsKind::Windows, "/images/windows11-logo.png", ["Home", "Pro"]),
        ];

        {
            let mut store = backend.lock();
            for (name, kind, logo, versions) in seed {
                let id = store.alloc_os_id();
                let versions = versions
                    .iter()
                    .map(|v| OsVersion {
                        id: store.alloc_version_id(),
                        name: v.to_string(),
                        is_active: true,
                    })
                    .collect();
                store.systems.push(OperatingSystem {
                    id,
                    name: name.to_string(),
                    kind,
                    logo_url: Some(logo.to_string()),
                    is_active: true,
                    versions,
                });
            }
        }

        backend
    }

    fn lock(&self) -> MutexGuard<'_, Store> {
        // A panic while holding the lock cannot leave a half-applied order:
        // creation validates before it mutates.
        self.store.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    // ------------------------------------------------------------------
    // Administrator operations
    // ------------------------------------------------------------------

    /// Every OS, including inactive ones and their inactive versions.
    pub fn list_operating_systems(&self) -> Vec<OperatingSystem> {
        self.lock().systems.clone()
    }

    pub fn add_operating_system(&self, draft: OsDraft) -> Result<OperatingSystem, ServiceError> {
        if !validation::is_present(&draft.name) {
            return Err(ServiceError::BadRequest("Name and type are required".to_string()));
        }

        let mut store = self.lock();
        let os = OperatingSystem {
            id: store.alloc_os_id(),
            name: draft.name.trim().to_string(),
            kind: draft.kind,
            logo_url: draft.logo_url,
            is_active: draft.is_active,
            versions: Vec::new(),
        };
        store.systems.push(os.clone());
        info!("Added operating system {} ({})", os.name, os.id);
        Ok(os)
    }

    pub fn update_operating_system(
        &self,
        id: OsId,
        draft: OsDraft,
    ) -> Result<OperatingSystem, ServiceError> {
        let mut store = self.lock();
        let os = store
            .os_mut(id)
            .ok_or_else(|| ServiceError::NotFound("OS not found".to_string()))?;
        os.name = draft.name.trim().to_string();
        os.kind = draft.kind;
        os.logo_url = draft.logo_url;
        os.is_active = draft.is_active;
        info!("Updated operating system {}", id);
        Ok(os.clone())
    }

    /// Removes the OS together with all of its versions.
    pub fn delete_operating_system(&self, id: OsId) -> Result<(), ServiceError> {
        let mut store = self.lock();
        let before = store.systems.len();
        store.systems.retain(|os| os.id != id);
        if store.systems.len() == before {
            return Err(ServiceError::NotFound("OS not found".to_string()));
        }
        info!("Deleted operating system {} and its versions", id);
        Ok(())
    }

    pub fn add_version(&self, os_id: OsId, name: &str) -> Result<OsVersion, ServiceError> {
        if !validation::is_present(name) {
            return Err(ServiceError::BadRequest(
                "OS ID and version are required".to_string(),
            ));
        }

        let mut store = self.lock();
        if store.os(os_id).is_none() {
            return Err(ServiceError::NotFound("OS not found".to_string()));
        }
        let version = OsVersion {
            id: store.alloc_version_id(),
            name: name.trim().to_string(),
            is_active: true,
        };
        if let Some(os) = store.os_mut(os_id) {
            os.versions.push(version.clone());
        }
        info!("Added version {} to operating system {}", version.name, os_id);
        Ok(version)
    }

    pub fn update_version(
        &self,
        id: VersionId,
        name: &str,
        is_active: bool,
    ) -> Result<OsVersion, ServiceError> {
        let mut store = self.lock();
        let version = store
            .version_mut(id)
            .ok_or_else(|| ServiceError::NotFound("Version not found".to_string()))?;
        version.name = name.trim().to_string();
        version.is_active = is_active;
        info!("Updated version {}", id);
        Ok(version.clone())
    }

    pub fn delete_version(&self, id: VersionId) -> Result<(), ServiceError> {
        let mut store = self.lock();
        for os in store.systems.iter_mut() {
            let before = os.versions.len();
            os.versions.retain(|v| v.id != id);
            if os.versions.len() != before {
                info!("Deleted version {} from {}", id, os.name);
                return Ok(());
            }
        }
        Err(ServiceError::NotFound("Version not found".to_string()))
    }

    pub fn prices(&self) -> PriceTable {
        self.lock().prices
    }

    /// Upsert a single service price.
    pub fn set_price(&self, service: ServiceType, price: u32) {
        self.lock().prices.set_price(service, price);
        info!("Price for {} set to {}", service, price);
    }

    /// All orders, newest first.
    pub fn list_orders(&self) -> Vec<OrderRecord> {
        self.lock().records_where(|_| true)
    }

    pub fn update_status(
        &self,
        order_number: &OrderNumber,
        status: OrderStatus,
    ) -> Result<OrderRecord, ServiceError> {
        let mut store = self.lock();
        let index = store
            .orders
            .iter()
            .position(|o| &o.order_number == order_number)
            .ok_or_else(|| ServiceError::NotFound("Order not found".to_string()))?;

        let order = &mut store.orders[index];
        order.status = status;
        order.updated_at = Utc::now();
        info!("Order {} status set to {}", order_number, status);

        let order = store.orders[index].clone();
        Ok(store.to_record(&order))
    }
}

impl OrderService for MemoryBackend {
    /// Active systems by id, each with its active versions sorted by name.
    fn load_catalog(&self) -> Result<Vec<OperatingSystem>, ServiceError> {
        let store = self.lock();
        let mut systems: Vec<OperatingSystem> = store
            .systems
            .iter()
            .filter(|os| os.is_active)
            .map(|os| {
                let mut versions: Vec<OsVersion> = os.selectable_versions().cloned().collect();
                versions.sort_by(|a, b| a.name.cmp(&b.name));
                OperatingSystem {
                    versions,
                    ..os.clone()
                }
            })
            .collect();
        systems.sort_by_key(|os| os.id);
        Ok(systems)
    }

    fn create_order(&self, request: &OrderRequest) -> Result<OrderCreated, ServiceError> {
        let mut store = self.lock();

        if let Err(e) = store.check_request(request) {
            warn!("Order {} rejected: {}", request.order_number, e);
            return Err(e);
        }

        let addons: Vec<AddOnRecord> = request
            .addons
            .iter()
            .map(|entry| {
                let listed = store.prices.add_on_price(entry.add_on);
                if listed != entry.price {
                    warn!(
                        "Order {}: {} submitted at {} but listed at {} (policy: {})",
                        request.order_number, entry.add_on, entry.price, listed, self.policy
                    );
                }
                let price = match self.policy {
                    AddOnPricingPolicy::ClientSnapshot => entry.price,
                    AddOnPricingPolicy::Authoritative => listed,
                };
                AddOnRecord {
                    addon_type: entry.add_on,
                    price,
                }
            })
            .collect();

        store.next_order_id += 1;
        let id = store.next_order_id;
        let now = Utc::now();
        store.orders.push(StoredOrder {
            id,
            order_number: request.order_number.clone(),
            installation_type: request.installation_type,
            customer_name: request.customer_name.clone(),
            customer_email: request.customer_email.clone(),
            customer_phone: request.customer_phone.clone(),
            customer_address: request.customer_address.clone(),
            status: OrderStatus::Pending,
            created_at: now,
            updated_at: now,
            selections: request.os_selections.clone(),
            addons,
        });

        info!("Order {} created (id {})", request.order_number, id);
        Ok(OrderCreated {
            message: "Order created successfully".to_string(),
            order_id: id,
            order_number: request.order_number.clone(),
        })
    }

    fn find_orders(&self, lookup: &OrderLookup) -> Result<Vec<OrderRecord>, ServiceError> {
        if lookup.email.is_empty() || lookup.phone.is_empty() {
            return Err(ServiceError::BadRequest(
                "Email and phone are required".to_string(),
            ));
        }

        let records = self.lock().records_where(|o| {
            o.customer_email == lookup.email && o.customer_phone == lookup.phone
        });
        debug!("{} order(s) found for {}", records.len(), lookup.email);
        Ok(records)
    }

    fn get_order(&self, order_number: &OrderNumber) -> Result<OrderRecord, ServiceError> {
        let store = self.lock();
        store
            .orders
            .iter()
            .find(|o| &o.order_number == order_number)
            .map(|o| store.to_record(o))
            .ok_or_else(|| ServiceError::NotFound("Order not found".to_string()))
    }
}
