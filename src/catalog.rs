//! Catalog snapshot
//!
//! The wizard loads the operating-system catalog once per session and treats
//! it as read-only afterwards. Versions are nested under their owning OS, so
//! a version can never reference a missing OS.
//!
//! Only *selectable* entries survive into a [`CatalogSnapshot`]: an active OS
//! with at least one active version, carrying only its active versions.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::Path;
use tracing::debug;

use crate::types::OsKind;

/// Operating system identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OsId(pub u32);

/// Operating system version identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VersionId(pub u32);

impl fmt::Display for OsId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for VersionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A version of an operating system, as served by the catalog endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OsVersion {
    pub id: VersionId,
    pub name: String,
    #[serde(default = "default_active")]
    pub is_active: bool,
}

/// An operating system record with its nested versions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperatingSystem {
    pub id: OsId,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: OsKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logo_url: Option<String>,
    #[serde(default = "default_active")]
    pub is_active: bool,
    #[serde(default)]
    pub versions: Vec<OsVersion>,
}

fn default_active() -> bool {
    true
}

impl OperatingSystem {
    /// Active versions, in catalog order.
    pub fn selectable_versions(&self) -> impl Iterator<Item = &OsVersion> {
        self.versions.iter().filter(|v| v.is_active)
    }

    /// An OS is offered only when it is active and has something to install.
    pub fn is_selectable(&self) -> bool {
        self.is_active && self.selectable_versions().next().is_some()
    }

    pub fn version(&self, id: VersionId) -> Option<&OsVersion> {
        self.versions.iter().find(|v| v.id == id)
    }
}

/// Immutable per-session view of the selectable catalog.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CatalogSnapshot {
    systems: Vec<OperatingSystem>,
}

impl CatalogSnapshot {
    /// Build a snapshot from raw catalog records, dropping anything that is
    /// not selectable.
    pub fn from_records(records: Vec<OperatingSystem>) -> Self {
        let total = records.len();
        let systems: Vec<OperatingSystem> = records
            .into_iter()
            .filter(OperatingSystem::is_selectable)
            .map(|mut os| {
                os.versions.retain(|v| v.is_active);
                os
            })
            .collect();

        debug!(
            "Catalog snapshot built: {} of {} operating systems selectable",
            systems.len(),
            total
        );

        Self { systems }
    }

    /// Load raw catalog records from a JSON file (same shape as the catalog endpoint).
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read catalog from {:?}", path.as_ref()))?;

        let records: Vec<OperatingSystem> =
            serde_json::from_str(&content).context("Failed to parse catalog JSON")?;

        Ok(Self::from_records(records))
    }

    pub fn systems(&self) -> &[OperatingSystem] {
        &self.systems
    }

    pub fn is_empty(&self) -> bool {
        self.systems.is_empty()
    }

    pub fn len(&self) -> usize {
        self.systems.len()
    }

    pub fn os(&self, id: OsId) -> Option<&OperatingSystem> {
        self.systems.iter().find(|os| os.id == id)
    }

    pub fn contains_os(&self, id: OsId) -> bool {
        self.os(id).is_some()
    }

    /// Look up a version under a specific owning OS.
    pub fn version(&self, os_id: OsId, version_id: VersionId) -> Option<&OsVersion> {
        self.os(os_id).and_then(|os| os.version(version_id))
    }
}
