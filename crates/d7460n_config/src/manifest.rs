//! Layout manifest: the named slots the data layer may replace and the visibility gates of the page.
use crate::errors::Error;
use d7460n_shared::types::Result;
use serde_derive::{Deserialize, Serialize};
use std::path::Path;

/// Built-in manifest describing the canonical list/detail/editor layout
const DEFAULT_MANIFEST_JSON: &str = include_str!("./manifest.json");

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Manifest {
    #[serde(default)]
    pub slots: Vec<SlotSpec>,
    #[serde(default)]
    pub rules: Vec<RuleSpec>,
}

/// A content slot the injection step owns
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotSpec {
    pub name: String,
    /// Structural selector locating the slot's container element
    pub selector: String,
    pub kind: SlotKind,
    /// Keys that are injected as non-visible fields (table slots only). When absent the
    /// `inject.hidden_keys` setting applies.
    #[serde(default)]
    pub hidden_keys: Option<Vec<String>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SlotKind {
    /// One row per item
    Table,
    /// A single item as a description list
    Panel,
    /// A single item written into the named form controls
    Fields,
}

/// A visibility gate applied to every element matching `region`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleSpec {
    pub region: String,
    pub gate: GateKind,
    /// Selector the region must also match to be shown (toggle gates only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub when: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GateKind {
    Emptiness,
    Toggle,
}

impl Manifest {
    pub fn from_json(json: &str) -> Result<Self> {
        let manifest: Manifest = serde_json::from_str(json).map_err(Error::JsonSerde)?;
        Ok(manifest)
    }

    pub fn from_path(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path).map_err(Error::IO)?;
        Self::from_json(&json)
    }

    /// The manifest shipped with the engine
    pub fn builtin() -> Result<Self> {
        Self::from_json(DEFAULT_MANIFEST_JSON)
    }

    pub fn slot(&self, name: &str) -> Option<&SlotSpec> {
        self.slots.iter().find(|slot| slot.name == name)
    }
}
