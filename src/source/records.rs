//! Raw records as returned by the document store
//!
//! No graph semantics live here. Cross-reference fields are optional on the
//! wire; the builder decides what a missing reference means.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// A page inside a componentized submenu
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageRecord {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub content: String,
}

/// Pages grouped per submenu id, in submenu-id order
pub type PagesBySubMenu = BTreeMap<String, Vec<PageRecord>>;

/// True if at least one submenu carries at least one page
pub fn has_components(pages: &Option<PagesBySubMenu>) -> bool {
    pages
        .as_ref()
        .map(|by_sub| by_sub.values().any(|p| !p.is_empty()))
        .unwrap_or(false)
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompanyRecord {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub pages_by_sub_menu: Option<PagesBySubMenu>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectRecord {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    /// Service key shared with concepts and service plans
    #[serde(default)]
    pub service_id: Option<String>,
    /// Set by the store when the record mirrors a static special project
    #[serde(default)]
    pub duplicates_fixed: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConceptRecord {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    /// Owning project's service key
    #[serde(default)]
    pub service_id: Option<String>,
    /// Business concept key; falls back to the document id
    #[serde(default)]
    pub concept_id: Option<String>,
    #[serde(default)]
    pub pages_by_sub_menu: Option<PagesBySubMenu>,
}

impl ConceptRecord {
    pub fn concept_key(&self) -> &str {
        self.concept_id.as_deref().unwrap_or(&self.id)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServicePlanRecord {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    /// Owning project's service key
    #[serde(default)]
    pub service_id: Option<String>,
    /// Owning concept key
    #[serde(default)]
    pub concept_id: Option<String>,
}

/// A special project declared in static configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FixedProject {
    pub service_id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}

/// A special concept declared in static configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FixedConcept {
    pub concept_id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}
