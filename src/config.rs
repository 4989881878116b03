//! Graph settings
//!
//! Settings are loaded from `config/graph_settings.yaml` (or the file named
//! by `PLAN_GRAPH_CONFIG`) via `global_config()`. Every field has a built-in
//! default, so a missing file is not an error.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::graph::types::{EdgeKind, NodeKind};
use crate::source::records::{FixedConcept, FixedProject};

/// Environment variable naming an explicit settings file
pub const CONFIG_ENV_VAR: &str = "PLAN_GRAPH_CONFIG";

/// Default relative settings path
const DEFAULT_CONFIG_PATH: &str = "config/graph_settings.yaml";

static GLOBAL: OnceLock<GraphSettings> = OnceLock::new();

/// Process-wide settings, loaded on first access
pub fn global_config() -> &'static GraphSettings {
    GLOBAL.get_or_init(GraphSettings::from_env)
}

// =============================================================================
// SETTINGS
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GraphSettings {
    pub store: StoreSettings,
    pub probe: ProbeSettings,
    pub layout: LayoutSettings,
    pub fixed: FixedCatalog,
    /// Description excerpt length shown in tooltips
    pub tooltip_chars: usize,
}

impl Default for GraphSettings {
    fn default() -> Self {
        Self {
            store: StoreSettings::default(),
            probe: ProbeSettings::default(),
            layout: LayoutSettings::default(),
            fixed: FixedCatalog::default(),
            tooltip_chars: 100,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreSettings {
    pub base_url: String,
    pub timeout_secs: u64,
}

impl Default for StoreSettings {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8080/api".into(),
            timeout_secs: 15,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProbeSettings {
    /// Base URL of the rendered detail pages
    pub base_url: String,
    pub timeout_secs: u64,
    /// Submenus probed for every non-componentized concept
    pub sub_menus: Vec<String>,
    /// Boilerplate that does not count as real content (case-insensitive)
    pub placeholder_patterns: Vec<String>,
}

impl Default for ProbeSettings {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:3000".into(),
            timeout_secs: 10,
            sub_menus: [
                "market-size",
                "competitors",
                "target-customers",
                "business-model",
                "revenue-plan",
                "marketing",
                "organization",
            ]
            .into_iter()
            .map(String::from)
            .collect(),
            placeholder_patterns: [
                "coming soon",
                "under construction",
                "content is being prepared",
                "no content has been registered",
                "this page is not available yet",
            ]
            .into_iter()
            .map(String::from)
            .collect(),
        }
    }
}

/// Force simulation parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutSettings {
    pub width: f32,
    pub height: f32,
    /// Hard clamp distance from every canvas edge
    pub margin: f32,
    /// Pairwise repulsion (negative = repel)
    pub charge_strength: f32,
    /// Charge is not evaluated below this separation
    pub charge_distance_min: f32,
    pub center_strength: f32,
    pub velocity_decay: f32,
    pub alpha_min: f32,
    pub alpha_decay: f32,
    /// Energy restored by a manual restart
    pub reheat_alpha: f32,
    /// Energy target held while a node is dragged
    pub drag_alpha_target: f32,
    pub collision_strength: f32,
    pub collision_iterations: usize,
    pub link_distance: BTreeMap<EdgeKind, f32>,
    pub collision_radius: BTreeMap<NodeKind, f32>,
}

impl Default for LayoutSettings {
    fn default() -> Self {
        let alpha_min: f32 = 0.001;
        Self {
            width: 1200.0,
            height: 800.0,
            margin: 40.0,
            charge_strength: -300.0,
            charge_distance_min: 1.0,
            center_strength: 0.05,
            velocity_decay: 0.4,
            alpha_min,
            // Reaches alpha_min after ~300 ticks
            alpha_decay: 1.0 - alpha_min.powf(1.0 / 300.0),
            reheat_alpha: 0.3,
            drag_alpha_target: 0.3,
            collision_strength: 1.0,
            collision_iterations: 2,
            link_distance: BTreeMap::from([
                (EdgeKind::CompanyProject, 200.0),
                (EdgeKind::ProjectConcept, 150.0),
                (EdgeKind::ProjectServicePlan, 130.0),
                (EdgeKind::ConceptServicePlan, 110.0),
                (EdgeKind::CompanySubMenu, 110.0),
                (EdgeKind::ConceptSubMenu, 100.0),
                (EdgeKind::SubMenuPage, 60.0),
            ]),
            collision_radius: BTreeMap::from([
                (NodeKind::Company, 50.0),
                (NodeKind::Project, 40.0),
                (NodeKind::Concept, 32.0),
                (NodeKind::ServicePlan, 28.0),
                (NodeKind::SubMenu, 24.0),
                (NodeKind::Page, 16.0),
            ]),
        }
    }
}

impl LayoutSettings {
    pub fn link_distance(&self, kind: EdgeKind) -> f32 {
        self.link_distance.get(&kind).copied().unwrap_or(100.0)
    }

    pub fn collision_radius(&self, kind: NodeKind) -> f32 {
        self.collision_radius.get(&kind).copied().unwrap_or(20.0)
    }
}

/// Static special projects and their special concepts
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FixedCatalog {
    pub projects: Vec<FixedProject>,
    /// Keyed by the owning project's service id
    pub concepts: BTreeMap<String, Vec<FixedConcept>>,
}

impl Default for FixedCatalog {
    fn default() -> Self {
        Self {
            projects: vec![FixedProject {
                service_id: "sample-service".into(),
                name: "Sample business plan".into(),
                description: Some("Reference plan shipped with every account".into()),
            }],
            concepts: BTreeMap::from([(
                "sample-service".to_string(),
                vec![FixedConcept {
                    concept_id: "sample-concept".into(),
                    name: "Sample concept".into(),
                    description: None,
                }],
            )]),
        }
    }
}

// =============================================================================
// LOADING
// =============================================================================

impl GraphSettings {
    /// Load settings from a YAML file and validate them
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path.as_ref())?;
        Self::from_yaml(&text)
    }

    pub fn from_yaml(text: &str) -> Result<Self, ConfigError> {
        let settings: GraphSettings = serde_yaml::from_str(text)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Resolve settings from `PLAN_GRAPH_CONFIG`, then the default path,
    /// then built-in defaults. Load failures are logged, not fatal.
    pub fn from_env() -> Self {
        let path = Self::config_path();
        if !path.exists() {
            tracing::debug!(path = %path.display(), "no settings file, using defaults");
            return Self::default();
        }
        match Self::load(&path) {
            Ok(settings) => {
                tracing::info!(path = %path.display(), "loaded graph settings");
                settings
            }
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "invalid settings file, using defaults");
                Self::default()
            }
        }
    }

    fn config_path() -> PathBuf {
        if let Ok(path) = std::env::var(CONFIG_ENV_VAR) {
            return PathBuf::from(path);
        }
        PathBuf::from(DEFAULT_CONFIG_PATH)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let layout = &self.layout;
        if layout.width <= 0.0 || layout.height <= 0.0 {
            return Err(ConfigError::Invalid(format!(
                "canvas must be positive, got {}x{}",
                layout.width, layout.height
            )));
        }
        if layout.margin < 0.0
            || layout.margin * 2.0 >= layout.width
            || layout.margin * 2.0 >= layout.height
        {
            return Err(ConfigError::Invalid(format!(
                "margin {} leaves no drawable area",
                layout.margin
            )));
        }
        if let Some((kind, r)) = layout.collision_radius.iter().find(|(_, r)| **r < 0.0) {
            return Err(ConfigError::Invalid(format!(
                "negative collision radius {r} for {kind:?}"
            )));
        }
        if !(0.0..=1.0).contains(&layout.velocity_decay) {
            return Err(ConfigError::Invalid(format!(
                "velocity_decay must be within [0, 1], got {}",
                layout.velocity_decay
            )));
        }
        Ok(())
    }
}
