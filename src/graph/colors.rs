//! Color palettes for the plan graph
//!
//! Fill/border per node kind, stroke per edge kind.

use egui::Color32;

use super::types::{EdgeKind, NodeKind};

// =============================================================================
// NODE COLORS
// =============================================================================

pub fn node_fill(kind: NodeKind) -> Color32 {
    match kind {
        NodeKind::Company => Color32::from_rgb(144, 164, 174), // Blue-gray
        NodeKind::Project => Color32::from_rgb(100, 181, 246), // Light blue
        NodeKind::Concept => Color32::from_rgb(129, 199, 132), // Light green
        NodeKind::SubMenu => Color32::from_rgb(255, 213, 79),  // Amber-300
        NodeKind::Page => Color32::from_rgb(206, 147, 216),    // Light purple
        NodeKind::ServicePlan => Color32::from_rgb(255, 138, 101), // Deep orange-300
    }
}

pub fn node_border(kind: NodeKind) -> Color32 {
    match kind {
        NodeKind::Company => Color32::from_rgb(69, 90, 100),
        NodeKind::Project => Color32::from_rgb(25, 118, 210),
        NodeKind::Concept => Color32::from_rgb(56, 142, 60),
        NodeKind::SubMenu => Color32::from_rgb(255, 160, 0),
        NodeKind::Page => Color32::from_rgb(142, 36, 170),
        NodeKind::ServicePlan => Color32::from_rgb(230, 74, 25),
    }
}

/// Ring drawn around statically declared projects and concepts
pub const FIXED_RING: Color32 = Color32::from_rgb(251, 191, 36);

/// Ring drawn around the hovered or dragged node
pub const FOCUS_RING: Color32 = Color32::from_rgb(96, 165, 250);

// =============================================================================
// EDGE COLORS
// =============================================================================

pub fn edge_color(kind: EdgeKind) -> Color32 {
    match kind {
        EdgeKind::CompanyProject => Color32::from_rgb(120, 144, 156),
        EdgeKind::ProjectConcept => Color32::from_rgb(66, 165, 245),
        EdgeKind::ConceptSubMenu | EdgeKind::CompanySubMenu => Color32::from_rgb(255, 202, 40),
        EdgeKind::SubMenuPage => Color32::from_rgb(186, 104, 200),
        EdgeKind::ConceptServicePlan | EdgeKind::ProjectServicePlan => {
            Color32::from_rgb(255, 112, 67)
        }
    }
}

pub fn edge_width(kind: EdgeKind) -> f32 {
    match kind {
        EdgeKind::CompanyProject => 1.0,
        EdgeKind::SubMenuPage => 1.0,
        _ => 1.5,
    }
}

// =============================================================================
// CHROME
// =============================================================================

pub const TOOLTIP_BG: Color32 = Color32::from_rgba_premultiplied(30, 30, 30, 230);
pub const TOOLTIP_TEXT: Color32 = Color32::from_rgb(235, 235, 235);
pub const MUTED_TEXT: Color32 = Color32::from_rgb(150, 150, 150);
