//! Interaction Controller
//!
//! Binds pointer input to the layout simulation and the modal host.
//!
//! ```text
//!   Idle ──enter──► Hovering ──leave──► Idle
//!    │                 │
//!    └──down+move──────┴──► Dragging ──up──► Idle   (pin released)
//! ```
//!
//! Click and double-click are delivered by the rendering surface; a click
//! that ends a drag is swallowed.

use egui::Pos2;
use serde::{Deserialize, Serialize};

use super::force_sim::ForceSimulation;
use super::modal::{DetailState, Modal, ModalContent, ModalHost, ModalId};
use super::spatial::SpatialIndex;
use super::types::{EdgeKind, Graph, Node, NodeData, NodeId, NodeKind, PageData, VisibleGraph};
use crate::source::DetailRequest;

/// Extra pick slack around a node's rim, in canvas units
pub const HIT_SLOP: f32 = 3.0;

/// Discrete events for the rendering surface
#[derive(Debug, Clone, PartialEq)]
pub enum UiEvent {
    TooltipShown(Tooltip),
    TooltipHidden(NodeId),
    ModalOpened(Modal),
    ModalClosed(ModalId),
    /// The host must fetch this detail and hand it to [`ModalHost::resolve_detail`]
    DetailRequested {
        modal: ModalId,
        request: DetailRequest,
    },
    Reheated,
    DragStarted(NodeId),
    DragEnded(NodeId),
}

/// Hover card content anchored at the pointer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tooltip {
    pub node_id: NodeId,
    pub kind: NodeKind,
    pub label: String,
    pub description: Option<String>,
    pub x: f32,
    pub y: f32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum PointerState {
    #[default]
    Idle,
    Hovering(NodeId),
    Dragging(NodeId),
}

/// Everything a pointer event may touch
pub struct InteractionContext<'a> {
    /// Full graph, for page lists under a submenu
    pub graph: &'a Graph,
    pub visible: &'a VisibleGraph,
    pub handles: &'a SpatialIndex,
    pub sim: &'a mut ForceSimulation,
    pub modals: &'a mut ModalHost,
}

impl InteractionContext<'_> {
    fn pick(&self, pos: Pos2) -> Option<&Node> {
        let hit = self.handles.hit_test([pos.x, pos.y], HIT_SLOP)?;
        self.visible.get_node(&hit.id)
    }
}

#[derive(Debug)]
pub struct InteractionController {
    state: PointerState,
    tooltip: Option<Tooltip>,
    tooltip_chars: usize,
    /// Set when a drag ends so the trailing click is ignored
    swallow_click: bool,
}

impl InteractionController {
    pub fn new(tooltip_chars: usize) -> Self {
        Self {
            state: PointerState::Idle,
            tooltip: None,
            tooltip_chars,
            swallow_click: false,
        }
    }

    pub fn state(&self) -> &PointerState {
        &self.state
    }

    pub fn tooltip(&self) -> Option<&Tooltip> {
        self.tooltip.as_ref()
    }

    // =========================================================================
    // HOVER
    // =========================================================================

    pub fn pointer_moved(&mut self, pos: Pos2, ctx: &InteractionContext<'_>) -> Vec<UiEvent> {
        if matches!(self.state, PointerState::Dragging(_)) {
            return Vec::new();
        }
        let hit = ctx.pick(pos);
        let mut events = Vec::new();

        let same = matches!(
            (&self.state, hit),
            (PointerState::Hovering(current), Some(node)) if *current == node.id
        );
        if same {
            if let Some(tooltip) = &mut self.tooltip {
                tooltip.x = pos.x;
                tooltip.y = pos.y;
            }
            return events;
        }

        events.extend(self.hide_tooltip());
        match hit {
            Some(node) => {
                let tooltip = self.tooltip_for(node, pos);
                self.state = PointerState::Hovering(node.id.clone());
                self.tooltip = Some(tooltip.clone());
                events.push(UiEvent::TooltipShown(tooltip));
            }
            None => self.state = PointerState::Idle,
        }
        events
    }

    pub fn pointer_left(&mut self) -> Vec<UiEvent> {
        if matches!(self.state, PointerState::Dragging(_)) {
            return Vec::new();
        }
        self.state = PointerState::Idle;
        self.hide_tooltip().into_iter().collect()
    }

    fn hide_tooltip(&mut self) -> Option<UiEvent> {
        self.tooltip
            .take()
            .map(|t| UiEvent::TooltipHidden(t.node_id))
    }

    fn tooltip_for(&self, node: &Node, pos: Pos2) -> Tooltip {
        Tooltip {
            node_id: node.id.clone(),
            kind: node.kind(),
            label: node.label.clone(),
            description: node
                .description()
                .filter(|d| !d.trim().is_empty())
                .map(|d| truncate_chars(d, self.tooltip_chars)),
            x: pos.x,
            y: pos.y,
        }
    }

    // =========================================================================
    // DRAG
    // =========================================================================

    pub fn drag_started(&mut self, pos: Pos2, ctx: &mut InteractionContext<'_>) -> Vec<UiEvent> {
        let Some(id) = ctx.pick(pos).map(|n| n.id.clone()) else {
            return Vec::new();
        };
        if !ctx.sim.pin(&id) {
            return Vec::new();
        }
        let mut events: Vec<UiEvent> = self.hide_tooltip().into_iter().collect();
        ctx.sim.drag_to(&id, pos);
        self.state = PointerState::Dragging(id.clone());
        events.push(UiEvent::DragStarted(id));
        events
    }

    pub fn dragged(&mut self, pos: Pos2, ctx: &mut InteractionContext<'_>) {
        let PointerState::Dragging(id) = &self.state else {
            return;
        };
        if !ctx.sim.drag_to(id, pos) {
            // Node vanished under the pointer
            self.state = PointerState::Idle;
        }
    }

    pub fn drag_stopped(&mut self, ctx: &mut InteractionContext<'_>) -> Vec<UiEvent> {
        if !matches!(self.state, PointerState::Dragging(_)) {
            return Vec::new();
        }
        let PointerState::Dragging(id) = std::mem::take(&mut self.state) else {
            return Vec::new();
        };
        ctx.sim.release(&id);
        self.swallow_click = true;
        vec![UiEvent::DragEnded(id)]
    }

    /// Drop hover and drag state for nodes no longer visible
    pub fn retain_visible(&mut self, visible: &VisibleGraph) -> Vec<UiEvent> {
        let mut events = Vec::new();
        match &self.state {
            PointerState::Dragging(id) if !visible.contains(id) => {
                tracing::debug!(node = %id, "drag aborted, node left the visible graph");
                self.state = PointerState::Idle;
            }
            PointerState::Hovering(id) if !visible.contains(id) => {
                self.state = PointerState::Idle;
            }
            _ => {}
        }
        if self
            .tooltip
            .as_ref()
            .is_some_and(|t| !visible.contains(&t.node_id))
        {
            events.extend(self.hide_tooltip());
        }
        events
    }

    // =========================================================================
    // CLICK
    // =========================================================================

    pub fn clicked(&mut self, pos: Pos2, ctx: &mut InteractionContext<'_>) -> Vec<UiEvent> {
        if std::mem::take(&mut self.swallow_click) {
            return Vec::new();
        }
        let Some(node) = ctx.pick(pos).cloned() else {
            return Vec::new();
        };
        match &node.data {
            NodeData::Project { .. } => {
                ctx.sim.reheat();
                vec![UiEvent::Reheated]
            }
            NodeData::Concept {
                componentized: false,
                ..
            } => open_concept_overview(&node, ctx.modals),
            _ => Vec::new(),
        }
    }

    pub fn double_clicked(&mut self, pos: Pos2, ctx: &mut InteractionContext<'_>) -> Vec<UiEvent> {
        self.swallow_click = false;
        let Some(node) = ctx.pick(pos).cloned() else {
            return Vec::new();
        };
        match &node.data {
            NodeData::Page(page) => ctx.modals.open(
                node.label.clone(),
                ModalContent::Page {
                    title: page.title.clone(),
                    content: page.content.clone(),
                },
            ),
            NodeData::Concept { .. } => open_concept_overview(&node, ctx.modals),
            NodeData::SubMenu {
                componentized: true,
                ..
            } => {
                let pages = pages_under(ctx.graph, &node.id);
                ctx.modals
                    .open(node.label.clone(), ModalContent::PageList { pages })
            }
            NodeData::SubMenu {
                service_id: Some(service_id),
                concept_id: Some(concept_id),
                sub_menu_id,
                ..
            } => ctx.modals.open(
                node.label.clone(),
                ModalContent::Detail {
                    request: DetailRequest::sub_menu(service_id, concept_id, sub_menu_id),
                    state: DetailState::Loading,
                },
            ),
            _ => Vec::new(),
        }
    }
}

fn open_concept_overview(node: &Node, modals: &mut ModalHost) -> Vec<UiEvent> {
    let NodeData::Concept {
        service_id,
        concept_id,
        ..
    } = &node.data
    else {
        return Vec::new();
    };
    modals.open(
        node.label.clone(),
        ModalContent::Detail {
            request: DetailRequest::overview(service_id, concept_id),
            state: DetailState::Loading,
        },
    )
}

/// Pages linked from a submenu, in page order
pub fn pages_under(graph: &Graph, sub_menu: &NodeId) -> Vec<PageData> {
    let mut pages: Vec<PageData> = graph
        .edges()
        .iter()
        .filter(|e| e.kind == EdgeKind::SubMenuPage && &e.source == sub_menu)
        .filter_map(|e| graph.get_node(&e.target))
        .filter_map(|n| match &n.data {
            NodeData::Page(page) => Some(page.clone()),
            _ => None,
        })
        .collect();
    pages.sort_by_key(|p| p.order);
    pages
}

/// First `max` characters, with an ellipsis when cut
pub fn truncate_chars(text: &str, max: usize) -> String {
    let text = text.trim();
    match text.char_indices().nth(max) {
        Some((cut, _)) => format!("{}…", &text[..cut]),
        None => text.to_string(),
    }
}
