//! Graph session: the explicit recompute pipeline
//!
//! ```text
//! data change    ──► apply_refresh ──► rebuild facets ─┐
//! filter change  ─────────────────────────────────────►├──► recompute visible
//!                                                      │        │
//!                                  signature changed? ◄┘        ▼
//!                                          └──► restart simulation
//! ```
//!
//! Every stage is a pure function of its inputs except the simulation,
//! which keeps positions for retained nodes across restarts. Refreshes are
//! ticketed; a result carrying an old ticket is dropped.

use egui::Pos2;

use super::builder::{BuildOutput, BuildReport};
use super::filter::{DisplayMode, Facet, FilterEngine, FilterState};
use super::force_sim::{ForceSimulation, NodePosition};
use super::interaction::{InteractionContext, InteractionController, UiEvent};
use super::modal::{ModalHost, ModalId};
use super::spatial::{RenderHandle, SpatialIndex};
use super::types::{Edge, FacetOptions, Graph, GraphSignature, NodeId, NodeKind, VisibleGraph};
use crate::config::GraphSettings;
use crate::error::SourceResult;
use crate::source::DetailContent;

/// Drawn radius as a share of the collision radius
pub const DRAW_RADIUS_SCALE: f32 = 0.6;

/// What the host should display
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataState {
    /// No refresh has completed yet
    Loading,
    Ready,
    /// Unavailable or nothing to show; the host shows the "no data" message
    NoData,
}

/// Identifies one refresh; only the latest ticket may be applied
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RefreshTicket(u64);

/// Per-frame output for the rendering surface
#[derive(Debug)]
pub struct Frame<'a> {
    pub positions: Vec<NodePosition>,
    pub edges: &'a [Edge],
}

pub struct GraphSession {
    graph: Graph,
    visible: VisibleGraph,
    signature: GraphSignature,
    filters: FilterState,
    facets: FacetOptions,
    report: BuildReport,
    data_state: DataState,
    generation: u64,

    sim: ForceSimulation,
    handles: SpatialIndex,
    interaction: InteractionController,
    modals: ModalHost,
    events: Vec<UiEvent>,
}

impl GraphSession {
    pub fn new(settings: &GraphSettings) -> Self {
        Self {
            graph: Graph::new(),
            visible: VisibleGraph::default(),
            signature: GraphSignature::default(),
            filters: FilterState::new(),
            facets: FacetOptions::default(),
            report: BuildReport::default(),
            data_state: DataState::Loading,
            generation: 0,
            sim: ForceSimulation::new(settings.layout.clone()),
            handles: SpatialIndex::new(),
            interaction: InteractionController::new(settings.tooltip_chars),
            modals: ModalHost::new(),
            events: Vec::new(),
        }
    }

    // =========================================================================
    // DATA REFRESH
    // =========================================================================

    /// Start a refresh; any earlier ticket becomes stale
    pub fn begin_refresh(&mut self) -> RefreshTicket {
        self.generation += 1;
        RefreshTicket(self.generation)
    }

    /// Install a build result. Returns false if the ticket was superseded.
    pub fn apply_refresh(&mut self, ticket: RefreshTicket, output: BuildOutput) -> bool {
        if ticket.0 != self.generation {
            tracing::debug!(
                ticket = ticket.0,
                current = self.generation,
                "discarding superseded refresh"
            );
            return false;
        }

        self.data_state = if output.available && !output.graph.is_empty() {
            DataState::Ready
        } else {
            DataState::NoData
        };
        self.graph = output.graph;
        self.report = output.report;

        let pruned = FilterEngine::prune_stale(&self.graph, &mut self.filters);
        if pruned > 0 {
            tracing::debug!(pruned, "dropped stale facet selections after refresh");
        }
        self.facets = FacetOptions::from_graph(&self.graph);
        self.recompute_visible();
        true
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    // =========================================================================
    // FILTERS
    // =========================================================================

    pub fn set_mode(&mut self, mode: DisplayMode) {
        if self.filters.mode != mode {
            self.filters.mode = mode;
            self.recompute_visible();
        }
    }

    pub fn set_kind_enabled(&mut self, kind: NodeKind, enabled: bool) {
        self.filters.type_toggles.insert(kind, enabled);
        self.recompute_visible();
    }

    pub fn set_selection(&mut self, facet: Facet, ids: impl IntoIterator<Item = NodeId>) {
        *self.filters.selection_mut(facet) = ids.into_iter().collect();
        self.recompute_visible();
    }

    pub fn clear_facets(&mut self) {
        self.filters.clear_facets();
        self.recompute_visible();
    }

    pub fn set_filters(&mut self, filters: FilterState) {
        self.filters = filters;
        self.recompute_visible();
    }

    fn recompute_visible(&mut self) {
        let visible = FilterEngine::apply(&self.graph, &self.filters);
        let signature = visible.signature();
        self.visible = visible;
        if signature == self.signature {
            return;
        }
        self.signature = signature;
        let events = self.interaction.retain_visible(&self.visible);
        self.events.extend(events);
        self.sim.restart_with(&self.visible);
        tracing::debug!(nodes = self.visible.nodes.len(), "simulation restarted");
    }

    // =========================================================================
    // FRAME
    // =========================================================================

    /// Advance the simulation one tick and refresh the hit-test handles
    pub fn frame(&mut self) -> Frame<'_> {
        let positions = self.sim.tick();
        let layout = &self.sim.config;
        self.handles.rebuild(self.sim.nodes().iter().map(|n| {
            RenderHandle::from_sim(n, layout.collision_radius(n.kind) * DRAW_RADIUS_SCALE)
        }));
        Frame {
            positions,
            edges: &self.visible.edges,
        }
    }

    pub fn set_viewport_size(&mut self, width: f32, height: f32) {
        self.sim.set_viewport_size(width, height);
    }

    /// Stop the frame clock; nothing ticks until the next restart
    pub fn teardown(&mut self) {
        self.sim.stop();
        self.events.extend(self.modals.close());
        self.events.extend(self.interaction.pointer_left());
    }

    // =========================================================================
    // POINTER INPUT
    // =========================================================================

    fn with_pointer<F>(&mut self, f: F) -> Vec<UiEvent>
    where
        F: FnOnce(&mut InteractionController, &mut InteractionContext<'_>) -> Vec<UiEvent>,
    {
        let mut ctx = InteractionContext {
            graph: &self.graph,
            visible: &self.visible,
            handles: &self.handles,
            sim: &mut self.sim,
            modals: &mut self.modals,
        };
        let events = f(&mut self.interaction, &mut ctx);
        self.events.extend(events.iter().cloned());
        events
    }

    pub fn pointer_moved(&mut self, pos: Pos2) -> Vec<UiEvent> {
        self.with_pointer(|ctrl, ctx| ctrl.pointer_moved(pos, ctx))
    }

    pub fn pointer_left(&mut self) -> Vec<UiEvent> {
        self.with_pointer(|ctrl, _| ctrl.pointer_left())
    }

    pub fn drag_started(&mut self, pos: Pos2) -> Vec<UiEvent> {
        self.with_pointer(|ctrl, ctx| ctrl.drag_started(pos, ctx))
    }

    pub fn dragged(&mut self, pos: Pos2) {
        self.with_pointer(|ctrl, ctx| {
            ctrl.dragged(pos, ctx);
            Vec::new()
        });
    }

    pub fn drag_stopped(&mut self) -> Vec<UiEvent> {
        self.with_pointer(|ctrl, ctx| ctrl.drag_stopped(ctx))
    }

    pub fn clicked(&mut self, pos: Pos2) -> Vec<UiEvent> {
        self.with_pointer(|ctrl, ctx| ctrl.clicked(pos, ctx))
    }

    pub fn double_clicked(&mut self, pos: Pos2) -> Vec<UiEvent> {
        self.with_pointer(|ctrl, ctx| ctrl.double_clicked(pos, ctx))
    }

    pub fn close_modal(&mut self) -> Option<UiEvent> {
        let event = self.modals.close();
        self.events.extend(event.clone());
        event
    }

    pub fn overlay_clicked(&mut self) -> Option<UiEvent> {
        let event = self.modals.overlay_clicked();
        self.events.extend(event.clone());
        event
    }

    pub fn resolve_detail(&mut self, modal: ModalId, result: SourceResult<DetailContent>) -> bool {
        self.modals.resolve_detail(modal, result)
    }

    /// Events emitted since the last drain
    pub fn drain_events(&mut self) -> Vec<UiEvent> {
        std::mem::take(&mut self.events)
    }

    // =========================================================================
    // ACCESSORS
    // =========================================================================

    pub fn graph(&self) -> &Graph {
        &self.graph
    }

    pub fn visible(&self) -> &VisibleGraph {
        &self.visible
    }

    pub fn filters(&self) -> &FilterState {
        &self.filters
    }

    pub fn facet_options(&self) -> &FacetOptions {
        &self.facets
    }

    pub fn report(&self) -> &BuildReport {
        &self.report
    }

    pub fn data_state(&self) -> DataState {
        self.data_state
    }

    pub fn simulation(&self) -> &ForceSimulation {
        &self.sim
    }

    pub fn handles(&self) -> &SpatialIndex {
        &self.handles
    }

    pub fn interaction(&self) -> &InteractionController {
        &self.interaction
    }

    pub fn modals(&self) -> &ModalHost {
        &self.modals
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::interaction::PointerState;
    use crate::graph::types::{EdgeKind, Node, NodeData};

    fn output(companies: &[&str], projects: &[&str]) -> BuildOutput {
        let mut graph = Graph::new();
        for c in companies {
            graph.add_node(Node {
                id: NodeId::company(c),
                label: c.to_string(),
                data: NodeData::Company {
                    description: None,
                    componentized: false,
                },
            });
        }
        for p in projects {
            graph.add_node(Node {
                id: NodeId::project(p),
                label: p.to_string(),
                data: NodeData::Project {
                    service_id: p.to_string(),
                    description: None,
                    is_fixed: false,
                },
            });
            for c in companies {
                graph.add_edge(Edge::new(
                    NodeId::company(c),
                    NodeId::project(p),
                    EdgeKind::CompanyProject,
                ));
            }
        }
        BuildOutput {
            graph,
            report: BuildReport::default(),
            available: true,
        }
    }

    fn session() -> GraphSession {
        GraphSession::new(&GraphSettings::default())
    }

    #[test]
    fn test_stale_refresh_is_discarded() {
        let mut s = session();
        let first = s.begin_refresh();
        let second = s.begin_refresh();
        assert!(s.apply_refresh(second, output(&["k"], &["a"])));
        assert!(!s.apply_refresh(first, output(&["k"], &["a", "b", "c"])));
        assert_eq!(s.graph().nodes().len(), 2);
        assert_eq!(s.data_state(), DataState::Ready);
    }

    #[test]
    fn test_unavailable_shows_no_data() {
        let mut s = session();
        assert_eq!(s.data_state(), DataState::Loading);
        let ticket = s.begin_refresh();
        s.apply_refresh(ticket, BuildOutput::unavailable());
        assert_eq!(s.data_state(), DataState::NoData);
        assert!(s.frame().positions.is_empty());
    }

    #[test]
    fn test_unchanged_filters_do_not_restart_simulation() {
        let mut s = session();
        let ticket = s.begin_refresh();
        s.apply_refresh(ticket, output(&["k"], &["a", "b"]));
        for _ in 0..100 {
            s.frame();
        }
        let alpha = s.simulation().alpha();
        // Same visible set
        s.set_mode(DisplayMode::All);
        s.set_kind_enabled(NodeKind::Page, false);
        assert_eq!(s.simulation().alpha(), alpha);

        s.set_selection(Facet::Project, [NodeId::project("a")]);
        assert_eq!(s.simulation().alpha(), 1.0);
        assert_eq!(s.visible().nodes.len(), 2);
    }

    #[test]
    fn test_refresh_prunes_stale_selection() {
        let mut s = session();
        let ticket = s.begin_refresh();
        s.apply_refresh(ticket, output(&["k"], &["a", "b"]));
        s.set_selection(Facet::Project, [NodeId::project("b")]);

        let ticket = s.begin_refresh();
        s.apply_refresh(ticket, output(&["k"], &["a"]));
        assert!(s.filters().projects.is_empty());
        assert_eq!(s.visible().nodes.len(), 2);
    }

    #[test]
    fn test_frame_rebuilds_handles() {
        let mut s = session();
        let ticket = s.begin_refresh();
        s.apply_refresh(ticket, output(&["k"], &["a"]));
        let frame = s.frame();
        assert_eq!(frame.positions.len(), 2);
        assert_eq!(frame.edges.len(), 1);
        assert_eq!(s.handles().len(), 2);
        assert!(s.handles().get(&NodeId::company("k")).is_some());
    }

    #[test]
    fn test_drag_cancelled_by_filter_change() {
        let mut s = session();
        let ticket = s.begin_refresh();
        s.apply_refresh(ticket, output(&["k"], &["a", "b"]));
        for _ in 0..300 {
            s.frame();
        }
        let handle = s.handles().get(&NodeId::project("b")).unwrap().clone();
        let pos = Pos2::new(handle.center[0], handle.center[1]);
        s.drag_started(pos);

        s.set_selection(Facet::Project, [NodeId::project("a")]);
        assert_eq!(s.interaction().state(), &PointerState::Idle);
        assert!(s.simulation().get_node(&NodeId::project("b")).is_none());
        assert!(s.simulation().nodes().iter().all(|n| n.pin.is_none()));
    }
}
