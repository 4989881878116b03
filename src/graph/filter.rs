//! Filter Engine
//!
//! Derives the [`VisibleGraph`] from the full [`Graph`]:
//!
//! 1. mode filter (fixed vs componentized)
//! 2. node-kind toggles
//! 3. facet filters, each an independent closure over the *full* edge set,
//!    ANDed with the survivors of 1 and 2
//! 4. edge induction
//!
//! Never adds a node that is not in the Graph.

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};

use serde::{Deserialize, Serialize};

use super::types::{Edge, EdgeKind, Graph, Node, NodeId, NodeKind, VisibleGraph};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DisplayMode {
    #[default]
    All,
    FixedOnly,
    ComponentizedOnly,
}

impl DisplayMode {
    /// Only companies and concepts are judged; every other kind passes
    fn admits(&self, node: &Node) -> bool {
        let flag = match node.kind() {
            NodeKind::Company | NodeKind::Concept => node.componentized(),
            _ => None,
        };
        match (self, flag) {
            (DisplayMode::All, _) | (_, None) => true,
            (DisplayMode::FixedOnly, Some(c)) => !c,
            (DisplayMode::ComponentizedOnly, Some(c)) => c,
        }
    }
}

/// The four multi-select filter dimensions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Facet {
    Project,
    Concept,
    Company,
    SubMenu,
}

impl Facet {
    pub fn all() -> &'static [Facet] {
        &[Facet::Project, Facet::Concept, Facet::Company, Facet::SubMenu]
    }

    /// Node kind a selection in this facet refers to
    pub fn kind(&self) -> NodeKind {
        match self {
            Facet::Project => NodeKind::Project,
            Facet::Concept => NodeKind::Concept,
            Facet::Company => NodeKind::Company,
            Facet::SubMenu => NodeKind::SubMenu,
        }
    }
}

/// User-controlled filter inputs
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterState {
    #[serde(default)]
    pub mode: DisplayMode,
    /// Missing kinds are shown
    #[serde(default)]
    pub type_toggles: BTreeMap<NodeKind, bool>,
    #[serde(default)]
    pub projects: BTreeSet<NodeId>,
    #[serde(default)]
    pub concepts: BTreeSet<NodeId>,
    #[serde(default)]
    pub companies: BTreeSet<NodeId>,
    #[serde(default)]
    pub sub_menus: BTreeSet<NodeId>,
}

impl FilterState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_mode(mut self, mode: DisplayMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_selection(
        mut self,
        facet: Facet,
        ids: impl IntoIterator<Item = NodeId>,
    ) -> Self {
        *self.selection_mut(facet) = ids.into_iter().collect();
        self
    }

    pub fn with_kind(mut self, kind: NodeKind, enabled: bool) -> Self {
        self.type_toggles.insert(kind, enabled);
        self
    }

    pub fn is_kind_enabled(&self, kind: NodeKind) -> bool {
        self.type_toggles.get(&kind).copied().unwrap_or(true)
    }

    pub fn selection(&self, facet: Facet) -> &BTreeSet<NodeId> {
        match facet {
            Facet::Project => &self.projects,
            Facet::Concept => &self.concepts,
            Facet::Company => &self.companies,
            Facet::SubMenu => &self.sub_menus,
        }
    }

    pub fn selection_mut(&mut self, facet: Facet) -> &mut BTreeSet<NodeId> {
        match facet {
            Facet::Project => &mut self.projects,
            Facet::Concept => &mut self.concepts,
            Facet::Company => &mut self.companies,
            Facet::SubMenu => &mut self.sub_menus,
        }
    }

    pub fn has_active_facets(&self) -> bool {
        Facet::all().iter().any(|f| !self.selection(*f).is_empty())
    }

    /// Clear every facet selection
    pub fn clear_facets(&mut self) {
        for facet in Facet::all() {
            self.selection_mut(*facet).clear();
        }
    }
}

// =============================================================================
// ADJACENCY
// =============================================================================

/// Typed forward/backward adjacency over the full edge set
struct Adjacency<'g> {
    forward: HashMap<(&'g NodeId, EdgeKind), Vec<&'g NodeId>>,
    backward: HashMap<(&'g NodeId, EdgeKind), Vec<&'g NodeId>>,
}

impl<'g> Adjacency<'g> {
    fn new(edges: &'g [Edge]) -> Self {
        let mut forward: HashMap<_, Vec<_>> = HashMap::new();
        let mut backward: HashMap<_, Vec<_>> = HashMap::new();
        for edge in edges {
            forward
                .entry((&edge.source, edge.kind))
                .or_default()
                .push(&edge.target);
            backward
                .entry((&edge.target, edge.kind))
                .or_default()
                .push(&edge.source);
        }
        Self { forward, backward }
    }

    /// One hop along `kind` from every seed, source → target
    fn out(&self, seeds: &HashSet<&'g NodeId>, kind: EdgeKind) -> HashSet<&'g NodeId> {
        hop(&self.forward, seeds, kind)
    }

    /// One hop against `kind` from every seed, target → source
    fn back(&self, seeds: &HashSet<&'g NodeId>, kind: EdgeKind) -> HashSet<&'g NodeId> {
        hop(&self.backward, seeds, kind)
    }

    /// Submenus of the seeds and the pages below them
    fn sub_tree(&self, owners: &HashSet<&'g NodeId>, link: EdgeKind) -> HashSet<&'g NodeId> {
        let subs = self.out(owners, link);
        let pages = self.out(&subs, EdgeKind::SubMenuPage);
        subs.into_iter().chain(pages).collect()
    }

    fn closure(&self, facet: Facet, seeds: HashSet<&'g NodeId>) -> HashSet<&'g NodeId> {
        let mut reach = seeds.clone();
        match facet {
            Facet::Project => {
                let concepts = self.out(&seeds, EdgeKind::ProjectConcept);
                reach.extend(self.sub_tree(&concepts, EdgeKind::ConceptSubMenu));
                reach.extend(concepts);
                reach.extend(self.back(&seeds, EdgeKind::CompanyProject));
            }
            Facet::Concept => {
                reach.extend(self.sub_tree(&seeds, EdgeKind::ConceptSubMenu));
                let projects = self.back(&seeds, EdgeKind::ProjectConcept);
                reach.extend(self.back(&projects, EdgeKind::CompanyProject));
                reach.extend(projects);
            }
            Facet::Company => {
                let projects = self.out(&seeds, EdgeKind::CompanyProject);
                let concepts = self.out(&projects, EdgeKind::ProjectConcept);
                reach.extend(self.sub_tree(&concepts, EdgeKind::ConceptSubMenu));
                reach.extend(self.sub_tree(&seeds, EdgeKind::CompanySubMenu));
                reach.extend(projects);
                reach.extend(concepts);
            }
            Facet::SubMenu => {
                reach.extend(self.out(&seeds, EdgeKind::SubMenuPage));
                reach.extend(self.back(&seeds, EdgeKind::CompanySubMenu));
                let concepts = self.back(&seeds, EdgeKind::ConceptSubMenu);
                let projects = self.back(&concepts, EdgeKind::ProjectConcept);
                reach.extend(self.back(&projects, EdgeKind::CompanyProject));
                reach.extend(projects);
                reach.extend(concepts);
            }
        }
        reach
    }
}

fn hop<'g>(
    index: &HashMap<(&'g NodeId, EdgeKind), Vec<&'g NodeId>>,
    seeds: &HashSet<&'g NodeId>,
    kind: EdgeKind,
) -> HashSet<&'g NodeId> {
    seeds
        .iter()
        .filter_map(|id| index.get(&(*id, kind)))
        .flatten()
        .copied()
        .collect()
}

// =============================================================================
// ENGINE
// =============================================================================

pub struct FilterEngine;

impl FilterEngine {
    /// Pure function of (graph, state)
    pub fn apply(graph: &Graph, state: &FilterState) -> VisibleGraph {
        let mut survivors: HashSet<&NodeId> = graph
            .nodes()
            .iter()
            .filter(|n| state.mode.admits(n))
            .filter(|n| state.is_kind_enabled(n.kind()))
            .map(|n| &n.id)
            .collect();

        let adjacency = Adjacency::new(graph.edges());
        for facet in Facet::all() {
            let selected = state.selection(*facet);
            if selected.is_empty() {
                continue;
            }
            let seeds: HashSet<&NodeId> = selected
                .iter()
                .filter_map(|id| graph.get_node(id))
                .filter(|n| n.kind() == facet.kind())
                .map(|n| &n.id)
                .collect();
            if seeds.len() < selected.len() {
                tracing::debug!(
                    facet = ?facet,
                    stale = selected.len() - seeds.len(),
                    "ignoring facet ids not present in graph"
                );
            }
            // Only stale ids selected: facet has nothing to match
            if seeds.is_empty() {
                continue;
            }
            let reach = adjacency.closure(*facet, seeds);
            survivors.retain(|id| reach.contains(id));
        }

        let nodes: Vec<Node> = graph
            .nodes()
            .iter()
            .filter(|n| survivors.contains(&n.id))
            .cloned()
            .collect();
        let edges: Vec<Edge> = graph
            .edges()
            .iter()
            .filter(|e| survivors.contains(&e.source) && survivors.contains(&e.target))
            .cloned()
            .collect();

        tracing::debug!(
            nodes = nodes.len(),
            edges = edges.len(),
            mode = ?state.mode,
            "applied filters"
        );
        VisibleGraph { nodes, edges }
    }

    /// Drop selections whose ids no longer exist in `graph`
    pub fn prune_stale(graph: &Graph, state: &mut FilterState) -> usize {
        let mut removed = 0;
        for facet in Facet::all() {
            let selection = state.selection_mut(*facet);
            let before = selection.len();
            selection.retain(|id| {
                graph
                    .get_node(id)
                    .is_some_and(|n| n.kind() == facet.kind())
            });
            removed += before - selection.len();
        }
        removed
    }
}
