//! Graph types for the plan entity graph
//!
//! Nodes are a tagged union over the six entity kinds: a shared base
//! (id, label) plus a kind-specific attribute bag in [`NodeData`].

use std::borrow::Cow;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::fmt;

use serde::{Deserialize, Serialize};

// =============================================================================
// IDENTIFIERS
// =============================================================================

/// Globally unique, deterministic node identifier.
///
/// Derived from the record's document id or from a composite of static
/// identifiers, so the same logical entity gets the same id on every rebuild.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(String);

impl NodeId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn company(doc_id: &str) -> Self {
        Self(format!("company:{}", escape(doc_id)))
    }

    pub fn project(doc_id: &str) -> Self {
        Self(format!("project:{}", escape(doc_id)))
    }

    pub fn fixed_project(service_id: &str) -> Self {
        Self(format!("project:fixed:{}", escape(service_id)))
    }

    pub fn concept(doc_id: &str) -> Self {
        Self(format!("concept:{}", escape(doc_id)))
    }

    pub fn fixed_concept(service_id: &str, concept_id: &str) -> Self {
        Self(format!(
            "concept:fixed:{}:{}",
            escape(service_id),
            escape(concept_id)
        ))
    }

    /// SubMenu ids are keyed by owner + submenu id
    pub fn sub_menu(owner: &NodeId, sub_menu_id: &str) -> Self {
        Self(format!("{}/submenu:{}", owner.0, escape(sub_menu_id)))
    }

    /// Page ids are keyed by owner + submenu + page id
    pub fn page(sub_menu: &NodeId, page_id: &str) -> Self {
        Self(format!("{}/page:{}", sub_menu.0, escape(page_id)))
    }

    pub fn service_plan(doc_id: &str) -> Self {
        Self(format!("service-plan:{}", escape(doc_id)))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Percent-encode the id separators so no record id can forge another's id
fn escape(component: &str) -> Cow<'_, str> {
    if !component.contains(['%', ':', '/']) {
        return Cow::Borrowed(component);
    }
    let mut out = String::with_capacity(component.len() + 4);
    for ch in component.chars() {
        match ch {
            '%' => out.push_str("%25"),
            ':' => out.push_str("%3A"),
            '/' => out.push_str("%2F"),
            _ => out.push(ch),
        }
    }
    Cow::Owned(out)
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for NodeId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

// =============================================================================
// KINDS
// =============================================================================

/// Entity kinds, ordered from the top of the hierarchy down
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeKind {
    Company,
    Project,
    Concept,
    SubMenu,
    Page,
    ServicePlan,
}

impl NodeKind {
    pub fn all() -> &'static [NodeKind] {
        &[
            NodeKind::Company,
            NodeKind::Project,
            NodeKind::Concept,
            NodeKind::SubMenu,
            NodeKind::Page,
            NodeKind::ServicePlan,
        ]
    }

    /// Get display name for UI
    pub fn display_name(&self) -> &'static str {
        match self {
            NodeKind::Company => "Company",
            NodeKind::Project => "Project",
            NodeKind::Concept => "Concept",
            NodeKind::SubMenu => "Sub-menu",
            NodeKind::Page => "Page",
            NodeKind::ServicePlan => "Service plan",
        }
    }
}

/// Typed relationships. Directed for traversal, rendered undirected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EdgeKind {
    #[serde(rename = "company-project")]
    CompanyProject,
    #[serde(rename = "project-concept")]
    ProjectConcept,
    #[serde(rename = "concept-subMenu")]
    ConceptSubMenu,
    #[serde(rename = "company-subMenu")]
    CompanySubMenu,
    #[serde(rename = "subMenu-page")]
    SubMenuPage,
    #[serde(rename = "concept-servicePlan")]
    ConceptServicePlan,
    #[serde(rename = "project-servicePlan")]
    ProjectServicePlan,
}

impl EdgeKind {
    pub fn all() -> &'static [EdgeKind] {
        &[
            EdgeKind::CompanyProject,
            EdgeKind::ProjectConcept,
            EdgeKind::ConceptSubMenu,
            EdgeKind::CompanySubMenu,
            EdgeKind::SubMenuPage,
            EdgeKind::ConceptServicePlan,
            EdgeKind::ProjectServicePlan,
        ]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            EdgeKind::CompanyProject => "company-project",
            EdgeKind::ProjectConcept => "project-concept",
            EdgeKind::ConceptSubMenu => "concept-subMenu",
            EdgeKind::CompanySubMenu => "company-subMenu",
            EdgeKind::SubMenuPage => "subMenu-page",
            EdgeKind::ConceptServicePlan => "concept-servicePlan",
            EdgeKind::ProjectServicePlan => "project-servicePlan",
        }
    }

    /// Kinds of the (source, target) endpoints
    pub fn endpoints(&self) -> (NodeKind, NodeKind) {
        match self {
            EdgeKind::CompanyProject => (NodeKind::Company, NodeKind::Project),
            EdgeKind::ProjectConcept => (NodeKind::Project, NodeKind::Concept),
            EdgeKind::ConceptSubMenu => (NodeKind::Concept, NodeKind::SubMenu),
            EdgeKind::CompanySubMenu => (NodeKind::Company, NodeKind::SubMenu),
            EdgeKind::SubMenuPage => (NodeKind::SubMenu, NodeKind::Page),
            EdgeKind::ConceptServicePlan => (NodeKind::Concept, NodeKind::ServicePlan),
            EdgeKind::ProjectServicePlan => (NodeKind::Project, NodeKind::ServicePlan),
        }
    }
}

impl fmt::Display for EdgeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// NODES
// =============================================================================

/// A page entry copied out of a componentized submenu
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageData {
    pub page_id: String,
    pub title: String,
    pub content: String,
    /// Position within its submenu (drives modal ordering)
    pub order: usize,
}

/// Kind-specific attributes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum NodeData {
    Company {
        description: Option<String>,
        componentized: bool,
    },
    Project {
        service_id: String,
        description: Option<String>,
        is_fixed: bool,
    },
    Concept {
        service_id: String,
        concept_id: String,
        description: Option<String>,
        is_fixed: bool,
        componentized: bool,
    },
    SubMenu {
        owner: NodeId,
        sub_menu_id: String,
        /// Service/concept keys of the owning concept (probe and detail-view path)
        service_id: Option<String>,
        concept_id: Option<String>,
        componentized: bool,
    },
    Page(PageData),
    ServicePlan {
        service_id: Option<String>,
        concept_id: Option<String>,
        description: Option<String>,
    },
}

/// A node in the full graph
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub id: NodeId,
    pub label: String,
    pub data: NodeData,
}

impl Node {
    pub fn kind(&self) -> NodeKind {
        match self.data {
            NodeData::Company { .. } => NodeKind::Company,
            NodeData::Project { .. } => NodeKind::Project,
            NodeData::Concept { .. } => NodeKind::Concept,
            NodeData::SubMenu { .. } => NodeKind::SubMenu,
            NodeData::Page(_) => NodeKind::Page,
            NodeData::ServicePlan { .. } => NodeKind::ServicePlan,
        }
    }

    /// Whether the entity's content is a submenu → page collection.
    ///
    /// `None` for kinds where the distinction is meaningless (Project,
    /// ServicePlan).
    pub fn componentized(&self) -> Option<bool> {
        match &self.data {
            NodeData::Company { componentized, .. }
            | NodeData::Concept { componentized, .. }
            | NodeData::SubMenu { componentized, .. } => Some(*componentized),
            NodeData::Page(_) => Some(true),
            NodeData::Project { .. } | NodeData::ServicePlan { .. } => None,
        }
    }

    /// Declared in static configuration rather than stored per user
    pub fn is_fixed(&self) -> bool {
        match &self.data {
            NodeData::Project { is_fixed, .. } | NodeData::Concept { is_fixed, .. } => *is_fixed,
            _ => false,
        }
    }

    pub fn description(&self) -> Option<&str> {
        match &self.data {
            NodeData::Company { description, .. }
            | NodeData::Project { description, .. }
            | NodeData::Concept { description, .. }
            | NodeData::ServicePlan { description, .. } => description.as_deref(),
            NodeData::Page(page) => Some(page.content.as_str()),
            NodeData::SubMenu { .. } => None,
        }
    }
}

// =============================================================================
// EDGES
// =============================================================================

/// A typed edge between two nodes
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Edge {
    pub source: NodeId,
    pub target: NodeId,
    pub kind: EdgeKind,
}

impl Edge {
    pub fn new(source: NodeId, target: NodeId, kind: EdgeKind) -> Self {
        Self {
            source,
            target,
            kind,
        }
    }
}

// =============================================================================
// GRAPH
// =============================================================================

/// The full, deduplicated node/edge collection produced by the builder
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Graph {
    nodes: Vec<Node>,
    edges: Vec<Edge>,
    #[serde(skip)]
    node_index: HashMap<NodeId, usize>,
    #[serde(skip)]
    edge_set: HashSet<Edge>,
}

/// Per-kind counts for the stats overlay
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphStats {
    pub total_nodes: usize,
    pub total_edges: usize,
    pub nodes_by_kind: BTreeMap<NodeKind, usize>,
    pub edges_by_kind: BTreeMap<EdgeKind, usize>,
}

impl Graph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a node; a second node with the same id is ignored.
    ///
    /// Returns true if the node was inserted.
    pub fn add_node(&mut self, node: Node) -> bool {
        if self.node_index.contains_key(&node.id) {
            return false;
        }
        self.node_index.insert(node.id.clone(), self.nodes.len());
        self.nodes.push(node);
        true
    }

    /// Add an edge between two existing nodes; duplicates are ignored.
    pub fn add_edge(&mut self, edge: Edge) -> bool {
        if !self.has_node(&edge.source) || !self.has_node(&edge.target) {
            return false;
        }
        if !self.edge_set.insert(edge.clone()) {
            return false;
        }
        self.edges.push(edge);
        true
    }

    pub fn has_node(&self, id: &NodeId) -> bool {
        self.node_index.contains_key(id)
    }

    pub fn get_node(&self, id: &NodeId) -> Option<&Node> {
        self.node_index.get(id).map(|&idx| &self.nodes[idx])
    }

    pub fn has_edge(&self, source: &NodeId, target: &NodeId, kind: EdgeKind) -> bool {
        self.edge_set
            .contains(&Edge::new(source.clone(), target.clone(), kind))
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    pub fn nodes_of_kind(&self, kind: NodeKind) -> impl Iterator<Item = &Node> {
        self.nodes.iter().filter(move |n| n.kind() == kind)
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn stats(&self) -> GraphStats {
        let mut stats = GraphStats {
            total_nodes: self.nodes.len(),
            total_edges: self.edges.len(),
            ..GraphStats::default()
        };
        for node in &self.nodes {
            *stats.nodes_by_kind.entry(node.kind()).or_insert(0) += 1;
        }
        for edge in &self.edges {
            *stats.edges_by_kind.entry(edge.kind).or_insert(0) += 1;
        }
        stats
    }
}

// =============================================================================
// VISIBLE GRAPH
// =============================================================================

/// Edge-induced subset of the [`Graph`] selected by the filter engine
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VisibleGraph {
    pub nodes: Vec<Node>,
    pub edges: Vec<Edge>,
}

/// Order-independent identity of a visible node/edge set
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GraphSignature {
    nodes: Vec<NodeId>,
    edges: Vec<Edge>,
}

impl VisibleGraph {
    pub fn contains(&self, id: &NodeId) -> bool {
        self.nodes.iter().any(|n| &n.id == id)
    }

    pub fn get_node(&self, id: &NodeId) -> Option<&Node> {
        self.nodes.iter().find(|n| &n.id == id)
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn signature(&self) -> GraphSignature {
        let mut nodes: Vec<NodeId> = self.nodes.iter().map(|n| n.id.clone()).collect();
        nodes.sort();
        let mut edges = self.edges.clone();
        edges.sort();
        GraphSignature { nodes, edges }
    }
}

// =============================================================================
// FACET OPTIONS
// =============================================================================

/// One selectable entry in a facet multi-select
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FacetOption {
    pub id: NodeId,
    pub label: String,
}

/// Selectable values for the four facets, sorted by label
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FacetOptions {
    pub projects: Vec<FacetOption>,
    pub concepts: Vec<FacetOption>,
    pub companies: Vec<FacetOption>,
    pub sub_menus: Vec<FacetOption>,
}

impl FacetOptions {
    pub fn from_graph(graph: &Graph) -> Self {
        let collect = |kind: NodeKind| {
            let mut options: Vec<FacetOption> = graph
                .nodes_of_kind(kind)
                .map(|n| FacetOption {
                    id: n.id.clone(),
                    label: n.label.clone(),
                })
                .collect();
            options.sort_by(|a, b| a.label.cmp(&b.label).then_with(|| a.id.cmp(&b.id)));
            options
        };
        Self {
            projects: collect(NodeKind::Project),
            concepts: collect(NodeKind::Concept),
            companies: collect(NodeKind::Company),
            sub_menus: collect(NodeKind::SubMenu),
        }
    }
}
