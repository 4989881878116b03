//! Graph Builder
//!
//! Deterministic construction of the full [`Graph`] from a
//! [`SourceSnapshot`] plus the outcomes of the content probes.
//!
//! Building is split in two so the builder itself stays pure:
//!
//! ```text
//! SourceSnapshot ──► probe_requests() ──► (async probes, run elsewhere)
//!        │                                        │
//!        └──────────────► build(snapshot, probe results) ──► BuildOutput
//! ```
//!
//! Malformed records are dropped and counted in the [`BuildReport`]; the
//! builder never fails on partial data.

use std::collections::{HashMap, HashSet};

use crate::error::RecordError;
use crate::graph::types::{Edge, EdgeKind, Graph, Node, NodeData, NodeId, PageData};
use crate::source::records::{has_components, PagesBySubMenu};
use crate::source::{ProbeOutcome, ProbeRequest, SourceSnapshot};

/// Probe outcome per (concept, submenu) candidate
pub type ProbeResults = HashMap<ProbeRequest, ProbeOutcome>;

/// What the builder dropped or probed along the way
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BuildReport {
    pub skipped: Vec<RecordError>,
    pub probes_planned: usize,
    pub probes_present: usize,
}

impl BuildReport {
    pub fn skipped_count(&self) -> usize {
        self.skipped.len()
    }
}

#[derive(Debug, Clone, Default)]
pub struct BuildOutput {
    pub graph: Graph,
    pub report: BuildReport,
    /// False when the source reported data-unavailable
    pub available: bool,
}

impl BuildOutput {
    pub fn unavailable() -> Self {
        Self::default()
    }
}

/// A concept after fixed/user merging, before it becomes a node
struct ResolvedConcept<'a> {
    id: NodeId,
    label: String,
    service_id: String,
    concept_id: String,
    description: Option<String>,
    is_fixed: bool,
    pages: Option<&'a PagesBySubMenu>,
}

impl ResolvedConcept<'_> {
    fn componentized(&self) -> bool {
        self.pages
            .map(|p| p.values().any(|pages| !pages.is_empty()))
            .unwrap_or(false)
    }
}

pub struct GraphBuilder {
    /// Submenus probed for non-componentized concepts
    sub_menus: Vec<String>,
}

impl GraphBuilder {
    pub fn new(sub_menus: Vec<String>) -> Self {
        Self { sub_menus }
    }

    /// Probe candidates: every known submenu of every non-componentized concept
    pub fn probe_requests(&self, snapshot: &SourceSnapshot) -> Vec<ProbeRequest> {
        if !snapshot.available {
            return Vec::new();
        }
        let mut scratch = BuildReport::default();
        resolve_concepts(snapshot, &mut scratch)
            .iter()
            .filter(|c| !c.componentized())
            .flat_map(|c| {
                self.sub_menus.iter().map(move |sub| ProbeRequest {
                    concept: c.id.clone(),
                    service_id: c.service_id.clone(),
                    concept_id: c.concept_id.clone(),
                    sub_menu_id: sub.clone(),
                })
            })
            .collect()
    }

    pub fn build(&self, snapshot: &SourceSnapshot, probes: &ProbeResults) -> BuildOutput {
        if !snapshot.available {
            tracing::info!("data unavailable, building empty graph");
            return BuildOutput::unavailable();
        }

        let mut graph = Graph::new();
        let mut report = BuildReport {
            skipped: snapshot.malformed.clone(),
            ..BuildReport::default()
        };

        // Companies
        let mut companies: Vec<NodeId> = Vec::new();
        for record in &snapshot.companies {
            if record.id.is_empty() {
                report.skipped.push(missing("companies", record.name.clone(), "id"));
                continue;
            }
            let node = Node {
                id: NodeId::company(&record.id),
                label: label_or(&record.name, &record.id),
                data: NodeData::Company {
                    description: record.description.clone(),
                    componentized: has_components(&record.pages_by_sub_menu),
                },
            };
            if graph.add_node(node) {
                companies.push(NodeId::company(&record.id));
            }
            if let Some(pages) = &record.pages_by_sub_menu {
                expand_components(
                    &mut graph,
                    &mut report,
                    &NodeId::company(&record.id),
                    EdgeKind::CompanySubMenu,
                    None,
                    pages,
                );
            }
        }

        // Projects: static specials first, then user-owned
        let mut projects: Vec<(NodeId, String)> = Vec::new();
        let fixed_services: HashSet<&str> = snapshot
            .fixed
            .projects
            .iter()
            .map(|p| p.service_id.as_str())
            .collect();
        for fixed in &snapshot.fixed.projects {
            let id = NodeId::fixed_project(&fixed.service_id);
            let node = Node {
                id: id.clone(),
                label: fixed.name.clone(),
                data: NodeData::Project {
                    service_id: fixed.service_id.clone(),
                    description: fixed.description.clone(),
                    is_fixed: true,
                },
            };
            if graph.add_node(node) {
                projects.push((id, fixed.service_id.clone()));
            }
        }
        for record in &snapshot.projects {
            if record.id.is_empty() {
                report.skipped.push(missing("projects", record.name.clone(), "id"));
                continue;
            }
            let Some(service_id) = record.service_id.as_deref().filter(|s| !s.is_empty()) else {
                report
                    .skipped
                    .push(missing("projects", record.id.clone(), "serviceId"));
                continue;
            };
            if record.duplicates_fixed || fixed_services.contains(service_id) {
                tracing::debug!(project = %record.id, "skipping project that mirrors a fixed project");
                continue;
            }
            let id = NodeId::project(&record.id);
            let node = Node {
                id: id.clone(),
                label: label_or(&record.name, &record.id),
                data: NodeData::Project {
                    service_id: service_id.to_string(),
                    description: record.description.clone(),
                    is_fixed: false,
                },
            };
            if graph.add_node(node) {
                projects.push((id, service_id.to_string()));
            }
        }

        // Concepts (+ their submenus and pages)
        let concepts = resolve_concepts(snapshot, &mut report);
        for concept in &concepts {
            let componentized = concept.componentized();
            let node = Node {
                id: concept.id.clone(),
                label: concept.label.clone(),
                data: NodeData::Concept {
                    service_id: concept.service_id.clone(),
                    concept_id: concept.concept_id.clone(),
                    description: concept.description.clone(),
                    is_fixed: concept.is_fixed,
                    componentized,
                },
            };
            if !graph.add_node(node) {
                continue;
            }

            if componentized {
                if let Some(pages) = concept.pages {
                    expand_components(
                        &mut graph,
                        &mut report,
                        &concept.id,
                        EdgeKind::ConceptSubMenu,
                        Some((&concept.service_id, &concept.concept_id)),
                        pages,
                    );
                }
                continue;
            }

            for sub in &self.sub_menus {
                report.probes_planned += 1;
                let request = ProbeRequest {
                    concept: concept.id.clone(),
                    service_id: concept.service_id.clone(),
                    concept_id: concept.concept_id.clone(),
                    sub_menu_id: sub.clone(),
                };
                // Missing outcome counts as absent
                let present = probes.get(&request).is_some_and(ProbeOutcome::has_content);
                if !present {
                    continue;
                }
                report.probes_present += 1;
                let sub_id = NodeId::sub_menu(&concept.id, sub);
                graph.add_node(Node {
                    id: sub_id.clone(),
                    label: sub.clone(),
                    data: NodeData::SubMenu {
                        owner: concept.id.clone(),
                        sub_menu_id: sub.clone(),
                        service_id: Some(concept.service_id.clone()),
                        concept_id: Some(concept.concept_id.clone()),
                        componentized: false,
                    },
                });
                graph.add_edge(Edge::new(concept.id.clone(), sub_id, EdgeKind::ConceptSubMenu));
            }
        }

        // Service plans
        let mut plans: Vec<(NodeId, Option<String>, Option<String>)> = Vec::new();
        for record in &snapshot.service_plans {
            if record.id.is_empty() {
                report
                    .skipped
                    .push(missing("service-plans", record.name.clone(), "id"));
                continue;
            }
            let service_id = record.service_id.clone().filter(|s| !s.is_empty());
            let concept_id = record.concept_id.clone().filter(|s| !s.is_empty());
            if service_id.is_none() && concept_id.is_none() {
                report
                    .skipped
                    .push(missing("service-plans", record.id.clone(), "serviceId"));
                continue;
            }
            let id = NodeId::service_plan(&record.id);
            let node = Node {
                id: id.clone(),
                label: label_or(&record.name, &record.id),
                data: NodeData::ServicePlan {
                    service_id: service_id.clone(),
                    concept_id: concept_id.clone(),
                    description: record.description.clone(),
                },
            };
            if graph.add_node(node) {
                plans.push((id, service_id, concept_id));
            }
        }

        // Every company sees every project
        for company in &companies {
            for (project, _) in &projects {
                graph.add_edge(Edge::new(
                    company.clone(),
                    project.clone(),
                    EdgeKind::CompanyProject,
                ));
            }
        }

        for concept in &concepts {
            for (project, service_id) in &projects {
                if *service_id == concept.service_id {
                    graph.add_edge(Edge::new(
                        project.clone(),
                        concept.id.clone(),
                        EdgeKind::ProjectConcept,
                    ));
                }
            }
        }

        // One parent per plan: a concept link supersedes the project link
        for (plan, service_id, concept_id) in &plans {
            let concept_parent = concept_id.as_deref().and_then(|key| {
                concepts.iter().find(|c| {
                    c.concept_id == key
                        && service_id.as_deref().map_or(true, |s| c.service_id == s)
                        && graph.has_node(&c.id)
                })
            });
            if let Some(concept) = concept_parent {
                graph.add_edge(Edge::new(
                    concept.id.clone(),
                    plan.clone(),
                    EdgeKind::ConceptServicePlan,
                ));
                continue;
            }
            let project_parent = service_id
                .as_deref()
                .and_then(|key| projects.iter().find(|(_, s)| s == key));
            if let Some((project, _)) = project_parent {
                graph.add_edge(Edge::new(
                    project.clone(),
                    plan.clone(),
                    EdgeKind::ProjectServicePlan,
                ));
            }
        }

        if !report.skipped.is_empty() {
            tracing::warn!(
                skipped = report.skipped.len(),
                "dropped malformed records while building graph"
            );
            for err in &report.skipped {
                tracing::debug!("{err}");
            }
        }
        tracing::info!(
            nodes = graph.nodes().len(),
            edges = graph.edges().len(),
            probes_planned = report.probes_planned,
            probes_present = report.probes_present,
            "built plan graph"
        );

        BuildOutput {
            graph,
            report,
            available: true,
        }
    }
}

/// Static special concepts not shadowed by a user record, then user concepts
fn resolve_concepts<'a>(
    snapshot: &'a SourceSnapshot,
    report: &mut BuildReport,
) -> Vec<ResolvedConcept<'a>> {
    let mut resolved = Vec::new();
    let mut user_keys: HashSet<(&str, &str)> = HashSet::new();
    let mut user = Vec::new();

    for record in &snapshot.concepts {
        if record.id.is_empty() {
            report.skipped.push(missing("concepts", record.name.clone(), "id"));
            continue;
        }
        let Some(service_id) = record.service_id.as_deref().filter(|s| !s.is_empty()) else {
            report
                .skipped
                .push(missing("concepts", record.id.clone(), "serviceId"));
            continue;
        };
        user_keys.insert((service_id, record.concept_key()));
        user.push(ResolvedConcept {
            id: NodeId::concept(&record.id),
            label: label_or(&record.name, &record.id),
            service_id: service_id.to_string(),
            concept_id: record.concept_key().to_string(),
            description: record.description.clone(),
            is_fixed: false,
            pages: record.pages_by_sub_menu.as_ref(),
        });
    }

    for (service_id, fixed) in &snapshot.fixed.concepts {
        for concept in fixed {
            if user_keys.contains(&(service_id.as_str(), concept.concept_id.as_str())) {
                continue;
            }
            resolved.push(ResolvedConcept {
                id: NodeId::fixed_concept(service_id, &concept.concept_id),
                label: concept.name.clone(),
                service_id: service_id.clone(),
                concept_id: concept.concept_id.clone(),
                description: concept.description.clone(),
                is_fixed: true,
                pages: None,
            });
        }
    }

    resolved.extend(user);
    resolved
}

/// One SubMenu per non-empty submenu array, one Page per entry
fn expand_components(
    graph: &mut Graph,
    report: &mut BuildReport,
    owner: &NodeId,
    link: EdgeKind,
    keys: Option<(&String, &String)>,
    pages_by_sub: &PagesBySubMenu,
) {
    for (sub, pages) in pages_by_sub {
        if pages.is_empty() {
            continue;
        }
        let sub_id = NodeId::sub_menu(owner, sub);
        graph.add_node(Node {
            id: sub_id.clone(),
            label: sub.clone(),
            data: NodeData::SubMenu {
                owner: owner.clone(),
                sub_menu_id: sub.clone(),
                service_id: keys.map(|(s, _)| s.clone()),
                concept_id: keys.map(|(_, c)| c.clone()),
                componentized: true,
            },
        });
        graph.add_edge(Edge::new(owner.clone(), sub_id.clone(), link));

        for (order, page) in pages.iter().enumerate() {
            if page.id.is_empty() {
                report
                    .skipped
                    .push(missing("pages", sub_id.to_string(), "id"));
                continue;
            }
            let page_id = NodeId::page(&sub_id, &page.id);
            graph.add_node(Node {
                id: page_id.clone(),
                label: label_or(&page.title, &page.id),
                data: NodeData::Page(PageData {
                    page_id: page.id.clone(),
                    title: page.title.clone(),
                    content: page.content.clone(),
                    order,
                }),
            });
            graph.add_edge(Edge::new(sub_id.clone(), page_id, EdgeKind::SubMenuPage));
        }
    }
}

fn missing(collection: &'static str, record_id: String, field: &'static str) -> RecordError {
    RecordError::MissingField {
        collection,
        record_id,
        field,
    }
}

fn label_or(name: &str, fallback: &str) -> String {
    if name.trim().is_empty() {
        fallback.to_string()
    } else {
        name.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::FixedCatalog;
    use crate::graph::types::NodeKind;
    use crate::source::records::*;
    use std::collections::BTreeMap;

    fn builder() -> GraphBuilder {
        GraphBuilder::new(vec!["market-size".into(), "competitors".into()])
    }

    fn empty_catalog() -> FixedCatalog {
        FixedCatalog {
            projects: vec![],
            concepts: BTreeMap::new(),
        }
    }

    fn snapshot() -> SourceSnapshot {
        let mut pages = PagesBySubMenu::new();
        pages.insert(
            "market-size".into(),
            vec![
                PageRecord {
                    id: "p1".into(),
                    title: "TAM".into(),
                    content: "12B".into(),
                },
                PageRecord {
                    id: "p2".into(),
                    title: "SAM".into(),
                    content: "3B".into(),
                },
            ],
        );
        pages.insert("competitors".into(), vec![]);

        SourceSnapshot {
            companies: vec![CompanyRecord {
                id: "k1".into(),
                name: "Acme".into(),
                ..Default::default()
            }],
            projects: vec![ProjectRecord {
                id: "pr1".into(),
                name: "Retail".into(),
                service_id: Some("svc-1".into()),
                ..Default::default()
            }],
            concepts: vec![
                ConceptRecord {
                    id: "c1".into(),
                    name: "Componentized".into(),
                    service_id: Some("svc-1".into()),
                    pages_by_sub_menu: Some(pages),
                    ..Default::default()
                },
                ConceptRecord {
                    id: "c2".into(),
                    name: "Static".into(),
                    service_id: Some("svc-1".into()),
                    ..Default::default()
                },
            ],
            service_plans: vec![
                ServicePlanRecord {
                    id: "sp1".into(),
                    name: "Plan A".into(),
                    service_id: Some("svc-1".into()),
                    concept_id: Some("c1".into()),
                    ..Default::default()
                },
                ServicePlanRecord {
                    id: "sp2".into(),
                    name: "Plan B".into(),
                    service_id: Some("svc-1".into()),
                    ..Default::default()
                },
            ],
            fixed: empty_catalog(),
            failures: vec![],
            malformed: vec![],
            available: true,
        }
    }

    #[test]
    fn test_componentized_expansion() {
        let out = builder().build(&snapshot(), &ProbeResults::new());
        let graph = &out.graph;
        let sub = NodeId::sub_menu(&NodeId::concept("c1"), "market-size");
        assert!(graph.has_node(&sub));
        // Empty submenu array creates nothing
        assert!(!graph.has_node(&NodeId::sub_menu(&NodeId::concept("c1"), "competitors")));
        assert_eq!(graph.nodes_of_kind(NodeKind::Page).count(), 2);
        assert!(graph.has_edge(&NodeId::concept("c1"), &sub, EdgeKind::ConceptSubMenu));
        assert!(graph.has_edge(&sub, &NodeId::page(&sub, "p2"), EdgeKind::SubMenuPage));
    }

    #[test]
    fn test_probe_requests_only_for_static_concepts() {
        let requests = builder().probe_requests(&snapshot());
        assert_eq!(requests.len(), 2);
        assert!(requests.iter().all(|r| r.concept == NodeId::concept("c2")));
    }

    #[test]
    fn test_probe_present_creates_submenu_without_pages() {
        let snap = snapshot();
        let mut probes = ProbeResults::new();
        for req in builder().probe_requests(&snap) {
            let outcome = if req.sub_menu_id == "market-size" {
                ProbeOutcome::Present
            } else {
                ProbeOutcome::Placeholder
            };
            probes.insert(req, outcome);
        }
        let out = builder().build(&snap, &probes);
        let sub = NodeId::sub_menu(&NodeId::concept("c2"), "market-size");
        assert!(out.graph.has_node(&sub));
        assert!(!out
            .graph
            .has_node(&NodeId::sub_menu(&NodeId::concept("c2"), "competitors")));
        assert!(!out
            .graph
            .edges()
            .iter()
            .any(|e| e.source == sub && e.kind == EdgeKind::SubMenuPage));
        assert_eq!(out.report.probes_present, 1);
    }

    #[test]
    fn test_concept_link_supersedes_project_link() {
        let out = builder().build(&snapshot(), &ProbeResults::new());
        let graph = &out.graph;
        let sp1 = NodeId::service_plan("sp1");
        let sp2 = NodeId::service_plan("sp2");
        assert!(graph.has_edge(&NodeId::concept("c1"), &sp1, EdgeKind::ConceptServicePlan));
        assert!(!graph.has_edge(&NodeId::project("pr1"), &sp1, EdgeKind::ProjectServicePlan));
        assert!(graph.has_edge(&NodeId::project("pr1"), &sp2, EdgeKind::ProjectServicePlan));
    }

    #[test]
    fn test_plan_attaches_to_concept_of_its_own_service() {
        let mut snap = snapshot();
        snap.projects.push(ProjectRecord {
            id: "pr2".into(),
            name: "Wholesale".into(),
            service_id: Some("svc-2".into()),
            ..Default::default()
        });
        // Same concept key under two services, foreign one listed first
        snap.concepts.insert(
            0,
            ConceptRecord {
                id: "c1-other".into(),
                name: "Elsewhere".into(),
                service_id: Some("svc-2".into()),
                concept_id: Some("c1".into()),
                ..Default::default()
            },
        );
        let out = builder().build(&snap, &ProbeResults::new());
        let sp1 = NodeId::service_plan("sp1");
        assert!(out
            .graph
            .has_edge(&NodeId::concept("c1"), &sp1, EdgeKind::ConceptServicePlan));
        assert!(!out
            .graph
            .has_edge(&NodeId::concept("c1-other"), &sp1, EdgeKind::ConceptServicePlan));
    }

    #[test]
    fn test_malformed_records_are_counted() {
        let mut snap = snapshot();
        snap.projects.push(ProjectRecord {
            id: "orphan".into(),
            ..Default::default()
        });
        snap.concepts.push(ConceptRecord {
            id: "c9".into(),
            ..Default::default()
        });
        let out = builder().build(&snap, &ProbeResults::new());
        assert_eq!(out.report.skipped_count(), 2);
        assert!(!out.graph.has_node(&NodeId::project("orphan")));
        assert!(!out.graph.has_node(&NodeId::concept("c9")));
    }

    #[test]
    fn test_undecodable_elements_are_counted() {
        let mut snap = snapshot();
        snap.malformed.push(RecordError::Malformed {
            collection: "companies",
            index: 0,
            reason: "invalid type: null, expected a string".into(),
        });
        let out = builder().build(&snap, &ProbeResults::new());
        assert_eq!(out.report.skipped_count(), 1);
        assert!(out.graph.has_node(&NodeId::company("k1")));
    }

    #[test]
    fn test_fixed_concept_shadowed_by_user_record() {
        let mut snap = snapshot();
        snap.fixed.concepts.insert(
            "svc-1".into(),
            vec![
                FixedConcept {
                    concept_id: "c2".into(),
                    name: "Fixed c2".into(),
                    description: None,
                },
                FixedConcept {
                    concept_id: "c7".into(),
                    name: "Fixed c7".into(),
                    description: None,
                },
            ],
        );
        let out = builder().build(&snap, &ProbeResults::new());
        assert!(!out.graph.has_node(&NodeId::fixed_concept("svc-1", "c2")));
        let fixed = out
            .graph
            .get_node(&NodeId::fixed_concept("svc-1", "c7"))
            .unwrap();
        assert!(fixed.is_fixed());
        assert!(out.graph.has_edge(
            &NodeId::project("pr1"),
            &fixed.id,
            EdgeKind::ProjectConcept
        ));
    }

    #[test]
    fn test_duplicate_of_fixed_project_skipped() {
        let mut snap = snapshot();
        snap.fixed.projects.push(FixedProject {
            service_id: "svc-fixed".into(),
            name: "Special".into(),
            description: None,
        });
        snap.projects.push(ProjectRecord {
            id: "pr-dup".into(),
            name: "Special copy".into(),
            service_id: Some("svc-other".into()),
            duplicates_fixed: true,
            ..Default::default()
        });
        let out = builder().build(&snap, &ProbeResults::new());
        assert!(out.graph.has_node(&NodeId::fixed_project("svc-fixed")));
        assert!(!out.graph.has_node(&NodeId::project("pr-dup")));
        assert_eq!(out.report.skipped_count(), 0);
    }

    #[test]
    fn test_unavailable_snapshot_builds_empty_graph() {
        let snap = SourceSnapshot::unavailable("offline");
        let out = builder().build(&snap, &ProbeResults::new());
        assert!(out.graph.is_empty());
        assert!(!out.available);
    }
}
