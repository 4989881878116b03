//! End-to-end pipeline tests: store → probes → build → filter → layout → interaction

mod common;

use std::collections::HashSet;
use std::sync::Arc;

use common::*;
use plan_graph::config::GraphSettings;
use plan_graph::graph::{DetailState, ModalContent};
use plan_graph::source::{Collection, MemoryStore, ProbeOutcome, UserScope};
use plan_graph::{DataState, EdgeKind, Facet, GraphSession, NodeId, NodeKind, UiEvent};

fn scope() -> UserScope {
    UserScope::new("user-1")
}

fn visible_ids(session: &GraphSession) -> HashSet<NodeId> {
    session.visible().nodes.iter().map(|n| n.id.clone()).collect()
}

fn run_frames(session: &mut GraphSession, n: usize) {
    for _ in 0..n {
        session.frame();
    }
}

#[tokio::test]
async fn test_special_project_filter_excludes_user_branch() {
    plan_graph::telemetry::init_tracing();
    let store = MemoryStore::new()
        .with_companies(vec![company("acme")])
        .with_projects(vec![project("p-user", "svc-user")])
        .with_concepts(vec![concept("k1", "svc-user")]);
    let loader = loader(store, special_catalog(), Arc::new(ScriptedProbe::new()));

    let mut session = GraphSession::new(&GraphSettings::default());
    let ticket = session.begin_refresh();
    assert!(session.apply_refresh(ticket, loader.load(Some(&scope())).await));
    assert_eq!(session.data_state(), DataState::Ready);
    assert_eq!(session.visible().nodes.len(), 4);

    session.set_selection(Facet::Project, [NodeId::fixed_project("special")]);

    let expected: HashSet<NodeId> = [NodeId::company("acme"), NodeId::fixed_project("special")]
        .into_iter()
        .collect();
    assert_eq!(visible_ids(&session), expected);
    assert_eq!(session.visible().edges.len(), 1);
    assert_eq!(session.visible().edges[0].kind, EdgeKind::CompanyProject);
}

#[tokio::test]
async fn test_failed_probe_equals_placeholder_probe() {
    let records = || {
        MemoryStore::new()
            .with_projects(vec![project("p1", "svc")])
            .with_concepts(vec![concept("k1", "svc")])
    };

    let failing = Arc::new(
        ScriptedProbe::new()
            .with("market-size", ProbeOutcome::Failed("connection reset".into()))
            .with("competitors", ProbeOutcome::Present),
    );
    let placeholder = Arc::new(
        ScriptedProbe::new()
            .with("market-size", ProbeOutcome::Placeholder)
            .with("competitors", ProbeOutcome::Present),
    );

    let a = loader(records(), empty_catalog(), failing)
        .load(Some(&scope()))
        .await;
    let b = loader(records(), empty_catalog(), placeholder)
        .load(Some(&scope()))
        .await;

    assert_eq!(a.graph, b.graph);
    let k1 = NodeId::concept("k1");
    assert!(!a.graph.has_node(&NodeId::sub_menu(&k1, "market-size")));
    assert!(a.graph.has_node(&NodeId::sub_menu(&k1, "competitors")));
    assert_eq!(a.report.probes_present, 1);
    assert_eq!(a.report.probes_planned, SUB_MENUS.len());
}

#[tokio::test]
async fn test_componentized_concepts_are_never_probed() {
    let store = MemoryStore::new()
        .with_projects(vec![project("p1", "svc")])
        .with_concepts(vec![
            concept("static", "svc"),
            componentized_concept("built", "svc", "market-size", &["tam", "sam"]),
        ]);
    let probe = Arc::new(ScriptedProbe::new());
    let output = loader(store, empty_catalog(), probe.clone())
        .load(Some(&scope()))
        .await;

    assert_eq!(probe.calls(), SUB_MENUS.len());

    let built = NodeId::concept("built");
    let sub = NodeId::sub_menu(&built, "market-size");
    assert!(output.graph.has_edge(&built, &sub, EdgeKind::ConceptSubMenu));
    for page in ["tam", "sam"] {
        assert!(output
            .graph
            .has_edge(&sub, &NodeId::page(&sub, page), EdgeKind::SubMenuPage));
    }
}

#[tokio::test]
async fn test_partial_failure_keeps_remaining_collections() {
    let store = MemoryStore::new()
        .with_companies(vec![company("acme")])
        .with_projects(vec![project("p1", "svc")])
        .with_concepts(vec![concept("k1", "svc")])
        .failing(Collection::Concepts);
    let output = loader(store, empty_catalog(), Arc::new(ScriptedProbe::new()))
        .load(Some(&scope()))
        .await;

    assert!(output.available);
    assert!(output.graph.has_node(&NodeId::company("acme")));
    assert!(output.graph.has_node(&NodeId::project("p1")));
    assert_eq!(output.graph.nodes_of_kind(NodeKind::Concept).count(), 0);

    let mut session = GraphSession::new(&GraphSettings::default());
    let ticket = session.begin_refresh();
    session.apply_refresh(ticket, output);
    assert_eq!(session.data_state(), DataState::Ready);
}

#[tokio::test]
async fn test_unauthenticated_shows_no_data() {
    let store = MemoryStore::new().with_companies(vec![company("acme")]);
    let output = loader(store, special_catalog(), Arc::new(ScriptedProbe::new()))
        .load(None)
        .await;

    assert!(!output.available);
    assert!(output.graph.is_empty());

    let mut session = GraphSession::new(&GraphSettings::default());
    let ticket = session.begin_refresh();
    session.apply_refresh(ticket, output);
    assert_eq!(session.data_state(), DataState::NoData);
    assert!(session.visible().is_empty());
    assert!(session.frame().positions.is_empty());
}

#[tokio::test]
async fn test_every_query_failing_shows_no_data() {
    let store = Collection::all()
        .iter()
        .fold(MemoryStore::new(), |store, c| store.failing(*c));
    let output = loader(store, special_catalog(), Arc::new(ScriptedProbe::new()))
        .load(Some(&scope()))
        .await;

    assert!(!output.available);
    assert!(output.graph.is_empty());
}

#[tokio::test]
async fn test_superseded_refresh_is_discarded() {
    let small = loader(
        MemoryStore::new().with_companies(vec![company("a")]),
        empty_catalog(),
        Arc::new(ScriptedProbe::new()),
    );
    let big = loader(
        MemoryStore::new().with_companies(vec![company("a"), company("b"), company("c")]),
        empty_catalog(),
        Arc::new(ScriptedProbe::new()),
    );

    let mut session = GraphSession::new(&GraphSettings::default());
    let first = session.begin_refresh();
    let second = session.begin_refresh();

    assert!(session.apply_refresh(second, small.load(Some(&scope())).await));
    assert!(!session.apply_refresh(first, big.load(Some(&scope())).await));
    assert_eq!(session.graph().nodes().len(), 1);
}

#[tokio::test]
async fn test_user_concept_supersedes_fixed_concept() {
    let mut catalog = special_catalog();
    catalog.concepts.insert(
        "special".into(),
        vec![
            plan_graph::source::FixedConcept {
                concept_id: "vision".into(),
                name: "Vision".into(),
                description: None,
            },
            plan_graph::source::FixedConcept {
                concept_id: "pricing".into(),
                name: "Pricing".into(),
                description: None,
            },
        ],
    );
    let store = MemoryStore::new()
        .with_projects(vec![project("dup", "special")])
        .with_concepts(vec![concept("vision", "special")]);
    let output = loader(store, catalog, Arc::new(ScriptedProbe::new()))
        .load(Some(&scope()))
        .await;
    let graph = &output.graph;

    assert!(!graph.has_node(&NodeId::fixed_concept("special", "vision")));
    assert!(graph.has_node(&NodeId::fixed_concept("special", "pricing")));
    assert!(graph.has_node(&NodeId::concept("vision")));
    // The user copy of the special project is not a second project node
    assert!(!graph.has_node(&NodeId::project("dup")));
    assert!(graph.has_edge(
        &NodeId::fixed_project("special"),
        &NodeId::concept("vision"),
        EdgeKind::ProjectConcept
    ));
}

#[tokio::test]
async fn test_service_plan_prefers_concept_parent() {
    let store = MemoryStore::new()
        .with_projects(vec![project("p1", "svc")])
        .with_concepts(vec![concept("k1", "svc")])
        .with_service_plans(vec![
            service_plan("sp-concept", "svc", Some("k1")),
            service_plan("sp-project", "svc", None),
        ]);
    let output = loader(store, empty_catalog(), Arc::new(ScriptedProbe::new()))
        .load(Some(&scope()))
        .await;
    let graph = &output.graph;

    let with_concept = NodeId::service_plan("sp-concept");
    assert!(graph.has_edge(&NodeId::concept("k1"), &with_concept, EdgeKind::ConceptServicePlan));
    assert!(!graph.has_edge(&NodeId::project("p1"), &with_concept, EdgeKind::ProjectServicePlan));
    assert!(graph.has_edge(
        &NodeId::project("p1"),
        &NodeId::service_plan("sp-project"),
        EdgeKind::ProjectServicePlan
    ));
}

#[tokio::test]
async fn test_layout_is_deterministic() {
    let store = || {
        MemoryStore::new()
            .with_companies(vec![company("acme")])
            .with_projects(vec![project("p1", "svc"), project("p2", "svc2")])
            .with_concepts(vec![concept("k1", "svc"), concept("k2", "svc2")])
    };

    let mut sessions = Vec::new();
    for _ in 0..2 {
        let output = loader(store(), special_catalog(), Arc::new(ScriptedProbe::new()))
            .load(Some(&scope()))
            .await;
        let mut session = GraphSession::new(&GraphSettings::default());
        let ticket = session.begin_refresh();
        session.apply_refresh(ticket, output);
        run_frames(&mut session, 120);
        sessions.push(session);
    }

    assert_eq!(sessions[0].graph(), sessions[1].graph());
    assert_eq!(
        sessions[0].simulation().positions(),
        sessions[1].simulation().positions()
    );
}

#[tokio::test]
async fn test_double_click_drills_into_pages_and_details() {
    let store = MemoryStore::new()
        .with_projects(vec![project("p1", "svc")])
        .with_concepts(vec![
            concept("static", "svc"),
            componentized_concept("built", "svc", "market-size", &["tam", "sam"]),
        ]);
    let probe = Arc::new(ScriptedProbe::new().with("competitors", ProbeOutcome::Present));
    let loader = loader(store, empty_catalog(), probe);

    let mut session = GraphSession::new(plan_graph::global_config());
    let ticket = session.begin_refresh();
    session.apply_refresh(ticket, loader.load(Some(&scope())).await);
    run_frames(&mut session, 300);
    session.drain_events();

    let position = |session: &GraphSession, id: &NodeId| {
        session
            .simulation()
            .get_node(id)
            .map(|n| n.position)
            .expect("node is simulated")
    };

    // Componentized submenu: every page, in order
    let built_sub = NodeId::sub_menu(&NodeId::concept("built"), "market-size");
    let at = position(&session, &built_sub);
    session.double_clicked(at);
    let modal = session.modals().active().cloned().expect("page list open");
    match &modal.content {
        ModalContent::PageList { pages } => {
            let titles: Vec<&str> = pages.iter().map(|p| p.title.as_str()).collect();
            assert_eq!(titles, vec!["Page tam", "Page sam"]);
        }
        other => panic!("expected page list, got {other:?}"),
    }

    // Probed submenu: detail fetched through the detail view
    let static_sub = NodeId::sub_menu(&NodeId::concept("static"), "competitors");
    let at = position(&session, &static_sub);
    session.double_clicked(at);

    let events = session.drain_events();
    assert!(events
        .iter()
        .any(|e| matches!(e, UiEvent::ModalClosed(id) if *id == modal.id)));
    let (modal_id, request) = events
        .iter()
        .find_map(|e| match e {
            UiEvent::DetailRequested { modal, request } => Some((*modal, request.clone())),
            _ => None,
        })
        .expect("detail requested");
    assert_eq!(request.sub_menu_id.as_deref(), Some("competitors"));

    let detail = loader.fetch_detail(&request).await;
    assert!(session.resolve_detail(modal_id, detail));
    let active = session.modals().active().expect("detail modal open");
    assert!(matches!(
        &active.content,
        ModalContent::Detail {
            state: DetailState::Ready(_),
            ..
        }
    ));

    assert!(session.overlay_clicked().is_some());
    assert!(!session.modals().is_open());
}

#[tokio::test]
async fn test_teardown_stops_the_frame_clock() {
    let store = MemoryStore::new()
        .with_companies(vec![company("acme")])
        .with_projects(vec![project("p1", "svc")]);
    let output = loader(store, empty_catalog(), Arc::new(ScriptedProbe::new()))
        .load(Some(&scope()))
        .await;

    let mut session = GraphSession::new(&GraphSettings::default());
    let ticket = session.begin_refresh();
    session.apply_refresh(ticket, output);
    assert_eq!(session.frame().positions.len(), 2);

    session.teardown();
    assert!(session.frame().positions.is_empty());
}

#[tokio::test]
async fn test_facet_options_drive_combined_filters() {
    let store = MemoryStore::new()
        .with_companies(vec![company("acme")])
        .with_projects(vec![project("p1", "svc-1"), project("p2", "svc-2")])
        .with_concepts(vec![concept("k1", "svc-1"), concept("k2", "svc-orphan")]);
    let output = loader(store, empty_catalog(), Arc::new(ScriptedProbe::new()))
        .load(Some(&scope()))
        .await;

    let mut session = GraphSession::new(&GraphSettings::default());
    let ticket = session.begin_refresh();
    session.apply_refresh(ticket, output);
    let mut canvas = plan_graph::GraphCanvas::new(session);
    let session = canvas.session_mut();

    let options = session.facet_options().clone();
    let labels: Vec<&str> = options.projects.iter().map(|o| o.label.as_str()).collect();
    assert_eq!(labels, vec!["Project p1", "Project p2"]);
    assert_eq!(options.concepts.len(), 2);

    // k2 has no project, so its closure never meets p1's
    let filters = plan_graph::FilterState::new()
        .with_selection(Facet::Project, [options.projects[0].id.clone()])
        .with_selection(Facet::Concept, [NodeId::concept("k2")]);
    session.set_filters(filters);
    assert!(session.visible().is_empty());

    session.clear_facets();
    assert_eq!(session.visible().nodes.len(), 5);
}

#[tokio::test]
async fn test_company_and_concept_facets_reach_exact_sets() {
    let store = MemoryStore::new()
        .with_companies(vec![
            componentized_company("acme", "overview", &["o1", "o2"]),
            company("beta"),
        ])
        .with_projects(vec![project("p1", "svc-1"), project("p2", "svc-2")])
        .with_concepts(vec![
            componentized_concept("k1", "svc-1", "market-size", &["tam", "sam"]),
            concept("k2", "svc-2"),
        ])
        .with_service_plans(vec![service_plan("sp1", "svc-1", None)]);
    let scripted = Arc::new(ScriptedProbe::new().with("competitors", ProbeOutcome::Present));
    let output = loader(store, empty_catalog(), scripted).load(Some(&scope())).await;

    let mut session = GraphSession::new(&GraphSettings::default());
    let ticket = session.begin_refresh();
    session.apply_refresh(ticket, output);

    let acme = NodeId::company("acme");
    let overview = NodeId::sub_menu(&acme, "overview");
    let k1 = NodeId::concept("k1");
    let k1_market = NodeId::sub_menu(&k1, "market-size");
    let k2_competitors = NodeId::sub_menu(&NodeId::concept("k2"), "competitors");
    assert!(session
        .graph()
        .has_edge(&acme, &overview, EdgeKind::CompanySubMenu));

    // Forward walk plus the company's own submenu branch
    session.set_filters(
        plan_graph::FilterState::new().with_selection(Facet::Company, [acme.clone()]),
    );
    let expected: HashSet<NodeId> = [
        acme.clone(),
        overview.clone(),
        NodeId::page(&overview, "o1"),
        NodeId::page(&overview, "o2"),
        NodeId::project("p1"),
        NodeId::project("p2"),
        k1.clone(),
        k1_market.clone(),
        NodeId::page(&k1_market, "tam"),
        NodeId::page(&k1_market, "sam"),
        NodeId::concept("k2"),
        k2_competitors,
    ]
    .into_iter()
    .collect();
    assert_eq!(visible_ids(&session), expected);

    // Down to the concept's pages, back up through its project to every company
    session.set_filters(plan_graph::FilterState::new().with_selection(Facet::Concept, [k1.clone()]));
    let expected: HashSet<NodeId> = [
        k1,
        k1_market.clone(),
        NodeId::page(&k1_market, "tam"),
        NodeId::page(&k1_market, "sam"),
        NodeId::project("p1"),
        acme,
        NodeId::company("beta"),
    ]
    .into_iter()
    .collect();
    assert_eq!(visible_ids(&session), expected);
}
