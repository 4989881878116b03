//! Shared fixtures for the integration tests

#![allow(dead_code)]

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;

use plan_graph::config::FixedCatalog;
use plan_graph::graph::GraphLoader;
use plan_graph::source::{
    CompanyRecord, ConceptRecord, ContentProbe, DetailContent, DetailRequest, DetailView,
    EntitySource, FixedProject, MemoryStore, PageRecord, ProbeOutcome, ProbeRequest,
    ProjectRecord, ServicePlanRecord,
};
use plan_graph::{GraphBuilder, SourceError, SourceResult};

pub const SUB_MENUS: &[&str] = &["market-size", "competitors", "business-model"];

/// Probe answering per submenu id; unknown submenus are placeholder-only
#[derive(Default)]
pub struct ScriptedProbe {
    outcomes: HashMap<String, ProbeOutcome>,
    calls: AtomicUsize,
}

impl ScriptedProbe {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, sub_menu: &str, outcome: ProbeOutcome) -> Self {
        self.outcomes.insert(sub_menu.to_string(), outcome);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ContentProbe for ScriptedProbe {
    async fn probe(&self, request: &ProbeRequest) -> ProbeOutcome {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.outcomes
            .get(&request.sub_menu_id)
            .cloned()
            .unwrap_or(ProbeOutcome::Placeholder)
    }
}

/// Detail view that echoes the request path, or always fails
pub struct EchoDetail {
    pub fail: bool,
}

#[async_trait]
impl DetailView for EchoDetail {
    async fn fetch_detail(&self, request: &DetailRequest) -> SourceResult<DetailContent> {
        if self.fail {
            return Err(SourceError::Unavailable("detail host down".into()));
        }
        Ok(DetailContent {
            title: request.concept_id.clone(),
            body: request.path(),
        })
    }
}

pub fn loader(store: MemoryStore, fixed: FixedCatalog, probe: Arc<ScriptedProbe>) -> GraphLoader {
    GraphLoader::new(
        EntitySource::new(Arc::new(store), fixed),
        probe,
        Arc::new(EchoDetail { fail: false }),
        GraphBuilder::new(SUB_MENUS.iter().map(|s| s.to_string()).collect()),
    )
}

/// One special project and no special concepts
pub fn special_catalog() -> FixedCatalog {
    FixedCatalog {
        projects: vec![FixedProject {
            service_id: "special".into(),
            name: "Special plan".into(),
            description: None,
        }],
        concepts: BTreeMap::new(),
    }
}

pub fn empty_catalog() -> FixedCatalog {
    FixedCatalog {
        projects: Vec::new(),
        concepts: BTreeMap::new(),
    }
}

pub fn company(id: &str) -> CompanyRecord {
    CompanyRecord {
        id: id.into(),
        name: format!("Company {id}"),
        ..Default::default()
    }
}

pub fn componentized_company(id: &str, sub_menu: &str, pages: &[&str]) -> CompanyRecord {
    CompanyRecord {
        pages_by_sub_menu: Some(BTreeMap::from([(sub_menu.to_string(), page_records(pages))])),
        ..company(id)
    }
}

pub fn project(id: &str, service_id: &str) -> ProjectRecord {
    ProjectRecord {
        id: id.into(),
        name: format!("Project {id}"),
        service_id: Some(service_id.into()),
        ..Default::default()
    }
}

pub fn concept(id: &str, service_id: &str) -> ConceptRecord {
    ConceptRecord {
        id: id.into(),
        name: format!("Concept {id}"),
        service_id: Some(service_id.into()),
        concept_id: Some(id.into()),
        ..Default::default()
    }
}

fn page_records(pages: &[&str]) -> Vec<PageRecord> {
    pages
        .iter()
        .map(|p| PageRecord {
            id: p.to_string(),
            title: format!("Page {p}"),
            content: format!("Body of {p}"),
        })
        .collect()
}

pub fn componentized_concept(id: &str, service_id: &str, sub_menu: &str, pages: &[&str]) -> ConceptRecord {
    ConceptRecord {
        pages_by_sub_menu: Some(BTreeMap::from([(sub_menu.to_string(), page_records(pages))])),
        ..concept(id, service_id)
    }
}

pub fn service_plan(id: &str, service_id: &str, concept_id: Option<&str>) -> ServicePlanRecord {
    ServicePlanRecord {
        id: id.into(),
        name: format!("Plan {id}"),
        service_id: Some(service_id.into()),
        concept_id: concept_id.map(String::from),
        ..Default::default()
    }
}
