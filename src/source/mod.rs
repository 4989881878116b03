//! Entity Source Adapter
//!
//! Queries the document store and the static catalog for the entity
//! collections and hands back raw records only. Graph semantics belong to
//! [`crate::graph::builder`].
//!
//! Each query fails independently: one failing collection never aborts the
//! other three. The snapshot is only marked unavailable when there is no
//! authenticated scope or when every query failed.

pub mod detail;
pub mod http;
pub mod memory;
pub mod probe;
pub mod records;
pub mod store;

use std::sync::Arc;

pub use detail::{DetailContent, DetailRequest, DetailView, HttpDetailView};
pub use memory::MemoryStore;
pub use probe::{ContentProbe, HttpContentProbe, PlaceholderMatcher, ProbeOutcome, ProbeRequest};
pub use records::*;
pub use store::{Collection, DocumentStore, HttpDocumentStore, RecordBatch, UserScope};

use crate::config::FixedCatalog;
use crate::error::{RecordError, SourceError, SourceResult};

/// Everything the builder needs, exactly as fetched
#[derive(Debug, Clone, Default)]
pub struct SourceSnapshot {
    pub companies: Vec<CompanyRecord>,
    pub projects: Vec<ProjectRecord>,
    pub concepts: Vec<ConceptRecord>,
    pub service_plans: Vec<ServicePlanRecord>,
    pub fixed: FixedCatalog,
    /// Collections whose query failed, with the error text
    pub failures: Vec<(Collection, String)>,
    /// Elements of otherwise healthy collections that did not decode
    pub malformed: Vec<RecordError>,
    /// False when the graph must be empty (unauthenticated or total failure)
    pub available: bool,
}

impl SourceSnapshot {
    /// A snapshot that yields the empty graph
    pub fn unavailable(reason: &str) -> Self {
        Self {
            failures: Collection::all()
                .iter()
                .map(|c| (*c, reason.to_string()))
                .collect(),
            available: false,
            ..Self::default()
        }
    }

    fn take<T>(&mut self, collection: Collection, result: SourceResult<RecordBatch<T>>) -> Vec<T> {
        match result {
            Ok(mut batch) => {
                self.malformed.append(&mut batch.malformed);
                batch.records
            }
            Err(e) => {
                tracing::warn!(collection = collection.as_str(), error = %e, "entity query failed");
                self.failures.push((collection, e.to_string()));
                Vec::new()
            }
        }
    }
}

pub struct EntitySource {
    store: Arc<dyn DocumentStore>,
    fixed: FixedCatalog,
}

impl EntitySource {
    pub fn new(store: Arc<dyn DocumentStore>, fixed: FixedCatalog) -> Self {
        Self { store, fixed }
    }

    /// Run the four scoped queries concurrently
    pub async fn fetch_all(&self, scope: Option<&UserScope>) -> SourceSnapshot {
        let Some(scope) = scope else {
            tracing::info!("fetch skipped: {}", SourceError::Unauthenticated);
            return SourceSnapshot::unavailable(&SourceError::Unauthenticated.to_string());
        };

        let (companies, projects, concepts, service_plans) = tokio::join!(
            self.store.companies(scope),
            self.store.projects(scope),
            self.store.concepts(scope),
            self.store.service_plans(scope),
        );

        let mut snapshot = SourceSnapshot {
            fixed: self.fixed.clone(),
            ..SourceSnapshot::default()
        };
        snapshot.companies = snapshot.take(Collection::Companies, companies);
        snapshot.projects = snapshot.take(Collection::Projects, projects);
        snapshot.concepts = snapshot.take(Collection::Concepts, concepts);
        snapshot.service_plans = snapshot.take(Collection::ServicePlans, service_plans);
        snapshot.available = snapshot.failures.len() < Collection::all().len();

        if snapshot.available {
            tracing::info!(
                companies = snapshot.companies.len(),
                projects = snapshot.projects.len(),
                concepts = snapshot.concepts.len(),
                service_plans = snapshot.service_plans.len(),
                failed = snapshot.failures.len(),
                malformed = snapshot.malformed.len(),
                "fetched entity collections"
            );
        } else {
            tracing::warn!("every entity query failed, data unavailable");
        }

        snapshot
    }
}
