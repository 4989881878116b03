//! In-process document store
//!
//! Serves the same records to every scope. Individual collections can be
//! marked as failing to exercise partial-failure handling.

use std::collections::HashSet;

use async_trait::async_trait;

use super::records::{CompanyRecord, ConceptRecord, ProjectRecord, ServicePlanRecord};
use super::store::{Collection, DocumentStore, RecordBatch, UserScope};
use crate::error::{SourceError, SourceResult};

#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    pub companies: Vec<CompanyRecord>,
    pub projects: Vec<ProjectRecord>,
    pub concepts: Vec<ConceptRecord>,
    pub service_plans: Vec<ServicePlanRecord>,
    failing: HashSet<Collection>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_companies(mut self, records: Vec<CompanyRecord>) -> Self {
        self.companies = records;
        self
    }

    pub fn with_projects(mut self, records: Vec<ProjectRecord>) -> Self {
        self.projects = records;
        self
    }

    pub fn with_concepts(mut self, records: Vec<ConceptRecord>) -> Self {
        self.concepts = records;
        self
    }

    pub fn with_service_plans(mut self, records: Vec<ServicePlanRecord>) -> Self {
        self.service_plans = records;
        self
    }

    /// Make every query against `collection` fail
    pub fn failing(mut self, collection: Collection) -> Self {
        self.failing.insert(collection);
        self
    }

    fn serve<T: Clone>(
        &self,
        collection: Collection,
        records: &[T],
    ) -> SourceResult<RecordBatch<T>> {
        if self.failing.contains(&collection) {
            return Err(SourceError::Unavailable(format!(
                "{} query failed",
                collection.as_str()
            )));
        }
        Ok(RecordBatch::from(records.to_vec()))
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn companies(&self, _scope: &UserScope) -> SourceResult<RecordBatch<CompanyRecord>> {
        self.serve(Collection::Companies, &self.companies)
    }

    async fn projects(&self, _scope: &UserScope) -> SourceResult<RecordBatch<ProjectRecord>> {
        self.serve(Collection::Projects, &self.projects)
    }

    async fn concepts(&self, _scope: &UserScope) -> SourceResult<RecordBatch<ConceptRecord>> {
        self.serve(Collection::Concepts, &self.concepts)
    }

    async fn service_plans(
        &self,
        _scope: &UserScope,
    ) -> SourceResult<RecordBatch<ServicePlanRecord>> {
        self.serve(Collection::ServicePlans, &self.service_plans)
    }
}
