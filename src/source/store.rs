//! Document store query interface
//!
//! Four read queries scoped by an opaque user/session identifier.

use std::time::Duration;

use async_trait::async_trait;
use serde::de::DeserializeOwned;

use super::http::{encode_segment, HttpClient};
use super::records::{CompanyRecord, ConceptRecord, ProjectRecord, ServicePlanRecord};
use crate::config::StoreSettings;
use crate::error::{RecordError, SourceResult};

/// Opaque user/session identifier that scopes every query
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct UserScope(String);

impl UserScope {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// The four store collections
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Collection {
    Companies,
    Projects,
    Concepts,
    ServicePlans,
}

impl Collection {
    pub fn all() -> &'static [Collection] {
        &[
            Collection::Companies,
            Collection::Projects,
            Collection::Concepts,
            Collection::ServicePlans,
        ]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Collection::Companies => "companies",
            Collection::Projects => "projects",
            Collection::Concepts => "concepts",
            Collection::ServicePlans => "service-plans",
        }
    }
}

/// One collection's decoded records plus the elements that failed to decode
#[derive(Debug, Clone)]
pub struct RecordBatch<T> {
    pub records: Vec<T>,
    pub malformed: Vec<RecordError>,
}

impl<T> Default for RecordBatch<T> {
    fn default() -> Self {
        Self {
            records: Vec::new(),
            malformed: Vec::new(),
        }
    }
}

impl<T> From<Vec<T>> for RecordBatch<T> {
    fn from(records: Vec<T>) -> Self {
        Self {
            records,
            malformed: Vec::new(),
        }
    }
}

impl<T: DeserializeOwned> RecordBatch<T> {
    /// Decode a JSON array element by element.
    ///
    /// A body that is not an array fails the whole collection. A single
    /// element that does not fit the record shape is set aside and the rest
    /// are kept.
    pub fn decode(collection: Collection, body: &str) -> SourceResult<Self> {
        let values: Vec<serde_json::Value> = serde_json::from_str(body)?;
        let mut batch = Self::default();
        for (index, value) in values.into_iter().enumerate() {
            match serde_json::from_value(value) {
                Ok(record) => batch.records.push(record),
                Err(e) => {
                    tracing::warn!(
                        collection = collection.as_str(),
                        index,
                        error = %e,
                        "dropping record that does not decode"
                    );
                    batch.malformed.push(RecordError::Malformed {
                        collection: collection.as_str(),
                        index,
                        reason: e.to_string(),
                    });
                }
            }
        }
        Ok(batch)
    }
}

#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn companies(&self, scope: &UserScope) -> SourceResult<RecordBatch<CompanyRecord>>;
    async fn projects(&self, scope: &UserScope) -> SourceResult<RecordBatch<ProjectRecord>>;
    async fn concepts(&self, scope: &UserScope) -> SourceResult<RecordBatch<ConceptRecord>>;
    async fn service_plans(
        &self,
        scope: &UserScope,
    ) -> SourceResult<RecordBatch<ServicePlanRecord>>;
}

/// REST-backed store: `GET {base}/users/{scope}/{collection}` returning a JSON array
#[derive(Clone)]
pub struct HttpDocumentStore {
    http: HttpClient,
}

impl HttpDocumentStore {
    pub fn new(settings: &StoreSettings) -> SourceResult<Self> {
        Ok(Self {
            http: HttpClient::new(
                &settings.base_url,
                Duration::from_secs(settings.timeout_secs),
            )?,
        })
    }

    async fn fetch<T: DeserializeOwned>(
        &self,
        scope: &UserScope,
        collection: Collection,
    ) -> SourceResult<RecordBatch<T>> {
        let body = self.http.get_text(&Self::path(scope, collection)).await?;
        RecordBatch::decode(collection, &body)
    }

    fn path(scope: &UserScope, collection: Collection) -> String {
        format!(
            "/users/{}/{}",
            encode_segment(scope.as_str()),
            collection.as_str()
        )
    }
}

#[async_trait]
impl DocumentStore for HttpDocumentStore {
    async fn companies(&self, scope: &UserScope) -> SourceResult<RecordBatch<CompanyRecord>> {
        self.fetch(scope, Collection::Companies).await
    }

    async fn projects(&self, scope: &UserScope) -> SourceResult<RecordBatch<ProjectRecord>> {
        self.fetch(scope, Collection::Projects).await
    }

    async fn concepts(&self, scope: &UserScope) -> SourceResult<RecordBatch<ConceptRecord>> {
        self.fetch(scope, Collection::Concepts).await
    }

    async fn service_plans(
        &self,
        scope: &UserScope,
    ) -> SourceResult<RecordBatch<ServicePlanRecord>> {
        self.fetch(scope, Collection::ServicePlans).await
    }
}
