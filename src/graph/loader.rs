//! Async load pipeline: fetch → probe → build
//!
//! The four collection queries run concurrently, then every content probe
//! runs concurrently. Building only starts once all of them have resolved.

use std::sync::Arc;

use futures::future::join_all;

use super::builder::{BuildOutput, GraphBuilder, ProbeResults};
use crate::config::GraphSettings;
use crate::error::SourceResult;
use crate::source::{
    ContentProbe, DetailContent, DetailRequest, DetailView, EntitySource, HttpContentProbe,
    HttpDetailView, HttpDocumentStore, ProbeOutcome, UserScope,
};

pub struct GraphLoader {
    source: EntitySource,
    probe: Arc<dyn ContentProbe>,
    detail: Arc<dyn DetailView>,
    builder: GraphBuilder,
}

impl GraphLoader {
    pub fn new(
        source: EntitySource,
        probe: Arc<dyn ContentProbe>,
        detail: Arc<dyn DetailView>,
        builder: GraphBuilder,
    ) -> Self {
        Self {
            source,
            probe,
            detail,
            builder,
        }
    }

    /// HTTP store, probe and detail view from settings
    pub fn from_settings(settings: &GraphSettings) -> SourceResult<Self> {
        let store = HttpDocumentStore::new(&settings.store)?;
        Ok(Self::new(
            EntitySource::new(Arc::new(store), settings.fixed.clone()),
            Arc::new(HttpContentProbe::new(&settings.probe)?),
            Arc::new(HttpDetailView::new(&settings.probe)?),
            GraphBuilder::new(settings.probe.sub_menus.clone()),
        ))
    }

    pub async fn load(&self, scope: Option<&UserScope>) -> BuildOutput {
        let snapshot = self.source.fetch_all(scope).await;
        if !snapshot.available {
            return self.builder.build(&snapshot, &ProbeResults::new());
        }

        let requests = self.builder.probe_requests(&snapshot);
        let outcomes = join_all(requests.iter().map(|r| self.probe.probe(r))).await;

        let failed = outcomes
            .iter()
            .filter(|o| matches!(o, ProbeOutcome::Failed(_)))
            .count();
        if failed > 0 {
            tracing::debug!(failed, total = outcomes.len(), "content probes failed, treated as absent");
        }

        let results: ProbeResults = requests.into_iter().zip(outcomes).collect();
        self.builder.build(&snapshot, &results)
    }

    pub async fn fetch_detail(&self, request: &DetailRequest) -> SourceResult<DetailContent> {
        self.detail.fetch_detail(request).await
    }
}
