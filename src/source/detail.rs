//! Detail-view interface for modal drill-down
//!
//! Given (service, concept[, submenu]) returns renderable content. The body
//! is opaque to the graph; the rendering surface decides how to show it.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::http::{encode_segment, HttpClient};
use crate::config::ProbeSettings;
use crate::error::SourceResult;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DetailRequest {
    pub service_id: String,
    pub concept_id: String,
    /// `None` asks for the concept overview
    pub sub_menu_id: Option<String>,
}

impl DetailRequest {
    pub fn overview(service_id: impl Into<String>, concept_id: impl Into<String>) -> Self {
        Self {
            service_id: service_id.into(),
            concept_id: concept_id.into(),
            sub_menu_id: None,
        }
    }

    pub fn sub_menu(
        service_id: impl Into<String>,
        concept_id: impl Into<String>,
        sub_menu_id: impl Into<String>,
    ) -> Self {
        Self {
            service_id: service_id.into(),
            concept_id: concept_id.into(),
            sub_menu_id: Some(sub_menu_id.into()),
        }
    }

    pub fn path(&self) -> String {
        let base = format!(
            "/services/{}/concepts/{}",
            encode_segment(&self.service_id),
            encode_segment(&self.concept_id)
        );
        match &self.sub_menu_id {
            Some(sub) => format!("{base}/{}", encode_segment(sub)),
            None => base,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DetailContent {
    pub title: String,
    pub body: String,
}

#[async_trait]
pub trait DetailView: Send + Sync {
    async fn fetch_detail(&self, request: &DetailRequest) -> SourceResult<DetailContent>;
}

/// Fetches the rendered detail page from the same host the probe uses
pub struct HttpDetailView {
    http: HttpClient,
}

impl HttpDetailView {
    pub fn new(settings: &ProbeSettings) -> SourceResult<Self> {
        Ok(Self {
            http: HttpClient::new(
                &settings.base_url,
                Duration::from_secs(settings.timeout_secs),
            )?,
        })
    }
}

#[async_trait]
impl DetailView for HttpDetailView {
    async fn fetch_detail(&self, request: &DetailRequest) -> SourceResult<DetailContent> {
        let body = self.http.get_text(&request.path()).await?;
        let title = match &request.sub_menu_id {
            Some(sub) => format!("{} / {}", request.concept_id, sub),
            None => request.concept_id.clone(),
        };
        Ok(DetailContent { title, body })
    }
}
