//! Content probe for non-componentized concepts
//!
//! Fetches the rendered detail page for one (service, concept, submenu) and
//! decides whether it carries real content. The decision is a string
//! heuristic against known placeholder text, so it fails closed: any error
//! means "no content".

use std::time::Duration;

use async_trait::async_trait;
use regex::{Regex, RegexBuilder};

use super::http::{encode_segment, HttpClient};
use crate::config::ProbeSettings;
use crate::error::{ConfigError, SourceResult};
use crate::graph::types::NodeId;

/// One candidate submenu of one concept
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ProbeRequest {
    /// Concept node the submenu would attach to
    pub concept: NodeId,
    pub service_id: String,
    pub concept_id: String,
    pub sub_menu_id: String,
}

impl ProbeRequest {
    /// Detail page path for this submenu
    pub fn path(&self) -> String {
        format!(
            "/services/{}/concepts/{}/{}",
            encode_segment(&self.service_id),
            encode_segment(&self.concept_id),
            encode_segment(&self.sub_menu_id)
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProbeOutcome {
    /// 2xx with non-placeholder body
    Present,
    /// 2xx with placeholder-only body
    Placeholder,
    /// Non-2xx, network or decode error
    Failed(String),
}

impl ProbeOutcome {
    /// Only `Present` creates a node
    pub fn has_content(&self) -> bool {
        matches!(self, ProbeOutcome::Present)
    }
}

#[async_trait]
pub trait ContentProbe: Send + Sync {
    async fn probe(&self, request: &ProbeRequest) -> ProbeOutcome;
}

// =============================================================================
// PLACEHOLDER DETECTION
// =============================================================================

/// Compiled placeholder heuristic
#[derive(Debug, Clone)]
pub struct PlaceholderMatcher {
    blocks: Regex,
    tags: Regex,
    entities: Regex,
    placeholders: Option<Regex>,
}

impl PlaceholderMatcher {
    pub fn new(patterns: &[String]) -> Result<Self, ConfigError> {
        let placeholders = if patterns.is_empty() {
            None
        } else {
            let alternation = patterns
                .iter()
                .map(|p| regex::escape(p.trim()))
                .collect::<Vec<_>>()
                .join("|");
            Some(
                RegexBuilder::new(&format!("(?:{alternation})"))
                    .case_insensitive(true)
                    .build()?,
            )
        };

        Ok(Self {
            blocks: Regex::new(r"(?is)<(?:script|style|head)\b.*?</(?:script|style|head)>")?,
            tags: Regex::new(r"(?s)<[^>]*>")?,
            entities: Regex::new(r"&(?:[a-zA-Z]+|#[0-9]+);")?,
            placeholders,
        })
    }

    /// True if the rendered body has no text beyond placeholder boilerplate
    pub fn is_placeholder_only(&self, body: &str) -> bool {
        let text = self.blocks.replace_all(body, " ");
        let text = self.tags.replace_all(&text, " ");
        let text = self.entities.replace_all(&text, " ");
        let text = match &self.placeholders {
            Some(re) => re.replace_all(&text, " ").into_owned(),
            None => text.into_owned(),
        };
        !text.chars().any(char::is_alphanumeric)
    }
}

/// One-shot form of [`PlaceholderMatcher::is_placeholder_only`]
pub fn is_placeholder_only(body: &str, patterns: &[String]) -> Result<bool, ConfigError> {
    Ok(PlaceholderMatcher::new(patterns)?.is_placeholder_only(body))
}

// =============================================================================
// HTTP PROBE
// =============================================================================

pub struct HttpContentProbe {
    http: HttpClient,
    matcher: PlaceholderMatcher,
}

impl HttpContentProbe {
    pub fn new(settings: &ProbeSettings) -> SourceResult<Self> {
        Ok(Self {
            http: HttpClient::new(
                &settings.base_url,
                Duration::from_secs(settings.timeout_secs),
            )?,
            matcher: PlaceholderMatcher::new(&settings.placeholder_patterns)?,
        })
    }
}

#[async_trait]
impl ContentProbe for HttpContentProbe {
    async fn probe(&self, request: &ProbeRequest) -> ProbeOutcome {
        match self.http.get_text(&request.path()).await {
            Ok(body) if self.matcher.is_placeholder_only(&body) => ProbeOutcome::Placeholder,
            Ok(_) => ProbeOutcome::Present,
            Err(e) => ProbeOutcome::Failed(e.to_string()),
        }
    }
}
