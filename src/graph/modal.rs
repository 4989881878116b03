//! Drill-down modal host
//!
//! One modal at a time. Opening a second modal closes the first; a close
//! action or a click on the overlay closes the active one. Detail views are
//! fetched asynchronously and resolved by modal id, so a result arriving
//! for a modal that has since been closed is dropped.

use serde::{Deserialize, Serialize};

use super::interaction::UiEvent;
use super::types::PageData;
use crate::error::SourceResult;
use crate::source::{DetailContent, DetailRequest};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ModalId(pub u64);

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DetailState {
    Loading,
    Ready(DetailContent),
    Failed(String),
}

#[derive(Debug, Clone, PartialEq)]
pub enum ModalContent {
    /// A single page straight from node attributes
    Page { title: String, content: String },
    /// Every page of a componentized submenu, in page order
    PageList { pages: Vec<PageData> },
    /// Rendered detail fetched through the detail-view interface
    Detail {
        request: DetailRequest,
        state: DetailState,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Modal {
    pub id: ModalId,
    pub title: String,
    pub content: ModalContent,
}

impl Modal {
    pub fn is_loading(&self) -> bool {
        matches!(
            self.content,
            ModalContent::Detail {
                state: DetailState::Loading,
                ..
            }
        )
    }
}

#[derive(Debug, Default)]
pub struct ModalHost {
    active: Option<Modal>,
    next_id: u64,
}

impl ModalHost {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn active(&self) -> Option<&Modal> {
        self.active.as_ref()
    }

    pub fn is_open(&self) -> bool {
        self.active.is_some()
    }

    /// Close whatever is open, then open the new modal
    pub fn open(&mut self, title: impl Into<String>, content: ModalContent) -> Vec<UiEvent> {
        let mut events: Vec<UiEvent> = self.close().into_iter().collect();

        self.next_id += 1;
        let modal = Modal {
            id: ModalId(self.next_id),
            title: title.into(),
            content,
        };
        if let ModalContent::Detail { request, .. } = &modal.content {
            events.push(UiEvent::DetailRequested {
                modal: modal.id,
                request: request.clone(),
            });
        }
        tracing::debug!(modal = modal.id.0, title = %modal.title, "modal opened");
        events.push(UiEvent::ModalOpened(modal.clone()));
        self.active = Some(modal);
        events
    }

    /// Explicit close action
    pub fn close(&mut self) -> Option<UiEvent> {
        let modal = self.active.take()?;
        tracing::debug!(modal = modal.id.0, "modal closed");
        Some(UiEvent::ModalClosed(modal.id))
    }

    /// Click on the overlay outside the content area
    pub fn overlay_clicked(&mut self) -> Option<UiEvent> {
        self.close()
    }

    /// Apply a fetched detail; ignored unless `id` is still the active modal
    pub fn resolve_detail(&mut self, id: ModalId, result: SourceResult<DetailContent>) -> bool {
        let Some(modal) = self.active.as_mut().filter(|m| m.id == id) else {
            tracing::debug!(modal = id.0, "discarding detail for closed modal");
            return false;
        };
        let ModalContent::Detail { state, .. } = &mut modal.content else {
            return false;
        };
        *state = match result {
            Ok(content) => DetailState::Ready(content),
            Err(e) => {
                tracing::warn!(modal = id.0, error = %e, "detail view fetch failed");
                DetailState::Failed(e.to_string())
            }
        };
        true
    }
}
