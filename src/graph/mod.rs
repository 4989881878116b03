//! Plan Entity Graph Module
//!
//! Assembles the typed graph from fetched records, narrows it with the
//! filter engine, lays it out with a force simulation and routes pointer
//! input to tooltips, pinning and drill-down modals.
//!
//! # Architecture
//!
//! ```text
//! SourceSnapshot + ProbeResults
//!        │
//!        ▼
//! GraphBuilder (nodes, typed edges, build report)
//!        │
//!        ▼
//! Graph ──► FilterEngine (mode, type toggles, facet closure)
//!                 │
//!                 ▼
//!           VisibleGraph ──► ForceSimulation (ticks, pins)
//!                                  │
//!                                  ├──► SpatialIndex (hit testing)
//!                                  │
//!                                  └──► GraphCanvas (draws to egui::Painter)
//!                                             │
//!                                             ▼
//!                                  InteractionController ──► ModalHost
//! ```
//!
//! [`GraphSession`] owns every stage and recomputes downstream state when
//! data or filters change.
//!
//! # Usage
//!
//! ```ignore
//! let loader = GraphLoader::from_settings(&settings)?;
//! let mut session = GraphSession::new(&settings);
//! let ticket = session.begin_refresh();
//! session.apply_refresh(ticket, loader.load(Some(&scope)).await);
//! let mut canvas = GraphCanvas::new(session);
//! let events = canvas.ui(ui);
//! ```

pub mod builder;
pub mod colors;
pub mod filter;
pub mod force_sim;
pub mod interaction;
pub mod loader;
pub mod modal;
pub mod render;
pub mod session;
pub mod spatial;
pub mod types;

pub use builder::{BuildOutput, BuildReport, GraphBuilder, ProbeResults};
pub use filter::{DisplayMode, Facet, FilterEngine, FilterState};
pub use force_sim::{ForceSimulation, NodePosition, SimNode};
pub use interaction::{InteractionController, PointerState, Tooltip, UiEvent};
pub use loader::GraphLoader;
pub use modal::{DetailState, Modal, ModalContent, ModalHost, ModalId};
pub use render::GraphCanvas;
pub use session::{DataState, GraphSession, RefreshTicket};
pub use spatial::{RenderHandle, SpatialIndex};
pub use types::*;
