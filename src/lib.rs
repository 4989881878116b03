//! Plan Graph
//!
//! Entity-relationship graph of a user's business-plan entities: companies,
//! projects, concepts, sub-menus, pages and service plans. The crate holds
//! the data adapter, graph assembly, filtering, force layout and pointer
//! interaction. The host application owns the window and the async runtime.

pub mod config;
pub mod error;
pub mod graph;
pub mod source;
pub mod telemetry;

pub use config::{global_config, GraphSettings, LayoutSettings};
pub use error::{ConfigError, RecordError, SourceError, SourceResult};
pub use graph::{
    // Pipeline
    BuildOutput,
    DataState,
    DisplayMode,
    Facet,
    FilterEngine,
    FilterState,
    ForceSimulation,
    // Core graph types
    Edge,
    EdgeKind,
    Graph,
    GraphBuilder,
    GraphCanvas,
    GraphLoader,
    GraphSession,
    Node,
    NodeId,
    NodeKind,
    UiEvent,
    VisibleGraph,
};
pub use source::{EntitySource, MemoryStore, SourceSnapshot, UserScope};
