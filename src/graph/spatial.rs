//! Spatial Index for pointer hit testing
//!
//! Uses R-tree (via `rstar`) for O(log n) lookups instead of a linear scan.
//! Owned by the rendering layer and rebuilt from simulation positions every
//! frame; it is the `NodeId → RenderHandle` map handed to the interaction
//! controller.

use std::collections::HashMap;

use rstar::{PointDistance, RTree, RTreeObject, AABB};

use super::force_sim::SimNode;
use super::types::{NodeId, NodeKind};

/// Where a node was drawn this frame
#[derive(Debug, Clone, PartialEq)]
pub struct RenderHandle {
    pub id: NodeId,
    pub kind: NodeKind,
    /// Center position in canvas coordinates
    pub center: [f32; 2],
    pub radius: f32,
    bounds: AABB<[f32; 2]>,
}

impl RenderHandle {
    pub fn new(id: NodeId, kind: NodeKind, center: [f32; 2], radius: f32) -> Self {
        let bounds = AABB::from_corners(
            [center[0] - radius, center[1] - radius],
            [center[0] + radius, center[1] + radius],
        );
        Self {
            id,
            kind,
            center,
            radius,
            bounds,
        }
    }

    pub fn from_sim(node: &SimNode, draw_radius: f32) -> Self {
        Self::new(
            node.id.clone(),
            node.kind,
            [node.position.x, node.position.y],
            draw_radius,
        )
    }

    /// Get the bounding box
    pub fn bounds(&self) -> &AABB<[f32; 2]> {
        &self.bounds
    }

    fn distance_2_center(&self, point: [f32; 2]) -> f32 {
        let dx = point[0] - self.center[0];
        let dy = point[1] - self.center[1];
        dx * dx + dy * dy
    }
}

impl RTreeObject for RenderHandle {
    type Envelope = AABB<[f32; 2]>;

    fn envelope(&self) -> Self::Envelope {
        self.bounds
    }
}

impl PointDistance for RenderHandle {
    fn distance_2(&self, point: &[f32; 2]) -> f32 {
        let d = distance_to_handle(*point, self);
        d * d
    }

    fn contains_point(&self, point: &[f32; 2]) -> bool {
        let dx = point[0] - self.center[0];
        let dy = point[1] - self.center[1];
        dx * dx + dy * dy <= self.radius * self.radius
    }
}

#[derive(Clone)]
pub struct SpatialIndex {
    tree: RTree<RenderHandle>,
    by_id: HashMap<NodeId, usize>,
    handles: Vec<RenderHandle>,
}

impl std::fmt::Debug for SpatialIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SpatialIndex")
            .field("count", &self.handles.len())
            .finish_non_exhaustive()
    }
}

impl Default for SpatialIndex {
    fn default() -> Self {
        Self::new()
    }
}

impl SpatialIndex {
    pub fn new() -> Self {
        Self {
            tree: RTree::new(),
            by_id: HashMap::new(),
            handles: Vec::new(),
        }
    }

    pub fn from_handles(handles: impl IntoIterator<Item = RenderHandle>) -> Self {
        let mut index = Self::new();
        index.rebuild(handles);
        index
    }

    /// Replace every handle; call once per frame after the simulation tick
    pub fn rebuild(&mut self, handles: impl IntoIterator<Item = RenderHandle>) {
        self.handles = handles.into_iter().collect();
        self.by_id = self
            .handles
            .iter()
            .enumerate()
            .map(|(i, h)| (h.id.clone(), i))
            .collect();
        self.tree = RTree::bulk_load(self.handles.clone());
    }

    pub fn clear(&mut self) {
        self.tree = RTree::new();
        self.by_id.clear();
        self.handles.clear();
    }

    /// Closest node within `threshold` of the point's edge distance
    pub fn hit_test(&self, point: [f32; 2], threshold: f32) -> Option<&RenderHandle> {
        let search = AABB::from_corners(
            [point[0] - threshold, point[1] - threshold],
            [point[0] + threshold, point[1] + threshold],
        );
        self.tree
            .locate_in_envelope_intersecting(&search)
            .min_by(|a, b| {
                // Overlapping rims tie at 0; the nearer center wins
                distance_to_handle(point, a)
                    .partial_cmp(&distance_to_handle(point, b))
                    .unwrap_or(std::cmp::Ordering::Equal)
                    .then_with(|| {
                        a.distance_2_center(point)
                            .partial_cmp(&b.distance_2_center(point))
                            .unwrap_or(std::cmp::Ordering::Equal)
                    })
            })
            .filter(|h| distance_to_handle(point, h) <= threshold)
    }

    pub fn get(&self, id: &NodeId) -> Option<&RenderHandle> {
        self.by_id.get(id).map(|&i| &self.handles[i])
    }

    pub fn len(&self) -> usize {
        self.handles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &RenderHandle> {
        self.handles.iter()
    }
}

/// Distance from point to the node's rim (0 inside)
fn distance_to_handle(point: [f32; 2], handle: &RenderHandle) -> f32 {
    let dx = point[0] - handle.center[0];
    let dy = point[1] - handle.center[1];
    ((dx * dx + dy * dy).sqrt() - handle.radius).max(0.0)
}
