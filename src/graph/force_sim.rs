//! Force Simulation for the plan entity graph
//!
//! A continuous, discrete-time force layout over the visible subgraph.
//! Designed for tens to a few hundred nodes; every pairwise force is
//! evaluated directly.
//!
//! Forces per tick:
//! - Link: spring toward a rest length keyed by edge kind
//! - Charge: uniform pairwise repulsion
//! - Center: weak pull toward the canvas center
//! - Collision: per-kind exclusion radius
//!
//! After integration every node, pinned or not, is hard-clamped into
//! `[margin, dimension - margin]`.
//!
//! Energy (`alpha`) decays geometrically toward `alpha_target` but the
//! simulation never stops emitting ticks.
//!
//! # Usage
//! ```ignore
//! let mut sim = ForceSimulation::new(LayoutSettings::default());
//! sim.restart_with(&visible);
//!
//! // Each frame:
//! for p in sim.tick() {
//!     draw_circle(p.x, p.y);
//! }
//! ```

use egui::{Pos2, Vec2};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::types::{NodeId, NodeKind, VisibleGraph};
use crate::config::LayoutSettings;

/// d3's initial phyllotaxis spacing
const INITIAL_RADIUS: f32 = 10.0;

/// π(3 - √5)
const GOLDEN_ANGLE: f32 = 2.399_963;

// =============================================================================
// SIMULATION NODE
// =============================================================================

/// A visible node plus its physical state
#[derive(Debug, Clone)]
pub struct SimNode {
    pub id: NodeId,
    pub kind: NodeKind,

    /// Current position (updated by simulation)
    pub position: Pos2,

    /// Current velocity
    velocity: Vec2,

    /// Pinned position while dragged
    pub pin: Option<Pos2>,

    /// Collision radius for this node's kind
    pub radius: f32,
}

impl SimNode {
    pub fn velocity(&self) -> Vec2 {
        self.velocity
    }

    pub fn is_pinned(&self) -> bool {
        self.pin.is_some()
    }
}

/// One position update for the rendering surface
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodePosition {
    pub node_id: NodeId,
    pub x: f32,
    pub y: f32,
}

#[derive(Debug, Clone)]
struct SimLink {
    source: usize,
    target: usize,
    distance: f32,
    strength: f32,
    /// Share of the correction applied to the target
    bias: f32,
}

// =============================================================================
// FORCE SIMULATION
// =============================================================================

#[derive(Debug, Clone)]
pub struct ForceSimulation {
    nodes: Vec<SimNode>,

    /// Quick lookup by ID
    node_index: HashMap<NodeId, usize>,

    links: Vec<SimLink>,

    /// Simulation configuration
    pub config: LayoutSettings,

    alpha: f32,
    alpha_target: f32,

    /// False once torn down; ticks emit nothing
    pub running: bool,

    /// Center point for the simulation
    pub center: Pos2,

    ticks: u64,
}

impl Default for ForceSimulation {
    fn default() -> Self {
        Self::new(LayoutSettings::default())
    }
}

impl ForceSimulation {
    pub fn new(config: LayoutSettings) -> Self {
        let center = Pos2::new(config.width / 2.0, config.height / 2.0);
        Self {
            nodes: Vec::new(),
            node_index: HashMap::new(),
            links: Vec::new(),
            config,
            alpha: 1.0,
            alpha_target: 0.0,
            running: true,
            center,
            ticks: 0,
        }
    }

    // =========================================================================
    // NODE MANAGEMENT
    // =========================================================================

    /// Restart over a new visible subgraph.
    ///
    /// Nodes present before keep position, velocity and pin. New nodes are
    /// placed on a phyllotaxis spiral around the center. Nodes that left are
    /// dropped together with any pin they had.
    pub fn restart_with(&mut self, visible: &VisibleGraph) {
        let mut previous: HashMap<NodeId, SimNode> = self
            .nodes
            .drain(..)
            .map(|n| (n.id.clone(), n))
            .collect();

        self.node_index.clear();
        let mut placed = 0usize;
        for node in &visible.nodes {
            let radius = self.config.collision_radius(node.kind());
            let sim_node = match previous.remove(&node.id) {
                Some(mut kept) => {
                    kept.kind = node.kind();
                    kept.radius = radius;
                    kept
                }
                None => {
                    let position = self.initial_position(placed);
                    placed += 1;
                    SimNode {
                        id: node.id.clone(),
                        kind: node.kind(),
                        position,
                        velocity: Vec2::ZERO,
                        pin: None,
                        radius,
                    }
                }
            };
            self.node_index.insert(sim_node.id.clone(), self.nodes.len());
            self.nodes.push(sim_node);
        }

        if !previous.is_empty() {
            tracing::trace!(dropped = previous.len(), "dropped nodes that left the visible graph");
        }

        self.rebuild_links(visible);
        self.alpha = 1.0;
        if !self.nodes.iter().any(SimNode::is_pinned) {
            self.alpha_target = 0.0;
        }
        self.running = true;
    }

    fn initial_position(&self, i: usize) -> Pos2 {
        let radius = INITIAL_RADIUS * (0.5 + i as f32).sqrt();
        let angle = i as f32 * GOLDEN_ANGLE;
        self.center + Vec2::angled(angle) * radius
    }

    /// Link strength and bias follow node degree, as in d3-force
    fn rebuild_links(&mut self, visible: &VisibleGraph) {
        let mut degree = vec![0usize; self.nodes.len()];
        let mut resolved = Vec::with_capacity(visible.edges.len());
        for edge in &visible.edges {
            let (Some(&s), Some(&t)) = (
                self.node_index.get(&edge.source),
                self.node_index.get(&edge.target),
            ) else {
                continue;
            };
            degree[s] += 1;
            degree[t] += 1;
            resolved.push((s, t, edge.kind));
        }

        self.links = resolved
            .into_iter()
            .map(|(source, target, kind)| {
                let (ds, dt) = (degree[source] as f32, degree[target] as f32);
                SimLink {
                    source,
                    target,
                    distance: self.config.link_distance(kind),
                    strength: 1.0 / ds.min(dt),
                    bias: ds / (ds + dt),
                }
            })
            .collect();
    }

    /// Get node by ID
    pub fn get_node(&self, id: &NodeId) -> Option<&SimNode> {
        self.node_index.get(id).map(|&idx| &self.nodes[idx])
    }

    fn get_node_mut(&mut self, id: &NodeId) -> Option<&mut SimNode> {
        self.node_index
            .get(id)
            .copied()
            .map(|idx| &mut self.nodes[idx])
    }

    pub fn nodes(&self) -> &[SimNode] {
        &self.nodes
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Current positions, in visible-graph order
    pub fn positions(&self) -> Vec<NodePosition> {
        self.nodes
            .iter()
            .map(|n| NodePosition {
                node_id: n.id.clone(),
                x: n.position.x,
                y: n.position.y,
            })
            .collect()
    }

    // =========================================================================
    // ENERGY
    // =========================================================================

    pub fn alpha(&self) -> f32 {
        self.alpha
    }

    pub fn alpha_target(&self) -> f32 {
        self.alpha_target
    }

    /// Low-energy steady state reached (ticks still run)
    pub fn is_settled(&self) -> bool {
        self.alpha < self.config.alpha_min
    }

    /// Raise energy back to an active level without touching positions
    pub fn reheat(&mut self) {
        self.alpha = self.alpha.max(self.config.reheat_alpha);
    }

    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    /// Unsubscribe from the frame clock
    pub fn stop(&mut self) {
        self.running = false;
    }

    // =========================================================================
    // SIMULATION
    // =========================================================================

    /// Run one simulation step and emit the resulting positions
    pub fn tick(&mut self) -> Vec<NodePosition> {
        if !self.running {
            return Vec::new();
        }
        self.ticks += 1;
        if self.nodes.is_empty() {
            return Vec::new();
        }

        self.alpha += (self.alpha_target - self.alpha) * self.config.alpha_decay;

        self.apply_links();
        self.apply_charge();
        self.apply_center();
        self.apply_collision();
        self.integrate();
        self.clamp_to_bounds();

        self.positions()
    }

    fn apply_links(&mut self) {
        let alpha = self.alpha;
        for (i, link) in self.links.iter().enumerate() {
            let (s, t) = (&self.nodes[link.source], &self.nodes[link.target]);
            let mut delta = (t.position + t.velocity) - (s.position + s.velocity);
            if delta.x == 0.0 {
                delta.x = jiggle(i);
            }
            if delta.y == 0.0 {
                delta.y = jiggle(i + 1);
            }
            let length = delta.length();
            let correction = delta * ((length - link.distance) / length * alpha * link.strength);
            self.nodes[link.target].velocity -= correction * link.bias;
            self.nodes[link.source].velocity += correction * (1.0 - link.bias);
        }
    }

    fn apply_charge(&mut self) {
        let n = self.nodes.len();
        let strength = self.config.charge_strength * self.alpha;
        let min2 = self.config.charge_distance_min * self.config.charge_distance_min;

        let mut impulses = vec![Vec2::ZERO; n];
        for i in 0..n {
            for j in (i + 1)..n {
                let mut delta = self.nodes[j].position - self.nodes[i].position;
                if delta.x == 0.0 {
                    delta.x = jiggle(i + j);
                }
                if delta.y == 0.0 {
                    delta.y = jiggle(i * j + 1);
                }
                let mut l = delta.length_sq();
                if l < min2 {
                    l = (min2 * l).sqrt();
                }
                // Negative strength pushes i away from j and j away from i
                let push = delta * (strength / l);
                impulses[i] += push;
                impulses[j] -= push;
            }
        }
        for (node, impulse) in self.nodes.iter_mut().zip(impulses) {
            node.velocity += impulse;
        }
    }

    fn apply_center(&mut self) {
        let k = self.config.center_strength * self.alpha;
        for node in &mut self.nodes {
            node.velocity += (self.center - node.position) * k;
        }
    }

    /// Not scaled by alpha, so overlaps keep resolving after cooling
    fn apply_collision(&mut self) {
        let n = self.nodes.len();
        let strength = self.config.collision_strength;
        for _ in 0..self.config.collision_iterations {
            for i in 0..n {
                for j in (i + 1)..n {
                    let (a, b) = (&self.nodes[i], &self.nodes[j]);
                    let (ri, rj) = (a.radius, b.radius);
                    let r = ri + rj;
                    let mut delta = (a.position + a.velocity) - (b.position + b.velocity);
                    let mut l = delta.length_sq();
                    if l >= r * r {
                        continue;
                    }
                    if delta.x == 0.0 {
                        delta.x = jiggle(i + j);
                        l += delta.x * delta.x;
                    }
                    if delta.y == 0.0 {
                        delta.y = jiggle(i * n + j);
                        l += delta.y * delta.y;
                    }
                    let l = l.sqrt();
                    let push = delta * ((r - l) / l * strength);
                    let share = (rj * rj) / (ri * ri + rj * rj);
                    self.nodes[i].velocity += push * share;
                    self.nodes[j].velocity -= push * (1.0 - share);
                }
            }
        }
    }

    fn integrate(&mut self) {
        let keep = 1.0 - self.config.velocity_decay;
        for node in &mut self.nodes {
            match node.pin {
                Some(pin) => {
                    node.position = pin;
                    node.velocity = Vec2::ZERO;
                }
                None => {
                    node.velocity *= keep;
                    node.position += node.velocity;
                }
            }
        }
    }

    /// Post-step correction, applied to pinned nodes too
    fn clamp_to_bounds(&mut self) {
        let (min_x, max_x) = bounds(self.config.width, self.config.margin);
        let (min_y, max_y) = bounds(self.config.height, self.config.margin);
        for node in &mut self.nodes {
            node.position.x = node.position.x.clamp(min_x, max_x);
            node.position.y = node.position.y.clamp(min_y, max_y);
        }
    }

    // =========================================================================
    // PINNING (for drag)
    // =========================================================================

    /// Pin a node where it is and hold energy up so neighbors react
    pub fn pin(&mut self, id: &NodeId) -> bool {
        let target = self.config.drag_alpha_target;
        let Some(node) = self.get_node_mut(id) else {
            return false;
        };
        node.pin = Some(node.position);
        node.velocity = Vec2::ZERO;
        self.alpha_target = target;
        self.alpha = self.alpha.max(target);
        true
    }

    /// Move a pinned node's pin and position to `pos`
    pub fn drag_to(&mut self, id: &NodeId, pos: Pos2) -> bool {
        let target = self.config.drag_alpha_target;
        let Some(node) = self.get_node_mut(id) else {
            return false;
        };
        node.pin = Some(pos);
        node.position = pos;
        self.alpha_target = target;
        true
    }

    /// Clear the pin; the node stays where it was and is free again
    pub fn release(&mut self, id: &NodeId) -> bool {
        let Some(node) = self.get_node_mut(id) else {
            return false;
        };
        node.pin = None;
        if !self.nodes.iter().any(SimNode::is_pinned) {
            self.alpha_target = 0.0;
        }
        true
    }

    // =========================================================================
    // VIEWPORT SCALING
    // =========================================================================

    /// Track the canvas size; the boundary clamp and center follow it
    pub fn set_viewport_size(&mut self, width: f32, height: f32) {
        if (self.config.width - width).abs() < f32::EPSILON
            && (self.config.height - height).abs() < f32::EPSILON
        {
            return;
        }
        self.config.width = width;
        self.config.height = height;
        self.center = Pos2::new(width / 2.0, height / 2.0);
        self.reheat();
    }
}

/// Clamp range on one axis; collapses to the midpoint when the margin
/// leaves no room
fn bounds(dimension: f32, margin: f32) -> (f32, f32) {
    if margin * 2.0 >= dimension {
        let mid = dimension / 2.0;
        (mid, mid)
    } else {
        (margin, dimension - margin)
    }
}

/// Tiny deterministic offset to separate coincident nodes
fn jiggle(seed: usize) -> f32 {
    let unit = ((seed as f32 + 1.0) * 0.618_034).fract() - 0.5;
    unit * 1e-6
}

// =============================================================================
// TESTS
// =============================================================================
