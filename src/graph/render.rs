//! egui rendering surface for a [`GraphSession`]
//!
//! Draws edges as undirected lines and nodes as kind-colored circles,
//! forwards pointer input to the session and hosts the drill-down modal in
//! an `egui::Window`. Detail fetches are left to the host: every
//! [`UiEvent::DetailRequested`] returned from [`GraphCanvas::ui`] should be
//! answered with [`GraphSession::resolve_detail`].

use std::collections::HashMap;

use egui::{Align2, Color32, CursorIcon, FontId, Pos2, Rect, Sense, Stroke, Vec2};

use super::colors;
use super::interaction::{PointerState, UiEvent};
use super::modal::{DetailState, Modal, ModalContent};
use super::session::{DataState, GraphSession, DRAW_RADIUS_SCALE};
use super::types::NodeId;

const EMPTY_MESSAGE: &str = "No data to display. Create a company, project or concept to see it here.";

pub struct GraphCanvas {
    session: GraphSession,
}

impl GraphCanvas {
    pub fn new(session: GraphSession) -> Self {
        Self { session }
    }

    pub fn session(&self) -> &GraphSession {
        &self.session
    }

    pub fn session_mut(&mut self) -> &mut GraphSession {
        &mut self.session
    }

    /// Main UI function. Returns the events emitted during this frame.
    pub fn ui(&mut self, ui: &mut egui::Ui) -> Vec<UiEvent> {
        match self.session.data_state() {
            DataState::Loading => {
                ui.centered_and_justified(|ui| {
                    ui.spinner();
                });
                return self.session.drain_events();
            }
            DataState::NoData => {
                self.render_empty_state(ui);
                return self.session.drain_events();
            }
            DataState::Ready => {}
        }

        let (response, painter) = ui.allocate_painter(ui.available_size(), Sense::click_and_drag());
        let rect = response.rect;
        self.session.set_viewport_size(rect.width(), rect.height());

        let to_canvas = |p: Pos2| (p - rect.min).to_pos2();
        let to_screen = |p: Pos2| rect.min + p.to_vec2();

        // Input
        if self.session.modals().is_open() {
            if response.clicked() {
                self.session.overlay_clicked();
            }
        } else {
            if response.drag_started() {
                if let Some(p) = response.interact_pointer_pos() {
                    self.session.drag_started(to_canvas(p));
                }
            } else if response.dragged() {
                if let Some(p) = response.interact_pointer_pos() {
                    self.session.dragged(to_canvas(p));
                }
            }
            if response.drag_stopped() {
                self.session.drag_stopped();
            }
            if response.double_clicked() {
                if let Some(p) = response.interact_pointer_pos() {
                    self.session.double_clicked(to_canvas(p));
                }
            } else if response.clicked() {
                if let Some(p) = response.interact_pointer_pos() {
                    self.session.clicked(to_canvas(p));
                }
            }
            match response.hover_pos() {
                Some(p) => {
                    self.session.pointer_moved(to_canvas(p));
                }
                None => {
                    self.session.pointer_left();
                }
            }
        }

        // Simulation step + edges
        let frame = self.session.frame();
        let positions: HashMap<NodeId, Pos2> = frame
            .positions
            .into_iter()
            .map(|p| (p.node_id, to_screen(Pos2::new(p.x, p.y))))
            .collect();
        for edge in frame.edges {
            let (Some(a), Some(b)) = (positions.get(&edge.source), positions.get(&edge.target))
            else {
                continue;
            };
            painter.line_segment(
                [*a, *b],
                Stroke::new(colors::edge_width(edge.kind), colors::edge_color(edge.kind)),
            );
        }

        self.render_nodes(&painter, &positions);
        self.render_chrome(&painter, rect);
        self.render_tooltip(&painter, rect);

        match self.session.interaction().state() {
            PointerState::Dragging(_) => ui.ctx().set_cursor_icon(CursorIcon::Grabbing),
            PointerState::Hovering(_) => ui.ctx().set_cursor_icon(CursorIcon::PointingHand),
            PointerState::Idle => {}
        }

        if let Some(modal) = self.session.modals().active().cloned() {
            // Dim the canvas behind the modal
            painter.rect_filled(rect, 0.0, Color32::from_black_alpha(120));
            self.render_modal(ui.ctx(), &modal);
        }

        // The simulation never stops emitting ticks
        ui.ctx().request_repaint();
        self.session.drain_events()
    }

    fn render_nodes(&self, painter: &egui::Painter, positions: &HashMap<NodeId, Pos2>) {
        let layout = &self.session.simulation().config;
        let focused = match self.session.interaction().state() {
            PointerState::Hovering(id) | PointerState::Dragging(id) => Some(id),
            PointerState::Idle => None,
        };

        for node in &self.session.visible().nodes {
            let Some(&center) = positions.get(&node.id) else {
                continue;
            };
            let kind = node.kind();
            let radius = layout.collision_radius(kind) * DRAW_RADIUS_SCALE;

            painter.circle_filled(center, radius, colors::node_fill(kind));
            painter.circle_stroke(center, radius, Stroke::new(1.5, colors::node_border(kind)));
            if node.is_fixed() {
                painter.circle_stroke(center, radius + 3.0, Stroke::new(1.5, colors::FIXED_RING));
            }
            if focused == Some(&node.id) {
                painter.circle_stroke(center, radius + 6.0, Stroke::new(2.0, colors::FOCUS_RING));
            }

            painter.text(
                center + Vec2::new(0.0, radius + 4.0),
                Align2::CENTER_TOP,
                &node.label,
                FontId::proportional(11.0),
                Color32::from_gray(210),
            );
        }
    }

    fn render_tooltip(&self, painter: &egui::Painter, rect: Rect) {
        let Some(tooltip) = self.session.interaction().tooltip() else {
            return;
        };
        let mut text = format!("{}\n{}", tooltip.kind.display_name(), tooltip.label);
        if let Some(description) = &tooltip.description {
            text.push('\n');
            text.push_str(description);
        }

        let galley = painter.layout(
            text,
            FontId::proportional(12.0),
            colors::TOOLTIP_TEXT,
            260.0,
        );
        let anchor = rect.min + Vec2::new(tooltip.x + 14.0, tooltip.y + 14.0);
        let bg = Rect::from_min_size(anchor, galley.size() + Vec2::splat(12.0));
        painter.rect_filled(bg, 4.0, colors::TOOLTIP_BG);
        painter.galley(anchor + Vec2::splat(6.0), galley, colors::TOOLTIP_TEXT);
    }

    fn render_modal(&mut self, ctx: &egui::Context, modal: &Modal) {
        let mut open = true;
        let mut close_clicked = false;

        egui::Window::new(&modal.title)
            .id(egui::Id::new(("plan_graph_modal", modal.id.0)))
            .collapsible(false)
            .resizable(true)
            .anchor(Align2::CENTER_CENTER, Vec2::ZERO)
            .open(&mut open)
            .show(ctx, |ui| {
                egui::ScrollArea::vertical().max_height(480.0).show(ui, |ui| {
                    match &modal.content {
                        ModalContent::Page { title, content } => {
                            ui.heading(title);
                            ui.label(content);
                        }
                        ModalContent::PageList { pages } => {
                            for page in pages {
                                ui.heading(&page.title);
                                ui.label(&page.content);
                                ui.separator();
                            }
                        }
                        ModalContent::Detail { state, .. } => match state {
                            DetailState::Loading => {
                                ui.spinner();
                            }
                            DetailState::Ready(detail) => {
                                ui.heading(&detail.title);
                                ui.label(&detail.body);
                            }
                            DetailState::Failed(reason) => {
                                ui.colored_label(Color32::from_rgb(244, 67, 54), reason);
                            }
                        },
                    }
                });
                ui.add_space(8.0);
                if ui.button("Close").clicked() {
                    close_clicked = true;
                }
            });

        if !open || close_clicked {
            self.session.close_modal();
        }
    }

    /// Render empty state when there is no data
    fn render_empty_state(&self, ui: &mut egui::Ui) {
        ui.centered_and_justified(|ui| {
            ui.label(EMPTY_MESSAGE);
        });
    }

    /// Render UI chrome (stats)
    fn render_chrome(&self, painter: &egui::Painter, rect: Rect) {
        let visible = self.session.visible();
        let stats = self.session.graph().stats();
        let mut stats_text = format!(
            "{}/{} nodes | {}/{} edges",
            visible.nodes.len(),
            stats.total_nodes,
            visible.edges.len(),
            stats.total_edges
        );
        let skipped = self.session.report().skipped_count();
        if skipped > 0 {
            stats_text.push_str(&format!(" | {skipped} skipped"));
        }
        painter.text(
            rect.left_top() + Vec2::new(10.0, 20.0),
            Align2::LEFT_TOP,
            stats_text,
            FontId::proportional(12.0),
            colors::MUTED_TEXT,
        );

        let hints = "Drag: Move | Click: Open | Double-click: Details";
        painter.text(
            rect.left_bottom() + Vec2::new(10.0, -10.0),
            Align2::LEFT_BOTTOM,
            hints,
            FontId::proportional(10.0),
            Color32::from_rgb(100, 100, 100),
        );
    }
}
