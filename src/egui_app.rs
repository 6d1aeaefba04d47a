//! Interactive canvas for the editor (feature = "egui").
//!
//! Draws the template drawer on the left, placed blocks at their animated
//! positions and links as cubic curves underneath. Pointer interaction is
//! collected while drawing and forwarded to the [`Editor`] afterwards.

#![cfg(feature = "egui")]

use eframe::egui::{self, Align2, Color32, FontId, Pos2, Sense, Stroke, Vec2};

use crate::animation::SpringAnimator;
use crate::editor::Editor;
use crate::geometry::{Point, Rect, link_curve};
use crate::gesture::{Gesture, GestureScope};
use crate::layout::{LayoutQuery, LayoutSnapshot, PortBox};
use crate::model::{Block, BlockId, LinkTarget, Port, PortRole};

/// Frame times above this are clamped so a stalled frame does not make
/// springs overshoot wildly.
const MAX_FRAME_DT: f32 = 0.1;
const DELETE_SIZE: f32 = 16.0;

/// A pointer interaction observed while drawing.
enum Action {
    Gesture(GestureScope, Gesture),
    Delete(BlockId),
}

pub struct CanvasApp {
    pub editor: Editor<SpringAnimator>,
}

impl CanvasApp {
    pub fn new(editor: Editor<SpringAnimator>) -> Self {
        Self { editor }
    }

    fn apply(&mut self, actions: Vec<Action>) {
        for action in actions {
            match action {
                Action::Gesture(scope, gesture) => {
                    if let Err(e) = self.editor.dispatch(scope, gesture) {
                        log::warn!("gesture rejected: {}", e);
                    }
                }
                Action::Delete(block) => {
                    self.editor.on_delete(&block);
                }
            }
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Coordinate helpers
// ────────────────────────────────────────────────────────────────────────────

fn to_screen(origin: Pos2, p: Point) -> Pos2 {
    origin + Vec2::new(p.x, p.y)
}

fn rect_to_screen(origin: Pos2, r: Rect) -> egui::Rect {
    egui::Rect::from_min_size(to_screen(origin, r.min()), Vec2::new(r.width, r.height))
}

fn to_canvas(origin: Pos2, p: Pos2) -> Point {
    Point::new(p.x - origin.x, p.y - origin.y)
}

/// Gesture for the current drag state of `resp`, if any.
fn drag_gesture(resp: &egui::Response, origin: Pos2) -> Option<Gesture> {
    let pointer = to_canvas(origin, resp.interact_pointer_pos()?);
    if resp.drag_started() {
        Some(Gesture::start(pointer))
    } else if resp.drag_stopped() {
        Some(Gesture::end(pointer, None))
    } else if resp.dragged() {
        Some(Gesture::moved(pointer))
    } else {
        None
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Drawing
// ────────────────────────────────────────────────────────────────────────────

/// Ports that get their own drag area. Input rows stay part of the block body,
/// so grabbing one moves the block.
fn link_handles(block: &Block) -> impl Iterator<Item = &Port> {
    block.ports().filter(|p| p.role == PortRole::Output)
}

fn draw_block(
    painter: &egui::Painter,
    origin: Pos2,
    block: &Block,
    rect: Rect,
    port_box: impl Fn(&crate::model::PortId) -> Option<PortBox>,
) {
    let r = rect_to_screen(origin, rect);
    let fill = if block.is_template {
        Color32::from_rgb(225, 225, 225)
    } else {
        Color32::from_rgb(245, 245, 250)
    };
    painter.rect_filled(r, 4.0, fill);
    painter.rect_stroke(r, 4.0, Stroke::new(1.0, Color32::DARK_GRAY), egui::StrokeKind::Inside);
    painter.text(
        r.left_top() + Vec2::new(8.0, 6.0),
        Align2::LEFT_TOP,
        &block.type_name,
        FontId::proportional(14.0),
        Color32::BLACK,
    );
    for port in block.ports() {
        let Some(pb) = port_box(&port.id) else { continue };
        let row = rect_to_screen(origin, pb.rect);
        let anchor = to_screen(origin, pb.anchor());
        let (align, text_pos) = match port.role {
            PortRole::Input => (Align2::LEFT_CENTER, row.left_center() + Vec2::new(10.0, 0.0)),
            PortRole::Output => (Align2::RIGHT_CENTER, row.right_center() - Vec2::new(10.0, 0.0)),
        };
        painter.circle_filled(anchor, 4.0, Color32::from_rgb(0, 120, 255));
        painter.text(text_pos, align, &port.label, FontId::proportional(12.0), Color32::DARK_GRAY);
    }
}

fn draw_links(painter: &egui::Painter, origin: Pos2, editor: &Editor<SpringAnimator>) {
    for link in editor.link_geometry() {
        let [a, b, c, d] = link_curve(link.geometry.start, link.geometry.end);
        let color = match link.target {
            LinkTarget::Pending => Color32::from_rgb(160, 160, 160),
            LinkTarget::Port(_) => Color32::from_rgb(0, 90, 200),
        };
        let shape = egui::epaint::CubicBezierShape::from_points_stroke(
            [a, b, c, d].map(|p| to_screen(origin, p)),
            false,
            Color32::TRANSPARENT,
            Stroke::new(2.0, color),
        );
        painter.add(shape);
    }
}

/// Draw everything and collect interactions. Widgets allocated later sit on
/// top, so ports are allocated after their block.
fn canvas(ui: &mut egui::Ui, editor: &Editor<SpringAnimator>, snap: &LayoutSnapshot) -> Vec<Action> {
    let origin = ui.available_rect_before_wrap().min;
    let painter = ui.painter().clone();
    let mut actions = Vec::new();

    draw_links(&painter, origin, editor);

    for (template, (type_name, rect)) in editor.drawer().iter().zip(snap.drawer()) {
        draw_block(&painter, origin, template, *rect, |p| snap.template_port_box(p));
        let resp = ui.interact(
            rect_to_screen(origin, *rect),
            ui.id().with(("template", type_name)),
            Sense::drag(),
        );
        if let Some(g) = drag_gesture(&resp, origin) {
            actions.push(Action::Gesture(GestureScope::Template(type_name.clone()), g));
        }
    }

    for block in editor.placed() {
        let Some(id) = &block.id else { continue };
        let Some(rect) = snap.block_rect(id) else { continue };
        draw_block(&painter, origin, block, rect, |p| snap.port_box(p));

        let resp = ui.interact(
            rect_to_screen(origin, rect),
            ui.id().with(("block", id.as_str())),
            Sense::drag(),
        );
        if let Some(g) = drag_gesture(&resp, origin) {
            actions.push(Action::Gesture(GestureScope::Block(id.clone()), g));
        }

        for port in link_handles(block) {
            let Some(pb) = snap.port_box(&port.id) else { continue };
            let resp = ui.interact(
                rect_to_screen(origin, pb.rect),
                ui.id().with(("port", port.id.as_str())),
                Sense::drag(),
            );
            if let Some(g) = drag_gesture(&resp, origin) {
                actions.push(Action::Gesture(GestureScope::Port(port.id.clone()), g));
            }
        }

        let screen = rect_to_screen(origin, rect);
        let close = egui::Rect::from_min_size(
            screen.right_top() + Vec2::new(-DELETE_SIZE - 4.0, 4.0),
            Vec2::splat(DELETE_SIZE),
        );
        painter.text(
            close.center(),
            Align2::CENTER_CENTER,
            "x",
            FontId::proportional(14.0),
            Color32::from_rgb(180, 40, 40),
        );
        let resp = ui.interact(close, ui.id().with(("delete", id.as_str())), Sense::click());
        if resp.clicked() {
            actions.push(Action::Delete(id.clone()));
        }
    }

    actions
}

impl eframe::App for CanvasApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        let dt = ctx.input(|i| i.stable_dt).min(MAX_FRAME_DT);
        self.editor.tick(dt);

        let snap = self.editor.layout_snapshot();
        let actions = egui::CentralPanel::default()
            .show(ctx, |ui| canvas(ui, &self.editor, &snap))
            .inner;
        self.apply(actions);

        if self.editor.animator().is_animating() || self.editor.link_drag().is_dragging() {
            ctx.request_repaint();
        }
    }
}
