//! Rendering: draws the full editor scene to a 2D context.
//!
//! This module is the only place that touches [`web_sys::CanvasRenderingContext2d`].
//! It receives read-only views of the store, the animation layer, and the
//! transient UI state and produces pixels. It does not mutate any of them.
//!
//! All fallible `Canvas2D` calls propagate errors via `Result<(), JsValue>`.
//! The top-level caller ([`crate::engine::Engine::render`]) handles the result.

#[cfg(test)]
#[path = "render_test.rs"]
mod render_test;

use std::f64::consts::PI;

use wasm_bindgen::JsValue;
use web_sys::CanvasRenderingContext2d;

use crate::anim::{Animator, Visual};
use crate::config::EditorConfig;
use crate::doc::{Block, BlockCategory, Zone};
use crate::geom::{Point, Rect};
use crate::guides::{Axis, Guide};
use crate::hit;
use crate::input::UiState;
use crate::store::Store;

/// Arrowhead length in pixels.
const ARROW_SIZE: f64 = 10.0;

/// Arrowhead half-angle in radians (~30°).
const ARROW_ANGLE: f64 = PI / 6.0;

const FONT: &str = "12px 'Inter', ui-sans-serif";

const ZONE_RADIUS: f64 = 12.0;
const ZONE_DASH: [f64; 2] = [6.0, 4.0];
const ZONE_FILL: &str = "rgba(148, 163, 184, 0.08)";
const ZONE_STROKE: &str = "#cbd5e1";
const ZONE_HOVER_FILL: &str = "rgba(14, 165, 233, 0.08)";
const ZONE_HOVER_STROKE: &str = "#7dd3fc";
const ZONE_LABEL: &str = "#475569";
const HANDLE_FILL: &str = "#94a3b8";

const BLOCK_RADIUS: f64 = 8.0;
const BLOCK_ALPHA: f64 = 0.92;
const GHOST_ALPHA: f64 = 0.35;

const SELECTION: &str = "#0ea5e9";
/// Gap between an entity and its selection ring.
const SELECTION_GAP: f64 = 3.0;
const LINK_COLOR: &str = "#475569";
const GUIDE_COLOR: &str = "#f59e0b";

/// Draw the full scene: zones, links, blocks, then gesture feedback.
///
/// `viewport_w` and `viewport_h` are in canvas pixels.
///
/// # Errors
///
/// Returns `Err` if any `Canvas2D` call fails (e.g. invalid context state).
pub fn draw(
    ctx: &CanvasRenderingContext2d,
    store: &Store,
    animator: &Animator,
    ui: &UiState,
    viewport_w: f64,
    viewport_h: f64,
) -> Result<(), JsValue> {
    ctx.clear_rect(0.0, 0.0, viewport_w, viewport_h);
    ctx.set_font(FONT);

    let selected = store.selection().map(|s| s.id());
    let config = store.config();

    // Layer 1: zones, through their visual records.
    for zone in store.zones() {
        let style = ZoneStyle {
            hovered: ui.hover_zone.as_ref() == Some(&zone.id),
            selected: selected == Some(&zone.id),
        };
        draw_zone(ctx, zone, animator.visual_of(zone), style, config)?;
    }

    // Layer 2: technical links.
    for (from, to) in link_segments(store, animator) {
        draw_arrow(ctx, from, to);
    }

    // Layer 3: blocks in insertion order.
    for block in store.blocks() {
        draw_block(ctx, block, selected == Some(&block.id))?;
    }

    // Layer 4: gesture feedback.
    if let Some(ghost) = ui.ghost {
        let category = store
            .selection()
            .and_then(|s| store.block(s.id()))
            .map_or(BlockCategory::default(), |b| b.category);
        draw_ghost(ctx, ghost, category)?;
    }
    draw_guides(ctx, &ui.guides)?;

    Ok(())
}

/// Fill colour for a block category.
#[must_use]
pub fn category_color(category: BlockCategory) -> &'static str {
    match category {
        BlockCategory::Envelope => "#8B5E3C",
        BlockCategory::Ventilation => "#3B82F6",
        BlockCategory::Production => "#EF4444",
    }
}

/// Arrow segments from each linked technical block's centre to the centre
/// of every zone it serves. Zone centres follow the animated rectangle.
#[must_use]
pub fn link_segments(store: &Store, animator: &Animator) -> Vec<(Point, Point)> {
    let mut out = Vec::new();
    for link in store.tech_links() {
        let Some(block) = store.block(&link.block_id) else {
            continue;
        };
        if !block.category.is_technical() {
            continue;
        }
        let from = block.rect().center();
        for zone_id in &link.zones {
            if let Some(zone) = store.zone(zone_id) {
                out.push((from, animator.visual_of(zone).rect.center()));
            }
        }
    }
    out
}

/// The two base corners of an arrowhead whose tip sits at `to`.
#[must_use]
pub fn arrowhead(from: Point, to: Point) -> [Point; 2] {
    let angle = (to.y - from.y).atan2(to.x - from.x);
    [
        Point::new(to.x - ARROW_SIZE * (angle - ARROW_ANGLE).cos(), to.y - ARROW_SIZE * (angle - ARROW_ANGLE).sin()),
        Point::new(to.x - ARROW_SIZE * (angle + ARROW_ANGLE).cos(), to.y - ARROW_SIZE * (angle + ARROW_ANGLE).sin()),
    ]
}

/// Rectangle actually painted for a zone: the visual rect scaled about its centre.
#[must_use]
pub fn painted_rect(visual: &Visual) -> Rect {
    visual.rect.scaled(visual.scale)
}

// =============================================================
// Zones
// =============================================================

#[derive(Debug, Clone, Copy)]
struct ZoneStyle {
    hovered: bool,
    selected: bool,
}

fn draw_zone(
    ctx: &CanvasRenderingContext2d,
    zone: &Zone,
    visual: Visual,
    style: ZoneStyle,
    config: &EditorConfig,
) -> Result<(), JsValue> {
    if visual.opacity <= 0.0 {
        return Ok(());
    }
    let rect = painted_rect(&visual);

    ctx.save();
    ctx.set_global_alpha(visual.opacity.clamp(0.0, 1.0));

    rounded_rect_path(ctx, rect, ZONE_RADIUS);
    ctx.set_fill_style_str(if style.hovered { ZONE_HOVER_FILL } else { ZONE_FILL });
    ctx.fill();
    set_dash(ctx, &ZONE_DASH)?;
    ctx.set_stroke_style_str(if style.hovered { ZONE_HOVER_STROKE } else { ZONE_STROKE });
    ctx.set_line_width(2.0);
    ctx.stroke();
    set_dash(ctx, &[])?;

    ctx.set_fill_style_str(ZONE_LABEL);
    ctx.set_text_align("left");
    ctx.set_text_baseline("alphabetic");
    let label = fit_text_with_ellipsis(ctx, &zone.name, (rect.w - 16.0).max(1.0));
    ctx.fill_text(&label, rect.x + 8.0, rect.y + 18.0)?;

    if style.selected {
        ctx.set_stroke_style_str(SELECTION);
        ctx.set_line_width(2.0);
        rounded_rect_path(ctx, rect.inset(-SELECTION_GAP), ZONE_RADIUS + 2.0);
        ctx.stroke();
    }

    let handle = hit::handle_rect(rect, config);
    ctx.set_fill_style_str(HANDLE_FILL);
    ctx.fill_rect(handle.x, handle.y, handle.w, handle.h);

    ctx.restore();
    Ok(())
}

// =============================================================
// Blocks
// =============================================================

fn draw_block(ctx: &CanvasRenderingContext2d, block: &Block, selected: bool) -> Result<(), JsValue> {
    let rect = block.rect();
    ctx.save();

    ctx.set_fill_style_str(category_color(block.category));
    ctx.set_global_alpha(BLOCK_ALPHA);
    rounded_rect_path(ctx, rect, BLOCK_RADIUS);
    ctx.fill();
    ctx.set_global_alpha(1.0);

    ctx.set_fill_style_str("#fff");
    ctx.set_text_align("center");
    ctx.set_text_baseline("middle");
    let c = rect.center();
    let label = fit_text_with_ellipsis(ctx, &block.name, (rect.w - 12.0).max(1.0));
    ctx.fill_text(&label, c.x, c.y)?;

    if selected {
        ctx.set_stroke_style_str(SELECTION);
        ctx.set_line_width(2.0);
        rounded_rect_path(ctx, rect.inset(-SELECTION_GAP), BLOCK_RADIUS + 2.0);
        ctx.stroke();
    }

    ctx.restore();
    Ok(())
}

fn draw_ghost(ctx: &CanvasRenderingContext2d, ghost: Rect, category: BlockCategory) -> Result<(), JsValue> {
    ctx.save();
    ctx.set_global_alpha(GHOST_ALPHA);
    ctx.set_fill_style_str(category_color(category));
    rounded_rect_path(ctx, ghost, BLOCK_RADIUS);
    ctx.fill();
    set_dash(ctx, &ZONE_DASH)?;
    ctx.set_stroke_style_str(category_color(category));
    ctx.set_line_width(1.5);
    ctx.stroke();
    set_dash(ctx, &[])?;
    ctx.restore();
    Ok(())
}

// =============================================================
// Links and guides
// =============================================================

fn draw_arrow(ctx: &CanvasRenderingContext2d, from: Point, to: Point) {
    ctx.save();
    ctx.set_stroke_style_str(LINK_COLOR);
    ctx.set_fill_style_str(LINK_COLOR);
    ctx.set_line_width(2.0);

    ctx.begin_path();
    ctx.move_to(from.x, from.y);
    ctx.line_to(to.x, to.y);
    ctx.stroke();

    let [a, b] = arrowhead(from, to);
    ctx.begin_path();
    ctx.move_to(to.x, to.y);
    ctx.line_to(a.x, a.y);
    ctx.line_to(b.x, b.y);
    ctx.close_path();
    ctx.fill();

    ctx.restore();
}

fn draw_guides(ctx: &CanvasRenderingContext2d, guides: &[Guide]) -> Result<(), JsValue> {
    if guides.is_empty() {
        return Ok(());
    }
    ctx.save();
    ctx.set_stroke_style_str(GUIDE_COLOR);
    ctx.set_line_width(1.0);
    set_dash(ctx, &[4.0, 4.0])?;
    ctx.begin_path();
    for guide in guides {
        match guide.axis {
            Axis::Vertical => {
                ctx.move_to(guide.pos, guide.from);
                ctx.line_to(guide.pos, guide.to);
            }
            Axis::Horizontal => {
                ctx.move_to(guide.from, guide.pos);
                ctx.line_to(guide.to, guide.pos);
            }
        }
    }
    ctx.stroke();
    set_dash(ctx, &[])?;
    ctx.restore();
    Ok(())
}

// =============================================================
// Helpers
// =============================================================

/// Trace a rounded rectangle as the current path. The radius shrinks to fit
/// small rectangles.
fn rounded_rect_path(ctx: &CanvasRenderingContext2d, rect: Rect, radius: f64) {
    let r = radius.min(rect.w / 2.0).min(rect.h / 2.0).max(0.0);
    let (x, y, right, bottom) = (rect.x, rect.y, rect.right(), rect.bottom());
    ctx.begin_path();
    ctx.move_to(x + r, y);
    ctx.line_to(right - r, y);
    ctx.quadratic_curve_to(right, y, right, y + r);
    ctx.line_to(right, bottom - r);
    ctx.quadratic_curve_to(right, bottom, right - r, bottom);
    ctx.line_to(x + r, bottom);
    ctx.quadratic_curve_to(x, bottom, x, bottom - r);
    ctx.line_to(x, y + r);
    ctx.quadratic_curve_to(x, y, x + r, y);
    ctx.close_path();
}

fn set_dash(ctx: &CanvasRenderingContext2d, segments: &[f64]) -> Result<(), JsValue> {
    let dash_array = js_sys::Array::new();
    for segment in segments {
        dash_array.push(&JsValue::from(*segment));
    }
    ctx.set_line_dash(&dash_array)
}

fn fit_text_with_ellipsis(ctx: &CanvasRenderingContext2d, text: &str, max_w: f64) -> String {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return String::new();
    }
    if measured_text_width(ctx, trimmed) <= max_w {
        return trimmed.to_owned();
    }

    let ellipsis = "...";
    let mut chars: Vec<char> = trimmed.chars().collect();
    while !chars.is_empty() {
        chars.pop();
        let candidate = format!("{}{}", chars.iter().collect::<String>().trim_end(), ellipsis);
        if measured_text_width(ctx, &candidate) <= max_w {
            return candidate;
        }
    }
    ellipsis.to_owned()
}

fn measured_text_width(ctx: &CanvasRenderingContext2d, text: &str) -> f64 {
    match ctx.measure_text(text) {
        Ok(metrics) => metrics.width(),
        Err(_) => f64::INFINITY,
    }
}
