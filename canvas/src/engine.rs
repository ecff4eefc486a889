use std::cell::{Cell, RefCell};
use std::rc::Rc;

use wasm_bindgen::closure::Closure;
use wasm_bindgen::{JsCast, JsValue};
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement, KeyboardEvent, PointerEvent, Window};

use crate::anim::{Animator, Clock, SystemClock, Visual};
use crate::config::EditorConfig;
use crate::doc::{BlockPatch, EntityId, Zone};
use crate::event::{EntityRef, ListenerError, SubscriptionId, UpdateMode};
use crate::geom::{Point, Rect, clamp};
use crate::guides;
use crate::hit::{self, Hit, HitPart};
use crate::input::{Button, GestureOrigin, InputState, Key, PointerId, UiState};
use crate::render;
use crate::store::Store;

#[cfg(test)]
#[path = "engine_test.rs"]
mod engine_test;

/// Actions returned from input handlers for the host to process.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    /// Route further events of this pointer to the canvas.
    CapturePointer(PointerId),
    /// Release a capture taken with [`Action::CapturePointer`].
    ReleasePointer(PointerId),
    /// Draw now.
    RenderNeeded,
    /// Arm the frame loop; draws are coalesced to one per display refresh.
    RequestFrame,
    SelectionChanged(Option<EntityRef>),
}

/// Core engine state: all logic that does not depend on the canvas element.
///
/// Separated from `Engine` so it can be tested without WASM/browser dependencies.
pub struct EngineCore {
    store: Store,
    pub ui: UiState,
    pub input: InputState,
    animator: Rc<RefCell<Animator>>,
    clock: Rc<dyn Clock>,
    subscription: SubscriptionId,
    pub viewport_width: f64,
    pub viewport_height: f64,
}

impl EngineCore {
    /// Take ownership of `store` and subscribe the animation layer to it.
    #[must_use]
    pub fn new(store: Store) -> Self {
        Self::with_clock(store, Rc::new(SystemClock::new()))
    }

    #[must_use]
    pub fn with_clock(mut store: Store, clock: Rc<dyn Clock>) -> Self {
        let mut animator = Animator::new(store.config());
        animator.sync(store.zones());
        let animator = Rc::new(RefCell::new(animator));

        let listener_animator = Rc::clone(&animator);
        let listener_clock = Rc::clone(&clock);
        let subscription = store.subscribe(move |event| {
            let mut animator = listener_animator
                .try_borrow_mut()
                .map_err(|_| ListenerError::Busy)?;
            animator.apply(event, listener_clock.now_ms());
            Ok(())
        });

        Self {
            store,
            ui: UiState::default(),
            input: InputState::default(),
            animator,
            clock,
            subscription,
            viewport_width: 0.0,
            viewport_height: 0.0,
        }
    }

    /// Unsubscribe the animation layer and hand the store back.
    #[must_use]
    pub fn into_store(mut self) -> Store {
        self.store.unsubscribe(self.subscription);
        self.store
    }

    // --- Queries ---

    #[must_use]
    pub fn store(&self) -> &Store {
        &self.store
    }

    /// Mutable store access for palette and inspector style callers. Changes
    /// still reach the animation layer; arm the frame loop afterwards.
    pub fn store_mut(&mut self) -> &mut Store {
        &mut self.store
    }

    #[must_use]
    pub fn config(&self) -> EditorConfig {
        *self.store.config()
    }

    #[must_use]
    pub fn selection(&self) -> Option<&EntityRef> {
        self.store.selection()
    }

    /// What the renderer should draw for `zone` right now.
    #[must_use]
    pub fn visual(&self, zone: &Zone) -> Visual {
        self.animator
            .try_borrow()
            .map_or_else(|_| Visual::settled(zone.rect()), |animator| animator.visual_of(zone))
    }

    #[must_use]
    pub fn is_animating(&self) -> bool {
        self.animator
            .try_borrow()
            .is_ok_and(|animator| animator.is_animating())
    }

    // --- Viewport ---

    /// Update the canvas size used to clamp drags.
    pub fn set_viewport(&mut self, width: f64, height: f64) {
        self.viewport_width = width;
        self.viewport_height = height;
    }

    // --- Frame loop ---

    /// Advance animations to the clock's current time. Returns `true` if
    /// another frame is warranted.
    pub fn frame(&mut self) -> bool {
        let now = self.clock.now_ms();
        let animating = match self.animator.try_borrow_mut() {
            Ok(mut animator) => {
                animator.sync(self.store.zones());
                animator.tick(now)
            }
            Err(_) => {
                tracing::warn!("animator busy during frame");
                true
            }
        };
        animating || self.input.is_active()
    }

    // --- Input events ---

    /// Pointer pressed. Only the primary button starts a gesture.
    pub fn on_pointer_down(&mut self, pt: Point, button: Button, pointer: PointerId) -> Vec<Action> {
        if button != Button::Primary || self.input.is_active() {
            return Vec::new();
        }

        let mut actions = Vec::new();
        let hit = hit::hit_test(pt, &self.store);
        let selection = hit.as_ref().map(Hit::entity);
        if self.store.select(selection.as_ref().map(EntityRef::id)) {
            actions.push(Action::SelectionChanged(selection));
        }

        let Some(hit) = hit else {
            actions.push(Action::RenderNeeded);
            return actions;
        };
        let Some(origin) = self.capture_origin(&hit) else {
            return actions;
        };

        let corner = Point::new(origin.rect.x, origin.rect.y);
        let grab = Point::new(pt.x - corner.x, pt.y - corner.y);
        let id = hit.id.clone();
        self.input = match hit.part {
            HitPart::ResizeHandle => InputState::ResizingZone { id, pointer, start: pt, origin },
            HitPart::BlockBody => InputState::DraggingBlock { id, pointer, grab, origin },
            HitPart::ZoneBody => InputState::DraggingZone { id, pointer, grab, origin },
        };
        tracing::debug!(id = %hit.id, part = ?hit.part, "gesture started");

        actions.extend([Action::CapturePointer(pointer), Action::RequestFrame, Action::RenderNeeded]);
        actions
    }

    /// Pointer moved. Drives the active gesture, or hover when idle.
    pub fn on_pointer_move(&mut self, pt: Point, pointer: PointerId) -> Vec<Action> {
        match &self.input {
            InputState::Idle => return self.update_hover(pt),
            _ if self.input.pointer() != Some(pointer) => return Vec::new(),
            InputState::DraggingBlock { id, grab, .. } => {
                let (id, grab) = (id.clone(), *grab);
                self.drag_block(&id, pt, grab);
            }
            InputState::DraggingZone { id, grab, .. } => {
                let (id, grab) = (id.clone(), *grab);
                self.drag_zone(&id, pt, grab);
            }
            InputState::ResizingZone { id, start, origin, .. } => {
                let (id, start, size) = (id.clone(), *start, (origin.rect.w, origin.rect.h));
                self.resize_zone(&id, pt, start, size);
            }
        }
        vec![Action::RenderNeeded]
    }

    /// Pointer released: end the gesture, keeping the current geometry.
    pub fn on_pointer_up(&mut self, pointer: PointerId) -> Vec<Action> {
        self.finish(pointer)
    }

    /// Pointer cancelled by the platform. Same as release.
    pub fn on_pointer_cancel(&mut self, pointer: PointerId) -> Vec<Action> {
        self.finish(pointer)
    }

    pub fn on_key_down(&mut self, key: &Key) -> Vec<Action> {
        if key.is_escape() { self.cancel() } else { Vec::new() }
    }

    /// Abort the active gesture and restore its origin geometry.
    pub fn cancel(&mut self) -> Vec<Action> {
        let pointer = match std::mem::take(&mut self.input) {
            InputState::Idle => return Vec::new(),
            InputState::DraggingBlock { id, pointer, origin, .. } => {
                self.store.assign_block_zone(&id, origin.zone_id.as_ref(), false);
                let rect = origin.rect;
                self.store.update_block(
                    &id,
                    &BlockPatch { x: Some(rect.x), y: Some(rect.y), w: Some(rect.w), h: Some(rect.h), ..BlockPatch::default() },
                );
                self.restore_zones(&origin.zones);
                tracing::debug!(%id, "block drag cancelled");
                pointer
            }
            InputState::DraggingZone { id, pointer, origin, .. }
            | InputState::ResizingZone { id, pointer, origin, .. } => {
                self.restore_zones(&origin.zones);
                tracing::debug!(%id, "zone gesture cancelled");
                pointer
            }
        };
        self.ui.clear_gesture();
        vec![Action::ReleasePointer(pointer), Action::RenderNeeded, Action::RequestFrame]
    }

    // --- Gesture internals ---

    fn capture_origin(&self, hit: &Hit) -> Option<GestureOrigin> {
        let zones = self.store.zones().iter().map(|z| (z.id.clone(), z.rect())).collect();
        match hit.part {
            HitPart::BlockBody => {
                let block = self.store.block(&hit.id)?;
                Some(GestureOrigin { rect: block.rect(), zone_id: block.zone_id.clone(), zones })
            }
            HitPart::ResizeHandle | HitPart::ZoneBody => {
                let zone = self.store.zone(&hit.id)?;
                Some(GestureOrigin { rect: zone.rect(), zone_id: None, zones })
            }
        }
    }

    fn finish(&mut self, pointer: PointerId) -> Vec<Action> {
        if self.input.pointer() != Some(pointer) {
            return Vec::new();
        }
        let state = std::mem::take(&mut self.input);
        if let Some(id) = state.target() {
            tracing::debug!(%id, "gesture finished");
        }
        self.ui.clear_gesture();
        vec![Action::ReleasePointer(pointer), Action::RenderNeeded, Action::RequestFrame]
    }

    fn update_hover(&mut self, pt: Point) -> Vec<Action> {
        let threshold = self.store.config().hover_threshold;
        let hover = hit::nearest_zone(pt, self.store.zones(), threshold).map(|z| z.id.clone());
        if hover == self.ui.hover_zone {
            return Vec::new();
        }
        self.ui.hover_zone = hover;
        vec![Action::RequestFrame]
    }

    /// Top-left of an entity at `pt - grab`, kept inside the canvas.
    fn clamp_to_canvas(&self, pt: Point, grab: Point, margin: f64) -> Point {
        let max_x = (self.viewport_width - margin).max(0.0);
        let max_y = (self.viewport_height - margin).max(0.0);
        Point::new(clamp(pt.x - grab.x, 0.0, max_x), clamp(pt.y - grab.y, 0.0, max_y))
    }

    fn drag_block(&mut self, id: &EntityId, pt: Point, grab: Point) {
        let config = self.config();
        let Some(block) = self.store.block(id) else {
            return;
        };
        let (w, h, current) = (block.w, block.h, block.zone_id.clone());
        let corner = self.clamp_to_canvas(pt, grab, config.block_edge_margin);
        let prospective = Rect::new(corner.x, corner.y, w, h);

        let candidate = hit::best_candidate_zone(prospective, self.store.zones()).map(|z| (z.id.clone(), z.rect()));
        let placed = if let Some((zone_id, zone_rect)) = &candidate {
            let interior = zone_rect.inset(config.drag_interior_padding);
            let x = clamp(corner.x, interior.x, (interior.right() - w).max(interior.x));
            let y = clamp(corner.y, interior.y, (interior.bottom() - h).max(interior.y));
            if current.as_ref() != Some(zone_id) {
                self.store.assign_block_zone(id, Some(zone_id), false);
            }
            self.store.move_block(id, x, y);
            self.store.fit_zone(zone_id);
            Rect::new(x, y, w, h)
        } else {
            if current.is_some() {
                self.store.assign_block_zone(id, None, false);
            }
            self.store.move_block(id, corner.x, corner.y);
            prospective
        };

        self.ui.ghost = (placed != prospective).then_some(prospective);
        self.ui.hover_zone = match candidate {
            Some((zone_id, _)) => Some(zone_id),
            None => hit::nearest_zone(pt, self.store.zones(), config.hover_threshold).map(|z| z.id.clone()),
        };
    }

    fn drag_zone(&mut self, id: &EntityId, pt: Point, grab: Point) {
        let corner = self.clamp_to_canvas(pt, grab, self.store.config().zone_edge_margin);
        self.store.move_zone(id, corner.x, corner.y);
        self.refresh_guides(id);
    }

    fn resize_zone(&mut self, id: &EntityId, pt: Point, start: Point, (orig_w, orig_h): (f64, f64)) {
        let config = self.config();
        let w = (orig_w + pt.x - start.x).max(config.zone_min_w);
        let h = (orig_h + pt.y - start.y).max(config.zone_min_h);
        self.store.resize_zone(id, w, h);
        self.refresh_guides(id);
    }

    fn refresh_guides(&mut self, id: &EntityId) {
        self.ui.guides = match self.store.zone(id) {
            Some(zone) => guides::alignment_guides(zone.rect(), id, self.store.zones(), self.store.config()),
            None => Vec::new(),
        };
    }

    fn restore_zones(&mut self, zones: &[(EntityId, Rect)]) {
        for (id, rect) in zones {
            if self.store.zone(id).is_some_and(|z| z.rect() != *rect) {
                self.store.set_zone_rect(id, *rect, UpdateMode::Auto);
            }
        }
    }
}

/// The full canvas engine. Wraps `EngineCore` and owns the browser canvas element.
pub struct Engine {
    canvas: HtmlCanvasElement,
    ctx: CanvasRenderingContext2d,
    pub core: EngineCore,
}

impl Engine {
    /// Bind `core` to a canvas element.
    ///
    /// # Errors
    ///
    /// Returns `Err` if the canvas has no 2D context.
    pub fn new(canvas: HtmlCanvasElement, core: EngineCore) -> Result<Self, JsValue> {
        let ctx = canvas
            .get_context("2d")?
            .ok_or_else(|| JsValue::from_str("2d context unavailable"))?
            .dyn_into::<CanvasRenderingContext2d>()?;
        let mut engine = Self { canvas, ctx, core };
        engine.sync_viewport();
        Ok(engine)
    }

    /// Read the canvas size into the core.
    pub fn sync_viewport(&mut self) {
        let (w, h) = (f64::from(self.canvas.width()), f64::from(self.canvas.height()));
        self.core.set_viewport(w, h);
    }

    /// Draw the current state to the canvas.
    ///
    /// # Errors
    ///
    /// Returns `Err` if any `Canvas2D` call fails.
    pub fn render(&self) -> Result<(), JsValue> {
        let animator = self
            .core
            .animator
            .try_borrow()
            .map_err(|_| JsValue::from_str("animator busy"))?;
        render::draw(
            &self.ctx,
            self.core.store(),
            &animator,
            &self.core.ui,
            self.core.viewport_width,
            self.core.viewport_height,
        )
    }

    /// Carry out host-side actions. Returns `true` if a frame was requested.
    fn perform(&self, actions: &[Action]) -> bool {
        let mut wants_frame = false;
        for action in actions {
            match action {
                Action::CapturePointer(p) => {
                    if let Err(err) = self.canvas.set_pointer_capture(p.0) {
                        tracing::warn!(?err, "set_pointer_capture failed");
                    }
                }
                Action::ReleasePointer(p) => {
                    if let Err(err) = self.canvas.release_pointer_capture(p.0) {
                        tracing::warn!(?err, "release_pointer_capture failed");
                    }
                }
                Action::RenderNeeded => {
                    if let Err(err) = self.render() {
                        tracing::warn!(?err, "render failed");
                    }
                }
                Action::RequestFrame => wants_frame = true,
                Action::SelectionChanged(selection) => tracing::debug!(?selection, "selection changed"),
            }
        }
        wants_frame
    }
}

// =============================================================
// Browser wiring
// =============================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PointerPhase {
    Down,
    Move,
    Up,
    Cancel,
}

impl PointerPhase {
    const ALL: [Self; 4] = [Self::Down, Self::Move, Self::Up, Self::Cancel];

    fn event_name(self) -> &'static str {
        match self {
            Self::Down => "pointerdown",
            Self::Move => "pointermove",
            Self::Up => "pointerup",
            Self::Cancel => "pointercancel",
        }
    }
}

/// Redraw loop bookkeeping: at most one pending frame, stopped on detach.
#[derive(Default)]
struct FrameLoop {
    pending: Cell<bool>,
    stopped: Cell<bool>,
}

/// Live listeners returned by [`attach`]. Dropping it removes every listener.
pub struct Attached {
    canvas: HtmlCanvasElement,
    window: Window,
    engine: Rc<RefCell<Engine>>,
    frames: Rc<FrameLoop>,
    pointer_listeners: Vec<(PointerPhase, Closure<dyn FnMut(PointerEvent)>)>,
    key_listener: Closure<dyn FnMut(KeyboardEvent)>,
}

impl Attached {
    /// Run `f` against the core (e.g. a palette spawn or inspector edit),
    /// then arm the frame loop. `None` if the engine is busy.
    pub fn with_core<R>(&self, f: impl FnOnce(&mut EngineCore) -> R) -> Option<R> {
        let result = match self.engine.try_borrow_mut() {
            Ok(mut engine) => f(&mut engine.core),
            Err(_) => {
                tracing::warn!("engine busy; call dropped");
                return None;
            }
        };
        schedule_frame(&self.engine, &self.frames);
        Some(result)
    }
}

impl Drop for Attached {
    fn drop(&mut self) {
        self.frames.stopped.set(true);
        for (phase, listener) in &self.pointer_listeners {
            if let Err(err) = self
                .canvas
                .remove_event_listener_with_callback(phase.event_name(), listener.as_ref().unchecked_ref())
            {
                tracing::warn!(?err, event = phase.event_name(), "failed to remove listener");
            }
        }
        if let Err(err) = self
            .window
            .remove_event_listener_with_callback("keydown", self.key_listener.as_ref().unchecked_ref())
        {
            tracing::warn!(?err, "failed to remove keydown listener");
        }
        tracing::debug!("engine detached");
    }
}

/// Wire pointer events on `canvas` and Escape on the window to `core`.
///
/// # Errors
///
/// Returns `Err` if there is no window, no 2D context, or a listener cannot
/// be registered.
pub fn attach(canvas: HtmlCanvasElement, core: EngineCore) -> Result<Attached, JsValue> {
    let window = web_sys::window().ok_or_else(|| JsValue::from_str("no window"))?;
    let engine = Rc::new(RefCell::new(Engine::new(canvas.clone(), core)?));
    let frames = Rc::new(FrameLoop::default());

    let mut pointer_listeners = Vec::with_capacity(PointerPhase::ALL.len());
    for phase in PointerPhase::ALL {
        let engine_cb = Rc::clone(&engine);
        let frames_cb = Rc::clone(&frames);
        let listener = Closure::wrap(Box::new(move |ev: PointerEvent| {
            on_pointer(phase, &ev, &engine_cb, &frames_cb);
        }) as Box<dyn FnMut(PointerEvent)>);
        canvas.add_event_listener_with_callback(phase.event_name(), listener.as_ref().unchecked_ref())?;
        pointer_listeners.push((phase, listener));
    }

    let engine_cb = Rc::clone(&engine);
    let frames_cb = Rc::clone(&frames);
    let key_listener = Closure::wrap(Box::new(move |ev: KeyboardEvent| {
        let key = Key(ev.key());
        let wants_frame = match engine_cb.try_borrow_mut() {
            Ok(mut engine) => {
                let actions = engine.core.on_key_down(&key);
                engine.perform(&actions)
            }
            Err(_) => false,
        };
        if wants_frame {
            schedule_frame(&engine_cb, &frames_cb);
        }
    }) as Box<dyn FnMut(KeyboardEvent)>);
    window.add_event_listener_with_callback("keydown", key_listener.as_ref().unchecked_ref())?;

    schedule_frame(&engine, &frames);
    tracing::debug!("engine attached");
    Ok(Attached { canvas, window, engine, frames, pointer_listeners, key_listener })
}

fn on_pointer(phase: PointerPhase, ev: &PointerEvent, engine: &Rc<RefCell<Engine>>, frames: &Rc<FrameLoop>) {
    let wants_frame = {
        let Ok(mut engine) = engine.try_borrow_mut() else {
            tracing::warn!(event = phase.event_name(), "engine busy; pointer event dropped");
            return;
        };
        let pt = Point::new(f64::from(ev.offset_x()), f64::from(ev.offset_y()));
        let pointer = PointerId(ev.pointer_id());
        let actions = match phase {
            PointerPhase::Down => {
                engine.sync_viewport();
                match Button::from_dom(ev.button()) {
                    Some(button) => engine.core.on_pointer_down(pt, button, pointer),
                    None => Vec::new(),
                }
            }
            PointerPhase::Move => engine.core.on_pointer_move(pt, pointer),
            PointerPhase::Up => engine.core.on_pointer_up(pointer),
            PointerPhase::Cancel => engine.core.on_pointer_cancel(pointer),
        };
        if actions.iter().any(|a| matches!(a, Action::CapturePointer(_))) {
            ev.prevent_default();
        }
        engine.perform(&actions)
    };
    if wants_frame {
        schedule_frame(engine, frames);
    }
}

/// Request one animation frame unless one is already pending. The frame
/// advances animations, draws, and re-arms itself while warranted.
fn schedule_frame(engine: &Rc<RefCell<Engine>>, frames: &Rc<FrameLoop>) {
    if frames.pending.get() || frames.stopped.get() {
        return;
    }
    let Some(window) = web_sys::window() else {
        return;
    };
    frames.pending.set(true);

    let engine_cb = Rc::clone(engine);
    let frames_cb = Rc::clone(frames);
    let holder: Rc<RefCell<Option<Closure<dyn FnMut(f64)>>>> = Rc::new(RefCell::new(None));
    let holder_cb = Rc::clone(&holder);
    let cb = Closure::wrap(Box::new(move |_ts: f64| {
        frames_cb.pending.set(false);
        let again = match engine_cb.try_borrow_mut() {
            Ok(mut engine) => {
                let again = engine.core.frame();
                if let Err(err) = engine.render() {
                    tracing::warn!(?err, "frame render failed");
                }
                again
            }
            Err(_) => true,
        };
        if again {
            schedule_frame(&engine_cb, &frames_cb);
        }
        holder_cb.borrow_mut().take();
    }) as Box<dyn FnMut(f64)>);

    match window.request_animation_frame(cb.as_ref().unchecked_ref()) {
        Ok(_) => *holder.borrow_mut() = Some(cb),
        Err(err) => {
            frames.pending.set(false);
            tracing::warn!(?err, "request_animation_frame failed");
        }
    }
}
