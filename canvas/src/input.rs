//! Input model: buttons, keys, pointer ids, and the gesture state machine.
//!
//! `InputState` is the active gesture tracked between pointer-down and
//! pointer-up. Each active variant carries the captured pointer, the grab
//! context needed to compute positions from later pointer events, and a
//! [`GestureOrigin`] reapplied verbatim if the gesture is cancelled.
//! `UiState` is the transient, non-persisted state the renderer reads.

#[cfg(test)]
#[path = "input_test.rs"]
mod input_test;

use crate::doc::EntityId;
use crate::geom::{Point, Rect};
use crate::guides::Guide;

/// Mouse button identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Button {
    /// Left mouse button (or single-finger tap).
    Primary,
    /// Middle mouse button (scroll wheel click).
    Middle,
    /// Right mouse button (or two-finger tap).
    Secondary,
}

impl Button {
    /// Map a DOM `MouseEvent.button` value.
    #[must_use]
    pub fn from_dom(button: i16) -> Option<Self> {
        match button {
            0 => Some(Self::Primary),
            1 => Some(Self::Middle),
            2 => Some(Self::Secondary),
            _ => None,
        }
    }
}

/// A keyboard key as reported by the browser (e.g. `"Escape"`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Key(pub String);

impl Key {
    #[must_use]
    pub fn is_escape(&self) -> bool {
        self.0 == "Escape" || self.0 == "Esc"
    }
}

/// Identifier of the pointer that started a gesture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PointerId(pub i32);

/// Geometry captured at gesture start and restored on cancel.
#[derive(Debug, Clone, PartialEq)]
pub struct GestureOrigin {
    /// Rectangle of the dragged or resized entity.
    pub rect: Rect,
    /// Zone membership of a dragged block. Always `None` for zones.
    pub zone_id: Option<EntityId>,
    /// Rectangle of every zone, since auto-fit may move any of them.
    pub zones: Vec<(EntityId, Rect)>,
}

/// Transient UI state visible to the renderer.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UiState {
    /// Zone highlighted as drop target or pointer neighbour.
    pub hover_zone: Option<EntityId>,
    /// Alignment guides for the zone being dragged or resized.
    pub guides: Vec<Guide>,
    /// Unclamped rectangle of a block that was clamped into a zone.
    pub ghost: Option<Rect>,
}

impl UiState {
    /// Drop everything tied to the gesture that just ended.
    pub fn clear_gesture(&mut self) {
        self.hover_zone = None;
        self.guides.clear();
        self.ghost = None;
    }
}

/// Internal state for the input state machine.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum InputState {
    /// No gesture in progress; waiting for the next pointer-down.
    #[default]
    Idle,
    /// A block is following the pointer.
    DraggingBlock {
        id: EntityId,
        pointer: PointerId,
        /// Pointer position relative to the block's top-left at grab time.
        grab: Point,
        origin: GestureOrigin,
    },
    /// A zone is following the pointer.
    DraggingZone {
        id: EntityId,
        pointer: PointerId,
        /// Pointer position relative to the zone's top-left at grab time.
        grab: Point,
        origin: GestureOrigin,
    },
    /// A zone is being resized from its bottom-right handle.
    ResizingZone {
        id: EntityId,
        pointer: PointerId,
        /// Pointer position when the resize started.
        start: Point,
        origin: GestureOrigin,
    },
}

impl InputState {
    /// Whether a drag or resize is in progress.
    #[must_use]
    pub fn is_active(&self) -> bool {
        !matches!(self, Self::Idle)
    }

    /// The pointer that owns the active gesture.
    #[must_use]
    pub fn pointer(&self) -> Option<PointerId> {
        match self {
            Self::Idle => None,
            Self::DraggingBlock { pointer, .. }
            | Self::DraggingZone { pointer, .. }
            | Self::ResizingZone { pointer, .. } => Some(*pointer),
        }
    }

    /// Id of the entity under manipulation.
    #[must_use]
    pub fn target(&self) -> Option<&EntityId> {
        match self {
            Self::Idle => None,
            Self::DraggingBlock { id, .. } | Self::DraggingZone { id, .. } | Self::ResizingZone { id, .. } => {
                Some(id)
            }
        }
    }
}
