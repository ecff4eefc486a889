//! Shared numeric constants for the canvas crate.
//!
//! These are the defaults behind [`crate::config::EditorConfig`]; code should
//! read policy values from a config rather than from here.

// ── Zone geometry ───────────────────────────────────────────────

/// Minimum zone width for manual resize and auto-fit.
pub const ZONE_MIN_W: f64 = 120.0;

/// Minimum zone height for manual resize and auto-fit.
pub const ZONE_MIN_H: f64 = 80.0;

/// Margin added around member blocks when a zone is auto-fit.
pub const FIT_PADDING: f64 = 24.0;

/// Interior margin a dragged block keeps from its candidate zone's edges.
pub const DRAG_INTERIOR_PADDING: f64 = 16.0;

// ── Hover and guides ────────────────────────────────────────────

/// Maximum pointer-to-zone distance for hover highlighting.
pub const HOVER_THRESHOLD: f64 = 48.0;

/// Fraction of the moving zone's area another zone must overlap to emit guides.
pub const GUIDE_OVERLAP_RATIO: f64 = 0.3;

/// Maximum distance between two edges for them to count as aligned.
pub const GUIDE_TOLERANCE: f64 = 6.0;

// ── Animation ───────────────────────────────────────────────────

/// Duration of creation and auto-fit tweens, in milliseconds.
pub const TWEEN_MS: f64 = 200.0;

/// Opacity a freshly created zone fades in from.
pub const CREATE_OPACITY: f64 = 0.0;

/// Scale a freshly created zone grows from.
pub const CREATE_SCALE: f64 = 0.85;

// ── Handles and canvas edges ────────────────────────────────────

/// Side length of the square zone resize handle.
pub const HANDLE_SIZE: f64 = 16.0;

/// Distance from the zone's bottom-right corner back to the handle's top-left.
pub const HANDLE_INSET: f64 = 10.0;

/// A dragged block's top-left stays at least this far from the far canvas edges.
pub const BLOCK_EDGE_MARGIN: f64 = 20.0;

/// A dragged zone's top-left stays at least this far from the far canvas edges.
pub const ZONE_EDGE_MARGIN: f64 = 40.0;

// ── Store defaults ──────────────────────────────────────────────

/// Offset applied to both axes when a block is duplicated.
pub const DUPLICATE_OFFSET: f64 = 24.0;

/// Default zone rectangle: x, y, w, h.
pub const DEFAULT_ZONE_RECT: (f64, f64, f64, f64) = (50.0, 50.0, 300.0, 200.0);

/// Default block rectangle: x, y, w, h.
pub const DEFAULT_BLOCK_RECT: (f64, f64, f64, f64) = (80.0, 80.0, 120.0, 60.0);

/// Default zone name.
pub const DEFAULT_ZONE_NAME: &str = "Zone";

/// Default block name.
pub const DEFAULT_BLOCK_NAME: &str = "Block";

/// Suffix appended to the name of a duplicated block.
pub const COPY_SUFFIX: &str = " (copy)";

/// Prefix of every minted entity id.
pub const ID_PREFIX: &str = "id_";
