//! Zone and block diagram editor core.
//!
//! This crate is compiled to WebAssembly and runs in the browser, but
//! everything except the renderer and the DOM wiring is plain Rust and runs
//! natively under `cargo test`. It owns the authoritative entity store, the
//! auto-fit rule that keeps zones wrapped around their blocks, the animation
//! layer that smooths derived geometry, and the pointer state machine that
//! turns raw input into store mutations. The host only forwards DOM events
//! and carries out the returned [`engine::Action`]s.
//!
//! ## Module layout
//!
//! | Module | Role |
//! |--------|------|
//! | [`engine`] | Top-level engine, browser wiring, and testable [`engine::EngineCore`] |
//! | [`store`] | Entity store: collections, selection, mutations, publish/subscribe |
//! | [`doc`] | Zone, block, and technical link types |
//! | [`event`] | Store events and the listener registry |
//! | [`snapshot`] | Serialized store contents and integrity checks |
//! | [`fit`] | Auto-fit rectangle computation |
//! | [`anim`] | Clocks and per-zone visual tweens |
//! | [`input`] | Input event types and the gesture state machine |
//! | [`hit`] | Hit-testing and drop-target selection |
//! | [`guides`] | Alignment guides for zone drags |
//! | [`geom`] | Points, rectangles, and interpolation helpers |
//! | [`palette`] | Built-in block templates |
//! | [`render`] | Scene rendering onto a 2D context |
//! | [`config`] | Tunable editor policy |
//! | [`consts`] | Default policy values and entity defaults |

pub mod anim;
pub mod config;
pub mod consts;
pub mod doc;
pub mod engine;
pub mod event;
pub mod fit;
pub mod geom;
pub mod guides;
pub mod hit;
pub mod input;
pub mod palette;
pub mod render;
pub mod snapshot;
pub mod store;
