//! Platform abstraction layer
//!
//! Handles browser/native differences for:
//! - Logging sinks
//! - Input events from the page (activate, back, orbit, zoom)
//! - Frame delivery from `requestAnimationFrame`

#[cfg(target_arch = "wasm32")]
pub mod web;
