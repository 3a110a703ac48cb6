//! Platform abstraction layer
//!
//! Hosts supply a surface, a frame scheduler and a clock:
//! - `manual`: hand-driven clock and scheduler (tests, headless runs)
//! - `native`: wall clock and a sleep-paced frame loop
//! - `web`: canvas 2D surface, `requestAnimationFrame`, `performance.now()`

pub mod manual;
#[cfg(not(target_arch = "wasm32"))]
pub mod native;
#[cfg(target_arch = "wasm32")]
pub mod web;
