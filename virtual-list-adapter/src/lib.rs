//! Edge bindings for the `virtual-list` engine.
//!
//! The `virtual-list` crate is UI-agnostic and only knows about scroll inputs, navigation and
//! handles. This crate provides the small, framework-neutral pieces every toolkit binding needs:
//!
//! - Raw input normalization: platform wheel deltas, X11 wheel buttons, keys, presses
//! - A [`Controller`] that feeds events to a list and drives it from a host event loop
//! - A headless text-row toolkit ([`TextSurface`], [`TextItem`]) for demos and tests
//!
//! This crate does not link a GUI toolkit.
#![forbid(unsafe_code)]

#[macro_use]
mod macros;

mod controller;
mod input;
mod text;

#[cfg(test)]
mod tests;

pub use controller::{Controller, DEFAULT_RESIZE_DEBOUNCE_MS};
pub use input::{
    InputEvent, Key, WHEEL_DELTA, X11_WHEEL_DOWN, X11_WHEEL_UP, wheel_notches, x11_button_notches,
};
pub use text::{TextItem, TextRow, TextSurface, render_visible};
