//! hemu8 GUI library
//!
//! Windowing lives in the `hemu8` binary. Everything else, including the
//! per-frame session logic, is kept in this library so it can be tested
//! without a display.

pub mod audio;
pub mod keymap;
pub mod library;
pub mod options;
pub mod profiles;
pub mod save_state;
pub mod session;
pub mod ui_render;
