//! Graphics utilities shared by system frontends.

pub mod color;

pub use color::ColorOps;
