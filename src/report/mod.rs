//! Rendering of dashboard, lists and public pages.

pub mod generator;

pub use generator::*;
