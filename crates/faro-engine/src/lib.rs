//! Faro engine crate.
//!
//! This crate owns the platform + GPU pieces of the card-table presenter:
//! the device layer, the renderer contract and its wgpu backend, asset
//! readers, the board data model, and the window runtime that hosts them.

pub mod device;
pub mod presenter;
pub mod window;
pub mod time;

pub mod logging;
pub mod math;
pub mod assets;
pub mod board;
