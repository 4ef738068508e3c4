//! Math and geometry types shared across the presenter and host layers.
//!
//! Vector/quaternion/matrix math comes from `glam`; this module only adds
//! the small value types the presenter API speaks in: a pixel-space
//! rectangle and an affine transform.

mod rect;
mod transform;

pub use rect::Rect;
pub use transform::Transform;

pub use glam::{Mat4, Quat, Vec3};
