//! The presenter core: renderer contract and its wgpu backend.
//!
//! Responsibilities:
//! - the polymorphic [`Renderer`] contract (prepare / render / present /
//!   create_render_resource / resize_buffers)
//! - turning geometry/texture descriptors into device resources
//! - per-frame lifecycle: deferred resize, clear, viewport, draw passes
//! - view-projection from a bound camera, or the fixed default

mod backend;
mod pipeline;
mod projection;
mod resource;
mod uniforms;

pub use backend::WgpuRenderer;
pub use projection::{Camera, CameraMatrices, CameraSource};
pub use resource::{
    FaceInfo, RenderResource, RenderResourceData, ResourceDataError, TextureData, VertexData,
};

use crate::math::{Rect, Transform};

/// The renderer contract.
///
/// One frame is the strict sequence `prepare` → any number of `render`
/// calls → `present`; calling out of order is a caller-contract violation,
/// checked with debug assertions. `create_render_resource` may be called at
/// any time, but never concurrently with frame operations on the same
/// backend — the backend has no internal locking and is single-threaded by
/// design.
pub trait Renderer {
    /// Prepares the frame: applies a pending resize, refreshes the
    /// view-projection matrix, clears color and depth, sets the viewport.
    /// Call exactly once per frame, before any `render`.
    fn prepare(&mut self);

    /// Draws one resource with `transform` composed onto the current
    /// view-projection matrix. The resource must have been created by this
    /// backend.
    fn render(&mut self, resource: &RenderResource, transform: &Transform);

    /// Presents the frame. Call exactly once per frame, after all `render`
    /// calls.
    fn present(&mut self);

    /// Uploads a descriptor into an owned GPU resource.
    ///
    /// Synchronous and all-or-nothing; fails on a structurally invalid
    /// descriptor (empty vertex sequence) before touching the device.
    fn create_render_resource(
        &self,
        data: &RenderResourceData,
    ) -> Result<RenderResource, ResourceDataError>;

    /// Records a pending surface resize. Nothing is reallocated here; the
    /// resize is applied at the start of the next `prepare`, so requests
    /// arriving mid-frame never invalidate buffers bound for drawing.
    fn resize_buffers(&mut self, client_rect: Rect);
}
