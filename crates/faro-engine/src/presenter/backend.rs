use std::sync::atomic::{AtomicU64, Ordering};

use anyhow::Result;
use glam::Mat4;
use winit::dpi::PhysicalSize;
use winit::window::Window;

use crate::device::{Gpu, GpuFrame, GpuInit, SurfaceErrorAction};
use crate::math::{Rect, Transform};

use super::pipeline::{CardPipeline, DEPTH_FORMAT};
use super::projection::{self, CameraSource};
use super::resource::{
    self, plan_face_draws, RenderResource, RenderResourceData, ResourceCtx, ResourceDataError,
};
use super::uniforms::{UniformRing, UNIFORM_RING_CAPACITY};
use super::Renderer;

/// Fixed frame background.
const BACKGROUND: wgpu::Color = wgpu::Color::BLACK;

/// Stamps each backend instance so resources can be matched to their
/// creator.
static NEXT_BACKEND_SERIAL: AtomicU64 = AtomicU64::new(1);

/// Deferred-resize state.
///
/// `resize_buffers` only records intent here; the swapchain mutation happens
/// at the start of the next `prepare`, so a resize can never invalidate
/// buffers bound for an in-flight frame.
#[derive(Debug, Copy, Clone, PartialEq)]
pub(crate) enum PendingResize {
    Idle,
    Requested(Rect),
}

impl PendingResize {
    /// Records a request, replacing any earlier one not yet consumed.
    pub fn request(&mut self, rect: Rect) {
        *self = PendingResize::Requested(rect);
    }

    /// Consumes the pending request, returning to `Idle`.
    pub fn take(&mut self) -> Option<Rect> {
        match std::mem::replace(self, PendingResize::Idle) {
            PendingResize::Requested(rect) => Some(rect),
            PendingResize::Idle => None,
        }
    }
}

struct DepthBuffer {
    // The texture is kept alive by its view; stored for parity with the
    // swapchain ownership model.
    _texture: wgpu::Texture,
    view: wgpu::TextureView,
}

impl DepthBuffer {
    fn new(device: &wgpu::Device, width: u32, height: u32) -> Self {
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("faro depth buffer"),
            size: wgpu::Extent3d {
                width: width.max(1),
                height: height.max(1),
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: DEPTH_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        Self {
            _texture: texture,
            view,
        }
    }
}

/// The wgpu backend: one device/queue/surface triple, the default pipeline,
/// and the per-frame state the [`Renderer`] contract is implemented over.
///
/// Strictly single-threaded; all methods must be called from the thread
/// that owns the backend, in `prepare` / `render*` / `present` order.
pub struct WgpuRenderer<'w> {
    serial: u64,
    gpu: Gpu<'w>,
    pipeline: CardPipeline,
    uniforms: UniformRing,
    depth: Option<DepthBuffer>,

    camera: Option<Box<dyn CameraSource>>,
    client_rect: Rect,
    pending_resize: PendingResize,

    projection: Mat4,
    view_projection: Mat4,

    frame: Option<GpuFrame>,
    /// Set when `prepare` could not acquire a surface texture, so that the
    /// `render`/`present` calls of that frame degrade to no-ops instead of
    /// being reported as contract violations.
    frame_skipped: bool,
}

impl<'w> WgpuRenderer<'w> {
    /// Creates the backend against `window`.
    ///
    /// Fails when no adapter/device is available ("backend unavailable");
    /// device errors after construction are fatal.
    pub async fn new(window: &'w Window, init: GpuInit) -> Result<WgpuRenderer<'w>> {
        let gpu = Gpu::new(window, init).await?;
        let size = gpu.size();

        let pipeline = CardPipeline::new(gpu.device(), gpu.queue(), gpu.surface_format());
        let uniforms = UniformRing::new(gpu.device(), &pipeline.object_layout, UNIFORM_RING_CAPACITY);
        let depth = DepthBuffer::new(gpu.device(), size.width, size.height);

        let client_rect = Rect::from_size(size.width as f32, size.height as f32);
        let matrices = projection::default_frame_matrices(
            client_rect.width().max(1.0),
            client_rect.height().max(1.0),
        );

        log::info!(
            "renderer ready: {}x{} {:?}",
            size.width,
            size.height,
            gpu.surface_format()
        );

        Ok(WgpuRenderer {
            serial: NEXT_BACKEND_SERIAL.fetch_add(1, Ordering::Relaxed),
            gpu,
            pipeline,
            uniforms,
            depth: Some(depth),
            camera: None,
            client_rect,
            pending_resize: PendingResize::Idle,
            projection: matrices.projection,
            view_projection: matrices.view_projection,
            frame: None,
            frame_skipped: false,
        })
    }

    /// Binds the main camera.
    ///
    /// The source is queried every `prepare`; once it reports the camera
    /// gone, the default projection takes over. The backend never owns the
    /// camera itself.
    pub fn use_camera(&mut self, source: impl CameraSource + 'static) {
        self.camera = Some(Box::new(source));
    }

    pub fn clear_camera(&mut self) {
        self.camera = None;
    }

    /// The client rectangle frames are currently sized to.
    pub fn client_rect(&self) -> Rect {
        self.client_rect
    }

    /// View-projection matrix as of the last `prepare`.
    pub fn view_projection(&self) -> Mat4 {
        self.view_projection
    }

    /// Projection matrix as of the last `prepare`.
    pub fn projection(&self) -> Mat4 {
        self.projection
    }

    fn client_size(&self) -> (f32, f32) {
        (
            self.client_rect.width().max(1.0),
            self.client_rect.height().max(1.0),
        )
    }

    fn acquire_frame(&mut self) -> Option<GpuFrame> {
        match self.gpu.begin_frame() {
            Ok(frame) => Some(frame),
            Err(err) => match self.gpu.handle_surface_error(err.clone()) {
                SurfaceErrorAction::Reconfigured => match self.gpu.begin_frame() {
                    Ok(frame) => Some(frame),
                    Err(err) => {
                        log::warn!("surface still unavailable after reconfigure: {err}");
                        None
                    }
                },
                SurfaceErrorAction::SkipFrame => {
                    log::warn!("transient surface error, skipping frame: {err}");
                    None
                }
                SurfaceErrorAction::Fatal => {
                    log::error!("fatal surface error: {err}");
                    None
                }
            },
        }
    }
}

impl Renderer for WgpuRenderer<'_> {
    fn prepare(&mut self) {
        debug_assert!(
            self.frame.is_none(),
            "prepare called twice without an intervening present"
        );
        if self.frame.is_some() {
            log::error!("prepare called twice without present; dropping the open frame");
            self.frame = None;
        }
        self.frame_skipped = false;

        if let Some(rect) = self.pending_resize.take() {
            self.client_rect = rect;
            let width = rect.width().max(1.0) as u32;
            let height = rect.height().max(1.0) as u32;

            // Views of the old buffers must be gone before the swapchain is
            // resized, and recreated only against the new dimensions.
            self.depth = None;
            self.gpu.resize(PhysicalSize::new(width, height));
            self.depth = Some(DepthBuffer::new(self.gpu.device(), width, height));

            log::debug!("applied deferred resize to {width}x{height}");
        }

        let (width, height) = self.client_size();
        let matrices = projection::frame_matrices(self.camera.as_deref(), width, height);
        self.projection = matrices.projection;
        self.view_projection = matrices.view_projection;

        let Some(mut frame) = self.acquire_frame() else {
            self.frame_skipped = true;
            return;
        };
        let Some(depth) = self.depth.as_ref() else {
            self.frame_skipped = true;
            return;
        };

        self.uniforms.reset();

        // Clear pass: background color, depth to the far plane.
        {
            let mut rpass = frame.encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("faro clear pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &frame.view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(BACKGROUND),
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &depth.view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                timestamp_writes: None,
                occlusion_query_set: None,
                multiview_mask: None,
            });
            rpass.set_viewport(0.0, 0.0, width, height, 0.0, 1.0);
        }

        self.frame = Some(frame);
    }

    fn render(&mut self, resource: &RenderResource, transform: &Transform) {
        debug_assert_eq!(
            resource.backend_serial, self.serial,
            "render called with a resource from another backend"
        );
        if resource.backend_serial != self.serial {
            log::error!("render resource was created by a different backend; draw skipped");
            return;
        }

        if self.frame.is_none() {
            if !self.frame_skipped {
                debug_assert!(false, "render called outside the prepare/present bracket");
                log::error!("render called before prepare; draw skipped");
            }
            return;
        }

        let mvp = self.view_projection * transform.to_matrix();

        let mut offset = self.uniforms.push(self.gpu.queue(), mvp);
        if offset.is_none() {
            // Uniform ring exhausted: land the recorded passes (and their
            // queued writes) now, then reuse the ring within the same frame.
            let Some(frame) = self.frame.as_mut() else {
                return;
            };
            let finished = std::mem::replace(
                &mut frame.encoder,
                self.gpu
                    .device()
                    .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                        label: Some("faro frame encoder"),
                    }),
            );
            self.gpu.queue().submit(std::iter::once(finished.finish()));
            self.uniforms.reset();
            offset = self.uniforms.push(self.gpu.queue(), mvp);
        }
        let Some(offset) = offset else {
            return;
        };

        let steps = plan_face_draws(&resource.faces, resource.texture_bindings.len());
        let (width, height) = self.client_size();

        let Some(depth) = self.depth.as_ref() else {
            return;
        };
        let Some(frame) = self.frame.as_mut() else {
            return;
        };

        let mut rpass = frame.encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("faro draw pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: &frame.view,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Load,
                    store: wgpu::StoreOp::Store,
                },
                depth_slice: None,
            })],
            depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                view: &depth.view,
                depth_ops: Some(wgpu::Operations {
                    load: wgpu::LoadOp::Load,
                    store: wgpu::StoreOp::Store,
                }),
                stencil_ops: None,
            }),
            timestamp_writes: None,
            occlusion_query_set: None,
            multiview_mask: None,
        });

        rpass.set_viewport(0.0, 0.0, width, height, 0.0, 1.0);
        rpass.set_pipeline(&self.pipeline.pipeline);
        rpass.set_bind_group(0, self.uniforms.bind_group(), &[offset]);
        rpass.set_vertex_buffer(0, resource.vertex_buffer.slice(..));

        if let Some(index_buffer) = &resource.index_buffer {
            rpass.set_index_buffer(index_buffer.slice(..), wgpu::IndexFormat::Uint16);
        }

        for step in steps {
            let texture_bind_group = match step.texture {
                Some(i) => &resource.texture_bindings[i].bind_group,
                None => &self.pipeline.fallback.bind_group,
            };
            rpass.set_bind_group(1, texture_bind_group, &[]);

            if resource.index_buffer.is_some() {
                rpass.draw_indexed(step.first..step.first + step.count, 0, 0..1);
            } else {
                rpass.draw(step.first..step.first + step.count, 0..1);
            }
        }
    }

    fn present(&mut self) {
        let Some(frame) = self.frame.take() else {
            if !self.frame_skipped {
                debug_assert!(false, "present called without a prepared frame");
                log::error!("present called without prepare; nothing to present");
            }
            self.frame_skipped = false;
            return;
        };

        self.gpu.finish_frame(frame);
    }

    fn create_render_resource(
        &self,
        data: &RenderResourceData,
    ) -> Result<RenderResource, ResourceDataError> {
        resource::create_resource(
            &ResourceCtx {
                device: self.gpu.device(),
                queue: self.gpu.queue(),
                texture_layout: &self.pipeline.texture_layout,
                sampler: &self.pipeline.sampler,
            },
            self.serial,
            data,
        )
    }

    fn resize_buffers(&mut self, client_rect: Rect) {
        debug_assert!(client_rect.is_valid(), "inverted client rect");
        self.pending_resize.request(client_rect);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pending_resize_is_consumed_exactly_once() {
        let mut pending = PendingResize::Idle;
        assert_eq!(pending.take(), None);

        let rect = Rect::from_size(800.0, 600.0);
        pending.request(rect);
        assert_eq!(pending.take(), Some(rect));
        // Idempotent once consumed: nothing left for the next frame.
        assert_eq!(pending.take(), None);
    }

    #[test]
    fn later_resize_request_replaces_earlier() {
        let mut pending = PendingResize::Idle;
        pending.request(Rect::from_size(100.0, 100.0));
        pending.request(Rect::from_size(300.0, 200.0));
        assert_eq!(pending.take(), Some(Rect::from_size(300.0, 200.0)));
    }
}
