use bytemuck::{Pod, Zeroable};
use glam::Mat4;

/// Per-draw constants: the combined model-view-projection matrix,
/// column-major as WGSL consumes it.
#[repr(C)]
#[derive(Debug, Copy, Clone, Pod, Zeroable)]
pub(crate) struct ObjectUniform {
    pub mvp: [[f32; 4]; 4],
}

/// Default slot count; at 256-byte alignment this is a 64 KiB buffer.
pub(crate) const UNIFORM_RING_CAPACITY: u32 = 256;

/// Per-frame uniform ring: one buffer carved into aligned slots, bound with
/// dynamic offsets so every draw call reads its own constants.
///
/// `queue.write_buffer` lands before the next submit, so draws within one
/// submission must each target a distinct offset; the backend flushes the
/// encoder and resets the ring when it fills mid-frame.
pub(crate) struct UniformRing {
    buffer: wgpu::Buffer,
    bind_group: wgpu::BindGroup,
    stride: u32,
    capacity: u32,
    cursor: u32,
}

impl UniformRing {
    pub fn new(device: &wgpu::Device, layout: &wgpu::BindGroupLayout, capacity: u32) -> Self {
        debug_assert!(capacity > 0);

        let element_size = std::mem::size_of::<ObjectUniform>() as u32;
        let alignment = device.limits().min_uniform_buffer_offset_alignment;
        let stride = (element_size + alignment - 1) & !(alignment - 1);

        let buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("faro object uniform ring"),
            size: stride as u64 * capacity as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("faro object uniform bind group"),
            layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: wgpu::BindingResource::Buffer(wgpu::BufferBinding {
                    buffer: &buffer,
                    offset: 0,
                    size: Some(std::num::NonZeroU64::new(element_size as u64).unwrap()),
                }),
            }],
        });

        Self {
            buffer,
            bind_group,
            stride,
            capacity,
            cursor: 0,
        }
    }

    /// Rewinds the ring. Only valid once previously written slots have been
    /// submitted (frame start, or right after a mid-frame flush).
    pub fn reset(&mut self) {
        self.cursor = 0;
    }

    /// Writes `mvp` into the next free slot and returns its dynamic offset,
    /// or `None` when the ring is full.
    pub fn push(&mut self, queue: &wgpu::Queue, mvp: Mat4) -> Option<u32> {
        if self.cursor >= self.capacity {
            return None;
        }

        let offset = self.cursor * self.stride;
        queue.write_buffer(
            &self.buffer,
            offset as u64,
            bytemuck::bytes_of(&ObjectUniform {
                mvp: mvp.to_cols_array_2d(),
            }),
        );
        self.cursor += 1;
        Some(offset)
    }

    pub fn bind_group(&self) -> &wgpu::BindGroup {
        &self.bind_group
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::HeadlessGpu;
    use crate::presenter::pipeline;

    #[test]
    fn push_hands_out_distinct_aligned_offsets() {
        let Ok(gpu) = pollster::block_on(HeadlessGpu::new()) else {
            return;
        };
        let layout = pipeline::object_bind_group_layout(&gpu.device);
        let mut ring = UniformRing::new(&gpu.device, &layout, 4);

        let alignment = gpu.device.limits().min_uniform_buffer_offset_alignment;
        let mut offsets = Vec::new();
        while let Some(offset) = ring.push(&gpu.queue, Mat4::IDENTITY) {
            assert_eq!(offset % alignment, 0);
            offsets.push(offset);
        }

        assert_eq!(offsets.len(), 4);
        offsets.dedup();
        assert_eq!(offsets.len(), 4, "offsets must be distinct");

        ring.reset();
        assert_eq!(ring.push(&gpu.queue, Mat4::IDENTITY), Some(offsets[0]));
    }
}
