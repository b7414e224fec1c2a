//! Indexed triangle mesh drawn as a render object model

use ash::vk;

use super::commands::CommandRecorder;
use super::push_constants::PushConstants;
use super::render_object::{Model, ModelDrawArgs, RenderDevice};
use crate::render::backends::vulkan::initialization::context::VulkanResult;
use crate::render::backends::vulkan::resources::binding::{ImageResource, ImageSampler};
use crate::render::backends::vulkan::resources::descriptor_set::DescriptorBindingLayer;

/// Vertex and `u32` index buffers plus an optional texture
///
/// Buffers are owned by the caller and must outlive every recorded draw.
#[derive(Debug, Clone, PartialEq)]
pub struct MeshModel {
    vertex_buffer: vk::Buffer,
    index_buffer: vk::Buffer,
    index_count: u32,
    mvp_idx: u32,
    mat_idx: i32,
    texture: Option<(u32, ImageSampler)>,
}

impl MeshModel {
    /// Mesh without material or texture
    pub fn new(vertex_buffer: vk::Buffer, index_buffer: vk::Buffer, index_count: u32) -> Self {
        Self {
            vertex_buffer,
            index_buffer,
            index_count,
            mvp_idx: 0,
            mat_idx: -1,
            texture: None,
        }
    }

    /// Sample `image` at binding `slot` in the fragment shader
    pub fn with_texture<I: ImageResource + ?Sized>(mut self, slot: u32, image: &I) -> Self {
        self.texture = Some((slot, ImageSampler::from_image(image)));
        self
    }

    /// Matrix and material indices passed as push constants
    pub fn with_indices(mut self, mvp_idx: u32, mat_idx: i32) -> Self {
        self.mvp_idx = mvp_idx;
        self.mat_idx = mat_idx;
        self
    }

    /// Indices drawn per call
    pub fn index_count(&self) -> u32 {
        self.index_count
    }
}

impl<D: RenderDevice> Model<D> for MeshModel {
    fn add_set_bindings(&self, layer: &mut DescriptorBindingLayer<D>) -> VulkanResult<()> {
        if let Some((slot, image)) = &self.texture {
            layer.add_image_binding(
                *slot,
                vk::DescriptorType::COMBINED_IMAGE_SAMPLER,
                vk::ShaderStageFlags::FRAGMENT,
                image,
            )?;
        }
        Ok(())
    }

    fn draw(&self, device: &D, command_buffer: vk::CommandBuffer, args: &ModelDrawArgs<'_>) {
        let Some(set) = args.current_set() else {
            log::warn!("[RENDER_OBJECT] No descriptor set for frame {}", args.current_frame);
            return;
        };
        device.bind_descriptor_set(command_buffer, args.pipeline_layout, set);

        let constants = PushConstants::from_draw_args(args, self.mvp_idx, self.mat_idx);
        device.push_constants(
            command_buffer,
            args.pipeline_layout,
            vk::ShaderStageFlags::VERTEX,
            0,
            constants.vertex_bytes(),
        );
        device.push_constants(
            command_buffer,
            args.pipeline_layout,
            vk::ShaderStageFlags::FRAGMENT,
            PushConstants::FRAGMENT_OFFSET,
            constants.fragment_bytes(),
        );

        device.bind_vertex_buffer(command_buffer, self.vertex_buffer);
        device.bind_index_buffer(command_buffer, self.index_buffer);
        device.draw_indexed(command_buffer, self.index_count, 0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::math::Mat4;
    use crate::render::backends::vulkan::rendering::draw_info::ViewFlags;
    use crate::render::backends::vulkan::testing::{GpuCall, MockDevice};
    use ash::vk::Handle;

    #[test]
    fn test_draw_records_full_sequence() {
        let device = MockDevice::new();
        let mesh = MeshModel::new(vk::Buffer::from_raw(1), vk::Buffer::from_raw(2), 36).with_indices(4, 2);
        let sets = [vk::DescriptorSet::from_raw(10), vk::DescriptorSet::from_raw(11)];
        let vp = Mat4::new_scaling(2.0);
        let args = ModelDrawArgs {
            current_frame: 1,
            pipeline_layout: vk::PipelineLayout::from_raw(3),
            sets: &sets,
            view_projection: &vp,
            view: ViewFlags::TEXTURE,
            time: 1.0,
        };

        Model::<MockDevice>::draw(&mesh, &device, vk::CommandBuffer::from_raw(9), &args);

        let expected = PushConstants::new(&vp, 4, 2, 1.0, ViewFlags::TEXTURE);
        approx::assert_relative_eq!(expected.view_projection[0][0], 2.0);
        assert_eq!(
            device.calls(),
            vec![
                GpuCall::BindDescriptorSet {
                    layout: vk::PipelineLayout::from_raw(3),
                    set: sets[1],
                },
                GpuCall::PushConstants {
                    stages: vk::ShaderStageFlags::VERTEX,
                    offset: 0,
                    bytes: expected.vertex_bytes().to_vec(),
                },
                GpuCall::PushConstants {
                    stages: vk::ShaderStageFlags::FRAGMENT,
                    offset: 68,
                    bytes: expected.fragment_bytes().to_vec(),
                },
                GpuCall::BindVertexBuffer(vk::Buffer::from_raw(1)),
                GpuCall::BindIndexBuffer(vk::Buffer::from_raw(2)),
                GpuCall::DrawIndexed { index_count: 36 },
            ]
        );
    }
}
