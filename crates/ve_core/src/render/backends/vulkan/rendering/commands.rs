//! Command recording used by render objects and models
//!
//! Recording never fails at the API level; validation of the command buffer
//! state is left to the validation layers.

use ash::vk;

use crate::render::backends::vulkan::initialization::context::LogicalDevice;

/// Graphics commands recorded into a caller-owned command buffer
pub trait CommandRecorder {
    /// Bind a graphics pipeline
    fn bind_pipeline(&self, command_buffer: vk::CommandBuffer, pipeline: vk::Pipeline);

    /// Bind `set` as descriptor set 0
    fn bind_descriptor_set(
        &self,
        command_buffer: vk::CommandBuffer,
        layout: vk::PipelineLayout,
        set: vk::DescriptorSet,
    );

    /// Upload push constant bytes for `stages` at `offset`
    fn push_constants(
        &self,
        command_buffer: vk::CommandBuffer,
        layout: vk::PipelineLayout,
        stages: vk::ShaderStageFlags,
        offset: u32,
        bytes: &[u8],
    );

    /// Bind a vertex buffer at binding 0
    fn bind_vertex_buffer(&self, command_buffer: vk::CommandBuffer, buffer: vk::Buffer);

    /// Bind a `u32` index buffer
    fn bind_index_buffer(&self, command_buffer: vk::CommandBuffer, buffer: vk::Buffer);

    /// Draw `index_count` indices starting at `first_index`
    fn draw_indexed(&self, command_buffer: vk::CommandBuffer, index_count: u32, first_index: u32);
}

impl CommandRecorder for LogicalDevice {
    fn bind_pipeline(&self, command_buffer: vk::CommandBuffer, pipeline: vk::Pipeline) {
        unsafe {
            self.device
                .cmd_bind_pipeline(command_buffer, vk::PipelineBindPoint::GRAPHICS, pipeline);
        }
    }

    fn bind_descriptor_set(
        &self,
        command_buffer: vk::CommandBuffer,
        layout: vk::PipelineLayout,
        set: vk::DescriptorSet,
    ) {
        unsafe {
            self.device.cmd_bind_descriptor_sets(
                command_buffer,
                vk::PipelineBindPoint::GRAPHICS,
                layout,
                0,
                &[set],
                &[],
            );
        }
    }

    fn push_constants(
        &self,
        command_buffer: vk::CommandBuffer,
        layout: vk::PipelineLayout,
        stages: vk::ShaderStageFlags,
        offset: u32,
        bytes: &[u8],
    ) {
        unsafe {
            self.device
                .cmd_push_constants(command_buffer, layout, stages, offset, bytes);
        }
    }

    fn bind_vertex_buffer(&self, command_buffer: vk::CommandBuffer, buffer: vk::Buffer) {
        unsafe {
            self.device
                .cmd_bind_vertex_buffers(command_buffer, 0, &[buffer], &[0]);
        }
    }

    fn bind_index_buffer(&self, command_buffer: vk::CommandBuffer, buffer: vk::Buffer) {
        unsafe {
            self.device
                .cmd_bind_index_buffer(command_buffer, buffer, 0, vk::IndexType::UINT32);
        }
    }

    fn draw_indexed(&self, command_buffer: vk::CommandBuffer, index_count: u32, first_index: u32) {
        unsafe {
            self.device
                .cmd_draw_indexed(command_buffer, index_count, 1, first_index, 0, 0);
        }
    }
}
