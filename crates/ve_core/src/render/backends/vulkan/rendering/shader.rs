//! SPIR-V loading and graphics pipeline creation on a [`LogicalDevice`]
//!
//! Shaders are looked up by name in the device's shader directory as
//! `<name>.spv`. Pipelines share one fixed state: triangle lists, dynamic
//! viewport and scissor, back-face culling, depth testing and the
//! [`Vertex`] / [`PushConstants`] layouts. Only the polygon mode varies.

use ash::{vk, Device};
use std::ffi::CStr;
use std::fs;
use std::path::Path;

use super::pipeline::{PipelineDesc, PipelineDevice};
use super::push_constants::PushConstants;
use super::vertex_layout::Vertex;
use crate::render::backends::vulkan::initialization::context::{LogicalDevice, VulkanError, VulkanResult};

const ENTRY_POINT: &CStr = c"main";

/// SPIR-V shader module, destroyed on drop
pub struct ShaderModule<'d> {
    device: &'d Device,
    module: vk::ShaderModule,
}

impl<'d> ShaderModule<'d> {
    /// Create shader module from SPIR-V bytecode
    pub fn from_bytes(device: &'d Device, bytes: &[u8]) -> VulkanResult<Self> {
        log::debug!("[SHADER] Creating shader module from {} bytes", bytes.len());

        let words = spirv_words(bytes)?;
        let create_info = vk::ShaderModuleCreateInfo::builder().code(&words);
        let module = unsafe { device.create_shader_module(&create_info, None) }.map_err(|e| {
            log::error!("[SHADER] vkCreateShaderModule failed: {e:?}");
            VulkanError::Api(e)
        })?;

        Ok(Self { device, module })
    }

    /// Load shader from SPIR-V file
    pub fn from_file(device: &'d Device, path: &Path) -> VulkanResult<Self> {
        log::debug!("[SHADER] Loading shader from: {path:?}");
        let bytes = fs::read(path).map_err(|e| {
            log::error!("[SHADER] Failed to read shader file {path:?}: {e}");
            VulkanError::InitializationFailed(format!("Failed to read shader file {}: {e}", path.display()))
        })?;
        Self::from_bytes(device, &bytes)
    }

    /// Get shader module handle
    pub fn handle(&self) -> vk::ShaderModule {
        self.module
    }

    /// Stage description entering at `main`
    pub fn stage_info(&self, stage: vk::ShaderStageFlags) -> vk::PipelineShaderStageCreateInfo {
        vk::PipelineShaderStageCreateInfo::builder()
            .stage(stage)
            .module(self.module)
            .name(ENTRY_POINT)
            .build()
    }
}

impl Drop for ShaderModule<'_> {
    fn drop(&mut self) {
        unsafe {
            self.device.destroy_shader_module(self.module, None);
        }
    }
}

/// Reinterpret SPIR-V bytes as little-endian words
fn spirv_words(bytes: &[u8]) -> VulkanResult<Vec<u32>> {
    if bytes.is_empty() || bytes.len() % 4 != 0 {
        return Err(VulkanError::InitializationFailed(format!(
            "SPIR-V bytecode length {} is not a non-zero multiple of 4",
            bytes.len()
        )));
    }
    Ok(bytes
        .chunks_exact(4)
        .map(|word| u32::from_le_bytes([word[0], word[1], word[2], word[3]]))
        .collect())
}

impl PipelineDevice for LogicalDevice {
    fn create_graphics_pipeline(&self, desc: &PipelineDesc<'_>) -> VulkanResult<(vk::Pipeline, vk::PipelineLayout)> {
        let modules = desc
            .shaders
            .iter()
            .map(|shader| {
                let path = self.shader_dir().join(format!("{}.spv", shader.name));
                ShaderModule::from_file(&self.device, &path)
            })
            .collect::<VulkanResult<Vec<_>>>()?;
        let shader_stages: Vec<vk::PipelineShaderStageCreateInfo> = modules
            .iter()
            .zip(desc.shaders)
            .map(|(module, shader)| module.stage_info(shader.stage))
            .collect();

        let binding_descriptions = [Vertex::binding_description()];
        let attribute_descriptions = Vertex::attribute_descriptions();
        let vertex_input = vk::PipelineVertexInputStateCreateInfo::builder()
            .vertex_binding_descriptions(&binding_descriptions)
            .vertex_attribute_descriptions(&attribute_descriptions);

        let input_assembly = vk::PipelineInputAssemblyStateCreateInfo::builder()
            .topology(vk::PrimitiveTopology::TRIANGLE_LIST)
            .primitive_restart_enable(false);

        let viewport_state = vk::PipelineViewportStateCreateInfo::builder()
            .viewport_count(1)
            .scissor_count(1);
        let dynamic_states = [vk::DynamicState::VIEWPORT, vk::DynamicState::SCISSOR];
        let dynamic_state = vk::PipelineDynamicStateCreateInfo::builder().dynamic_states(&dynamic_states);

        let rasterizer = vk::PipelineRasterizationStateCreateInfo::builder()
            .depth_clamp_enable(false)
            .rasterizer_discard_enable(false)
            .polygon_mode(desc.polygon_mode)
            .line_width(1.0)
            .cull_mode(vk::CullModeFlags::BACK)
            .front_face(vk::FrontFace::COUNTER_CLOCKWISE)
            .depth_bias_enable(false);

        let multisampling = vk::PipelineMultisampleStateCreateInfo::builder()
            .sample_shading_enable(false)
            .rasterization_samples(vk::SampleCountFlags::TYPE_1);

        let depth_stencil = vk::PipelineDepthStencilStateCreateInfo::builder()
            .depth_test_enable(true)
            .depth_write_enable(true)
            .depth_compare_op(vk::CompareOp::LESS)
            .depth_bounds_test_enable(false)
            .stencil_test_enable(false);

        let color_blend_attachments = [vk::PipelineColorBlendAttachmentState::builder()
            .color_write_mask(vk::ColorComponentFlags::RGBA)
            .blend_enable(false)
            .build()];
        let color_blending = vk::PipelineColorBlendStateCreateInfo::builder()
            .logic_op_enable(false)
            .attachments(&color_blend_attachments);

        let set_layouts = [desc.set_layout];
        let push_constant_ranges = PushConstants::ranges();
        let layout_info = vk::PipelineLayoutCreateInfo::builder()
            .set_layouts(&set_layouts)
            .push_constant_ranges(&push_constant_ranges);
        let layout = unsafe { self.device.create_pipeline_layout(&layout_info, None) }
            .map_err(VulkanError::Api)?;

        let pipeline_info = vk::GraphicsPipelineCreateInfo::builder()
            .stages(&shader_stages)
            .vertex_input_state(&vertex_input)
            .input_assembly_state(&input_assembly)
            .viewport_state(&viewport_state)
            .rasterization_state(&rasterizer)
            .multisample_state(&multisampling)
            .depth_stencil_state(&depth_stencil)
            .color_blend_state(&color_blending)
            .dynamic_state(&dynamic_state)
            .layout(layout)
            .render_pass(desc.render_pass)
            .subpass(0);

        let created = unsafe {
            self.device
                .create_graphics_pipelines(vk::PipelineCache::null(), &[pipeline_info.build()], None)
        };
        match created {
            Ok(pipelines) => match pipelines.first() {
                Some(&pipeline) => Ok((pipeline, layout)),
                None => {
                    unsafe { self.device.destroy_pipeline_layout(layout, None) };
                    Err(VulkanError::InitializationFailed("Driver returned no pipeline".to_string()))
                }
            },
            Err((_, err)) => {
                log::error!("[PIPELINE] vkCreateGraphicsPipelines failed: {err:?}");
                unsafe { self.device.destroy_pipeline_layout(layout, None) };
                Err(VulkanError::Api(err))
            }
        }
    }

    fn destroy_pipeline(&self, pipeline: vk::Pipeline, layout: vk::PipelineLayout) {
        unsafe {
            self.device.destroy_pipeline(pipeline, None);
            self.device.destroy_pipeline_layout(layout, None);
        }
    }
}
