//! Graphics pipelines built from a render pass, a set layout and named shaders

use ash::vk;
use std::sync::Arc;

use crate::render::backends::vulkan::initialization::context::VulkanResult;

/// A shader file and the stage it runs in
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShaderStage {
    /// File stem, resolved to `<shader dir>/<name>.spv`
    pub name: String,
    /// Pipeline stage
    pub stage: vk::ShaderStageFlags,
}

impl ShaderStage {
    /// Shader `name` for `stage`
    pub fn new(name: impl Into<String>, stage: vk::ShaderStageFlags) -> Self {
        Self {
            name: name.into(),
            stage,
        }
    }

    /// Vertex shader `name`
    pub fn vertex(name: impl Into<String>) -> Self {
        Self::new(name, vk::ShaderStageFlags::VERTEX)
    }

    /// Fragment shader `name`
    pub fn fragment(name: impl Into<String>) -> Self {
        Self::new(name, vk::ShaderStageFlags::FRAGMENT)
    }
}

/// Everything that varies between render object pipelines
#[derive(Debug, Clone, Copy)]
pub struct PipelineDesc<'a> {
    /// Render pass the pipeline draws in, subpass 0
    pub render_pass: vk::RenderPass,
    /// The single descriptor set layout of the pipeline layout
    pub set_layout: vk::DescriptorSetLayout,
    /// Shader stages in pipeline order
    pub shaders: &'a [ShaderStage],
    /// Fill or line rasterization
    pub polygon_mode: vk::PolygonMode,
}

/// Graphics pipeline creation and destruction
pub trait PipelineDevice {
    /// Create a pipeline and its layout
    fn create_graphics_pipeline(&self, desc: &PipelineDesc<'_>) -> VulkanResult<(vk::Pipeline, vk::PipelineLayout)>;

    /// Destroy a pipeline and its layout
    fn destroy_pipeline(&self, pipeline: vk::Pipeline, layout: vk::PipelineLayout);
}

/// Graphics pipeline wrapper with RAII cleanup
pub struct Pipeline<D: PipelineDevice> {
    device: Arc<D>,
    pipeline: vk::Pipeline,
    layout: vk::PipelineLayout,
    polygon_mode: vk::PolygonMode,
}

impl<D: PipelineDevice> Pipeline<D> {
    /// Create a pipeline on `device`
    pub fn new(device: Arc<D>, desc: &PipelineDesc<'_>) -> VulkanResult<Self> {
        let (pipeline, layout) = device.create_graphics_pipeline(desc)?;
        log::debug!(
            "[PIPELINE] Created {:?} pipeline {:?} from {} shaders",
            desc.polygon_mode,
            pipeline,
            desc.shaders.len()
        );
        Ok(Self {
            device,
            pipeline,
            layout,
            polygon_mode: desc.polygon_mode,
        })
    }

    /// Get pipeline handle
    pub fn handle(&self) -> vk::Pipeline {
        self.pipeline
    }

    /// Get layout handle
    pub fn layout(&self) -> vk::PipelineLayout {
        self.layout
    }

    /// Rasterization mode the pipeline was built with
    pub fn polygon_mode(&self) -> vk::PolygonMode {
        self.polygon_mode
    }
}

impl<D: PipelineDevice> Drop for Pipeline<D> {
    fn drop(&mut self) {
        log::debug!("[PIPELINE] Dropping pipeline {:?}", self.pipeline);
        self.device.destroy_pipeline(self.pipeline, self.layout);
    }
}
