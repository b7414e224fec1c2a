//! Render objects: models sharing one descriptor layer and pipeline pair
//!
//! A render object references models in an externally owned table by index.
//! Every referenced model contributes bindings to the shared
//! [`DescriptorBindingLayer`]; after construction the object owns a solid
//! pipeline and a wireframe ("mesh view") pipeline built from the same shaders.

use ash::vk;
use std::sync::Arc;

use super::commands::CommandRecorder;
use super::draw_info::{DrawInfo, ViewFlags};
use super::pipeline::{Pipeline, PipelineDesc, PipelineDevice, ShaderStage};
use crate::core::config::RendererConfig;
use crate::foundation::math::Mat4;
use crate::render::backends::vulkan::initialization::context::{VulkanError, VulkanResult};
use crate::render::backends::vulkan::resources::binding::BufferResource;
use crate::render::backends::vulkan::resources::descriptor_set::{DescriptorBindingLayer, DescriptorDevice, LayerState};

/// Everything a render object needs from the GPU
pub trait RenderDevice: DescriptorDevice + PipelineDevice + CommandRecorder {}

impl<T: DescriptorDevice + PipelineDevice + CommandRecorder + ?Sized> RenderDevice for T {}

/// What a model receives when asked to draw
#[derive(Debug, Clone, Copy)]
pub struct ModelDrawArgs<'a> {
    /// Frame-in-flight index, selects the descriptor set copy
    pub current_frame: usize,
    /// Layout of the bound pipeline
    pub pipeline_layout: vk::PipelineLayout,
    /// Descriptor set copies, one per frame in flight
    pub sets: &'a [vk::DescriptorSet],
    /// Combined view and projection matrix
    pub view_projection: &'a Mat4,
    /// Debug views of this call
    pub view: ViewFlags,
    /// Seconds since start
    pub time: f32,
}

impl ModelDrawArgs<'_> {
    /// Set copy for the current frame
    pub fn current_set(&self) -> Option<vk::DescriptorSet> {
        self.sets.get(self.current_frame).copied()
    }
}

/// Externally owned geometry drawn by render objects
pub trait Model<D: RenderDevice> {
    /// Declare the bindings this model's shaders read
    fn add_set_bindings(&self, layer: &mut DescriptorBindingLayer<D>) -> VulkanResult<()>;

    /// Record this model's draw commands
    fn draw(&self, device: &D, command_buffer: vk::CommandBuffer, args: &ModelDrawArgs<'_>);
}

impl<D: RenderDevice, M: Model<D> + ?Sized> Model<D> for Box<M> {
    fn add_set_bindings(&self, layer: &mut DescriptorBindingLayer<D>) -> VulkanResult<()> {
        (**self).add_set_bindings(layer)
    }

    fn draw(&self, device: &D, command_buffer: vk::CommandBuffer, args: &ModelDrawArgs<'_>) {
        (**self).draw(device, command_buffer, args);
    }
}

/// Models drawn with one descriptor layer and one pipeline pair
pub struct RenderObject<D: RenderDevice> {
    // Pipelines drop before the set layouts they were built against
    pipeline: Option<Pipeline<D>>,
    mesh_view_pipeline: Option<Pipeline<D>>,
    descriptors: DescriptorBindingLayer<D>,
    model_indices: Vec<usize>,
    device: Arc<D>,
}

impl<D: RenderDevice> RenderObject<D> {
    /// Create an empty render object
    pub fn new(device: Arc<D>) -> Self {
        Self {
            descriptors: DescriptorBindingLayer::new(Arc::clone(&device)),
            device,
            model_indices: Vec::new(),
            pipeline: None,
            mesh_view_pipeline: None,
        }
    }

    /// Reference model `index` of the external model table
    pub fn add_model(&mut self, index: usize) {
        self.model_indices.push(index);
    }

    /// Declare one per-frame uniform buffer for each frame in flight
    pub fn add_frame_uniforms<B: BufferResource>(&mut self, config: &RendererConfig, buffers: &[B]) -> VulkanResult<()> {
        self.descriptors.add_uniform_buffer(config.frames_in_flight, buffers)
    }

    /// Let every referenced model declare its bindings, in registration order
    pub fn add_bindings<M: Model<D>>(&mut self, models: &[M]) -> VulkanResult<()> {
        for &index in &self.model_indices {
            let model = models
                .get(index)
                .ok_or(VulkanError::ResourceNotFound { id: index as u64 })?;
            model.add_set_bindings(&mut self.descriptors)?;
        }
        Ok(())
    }

    /// Realize the descriptor layer and build both pipelines
    ///
    /// Does nothing when no model is referenced. If a pipeline fails, every
    /// object created here is released and construction may be retried.
    pub fn construct(
        &mut self,
        render_pass: vk::RenderPass,
        shaders: &[ShaderStage],
        polygon_mode: vk::PolygonMode,
    ) -> VulkanResult<()> {
        if self.model_indices.is_empty() {
            log::debug!("[RENDER_OBJECT] No models registered, skipping construction");
            return Ok(());
        }

        self.descriptors.construct()?;
        let set_layout = self.descriptors.layout(0)?;

        let solid = PipelineDesc {
            render_pass,
            set_layout,
            shaders,
            polygon_mode,
        };
        let wireframe = PipelineDesc {
            polygon_mode: vk::PolygonMode::LINE,
            ..solid
        };
        let pipelines = Pipeline::new(Arc::clone(&self.device), &solid).and_then(|solid_pipeline| {
            Pipeline::new(Arc::clone(&self.device), &wireframe).map(|mesh_view| (solid_pipeline, mesh_view))
        });
        let (pipeline, mesh_view_pipeline) = match pipelines {
            Ok(pipelines) => pipelines,
            Err(e) => {
                log::error!("[RENDER_OBJECT] Pipeline creation failed: {e}");
                self.descriptors.unrealize();
                return Err(e);
            }
        };
        self.pipeline = Some(pipeline);
        self.mesh_view_pipeline = Some(mesh_view_pipeline);

        log::info!(
            "[RENDER_OBJECT] Constructed with {} models and {} set copies",
            self.model_indices.len(),
            self.descriptors.set_copies()
        );
        Ok(())
    }

    /// Record draws for every referenced model
    ///
    /// Binds the mesh view pipeline when `info` asks for it, the solid one
    /// otherwise. Does nothing when no model is referenced.
    pub fn draw<M: Model<D>>(
        &self,
        command_buffer: vk::CommandBuffer,
        info: &DrawInfo,
        models: &[M],
    ) -> VulkanResult<()> {
        if self.model_indices.is_empty() {
            return Ok(());
        }

        let (Some(pipeline), Some(mesh_view_pipeline)) = (&self.pipeline, &self.mesh_view_pipeline) else {
            return Err(VulkanError::invalid("Render object drawn before construction"));
        };
        let sets = self.descriptors.sets();
        if info.current_frame >= sets.len() {
            return Err(VulkanError::invalid(format!(
                "Frame {} has no descriptor set, only {} copies exist",
                info.current_frame,
                sets.len()
            )));
        }
        let drawn = self
            .model_indices
            .iter()
            .map(|&index| models.get(index).ok_or(VulkanError::ResourceNotFound { id: index as u64 }))
            .collect::<VulkanResult<Vec<_>>>()?;

        let bound = if info.mesh_view() {
            mesh_view_pipeline
        } else {
            pipeline
        };
        self.device.bind_pipeline(command_buffer, bound.handle());

        let args = ModelDrawArgs {
            current_frame: info.current_frame,
            pipeline_layout: bound.layout(),
            sets,
            view_projection: &info.view_projection,
            view: info.view,
            time: info.time,
        };
        for model in drawn {
            model.draw(&self.device, command_buffer, &args);
        }
        Ok(())
    }

    /// Release both pipelines and the descriptor layer
    pub fn self_destruct(&mut self) -> VulkanResult<()> {
        self.pipeline = None;
        self.mesh_view_pipeline = None;
        match self.descriptors.state() {
            LayerState::Building => Ok(()),
            LayerState::Realized | LayerState::Destroyed => self.descriptors.self_destruct(),
        }
    }

    /// Shared descriptor layer
    pub fn descriptors(&self) -> &DescriptorBindingLayer<D> {
        &self.descriptors
    }

    /// Shared descriptor layer, for declaring the per-frame uniform buffer
    pub fn descriptors_mut(&mut self) -> &mut DescriptorBindingLayer<D> {
        &mut self.descriptors
    }

    /// Referenced model indices in registration order
    pub fn model_indices(&self) -> &[usize] {
        &self.model_indices
    }

    /// Solid pipeline, once constructed
    pub fn pipeline(&self) -> Option<&Pipeline<D>> {
        self.pipeline.as_ref()
    }

    /// Wireframe pipeline, once constructed
    pub fn mesh_view_pipeline(&self) -> Option<&Pipeline<D>> {
        self.mesh_view_pipeline.as_ref()
    }
}
