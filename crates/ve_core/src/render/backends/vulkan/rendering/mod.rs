//! Vulkan rendering components
//!
//! Pipelines, command recording and the render objects built on them.

pub mod commands;
pub mod draw_info;
pub mod mesh;
pub mod pipeline;
pub mod push_constants;
pub mod render_object;
pub mod shader;
pub mod vertex_layout;

pub use commands::CommandRecorder;
pub use draw_info::{DrawInfo, ViewFlags};
pub use mesh::MeshModel;
pub use pipeline::{Pipeline, PipelineDesc, PipelineDevice, ShaderStage};
pub use push_constants::PushConstants;
pub use render_object::{Model, ModelDrawArgs, RenderDevice, RenderObject};
pub use shader::ShaderModule;
pub use vertex_layout::Vertex;
