//! Vertex format and its Vulkan input description

use ash::vk;
use bytemuck::{Pod, Zeroable};
use std::mem::{offset_of, size_of};

/// Vertex consumed by the render object pipelines
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Vertex {
    /// Object-space position
    pub pos: [f32; 3],
    /// Object-space normal
    pub normal: [f32; 3],
    /// Vertex color, RGBA
    pub color: [f32; 4],
    /// Texture coordinates
    pub tex: [f32; 2],
}

// Only f32 fields, no padding under repr(C)
unsafe impl Pod for Vertex {}
unsafe impl Zeroable for Vertex {}

impl Vertex {
    /// Binding 0, advancing per vertex
    pub fn binding_description() -> vk::VertexInputBindingDescription {
        vk::VertexInputBindingDescription {
            binding: 0,
            stride: size_of::<Self>() as u32,
            input_rate: vk::VertexInputRate::VERTEX,
        }
    }

    /// Locations 0-3: pos, normal, color, tex
    pub fn attribute_descriptions() -> [vk::VertexInputAttributeDescription; 4] {
        let attribute = |location, format, offset: usize| vk::VertexInputAttributeDescription {
            binding: 0,
            location,
            format,
            offset: offset as u32,
        };
        [
            attribute(0, vk::Format::R32G32B32_SFLOAT, offset_of!(Self, pos)),
            attribute(1, vk::Format::R32G32B32_SFLOAT, offset_of!(Self, normal)),
            attribute(2, vk::Format::R32G32B32A32_SFLOAT, offset_of!(Self, color)),
            attribute(3, vk::Format::R32G32_SFLOAT, offset_of!(Self, tex)),
        ]
    }
}
