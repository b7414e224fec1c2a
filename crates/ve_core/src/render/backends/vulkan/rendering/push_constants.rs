//! Push constant block shared by the render object shaders
//!
//! The vertex stage reads the view-projection matrix and `mvp_idx`; the
//! fragment stage reads everything from `mat_idx` on. Booleans are widened
//! to `u32` to match GLSL `bool`.

use ash::vk;
use bytemuck::{Pod, Zeroable};
use std::mem::{offset_of, size_of};

use super::draw_info::ViewFlags;
use super::render_object::ModelDrawArgs;
use crate::foundation::math::{to_gpu_matrix, Mat4};

/// Per-draw push constants
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PushConstants {
    /// Combined view and projection matrix, column-major
    pub view_projection: [[f32; 4]; 4],
    /// Index of the object's model matrix in the uniform buffer
    pub mvp_idx: u32,
    /// Material index, negative for none
    pub mat_idx: i32,
    /// Seconds since start
    pub time: f32,
    /// Non-zero to shade with normals
    pub normal_view: u32,
    /// Non-zero to shade with texture coordinates
    pub tex_view: u32,
}

// Only 4-byte fields, no padding under repr(C)
unsafe impl Pod for PushConstants {}
unsafe impl Zeroable for PushConstants {}

impl PushConstants {
    /// Offset of the fragment stage part
    pub const FRAGMENT_OFFSET: u32 = offset_of!(PushConstants, mat_idx) as u32;
    /// Size of the vertex stage part
    pub const VERTEX_SIZE: u32 = Self::FRAGMENT_OFFSET;
    /// Size of the fragment stage part
    pub const FRAGMENT_SIZE: u32 = size_of::<PushConstants>() as u32 - Self::FRAGMENT_OFFSET;

    /// Constants for one model
    pub fn new(view_projection: &Mat4, mvp_idx: u32, mat_idx: i32, time: f32, view: ViewFlags) -> Self {
        Self {
            view_projection: to_gpu_matrix(view_projection),
            mvp_idx,
            mat_idx,
            time,
            normal_view: u32::from(view.contains(ViewFlags::NORMAL)),
            tex_view: u32::from(view.contains(ViewFlags::TEXTURE)),
        }
    }

    /// Constants for one model drawn with `args`
    pub fn from_draw_args(args: &ModelDrawArgs<'_>, mvp_idx: u32, mat_idx: i32) -> Self {
        Self::new(args.view_projection, mvp_idx, mat_idx, args.time, args.view)
    }

    /// Ranges for the pipeline layout
    pub fn ranges() -> [vk::PushConstantRange; 2] {
        [
            vk::PushConstantRange {
                stage_flags: vk::ShaderStageFlags::VERTEX,
                offset: 0,
                size: Self::VERTEX_SIZE,
            },
            vk::PushConstantRange {
                stage_flags: vk::ShaderStageFlags::FRAGMENT,
                offset: Self::FRAGMENT_OFFSET,
                size: Self::FRAGMENT_SIZE,
            },
        ]
    }

    /// Bytes of the vertex stage part
    pub fn vertex_bytes(&self) -> &[u8] {
        &bytemuck::bytes_of(self)[..Self::VERTEX_SIZE as usize]
    }

    /// Bytes of the fragment stage part
    pub fn fragment_bytes(&self) -> &[u8] {
        &bytemuck::bytes_of(self)[Self::FRAGMENT_OFFSET as usize..]
    }
}
