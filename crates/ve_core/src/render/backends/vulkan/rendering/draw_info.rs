//! Per-frame draw parameters

use bitflags::bitflags;

use crate::foundation::math::Mat4;

bitflags! {
    /// Debug visualizations toggled per frame
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct ViewFlags: u32 {
        /// Wireframe rendering through the mesh view pipeline
        const MESH = 1 << 0;
        /// Shade with normals
        const NORMAL = 1 << 1;
        /// Shade with texture coordinates
        const TEXTURE = 1 << 2;
    }
}

/// What a single [`draw`](super::render_object::RenderObject::draw) call renders
#[derive(Debug, Clone, PartialEq)]
pub struct DrawInfo {
    /// Frame-in-flight index selecting the descriptor set copy
    pub current_frame: usize,
    /// Debug visualizations for this call
    pub view: ViewFlags,
    /// Combined view and projection matrix
    pub view_projection: Mat4,
    /// Seconds since start
    pub time: f32,
    /// Seconds since the previous frame
    pub time_diff: f32,
    /// CPU frame time in milliseconds
    pub frametime: f32,
}

impl DrawInfo {
    /// Draw info for `current_frame` with no debug views
    pub fn new(current_frame: usize, view_projection: Mat4) -> Self {
        Self {
            current_frame,
            view: ViewFlags::empty(),
            view_projection,
            time: 0.0,
            time_diff: 0.000_001,
            frametime: 0.0,
        }
    }

    /// Replace the debug view flags
    pub fn with_view(mut self, view: ViewFlags) -> Self {
        self.view = view;
        self
    }

    /// Set the time values
    pub fn with_time(mut self, time: f32, time_diff: f32) -> Self {
        self.time = time;
        self.time_diff = time_diff;
        self
    }

    /// Whether the mesh view pipeline is requested
    pub fn mesh_view(&self) -> bool {
        self.view.contains(ViewFlags::MESH)
    }

    /// Whether normals are visualized
    pub fn normal_view(&self) -> bool {
        self.view.contains(ViewFlags::NORMAL)
    }

    /// Whether texture coordinates are visualized
    pub fn tex_view(&self) -> bool {
        self.view.contains(ViewFlags::TEXTURE)
    }
}

impl Default for DrawInfo {
    fn default() -> Self {
        Self::new(0, Mat4::identity())
    }
}
