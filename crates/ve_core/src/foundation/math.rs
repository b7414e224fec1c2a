//! Math utilities and types
//!
//! Thin aliases over `nalgebra` for the matrices handed to shaders.

pub use nalgebra::{Matrix4, Vector2, Vector3, Vector4};

/// 2D vector type
pub type Vec2 = Vector2<f32>;

/// 3D vector type
pub type Vec3 = Vector3<f32>;

/// 4D vector type
pub type Vec4 = Vector4<f32>;

/// 4x4 matrix type
pub type Mat4 = Matrix4<f32>;

/// Column-major array form of a matrix, as laid out in GPU memory
pub fn to_gpu_matrix(matrix: &Mat4) -> [[f32; 4]; 4] {
    (*matrix).into()
}
