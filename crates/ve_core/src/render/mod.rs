//! # Rendering
//!
//! GPU device negotiation and the descriptor/pipeline layer used to draw
//! models. Only a Vulkan backend exists.

/// Graphics backend implementations
pub mod backends;

pub use backends::vulkan;
