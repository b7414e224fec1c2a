//! Vulkan resource binding
//!
//! Binding declarations and the descriptor layer that realizes them.

/// Binding declarations and resource traits
pub mod binding;

/// Descriptor set layouts, pool and per-frame sets
pub mod descriptor_set;

pub use binding::{Binding, BindingResource, BindingSharing, BufferRegion, BufferResource, ImageResource, ImageSampler};
pub use descriptor_set::{DescriptorBindingLayer, DescriptorDevice, DescriptorWrite, LayerState};
