//! Vulkan backend implementation
//!
//! Organized into initialization, resources and rendering modules. Every GPU
//! call goes through a trait implemented by [`LogicalDevice`], so the layers
//! above it can be exercised without a driver.

/// Vulkan initialization types (instance, device selection, logical device)
pub mod initialization;

/// Vulkan resource binding (binding declarations, descriptor sets)
pub mod resources;

/// Vulkan rendering operations (pipelines, commands, render objects)
pub mod rendering;

#[cfg(test)]
pub(crate) mod testing;

// Re-export core initialization types
pub use initialization::{
    AshInstance, DeviceSelector, InteractivePrompt, LogicalDevice, PreferredDevice, QueueFamilyIndices,
    SelectedDevice, SelectionStrategy, VulkanError, VulkanResult,
};

// Re-export resource types
pub use resources::{BindingSharing, DescriptorBindingLayer, LayerState};

// Re-export rendering types
pub use rendering::{DrawInfo, MeshModel, Model, RenderObject, ShaderStage, ViewFlags};
