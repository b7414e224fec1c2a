//! Vulkan initialization: instance access, device selection, logical device

pub mod context;
pub mod extensions;
pub mod instance;
pub mod physical_device;
pub mod queue_family;
pub mod selection;

pub use context::{LogicalDevice, VulkanError, VulkanResult};
pub use extensions::{ExtensionAvailability, ExtensionsHandler};
pub use instance::{AshInstance, DeviceProperties, Instance};
pub use physical_device::{DeviceSelector, SelectedDevice};
pub use queue_family::{QueueFamilyIndices, QueueRole};
pub use selection::{InteractivePrompt, PreferredDevice, SelectionStrategy, Suitability, SuitableDevice};
