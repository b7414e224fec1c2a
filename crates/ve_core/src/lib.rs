//! # ve_core
//!
//! Vulkan device negotiation and descriptor binding core.
//!
//! - **Device selection**: picks a discrete GPU that supports the requested
//!   extensions, asking an operator when several qualify, and assigns queue
//!   families to the graphics, compute, transfer and present roles.
//! - **Descriptor binding**: declares shader bindings once and realizes them
//!   into one descriptor set per frame in flight.
//! - **Render objects**: groups models behind one descriptor layer and a
//!   solid/wireframe pipeline pair.
//!
//! ```rust,no_run
//! use ve_core::prelude::*;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = CoreConfig::headless();
//!     let instance = AshInstance::headless(&config.renderer.application_name)?;
//!     let mut strategy = PreferredDevice(config.device.preferred_device);
//!     let selected = DeviceSelector::new(&config.device).select(&instance, &mut strategy)?;
//!     let device = LogicalDevice::new(&instance, &selected)?;
//!     println!("{}", device.queue_families());
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions, clippy::similar_names, clippy::too_many_arguments)]

pub mod config;
pub mod core;
pub mod foundation;
pub mod render;

/// Common imports for library users
pub mod prelude {
    pub use crate::{
        config::{Config, ConfigError},
        core::config::{CoreConfig, DeviceSelectionConfig, RendererConfig},
        foundation::math::{Mat4, Vec3},
        render::vulkan::{
            initialization::{
                AshInstance, DeviceSelector, InteractivePrompt, LogicalDevice, PreferredDevice,
                QueueFamilyIndices, QueueRole, SelectedDevice, SelectionStrategy,
            },
            rendering::{DrawInfo, MeshModel, Model, RenderObject, ShaderStage, ViewFlags},
            resources::{BindingSharing, DescriptorBindingLayer, LayerState},
            VulkanError, VulkanResult,
        },
    };
}
