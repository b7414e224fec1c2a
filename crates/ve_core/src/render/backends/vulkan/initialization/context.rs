//! Vulkan context management
//!
//! Error types shared by the Vulkan backend, and the logical device created
//! from a [`SelectedDevice`].

use ash::{vk, Device};
use std::ffi::CString;
use std::path::{Path, PathBuf};
use thiserror::Error;

use super::instance::AshInstance;
use super::physical_device::SelectedDevice;
use super::queue_family::{QueueFamilyIndices, QueueRole};
use crate::render::backends::vulkan::resources::descriptor_set::LayerState;

/// Vulkan-specific error types
#[derive(Error, Debug)]
pub enum VulkanError {
    /// General Vulkan API error with result code
    #[error("Vulkan API error: {0:?}")]
    Api(vk::Result),

    /// Resource with specified ID could not be found
    #[error("Resource not found: {id}")]
    ResourceNotFound {
        /// The unique identifier of the resource
        id: u64,
    },

    /// Invalid operation attempted
    #[error("Invalid operation: {reason}")]
    InvalidOperation {
        /// Description of why the operation is invalid
        reason: String,
    },

    /// Vulkan context initialization failed
    #[error("Initialization failed: {0}")]
    InitializationFailed(String),

    /// No physical device passed the suitability checks
    #[error("No suitable GPU found")]
    NoSuitableDevice,

    /// A mandatory queue role has no capable queue family
    #[error("No queue family satisfies the {role} role")]
    QueueFamilyUnsatisfied {
        /// The role left unassigned
        role: QueueRole,
    },

    /// Descriptor layer operation attempted in the wrong lifecycle state
    #[error("Cannot {operation} while the descriptor layer is {state}")]
    InvalidState {
        /// The rejected operation
        operation: &'static str,
        /// State the layer was in
        state: LayerState,
    },

    /// Operator input/output failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl VulkanError {
    pub(crate) fn invalid(reason: impl Into<String>) -> Self {
        Self::InvalidOperation { reason: reason.into() }
    }
}

/// Result type for Vulkan operations
pub type VulkanResult<T> = Result<T, VulkanError>;

/// Logical device wrapper with RAII cleanup
///
/// Creates one queue per distinct family named by the selection result. The
/// present queue only exists when the selector found a present-capable family.
pub struct LogicalDevice {
    /// Vulkan logical device handle
    pub device: Device,
    /// Graphics operations queue
    pub graphics_queue: vk::Queue,
    /// Compute operations queue
    pub compute_queue: vk::Queue,
    /// Transfer operations queue
    pub transfer_queue: vk::Queue,
    /// Surface presentation queue, absent for surface-less devices
    pub present_queue: Option<vk::Queue>,
    queue_families: QueueFamilyIndices,
    shader_dir: PathBuf,
}

impl LogicalDevice {
    /// Create a new logical device with the selected queues and extensions
    pub fn new(instance: &AshInstance, selected: &SelectedDevice) -> VulkanResult<Self> {
        let queue_families = selected.queue_families();
        let priorities = [1.0_f32];
        let queue_infos: Vec<vk::DeviceQueueCreateInfo> = queue_families
            .unique_families()
            .into_iter()
            .map(|family| {
                vk::DeviceQueueCreateInfo::builder()
                    .queue_family_index(family)
                    .queue_priorities(&priorities)
                    .build()
            })
            .collect();

        let extension_names = selected
            .extensions()
            .iter()
            .map(|name| CString::new(name.as_str()))
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| VulkanError::InitializationFailed(format!("Invalid extension name: {e}")))?;
        let extension_ptrs: Vec<*const std::os::raw::c_char> =
            extension_names.iter().map(|name| name.as_ptr()).collect();

        // Wireframe pipelines need non-solid fill; only request it when supported
        let supported = unsafe {
            instance.instance.get_physical_device_features(selected.handle())
        };
        let device_features = vk::PhysicalDeviceFeatures::builder()
            .fill_mode_non_solid(supported.fill_mode_non_solid == vk::TRUE)
            .sampler_anisotropy(supported.sampler_anisotropy == vk::TRUE)
            .build();
        if supported.fill_mode_non_solid != vk::TRUE {
            log::warn!("[DEVICE] fillModeNonSolid unsupported, mesh view pipelines will fail");
        }

        let create_info = vk::DeviceCreateInfo::builder()
            .queue_create_infos(&queue_infos)
            .enabled_extension_names(&extension_ptrs)
            .enabled_features(&device_features);

        let device = unsafe {
            instance
                .instance
                .create_device(selected.handle(), &create_info, None)
                .map_err(VulkanError::Api)?
        };

        let (graphics_queue, compute_queue, transfer_queue, present_queue) = unsafe {
            (
                device.get_device_queue(queue_families.graphics, 0),
                device.get_device_queue(queue_families.compute, 0),
                device.get_device_queue(queue_families.transfer, 0),
                queue_families.present.map(|family| device.get_device_queue(family, 0)),
            )
        };

        log::info!(
            "[DEVICE] Logical device created on {} with {} queue families",
            selected.name(),
            queue_infos.len()
        );

        Ok(Self {
            device,
            graphics_queue,
            compute_queue,
            transfer_queue,
            present_queue,
            queue_families,
            shader_dir: PathBuf::from("target/shaders"),
        })
    }

    /// Look up pipeline shaders under `dir`
    pub fn with_shader_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.shader_dir = dir.into();
        self
    }

    /// Directory holding compiled shaders
    pub fn shader_dir(&self) -> &Path {
        &self.shader_dir
    }

    /// Queue family indices the queues were created from
    pub fn queue_families(&self) -> QueueFamilyIndices {
        self.queue_families
    }

    /// Get the raw Device handle
    pub fn raw(&self) -> &Device {
        &self.device
    }
}

impl Drop for LogicalDevice {
    fn drop(&mut self) {
        unsafe {
            // Ensure device is idle before destruction
            let _ = self.device.device_wait_idle();
            self.device.destroy_device(None);
        }
    }
}
