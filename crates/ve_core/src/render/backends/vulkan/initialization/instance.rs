//! Vulkan instance access for device selection
//!
//! The [`Instance`] trait is everything the device selector asks of the
//! driver. [`AshInstance`] answers through `ash`; tests answer with canned
//! device descriptions.

use ash::extensions::khr::Surface;
use ash::{vk, Entry};
use std::ffi::{CStr, CString};

use super::context::{VulkanError, VulkanResult};

/// Properties of a physical device relevant to selection
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceProperties {
    /// Driver-reported device name
    pub name: String,
    /// Discrete, integrated, virtual, CPU or other
    pub device_type: vk::PhysicalDeviceType,
}

/// Physical device enumeration and capability queries
pub trait Instance {
    /// Physical devices in driver enumeration order
    fn physical_devices(&self) -> VulkanResult<Vec<vk::PhysicalDevice>>;

    /// Surface used for presentation checks, null when rendering offscreen
    fn surface(&self) -> vk::SurfaceKHR;

    /// Name and type of a device
    fn device_properties(&self, device: vk::PhysicalDevice) -> DeviceProperties;

    /// Names of the device extensions a device supports
    fn device_extension_names(&self, device: vk::PhysicalDevice) -> VulkanResult<Vec<String>>;

    /// Queue family properties in family index order
    fn queue_families(&self, device: vk::PhysicalDevice) -> Vec<vk::QueueFamilyProperties>;

    /// Whether queue family `family_index` can present to `surface`
    fn surface_support(
        &self,
        device: vk::PhysicalDevice,
        family_index: u32,
        surface: vk::SurfaceKHR,
    ) -> VulkanResult<bool>;

    /// Surface formats `device` reports for `surface`
    fn surface_formats(
        &self,
        device: vk::PhysicalDevice,
        surface: vk::SurfaceKHR,
    ) -> VulkanResult<Vec<vk::SurfaceFormatKHR>>;

    /// Present modes `device` reports for `surface`
    fn present_modes(
        &self,
        device: vk::PhysicalDevice,
        surface: vk::SurfaceKHR,
    ) -> VulkanResult<Vec<vk::PresentModeKHR>>;
}

/// Vulkan instance wrapper with RAII cleanup
pub struct AshInstance {
    /// Vulkan entry point
    pub entry: Entry,
    /// Vulkan instance handle
    pub instance: ash::Instance,
    surface_loader: Surface,
    surface: vk::SurfaceKHR,
}

impl AshInstance {
    /// Create an instance without any window-system extensions
    ///
    /// The surface is null, so no queue family reports present support and
    /// swapchain checks fail.
    pub fn headless(app_name: &str) -> VulkanResult<Self> {
        let entry = unsafe { Entry::load() }
            .map_err(|e| VulkanError::InitializationFailed(format!("Failed to load Vulkan: {e:?}")))?;

        let app_name = CString::new(app_name)
            .map_err(|e| VulkanError::InitializationFailed(format!("Invalid application name: {e}")))?;
        let engine_name = CString::new("ve")
            .map_err(|e| VulkanError::InitializationFailed(e.to_string()))?;
        let app_info = vk::ApplicationInfo::builder()
            .application_name(&app_name)
            .application_version(vk::make_api_version(0, 1, 0, 0))
            .engine_name(&engine_name)
            .engine_version(vk::make_api_version(0, 1, 0, 0))
            .api_version(vk::API_VERSION_1_2);

        let create_info = vk::InstanceCreateInfo::builder().application_info(&app_info);
        let instance = unsafe {
            entry.create_instance(&create_info, None).map_err(VulkanError::Api)?
        };

        Ok(Self::from_raw(entry, instance, vk::SurfaceKHR::null()))
    }

    /// Take ownership of an instance and surface created by the windowing layer
    ///
    /// A non-null `surface` requires `VK_KHR_surface` to be enabled on
    /// `instance`.
    pub fn from_raw(entry: Entry, instance: ash::Instance, surface: vk::SurfaceKHR) -> Self {
        let surface_loader = Surface::new(&entry, &instance);
        Self {
            entry,
            instance,
            surface_loader,
            surface,
        }
    }

    fn has_surface(&self, surface: vk::SurfaceKHR) -> bool {
        surface != vk::SurfaceKHR::null()
    }
}

impl Instance for AshInstance {
    fn physical_devices(&self) -> VulkanResult<Vec<vk::PhysicalDevice>> {
        unsafe { self.instance.enumerate_physical_devices() }.map_err(VulkanError::Api)
    }

    fn surface(&self) -> vk::SurfaceKHR {
        self.surface
    }

    fn device_properties(&self, device: vk::PhysicalDevice) -> DeviceProperties {
        let properties = unsafe { self.instance.get_physical_device_properties(device) };
        let name = unsafe { CStr::from_ptr(properties.device_name.as_ptr()) }
            .to_string_lossy()
            .into_owned();
        DeviceProperties {
            name,
            device_type: properties.device_type,
        }
    }

    fn device_extension_names(&self, device: vk::PhysicalDevice) -> VulkanResult<Vec<String>> {
        let extensions = unsafe { self.instance.enumerate_device_extension_properties(device) }
            .map_err(VulkanError::Api)?;
        Ok(extensions
            .iter()
            .map(|ext| {
                unsafe { CStr::from_ptr(ext.extension_name.as_ptr()) }
                    .to_string_lossy()
                    .into_owned()
            })
            .collect())
    }

    fn queue_families(&self, device: vk::PhysicalDevice) -> Vec<vk::QueueFamilyProperties> {
        unsafe { self.instance.get_physical_device_queue_family_properties(device) }
    }

    fn surface_support(
        &self,
        device: vk::PhysicalDevice,
        family_index: u32,
        surface: vk::SurfaceKHR,
    ) -> VulkanResult<bool> {
        if !self.has_surface(surface) {
            return Ok(false);
        }
        unsafe {
            self.surface_loader
                .get_physical_device_surface_support(device, family_index, surface)
        }
        .map_err(VulkanError::Api)
    }

    fn surface_formats(
        &self,
        device: vk::PhysicalDevice,
        surface: vk::SurfaceKHR,
    ) -> VulkanResult<Vec<vk::SurfaceFormatKHR>> {
        if !self.has_surface(surface) {
            return Ok(Vec::new());
        }
        unsafe {
            self.surface_loader
                .get_physical_device_surface_formats(device, surface)
        }
        .map_err(VulkanError::Api)
    }

    fn present_modes(
        &self,
        device: vk::PhysicalDevice,
        surface: vk::SurfaceKHR,
    ) -> VulkanResult<Vec<vk::PresentModeKHR>> {
        if !self.has_surface(surface) {
            return Ok(Vec::new());
        }
        unsafe {
            self.surface_loader
                .get_physical_device_surface_present_modes(device, surface)
        }
        .map_err(VulkanError::Api)
    }
}

impl Drop for AshInstance {
    fn drop(&mut self) {
        unsafe {
            if self.has_surface(self.surface) {
                self.surface_loader.destroy_surface(self.surface, None);
            }
            self.instance.destroy_instance(None);
        }
    }
}
