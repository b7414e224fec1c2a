//! Physical device selection
//!
//! Walks every enumerated GPU, filters out the ones that cannot run the
//! renderer, lets a [`SelectionStrategy`] choose when several remain, and
//! assigns queue families on the winner.

use ash::vk;

use super::context::{VulkanError, VulkanResult};
use super::extensions::{ExtensionAvailability, ExtensionsHandler};
use super::instance::Instance;
use super::queue_family::{assign_queue_families, QueueFamilyIndices};
use super::selection::{SelectionStrategy, Suitability, SuitableDevice};
use crate::core::config::{DeviceSelectionConfig, SWAPCHAIN_EXTENSION};

/// Chooses the GPU the renderer runs on
#[derive(Debug, Clone)]
pub struct DeviceSelector {
    extensions: ExtensionsHandler,
}

impl DeviceSelector {
    /// Request the extensions named in `config`
    pub fn new(config: &DeviceSelectionConfig) -> Self {
        let mut extensions = ExtensionsHandler::new();
        extensions.add_extensions(&config.required_extensions, true);
        extensions.add_extensions(&config.optional_extensions, false);
        Self::with_extensions(extensions)
    }

    /// Use a prepared extension handler
    pub fn with_extensions(extensions: ExtensionsHandler) -> Self {
        Self { extensions }
    }

    /// Requested extensions
    pub fn extensions(&self) -> &ExtensionsHandler {
        &self.extensions
    }

    /// Select one device and assign its queue families
    ///
    /// Fails with [`VulkanError::NoSuitableDevice`] when no discrete GPU
    /// passes the checks, and with [`VulkanError::QueueFamilyUnsatisfied`]
    /// when the winner lacks a graphics, compute or transfer family.
    pub fn select<I, S>(mut self, instance: &I, strategy: &mut S) -> VulkanResult<SelectedDevice>
    where
        I: Instance + ?Sized,
        S: SelectionStrategy + ?Sized,
    {
        let devices = instance.physical_devices()?;
        let surface = instance.surface();
        let mut candidates = Vec::new();

        for (index, &device) in devices.iter().enumerate() {
            let properties = instance.device_properties(device);
            let suitability = self.evaluate(instance, device, surface)?;
            strategy.report(index, &properties.name, &suitability)?;

            if let Suitability::Suitable { missing_optional } = suitability {
                if properties.device_type == vk::PhysicalDeviceType::DISCRETE_GPU {
                    candidates.push(SuitableDevice {
                        index,
                        name: properties.name,
                        missing_optional,
                    });
                }
            }
        }

        let index = match candidates.as_slice() {
            [] => return Err(VulkanError::NoSuitableDevice),
            [only] => only.index,
            _ => {
                let choice = strategy.select(&candidates)?;
                if !candidates.iter().any(|c| c.index == choice) {
                    return Err(VulkanError::invalid(format!(
                        "Device {choice} is not one of the suitable GPUs"
                    )));
                }
                choice
            }
        };

        let handle = devices[index];
        let name = instance.device_properties(handle).name;
        log::debug!("[DEVICE] Selected device {index}: {name}");

        let available = instance.device_extension_names(handle)?;
        self.extensions.check_extension_availability(&available);
        self.extensions.remove_missing_extensions();
        let missing_extensions = self.extensions.missing_extensions().to_vec();
        for missing in &missing_extensions {
            log::warn!("[DEVICE] Optional extension {missing} is unavailable on {name}");
        }

        let families = instance.queue_families(handle);
        let present_support = (0..families.len() as u32)
            .map(|family| instance.surface_support(handle, family, surface))
            .collect::<VulkanResult<Vec<bool>>>()?;
        let queue_families = assign_queue_families(&families, &present_support)?;
        log::debug!("[DEVICE] Queue families: {queue_families}");
        if queue_families.present.is_none() {
            log::warn!("[DEVICE] No queue family can present to the surface");
        }

        Ok(SelectedDevice {
            handle,
            index,
            name,
            queue_families,
            extensions: self.extensions.extensions().to_vec(),
            missing_extensions,
        })
    }

    fn evaluate<I: Instance + ?Sized>(
        &mut self,
        instance: &I,
        device: vk::PhysicalDevice,
        surface: vk::SurfaceKHR,
    ) -> VulkanResult<Suitability> {
        let available = instance.device_extension_names(device)?;
        let missing_optional = match self.extensions.check_extension_availability(&available) {
            ExtensionAvailability::Available { missing_optional } => missing_optional,
            ExtensionAvailability::MissingRequired { missing } => {
                log::debug!("[DEVICE] Missing required extensions: {}", missing.join(", "));
                return Ok(Suitability::NotSuitable);
            }
        };

        if self.extensions.find_extension(SWAPCHAIN_EXTENSION) {
            let formats = instance.surface_formats(device, surface)?;
            let modes = instance.present_modes(device, surface)?;
            if formats.is_empty() || modes.is_empty() {
                return Ok(Suitability::NotSuitable);
            }
        }

        Ok(Suitability::Suitable { missing_optional })
    }
}

/// Outcome of device selection
#[derive(Debug, Clone)]
pub struct SelectedDevice {
    handle: vk::PhysicalDevice,
    index: usize,
    name: String,
    queue_families: QueueFamilyIndices,
    extensions: Vec<String>,
    missing_extensions: Vec<String>,
}

impl SelectedDevice {
    /// Physical device handle
    pub fn handle(&self) -> vk::PhysicalDevice {
        self.handle
    }

    /// Index in the instance's enumeration order
    pub fn index(&self) -> usize {
        self.index
    }

    /// Driver-reported device name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Queue family per role
    pub fn queue_families(&self) -> QueueFamilyIndices {
        self.queue_families
    }

    /// Extensions to enable on the logical device
    pub fn extensions(&self) -> &[String] {
        &self.extensions
    }

    /// Optional extensions the device lacks
    pub fn missing_extensions(&self) -> &[String] {
        &self.missing_extensions
    }

    /// Surface formats supported for `surface`
    pub fn surface_formats<I: Instance + ?Sized>(
        &self,
        instance: &I,
        surface: vk::SurfaceKHR,
    ) -> VulkanResult<Vec<vk::SurfaceFormatKHR>> {
        instance.surface_formats(self.handle, surface)
    }

    /// Present modes supported for `surface`
    pub fn surface_present_modes<I: Instance + ?Sized>(
        &self,
        instance: &I,
        surface: vk::SurfaceKHR,
    ) -> VulkanResult<Vec<vk::PresentModeKHR>> {
        instance.present_modes(self.handle, surface)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::backends::vulkan::testing::{MockGpu, MockInstance, ScriptedStrategy};

    fn selector() -> DeviceSelector {
        DeviceSelector::new(&DeviceSelectionConfig::default())
    }

    #[test]
    fn test_no_discrete_gpu_is_fatal() {
        let instance = MockInstance::new(vec![
            MockGpu::discrete("Missing swapchain").with_extensions(&[]),
            MockGpu::integrated("Integrated"),
        ]);
        let mut strategy = ScriptedStrategy::new(&[]);
        let err = selector().select(&instance, &mut strategy).unwrap_err();

        assert!(matches!(err, VulkanError::NoSuitableDevice));
        assert_eq!(strategy.select_calls, 0);
        assert_eq!(
            strategy.reports,
            vec![
                (0, Suitability::NotSuitable),
                (1, Suitability::Suitable { missing_optional: 3 }),
            ]
        );
    }

    #[test]
    fn test_single_candidate_skips_strategy() {
        let instance = MockInstance::new(vec![
            MockGpu::integrated("Integrated"),
            MockGpu::discrete("Discrete"),
        ]);
        let mut strategy = ScriptedStrategy::new(&[]);
        let selected = selector().select(&instance, &mut strategy).unwrap();

        assert_eq!(strategy.select_calls, 0);
        assert_eq!(selected.index(), 1);
        assert_eq!(selected.name(), "Discrete");
        assert_eq!(selected.extensions(), [SWAPCHAIN_EXTENSION.to_string()]);
        assert_eq!(selected.missing_extensions().len(), 3);
    }

    #[test]
    fn test_several_candidates_consult_strategy() {
        let instance = MockInstance::new(vec![
            MockGpu::discrete("First"),
            MockGpu::integrated("Integrated"),
            MockGpu::discrete("Second").with_extensions(&[
                "VK_KHR_swapchain",
                "VK_KHR_ray_query",
                "VK_KHR_acceleration_structure",
                "VK_KHR_deferred_host_operations",
            ]),
        ]);
        let mut strategy = ScriptedStrategy::new(&[2]);
        let selected = selector().select(&instance, &mut strategy).unwrap();

        assert_eq!(strategy.select_calls, 1);
        assert_eq!(strategy.candidates, vec![0, 2]);
        assert_eq!(selected.index(), 2);
        assert_eq!(selected.extensions().len(), 4);
        assert!(selected.missing_extensions().is_empty());
    }

    #[test]
    fn test_strategy_choice_must_qualify() {
        let instance = MockInstance::new(vec![MockGpu::discrete("A"), MockGpu::discrete("B")]);
        let mut strategy = ScriptedStrategy::new(&[5]);
        let err = selector().select(&instance, &mut strategy).unwrap_err();
        assert!(matches!(err, VulkanError::InvalidOperation { .. }));
    }

    #[test]
    fn test_swapchain_needs_surface_support() {
        let instance = MockInstance::new(vec![MockGpu::discrete("No formats").with_surface_support(false)]);
        let mut strategy = ScriptedStrategy::new(&[]);
        let err = selector().select(&instance, &mut strategy).unwrap_err();
        assert!(matches!(err, VulkanError::NoSuitableDevice));
        assert_eq!(strategy.reports, vec![(0, Suitability::NotSuitable)]);
    }

    #[test]
    fn test_headless_selection_leaves_present_unassigned() {
        let instance = MockInstance::new(vec![MockGpu::discrete("Offscreen")
            .with_extensions(&[])
            .with_surface_support(false)]);
        let mut strategy = ScriptedStrategy::new(&[]);
        let selected = DeviceSelector::new(&DeviceSelectionConfig::headless())
            .select(&instance, &mut strategy)
            .unwrap();

        assert!(selected.extensions().is_empty());
        assert_eq!(selected.queue_families().present, None);
        assert_eq!(selected.queue_families().graphics, 0);
        assert_eq!(selected.queue_families().transfer, 1);
    }

    #[test]
    fn test_selected_device_exposes_surface_queries() {
        let instance = MockInstance::new(vec![MockGpu::discrete("Only")]);
        let mut strategy = ScriptedStrategy::new(&[]);
        let selected = selector().select(&instance, &mut strategy).unwrap();

        assert_eq!(selected.queue_families().present, Some(0));
        let formats = selected.surface_formats(&instance, instance.surface()).unwrap();
        let modes = selected.surface_present_modes(&instance, instance.surface()).unwrap();
        assert_eq!(formats.len(), 1);
        assert_eq!(modes, vec![vk::PresentModeKHR::FIFO]);
    }
}
