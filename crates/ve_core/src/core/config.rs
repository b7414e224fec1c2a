//! # Core Configuration
//!
//! Configuration for device negotiation and the descriptor/pipeline layer.
//! Every section has sensible defaults, so a config file only needs the
//! values it overrides.
//!
//! ```toml
//! log_level = "debug"
//!
//! [device]
//! required_extensions = ["VK_KHR_swapchain"]
//! preferred_device = 1
//!
//! [renderer]
//! frames_in_flight = 3
//! ```

use serde::{Serialize, Deserialize};

pub use crate::config::{Config, ConfigError};

/// Name of the swapchain device extension
pub const SWAPCHAIN_EXTENSION: &str = "VK_KHR_swapchain";

/// Ray tracing related extensions requested when available
pub const RAY_QUERY_EXTENSIONS: [&str; 3] = [
    "VK_KHR_ray_query",
    "VK_KHR_acceleration_structure",
    "VK_KHR_deferred_host_operations",
];

/// Upper bound on frames in flight
pub const MAX_FRAMES_IN_FLIGHT: usize = 8;

/// # Device Selection Configuration
///
/// Extension requirements used while scoring physical devices, and an
/// optional fixed choice for runs without an operator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeviceSelectionConfig {
    /// Extensions a device must support to qualify
    pub required_extensions: Vec<String>,
    /// Extensions enabled only when the chosen device supports them
    pub optional_extensions: Vec<String>,
    /// Physical device index to pick when several devices qualify
    pub preferred_device: Option<usize>,
}

impl DeviceSelectionConfig {
    /// Swapchain required, ray query extensions optional
    pub fn new() -> Self {
        Self {
            required_extensions: vec![SWAPCHAIN_EXTENSION.to_string()],
            optional_extensions: RAY_QUERY_EXTENSIONS.iter().map(ToString::to_string).collect(),
            preferred_device: None,
        }
    }

    /// Requirements for rendering without a surface
    ///
    /// The swapchain extension is not requested, so devices are not asked for
    /// surface formats or present modes.
    pub fn headless() -> Self {
        Self {
            required_extensions: Vec::new(),
            optional_extensions: RAY_QUERY_EXTENSIONS.iter().map(ToString::to_string).collect(),
            preferred_device: None,
        }
    }

    /// Pick `index` whenever several devices qualify
    pub fn with_preferred_device(mut self, index: usize) -> Self {
        self.preferred_device = Some(index);
        self
    }

    /// Add a required extension
    pub fn with_required_extension(mut self, name: impl Into<String>) -> Self {
        self.required_extensions.push(name.into());
        self
    }

    /// Add an optional extension
    pub fn with_optional_extension(mut self, name: impl Into<String>) -> Self {
        self.optional_extensions.push(name.into());
        self
    }
}

impl Default for DeviceSelectionConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// # Renderer Configuration
///
/// Buffering factor for per-frame descriptor copies and where compiled
/// SPIR-V lives.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RendererConfig {
    /// Application name for Vulkan instance creation
    pub application_name: String,
    /// Number of frames whose GPU work may overlap
    pub frames_in_flight: usize,
    /// Directory holding `<shader name>.spv` files
    pub shader_dir: String,
}

impl RendererConfig {
    /// Create a new renderer configuration
    pub fn new(app_name: impl Into<String>) -> Self {
        Self {
            application_name: app_name.into(),
            frames_in_flight: 2,
            shader_dir: "target/shaders".to_string(),
        }
    }

    /// Set frames in flight
    pub fn with_frames_in_flight(mut self, frames: usize) -> Self {
        self.frames_in_flight = frames;
        self
    }

    /// Set the compiled shader directory
    pub fn with_shader_dir(mut self, dir: impl Into<String>) -> Self {
        self.shader_dir = dir.into();
        self
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.application_name.is_empty() {
            return Err(ConfigError::Invalid("Application name cannot be empty".to_string()));
        }
        if self.frames_in_flight == 0 {
            return Err(ConfigError::Invalid("Frames in flight must be at least 1".to_string()));
        }
        if self.frames_in_flight > MAX_FRAMES_IN_FLIGHT {
            return Err(ConfigError::Invalid(format!(
                "Frames in flight should not exceed {MAX_FRAMES_IN_FLIGHT}"
            )));
        }
        Ok(())
    }
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self::new("ve application")
    }
}

/// # Complete Configuration
///
/// Top-level configuration loaded by applications and the probe tool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CoreConfig {
    /// Default log filter when `RUST_LOG` is unset
    pub log_level: String,
    /// Device negotiation settings
    pub device: DeviceSelectionConfig,
    /// Descriptor and pipeline settings
    pub renderer: RendererConfig,
}

impl CoreConfig {
    /// Configuration for a surface-less run
    pub fn headless() -> Self {
        Self {
            device: DeviceSelectionConfig::headless(),
            ..Self::default()
        }
    }

    /// Validate the entire configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(name) = self
            .device
            .required_extensions
            .iter()
            .find(|name| self.device.optional_extensions.contains(name))
        {
            return Err(ConfigError::Invalid(format!(
                "Extension {name} is listed as both required and optional"
            )));
        }
        self.renderer.validate()
    }
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            device: DeviceSelectionConfig::default(),
            renderer: RendererConfig::default(),
        }
    }
}

impl Config for CoreConfig {}
