//! # Core Module
//!
//! Shared configuration for the device-negotiation and binding layers.

pub mod config;

// Re-export commonly used config types
pub use config::{
    CoreConfig,
    DeviceSelectionConfig,
    RendererConfig,
    Config,
    ConfigError,
};
