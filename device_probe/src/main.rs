//! Device probe
//!
//! Runs device negotiation without a window and prints the result.
//!
//! ```text
//! device_probe [config.toml|config.ron]
//! ```
//!
//! With `device.preferred_device` set the probe never prompts; otherwise the
//! operator picks among several qualifying GPUs on stdin.

use ve_core::foundation::logging;
use ve_core::prelude::*;

fn load_config() -> Result<CoreConfig, ConfigError> {
    match std::env::args().nth(1) {
        Some(path) => CoreConfig::load_from_file(&path),
        None => Ok(CoreConfig::headless()),
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = load_config()?;
    logging::init_with_level(&config.log_level);
    config.validate()?;

    log::info!("Probing Vulkan devices for {}", config.renderer.application_name);
    let instance = AshInstance::headless(&config.renderer.application_name)?;

    let selector = DeviceSelector::new(&config.device);
    let selected = match config.device.preferred_device {
        Some(index) => selector.select(&instance, &mut PreferredDevice(Some(index)))?,
        None => selector.select(&instance, &mut InteractivePrompt::stdio())?,
    };

    let device = LogicalDevice::new(&instance, &selected)?.with_shader_dir(&config.renderer.shader_dir);
    let families = device.queue_families();

    println!("Selected GPU {}: {}", selected.index(), selected.name());
    println!("Queue families: {families}");
    if device.present_queue.is_none() {
        println!("No present queue, the device cannot drive a surface from this instance");
    }
    if !selected.missing_extensions().is_empty() {
        println!("Missing optional extensions: {}", selected.missing_extensions().join(", "));
    }
    println!("Enabled extensions: {}", selected.extensions().join(", "));

    Ok(())
}
