//! Foundation module - Core utilities and types
//!
//! - Math types shared with shaders
//! - Logging utilities

pub mod math;
pub mod logging;
