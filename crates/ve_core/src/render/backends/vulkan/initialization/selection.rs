//! Choosing between several qualifying GPUs
//!
//! The selector reports every candidate to a [`SelectionStrategy`] and, when
//! more than one device qualifies, lets it make the final pick.

use std::io::{self, BufRead, Write};

use super::context::{VulkanError, VulkanResult};

/// Result of the extension and swapchain checks for one candidate
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Suitability {
    /// Missing a required extension or swapchain support
    NotSuitable,
    /// Usable, possibly without some optional extensions
    Suitable {
        /// Requested optional extensions the device lacks
        missing_optional: usize,
    },
}

/// A device that passed every check, including the discrete GPU check
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SuitableDevice {
    /// Physical device index in enumeration order
    pub index: usize,
    /// Driver-reported device name
    pub name: String,
    /// Requested optional extensions the device lacks
    pub missing_optional: usize,
}

/// Picks one physical device out of several qualifying ones
pub trait SelectionStrategy {
    /// Called once per enumerated device, before the discrete GPU check
    fn report(&mut self, index: usize, name: &str, suitability: &Suitability) -> VulkanResult<()> {
        match suitability {
            Suitability::NotSuitable => log::debug!("[DEVICE] {index}: {name} (not suitable)"),
            Suitability::Suitable { missing_optional } => log::debug!(
                "[DEVICE] {index}: {name} (suitable, {missing_optional} missing optional extensions)"
            ),
        }
        Ok(())
    }

    /// Physical device index to use; `candidates` holds at least two entries
    fn select(&mut self, candidates: &[SuitableDevice]) -> VulkanResult<usize>;
}

/// Asks an operator to type the index of the device to use
///
/// Out-of-range or unparsable answers re-prompt. End of input is an error.
pub struct InteractivePrompt<R, W> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> InteractivePrompt<R, W> {
    /// Prompt on arbitrary streams
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    /// Give the streams back
    pub fn into_inner(self) -> (R, W) {
        (self.input, self.output)
    }
}

impl InteractivePrompt<io::StdinLock<'static>, io::Stdout> {
    /// Prompt on the process's stdin and stdout
    pub fn stdio() -> Self {
        Self::new(io::stdin().lock(), io::stdout())
    }
}

impl<R: BufRead, W: Write> SelectionStrategy for InteractivePrompt<R, W> {
    fn report(&mut self, index: usize, name: &str, suitability: &Suitability) -> VulkanResult<()> {
        match suitability {
            Suitability::NotSuitable => writeln!(self.output, "{index}: {name} (not suitable)")?,
            Suitability::Suitable { missing_optional } => writeln!(
                self.output,
                "{index}: {name} (suitable, {missing_optional} missing optional extensions)"
            )?,
        }
        Ok(())
    }

    fn select(&mut self, candidates: &[SuitableDevice]) -> VulkanResult<usize> {
        let indices: Vec<String> = candidates.iter().map(|c| c.index.to_string()).collect();
        let mut line = String::new();
        loop {
            writeln!(
                self.output,
                "Select one of the suitable GPUs by typing the number ({}):",
                indices.join(", ")
            )?;
            self.output.flush()?;

            line.clear();
            if self.input.read_line(&mut line)? == 0 {
                return Err(io::Error::new(
                    io::ErrorKind::UnexpectedEof,
                    "input closed before a GPU was selected",
                )
                .into());
            }

            match line.trim().parse::<usize>() {
                Ok(choice) if candidates.iter().any(|c| c.index == choice) => return Ok(choice),
                _ => writeln!(self.output, "'{}' is not one of the suitable GPUs", line.trim())?,
            }
        }
    }
}

/// Fixed choice for runs without an operator
///
/// Uses the configured index when it qualifies, otherwise the first
/// qualifying device.
#[derive(Debug, Clone, Copy, Default)]
pub struct PreferredDevice(pub Option<usize>);

impl SelectionStrategy for PreferredDevice {
    fn select(&mut self, candidates: &[SuitableDevice]) -> VulkanResult<usize> {
        if let Some(preferred) = self.0 {
            if candidates.iter().any(|c| c.index == preferred) {
                return Ok(preferred);
            }
            log::warn!("[DEVICE] Preferred device {preferred} does not qualify, using the first suitable GPU");
        }
        candidates
            .first()
            .map(|c| c.index)
            .ok_or(VulkanError::NoSuitableDevice)
    }
}
