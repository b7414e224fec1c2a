//! Device extension bookkeeping
//!
//! Tracks which device extensions are requested, which of them are required,
//! and which optional ones the device under consideration lacks.

/// Outcome of checking a device's extension list against the requests
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExtensionAvailability {
    /// Every required extension is present
    Available {
        /// Number of requested optional extensions the device lacks
        missing_optional: usize,
    },
    /// At least one required extension is absent
    MissingRequired {
        /// The absent required extensions
        missing: Vec<String>,
    },
}

impl ExtensionAvailability {
    /// Whether the device may be used at all
    pub fn is_available(&self) -> bool {
        matches!(self, Self::Available { .. })
    }
}

/// Requested device extensions, partitioned into required and optional
#[derive(Debug, Clone, Default)]
pub struct ExtensionsHandler {
    extensions: Vec<String>,
    required: Vec<String>,
    missing: Vec<String>,
}

impl ExtensionsHandler {
    /// Create an empty handler
    pub fn new() -> Self {
        Self::default()
    }

    /// Request `names`, either as required or optional
    ///
    /// Requesting an already optional extension as required promotes it.
    pub fn add_extensions<S: AsRef<str>>(&mut self, names: &[S], required: bool) {
        for name in names.iter().map(AsRef::as_ref) {
            if !self.find_extension(name) {
                self.extensions.push(name.to_string());
            }
            if required && !self.is_required(name) {
                self.required.push(name.to_string());
            }
        }
    }

    /// Compare the active requests against the extensions a device offers
    ///
    /// Records the optional extensions the device lacks, so a following
    /// [`remove_missing_extensions`](Self::remove_missing_extensions) prunes
    /// them. A device missing a required extension leaves the record alone.
    pub fn check_extension_availability<S: AsRef<str>>(&mut self, available: &[S]) -> ExtensionAvailability {
        let offered = |name: &str| available.iter().any(|a| a.as_ref() == name);

        let missing_required: Vec<String> = self
            .required
            .iter()
            .filter(|name| !offered(name.as_str()))
            .cloned()
            .collect();
        if !missing_required.is_empty() {
            return ExtensionAvailability::MissingRequired { missing: missing_required };
        }

        self.missing = self
            .extensions
            .iter()
            .filter(|name| !offered(name.as_str()))
            .cloned()
            .collect();
        ExtensionAvailability::Available {
            missing_optional: self.missing.len(),
        }
    }

    /// Drop the optional extensions found missing by the last availability check
    pub fn remove_missing_extensions(&mut self) {
        let missing = &self.missing;
        self.extensions.retain(|name| !missing.contains(name));
    }

    /// Whether `name` is in the active request list
    pub fn find_extension(&self, name: &str) -> bool {
        self.extensions.iter().any(|ext| ext == name)
    }

    /// Whether `name` was requested as required
    pub fn is_required(&self, name: &str) -> bool {
        self.required.iter().any(|ext| ext == name)
    }

    /// Active request list, in request order
    pub fn extensions(&self) -> &[String] {
        &self.extensions
    }

    /// Optional extensions missing on the last checked device
    pub fn missing_extensions(&self) -> &[String] {
        &self.missing
    }
}
