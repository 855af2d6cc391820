/// Capability probing - decides which mapping tier the loaded driver supports
///
/// The decision is made once per initialization; nothing else in the crate
/// re-probes capabilities.

use std::fmt;
use crate::driver::{Driver, DriverVersion, LOAD_ERROR_VERSION_TOO_OLD};
use crate::error::{Error, Result};
use crate::ogl_bail;

/// Oldest driver version with buffer objects
pub const MIN_DRIVER_VERSION: DriverVersion = DriverVersion::new(1, 5);

/// First version with direct-by-identity buffer entry points
pub const DIRECT_ACCESS_VERSION: DriverVersion = DriverVersion::new(4, 5);

/// Extension exposing direct-by-identity entry points on older drivers
pub const DIRECT_STATE_ACCESS_EXTENSION: &str = "GL_EXT_direct_state_access";

/// Mapping capability tier, in order of preference
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum CapabilityTier {
    /// Core direct-by-identity entry points
    ModernDirect,
    /// Extension direct-by-identity entry points
    ExtensionDirect,
    /// Bind to the target, then use the target-based entry points
    BindFallback,
}

impl CapabilityTier {
    /// Whether this tier maps without touching global binding points
    pub fn is_direct(&self) -> bool {
        !matches!(self, CapabilityTier::BindFallback)
    }
}

impl fmt::Display for CapabilityTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CapabilityTier::ModernDirect => "modern direct",
            CapabilityTier::ExtensionDirect => "extension direct",
            CapabilityTier::BindFallback => "bind fallback",
        };
        f.write_str(name)
    }
}

/// Load the base entry points and check the minimum version.
///
/// The driver's status code is passed through unchanged.
pub fn load(driver: &dyn Driver) -> Result<DriverVersion> {
    if let Err(code) = driver.load() {
        ogl_bail!("ogl::capability", Error::DriverLoadError { code });
    }

    let version = driver.version();
    if version < MIN_DRIVER_VERSION {
        ogl_bail!(
            "ogl::capability",
            Error::DriverLoadError { code: LOAD_ERROR_VERSION_TOO_OLD }
        );
    }
    Ok(version)
}

/// Select the best available tier. Never fails: absence of a tier is not an error.
pub fn probe(driver: &dyn Driver) -> CapabilityTier {
    if driver.version() >= DIRECT_ACCESS_VERSION {
        CapabilityTier::ModernDirect
    } else if driver.has_extension(DIRECT_STATE_ACCESS_EXTENSION) {
        CapabilityTier::ExtensionDirect
    } else {
        CapabilityTier::BindFallback
    }
}

#[cfg(test)]
#[path = "capability_tests.rs"]
mod tests;
