/// BufferContext - the capability decision shared by every buffer
///
/// Created by one explicit initialization call and passed into every
/// `Buffer` constructor. Holds the driver and the selected mapping
/// strategy. Buffers keep an `Arc` to the context, so a strategy swap
/// made by `reinitialize()` is observed by all of them.

use std::sync::{Arc, PoisonError, RwLock};
use crate::capability::{self, CapabilityTier};
use crate::context_registry::ContextLocal;
use crate::driver::{ContextHandle, Driver, DriverVersion};
use crate::error::Result;
use crate::strategy::{self, MapStrategy};

/// Initialized driver plus the selected mapping strategy
pub struct BufferContext {
    driver: Arc<dyn Driver>,
    strategy: RwLock<Arc<dyn MapStrategy>>,
    /// Tier probed on each execution context that ran an initialization
    probed: ContextLocal<Option<CapabilityTier>>,
}

impl BufferContext {
    /// Load the driver, probe its capabilities and select a strategy.
    ///
    /// Must run after a rendering context has been made current on the
    /// calling thread, and before any buffer is created from it.
    ///
    /// # Errors
    ///
    /// `DriverLoadError` with the driver's status code if the base driver
    /// cannot be loaded or is too old.
    ///
    /// # Example
    ///
    /// ```
    /// use std::sync::Arc;
    /// use ogl_buffers::ogl::{BufferContext, CapabilityTier};
    /// use ogl_buffers::ogl::driver::{DriverVersion, SoftwareDriver};
    ///
    /// let ctx = BufferContext::initialize(Arc::new(SoftwareDriver::new(DriverVersion::new(4, 6))))?;
    /// assert_eq!(ctx.tier(), CapabilityTier::ModernDirect);
    /// # Ok::<(), ogl_buffers::ogl::Error>(())
    /// ```
    pub fn initialize(driver: Arc<dyn Driver>) -> Result<Arc<Self>> {
        let (version, tier) = Self::resolve(driver.as_ref())?;

        let ctx = Self {
            strategy: RwLock::new(strategy::for_tier(tier)),
            probed: ContextLocal::new(None),
            driver,
        };
        ctx.probed.set(ctx.driver.as_ref(), Some(tier));

        crate::ogl_info!(
            "ogl::BufferContext",
            "Driver {} initialized, mapping tier: {}",
            version,
            tier
        );
        Ok(Arc::new(ctx))
    }

    /// Build a context around an explicit strategy, skipping load and probe
    pub fn with_strategy(driver: Arc<dyn Driver>, strategy: Arc<dyn MapStrategy>) -> Arc<Self> {
        Arc::new(Self {
            driver,
            strategy: RwLock::new(strategy),
            probed: ContextLocal::new(None),
        })
    }

    fn resolve(driver: &dyn Driver) -> Result<(DriverVersion, CapabilityTier)> {
        let version = capability::load(driver)?;
        Ok((version, capability::probe(driver)))
    }

    /// Re-run load and probe, and swap the shared strategy in place.
    ///
    /// Idempotent: on an unchanged driver the same tier is selected again.
    /// On failure the previous strategy stays selected.
    pub fn reinitialize(&self) -> Result<CapabilityTier> {
        let (_, tier) = Self::resolve(self.driver.as_ref())?;

        let mut strategy = self.strategy.write().unwrap_or_else(PoisonError::into_inner);
        if strategy.tier() != tier {
            crate::ogl_info!(
                "ogl::BufferContext",
                "Mapping tier changed: {} -> {}",
                strategy.tier(),
                tier
            );
            *strategy = strategy::for_tier(tier);
        }
        drop(strategy);

        self.probed.set(self.driver.as_ref(), Some(tier));
        Ok(tier)
    }

    /// Driver this context was initialized with
    pub fn driver(&self) -> &dyn Driver {
        self.driver.as_ref()
    }

    /// Shared strategy currently selected
    pub fn strategy(&self) -> Arc<dyn MapStrategy> {
        self.strategy
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Tier of the selected strategy
    pub fn tier(&self) -> CapabilityTier {
        self.strategy().tier()
    }

    /// Tier recorded when an initialization ran on `context`, if any
    pub fn probed_tier_in(&self, context: ContextHandle) -> Option<CapabilityTier> {
        self.probed.get_in(context)
    }
}

#[cfg(test)]
#[path = "buffer_context_tests.rs"]
mod tests;
