/// Mapping strategies - one interface, three capability tiers
///
/// The tier is resolved once at initialization and the chosen strategy is
/// shared by every buffer, so each map/query is a single dynamic call
/// instead of a per-call capability check.
///
/// Strategies return the driver's raw pointer; a null pointer means the
/// driver refused the mapping and the caller reads the error flag.

use std::sync::Arc;
use crate::bind::BindSlot;
use crate::capability::CapabilityTier;
use crate::driver::{AccessMode, BufferId, BufferParameter, BufferTarget, Driver, RangeAccess};
use crate::error::Result;

/// Everything a strategy needs to reach one buffer
#[derive(Clone, Copy)]
pub struct BufferHandle<'a> {
    pub driver: &'a dyn Driver,
    pub target: BufferTarget,
    pub id: BufferId,
    /// Bind slot of the owning buffer (used by the bind fallback only)
    pub slot: &'a BindSlot,
}

/// Tier-specific mapping entry points
pub trait MapStrategy: Send + Sync {
    /// Tier implemented by this strategy
    fn tier(&self) -> CapabilityTier;

    /// Map the whole data store
    fn map(&self, buffer: &BufferHandle<'_>, access: AccessMode) -> Result<*mut u8>;

    /// Map `length` bytes starting at byte `offset`
    fn map_range(
        &self,
        buffer: &BufferHandle<'_>,
        offset: usize,
        length: usize,
        access: RangeAccess,
    ) -> Result<*mut u8>;

    /// Query a buffer parameter (size, mapped state, ...)
    fn parameter(&self, buffer: &BufferHandle<'_>, pname: BufferParameter) -> Result<i64>;
}

// ===== TIER 1 =====

/// Core direct-by-identity entry points. Never touches binding points.
#[derive(Debug, Default)]
pub struct DirectStrategy;

impl MapStrategy for DirectStrategy {
    fn tier(&self) -> CapabilityTier {
        CapabilityTier::ModernDirect
    }

    fn map(&self, buffer: &BufferHandle<'_>, access: AccessMode) -> Result<*mut u8> {
        Ok(buffer.driver.map_named_buffer(buffer.id, access))
    }

    fn map_range(
        &self,
        buffer: &BufferHandle<'_>,
        offset: usize,
        length: usize,
        access: RangeAccess,
    ) -> Result<*mut u8> {
        Ok(buffer.driver.map_named_buffer_range(buffer.id, offset, length, access))
    }

    fn parameter(&self, buffer: &BufferHandle<'_>, pname: BufferParameter) -> Result<i64> {
        Ok(buffer.driver.named_buffer_parameter(buffer.id, pname))
    }
}

// ===== TIER 2 =====

/// Extension direct-by-identity entry points. Never touches binding points.
#[derive(Debug, Default)]
pub struct ExtensionStrategy;

impl MapStrategy for ExtensionStrategy {
    fn tier(&self) -> CapabilityTier {
        CapabilityTier::ExtensionDirect
    }

    fn map(&self, buffer: &BufferHandle<'_>, access: AccessMode) -> Result<*mut u8> {
        Ok(buffer.driver.map_named_buffer_ext(buffer.id, access))
    }

    fn map_range(
        &self,
        buffer: &BufferHandle<'_>,
        offset: usize,
        length: usize,
        access: RangeAccess,
    ) -> Result<*mut u8> {
        Ok(buffer.driver.map_named_buffer_range_ext(buffer.id, offset, length, access))
    }

    fn parameter(&self, buffer: &BufferHandle<'_>, pname: BufferParameter) -> Result<i64> {
        Ok(buffer.driver.named_buffer_parameter_ext(buffer.id, pname))
    }
}

// ===== TIER 3 =====

/// Target-based entry points inside a bind bracket.
///
/// A mapping stays valid after its buffer is unbound, so the bracket is
/// closed as soon as the map call returns and the previous binding is
/// back in place before control returns to the caller.
#[derive(Debug, Default)]
pub struct BindFallbackStrategy;

impl MapStrategy for BindFallbackStrategy {
    fn tier(&self) -> CapabilityTier {
        CapabilityTier::BindFallback
    }

    fn map(&self, buffer: &BufferHandle<'_>, access: AccessMode) -> Result<*mut u8> {
        let _bound = buffer.slot.bind(buffer.driver, buffer.target, buffer.id)?;
        Ok(buffer.driver.map_buffer(buffer.target, access))
    }

    fn map_range(
        &self,
        buffer: &BufferHandle<'_>,
        offset: usize,
        length: usize,
        access: RangeAccess,
    ) -> Result<*mut u8> {
        let _bound = buffer.slot.bind(buffer.driver, buffer.target, buffer.id)?;
        Ok(buffer.driver.map_buffer_range(buffer.target, offset, length, access))
    }

    fn parameter(&self, buffer: &BufferHandle<'_>, pname: BufferParameter) -> Result<i64> {
        let _bound = buffer.slot.bind(buffer.driver, buffer.target, buffer.id)?;
        Ok(buffer.driver.buffer_parameter(buffer.target, pname))
    }
}

/// Shared strategy instance for a tier
pub fn for_tier(tier: CapabilityTier) -> Arc<dyn MapStrategy> {
    match tier {
        CapabilityTier::ModernDirect => Arc::new(DirectStrategy),
        CapabilityTier::ExtensionDirect => Arc::new(ExtensionStrategy),
        CapabilityTier::BindFallback => Arc::new(BindFallbackStrategy),
    }
}

#[cfg(test)]
#[path = "strategy_tests.rs"]
mod tests;
