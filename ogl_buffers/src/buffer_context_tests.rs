use super::*;
use crate::capability::DIRECT_STATE_ACCESS_EXTENSION;
use crate::driver::{SoftwareDriver, LOAD_ERROR_VERSION_TOO_OLD};
use crate::error::Error;
use crate::strategy::BindFallbackStrategy;

fn init(driver: SoftwareDriver) -> Arc<BufferContext> {
    BufferContext::initialize(Arc::new(driver)).unwrap()
}

// ============================================================================
// Tier selection
// ============================================================================

#[test]
fn test_initialize_selects_tier_by_priority() {
    let modern = init(
        SoftwareDriver::new(DriverVersion::new(4, 5)).with_extension(DIRECT_STATE_ACCESS_EXTENSION),
    );
    assert_eq!(modern.tier(), CapabilityTier::ModernDirect);

    let extension = init(
        SoftwareDriver::new(DriverVersion::new(3, 3)).with_extension(DIRECT_STATE_ACCESS_EXTENSION),
    );
    assert_eq!(extension.tier(), CapabilityTier::ExtensionDirect);

    let fallback = init(SoftwareDriver::new(DriverVersion::new(3, 3)));
    assert_eq!(fallback.tier(), CapabilityTier::BindFallback);
}

#[test]
fn test_initialize_propagates_load_code() {
    let result = BufferContext::initialize(Arc::new(
        SoftwareDriver::new(DriverVersion::new(4, 6)).with_load_error(3),
    ));
    assert!(matches!(result, Err(Error::DriverLoadError { code: 3 })));
}

#[test]
fn test_initialize_rejects_old_driver() {
    let result = BufferContext::initialize(Arc::new(SoftwareDriver::new(DriverVersion::new(1, 1))));
    match result {
        Err(Error::DriverLoadError { code }) => assert_eq!(code, LOAD_ERROR_VERSION_TOO_OLD),
        Err(other) => panic!("unexpected error: {}", other),
        Ok(_) => panic!("1.1 driver must be rejected"),
    }
}

#[test]
fn test_initialize_records_probe_per_context() {
    let driver = SoftwareDriver::new(DriverVersion::new(3, 3));
    driver.make_current(ContextHandle(5));
    let ctx = init(driver);

    assert_eq!(ctx.probed_tier_in(ContextHandle(5)), Some(CapabilityTier::BindFallback));
    assert_eq!(ctx.probed_tier_in(ContextHandle(6)), None);
}

// ============================================================================
// Re-initialization
// ============================================================================

#[test]
fn test_reinitialize_is_stable() {
    let ctx = init(SoftwareDriver::new(DriverVersion::new(4, 6)));
    let before = ctx.strategy();

    for _ in 0..3 {
        assert_eq!(ctx.reinitialize().unwrap(), CapabilityTier::ModernDirect);
    }

    // Same decision keeps the same shared instance
    assert!(Arc::ptr_eq(&before, &ctx.strategy()));
}

#[test]
fn test_reinitialize_replaces_injected_strategy() {
    let driver: Arc<dyn Driver> = Arc::new(SoftwareDriver::new(DriverVersion::new(4, 6)));
    let ctx = BufferContext::with_strategy(driver, Arc::new(BindFallbackStrategy));
    assert_eq!(ctx.tier(), CapabilityTier::BindFallback);
    assert_eq!(ctx.probed_tier_in(ContextHandle(1)), None);

    assert_eq!(ctx.reinitialize().unwrap(), CapabilityTier::ModernDirect);
    assert_eq!(ctx.tier(), CapabilityTier::ModernDirect);
    assert_eq!(ctx.probed_tier_in(ContextHandle(1)), Some(CapabilityTier::ModernDirect));
}

#[test]
fn test_reinitialize_failure_keeps_strategy() {
    let driver: Arc<dyn Driver> =
        Arc::new(SoftwareDriver::new(DriverVersion::new(4, 6)).with_load_error(1));
    let ctx = BufferContext::with_strategy(driver, Arc::new(BindFallbackStrategy));

    assert!(ctx.reinitialize().is_err());
    assert_eq!(ctx.tier(), CapabilityTier::BindFallback);
}

#[test]
fn test_context_is_send_sync() {
    fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<BufferContext>();
}
