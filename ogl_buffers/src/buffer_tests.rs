use super::*;
use crate::capability::{CapabilityTier, DIRECT_STATE_ACCESS_EXTENSION};
use crate::driver::{DriverVersion, SoftwareDriver, INVALID_OPERATION};
use crate::strategy::DirectStrategy;

const TIERS: [CapabilityTier; 3] = [
    CapabilityTier::ModernDirect,
    CapabilityTier::ExtensionDirect,
    CapabilityTier::BindFallback,
];

fn software(tier: CapabilityTier) -> SoftwareDriver {
    match tier {
        CapabilityTier::ModernDirect => SoftwareDriver::new(DriverVersion::new(4, 6)),
        CapabilityTier::ExtensionDirect => SoftwareDriver::new(DriverVersion::new(3, 3))
            .with_extension(DIRECT_STATE_ACCESS_EXTENSION),
        CapabilityTier::BindFallback => SoftwareDriver::new(DriverVersion::new(3, 3)),
    }
}

fn setup(tier: CapabilityTier) -> (Arc<SoftwareDriver>, Arc<BufferContext>) {
    let driver = Arc::new(software(tier));
    let ctx = BufferContext::initialize(driver.clone()).unwrap();
    assert_eq!(ctx.tier(), tier);
    (driver, ctx)
}

fn sixteen_bytes(ctx: &Arc<BufferContext>) -> Buffer {
    Buffer::with_data(ctx, BufferTarget::Array, &[1u32, 2, 3, 4], BufferUsage::DynamicDraw).unwrap()
}

// ============================================================================
// Creation / destruction
// ============================================================================

#[test]
fn test_new_rejects_unused_target() {
    let (driver, ctx) = setup(CapabilityTier::BindFallback);
    let result = Buffer::new(&ctx, BufferTarget::Unused);
    assert!(matches!(result, Err(Error::InvalidResource(_))));
    assert_eq!(driver.live_buffers(), 0);
}

#[test]
fn test_new_keeps_external_binding() {
    let (driver, ctx) = setup(CapabilityTier::BindFallback);
    let external = driver.gen_buffer();
    driver.bind_buffer(BufferTarget::Uniform, external);

    let buffer = Buffer::new(&ctx, BufferTarget::Uniform).unwrap();

    assert_ne!(buffer.id(), external);
    assert!(!buffer.id().is_none());
    assert_eq!(buffer.target(), BufferTarget::Uniform);
    assert_eq!(driver.bound_to(BufferTarget::Uniform), external);
}

#[test]
fn test_drop_deletes_identity() {
    let (driver, ctx) = setup(CapabilityTier::ModernDirect);
    {
        let _buffer = Buffer::new(&ctx, BufferTarget::ShaderStorage).unwrap();
        assert_eq!(driver.live_buffers(), 1);
    }
    assert_eq!(driver.live_buffers(), 0);
}

#[test]
fn test_with_data_fills_store() {
    for tier in TIERS {
        let (driver, ctx) = setup(tier);
        let buffer = sixteen_bytes(&ctx);

        assert_eq!(buffer.byte_len().unwrap(), 16);
        assert_eq!(buffer.usage().unwrap(), BufferUsage::DynamicDraw);
        assert_eq!(
            driver.contents(buffer.id()).unwrap(),
            bytemuck::cast_slice::<u32, u8>(&[1, 2, 3, 4]).to_vec()
        );
    }
}

#[test]
fn test_allocate_resizes_store() {
    let (driver, ctx) = setup(CapabilityTier::ExtensionDirect);
    let buffer = Buffer::new(&ctx, BufferTarget::Array).unwrap();

    buffer.allocate(64, BufferUsage::StreamRead).unwrap();

    assert_eq!(buffer.byte_len().unwrap(), 64);
    assert_eq!(buffer.usage().unwrap(), BufferUsage::StreamRead);
    assert_eq!(driver.contents(buffer.id()).unwrap(), vec![0u8; 64]);
}

#[test]
fn test_upload_refused_while_mapped() {
    let (_driver, ctx) = setup(CapabilityTier::BindFallback);
    let buffer = sixteen_bytes(&ctx);
    buffer.raw_map_write().unwrap();

    let result = buffer.upload(&[0u8; 4], BufferUsage::StaticDraw);
    assert!(matches!(result, Err(Error::AlreadyMapped { buffer: id }) if id == buffer.id()));
    assert_eq!(buffer.byte_len().unwrap(), 16);
}

// ============================================================================
// Bind bracket
// ============================================================================

#[test]
fn test_bind_rejects_nesting() {
    let (driver, ctx) = setup(CapabilityTier::ModernDirect);
    let buffer = Buffer::new(&ctx, BufferTarget::ElementArray).unwrap();

    let guard = buffer.bind().unwrap();
    assert_eq!(driver.bound_to(BufferTarget::ElementArray), buffer.id());
    assert!(matches!(buffer.bind(), Err(Error::UnboundOperation(_))));
    drop(guard);

    assert_eq!(driver.bound_to(BufferTarget::ElementArray), BufferId::NONE);
}

#[test]
fn test_fallback_query_fails_inside_open_bracket() {
    let (_driver, ctx) = setup(CapabilityTier::BindFallback);
    let buffer = sixteen_bytes(&ctx);

    let _guard = buffer.bind().unwrap();
    assert!(matches!(buffer.is_mapped(), Err(Error::UnboundOperation(_))));
}

// ============================================================================
// Mapping
// ============================================================================

#[test]
fn test_second_map_is_refused_on_every_tier() {
    for tier in TIERS {
        let (_driver, ctx) = setup(tier);
        let buffer = sixteen_bytes(&ctx);

        let first = buffer.map_write::<f32>().unwrap();
        let second = buffer.map_write::<f32>();

        assert!(
            matches!(second, Err(Error::AlreadyMapped { .. })),
            "tier {} accepted a second mapping",
            tier
        );
        assert_eq!(first.len(), 4);
    }
}

#[test]
fn test_raw_map_refused_while_mapped() {
    let (_driver, ctx) = setup(CapabilityTier::ExtensionDirect);
    let buffer = sixteen_bytes(&ctx);

    buffer.raw_map_read().unwrap();
    assert!(matches!(buffer.raw_map(AccessMode::ReadWrite), Err(Error::AlreadyMapped { .. })));
    assert!(buffer.is_mapped().unwrap());
}

#[test]
fn test_unmap_then_remap_with_other_access() {
    for tier in TIERS {
        let (_driver, ctx) = setup(tier);
        let buffer = sixteen_bytes(&ctx);

        buffer.raw_map_write().unwrap();
        assert!(buffer.is_mapped().unwrap());
        buffer.unmap().unwrap();
        assert!(!buffer.is_mapped().unwrap());

        let view = buffer.map_read::<u32>().unwrap();
        assert_eq!(view.access(), AccessMode::ReadOnly);
        assert_eq!(view.to_vec().unwrap(), vec![1, 2, 3, 4]);
    }
}

#[test]
fn test_unmap_without_mapping_is_checked() {
    let (_driver, ctx) = setup(CapabilityTier::ModernDirect);
    let buffer = sixteen_bytes(&ctx);
    assert!(matches!(buffer.unmap(), Err(Error::UnboundOperation(_))));
}

#[test]
fn test_unmap_refused_while_view_is_alive() {
    let (_driver, ctx) = setup(CapabilityTier::ModernDirect);
    let buffer = sixteen_bytes(&ctx);

    let view = buffer.map_read::<u32>().unwrap();
    assert!(matches!(buffer.unmap(), Err(Error::UnboundOperation(_))));
    assert_eq!(view[0], 1);

    drop(view);
    assert!(!buffer.is_mapped().unwrap());
}

#[test]
fn test_view_dropped_inside_open_bracket_is_released() {
    for tier in TIERS {
        let (driver, ctx) = setup(tier);
        let buffer = sixteen_bytes(&ctx);

        let mut view = buffer.map_write::<u32>().unwrap();
        {
            let _bound = buffer.bind().unwrap();
            view[0] = 7;
            drop(view);
            assert_eq!(driver.bound_to(BufferTarget::Array), buffer.id(), "{:?}", tier);
        }

        assert!(!buffer.is_mapped().unwrap(), "{:?}", tier);
        assert_eq!(driver.bound_to(BufferTarget::Array), BufferId::NONE);
        assert_eq!(buffer.map_read::<u32>().unwrap()[0], 7);
    }
}

#[test]
fn test_direct_view_mapped_inside_bracket_is_released() {
    for tier in [CapabilityTier::ModernDirect, CapabilityTier::ExtensionDirect] {
        let (_driver, ctx) = setup(tier);
        let buffer = sixteen_bytes(&ctx);

        {
            let _bound = buffer.bind().unwrap();
            let mut view = buffer.map_write::<u32>().unwrap();
            view[0] = 1;
        }

        assert!(!buffer.is_mapped().unwrap(), "{:?}", tier);
        assert!(buffer.map_write::<u32>().is_ok());
    }
}

#[test]
fn test_explicit_view_unmap_inside_bracket() {
    for tier in TIERS {
        let (_driver, ctx) = setup(tier);
        let buffer = sixteen_bytes(&ctx);

        let view = buffer.map_read::<u32>().unwrap();
        let bound = buffer.bind().unwrap();
        view.unmap().unwrap();
        assert!(matches!(buffer.unmap(), Err(Error::UnboundOperation(_))));
        drop(bound);

        assert!(!buffer.is_mapped().unwrap(), "{:?}", tier);
    }
}

#[test]
fn test_fallback_map_keeps_external_binding() {
    let (driver, ctx) = setup(CapabilityTier::BindFallback);
    let external = driver.gen_buffer();
    driver.bind_buffer(BufferTarget::Array, external);

    let buffer = sixteen_bytes(&ctx);
    {
        let mut view = buffer.map::<u32>(AccessMode::ReadWrite).unwrap();
        assert_eq!(driver.bound_to(BufferTarget::Array), external);
        view[0] = 9;
    }

    assert_eq!(driver.bound_to(BufferTarget::Array), external);
    assert!(!buffer.is_mapped().unwrap());
}

#[test]
fn test_direct_map_never_binds() {
    let (driver, ctx) = setup(CapabilityTier::ModernDirect);
    let buffer = sixteen_bytes(&ctx);
    driver.clear_calls();

    buffer.raw_map_read().unwrap();

    assert_eq!(driver.call_count("bind_buffer"), 0);
    assert_eq!(driver.call_count("map_named_buffer"), 1);
}

#[test]
fn test_unmap_always_brackets() {
    let (driver, ctx) = setup(CapabilityTier::ModernDirect);
    let buffer = sixteen_bytes(&ctx);
    buffer.raw_map_read().unwrap();
    driver.clear_calls();

    buffer.unmap().unwrap();

    let calls = driver.calls();
    let unmap = calls.iter().position(|c| c == "unmap_buffer").unwrap();
    assert_eq!(calls[unmap - 1], "bind_buffer");
    assert_eq!(calls[unmap + 1], "bind_buffer");
    assert_eq!(driver.bound_to(BufferTarget::Array), BufferId::NONE);
}

#[test]
fn test_driver_refusal_reports_error_flag() {
    // Tier 1 strategy injected over a driver that lacks it
    let driver = Arc::new(SoftwareDriver::new(DriverVersion::new(3, 3)));
    let ctx = BufferContext::with_strategy(driver.clone(), Arc::new(DirectStrategy));
    let buffer = Buffer::new(&ctx, BufferTarget::Array).unwrap();

    let result = buffer.raw_map(AccessMode::ReadOnly);
    assert!(matches!(result, Err(Error::MapFailed { code: INVALID_OPERATION })));
    assert_eq!(driver.take_error(), NO_ERROR);
}

#[test]
fn test_zero_sized_element_rejected() {
    let (_driver, ctx) = setup(CapabilityTier::BindFallback);
    let buffer = sixteen_bytes(&ctx);

    assert!(matches!(buffer.map_read::<()>(), Err(Error::InvalidResource(_))));
    assert!(!buffer.is_mapped().unwrap());
}

// ============================================================================
// Range mapping
// ============================================================================

#[test]
fn test_map_range_views_sub_range() {
    for tier in TIERS {
        let (_driver, ctx) = setup(tier);
        let buffer = sixteen_bytes(&ctx);

        let view = buffer.map_range::<u32>(4, 8, RangeAccess::READ).unwrap();
        assert_eq!(view.access(), AccessMode::ReadOnly);
        assert_eq!(view.to_vec().unwrap(), vec![2, 3]);
    }
}

#[test]
fn test_map_range_checks_bounds_and_alignment() {
    let (_driver, ctx) = setup(CapabilityTier::ModernDirect);
    let buffer = sixteen_bytes(&ctx);

    let cases = [(12, 8), (2, 4), (0, 0), (usize::MAX, 2)];
    for (offset, length) in cases {
        let result = buffer.map_range::<u32>(offset, length, RangeAccess::WRITE);
        assert!(
            matches!(result, Err(Error::InvalidRange { size: 16, .. })),
            "offset {} length {} accepted",
            offset,
            length
        );
    }
    assert!(!buffer.is_mapped().unwrap());
}

#[test]
fn test_map_range_needs_read_or_write() {
    let (_driver, ctx) = setup(CapabilityTier::ExtensionDirect);
    let buffer = sixteen_bytes(&ctx);

    let result = buffer.map_range::<u8>(0, 4, RangeAccess::INVALIDATE_RANGE);
    assert!(matches!(result, Err(Error::InvalidResource(_))));
}

#[test]
fn test_debug_shows_identity_and_tier() {
    let (_driver, ctx) = setup(CapabilityTier::BindFallback);
    let buffer = Buffer::new(&ctx, BufferTarget::Array).unwrap();
    let text = format!("{:?}", buffer);
    assert!(text.contains("Buffer"));
    assert!(text.contains("BindFallback"));
}
