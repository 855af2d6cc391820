use super::*;

fn legacy_driver() -> SoftwareDriver {
    SoftwareDriver::new(DriverVersion::new(3, 3))
}

fn modern_driver() -> SoftwareDriver {
    SoftwareDriver::new(DriverVersion::new(4, 6))
}

/// Generate a name and turn it into an object with a short bind
fn create_buffer(driver: &SoftwareDriver, target: BufferTarget, size: usize) -> BufferId {
    let id = driver.gen_buffer();
    driver.bind_buffer(target, id);
    driver.buffer_data(target, size, None, BufferUsage::DynamicDraw);
    driver.bind_buffer(target, BufferId::NONE);
    id
}

// ============================================================================
// Loading / capabilities
// ============================================================================

#[test]
fn test_load_reports_configured_error() {
    assert_eq!(legacy_driver().load(), Ok(()));
    assert_eq!(legacy_driver().with_load_error(4).load(), Err(4));
}

#[test]
fn test_extensions_are_opt_in() {
    let driver = legacy_driver();
    assert!(!driver.has_extension("GL_EXT_direct_state_access"));

    let driver = driver.with_extension("GL_EXT_direct_state_access");
    assert!(driver.has_extension("GL_EXT_direct_state_access"));
    assert_eq!(driver.version(), DriverVersion::new(3, 3));
}

// ============================================================================
// Names and binding points
// ============================================================================

#[test]
fn test_gen_buffer_is_never_zero_and_unique() {
    let driver = legacy_driver();
    let a = driver.gen_buffer();
    let b = driver.gen_buffer();
    assert!(!a.is_none());
    assert_ne!(a, b);
    assert_eq!(driver.live_buffers(), 2);
}

#[test]
fn test_bind_and_binding_query() {
    let driver = legacy_driver();
    let id = driver.gen_buffer();
    driver.bind_buffer(BufferTarget::Uniform, id);

    let pname = BufferTarget::Uniform.binding_query().unwrap();
    assert_eq!(driver.get_integer(pname), id.0 as i32);
    assert_eq!(driver.bound_to(BufferTarget::Uniform), id);
    assert_eq!(driver.take_error(), NO_ERROR);
}

#[test]
fn test_bind_unknown_name_is_invalid_operation() {
    let driver = legacy_driver();
    driver.bind_buffer(BufferTarget::Array, BufferId(99));
    assert_eq!(driver.take_error(), INVALID_OPERATION);
    assert_eq!(driver.bound_to(BufferTarget::Array), BufferId::NONE);
}

#[test]
fn test_bind_to_unused_is_invalid_enum() {
    let driver = legacy_driver();
    let id = driver.gen_buffer();
    driver.bind_buffer(BufferTarget::Unused, id);
    assert_eq!(driver.take_error(), INVALID_ENUM);
}

#[test]
fn test_bindings_are_per_context() {
    let driver = legacy_driver();
    let id = driver.gen_buffer();
    driver.bind_buffer(BufferTarget::Array, id);

    driver.make_current(ContextHandle(2));
    assert_eq!(driver.current_context(), ContextHandle(2));
    assert_eq!(driver.bound_to(BufferTarget::Array), BufferId::NONE);

    driver.make_current(ContextHandle(1));
    assert_eq!(driver.bound_to(BufferTarget::Array), id);
}

#[test]
fn test_delete_unbinds() {
    let driver = legacy_driver();
    let id = driver.gen_buffer();
    driver.bind_buffer(BufferTarget::Array, id);
    driver.delete_buffer(id);

    assert_eq!(driver.bound_to(BufferTarget::Array), BufferId::NONE);
    assert_eq!(driver.live_buffers(), 0);
    assert!(driver.contents(id).is_none());
}

#[test]
fn test_error_flag_is_sticky_until_taken() {
    let driver = legacy_driver();
    driver.bind_buffer(BufferTarget::Unused, BufferId(1)); // INVALID_ENUM
    driver.bind_buffer(BufferTarget::Array, BufferId(42)); // INVALID_OPERATION

    assert_eq!(driver.take_error(), INVALID_ENUM);
    assert_eq!(driver.take_error(), NO_ERROR);
}

// ============================================================================
// Data store
// ============================================================================

#[test]
fn test_buffer_data_copies_and_reports_size() {
    let driver = legacy_driver();
    let id = driver.gen_buffer();
    driver.bind_buffer(BufferTarget::Array, id);
    driver.buffer_data(BufferTarget::Array, 4, Some(&[1, 2, 3, 4]), BufferUsage::StaticDraw);

    assert_eq!(driver.contents(id).unwrap(), vec![1, 2, 3, 4]);
    assert_eq!(driver.buffer_parameter(BufferTarget::Array, BufferParameter::Size), 4);
    assert_eq!(
        driver.buffer_parameter(BufferTarget::Array, BufferParameter::Usage),
        BufferUsage::StaticDraw.gl_enum() as i64
    );
}

#[test]
fn test_buffer_data_length_mismatch() {
    let driver = legacy_driver();
    let id = driver.gen_buffer();
    driver.bind_buffer(BufferTarget::Array, id);
    driver.buffer_data(BufferTarget::Array, 8, Some(&[1, 2]), BufferUsage::StaticDraw);
    assert_eq!(driver.take_error(), INVALID_VALUE);
}

#[test]
fn test_buffer_data_without_binding() {
    let driver = legacy_driver();
    driver.buffer_data(BufferTarget::Array, 8, None, BufferUsage::StaticDraw);
    assert_eq!(driver.take_error(), INVALID_OPERATION);
}

// ============================================================================
// Mapping
// ============================================================================

#[test]
fn test_map_buffer_returns_aligned_pointer_and_sets_mapped() {
    let driver = legacy_driver();
    let id = create_buffer(&driver, BufferTarget::Array, 16);
    driver.bind_buffer(BufferTarget::Array, id);

    let ptr = driver.map_buffer(BufferTarget::Array, AccessMode::WriteOnly);
    assert!(!ptr.is_null());
    assert_eq!(ptr as usize % 64, 0);
    assert_eq!(driver.buffer_parameter(BufferTarget::Array, BufferParameter::Mapped), 1);
    assert_eq!(
        driver.buffer_parameter(BufferTarget::Array, BufferParameter::Access),
        AccessMode::WriteOnly.gl_enum() as i64
    );

    unsafe { *ptr.add(3) = 9 };
    assert!(driver.unmap_buffer(BufferTarget::Array));
    assert_eq!(driver.contents(id).unwrap()[3], 9);
    assert_eq!(driver.buffer_parameter(BufferTarget::Array, BufferParameter::Mapped), 0);
}

#[test]
fn test_double_map_is_refused() {
    let driver = legacy_driver();
    let id = create_buffer(&driver, BufferTarget::Array, 16);
    driver.bind_buffer(BufferTarget::Array, id);

    assert!(!driver.map_buffer(BufferTarget::Array, AccessMode::ReadOnly).is_null());
    assert!(driver.map_buffer(BufferTarget::Array, AccessMode::ReadOnly).is_null());
    assert_eq!(driver.take_error(), INVALID_OPERATION);
}

#[test]
fn test_unmap_when_not_mapped() {
    let driver = legacy_driver();
    let id = create_buffer(&driver, BufferTarget::Array, 16);
    driver.bind_buffer(BufferTarget::Array, id);

    assert!(!driver.unmap_buffer(BufferTarget::Array));
    assert_eq!(driver.take_error(), INVALID_OPERATION);
}

#[test]
fn test_map_range_bounds() {
    let driver = legacy_driver();
    let id = create_buffer(&driver, BufferTarget::Array, 16);
    driver.bind_buffer(BufferTarget::Array, id);

    assert!(driver.map_buffer_range(BufferTarget::Array, 8, 16, RangeAccess::READ).is_null());
    assert_eq!(driver.take_error(), INVALID_VALUE);
    assert!(driver.map_buffer_range(BufferTarget::Array, 0, 0, RangeAccess::READ).is_null());
    assert_eq!(driver.take_error(), INVALID_VALUE);
    assert!(driver.map_buffer_range(BufferTarget::Array, 4, 4, RangeAccess::INVALIDATE_RANGE).is_null());
    assert_eq!(driver.take_error(), INVALID_VALUE);

    let base = driver.map_buffer_range(BufferTarget::Array, 8, 8, RangeAccess::WRITE);
    assert!(!base.is_null());
    assert_eq!(driver.buffer_parameter(BufferTarget::Array, BufferParameter::MapOffset), 8);
    assert_eq!(driver.buffer_parameter(BufferTarget::Array, BufferParameter::MapLength), 8);
}

#[test]
fn test_map_range_needs_version_3() {
    let driver = SoftwareDriver::new(DriverVersion::new(2, 1));
    let id = create_buffer(&driver, BufferTarget::Array, 16);
    driver.bind_buffer(BufferTarget::Array, id);

    assert!(driver.map_buffer_range(BufferTarget::Array, 0, 4, RangeAccess::READ).is_null());
    assert_eq!(driver.take_error(), INVALID_OPERATION);
}

// ============================================================================
// Direct / extension entry points
// ============================================================================

#[test]
fn test_named_entry_points_need_version_4_5() {
    let driver = legacy_driver();
    let id = create_buffer(&driver, BufferTarget::Array, 16);

    assert!(driver.map_named_buffer(id, AccessMode::ReadOnly).is_null());
    assert_eq!(driver.take_error(), INVALID_OPERATION);
    assert_eq!(driver.named_buffer_parameter(id, BufferParameter::Size), 0);
    assert_eq!(driver.take_error(), INVALID_OPERATION);
}

#[test]
fn test_named_map_does_not_touch_bindings() {
    let driver = modern_driver();
    let id = create_buffer(&driver, BufferTarget::Array, 16);
    driver.clear_calls();

    assert!(!driver.map_named_buffer(id, AccessMode::ReadWrite).is_null());
    assert_eq!(driver.named_buffer_parameter(id, BufferParameter::Mapped), 1);
    assert_eq!(driver.call_count("bind_buffer"), 0);
    assert_eq!(driver.bound_to(BufferTarget::Array), BufferId::NONE);
}

#[test]
fn test_named_map_of_unbound_name_fails() {
    let driver = modern_driver();
    let id = driver.gen_buffer();
    assert!(driver.map_named_buffer(id, AccessMode::ReadOnly).is_null());
    assert_eq!(driver.take_error(), INVALID_OPERATION);
}

#[test]
fn test_ext_entry_points_need_extension() {
    let driver = legacy_driver();
    let id = create_buffer(&driver, BufferTarget::Array, 16);
    assert!(driver.map_named_buffer_ext(id, AccessMode::ReadOnly).is_null());
    assert_eq!(driver.take_error(), INVALID_OPERATION);

    let driver = legacy_driver().with_extension(DIRECT_STATE_ACCESS_EXTENSION);
    let id = create_buffer(&driver, BufferTarget::Array, 16);
    assert!(!driver.map_named_buffer_range_ext(id, 0, 4, RangeAccess::READ).is_null());
    assert_eq!(driver.named_buffer_parameter_ext(id, BufferParameter::Mapped), 1);
}

#[test]
fn test_call_log_records_entry_points_in_order() {
    let driver = legacy_driver();
    let id = driver.gen_buffer();
    driver.bind_buffer(BufferTarget::Array, id);

    assert_eq!(driver.calls(), vec!["gen_buffer".to_string(), "bind_buffer".to_string()]);
    driver.clear_calls();
    assert!(driver.calls().is_empty());
}
