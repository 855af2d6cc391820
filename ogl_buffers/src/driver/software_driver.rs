/// Software driver - host-memory emulation of buffer objects
///
/// Emulates the parts of the native driver the buffer layer relies on:
/// per-context binding points, data stores, map/unmap state, the error
/// flag and the capability surface. Entry points that the configured
/// version/extension set would not expose record `INVALID_OPERATION` and
/// return null (or 0), like calling an unloaded entry point would fail on
/// a real driver.
///
/// Every call is appended to a call log so tests can check which entry
/// points a capability tier actually used.

use std::sync::{Mutex, MutexGuard, PoisonError};
use rustc_hash::FxHashMap;

use super::driver::{ContextSource, Driver};
use super::types::{
    AccessMode, BufferId, BufferParameter, BufferTarget, BufferUsage, ContextHandle,
    DriverVersion, RangeAccess, INVALID_ENUM, INVALID_OPERATION, INVALID_VALUE, NO_ERROR,
};
use crate::capability::{DIRECT_ACCESS_VERSION, DIRECT_STATE_ACCESS_EXTENSION};

/// Minimum version exposing sub-range mapping
const MAP_RANGE_VERSION: DriverVersion = DriverVersion::new(3, 0);

/// Storage granule; also the alignment of every mapped pointer
#[repr(C, align(64))]
#[derive(Clone, Copy)]
struct Block([u8; 64]);

// SAFETY: plain bytes, size == alignment so there is no padding
unsafe impl bytemuck::Zeroable for Block {}
unsafe impl bytemuck::Pod for Block {}

const BLOCK_SIZE: usize = std::mem::size_of::<Block>();

/// Live mapping of a software buffer
#[derive(Debug, Clone, Copy)]
struct SoftMapping {
    offset: usize,
    length: usize,
    access: RangeAccess,
}

struct SoftBuffer {
    blocks: Vec<Block>,
    size: usize,
    usage: BufferUsage,
    mapping: Option<SoftMapping>,
    /// A generated name only becomes an object once bound
    created: bool,
}

impl SoftBuffer {
    fn new() -> Self {
        Self {
            blocks: Vec::new(),
            size: 0,
            usage: BufferUsage::StaticDraw,
            mapping: None,
            created: false,
        }
    }

    fn bytes(&self) -> &[u8] {
        &bytemuck::cast_slice::<Block, u8>(&self.blocks)[..self.size]
    }

    fn store(&mut self, size: usize, data: Option<&[u8]>, usage: BufferUsage) {
        self.blocks = vec![Block([0; BLOCK_SIZE]); size.div_ceil(BLOCK_SIZE)];
        self.size = size;
        self.usage = usage;
        if let Some(data) = data {
            bytemuck::cast_slice_mut::<Block, u8>(&mut self.blocks)[..size].copy_from_slice(data);
        }
    }

    fn parameter(&self, pname: BufferParameter) -> i64 {
        match pname {
            BufferParameter::Size => self.size as i64,
            BufferParameter::Usage => self.usage.gl_enum() as i64,
            BufferParameter::Access => self
                .mapping
                .and_then(|m| m.access.access_mode())
                .unwrap_or(AccessMode::ReadWrite)
                .gl_enum() as i64,
            BufferParameter::Mapped => self.mapping.is_some() as i64,
            BufferParameter::MapOffset => self.mapping.map_or(0, |m| m.offset as i64),
            BufferParameter::MapLength => self.mapping.map_or(0, |m| m.length as i64),
        }
    }
}

struct SoftwareState {
    current: ContextHandle,
    next_name: u32,
    buffers: FxHashMap<BufferId, SoftBuffer>,
    bindings: FxHashMap<(ContextHandle, BufferTarget), BufferId>,
    error: u32,
    calls: Vec<String>,
}

impl SoftwareState {
    /// The first error sticks until taken
    fn record_error(&mut self, code: u32) {
        if self.error == NO_ERROR {
            self.error = code;
        }
    }

    fn bound(&self, target: BufferTarget) -> BufferId {
        self.bindings
            .get(&(self.current, target))
            .copied()
            .unwrap_or(BufferId::NONE)
    }

    /// Resolve the buffer bound to `target`, recording the matching error if none
    fn bound_object(&mut self, target: BufferTarget) -> Option<BufferId> {
        if !target.has_binding_point() {
            self.record_error(INVALID_ENUM);
            return None;
        }
        let id = self.bound(target);
        if id.is_none() {
            self.record_error(INVALID_OPERATION);
            return None;
        }
        Some(id)
    }

    /// Resolve a named object, recording `INVALID_OPERATION` if it does not exist
    fn named_object(&mut self, id: BufferId) -> Option<BufferId> {
        match self.buffers.get(&id) {
            Some(buffer) if buffer.created => Some(id),
            _ => {
                self.record_error(INVALID_OPERATION);
                None
            }
        }
    }

    fn parameter(&self, id: Option<BufferId>, pname: BufferParameter) -> i64 {
        match id.and_then(|id| self.buffers.get(&id)) {
            Some(buffer) => buffer.parameter(pname),
            None => 0,
        }
    }

    /// `range == None` maps the whole store
    fn map(&mut self, id: Option<BufferId>, range: Option<(usize, usize)>, access: RangeAccess) -> *mut u8 {
        let Some(id) = id else {
            return std::ptr::null_mut();
        };
        let result = match self.buffers.get_mut(&id) {
            _ if access.access_mode().is_none() => Err(INVALID_VALUE),
            None => Err(INVALID_OPERATION),
            Some(buffer) if buffer.mapping.is_some() => Err(INVALID_OPERATION),
            Some(buffer) => {
                let (offset, length) = range.unwrap_or((0, buffer.size));
                let fits = offset.checked_add(length).is_some_and(|end| end <= buffer.size);
                if range.is_some() && (length == 0 || !fits) {
                    Err(INVALID_VALUE)
                } else {
                    buffer.mapping = Some(SoftMapping { offset, length, access });
                    Ok((buffer.blocks.as_mut_ptr() as *mut u8).wrapping_add(offset))
                }
            }
        };

        result.unwrap_or_else(|code| {
            self.record_error(code);
            std::ptr::null_mut()
        })
    }
}

/// Host-memory driver
///
/// # Example
///
/// ```
/// use ogl_buffers::ogl::driver::{Driver, DriverVersion, SoftwareDriver};
///
/// let driver = SoftwareDriver::new(DriverVersion::new(3, 3))
///     .with_extension("GL_EXT_direct_state_access");
/// assert!(driver.load().is_ok());
/// assert!(driver.has_extension("GL_EXT_direct_state_access"));
/// ```
pub struct SoftwareDriver {
    version: DriverVersion,
    extensions: Vec<String>,
    load_error: Option<u32>,
    state: Mutex<SoftwareState>,
}

impl SoftwareDriver {
    /// Driver reporting `version`, no extensions, with context 1 current
    pub fn new(version: DriverVersion) -> Self {
        Self {
            version,
            extensions: Vec::new(),
            load_error: None,
            state: Mutex::new(SoftwareState {
                current: ContextHandle(1),
                next_name: 0,
                buffers: FxHashMap::default(),
                bindings: FxHashMap::default(),
                error: NO_ERROR,
                calls: Vec::new(),
            }),
        }
    }

    /// Expose an extension
    pub fn with_extension(mut self, name: &str) -> Self {
        self.extensions.push(name.to_string());
        self
    }

    /// Make `load()` fail with `code`
    pub fn with_load_error(mut self, code: u32) -> Self {
        self.load_error = Some(code);
        self
    }

    fn state(&self) -> MutexGuard<'_, SoftwareState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Lock the state and log the call
    fn call(&self, name: &str) -> MutexGuard<'_, SoftwareState> {
        let mut state = self.state();
        state.calls.push(name.to_string());
        state
    }

    fn supports_direct(&self) -> bool {
        self.version >= DIRECT_ACCESS_VERSION
    }

    fn supports_ext(&self) -> bool {
        self.has_extension(DIRECT_STATE_ACCESS_EXTENSION)
    }

    fn supports_range(&self) -> bool {
        self.version >= MAP_RANGE_VERSION
    }

    // ===== INSPECTION =====

    /// Switch the current execution context
    pub fn make_current(&self, context: ContextHandle) {
        self.state().current = context;
    }

    /// Every entry point called so far, in order
    pub fn calls(&self) -> Vec<String> {
        self.state().calls.clone()
    }

    /// Number of calls to one entry point
    pub fn call_count(&self, name: &str) -> usize {
        self.state().calls.iter().filter(|c| c.as_str() == name).count()
    }

    pub fn clear_calls(&self) {
        self.state().calls.clear();
    }

    /// Buffer bound to `target` in the current context (not logged)
    pub fn bound_to(&self, target: BufferTarget) -> BufferId {
        self.state().bound(target)
    }

    /// Copy of a buffer's data store
    pub fn contents(&self, id: BufferId) -> Option<Vec<u8>> {
        self.state().buffers.get(&id).map(|b| b.bytes().to_vec())
    }

    /// Number of names generated and not yet deleted
    pub fn live_buffers(&self) -> usize {
        self.state().buffers.len()
    }
}

impl ContextSource for SoftwareDriver {
    fn current_context(&self) -> ContextHandle {
        self.state().current
    }
}

impl Driver for SoftwareDriver {
    fn load(&self) -> std::result::Result<(), u32> {
        match self.load_error {
            Some(code) => Err(code),
            None => Ok(()),
        }
    }

    fn version(&self) -> DriverVersion {
        self.version
    }

    fn has_extension(&self, name: &str) -> bool {
        self.extensions.iter().any(|e| e == name)
    }

    fn take_error(&self) -> u32 {
        std::mem::replace(&mut self.state().error, NO_ERROR)
    }

    fn gen_buffer(&self) -> BufferId {
        let mut state = self.call("gen_buffer");
        state.next_name += 1;
        let id = BufferId(state.next_name);
        state.buffers.insert(id, SoftBuffer::new());
        id
    }

    fn delete_buffer(&self, id: BufferId) {
        let mut state = self.call("delete_buffer");
        if state.buffers.remove(&id).is_some() {
            state.bindings.retain(|_, bound| *bound != id);
        }
    }

    fn bind_buffer(&self, target: BufferTarget, id: BufferId) {
        let mut state = self.call("bind_buffer");
        if !target.has_binding_point() {
            state.record_error(INVALID_ENUM);
            return;
        }
        let key = (state.current, target);
        if id.is_none() {
            state.bindings.remove(&key);
            return;
        }
        let exists = match state.buffers.get_mut(&id) {
            Some(buffer) => {
                buffer.created = true;
                true
            }
            None => false,
        };
        if exists {
            state.bindings.insert(key, id);
        } else {
            state.record_error(INVALID_OPERATION);
        }
    }

    fn get_integer(&self, pname: u32) -> i32 {
        let mut state = self.call("get_integer");
        match BufferTarget::from_binding_query(pname) {
            Some(target) => state.bound(target).0 as i32,
            None => {
                state.record_error(INVALID_ENUM);
                0
            }
        }
    }

    fn buffer_data(&self, target: BufferTarget, size: usize, data: Option<&[u8]>, usage: BufferUsage) {
        let mut state = self.call("buffer_data");
        let Some(id) = state.bound_object(target) else {
            return;
        };
        if data.is_some_and(|d| d.len() != size) {
            state.record_error(INVALID_VALUE);
            return;
        }
        let mapped = state.buffers.get(&id).is_some_and(|b| b.mapping.is_some());
        if mapped {
            state.record_error(INVALID_OPERATION);
            return;
        }
        if let Some(buffer) = state.buffers.get_mut(&id) {
            buffer.store(size, data, usage);
        }
    }

    fn buffer_parameter(&self, target: BufferTarget, pname: BufferParameter) -> i64 {
        let mut state = self.call("buffer_parameter");
        let id = state.bound_object(target);
        state.parameter(id, pname)
    }

    fn named_buffer_parameter(&self, id: BufferId, pname: BufferParameter) -> i64 {
        let mut state = self.call("named_buffer_parameter");
        if !self.supports_direct() {
            state.record_error(INVALID_OPERATION);
            return 0;
        }
        let id = state.named_object(id);
        state.parameter(id, pname)
    }

    fn named_buffer_parameter_ext(&self, id: BufferId, pname: BufferParameter) -> i64 {
        let mut state = self.call("named_buffer_parameter_ext");
        if !self.supports_ext() {
            state.record_error(INVALID_OPERATION);
            return 0;
        }
        let id = state.named_object(id);
        state.parameter(id, pname)
    }

    fn map_buffer(&self, target: BufferTarget, access: AccessMode) -> *mut u8 {
        let mut state = self.call("map_buffer");
        let id = state.bound_object(target);
        state.map(id, None, access.range_access())
    }

    fn map_buffer_range(
        &self,
        target: BufferTarget,
        offset: usize,
        length: usize,
        access: RangeAccess,
    ) -> *mut u8 {
        let mut state = self.call("map_buffer_range");
        if !self.supports_range() {
            state.record_error(INVALID_OPERATION);
            return std::ptr::null_mut();
        }
        let id = state.bound_object(target);
        state.map(id, Some((offset, length)), access)
    }

    fn map_named_buffer(&self, id: BufferId, access: AccessMode) -> *mut u8 {
        let mut state = self.call("map_named_buffer");
        if !self.supports_direct() {
            state.record_error(INVALID_OPERATION);
            return std::ptr::null_mut();
        }
        let id = state.named_object(id);
        state.map(id, None, access.range_access())
    }

    fn map_named_buffer_range(
        &self,
        id: BufferId,
        offset: usize,
        length: usize,
        access: RangeAccess,
    ) -> *mut u8 {
        let mut state = self.call("map_named_buffer_range");
        if !self.supports_direct() {
            state.record_error(INVALID_OPERATION);
            return std::ptr::null_mut();
        }
        let id = state.named_object(id);
        state.map(id, Some((offset, length)), access)
    }

    fn map_named_buffer_ext(&self, id: BufferId, access: AccessMode) -> *mut u8 {
        let mut state = self.call("map_named_buffer_ext");
        if !self.supports_ext() {
            state.record_error(INVALID_OPERATION);
            return std::ptr::null_mut();
        }
        let id = state.named_object(id);
        state.map(id, None, access.range_access())
    }

    fn map_named_buffer_range_ext(
        &self,
        id: BufferId,
        offset: usize,
        length: usize,
        access: RangeAccess,
    ) -> *mut u8 {
        let mut state = self.call("map_named_buffer_range_ext");
        if !self.supports_ext() {
            state.record_error(INVALID_OPERATION);
            return std::ptr::null_mut();
        }
        let id = state.named_object(id);
        state.map(id, Some((offset, length)), access)
    }

    fn unmap_buffer(&self, target: BufferTarget) -> bool {
        let mut state = self.call("unmap_buffer");
        let Some(id) = state.bound_object(target) else {
            return false;
        };
        let released = state.buffers.get_mut(&id).and_then(|b| b.mapping.take());
        if released.is_none() {
            state.record_error(INVALID_OPERATION);
        }
        released.is_some()
    }
}

#[cfg(test)]
#[path = "software_driver_tests.rs"]
mod tests;
