/// Driver trait - the native buffer entry points and capability surface
///
/// Implemented by backends (the OpenGL driver, the software driver).
/// Every method is a thin, synchronous forward to one driver call; policy
/// (which entry point to use, bind bracketing) lives in the core.

use super::types::{
    AccessMode, BufferId, BufferParameter, BufferTarget, BufferUsage, ContextHandle,
    DriverVersion, RangeAccess,
};

/// Source of the currently active execution context
pub trait ContextSource: Send + Sync {
    /// Handle of the context current on the calling thread (`ContextHandle::NONE` if none)
    fn current_context(&self) -> ContextHandle;
}

/// Native buffer driver
///
/// Mapping entry points return a null pointer on failure and record an error
/// code retrievable with [`Driver::take_error`].
pub trait Driver: ContextSource {
    // ===== LOADING / CAPABILITIES =====

    /// Load and validate the base entry points. `Err` carries the driver's status code.
    fn load(&self) -> std::result::Result<(), u32>;

    /// Base driver version
    fn version(&self) -> DriverVersion;

    /// Whether a named extension is exposed
    fn has_extension(&self, name: &str) -> bool;

    /// Return and clear the driver error flag
    fn take_error(&self) -> u32;

    // ===== OBJECTS / BINDING =====

    /// Reserve a new buffer identity
    fn gen_buffer(&self) -> BufferId;

    /// Release a buffer identity (implicitly unmaps and unbinds it)
    fn delete_buffer(&self, id: BufferId);

    /// Bind `id` to the global binding point of `target` (`BufferId::NONE` unbinds)
    fn bind_buffer(&self, target: BufferTarget, id: BufferId);

    /// Integer state query (used for per-target binding queries)
    fn get_integer(&self, pname: u32) -> i32;

    /// (Re)define the data store of the buffer bound to `target`
    fn buffer_data(&self, target: BufferTarget, size: usize, data: Option<&[u8]>, usage: BufferUsage);

    // ===== PARAMETER QUERIES =====

    /// Parameter of the buffer bound to `target`
    fn buffer_parameter(&self, target: BufferTarget, pname: BufferParameter) -> i64;

    /// Parameter by identity (direct access entry point)
    fn named_buffer_parameter(&self, id: BufferId, pname: BufferParameter) -> i64;

    /// Parameter by identity (extension entry point)
    fn named_buffer_parameter_ext(&self, id: BufferId, pname: BufferParameter) -> i64;

    // ===== MAPPING =====

    /// Map the buffer bound to `target`
    fn map_buffer(&self, target: BufferTarget, access: AccessMode) -> *mut u8;

    /// Map a byte range of the buffer bound to `target`
    fn map_buffer_range(
        &self,
        target: BufferTarget,
        offset: usize,
        length: usize,
        access: RangeAccess,
    ) -> *mut u8;

    /// Map by identity (direct access entry point)
    fn map_named_buffer(&self, id: BufferId, access: AccessMode) -> *mut u8;

    /// Map a byte range by identity (direct access entry point)
    fn map_named_buffer_range(
        &self,
        id: BufferId,
        offset: usize,
        length: usize,
        access: RangeAccess,
    ) -> *mut u8;

    /// Map by identity (extension entry point)
    fn map_named_buffer_ext(&self, id: BufferId, access: AccessMode) -> *mut u8;

    /// Map a byte range by identity (extension entry point)
    fn map_named_buffer_range_ext(
        &self,
        id: BufferId,
        offset: usize,
        length: usize,
        access: RangeAccess,
    ) -> *mut u8;

    /// Release the mapping of the buffer bound to `target`.
    /// Returns `false` if the data store was corrupted while mapped.
    fn unmap_buffer(&self, target: BufferTarget) -> bool;
}
