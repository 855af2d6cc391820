/// Buffer - one device buffer object bound to a fixed target
///
/// Mapping goes through the strategy selected by the shared
/// `BufferContext`; releasing a mapping always goes through the bind
/// bracket, whatever tier mapped it. At most one mapping is live at a time.
///
/// A `Buffer` is `Send` but not `Sync`: the bind slot is a plain `Cell`.

use std::cell::Cell;
use std::mem::{align_of, size_of};
use std::ptr::NonNull;
use std::sync::Arc;
use bytemuck::Pod;

use crate::bind::{BindGuard, BindSlot};
use crate::buffer_context::BufferContext;
use crate::driver::{
    AccessMode, BufferId, BufferParameter, BufferTarget, BufferUsage, Driver, RangeAccess,
    NO_ERROR,
};
use crate::error::{Error, Result};
use crate::mapped_view::MappedView;
use crate::strategy::BufferHandle;
use crate::{ogl_bail, ogl_err};

const SOURCE: &str = "ogl::Buffer";

/// Device buffer object
pub struct Buffer {
    ctx: Arc<BufferContext>,
    id: BufferId,
    target: BufferTarget,
    slot: BindSlot,
    /// Set while a `MappedView` owns the current mapping
    view_alive: Cell<bool>,
}

impl Buffer {
    /// Generate a new buffer object for `target`.
    ///
    /// The object is created by a bracketed bind, so the binding of
    /// `target` is the same before and after this call.
    ///
    /// # Errors
    ///
    /// - `InvalidResource` if `target` has no binding point
    /// - `BackendError` if the driver returns no identity
    pub fn new(ctx: &Arc<BufferContext>, target: BufferTarget) -> Result<Self> {
        if !target.has_binding_point() {
            ogl_bail!(
                SOURCE,
                Error::InvalidResource(format!("cannot create a buffer for target {:?}", target))
            );
        }

        let driver = ctx.driver();
        let id = driver.gen_buffer();
        if id.is_none() {
            let code = driver.take_error();
            ogl_bail!(
                SOURCE,
                Error::BackendError(format!(
                    "buffer name generation failed (driver error 0x{:04X})",
                    code
                ))
            );
        }

        let buffer = Self {
            ctx: Arc::clone(ctx),
            id,
            target,
            slot: BindSlot::new(),
            view_alive: Cell::new(false),
        };
        // First bind turns the name into an object
        drop(buffer.bind()?);

        crate::ogl_debug!(SOURCE, "Created buffer {} for {:?}", id, target);
        Ok(buffer)
    }

    /// Create a buffer and fill its data store with `data`
    pub fn with_data<T: Pod>(
        ctx: &Arc<BufferContext>,
        target: BufferTarget,
        data: &[T],
        usage: BufferUsage,
    ) -> Result<Self> {
        let buffer = Self::new(ctx, target)?;
        buffer.upload(data, usage)?;
        Ok(buffer)
    }

    // ===== ACCESSORS =====

    /// Device identity (never `BufferId::NONE`)
    pub fn id(&self) -> BufferId {
        self.id
    }

    pub fn target(&self) -> BufferTarget {
        self.target
    }

    /// Context this buffer was created from
    pub fn context(&self) -> &Arc<BufferContext> {
        &self.ctx
    }

    fn driver(&self) -> &dyn Driver {
        self.ctx.driver()
    }

    fn handle(&self) -> BufferHandle<'_> {
        BufferHandle {
            driver: self.ctx.driver(),
            target: self.target,
            id: self.id,
            slot: &self.slot,
        }
    }

    /// Open a bind bracket on this buffer's target.
    ///
    /// The previous binding is restored when the guard is dropped.
    ///
    /// # Errors
    ///
    /// `UnboundOperation` if a bracket is already open on this buffer.
    pub fn bind(&self) -> Result<BindGuard<'_>> {
        self.slot.bind(self.driver(), self.target, self.id)
    }

    // ===== DATA STORE =====

    /// (Re)define an uninitialized data store of `size` bytes
    pub fn allocate(&self, size: usize, usage: BufferUsage) -> Result<()> {
        self.store(size, None, usage)
    }

    /// (Re)define the data store with a copy of `data`
    pub fn upload<T: Pod>(&self, data: &[T], usage: BufferUsage) -> Result<()> {
        let bytes: &[u8] = bytemuck::cast_slice(data);
        self.store(bytes.len(), Some(bytes), usage)
    }

    fn store(&self, size: usize, data: Option<&[u8]>, usage: BufferUsage) -> Result<()> {
        self.ensure_unmapped()?;

        {
            let _bound = self.bind()?;
            self.driver().buffer_data(self.target, size, data, usage);
        }

        let code = self.driver().take_error();
        if code != NO_ERROR {
            ogl_bail!(
                SOURCE,
                Error::BackendError(format!(
                    "data store definition failed for buffer {} (driver error 0x{:04X})",
                    self.id, code
                ))
            );
        }
        Ok(())
    }

    // ===== QUERIES =====

    fn parameter(&self, pname: BufferParameter) -> Result<i64> {
        self.ctx.strategy().parameter(&self.handle(), pname)
    }

    /// Size of the data store in bytes
    pub fn byte_len(&self) -> Result<usize> {
        Ok(self.parameter(BufferParameter::Size)?.max(0) as usize)
    }

    /// Usage hint the data store was defined with
    pub fn usage(&self) -> Result<BufferUsage> {
        let raw = self.parameter(BufferParameter::Usage)?;
        BufferUsage::from_gl_enum(raw as u32).ok_or_else(|| {
            ogl_err!(
                SOURCE,
                Error::BackendError(format!("unknown usage 0x{:04X} for buffer {}", raw, self.id))
            )
        })
    }

    /// Whether the buffer currently has a live mapping.
    ///
    /// Asks the driver on every call through the selected tier.
    pub fn is_mapped(&self) -> Result<bool> {
        Ok(self.parameter(BufferParameter::Mapped)? != 0)
    }

    fn ensure_unmapped(&self) -> Result<()> {
        if self.is_mapped()? {
            ogl_bail!(SOURCE, Error::AlreadyMapped { buffer: self.id });
        }
        Ok(())
    }

    // ===== RAW MAPPING =====

    /// Map the whole data store and return the raw base address.
    ///
    /// The mapping stays live until `unmap()`; nothing releases it
    /// automatically. Prefer the typed `map*` methods.
    pub fn raw_map(&self, access: AccessMode) -> Result<NonNull<u8>> {
        self.ensure_unmapped()?;
        let ptr = self.ctx.strategy().map(&self.handle(), access)?;
        self.check_pointer(ptr)
    }

    pub fn raw_map_read(&self) -> Result<NonNull<u8>> {
        self.raw_map(AccessMode::ReadOnly)
    }

    pub fn raw_map_write(&self) -> Result<NonNull<u8>> {
        self.raw_map(AccessMode::WriteOnly)
    }

    fn raw_map_range(&self, offset: usize, length: usize, access: RangeAccess) -> Result<NonNull<u8>> {
        self.ensure_unmapped()?;
        let ptr = self
            .ctx
            .strategy()
            .map_range(&self.handle(), offset, length, access)?;
        self.check_pointer(ptr)
    }

    /// Null means the driver refused; the reason is in its error flag
    fn check_pointer(&self, ptr: *mut u8) -> Result<NonNull<u8>> {
        NonNull::new(ptr).ok_or_else(|| {
            let code = self.driver().take_error();
            ogl_err!(SOURCE, Error::MapFailed { code })
        })
    }

    // ===== TYPED MAPPING =====

    /// Map the whole data store as a view of `T` elements
    ///
    /// # Errors
    ///
    /// - `AlreadyMapped` if a mapping is live (nothing changes)
    /// - `InvalidResource` if `T` is zero-sized
    /// - `MapFailed` if the driver refuses the mapping
    ///
    /// # Example
    ///
    /// ```
    /// use std::sync::Arc;
    /// use ogl_buffers::ogl::{Buffer, BufferContext};
    /// use ogl_buffers::ogl::driver::{AccessMode, BufferTarget, BufferUsage, DriverVersion, SoftwareDriver};
    ///
    /// let ctx = BufferContext::initialize(Arc::new(SoftwareDriver::new(DriverVersion::new(3, 3))))?;
    /// let buffer = Buffer::with_data(&ctx, BufferTarget::Array, &[1u32, 2, 3, 4], BufferUsage::DynamicDraw)?;
    ///
    /// let mut view = buffer.map::<u32>(AccessMode::ReadWrite)?;
    /// view[3] = 40;
    /// assert_eq!(view.to_vec()?, vec![1, 2, 3, 40]);
    /// # Ok::<(), ogl_buffers::ogl::Error>(())
    /// ```
    pub fn map<T: Pod>(&self, access: AccessMode) -> Result<MappedView<'_, T>> {
        Self::check_element::<T>()?;
        let byte_len = self.byte_len()?;
        let ptr = self.raw_map(access)?;
        self.wrap(ptr, byte_len, access)
    }

    /// Map the whole data store for reading
    pub fn map_read<T: Pod>(&self) -> Result<MappedView<'_, T>> {
        self.map(AccessMode::ReadOnly)
    }

    /// Map the whole data store for writing
    pub fn map_write<T: Pod>(&self) -> Result<MappedView<'_, T>> {
        self.map(AccessMode::WriteOnly)
    }

    /// Map `length` bytes starting at byte `offset`.
    ///
    /// `offset` must be aligned for `T` and the range must lie inside the
    /// data store. `access` must include `READ` or `WRITE`.
    pub fn map_range<T: Pod>(
        &self,
        offset: usize,
        length: usize,
        access: RangeAccess,
    ) -> Result<MappedView<'_, T>> {
        Self::check_element::<T>()?;
        let Some(mode) = access.access_mode() else {
            ogl_bail!(
                SOURCE,
                Error::InvalidResource(format!("range access {:?} has neither READ nor WRITE", access))
            );
        };

        let size = self.byte_len()?;
        let fits = offset.checked_add(length).is_some_and(|end| end <= size);
        if length == 0 || !fits || offset % align_of::<T>() != 0 {
            ogl_bail!(SOURCE, Error::InvalidRange { offset, length, size });
        }

        let ptr = self.raw_map_range(offset, length, access)?;
        self.wrap(ptr, length, mode)
    }

    fn check_element<T>() -> Result<()> {
        if size_of::<T>() == 0 {
            ogl_bail!(
                SOURCE,
                Error::InvalidResource(format!(
                    "cannot map a view of zero-sized {}",
                    std::any::type_name::<T>()
                ))
            );
        }
        Ok(())
    }

    fn wrap<T: Pod>(&self, ptr: NonNull<u8>, byte_len: usize, access: AccessMode) -> Result<MappedView<'_, T>> {
        if ptr.as_ptr() as usize % align_of::<T>() != 0 {
            self.release_mapping();
            ogl_bail!(
                SOURCE,
                Error::InvalidResource(format!(
                    "mapping of buffer {} is not aligned for {}",
                    self.id,
                    std::any::type_name::<T>()
                ))
            );
        }

        self.view_alive.set(true);
        // SAFETY: the driver mapping covers `byte_len` bytes from `ptr`, the
        // pointer is aligned for `T`, and the view borrows `self`, so the
        // mapping cannot be redefined or deleted while the view exists.
        Ok(unsafe { MappedView::new(self, ptr.cast::<T>(), byte_len / size_of::<T>(), access) })
    }

    // ===== UNMAPPING =====

    /// Release the live mapping through the bind bracket.
    ///
    /// # Errors
    ///
    /// - `UnboundOperation` if nothing is mapped, or if a `MappedView`
    ///   owns the mapping (release it through the view instead)
    /// - `BackendError` if the driver reports the data store was corrupted
    pub fn unmap(&self) -> Result<()> {
        if self.view_alive.get() {
            ogl_bail!(
                SOURCE,
                Error::UnboundOperation(format!(
                    "buffer {} is mapped by a live view; unmap the view instead",
                    self.id
                ))
            );
        }
        if !self.unmap_bracketed()? {
            ogl_bail!(
                SOURCE,
                Error::UnboundOperation(format!("buffer {} is not mapped", self.id))
            );
        }
        Ok(())
    }

    /// Release from a view. Returns `Ok(false)` if nothing was mapped.
    pub(crate) fn release_view(&self) -> Result<bool> {
        self.view_alive.set(false);
        self.unmap_bracketed()
    }

    /// Drop-path release: never fails, warns if nothing was mapped
    pub(crate) fn release_mapping(&self) {
        self.view_alive.set(false);
        match self.unmap_bracketed() {
            Ok(true) => {}
            Ok(false) => crate::ogl_warn!(
                SOURCE,
                "Release of buffer {} skipped: nothing is mapped",
                self.id
            ),
            Err(err) => crate::ogl_warn!(SOURCE, "Release of buffer {} failed: {}", self.id, err),
        }
    }

    /// Bind, unmap, unbind. `Ok(false)` if nothing was mapped.
    ///
    /// Inside a bracket the caller already opened, the buffer is bound to
    /// its target, so the release goes through that binding instead.
    fn unmap_bracketed(&self) -> Result<bool> {
        let released = if self.slot.is_bound() {
            if self.driver().buffer_parameter(self.target, BufferParameter::Mapped) == 0 {
                return Ok(false);
            }
            self.driver().unmap_buffer(self.target)
        } else {
            if !self.is_mapped()? {
                return Ok(false);
            }
            let _bound = self.bind()?;
            self.driver().unmap_buffer(self.target)
        };
        if !released {
            let code = self.driver().take_error();
            ogl_bail!(
                SOURCE,
                Error::BackendError(format!(
                    "unmap of buffer {} failed, data store contents are undefined (driver error 0x{:04X})",
                    self.id, code
                ))
            );
        }

        crate::ogl_trace!(SOURCE, "Unmapped buffer {}", self.id);
        Ok(true)
    }
}

impl Drop for Buffer {
    fn drop(&mut self) {
        self.driver().delete_buffer(self.id);
        crate::ogl_trace!(SOURCE, "Deleted buffer {}", self.id);
    }
}

impl std::fmt::Debug for Buffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Buffer")
            .field("id", &self.id)
            .field("target", &self.target)
            .field("tier", &self.ctx.tier())
            .finish()
    }
}

#[cfg(test)]
#[path = "buffer_tests.rs"]
mod tests;
