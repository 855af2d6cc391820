/// MappedView - typed, bounds-checked window over a live mapping
///
/// Created only by the `Buffer::map*` methods. The view borrows its
/// buffer, so it cannot outlive it, and it owns the mapping: dropping the
/// view (or calling `unmap()`) releases it exactly once.

use std::ops::{Index, IndexMut};
use std::ptr::NonNull;
use bytemuck::Pod;

use crate::buffer::Buffer;
use crate::driver::{AccessMode, BufferTarget};
use crate::error::{Error, Result};
use crate::ogl_bail;

const SOURCE: &str = "ogl::MappedView";

/// Typed view of mapped buffer memory
pub struct MappedView<'a, T: Pod> {
    buffer: &'a Buffer,
    ptr: NonNull<T>,
    len: usize,
    access: AccessMode,
    released: bool,
}

impl<'a, T: Pod> MappedView<'a, T> {
    /// # Safety
    ///
    /// `ptr` must be aligned for `T` and valid for reads and writes of
    /// `len` elements until `buffer` releases its mapping.
    pub(crate) unsafe fn new(buffer: &'a Buffer, ptr: NonNull<T>, len: usize, access: AccessMode) -> Self {
        Self {
            buffer,
            ptr,
            len,
            access,
            released: false,
        }
    }

    /// Number of `T` elements in the view
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Access mode the mapping was made with
    pub fn access(&self) -> AccessMode {
        self.access
    }

    /// Target of the originating buffer
    pub fn target(&self) -> BufferTarget {
        self.buffer.target()
    }

    /// Base address of the mapping
    pub fn as_ptr(&self) -> *const T {
        self.ptr.as_ptr()
    }

    fn check_index(&self, index: usize) -> Result<()> {
        if index >= self.len {
            ogl_bail!(SOURCE, Error::OutOfRangeAccess { index, len: self.len });
        }
        Ok(())
    }

    fn check_read(&self) -> Result<()> {
        if !self.access.allows_read() {
            ogl_bail!(SOURCE, Error::AccessViolation { access: self.access });
        }
        Ok(())
    }

    fn check_write(&self) -> Result<()> {
        if !self.access.allows_write() {
            ogl_bail!(SOURCE, Error::AccessViolation { access: self.access });
        }
        Ok(())
    }

    /// Element at `index`.
    ///
    /// # Errors
    ///
    /// `AccessViolation` on a write-only view, `OutOfRangeAccess` past the end.
    pub fn get(&self, index: usize) -> Result<&T> {
        self.check_read()?;
        self.check_index(index)?;
        Ok(&self.slice()[index])
    }

    /// Mutable element at `index`.
    ///
    /// # Errors
    ///
    /// `AccessViolation` on a read-only view, `OutOfRangeAccess` past the end.
    pub fn get_mut(&mut self, index: usize) -> Result<&mut T> {
        self.check_write()?;
        self.check_index(index)?;
        Ok(&mut self.slice_mut()[index])
    }

    fn slice(&self) -> &[T] {
        // SAFETY: see `new`; the view is the only owner of the mapping
        unsafe { std::slice::from_raw_parts(self.ptr.as_ptr(), self.len) }
    }

    /// Whole view as a slice. Fails on a write-only view.
    pub fn as_slice(&self) -> Result<&[T]> {
        self.check_read()?;
        Ok(self.slice())
    }

    fn slice_mut(&mut self) -> &mut [T] {
        // SAFETY: see `new`; `&mut self` makes this the only live reference
        unsafe { std::slice::from_raw_parts_mut(self.ptr.as_ptr(), self.len) }
    }

    /// Whole view as a mutable slice. Fails on a read-only view.
    pub fn as_mut_slice(&mut self) -> Result<&mut [T]> {
        self.check_write()?;
        Ok(self.slice_mut())
    }

    /// Overwrite the whole view. `src` must have exactly `len()` elements.
    pub fn copy_from_slice(&mut self, src: &[T]) -> Result<()> {
        self.check_write()?;
        if src.len() != self.len {
            ogl_bail!(
                SOURCE,
                Error::InvalidRange {
                    offset: 0,
                    length: std::mem::size_of_val(src),
                    size: self.len * std::mem::size_of::<T>(),
                }
            );
        }
        self.slice_mut().copy_from_slice(src);
        Ok(())
    }

    /// Copy the mapped elements out. Fails on a write-only view.
    pub fn to_vec(&self) -> Result<Vec<T>> {
        Ok(self.as_slice()?.to_vec())
    }

    /// Release the mapping now and report the outcome
    ///
    /// Dropping the view releases it too, but only logs failures.
    pub fn unmap(mut self) -> Result<()> {
        self.released = true;
        if !self.buffer.release_view()? {
            ogl_bail!(
                SOURCE,
                Error::UnboundOperation(format!(
                    "buffer {} was no longer mapped",
                    self.buffer.id()
                ))
            );
        }
        Ok(())
    }
}

impl<T: Pod> Index<usize> for MappedView<'_, T> {
    type Output = T;

    /// Panics if `index >= len()` or the view is write-only
    fn index(&self, index: usize) -> &T {
        match self.get(index) {
            Ok(value) => value,
            Err(err) => panic!("{}", err),
        }
    }
}

impl<T: Pod> IndexMut<usize> for MappedView<'_, T> {
    /// Panics if `index >= len()` or the view is read-only
    fn index_mut(&mut self, index: usize) -> &mut T {
        match self.get_mut(index) {
            Ok(value) => value,
            Err(err) => panic!("{}", err),
        }
    }
}

impl<T: Pod> Drop for MappedView<'_, T> {
    fn drop(&mut self) {
        if !self.released {
            self.released = true;
            self.buffer.release_mapping();
        }
    }
}

impl<T: Pod> std::fmt::Debug for MappedView<'_, T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MappedView")
            .field("buffer", &self.buffer.id())
            .field("access", &self.access)
            .field("len", &self.len)
            .finish()
    }
}

#[cfg(test)]
#[path = "mapped_view_tests.rs"]
mod tests;
