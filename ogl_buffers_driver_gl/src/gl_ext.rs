/// GL_EXT_direct_state_access entry points
///
/// The `gl` bindings only cover the core profile, so the three extension
/// functions the buffer layer needs are resolved by hand through the same
/// loader the core entry points use.

use std::ffi::c_void;
use gl::types::{GLbitfield, GLenum, GLint, GLintptr, GLsizeiptr, GLuint};

type MapNamedBufferExt = unsafe extern "system" fn(GLuint, GLenum) -> *mut c_void;
type MapNamedBufferRangeExt =
    unsafe extern "system" fn(GLuint, GLintptr, GLsizeiptr, GLbitfield) -> *mut c_void;
type GetNamedBufferParameterivExt = unsafe extern "system" fn(GLuint, GLenum, *mut GLint);

/// Resolved extension functions (`None` when the loader has no symbol)
#[derive(Clone, Copy, Default)]
pub(crate) struct DirectStateAccessExt {
    map_named_buffer: Option<MapNamedBufferExt>,
    map_named_buffer_range: Option<MapNamedBufferRangeExt>,
    get_named_buffer_parameteriv: Option<GetNamedBufferParameterivExt>,
}

/// Resolve one symbol as a function pointer of type `F`.
///
/// # Safety
///
/// `F` must be an `extern "system"` fn pointer type matching the symbol.
unsafe fn resolve<F: Copy, L: FnMut(&'static str) -> *const c_void>(
    loader: &mut L,
    name: &'static str,
) -> Option<F> {
    let ptr = loader(name);
    if ptr.is_null() {
        None
    } else {
        Some(std::mem::transmute_copy::<*const c_void, F>(&ptr))
    }
}

impl DirectStateAccessExt {
    pub(crate) fn load_with<L: FnMut(&'static str) -> *const c_void>(loader: &mut L) -> Self {
        // SAFETY: the aliases above match the EXT_direct_state_access prototypes
        unsafe {
            Self {
                map_named_buffer: resolve(loader, "glMapNamedBufferEXT"),
                map_named_buffer_range: resolve(loader, "glMapNamedBufferRangeEXT"),
                get_named_buffer_parameteriv: resolve(loader, "glGetNamedBufferParameterivEXT"),
            }
        }
    }

    /// Whether every function the buffer layer uses was resolved
    pub(crate) fn is_complete(&self) -> bool {
        self.map_named_buffer.is_some()
            && self.map_named_buffer_range.is_some()
            && self.get_named_buffer_parameteriv.is_some()
    }

    /// # Safety
    ///
    /// A GL context exposing the extension must be current.
    pub(crate) unsafe fn map_named_buffer(&self, buffer: GLuint, access: GLenum) -> Option<*mut c_void> {
        self.map_named_buffer.map(|f| f(buffer, access))
    }

    /// # Safety
    ///
    /// A GL context exposing the extension must be current.
    pub(crate) unsafe fn map_named_buffer_range(
        &self,
        buffer: GLuint,
        offset: GLintptr,
        length: GLsizeiptr,
        access: GLbitfield,
    ) -> Option<*mut c_void> {
        self.map_named_buffer_range
            .map(|f| f(buffer, offset, length, access))
    }

    /// # Safety
    ///
    /// A GL context exposing the extension must be current.
    pub(crate) unsafe fn get_named_buffer_parameteriv(&self, buffer: GLuint, pname: GLenum) -> Option<GLint> {
        self.get_named_buffer_parameteriv.map(|f| {
            let mut value: GLint = 0;
            f(buffer, pname, &mut value);
            value
        })
    }
}
