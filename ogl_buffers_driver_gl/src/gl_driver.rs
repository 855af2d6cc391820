/// GlDriver - OpenGL implementation of the buffer layer's `Driver` trait
///
/// Core entry points come from the `gl` bindings (process-wide function
/// pointers). The direct-state-access extension is resolved separately.
/// Entry points that were not loaded are never called: the call records
/// `INVALID_OPERATION` in a local flag, returned by the next `take_error`,
/// and yields null or 0.

use std::ffi::c_void;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{PoisonError, RwLock};
use gl::types::{GLboolean, GLint, GLint64, GLintptr, GLsizeiptr, GLuint};
use ogl_buffers::ogl::driver::{
    AccessMode, BufferId, BufferParameter, BufferTarget, BufferUsage, ContextHandle,
    ContextSource, Driver, DriverVersion, RangeAccess, INVALID_OPERATION, LOAD_ERROR_NO_VERSION,
    NO_ERROR,
};

use crate::gl_ext::DirectStateAccessExt;
use crate::gl_info::GlInfo;

const SOURCE: &str = "ogl::gl";

/// Logs the entry point name when the `trace-calls` feature is on
macro_rules! trace_call {
    ($name:expr) => {
        #[cfg(feature = "trace-calls")]
        ogl_buffers::ogl_trace!(SOURCE, "{}", $name);
    };
}

/// OpenGL driver
pub struct GlDriver {
    ext: DirectStateAccessExt,
    info: RwLock<Option<GlInfo>>,
    context_source: Box<dyn Fn() -> ContextHandle + Send + Sync>,
    /// Error raised locally for entry points that are not loaded
    pending_error: AtomicU32,
}

impl GlDriver {
    /// Resolve every entry point through `loader`.
    ///
    /// `loader` is the windowing layer's proc-address lookup; it may be
    /// called before any context exists. `context_source` must return a
    /// handle identifying the context current on the calling thread.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use std::sync::Arc;
    /// use ogl_buffers::ogl::Runtime;
    /// use ogl_buffers::ogl::driver::ContextHandle;
    /// use ogl_buffers_driver_gl::GlDriver;
    ///
    /// # fn get_proc_address(_: &str) -> *const std::ffi::c_void { std::ptr::null() }
    /// let driver = GlDriver::load_with(get_proc_address, || ContextHandle(1));
    /// let ctx = Runtime::init(Arc::new(driver))?;
    /// # Ok::<(), ogl_buffers::ogl::Error>(())
    /// ```
    pub fn load_with<L, C>(mut loader: L, context_source: C) -> Self
    where
        L: FnMut(&'static str) -> *const c_void,
        C: Fn() -> ContextHandle + Send + Sync + 'static,
    {
        let ext = DirectStateAccessExt::load_with(&mut loader);
        gl::load_with(&mut loader);

        Self {
            ext,
            info: RwLock::new(None),
            context_source: Box::new(context_source),
            pending_error: AtomicU32::new(NO_ERROR),
        }
    }

    fn core_loaded() -> bool {
        gl::GetString::is_loaded()
            && gl::GetError::is_loaded()
            && gl::GetIntegerv::is_loaded()
            && gl::GenBuffers::is_loaded()
            && gl::DeleteBuffers::is_loaded()
            && gl::BindBuffer::is_loaded()
            && gl::BufferData::is_loaded()
            && gl::GetBufferParameteriv::is_loaded()
            && gl::MapBuffer::is_loaded()
            && gl::UnmapBuffer::is_loaded()
    }

    /// Record a local error and report whether `loaded` allows the call
    fn require(&self, loaded: bool, name: &str) -> bool {
        if !loaded {
            let _ = self.pending_error.compare_exchange(
                NO_ERROR,
                INVALID_OPERATION,
                Ordering::AcqRel,
                Ordering::Acquire,
            );
            ogl_buffers::ogl_debug!(SOURCE, "{} is not loaded", name);
        }
        loaded
    }

    fn info(&self) -> Option<GlInfo> {
        self.info.read().unwrap_or_else(PoisonError::into_inner).clone()
    }
}

fn object(id: BufferId) -> GLuint {
    id.0
}

impl ContextSource for GlDriver {
    fn current_context(&self) -> ContextHandle {
        (self.context_source)()
    }
}

impl Driver for GlDriver {
    // ===== LOADING / CAPABILITIES =====

    fn load(&self) -> std::result::Result<(), u32> {
        if !Self::core_loaded() {
            ogl_buffers::ogl_error!(SOURCE, "Core buffer entry points are not loaded");
            return Err(LOAD_ERROR_NO_VERSION);
        }

        // SAFETY: core entry points are loaded; the caller made a context current
        let Some(info) = (unsafe { GlInfo::query() }) else {
            ogl_buffers::ogl_error!(SOURCE, "Context reports no usable GL_VERSION");
            return Err(LOAD_ERROR_NO_VERSION);
        };

        if info.extensions.contains(ogl_buffers::ogl::DIRECT_STATE_ACCESS_EXTENSION) && !self.ext.is_complete() {
            ogl_buffers::ogl_warn!(SOURCE, "Direct state access is advertised but its entry points did not resolve");
        }
        ogl_buffers::ogl_debug!(
            SOURCE,
            "GL {} with {} extensions",
            info.version,
            info.extensions.len()
        );

        *self.info.write().unwrap_or_else(PoisonError::into_inner) = Some(info);
        Ok(())
    }

    fn version(&self) -> DriverVersion {
        self.info().map_or(DriverVersion::new(0, 0), |info| info.version)
    }

    fn has_extension(&self, name: &str) -> bool {
        if name == ogl_buffers::ogl::DIRECT_STATE_ACCESS_EXTENSION && !self.ext.is_complete() {
            return false;
        }
        self.info().is_some_and(|info| info.extensions.contains(name))
    }

    fn take_error(&self) -> u32 {
        let pending = self.pending_error.swap(NO_ERROR, Ordering::AcqRel);
        if pending != NO_ERROR || !gl::GetError::is_loaded() {
            return pending;
        }
        // SAFETY: loaded, context current
        unsafe { gl::GetError() }
    }

    // ===== OBJECTS / BINDING =====

    fn gen_buffer(&self) -> BufferId {
        trace_call!("glGenBuffers");
        if !self.require(gl::GenBuffers::is_loaded(), "glGenBuffers") {
            return BufferId::NONE;
        }
        let mut id: GLuint = 0;
        // SAFETY: one name written into `id`
        unsafe { gl::GenBuffers(1, &mut id) };
        BufferId(id)
    }

    fn delete_buffer(&self, id: BufferId) {
        trace_call!("glDeleteBuffers");
        if !self.require(gl::DeleteBuffers::is_loaded(), "glDeleteBuffers") {
            return;
        }
        let name = object(id);
        // SAFETY: one name read from `name`
        unsafe { gl::DeleteBuffers(1, &name) };
    }

    fn bind_buffer(&self, target: BufferTarget, id: BufferId) {
        trace_call!("glBindBuffer");
        if self.require(gl::BindBuffer::is_loaded(), "glBindBuffer") {
            // SAFETY: loaded; names are plain integers
            unsafe { gl::BindBuffer(target.gl_enum(), object(id)) };
        }
    }

    fn get_integer(&self, pname: u32) -> i32 {
        trace_call!("glGetIntegerv");
        if !self.require(gl::GetIntegerv::is_loaded(), "glGetIntegerv") {
            return 0;
        }
        let mut value: GLint = 0;
        // SAFETY: one integer written into `value`
        unsafe { gl::GetIntegerv(pname, &mut value) };
        value
    }

    fn buffer_data(&self, target: BufferTarget, size: usize, data: Option<&[u8]>, usage: BufferUsage) {
        trace_call!("glBufferData");
        if !self.require(gl::BufferData::is_loaded(), "glBufferData") {
            return;
        }
        let ptr = data.map_or(std::ptr::null(), |d| d.as_ptr() as *const c_void);
        // SAFETY: `ptr` is null or points to `size` readable bytes
        unsafe { gl::BufferData(target.gl_enum(), size as GLsizeiptr, ptr, usage.gl_enum()) };
    }

    // ===== PARAMETER QUERIES =====

    fn buffer_parameter(&self, target: BufferTarget, pname: BufferParameter) -> i64 {
        trace_call!("glGetBufferParameter");
        if gl::GetBufferParameteri64v::is_loaded() {
            let mut value: GLint64 = 0;
            // SAFETY: one 64-bit integer written into `value`
            unsafe { gl::GetBufferParameteri64v(target.gl_enum(), pname.gl_enum(), &mut value) };
            return value;
        }
        if !self.require(gl::GetBufferParameteriv::is_loaded(), "glGetBufferParameteriv") {
            return 0;
        }
        let mut value: GLint = 0;
        // SAFETY: one integer written into `value`
        unsafe { gl::GetBufferParameteriv(target.gl_enum(), pname.gl_enum(), &mut value) };
        value as i64
    }

    fn named_buffer_parameter(&self, id: BufferId, pname: BufferParameter) -> i64 {
        trace_call!("glGetNamedBufferParameteri64v");
        if !self.require(gl::GetNamedBufferParameteri64v::is_loaded(), "glGetNamedBufferParameteri64v") {
            return 0;
        }
        let mut value: GLint64 = 0;
        // SAFETY: one 64-bit integer written into `value`
        unsafe { gl::GetNamedBufferParameteri64v(object(id), pname.gl_enum(), &mut value) };
        value
    }

    fn named_buffer_parameter_ext(&self, id: BufferId, pname: BufferParameter) -> i64 {
        trace_call!("glGetNamedBufferParameterivEXT");
        // SAFETY: the extension is resolved whenever this returns Some
        let value = unsafe { self.ext.get_named_buffer_parameteriv(object(id), pname.gl_enum()) };
        match value {
            Some(value) => value as i64,
            None => {
                self.require(false, "glGetNamedBufferParameterivEXT");
                0
            }
        }
    }

    // ===== MAPPING =====

    fn map_buffer(&self, target: BufferTarget, access: AccessMode) -> *mut u8 {
        trace_call!("glMapBuffer");
        if !self.require(gl::MapBuffer::is_loaded(), "glMapBuffer") {
            return std::ptr::null_mut();
        }
        // SAFETY: loaded; a null result is handled by the caller
        unsafe { gl::MapBuffer(target.gl_enum(), access.gl_enum()) as *mut u8 }
    }

    fn map_buffer_range(
        &self,
        target: BufferTarget,
        offset: usize,
        length: usize,
        access: RangeAccess,
    ) -> *mut u8 {
        trace_call!("glMapBufferRange");
        if !self.require(gl::MapBufferRange::is_loaded(), "glMapBufferRange") {
            return std::ptr::null_mut();
        }
        // SAFETY: loaded; the driver validates the range against the store
        unsafe {
            gl::MapBufferRange(
                target.gl_enum(),
                offset as GLintptr,
                length as GLsizeiptr,
                access.bits(),
            ) as *mut u8
        }
    }

    fn map_named_buffer(&self, id: BufferId, access: AccessMode) -> *mut u8 {
        trace_call!("glMapNamedBuffer");
        if !self.require(gl::MapNamedBuffer::is_loaded(), "glMapNamedBuffer") {
            return std::ptr::null_mut();
        }
        // SAFETY: loaded; a null result is handled by the caller
        unsafe { gl::MapNamedBuffer(object(id), access.gl_enum()) as *mut u8 }
    }

    fn map_named_buffer_range(
        &self,
        id: BufferId,
        offset: usize,
        length: usize,
        access: RangeAccess,
    ) -> *mut u8 {
        trace_call!("glMapNamedBufferRange");
        if !self.require(gl::MapNamedBufferRange::is_loaded(), "glMapNamedBufferRange") {
            return std::ptr::null_mut();
        }
        // SAFETY: loaded; the driver validates the range against the store
        unsafe {
            gl::MapNamedBufferRange(
                object(id),
                offset as GLintptr,
                length as GLsizeiptr,
                access.bits(),
            ) as *mut u8
        }
    }

    fn map_named_buffer_ext(&self, id: BufferId, access: AccessMode) -> *mut u8 {
        trace_call!("glMapNamedBufferEXT");
        // SAFETY: the extension is resolved whenever this returns Some
        match unsafe { self.ext.map_named_buffer(object(id), access.gl_enum()) } {
            Some(ptr) => ptr as *mut u8,
            None => {
                self.require(false, "glMapNamedBufferEXT");
                std::ptr::null_mut()
            }
        }
    }

    fn map_named_buffer_range_ext(
        &self,
        id: BufferId,
        offset: usize,
        length: usize,
        access: RangeAccess,
    ) -> *mut u8 {
        trace_call!("glMapNamedBufferRangeEXT");
        // SAFETY: the extension is resolved whenever this returns Some
        let ptr = unsafe {
            self.ext.map_named_buffer_range(
                object(id),
                offset as GLintptr,
                length as GLsizeiptr,
                access.bits(),
            )
        };
        match ptr {
            Some(ptr) => ptr as *mut u8,
            None => {
                self.require(false, "glMapNamedBufferRangeEXT");
                std::ptr::null_mut()
            }
        }
    }

    fn unmap_buffer(&self, target: BufferTarget) -> bool {
        trace_call!("glUnmapBuffer");
        if !self.require(gl::UnmapBuffer::is_loaded(), "glUnmapBuffer") {
            return false;
        }
        // SAFETY: loaded, context current
        let result: GLboolean = unsafe { gl::UnmapBuffer(target.gl_enum()) };
        result == gl::TRUE
    }
}

#[cfg(test)]
#[path = "gl_driver_tests.rs"]
mod tests;
