/*!
# OGL Buffers - OpenGL Driver Backend

OpenGL implementation of the `ogl_buffers` driver trait.

Core entry points are loaded through the `gl` bindings; the
`GL_EXT_direct_state_access` entry points the core profile bindings do
not carry are resolved by hand through the same proc-address loader.

The windowing layer owns context creation. It hands the driver a loader
and a way to identify the current context, makes a context current, then
calls `Runtime::init`.
*/

mod gl_driver;
mod gl_ext;
mod gl_info;

pub use gl_driver::GlDriver;
