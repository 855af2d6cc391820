/// GL version and extension discovery
///
/// Parsing is kept separate from the queries so it can be tested without
/// a live context.

use std::ffi::CStr;
use std::os::raw::c_char;
use gl::types::{GLenum, GLint, GLuint};
use ogl_buffers::ogl::driver::DriverVersion;
use rustc_hash::FxHashSet;

/// First version with the indexed extension query
const INDEXED_EXTENSIONS_VERSION: DriverVersion = DriverVersion::new(3, 0);

/// What the current context reports about itself
#[derive(Debug, Clone)]
pub(crate) struct GlInfo {
    pub version: DriverVersion,
    pub extensions: FxHashSet<String>,
}

/// Parse a `GL_VERSION` string.
///
/// Accepts `"<major>.<minor>[.<release>] [vendor info]"` and the
/// `"OpenGL ES <major>.<minor> ..."` form.
pub(crate) fn parse_version(text: &str) -> Option<DriverVersion> {
    let text = text.trim();
    let text = text
        .strip_prefix("OpenGL ES-CM ")
        .or_else(|| text.strip_prefix("OpenGL ES-CL "))
        .or_else(|| text.strip_prefix("OpenGL ES "))
        .unwrap_or(text);

    let number = text.split_whitespace().next()?;
    let mut parts = number.split('.');
    let major = parts.next()?.parse().ok()?;
    let minor_digits: String = parts.next()?.chars().take_while(|c| c.is_ascii_digit()).collect();
    let minor = minor_digits.parse().ok()?;
    Some(DriverVersion::new(major, minor))
}

/// Parse the space-separated legacy `GL_EXTENSIONS` string
pub(crate) fn parse_extension_list(text: &str) -> FxHashSet<String> {
    text.split_whitespace().map(str::to_string).collect()
}

/// # Safety
///
/// `glGetString` must be loaded and a context current.
unsafe fn query_string(name: GLenum) -> Option<String> {
    let ptr = gl::GetString(name);
    if ptr.is_null() {
        return None;
    }
    Some(CStr::from_ptr(ptr as *const c_char).to_string_lossy().into_owned())
}

impl GlInfo {
    /// Query the current context. `None` if it reports no usable version.
    ///
    /// # Safety
    ///
    /// The core entry points must be loaded and a context current.
    pub(crate) unsafe fn query() -> Option<Self> {
        let version = parse_version(&query_string(gl::VERSION)?)?;

        let extensions = if version >= INDEXED_EXTENSIONS_VERSION && gl::GetStringi::is_loaded() {
            let mut count: GLint = 0;
            gl::GetIntegerv(gl::NUM_EXTENSIONS, &mut count);
            (0..count.max(0) as GLuint)
                .filter_map(|index| {
                    let ptr = gl::GetStringi(gl::EXTENSIONS, index);
                    if ptr.is_null() {
                        None
                    } else {
                        Some(CStr::from_ptr(ptr as *const c_char).to_string_lossy().into_owned())
                    }
                })
                .collect()
        } else {
            query_string(gl::EXTENSIONS)
                .map(|list| parse_extension_list(&list))
                .unwrap_or_default()
        };

        Some(Self { version, extensions })
    }
}

#[cfg(test)]
#[path = "gl_info_tests.rs"]
mod tests;
