/// Driver-level value types: targets, identities, access modes, enum values

use std::fmt;

// ===== DRIVER ERROR / STATUS CODES =====

/// No error recorded
pub const NO_ERROR: u32 = 0;
/// An enum argument is out of range
pub const INVALID_ENUM: u32 = 0x0500;
/// A numeric argument is out of range
pub const INVALID_VALUE: u32 = 0x0501;
/// The operation is not allowed in the current state
pub const INVALID_OPERATION: u32 = 0x0502;
/// Not enough memory left to execute the command
pub const OUT_OF_MEMORY: u32 = 0x0505;

/// Load status: no usable driver version could be determined
pub const LOAD_ERROR_NO_VERSION: u32 = 1;
/// Load status: the driver is older than the minimum supported version
pub const LOAD_ERROR_VERSION_TOO_OLD: u32 = 2;

// ===== BUFFER TARGET =====

/// Binding point a buffer object is attached to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BufferTarget {
    /// Placeholder with no binding point
    Unused,
    Array,
    AtomicCounter,
    CopyRead,
    CopyWrite,
    DispatchIndirect,
    DrawIndirect,
    ElementArray,
    PixelPack,
    PixelUnpack,
    Query,
    ShaderStorage,
    Texture,
    TransformFeedback,
    Uniform,
}

impl BufferTarget {
    /// Every target, `Unused` first
    pub const ALL: [BufferTarget; 15] = [
        BufferTarget::Unused,
        BufferTarget::Array,
        BufferTarget::AtomicCounter,
        BufferTarget::CopyRead,
        BufferTarget::CopyWrite,
        BufferTarget::DispatchIndirect,
        BufferTarget::DrawIndirect,
        BufferTarget::ElementArray,
        BufferTarget::PixelPack,
        BufferTarget::PixelUnpack,
        BufferTarget::Query,
        BufferTarget::ShaderStorage,
        BufferTarget::Texture,
        BufferTarget::TransformFeedback,
        BufferTarget::Uniform,
    ];

    /// Driver enum value of the binding point (0 for `Unused`)
    pub fn gl_enum(&self) -> u32 {
        match self {
            BufferTarget::Unused => 0,
            BufferTarget::Array => 0x8892,
            BufferTarget::AtomicCounter => 0x92C0,
            BufferTarget::CopyRead => 0x8F36,
            BufferTarget::CopyWrite => 0x8F37,
            BufferTarget::DispatchIndirect => 0x90EE,
            BufferTarget::DrawIndirect => 0x8F3F,
            BufferTarget::ElementArray => 0x8893,
            BufferTarget::PixelPack => 0x88EB,
            BufferTarget::PixelUnpack => 0x88EC,
            BufferTarget::Query => 0x9192,
            BufferTarget::ShaderStorage => 0x90D2,
            BufferTarget::Texture => 0x8C2A,
            BufferTarget::TransformFeedback => 0x8C8E,
            BufferTarget::Uniform => 0x8A11,
        }
    }

    /// Reverse of [`BufferTarget::gl_enum`]
    pub fn from_gl_enum(value: u32) -> Option<BufferTarget> {
        Self::ALL.iter().copied().find(|t| t.gl_enum() == value)
    }

    /// Query enum returning the id currently bound to this target.
    ///
    /// Only nine targets have one. The others restore to "no buffer"
    /// when a bind bracket closes.
    pub fn binding_query(&self) -> Option<u32> {
        match self {
            BufferTarget::Array => Some(0x8894),
            BufferTarget::DispatchIndirect => Some(0x90EF),
            BufferTarget::ElementArray => Some(0x8895),
            BufferTarget::PixelPack => Some(0x88ED),
            BufferTarget::PixelUnpack => Some(0x88EF),
            BufferTarget::ShaderStorage => Some(0x90D3),
            BufferTarget::Texture => Some(0x8C2A),
            BufferTarget::TransformFeedback => Some(0x8C8F),
            BufferTarget::Uniform => Some(0x8A28),
            BufferTarget::Unused
            | BufferTarget::AtomicCounter
            | BufferTarget::CopyRead
            | BufferTarget::CopyWrite
            | BufferTarget::DrawIndirect
            | BufferTarget::Query => None,
        }
    }

    /// Reverse of [`BufferTarget::binding_query`]
    pub fn from_binding_query(pname: u32) -> Option<BufferTarget> {
        Self::ALL.iter().copied().find(|t| t.binding_query() == Some(pname))
    }

    /// Whether a buffer can be attached to this target at all
    pub fn has_binding_point(&self) -> bool {
        *self != BufferTarget::Unused
    }
}

// ===== IDENTITIES =====

/// Opaque device-side buffer identity (0 = no buffer)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct BufferId(pub u32);

impl BufferId {
    /// The "no buffer" identity
    pub const NONE: BufferId = BufferId(0);

    pub fn is_none(&self) -> bool {
        self.0 == 0
    }
}

impl fmt::Display for BufferId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Opaque handle of an execution context. Compared and hashed, never dereferenced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct ContextHandle(pub usize);

impl ContextHandle {
    /// No context current on the calling thread
    pub const NONE: ContextHandle = ContextHandle(0);

    /// Wrap a platform context pointer
    pub fn from_ptr<T>(ptr: *const T) -> Self {
        ContextHandle(ptr as usize)
    }
}

// ===== VERSION =====

/// Base driver version
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DriverVersion {
    pub major: u32,
    pub minor: u32,
}

impl DriverVersion {
    pub const fn new(major: u32, minor: u32) -> Self {
        Self { major, minor }
    }
}

impl fmt::Display for DriverVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}

// ===== ACCESS =====

/// Access requested for a whole-buffer mapping
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AccessMode {
    ReadOnly,
    WriteOnly,
    ReadWrite,
}

impl AccessMode {
    pub fn gl_enum(&self) -> u32 {
        match self {
            AccessMode::ReadOnly => 0x88B8,
            AccessMode::WriteOnly => 0x88B9,
            AccessMode::ReadWrite => 0x88BA,
        }
    }

    pub fn from_gl_enum(value: u32) -> Option<AccessMode> {
        match value {
            0x88B8 => Some(AccessMode::ReadOnly),
            0x88B9 => Some(AccessMode::WriteOnly),
            0x88BA => Some(AccessMode::ReadWrite),
            _ => None,
        }
    }

    pub fn allows_read(&self) -> bool {
        matches!(self, AccessMode::ReadOnly | AccessMode::ReadWrite)
    }

    pub fn allows_write(&self) -> bool {
        matches!(self, AccessMode::WriteOnly | AccessMode::ReadWrite)
    }

    /// Equivalent sub-range access bits
    pub fn range_access(&self) -> RangeAccess {
        match self {
            AccessMode::ReadOnly => RangeAccess::READ,
            AccessMode::WriteOnly => RangeAccess::WRITE,
            AccessMode::ReadWrite => RangeAccess::READ | RangeAccess::WRITE,
        }
    }
}

bitflags::bitflags! {
    /// Access bits for sub-range mappings
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct RangeAccess: u32 {
        const READ = 0x0001;
        const WRITE = 0x0002;
        /// Previous contents of the range may be discarded
        const INVALIDATE_RANGE = 0x0004;
        /// Previous contents of the whole buffer may be discarded
        const INVALIDATE_BUFFER = 0x0008;
        const FLUSH_EXPLICIT = 0x0010;
        const UNSYNCHRONIZED = 0x0020;
    }
}

impl RangeAccess {
    /// Whole-buffer access mode carrying the same read/write rights
    pub fn access_mode(&self) -> Option<AccessMode> {
        let read = self.contains(RangeAccess::READ);
        let write = self.contains(RangeAccess::WRITE);
        match (read, write) {
            (true, true) => Some(AccessMode::ReadWrite),
            (true, false) => Some(AccessMode::ReadOnly),
            (false, true) => Some(AccessMode::WriteOnly),
            (false, false) => None,
        }
    }
}

// ===== PARAMETERS / USAGE =====

/// Buffer object parameter names
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BufferParameter {
    /// Data store size in bytes
    Size,
    /// Usage hint given at allocation
    Usage,
    /// Access mode of the current mapping
    Access,
    /// Non-zero while mapped
    Mapped,
    MapOffset,
    MapLength,
}

impl BufferParameter {
    pub fn gl_enum(&self) -> u32 {
        match self {
            BufferParameter::Size => 0x8764,
            BufferParameter::Usage => 0x8765,
            BufferParameter::Access => 0x88BB,
            BufferParameter::Mapped => 0x88BC,
            BufferParameter::MapOffset => 0x9121,
            BufferParameter::MapLength => 0x9120,
        }
    }
}

/// Data store usage hint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BufferUsage {
    StreamDraw,
    StreamRead,
    StreamCopy,
    StaticDraw,
    StaticRead,
    StaticCopy,
    DynamicDraw,
    DynamicRead,
    DynamicCopy,
}

impl BufferUsage {
    const ALL: [BufferUsage; 9] = [
        BufferUsage::StreamDraw,
        BufferUsage::StreamRead,
        BufferUsage::StreamCopy,
        BufferUsage::StaticDraw,
        BufferUsage::StaticRead,
        BufferUsage::StaticCopy,
        BufferUsage::DynamicDraw,
        BufferUsage::DynamicRead,
        BufferUsage::DynamicCopy,
    ];

    pub fn gl_enum(&self) -> u32 {
        match self {
            BufferUsage::StreamDraw => 0x88E0,
            BufferUsage::StreamRead => 0x88E1,
            BufferUsage::StreamCopy => 0x88E2,
            BufferUsage::StaticDraw => 0x88E4,
            BufferUsage::StaticRead => 0x88E5,
            BufferUsage::StaticCopy => 0x88E6,
            BufferUsage::DynamicDraw => 0x88E8,
            BufferUsage::DynamicRead => 0x88E9,
            BufferUsage::DynamicCopy => 0x88EA,
        }
    }

    pub fn from_gl_enum(value: u32) -> Option<BufferUsage> {
        Self::ALL.iter().copied().find(|u| u.gl_enum() == value)
    }
}

#[cfg(test)]
#[path = "types_tests.rs"]
mod tests;
