/*!
# OGL Buffers

Capability-adaptive mapping of GPU buffer objects.

At initialization the driver is probed once and one of three mapping
strategies is selected; every buffer then maps through it without
re-checking capabilities. Legacy (bind-based) operations run inside a
bind bracket that restores whatever was bound before, so the layer never
leaks binding state to unrelated code.

## Architecture

- **Driver**: the native entry points and capability surface (trait)
- **BufferContext**: the probed tier and shared strategy, passed to every buffer
- **MapStrategy**: modern direct, extension direct, or bind fallback
- **Buffer**: one buffer object; map / unmap / data store
- **MappedView**: typed, bounds-checked view that releases the mapping on drop
- **ContextLocal**: one value per execution context

Backends (the OpenGL driver crate, the built-in software driver) implement
`Driver`.
*/

// Internal modules
mod error;
mod runtime;
mod capability;
mod bind;
mod strategy;
mod context_registry;
mod buffer_context;
mod buffer;
mod mapped_view;
pub mod log;
pub mod driver;

// Main ogl namespace module
pub mod ogl {
    // Error types
    pub use crate::error::{Error, Result};

    // Runtime facade
    pub use crate::runtime::Runtime;

    // Capability probing
    pub use crate::capability::{
        CapabilityTier, DIRECT_ACCESS_VERSION, DIRECT_STATE_ACCESS_EXTENSION, MIN_DRIVER_VERSION,
    };

    // Shared context and strategies
    pub use crate::buffer_context::BufferContext;
    pub use crate::strategy::{
        BindFallbackStrategy, BufferHandle, DirectStrategy, ExtensionStrategy, MapStrategy,
    };

    // Buffers
    pub use crate::bind::{BindGuard, BindSlot};
    pub use crate::buffer::Buffer;
    pub use crate::mapped_view::MappedView;

    // Per-context state
    pub use crate::context_registry::ContextLocal;

    // Logging sub-module (types only, macros live at the crate root)
    pub mod log {
        pub use crate::log::{DefaultLogger, LogEntry, LogSeverity, Logger};
    }

    // Driver sub-module
    pub mod driver {
        pub use crate::driver::*;
    }
}

// Re-export the element-type trait bound used by typed views
pub use bytemuck;
