/// Driver module - the native entry point surface and its value types

pub mod driver;
pub mod types;
pub mod software_driver;

pub use driver::*;
pub use types::*;
pub use software_driver::SoftwareDriver;
