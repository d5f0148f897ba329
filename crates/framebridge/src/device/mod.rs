//! GPU device + surface management.
//!
//! This module is responsible for:
//! - creating the wgpu Instance/Adapter/Device/Queue without a window
//! - compiling the conversion programs for each render-target format
//! - creating and configuring sink surfaces

mod context;
mod init;
pub(crate) mod surface;

pub use context::{RenderingContext, OFFSCREEN_FORMAT};
pub use surface::SurfaceErrorAction;
pub use init::ContextInit;
