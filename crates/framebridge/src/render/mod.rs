//! GPU conversion subsystem.
//!
//! Each output pixel encoding has one program per render-target format. RGBA
//! layouts draw the transformed input quad directly. Every other layout first
//! composes the transformed input into an RGBA staging texture, then packs it
//! into a shrunk viewport whose texels hold four output bytes each.
//!
//! Convention:
//! - transform math is in pixels (top-left origin, +Y down)
//! - `VertexSolver` converts to NDC with an explicit flip

pub mod color_space;
pub mod encoding;
pub(crate) mod geometry;
pub(crate) mod pass;
pub(crate) mod program;
mod vertex;

pub use color_space::{ColorSpace, ColorUniform};
pub use encoding::{pack_rgb565, quantize, LayoutFamily, PackingRatio, PixelEncoding};
pub use geometry::{FrameUniform, GeometryBuffers, PackUniform, QuadVertex};
pub use pass::{DrawError, StagingTexture};
pub use program::{validate_wgsl, ConversionProgram, ProgramError, ProgramSet};
pub use vertex::VertexSolver;
