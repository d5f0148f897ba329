//! Size, color and matrix types shared by the transform solver and the renderer.
//!
//! Canonical pixel space:
//! - Origin top-left
//! - +X right, +Y down
//!
//! Normalized device coordinates are +Y up; the flip between the two is done
//! explicitly by `render::VertexSolver`.

mod affine;
mod color;
mod mat4;
mod size;

pub use affine::{Affine2, RectFit};
pub use color::ColorRgba;
pub use mat4::Mat4;
pub use size::Size;
