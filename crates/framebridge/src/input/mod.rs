//! Producer boundary: frames pushed into the bridge's streaming texture.

mod frame;
mod surface;
mod texture;

pub use frame::{CropRect, InputFrame};
pub use surface::InputSurface;
pub use texture::{content_from_matrix, sample_matrix, StreamingTexture};
