/// Straight-alpha RGBA color with `f32` components in `[0, 1]`.
///
/// Used as the clear color of every sink. Values are written to render targets
/// unconverted (targets are never sRGB).
#[derive(Debug, Copy, Clone, Default, PartialEq)]
pub struct ColorRgba {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl ColorRgba {
    #[inline]
    pub const fn new(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    #[inline]
    pub const fn black() -> Self {
        Self::new(0.0, 0.0, 0.0, 1.0)
    }

    #[inline]
    pub const fn white() -> Self {
        Self::new(1.0, 1.0, 1.0, 1.0)
    }

    /// Creates a color from a packed `0xAARRGGBB` value.
    pub fn from_argb_u32(argb: u32) -> Self {
        let ch = |shift: u32| ((argb >> shift) & 0xFF) as f32 / 255.0;
        Self::new(ch(16), ch(8), ch(0), ch(24))
    }

    #[inline]
    pub fn to_array(self) -> [f32; 4] {
        [self.r, self.g, self.b, self.a]
    }

    #[inline]
    pub fn is_finite(self) -> bool {
        self.r.is_finite() && self.g.is_finite() && self.b.is_finite() && self.a.is_finite()
    }
}
