use crate::coords::Size;

/// Output pixel layouts a sink or listener can request.
///
/// Byte order is memory order: `Rgba8888` delivers `R, G, B, A` per pixel.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum PixelEncoding {
    Rgba8888,
    Rgbx8888,
    Bgra8888,
    Bgrx8888,
    Rgb888,
    Rgb565,
    /// Planar 4:2:0, Y then U then V.
    Yu12,
    /// Planar 4:2:0, Y then V then U.
    Yv12,
    /// Semi-planar 4:2:0, interleaved UV.
    Nv12,
    /// Semi-planar 4:2:0, interleaved VU.
    Nv21,
    /// Planar 4:4:4.
    I444,
    Yuyv,
    Yvyu,
    Uyvy,
    Vyuy,
}

/// Shader family an encoding is rendered with.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum LayoutFamily {
    /// One output texel per pixel; channel reorder only.
    Swizzle,
    Rgb888,
    Rgb565,
    Planar420,
    SemiPlanar420,
    Planar444,
    Packed422,
}

impl LayoutFamily {
    pub(crate) fn fragment_entry(self) -> &'static str {
        match self {
            LayoutFamily::Swizzle => "fs_swizzle",
            LayoutFamily::Rgb888 => "fs_rgb888",
            LayoutFamily::Rgb565 => "fs_rgb565",
            LayoutFamily::Planar420 => "fs_planar420",
            LayoutFamily::SemiPlanar420 => "fs_semi_planar",
            LayoutFamily::Planar444 => "fs_planar444",
            LayoutFamily::Packed422 => "fs_packed422",
        }
    }

    pub(crate) fn vertex_entry(self) -> &'static str {
        match self {
            LayoutFamily::Swizzle => "vs_compose",
            _ => "vs_fullscreen",
        }
    }
}

/// Viewport size relative to the logical output size, as two fractions.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct PackingRatio {
    pub width_num: u32,
    pub width_den: u32,
    pub height_num: u32,
    pub height_den: u32,
}

impl PackingRatio {
    const fn new(width_num: u32, width_den: u32, height_num: u32, height_den: u32) -> Self {
        Self { width_num, width_den, height_num, height_den }
    }

    /// Scales `size`, rounding each component down. Widths that are not a
    /// multiple of 4 therefore lose a partial texel for RGB888 and the YUV
    /// encodings.
    pub fn apply(self, size: Size) -> Size {
        let w = size.width as u64 * self.width_num as u64 / self.width_den as u64;
        let h = size.height as u64 * self.height_num as u64 / self.height_den as u64;
        Size::new(w as u32, h as u32)
    }
}

// Component selectors used by the packing shaders.
const Y: u32 = 0;
const U: u32 = 1;
const V: u32 = 2;

impl PixelEncoding {
    pub const ALL: [PixelEncoding; 15] = [
        PixelEncoding::Rgba8888,
        PixelEncoding::Rgbx8888,
        PixelEncoding::Bgra8888,
        PixelEncoding::Bgrx8888,
        PixelEncoding::Rgb888,
        PixelEncoding::Rgb565,
        PixelEncoding::Yu12,
        PixelEncoding::Yv12,
        PixelEncoding::Nv12,
        PixelEncoding::Nv21,
        PixelEncoding::I444,
        PixelEncoding::Yuyv,
        PixelEncoding::Yvyu,
        PixelEncoding::Uyvy,
        PixelEncoding::Vyuy,
    ];

    pub fn family(self) -> LayoutFamily {
        use PixelEncoding::*;
        match self {
            Rgba8888 | Rgbx8888 | Bgra8888 | Bgrx8888 => LayoutFamily::Swizzle,
            Rgb888 => LayoutFamily::Rgb888,
            Rgb565 => LayoutFamily::Rgb565,
            Yu12 | Yv12 => LayoutFamily::Planar420,
            Nv12 | Nv21 => LayoutFamily::SemiPlanar420,
            I444 => LayoutFamily::Planar444,
            Yuyv | Yvyu | Uyvy | Vyuy => LayoutFamily::Packed422,
        }
    }

    pub fn packing_ratio(self) -> PackingRatio {
        match self.family() {
            LayoutFamily::Swizzle => PackingRatio::new(1, 1, 1, 1),
            LayoutFamily::Rgb888 => PackingRatio::new(3, 4, 1, 1),
            LayoutFamily::Rgb565 | LayoutFamily::Packed422 => PackingRatio::new(1, 2, 1, 1),
            LayoutFamily::Planar420 | LayoutFamily::SemiPlanar420 => PackingRatio::new(1, 4, 3, 2),
            LayoutFamily::Planar444 => PackingRatio::new(1, 4, 3, 1),
        }
    }

    /// Size of the RGBA8 render target, in texels, for a logical output size.
    pub fn viewport_size(self, content: Size) -> Size {
        self.packing_ratio().apply(content)
    }

    /// Tightly packed byte count of one frame at `content` size.
    pub fn frame_bytes(self, content: Size) -> usize {
        self.viewport_size(content).area() as usize * 4
    }

    /// Whether one output texel depends on more than one source pixel.
    pub fn needs_neighbor_lookup(self) -> bool {
        self.family() != LayoutFamily::Swizzle
    }

    /// Table-driven component order, interpreted per family:
    ///
    /// - `Swizzle`: source channel written to each output channel.
    /// - `Planar420` / `SemiPlanar420` / `Planar444`: `[1]` and `[2]` name the
    ///   first and second chroma component (`U` = 1, `V` = 2).
    /// - `Packed422`: index into the `(Y0, U, Y1, V)` tuple per output byte.
    pub fn component_order(self) -> [u32; 4] {
        use PixelEncoding::*;
        match self {
            Rgba8888 | Rgbx8888 | Rgb888 | Rgb565 => [0, 1, 2, 3],
            Bgra8888 | Bgrx8888 => [2, 1, 0, 3],
            Yu12 | Nv12 | I444 => [Y, U, V, 0],
            Yv12 | Nv21 => [Y, V, U, 0],
            Yuyv => [0, 1, 2, 3],
            Yvyu => [0, 3, 2, 1],
            Uyvy => [1, 0, 3, 2],
            Vyuy => [3, 0, 1, 2],
        }
    }

    /// The fourth channel is padding and written as opaque.
    pub fn forces_opaque(self) -> bool {
        matches!(self, PixelEncoding::Rgbx8888 | PixelEncoding::Bgrx8888)
    }

    /// Reorders an RGBA colour into this encoding's channel order.
    ///
    /// Used for clear colours of swizzle encodings, which bypass the shader.
    pub fn swizzle_color(self, rgba: [f64; 4]) -> [f64; 4] {
        let order = self.component_order();
        let mut out = [0.0; 4];
        for (o, idx) in out.iter_mut().zip(order) {
            *o = rgba[idx as usize];
        }
        if self.forces_opaque() {
            out[3] = 1.0;
        }
        out
    }

    pub fn name(self) -> &'static str {
        use PixelEncoding::*;
        match self {
            Rgba8888 => "RGBA8888",
            Rgbx8888 => "RGBX8888",
            Bgra8888 => "BGRA8888",
            Bgrx8888 => "BGRX8888",
            Rgb888 => "RGB888",
            Rgb565 => "RGB565",
            Yu12 => "YU12",
            Yv12 => "YV12",
            Nv12 => "NV12",
            Nv21 => "NV21",
            I444 => "I444",
            Yuyv => "YUYV",
            Yvyu => "YVYU",
            Uyvy => "UYVY",
            Vyuy => "VYUY",
        }
    }
}

impl std::fmt::Display for PixelEncoding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Round-half-up quantization of `value` in `[0, 1]` to `0..=max`.
///
/// Mirrors the RGB565 shader path.
pub fn quantize(value: f32, max: u32) -> u32 {
    let m = max as f32;
    (value * m + 0.5).floor().clamp(0.0, m) as u32
}

/// Packs a normalized colour into a 5/6/5 pixel.
pub fn pack_rgb565(r: f32, g: f32, b: f32) -> u16 {
    ((quantize(r, 31) << 11) | (quantize(g, 63) << 5) | quantize(b, 31)) as u16
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn viewport_table() {
        let c = Size::new(1920, 1080);
        let cases = [
            (PixelEncoding::Rgba8888, Size::new(1920, 1080)),
            (PixelEncoding::Bgrx8888, Size::new(1920, 1080)),
            (PixelEncoding::Rgb888, Size::new(1440, 1080)),
            (PixelEncoding::Rgb565, Size::new(960, 1080)),
            (PixelEncoding::Yu12, Size::new(480, 1620)),
            (PixelEncoding::Nv21, Size::new(480, 1620)),
            (PixelEncoding::I444, Size::new(480, 3240)),
            (PixelEncoding::Uyvy, Size::new(960, 1080)),
        ];
        for (enc, expected) in cases {
            assert_eq!(enc.viewport_size(c), expected, "{enc}");
        }
    }

    #[test]
    fn frame_bytes_match_layouts() {
        let c = Size::new(1280, 720);
        let px = 1280 * 720;
        assert_eq!(PixelEncoding::Rgba8888.frame_bytes(c), px * 4);
        assert_eq!(PixelEncoding::Rgb888.frame_bytes(c), px * 3);
        assert_eq!(PixelEncoding::Rgb565.frame_bytes(c), px * 2);
        assert_eq!(PixelEncoding::Nv12.frame_bytes(c), px * 3 / 2);
        assert_eq!(PixelEncoding::I444.frame_bytes(c), px * 3);
        assert_eq!(PixelEncoding::Yvyu.frame_bytes(c), px * 2);
    }

    #[test]
    fn zero_content_gives_zero_viewport() {
        for enc in PixelEncoding::ALL {
            assert!(!enc.viewport_size(Size::zero()).is_positive());
        }
    }

    #[test]
    fn neighbor_lookup_only_for_packed_layouts() {
        for enc in PixelEncoding::ALL {
            let swizzle = enc.family() == LayoutFamily::Swizzle;
            assert_eq!(enc.needs_neighbor_lookup(), !swizzle, "{enc}");
        }
    }

    #[test]
    fn swizzled_clear_color() {
        let bg = [0.1, 0.2, 0.3, 0.5];
        assert_eq!(PixelEncoding::Bgra8888.swizzle_color(bg), [0.3, 0.2, 0.1, 0.5]);
        assert_eq!(PixelEncoding::Rgbx8888.swizzle_color(bg), [0.1, 0.2, 0.3, 1.0]);
    }

    #[test]
    fn odd_widths_round_down() {
        assert_eq!(PixelEncoding::Rgb888.viewport_size(Size::new(10, 2)), Size::new(7, 2));
        assert_eq!(PixelEncoding::Rgb565.viewport_size(Size::new(5, 2)), Size::new(2, 2));
        assert_eq!(PixelEncoding::Yu12.viewport_size(Size::new(10, 3)), Size::new(2, 4));
        assert_eq!(PixelEncoding::Rgb888.frame_bytes(Size::new(10, 2)), 7 * 2 * 4);
    }

    #[test]
    fn quantizer_boundaries() {
        assert_eq!(quantize(0.0, 31), 0);
        assert_eq!(quantize(1.0, 31), 31);
        assert_eq!(quantize(1.0, 63), 63);
        // Exact mid-bucket rounds up.
        assert_eq!(quantize(0.5, 31), 16);
        assert_eq!(quantize(0.5, 63), 32);
        // Out of range clamps.
        assert_eq!(quantize(-0.2, 31), 0);
        assert_eq!(quantize(1.7, 63), 63);
    }

    #[test]
    fn rgb565_packing() {
        assert_eq!(pack_rgb565(1.0, 1.0, 1.0), 0xFFFF);
        assert_eq!(pack_rgb565(1.0, 0.0, 0.0), 0xF800);
        assert_eq!(pack_rgb565(0.0, 1.0, 0.0), 0x07E0);
        assert_eq!(pack_rgb565(0.0, 0.0, 1.0), 0x001F);
    }
}
