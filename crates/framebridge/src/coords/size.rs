/// Width/height pair in physical pixels.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Hash)]
pub struct Size {
    pub width: u32,
    pub height: u32,
}

impl Size {
    #[inline]
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    #[inline]
    pub const fn zero() -> Self {
        Self { width: 0, height: 0 }
    }

    /// True when both dimensions are non-zero.
    #[inline]
    pub const fn is_positive(self) -> bool {
        self.width > 0 && self.height > 0
    }

    #[inline]
    pub const fn area(self) -> u64 {
        self.width as u64 * self.height as u64
    }

    /// Per-component override: each positive component of `explicit` wins,
    /// every other component falls back to `fallback`.
    pub fn resolve(explicit: Option<Size>, fallback: Size) -> Size {
        match explicit {
            None => fallback,
            Some(e) => Size {
                width: if e.width > 0 { e.width } else { fallback.width },
                height: if e.height > 0 { e.height } else { fallback.height },
            },
        }
    }

    #[inline]
    pub fn to_extent(self) -> wgpu::Extent3d {
        wgpu::Extent3d {
            width: self.width,
            height: self.height,
            depth_or_array_layers: 1,
        }
    }
}

impl std::fmt::Display for Size {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

impl From<winit::dpi::PhysicalSize<u32>> for Size {
    fn from(s: winit::dpi::PhysicalSize<u32>) -> Self {
        Size::new(s.width, s.height)
    }
}
