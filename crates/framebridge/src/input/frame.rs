use anyhow::{ensure, Result};

use crate::coords::Size;

/// Sub-rectangle of a frame holding the visible content.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Hash)]
pub struct CropRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl CropRect {
    pub const fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self { x, y, width, height }
    }

    pub const fn full(size: Size) -> Self {
        Self::new(0, 0, size.width, size.height)
    }

    pub const fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }
}

/// One RGBA8 frame pushed by a producer.
///
/// `stride` is the byte distance between rows and may exceed `4 * width`.
#[derive(Debug, Clone)]
pub struct InputFrame {
    pub size: Size,
    pub stride: u32,
    pub data: Vec<u8>,
    pub crop: Option<CropRect>,
}

impl InputFrame {
    /// Tightly packed frame.
    pub fn new(size: Size, data: Vec<u8>) -> Self {
        Self {
            size,
            stride: size.width * 4,
            data,
            crop: None,
        }
    }

    pub fn with_stride(mut self, stride: u32) -> Self {
        self.stride = stride;
        self
    }

    pub fn with_crop(mut self, crop: CropRect) -> Self {
        self.crop = Some(crop);
        self
    }

    /// Region the bridge treats as content.
    pub fn region(&self) -> CropRect {
        self.crop.unwrap_or_else(|| CropRect::full(self.size))
    }

    pub fn validate(&self) -> Result<()> {
        ensure!(self.size.is_positive(), "frame has zero size ({})", self.size);

        let row = self.size.width as u64 * 4;
        ensure!(
            self.stride as u64 >= row,
            "stride {} shorter than a row of {} bytes",
            self.stride,
            row
        );

        let needed = self.stride as u64 * (self.size.height as u64 - 1) + row;
        ensure!(
            self.data.len() as u64 >= needed,
            "frame data holds {} bytes, {} needed",
            self.data.len(),
            needed
        );

        if let Some(c) = self.crop {
            ensure!(c.width > 0 && c.height > 0, "crop has zero size");
            ensure!(
                c.x as u64 + c.width as u64 <= self.size.width as u64
                    && c.y as u64 + c.height as u64 <= self.size.height as u64,
                "crop {c:?} exceeds frame {}",
                self.size
            );
        }
        Ok(())
    }
}
