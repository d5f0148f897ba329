//! Geometric placement of the input content inside a sink's output.
//!
//! A `Transform` turns `(content size, viewport size)` into a pixel-space
//! `Affine2`. Rotation is applied about the content centre first; the fit
//! policy then scales the rotated bounds into the viewport.

use crate::coords::{Affine2, RectFit, Size};

/// Pre-rotation applied to the content, clockwise on screen.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq, Hash)]
pub enum Rotation {
    #[default]
    Deg0,
    Deg90,
    Deg180,
    Deg270,
}

impl Rotation {
    pub const ALL: [Rotation; 4] = [
        Rotation::Deg0,
        Rotation::Deg90,
        Rotation::Deg180,
        Rotation::Deg270,
    ];

    /// Accepts any multiple of 90, including negative values.
    pub fn from_degrees(degrees: i32) -> Option<Self> {
        if degrees % 90 != 0 {
            return None;
        }
        Some(match degrees.rem_euclid(360) {
            0 => Rotation::Deg0,
            90 => Rotation::Deg90,
            180 => Rotation::Deg180,
            _ => Rotation::Deg270,
        })
    }

    pub fn degrees(self) -> u32 {
        self.quarter_turns() * 90
    }

    pub fn quarter_turns(self) -> u32 {
        match self {
            Rotation::Deg0 => 0,
            Rotation::Deg90 => 1,
            Rotation::Deg180 => 2,
            Rotation::Deg270 => 3,
        }
    }

    /// `true` for 90° and 270°, where width and height trade places.
    pub fn swaps_axes(self) -> bool {
        self.quarter_turns() % 2 == 1
    }

    /// The next rotation clockwise.
    pub fn next(self) -> Self {
        Self::ALL[(self.quarter_turns() as usize + 1) % 4]
    }
}

/// How rotated content is fitted into the viewport.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq, Hash)]
pub enum Fit {
    /// Non-uniform scale; content covers the viewport exactly.
    Fill,
    InsideStart,
    #[default]
    InsideCenter,
    InsideEnd,
    /// Uniform scale covering the viewport; overflow is cropped.
    CropStart,
    CropCenter,
    CropEnd,
}

impl Fit {
    pub const ALL: [Fit; 7] = [
        Fit::Fill,
        Fit::InsideStart,
        Fit::InsideCenter,
        Fit::InsideEnd,
        Fit::CropStart,
        Fit::CropCenter,
        Fit::CropEnd,
    ];

    pub fn next(self) -> Self {
        let idx = Self::ALL.iter().position(|f| *f == self).unwrap_or(0);
        Self::ALL[(idx + 1) % Self::ALL.len()]
    }
}

/// Rotation plus fit policy.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq, Hash)]
pub struct Transform {
    pub fit: Fit,
    pub rotation: Rotation,
}

impl Transform {
    pub const fn new(fit: Fit, rotation: Rotation) -> Self {
        Self { fit, rotation }
    }

    pub const fn fit(fit: Fit) -> Self {
        Self { fit, rotation: Rotation::Deg0 }
    }

    /// Pixel-space matrix mapping content onto the viewport.
    ///
    /// Degenerate content or viewport sizes produce the identity.
    pub fn matrix(&self, content: Size, viewport: Size) -> Affine2 {
        if !content.is_positive() || !viewport.is_positive() {
            return Affine2::identity();
        }

        let (tw, th) = (content.width as f32, content.height as f32);
        let (vw, vh) = (viewport.width as f32, viewport.height as f32);
        let (cw, ch) = if self.rotation.swaps_axes() { (th, tw) } else { (tw, th) };

        let rotate = if self.rotation == Rotation::Deg0 {
            Affine2::identity()
        } else {
            Affine2::translation(-tw / 2.0, -th / 2.0)
                .then(Affine2::quarter_turns(self.rotation.quarter_turns()))
                .then(Affine2::translation(cw / 2.0, ch / 2.0))
        };

        let fit = match self.fit {
            Fit::Fill => Affine2::rect_to_rect(cw, ch, vw, vh, RectFit::Fill),
            Fit::InsideStart => Affine2::rect_to_rect(cw, ch, vw, vh, RectFit::Start),
            Fit::InsideCenter => Affine2::rect_to_rect(cw, ch, vw, vh, RectFit::Center),
            Fit::InsideEnd => Affine2::rect_to_rect(cw, ch, vw, vh, RectFit::End),
            Fit::CropStart | Fit::CropCenter | Fit::CropEnd => {
                let s = (vw / cw).max(vh / ch);
                let (ox, oy) = (vw - cw * s, vh - ch * s);
                let (tx, ty) = match self.fit {
                    Fit::CropStart => (0.0, 0.0),
                    Fit::CropCenter => (ox / 2.0, oy / 2.0),
                    _ => (ox, oy),
                };
                Affine2::scaling(s, s).then(Affine2::translation(tx, ty))
            }
        };

        rotate.then(fit)
    }
}
