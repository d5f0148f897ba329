/// 2D affine transform in pixel space.
///
/// Maps `(x, y)` to `(a*x + c*y + e, b*x + d*y + f)`.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Affine2 {
    pub a: f32,
    pub b: f32,
    pub c: f32,
    pub d: f32,
    pub e: f32,
    pub f: f32,
}

/// How `Affine2::rect_to_rect` places the source inside the destination.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum RectFit {
    /// Independent x/y scale; fills the destination exactly.
    Fill,
    /// Uniform scale, aligned to the top-left edge.
    Start,
    /// Uniform scale, centered.
    Center,
    /// Uniform scale, aligned to the bottom-right edge.
    End,
}

impl Default for Affine2 {
    fn default() -> Self {
        Self::identity()
    }
}

impl Affine2 {
    #[inline]
    pub const fn identity() -> Self {
        Self { a: 1.0, b: 0.0, c: 0.0, d: 1.0, e: 0.0, f: 0.0 }
    }

    #[inline]
    pub const fn translation(tx: f32, ty: f32) -> Self {
        Self { a: 1.0, b: 0.0, c: 0.0, d: 1.0, e: tx, f: ty }
    }

    #[inline]
    pub const fn scaling(sx: f32, sy: f32) -> Self {
        Self { a: sx, b: 0.0, c: 0.0, d: sy, e: 0.0, f: 0.0 }
    }

    /// Rotation by `quarter_turns * 90°`, clockwise on a y-down screen.
    ///
    /// Exact for every multiple of 90° (no trigonometric rounding).
    pub const fn quarter_turns(quarter_turns: u32) -> Self {
        let (cos, sin) = match quarter_turns % 4 {
            0 => (1.0, 0.0),
            1 => (0.0, 1.0),
            2 => (-1.0, 0.0),
            _ => (0.0, -1.0),
        };
        Self { a: cos, b: sin, c: -sin, d: cos, e: 0.0, f: 0.0 }
    }

    /// Returns the transform that applies `self` first, then `next`.
    #[must_use]
    pub fn then(self, next: Affine2) -> Affine2 {
        Affine2 {
            a: next.a * self.a + next.c * self.b,
            b: next.b * self.a + next.d * self.b,
            c: next.a * self.c + next.c * self.d,
            d: next.b * self.c + next.d * self.d,
            e: next.a * self.e + next.c * self.f + next.e,
            f: next.b * self.e + next.d * self.f + next.f,
        }
    }

    #[inline]
    pub fn map_point(self, p: [f32; 2]) -> [f32; 2] {
        [
            self.a * p[0] + self.c * p[1] + self.e,
            self.b * p[0] + self.d * p[1] + self.f,
        ]
    }

    /// Maps the rect `(0, 0, src_w, src_h)` onto `(0, 0, dst_w, dst_h)`.
    ///
    /// Degenerate source rects yield the identity.
    pub fn rect_to_rect(src_w: f32, src_h: f32, dst_w: f32, dst_h: f32, fit: RectFit) -> Affine2 {
        if src_w <= 0.0 || src_h <= 0.0 {
            return Affine2::identity();
        }

        let sx = dst_w / src_w;
        let sy = dst_h / src_h;
        if fit == RectFit::Fill {
            return Affine2::scaling(sx, sy);
        }

        let s = sx.min(sy);
        let (tx, ty) = match fit {
            RectFit::Start | RectFit::Fill => (0.0, 0.0),
            RectFit::Center => ((dst_w - src_w * s) / 2.0, (dst_h - src_h * s) / 2.0),
            RectFit::End => (dst_w - src_w * s, dst_h - src_h * s),
        };
        Affine2::scaling(s, s).then(Affine2::translation(tx, ty))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(p: [f32; 2], q: [f32; 2]) -> bool {
        (p[0] - q[0]).abs() < 1e-4 && (p[1] - q[1]).abs() < 1e-4
    }

    #[test]
    fn then_applies_left_to_right() {
        let m = Affine2::translation(10.0, 0.0).then(Affine2::scaling(2.0, 2.0));
        assert!(close(m.map_point([1.0, 1.0]), [22.0, 2.0]));
    }

    #[test]
    fn quarter_turn_is_clockwise_on_y_down() {
        let m = Affine2::quarter_turns(1);
        // +X axis turns into +Y (down).
        assert!(close(m.map_point([1.0, 0.0]), [0.0, 1.0]));
        assert!(close(m.map_point([0.0, 1.0]), [-1.0, 0.0]));
    }

    #[test]
    fn four_quarter_turns_are_identity() {
        let m = (0..4).fold(Affine2::identity(), |acc, _| acc.then(Affine2::quarter_turns(1)));
        assert_eq!(m, Affine2::identity());
    }

    #[test]
    fn rect_to_rect_center_letterboxes() {
        let m = Affine2::rect_to_rect(100.0, 50.0, 100.0, 100.0, RectFit::Center);
        assert!(close(m.map_point([0.0, 0.0]), [0.0, 25.0]));
        assert!(close(m.map_point([100.0, 50.0]), [100.0, 75.0]));
    }

    #[test]
    fn rect_to_rect_end_aligns_bottom_right() {
        let m = Affine2::rect_to_rect(100.0, 50.0, 100.0, 100.0, RectFit::End);
        assert!(close(m.map_point([100.0, 50.0]), [100.0, 100.0]));
    }

    #[test]
    fn rect_to_rect_degenerate_source_is_identity() {
        assert_eq!(
            Affine2::rect_to_rect(0.0, 10.0, 100.0, 100.0, RectFit::Fill),
            Affine2::identity()
        );
    }
}
