use bytemuck::{Pod, Zeroable};

/// YUV coefficient set used by the luma/chroma programs.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq, Hash)]
pub enum ColorSpace {
    Bt601,
    #[default]
    Bt709,
    Bt2020,
}

/// Row vectors for `Y`, `U`, `V`. The fourth lane is unused padding.
///
/// Chroma gets its `+0.5` bias in the shader.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub struct ColorUniform {
    pub coef_y: [f32; 4],
    pub coef_u: [f32; 4],
    pub coef_v: [f32; 4],
}

impl ColorSpace {
    pub fn uniform(self) -> ColorUniform {
        let (y, u, v) = match self {
            ColorSpace::Bt601 => (
                [0.299, 0.587, 0.114],
                [-0.14713, -0.2886, 0.436],
                [0.615, -0.51499, -0.10001],
            ),
            ColorSpace::Bt709 => (
                [0.2126, 0.7152, 0.0722],
                [-0.09991, -0.33609, 0.436],
                [0.615, -0.55861, -0.05639],
            ),
            ColorSpace::Bt2020 => (
                [0.2627, 0.6780, 0.0593],
                [-0.13963, -0.36037, 0.5],
                [0.5, -0.45979, -0.04021],
            ),
        };
        ColorUniform {
            coef_y: [y[0], y[1], y[2], 0.0],
            coef_u: [u[0], u[1], u[2], 0.0],
            coef_v: [v[0], v[1], v[2], 0.0],
        }
    }

    /// CPU reference for one RGB sample, matching the shader math.
    pub fn rgb_to_yuv(self, rgb: [f32; 3]) -> [f32; 3] {
        let c = self.uniform();
        let dot = |k: [f32; 4]| k[0] * rgb[0] + k[1] * rgb[1] + k[2] * rgb[2];
        [dot(c.coef_y), dot(c.coef_u) + 0.5, dot(c.coef_v) + 0.5]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn round4(x: f32) -> f32 {
        (x * 10_000.0).round() / 10_000.0
    }

    #[test]
    fn luma_rows_sum_to_one() {
        for cs in [ColorSpace::Bt601, ColorSpace::Bt709, ColorSpace::Bt2020] {
            let y = cs.uniform().coef_y;
            assert_eq!(round4(y[0] + y[1] + y[2]), 1.0, "{cs:?}");
        }
    }

    #[test]
    fn chroma_rows_cancel_on_grey() {
        for cs in [ColorSpace::Bt601, ColorSpace::Bt709, ColorSpace::Bt2020] {
            let c = cs.uniform();
            assert!((c.coef_u[0] + c.coef_u[1] + c.coef_u[2]).abs() < 1e-3, "{cs:?}");
            assert!((c.coef_v[0] + c.coef_v[1] + c.coef_v[2]).abs() < 1e-3, "{cs:?}");
        }
    }

    #[test]
    fn bt709_white_and_black() {
        let white = ColorSpace::Bt709.rgb_to_yuv([1.0, 1.0, 1.0]);
        assert_eq!(round4(white[0]), 1.0);
        assert_eq!(round4(white[1]), 0.5);
        assert_eq!(round4(white[2]), 0.5);

        let black = ColorSpace::Bt709.rgb_to_yuv([0.0, 0.0, 0.0]);
        assert_eq!(black, [0.0, 0.5, 0.5]);
    }

    #[test]
    fn default_is_bt709() {
        assert_eq!(ColorSpace::default(), ColorSpace::Bt709);
    }

    #[test]
    fn uniform_is_three_vec4() {
        assert_eq!(std::mem::size_of::<ColorUniform>(), 48);
    }
}
