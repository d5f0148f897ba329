/// Column-major 4x4 matrix, laid out the way WGSL `mat4x4<f32>` expects.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Mat4 {
    pub cols: [[f32; 4]; 4],
}

impl Default for Mat4 {
    fn default() -> Self {
        Self::identity()
    }
}

impl Mat4 {
    pub const fn identity() -> Self {
        Self {
            cols: [
                [1.0, 0.0, 0.0, 0.0],
                [0.0, 1.0, 0.0, 0.0],
                [0.0, 0.0, 1.0, 0.0],
                [0.0, 0.0, 0.0, 1.0],
            ],
        }
    }

    /// `uv' = uv * scale + offset` on the x/y axes.
    pub const fn scale_offset(sx: f32, sy: f32, tx: f32, ty: f32) -> Self {
        Self {
            cols: [
                [sx, 0.0, 0.0, 0.0],
                [0.0, sy, 0.0, 0.0],
                [0.0, 0.0, 1.0, 0.0],
                [tx, ty, 0.0, 1.0],
            ],
        }
    }

    /// Multiplies the column vector `v` by this matrix.
    pub fn mul_vec4(&self, v: [f32; 4]) -> [f32; 4] {
        let mut out = [0.0f32; 4];
        for (col, &k) in self.cols.iter().zip(v.iter()) {
            for (o, &m) in out.iter_mut().zip(col.iter()) {
                *o += m * k;
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scale_offset_maps_unit_corner() {
        let m = Mat4::scale_offset(0.5, 0.25, 0.1, 0.2);
        let v = m.mul_vec4([1.0, 1.0, 0.0, 1.0]);
        assert!((v[0] - 0.6).abs() < 1e-6);
        assert!((v[1] - 0.45).abs() < 1e-6);
        assert_eq!(v[3], 1.0);
    }

    #[test]
    fn identity_is_neutral() {
        let v = [3.0, -2.0, 0.5, 1.0];
        assert_eq!(Mat4::identity().mul_vec4(v), v);
    }
}
