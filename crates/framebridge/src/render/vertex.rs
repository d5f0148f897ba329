use crate::coords::{Affine2, Size};
use crate::render::geometry::QuadVertex;
use crate::transform::Transform;

/// Pixel space is y-down, NDC is y-up.
const FLIP_Y: Affine2 = Affine2::scaling(1.0, -1.0);

/// Computes the four strip-ordered vertices of the content quad in NDC.
///
/// Keeps the pixel-to-NDC basis for the last viewport; it is rebuilt only when
/// the viewport changes.
#[derive(Debug, Clone, Default)]
pub struct VertexSolver {
    cached: Option<(Size, Affine2)>,
}

impl VertexSolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// `transform = None` maps content pixels 1:1, anchored top-left.
    pub fn solve(
        &mut self,
        content: Size,
        viewport: Size,
        transform: Option<&Transform>,
    ) -> [QuadVertex; 4] {
        let to_ndc = self.basis(viewport);
        let model = transform
            .map(|t| t.matrix(content, viewport))
            .unwrap_or_default();
        let m = model.then(FLIP_Y).then(to_ndc);

        let (w, h) = (content.width as f32, content.height as f32);
        let corners = [
            ([0.0, h], [0.0, 1.0]),
            ([w, h], [1.0, 1.0]),
            ([0.0, 0.0], [0.0, 0.0]),
            ([w, 0.0], [1.0, 0.0]),
        ];
        corners.map(|(p, uv)| QuadVertex { pos: m.map_point(p), uv })
    }

    fn basis(&mut self, viewport: Size) -> Affine2 {
        match self.cached {
            Some((vp, basis)) if vp == viewport => basis,
            _ => {
                let basis = ndc_basis(viewport);
                self.cached = Some((viewport, basis));
                basis
            }
        }
    }
}

/// Maps y-flipped pixel coordinates of `viewport` onto `[-1, 1]`.
fn ndc_basis(viewport: Size) -> Affine2 {
    let vw = viewport.width.max(1) as f32;
    let vh = viewport.height.max(1) as f32;
    Affine2::translation(-vw / 2.0, vh / 2.0).then(Affine2::scaling(2.0 / vw, 2.0 / vh))
}
