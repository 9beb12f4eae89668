use nalgebra as na;
use ndarray::Array2;

/// 2D draw surface provided by the rendering collaborator. The core emits
/// primitives through it and owns no pixels beyond its own buffers.
pub trait Canvas {
    fn polyline(&mut self, points: &[na::Point2<f32>]);

    fn rect(&mut self, x: f32, y: f32, w: f32, h: f32);

    /// Blits a depth image at the given origin; the collaborator decides
    /// the depth-to-color mapping.
    fn image(&mut self, samples: &Array2<u16>, x: f32, y: f32);
}
