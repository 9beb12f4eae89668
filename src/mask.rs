use nalgebra as na;
use ndarray::Array2;

/// Even-odd ray-cast point-in-polygon test.
pub fn in_polygon(p: na::Point2<f32>, poly: &[na::Point2<f32>]) -> bool {
    let n = poly.len();
    let mut inside = false;
    let mut p1 = poly[0];
    let mut xints = 0.0;

    for i in 1..=n {
        let p2 = poly[i % n];

        if p.y > f32::min(p1.y, p2.y) && p.y <= f32::max(p1.y, p2.y) && p.x <= f32::max(p1.x, p2.x)
        {
            if (p1.y - p2.y).abs() > f32::EPSILON {
                xints = (p.y - p1.y) * (p2.x - p1.x) / (p2.y - p1.y) + p1.x;
            }

            if (p1.x - p2.x).abs() < f32::EPSILON || p.x <= xints {
                inside = !inside;
            }
        }

        p1 = p2;
    }

    inside
}

/// Operator-drawn polygon rasterized into a suppression mask.
///
/// `true` cells pass through to contour extraction, the polygon interior is
/// suppressed. Disabled or under-defined polygons pass everything.
pub struct MaskEditor {
    vertices: Vec<na::Point2<f32>>,
    enabled: bool,
    cache: Option<Array2<bool>>,
}

impl Default for MaskEditor {
    fn default() -> Self {
        Self::new()
    }
}

impl MaskEditor {
    pub fn new() -> Self {
        Self {
            vertices: Vec::new(),
            enabled: false,
            cache: None,
        }
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
        self.cache = None;
    }

    #[inline]
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn add_vertex(&mut self, p: na::Point2<f32>) {
        self.vertices.push(p);
        self.cache = None;
    }

    pub fn move_vertex(&mut self, idx: usize, p: na::Point2<f32>) {
        if let Some(v) = self.vertices.get_mut(idx) {
            *v = p;
            self.cache = None;
        }
    }

    pub fn clear(&mut self) {
        self.vertices.clear();
        self.cache = None;
    }

    #[inline]
    pub fn vertices(&self) -> &[na::Point2<f32>] {
        &self.vertices
    }

    /// The rasterized mask, recomputed only after an edit.
    pub fn mask(&mut self, width: usize, height: usize) -> &Array2<bool> {
        let stale = match &self.cache {
            Some(m) => m.ncols() != width || m.nrows() != height,
            None => true,
        };

        if stale {
            self.cache = Some(self.rasterize(width, height));
        }

        self.cache.as_ref().expect("cache was just filled")
    }

    fn rasterize(&self, width: usize, height: usize) -> Array2<bool> {
        let mut mask = Array2::from_elem((height, width), true);

        if !self.enabled || self.vertices.len() < 3 {
            return mask;
        }

        for y in 0..height {
            for x in 0..width {
                let p = na::Point2::new(x as f32 + 0.5, y as f32 + 0.5);
                if in_polygon(p, &self.vertices) {
                    mask[(y, x)] = false;
                }
            }
        }

        mask
    }
}
